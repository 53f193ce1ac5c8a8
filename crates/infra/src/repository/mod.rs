//! Read-side collaborator boundary.
//!
//! Summaries read stock items, internal price breaks and locations through
//! the traits defined here, without making any storage assumptions. The
//! in-memory implementation serves tests/dev and materialized snapshots; the
//! Postgres reader loads such a snapshot for one part.

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemoryInventory;
pub use postgres::PostgresInventoryReader;
pub use r#trait::{
    LocationLookup, LocationRow, PartPricing, RepositoryError, ResolvedLocation,
    StockItemRepository,
};
