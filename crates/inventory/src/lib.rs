//! Inventory domain module.
//!
//! This crate contains the read-only inventory records the summaries are
//! computed from (parts, stock items, locations, internal price breaks),
//! implemented purely as deterministic domain logic (no IO, no storage).

pub mod breakdown;
pub mod location;
pub mod part;
pub mod pricing;
pub mod stock_item;

pub use breakdown::QuantityBreakdown;
pub use location::{PATH_SEPARATOR, StockLocation};
pub use part::Part;
pub use pricing::{PriceBreak, PriceBreakSchedule};
pub use stock_item::{StockItem, StockStatus};
