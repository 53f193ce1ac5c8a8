//! Infrastructure layer: inventory readers, part summaries and their config.

pub mod config;
pub mod repository;
pub mod summaries;


pub use config::{ConfigError, CurrencyPolicy, SummaryConfig};
pub use repository::{
    InMemoryInventory, LocationLookup, LocationRow, PartPricing, PostgresInventoryReader,
    RepositoryError, ResolvedLocation, StockItemRepository,
};
pub use summaries::{
    InventorySource, LocationKey, LocationSummary, PartReport, PartSummaryService,
    PurchaseCostAggregator, PurchaseCostSummary, SnapshotService, StockByLocationAggregator,
    StockTotals, StockTotalsAggregator, SummaryError,
};
