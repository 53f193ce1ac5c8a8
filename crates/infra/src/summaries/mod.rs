//! Part summaries (derived, recomputed on every call).
//!
//! Each summary is a pure function of a part id and the current inventory
//! snapshot served by the collaborators in [`crate::repository`]:
//! - **Purchase cost**: total value and its OK/DAMAGED split, single currency
//! - **Stock totals**: unit counts and their OK/DAMAGED split
//! - **Stock by location**: per-location unit counts, duplicate rows merged
//!
//! Nothing is cached and no summary mutates shared state, so concurrent calls
//! need no coordination.

pub mod purchase_cost;
pub mod report;
pub mod stock_by_location;
pub mod stock_totals;

use thiserror::Error;

use partsum_core::PartId;

use crate::config::ConfigError;
use crate::repository::RepositoryError;

pub use purchase_cost::{PurchaseCostAggregator, PurchaseCostSummary};
pub use report::{InventorySource, PartReport, PartSummaryService, SnapshotService};
pub use stock_by_location::{
    LocationKey, LocationSummary, NO_LOCATION_KEY, NO_LOCATION_NAME, StockByLocationAggregator,
    merge_location_rows,
};
pub use stock_totals::{StockTotals, StockTotalsAggregator};

/// Summary failure.
///
/// A part that does not exist is reported, never summarized as empty.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SummaryError {
    #[error("part not found: {0}")]
    PartNotFound(PartId),

    #[error("inventory read failed: {0}")]
    Storage(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl From<RepositoryError> for SummaryError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::PartNotFound(id) => SummaryError::PartNotFound(id),
            RepositoryError::Storage(msg) => SummaryError::Storage(msg),
        }
    }
}
