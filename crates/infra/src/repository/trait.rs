use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use partsum_core::{CurrencyCode, LocationId, Money, PartId, Quantity};
use partsum_inventory::{QuantityBreakdown, StockItem};

/// Read-side collaborator error.
///
/// `PartNotFound` is the only condition a summary treats as a domain outcome;
/// everything else is a storage failure surfaced as-is.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("part not found: {0}")]
    PartNotFound(PartId),

    #[error("storage error: {0}")]
    Storage(String),
}

impl RepositoryError {
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }
}

/// One grouped (location, quantities) row as produced by the stock store.
///
/// Stores may emit several rows for the same location (join fan-out); callers
/// must merge rows by `location_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationRow {
    pub location_id: Option<LocationId>,
    pub quantities: QuantityBreakdown,
}

impl LocationRow {
    pub fn new(location_id: Option<LocationId>, quantities: QuantityBreakdown) -> Self {
        Self {
            location_id,
            quantities,
        }
    }

    pub fn of_item(item: &StockItem) -> Self {
        Self::new(item.location_id(), QuantityBreakdown::of_item(item))
    }
}

/// Human-readable name and hierarchical path of a location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedLocation {
    pub name: String,
    pub path: String,
}

/// Source of stock items for a part.
///
/// Implementations must report a part that does not exist as
/// `RepositoryError::PartNotFound`, and a part with no stock as `Ok(vec![])`.
pub trait StockItemRepository: Send + Sync {
    /// All stock items of the part, in the store's iteration order.
    fn stock_items(&self, part_id: PartId) -> Result<Vec<StockItem>, RepositoryError>;

    /// Per-location quantity rows for the part.
    ///
    /// The default yields one row per stock item.
    fn location_rows(&self, part_id: PartId) -> Result<Vec<LocationRow>, RepositoryError> {
        Ok(self
            .stock_items(part_id)?
            .iter()
            .map(LocationRow::of_item)
            .collect())
    }
}

/// Part-level internal price-break data used as a purchase-price fallback.
pub trait PartPricing: Send + Sync {
    fn has_internal_price_breaks(&self, part_id: PartId) -> Result<bool, RepositoryError>;

    /// Internal unit price applicable at `quantity`, if any break applies.
    fn internal_unit_price(
        &self,
        part_id: PartId,
        quantity: Quantity,
    ) -> Result<Option<Money>, RepositoryError>;

    /// Currency of the lowest-threshold internal price break.
    fn first_price_break_currency(
        &self,
        part_id: PartId,
    ) -> Result<Option<CurrencyCode>, RepositoryError>;
}

/// Resolves location ids to display data.
pub trait LocationLookup: Send + Sync {
    /// `Ok(None)` when the location no longer exists.
    fn resolve(&self, location_id: LocationId) -> Result<Option<ResolvedLocation>, RepositoryError>;
}

impl<S> StockItemRepository for Arc<S>
where
    S: StockItemRepository + ?Sized,
{
    fn stock_items(&self, part_id: PartId) -> Result<Vec<StockItem>, RepositoryError> {
        (**self).stock_items(part_id)
    }

    fn location_rows(&self, part_id: PartId) -> Result<Vec<LocationRow>, RepositoryError> {
        (**self).location_rows(part_id)
    }
}

impl<S> PartPricing for Arc<S>
where
    S: PartPricing + ?Sized,
{
    fn has_internal_price_breaks(&self, part_id: PartId) -> Result<bool, RepositoryError> {
        (**self).has_internal_price_breaks(part_id)
    }

    fn internal_unit_price(
        &self,
        part_id: PartId,
        quantity: Quantity,
    ) -> Result<Option<Money>, RepositoryError> {
        (**self).internal_unit_price(part_id, quantity)
    }

    fn first_price_break_currency(
        &self,
        part_id: PartId,
    ) -> Result<Option<CurrencyCode>, RepositoryError> {
        (**self).first_price_break_currency(part_id)
    }
}

impl<S> LocationLookup for Arc<S>
where
    S: LocationLookup + ?Sized,
{
    fn resolve(&self, location_id: LocationId) -> Result<Option<ResolvedLocation>, RepositoryError> {
        (**self).resolve(location_id)
    }
}
