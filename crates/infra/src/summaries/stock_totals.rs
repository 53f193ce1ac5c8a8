//! Unit counts of a part's stock, split by condition status.

use tracing::{instrument, warn};

use partsum_core::PartId;
use partsum_inventory::QuantityBreakdown;

use crate::repository::StockItemRepository;

use super::SummaryError;

/// Unit counts of a part's stock: overall, OK and DAMAGED.
pub type StockTotals = QuantityBreakdown;

#[derive(Debug, Clone)]
pub struct StockTotalsAggregator<R> {
    items: R,
}

impl<R> StockTotalsAggregator<R>
where
    R: StockItemRepository,
{
    pub fn new(items: R) -> Self {
        Self { items }
    }

    /// Sum of stock quantities for the part. A part with no stock yields
    /// zeros. An item whose quantity would push a sum out of range is left
    /// out.
    #[instrument(skip(self), fields(part_id = %part_id), err)]
    pub fn total_stock(&self, part_id: PartId) -> Result<StockTotals, SummaryError> {
        let items = self.items.stock_items(part_id)?;

        let mut totals = StockTotals::zero();
        for item in &items {
            if let Err(err) = totals.record(item.status(), item.quantity()) {
                warn!(item_id = %item.id_typed(), error = %err, "stock quantity out of range, item skipped");
            }
        }
        Ok(totals)
    }
}
