//! The combined part report and the service that produces it.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, instrument};

use partsum_core::{CurrencyCode, Money, PartId, Quantity};

use crate::config::{ConfigError, DATABASE_URL_VAR, SummaryConfig};
use crate::repository::{
    InMemoryInventory, LocationLookup, PartPricing, PostgresInventoryReader, StockItemRepository,
};

use super::purchase_cost::{PurchaseCostAggregator, PurchaseCostSummary};
use super::stock_by_location::{LocationKey, LocationSummary, StockByLocationAggregator};
use super::stock_totals::{StockTotals, StockTotalsAggregator};
use super::SummaryError;

/// Everything known about a part's stock, ready to serialize for a panel.
///
/// Prices are bare amounts in `currency`; all three are `null` when no stock
/// item had a price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartReport {
    pub part_id: PartId,
    pub total_price: Option<Decimal>,
    pub ok_price: Option<Decimal>,
    pub damaged_price: Option<Decimal>,
    pub currency: Option<CurrencyCode>,
    pub mixed_currency: bool,
    pub foreign_currencies: Vec<CurrencyCode>,
    pub total_stock: Quantity,
    pub ok_stock: Quantity,
    pub damaged_stock: Quantity,
    pub stock_by_location: BTreeMap<LocationKey, LocationSummary>,
    pub generated_at: DateTime<Utc>,
}

impl PartReport {
    fn assemble(
        part_id: PartId,
        cost: PurchaseCostSummary,
        stock: StockTotals,
        stock_by_location: BTreeMap<LocationKey, LocationSummary>,
    ) -> Self {
        let amount = |m: Option<Money>| m.map(|m| m.amount);
        Self {
            part_id,
            total_price: amount(cost.total),
            ok_price: amount(cost.ok_total),
            damaged_price: amount(cost.damaged_total),
            currency: cost.currency,
            mixed_currency: cost.mixed_currency,
            foreign_currencies: cost.foreign_currencies,
            total_stock: stock.total,
            ok_stock: stock.ok,
            damaged_stock: stock.damaged,
            stock_by_location,
            generated_at: Utc::now(),
        }
    }
}

/// The three part summaries over one set of collaborators.
#[derive(Debug, Clone)]
pub struct PartSummaryService<R, P, L> {
    purchase_cost: PurchaseCostAggregator<R, P>,
    stock_totals: StockTotalsAggregator<R>,
    stock_by_location: StockByLocationAggregator<R, L>,
}

impl<R, P, L> PartSummaryService<R, P, L>
where
    R: StockItemRepository + Clone,
    P: PartPricing,
    L: LocationLookup,
{
    pub fn new(items: R, pricing: P, locations: L, config: &SummaryConfig) -> Self {
        Self {
            purchase_cost: PurchaseCostAggregator::new(items.clone(), pricing)
                .with_policy(config.currency_policy),
            stock_totals: StockTotalsAggregator::new(items.clone()),
            stock_by_location: StockByLocationAggregator::new(items, locations),
        }
    }

    pub fn total_purchase_cost(&self, part_id: PartId) -> Result<PurchaseCostSummary, SummaryError> {
        self.purchase_cost.total_purchase_cost(part_id)
    }

    pub fn total_stock(&self, part_id: PartId) -> Result<StockTotals, SummaryError> {
        self.stock_totals.total_stock(part_id)
    }

    pub fn stock_by_location(
        &self,
        part_id: PartId,
    ) -> Result<BTreeMap<LocationKey, LocationSummary>, SummaryError> {
        self.stock_by_location.stock_by_location(part_id)
    }

    #[instrument(skip(self), fields(part_id = %part_id), err)]
    pub fn part_report(&self, part_id: PartId) -> Result<PartReport, SummaryError> {
        let cost = self.total_purchase_cost(part_id)?;
        let stock = self.total_stock(part_id)?;
        let by_location = self.stock_by_location(part_id)?;
        Ok(PartReport::assemble(part_id, cost, stock, by_location))
    }
}

/// Service over an in-memory inventory (a fixture or a loaded snapshot).
pub type SnapshotService =
    PartSummaryService<Arc<InMemoryInventory>, Arc<InMemoryInventory>, Arc<InMemoryInventory>>;

impl SnapshotService {
    pub fn over(inventory: Arc<InMemoryInventory>, config: &SummaryConfig) -> Self {
        Self::new(inventory.clone(), inventory.clone(), inventory, config)
    }
}

/// Where part data is read from, selected by [`SummaryConfig`].
#[derive(Debug, Clone)]
pub enum InventorySource {
    InMemory(Arc<InMemoryInventory>),
    Persistent(PostgresInventoryReader),
}

impl InventorySource {
    /// Connects to Postgres when `use_persistent_stores` is set, otherwise
    /// serves `in_memory`.
    pub async fn from_config(
        config: &SummaryConfig,
        in_memory: Arc<InMemoryInventory>,
    ) -> Result<Self, SummaryError> {
        if !config.use_persistent_stores {
            info!("using in-memory inventory");
            return Ok(Self::InMemory(in_memory));
        }

        let url = config
            .database_url
            .as_deref()
            .ok_or(ConfigError::Missing(DATABASE_URL_VAR))?;
        info!("using Postgres inventory");
        Ok(Self::Persistent(PostgresInventoryReader::connect(url).await?))
    }

    /// A service able to summarize `part_id`. The Postgres source loads a
    /// fresh snapshot of the part on every call.
    pub async fn service_for(
        &self,
        part_id: PartId,
        config: &SummaryConfig,
    ) -> Result<SnapshotService, SummaryError> {
        let inventory = match self {
            Self::InMemory(inventory) => inventory.clone(),
            Self::Persistent(reader) => Arc::new(reader.load_part_snapshot(part_id).await?),
        };
        Ok(SnapshotService::over(inventory, config))
    }

    /// Build the combined report for a part from this source.
    pub async fn part_report(
        &self,
        part_id: PartId,
        config: &SummaryConfig,
    ) -> Result<PartReport, SummaryError> {
        self.service_for(part_id, config).await?.part_report(part_id)
    }
}
