//! Total purchase value of a part's stock, split by condition status.

use serde::Serialize;
use tracing::{instrument, trace, warn};

use partsum_core::{CurrencyCode, DomainError, DomainResult, Money, PartId};
use partsum_inventory::{StockItem, StockStatus};

use crate::config::CurrencyPolicy;
use crate::repository::{PartPricing, StockItemRepository};

use super::SummaryError;

/// Purchase value of a part's stock.
///
/// All monetary fields are `None` when no stock item had a resolvable price;
/// once one did, they are `Some` (possibly zero) in that item's currency.
/// When `mixed_currency` is set the totals are partial and should not be
/// presented as the part's value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PurchaseCostSummary {
    pub total: Option<Money>,
    pub ok_total: Option<Money>,
    pub damaged_total: Option<Money>,
    pub currency: Option<CurrencyCode>,
    pub mixed_currency: bool,
    /// Currencies seen that differ from `currency`, in order of appearance.
    pub foreign_currencies: Vec<CurrencyCode>,
}

impl PurchaseCostSummary {
    fn empty() -> Self {
        Self {
            total: None,
            ok_total: None,
            damaged_total: None,
            currency: None,
            mixed_currency: false,
            foreign_currencies: Vec::new(),
        }
    }
}

/// Running totals in the currency of the first priced item.
#[derive(Debug)]
struct RunningTotals {
    total: Money,
    ok: Money,
    damaged: Money,
}

impl RunningTotals {
    fn zero(currency: CurrencyCode) -> Self {
        Self {
            total: Money::zero(currency.clone()),
            ok: Money::zero(currency.clone()),
            damaged: Money::zero(currency),
        }
    }

    /// Add a line value. On a foreign currency or an overflow no total is
    /// touched.
    fn add(&mut self, status: StockStatus, line: &Money) -> DomainResult<()> {
        let total = self.total.checked_add(line)?;
        match status.normalized() {
            StockStatus::Ok => self.ok = self.ok.checked_add(line)?,
            StockStatus::Damaged => self.damaged = self.damaged.checked_add(line)?,
            _ => {}
        }
        self.total = total;
        Ok(())
    }
}

/// Computes [`PurchaseCostSummary`] for a part.
#[derive(Debug, Clone)]
pub struct PurchaseCostAggregator<R, P> {
    items: R,
    pricing: P,
    policy: CurrencyPolicy,
}

impl<R, P> PurchaseCostAggregator<R, P>
where
    R: StockItemRepository,
    P: PartPricing,
{
    pub fn new(items: R, pricing: P) -> Self {
        Self {
            items,
            pricing,
            policy: CurrencyPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: CurrencyPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Total purchase value of the part's stock.
    ///
    /// Each stock item contributes `unit price × quantity`, where the unit
    /// price is its purchase price or, failing that, the part's internal
    /// price-break price at the item's quantity (tagged with the currency of
    /// the lowest price break). Items with neither are skipped.
    ///
    /// The first contributing item fixes the currency. Under
    /// [`CurrencyPolicy::HaltOnFirstMismatch`] the first item in another
    /// currency stops accumulation; under [`CurrencyPolicy::ScanAll`] such
    /// items are skipped and scanning continues.
    #[instrument(skip(self), fields(part_id = %part_id, policy = %self.policy), err)]
    pub fn total_purchase_cost(&self, part_id: PartId) -> Result<PurchaseCostSummary, SummaryError> {
        let items = self.items.stock_items(part_id)?;

        let fallback_currency = if self.pricing.has_internal_price_breaks(part_id)? {
            self.pricing.first_price_break_currency(part_id)?
        } else {
            None
        };

        let mut summary = PurchaseCostSummary::empty();
        let mut totals: Option<RunningTotals> = None;

        for item in &items {
            let Some(price) = self.unit_price(part_id, item, fallback_currency.as_ref())? else {
                trace!(item_id = %item.id_typed(), "stock item has no resolvable price");
                continue;
            };

            let line = match price.times(item.quantity()) {
                Ok(line) => line,
                Err(err) => {
                    warn!(item_id = %item.id_typed(), error = %err, "stock item value out of range, skipped");
                    continue;
                }
            };
            let running = totals.get_or_insert_with(|| RunningTotals::zero(price.currency.clone()));

            match running.add(item.status(), &line) {
                Ok(()) => {}
                Err(DomainError::CurrencyMismatch { .. }) => {
                    warn!(
                        item_id = %item.id_typed(),
                        currency = %running.total.currency,
                        found = %price.currency,
                        "mixed currencies in purchase prices"
                    );
                    summary.mixed_currency = true;
                    if !summary.foreign_currencies.contains(&price.currency) {
                        summary.foreign_currencies.push(price.currency);
                    }
                    match self.policy {
                        CurrencyPolicy::HaltOnFirstMismatch => break,
                        CurrencyPolicy::ScanAll => continue,
                    }
                }
                Err(err) => {
                    warn!(item_id = %item.id_typed(), error = %err, "running total out of range, item skipped");
                }
            }
        }

        if let Some(t) = totals {
            summary.currency = Some(t.total.currency.clone());
            summary.total = Some(t.total);
            summary.ok_total = Some(t.ok);
            summary.damaged_total = Some(t.damaged);
        }

        Ok(summary)
    }

    /// Purchase price, else internal price-break fallback; zero counts as none.
    fn unit_price(
        &self,
        part_id: PartId,
        item: &StockItem,
        fallback_currency: Option<&CurrencyCode>,
    ) -> Result<Option<Money>, SummaryError> {
        if let Some(price) = item.purchase_price() {
            return Ok(Some(price.clone()));
        }

        let Some(currency) = fallback_currency else {
            return Ok(None);
        };

        let internal = self.pricing.internal_unit_price(part_id, item.quantity())?;
        Ok(internal
            .filter(|p| !p.is_zero())
            .map(|p| Money::new(p.amount, currency.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use partsum_core::{Quantity, StockItemId};
    use partsum_inventory::{Part, PriceBreak, PriceBreakSchedule};
    use proptest::prelude::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use crate::repository::InMemoryInventory;

    fn cur(code: &str) -> CurrencyCode {
        CurrencyCode::new(code).unwrap()
    }

    fn money(amount: Decimal, code: &str) -> Money {
        Money::new(amount, cur(code))
    }

    fn setup(part: Part) -> (Arc<InMemoryInventory>, PartId) {
        let inv = Arc::new(InMemoryInventory::new());
        let id = part.id_typed();
        inv.insert_part(part);
        (inv, id)
    }

    fn plain_part() -> Part {
        Part::new(PartId::new(), "Capacitor 100nF").unwrap()
    }

    fn add(
        inv: &InMemoryInventory,
        part_id: PartId,
        quantity: Quantity,
        status: StockStatus,
        price: Option<Money>,
    ) {
        let mut item = StockItem::new(StockItemId::new(), part_id, quantity, status).unwrap();
        if let Some(p) = price {
            item = item.with_purchase_price(p);
        }
        inv.insert_item(item).unwrap();
    }

    fn aggregator(inv: &Arc<InMemoryInventory>) -> PurchaseCostAggregator<Arc<InMemoryInventory>, Arc<InMemoryInventory>> {
        PurchaseCostAggregator::new(inv.clone(), inv.clone())
    }

    #[test]
    fn sums_by_status_and_skips_unpriced_items() {
        let (inv, part_id) = setup(plain_part());
        add(&inv, part_id, dec!(2), StockStatus::Ok, Some(money(dec!(10), "USD")));
        add(&inv, part_id, dec!(3), StockStatus::Damaged, Some(money(dec!(20), "USD")));
        add(&inv, part_id, dec!(5), StockStatus::Ok, None);

        let s = aggregator(&inv).total_purchase_cost(part_id).unwrap();

        assert_eq!(s.total, Some(money(dec!(80), "USD")));
        assert_eq!(s.ok_total, Some(money(dec!(20), "USD")));
        assert_eq!(s.damaged_total, Some(money(dec!(60), "USD")));
        assert_eq!(s.currency, Some(cur("USD")));
        assert!(!s.mixed_currency);
        assert!(s.foreign_currencies.is_empty());
    }

    #[test]
    fn part_without_stock_has_absent_totals() {
        let (inv, part_id) = setup(plain_part());

        let s = aggregator(&inv).total_purchase_cost(part_id).unwrap();

        assert_eq!(s, PurchaseCostSummary::empty());
    }

    #[test]
    fn unknown_part_is_not_found() {
        let (inv, _) = setup(plain_part());
        let missing = PartId::new();

        let err = aggregator(&inv).total_purchase_cost(missing).unwrap_err();

        assert_eq!(err, SummaryError::PartNotFound(missing));
    }

    #[test]
    fn only_unpriced_stock_yields_absent_totals() {
        let (inv, part_id) = setup(plain_part());
        add(&inv, part_id, dec!(4), StockStatus::Ok, None);

        let s = aggregator(&inv).total_purchase_cost(part_id).unwrap();

        assert_eq!(s.total, None);
        assert_eq!(s.currency, None);
    }

    #[test]
    fn first_contributing_item_establishes_zero_totals() {
        let (inv, part_id) = setup(plain_part());
        add(&inv, part_id, dec!(1), StockStatus::Lost, Some(money(dec!(7), "EUR")));

        let s = aggregator(&inv).total_purchase_cost(part_id).unwrap();

        assert_eq!(s.total, Some(money(dec!(7), "EUR")));
        assert_eq!(s.ok_total, Some(Money::zero(cur("EUR"))));
        assert_eq!(s.damaged_total, Some(Money::zero(cur("EUR"))));
    }

    #[test]
    fn halts_at_first_foreign_currency() {
        let (inv, part_id) = setup(plain_part());
        add(&inv, part_id, dec!(1), StockStatus::Ok, Some(money(dec!(5), "USD")));
        add(&inv, part_id, dec!(2), StockStatus::Damaged, Some(money(dec!(5), "USD")));
        add(&inv, part_id, dec!(1), StockStatus::Ok, Some(money(dec!(100), "EUR")));
        add(&inv, part_id, dec!(1), StockStatus::Ok, Some(money(dec!(1000), "USD")));

        let s = aggregator(&inv).total_purchase_cost(part_id).unwrap();

        assert!(s.mixed_currency);
        assert_eq!(s.total, Some(money(dec!(15), "USD")));
        assert_eq!(s.ok_total, Some(money(dec!(5), "USD")));
        assert_eq!(s.damaged_total, Some(money(dec!(10), "USD")));
        assert_eq!(s.currency, Some(cur("USD")));
        assert_eq!(s.foreign_currencies, vec![cur("EUR")]);
    }

    #[test]
    fn scan_all_policy_reports_every_foreign_currency() {
        let (inv, part_id) = setup(plain_part());
        add(&inv, part_id, dec!(1), StockStatus::Ok, Some(money(dec!(5), "USD")));
        add(&inv, part_id, dec!(1), StockStatus::Ok, Some(money(dec!(100), "EUR")));
        add(&inv, part_id, dec!(1), StockStatus::Ok, Some(money(dec!(100), "GBP")));
        add(&inv, part_id, dec!(1), StockStatus::Ok, Some(money(dec!(100), "EUR")));
        add(&inv, part_id, dec!(2), StockStatus::Damaged, Some(money(dec!(5), "USD")));

        let s = aggregator(&inv)
            .with_policy(CurrencyPolicy::ScanAll)
            .total_purchase_cost(part_id)
            .unwrap();

        assert!(s.mixed_currency);
        assert_eq!(s.total, Some(money(dec!(15), "USD")));
        assert_eq!(s.damaged_total, Some(money(dec!(10), "USD")));
        assert_eq!(s.foreign_currencies, vec![cur("EUR"), cur("GBP")]);
    }

    #[test]
    fn internal_price_breaks_fill_in_missing_purchase_prices() {
        let schedule = PriceBreakSchedule::new(vec![
            PriceBreak { quantity: dec!(1), price: money(dec!(2.00), "EUR") },
            PriceBreak { quantity: dec!(10), price: money(dec!(1.50), "EUR") },
        ])
        .unwrap();
        let (inv, part_id) = setup(plain_part().with_internal_price_breaks(schedule));
        add(&inv, part_id, dec!(12), StockStatus::Ok, None);
        add(&inv, part_id, dec!(3), StockStatus::Damaged, Some(money(dec!(0), "EUR")));
        add(&inv, part_id, dec!(1), StockStatus::Ok, Some(money(dec!(4), "EUR")));

        let s = aggregator(&inv).total_purchase_cost(part_id).unwrap();

        // 12 × 1.50 + 3 × 2.00 (zero purchase price falls back) + 1 × 4
        assert_eq!(s.total, Some(money(dec!(28), "EUR")));
        assert_eq!(s.ok_total, Some(money(dec!(22), "EUR")));
        assert_eq!(s.damaged_total, Some(money(dec!(6), "EUR")));
        assert!(!s.mixed_currency);
    }

    #[test]
    fn fallback_price_takes_currency_of_lowest_break() {
        let schedule = PriceBreakSchedule::new(vec![
            PriceBreak { quantity: dec!(1), price: money(dec!(3), "CHF") },
            PriceBreak { quantity: dec!(100), price: money(dec!(2), "EUR") },
        ])
        .unwrap();
        let (inv, part_id) = setup(plain_part().with_internal_price_breaks(schedule));
        add(&inv, part_id, dec!(100), StockStatus::Ok, None);

        let s = aggregator(&inv).total_purchase_cost(part_id).unwrap();

        assert_eq!(s.total, Some(money(dec!(200), "CHF")));
    }

    #[test]
    fn quantity_below_every_break_stays_unpriced() {
        let schedule = PriceBreakSchedule::new(vec![PriceBreak {
            quantity: dec!(10),
            price: money(dec!(1), "USD"),
        }])
        .unwrap();
        let (inv, part_id) = setup(plain_part().with_internal_price_breaks(schedule));
        add(&inv, part_id, dec!(4), StockStatus::Ok, None);
        add(&inv, part_id, dec!(1), StockStatus::Ok, Some(money(dec!(9), "EUR")));

        let s = aggregator(&inv).total_purchase_cost(part_id).unwrap();

        // The unpriced item never entered the currency check.
        assert_eq!(s.currency, Some(cur("EUR")));
        assert_eq!(s.total, Some(money(dec!(9), "EUR")));
        assert!(!s.mixed_currency);
    }

    #[test]
    fn out_of_range_item_is_skipped_not_fatal() {
        let (inv, part_id) = setup(plain_part());
        add(&inv, part_id, dec!(10000000000000000), StockStatus::Ok, Some(money(dec!(10000000000000), "USD")));
        add(&inv, part_id, dec!(2), StockStatus::Ok, Some(money(dec!(10), "USD")));

        let s = aggregator(&inv).total_purchase_cost(part_id).unwrap();

        assert_eq!(s.total, Some(money(dec!(20), "USD")));
        assert_eq!(s.ok_total, Some(money(dec!(20), "USD")));
        assert!(!s.mixed_currency);
    }

    #[test]
    fn item_overflowing_running_total_is_skipped() {
        let (inv, part_id) = setup(plain_part());
        let half_max = dec!(50000000000000000000000000000);
        add(&inv, part_id, dec!(1), StockStatus::Damaged, Some(money(half_max, "USD")));
        add(&inv, part_id, dec!(1), StockStatus::Damaged, Some(money(half_max, "USD")));
        add(&inv, part_id, dec!(1), StockStatus::Ok, Some(money(dec!(3), "USD")));

        let s = aggregator(&inv).total_purchase_cost(part_id).unwrap();

        assert_eq!(s.total, Some(money(half_max + dec!(3), "USD")));
        assert_eq!(s.damaged_total, Some(money(half_max, "USD")));
        assert_eq!(s.ok_total, Some(money(dec!(3), "USD")));
    }

    fn status() -> impl Strategy<Value = StockStatus> {
        prop_oneof![
            Just(StockStatus::Ok),
            Just(StockStatus::Damaged),
            Just(StockStatus::Attention),
            Just(StockStatus::Quarantined),
            Just(StockStatus::Returned),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 128,
            ..ProptestConfig::default()
        })]

        /// Property: with a single currency, total = ok + damaged + other-status value.
        #[test]
        fn total_is_ok_plus_damaged_plus_other(
            lines in prop::collection::vec((0i64..10_000, 1i64..100_000, status()), 1..30)
        ) {
            let (inv, part_id) = setup(plain_part());
            let mut other = Decimal::ZERO;
            for (qty, cents, st) in &lines {
                let quantity = Decimal::new(*qty, 1);
                let price = Decimal::new(*cents, 2);
                if !matches!(st, StockStatus::Ok | StockStatus::Damaged) {
                    other += quantity * price;
                }
                add(&inv, part_id, quantity, *st, Some(money(price, "USD")));
            }

            let s = aggregator(&inv).total_purchase_cost(part_id).unwrap();
            let total = s.total.unwrap().amount;
            let ok = s.ok_total.unwrap().amount;
            let damaged = s.damaged_total.unwrap().amount;

            prop_assert!(!s.mixed_currency);
            prop_assert_eq!(total, ok + damaged + other);
        }
    }
}
