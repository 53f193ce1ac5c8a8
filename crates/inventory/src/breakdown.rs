//! Quantity totals partitioned by condition status.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use partsum_core::{DomainError, DomainResult, Quantity, ValueObject};

use crate::stock_item::{StockItem, StockStatus};

/// Overall, OK and DAMAGED quantity totals.
///
/// Every recorded quantity lands in `total`; it additionally lands in `ok` or
/// `damaged` when the status is one of those two. `ok + damaged` may be less
/// than `total`: the gap is stock in any other status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuantityBreakdown {
    pub total: Quantity,
    pub ok: Quantity,
    pub damaged: Quantity,
}

impl QuantityBreakdown {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn new(total: Quantity, ok: Quantity, damaged: Quantity) -> Self {
        Self { total, ok, damaged }
    }

    /// Breakdown of a single stock item.
    pub fn of_item(item: &StockItem) -> Self {
        let quantity = item.quantity();
        match item.status().normalized() {
            StockStatus::Ok => Self::new(quantity, quantity, Decimal::ZERO),
            StockStatus::Damaged => Self::new(quantity, Decimal::ZERO, quantity),
            _ => Self::new(quantity, Decimal::ZERO, Decimal::ZERO),
        }
    }

    /// Add `quantity` under `status`. On overflow `self` is left unchanged.
    pub fn record(&mut self, status: StockStatus, quantity: Quantity) -> DomainResult<()> {
        let total = checked_sum(self.total, quantity)?;
        let (ok, damaged) = match status.normalized() {
            StockStatus::Ok => (checked_sum(self.ok, quantity)?, self.damaged),
            StockStatus::Damaged => (self.ok, checked_sum(self.damaged, quantity)?),
            _ => (self.ok, self.damaged),
        };
        *self = Self::new(total, ok, damaged);
        Ok(())
    }

    /// Element-wise sum; associative and commutative. On overflow `self` is
    /// left unchanged.
    pub fn merge(&mut self, other: &QuantityBreakdown) -> DomainResult<()> {
        *self = Self::new(
            checked_sum(self.total, other.total)?,
            checked_sum(self.ok, other.ok)?,
            checked_sum(self.damaged, other.damaged)?,
        );
        Ok(())
    }

    /// Quantity held in statuses other than OK and DAMAGED.
    pub fn other(&self) -> Quantity {
        self.total - self.ok - self.damaged
    }

    pub fn is_empty(&self) -> bool {
        self.total == Decimal::ZERO && self.ok == Decimal::ZERO && self.damaged == Decimal::ZERO
    }
}

fn checked_sum(a: Quantity, b: Quantity) -> DomainResult<Quantity> {
    a.checked_add(b)
        .ok_or_else(|| DomainError::overflow(format!("quantity {a} + {b}")))
}

impl ValueObject for QuantityBreakdown {}
