//! Internal price breaks: quantity-threshold keyed unit prices for a part.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use partsum_core::{CurrencyCode, DomainError, DomainResult, Money, Quantity, ValueObject};

/// One price break: from `quantity` units upward, each unit costs `price`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBreak {
    pub quantity: Quantity,
    pub price: Money,
}

impl ValueObject for PriceBreak {}

/// Ordered set of price breaks (ascending threshold).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<PriceBreak>", into = "Vec<PriceBreak>")]
pub struct PriceBreakSchedule {
    breaks: Vec<PriceBreak>,
}

impl PriceBreakSchedule {
    /// Build a schedule; thresholds must be positive and unique.
    pub fn new(mut breaks: Vec<PriceBreak>) -> DomainResult<Self> {
        if let Some(pb) = breaks.iter().find(|pb| pb.quantity <= Decimal::ZERO) {
            return Err(DomainError::validation(format!(
                "price break quantity must be positive (got {})",
                pb.quantity
            )));
        }

        breaks.sort_by(|a, b| a.quantity.cmp(&b.quantity));

        if let Some(w) = breaks.windows(2).find(|w| w[0].quantity == w[1].quantity) {
            return Err(DomainError::invariant(format!(
                "duplicate price break at quantity {}",
                w[0].quantity
            )));
        }

        Ok(Self { breaks })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.breaks.is_empty()
    }

    pub fn breaks(&self) -> &[PriceBreak] {
        &self.breaks
    }

    /// Break with the lowest threshold.
    pub fn first(&self) -> Option<&PriceBreak> {
        self.breaks.first()
    }

    /// Currency of the lowest-threshold break.
    pub fn first_currency(&self) -> Option<&CurrencyCode> {
        self.first().map(|pb| &pb.price.currency)
    }

    /// Unit price applicable to an order of `quantity` units.
    ///
    /// Picks the break with the largest threshold not exceeding `quantity`.
    /// Below the smallest threshold no break applies.
    pub fn unit_price_at(&self, quantity: Quantity) -> Option<&Money> {
        self.breaks
            .iter()
            .take_while(|pb| pb.quantity <= quantity)
            .last()
            .map(|pb| &pb.price)
    }
}

impl TryFrom<Vec<PriceBreak>> for PriceBreakSchedule {
    type Error = DomainError;

    fn try_from(value: Vec<PriceBreak>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PriceBreakSchedule> for Vec<PriceBreak> {
    fn from(value: PriceBreakSchedule) -> Self {
        value.breaks
    }
}
