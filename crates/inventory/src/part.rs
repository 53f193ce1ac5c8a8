use serde::{Deserialize, Serialize};

use partsum_core::{CurrencyCode, DomainError, DomainResult, Entity, Money, PartId, Quantity};

use crate::pricing::PriceBreakSchedule;

/// A part: the catalog entity stock items are tracked against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    id: PartId,
    name: String,
    internal_price_breaks: PriceBreakSchedule,
}

impl Part {
    pub fn new(id: PartId, name: impl Into<String>) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("part name cannot be empty"));
        }
        Ok(Self {
            id,
            name,
            internal_price_breaks: PriceBreakSchedule::empty(),
        })
    }

    pub fn with_internal_price_breaks(mut self, schedule: PriceBreakSchedule) -> Self {
        self.internal_price_breaks = schedule;
        self
    }

    pub fn id_typed(&self) -> PartId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn internal_price_breaks(&self) -> &PriceBreakSchedule {
        &self.internal_price_breaks
    }

    pub fn has_internal_price_breaks(&self) -> bool {
        !self.internal_price_breaks.is_empty()
    }

    /// Internal unit price for an order of `quantity` units, if a break applies.
    pub fn internal_unit_price(&self, quantity: Quantity) -> Option<&Money> {
        self.internal_price_breaks.unit_price_at(quantity)
    }

    pub fn first_price_break_currency(&self) -> Option<&CurrencyCode> {
        self.internal_price_breaks.first_currency()
    }
}

impl Entity for Part {
    type Id = PartId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
