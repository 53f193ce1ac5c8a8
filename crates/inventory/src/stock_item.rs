use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use partsum_core::{DomainError, DomainResult, Entity, LocationId, Money, PartId, Quantity, StockItemId};

/// Condition status of a stock item.
///
/// Only [`StockStatus::Ok`] and [`StockStatus::Damaged`] are broken out by the
/// summaries; every other status still counts toward overall totals.
///
/// `Other` is meant for codes without a named variant. A known code wrapped
/// in `Other` is treated as its named status: deserialization maps it through
/// [`StockStatus::from_code`], and [`StockStatus::normalized`] does the same
/// for values built by hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "StatusRepr")]
pub enum StockStatus {
    Ok,
    Attention,
    Damaged,
    Destroyed,
    Rejected,
    Lost,
    Quarantined,
    Returned,
    /// A status code this domain does not know by name.
    Other(u16),
}

impl StockStatus {
    /// Numeric status code as stored by the inventory system.
    pub fn code(self) -> u16 {
        match self {
            StockStatus::Ok => 10,
            StockStatus::Attention => 50,
            StockStatus::Damaged => 55,
            StockStatus::Destroyed => 60,
            StockStatus::Rejected => 65,
            StockStatus::Lost => 70,
            StockStatus::Quarantined => 75,
            StockStatus::Returned => 85,
            StockStatus::Other(code) => code,
        }
    }

    pub fn from_code(code: u16) -> Self {
        match code {
            10 => StockStatus::Ok,
            50 => StockStatus::Attention,
            55 => StockStatus::Damaged,
            60 => StockStatus::Destroyed,
            65 => StockStatus::Rejected,
            70 => StockStatus::Lost,
            75 => StockStatus::Quarantined,
            85 => StockStatus::Returned,
            other => StockStatus::Other(other),
        }
    }

    /// The named variant for this status's code, if there is one.
    pub fn normalized(self) -> Self {
        Self::from_code(self.code())
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "lowercase")]
enum StatusRepr {
    Ok,
    Attention,
    Damaged,
    Destroyed,
    Rejected,
    Lost,
    Quarantined,
    Returned,
    Other(u16),
}

impl From<StatusRepr> for StockStatus {
    fn from(value: StatusRepr) -> Self {
        match value {
            StatusRepr::Ok => StockStatus::Ok,
            StatusRepr::Attention => StockStatus::Attention,
            StatusRepr::Damaged => StockStatus::Damaged,
            StatusRepr::Destroyed => StockStatus::Destroyed,
            StatusRepr::Rejected => StockStatus::Rejected,
            StatusRepr::Lost => StockStatus::Lost,
            StatusRepr::Quarantined => StockStatus::Quarantined,
            StatusRepr::Returned => StockStatus::Returned,
            StatusRepr::Other(code) => StockStatus::from_code(code),
        }
    }
}

/// One tracked stock record of a part.
///
/// Owned by the external inventory store; this crate only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockItem {
    id: StockItemId,
    part_id: PartId,
    quantity: Quantity,
    status: StockStatus,
    purchase_price: Option<Money>,
    location_id: Option<LocationId>,
}

impl StockItem {
    /// Create a stock item with no purchase price and no location.
    pub fn new(
        id: StockItemId,
        part_id: PartId,
        quantity: Quantity,
        status: StockStatus,
    ) -> DomainResult<Self> {
        if quantity < Decimal::ZERO {
            return Err(DomainError::validation(format!(
                "stock item quantity cannot be negative (got {quantity})"
            )));
        }
        Ok(Self {
            id,
            part_id,
            quantity,
            status,
            purchase_price: None,
            location_id: None,
        })
    }

    /// Set the unit purchase price.
    pub fn with_purchase_price(mut self, price: Money) -> Self {
        self.purchase_price = Some(price);
        self
    }

    /// Place the item at a storage location.
    pub fn at_location(mut self, location_id: LocationId) -> Self {
        self.location_id = Some(location_id);
        self
    }

    pub fn id_typed(&self) -> StockItemId {
        self.id
    }

    pub fn part_id(&self) -> PartId {
        self.part_id
    }

    pub fn quantity(&self) -> Quantity {
        self.quantity
    }

    pub fn status(&self) -> StockStatus {
        self.status
    }

    /// Recorded unit purchase price.
    ///
    /// A recorded price of exactly zero is reported as absent.
    pub fn purchase_price(&self) -> Option<&Money> {
        self.purchase_price.as_ref().filter(|p| !p.is_zero())
    }

    pub fn location_id(&self) -> Option<LocationId> {
        self.location_id
    }
}

impl Entity for StockItem {
    type Id = StockItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
