//! Per-location stock counts.
//!
//! Rows come from [`StockItemRepository::location_rows`] and may repeat a
//! location any number of times; they are folded into one running breakdown
//! per location before names are resolved.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Serialize, Serializer};
use tracing::{debug, instrument, warn};

use partsum_core::{LocationId, PartId};
use partsum_inventory::QuantityBreakdown;

use crate::repository::{LocationLookup, LocationRow, StockItemRepository};

use super::SummaryError;

/// Key of the bucket holding stock without a location.
pub const NO_LOCATION_KEY: &str = "no_location";

/// Display name and path of the no-location bucket.
pub const NO_LOCATION_NAME: &str = "No Location";

/// Output key: a real location or the no-location sentinel.
///
/// Renders as the location's UUID, or as [`NO_LOCATION_KEY`]; the two can
/// never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LocationKey {
    Location(LocationId),
    NoLocation,
}

impl From<Option<LocationId>> for LocationKey {
    fn from(value: Option<LocationId>) -> Self {
        value.map_or(Self::NoLocation, Self::Location)
    }
}

impl fmt::Display for LocationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Location(id) => write!(f, "{id}"),
            Self::NoLocation => f.write_str(NO_LOCATION_KEY),
        }
    }
}

impl Serialize for LocationKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Stock of a part at one location, with the location's name and path as
/// they were when the summary was computed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocationSummary {
    pub location_id: Option<LocationId>,
    pub name: String,
    pub path: String,
    #[serde(flatten)]
    pub quantities: QuantityBreakdown,
}

/// Fold rows into one breakdown per location id (`None` = no location).
///
/// The result does not depend on row order or on how a location's quantities
/// are split across rows. A row that would push a location's sums out of
/// range is dropped.
pub fn merge_location_rows<I>(rows: I) -> HashMap<Option<LocationId>, QuantityBreakdown>
where
    I: IntoIterator<Item = LocationRow>,
{
    let mut merged: HashMap<Option<LocationId>, QuantityBreakdown> = HashMap::new();
    for row in rows {
        let entry = merged.entry(row.location_id).or_default();
        if let Err(err) = entry.merge(&row.quantities) {
            warn!(location_id = ?row.location_id, error = %err, "location quantity out of range, row skipped");
        }
    }
    merged
}

fn deleted_location_label(location_id: LocationId) -> String {
    format!("Location {location_id} (deleted)")
}

#[derive(Debug, Clone)]
pub struct StockByLocationAggregator<R, L> {
    items: R,
    locations: L,
}

impl<R, L> StockByLocationAggregator<R, L>
where
    R: StockItemRepository,
    L: LocationLookup,
{
    pub fn new(items: R, locations: L) -> Self {
        Self { items, locations }
    }

    /// Stock of the part grouped by location.
    ///
    /// A location that no longer exists is reported under a placeholder name
    /// containing its id (used as the path too).
    #[instrument(skip(self), fields(part_id = %part_id), err)]
    pub fn stock_by_location(
        &self,
        part_id: PartId,
    ) -> Result<BTreeMap<LocationKey, LocationSummary>, SummaryError> {
        let rows = self.items.location_rows(part_id)?;

        let mut out = BTreeMap::new();
        for (location_id, quantities) in merge_location_rows(rows) {
            let (name, path) = match location_id {
                Some(id) => self.display(id)?,
                None => (NO_LOCATION_NAME.to_string(), NO_LOCATION_NAME.to_string()),
            };
            out.insert(
                LocationKey::from(location_id),
                LocationSummary {
                    location_id,
                    name,
                    path,
                    quantities,
                },
            );
        }

        Ok(out)
    }

    fn display(&self, location_id: LocationId) -> Result<(String, String), SummaryError> {
        match self.locations.resolve(location_id)? {
            Some(resolved) => Ok((resolved.name, resolved.path)),
            None => {
                debug!(location_id = %location_id, "stock references a deleted location");
                let label = deleted_location_label(location_id);
                Ok((label.clone(), label))
            }
        }
    }
}
