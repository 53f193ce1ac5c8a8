use std::collections::{HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard};

use partsum_core::{CurrencyCode, Entity, LocationId, Money, PartId, Quantity};
use partsum_inventory::{PATH_SEPARATOR, Part, StockItem, StockLocation};

use super::r#trait::{
    LocationLookup, LocationRow, PartPricing, RepositoryError, ResolvedLocation,
    StockItemRepository,
};

#[derive(Debug, Default)]
struct Inner {
    parts: HashMap<PartId, Part>,
    /// Stock items per part, in insertion order.
    items: HashMap<PartId, Vec<StockItem>>,
    locations: HashMap<LocationId, StockLocation>,
    /// Pre-grouped location rows that replace the per-item default.
    location_rows: HashMap<PartId, Vec<LocationRow>>,
}

/// In-memory inventory snapshot implementing every read-side collaborator.
///
/// Intended for tests/dev, and as the materialized snapshot a store-backed
/// reader loads for a single part. Iteration order of a part's stock items is
/// insertion order.
#[derive(Debug, Default)]
pub struct InMemoryInventory {
    inner: RwLock<Inner>,
}

impl InMemoryInventory {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Inner>, RepositoryError> {
        self.inner
            .read()
            .map_err(|_| RepositoryError::storage("in-memory inventory lock poisoned"))
    }

    pub fn insert_part(&self, part: Part) {
        if let Ok(mut inner) = self.inner.write() {
            let id = *part.id();
            inner.items.entry(id).or_default();
            inner.parts.insert(id, part);
        }
    }

    /// Record a stock item; its part must already be known.
    pub fn insert_item(&self, item: StockItem) -> Result<(), RepositoryError> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| RepositoryError::storage("in-memory inventory lock poisoned"))?;
        if !inner.parts.contains_key(&item.part_id()) {
            return Err(RepositoryError::PartNotFound(item.part_id()));
        }
        inner.items.entry(item.part_id()).or_default().push(item);
        Ok(())
    }

    pub fn insert_location(&self, location: StockLocation) {
        if let Ok(mut inner) = self.inner.write() {
            inner.locations.insert(*location.id(), location);
        }
    }

    /// Delete a location while leaving stock items that reference it untouched.
    pub fn remove_location(&self, location_id: LocationId) -> Option<StockLocation> {
        self.inner
            .write()
            .ok()
            .and_then(|mut inner| inner.locations.remove(&location_id))
    }

    /// Serve `rows` from `location_rows` instead of deriving them per item.
    pub fn set_location_rows(&self, part_id: PartId, rows: Vec<LocationRow>) {
        if let Ok(mut inner) = self.inner.write() {
            inner.location_rows.insert(part_id, rows);
        }
    }

    fn part(inner: &Inner, part_id: PartId) -> Result<&Part, RepositoryError> {
        inner
            .parts
            .get(&part_id)
            .ok_or(RepositoryError::PartNotFound(part_id))
    }

    /// Ancestry path (root first) joined by [`PATH_SEPARATOR`].
    ///
    /// Stops at a missing parent, and at a parent already visited.
    fn computed_path(inner: &Inner, location: &StockLocation) -> String {
        let mut names = vec![location.name().to_string()];
        let mut seen = HashSet::from([location.id_typed()]);
        let mut parent = location.parent_id();

        while let Some(pid) = parent {
            if !seen.insert(pid) {
                break;
            }
            match inner.locations.get(&pid) {
                Some(p) => {
                    names.push(p.name().to_string());
                    parent = p.parent_id();
                }
                None => break,
            }
        }

        names.reverse();
        names.join(PATH_SEPARATOR)
    }
}

impl StockItemRepository for InMemoryInventory {
    fn stock_items(&self, part_id: PartId) -> Result<Vec<StockItem>, RepositoryError> {
        let inner = self.read()?;
        Self::part(&inner, part_id)?;
        Ok(inner.items.get(&part_id).cloned().unwrap_or_default())
    }

    fn location_rows(&self, part_id: PartId) -> Result<Vec<LocationRow>, RepositoryError> {
        let inner = self.read()?;
        Self::part(&inner, part_id)?;
        if let Some(rows) = inner.location_rows.get(&part_id) {
            return Ok(rows.clone());
        }
        Ok(inner
            .items
            .get(&part_id)
            .map(|items| items.iter().map(LocationRow::of_item).collect())
            .unwrap_or_default())
    }
}

impl PartPricing for InMemoryInventory {
    fn has_internal_price_breaks(&self, part_id: PartId) -> Result<bool, RepositoryError> {
        let inner = self.read()?;
        Ok(Self::part(&inner, part_id)?.has_internal_price_breaks())
    }

    fn internal_unit_price(
        &self,
        part_id: PartId,
        quantity: Quantity,
    ) -> Result<Option<Money>, RepositoryError> {
        let inner = self.read()?;
        Ok(Self::part(&inner, part_id)?
            .internal_unit_price(quantity)
            .cloned())
    }

    fn first_price_break_currency(
        &self,
        part_id: PartId,
    ) -> Result<Option<CurrencyCode>, RepositoryError> {
        let inner = self.read()?;
        Ok(Self::part(&inner, part_id)?
            .first_price_break_currency()
            .cloned())
    }
}

impl LocationLookup for InMemoryInventory {
    fn resolve(&self, location_id: LocationId) -> Result<Option<ResolvedLocation>, RepositoryError> {
        let inner = self.read()?;
        Ok(inner.locations.get(&location_id).map(|loc| ResolvedLocation {
            name: loc.name().to_string(),
            path: loc
                .pathstring()
                .map(str::to_string)
                .unwrap_or_else(|| Self::computed_path(&inner, loc)),
        }))
    }
}
