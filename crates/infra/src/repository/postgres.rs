//! Postgres-backed inventory reader.
//!
//! Loads everything the summaries need for one part into an
//! [`InMemoryInventory`] snapshot, which then serves the synchronous
//! collaborator traits. Reads are as consistent as a single `REPEATABLE READ`
//! transaction makes them.
//!
//! ## Expected schema
//!
//! | Table | Columns |
//! |-------|---------|
//! | `parts` | `part_id uuid`, `name text` |
//! | `part_internal_price_breaks` | `part_id uuid`, `quantity numeric`, `price numeric`, `price_currency text` |
//! | `stock_items` | `item_id uuid`, `part_id uuid`, `quantity numeric`, `status int4`, `purchase_price numeric NULL`, `purchase_price_currency text NULL`, `location_id uuid NULL` |
//! | `stock_locations` | `location_id uuid`, `name text`, `parent_id uuid NULL`, `pathstring text` |

use std::sync::Arc;

use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::{Span, instrument, warn};
use uuid::Uuid;

use partsum_core::{CurrencyCode, LocationId, Money, PartId, StockItemId};
use partsum_inventory::{
    Part, PriceBreak, PriceBreakSchedule, QuantityBreakdown, StockItem, StockLocation, StockStatus,
};

use super::in_memory::InMemoryInventory;
use super::r#trait::{LocationRow, RepositoryError};

/// The named locations plus every ancestor reachable through `parent_id`.
/// `UNION` drops repeated rows, so a cycle in the tree terminates.
const LOCATION_TREE_SQL: &str = r#"
    WITH RECURSIVE tree AS (
        SELECT location_id, name, parent_id, pathstring
        FROM stock_locations
        WHERE location_id = ANY($1)
        UNION
        SELECT l.location_id, l.name, l.parent_id, l.pathstring
        FROM stock_locations l
        JOIN tree t ON l.location_id = t.parent_id
    )
    SELECT location_id, name, parent_id, pathstring FROM tree
"#;

/// Reads part inventory from Postgres.
#[derive(Debug, Clone)]
pub struct PostgresInventoryReader {
    pool: Arc<PgPool>,
}

impl PostgresInventoryReader {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    pub async fn connect(database_url: &str) -> Result<Self, RepositoryError> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Load a snapshot of one part: the part, its price breaks, its stock
    /// items, its grouped location rows and every location those rows name
    /// together with their ancestors.
    ///
    /// Stock item and location rows that cannot be mapped are logged and
    /// left out. Returns `RepositoryError::PartNotFound` when no such part
    /// exists.
    #[instrument(skip(self), fields(part_id = %part_id, item_count = tracing::field::Empty), err)]
    pub async fn load_part_snapshot(
        &self,
        part_id: PartId,
    ) -> Result<InMemoryInventory, RepositoryError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin", e))?;

        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("set_isolation", e))?;

        let part = fetch_part(&mut tx, part_id).await?;
        let items = fetch_stock_items(&mut tx, part_id).await?;
        let rows = fetch_location_rows(&mut tx, part_id).await?;
        let locations = fetch_locations(&mut tx, &referenced_location_ids(&rows)).await?;

        tx.commit().await.map_err(|e| map_sqlx_error("commit", e))?;

        Span::current().record("item_count", items.len());

        assemble_snapshot(part, items, rows, locations)
    }
}

/// Distinct location ids named by `rows`, sorted.
fn referenced_location_ids(rows: &[LocationRow]) -> Vec<Uuid> {
    let mut ids: Vec<Uuid> = rows
        .iter()
        .filter_map(|r| r.location_id.map(Uuid::from))
        .collect();
    ids.sort();
    ids.dedup();
    ids
}

fn assemble_snapshot(
    part: Part,
    items: Vec<StockItem>,
    rows: Vec<LocationRow>,
    locations: Vec<StockLocation>,
) -> Result<InMemoryInventory, RepositoryError> {
    let part_id = part.id_typed();
    let snapshot = InMemoryInventory::new();
    snapshot.insert_part(part);
    for item in items {
        snapshot.insert_item(item)?;
    }
    for location in locations {
        snapshot.insert_location(location);
    }
    snapshot.set_location_rows(part_id, rows);
    Ok(snapshot)
}

async fn fetch_part(
    tx: &mut Transaction<'_, Postgres>,
    part_id: PartId,
) -> Result<Part, RepositoryError> {
    let row = sqlx::query("SELECT part_id, name FROM parts WHERE part_id = $1")
        .bind(part_id.as_uuid())
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("fetch_part", e))?
        .ok_or(RepositoryError::PartNotFound(part_id))?;

    let name: String = get(&row, "name")?;

    let breaks = sqlx::query(
        r#"
        SELECT quantity, price, price_currency
        FROM part_internal_price_breaks
        WHERE part_id = $1
        ORDER BY quantity ASC
        "#,
    )
    .bind(part_id.as_uuid())
    .fetch_all(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("fetch_price_breaks", e))?
    .iter()
    .map(|r| -> Result<PriceBreak, RepositoryError> {
        Ok(PriceBreak {
            quantity: get(r, "quantity")?,
            price: Money::new(get(r, "price")?, currency(get(r, "price_currency")?)?),
        })
    })
    .collect::<Result<Vec<_>, RepositoryError>>()?;

    let schedule = PriceBreakSchedule::new(breaks).map_err(|e| RepositoryError::storage(e.to_string()))?;
    Part::new(part_id, name)
        .map(|p| p.with_internal_price_breaks(schedule))
        .map_err(|e| RepositoryError::storage(e.to_string()))
}

/// One `stock_items` row as stored.
#[derive(Debug, Clone, PartialEq)]
struct StockItemRecord {
    item_id: Uuid,
    quantity: Decimal,
    status: i32,
    purchase_price: Option<Decimal>,
    purchase_price_currency: Option<String>,
    location_id: Option<Uuid>,
}

impl StockItemRecord {
    fn from_row(row: &PgRow) -> Result<Self, RepositoryError> {
        Ok(Self {
            item_id: get(row, "item_id")?,
            quantity: get(row, "quantity")?,
            status: get(row, "status")?,
            purchase_price: get(row, "purchase_price")?,
            purchase_price_currency: get(row, "purchase_price_currency")?,
            location_id: get(row, "location_id")?,
        })
    }

    /// `None` when the row cannot be a stock item (bad status code, negative
    /// quantity). A price without a usable currency is dropped and the item
    /// kept unpriced.
    fn into_item(self, part_id: PartId) -> Option<StockItem> {
        let status = match status(self.status) {
            Ok(status) => status,
            Err(err) => {
                warn!(item_id = %self.item_id, error = %err, "stock item row skipped");
                return None;
            }
        };
        let mut item = match StockItem::new(StockItemId::from_uuid(self.item_id), part_id, self.quantity, status) {
            Ok(item) => item,
            Err(err) => {
                warn!(item_id = %self.item_id, error = %err, "stock item row skipped");
                return None;
            }
        };

        match (self.purchase_price, self.purchase_price_currency) {
            (Some(amount), Some(code)) => match currency(code) {
                Ok(code) => item = item.with_purchase_price(Money::new(amount, code)),
                Err(err) => {
                    warn!(item_id = %self.item_id, error = %err, "unusable purchase price currency, item left unpriced");
                }
            },
            (Some(_), None) => {
                warn!(item_id = %self.item_id, "purchase price without currency, item left unpriced");
            }
            (None, _) => {}
        }

        if let Some(lid) = self.location_id {
            item = item.at_location(LocationId::from_uuid(lid));
        }
        Some(item)
    }
}

async fn fetch_stock_items(
    tx: &mut Transaction<'_, Postgres>,
    part_id: PartId,
) -> Result<Vec<StockItem>, RepositoryError> {
    let rows = sqlx::query(
        r#"
        SELECT
            item_id,
            quantity,
            status,
            purchase_price,
            purchase_price_currency,
            location_id
        FROM stock_items
        WHERE part_id = $1
        ORDER BY item_id ASC
        "#,
    )
    .bind(part_id.as_uuid())
    .fetch_all(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("fetch_stock_items", e))?;

    let mut items = Vec::with_capacity(rows.len());
    for row in &rows {
        if let Some(item) = StockItemRecord::from_row(row)?.into_item(part_id) {
            items.push(item);
        }
    }
    Ok(items)
}

#[derive(Debug, Clone, PartialEq)]
struct LocationRowRecord {
    location_id: Option<Uuid>,
    total_qty: Decimal,
    ok_qty: Decimal,
    damaged_qty: Decimal,
}

impl LocationRowRecord {
    fn from_row(row: &PgRow) -> Result<Self, RepositoryError> {
        Ok(Self {
            location_id: get(row, "location_id")?,
            total_qty: get(row, "total_qty")?,
            ok_qty: get(row, "ok_qty")?,
            damaged_qty: get(row, "damaged_qty")?,
        })
    }

    fn into_row(self) -> LocationRow {
        LocationRow::new(
            self.location_id.map(LocationId::from_uuid),
            QuantityBreakdown::new(self.total_qty, self.ok_qty, self.damaged_qty),
        )
    }
}

/// Grouped per-location quantities.
///
/// Grouping by (location, status) yields one row per status present at a
/// location; rows for the same location are merged by the caller.
async fn fetch_location_rows(
    tx: &mut Transaction<'_, Postgres>,
    part_id: PartId,
) -> Result<Vec<LocationRow>, RepositoryError> {
    let rows = sqlx::query(
        r#"
        SELECT
            location_id,
            COALESCE(SUM(quantity), 0) AS total_qty,
            COALESCE(SUM(quantity) FILTER (WHERE status = $2), 0) AS ok_qty,
            COALESCE(SUM(quantity) FILTER (WHERE status = $3), 0) AS damaged_qty
        FROM stock_items
        WHERE part_id = $1
        GROUP BY location_id, status
        "#,
    )
    .bind(part_id.as_uuid())
    .bind(i32::from(StockStatus::Ok.code()))
    .bind(i32::from(StockStatus::Damaged.code()))
    .fetch_all(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("fetch_location_rows", e))?;

    rows.iter()
        .map(|r| LocationRowRecord::from_row(r).map(LocationRowRecord::into_row))
        .collect()
}

/// One `stock_locations` row as stored.
#[derive(Debug, Clone, PartialEq)]
struct LocationRecord {
    location_id: Uuid,
    name: String,
    parent_id: Option<Uuid>,
    pathstring: Option<String>,
}

impl LocationRecord {
    fn from_row(row: &PgRow) -> Result<Self, RepositoryError> {
        Ok(Self {
            location_id: get(row, "location_id")?,
            name: get(row, "name")?,
            parent_id: get(row, "parent_id")?,
            pathstring: get(row, "pathstring")?,
        })
    }

    /// `None` for a row with a blank name; stock there then reports under
    /// the missing-location placeholder.
    fn into_location(self) -> Option<StockLocation> {
        let location = match StockLocation::new(LocationId::from_uuid(self.location_id), self.name) {
            Ok(location) => location,
            Err(err) => {
                warn!(location_id = %self.location_id, error = %err, "stock location row skipped");
                return None;
            }
        };
        let location = location.with_pathstring(self.pathstring.unwrap_or_default());
        Some(match self.parent_id {
            Some(pid) => location.with_parent(LocationId::from_uuid(pid)),
            None => location,
        })
    }
}

async fn fetch_locations(
    tx: &mut Transaction<'_, Postgres>,
    location_ids: &[Uuid],
) -> Result<Vec<StockLocation>, RepositoryError> {
    if location_ids.is_empty() {
        return Ok(vec![]);
    }

    let rows = sqlx::query(LOCATION_TREE_SQL)
        .bind(location_ids)
        .fetch_all(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("fetch_locations", e))?;

    let mut locations = Vec::with_capacity(rows.len());
    for row in &rows {
        if let Some(location) = LocationRecord::from_row(row)?.into_location() {
            locations.push(location);
        }
    }
    Ok(locations)
}

fn get<'r, T>(row: &'r PgRow, column: &str) -> Result<T, RepositoryError>
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    row.try_get(column)
        .map_err(|e| RepositoryError::storage(format!("failed to read column {column}: {e}")))
}

fn currency(code: String) -> Result<CurrencyCode, RepositoryError> {
    CurrencyCode::new(&code).map_err(|e| RepositoryError::storage(e.to_string()))
}

fn status(code: i32) -> Result<StockStatus, RepositoryError> {
    u16::try_from(code)
        .map(StockStatus::from_code)
        .map_err(|_| RepositoryError::storage(format!("invalid stock status code: {code}")))
}

/// Map a sqlx error into a storage error tagged with the failing operation.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> RepositoryError {
    match err {
        sqlx::Error::PoolClosed => {
            RepositoryError::storage(format!("{operation}: connection pool is closed"))
        }
        sqlx::Error::Database(db) => RepositoryError::storage(format!(
            "{operation}: database error ({}): {}",
            db.code().unwrap_or_default(),
            db.message()
        )),
        other => RepositoryError::storage(format!("{operation}: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    use crate::repository::LocationLookup;

    #[test]
    fn status_codes_map_to_domain_statuses() {
        assert_eq!(status(10).unwrap(), StockStatus::Ok);
        assert_eq!(status(55).unwrap(), StockStatus::Damaged);
        assert_eq!(status(123).unwrap(), StockStatus::Other(123));
        assert!(status(-1).is_err());
    }

    #[test]
    fn bad_currency_is_a_storage_error() {
        assert!(matches!(
            currency(String::new()),
            Err(RepositoryError::Storage(_))
        ));
        assert_eq!(currency("usd".to_string()).unwrap().as_str(), "USD");
    }

    #[test]
    fn pool_closed_maps_to_storage_error() {
        let err = map_sqlx_error("fetch_part", sqlx::Error::PoolClosed);
        assert_eq!(
            err,
            RepositoryError::storage("fetch_part: connection pool is closed")
        );
    }

    fn item_record(quantity: Decimal) -> StockItemRecord {
        StockItemRecord {
            item_id: Uuid::now_v7(),
            quantity,
            status: 10,
            purchase_price: None,
            purchase_price_currency: None,
            location_id: None,
        }
    }

    fn location_record(name: &str, parent: Option<Uuid>, pathstring: Option<&str>) -> LocationRecord {
        LocationRecord {
            location_id: Uuid::now_v7(),
            name: name.to_string(),
            parent_id: parent,
            pathstring: pathstring.map(str::to_string),
        }
    }

    #[test]
    fn priced_item_record_maps_fully() {
        let part_id = PartId::new();
        let location = Uuid::now_v7();
        let record = StockItemRecord {
            status: 55,
            purchase_price: Some(dec!(2.5)),
            purchase_price_currency: Some("eur".to_string()),
            location_id: Some(location),
            ..item_record(dec!(4))
        };
        let item_id = record.item_id;

        let item = record.into_item(part_id).unwrap();

        assert_eq!(item.id_typed(), StockItemId::from_uuid(item_id));
        assert_eq!(item.part_id(), part_id);
        assert_eq!(item.quantity(), dec!(4));
        assert_eq!(item.status(), StockStatus::Damaged);
        assert_eq!(
            item.purchase_price(),
            Some(&Money::new(dec!(2.5), CurrencyCode::new("EUR").unwrap()))
        );
        assert_eq!(item.location_id(), Some(LocationId::from_uuid(location)));
    }

    #[test]
    fn incomplete_or_invalid_price_leaves_item_unpriced() {
        let cases = [
            (None, Some("USD")),
            (Some(dec!(3)), None),
            (Some(dec!(3)), Some("US$")),
            (Some(dec!(3)), Some("")),
        ];
        for (price, code) in cases {
            let record = StockItemRecord {
                purchase_price: price,
                purchase_price_currency: code.map(str::to_string),
                ..item_record(dec!(1))
            };

            let item = record.into_item(PartId::new()).unwrap();

            assert_eq!(item.purchase_price(), None, "price {price:?} currency {code:?}");
            assert_eq!(item.quantity(), dec!(1));
        }
    }

    #[test]
    fn unmappable_item_records_are_skipped() {
        assert!(item_record(dec!(-1)).into_item(PartId::new()).is_none());
        let bad_status = StockItemRecord {
            status: -5,
            ..item_record(dec!(1))
        };
        assert!(bad_status.into_item(PartId::new()).is_none());
    }

    #[test]
    fn location_row_record_keeps_missing_location() {
        let row = LocationRowRecord {
            location_id: None,
            total_qty: dec!(6),
            ok_qty: dec!(4),
            damaged_qty: dec!(1),
        }
        .into_row();

        assert_eq!(row.location_id, None);
        assert_eq!(row.quantities, QuantityBreakdown::new(dec!(6), dec!(4), dec!(1)));
    }

    #[test]
    fn blank_location_name_is_skipped() {
        assert!(location_record("  ", None, Some("Hall")).into_location().is_none());
        assert!(location_record("", None, None).into_location().is_none());
    }

    #[test]
    fn blank_or_null_pathstring_means_no_stored_path() {
        for stored in [None, Some(""), Some("   ")] {
            let location = location_record("Shelf", None, stored).into_location().unwrap();
            assert_eq!(location.pathstring(), None);
        }
        let location = location_record("Shelf", None, Some("Hall/Shelf"))
            .into_location()
            .unwrap();
        assert_eq!(location.pathstring(), Some("Hall/Shelf"));
    }

    #[test]
    fn snapshot_with_ancestors_resolves_full_path() {
        let part = Part::new(PartId::new(), "Fuse 5A").unwrap();
        let hall = location_record("Hall", None, None);
        let shelf = location_record("Shelf", Some(hall.location_id), None);
        let shelf_id = LocationId::from_uuid(shelf.location_id);
        let rows = vec![LocationRow::new(
            Some(shelf_id),
            QuantityBreakdown::new(dec!(1), dec!(1), dec!(0)),
        )];
        let locations = [hall, shelf]
            .into_iter()
            .filter_map(LocationRecord::into_location)
            .collect();

        let snapshot = assemble_snapshot(part, vec![], rows, locations).unwrap();

        let resolved = snapshot.resolve(shelf_id).unwrap().unwrap();
        assert_eq!(resolved.name, "Shelf");
        assert_eq!(resolved.path, "Hall/Shelf");
    }

    #[test]
    fn skipped_location_row_resolves_to_nothing() {
        let part = Part::new(PartId::new(), "Fuse 5A").unwrap();
        let blank = location_record(" ", None, None);
        let blank_id = LocationId::from_uuid(blank.location_id);
        let locations = blank.into_location().into_iter().collect();

        let snapshot = assemble_snapshot(part, vec![], vec![], locations).unwrap();

        assert_eq!(snapshot.resolve(blank_id).unwrap(), None);
    }

    #[test]
    fn referenced_ids_are_distinct_and_skip_missing() {
        let a = LocationId::new();
        let b = LocationId::new();
        let zero = QuantityBreakdown::zero();
        let rows = vec![
            LocationRow::new(Some(b), zero),
            LocationRow::new(None, zero),
            LocationRow::new(Some(a), zero),
            LocationRow::new(Some(b), zero),
        ];

        let mut expected = vec![Uuid::from(a), Uuid::from(b)];
        expected.sort();
        assert_eq!(referenced_location_ids(&rows), expected);
    }

    #[test]
    fn location_query_walks_up_parents() {
        assert!(LOCATION_TREE_SQL.contains("WITH RECURSIVE"));
        assert!(LOCATION_TREE_SQL.contains("l.location_id = t.parent_id"));
    }
}
