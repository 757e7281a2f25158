//! SQLite-backed inventory store.
//!
//! ## Storage format
//!
//! | Field | Column | Stored as |
//! |-------|--------|-----------|
//! | id | `id` | hyphenated UUID text |
//! | type | `type` | integer discriminator (0 medicine, 1 feed, 2 accessory) |
//! | quantity, min quantity | `quantity`, `min_quantity` | canonical decimal text, scale preserved |
//! | expiration date | `expiration_date` | RFC 3339 timestamp, `NULL` for accessories |
//! | distributor | `distributor_id` | UUID text, `NULL` when unassigned |
//!
//! ## Error Mapping
//!
//! | SQLite failure | StoreError |
//! |----------------|------------|
//! | primary key violation on insert | `Duplicate` |
//! | foreign key violation on stock insert/update | `UnknownDistributor` |
//! | foreign key violation on distributor delete | `DistributorInUse` |
//! | anything else | `Database` |
//!
//! ## Thread Safety
//!
//! `InventoryStore` is `Clone + Send + Sync`; clones share one connection
//! pool. Every operation is a single statement, so concurrent writers to the
//! same id race at statement granularity (last write wins).

use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, SqlitePool};
use tracing::instrument;

use madmin_inventory::{Distributor, DistributorId, StockId, StockItem, StockType};

use super::error::{StoreError, is_foreign_key_violation, is_unique_violation, map_sqlx_error};
use super::schema;

const WAREHOUSE: &str = "warehouse";
const DISTRIBUTORS: &str = "distributors";

/// Durable CRUD over the `warehouse` and `distributors` tables.
#[derive(Debug, Clone)]
pub struct InventoryStore {
    pool: SqlitePool,
}

#[derive(Debug, FromRow)]
struct StockRow {
    id: String,
    #[sqlx(rename = "type")]
    stock_type: i64,
    name: String,
    quantity: String,
    min_quantity: String,
    expiration_date: Option<DateTime<Utc>>,
    distributor_id: Option<String>,
}

impl StockRow {
    /// Rebuild the concrete variant from its stored discriminator.
    fn into_item(self) -> Result<StockItem, StoreError> {
        let id = StockId::from_str(&self.id)
            .map_err(|e| StoreError::corrupt(WAREHOUSE, e.to_string()))?;

        let stock_type = StockType::from_discriminator(self.stock_type).ok_or_else(|| {
            StoreError::corrupt(
                WAREHOUSE,
                format!("unknown stock type discriminator {} for {id}", self.stock_type),
            )
        })?;

        let quantity = parse_stored_decimal(&self.quantity, "quantity", id)?;
        let min_quantity = parse_stored_decimal(&self.min_quantity, "min_quantity", id)?;

        let distributor_id = self
            .distributor_id
            .as_deref()
            .map(DistributorId::from_str)
            .transpose()
            .map_err(|e| StoreError::corrupt(WAREHOUSE, format!("{id}: {e}")))?;

        StockItem::restore(
            id,
            stock_type,
            self.name,
            quantity,
            min_quantity,
            self.expiration_date,
            distributor_id,
        )
        .map_err(|e| StoreError::corrupt(WAREHOUSE, e.to_string()))
    }
}

#[derive(Debug, FromRow)]
struct DistributorRow {
    id: String,
    name: String,
}

impl DistributorRow {
    fn into_distributor(self) -> Result<Distributor, StoreError> {
        let id = DistributorId::from_str(&self.id)
            .map_err(|e| StoreError::corrupt(DISTRIBUTORS, e.to_string()))?;
        Ok(Distributor::restore(id, self.name))
    }
}

fn parse_stored_decimal(value: &str, column: &str, id: StockId) -> Result<Decimal, StoreError> {
    Decimal::from_str(value)
        .map_err(|e| StoreError::corrupt(WAREHOUSE, format!("{id}: bad {column} {value:?}: {e}")))
}

impl InventoryStore {
    /// Wrap a shared pool and make sure both tables exist.
    pub async fn new(pool: SqlitePool) -> Result<Self, StoreError> {
        schema::create_tables(&pool).await?;
        tracing::info!("inventory store tables ready");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    // ---------------------------------------------------------------------
    // Stock
    // ---------------------------------------------------------------------

    /// Insert one stock row.
    #[instrument(
        skip(self, item),
        fields(stock_id = %item.id_typed(), stock_type = %item.stock_type()),
        err
    )]
    pub async fn create_stock(&self, item: &StockItem) -> Result<(), StoreError> {
        let distributor_id = item.distributor_id();

        sqlx::query(
            r#"
            INSERT INTO warehouse (
                id,
                type,
                name,
                quantity,
                min_quantity,
                expiration_date,
                distributor_id
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(item.id_typed().to_string())
        .bind(item.stock_type().discriminator())
        .bind(item.name())
        .bind(item.quantity().to_string())
        .bind(item.min_quantity().to_string())
        .bind(item.try_expiration_date())
        .bind(distributor_id.map(|d| d.to_string()))
        .execute(&self.pool)
        .await
        .map_err(|e| match (distributor_id, e) {
            (_, e) if is_unique_violation(&e) => StoreError::Duplicate(item.id_typed().to_string()),
            (Some(d), e) if is_foreign_key_violation(&e) => StoreError::UnknownDistributor(d),
            (_, e) => map_sqlx_error("create_stock", e),
        })?;

        Ok(())
    }

    /// Look up a stock item. `Ok(None)` means no such row.
    #[instrument(skip(self, id), fields(stock_id = %id), err)]
    pub async fn read_stock(&self, id: StockId) -> Result<Option<StockItem>, StoreError> {
        let row = sqlx::query_as::<_, StockRow>(
            r#"
            SELECT
                id,
                type,
                name,
                quantity,
                min_quantity,
                expiration_date,
                distributor_id
            FROM warehouse
            WHERE id = ?1
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("read_stock", e))?;

        row.map(StockRow::into_item).transpose()
    }

    /// Overwrite every mutable column of an existing row.
    ///
    /// The type column is never rewritten. Fails with `StockNotFound` when no
    /// row has the item's id; nothing is inserted.
    #[instrument(skip(self, item), fields(stock_id = %item.id_typed()), err)]
    pub async fn update_stock(&self, item: &StockItem) -> Result<(), StoreError> {
        let distributor_id = item.distributor_id();

        let result = sqlx::query(
            r#"
            UPDATE warehouse
            SET
                name = ?1,
                quantity = ?2,
                min_quantity = ?3,
                expiration_date = ?4,
                distributor_id = ?5
            WHERE id = ?6
            "#,
        )
        .bind(item.name())
        .bind(item.quantity().to_string())
        .bind(item.min_quantity().to_string())
        .bind(item.try_expiration_date())
        .bind(distributor_id.map(|d| d.to_string()))
        .bind(item.id_typed().to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| match (distributor_id, e) {
            (Some(d), e) if is_foreign_key_violation(&e) => StoreError::UnknownDistributor(d),
            (_, e) => map_sqlx_error("update_stock", e),
        })?;

        if result.rows_affected() == 0 {
            return Err(StoreError::StockNotFound(item.id_typed()));
        }
        Ok(())
    }

    /// Remove a stock row. Returns whether a row was removed; a missing id is
    /// not an error.
    #[instrument(skip(self, id), fields(stock_id = %id), err)]
    pub async fn delete_stock(&self, id: StockId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM warehouse WHERE id = ?1")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_stock", e))?;

        Ok(result.rows_affected() > 0)
    }

    /// Every stock item keyed by id. Iteration order is unspecified.
    #[instrument(skip(self), err)]
    pub async fn stock(&self) -> Result<HashMap<StockId, StockItem>, StoreError> {
        let rows = sqlx::query_as::<_, StockRow>(
            r#"
            SELECT
                id,
                type,
                name,
                quantity,
                min_quantity,
                expiration_date,
                distributor_id
            FROM warehouse
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("stock", e))?;

        let mut items = HashMap::with_capacity(rows.len());
        for row in rows {
            let item = row.into_item()?;
            items.insert(item.id_typed(), item);
        }

        tracing::debug!(count = items.len(), "loaded stock");
        Ok(items)
    }

    /// Number of stock rows.
    #[instrument(skip(self), err)]
    pub async fn size(&self) -> Result<usize, StoreError> {
        count_rows(&self.pool, WAREHOUSE, "size").await
    }

    // ---------------------------------------------------------------------
    // Distributors
    // ---------------------------------------------------------------------

    #[instrument(skip(self, distributor), fields(distributor_id = %distributor.id_typed()), err)]
    pub async fn create_distributor(&self, distributor: &Distributor) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO distributors (id, name) VALUES (?1, ?2)")
            .bind(distributor.id_typed().to_string())
            .bind(distributor.name())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    StoreError::Duplicate(distributor.id_typed().to_string())
                } else {
                    map_sqlx_error("create_distributor", e)
                }
            })?;

        Ok(())
    }

    /// Look up a distributor. `Ok(None)` means no such row.
    #[instrument(skip(self, id), fields(distributor_id = %id), err)]
    pub async fn read_distributor(
        &self,
        id: DistributorId,
    ) -> Result<Option<Distributor>, StoreError> {
        let row = sqlx::query_as::<_, DistributorRow>(
            "SELECT id, name FROM distributors WHERE id = ?1",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("read_distributor", e))?;

        row.map(DistributorRow::into_distributor).transpose()
    }

    #[instrument(skip(self, distributor), fields(distributor_id = %distributor.id_typed()), err)]
    pub async fn update_distributor(&self, distributor: &Distributor) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE distributors SET name = ?1 WHERE id = ?2")
            .bind(distributor.name())
            .bind(distributor.id_typed().to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("update_distributor", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::DistributorNotFound(distributor.id_typed()));
        }
        Ok(())
    }

    /// Remove a distributor. A missing id is not an error; a distributor still
    /// referenced by stock is refused with `DistributorInUse`.
    #[instrument(skip(self, id), fields(distributor_id = %id), err)]
    pub async fn delete_distributor(&self, id: DistributorId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM distributors WHERE id = ?1")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    StoreError::DistributorInUse(id)
                } else {
                    map_sqlx_error("delete_distributor", e)
                }
            })?;

        Ok(result.rows_affected() > 0)
    }

    /// Every distributor keyed by id.
    #[instrument(skip(self), err)]
    pub async fn distributors(&self) -> Result<HashMap<DistributorId, Distributor>, StoreError> {
        let rows = sqlx::query_as::<_, DistributorRow>("SELECT id, name FROM distributors")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("distributors", e))?;

        rows.into_iter()
            .map(|row| row.into_distributor().map(|d| (d.id_typed(), d)))
            .collect()
    }

    #[instrument(skip(self), err)]
    pub async fn distributor_count(&self) -> Result<usize, StoreError> {
        count_rows(&self.pool, DISTRIBUTORS, "distributor_count").await
    }

    /// Delete every row from both tables, stock first.
    #[instrument(skip(self), err)]
    pub async fn truncate(&self) -> Result<(), StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("truncate", e))?;

        sqlx::query("DELETE FROM warehouse")
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("truncate", e))?;
        sqlx::query("DELETE FROM distributors")
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("truncate", e))?;

        tx.commit().await.map_err(|e| map_sqlx_error("truncate", e))?;
        tracing::info!("inventory store truncated");
        Ok(())
    }
}

async fn count_rows(
    pool: &SqlitePool,
    table: &'static str,
    operation: &'static str,
) -> Result<usize, StoreError> {
    let sql = format!("SELECT COUNT(*) FROM {table}");
    let count: i64 = sqlx::query_scalar(&sql)
        .fetch_one(pool)
        .await
        .map_err(|e| map_sqlx_error(operation, e))?;

    usize::try_from(count).map_err(|_| StoreError::corrupt(table, format!("negative count {count}")))
}
