//! Table definitions. Creation is idempotent.

use sqlx::SqlitePool;

use super::error::{StoreError, map_sqlx_error};

pub const CREATE_DISTRIBUTORS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS distributors (
        id   TEXT NOT NULL PRIMARY KEY,
        name TEXT NOT NULL
    )
"#;

pub const CREATE_WAREHOUSE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS warehouse (
        id              TEXT NOT NULL PRIMARY KEY,
        type            INTEGER NOT NULL,
        name            TEXT NOT NULL,
        quantity        TEXT NOT NULL,
        min_quantity    TEXT NOT NULL,
        expiration_date TIMESTAMP NULL,
        distributor_id  TEXT NULL REFERENCES distributors(id)
    )
"#;

/// Create both tables if they do not exist yet. Distributors first, since
/// `warehouse` references it.
pub async fn create_tables(pool: &SqlitePool) -> Result<(), StoreError> {
    for (operation, ddl) in [
        ("create_distributors_table", CREATE_DISTRIBUTORS_TABLE),
        ("create_warehouse_table", CREATE_WAREHOUSE_TABLE),
    ] {
        sqlx::query(ddl)
            .execute(pool)
            .await
            .map_err(|e| map_sqlx_error(operation, e))?;
    }
    Ok(())
}
