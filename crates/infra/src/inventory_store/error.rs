use thiserror::Error;

use madmin_inventory::{DistributorId, StockId};

/// Inventory store operation error.
///
/// "Not found" on read/delete is not an error (those return `Option`/`bool`).
///
/// ## Error Categories
///
/// - **Database**: backing store unreachable, malformed SQL, schema failure (fatal)
/// - **CorruptRow**: a stored row this model never writes, e.g. an unknown type
///   discriminator (fatal)
/// - **Duplicate / StockNotFound / DistributorNotFound / UnknownDistributor /
///   DistributorInUse**: the request conflicts with what is stored
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error during {operation}: {source}")]
    Database {
        operation: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("corrupt row in {table}: {message}")]
    CorruptRow { table: &'static str, message: String },

    #[error("duplicate id: {0}")]
    Duplicate(String),

    #[error("stock item not found: {0}")]
    StockNotFound(StockId),

    #[error("distributor not found: {0}")]
    DistributorNotFound(DistributorId),

    #[error("unknown distributor referenced by stock: {0}")]
    UnknownDistributor(DistributorId),

    #[error("distributor {0} is still referenced by stock items")]
    DistributorInUse(DistributorId),
}

impl StoreError {
    /// Infrastructure failures and storage corruption; callers should not try
    /// to recover from these.
    pub fn is_fatal(&self) -> bool {
        matches!(self, StoreError::Database { .. } | StoreError::CorruptRow { .. })
    }

    pub(crate) fn database(operation: &'static str, source: sqlx::Error) -> Self {
        StoreError::Database { operation, source }
    }

    pub(crate) fn corrupt(table: &'static str, message: impl Into<String>) -> Self {
        let message = message.into();
        tracing::error!(table, %message, "corrupt row in inventory store");
        StoreError::CorruptRow { table, message }
    }
}

/// Map SQLx errors that are not a constraint violation the caller handles.
pub(crate) fn map_sqlx_error(operation: &'static str, err: sqlx::Error) -> StoreError {
    StoreError::database(operation, err)
}

/// True for a primary key / unique constraint failure.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// True for a foreign key constraint failure.
pub(crate) fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_foreign_key_violation())
}
