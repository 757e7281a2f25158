//! Durable storage for stock items and distributors.
//!
//! Two tables: `warehouse` (stock, one row per item whatever its variant,
//! tagged by an integer `type` column) and `distributors`, referenced by
//! `warehouse.distributor_id`.

pub mod error;
pub mod schema;
pub mod sqlite;

pub use error::StoreError;
pub use sqlite::InventoryStore;
