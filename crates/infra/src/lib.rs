//! Infrastructure layer: SQLite persistence and its configuration.

pub mod config;
pub mod db;
pub mod inventory_store;

pub use config::StoreConfig;
pub use db::connect_database;
pub use inventory_store::{InventoryStore, StoreError};
