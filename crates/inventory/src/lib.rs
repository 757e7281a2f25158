//! Inventory domain module.
//!
//! This crate contains the stock and distributor models and the validation of
//! untrusted input, implemented purely as deterministic domain logic (no IO,
//! no HTTP, no storage).

pub mod distributor;
pub mod request;
pub mod stock;
pub mod validation;

pub use distributor::{Distributor, DistributorId};
pub use request::{CollectionResponse, NewStockRequest, StockView, UpdateStockRequest};
pub use stock::{StockId, StockItem, StockType};
