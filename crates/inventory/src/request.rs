//! Request and response records exchanged with the HTTP layer.
//!
//! Field names follow the JSON wire shape (`camelCase`, `type`, `distributorID`).

use serde::{Deserialize, Serialize};

use crate::stock::{StockItem, StockType};
use crate::validation::format_expiration_date;

/// Untrusted input for creating a stock item. Every field is validated by
/// [`StockItem::new`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStockRequest {
    #[serde(default)]
    pub name: String,
    /// Integer discriminator; unknown values are rejected at construction.
    #[serde(rename = "type")]
    pub stock_type: i64,
    #[serde(default)]
    pub expiration_date: String,
    #[serde(default)]
    pub quantity: String,
    #[serde(default)]
    pub min_quantity: String,
    #[serde(default, rename = "distributorID")]
    pub distributor_id: String,
}

/// Untrusted input for updating an existing stock item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateStockRequest {
    pub id: String,
    #[serde(flatten)]
    pub stock: NewStockRequest,
}

/// Outbound representation of one stock item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockView {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub stock_type: StockType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<String>,
    pub quantity: String,
    pub min_quantity: String,
    pub distributor: String,
}

impl From<&StockItem> for StockView {
    fn from(item: &StockItem) -> Self {
        Self {
            id: item.id_typed().to_string(),
            name: item.name().to_string(),
            stock_type: item.stock_type(),
            expiration_date: item.try_expiration_date().as_ref().map(format_expiration_date),
            quantity: item.quantity().to_string(),
            min_quantity: item.min_quantity().to_string(),
            distributor: item.distributor_id().map(|d| d.to_string()).unwrap_or_default(),
        }
    }
}

/// Listing response: one URL per record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionResponse {
    pub info: String,
    pub urls: Vec<String>,
}

impl CollectionResponse {
    /// Build `{base_url}/{id}` for each id.
    pub fn from_ids<I, T>(info: impl Into<String>, base_url: &str, ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: core::fmt::Display,
    {
        let base = base_url.trim_end_matches('/');
        Self {
            info: info.into(),
            urls: ids.into_iter().map(|id| format!("{base}/{id}")).collect(),
        }
    }
}
