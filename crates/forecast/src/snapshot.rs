use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sales history handed to a forecaster.
///
/// `sales` only covers SALE transactions inside the trailing window ending at
/// `taken_at`; quantities are positive units sold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesSnapshot {
    pub taken_at: DateTime<Utc>,
    pub window_days: u32,
    pub products: Vec<ProductSalesHistory>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSalesHistory {
    pub sku: String,
    pub name: String,
    pub current_stock: i64,
    pub sales: Vec<SaleRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleRecord {
    pub date: DateTime<Utc>,
    pub quantity: i64,
}
