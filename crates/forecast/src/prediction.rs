use serde::{Deserialize, Serialize};

/// `days_remaining` value used when nothing is selling.
pub const DAYS_REMAINING_UNBOUNDED: i64 = 999;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForecastStatus {
    Healthy,
    Warning,
    Critical,
}

impl ForecastStatus {
    /// Lenient parse of labels such as `"Critical (Stockout Imminent)"`.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim().to_ascii_lowercase();
        if label.starts_with("critical") {
            Some(ForecastStatus::Critical)
        } else if label.starts_with("warning") {
            Some(ForecastStatus::Warning)
        } else if label.starts_with("healthy") {
            Some(ForecastStatus::Healthy)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockoutPrediction {
    pub sku: String,
    pub name: String,
    pub current_stock: i64,
    /// Average units sold per day.
    pub velocity: f64,
    pub days_remaining: i64,
    pub status: ForecastStatus,
}
