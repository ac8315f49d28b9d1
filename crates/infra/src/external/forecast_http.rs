//! Remote stockout forecaster over HTTP.
//!
//! POSTs the sales snapshot as JSON and expects a JSON array of predictions
//! back. The response parser is lenient about two things remote models
//! commonly do: `daysRemaining` sent as a string such as `"N/A"` (read as
//! unbounded), and status labels outside the known set (recomputed from
//! `daysRemaining`).

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use tracing::debug;

use smartstock_forecast::{
    DAYS_REMAINING_UNBOUNDED, ForecastError, ForecastStatus, SalesSnapshot, StockoutForecaster, StockoutPrediction,
    VelocityForecaster,
};

#[derive(Debug, Clone)]
pub struct HttpForecaster {
    client: reqwest::Client,
    url: String,
    timeout_ms: u64,
    thresholds: VelocityForecaster,
}

impl HttpForecaster {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ForecastError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ForecastError::Unavailable(e.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            thresholds: VelocityForecaster::new(),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePrediction {
    sku: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    current_stock: i64,
    #[serde(default)]
    velocity: f64,
    #[serde(default)]
    days_remaining: Option<JsonValue>,
    #[serde(default)]
    status: Option<String>,
}

fn days_remaining(raw: Option<&JsonValue>) -> i64 {
    match raw {
        Some(JsonValue::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.floor() as i64))
            .unwrap_or(DAYS_REMAINING_UNBOUNDED),
        Some(JsonValue::String(s)) => s.trim().parse::<i64>().unwrap_or(DAYS_REMAINING_UNBOUNDED),
        _ => DAYS_REMAINING_UNBOUNDED,
    }
}

impl HttpForecaster {
    fn normalize(&self, wire: WirePrediction) -> StockoutPrediction {
        let days_remaining = days_remaining(wire.days_remaining.as_ref());
        let status = wire
            .status
            .as_deref()
            .and_then(ForecastStatus::from_label)
            .unwrap_or_else(|| self.thresholds.classify(days_remaining));
        StockoutPrediction {
            sku: wire.sku,
            name: wire.name,
            current_stock: wire.current_stock,
            velocity: wire.velocity,
            days_remaining,
            status,
        }
    }
}

#[async_trait]
impl StockoutForecaster for HttpForecaster {
    async fn predict(&self, snapshot: &SalesSnapshot) -> Result<Vec<StockoutPrediction>, ForecastError> {
        let response = self.client.post(&self.url).json(snapshot).send().await.map_err(|e| {
            if e.is_timeout() {
                ForecastError::Timeout(self.timeout_ms)
            } else {
                ForecastError::Unavailable(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ForecastError::Unavailable(format!("forecaster answered {status}")));
        }

        let body: Vec<WirePrediction> = response
            .json()
            .await
            .map_err(|e| ForecastError::InvalidResponse(e.to_string()))?;
        debug!(url = %self.url, predictions = body.len(), "remote forecast received");

        Ok(body.into_iter().map(|w| self.normalize(w)).collect())
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn days_remaining_accepts_numbers_and_falls_back_on_text() {
        assert_eq!(days_remaining(Some(&json!(12))), 12);
        assert_eq!(days_remaining(Some(&json!(4.7))), 4);
        assert_eq!(days_remaining(Some(&json!("15"))), 15);
        assert_eq!(days_remaining(Some(&json!("N/A"))), DAYS_REMAINING_UNBOUNDED);
        assert_eq!(days_remaining(None), DAYS_REMAINING_UNBOUNDED);
    }

    #[test]
    fn unknown_status_label_is_recomputed_from_days_remaining() {
        let f = HttpForecaster::new("http://127.0.0.1:9/predict", Duration::from_millis(100)).unwrap();
        let wire: WirePrediction = serde_json::from_value(json!({
            "sku": "ITEM-1",
            "name": "Widget",
            "currentStock": 5,
            "velocity": 2.0,
            "daysRemaining": 2,
            "status": "Insufficient Data"
        }))
        .unwrap();
        let p = f.normalize(wire);
        assert_eq!(p.status, ForecastStatus::Critical);
        assert_eq!(p.days_remaining, 2);
    }
}
