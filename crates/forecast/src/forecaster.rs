use async_trait::async_trait;
use thiserror::Error;

use crate::prediction::StockoutPrediction;
use crate::snapshot::SalesSnapshot;

#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("forecaster unavailable: {0}")]
    Unavailable(String),

    #[error("invalid forecaster response: {0}")]
    InvalidResponse(String),

    #[error("forecast timed out after {0} ms")]
    Timeout(u64),
}

/// Anything that can turn a sales snapshot into stockout predictions.
///
/// Callers bound each call with a timeout and treat every error as "no
/// predictions"; implementations should not retry internally.
#[async_trait]
pub trait StockoutForecaster: Send + Sync {
    async fn predict(&self, snapshot: &SalesSnapshot) -> Result<Vec<StockoutPrediction>, ForecastError>;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}
