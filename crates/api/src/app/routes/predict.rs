use std::sync::Arc;

use axum::{Extension, Json, Router, routing::get};

use crate::app::dto::PredictionResponse;
use crate::app::errors::ServiceError;
use crate::app::services::AppServices;
use crate::context::CallerContext;

pub fn router() -> Router {
    Router::new().route("/stockout", get(stockout))
}

/// Advisory: an unreachable forecaster yields `[]`, never an error.
pub async fn stockout(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
) -> Result<Json<Vec<PredictionResponse>>, ServiceError> {
    let predictions = services.stockout_predictions(&caller).await?;
    Ok(Json(predictions.into_iter().map(Into::into).collect()))
}
