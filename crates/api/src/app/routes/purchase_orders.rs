use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    extract::Path,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use smartstock_purchasing::PurchaseOrderId;

use crate::app::dto::{CancelPurchaseOrderRequest, GeneratePurchaseOrderRequest, PurchaseOrderResponse};
use crate::app::errors::ServiceError;
use crate::app::extract::JsonBody;
use crate::app::services::AppServices;
use crate::context::CallerContext;

pub fn router() -> Router {
    Router::new()
        .route("/purchase-orders", get(list_purchase_orders).post(generate_purchase_order))
        .route("/purchase-orders/:id/fulfill", post(fulfill_purchase_order))
        .route("/purchase-orders/:id/cancel", post(cancel_purchase_order))
}

fn parse_order_id(raw: &str) -> Result<PurchaseOrderId, ServiceError> {
    raw.parse()
        .map(PurchaseOrderId::new)
        .map_err(|_| ServiceError::UnknownPurchaseOrder(raw.to_string()))
}

pub async fn generate_purchase_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    JsonBody(body): JsonBody<GeneratePurchaseOrderRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let order = services.generate_purchase_order(&caller, &body.sku, body.quantity)?;
    Ok((StatusCode::CREATED, Json(PurchaseOrderResponse::from(order))))
}

pub async fn list_purchase_orders(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
) -> Result<Json<Vec<PurchaseOrderResponse>>, ServiceError> {
    let orders = services.list_purchase_orders(&caller)?;
    Ok(Json(orders.into_iter().map(Into::into).collect()))
}

pub async fn fulfill_purchase_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
) -> Result<Json<PurchaseOrderResponse>, ServiceError> {
    let order = services.fulfill_purchase_order(&caller, parse_order_id(&id)?)?;
    Ok(Json(order.into()))
}

pub async fn cancel_purchase_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
    body: Option<Json<CancelPurchaseOrderRequest>>,
) -> Result<Json<PurchaseOrderResponse>, ServiceError> {
    let reason = body.and_then(|Json(b)| b.reason);
    let order = services.cancel_purchase_order(&caller, parse_order_id(&id)?, reason)?;
    Ok(Json(order.into()))
}
