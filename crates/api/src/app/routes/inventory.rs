use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use crate::app::dto::{
    CreateProductRequest, ProductResponse, SaleRequest, StockChangeResponse, StockUpdateRequest, TransactionResponse,
};
use crate::app::errors::ServiceError;
use crate::app::extract::JsonBody;
use crate::app::services::AppServices;
use crate::context::CallerContext;

pub fn router() -> Router {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route("/stock/update", post(update_stock))
        .route("/sale", post(record_sale))
        .route("/transactions", get(list_transactions))
}

pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
) -> Result<Json<Vec<ProductResponse>>, ServiceError> {
    let products = services.list_products(&caller)?;
    Ok(Json(products.into_iter().map(Into::into).collect()))
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    JsonBody(body): JsonBody<CreateProductRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let product = services.create_product(
        &caller,
        &body.sku,
        &body.name,
        &body.category,
        body.unit_price,
        body.reorder_point,
    )?;
    Ok((StatusCode::CREATED, Json(ProductResponse::from(product))))
}

pub async fn update_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    JsonBody(body): JsonBody<StockUpdateRequest>,
) -> Result<Json<StockChangeResponse>, ServiceError> {
    let kind = body.transaction_type()?;
    let outcome = services.record_stock_change(&caller, &body.sku, kind, body.quantity, body.notes)?;
    Ok(Json(outcome.into()))
}

pub async fn record_sale(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    JsonBody(body): JsonBody<SaleRequest>,
) -> Result<Json<StockChangeResponse>, ServiceError> {
    let outcome = services.record_sale(&caller, &body.sku, body.quantity)?;
    Ok(Json(outcome.into()))
}

pub async fn list_transactions(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
) -> Result<Json<Vec<TransactionResponse>>, ServiceError> {
    let history = services.list_transactions(&caller)?;
    Ok(Json(history.into_iter().map(Into::into).collect()))
}
