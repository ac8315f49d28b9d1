use std::sync::Arc;

use axum::{Extension, Json, http::StatusCode, response::IntoResponse};

use crate::app::dto::{LoginRequest, LoginResponse, MessageResponse, ProfileResponse, RegisterRequest};
use crate::app::errors::ServiceError;
use crate::app::extract::JsonBody;
use crate::app::services::AppServices;
use crate::context::CallerContext;

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    JsonBody(body): JsonBody<RegisterRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    services.register(&body.username, &body.password, &body.email).await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new(
            "Request submitted successfully. Pending Manager approval.",
        )),
    ))
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    JsonBody(body): JsonBody<LoginRequest>,
) -> Result<Json<LoginResponse>, ServiceError> {
    let outcome = services.login(&body.username, &body.password).await?;
    Ok(Json(outcome.into()))
}

pub async fn profile(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
) -> Result<Json<ProfileResponse>, ServiceError> {
    Ok(Json(services.profile(&caller)?.into()))
}
