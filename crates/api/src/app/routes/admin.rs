use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    extract::Path,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use smartstock_personnel::PersonnelRequestId;

use crate::app::dto::{
    AccountResponse, AssignPermissionsRequest, MessageResponse, PersonnelRequestResponse, ProcessRegistrationRequest,
    ResolvePersonnelRequest, SubmitPersonnelRequest,
};
use crate::app::errors::ServiceError;
use crate::app::extract::JsonBody;
use crate::app::services::{AppServices, RegistrationAction};
use crate::context::CallerContext;

pub fn router() -> Router {
    Router::new()
        .route("/users", get(list_users))
        .route("/pending-registrations", get(list_pending_registrations))
        .route("/process-registration/:username", post(process_registration))
        .route("/submit-request", post(submit_request))
        .route("/requests", get(list_requests))
        .route("/approve-request/:id", post(resolve_request))
        .route("/assign-permissions", post(assign_permissions))
}

pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
) -> Result<Json<Vec<AccountResponse>>, ServiceError> {
    let users = services.list_users(&caller)?;
    Ok(Json(users.into_iter().map(Into::into).collect()))
}

pub async fn list_pending_registrations(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
) -> Result<Json<Vec<AccountResponse>>, ServiceError> {
    let pending = services.list_pending_registrations(&caller)?;
    Ok(Json(pending.into_iter().map(Into::into).collect()))
}

pub async fn process_registration(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(username): Path<String>,
    JsonBody(body): JsonBody<ProcessRegistrationRequest>,
) -> Result<Json<MessageResponse>, ServiceError> {
    let action = body.action()?;
    services.process_registration(&caller, &username, action)?;
    let message = match action {
        RegistrationAction::Approve => "User approved successfully. They currently have no roles assigned.",
        RegistrationAction::Decline => "User registration declined.",
    };
    Ok(Json(MessageResponse::new(message)))
}

pub async fn submit_request(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    JsonBody(body): JsonBody<SubmitPersonnelRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let request_type = body.request_type()?;
    let view = services.submit_request(
        &caller,
        request_type,
        &body.target_username,
        body.target_email.as_deref(),
        &body.reason,
    )?;
    Ok((StatusCode::CREATED, Json(PersonnelRequestResponse::from(view))))
}

pub async fn list_requests(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
) -> Result<Json<Vec<PersonnelRequestResponse>>, ServiceError> {
    let requests = services.list_requests(&caller)?;
    Ok(Json(requests.into_iter().map(Into::into).collect()))
}

pub async fn resolve_request(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<ResolvePersonnelRequest>,
) -> Result<Json<PersonnelRequestResponse>, ServiceError> {
    let decision = body.decision()?;
    let request_id = id
        .parse()
        .map(PersonnelRequestId::new)
        .map_err(|_| ServiceError::UnknownRequest(id.clone()))?;
    let view = services.resolve_request(&caller, request_id, decision)?;
    Ok(Json(view.into()))
}

pub async fn assign_permissions(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    JsonBody(body): JsonBody<AssignPermissionsRequest>,
) -> Result<Json<AccountResponse>, ServiceError> {
    let account = services.assign_capabilities(&caller, &body.username, &body.permissions)?;
    Ok(Json(account.into()))
}
