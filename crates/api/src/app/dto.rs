use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use smartstock_auth::{AccountStatus, CapabilitySet};
use smartstock_forecast::{ForecastStatus, StockoutPrediction};
use smartstock_infra::projections::{AccountReadModel, ProductReadModel};
use smartstock_inventory::{StockStatus, TransactionType};
use smartstock_personnel::{Decision, RequestStatus, RequestType};
use smartstock_purchasing::PurchaseOrderStatus;

use crate::app::errors::ServiceError;
use crate::app::services::{
    LoginOutcome, PersonnelRequestView, PurchaseOrderView, RegistrationAction, StockChangeOutcome, TransactionView,
};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ProcessRegistrationRequest {
    pub action: String,
}

impl ProcessRegistrationRequest {
    pub fn action(&self) -> Result<RegistrationAction, ServiceError> {
        match self.action.trim().to_ascii_uppercase().as_str() {
            "APPROVE" => Ok(RegistrationAction::Approve),
            "DECLINE" => Ok(RegistrationAction::Decline),
            _ => Err(ServiceError::Validation("action must be APPROVE or DECLINE".into())),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitPersonnelRequest {
    pub request_type: String,
    pub target_username: String,
    #[serde(default)]
    pub target_email: Option<String>,
    #[serde(default)]
    pub reason: String,
}

impl SubmitPersonnelRequest {
    pub fn request_type(&self) -> Result<RequestType, ServiceError> {
        match self.request_type.trim().to_ascii_uppercase().as_str() {
            "CREATE" => Ok(RequestType::Create),
            "DELETE" => Ok(RequestType::Delete),
            _ => Err(ServiceError::Validation("requestType must be CREATE or DELETE".into())),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ResolvePersonnelRequest {
    pub status: String,
}

impl ResolvePersonnelRequest {
    pub fn decision(&self) -> Result<Decision, ServiceError> {
        match self.status.trim().to_ascii_uppercase().as_str() {
            "APPROVED" => Ok(Decision::Approved),
            "REJECTED" => Ok(Decision::Rejected),
            _ => Err(ServiceError::Validation("status must be APPROVED or REJECTED".into())),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AssignPermissionsRequest {
    pub username: String,
    #[serde(default)]
    pub permissions: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub sku: String,
    pub name: String,
    #[serde(default)]
    pub category: String,
    /// Integer minor currency units (cents); fractional or negative values are rejected.
    #[serde(default)]
    pub unit_price: u64,
    #[serde(default = "default_reorder_point")]
    pub reorder_point: i64,
}

fn default_reorder_point() -> i64 {
    10
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockUpdateRequest {
    pub sku: String,
    pub quantity: i64,
    pub transaction_type: String,
    #[serde(default)]
    pub notes: Option<String>,
}

impl StockUpdateRequest {
    pub fn transaction_type(&self) -> Result<TransactionType, ServiceError> {
        self.transaction_type.parse().map_err(ServiceError::from)
    }
}

#[derive(Debug, Deserialize)]
pub struct SaleRequest {
    pub sku: String,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct GeneratePurchaseOrderRequest {
    pub sku: String,
    pub quantity: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct CancelPurchaseOrderRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: &'static str,
    pub token: String,
    pub permissions: CapabilitySet,
}

impl From<LoginOutcome> for LoginResponse {
    fn from(o: LoginOutcome) -> Self {
        Self {
            message: "Login successful!",
            token: o.token,
            permissions: o.capabilities,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub username: String,
    pub email: String,
    pub permissions: CapabilitySet,
}

impl From<AccountReadModel> for ProfileResponse {
    fn from(a: AccountReadModel) -> Self {
        Self {
            username: a.username,
            email: a.email,
            permissions: a.capabilities,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub status: AccountStatus,
    pub permissions: CapabilitySet,
    pub registered_at: DateTime<Utc>,
}

impl From<AccountReadModel> for AccountResponse {
    fn from(a: AccountReadModel) -> Self {
        Self {
            id: a.account_id.to_string(),
            username: a.username,
            email: a.email,
            status: a.status,
            permissions: a.capabilities,
            registered_at: a.registered_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonnelRequestResponse {
    pub id: String,
    pub request_type: RequestType,
    pub target_username: String,
    pub target_email: Option<String>,
    pub reason: String,
    pub status: RequestStatus,
    pub created_by: String,
    pub approved_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl From<PersonnelRequestView> for PersonnelRequestResponse {
    fn from(v: PersonnelRequestView) -> Self {
        let r = v.request;
        Self {
            id: r.request_id.to_string(),
            request_type: r.request_type,
            target_username: r.target_username,
            target_email: r.target_email,
            reason: r.reason,
            status: r.status,
            created_by: v.requested_by,
            approved_by: v.resolved_by,
            created_at: r.created_at,
            resolved_at: r.resolved_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub id: String,
    pub sku: String,
    pub name: String,
    pub category: String,
    pub unit_price: u64,
    pub current_stock: i64,
    pub reorder_point: i64,
    pub status: StockStatus,
    pub created_at: DateTime<Utc>,
    pub last_movement_at: Option<DateTime<Utc>>,
}

impl From<ProductReadModel> for ProductResponse {
    fn from(p: ProductReadModel) -> Self {
        Self {
            id: p.product_id.to_string(),
            status: p.status(),
            sku: p.sku.as_str().to_string(),
            name: p.name,
            category: p.category,
            unit_price: p.unit_price,
            current_stock: p.current_stock,
            reorder_point: p.reorder_point,
            created_at: p.created_at,
            last_movement_at: p.last_movement_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockChangeResponse {
    pub message: &'static str,
    pub sku: String,
    pub transaction_type: TransactionType,
    pub quantity: i64,
    pub current_stock: i64,
    pub status: StockStatus,
}

impl From<StockChangeOutcome> for StockChangeResponse {
    fn from(o: StockChangeOutcome) -> Self {
        Self {
            message: match o.transaction_type {
                TransactionType::Sale => "Sale processed successfully",
                _ => "Stock updated successfully",
            },
            status: o.product.status(),
            sku: o.product.sku.as_str().to_string(),
            transaction_type: o.transaction_type,
            quantity: o.delta,
            current_stock: o.product.current_stock,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResponse {
    pub id: String,
    pub sku: String,
    pub product_name: String,
    pub handled_by: String,
    pub transaction_type: TransactionType,
    pub quantity: i64,
    pub notes: String,
    pub transaction_date: DateTime<Utc>,
}

impl From<TransactionView> for TransactionResponse {
    fn from(v: TransactionView) -> Self {
        let e = v.entry;
        Self {
            id: e.transaction_id.to_string(),
            sku: e.sku.as_str().to_string(),
            product_name: e.product_name,
            handled_by: v.handled_by,
            transaction_type: e.transaction_type,
            quantity: e.quantity,
            notes: e.notes,
            transaction_date: e.transaction_date,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrderResponse {
    pub id: String,
    pub sku: String,
    pub product_name: String,
    pub generated_by: String,
    pub quantity_ordered: i64,
    pub status: PurchaseOrderStatus,
    pub order_date: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub cancel_reason: Option<String>,
}

impl From<PurchaseOrderView> for PurchaseOrderResponse {
    fn from(v: PurchaseOrderView) -> Self {
        let o = v.order;
        Self {
            id: o.order_id.to_string(),
            sku: o.sku.as_str().to_string(),
            product_name: v.product_name,
            generated_by: v.generated_by,
            quantity_ordered: o.quantity_ordered,
            status: o.status,
            order_date: o.order_date,
            closed_at: o.closed_at,
            cancel_reason: o.cancel_reason,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionResponse {
    pub sku: String,
    pub name: String,
    pub current_stock: i64,
    pub velocity: f64,
    pub days_remaining: i64,
    pub status: ForecastStatus,
}

impl From<StockoutPrediction> for PredictionResponse {
    fn from(p: StockoutPrediction) -> Self {
        Self {
            sku: p.sku,
            name: p.name,
            current_stock: p.current_stock,
            velocity: p.velocity,
            days_remaining: p.days_remaining,
            status: p.status,
        }
    }
}
