//! Service wiring and the operations behind every route.
//!
//! Handlers stay thin: they parse the request, call one method here and
//! render the result. Every gated method starts with [`authz::guard`].

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::Value as JsonValue;
use tracing::{info, warn};

use smartstock_auth::{
    Account, AccountCommand, AccountStatus, ActivateAccount, AssignCapabilities, Capability, CapabilitySet,
    DeclineAccount, Hs256Tokens, PasswordHash, RegisterAccount, normalize_email,
};
use smartstock_core::{AccountId, AggregateId};
use smartstock_events::{EventEnvelope, InMemoryEventBus};
use smartstock_forecast::{StockoutForecaster, StockoutPrediction, VelocityForecaster};
use smartstock_infra::command_dispatcher::{CommandDispatcher, DispatchError};
use smartstock_infra::event_store::{InMemoryEventStore, StoredEvent};
use smartstock_infra::external::HttpForecaster;
use smartstock_infra::projections::{
    AccountReadModel, AccountsProjection, LedgerEntry, LedgerProjection, PersonnelRequestReadModel,
    PersonnelRequestsProjection, ProductReadModel, ProductsProjection, PurchaseOrderReadModel, PurchaseOrdersProjection,
    aggregate_types,
};
use smartstock_infra::read_model::InMemoryKeyedStore;
use smartstock_infra::sales_snapshot;
use smartstock_infra::workers::{WorkerHandle, spawn_audit_log};
use smartstock_inventory::{
    CreateProduct, InventoryCommand, Product, ProductId, RecordTransaction, Sku, StockStatus, TransactionId,
    TransactionType,
};
use smartstock_personnel::{
    Decision, PersonnelCommand, PersonnelRequest, PersonnelRequestId, RequestType, ResolveRequest, SubmitRequest,
};
use smartstock_purchasing::{
    CancelPurchaseOrder, FulfillPurchaseOrder, GeneratePurchaseOrder, PurchaseOrder, PurchaseOrderCommand,
    PurchaseOrderId,
};

use crate::app::errors::ServiceError;
use crate::authz::{self, Requires};
use crate::config::{AppConfig, BootstrapAdmin};
use crate::context::CallerContext;

pub type EnvelopeBus = Arc<InMemoryEventBus<EventEnvelope<JsonValue>>>;
pub type Dispatcher = CommandDispatcher<InMemoryEventStore, EnvelopeBus>;

type Accounts = AccountsProjection<InMemoryKeyedStore<AccountId, AccountReadModel>>;
type Requests = PersonnelRequestsProjection<InMemoryKeyedStore<PersonnelRequestId, PersonnelRequestReadModel>>;
type Products = ProductsProjection<InMemoryKeyedStore<ProductId, ProductReadModel>>;
type Orders = PurchaseOrdersProjection<InMemoryKeyedStore<PurchaseOrderId, PurchaseOrderReadModel>>;

const VIEW_PRODUCTS: Requires = Requires(&[
    Capability::ViewInventory,
    Capability::ManageInventory,
    Capability::ProcessSale,
]);
const VIEW_PREDICTIONS: Requires = Requires(&[Capability::ViewInventory, Capability::ManageInventory]);
const MANAGE_INVENTORY: Requires = Requires(&[Capability::ManageInventory]);
const PROCESS_SALE: Requires = Requires(&[Capability::ProcessSale]);
const VIEW_USER_LIST: Requires = Requires(&[Capability::ViewUserList]);
const APPROVE_USER_CREATION: Requires = Requires(&[Capability::ApproveUserCreation]);
const CREATE_USER_REQUEST: Requires = Requires(&[Capability::CreateUserRequest]);
const VIEW_REQUESTS: Requires = Requires(&[Capability::ViewRequests]);
const ASSIGN_PERMISSION: Requires = Requires(&[Capability::AssignPermission]);

/// Decision on a pending registration.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RegistrationAction {
    Approve,
    Decline,
}

#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub token: String,
    pub capabilities: CapabilitySet,
}

#[derive(Debug, Clone)]
pub struct StockChangeOutcome {
    pub product: ProductReadModel,
    pub transaction_type: TransactionType,
    pub delta: i64,
}

/// A ledger line with the handler's username resolved.
#[derive(Debug, Clone)]
pub struct TransactionView {
    pub entry: LedgerEntry,
    pub handled_by: String,
}

/// A purchase order with product name and requester username resolved.
#[derive(Debug, Clone)]
pub struct PurchaseOrderView {
    pub order: PurchaseOrderReadModel,
    pub product_name: String,
    pub generated_by: String,
}

/// A personnel request with the requester's and resolver's usernames resolved.
#[derive(Debug, Clone)]
pub struct PersonnelRequestView {
    pub request: PersonnelRequestReadModel,
    pub requested_by: String,
    pub resolved_by: Option<String>,
}

pub struct AppServices {
    dispatcher: Dispatcher,
    accounts: Arc<Accounts>,
    requests: Arc<Requests>,
    products: Arc<Products>,
    ledger: Arc<LedgerProjection>,
    orders: Arc<Orders>,
    tokens: Arc<Hs256Tokens>,
    forecaster: Arc<dyn StockoutForecaster>,
    forecast_timeout: Duration,
    forecast_window_days: u32,
    bcrypt_cost: u32,
    /// Serializes the email uniqueness check with the registration append.
    registration: tokio::sync::Mutex<()>,
    _audit: Option<WorkerHandle>,
}

impl AppServices {
    pub fn from_config(config: &AppConfig) -> Result<Self, ServiceError> {
        let bus: EnvelopeBus = Arc::new(InMemoryEventBus::new());

        let accounts = Arc::new(AccountsProjection::new(InMemoryKeyedStore::new()));
        let requests = Arc::new(PersonnelRequestsProjection::new(InMemoryKeyedStore::new()));
        let products = Arc::new(ProductsProjection::new(InMemoryKeyedStore::new()));
        let ledger = Arc::new(LedgerProjection::new());
        let orders = Arc::new(PurchaseOrdersProjection::new(InMemoryKeyedStore::new()));

        let audit = match spawn_audit_log(&bus) {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!(error = %e, "audit log worker not started");
                None
            }
        };

        let dispatcher = CommandDispatcher::new(InMemoryEventStore::new(), bus)
            .with_projection(accounts.clone())
            .with_projection(requests.clone())
            .with_projection(products.clone())
            .with_projection(ledger.clone())
            .with_projection(orders.clone());

        let forecaster: Arc<dyn StockoutForecaster> = match &config.forecast_url {
            Some(url) => Arc::new(
                HttpForecaster::new(url.clone(), config.forecast_timeout)
                    .map_err(|e| ServiceError::Internal(e.to_string()))?,
            ),
            None => Arc::new(VelocityForecaster::new()),
        };
        info!(forecaster = forecaster.name(), "stockout forecaster configured");

        Ok(Self {
            dispatcher,
            accounts,
            requests,
            products,
            ledger,
            orders,
            tokens: Arc::new(Hs256Tokens::new(config.jwt_secret.as_bytes(), config.token_ttl)),
            forecaster,
            forecast_timeout: config.forecast_timeout,
            forecast_window_days: config.forecast_window_days,
            bcrypt_cost: config.bcrypt_cost,
            registration: tokio::sync::Mutex::new(()),
            _audit: audit,
        })
    }

    /// Swap the forecaster, e.g. for a stub in tests.
    pub fn with_forecaster(mut self, forecaster: Arc<dyn StockoutForecaster>) -> Self {
        self.forecaster = forecaster;
        self
    }

    pub fn tokens(&self) -> Arc<Hs256Tokens> {
        Arc::clone(&self.tokens)
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    fn username_of(&self, account_id: AccountId) -> String {
        self.accounts
            .get(&account_id)
            .map(|a| a.username)
            .unwrap_or_else(|| account_id.to_string())
    }

    // ---------------------------------------------------------------------
    // Accounts
    // ---------------------------------------------------------------------

    fn dispatch_account(&self, username: &str, command: AccountCommand) -> Result<Vec<StoredEvent>, DispatchError> {
        self.dispatcher.dispatch(
            Account::stream_id(username),
            aggregate_types::ACCOUNT,
            command,
            |id| Account::empty(id.into()),
        )
    }

    /// Self-service signup. The account starts PENDING with no capabilities.
    pub async fn register(&self, username: &str, password: &str, email: &str) -> Result<AccountReadModel, ServiceError> {
        let username = username.trim().to_string();
        if password.trim().is_empty() {
            return Err(ServiceError::Validation("password cannot be empty".into()));
        }
        let email = normalize_email(email)?;

        if self.accounts.by_username(&username).is_some() {
            return Err(ServiceError::DuplicateUsername(username));
        }

        let hash = hash_password(password.to_string(), self.bcrypt_cost).await?;

        let _registration = self.registration.lock().await;
        if self.accounts.email_taken(&email) {
            return Err(ServiceError::DuplicateEmail(email));
        }

        let account_id: AccountId = Account::stream_id(&username).into();
        self.dispatch_account(
            &username,
            AccountCommand::Register(RegisterAccount {
                account_id,
                username: username.clone(),
                email,
                password: hash,
                occurred_at: Utc::now(),
            }),
        )
        .map_err(|e| {
            ServiceError::from_dispatch(
                e,
                || ServiceError::Internal("account stream vanished".into()),
                || ServiceError::DuplicateUsername(username.clone()),
            )
        })?;

        info!(username = %username, "registration submitted");
        self.accounts
            .get(&account_id)
            .ok_or_else(|| ServiceError::Internal("registered account not projected".into()))
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<LoginOutcome, ServiceError> {
        let account = self
            .accounts
            .by_username(username.trim())
            .ok_or(ServiceError::InvalidCredentials)?;

        if !verify_password(account.password.clone(), password.to_string()).await {
            return Err(ServiceError::InvalidCredentials);
        }
        if account.status != AccountStatus::Active {
            return Err(ServiceError::AccountNotActivated);
        }

        let token = self
            .tokens
            .issue(account.account_id, &account.username, Utc::now())
            .map_err(|e| ServiceError::Internal(e.to_string()))?;

        info!(username = %account.username, "login");
        Ok(LoginOutcome {
            token,
            capabilities: account.capabilities,
        })
    }

    pub fn profile(&self, caller: &CallerContext) -> Result<AccountReadModel, ServiceError> {
        authz::resolve_principal(&self.accounts, caller)?;
        self.accounts
            .get(&caller.account_id())
            .ok_or(ServiceError::Unauthenticated)
    }

    /// Active accounts, oldest first.
    pub fn list_users(&self, caller: &CallerContext) -> Result<Vec<AccountReadModel>, ServiceError> {
        authz::guard(&self.accounts, caller, VIEW_USER_LIST)?;
        Ok(self.accounts.list_by_status(AccountStatus::Active))
    }

    pub fn list_pending_registrations(&self, caller: &CallerContext) -> Result<Vec<AccountReadModel>, ServiceError> {
        authz::guard(&self.accounts, caller, APPROVE_USER_CREATION)?;
        Ok(self.accounts.list_by_status(AccountStatus::Pending))
    }

    pub fn process_registration(
        &self,
        caller: &CallerContext,
        username: &str,
        action: RegistrationAction,
    ) -> Result<AccountReadModel, ServiceError> {
        let principal = authz::guard(&self.accounts, caller, APPROVE_USER_CREATION)?;
        let target = self
            .accounts
            .by_username(username.trim())
            .ok_or_else(|| ServiceError::UnknownUser(username.to_string()))?;

        let occurred_at = Utc::now();
        let command = match action {
            RegistrationAction::Approve => AccountCommand::Activate(ActivateAccount {
                account_id: target.account_id,
                approved_by: principal.account_id,
                occurred_at,
            }),
            RegistrationAction::Decline => AccountCommand::Decline(DeclineAccount {
                account_id: target.account_id,
                declined_by: principal.account_id,
                occurred_at,
            }),
        };

        self.dispatch_account(&target.username, command).map_err(|e| {
            ServiceError::from_dispatch(
                e,
                || ServiceError::UnknownUser(target.username.clone()),
                || ServiceError::DuplicateUsername(target.username.clone()),
            )
        })?;

        info!(username = %target.username, by = %principal.username, ?action, "registration processed");
        self.accounts
            .get(&target.account_id)
            .ok_or_else(|| ServiceError::UnknownUser(target.username.clone()))
    }

    /// Replace the target's capability set wholesale.
    pub fn assign_capabilities(
        &self,
        caller: &CallerContext,
        target_username: &str,
        names: &[String],
    ) -> Result<AccountReadModel, ServiceError> {
        let principal = authz::guard(&self.accounts, caller, ASSIGN_PERMISSION)?;
        let capabilities = CapabilitySet::from_names(names.iter().map(String::as_str))?;
        let target = self
            .accounts
            .by_username(target_username.trim())
            .ok_or_else(|| ServiceError::UnknownUser(target_username.to_string()))?;

        self.dispatch_account(
            &target.username,
            AccountCommand::AssignCapabilities(AssignCapabilities {
                account_id: target.account_id,
                capabilities: capabilities.clone(),
                assigned_by: principal.account_id,
                occurred_at: Utc::now(),
            }),
        )
        .map_err(|e| {
            ServiceError::from_dispatch(
                e,
                || ServiceError::UnknownUser(target.username.clone()),
                || ServiceError::Conflict(target.username.clone()),
            )
        })?;

        info!(
            username = %target.username,
            by = %principal.username,
            capabilities = ?capabilities.names(),
            "capabilities assigned"
        );
        self.accounts
            .get(&target.account_id)
            .ok_or_else(|| ServiceError::UnknownUser(target.username.clone()))
    }

    /// Create the seeded administrator unless an account with that username exists.
    pub async fn bootstrap_admin(&self, admin: &BootstrapAdmin) -> Result<(), ServiceError> {
        let username = admin.username.trim();
        if self.accounts.by_username(username).is_some() {
            info!(username = %username, "bootstrap administrator already present");
            return Ok(());
        }

        let account = self.register(username, &admin.password, &admin.email).await?;
        let now = Utc::now();
        let system = account.account_id;

        for command in [
            AccountCommand::Activate(ActivateAccount {
                account_id: account.account_id,
                approved_by: system,
                occurred_at: now,
            }),
            AccountCommand::AssignCapabilities(AssignCapabilities {
                account_id: account.account_id,
                capabilities: CapabilitySet::all(),
                assigned_by: system,
                occurred_at: now,
            }),
        ] {
            self.dispatch_account(&account.username, command).map_err(|e| {
                ServiceError::from_dispatch(
                    e,
                    || ServiceError::UnknownUser(account.username.clone()),
                    || ServiceError::DuplicateUsername(account.username.clone()),
                )
            })?;
        }

        info!(username = %account.username, "bootstrap administrator created");
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Personnel requests
    // ---------------------------------------------------------------------

    fn dispatch_request(
        &self,
        request_id: PersonnelRequestId,
        command: PersonnelCommand,
    ) -> Result<Vec<StoredEvent>, DispatchError> {
        self.dispatcher.dispatch(
            request_id.0,
            aggregate_types::PERSONNEL_REQUEST,
            command,
            |id| PersonnelRequest::empty(PersonnelRequestId::new(id)),
        )
    }

    fn request_view(&self, request: PersonnelRequestReadModel) -> PersonnelRequestView {
        PersonnelRequestView {
            requested_by: self.username_of(request.requested_by),
            resolved_by: request.resolved_by.map(|id| self.username_of(id)),
            request,
        }
    }

    pub fn submit_request(
        &self,
        caller: &CallerContext,
        request_type: RequestType,
        target_username: &str,
        target_email: Option<&str>,
        reason: &str,
    ) -> Result<PersonnelRequestView, ServiceError> {
        let principal = authz::guard(&self.accounts, caller, CREATE_USER_REQUEST)?;
        let request_id = PersonnelRequestId::new(AggregateId::new());

        self.dispatch_request(
            request_id,
            PersonnelCommand::Submit(SubmitRequest {
                request_id,
                request_type,
                target_username: target_username.trim().to_string(),
                target_email: target_email.map(str::to_string),
                reason: reason.to_string(),
                requested_by: principal.account_id,
                occurred_at: Utc::now(),
            }),
        )
        .map_err(|e| {
            ServiceError::from_dispatch(
                e,
                || ServiceError::UnknownRequest(request_id.to_string()),
                || ServiceError::Conflict(format!("request {request_id} already exists")),
            )
        })?;

        info!(%request_id, ?request_type, by = %principal.username, "personnel request submitted");
        self.requests
            .get(&request_id)
            .map(|r| self.request_view(r))
            .ok_or_else(|| ServiceError::UnknownRequest(request_id.to_string()))
    }

    /// All requests, newest first, regardless of who submitted them.
    pub fn list_requests(&self, caller: &CallerContext) -> Result<Vec<PersonnelRequestView>, ServiceError> {
        authz::guard(&self.accounts, caller, VIEW_REQUESTS)?;
        Ok(self.requests.list().into_iter().map(|r| self.request_view(r)).collect())
    }

    pub fn resolve_request(
        &self,
        caller: &CallerContext,
        request_id: PersonnelRequestId,
        decision: Decision,
    ) -> Result<PersonnelRequestView, ServiceError> {
        let principal = authz::guard(&self.accounts, caller, APPROVE_USER_CREATION)?;

        self.dispatch_request(
            request_id,
            PersonnelCommand::Resolve(ResolveRequest {
                request_id,
                decision,
                resolved_by: principal.account_id,
                occurred_at: Utc::now(),
            }),
        )
        .map_err(|e| {
            ServiceError::from_dispatch(
                e,
                || ServiceError::UnknownRequest(request_id.to_string()),
                || ServiceError::AlreadyResolved,
            )
        })?;

        info!(%request_id, ?decision, by = %principal.username, "personnel request resolved");
        self.requests
            .get(&request_id)
            .map(|r| self.request_view(r))
            .ok_or_else(|| ServiceError::UnknownRequest(request_id.to_string()))
    }

    // ---------------------------------------------------------------------
    // Inventory
    // ---------------------------------------------------------------------

    fn dispatch_product(&self, product_id: ProductId, command: InventoryCommand) -> Result<Vec<StoredEvent>, DispatchError> {
        self.dispatcher.dispatch(
            product_id.aggregate_id(),
            aggregate_types::PRODUCT,
            command,
            |id| Product::empty(ProductId(id)),
        )
    }

    pub fn list_products(&self, caller: &CallerContext) -> Result<Vec<ProductReadModel>, ServiceError> {
        authz::guard(&self.accounts, caller, VIEW_PRODUCTS)?;
        Ok(self.products.list())
    }

    pub fn create_product(
        &self,
        caller: &CallerContext,
        sku: &str,
        name: &str,
        category: &str,
        unit_price: u64,
        reorder_point: i64,
    ) -> Result<ProductReadModel, ServiceError> {
        let principal = authz::guard(&self.accounts, caller, MANAGE_INVENTORY)?;
        let sku = Sku::parse(sku)?;
        let product_id = ProductId::for_sku(&sku);

        self.dispatch_product(
            product_id,
            InventoryCommand::CreateProduct(CreateProduct {
                product_id,
                sku: sku.clone(),
                name: name.trim().to_string(),
                category: category.trim().to_string(),
                unit_price,
                reorder_point,
                created_by: principal.account_id,
                occurred_at: Utc::now(),
            }),
        )
        .map_err(|e| {
            ServiceError::from_dispatch(
                e,
                || ServiceError::UnknownSku(sku.to_string()),
                || ServiceError::DuplicateSku(sku.to_string()),
            )
        })?;

        info!(%sku, by = %principal.username, "product created");
        self.products
            .get(&product_id)
            .ok_or_else(|| ServiceError::UnknownSku(sku.to_string()))
    }

    /// Append one ledger line. SALE needs PROCESS_SALE; RESTOCK and ADJUSTMENT need MANAGE_INVENTORY.
    pub fn record_stock_change(
        &self,
        caller: &CallerContext,
        sku: &str,
        transaction_type: TransactionType,
        quantity: i64,
        notes: Option<String>,
    ) -> Result<StockChangeOutcome, ServiceError> {
        let requires = match transaction_type {
            TransactionType::Sale => PROCESS_SALE,
            TransactionType::Restock | TransactionType::Adjustment => MANAGE_INVENTORY,
        };
        let principal = authz::guard(&self.accounts, caller, requires)?;

        let sku = Sku::parse(sku)?;
        let product_id = ProductId::for_sku(&sku);
        if self.products.get(&product_id).is_none() {
            return Err(ServiceError::UnknownSku(sku.to_string()));
        }

        let committed = self
            .dispatch_product(
                product_id,
                InventoryCommand::RecordTransaction(RecordTransaction {
                    product_id,
                    transaction_id: TransactionId::new(),
                    transaction_type,
                    quantity,
                    handled_by: principal.account_id,
                    notes: notes.filter(|n| !n.trim().is_empty()),
                    occurred_at: Utc::now(),
                }),
            )
            .map_err(|e| {
                ServiceError::from_dispatch(
                    e,
                    || ServiceError::UnknownSku(sku.to_string()),
                    || ServiceError::DuplicateSku(sku.to_string()),
                )
            })?;

        let product = self
            .products
            .get(&product_id)
            .ok_or_else(|| ServiceError::UnknownSku(sku.to_string()))?;
        let delta = match transaction_type {
            TransactionType::Sale => -quantity,
            _ => quantity,
        };

        info!(
            %sku,
            kind = transaction_type.as_str(),
            delta,
            stock = product.current_stock,
            by = %principal.username,
            events = committed.len(),
            "stock changed"
        );
        Ok(StockChangeOutcome {
            product,
            transaction_type,
            delta,
        })
    }

    pub fn record_sale(&self, caller: &CallerContext, sku: &str, quantity: i64) -> Result<StockChangeOutcome, ServiceError> {
        self.record_stock_change(caller, sku, TransactionType::Sale, quantity, None)
    }

    /// Full ledger, newest first.
    pub fn list_transactions(&self, caller: &CallerContext) -> Result<Vec<TransactionView>, ServiceError> {
        authz::guard(&self.accounts, caller, MANAGE_INVENTORY)?;
        Ok(self
            .ledger
            .history()
            .into_iter()
            .map(|entry| TransactionView {
                handled_by: self.username_of(entry.handled_by),
                entry,
            })
            .collect())
    }

    // ---------------------------------------------------------------------
    // Purchase orders
    // ---------------------------------------------------------------------

    fn dispatch_order(
        &self,
        order_id: PurchaseOrderId,
        command: PurchaseOrderCommand,
    ) -> Result<Vec<StoredEvent>, DispatchError> {
        self.dispatcher.dispatch(
            order_id.0,
            aggregate_types::PURCHASE_ORDER,
            command,
            |id| PurchaseOrder::empty(PurchaseOrderId::new(id)),
        )
    }

    fn order_view(&self, order: PurchaseOrderReadModel) -> PurchaseOrderView {
        PurchaseOrderView {
            product_name: self.products.get(&order.product_id).map(|p| p.name).unwrap_or_default(),
            generated_by: self.username_of(order.generated_by),
            order,
        }
    }

    fn order_result(&self, order_id: PurchaseOrderId) -> Result<PurchaseOrderView, ServiceError> {
        self.orders
            .get(&order_id)
            .map(|o| self.order_view(o))
            .ok_or_else(|| ServiceError::UnknownPurchaseOrder(order_id.to_string()))
    }

    /// Only products whose derived status is LOW_STOCK can be ordered.
    pub fn generate_purchase_order(
        &self,
        caller: &CallerContext,
        sku: &str,
        quantity: i64,
    ) -> Result<PurchaseOrderView, ServiceError> {
        let principal = authz::guard(&self.accounts, caller, MANAGE_INVENTORY)?;
        let sku = Sku::parse(sku)?;
        let product = self
            .products
            .by_sku(&sku)
            .ok_or_else(|| ServiceError::UnknownSku(sku.to_string()))?;
        if product.status() == StockStatus::Healthy {
            return Err(ServiceError::InvalidStateTransition(format!(
                "{sku} is healthy; purchase orders are only generated for low stock"
            )));
        }
        let order_id = PurchaseOrderId::new(AggregateId::new());

        self.dispatch_order(
            order_id,
            PurchaseOrderCommand::Generate(GeneratePurchaseOrder {
                order_id,
                product_id: product.product_id,
                sku: sku.clone(),
                quantity,
                generated_by: principal.account_id,
                occurred_at: Utc::now(),
            }),
        )
        .map_err(|e| {
            ServiceError::from_dispatch(
                e,
                || ServiceError::UnknownPurchaseOrder(order_id.to_string()),
                || ServiceError::Conflict(format!("purchase order {order_id} already exists")),
            )
        })?;

        info!(%order_id, %sku, quantity, by = %principal.username, "purchase order generated");
        self.order_result(order_id)
    }

    /// All orders, newest first.
    pub fn list_purchase_orders(&self, caller: &CallerContext) -> Result<Vec<PurchaseOrderView>, ServiceError> {
        authz::guard(&self.accounts, caller, MANAGE_INVENTORY)?;
        Ok(self.orders.list().into_iter().map(|o| self.order_view(o)).collect())
    }

    pub fn fulfill_purchase_order(
        &self,
        caller: &CallerContext,
        order_id: PurchaseOrderId,
    ) -> Result<PurchaseOrderView, ServiceError> {
        let principal = authz::guard(&self.accounts, caller, MANAGE_INVENTORY)?;
        self.dispatch_order(
            order_id,
            PurchaseOrderCommand::Fulfill(FulfillPurchaseOrder {
                order_id,
                fulfilled_by: principal.account_id,
                occurred_at: Utc::now(),
            }),
        )
        .map_err(|e| order_error(e, order_id))?;

        info!(%order_id, by = %principal.username, "purchase order fulfilled");
        self.order_result(order_id)
    }

    pub fn cancel_purchase_order(
        &self,
        caller: &CallerContext,
        order_id: PurchaseOrderId,
        reason: Option<String>,
    ) -> Result<PurchaseOrderView, ServiceError> {
        let principal = authz::guard(&self.accounts, caller, MANAGE_INVENTORY)?;
        self.dispatch_order(
            order_id,
            PurchaseOrderCommand::Cancel(CancelPurchaseOrder {
                order_id,
                cancelled_by: principal.account_id,
                reason: reason.filter(|r| !r.trim().is_empty()),
                occurred_at: Utc::now(),
            }),
        )
        .map_err(|e| order_error(e, order_id))?;

        info!(%order_id, by = %principal.username, "purchase order cancelled");
        self.order_result(order_id)
    }

    // ---------------------------------------------------------------------
    // Predictions
    // ---------------------------------------------------------------------

    /// Advisory stockout predictions. Any forecaster failure or timeout yields an empty list.
    pub async fn stockout_predictions(&self, caller: &CallerContext) -> Result<Vec<StockoutPrediction>, ServiceError> {
        authz::guard(&self.accounts, caller, VIEW_PREDICTIONS)?;

        let snapshot = sales_snapshot(&self.products, &self.ledger, Utc::now(), self.forecast_window_days);
        match tokio::time::timeout(self.forecast_timeout, self.forecaster.predict(&snapshot)).await {
            Ok(Ok(predictions)) => Ok(predictions),
            Ok(Err(e)) => {
                warn!(forecaster = self.forecaster.name(), error = %e, "stockout forecast failed");
                Ok(vec![])
            }
            Err(_) => {
                warn!(
                    forecaster = self.forecaster.name(),
                    timeout_ms = self.forecast_timeout.as_millis() as u64,
                    "stockout forecast timed out"
                );
                Ok(vec![])
            }
        }
    }
}

fn order_error(err: DispatchError, order_id: PurchaseOrderId) -> ServiceError {
    ServiceError::from_dispatch(
        err,
        || ServiceError::UnknownPurchaseOrder(order_id.to_string()),
        || ServiceError::Conflict(format!("purchase order {order_id} already exists")),
    )
}

async fn hash_password(plain: String, cost: u32) -> Result<PasswordHash, ServiceError> {
    tokio::task::spawn_blocking(move || PasswordHash::hash(&plain, cost))
        .await
        .map_err(|e| ServiceError::Internal(e.to_string()))?
        .map_err(|e| ServiceError::Internal(e.to_string()))
}

async fn verify_password(hash: PasswordHash, plain: String) -> bool {
    tokio::task::spawn_blocking(move || hash.verify(&plain))
        .await
        .unwrap_or(false)
}
