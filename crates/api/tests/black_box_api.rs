use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::{Value, json};

use smartstock_api::app::{router, services::AppServices};
use smartstock_api::config::{AppConfig, BootstrapAdmin};
use smartstock_core::AccountId;
use smartstock_forecast::{ForecastError, SalesSnapshot, StockoutForecaster, StockoutPrediction};

const JWT_SECRET: &str = "test-secret";
const ADMIN: &str = "admin";
const ADMIN_PASSWORD: &str = "admin-pass";

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn test_config() -> AppConfig {
    AppConfig {
        jwt_secret: JWT_SECRET.to_string(),
        bcrypt_cost: 4,
        forecast_timeout: Duration::from_millis(200),
        bootstrap_admin: Some(BootstrapAdmin {
            username: ADMIN.to_string(),
            password: ADMIN_PASSWORD.to_string(),
            email: "admin@example.com".to_string(),
        }),
        ..AppConfig::default()
    }
}

impl TestServer {
    async fn spawn() -> Self {
        Self::spawn_with(None).await
    }

    async fn spawn_with(forecaster: Option<Arc<dyn StockoutForecaster>>) -> Self {
        let config = test_config();
        let mut services = AppServices::from_config(&config).unwrap();
        if let Some(f) = forecaster {
            services = services.with_forecaster(f);
        }
        services
            .bootstrap_admin(config.bootstrap_admin.as_ref().unwrap())
            .await
            .unwrap();

        let app = router(Arc::new(services));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            client: reqwest::Client::new(),
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post(&self, path: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        let mut req = self.client.post(self.url(path)).json(&body);
        if let Some(t) = token {
            req = req.bearer_auth(t);
        }
        let res = req.send().await.unwrap();
        let status = res.status();
        (status, res.json().await.unwrap_or(Value::Null))
    }

    async fn get(&self, path: &str, token: &str) -> (StatusCode, Value) {
        let res = self.client.get(self.url(path)).bearer_auth(token).send().await.unwrap();
        let status = res.status();
        (status, res.json().await.unwrap_or(Value::Null))
    }

    async fn login(&self, username: &str, password: &str) -> (StatusCode, Value) {
        self.post("/api/login", None, json!({ "username": username, "password": password }))
            .await
    }

    async fn admin_token(&self) -> String {
        let (status, body) = self.login(ADMIN, ADMIN_PASSWORD).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["token"].as_str().unwrap().to_string()
    }

    async fn register(&self, username: &str, email: &str) -> (StatusCode, Value) {
        self.post(
            "/api/register",
            None,
            json!({ "username": username, "password": "pw-123", "email": email }),
        )
        .await
    }

    /// Register, approve and grant `permissions`; returns a fresh token.
    async fn staff(&self, admin: &str, username: &str, permissions: &[&str]) -> String {
        let (status, _) = self.register(username, &format!("{username}@example.com")).await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, _) = self
            .post(
                &format!("/api/admin/process-registration/{username}"),
                Some(admin),
                json!({ "action": "APPROVE" }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = self
            .post(
                "/api/admin/assign-permissions",
                Some(admin),
                json!({ "username": username, "permissions": permissions }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        let (status, body) = self.login(username, "pw-123").await;
        assert_eq!(status, StatusCode::OK);
        body["token"].as_str().unwrap().to_string()
    }
}

#[tokio::test]
async fn health_is_public_and_everything_else_needs_a_token() {
    let srv = TestServer::spawn().await;

    let res = srv.client.get(srv.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = srv.client.get(srv.url("/api/user/profile")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "unauthenticated");

    let (status, _) = srv.get("/api/inventory/products", "not-a-jwt").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn expired_token_is_rejected() {
    let srv = TestServer::spawn().await;
    let now = Utc::now();
    let claims = json!({
        "sub": AccountId::new(),
        "username": ADMIN,
        "iat": (now - ChronoDuration::hours(2)).timestamp(),
        "exp": (now - ChronoDuration::hours(1)).timestamp(),
    });
    let token = jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap();

    let (status, _) = srv.get("/api/user/profile", &token).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn malformed_bodies_use_the_error_envelope() {
    let srv = TestServer::spawn().await;
    let admin = srv.admin_token().await;

    let res = srv
        .client
        .post(srv.url("/api/login"))
        .header("content-type", "application/json")
        .body("not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation");
    assert!(body["message"].is_string());

    // Well-formed JSON missing a required field.
    let (status, body) = srv.post("/api/register", None, json!({ "username": "nobody" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation");

    // Fractional price is not an integer of minor units.
    let (status, body) = srv
        .post(
            "/api/inventory/products",
            Some(&admin),
            json!({ "sku": "ITEM-X", "name": "X", "unitPrice": 12.5 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation");

    let res = srv
        .client
        .post(srv.url("/api/inventory/products"))
        .bearer_auth(&admin)
        .body(r#"{"sku":"ITEM-X","name":"X"}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation");
}

#[tokio::test]
async fn registration_activation_and_quarantine() {
    let srv = TestServer::spawn().await;
    let admin = srv.admin_token().await;

    let (status, _) = srv.register("carol", "Carol@Example.com").await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = srv.login("carol", "pw-123").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "account_not_activated");

    let (status, body) = srv.login("carol", "wrong").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid_credentials");

    let (_, pending) = srv.get("/api/admin/pending-registrations", &admin).await;
    let pending = pending.as_array().unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0]["email"], "carol@example.com");

    let (status, _) = srv
        .post(
            "/api/admin/process-registration/carol",
            Some(&admin),
            json!({ "action": "APPROVE" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // Approving twice is not a valid transition.
    let (status, body) = srv
        .post(
            "/api/admin/process-registration/carol",
            Some(&admin),
            json!({ "action": "DECLINE" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "invalid_state_transition");

    let (status, body) = srv.login("carol", "pw-123").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["permissions"], json!([]));
    let carol = body["token"].as_str().unwrap().to_string();

    // Quarantined: authenticated, but every gated operation is denied uniformly.
    for path in [
        "/api/admin/users",
        "/api/admin/pending-registrations",
        "/api/admin/requests",
        "/api/inventory/products",
        "/api/inventory/transactions",
        "/api/inventory/purchase-orders",
        "/api/predict/stockout",
    ] {
        let (status, body) = srv.get(path, &carol).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "GET {path}");
        assert_eq!(body, json!({ "error": "permission_denied", "message": "permission denied" }), "GET {path}");
    }

    let some_id = AccountId::new().to_string();
    let writes = [
        ("/api/admin/process-registration/carol".to_string(), json!({ "action": "APPROVE" })),
        (
            "/api/admin/submit-request".to_string(),
            json!({ "requestType": "DELETE", "targetUsername": "bob", "reason": "left" }),
        ),
        (format!("/api/admin/approve-request/{some_id}"), json!({ "status": "APPROVED" })),
        (
            "/api/admin/assign-permissions".to_string(),
            json!({ "username": "carol", "permissions": ["VIEW_INVENTORY"] }),
        ),
        ("/api/inventory/products".to_string(), json!({ "sku": "Q-1", "name": "Quarantine" })),
        (
            "/api/inventory/stock/update".to_string(),
            json!({ "sku": "Q-1", "quantity": 1, "transactionType": "RESTOCK" }),
        ),
        ("/api/inventory/sale".to_string(), json!({ "sku": "Q-1", "quantity": 1 })),
        ("/api/inventory/purchase-orders".to_string(), json!({ "sku": "Q-1", "quantity": 1 })),
        (format!("/api/inventory/purchase-orders/{some_id}/fulfill"), json!({})),
        (format!("/api/inventory/purchase-orders/{some_id}/cancel"), json!({ "reason": "x" })),
    ];
    for (path, payload) in writes {
        let (status, body) = srv.post(&path, Some(&carol), payload).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "POST {path}");
        assert_eq!(body["error"], "permission_denied", "POST {path}");
    }

    let (status, _) = srv
        .post(
            "/api/admin/assign-permissions",
            Some(&admin),
            json!({ "username": "carol", "permissions": ["VIEW_INVENTORY"] }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // Same token, new capability: capabilities are never read from the token.
    let (status, _) = srv.get("/api/inventory/products", &carol).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn duplicate_username_fails_in_every_state() {
    let srv = TestServer::spawn().await;
    let admin = srv.admin_token().await;

    let (status, _) = srv.register("bob", "bob@example.com").await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = srv.register("bob", "other@example.com").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "duplicate_username");

    let (status, _) = srv
        .post(
            "/api/admin/process-registration/bob",
            Some(&admin),
            json!({ "action": "DECLINE" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = srv.register("bob", "third@example.com").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "duplicate_username");

    let (status, body) = srv.register("robert", "BOB@example.com").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "duplicate_email");

    let (status, body) = srv.login("bob", "pw-123").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "account_not_activated");
}

#[tokio::test]
async fn unknown_capability_is_rejected_without_effect() {
    let srv = TestServer::spawn().await;
    let admin = srv.admin_token().await;
    srv.staff(&admin, "dana", &["VIEW_INVENTORY"]).await;

    let (status, body) = srv
        .post(
            "/api/admin/assign-permissions",
            Some(&admin),
            json!({ "username": "dana", "permissions": ["MANAGE_INVENTORY", "FLY"] }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "unknown_capability");

    let (_, users) = srv.get("/api/admin/users", &admin).await;
    let dana = users
        .as_array()
        .unwrap()
        .iter()
        .find(|u| u["username"] == "dana")
        .unwrap()
        .clone();
    assert_eq!(dana["permissions"], json!(["VIEW_INVENTORY"]));

    let (status, body) = srv
        .post(
            "/api/admin/assign-permissions",
            Some(&admin),
            json!({ "username": "nobody", "permissions": [] }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "unknown_user");
}

#[tokio::test]
async fn self_assignment_is_visible_in_next_profile() {
    let srv = TestServer::spawn().await;
    let admin = srv.admin_token().await;
    let token = srv.staff(&admin, "erin", &["ASSIGN_PERMISSION"]).await;

    let (status, _) = srv
        .post(
            "/api/admin/assign-permissions",
            Some(&token),
            json!({ "username": "erin", "permissions": ["ASSIGN_PERMISSION", "VIEW_REQUESTS"] }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, profile) = srv.get("/api/user/profile", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["permissions"], json!(["ASSIGN_PERMISSION", "VIEW_REQUESTS"]));

    let (status, _) = srv.get("/api/admin/requests", &token).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn item_1_ledger_walkthrough() {
    let srv = TestServer::spawn().await;
    let admin = srv.admin_token().await;
    let clerk = srv.staff(&admin, "clerk", &["PROCESS_SALE"]).await;

    let (status, product) = srv
        .post(
            "/api/inventory/products",
            Some(&admin),
            json!({ "sku": "ITEM-1", "name": "Widget", "category": "General", "unitPrice": 1250, "reorderPoint": 10 }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(product["currentStock"], 0);
    assert_eq!(product["status"], "LOW_STOCK");
    assert_eq!(product["unitPrice"], 1250);
    assert!(product["lastMovementAt"].is_null());

    let (status, body) = srv
        .post(
            "/api/inventory/products",
            Some(&admin),
            json!({ "sku": "ITEM-1", "name": "Other" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "duplicate_sku");

    // The clerk may sell but not restock.
    let (status, _) = srv
        .post(
            "/api/inventory/stock/update",
            Some(&clerk),
            json!({ "sku": "ITEM-1", "quantity": 20, "transactionType": "RESTOCK" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = srv
        .post(
            "/api/inventory/stock/update",
            Some(&admin),
            json!({ "sku": "ITEM-1", "quantity": 20, "transactionType": "RESTOCK", "notes": "supplier drop" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["currentStock"], 20);
    assert_eq!(body["status"], "HEALTHY");

    let (status, body) = srv
        .post("/api/inventory/sale", Some(&clerk), json!({ "sku": "ITEM-1", "quantity": 16 }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["currentStock"], 4);
    assert_eq!(body["status"], "LOW_STOCK");

    let (status, body) = srv
        .post("/api/inventory/sale", Some(&clerk), json!({ "sku": "ITEM-1", "quantity": 10 }))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "insufficient_stock");

    let (status, body) = srv
        .post("/api/inventory/sale", Some(&clerk), json!({ "sku": "ITEM-1", "quantity": 0 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_quantity");

    let (status, body) = srv
        .post("/api/inventory/sale", Some(&clerk), json!({ "sku": "NOPE-1", "quantity": 1 }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "unknown_sku");

    let (status, history) = srv.get("/api/inventory/transactions", &admin).await;
    assert_eq!(status, StatusCode::OK);
    let history = history.as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["quantity"], -16);
    assert_eq!(history[0]["transactionType"], "SALE");
    assert_eq!(history[0]["handledBy"], "clerk");
    assert_eq!(history[0]["notes"], "Point of Sale transaction");
    assert_eq!(history[1]["quantity"], 20);

    let (_, products) = srv.get("/api/inventory/products", &clerk).await;
    assert_eq!(products[0]["currentStock"], 4);
    assert_eq!(products[0]["status"], "LOW_STOCK");
    assert_eq!(products[0]["lastMovementAt"], history[0]["transactionDate"]);
}

#[tokio::test]
async fn personnel_request_resolves_exactly_once() {
    let srv = TestServer::spawn().await;
    let admin = srv.admin_token().await;
    let hr = srv.staff(&admin, "hr", &["CREATE_USER_REQUEST"]).await;

    let (status, created) = srv
        .post(
            "/api/admin/submit-request",
            Some(&hr),
            json!({ "requestType": "CREATE", "targetUsername": "newbie", "targetEmail": "newbie@example.com", "reason": "new hire" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "PENDING");
    assert_eq!(created["createdBy"], "hr");
    let id = created["id"].as_str().unwrap().to_string();

    // Submitting does not grant the right to resolve.
    let (status, _) = srv
        .post(
            &format!("/api/admin/approve-request/{id}"),
            Some(&hr),
            json!({ "status": "APPROVED" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = srv
        .post(
            &format!("/api/admin/approve-request/{id}"),
            Some(&admin),
            json!({ "status": "APPROVED" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "APPROVED");

    let (status, body) = srv
        .post(
            &format!("/api/admin/approve-request/{id}"),
            Some(&admin),
            json!({ "status": "REJECTED" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "already_resolved");

    let (_, requests) = srv.get("/api/admin/requests", &admin).await;
    assert_eq!(requests[0]["status"], "APPROVED");
    assert_eq!(requests[0]["approvedBy"], ADMIN);

    let (status, body) = srv
        .post(
            &format!("/api/admin/approve-request/{}", AccountId::new()),
            Some(&admin),
            json!({ "status": "APPROVED" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "unknown_request");
}

#[tokio::test]
async fn purchase_order_lifecycle() {
    let srv = TestServer::spawn().await;
    let admin = srv.admin_token().await;

    srv.post(
        "/api/inventory/products",
        Some(&admin),
        json!({ "sku": "ITEM-2", "name": "Gadget", "reorderPoint": 5 }),
    )
    .await;

    let (status, body) = srv
        .post(
            "/api/inventory/purchase-orders",
            Some(&admin),
            json!({ "sku": "ITEM-2", "quantity": 0 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_quantity");

    let (status, body) = srv
        .post(
            "/api/inventory/purchase-orders",
            Some(&admin),
            json!({ "sku": "MISSING", "quantity": 5 }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "unknown_sku");

    srv.post(
        "/api/inventory/products",
        Some(&admin),
        json!({ "sku": "FULL-1", "name": "Stocked", "reorderPoint": 5 }),
    )
    .await;
    srv.post(
        "/api/inventory/stock/update",
        Some(&admin),
        json!({ "sku": "FULL-1", "quantity": 20, "transactionType": "RESTOCK" }),
    )
    .await;
    let (status, body) = srv
        .post(
            "/api/inventory/purchase-orders",
            Some(&admin),
            json!({ "sku": "FULL-1", "quantity": 10 }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "invalid_state_transition");

    let (status, order) = srv
        .post(
            "/api/inventory/purchase-orders",
            Some(&admin),
            json!({ "sku": "ITEM-2", "quantity": 50 }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(order["status"], "PENDING");
    assert_eq!(order["productName"], "Gadget");
    assert_eq!(order["generatedBy"], ADMIN);
    let id = order["id"].as_str().unwrap().to_string();

    let (status, order) = srv
        .post(&format!("/api/inventory/purchase-orders/{id}/fulfill"), Some(&admin), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["status"], "FULFILLED");

    let (status, body) = srv
        .post(
            &format!("/api/inventory/purchase-orders/{id}/cancel"),
            Some(&admin),
            json!({ "reason": "too late" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "invalid_state_transition");

    // Fulfilment records intent only; stock is untouched.
    let (_, products) = srv.get("/api/inventory/products", &admin).await;
    let gadget = products
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["sku"] == "ITEM-2")
        .unwrap()
        .clone();
    assert_eq!(gadget["currentStock"], 0);
    assert_eq!(gadget["status"], "LOW_STOCK");

    let (_, orders) = srv.get("/api/inventory/purchase-orders", &admin).await;
    assert_eq!(orders.as_array().unwrap().len(), 1);
}

struct BrokenForecaster;

#[async_trait]
impl StockoutForecaster for BrokenForecaster {
    async fn predict(&self, _: &SalesSnapshot) -> Result<Vec<StockoutPrediction>, ForecastError> {
        Err(ForecastError::Unavailable("connection refused".into()))
    }

    fn name(&self) -> &'static str {
        "broken"
    }
}

struct SlowForecaster;

#[async_trait]
impl StockoutForecaster for SlowForecaster {
    async fn predict(&self, _: &SalesSnapshot) -> Result<Vec<StockoutPrediction>, ForecastError> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(vec![])
    }

    fn name(&self) -> &'static str {
        "slow"
    }
}

#[tokio::test]
async fn predictions_use_local_velocity_by_default() {
    let srv = TestServer::spawn().await;
    let admin = srv.admin_token().await;

    srv.post(
        "/api/inventory/products",
        Some(&admin),
        json!({ "sku": "ITEM-1", "name": "Widget", "reorderPoint": 1 }),
    )
    .await;
    srv.post(
        "/api/inventory/stock/update",
        Some(&admin),
        json!({ "sku": "ITEM-1", "quantity": 10, "transactionType": "RESTOCK" }),
    )
    .await;

    let (status, predictions) = srv.get("/api/predict/stockout", &admin).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(predictions[0]["sku"], "ITEM-1");
    assert_eq!(predictions[0]["daysRemaining"], 999);
    assert_eq!(predictions[0]["status"], "Healthy");
}

#[tokio::test]
async fn forecaster_failure_degrades_to_empty_list() {
    for forecaster in [
        Arc::new(BrokenForecaster) as Arc<dyn StockoutForecaster>,
        Arc::new(SlowForecaster) as Arc<dyn StockoutForecaster>,
    ] {
        let srv = TestServer::spawn_with(Some(forecaster)).await;
        let admin = srv.admin_token().await;

        let (status, predictions) = srv.get("/api/predict/stockout", &admin).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(predictions, json!([]));

        // Ledger operations are unaffected.
        let (status, _) = srv
            .post(
                "/api/inventory/products",
                Some(&admin),
                json!({ "sku": "ITEM-3", "name": "Thing" }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }
}
