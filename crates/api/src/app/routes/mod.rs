use axum::{
    Router,
    routing::{get, post},
};

pub mod admin;
pub mod auth;
pub mod inventory;
pub mod predict;
pub mod purchase_orders;
pub mod system;

/// Routes reachable without a token.
pub fn public_router() -> Router {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
}

/// Routes behind the bearer-token middleware.
pub fn protected_router() -> Router {
    Router::new()
        .route("/user/profile", get(auth::profile))
        .nest("/admin", admin::router())
        .nest("/inventory", inventory::router().merge(purchase_orders::router()))
        .nest("/predict", predict::router())
}
