//! HTTP API: configuration, routing, request context and authorization.

pub mod app;
pub mod authz;
pub mod config;
pub mod context;
pub mod middleware;
