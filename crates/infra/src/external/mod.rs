//! Clients for services outside the process.

pub mod forecast_http;

pub use forecast_http::HttpForecaster;
