//! `smartstock-forecast`
//!
//! Stockout forecasting boundary. Consumes a read-only sales snapshot and
//! produces per-sku predictions. Independent of the domain
//! crates: it never sees aggregates and never mutates anything.

pub mod forecaster;
pub mod prediction;
pub mod snapshot;
pub mod velocity;

pub use forecaster::{ForecastError, StockoutForecaster};
pub use prediction::{DAYS_REMAINING_UNBOUNDED, ForecastStatus, StockoutPrediction};
pub use snapshot::{ProductSalesHistory, SaleRecord, SalesSnapshot};
pub use velocity::VelocityForecaster;
