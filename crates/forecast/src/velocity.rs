use async_trait::async_trait;

use crate::forecaster::{ForecastError, StockoutForecaster};
use crate::prediction::{DAYS_REMAINING_UNBOUNDED, ForecastStatus, StockoutPrediction};
use crate::snapshot::{ProductSalesHistory, SalesSnapshot};

/// Deterministic in-process forecaster.
///
/// Model:
/// - velocity = units sold in the window / days since the first sale in the window (at least 1).
/// - days remaining = floor(stock / velocity), or [`DAYS_REMAINING_UNBOUNDED`] with no sales.
/// - Critical at or below `critical_days`, Warning at or below `warning_days`.
#[derive(Debug, Copy, Clone)]
pub struct VelocityForecaster {
    critical_days: i64,
    warning_days: i64,
}

impl Default for VelocityForecaster {
    fn default() -> Self {
        Self {
            critical_days: 3,
            warning_days: 7,
        }
    }
}

impl VelocityForecaster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn classify(&self, days_remaining: i64) -> ForecastStatus {
        if days_remaining <= self.critical_days {
            ForecastStatus::Critical
        } else if days_remaining <= self.warning_days {
            ForecastStatus::Warning
        } else {
            ForecastStatus::Healthy
        }
    }

    fn forecast_product(&self, snapshot: &SalesSnapshot, product: &ProductSalesHistory) -> StockoutPrediction {
        let sold: i64 = product.sales.iter().map(|s| s.quantity.max(0)).sum();
        let first_sale = product.sales.iter().map(|s| s.date).min();

        let velocity = match first_sale {
            Some(first) if sold > 0 => {
                let days = (snapshot.taken_at.date_naive() - first.date_naive()).num_days().max(1);
                sold as f64 / days as f64
            }
            _ => 0.0,
        };

        let days_remaining = if velocity > 0.0 {
            (product.current_stock.max(0) as f64 / velocity).floor() as i64
        } else {
            DAYS_REMAINING_UNBOUNDED
        };

        StockoutPrediction {
            sku: product.sku.clone(),
            name: product.name.clone(),
            current_stock: product.current_stock,
            velocity: (velocity * 100.0).round() / 100.0,
            days_remaining,
            status: self.classify(days_remaining),
        }
    }
}

#[async_trait]
impl StockoutForecaster for VelocityForecaster {
    async fn predict(&self, snapshot: &SalesSnapshot) -> Result<Vec<StockoutPrediction>, ForecastError> {
        Ok(snapshot
            .products
            .iter()
            .map(|p| self.forecast_product(snapshot, p))
            .collect())
    }

    fn name(&self) -> &'static str {
        "velocity"
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;
    use crate::snapshot::SaleRecord;

    fn snapshot(stock: i64, sales: &[(i64, i64)]) -> SalesSnapshot {
        let now = Utc.with_ymd_and_hms(2026, 3, 31, 12, 0, 0).unwrap();
        SalesSnapshot {
            taken_at: now,
            window_days: 30,
            products: vec![ProductSalesHistory {
                sku: "ITEM-1".into(),
                name: "Widget".into(),
                current_stock: stock,
                sales: sales
                    .iter()
                    .map(|(days_ago, quantity)| SaleRecord {
                        date: now - Duration::days(*days_ago),
                        quantity: *quantity,
                    })
                    .collect(),
            }],
        }
    }

    #[tokio::test]
    async fn ten_units_a_day_with_twenty_left_is_critical() {
        let snap = snapshot(20, &[(10, 50), (5, 50)]);
        let out = VelocityForecaster::new().predict(&snap).await.unwrap();

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].velocity, 10.0);
        assert_eq!(out[0].days_remaining, 2);
        assert_eq!(out[0].status, ForecastStatus::Critical);
    }

    #[tokio::test]
    async fn no_sales_means_unbounded_and_healthy() {
        let out = VelocityForecaster::new().predict(&snapshot(4, &[])).await.unwrap();
        assert_eq!(out[0].velocity, 0.0);
        assert_eq!(out[0].days_remaining, DAYS_REMAINING_UNBOUNDED);
        assert_eq!(out[0].status, ForecastStatus::Healthy);
    }

    #[tokio::test]
    async fn same_day_sales_count_as_one_day() {
        let out = VelocityForecaster::new().predict(&snapshot(30, &[(0, 6)])).await.unwrap();
        assert_eq!(out[0].velocity, 6.0);
        assert_eq!(out[0].days_remaining, 5);
        assert_eq!(out[0].status, ForecastStatus::Warning);
    }

    #[test]
    fn threshold_boundaries_are_inclusive() {
        let f = VelocityForecaster::new();
        assert_eq!(f.classify(3), ForecastStatus::Critical);
        assert_eq!(f.classify(7), ForecastStatus::Warning);
        assert_eq!(f.classify(8), ForecastStatus::Healthy);
    }
}
