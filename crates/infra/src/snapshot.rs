//! Read-only sales snapshot handed to the forecaster.

use chrono::{DateTime, Duration, Utc};

use smartstock_forecast::{ProductSalesHistory, SaleRecord, SalesSnapshot};

use smartstock_inventory::ProductId;

use crate::projections::{LedgerProjection, ProductReadModel, ProductsProjection};
use crate::read_model::KeyedStore;

/// Every product with its current stock and the sales of the last `window_days` days.
///
/// Products with no sale in the window are included with an empty history.
pub fn sales_snapshot<S>(
    products: &ProductsProjection<S>,
    ledger: &LedgerProjection,
    now: DateTime<Utc>,
    window_days: u32,
) -> SalesSnapshot
where
    S: KeyedStore<ProductId, ProductReadModel>,
{
    let since = Duration::try_days(i64::from(window_days))
        .and_then(|window| now.checked_sub_signed(window))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    let mut sales = ledger.sales_since(since);

    let products = products
        .list()
        .into_iter()
        .map(|p| ProductSalesHistory {
            sales: sales
                .remove(&p.sku)
                .unwrap_or_default()
                .into_iter()
                .map(|(date, quantity)| SaleRecord { date, quantity })
                .collect(),
            sku: p.sku.as_str().to_string(),
            name: p.name,
            current_stock: p.current_stock,
        })
        .collect();

    SalesSnapshot {
        taken_at: now,
        window_days,
        products,
    }
}
