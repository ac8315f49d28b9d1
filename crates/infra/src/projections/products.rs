//! Product catalogue with cached current stock.
//!
//! `current_stock` is a running sum of ledger deltas maintained in the same
//! dispatch that appends them; the event stream stays the source of truth.
//! Stock status is derived on read and never stored.

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;

use smartstock_events::EventEnvelope;
use smartstock_inventory::{InventoryEvent, ProductId, Sku, StockStatus};

use super::{EnvelopeProjection, ProjectionError, StreamCursors, aggregate_types, decode};
use crate::read_model::KeyedStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductReadModel {
    pub product_id: ProductId,
    pub sku: Sku,
    pub name: String,
    pub category: String,
    pub unit_price: u64,
    pub reorder_point: i64,
    pub current_stock: i64,
    pub created_at: DateTime<Utc>,
    pub last_movement_at: Option<DateTime<Utc>>,
}

impl ProductReadModel {
    pub fn status(&self) -> StockStatus {
        StockStatus::classify(self.current_stock, self.reorder_point)
    }
}

pub struct ProductsProjection<S> {
    store: S,
    cursors: StreamCursors,
}

impl<S> ProductsProjection<S>
where
    S: KeyedStore<ProductId, ProductReadModel>,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            cursors: StreamCursors::new(),
        }
    }

    pub fn get(&self, product_id: &ProductId) -> Option<ProductReadModel> {
        self.store.get(product_id)
    }

    pub fn by_sku(&self, sku: &Sku) -> Option<ProductReadModel> {
        self.store.get(&ProductId::for_sku(sku))
    }

    /// All products ordered by sku.
    pub fn list(&self) -> Vec<ProductReadModel> {
        let mut out = self.store.list();
        out.sort_by(|a, b| a.sku.cmp(&b.sku));
        out
    }
}

impl<S> EnvelopeProjection for ProductsProjection<S>
where
    S: KeyedStore<ProductId, ProductReadModel>,
{
    fn name(&self) -> &'static str {
        "products"
    }

    fn apply_envelope(&self, envelope: &EventEnvelope<JsonValue>) -> Result<(), ProjectionError> {
        if envelope.aggregate_type() != aggregate_types::PRODUCT {
            return Ok(());
        }
        self.cursors.advance(envelope, || {
            let event: InventoryEvent = decode(envelope)?;
            let product_id = match &event {
                InventoryEvent::ProductCreated(e) => e.product_id,
                InventoryEvent::StockChanged(e) => e.product_id,
            };
            if product_id.aggregate_id() != envelope.aggregate_id() {
                return Err(ProjectionError::StreamMismatch(
                    "event product_id does not match envelope aggregate_id".to_string(),
                ));
            }

            match event {
                InventoryEvent::ProductCreated(e) => {
                    self.store.upsert(
                        e.product_id,
                        ProductReadModel {
                            product_id: e.product_id,
                            sku: e.sku,
                            name: e.name,
                            category: e.category,
                            unit_price: e.unit_price,
                            reorder_point: e.reorder_point,
                            current_stock: 0,
                            created_at: e.occurred_at,
                            last_movement_at: None,
                        },
                    )?;
                }
                InventoryEvent::StockChanged(e) => {
                    let mut rm = self.store.get(&e.product_id).ok_or_else(|| {
                        ProjectionError::StreamMismatch(format!("product {} was never created", e.sku))
                    })?;
                    rm.current_stock += e.delta;
                    rm.last_movement_at = Some(e.occurred_at);
                    self.store.upsert(e.product_id, rm)?;
                }
            }
            Ok(())
        })
    }

    fn reset(&self) {
        self.cursors.clear();
        self.store.clear();
    }
}
