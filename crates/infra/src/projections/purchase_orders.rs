use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;

use smartstock_core::AccountId;
use smartstock_events::EventEnvelope;
use smartstock_inventory::{ProductId, Sku};
use smartstock_purchasing::{PurchaseOrderEvent, PurchaseOrderId, PurchaseOrderStatus};

use super::{EnvelopeProjection, ProjectionError, StreamCursors, aggregate_types, decode};
use crate::read_model::KeyedStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseOrderReadModel {
    pub order_id: PurchaseOrderId,
    pub product_id: ProductId,
    pub sku: Sku,
    pub quantity_ordered: i64,
    pub generated_by: AccountId,
    pub order_date: DateTime<Utc>,
    pub status: PurchaseOrderStatus,
    pub closed_by: Option<AccountId>,
    pub closed_at: Option<DateTime<Utc>>,
    pub cancel_reason: Option<String>,
    pub position: u64,
}

pub struct PurchaseOrdersProjection<S> {
    store: S,
    cursors: StreamCursors,
}

impl<S> PurchaseOrdersProjection<S>
where
    S: KeyedStore<PurchaseOrderId, PurchaseOrderReadModel>,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            cursors: StreamCursors::new(),
        }
    }

    pub fn get(&self, id: &PurchaseOrderId) -> Option<PurchaseOrderReadModel> {
        self.store.get(id)
    }

    /// Every order, newest first.
    pub fn list(&self) -> Vec<PurchaseOrderReadModel> {
        let mut out = self.store.list();
        out.sort_by(|a, b| b.order_date.cmp(&a.order_date).then_with(|| b.position.cmp(&a.position)));
        out
    }

    fn close(
        &self,
        order_id: PurchaseOrderId,
        status: PurchaseOrderStatus,
        by: AccountId,
        at: DateTime<Utc>,
        reason: Option<String>,
    ) -> Result<(), ProjectionError> {
        let mut rm = self
            .store
            .get(&order_id)
            .ok_or_else(|| ProjectionError::StreamMismatch(format!("purchase order {order_id} was never generated")))?;
        rm.status = status;
        rm.closed_by = Some(by);
        rm.closed_at = Some(at);
        rm.cancel_reason = reason;
        self.store.upsert(order_id, rm)?;
        Ok(())
    }
}

impl<S> EnvelopeProjection for PurchaseOrdersProjection<S>
where
    S: KeyedStore<PurchaseOrderId, PurchaseOrderReadModel>,
{
    fn name(&self) -> &'static str {
        "purchase_orders"
    }

    fn apply_envelope(&self, envelope: &EventEnvelope<JsonValue>) -> Result<(), ProjectionError> {
        if envelope.aggregate_type() != aggregate_types::PURCHASE_ORDER {
            return Ok(());
        }
        self.cursors.advance(envelope, || match decode::<PurchaseOrderEvent>(envelope)? {
            PurchaseOrderEvent::Generated(e) => {
                self.store.upsert(
                    e.order_id,
                    PurchaseOrderReadModel {
                        order_id: e.order_id,
                        product_id: e.product_id,
                        sku: e.sku,
                        quantity_ordered: e.quantity,
                        generated_by: e.generated_by,
                        order_date: e.occurred_at,
                        status: PurchaseOrderStatus::Pending,
                        closed_by: None,
                        closed_at: None,
                        cancel_reason: None,
                        position: envelope.global_position(),
                    },
                )?;
                Ok(())
            }
            PurchaseOrderEvent::Fulfilled(e) => {
                self.close(e.order_id, PurchaseOrderStatus::Fulfilled, e.fulfilled_by, e.occurred_at, None)
            }
            PurchaseOrderEvent::Cancelled(e) => {
                self.close(e.order_id, PurchaseOrderStatus::Cancelled, e.cancelled_by, e.occurred_at, e.reason)
            }
        })
    }

    fn reset(&self) {
        self.cursors.clear();
        self.store.clear();
    }
}
