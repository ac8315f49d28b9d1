//! Append-only transaction history.
//!
//! Entries are listed newest first by transaction date. Entries sharing a
//! timestamp keep commit order.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;

use smartstock_core::AccountId;
use smartstock_events::EventEnvelope;
use smartstock_inventory::{InventoryEvent, ProductId, Sku, TransactionId, TransactionType};

use super::{EnvelopeProjection, ProjectionError, StreamCursors, aggregate_types, decode};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub transaction_id: TransactionId,
    pub product_id: ProductId,
    pub sku: Sku,
    pub product_name: String,
    pub transaction_type: TransactionType,
    /// Signed stock delta.
    pub quantity: i64,
    pub stock_after: i64,
    pub handled_by: AccountId,
    pub notes: String,
    pub transaction_date: DateTime<Utc>,
    pub position: u64,
}

#[derive(Debug, Default)]
struct LedgerState {
    names: HashMap<ProductId, String>,
    entries: Vec<LedgerEntry>,
}

#[derive(Debug, Default)]
pub struct LedgerProjection {
    state: RwLock<LedgerState>,
    cursors: StreamCursors,
}

impl LedgerProjection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Full history, newest first.
    pub fn history(&self) -> Vec<LedgerEntry> {
        let Ok(state) = self.state.read() else {
            return vec![];
        };
        let mut out = state.entries.clone();
        out.sort_by(|a, b| {
            b.transaction_date
                .cmp(&a.transaction_date)
                .then_with(|| a.position.cmp(&b.position))
        });
        out
    }

    pub fn len(&self) -> usize {
        self.state.read().map(|s| s.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sales at or after `since`, grouped by sku, oldest first, as positive unit counts.
    pub fn sales_since(&self, since: DateTime<Utc>) -> HashMap<Sku, Vec<(DateTime<Utc>, i64)>> {
        let mut out: HashMap<Sku, Vec<(DateTime<Utc>, i64)>> = HashMap::new();
        let Ok(state) = self.state.read() else {
            return out;
        };
        for entry in state
            .entries
            .iter()
            .filter(|e| e.transaction_type == TransactionType::Sale && e.transaction_date >= since)
        {
            out.entry(entry.sku.clone())
                .or_default()
                .push((entry.transaction_date, -entry.quantity));
        }
        for sales in out.values_mut() {
            sales.sort_by_key(|(at, _)| *at);
        }
        out
    }
}

impl EnvelopeProjection for LedgerProjection {
    fn name(&self) -> &'static str {
        "ledger"
    }

    fn apply_envelope(&self, envelope: &EventEnvelope<JsonValue>) -> Result<(), ProjectionError> {
        if envelope.aggregate_type() != aggregate_types::PRODUCT {
            return Ok(());
        }
        self.cursors.advance(envelope, || {
            let event: InventoryEvent = decode(envelope)?;
            let mut state = self
                .state
                .write()
                .map_err(|_| ProjectionError::Unavailable("ledger lock poisoned".to_string()))?;
            match event {
                InventoryEvent::ProductCreated(e) => {
                    state.names.insert(e.product_id, e.name);
                }
                InventoryEvent::StockChanged(e) => {
                    let product_name = state.names.get(&e.product_id).cloned().unwrap_or_default();
                    state.entries.push(LedgerEntry {
                        transaction_id: e.transaction_id,
                        product_id: e.product_id,
                        sku: e.sku,
                        product_name,
                        transaction_type: e.transaction_type,
                        quantity: e.delta,
                        stock_after: e.stock_after,
                        handled_by: e.handled_by,
                        notes: e.notes,
                        transaction_date: e.occurred_at,
                        position: envelope.global_position(),
                    });
                }
            }
            Ok(())
        })
    }

    fn reset(&self) {
        self.cursors.clear();
        if let Ok(mut state) = self.state.write() {
            *state = LedgerState::default();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use smartstock_inventory::ProductCreated;
    use uuid::Uuid;

    use super::*;

    fn created_envelope() -> EventEnvelope<JsonValue> {
        let sku = Sku::parse("ITEM-1").unwrap();
        let product_id = ProductId::for_sku(&sku);
        let event = InventoryEvent::ProductCreated(ProductCreated {
            product_id,
            sku,
            name: "Widget".into(),
            category: "General".into(),
            unit_price: 1250,
            reorder_point: 10,
            created_by: AccountId::new(),
            occurred_at: Utc::now(),
        });
        EventEnvelope::new(
            Uuid::now_v7(),
            product_id.aggregate_id(),
            aggregate_types::PRODUCT.to_string(),
            1,
            1,
            "inventory.product_created".to_string(),
            Utc::now(),
            serde_json::to_value(event).unwrap(),
        )
    }

    #[test]
    fn poisoned_ledger_fails_the_apply() {
        let ledger = Arc::new(LedgerProjection::new());
        let poisoner = Arc::clone(&ledger);
        let _ = thread::spawn(move || {
            let _guard = poisoner.state.write().unwrap();
            panic!("writer died holding the ledger lock");
        })
        .join();

        let err = ledger.apply_envelope(&created_envelope()).unwrap_err();
        assert!(matches!(err, ProjectionError::Unavailable(_)));
    }
}
