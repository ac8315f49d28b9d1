use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use smartstock_core::{AccountId, Aggregate, AggregateRoot, DomainError};
use smartstock_events::Event;

use crate::sku::{ProductId, Sku};
use crate::transaction::{SALE_NOTE, StockStatus, TransactionId, TransactionType};

/// Aggregate root: a product and its stock ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    id: ProductId,
    sku: Option<Sku>,
    name: String,
    category: String,
    unit_price: u64,
    reorder_point: i64,
    stock: i64,
    version: u64,
    created: bool,
}

impl Product {
    /// Not-yet-created instance for rehydration.
    pub fn empty(id: ProductId) -> Self {
        Self {
            id,
            sku: None,
            name: String::new(),
            category: String::new(),
            unit_price: 0,
            reorder_point: 0,
            stock: 0,
            version: 0,
            created: false,
        }
    }

    pub fn sku(&self) -> Option<&Sku> {
        self.sku.as_ref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stock(&self) -> i64 {
        self.stock
    }

    pub fn reorder_point(&self) -> i64 {
        self.reorder_point
    }

    pub fn status(&self) -> StockStatus {
        StockStatus::classify(self.stock, self.reorder_point)
    }
}

impl AggregateRoot for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreateProduct. `unit_price` is in minor currency units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateProduct {
    pub product_id: ProductId,
    pub sku: Sku,
    pub name: String,
    pub category: String,
    pub unit_price: u64,
    pub reorder_point: i64,
    pub created_by: AccountId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RecordTransaction. `quantity` is as entered by the caller (see [`TransactionType::signed_delta`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordTransaction {
    pub product_id: ProductId,
    pub transaction_id: TransactionId,
    pub transaction_type: TransactionType,
    pub quantity: i64,
    pub handled_by: AccountId,
    pub notes: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InventoryCommand {
    CreateProduct(CreateProduct),
    RecordTransaction(RecordTransaction),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductCreated {
    pub product_id: ProductId,
    pub sku: Sku,
    pub name: String,
    pub category: String,
    pub unit_price: u64,
    pub reorder_point: i64,
    pub created_by: AccountId,
    pub occurred_at: DateTime<Utc>,
}

/// One ledger line. `delta` is signed; `stock_after` is the running total once applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockChanged {
    pub product_id: ProductId,
    pub sku: Sku,
    pub transaction_id: TransactionId,
    pub transaction_type: TransactionType,
    pub delta: i64,
    pub stock_after: i64,
    pub handled_by: AccountId,
    pub notes: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InventoryEvent {
    ProductCreated(ProductCreated),
    StockChanged(StockChanged),
}

impl Event for InventoryEvent {
    fn event_type(&self) -> &'static str {
        match self {
            InventoryEvent::ProductCreated(_) => "inventory.product.created",
            InventoryEvent::StockChanged(_) => "inventory.stock.changed",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            InventoryEvent::ProductCreated(e) => e.occurred_at,
            InventoryEvent::StockChanged(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Product {
    type Command = InventoryCommand;
    type Event = InventoryEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            InventoryEvent::ProductCreated(e) => {
                self.id = e.product_id;
                self.sku = Some(e.sku.clone());
                self.name = e.name.clone();
                self.category = e.category.clone();
                self.unit_price = e.unit_price;
                self.reorder_point = e.reorder_point;
                self.stock = 0;
                self.created = true;
            }
            InventoryEvent::StockChanged(e) => {
                self.stock += e.delta;
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            InventoryCommand::CreateProduct(cmd) => self.handle_create(cmd),
            InventoryCommand::RecordTransaction(cmd) => self.handle_transaction(cmd),
        }
    }
}

impl Product {
    fn ensure_product_id(&self, product_id: ProductId) -> Result<(), DomainError> {
        if self.id != product_id {
            return Err(DomainError::invariant("product_id mismatch"));
        }
        Ok(())
    }

    fn handle_create(&self, cmd: &CreateProduct) -> Result<Vec<InventoryEvent>, DomainError> {
        if self.created {
            return Err(DomainError::already_exists(format!("sku '{}'", cmd.sku)));
        }
        if ProductId::for_sku(&cmd.sku) != cmd.product_id {
            return Err(DomainError::invariant("product_id does not belong to sku"));
        }
        if cmd.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if cmd.reorder_point < 0 {
            return Err(DomainError::validation("reorder point cannot be negative"));
        }

        Ok(vec![InventoryEvent::ProductCreated(ProductCreated {
            product_id: cmd.product_id,
            sku: cmd.sku.clone(),
            name: cmd.name.trim().to_string(),
            category: cmd.category.trim().to_string(),
            unit_price: cmd.unit_price,
            reorder_point: cmd.reorder_point,
            created_by: cmd.created_by,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_transaction(&self, cmd: &RecordTransaction) -> Result<Vec<InventoryEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_product_id(cmd.product_id)?;

        let delta = cmd.transaction_type.signed_delta(cmd.quantity)?;

        let projected = self
            .stock
            .checked_add(delta)
            .ok_or_else(|| DomainError::invalid_quantity("quantity out of range"))?;
        if projected < 0 {
            return Err(DomainError::InsufficientStock {
                available: self.stock,
                requested: -delta,
            });
        }

        let notes = match cmd.notes.as_deref().map(str::trim) {
            Some(n) if !n.is_empty() => n.to_string(),
            _ if cmd.transaction_type == TransactionType::Sale => SALE_NOTE.to_string(),
            _ => String::new(),
        };

        Ok(vec![InventoryEvent::StockChanged(StockChanged {
            product_id: cmd.product_id,
            sku: self.sku.clone().ok_or_else(|| DomainError::invariant("product has no sku"))?,
            transaction_id: cmd.transaction_id,
            transaction_type: cmd.transaction_type,
            delta,
            stock_after: projected,
            handled_by: cmd.handled_by,
            notes,
            occurred_at: cmd.occurred_at,
        })])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn created(sku: &str, reorder_point: i64) -> Product {
        let sku = Sku::parse(sku).unwrap();
        let id = ProductId::for_sku(&sku);
        let mut product = Product::empty(id);
        let cmd = InventoryCommand::CreateProduct(CreateProduct {
            product_id: id,
            sku,
            name: "Widget".into(),
            category: "Hardware".into(),
            unit_price: 1999,
            reorder_point,
            created_by: AccountId::new(),
            occurred_at: Utc::now(),
        });
        for e in product.handle(&cmd).unwrap() {
            product.apply(&e);
        }
        product
    }

    fn txn(product: &Product, kind: TransactionType, quantity: i64) -> InventoryCommand {
        InventoryCommand::RecordTransaction(RecordTransaction {
            product_id: *product.id(),
            transaction_id: TransactionId::new(),
            transaction_type: kind,
            quantity,
            handled_by: AccountId::new(),
            notes: None,
            occurred_at: Utc::now(),
        })
    }

    fn change(
        product: &mut Product,
        kind: TransactionType,
        quantity: i64,
    ) -> Result<Vec<InventoryEvent>, DomainError> {
        let cmd = txn(product, kind, quantity);
        let events = product.handle(&cmd)?;
        for e in &events {
            product.apply(e);
        }
        Ok(events)
    }

    #[test]
    fn duplicate_create_is_already_exists() {
        let product = created("ITEM-1", 10);
        let sku = Sku::parse("ITEM-1").unwrap();
        let again = InventoryCommand::CreateProduct(CreateProduct {
            product_id: ProductId::for_sku(&sku),
            sku,
            name: "Other".into(),
            category: String::new(),
            unit_price: 0,
            reorder_point: 0,
            created_by: AccountId::new(),
            occurred_at: Utc::now(),
        });
        assert!(matches!(product.handle(&again), Err(DomainError::AlreadyExists(_))));
    }

    #[test]
    fn restock_sale_and_low_stock_walkthrough() {
        let mut p = created("ITEM-1", 10);
        assert_eq!(p.stock(), 0);

        change(&mut p, TransactionType::Restock, 20).unwrap();
        assert_eq!(p.stock(), 20);
        assert_eq!(p.status(), StockStatus::Healthy);

        let events = change(&mut p, TransactionType::Sale, 16).unwrap();
        let InventoryEvent::StockChanged(e) = &events[0] else {
            panic!("expected StockChanged");
        };
        assert_eq!(e.delta, -16);
        assert_eq!(e.stock_after, 4);
        assert_eq!(e.notes, SALE_NOTE);
        assert_eq!(p.status(), StockStatus::LowStock);

        let err = change(&mut p, TransactionType::Sale, 10).unwrap_err();
        assert_eq!(err, DomainError::InsufficientStock { available: 4, requested: 10 });
        assert_eq!(p.stock(), 4);
        assert_eq!(p.version(), 3);
    }

    #[test]
    fn negative_adjustment_cannot_overdraw() {
        let mut p = created("ITEM-2", 0);
        change(&mut p, TransactionType::Restock, 5).unwrap();
        assert!(change(&mut p, TransactionType::Adjustment, -6).is_err());
        change(&mut p, TransactionType::Adjustment, -5).unwrap();
        assert_eq!(p.stock(), 0);
    }

    #[test]
    fn transactions_on_unknown_product_are_not_found() {
        let sku = Sku::parse("GHOST").unwrap();
        let p = Product::empty(ProductId::for_sku(&sku));
        assert_eq!(
            p.handle(&txn(&p, TransactionType::Restock, 1)).unwrap_err(),
            DomainError::NotFound
        );
    }

    fn any_change() -> impl Strategy<Value = (TransactionType, i64)> {
        prop_oneof![
            (Just(TransactionType::Restock), -5i64..50),
            (Just(TransactionType::Sale), -5i64..50),
            (Just(TransactionType::Adjustment), -50i64..50),
        ]
    }

    proptest! {
        #[test]
        fn stock_never_goes_negative(changes in proptest::collection::vec(any_change(), 0..64)) {
            let mut p = created("PROP-1", 10);
            let mut ledger_len = 0usize;
            let mut sum = 0i64;

            for (kind, quantity) in changes {
                let before = p.stock();
                match change(&mut p, kind, quantity) {
                    Ok(events) => {
                        ledger_len += events.len();
                        for e in events {
                            if let InventoryEvent::StockChanged(e) = e {
                                sum += e.delta;
                            }
                        }
                    }
                    Err(_) => prop_assert_eq!(p.stock(), before),
                }
                prop_assert!(p.stock() >= 0);
                prop_assert_eq!(p.stock(), sum);
            }

            prop_assert_eq!(p.version(), 1 + ledger_len as u64);
        }
    }
}
