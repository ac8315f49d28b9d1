use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use smartstock_core::{AccountId, Aggregate, AggregateId, AggregateRoot, DomainError};
use smartstock_events::Event;
use smartstock_inventory::{ProductId, Sku};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PurchaseOrderId(pub AggregateId);

impl PurchaseOrderId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for PurchaseOrderId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PurchaseOrderStatus {
    Pending,
    Fulfilled,
    Cancelled,
}

impl core::fmt::Display for PurchaseOrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            PurchaseOrderStatus::Pending => write!(f, "PENDING"),
            PurchaseOrderStatus::Fulfilled => write!(f, "FULFILLED"),
            PurchaseOrderStatus::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// Aggregate root: PurchaseOrder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseOrder {
    id: PurchaseOrderId,
    product_id: Option<ProductId>,
    quantity_ordered: i64,
    status: PurchaseOrderStatus,
    version: u64,
    created: bool,
}

impl PurchaseOrder {
    pub fn empty(id: PurchaseOrderId) -> Self {
        Self {
            id,
            product_id: None,
            quantity_ordered: 0,
            status: PurchaseOrderStatus::Pending,
            version: 0,
            created: false,
        }
    }

    pub fn status(&self) -> PurchaseOrderStatus {
        self.status
    }

    pub fn product_id(&self) -> Option<ProductId> {
        self.product_id
    }

    pub fn quantity_ordered(&self) -> i64 {
        self.quantity_ordered
    }
}

impl AggregateRoot for PurchaseOrder {
    type Id = PurchaseOrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratePurchaseOrder {
    pub order_id: PurchaseOrderId,
    pub product_id: ProductId,
    pub sku: Sku,
    pub quantity: i64,
    pub generated_by: AccountId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FulfillPurchaseOrder {
    pub order_id: PurchaseOrderId,
    pub fulfilled_by: AccountId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelPurchaseOrder {
    pub order_id: PurchaseOrderId,
    pub cancelled_by: AccountId,
    pub reason: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PurchaseOrderCommand {
    Generate(GeneratePurchaseOrder),
    Fulfill(FulfillPurchaseOrder),
    Cancel(CancelPurchaseOrder),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseOrderGenerated {
    pub order_id: PurchaseOrderId,
    pub product_id: ProductId,
    pub sku: Sku,
    pub quantity: i64,
    pub generated_by: AccountId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseOrderFulfilled {
    pub order_id: PurchaseOrderId,
    pub fulfilled_by: AccountId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseOrderCancelled {
    pub order_id: PurchaseOrderId,
    pub cancelled_by: AccountId,
    pub reason: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PurchaseOrderEvent {
    Generated(PurchaseOrderGenerated),
    Fulfilled(PurchaseOrderFulfilled),
    Cancelled(PurchaseOrderCancelled),
}

impl Event for PurchaseOrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            PurchaseOrderEvent::Generated(_) => "purchasing.purchase_order.generated",
            PurchaseOrderEvent::Fulfilled(_) => "purchasing.purchase_order.fulfilled",
            PurchaseOrderEvent::Cancelled(_) => "purchasing.purchase_order.cancelled",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            PurchaseOrderEvent::Generated(e) => e.occurred_at,
            PurchaseOrderEvent::Fulfilled(e) => e.occurred_at,
            PurchaseOrderEvent::Cancelled(e) => e.occurred_at,
        }
    }
}

impl Aggregate for PurchaseOrder {
    type Command = PurchaseOrderCommand;
    type Event = PurchaseOrderEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            PurchaseOrderEvent::Generated(e) => {
                self.id = e.order_id;
                self.product_id = Some(e.product_id);
                self.quantity_ordered = e.quantity;
                self.status = PurchaseOrderStatus::Pending;
                self.created = true;
            }
            PurchaseOrderEvent::Fulfilled(_) => self.status = PurchaseOrderStatus::Fulfilled,
            PurchaseOrderEvent::Cancelled(_) => self.status = PurchaseOrderStatus::Cancelled,
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            PurchaseOrderCommand::Generate(cmd) => self.handle_generate(cmd),
            PurchaseOrderCommand::Fulfill(cmd) => {
                self.ensure_order_id(cmd.order_id)?;
                self.ensure_pending("fulfill")?;
                Ok(vec![PurchaseOrderEvent::Fulfilled(PurchaseOrderFulfilled {
                    order_id: cmd.order_id,
                    fulfilled_by: cmd.fulfilled_by,
                    occurred_at: cmd.occurred_at,
                })])
            }
            PurchaseOrderCommand::Cancel(cmd) => {
                self.ensure_order_id(cmd.order_id)?;
                self.ensure_pending("cancel")?;
                Ok(vec![PurchaseOrderEvent::Cancelled(PurchaseOrderCancelled {
                    order_id: cmd.order_id,
                    cancelled_by: cmd.cancelled_by,
                    reason: cmd.reason.as_deref().map(str::trim).filter(|r| !r.is_empty()).map(str::to_string),
                    occurred_at: cmd.occurred_at,
                })])
            }
        }
    }
}

impl PurchaseOrder {
    fn ensure_order_id(&self, order_id: PurchaseOrderId) -> Result<(), DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        if self.id != order_id {
            return Err(DomainError::invariant("order_id mismatch"));
        }
        Ok(())
    }

    fn ensure_pending(&self, action: &str) -> Result<(), DomainError> {
        if self.status != PurchaseOrderStatus::Pending {
            return Err(DomainError::invalid_transition(format!(
                "cannot {action} a purchase order that is {}",
                self.status
            )));
        }
        Ok(())
    }

    fn handle_generate(&self, cmd: &GeneratePurchaseOrder) -> Result<Vec<PurchaseOrderEvent>, DomainError> {
        if self.created {
            return Err(DomainError::already_exists(format!("purchase order {}", self.id)));
        }
        if cmd.quantity <= 0 {
            return Err(DomainError::invalid_quantity("ordered quantity must be positive"));
        }

        Ok(vec![PurchaseOrderEvent::Generated(PurchaseOrderGenerated {
            order_id: cmd.order_id,
            product_id: cmd.product_id,
            sku: cmd.sku.clone(),
            quantity: cmd.quantity,
            generated_by: cmd.generated_by,
            occurred_at: cmd.occurred_at,
        })])
    }
}
