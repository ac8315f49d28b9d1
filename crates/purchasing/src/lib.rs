//! Purchase order domain (event-sourced).
//!
//! Orders record replenishment intent only. Fulfilling an order does not touch
//! stock; received goods are booked separately as a restock.

pub mod order;

pub use order::{
    CancelPurchaseOrder, FulfillPurchaseOrder, GeneratePurchaseOrder, PurchaseOrder,
    PurchaseOrderCancelled, PurchaseOrderCommand, PurchaseOrderEvent, PurchaseOrderFulfilled,
    PurchaseOrderGenerated, PurchaseOrderId, PurchaseOrderStatus,
};
