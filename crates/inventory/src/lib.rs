//! Inventory ledger domain (event-sourced).
//!
//! A product stream holds the product definition followed by every stock
//! transaction ever applied to it. Current stock is never stored; it is the
//! fold of the transaction deltas, and no fold prefix may go below zero.

pub mod product;
pub mod sku;
pub mod transaction;

pub use product::{
    CreateProduct, InventoryCommand, InventoryEvent, Product, ProductCreated, RecordTransaction,
    StockChanged,
};
pub use sku::{ProductId, Sku};
pub use transaction::{SALE_NOTE, StockStatus, TransactionId, TransactionType};
