use serde::{Deserialize, Serialize};
use uuid::Uuid;

use smartstock_core::DomainError;

/// Note attached to sales when the caller gives none.
pub const SALE_NOTE: &str = "Point of Sale transaction";

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(Uuid);

impl TransactionId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    /// Goods received. Input quantity must be positive.
    Restock,
    /// Manual correction. Either sign, never zero.
    Adjustment,
    /// Goods sold. Input quantity is positive and stored negated.
    Sale,
}

impl TransactionType {
    /// Convert a caller-supplied quantity into the signed delta stored on the ledger.
    pub fn signed_delta(self, quantity: i64) -> Result<i64, DomainError> {
        match self {
            TransactionType::Restock if quantity > 0 => Ok(quantity),
            TransactionType::Sale if quantity > 0 => quantity
                .checked_neg()
                .ok_or_else(|| DomainError::invalid_quantity("sale quantity out of range")),
            TransactionType::Adjustment if quantity != 0 => Ok(quantity),
            TransactionType::Adjustment => {
                Err(DomainError::invalid_quantity("adjustment quantity cannot be zero"))
            }
            TransactionType::Restock | TransactionType::Sale => Err(DomainError::invalid_quantity(
                format!("{self} quantity must be positive"),
            )),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Restock => "RESTOCK",
            TransactionType::Adjustment => "ADJUSTMENT",
            TransactionType::Sale => "SALE",
        }
    }
}

impl core::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for TransactionType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "RESTOCK" => Ok(TransactionType::Restock),
            "ADJUSTMENT" => Ok(TransactionType::Adjustment),
            "SALE" => Ok(TransactionType::Sale),
            other => Err(DomainError::validation(format!("unknown transaction type '{other}'"))),
        }
    }
}

/// Stock health relative to the reorder point.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockStatus {
    Healthy,
    LowStock,
}

impl StockStatus {
    /// Low stock is inclusive: sitting exactly on the reorder point already needs attention.
    pub fn classify(current_stock: i64, reorder_point: i64) -> Self {
        if current_stock <= reorder_point {
            StockStatus::LowStock
        } else {
            StockStatus::Healthy
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sales_are_stored_negative() {
        assert_eq!(TransactionType::Sale.signed_delta(16).unwrap(), -16);
        assert_eq!(TransactionType::Restock.signed_delta(20).unwrap(), 20);
        assert_eq!(TransactionType::Adjustment.signed_delta(-3).unwrap(), -3);
    }

    #[test]
    fn wrong_sign_or_zero_is_rejected() {
        assert!(TransactionType::Sale.signed_delta(-1).is_err());
        assert!(TransactionType::Sale.signed_delta(0).is_err());
        assert!(TransactionType::Restock.signed_delta(-5).is_err());
        assert!(matches!(
            TransactionType::Adjustment.signed_delta(0),
            Err(DomainError::InvalidQuantity(_))
        ));
    }

    #[test]
    fn reorder_point_boundary_is_low_stock() {
        assert_eq!(StockStatus::classify(10, 10), StockStatus::LowStock);
        assert_eq!(StockStatus::classify(11, 10), StockStatus::Healthy);
        assert_eq!(StockStatus::classify(0, 0), StockStatus::LowStock);
    }

    #[test]
    fn parses_type_names_case_insensitively() {
        assert_eq!("restock".parse::<TransactionType>().unwrap(), TransactionType::Restock);
        assert!("REFUND".parse::<TransactionType>().is_err());
    }
}
