//! Stock movement rules
//!
//! Pure arithmetic over a stock row's counters; persistence lives in
//! `services::inventory_service`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Inbound,
    Outbound,
    Adjustment,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Inbound => "inbound",
            TransactionKind::Outbound => "outbound",
            TransactionKind::Adjustment => "adjustment",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "inbound" | "in" => Ok(TransactionKind::Inbound),
            "outbound" | "out" => Ok(TransactionKind::Outbound),
            "adjustment" | "adjust" => Ok(TransactionKind::Adjustment),
            other => Err(DomainError::validation(format!(
                "Unknown transaction type '{}'",
                other
            ))),
        }
    }
}

/// Counters of a single stock row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockLevels {
    pub quantity: i32,
    pub reserved: i32,
}

impl StockLevels {
    pub fn new(quantity: i32, reserved: i32) -> Self {
        Self { quantity, reserved }
    }

    pub fn available(&self) -> i32 {
        self.quantity - self.reserved
    }

    /// Apply a transaction and return the new quantity.
    ///
    /// Inbound and outbound amounts are relative and must be positive.
    /// An adjustment is an absolute count from a physical stocktake.
    /// Quantity may never drop below what is already reserved.
    pub fn apply(&self, kind: TransactionKind, amount: i32) -> Result<i32, DomainError> {
        let next = match kind {
            TransactionKind::Inbound => {
                if amount <= 0 {
                    return Err(DomainError::validation(
                        "Inbound quantity must be greater than zero",
                    ));
                }
                self.quantity
                    .checked_add(amount)
                    .ok_or_else(|| DomainError::validation("Quantity overflow"))?
            }
            TransactionKind::Outbound => {
                if amount <= 0 {
                    return Err(DomainError::validation(
                        "Outbound quantity must be greater than zero",
                    ));
                }
                self.quantity - amount
            }
            TransactionKind::Adjustment => {
                if amount < 0 {
                    return Err(DomainError::validation(
                        "Adjusted quantity cannot be negative",
                    ));
                }
                amount
            }
        };

        if next < self.reserved {
            return Err(DomainError::conflict(format!(
                "Insufficient stock: {} on hand, {} reserved, requested result {}",
                self.quantity, self.reserved, next
            )));
        }

        Ok(next)
    }

    pub fn is_low(&self, reorder_level: i32) -> bool {
        self.available() <= reorder_level
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inbound_adds_to_quantity() {
        let levels = StockLevels::new(5, 2);
        assert_eq!(levels.apply(TransactionKind::Inbound, 10).unwrap(), 15);
    }

    #[test]
    fn outbound_cannot_eat_into_reservations() {
        let levels = StockLevels::new(5, 2);
        assert_eq!(levels.apply(TransactionKind::Outbound, 3).unwrap(), 2);
        let err = levels.apply(TransactionKind::Outbound, 4).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn adjustment_sets_absolute_quantity() {
        let levels = StockLevels::new(50, 0);
        assert_eq!(levels.apply(TransactionKind::Adjustment, 42).unwrap(), 42);
        assert_eq!(levels.apply(TransactionKind::Adjustment, 0).unwrap(), 0);
    }

    #[test]
    fn adjustment_below_reserved_is_rejected() {
        let levels = StockLevels::new(10, 4);
        assert!(levels.apply(TransactionKind::Adjustment, 3).is_err());
    }

    #[test]
    fn zero_amounts_are_rejected_for_relative_moves() {
        let levels = StockLevels::new(10, 0);
        assert!(levels.apply(TransactionKind::Inbound, 0).is_err());
        assert!(levels.apply(TransactionKind::Outbound, -1).is_err());
    }

    #[test]
    fn parses_short_aliases() {
        assert_eq!(
            "OUT".parse::<TransactionKind>().unwrap(),
            TransactionKind::Outbound
        );
        assert!("transfer".parse::<TransactionKind>().is_err());
    }

    #[test]
    fn low_stock_uses_available_quantity() {
        assert!(StockLevels::new(10, 8).is_low(2));
        assert!(!StockLevels::new(10, 0).is_low(2));
    }
}
