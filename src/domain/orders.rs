//! Order lifecycle rules

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::DomainError;

/// Flat shipping fee in cents.
pub const SHIPPING_FEE_CENTS: i64 = 3_000;
/// Subtotal at or above which shipping is free.
pub const FREE_SHIPPING_THRESHOLD_CENTS: i64 = 30_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Confirmed, Shipped)
                | (Shipped, Delivered)
                | (Pending, Cancelled)
                | (Confirmed, Cancelled)
        )
    }

    /// Validate a transition, returning the target status.
    pub fn transition(&self, next: OrderStatus) -> Result<OrderStatus, DomainError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(DomainError::validation(format!(
                "Cannot change order status from {} to {}",
                self, next
            )))
        }
    }

    /// Whether stock for this order is still held as a reservation.
    pub fn holds_reservation(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Confirmed)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DomainError::validation(format!("Unknown order status '{}'", s)))
    }
}

pub fn shipping_fee(subtotal_cents: i64) -> i64 {
    if subtotal_cents >= FREE_SHIPPING_THRESHOLD_CENTS {
        0
    } else {
        SHIPPING_FEE_CENTS
    }
}

/// `price_cents * quantity`, rejecting totals that do not fit in an `i64`.
pub fn line_total(price_cents: i64, quantity: i32) -> Result<i64, DomainError> {
    price_cents
        .checked_mul(i64::from(quantity))
        .ok_or_else(|| DomainError::validation("Order amount is too large"))
}

/// Sum amounts in cents, rejecting overflow.
pub fn sum_cents(amounts: impl IntoIterator<Item = i64>) -> Result<i64, DomainError> {
    amounts.into_iter().try_fold(0i64, |acc, amount| {
        acc.checked_add(amount)
            .ok_or_else(|| DomainError::validation("Order amount is too large"))
    })
}

/// Human-facing order reference, e.g. `ORD-20261015-7KQ2ZD`.
pub fn generate_order_number(now: DateTime<Utc>) -> String {
    const ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
    let mut rng = rand::thread_rng();
    let suffix: String = (0..6)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect();
    format!("ORD-{}-{}", now.format("%Y%m%d"), suffix)
}
