//! Coupon types.

use crate::money::Money;
use serde::{Deserialize, Serialize};

/// Value of a coupon.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum CouponValue {
    /// Percentage off the subtotal (0.0 - 100.0).
    Percentage(f64),
    /// Fixed amount off the subtotal.
    Fixed(Money),
}

/// A coupon applied to the cart.
///
/// The cart holds at most one coupon; applying a new one atomically
/// replaces the previous one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Coupon {
    /// Coupon code (e.g., "WELCOME10").
    pub code: String,
    /// Value of the coupon.
    pub value: CouponValue,
}

impl Coupon {
    /// Create a percentage coupon.
    pub fn percentage(code: impl Into<String>, percent: f64) -> Self {
        Self {
            code: code.into(),
            value: CouponValue::Percentage(percent),
        }
    }

    /// Create a fixed-amount coupon.
    pub fn fixed(code: impl Into<String>, amount: Money) -> Self {
        Self {
            code: code.into(),
            value: CouponValue::Fixed(amount),
        }
    }
}
