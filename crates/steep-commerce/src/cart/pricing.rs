//! Pure pricing derivations over cart line items.
//!
//! Every function here is referentially transparent: same items, same
//! coupon, same config, same result. All amounts within one cart share
//! a currency (enforced by `CartStore` when items are added), so the
//! integer folds below never mix currencies.
//!
//! Tax is computed on the pre-discount subtotal. Discount and tax are
//! each rounded to the cent independently, then summed exactly.

use crate::cart::coupon::{Coupon, CouponValue};
use crate::cart::line_item::LineItem;
use crate::money::{Currency, Money};
use serde::{Deserialize, Serialize};

/// Pricing configuration for a storefront session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PricingConfig {
    /// Cart currency; items priced in any other currency are rejected
    /// at add time.
    pub currency: Currency,
    /// Fixed tax rate applied to the pre-discount subtotal, as a
    /// percentage.
    pub tax_rate_percent: f64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        // Tax collection is disabled until a rate is configured.
        Self {
            currency: Currency::USD,
            tax_rate_percent: 0.0,
        }
    }
}

impl PricingConfig {
    /// Create a config for the given currency.
    pub fn new(currency: Currency) -> Self {
        Self {
            currency,
            tax_rate_percent: 0.0,
        }
    }

    /// Set the tax rate.
    pub fn with_tax_rate(mut self, rate_percent: f64) -> Self {
        self.tax_rate_percent = rate_percent;
        self
    }
}

/// Complete pricing breakdown for a cart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartTotals {
    /// Subtotal before discounts (exact cents, no rounding applied).
    pub subtotal: Money,
    /// Amount taken off the subtotal by the coupon.
    pub discount: Money,
    /// Subtotal after the coupon, rounded to the cent.
    pub discounted_total: Money,
    /// Tax on the pre-discount subtotal, rounded independently.
    pub tax: Money,
    /// Final total: discounted total plus tax.
    pub grand_total: Money,
    /// Sum of quantities across all line items.
    pub item_count: i64,
}

impl CartTotals {
    /// Totals for an empty cart.
    pub fn empty(currency: Currency) -> Self {
        Self {
            subtotal: Money::zero(currency),
            discount: Money::zero(currency),
            discounted_total: Money::zero(currency),
            tax: Money::zero(currency),
            grand_total: Money::zero(currency),
            item_count: 0,
        }
    }

    /// Check if a coupon reduced the total.
    pub fn has_discount(&self) -> bool {
        self.discount.is_positive()
    }
}

/// Sum of `unit_price * quantity` over all items, in exact cents.
pub fn subtotal(items: &[LineItem], currency: Currency) -> Money {
    let cents = items
        .iter()
        .fold(0_i64, |acc, item| acc.saturating_add(item.line_total().amount_cents));
    Money::new(cents, currency)
}

/// Apply a coupon to the subtotal.
///
/// Percentage coupons keep `(1 - value/100)` of the subtotal, rounded
/// half-up to the cent; fixed coupons subtract their amount, floored at
/// zero. A fixed coupon in a foreign currency leaves the subtotal
/// unchanged.
pub fn discounted_total(subtotal: Money, coupon: Option<&Coupon>) -> Money {
    match coupon.map(|c| &c.value) {
        Some(CouponValue::Percentage(percent)) => {
            let remaining = subtotal.multiply_decimal(1.0 - percent / 100.0);
            Money::new(remaining.amount_cents.max(0), subtotal.currency)
        }
        Some(CouponValue::Fixed(amount)) => subtotal.subtract_clamped(amount).unwrap_or(subtotal),
        None => subtotal,
    }
}

/// Tax on the pre-discount subtotal, rounded half-up to the cent.
pub fn tax(subtotal: Money, rate_percent: f64) -> Money {
    subtotal.percentage(rate_percent)
}

/// Final total: discounted total plus tax.
///
/// Both inputs derive from the same subtotal and therefore share a
/// currency; the sum is exact.
pub fn grand_total(discounted_total: Money, tax: Money) -> Money {
    Money::new(
        discounted_total.amount_cents.saturating_add(tax.amount_cents),
        discounted_total.currency,
    )
}

/// Total quantity across all items (not the number of distinct items).
pub fn item_count(items: &[LineItem]) -> i64 {
    items.iter().fold(0_i64, |acc, item| acc.saturating_add(item.quantity))
}

/// Full pricing breakdown for a set of items and an optional coupon.
pub fn totals(items: &[LineItem], coupon: Option<&Coupon>, config: &PricingConfig) -> CartTotals {
    let subtotal = subtotal(items, config.currency);
    let discounted_total = discounted_total(subtotal, coupon);
    let discount = subtotal
        .try_subtract(&discounted_total)
        .unwrap_or_else(|| Money::zero(config.currency));
    let tax = tax(subtotal, config.tax_rate_percent);
    let grand_total = grand_total(discounted_total, tax);

    CartTotals {
        subtotal,
        discount,
        discounted_total,
        tax,
        grand_total,
        item_count: item_count(items),
    }
}
