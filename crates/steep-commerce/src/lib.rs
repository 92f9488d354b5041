//! Cart state and pricing derivations for the Steep tea storefront.
//!
//! This crate owns the client-side cart: a normalized collection of
//! line items keyed by product + chosen variant, a single coupon slot,
//! and the pure pricing derivations (subtotal, discount, tax, grand
//! total) computed over them.
//!
//! # Example
//!
//! ```rust,ignore
//! use steep_commerce::prelude::*;
//! use steep_core::system_clock;
//!
//! let mut cart = CartStore::new(system_clock(), PricingConfig::default().with_tax_rate(10.0));
//!
//! let sencha = ProductRef::new(ProductId::new("tea-sencha"), "Sencha", Money::new(1800, Currency::USD));
//! cart.add(sencha, 2, None);
//! cart.apply_coupon(Coupon::percentage("WELCOME10", 10.0));
//!
//! let totals = cart.totals();
//! println!("Total: {}", totals.grand_total.display());
//! ```

pub mod cart;
pub mod error;
pub mod ids;
pub mod money;
pub mod persist;

pub use error::CommerceError;
pub use ids::*;
pub use money::{Currency, Money};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::CommerceError;
    pub use crate::ids::*;
    pub use crate::money::{Currency, Money};

    pub use crate::cart::{
        CartStore, CartSummary, CartTotals, Coupon, CouponValue, ItemKey, LineItem, PricingConfig,
        ProductRef, VariantSelection,
    };

    pub use crate::persist::{CartStorage, MemoryCartStorage, PersistedCart};
}
