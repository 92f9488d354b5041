//! Cart line items and their identity keys.

use crate::ids::{ProductId, VariantId};
use crate::money::Money;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use steep_core::Timestamp;

/// Lightweight product snapshot carried by a line item.
///
/// Denormalized so the cart can render and price without a catalog
/// round-trip.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductRef {
    /// Product identifier.
    pub id: ProductId,
    /// Product name (denormalized for display).
    pub name: String,
    /// Base price, used when no variant price applies.
    pub base_price: Money,
}

impl ProductRef {
    /// Create a new product snapshot.
    pub fn new(id: ProductId, name: impl Into<String>, base_price: Money) -> Self {
        Self {
            id,
            name: name.into(),
            base_price,
        }
    }
}

/// A chosen product variant (e.g., "100g / Loose Leaf").
///
/// Options are kept in a `BTreeMap` so the canonical serialization is
/// independent of the order the caller supplied them in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct VariantSelection {
    /// Variant identifier, when the catalog assigns one.
    pub id: Option<VariantId>,
    /// Selected option values, keyed by option name.
    pub options: BTreeMap<String, String>,
    /// Variant price override; falls back to the product base price.
    pub price: Option<Money>,
}

impl VariantSelection {
    /// Create an empty selection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the variant ID.
    pub fn with_id(mut self, id: VariantId) -> Self {
        self.id = Some(id);
        self
    }

    /// Add an option value.
    pub fn with_option(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(name.into(), value.into());
        self
    }

    /// Set the variant price override.
    pub fn with_price(mut self, price: Money) -> Self {
        self.price = Some(price);
        self
    }

    /// Canonical serialization of this selection.
    ///
    /// Identical selections always produce the same string regardless
    /// of option insertion order.
    pub fn canonical(&self) -> String {
        let mut parts = Vec::new();
        if let Some(id) = &self.id {
            parts.push(format!("id={}", id));
        }
        for (name, value) in &self.options {
            parts.push(format!("{}={}", name, value));
        }
        parts.join("|")
    }
}

/// Identity key for a cart entry: product plus serialized variant.
///
/// The cart holds at most one line item per key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemKey {
    /// Product identifier.
    pub product_id: ProductId,
    /// Canonical variant serialization; empty for no variant.
    pub variant_key: String,
}

impl ItemKey {
    /// Build the identity key for a product and optional variant.
    pub fn new(product_id: &ProductId, variant: Option<&VariantSelection>) -> Self {
        Self {
            product_id: product_id.clone(),
            variant_key: variant.map(VariantSelection::canonical).unwrap_or_default(),
        }
    }
}

/// One cart entry: a product, an optional chosen variant, and a
/// positive quantity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineItem {
    /// Product snapshot.
    pub product: ProductRef,
    /// Chosen variant, if any.
    pub variant: Option<VariantSelection>,
    /// Quantity (always positive; zero removes the entry).
    pub quantity: i64,
    /// When the item was first added (Unix millis).
    pub added_at: Timestamp,
}

impl LineItem {
    /// Create a new line item.
    pub fn new(
        product: ProductRef,
        variant: Option<VariantSelection>,
        quantity: i64,
        added_at: Timestamp,
    ) -> Self {
        Self {
            product,
            variant,
            quantity,
            added_at,
        }
    }

    /// Identity key for this entry.
    pub fn key(&self) -> ItemKey {
        ItemKey::new(&self.product.id, self.variant.as_ref())
    }

    /// Effective unit price: the variant price when set, otherwise the
    /// product base price.
    pub fn unit_price(&self) -> Money {
        self.variant
            .as_ref()
            .and_then(|v| v.price)
            .unwrap_or(self.product.base_price)
    }

    /// Line total: unit price times quantity.
    pub fn line_total(&self) -> Money {
        self.unit_price().multiply(self.quantity)
    }
}
