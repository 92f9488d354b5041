//! The cart store: normalized line items plus a single coupon slot.

use crate::cart::coupon::Coupon;
use crate::cart::line_item::{ItemKey, LineItem, ProductRef, VariantSelection};
use crate::cart::pricing::{self, CartTotals, PricingConfig};
use crate::ids::ProductId;
use crate::money::Money;
use crate::persist::{CartStorage, PersistedCart};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use steep_core::{Memo, SharedClock, Timestamp};

/// Synchronous snapshot of the cart handed to the UI layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartSummary {
    /// Current line items, in insertion order.
    pub items: Vec<LineItem>,
    /// Sum of quantities.
    pub item_count: i64,
    /// Subtotal before discounts.
    pub subtotal: Money,
    /// Tax on the pre-discount subtotal.
    pub tax: Money,
    /// Subtotal after the coupon.
    pub discounted_total: Money,
    /// Final total.
    pub grand_total: Money,
}

/// Owner of the cart's line items and coupon.
///
/// Explicitly constructed and passed by handle; never a process-wide
/// global. All operations are synchronous and run to completion, so
/// mutations are atomic with respect to each other. Malformed input
/// (non-positive quantity on add, unknown identity key on update) is a
/// silent no-op rather than an error; every method that can reject
/// input returns whether the cart changed.
///
/// Invariants:
/// - at most one line item per `(product, variant)` identity key;
/// - every stored quantity is positive;
/// - all item prices share the configured currency.
pub struct CartStore {
    items: Vec<LineItem>,
    coupon: Option<Coupon>,
    last_modified: Timestamp,
    revision: u64,
    clock: SharedClock,
    storage: Option<Arc<dyn CartStorage>>,
    config: PricingConfig,
    totals_memo: Memo<u64, CartTotals>,
}

impl CartStore {
    /// Create an empty cart.
    pub fn new(clock: SharedClock, config: PricingConfig) -> Self {
        let now = clock.now();
        Self {
            items: Vec::new(),
            coupon: None,
            last_modified: now,
            revision: 0,
            clock,
            storage: None,
            config,
            totals_memo: Memo::new(),
        }
    }

    /// Create a cart backed by durable storage, restoring any state
    /// persisted by a previous session.
    ///
    /// A failed restore starts an empty cart rather than failing the
    /// session.
    pub fn with_storage(
        clock: SharedClock,
        config: PricingConfig,
        storage: Arc<dyn CartStorage>,
    ) -> Self {
        let mut cart = Self::new(clock, config);
        match storage.load() {
            Ok(Some(persisted)) => {
                cart.items = persisted.items;
                cart.coupon = persisted.coupon;
            }
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(error = %err, "failed to restore persisted cart, starting empty");
            }
        }
        cart.storage = Some(storage);
        cart
    }

    /// Add a product to the cart.
    ///
    /// If an entry with the same identity key exists, its quantity is
    /// incremented by `quantity`; otherwise a new line item is
    /// inserted. A non-positive quantity, or a price in a currency
    /// other than the configured one, is rejected as a no-op.
    pub fn add(
        &mut self,
        product: ProductRef,
        quantity: i64,
        variant: Option<VariantSelection>,
    ) -> bool {
        if quantity <= 0 {
            tracing::debug!(product = %product.id, quantity, "rejected add with non-positive quantity");
            return false;
        }

        let unit_currency = variant
            .as_ref()
            .and_then(|v| v.price)
            .unwrap_or(product.base_price)
            .currency;
        if unit_currency != self.config.currency {
            tracing::debug!(
                product = %product.id,
                currency = %unit_currency,
                "rejected add with mismatched currency"
            );
            return false;
        }

        let key = ItemKey::new(&product.id, variant.as_ref());
        if let Some(existing) = self.items.iter_mut().find(|i| i.key() == key) {
            existing.quantity = existing.quantity.saturating_add(quantity);
        } else {
            let added_at = self.clock.now();
            self.items.push(LineItem::new(product, variant, quantity, added_at));
        }
        self.touch();
        true
    }

    /// Remove the entry with the given identity key. No-op if absent.
    pub fn remove(&mut self, product_id: &ProductId, variant: Option<&VariantSelection>) -> bool {
        let key = ItemKey::new(product_id, variant);
        let len_before = self.items.len();
        self.items.retain(|i| i.key() != key);
        let removed = self.items.len() < len_before;
        if removed {
            self.touch();
        }
        removed
    }

    /// Set the quantity of an existing entry directly (not additive).
    ///
    /// A quantity of zero or less removes the entry. Unknown identity
    /// keys are a no-op.
    pub fn update_quantity(
        &mut self,
        product_id: &ProductId,
        quantity: i64,
        variant: Option<&VariantSelection>,
    ) -> bool {
        if quantity <= 0 {
            return self.remove(product_id, variant);
        }

        let key = ItemKey::new(product_id, variant);
        if let Some(item) = self.items.iter_mut().find(|i| i.key() == key) {
            item.quantity = quantity;
            self.touch();
            true
        } else {
            tracing::debug!(product = %product_id, "rejected quantity update for absent item");
            false
        }
    }

    /// Empty the cart and drop any coupon.
    pub fn clear(&mut self) {
        if self.items.is_empty() && self.coupon.is_none() {
            return;
        }
        self.items.clear();
        self.coupon = None;
        self.touch();
    }

    /// Apply a coupon, atomically replacing any previous one.
    pub fn apply_coupon(&mut self, coupon: Coupon) {
        self.coupon = Some(coupon);
        self.touch();
    }

    /// Remove the active coupon, returning it if one was set.
    pub fn remove_coupon(&mut self) -> Option<Coupon> {
        let removed = self.coupon.take();
        if removed.is_some() {
            self.touch();
        }
        removed
    }

    /// Current line items, in insertion order.
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// The active coupon, if any.
    pub fn coupon(&self) -> Option<&Coupon> {
        self.coupon.as_ref()
    }

    /// Check if the cart has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of quantities across all items.
    pub fn item_count(&self) -> i64 {
        pricing::item_count(&self.items)
    }

    /// When the cart last changed (Unix millis).
    pub fn last_modified(&self) -> Timestamp {
        self.last_modified
    }

    /// Monotonic revision, bumped on every state change. Derivations
    /// key their memoization on it.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Pricing breakdown for the current cart state.
    ///
    /// Memoized on the cart revision: repeated calls with unchanged
    /// state return the cached value without re-deriving.
    pub fn totals(&mut self) -> CartTotals {
        let items = &self.items;
        let coupon = self.coupon.as_ref();
        let config = &self.config;
        self.totals_memo
            .get_or_compute(self.revision, || pricing::totals(items, coupon, config))
    }

    /// Full cart snapshot for the UI layer.
    pub fn summary(&mut self) -> CartSummary {
        let totals = self.totals();
        CartSummary {
            items: self.items.clone(),
            item_count: totals.item_count,
            subtotal: totals.subtotal,
            tax: totals.tax,
            discounted_total: totals.discounted_total,
            grand_total: totals.grand_total,
        }
    }

    fn touch(&mut self) {
        self.last_modified = self.clock.now();
        self.revision += 1;
        self.persist();
    }

    /// Best-effort write-through to durable storage. A failed save
    /// never fails the mutation.
    fn persist(&self) {
        let Some(storage) = &self.storage else {
            return;
        };
        let persisted = PersistedCart {
            items: self.items.clone(),
            coupon: self.coupon.clone(),
            saved_at: self.last_modified,
        };
        if let Err(err) = storage.save(&persisted) {
            tracing::warn!(error = %err, "failed to persist cart");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::pricing::PricingConfig;
    use crate::money::Currency;
    use crate::persist::MemoryCartStorage;
    use steep_core::ManualClock;

    fn clock() -> SharedClock {
        Arc::new(ManualClock::new(1_000))
    }

    fn config() -> PricingConfig {
        PricingConfig::new(Currency::USD).with_tax_rate(10.0)
    }

    fn product(id: &str, price_cents: i64) -> ProductRef {
        ProductRef::new(
            ProductId::new(id),
            id.to_string(),
            Money::new(price_cents, Currency::USD),
        )
    }

    #[test]
    fn test_add_merges_same_identity_key() {
        let mut cart = CartStore::new(clock(), config());

        assert!(cart.add(product("tea-a", 10000), 2, None));
        assert!(cart.add(product("tea-a", 10000), 1, None));

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.item_count(), 3);
        assert_eq!(cart.totals().subtotal.amount_cents, 30000);
    }

    #[test]
    fn test_add_distinguishes_variants() {
        let mut cart = CartStore::new(clock(), config());
        let small = VariantSelection::new().with_option("size", "50g");
        let large = VariantSelection::new().with_option("size", "100g");

        cart.add(product("tea-a", 1000), 1, Some(small));
        cart.add(product("tea-a", 1000), 1, Some(large));

        assert_eq!(cart.items().len(), 2);
    }

    #[test]
    fn test_add_rejects_non_positive_quantity() {
        let mut cart = CartStore::new(clock(), config());

        assert!(!cart.add(product("tea-a", 1000), 0, None));
        assert!(!cart.add(product("tea-a", 1000), -3, None));
        assert!(cart.is_empty());
        assert_eq!(cart.revision(), 0);
    }

    #[test]
    fn test_add_rejects_mismatched_currency() {
        let mut cart = CartStore::new(clock(), config());
        let eur = ProductRef::new(
            ProductId::new("tea-eur"),
            "Tea",
            Money::new(1000, Currency::EUR),
        );

        assert!(!cart.add(eur, 1, None));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_update_quantity_sets_directly() {
        let mut cart = CartStore::new(clock(), config());
        cart.add(product("tea-a", 1000), 1, None);

        assert!(cart.update_quantity(&ProductId::new("tea-a"), 5, None));
        assert_eq!(cart.item_count(), 5);
    }

    #[test]
    fn test_update_quantity_zero_removes_and_remove_is_then_a_noop() {
        let mut cart = CartStore::new(clock(), config());
        cart.add(product("tea-a", 1000), 2, None);

        assert!(cart.update_quantity(&ProductId::new("tea-a"), 0, None));
        assert_eq!(cart.item_count(), 0);

        // Removing the already-removed key is a no-op, not an error.
        assert!(!cart.remove(&ProductId::new("tea-a"), None));
    }

    #[test]
    fn test_update_quantity_unknown_key_is_noop() {
        let mut cart = CartStore::new(clock(), config());
        let revision = cart.revision();

        assert!(!cart.update_quantity(&ProductId::new("ghost"), 3, None));
        assert_eq!(cart.revision(), revision);
    }

    #[test]
    fn test_clear_drops_items_and_coupon() {
        let mut cart = CartStore::new(clock(), config());
        cart.add(product("tea-a", 1000), 1, None);
        cart.apply_coupon(Coupon::percentage("TEN", 10.0));

        cart.clear();

        assert!(cart.is_empty());
        assert!(cart.coupon().is_none());
    }

    #[test]
    fn test_apply_coupon_replaces_previous() {
        let mut cart = CartStore::new(clock(), config());
        cart.apply_coupon(Coupon::percentage("FIRST", 10.0));
        cart.apply_coupon(Coupon::percentage("SECOND", 25.0));

        assert_eq!(cart.coupon().map(|c| c.code.as_str()), Some("SECOND"));
    }

    #[test]
    fn test_no_duplicate_identity_keys_after_mixed_operations() {
        let mut cart = CartStore::new(clock(), config());
        let variant = VariantSelection::new().with_option("size", "50g");

        cart.add(product("tea-a", 1000), 1, Some(variant.clone()));
        cart.add(product("tea-a", 1000), 2, Some(variant.clone()));
        cart.update_quantity(&ProductId::new("tea-a"), 4, Some(&variant));
        cart.add(product("tea-a", 1000), 1, Some(variant));

        let mut keys: Vec<_> = cart.items().iter().map(LineItem::key).collect();
        keys.sort_by(|a, b| a.variant_key.cmp(&b.variant_key));
        keys.dedup();
        assert_eq!(keys.len(), cart.items().len());
    }

    #[test]
    fn test_totals_memoized_until_revision_changes() {
        let mut cart = CartStore::new(clock(), config());
        cart.add(product("tea-a", 10000), 2, None);

        let first = cart.totals();
        let second = cart.totals();
        assert_eq!(first, second);
        assert_eq!(cart.totals_memo.recomputes(), 1);
        assert_eq!(cart.totals_memo.hits(), 1);

        cart.add(product("tea-b", 5000), 1, None);
        cart.totals();
        assert_eq!(cart.totals_memo.recomputes(), 2);
    }

    #[test]
    fn test_fixed_coupon_scenario() {
        // $200 item, $50 coupon, 10% tax: 150 + 20 = 170.
        let mut cart = CartStore::new(clock(), config());
        cart.add(product("tea-a", 20000), 1, None);
        cart.apply_coupon(Coupon::fixed("FIFTY", Money::new(5000, Currency::USD)));

        let totals = cart.totals();
        assert_eq!(totals.discounted_total.amount_cents, 15000);
        assert_eq!(totals.tax.amount_cents, 2000);
        assert_eq!(totals.grand_total.amount_cents, 17000);
    }

    #[test]
    fn test_summary_shape() {
        let mut cart = CartStore::new(clock(), config());
        cart.add(product("tea-b", 10000), 1, None);
        cart.apply_coupon(Coupon::percentage("QUARTER", 25.0));

        let summary = cart.summary();
        assert_eq!(summary.items.len(), 1);
        assert_eq!(summary.item_count, 1);
        assert_eq!(summary.subtotal.amount_cents, 10000);
        assert_eq!(summary.discounted_total.amount_cents, 7500);
        assert_eq!(summary.tax.amount_cents, 1000);
        assert_eq!(summary.grand_total.amount_cents, 8500);
    }

    #[test]
    fn test_last_modified_follows_clock() {
        let manual = Arc::new(ManualClock::new(1_000));
        let mut cart = CartStore::new(manual.clone(), config());

        manual.advance_secs(5);
        cart.add(product("tea-a", 1000), 1, None);
        assert_eq!(cart.last_modified(), 6_000);
    }

    #[test]
    fn test_restore_from_storage() {
        let storage = Arc::new(MemoryCartStorage::new());

        {
            let mut cart = CartStore::with_storage(clock(), config(), storage.clone());
            cart.add(product("tea-a", 10000), 2, None);
            cart.apply_coupon(Coupon::percentage("TEN", 10.0));
        }

        let mut restored = CartStore::with_storage(clock(), config(), storage);
        assert_eq!(restored.item_count(), 2);
        assert_eq!(restored.coupon().map(|c| c.code.as_str()), Some("TEN"));
        assert_eq!(restored.totals().subtotal.amount_cents, 20000);
    }
}
