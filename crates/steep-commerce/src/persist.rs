//! Durable cart storage at the host boundary.
//!
//! The cart's line items and active coupon are the only state this
//! layer persists across sessions; the query cache is explicitly
//! excluded and starts empty every session. State crosses the boundary
//! as JSON.

use crate::cart::{Coupon, LineItem};
use crate::error::CommerceError;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use steep_core::Timestamp;

/// Cart state persisted between sessions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersistedCart {
    /// Line items, in insertion order.
    pub items: Vec<LineItem>,
    /// Active coupon, if any.
    pub coupon: Option<Coupon>,
    /// When this snapshot was written (Unix millis).
    pub saved_at: Timestamp,
}

/// Host-provided durable key-value storage for the cart.
///
/// Implemented by the host environment (browser local storage, an
/// embedded KV store); `MemoryCartStorage` serves tests and hosts
/// without a durable store.
pub trait CartStorage: Send + Sync {
    /// Load the persisted cart, if one was saved.
    fn load(&self) -> Result<Option<PersistedCart>, CommerceError>;

    /// Save a cart snapshot, overwriting any previous one.
    fn save(&self, cart: &PersistedCart) -> Result<(), CommerceError>;

    /// Drop the persisted cart.
    fn clear(&self) -> Result<(), CommerceError>;
}

/// In-memory cart storage.
///
/// Round-trips through JSON so the serialization path is exercised the
/// same way a durable host store would.
#[derive(Debug, Default)]
pub struct MemoryCartStorage {
    slot: Mutex<Option<String>>,
}

impl MemoryCartStorage {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl CartStorage for MemoryCartStorage {
    fn load(&self) -> Result<Option<PersistedCart>, CommerceError> {
        match self.slot().as_deref() {
            Some(json) => Ok(Some(serde_json::from_str(json)?)),
            None => Ok(None),
        }
    }

    fn save(&self, cart: &PersistedCart) -> Result<(), CommerceError> {
        let json = serde_json::to_string(cart)?;
        *self.slot() = Some(json);
        Ok(())
    }

    fn clear(&self) -> Result<(), CommerceError> {
        *self.slot() = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::{ProductRef, VariantSelection};
    use crate::ids::ProductId;
    use crate::money::{Currency, Money};

    fn persisted() -> PersistedCart {
        let variant = VariantSelection::new()
            .with_option("size", "100g")
            .with_price(Money::new(2400, Currency::USD));
        let item = LineItem::new(
            ProductRef::new(
                ProductId::new("tea-gyokuro"),
                "Gyokuro",
                Money::new(1500, Currency::USD),
            ),
            Some(variant),
            2,
            1_000,
        );
        PersistedCart {
            items: vec![item],
            coupon: Some(Coupon::percentage("TEN", 10.0)),
            saved_at: 2_000,
        }
    }

    #[test]
    fn test_empty_storage_loads_none() {
        let storage = MemoryCartStorage::new();
        assert!(storage.load().unwrap().is_none());
    }

    #[test]
    fn test_save_then_load_round_trips() {
        let storage = MemoryCartStorage::new();
        let cart = persisted();

        storage.save(&cart).unwrap();
        let loaded = storage.load().unwrap().unwrap();

        assert_eq!(loaded, cart);
    }

    #[test]
    fn test_save_overwrites_previous_snapshot() {
        let storage = MemoryCartStorage::new();
        let mut cart = persisted();
        storage.save(&cart).unwrap();

        cart.coupon = None;
        cart.saved_at = 3_000;
        storage.save(&cart).unwrap();

        let loaded = storage.load().unwrap().unwrap();
        assert!(loaded.coupon.is_none());
        assert_eq!(loaded.saved_at, 3_000);
    }

    #[test]
    fn test_clear_drops_snapshot() {
        let storage = MemoryCartStorage::new();
        storage.save(&persisted()).unwrap();
        storage.clear().unwrap();
        assert!(storage.load().unwrap().is_none());
    }
}
