//! Per-resource-class freshness windows.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Server resource classes cached by the storefront.
///
/// Each class carries its own default freshness window, reflecting how
/// often the underlying resource changes rather than anything about the
/// cache itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceClass {
    /// Paged/filtered product listing queries.
    Listing,
    /// Single-product reads.
    Product,
    /// Best-seller lists.
    BestSellers,
    /// Featured-product lists.
    Featured,
    /// Category lists.
    Categories,
}

impl ResourceClass {
    /// Get the name of this resource class.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Listing => "listing",
            Self::Product => "product",
            Self::BestSellers => "best-sellers",
            Self::Featured => "featured",
            Self::Categories => "categories",
        }
    }

    /// Get the default freshness window for this resource class.
    pub fn default_ttl(&self) -> Duration {
        match self {
            Self::Listing => Duration::from_secs(60),
            Self::Product => Duration::from_secs(300),
            Self::BestSellers => Duration::from_secs(600),
            Self::Featured => Duration::from_secs(600),
            Self::Categories => Duration::from_secs(3600),
        }
    }
}

impl std::fmt::Display for ResourceClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Freshness windows for every resource class, with per-class
/// overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreshnessPolicy {
    listing: Duration,
    product: Duration,
    best_sellers: Duration,
    featured: Duration,
    categories: Duration,
}

impl Default for FreshnessPolicy {
    fn default() -> Self {
        Self {
            listing: ResourceClass::Listing.default_ttl(),
            product: ResourceClass::Product.default_ttl(),
            best_sellers: ResourceClass::BestSellers.default_ttl(),
            featured: ResourceClass::Featured.default_ttl(),
            categories: ResourceClass::Categories.default_ttl(),
        }
    }
}

impl FreshnessPolicy {
    /// Policy with the per-class defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the window for one resource class.
    pub fn with_ttl(mut self, class: ResourceClass, ttl: Duration) -> Self {
        match class {
            ResourceClass::Listing => self.listing = ttl,
            ResourceClass::Product => self.product = ttl,
            ResourceClass::BestSellers => self.best_sellers = ttl,
            ResourceClass::Featured => self.featured = ttl,
            ResourceClass::Categories => self.categories = ttl,
        }
        self
    }

    /// The freshness window for a resource class.
    pub fn ttl_for(&self, class: ResourceClass) -> Duration {
        match class {
            ResourceClass::Listing => self.listing,
            ResourceClass::Product => self.product,
            ResourceClass::BestSellers => self.best_sellers,
            ResourceClass::Featured => self.featured,
            ResourceClass::Categories => self.categories,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_windows_reflect_update_frequency() {
        let policy = FreshnessPolicy::default();

        // Listings churn fastest; categories barely change.
        assert!(policy.ttl_for(ResourceClass::Listing) < policy.ttl_for(ResourceClass::Product));
        assert!(
            policy.ttl_for(ResourceClass::Product) < policy.ttl_for(ResourceClass::Categories)
        );
        assert_eq!(policy.ttl_for(ResourceClass::Listing), Duration::from_secs(60));
        assert_eq!(
            policy.ttl_for(ResourceClass::Categories),
            Duration::from_secs(3600)
        );
    }

    #[test]
    fn test_with_ttl_overrides_one_class_only() {
        let policy = FreshnessPolicy::new().with_ttl(ResourceClass::Listing, Duration::from_secs(5));

        assert_eq!(policy.ttl_for(ResourceClass::Listing), Duration::from_secs(5));
        assert_eq!(
            policy.ttl_for(ResourceClass::Product),
            ResourceClass::Product.default_ttl()
        );
    }

    #[test]
    fn test_class_names() {
        assert_eq!(ResourceClass::BestSellers.name(), "best-sellers");
        assert_eq!(ResourceClass::Listing.to_string(), "listing");
    }
}
