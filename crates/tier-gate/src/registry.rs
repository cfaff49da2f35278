//! Operation name to entitlement tier mapping

use std::collections::HashMap;

/// Entitlement tier; the meaning of each positive value is external convention
pub type Tier = u32;

/// Tier that requires no entitlement at all
pub const FREE_TIER: Tier = 0;

/// Static mapping from operation name to required tier.
///
/// Built once at startup and only read afterwards.
#[derive(Debug, Clone, Default)]
pub struct TierRegistry {
    tiers: HashMap<String, Tier>,
}

impl TierRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with_tier(mut self, operation: impl Into<String>, tier: Tier) -> Self {
        self.insert(operation, tier);
        self
    }

    pub fn insert(&mut self, operation: impl Into<String>, tier: Tier) {
        self.tiers.insert(operation.into(), tier);
    }

    pub fn contains(&self, operation: &str) -> bool {
        self.tiers.contains_key(operation)
    }

    /// Required tier for an operation.
    ///
    /// Unregistered operations resolve to [`FREE_TIER`]. This is a permissive
    /// default and is logged, since a missing entry is a configuration mistake.
    pub fn required_tier(&self, operation: &str) -> Tier {
        match self.tiers.get(operation) {
            Some(tier) => *tier,
            None => {
                tracing::warn!(
                    operation,
                    "No tier registered for operation, treating it as free"
                );
                FREE_TIER
            }
        }
    }

    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, Tier)> for TierRegistry {
    fn from_iter<I: IntoIterator<Item = (S, Tier)>>(iter: I) -> Self {
        let mut registry = Self::new();
        for (operation, tier) in iter {
            registry.insert(operation, tier);
        }
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_registered_tiers() {
        let registry = TierRegistry::new()
            .with_tier("ping", 0)
            .with_tier("getCurrentWeather", 1)
            .with_tier("getForecast", 3);

        assert_eq!(registry.required_tier("ping"), 0);
        assert_eq!(registry.required_tier("getCurrentWeather"), 1);
        assert_eq!(registry.required_tier("getForecast"), 3);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_unregistered_operation_is_free() {
        let registry = TierRegistry::new().with_tier("getForecast", 3);

        assert!(!registry.contains("mystery"));
        assert_eq!(registry.required_tier("mystery"), FREE_TIER);
    }

    #[test]
    fn test_from_iterator_last_entry_wins() {
        let registry: TierRegistry = [("a", 1), ("b", 2), ("a", 5)].into_iter().collect();
        assert_eq!(registry.required_tier("a"), 5);
        assert_eq!(registry.required_tier("b"), 2);
        assert!(!registry.is_empty());
    }
}
