//! Malicious contract registry
//!
//! A process-wide set of known-bad addresses owned by the analyzer
//! instance. Checked first on every request; a match forces the verdict
//! to critical regardless of other findings. Entries are added only
//! through the explicit administrative operation, never inferred.

use std::sync::Arc;

use dashmap::DashSet;
use tracing::info;

/// Thread-safe malicious address set. Addresses are normalized to
/// lowercase so EVM checksum casing cannot dodge a match.
#[derive(Clone, Default)]
pub struct MaliciousRegistry {
    addresses: Arc<DashSet<String>>,
}

impl MaliciousRegistry {
    pub fn new() -> Self {
        Self {
            addresses: Arc::new(DashSet::new()),
        }
    }

    /// Administrative add. Idempotent: re-adding an address is a no-op.
    pub fn add(&self, address: &str) {
        let key = address.to_lowercase();
        if self.addresses.insert(key.clone()) {
            info!("🚫 Registered malicious contract: {}", key);
        }
    }

    /// Exact-match lookup
    pub fn contains(&self, address: &str) -> bool {
        self.addresses.contains(&address.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_contains() {
        let registry = MaliciousRegistry::new();
        assert!(!registry.contains("0xdeadbeef00000000000000000000000000000000"));

        registry.add("0xDEADBEEF00000000000000000000000000000000");
        assert!(registry.contains("0xdeadbeef00000000000000000000000000000000"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_add_is_idempotent() {
        let registry = MaliciousRegistry::new();
        registry.add("0xabc0000000000000000000000000000000000000");
        registry.add("0xABC0000000000000000000000000000000000000");
        assert_eq!(registry.len(), 1);
    }
}
