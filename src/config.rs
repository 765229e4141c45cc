//! Configuration module for Contract Sentry
//! Handles all tunable thresholds for analysis and simulation

/// Configuration shared by the analyzer and simulator
#[derive(Debug, Clone)]
pub struct SentinelConfig {
    /// Memoize analysis results by (address, chain)
    pub cache_enabled: bool,

    /// Cache entry time-to-live in seconds
    pub cache_ttl_secs: u64,

    /// JUMPI count above which bytecode is flagged for possible
    /// unbounded-loop denial-of-service
    pub jumpi_dos_threshold: usize,

    /// Gas usage above which a simulation gets a high-gas warning
    pub high_gas_threshold: u64,

    /// Gas estimate used when the provider's estimation fails
    /// (21000 = plain transfer baseline)
    pub fallback_gas_estimate: u64,

    /// Minimum solc minor version with built-in checked arithmetic
    pub checked_math_min_minor: u64,
}

impl Default for SentinelConfig {
    fn default() -> Self {
        Self {
            cache_enabled: true,
            cache_ttl_secs: 300, // 5 minutes
            jumpi_dos_threshold: 10,
            high_gas_threshold: 1_000_000,
            fallback_gas_estimate: 21_000,
            checked_math_min_minor: 8, // solc 0.8.x
        }
    }
}

impl SentinelConfig {
    /// Config with caching disabled (analysis is always recomputed)
    pub fn without_cache() -> Self {
        Self {
            cache_enabled: false,
            ..Self::default()
        }
    }
}
