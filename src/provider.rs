//! Chain provider capability
//!
//! The RPC transport (pooling, batching, failover, retries) lives outside
//! this crate. Components receive an injected `ChainProvider` and await it
//! with no internal timeout; callers apply their own deadline/cancellation
//! to the capability.

use std::sync::Arc;

use alloy_primitives::Bytes;
use async_trait::async_trait;
use dashmap::DashMap;
use tracing::info;

use crate::models::{CallTraceNode, SentinelError, SentinelResult};

/// Read-only call parameters for `call` / `estimate_gas` / `trace_call`
#[derive(Debug, Clone, Default)]
pub struct CallRequest {
    pub from: String,
    pub to: String,
    /// Value in wei
    pub value: alloy_primitives::U256,
    /// Raw calldata
    pub data: Bytes,
    pub gas_limit: Option<u64>,
}

/// Block context for simulation results
#[derive(Debug, Clone, Copy)]
pub struct BlockInfo {
    pub number: u64,
    pub timestamp: u64,
}

/// Capability consumed by the analyzer and simulator.
///
/// Implementations translate these calls into their chain's RPC vocabulary
/// (`eth_getCode`, `eth_call`, `eth_estimateGas`, `debug_traceCall`, ...).
/// Errors surface as `ProviderError` and are never retried here.
#[async_trait]
pub trait ChainProvider: Send + Sync {
    /// Fetch deployed bytecode at an address
    async fn get_code(&self, address: &str) -> SentinelResult<Bytes>;

    /// Execute a read-only call against current chain state.
    /// A classified execution failure (revert, out of gas) is returned as
    /// an Err whose message carries the provider's failure vocabulary.
    async fn call(&self, req: &CallRequest) -> SentinelResult<Bytes>;

    /// Estimate gas for the call
    async fn estimate_gas(&self, req: &CallRequest) -> SentinelResult<u64>;

    /// Latest block context
    async fn get_block(&self) -> SentinelResult<BlockInfo>;

    /// Execution trace for the call, when the provider supports tracing
    async fn trace_call(&self, _req: &CallRequest) -> SentinelResult<Option<CallTraceNode>> {
        Ok(None)
    }

    /// Provider tag recorded in results for audit trails
    fn name(&self) -> &str;
}

/// Chain name -> provider binding, injected into component constructors.
/// Owned state, not a module-level singleton, so isolated instances can
/// coexist in tests and concurrent deployments.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: Arc<DashMap<String, Arc<dyn ChainProvider>>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self {
            providers: Arc::new(DashMap::new()),
        }
    }

    /// Bind a provider to a chain identifier (case-insensitive)
    pub fn bind(&self, chain: &str, provider: Arc<dyn ChainProvider>) {
        info!("🔌 Bound provider '{}' for chain {}", provider.name(), chain);
        self.providers.insert(chain.to_lowercase(), provider);
    }

    /// Resolve the provider for a chain, or `ProviderNotConfigured`
    pub fn get(&self, chain: &str) -> SentinelResult<Arc<dyn ChainProvider>> {
        self.providers
            .get(&chain.to_lowercase())
            .map(|entry| entry.value().clone())
            .ok_or_else(|| SentinelError::provider_not_configured(chain))
    }

    pub fn is_bound(&self, chain: &str) -> bool {
        self.providers.contains_key(&chain.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ErrorCode;

    struct NullProvider;

    #[async_trait]
    impl ChainProvider for NullProvider {
        async fn get_code(&self, _address: &str) -> SentinelResult<Bytes> {
            Ok(Bytes::new())
        }
        async fn call(&self, _req: &CallRequest) -> SentinelResult<Bytes> {
            Ok(Bytes::new())
        }
        async fn estimate_gas(&self, _req: &CallRequest) -> SentinelResult<u64> {
            Ok(21_000)
        }
        async fn get_block(&self) -> SentinelResult<BlockInfo> {
            Ok(BlockInfo {
                number: 1,
                timestamp: 0,
            })
        }
        fn name(&self) -> &str {
            "null"
        }
    }

    #[test]
    fn test_registry_bind_and_get() {
        let registry = ProviderRegistry::new();
        registry.bind("Ethereum", Arc::new(NullProvider));

        assert!(registry.is_bound("ethereum"));
        assert!(registry.get("ETHEREUM").is_ok());

        let err = registry.get("polygon").map(|_| ()).unwrap_err();
        assert_eq!(err.code, ErrorCode::ProviderNotConfigured);
    }

    #[tokio::test]
    async fn test_default_trace_call_is_none() {
        let provider = NullProvider;
        let trace = provider.trace_call(&CallRequest::default()).await.unwrap();
        assert!(trace.is_none());
    }
}
