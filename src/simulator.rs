//! Transaction simulator
//! Dry-runs a prospective transaction against current chain state via the
//! injected provider, classifies the outcome, and scores its risk before
//! any value-moving call reaches a live network.
//!
//! No chain state is mutated and no retries happen here; transient
//! provider failures surface as a Fail outcome for the caller to
//! interpret.

use std::sync::Arc;

use alloy_primitives::Bytes;
use tracing::{debug, warn};

use crate::chains::ChainKind;
use crate::classify::{FailureClassifier, GethClassifier};
use crate::config::SentinelConfig;
use crate::models::{
    CallTraceNode, RiskAssessment, RiskIssue, RiskLevel, SentinelError, SentinelResult, Severity,
    SimulationRequest, SimulationResult, SimulationStatus,
};
use crate::provider::{CallRequest, ProviderRegistry};

/// Simulation bundled with its risk verdict
#[derive(Debug, Clone, serde::Serialize)]
pub struct SimulationWithRisk {
    pub result: SimulationResult,
    pub risk: RiskAssessment,
}

/// Stateless dry-run simulator over an injected chain provider
pub struct TransactionSimulator {
    config: SentinelConfig,
    providers: ProviderRegistry,
    classifier: Arc<dyn FailureClassifier>,
}

impl TransactionSimulator {
    pub fn new(config: SentinelConfig, providers: ProviderRegistry) -> Self {
        Self {
            config,
            providers,
            classifier: Arc::new(GethClassifier),
        }
    }

    /// Swap in a provider-specific failure parser (see `classify`)
    pub fn with_classifier(mut self, classifier: Arc<dyn FailureClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    /// Validate, execute a read-only call, and classify the outcome.
    ///
    /// Validation failures are errors raised before any network call.
    /// Classified Revert/Fail outcomes are Ok results whose `status`
    /// carries the information.
    pub async fn simulate(&self, request: &SimulationRequest) -> SentinelResult<SimulationResult> {
        let call = validate_request(request)?;
        let provider = self.providers.get(&request.chain)?;

        debug!(
            "🧪 Simulating {} -> {} on {}",
            request.from, request.to, request.chain
        );

        // Read-only execution and gas estimate against current state
        let (call_outcome, gas_estimate) =
            tokio::join!(provider.call(&call), provider.estimate_gas(&call));

        // Estimation failure must not abort the simulation
        let gas_used = gas_estimate.unwrap_or_else(|e| {
            warn!("⚠️ Gas estimation failed, using fallback: {}", e);
            self.config.fallback_gas_estimate
        });

        // Block context is non-critical
        let block_number = provider.get_block().await.ok().map(|b| b.number);

        // Trace is optional; absence never fails the simulation
        let trace = provider.trace_call(&call).await.unwrap_or(None);

        let provider_name = provider.name().to_string();
        let simulated_at = chrono::Utc::now();

        let result = match call_outcome {
            Ok(return_data) => SimulationResult {
                status: SimulationStatus::Success,
                success: true,
                gas_used,
                return_data: Some(format!("0x{}", hex::encode(&return_data))),
                error: None,
                revert_reason: None,
                trace,
                block_number,
                provider: provider_name,
                simulated_at,
            },
            Err(err) => {
                let classified = self.classifier.classify(&err.message);
                SimulationResult {
                    status: classified.status,
                    success: false,
                    gas_used,
                    return_data: None,
                    error: Some(err.message),
                    revert_reason: classified.revert_reason,
                    trace,
                    block_number,
                    provider: provider_name,
                    simulated_at,
                }
            }
        };

        Ok(result)
    }

    /// Compose simulation with risk scoring in one call
    pub async fn simulate_with_risk_assessment(
        &self,
        request: &SimulationRequest,
    ) -> SentinelResult<SimulationWithRisk> {
        let result = self.simulate(request).await?;
        let risk = self.assess_risk(&result);
        Ok(SimulationWithRisk { result, risk })
    }

    /// Pure function of a simulation result; no provider access
    pub fn assess_risk(&self, result: &SimulationResult) -> RiskAssessment {
        assess_risk(result, &self.config)
    }
}

/// Fail fast on malformed requests, before any network call
fn validate_request(request: &SimulationRequest) -> SentinelResult<CallRequest> {
    let kind = ChainKind::from_chain(&request.chain);

    if request.from.is_empty() {
        return Err(SentinelError::invalid_request("Missing 'from' address"));
    }
    if request.to.is_empty() {
        return Err(SentinelError::invalid_request("Missing 'to' address"));
    }
    kind.validate_address(&request.from)?;
    kind.validate_address(&request.to)?;

    let data = match request.data.as_deref() {
        Some(hex_data) => {
            let stripped = hex_data.strip_prefix("0x").unwrap_or(hex_data);
            Bytes::from(hex::decode(stripped)?)
        }
        None => Bytes::new(),
    };

    Ok(CallRequest {
        from: request.from.clone(),
        to: request.to.clone(),
        value: request.value,
        data,
        gas_limit: request.gas_limit,
    })
}

/// Score a simulation result. Deterministic and side-effect free.
pub fn assess_risk(result: &SimulationResult, config: &SentinelConfig) -> RiskAssessment {
    let mut issues = Vec::new();
    let mut warnings = Vec::new();
    let mut level = RiskLevel::Low;

    if !result.success {
        let description = result
            .revert_reason
            .as_deref()
            .map(|r| format!("Transaction would revert: {}", r))
            .or_else(|| {
                result
                    .error
                    .as_deref()
                    .map(|e| format!("Transaction would fail: {}", e))
            })
            .unwrap_or_else(|| "Transaction would fail".to_string());

        issues.push(RiskIssue {
            category: "execution".to_string(),
            severity: Severity::Critical,
            description,
        });
        level = RiskLevel::Critical;
    }

    if result.gas_used > config.high_gas_threshold {
        warnings.push("Extremely high gas usage detected".to_string());
        issues.push(RiskIssue {
            category: "gas".to_string(),
            severity: Severity::Medium,
            description: format!(
                "Gas usage {} exceeds the {} threshold",
                result.gas_used, config.high_gas_threshold
            ),
        });
        // High gas alone never escalates past medium
        if (level as u8) < (RiskLevel::Medium as u8) {
            level = RiskLevel::Medium;
        }
    }

    if let Some(trace) = &result.trace {
        let reentered = find_reentered_addresses(trace);
        if !reentered.is_empty() {
            for address in &reentered {
                warnings.push(format!(
                    "CRITICAL: Potential reentrancy detected - {} re-entered on the call path",
                    address
                ));
            }
            issues.push(RiskIssue {
                category: "reentrancy".to_string(),
                severity: Severity::Critical,
                description: format!(
                    "Call trace cycles back into {} previously-entered contract(s)",
                    reentered.len()
                ),
            });
            level = RiskLevel::Critical;
        }
    }

    let recommendations = if level == RiskLevel::Critical {
        vec!["DO NOT EXECUTE - Critical issues detected".to_string()]
    } else if issues.is_empty() {
        vec!["Transaction appears safe to execute".to_string()]
    } else {
        vec!["Review flagged issues before executing".to_string()]
    };

    RiskAssessment {
        level,
        issues,
        warnings,
        recommendations,
    }
}

/// Walk the call trace and collect every `to` address that equals an
/// ancestor's `to` on the current call path: a call-graph cycle back to
/// a previously-entered contract.
fn find_reentered_addresses(root: &CallTraceNode) -> Vec<String> {
    let mut path = Vec::new();
    let mut hits = Vec::new();
    walk(root, &mut path, &mut hits);
    hits.dedup();
    hits
}

fn walk(node: &CallTraceNode, path: &mut Vec<String>, hits: &mut Vec<String>) {
    let to = node.to.to_lowercase();
    if path.contains(&to) && !hits.contains(&to) {
        hits.push(to.clone());
    }
    path.push(to);
    for child in &node.calls {
        walk(child, path, hits);
    }
    path.pop();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ErrorCode;
    use alloy_primitives::U256;

    fn request() -> SimulationRequest {
        SimulationRequest {
            chain: "ethereum".to_string(),
            from: "0x0000000000000000000000000000000000000001".to_string(),
            to: "0x0000000000000000000000000000000000000002".to_string(),
            value: U256::ZERO,
            data: Some("0xa9059cbb".to_string()),
            gas_limit: None,
        }
    }

    fn success_result() -> SimulationResult {
        SimulationResult {
            status: SimulationStatus::Success,
            success: true,
            gas_used: 50_000,
            return_data: Some("0x01".to_string()),
            error: None,
            revert_reason: None,
            trace: None,
            block_number: Some(19_000_000),
            provider: "mock".to_string(),
            simulated_at: chrono::Utc::now(),
        }
    }

    fn node(to: &str, calls: Vec<CallTraceNode>) -> CallTraceNode {
        CallTraceNode {
            call_type: "CALL".to_string(),
            from: "0x0000000000000000000000000000000000000001".to_string(),
            to: to.to_string(),
            calls,
        }
    }

    #[test]
    fn test_validate_rejects_bad_addresses() {
        let mut req = request();
        req.to = "not-an-address".to_string();
        let err = validate_request(&req).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidAddress);
    }

    #[test]
    fn test_validate_rejects_missing_from() {
        let mut req = request();
        req.from = String::new();
        let err = validate_request(&req).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidRequest);
    }

    #[test]
    fn test_validate_rejects_bad_calldata() {
        let mut req = request();
        req.data = Some("0xzzzz".to_string());
        let err = validate_request(&req).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidCalldata);
    }

    #[test]
    fn test_validate_decodes_calldata() {
        let call = validate_request(&request()).unwrap();
        assert_eq!(call.data.as_ref(), &[0xa9, 0x05, 0x9c, 0xbb]);
    }

    #[test]
    fn test_assess_safe_transaction() {
        let cfg = SentinelConfig::default();
        let risk = assess_risk(&success_result(), &cfg);
        assert_eq!(risk.level, RiskLevel::Low);
        assert!(risk.issues.is_empty());
        assert!(risk.recommendations[0].contains("appears safe"));
    }

    #[test]
    fn test_assess_failed_transaction_is_critical() {
        let cfg = SentinelConfig::default();
        let mut result = success_result();
        result.status = SimulationStatus::Revert;
        result.success = false;
        result.revert_reason = Some("Insufficient balance".to_string());

        let risk = assess_risk(&result, &cfg);
        assert_eq!(risk.level, RiskLevel::Critical);
        assert_eq!(risk.issues[0].severity, Severity::Critical);
        assert!(risk.recommendations[0].contains("DO NOT EXECUTE"));
    }

    #[test]
    fn test_high_gas_alone_caps_at_medium() {
        let cfg = SentinelConfig::default();
        let mut result = success_result();
        result.gas_used = cfg.high_gas_threshold + 1;

        let risk = assess_risk(&result, &cfg);
        assert_eq!(risk.level, RiskLevel::Medium);
        assert!(risk
            .warnings
            .iter()
            .any(|w| w.contains("Extremely high gas usage detected")));
    }

    #[test]
    fn test_trace_reentrancy_detected() {
        let cfg = SentinelConfig::default();
        let victim = "0x00000000000000000000000000000000000000aa";
        let attacker = "0x00000000000000000000000000000000000000bb";

        // victim -> attacker -> victim (leaf re-enters ancestor)
        let trace = node(victim, vec![node(attacker, vec![node(victim, vec![])])]);
        let mut result = success_result();
        result.trace = Some(trace);

        let risk = assess_risk(&result, &cfg);
        assert_eq!(risk.level, RiskLevel::Critical);
        assert!(risk
            .warnings
            .iter()
            .any(|w| w.to_lowercase().contains("reentrancy")));
    }

    #[test]
    fn test_trace_without_cycle_is_clean() {
        let cfg = SentinelConfig::default();
        let trace = node(
            "0x00000000000000000000000000000000000000aa",
            vec![
                node("0x00000000000000000000000000000000000000bb", vec![]),
                node("0x00000000000000000000000000000000000000cc", vec![]),
            ],
        );
        let mut result = success_result();
        result.trace = Some(trace);

        let risk = assess_risk(&result, &cfg);
        assert_eq!(risk.level, RiskLevel::Low);
        assert!(!risk.warnings.iter().any(|w| w.contains("reentrancy")));
    }

    #[test]
    fn test_siblings_with_same_target_are_not_reentrancy() {
        // Two separate calls to the same contract at the same depth are
        // a fan-out, not a cycle back into an ancestor.
        let trace = node(
            "0x00000000000000000000000000000000000000aa",
            vec![
                node("0x00000000000000000000000000000000000000bb", vec![]),
                node("0x00000000000000000000000000000000000000bb", vec![]),
            ],
        );
        assert!(find_reentered_addresses(&trace).is_empty());
    }
}
