//! Type definitions for Contract Sentry
//! All core data structures for contract analysis and transaction simulation

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

/// Serialize wei-scale values as decimal strings, never native floats.
/// Downstream consumers (agents, gating automation) must not lose precision.
pub mod serde_u256_dec {
    use alloy_primitives::U256;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse::<U256>().map_err(serde::de::Error::custom)
    }
}

// ============================================
// Findings
// ============================================

/// Finding severity, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Informational,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Informational => "INFO",
            Severity::Low => "LOW",
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
            Severity::Critical => "CRITICAL",
        }
    }
}

/// Closed taxonomy of detectable issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FindingCategory {
    /// State mutated after an external call (the canonical drain pattern)
    Reentrancy,
    /// Contract contains the SELFDESTRUCT opcode
    SelfdestructUnprotected,
    /// Contract contains DELEGATECALL (arbitrary code execution risk)
    DelegatecallInjection,
    /// Contract reads the block timestamp (manipulable time source)
    TimestampDependence,
    /// Excessive conditional jumps, possible unbounded-loop DoS
    GasLimitDoS,
    /// Payable function without apparent access control
    AccessControl,
    /// Bytecode reentrancy pattern with no guard in supplied source
    MissingReentrancyGuard,
    /// Address matched the malicious registry
    KnownMalicious,
}

impl FindingCategory {
    /// Fixed remediation string per category (never free text)
    pub fn recommendation(&self) -> &'static str {
        match self {
            FindingCategory::Reentrancy => "Implement a reentrancy guard immediately",
            FindingCategory::SelfdestructUnprotected => {
                "Remove selfdestruct or gate it behind strict access control"
            }
            FindingCategory::DelegatecallInjection => {
                "Restrict delegatecall targets to an immutable allow-list"
            }
            FindingCategory::TimestampDependence => {
                "Avoid block timestamp for critical logic; use block numbers or oracles"
            }
            FindingCategory::GasLimitDoS => {
                "Bound all loops and paginate operations over unbounded collections"
            }
            FindingCategory::AccessControl => {
                "Add explicit access control modifiers to all payable functions"
            }
            FindingCategory::MissingReentrancyGuard => {
                "Adopt a reentrancy guard (e.g. OpenZeppelin ReentrancyGuard) on state-changing entry points"
            }
            FindingCategory::KnownMalicious => {
                "Do not interact with this contract under any circumstances"
            }
        }
    }
}

/// A single detected issue. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    pub category: FindingCategory,
    pub severity: Severity,
    pub title: String,
    /// Human-readable consequence, may cite historical precedent
    pub impact: String,
    /// Function name/location, when attributable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
}

impl Finding {
    pub fn new(
        category: FindingCategory,
        severity: Severity,
        title: impl Into<String>,
        impact: impl Into<String>,
    ) -> Self {
        Self {
            category,
            severity,
            title: title.into(),
            impact: impact.into(),
            function: None,
        }
    }

    pub fn with_function(mut self, function: impl Into<String>) -> Self {
        self.function = Some(function.into());
        self
    }
}

// ============================================
// Risk level
// ============================================

/// Aggregate severity verdict for a contract or transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    /// No findings at all
    Minimal,
    /// Low-severity findings only
    Low,
    /// Medium risk, proceed with caution
    Medium,
    /// High risk, likely to lose funds
    High,
    /// Critical, known malicious or critical finding present
    Critical,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Minimal => "MINIMAL",
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
            RiskLevel::Critical => "CRITICAL",
        }
    }
}

// ============================================
// Contract analysis request/result
// ============================================

/// Optional pre-fetched contract artifacts. If bytecode is absent the
/// analyzer fetches it via the chain provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContractMetadata {
    /// Hex-encoded runtime bytecode (with or without 0x prefix)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytecode: Option<String>,
    /// JSON ABI array
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abi: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compiler_version: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractAnalysisRequest {
    pub address: String,
    /// Chain identifier, e.g. "ethereum", "polygon", "solana"
    pub chain: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ContractMetadata>,
}

/// Boolean flags from the opcode-stream pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BytecodeAnalysis {
    pub has_reentrancy_pattern: bool,
    pub has_selfdestruct_pattern: bool,
    pub has_delegatecall_pattern: bool,
    pub has_timestamp_dependence: bool,
    pub has_complex_loops: bool,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct AbiAnalysis {
    pub total_functions: usize,
    pub payable_functions: usize,
}

/// Present only when source code was supplied
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SourceAnalysis {
    pub uses_reentrancy_guard: bool,
    pub uses_access_control: bool,
    pub uses_checked_math: bool,
}

/// Severity tally over `findings`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindingSummary {
    pub critical_count: usize,
    pub high_count: usize,
    pub total_findings: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractAnalysisResult {
    pub address: String,
    pub chain: String,
    pub bytecode_analysis: BytecodeAnalysis,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abi_analysis: Option<AbiAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_analysis: Option<SourceAnalysis>,
    pub findings: Vec<Finding>,
    pub is_known_malicious: bool,
    pub risk_level: RiskLevel,
    pub summary: FindingSummary,
    pub recommendations: Vec<String>,
    pub analyzed_at: chrono::DateTime<chrono::Utc>,
}

// ============================================
// Simulation request/result
// ============================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationRequest {
    pub chain: String,
    pub from: String,
    pub to: String,
    /// Value in wei, serialized as a decimal string
    #[serde(default, with = "serde_u256_dec")]
    pub value: U256,
    /// Hex-encoded calldata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_limit: Option<u64>,
}

/// Closed classification of a simulation outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimulationStatus {
    /// Call executed successfully against current chain state
    Success,
    /// Deterministic abort, optionally with a reason string
    Revert,
    /// Gas exhaustion, insufficient balance, nonce conflict, or transport failure
    Fail,
}

/// Recursive call-trace node, as reported by tracing-capable providers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallTraceNode {
    /// CALL / DELEGATECALL / STATICCALL / CREATE
    pub call_type: String,
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub calls: Vec<CallTraceNode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationResult {
    pub status: SimulationStatus,
    pub success: bool,
    pub gas_used: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revert_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<CallTraceNode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    /// Provider tag, for audit trails
    pub provider: String,
    pub simulated_at: chrono::DateTime<chrono::Utc>,
}

// ============================================
// Risk assessment
// ============================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskIssue {
    pub category: String,
    pub severity: Severity,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub level: RiskLevel,
    pub issues: Vec<RiskIssue>,
    pub warnings: Vec<String>,
    pub recommendations: Vec<String>,
}

// ============================================
// Introspection
// ============================================

/// Snapshot returned by `get_stats`. Introspection only, no side effects.
#[derive(Debug, Clone, Serialize)]
pub struct SentinelStats {
    pub cache_entries: usize,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub malicious_count: usize,
    pub cache_enabled: bool,
    pub cache_ttl_secs: u64,
}
