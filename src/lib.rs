//! Contract Sentry Library
//!
//! Pre-execution risk-assessment core deciding, before any value-moving
//! call reaches a live network, whether that call is safe to execute:
//! - Static contract analysis over untrusted bytecode, ABI, and source
//! - Dry-run transaction simulation with outcome classification
//! - Deterministic, auditable risk verdicts for downstream gating
//!
//! The RPC transport, key management, and orchestration live outside this
//! crate; both components run over an injected `ChainProvider` capability.

pub mod analyzer;
pub mod bytecode;
pub mod cache;
pub mod chains;
pub mod classify;
pub mod config;
pub mod models;
pub mod provider;
pub mod registry;
pub mod simulator;

pub use analyzer::ContractAnalyzer;
pub use cache::AnalysisCache;
pub use chains::ChainKind;
pub use classify::{ClassifiedFailure, FailureClassifier, GethClassifier};
pub use config::SentinelConfig;
pub use models::{
    AbiAnalysis, BytecodeAnalysis, CallTraceNode, ContractAnalysisRequest, ContractAnalysisResult,
    ContractMetadata, ErrorCode, Finding, FindingCategory, FindingSummary, RiskAssessment,
    RiskIssue, RiskLevel, SentinelError, SentinelResult, SentinelStats, Severity,
    SimulationRequest, SimulationResult, SimulationStatus, SourceAnalysis,
};
pub use provider::{BlockInfo, CallRequest, ChainProvider, ProviderRegistry};
pub use registry::MaliciousRegistry;
pub use simulator::{SimulationWithRisk, TransactionSimulator};
