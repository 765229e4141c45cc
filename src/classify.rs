//! Execution failure classification
//!
//! Providers report execution failures as error strings in their own
//! vocabulary. This module is the best-effort adapter translating that
//! vocabulary into the closed `SimulationStatus` taxonomy, isolated
//! behind a trait so a new provider can supply its own parser without
//! touching risk-scoring logic.

use crate::models::SimulationStatus;

/// Outcome of classifying a provider failure message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedFailure {
    /// Revert or Fail, never Success
    pub status: SimulationStatus,
    /// Quoted reason string, verbatim, when the message embeds one
    pub revert_reason: Option<String>,
}

/// Translate one provider's failure vocabulary into the closed taxonomy
pub trait FailureClassifier: Send + Sync {
    fn classify(&self, message: &str) -> ClassifiedFailure;
}

/// Default classifier for geth-style error vocabulary, which most
/// EVM providers (and Alchemy/Infura front ends) pass through.
#[derive(Debug, Clone, Copy, Default)]
pub struct GethClassifier;

impl FailureClassifier for GethClassifier {
    fn classify(&self, message: &str) -> ClassifiedFailure {
        let lower = message.to_lowercase();

        if lower.contains("revert") {
            return ClassifiedFailure {
                status: SimulationStatus::Revert,
                revert_reason: extract_quoted_reason(message),
            };
        }

        // Gas exhaustion, balance, and nonce failures are Fail outcomes
        // with the raw message preserved; no structured sub-parsing.
        ClassifiedFailure {
            status: SimulationStatus::Fail,
            revert_reason: None,
        }
    }
}

/// Extract the first single- or double-quoted substring, verbatim.
/// Example: `execution reverted with reason string 'Insufficient balance'`
/// yields `Insufficient balance`.
fn extract_quoted_reason(message: &str) -> Option<String> {
    for quote in ['\'', '"'] {
        let mut parts = message.splitn(3, quote);
        parts.next()?; // text before the opening quote
        if let (Some(inner), Some(_)) = (parts.next(), parts.next()) {
            if !inner.is_empty() {
                return Some(inner.to_string());
            }
        }
    }
    None
}
