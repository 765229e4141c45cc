//! Centralized Error Handling Module
//!
//! Every failure carries a unique error code for logging and monitoring.
//!
//! Error codes follow pattern: CATEGORY_SPECIFIC_ERROR
//! - VAL_xxx: request validation errors (no provider call was made)
//! - PROVIDER_xxx: chain provider transport errors
//! - CONTRACT_xxx: contract lookup errors
//! - CFG_xxx: configuration errors
//!
//! Note: classified Revert/Fail simulation outcomes are NOT errors.
//! They are successful analyses whose payload reports that the
//! transaction would fail (see `SimulationStatus`).

use std::fmt;

/// Library-wide error type
#[derive(Debug)]
pub struct SentinelError {
    /// Unique error code for logging/monitoring
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Optional underlying error
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl SentinelError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        code: ErrorCode,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Get error code as string (for logging)
    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }
}

impl fmt::Display for SentinelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for SentinelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Unique error codes for monitoring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // ============================================
    // Validation Errors
    // ============================================
    /// Address does not match the chain's address format
    InvalidAddress,
    /// Required request field missing or malformed
    InvalidRequest,
    /// Calldata is not valid hex
    InvalidCalldata,

    // ============================================
    // Provider Errors
    // ============================================
    /// No provider bound for the requested chain
    ProviderNotConfigured,
    /// Provider transport/timeout/network failure
    ProviderError,
    /// Provider returned a malformed response
    ProviderInvalidResponse,

    // ============================================
    // Contract Errors
    // ============================================
    /// No bytecode deployed at address
    NoContractDeployed,
    /// ABI could not be parsed
    InvalidAbi,

    // ============================================
    // Configuration Errors
    // ============================================
    /// Invalid configuration value
    ConfigInvalidValue,

    // ============================================
    // Generic
    // ============================================
    Unknown,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidAddress => "VAL_INVALID_ADDRESS",
            Self::InvalidRequest => "VAL_INVALID_REQUEST",
            Self::InvalidCalldata => "VAL_INVALID_CALLDATA",

            Self::ProviderNotConfigured => "PROVIDER_NOT_CONFIGURED",
            Self::ProviderError => "PROVIDER_ERROR",
            Self::ProviderInvalidResponse => "PROVIDER_INVALID_RESPONSE",

            Self::NoContractDeployed => "CONTRACT_NOT_FOUND",
            Self::InvalidAbi => "CONTRACT_INVALID_ABI",

            Self::ConfigInvalidValue => "CFG_INVALID_VALUE",

            Self::Unknown => "UNKNOWN_ERROR",
        }
    }

    /// Validation errors fail fast, before any provider call
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidAddress | Self::InvalidRequest | Self::InvalidCalldata
        )
    }

    /// Provider errors are retryable by the caller/provider layer,
    /// never by this core
    pub fn is_provider(&self) -> bool {
        matches!(
            self,
            Self::ProviderError | Self::ProviderNotConfigured | Self::ProviderInvalidResponse
        )
    }
}

// ============================================
// Convenience constructors
// ============================================

impl SentinelError {
    pub fn invalid_address(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidAddress, msg)
    }

    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, msg)
    }

    pub fn provider_not_configured(chain: &str) -> Self {
        Self::new(
            ErrorCode::ProviderNotConfigured,
            format!("No provider bound for chain: {}", chain),
        )
    }

    pub fn provider(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ProviderError, msg)
    }

    pub fn no_contract(address: &str) -> Self {
        Self::new(
            ErrorCode::NoContractDeployed,
            format!("No contract deployed at {}", address),
        )
    }

    pub fn invalid_abi(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidAbi, msg)
    }
}

// ============================================
// Result type alias
// ============================================

pub type SentinelResult<T> = Result<T, SentinelError>;

// ============================================
// Conversion from common error types
// ============================================

impl From<hex::FromHexError> for SentinelError {
    fn from(err: hex::FromHexError) -> Self {
        Self::with_source(ErrorCode::InvalidCalldata, "Invalid hex input", err)
    }
}

impl From<serde_json::Error> for SentinelError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(ErrorCode::InvalidAbi, "JSON parse error", err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = SentinelError::invalid_address("not hex");
        assert_eq!(err.code, ErrorCode::InvalidAddress);
        assert_eq!(err.code_str(), "VAL_INVALID_ADDRESS");
    }

    #[test]
    fn test_taxonomy_split() {
        assert!(ErrorCode::InvalidAddress.is_validation());
        assert!(!ErrorCode::InvalidAddress.is_provider());
        assert!(ErrorCode::ProviderError.is_provider());
        assert!(ErrorCode::ProviderNotConfigured.is_provider());
        assert!(!ErrorCode::NoContractDeployed.is_validation());
    }

    #[test]
    fn test_display_includes_code() {
        let err = SentinelError::no_contract("0xdead");
        assert!(err.to_string().contains("CONTRACT_NOT_FOUND"));
        assert!(err.to_string().contains("0xdead"));
    }
}
