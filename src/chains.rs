//! Chain dispatch module
//!
//! Analysis behavior varies by chain family (address format, whether the
//! EVM opcode pass applies). Dispatch is a tagged variant selected from
//! the request's chain identifier rather than string comparisons spread
//! through the pipeline.

use crate::models::{SentinelError, SentinelResult};

/// Chain family for analysis dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainKind {
    /// EVM-compatible chains (Ethereum, L2s, sidechains)
    Evm,
    /// Solana (base58 addresses, no EVM opcode semantics)
    Solana,
}

impl ChainKind {
    /// Resolve chain family from a chain identifier.
    /// Unknown identifiers default to EVM, the dominant family.
    pub fn from_chain(chain: &str) -> Self {
        match chain.to_lowercase().as_str() {
            "solana" | "solana-mainnet" | "solana-devnet" => ChainKind::Solana,
            _ => ChainKind::Evm,
        }
    }

    /// Validate an address against this chain family's format.
    /// Fails fast with `InvalidAddress` before any provider call.
    pub fn validate_address(&self, address: &str) -> SentinelResult<()> {
        match self {
            ChainKind::Evm => validate_evm_address(address),
            ChainKind::Solana => validate_solana_address(address),
        }
    }

    /// Whether the EVM opcode-stream pass applies to this chain's bytecode
    pub fn supports_opcode_scan(&self) -> bool {
        matches!(self, ChainKind::Evm)
    }
}

/// EVM address: 0x prefix + 40 hex characters
fn validate_evm_address(address: &str) -> SentinelResult<()> {
    let hex_part = address
        .strip_prefix("0x")
        .ok_or_else(|| SentinelError::invalid_address(format!("Missing 0x prefix: {}", address)))?;

    if hex_part.len() != 40 {
        return Err(SentinelError::invalid_address(format!(
            "Expected 40 hex chars, got {}: {}",
            hex_part.len(),
            address
        )));
    }

    if !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(SentinelError::invalid_address(format!(
            "Non-hex character in address: {}",
            address
        )));
    }

    Ok(())
}

/// Solana address: base58, 32-44 characters
fn validate_solana_address(address: &str) -> SentinelResult<()> {
    const BASE58: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

    if !(32..=44).contains(&address.len()) {
        return Err(SentinelError::invalid_address(format!(
            "Solana address length out of range: {}",
            address
        )));
    }

    if !address.chars().all(|c| BASE58.contains(c)) {
        return Err(SentinelError::invalid_address(format!(
            "Non-base58 character in Solana address: {}",
            address
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_kind_resolution() {
        assert_eq!(ChainKind::from_chain("ethereum"), ChainKind::Evm);
        assert_eq!(ChainKind::from_chain("polygon"), ChainKind::Evm);
        assert_eq!(ChainKind::from_chain("Solana"), ChainKind::Solana);
        // unknown chains default to EVM
        assert_eq!(ChainKind::from_chain("somechain"), ChainKind::Evm);
    }

    #[test]
    fn test_evm_address_validation() {
        let kind = ChainKind::Evm;
        assert!(kind
            .validate_address("0xdAC17F958D2ee523a2206206994597C13D831ec7")
            .is_ok());
        assert!(kind.validate_address("dAC17F958D2ee523a220620699").is_err());
        assert!(kind.validate_address("0x1234").is_err());
        assert!(kind
            .validate_address("0xZZC17F958D2ee523a2206206994597C13D831ec7")
            .is_err());
    }

    #[test]
    fn test_solana_address_validation() {
        let kind = ChainKind::Solana;
        assert!(kind
            .validate_address("TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA")
            .is_ok());
        // '0' and 'O' are not base58
        assert!(kind
            .validate_address("0okenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA")
            .is_err());
        assert!(kind.validate_address("tooshort").is_err());
    }

    #[test]
    fn test_opcode_scan_applicability() {
        assert!(ChainKind::Evm.supports_opcode_scan());
        assert!(!ChainKind::Solana.supports_opcode_scan());
    }
}
