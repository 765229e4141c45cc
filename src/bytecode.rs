//! Bytecode analysis pass
//!
//! Scans raw runtime bytecode as an opcode byte stream for dangerous
//! instruction patterns. This is a syntactic heuristic, not a control-flow
//! proof: PUSH immediates are not skipped and opcode order stands in for
//! execution order. False positives on packed constants are accepted in
//! exchange for determinism over adversarial input.

use crate::config::SentinelConfig;
use crate::models::{BytecodeAnalysis, Finding, FindingCategory, Severity};

// EVM opcode byte values
pub const OP_TIMESTAMP: u8 = 0x42;
pub const OP_SSTORE: u8 = 0x55;
pub const OP_JUMPI: u8 = 0x57;
pub const OP_CALL: u8 = 0xf1;
pub const OP_DELEGATECALL: u8 = 0xf4;
pub const OP_SELFDESTRUCT: u8 = 0xff;

/// Scan bytecode and produce flags plus typed findings.
/// Pure function: fixed input always yields identical output.
pub fn analyze_bytecode(bytecode: &[u8], config: &SentinelConfig) -> (BytecodeAnalysis, Vec<Finding>) {
    let mut analysis = BytecodeAnalysis::default();
    let mut findings = Vec::new();

    if bytecode.is_empty() {
        return (analysis, findings);
    }

    let mut jumpi_count = 0usize;
    let mut first_call_pos: Option<usize> = None;
    let mut sstore_after_call = false;

    for (pos, &byte) in bytecode.iter().enumerate() {
        match byte {
            OP_SELFDESTRUCT => analysis.has_selfdestruct_pattern = true,
            OP_DELEGATECALL => analysis.has_delegatecall_pattern = true,
            OP_TIMESTAMP => analysis.has_timestamp_dependence = true,
            OP_JUMPI => jumpi_count += 1,
            OP_CALL => {
                if first_call_pos.is_none() {
                    first_call_pos = Some(pos);
                }
            }
            OP_SSTORE => {
                if first_call_pos.is_some() {
                    sstore_after_call = true;
                }
            }
            _ => {}
        }
    }

    analysis.has_reentrancy_pattern = sstore_after_call;
    analysis.has_complex_loops = jumpi_count > config.jumpi_dos_threshold;

    if analysis.has_selfdestruct_pattern {
        findings.push(Finding::new(
            FindingCategory::SelfdestructUnprotected,
            Severity::High,
            "Contract contains SELFDESTRUCT",
            "The contract can be destroyed, permanently freezing any funds routed to it \
             afterwards (cf. the 2017 Parity wallet freeze)",
        ));
    }

    if analysis.has_delegatecall_pattern {
        findings.push(Finding::new(
            FindingCategory::DelegatecallInjection,
            Severity::Critical,
            "Contract contains DELEGATECALL",
            "Delegatecall executes foreign code in this contract's storage context; \
             an attacker-controlled target means full contract takeover",
        ));
    }

    if analysis.has_reentrancy_pattern {
        findings.push(Finding::new(
            FindingCategory::Reentrancy,
            Severity::Critical,
            "State write after external call",
            "Storage is mutated after an external call, the canonical reentrancy drain \
             pattern exploited in the 2016 DAO hack",
        ));
    }

    if analysis.has_timestamp_dependence {
        findings.push(Finding::new(
            FindingCategory::TimestampDependence,
            Severity::Medium,
            "Block timestamp dependence",
            "Validators can skew block timestamps by several seconds, manipulating \
             time-dependent logic such as lotteries or vesting checks",
        ));
    }

    if analysis.has_complex_loops {
        findings.push(Finding::new(
            FindingCategory::GasLimitDoS,
            Severity::Medium,
            "High conditional-jump density",
            format!(
                "{} conditional jumps suggest complex or unbounded loops that can exceed \
                 the block gas limit and brick the function",
                jumpi_count
            ),
        ));
    }

    (analysis, findings)
}
