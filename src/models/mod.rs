//! Data models for Contract Sentry
//!
//! - `types`: core analysis and simulation data structures
//! - `errors`: centralized error handling with unique error codes

pub mod errors;
pub mod types;

pub use errors::{ErrorCode, SentinelError, SentinelResult};
pub use types::*;
