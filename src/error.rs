//! Error types for permit verification and execution

use ethereum_types::{Address, U256};
use thiserror::Error;

/// Result type alias for permit operations
pub type Result<T> = std::result::Result<T, PermitError>;

/// Errors raised while verifying or executing a permit
///
/// Every variant aborts the whole call: no nonce is consumed and no
/// balance moves when one of these is returned.
#[derive(Error, Debug)]
pub enum PermitError {
    /// Recovery failed, the recovered signer is not the owner, or a signed
    /// field (spender, nonce, domain) differs from what the signer saw
    #[error("Invalid signature")]
    InvalidSignature,

    /// The permit deadline lies before the execution time
    #[error("Permit expired: deadline {deadline} is before block time {now}")]
    Expired { deadline: U256, now: u64 },

    /// The verifier's allowance from the owner does not cover the amount
    #[error("ERC20: insufficient allowance (allowed {allowed}, needed {needed})")]
    InsufficientAllowance { allowed: U256, needed: U256 },

    /// The owner's balance does not cover the amount
    #[error("ERC20: transfer amount exceeds balance (balance {balance}, needed {needed})")]
    InsufficientBalance { balance: U256, needed: U256 },

    /// A depositor was handed a token other than the one it accepts
    #[error("Unsupported asset {actual:?}, expected {expected:?}")]
    AssetMismatch { expected: Address, actual: Address },

    #[error("Arithmetic overflow: {0}")]
    Overflow(&'static str),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PermitError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Stable snake_case tag for the failure kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidSignature => "invalid_signature",
            Self::Expired { .. } => "expired",
            Self::InsufficientAllowance { .. } => "insufficient_allowance",
            Self::InsufficientBalance { .. } => "insufficient_balance",
            Self::AssetMismatch { .. } => "asset_mismatch",
            Self::Overflow(_) => "overflow",
            Self::Config(_) => "config",
            Self::Json(_) => "json",
            Self::Io(_) => "io",
        }
    }

    /// Whether the error is a rejected call rather than an internal fault
    pub fn is_revert(&self) -> bool {
        !matches!(self, Self::Config(_) | Self::Json(_) | Self::Io(_))
    }
}
