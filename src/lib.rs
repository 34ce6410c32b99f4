//! # Permit Transfer
//!
//! A **type-safe** Rust implementation of one-shot, signature-authorized token
//! transfers: an owner signs an EIP-712 permit off-chain, and anyone holding the
//! permit can move exactly the signed amount once, before its deadline.
//!
//! ## Features
//!
//! - 🔏 **EIP-712 permits**: Typed-data hashing with domain separation per chain and deployment
//! - 🔁 **Replay protection**: Per-owner sequential nonces consumed atomically with the transfer
//! - 🎯 **Spender binding**: A permit only works for the caller named as its spender
//! - 🏦 **Authorized deposits**: Gasless deposits into a custody account, submitted by any relayer
//! - 🌐 **HTTP relayer**: Optional Axum server executing permits on behalf of owners (default)
//!
//! ## Quick Start
//!
//! ```rust
//! use ethereum_types::{Address, U256};
//! use permit_transfer::{
//!     AuthorizedDepositor, CallContext, Domain, Erc20, InMemoryToken, LocalWallet,
//! };
//!
//! # fn main() -> permit_transfer::Result<()> {
//! let vault = Address::repeat_byte(0x7a);
//! let mut token = InMemoryToken::new(Address::repeat_byte(0x01), "Token", "TKN");
//! let mut depositor =
//!     AuthorizedDepositor::new(Domain::new("Vault", "1", 31337, vault), token.address());
//!
//! // The owner funds their account and approves the depositor once
//! let owner = LocalWallet::random();
//! token.mint(owner.address(), U256::from(500u64))?;
//! token.approve(owner.address(), vault, U256::MAX)?;
//!
//! // ...then signs a permit naming the depositor as spender
//! let deadline = U256::from(2_000_000_000u64);
//! let signature = owner.sign_permit(
//!     depositor.domain(),
//!     token.address(),
//!     depositor.address(),
//!     U256::from(500u64),
//!     depositor.nonces(&owner.address()),
//!     deadline,
//! )?;
//!
//! // Any relayer can submit it
//! let relayer = Address::repeat_byte(0x4e);
//! let ctx = CallContext::new(relayer, 1_700_000_000, 31337);
//! depositor.deposit_by_sig(&ctx, &mut token, owner.address(), U256::from(500u64), deadline, &signature)?;
//!
//! assert_eq!(depositor.deposit_of(&owner.address()), U256::from(500u64));
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - **`crypto`**: EIP-712 hashing and secp256k1 signature recovery
//! - **`types`**: Permit message, call context and receipts
//! - **`nonce_store`**: Per-owner nonce table
//! - **`token`**: ERC-20 interface and an in-memory ledger
//! - **`verifier`**: Permit verification and execution
//! - **`depositor`**: Signature-authorized deposits
//! - **`wallet`**: Local signing keys
//! - **`config`**: Relayer configuration
//! - **`server`**: HTTP relayer (feature-gated)
//! - **`error`**: Error handling
//!
//! ## Optional Features
//!
//! - **`axum`**: Enable the Axum HTTP relayer and the `permit-relayer` binary (default)

pub mod config;
pub mod crypto;
pub mod depositor;
pub mod error;
pub mod nonce_store;
pub mod token;
pub mod types;
pub mod verifier;
pub mod wallet;

// HTTP relayer (feature-gated)
#[cfg(feature = "axum")]
pub mod server;

// Re-exports for convenience
pub use config::RelayerConfig;
pub use crypto::{Domain, Signature};
pub use depositor::AuthorizedDepositor;
pub use error::{PermitError, Result};
pub use nonce_store::{InMemoryNonceStore, NonceStore};
pub use token::{Erc20, InMemoryToken};
pub use types::*;
pub use verifier::PermitVerifier;
pub use wallet::LocalWallet;

/// Current version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;
    use ethereum_types::{Address, U256};

    #[test]
    fn test_version_constant() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_permit_message_serialization() {
        let permit = PermitMessage {
            erc20: Address::repeat_byte(0x01),
            owner: Address::repeat_byte(0x02),
            spender: Address::repeat_byte(0x03),
            value: U256::from(1_000_000u64),
            nonce: U256::zero(),
            deadline: U256::from(1_745_323_985u64),
        };

        let json = serde_json::to_value(permit).unwrap();
        assert_eq!(json["value"], "0xf4240");

        let decoded: PermitMessage = serde_json::from_value(json).unwrap();
        assert_eq!(decoded, permit);
    }

    #[test]
    fn test_call_context_now() {
        let caller = Address::repeat_byte(0x4e);
        let ctx = CallContext::now(caller, 8453);
        let now = chrono::Utc::now().timestamp() as u64;

        assert_eq!(ctx.caller, caller);
        assert_eq!(ctx.chain_id, 8453);
        assert!(ctx.timestamp <= now && now - ctx.timestamp < 60);
        assert_eq!(ctx.with_caller(Address::zero()).timestamp, ctx.timestamp);
    }
}
