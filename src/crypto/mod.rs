//! Cryptographic utilities for signed permits
//!
//! This module is the signature authority of the crate: it derives the
//! domain-separated EIP-712 digest of a typed message and recovers the signer
//! of a signature over that digest. Nothing in here touches state.
//!
//! # Architecture
//!
//! - [`eip712`] - EIP-712 typed data hashing shared by every message type
//! - [`signature`] - ECDSA signing, recovery and the `(v, r, s)` encoding
//!
//! # Examples
//!
//! ## Hashing a permit
//!
//! ```
//! use ethereum_types::{Address, U256};
//! use permit_transfer::crypto::eip712::{hash_typed_data, Domain};
//! use permit_transfer::types::PermitMessage;
//!
//! let domain = Domain::new("ApprovalTarget", "1", 31337, Address::repeat_byte(0xaa));
//! let permit = PermitMessage {
//!     erc20: Address::repeat_byte(0x01),
//!     owner: Address::repeat_byte(0x02),
//!     spender: Address::repeat_byte(0x03),
//!     value: U256::from(1000u64),
//!     nonce: U256::zero(),
//!     deadline: U256::from(u64::MAX),
//! };
//!
//! let digest = hash_typed_data(&domain, &permit);
//! assert_ne!(digest, hash_typed_data(&domain.on_chain(1), &permit));
//! ```
//!
//! ## Recovering a signer
//!
//! ```
//! use permit_transfer::crypto::signature::recover_signer;
//! use permit_transfer::wallet::LocalWallet;
//! use ethereum_types::H256;
//!
//! # fn example() -> permit_transfer::Result<()> {
//! let wallet = LocalWallet::random();
//! let digest = H256::repeat_byte(0x42);
//! let signature = wallet.sign_digest(digest)?;
//!
//! assert_eq!(recover_signer(digest, &signature)?, wallet.address());
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

pub mod eip712;
pub mod signature;


// Re-export commonly used items
pub use eip712::{domain_separator, hash_typed_data, keccak256, Domain, TypedStruct};
pub use signature::{address_from_secret_key, recover_signer, sign_digest, Signature};
