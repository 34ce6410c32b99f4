//! Storage trait for per-owner permit nonces
//!
//! This module provides a trait-based storage abstraction for the nonce
//! table: a monotonically increasing counter per owner, starting at zero,
//! advanced once per consumed permit.

use crate::{PermitError, Result};
use ethereum_types::{Address, U256};
use std::collections::HashMap;

/// Trait for storing and advancing owner nonces
///
/// This trait allows different storage backends to sit behind the verifier.
/// Only the verifier writes through it.
pub trait NonceStore: Send + Sync {
    /// Next expected nonce for `owner`; zero if never used
    fn nonce_of(&self, owner: &Address) -> U256;

    /// Advance `owner` from `expected` to `expected + 1`
    ///
    /// Fails with `InvalidSignature` when the stored nonce is no longer
    /// `expected`, so a read-verify-write sequence cannot be interleaved.
    fn consume(&mut self, owner: &Address, expected: U256) -> Result<U256>;

    /// Undo a consumption of `previous` whose call reverted afterwards
    fn rollback(&mut self, owner: &Address, previous: U256);
}

/// In-memory storage implementation
///
/// Entries are created on first consumption. Data is lost when the process
/// exits.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNonceStore {
    nonces: HashMap<Address, U256>,
}

impl InMemoryNonceStore {
    /// Create a new in-memory storage instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of owners that consumed at least one permit
    pub fn len(&self) -> usize {
        self.nonces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nonces.is_empty()
    }
}

impl NonceStore for InMemoryNonceStore {
    fn nonce_of(&self, owner: &Address) -> U256 {
        self.nonces.get(owner).copied().unwrap_or_default()
    }

    fn consume(&mut self, owner: &Address, expected: U256) -> Result<U256> {
        let current = self.nonce_of(owner);
        if current != expected {
            tracing::warn!(
                "Stale nonce for {:?}: expected {}, stored {}",
                owner,
                expected,
                current
            );
            return Err(PermitError::InvalidSignature);
        }

        let next = current
            .checked_add(U256::one())
            .ok_or(PermitError::Overflow("nonce"))?;
        self.nonces.insert(*owner, next);
        Ok(next)
    }

    fn rollback(&mut self, owner: &Address, previous: U256) {
        if previous.is_zero() {
            self.nonces.remove(owner);
        } else {
            self.nonces.insert(*owner, previous);
        }
    }
}
