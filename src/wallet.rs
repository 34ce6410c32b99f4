//! Local wallet for signing permits off-chain
//!
//! The off-chain half of the protocol: the owner builds the same
//! [`PermitMessage`] the verifier will rebuild, hashes it under the
//! verifier's [`Domain`] and signs the digest. Both sides share
//! [`hash_typed_data`], so the digests match byte for byte.

use crate::crypto::eip712::{hash_typed_data, Domain, TypedStruct};
use crate::crypto::signature::{address_from_secret_key, sign_digest, Signature};
use crate::types::PermitMessage;
use crate::{PermitError, Result};
use ethereum_types::{Address, H256, U256};
use rand::RngCore;
use secp256k1::SecretKey;
use std::fmt;

/// A secp256k1 key held in memory
#[derive(Clone)]
pub struct LocalWallet {
    secret_key: SecretKey,
    address: Address,
}

impl fmt::Debug for LocalWallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalWallet")
            .field("address", &self.address)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

impl LocalWallet {
    /// Create a wallet from a hex private key
    pub fn from_private_key(private_key: &str) -> Result<Self> {
        let private_key_bytes = hex::decode(private_key.trim_start_matches("0x"))
            .map_err(|_| PermitError::config("Invalid hex private key"))?;
        Self::from_bytes(&private_key_bytes)
    }

    /// Create a wallet from raw private key bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let secret_key = SecretKey::from_slice(bytes)
            .map_err(|_| PermitError::config("Invalid private key"))?;
        Ok(Self::from_secret_key(secret_key))
    }

    pub fn from_secret_key(secret_key: SecretKey) -> Self {
        let address = address_from_secret_key(&secret_key);
        Self {
            secret_key,
            address,
        }
    }

    /// Generate a fresh random wallet
    pub fn random() -> Self {
        let mut bytes = [0u8; 32];
        loop {
            rand::thread_rng().fill_bytes(&mut bytes);
            if let Ok(secret_key) = SecretKey::from_slice(&bytes) {
                return Self::from_secret_key(secret_key);
            }
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Sign a raw 32-byte digest
    pub fn sign_digest(&self, digest: H256) -> Result<Signature> {
        sign_digest(digest, &self.secret_key)
    }

    /// Sign any EIP-712 struct under `domain`
    pub fn sign_typed_data<T: TypedStruct>(&self, domain: &Domain, message: &T) -> Result<Signature> {
        self.sign_digest(hash_typed_data(domain, message))
    }

    /// Sign a `PermitAndTransferFrom` with this wallet as owner
    pub fn sign_permit(
        &self,
        domain: &Domain,
        erc20: Address,
        spender: Address,
        value: U256,
        nonce: U256,
        deadline: U256,
    ) -> Result<Signature> {
        let permit = PermitMessage {
            erc20,
            owner: self.address,
            spender,
            value,
            nonce,
            deadline,
        };
        self.sign_typed_data(domain, &permit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_wallet_address_from_private_key() {
        let wallet = LocalWallet::from_private_key(
            "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
        )
        .unwrap();

        assert_eq!(
            wallet.address(),
            Address::from_str("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266").unwrap()
        );
    }

    #[test]
    fn test_wallet_rejects_invalid_keys() {
        assert!(LocalWallet::from_private_key("not hex").is_err());
        assert!(LocalWallet::from_bytes(&[0u8; 32]).is_err());
        assert!(LocalWallet::from_bytes(&[1u8; 31]).is_err());
    }

    #[test]
    fn test_random_wallets_differ() {
        let first = LocalWallet::random();
        let second = LocalWallet::random();
        assert_ne!(first.address(), second.address());
    }

    #[test]
    fn test_debug_redacts_key() {
        let wallet = LocalWallet::random();
        let debug = format!("{:?}", wallet);
        assert!(debug.contains("<redacted>"));
    }
}
