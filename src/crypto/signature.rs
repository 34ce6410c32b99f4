//! Signature utilities

use super::eip712::keccak256;
use crate::{PermitError, Result};
use ethereum_types::{Address, H256, U256};
use k256::ecdsa::{RecoveryId, Signature as K256Signature, VerifyingKey};
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// secp256k1 curve order `n`
pub const SECP256K1_N: U256 = U256([
    0xBFD2_5E8C_D036_4141,
    0xBAAE_DCE6_AF48_A03B,
    0xFFFF_FFFF_FFFF_FFFE,
    0xFFFF_FFFF_FFFF_FFFF,
]);

/// `n / 2`; signatures with a larger `s` are malleable (EIP-2)
pub const SECP256K1_HALF_N: U256 = U256([
    0xDFE9_2F46_681B_20A0,
    0x5D57_6E73_57A4_501D,
    0xFFFF_FFFF_FFFF_FFFF,
    0x7FFF_FFFF_FFFF_FFFF,
]);

/// Recoverable ECDSA signature in `(v, r, s)` form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    /// Recovery byte, 27 or 28
    pub v: u8,
    pub r: H256,
    pub s: H256,
}

impl Signature {
    /// Create a signature from its components
    pub fn new(v: u8, r: H256, s: H256) -> Self {
        Self { v, r, s }
    }

    /// Parse the 65-byte `r || s || v` encoding
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != 65 {
            tracing::debug!("Signature must be 65 bytes, got {}", bytes.len());
            return Err(PermitError::InvalidSignature);
        }

        Ok(Self {
            r: H256::from_slice(&bytes[0..32]),
            s: H256::from_slice(&bytes[32..64]),
            v: bytes[64],
        })
    }

    /// The 65-byte `r || s || v` encoding
    pub fn to_bytes(&self) -> [u8; 65] {
        let mut bytes = [0u8; 65];
        bytes[0..32].copy_from_slice(self.r.as_bytes());
        bytes[32..64].copy_from_slice(self.s.as_bytes());
        bytes[64] = self.v;
        bytes
    }

    /// `0x`-prefixed hex of the 65-byte encoding
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.to_bytes()))
    }
}

impl FromStr for Signature {
    type Err = PermitError;

    fn from_str(s: &str) -> Result<Self> {
        let bytes = hex::decode(s.trim_start_matches("0x")).map_err(|_| {
            tracing::debug!("Invalid hex signature");
            PermitError::InvalidSignature
        })?;
        Self::from_bytes(&bytes)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Recover the address that signed `digest`
///
/// Rejects anything `ecrecover` plus the EIP-2 low-s rule would reject, so a
/// given digest has exactly one accepted signature per signer.
pub fn recover_signer(digest: H256, signature: &Signature) -> Result<Address> {
    let is_y_odd = match signature.v {
        27 => false,
        28 => true,
        v => {
            tracing::debug!("Invalid recovery byte v = {}", v);
            return Err(PermitError::InvalidSignature);
        }
    };

    let r = U256::from_big_endian(signature.r.as_bytes());
    let s = U256::from_big_endian(signature.s.as_bytes());
    if r.is_zero() || r >= SECP256K1_N {
        tracing::debug!("Signature r out of range");
        return Err(PermitError::InvalidSignature);
    }
    if s.is_zero() || s > SECP256K1_HALF_N {
        tracing::debug!("Signature s out of range (high-s or zero)");
        return Err(PermitError::InvalidSignature);
    }

    let mut sig_bytes = [0u8; 64];
    sig_bytes[0..32].copy_from_slice(signature.r.as_bytes());
    sig_bytes[32..64].copy_from_slice(signature.s.as_bytes());

    let k256_sig = K256Signature::try_from(&sig_bytes[..]).map_err(|_| {
        tracing::debug!("Invalid signature format");
        PermitError::InvalidSignature
    })?;

    let recovery_id = RecoveryId::new(is_y_odd, false);
    let verifying_key =
        VerifyingKey::recover_from_prehash(digest.as_bytes(), &k256_sig, recovery_id).map_err(
            |_| {
                tracing::debug!("Failed to recover public key");
                PermitError::InvalidSignature
            },
        )?;

    let recovered = ethereum_address_from_pubkey(&verifying_key)?;
    if recovered.is_zero() {
        return Err(PermitError::InvalidSignature);
    }

    Ok(recovered)
}

/// Sign a 32-byte digest, producing a low-s signature with `v` in {27, 28}
pub fn sign_digest(digest: H256, secret_key: &SecretKey) -> Result<Signature> {
    let secp = Secp256k1::new();
    let message = Message::from_digest_slice(digest.as_bytes())
        .map_err(|_| PermitError::InvalidSignature)?;

    let (recovery_id, compact) = secp
        .sign_ecdsa_recoverable(&message, secret_key)
        .serialize_compact();

    let v = match recovery_id.to_i32() {
        0 => 27,
        1 => 28,
        // x-coordinate overflow; never produced for valid keys
        _ => return Err(PermitError::InvalidSignature),
    };

    Ok(Signature {
        v,
        r: H256::from_slice(&compact[0..32]),
        s: H256::from_slice(&compact[32..64]),
    })
}

/// Ethereum address controlled by `secret_key`
pub fn address_from_secret_key(secret_key: &SecretKey) -> Address {
    let secp = Secp256k1::new();
    let public_key = PublicKey::from_secret_key(&secp, secret_key);
    let uncompressed = public_key.serialize_uncompressed();
    address_from_uncompressed(&uncompressed[1..])
}

/// Convert a public key to an Ethereum address
fn ethereum_address_from_pubkey(pubkey: &VerifyingKey) -> Result<Address> {
    let encoded = pubkey.to_encoded_point(false);
    let pubkey_bytes = encoded.as_bytes();
    if pubkey_bytes.len() != 65 {
        return Err(PermitError::InvalidSignature);
    }

    Ok(address_from_uncompressed(&pubkey_bytes[1..]))
}

/// Last 20 bytes of the hash of the 64-byte `x || y` public key
fn address_from_uncompressed(xy: &[u8]) -> Address {
    let pubkey_hash = keccak256(xy);
    Address::from_slice(&pubkey_hash[12..])
}
