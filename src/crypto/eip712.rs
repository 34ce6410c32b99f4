//! EIP-712 typed data utilities

use crate::{PermitError, Result};
use ethereum_types::{Address, H256, U256};
use serde::{Deserialize, Serialize};

/// Type string of the EIP-712 domain used by every permit
pub const EIP712_DOMAIN_TYPE: &str =
    "EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)";

/// A struct that can be hashed under EIP-712
///
/// Implementors provide their encoded type string and the concatenation of
/// their 32-byte encoded fields; hashing and the final digest are shared.
pub trait TypedStruct {
    /// Encoded type, including referenced struct types in alphabetical order
    const TYPE: &'static str;

    /// `encodeData`: every member encoded as one 32-byte word, in order
    fn encode_data(&self) -> Vec<u8>;

    /// `typeHash = keccak256(encodeType)`
    fn type_hash() -> H256
    where
        Self: Sized,
    {
        H256(keccak256(Self::TYPE.as_bytes()))
    }

    /// `hashStruct = keccak256(typeHash || encodeData)`
    fn struct_hash(&self) -> H256
    where
        Self: Sized,
    {
        let encoded = self.encode_data();
        let mut data = Vec::with_capacity(32 + encoded.len());
        data.extend_from_slice(Self::type_hash().as_bytes());
        data.extend_from_slice(&encoded);
        H256(keccak256(&data))
    }
}

/// EIP-712 domain separator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Domain {
    pub name: String,
    pub version: String,
    pub chain_id: u64,
    pub verifying_contract: Address,
}

impl Domain {
    /// Create a new domain
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        chain_id: u64,
        verifying_contract: Address,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            chain_id,
            verifying_contract,
        }
    }

    /// Copy of this domain bound to another chain
    pub fn on_chain(&self, chain_id: u64) -> Self {
        Self {
            chain_id,
            ..self.clone()
        }
    }

    /// Validate the domain
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(PermitError::config("Domain name cannot be empty"));
        }
        if self.version.is_empty() {
            return Err(PermitError::config("Domain version cannot be empty"));
        }
        if self.chain_id == 0 {
            return Err(PermitError::config("Domain chain id cannot be zero"));
        }
        if self.verifying_contract.is_zero() {
            return Err(PermitError::config(
                "Domain verifying contract cannot be the zero address",
            ));
        }
        Ok(())
    }

    /// The domain separator of this domain
    pub fn separator(&self) -> H256 {
        self.struct_hash()
    }
}

impl TypedStruct for Domain {
    const TYPE: &'static str = EIP712_DOMAIN_TYPE;

    fn encode_data(&self) -> Vec<u8> {
        let mut encoded = Vec::with_capacity(4 * 32);
        encoded.extend_from_slice(&encode_string(&self.name));
        encoded.extend_from_slice(&encode_string(&self.version));
        encoded.extend_from_slice(&encode_uint(U256::from(self.chain_id)));
        encoded.extend_from_slice(&encode_address(&self.verifying_contract));
        encoded
    }
}

/// Hash the domain separator
pub fn domain_separator(domain: &Domain) -> H256 {
    domain.separator()
}

/// Hash EIP-712 typed data under `domain`
pub fn hash_typed_data<T: TypedStruct>(domain: &Domain, message: &T) -> H256 {
    signing_digest(domain_separator(domain), message.struct_hash())
}

/// EIP-712: hash(0x1901 || domain_separator || struct_hash)
pub fn signing_digest(domain_separator: H256, struct_hash: H256) -> H256 {
    let mut data = [0u8; 66];
    data[0] = 0x19;
    data[1] = 0x01;
    data[2..34].copy_from_slice(domain_separator.as_bytes());
    data[34..66].copy_from_slice(struct_hash.as_bytes());

    H256(keccak256(&data))
}

/// Encode an address as a left-padded 32-byte word
pub fn encode_address(address: &Address) -> [u8; 32] {
    let mut padded = [0u8; 32];
    padded[12..32].copy_from_slice(address.as_bytes());
    padded
}

/// Encode an unsigned integer as a 32-byte big-endian word
pub fn encode_uint(value: U256) -> [u8; 32] {
    let mut word = [0u8; 32];
    value.to_big_endian(&mut word);
    word
}

/// Dynamic `string` members are encoded as the hash of their contents
pub fn encode_string(value: &str) -> [u8; 32] {
    keccak256(value.as_bytes())
}

/// Keccak-256 hash function
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    use sha3::{Digest, Keccak256};
    Keccak256::digest(data).into()
}
