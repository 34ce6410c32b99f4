//! Permit payload and execution types

use crate::crypto::eip712::{encode_address, encode_uint, TypedStruct};
use chrono::Utc;
use ethereum_types::{Address, U256};
use serde::{Deserialize, Serialize};

/// Type string of the signed permit
pub const PERMIT_AND_TRANSFER_FROM_TYPE: &str = "PermitAndTransferFrom(address erc20,address owner,address spender,uint256 value,uint256 nonce,uint256 deadline)";

/// The message an owner signs to allow a single transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermitMessage {
    /// Token contract the transfer is drawn from
    pub erc20: Address,
    /// Account granting the permission; must be the signer
    pub owner: Address,
    /// Account allowed to execute; bound to the caller at execution time
    pub spender: Address,
    /// Amount in atomic token units
    pub value: U256,
    /// The owner's nonce at signing time
    pub nonce: U256,
    /// Last second (inclusive) at which the permit can be used
    pub deadline: U256,
}

impl TypedStruct for PermitMessage {
    const TYPE: &'static str = PERMIT_AND_TRANSFER_FROM_TYPE;

    fn encode_data(&self) -> Vec<u8> {
        let mut encoded = Vec::with_capacity(6 * 32);
        encoded.extend_from_slice(&encode_address(&self.erc20));
        encoded.extend_from_slice(&encode_address(&self.owner));
        encoded.extend_from_slice(&encode_address(&self.spender));
        encoded.extend_from_slice(&encode_uint(self.value));
        encoded.extend_from_slice(&encode_uint(self.nonce));
        encoded.extend_from_slice(&encode_uint(self.deadline));
        encoded
    }
}

/// Execution environment of a call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallContext {
    /// Authenticated identity invoking the operation
    pub caller: Address,
    /// Current time in seconds since the epoch
    pub timestamp: u64,
    /// Chain the call executes on
    pub chain_id: u64,
}

impl CallContext {
    /// Create a new call context
    pub fn new(caller: Address, timestamp: u64, chain_id: u64) -> Self {
        Self {
            caller,
            timestamp,
            chain_id,
        }
    }

    /// Context for `caller` at the current wall-clock time
    pub fn now(caller: Address, chain_id: u64) -> Self {
        let timestamp = Utc::now().timestamp().max(0) as u64;
        Self::new(caller, timestamp, chain_id)
    }

    /// Same call, re-issued by another identity
    pub fn with_caller(self, caller: Address) -> Self {
        Self { caller, ..self }
    }
}

/// Outcome of an executed permit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferReceipt {
    pub owner: Address,
    pub recipient: Address,
    pub value: U256,
}
