//! Core types for signed permits
//!
//! - [`PermitMessage`] - the EIP-712 payload an owner signs
//! - [`CallContext`] - caller identity, time and chain of an execution
//! - [`TransferReceipt`] - what a successful permit moved

pub mod permit;

pub use permit::{CallContext, PermitMessage, TransferReceipt, PERMIT_AND_TRANSFER_FROM_TYPE};
