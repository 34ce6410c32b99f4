//! Permit verification and one-shot execution
//!
//! [`PermitVerifier`] owns the nonce table and gates every transfer behind
//! an owner signature over a [`PermitMessage`]. The signed `spender` is not
//! supplied by the submitter: it is always the identity executing the call,
//! so a permit signed for one caller is useless to every other caller.
//!
//! # Examples
//!
//! ```
//! use ethereum_types::{Address, U256};
//! use permit_transfer::crypto::Domain;
//! use permit_transfer::token::{Erc20, InMemoryToken};
//! use permit_transfer::types::CallContext;
//! use permit_transfer::verifier::PermitVerifier;
//! use permit_transfer::wallet::LocalWallet;
//!
//! # fn example() -> permit_transfer::Result<()> {
//! let verifier_address = Address::repeat_byte(0xaa);
//! let mut verifier = PermitVerifier::new(Domain::new("ApprovalTarget", "1", 31337, verifier_address));
//! let mut token = InMemoryToken::new(Address::repeat_byte(0x01), "Token", "TKN");
//!
//! let owner = LocalWallet::random();
//! let spender = Address::repeat_byte(0x5e);
//! token.mint(owner.address(), U256::from(1000u64))?;
//! token.approve(owner.address(), verifier_address, U256::from(1000u64))?;
//!
//! let deadline = U256::from(2_000_000_000u64);
//! let signature = owner.sign_permit(
//!     verifier.domain(),
//!     token.address(),
//!     spender,
//!     U256::from(1000u64),
//!     verifier.nonces(&owner.address()),
//!     deadline,
//! )?;
//!
//! let ctx = CallContext::new(spender, 1_700_000_000, 31337);
//! let receipt = verifier.permit_and_transfer_from(
//!     &ctx,
//!     &mut token,
//!     owner.address(),
//!     spender,
//!     U256::from(1000u64),
//!     deadline,
//!     &signature,
//! )?;
//!
//! assert_eq!(receipt.value, U256::from(1000u64));
//! assert_eq!(verifier.nonces(&owner.address()), U256::one());
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

use crate::crypto::eip712::{signing_digest, Domain, TypedStruct};
use crate::crypto::signature::{recover_signer, Signature};
use crate::nonce_store::{InMemoryNonceStore, NonceStore};
use crate::token::Erc20;
use crate::types::{CallContext, PermitMessage, TransferReceipt};
use crate::{PermitError, Result};
use ethereum_types::{Address, H256, U256};


/// Verifies signed permits and executes the transfers they authorize
#[derive(Debug, Clone)]
pub struct PermitVerifier<S: NonceStore = InMemoryNonceStore> {
    domain: Domain,
    /// Separator for `domain.chain_id`; other chains recompute it
    cached_separator: H256,
    nonces: S,
}

impl PermitVerifier<InMemoryNonceStore> {
    /// Create a verifier with an empty in-memory nonce table
    pub fn new(domain: Domain) -> Self {
        Self::with_store(domain, InMemoryNonceStore::new())
    }
}

impl<S: NonceStore> PermitVerifier<S> {
    /// Create a verifier over an existing nonce store
    pub fn with_store(domain: Domain, nonces: S) -> Self {
        let cached_separator = domain.separator();
        Self {
            domain,
            cached_separator,
            nonces,
        }
    }

    /// Identity of the verifier; owners approve this address on the token
    pub fn address(&self) -> Address {
        self.domain.verifying_contract
    }

    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    /// Domain separator as seen by a call executing on `chain_id`
    pub fn domain_separator(&self, chain_id: u64) -> H256 {
        if chain_id == self.domain.chain_id {
            self.cached_separator
        } else {
            self.domain.on_chain(chain_id).separator()
        }
    }

    /// Digest a permit must be signed over for a call on `chain_id`
    pub fn permit_digest(&self, chain_id: u64, permit: &PermitMessage) -> H256 {
        signing_digest(self.domain_separator(chain_id), permit.struct_hash())
    }

    /// Next nonce `owner` must sign
    pub fn nonces(&self, owner: &Address) -> U256 {
        self.nonces.nonce_of(owner)
    }

    /// Verify an owner-signed permit and move `value` from `owner` to `recipient`
    ///
    /// The signature must cover a `PermitAndTransferFrom` whose spender is
    /// `ctx.caller` and whose nonce is the owner's current one. On success the
    /// nonce advances by one; on any error nothing changes.
    #[allow(clippy::too_many_arguments)]
    pub fn permit_and_transfer_from<T: Erc20 + ?Sized>(
        &mut self,
        ctx: &CallContext,
        token: &mut T,
        owner: Address,
        recipient: Address,
        value: U256,
        deadline: U256,
        signature: &Signature,
    ) -> Result<TransferReceipt> {
        let nonce = self.nonces.nonce_of(&owner);
        let permit = PermitMessage {
            erc20: token.address(),
            owner,
            spender: ctx.caller,
            value,
            nonce,
            deadline,
        };

        let digest = self.permit_digest(ctx.chain_id, &permit);
        tracing::debug!("Permit digest for {:?} nonce {}: {:?}", owner, nonce, digest);

        let signer = recover_signer(digest, signature)?;
        if signer != owner {
            tracing::warn!(
                "Rejected permit for {:?} from caller {:?}: recovered signer {:?}",
                owner,
                ctx.caller,
                signer
            );
            return Err(PermitError::InvalidSignature);
        }

        if U256::from(ctx.timestamp) > deadline {
            tracing::warn!(
                "Rejected permit for {:?}: deadline {} passed at {}",
                owner,
                deadline,
                ctx.timestamp
            );
            return Err(PermitError::Expired {
                deadline,
                now: ctx.timestamp,
            });
        }

        // Consumed before the token is called so a nested call cannot reuse it
        self.nonces.consume(&owner, nonce)?;

        if let Err(e) = token.transfer_from(self.address(), owner, recipient, value) {
            self.nonces.rollback(&owner, nonce);
            tracing::warn!("Transfer for permit of {:?} failed: {}", owner, e);
            return Err(e);
        }

        tracing::info!(
            "Executed permit: {} from {:?} to {:?} (spender {:?}, nonce {})",
            value,
            owner,
            recipient,
            ctx.caller,
            nonce
        );

        Ok(TransferReceipt {
            owner,
            recipient,
            value,
        })
    }

    /// Same as [`permit_and_transfer_from`](Self::permit_and_transfer_from),
    /// taking the signature as separate `v`, `r`, `s`
    #[allow(clippy::too_many_arguments)]
    pub fn permit_and_transfer_from_vrs<T: Erc20 + ?Sized>(
        &mut self,
        ctx: &CallContext,
        token: &mut T,
        owner: Address,
        recipient: Address,
        value: U256,
        deadline: U256,
        v: u8,
        r: H256,
        s: H256,
    ) -> Result<TransferReceipt> {
        let signature = Signature::new(v, r, s);
        self.permit_and_transfer_from(ctx, token, owner, recipient, value, deadline, &signature)
    }
}
