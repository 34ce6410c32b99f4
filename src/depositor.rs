//! Signature-authorized deposits into a custody account
//!
//! [`AuthorizedDepositor`] embeds a [`PermitVerifier`] whose verifying
//! contract is the depositor itself. Because the verifier binds the signed
//! spender to its caller, and the depositor is always that caller, owners
//! sign permits with `spender = depositor` and any relayer may submit them.
//! Funds land in the depositor's own account and are credited to the owner.

use crate::crypto::eip712::Domain;
use crate::crypto::signature::Signature;
use crate::nonce_store::{InMemoryNonceStore, NonceStore};
use crate::token::Erc20;
use crate::types::{CallContext, TransferReceipt};
use crate::verifier::PermitVerifier;
use crate::{PermitError, Result};
use ethereum_types::{Address, U256};
use std::collections::HashMap;

/// Custody account accepting gasless, permit-authorized deposits of one asset
#[derive(Debug, Clone)]
pub struct AuthorizedDepositor<S: NonceStore = InMemoryNonceStore> {
    asset: Address,
    verifier: PermitVerifier<S>,
    deposits: HashMap<Address, U256>,
    total_deposits: U256,
}

impl AuthorizedDepositor<InMemoryNonceStore> {
    /// Depositor living at `domain.verifying_contract`, accepting `asset`
    pub fn new(domain: Domain, asset: Address) -> Self {
        Self::with_verifier(PermitVerifier::new(domain), asset)
    }
}

impl<S: NonceStore> AuthorizedDepositor<S> {
    pub fn with_verifier(verifier: PermitVerifier<S>, asset: Address) -> Self {
        Self {
            asset,
            verifier,
            deposits: HashMap::new(),
            total_deposits: U256::zero(),
        }
    }

    /// Own identity: custody account, verifier address and permit spender
    pub fn address(&self) -> Address {
        self.verifier.address()
    }

    /// The only token this depositor accepts
    pub fn asset(&self) -> Address {
        self.asset
    }

    pub fn verifier(&self) -> &PermitVerifier<S> {
        &self.verifier
    }

    pub fn domain(&self) -> &Domain {
        self.verifier.domain()
    }

    pub fn nonces(&self, owner: &Address) -> U256 {
        self.verifier.nonces(owner)
    }

    /// Amount credited to `owner` so far
    pub fn deposit_of(&self, owner: &Address) -> U256 {
        self.deposits.get(owner).copied().unwrap_or_default()
    }

    pub fn total_deposits(&self) -> U256 {
        self.total_deposits
    }

    /// Pull `value` of the fixed asset from `owner` into custody
    ///
    /// `ctx.caller` is only the submitter; the permit must name the depositor
    /// as spender.
    pub fn deposit_by_sig<T: Erc20 + ?Sized>(
        &mut self,
        ctx: &CallContext,
        token: &mut T,
        owner: Address,
        value: U256,
        deadline: U256,
        signature: &Signature,
    ) -> Result<TransferReceipt> {
        if token.address() != self.asset {
            return Err(PermitError::AssetMismatch {
                expected: self.asset,
                actual: token.address(),
            });
        }

        let credited = self
            .deposit_of(&owner)
            .checked_add(value)
            .ok_or(PermitError::Overflow("deposit"))?;
        let total_deposits = self
            .total_deposits
            .checked_add(value)
            .ok_or(PermitError::Overflow("total deposits"))?;

        let custody = self.address();
        let inner = ctx.with_caller(custody);
        let receipt = self.verifier.permit_and_transfer_from(
            &inner, token, owner, custody, value, deadline, signature,
        )?;

        self.deposits.insert(owner, credited);
        self.total_deposits = total_deposits;

        tracing::info!(
            "Deposit of {} by {:?} submitted by {:?}",
            value,
            owner,
            ctx.caller
        );
        Ok(receipt)
    }

    /// The embedded verifier's entry point, executed with the caller's own identity
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
        self.verifier
            .permit_and_transfer_from(ctx, token, owner, recipient, value, deadline, signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::InMemoryToken;
    use crate::wallet::LocalWallet;

    const CHAIN_ID: u64 = 31337;
    const NOW: u64 = 1_700_000_000;

    struct Fixture {
        depositor: AuthorizedDepositor,
        token: InMemoryToken,
        owner: LocalWallet,
        relayer: Address,
    }

    fn fixture() -> Fixture {
        let vault = Address::repeat_byte(0x7a);
        let mut token = InMemoryToken::new(Address::repeat_byte(0x01), "Token", "TKN");
        let owner = LocalWallet::random();
        token.mint(owner.address(), U256::from(1000u64)).unwrap();
        token
            .approve(owner.address(), vault, U256::from(1000u64))
            .unwrap();

        Fixture {
            depositor: AuthorizedDepositor::new(
                Domain::new("Vault", "1", CHAIN_ID, vault),
                token.address(),
            ),
            token,
            owner,
            relayer: Address::repeat_byte(0x4e),
        }
    }

    fn sign_deposit(f: &Fixture, value: u64, deadline: u64) -> Signature {
        f.owner
            .sign_permit(
                f.depositor.domain(),
                f.token.address(),
                f.depositor.address(),
                U256::from(value),
                f.depositor.nonces(&f.owner.address()),
                U256::from(deadline),
            )
            .unwrap()
    }

    #[test]
    fn test_deposit_by_sig_moves_funds_into_custody() {
        let mut f = fixture();
        let signature = sign_deposit(&f, 600, NOW + 60);
        let ctx = CallContext::new(f.relayer, NOW, CHAIN_ID);
        let owner = f.owner.address();

        let receipt = f
            .depositor
            .deposit_by_sig(
                &ctx,
                &mut f.token,
                owner,
                U256::from(600u64),
                U256::from(NOW + 60),
                &signature,
            )
            .unwrap();

        assert_eq!(receipt.recipient, f.depositor.address());
        assert_eq!(
            f.token.balance_of(&f.depositor.address()),
            U256::from(600u64)
        );
        assert_eq!(f.token.balance_of(&owner), U256::from(400u64));
        assert_eq!(f.depositor.deposit_of(&owner), U256::from(600u64));
        assert_eq!(f.depositor.total_deposits(), U256::from(600u64));
        assert_eq!(f.depositor.nonces(&owner), U256::one());
    }

    #[test]
    fn test_deposit_by_sig_any_submitter() {
        let mut f = fixture();
        let signature = sign_deposit(&f, 100, NOW + 60);
        let owner = f.owner.address();
        // The owner can submit their own permit just as well as a relayer
        let ctx = CallContext::new(owner, NOW, CHAIN_ID);

        f.depositor
            .deposit_by_sig(
                &ctx,
                &mut f.token,
                owner,
                U256::from(100u64),
                U256::from(NOW + 60),
                &signature,
            )
            .unwrap();

        assert_eq!(f.depositor.deposit_of(&owner), U256::from(100u64));
    }

    #[test]
    fn test_deposit_by_sig_rejects_permit_for_other_spender() {
        let mut f = fixture();
        let owner = f.owner.address();
        // Signed for the relayer rather than the depositor
        let signature = f
            .owner
            .sign_permit(
                f.depositor.domain(),
                f.token.address(),
                f.relayer,
                U256::from(100u64),
                U256::zero(),
                U256::from(NOW + 60),
            )
            .unwrap();
        let ctx = CallContext::new(f.relayer, NOW, CHAIN_ID);

        let result = f.depositor.deposit_by_sig(
            &ctx,
            &mut f.token,
            owner,
            U256::from(100u64),
            U256::from(NOW + 60),
            &signature,
        );

        assert!(matches!(result, Err(PermitError::InvalidSignature)));
        assert_eq!(f.depositor.deposit_of(&owner), U256::zero());
        assert_eq!(f.depositor.nonces(&owner), U256::zero());
    }

    #[test]
    fn test_deposit_by_sig_rejects_foreign_asset() {
        let mut f = fixture();
        let signature = sign_deposit(&f, 100, NOW + 60);
        let mut other = InMemoryToken::new(Address::repeat_byte(0x02), "Other", "OTH");
        let ctx = CallContext::new(f.relayer, NOW, CHAIN_ID);

        let result = f.depositor.deposit_by_sig(
            &ctx,
            &mut other,
            f.owner.address(),
            U256::from(100u64),
            U256::from(NOW + 60),
            &signature,
        );

        assert!(matches!(result, Err(PermitError::AssetMismatch { .. })));
    }

    #[test]
    fn test_deposit_replay_fails() {
        let mut f = fixture();
        let signature = sign_deposit(&f, 100, NOW + 60);
        let ctx = CallContext::new(f.relayer, NOW, CHAIN_ID);
        let owner = f.owner.address();

        f.depositor
            .deposit_by_sig(
                &ctx,
                &mut f.token,
                owner,
                U256::from(100u64),
                U256::from(NOW + 60),
                &signature,
            )
            .unwrap();
        let replay = f.depositor.deposit_by_sig(
            &ctx,
            &mut f.token,
            owner,
            U256::from(100u64),
            U256::from(NOW + 60),
            &signature,
        );

        assert!(matches!(replay, Err(PermitError::InvalidSignature)));
        assert_eq!(f.depositor.deposit_of(&owner), U256::from(100u64));
    }

    #[test]
    fn test_failed_transfer_credits_nothing() {
        let mut f = fixture();
        let signature = sign_deposit(&f, 5000, NOW + 60);
        let ctx = CallContext::new(f.relayer, NOW, CHAIN_ID);
        let owner = f.owner.address();

        let result = f.depositor.deposit_by_sig(
            &ctx,
            &mut f.token,
            owner,
            U256::from(5000u64),
            U256::from(NOW + 60),
            &signature,
        );

        assert!(matches!(
            result,
            Err(PermitError::InsufficientAllowance { .. })
        ));
        assert_eq!(f.depositor.deposit_of(&owner), U256::zero());
        assert_eq!(f.depositor.total_deposits(), U256::zero());
        assert_eq!(f.depositor.nonces(&owner), U256::zero());
    }
}
