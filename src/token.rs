//! Fungible asset primitive the verifier moves funds through
//!
//! The verifier only needs allowance-gated `transfer_from`; balances,
//! approvals and minting belong to the token. [`InMemoryToken`] is a
//! process-local implementation that records every `Transfer` and
//! `Approval` it emits.

use crate::{PermitError, Result};
use ethereum_types::{Address, U256};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Emitted whenever units move between accounts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub from: Address,
    pub to: Address,
    pub value: U256,
}

/// Emitted whenever an allowance is set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Approval {
    pub owner: Address,
    pub spender: Address,
    pub value: U256,
}

/// Observable token events, in emission order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum TokenEvent {
    Transfer(Transfer),
    Approval(Approval),
}

/// ERC-20 style asset primitive
pub trait Erc20: Send + Sync {
    /// Contract address, signed into every permit as `erc20`
    fn address(&self) -> Address;

    fn balance_of(&self, account: &Address) -> U256;

    fn allowance(&self, owner: &Address, spender: &Address) -> U256;

    /// Let `spender` move up to `amount` of `owner`'s units
    fn approve(&mut self, owner: Address, spender: Address, amount: U256) -> Result<Approval>;

    /// Move `amount` from `from` to `to` on behalf of `spender`
    ///
    /// Fails without side effects when the allowance or the balance is short.
    fn transfer_from(
        &mut self,
        spender: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<Transfer>;
}

/// In-memory token
#[derive(Debug, Clone)]
pub struct InMemoryToken {
    address: Address,
    name: String,
    symbol: String,
    total_supply: U256,
    balances: HashMap<Address, U256>,
    allowances: HashMap<(Address, Address), U256>,
    events: Vec<TokenEvent>,
}

impl InMemoryToken {
    /// Create a token with no supply
    pub fn new(address: Address, name: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            address,
            name: name.into(),
            symbol: symbol.into(),
            total_supply: U256::zero(),
            balances: HashMap::new(),
            allowances: HashMap::new(),
            events: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn total_supply(&self) -> U256 {
        self.total_supply
    }

    /// Create `amount` new units for `to`
    pub fn mint(&mut self, to: Address, amount: U256) -> Result<Transfer> {
        let total_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(PermitError::Overflow("total supply"))?;

        self.total_supply = total_supply;
        // Bounded by the total supply check above
        *self.balances.entry(to).or_default() += amount;

        let transfer = Transfer {
            from: Address::zero(),
            to,
            value: amount,
        };
        self.events.push(TokenEvent::Transfer(transfer));
        Ok(transfer)
    }

    /// All events emitted so far
    pub fn events(&self) -> &[TokenEvent] {
        &self.events
    }

    /// `Transfer` events emitted so far
    pub fn transfers(&self) -> impl Iterator<Item = &Transfer> + '_ {
        self.events.iter().filter_map(|event| match event {
            TokenEvent::Transfer(transfer) => Some(transfer),
            TokenEvent::Approval(_) => None,
        })
    }
}

impl Erc20 for InMemoryToken {
    fn address(&self) -> Address {
        self.address
    }

    fn balance_of(&self, account: &Address) -> U256 {
        self.balances.get(account).copied().unwrap_or_default()
    }

    fn allowance(&self, owner: &Address, spender: &Address) -> U256 {
        self.allowances
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or_default()
    }

    fn approve(&mut self, owner: Address, spender: Address, amount: U256) -> Result<Approval> {
        self.allowances.insert((owner, spender), amount);

        let approval = Approval {
            owner,
            spender,
            value: amount,
        };
        self.events.push(TokenEvent::Approval(approval));
        Ok(approval)
    }

    fn transfer_from(
        &mut self,
        spender: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<Transfer> {
        let allowed = self.allowance(&from, &spender);
        if allowed < amount {
            return Err(PermitError::InsufficientAllowance {
                allowed,
                needed: amount,
            });
        }

        let balance = self.balance_of(&from);
        if balance < amount {
            return Err(PermitError::InsufficientBalance {
                balance,
                needed: amount,
            });
        }

        // U256::MAX is an infinite allowance and is never spent down
        if allowed != U256::MAX {
            self.allowances.insert((from, spender), allowed - amount);
        }
        self.balances.insert(from, balance - amount);
        *self.balances.entry(to).or_default() += amount;

        let transfer = Transfer {
            from,
            to,
            value: amount,
        };
        self.events.push(TokenEvent::Transfer(transfer));
        tracing::debug!(
            "Transfer {} from {:?} to {:?} by {:?}",
            amount,
            from,
            to,
            spender
        );
        Ok(transfer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token() -> InMemoryToken {
        InMemoryToken::new(Address::repeat_byte(0xee), "Token", "TKN")
    }

    fn alice() -> Address {
        Address::repeat_byte(0xa1)
    }

    fn bob() -> Address {
        Address::repeat_byte(0xb0)
    }

    fn spender() -> Address {
        Address::repeat_byte(0x5e)
    }

    #[test]
    fn test_mint_credits_balance_and_supply() {
        let mut token = token();
        token.mint(alice(), U256::from(1000u64)).unwrap();

        assert_eq!(token.balance_of(&alice()), U256::from(1000u64));
        assert_eq!(token.total_supply(), U256::from(1000u64));
        assert_eq!(token.name(), "Token");
        assert_eq!(token.symbol(), "TKN");
        assert_eq!(
            token.transfers().next(),
            Some(&Transfer {
                from: Address::zero(),
                to: alice(),
                value: U256::from(1000u64),
            })
        );
    }

    #[test]
    fn test_transfer_from_spends_allowance() {
        let mut token = token();
        token.mint(alice(), U256::from(1000u64)).unwrap();
        token
            .approve(alice(), spender(), U256::from(600u64))
            .unwrap();

        token
            .transfer_from(spender(), alice(), bob(), U256::from(400u64))
            .unwrap();

        assert_eq!(token.balance_of(&alice()), U256::from(600u64));
        assert_eq!(token.balance_of(&bob()), U256::from(400u64));
        assert_eq!(token.allowance(&alice(), &spender()), U256::from(200u64));
    }

    #[test]
    fn test_transfer_from_insufficient_allowance() {
        let mut token = token();
        token.mint(alice(), U256::from(1000u64)).unwrap();
        token.approve(alice(), spender(), U256::from(10u64)).unwrap();
        let events_before = token.events().len();

        let result = token.transfer_from(spender(), alice(), bob(), U256::from(11u64));

        assert!(matches!(
            result,
            Err(PermitError::InsufficientAllowance { .. })
        ));
        assert_eq!(token.balance_of(&alice()), U256::from(1000u64));
        assert_eq!(token.events().len(), events_before);
    }

    #[test]
    fn test_transfer_from_insufficient_balance() {
        let mut token = token();
        token.mint(alice(), U256::from(5u64)).unwrap();
        token.approve(alice(), spender(), U256::from(10u64)).unwrap();

        let result = token.transfer_from(spender(), alice(), bob(), U256::from(10u64));

        assert!(matches!(result, Err(PermitError::InsufficientBalance { .. })));
        assert_eq!(token.allowance(&alice(), &spender()), U256::from(10u64));
    }

    #[test]
    fn test_infinite_allowance_is_not_spent() {
        let mut token = token();
        token.mint(alice(), U256::from(1000u64)).unwrap();
        token.approve(alice(), spender(), U256::MAX).unwrap();

        token
            .transfer_from(spender(), alice(), bob(), U256::from(1000u64))
            .unwrap();

        assert_eq!(token.allowance(&alice(), &spender()), U256::MAX);
    }
}
