//! Relayer configuration

use crate::crypto::eip712::Domain;
use crate::{PermitError, Result};
use ethereum_types::{Address, U256};
use std::env;
use std::str::FromStr;

/// Default bind address of the relayer
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3000";
/// Default EIP-712 domain name
pub const DEFAULT_DOMAIN_NAME: &str = "ApprovalTarget";
/// Default EIP-712 domain version
pub const DEFAULT_DOMAIN_VERSION: &str = "1";
/// Default chain id (local development chain)
pub const DEFAULT_CHAIN_ID: u64 = 31337;

/// Configuration for the permit relayer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayerConfig {
    /// Bind address (e.g., "0.0.0.0:3000")
    pub bind_address: String,
    /// Domain of the embedded verifier; its verifying contract is also the
    /// depositor's custody account
    pub domain: Domain,
    /// Identity the relayer executes permits as
    pub relayer: Address,
    /// Token accepted by the depositor
    pub asset: Address,
    /// Accounts funded on the dev ledger and pre-approved to the verifier
    pub dev_accounts: Vec<(Address, U256)>,
}

impl RelayerConfig {
    /// Create a new relayer config
    pub fn new(domain: Domain, relayer: Address, asset: Address) -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            domain,
            relayer,
            asset,
            dev_accounts: Vec::new(),
        }
    }

    /// Load the configuration from environment variables
    ///
    /// `VERIFIER_ADDRESS`, `RELAYER_ADDRESS` and `ASSET_ADDRESS` are required;
    /// `BIND_ADDRESS`, `PERMIT_DOMAIN_NAME`, `PERMIT_DOMAIN_VERSION`,
    /// `CHAIN_ID` and `DEV_ACCOUNTS` fall back to defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load the configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key).ok_or_else(|| PermitError::config(format!("{} must be set", key)))
        };

        let chain_id = match lookup("CHAIN_ID") {
            Some(raw) => raw
                .parse::<u64>()
                .map_err(|_| PermitError::config(format!("Invalid CHAIN_ID: {}", raw)))?,
            None => DEFAULT_CHAIN_ID,
        };

        let domain = Domain::new(
            lookup("PERMIT_DOMAIN_NAME").unwrap_or_else(|| DEFAULT_DOMAIN_NAME.to_string()),
            lookup("PERMIT_DOMAIN_VERSION").unwrap_or_else(|| DEFAULT_DOMAIN_VERSION.to_string()),
            chain_id,
            parse_address("VERIFIER_ADDRESS", &required("VERIFIER_ADDRESS")?)?,
        );

        let mut config = Self::new(
            domain,
            parse_address("RELAYER_ADDRESS", &required("RELAYER_ADDRESS")?)?,
            parse_address("ASSET_ADDRESS", &required("ASSET_ADDRESS")?)?,
        );

        if let Some(bind_address) = lookup("BIND_ADDRESS") {
            config = config.with_bind_address(bind_address);
        }
        if let Some(accounts) = lookup("DEV_ACCOUNTS") {
            config.dev_accounts = parse_dev_accounts(&accounts)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Set the bind address
    pub fn with_bind_address(mut self, bind_address: impl Into<String>) -> Self {
        self.bind_address = bind_address.into();
        self
    }

    /// Add a funded, pre-approved dev account
    pub fn with_dev_account(mut self, account: Address, amount: U256) -> Self {
        self.dev_accounts.push((account, amount));
        self
    }

    /// Validate the relayer configuration
    pub fn validate(&self) -> Result<()> {
        if self.bind_address.is_empty() {
            return Err(PermitError::config("Bind address cannot be empty"));
        }
        self.domain.validate()?;
        if self.relayer.is_zero() {
            return Err(PermitError::config(
                "Relayer address cannot be the zero address",
            ));
        }
        if self.asset.is_zero() {
            return Err(PermitError::config("Asset address cannot be the zero address"));
        }
        Ok(())
    }
}

fn parse_address(key: &str, raw: &str) -> Result<Address> {
    Address::from_str(raw.trim())
        .map_err(|_| PermitError::config(format!("Invalid {}: {}", key, raw)))
}

/// Parse `0xaddr=amount,0xaddr=amount`
fn parse_dev_accounts(raw: &str) -> Result<Vec<(Address, U256)>> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (account, amount) = entry.split_once('=').ok_or_else(|| {
                PermitError::config(format!("Invalid DEV_ACCOUNTS entry: {}", entry))
            })?;
            let amount = U256::from_dec_str(amount.trim()).map_err(|_| {
                PermitError::config(format!("Invalid DEV_ACCOUNTS amount: {}", amount))
            })?;
            Ok((parse_address("DEV_ACCOUNTS", account)?, amount))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const VERIFIER: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";
    const RELAYER: &str = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";
    const ASSET: &str = "0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512";

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    fn required_vars() -> Vec<(&'static str, &'static str)> {
        vec![
            ("VERIFIER_ADDRESS", VERIFIER),
            ("RELAYER_ADDRESS", RELAYER),
            ("ASSET_ADDRESS", ASSET),
        ]
    }

    #[test]
    fn test_from_lookup_defaults() {
        let config = RelayerConfig::from_lookup(lookup(&required_vars())).unwrap();

        assert_eq!(config.bind_address, DEFAULT_BIND_ADDRESS);
        assert_eq!(config.domain.name, "ApprovalTarget");
        assert_eq!(config.domain.version, "1");
        assert_eq!(config.domain.chain_id, 31337);
        assert_eq!(
            config.domain.verifying_contract,
            Address::from_str(VERIFIER).unwrap()
        );
        assert_eq!(config.relayer, Address::from_str(RELAYER).unwrap());
        assert!(config.dev_accounts.is_empty());
    }

    #[test]
    fn test_from_lookup_overrides() {
        let mut vars = required_vars();
        vars.extend([
            ("BIND_ADDRESS", "127.0.0.1:8080"),
            ("PERMIT_DOMAIN_NAME", "Vault"),
            ("PERMIT_DOMAIN_VERSION", "2"),
            ("CHAIN_ID", "8453"),
            (
                "DEV_ACCOUNTS",
                "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266=1000, 0x3C44CdDdB6a900fa2b585dd299e03d12FA4293BC=5",
            ),
        ]);

        let config = RelayerConfig::from_lookup(lookup(&vars)).unwrap();

        assert_eq!(config.bind_address, "127.0.0.1:8080");
        assert_eq!(config.domain.name, "Vault");
        assert_eq!(config.domain.version, "2");
        assert_eq!(config.domain.chain_id, 8453);
        assert_eq!(config.dev_accounts.len(), 2);
        assert_eq!(config.dev_accounts[0].1, U256::from(1000u64));
        assert_eq!(config.dev_accounts[1].1, U256::from(5u64));
    }

    #[test]
    fn test_from_lookup_missing_required() {
        let vars = vec![("VERIFIER_ADDRESS", VERIFIER), ("ASSET_ADDRESS", ASSET)];
        let err = RelayerConfig::from_lookup(lookup(&vars)).unwrap_err();
        assert!(err.to_string().contains("RELAYER_ADDRESS"));
    }

    #[test]
    fn test_from_lookup_invalid_values() {
        let mut vars = required_vars();
        vars.push(("CHAIN_ID", "mainnet"));
        assert!(RelayerConfig::from_lookup(lookup(&vars)).is_err());

        let mut vars = required_vars();
        vars.push(("CHAIN_ID", "0"));
        assert!(RelayerConfig::from_lookup(lookup(&vars)).is_err());

        let mut vars = required_vars();
        vars.push(("DEV_ACCOUNTS", "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"));
        assert!(RelayerConfig::from_lookup(lookup(&vars)).is_err());
    }

    #[test]
    fn test_validate_rejects_zero_addresses() {
        let domain = Domain::new("ApprovalTarget", "1", 31337, Address::repeat_byte(0xaa));

        assert!(RelayerConfig::new(domain.clone(), Address::zero(), Address::repeat_byte(1))
            .validate()
            .is_err());
        assert!(RelayerConfig::new(domain.clone(), Address::repeat_byte(1), Address::zero())
            .validate()
            .is_err());
        assert!(RelayerConfig::new(domain, Address::repeat_byte(1), Address::repeat_byte(2))
            .with_bind_address("")
            .validate()
            .is_err());
    }
}
