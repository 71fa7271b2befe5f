//! Layered deployment configuration.
//!
//! Values are resolved from built-in defaults, an optional TOML file and
//! `LOTERIA_`-prefixed environment variables, in that order. The binary applies
//! command-line overrides on top of the extracted struct.

use std::{fmt, path::Path, path::PathBuf, time::Duration};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{
    error::{DeployError, Result},
    signer::SignerConfig,
};

/// Prefix for environment overrides (`LOTERIA_RPC_URL`, `LOTERIA_CHAIN_ID`, ...).
pub const ENV_PREFIX: &str = "LOTERIA_";

/// World Chain mainnet public RPC endpoint.
pub const DEFAULT_RPC_URL: &str = "https://worldchain-mainnet.g.alchemy.com/public";
/// World Chain mainnet chain id.
pub const DEFAULT_CHAIN_ID: u64 = 480;
/// WLD token contract passed to the lottery constructor.
pub const DEFAULT_TOKEN_ADDRESS: &str = "0x2cfc85d8e48f8eab294be644d9e25c3030863003";
/// Compiler output for the lottery contract.
pub const DEFAULT_ARTIFACT_PATH: &str =
    "artifacts/contracts/WorldcoinLoteria.sol/WorldcoinLoteria.json";
/// Interval between receipt polls.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2_000;

/// A hex-encoded secp256k1 private key. Never printed.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct PrivateKey(String);

impl PrivateKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The raw key material. Only the signer resolver should read this.
    pub(crate) fn expose(&self) -> &str {
        self.0.trim()
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(<redacted>)")
    }
}

/// Everything a single deployment run needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployConfig {
    /// JSON-RPC endpoint of the target network.
    pub rpc_url: Url,
    /// Chain id the endpoint is expected to report.
    pub chain_id: u64,
    /// Deployer key. Usually supplied through `PRIVATE_KEY`.
    #[serde(default, skip_serializing)]
    pub private_key: Option<PrivateKey>,
    /// Path to the compiled contract artifact (Hardhat or Foundry JSON).
    pub artifact: PathBuf,
    /// Constructor argument: address of the token contract.
    pub token_address: String,
    /// Blocks that must include the transaction before it counts as final.
    pub confirmations: u64,
    /// Receipt polling interval, in milliseconds.
    pub poll_interval_ms: u64,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            rpc_url: Url::parse(DEFAULT_RPC_URL).expect("default RPC URL is valid"),
            chain_id: DEFAULT_CHAIN_ID,
            private_key: None,
            artifact: PathBuf::from(DEFAULT_ARTIFACT_PATH),
            token_address: DEFAULT_TOKEN_ADDRESS.to_string(),
            confirmations: 1,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl DeployConfig {
    /// Resolve the configuration from defaults, an optional TOML file and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(path) = path {
            if !path.is_file() {
                return Err(DeployError::Configuration(format!(
                    "Configuration file not found: {}",
                    path.display()
                )));
            }
            figment = figment.merge(Toml::file(path));
        }

        let config: Self = figment
            .merge(Env::prefixed(ENV_PREFIX))
            .extract()
            .map_err(|e| DeployError::Configuration(e.to_string()))?;

        tracing::debug!(config = ?config, "Configuration resolved");

        Ok(config)
    }

    /// Check values that deserialization alone cannot reject.
    pub fn validate(&self) -> Result<()> {
        if self.confirmations == 0 {
            return Err(DeployError::Configuration(
                "confirmations must be at least 1".to_string(),
            ));
        }
        if self.poll_interval_ms == 0 {
            return Err(DeployError::Configuration(
                "poll_interval_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Credential configuration handed to the signer resolver.
    pub fn signer_config(&self) -> SignerConfig {
        SignerConfig {
            private_key: self.private_key.clone(),
            chain_id: self.chain_id,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
