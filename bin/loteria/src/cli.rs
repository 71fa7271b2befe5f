use std::path::PathBuf;

use clap::Parser;
use loteria_deploy::{DEFAULT_CHAIN_ID, DEFAULT_RPC_URL, DeployConfig, PrivateKey};
use tracing::level_filters::LevelFilter;
use url::Url;

/// Known networks the lottery is deployed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum Network {
    WorldchainMainnet,
    WorldchainSepolia,
}

impl Network {
    pub fn to_chain_id(&self) -> u64 {
        match self {
            Network::WorldchainMainnet => DEFAULT_CHAIN_ID,
            Network::WorldchainSepolia => 4801,
        }
    }

    pub fn to_rpc_url(&self) -> anyhow::Result<Url> {
        let url = match self {
            Network::WorldchainMainnet => DEFAULT_RPC_URL,
            Network::WorldchainSepolia => "https://worldchain-sepolia.g.alchemy.com/public",
        };
        Ok(Url::parse(url)?)
    }
}

#[derive(Parser)]
#[command(name = "loteria")]
#[command(author, version, about = "Deploy the Worldcoin lottery contract")]
pub struct Cli {
    /// The verbosity level.
    #[arg(short, long, env = "LOTERIA_VERBOSITY", default_value_t = LevelFilter::INFO)]
    pub verbosity: LevelFilter,

    /// Path to a TOML configuration file.
    ///
    /// Values from the file are overridden by `LOTERIA_*` environment variables,
    /// which are in turn overridden by the flags below.
    #[arg(long, alias = "conf", env = "LOTERIA_CONFIG")]
    pub config: Option<PathBuf>,

    /// A known network preset (sets both the RPC URL and the chain id).
    #[arg(short, long, env = "LOTERIA_NETWORK")]
    pub network: Option<Network>,

    /// The URL of the JSON-RPC endpoint. Takes precedence over `--network`.
    #[arg(long, alias = "rpc")]
    pub rpc_url: Option<Url>,

    /// The chain id the RPC endpoint must report. Takes precedence over `--network`.
    #[arg(long)]
    pub chain_id: Option<u64>,

    /// Hex-encoded private key of the deployer account.
    #[arg(long, env = "PRIVATE_KEY", hide_env_values = true)]
    pub private_key: Option<String>,

    /// Path to the compiled contract artifact (Hardhat or Foundry JSON).
    #[arg(long)]
    pub artifact: Option<PathBuf>,

    /// Address of the token contract passed to the constructor.
    #[arg(long, alias = "token-address")]
    pub token: Option<String>,

    /// Number of blocks to wait for after inclusion.
    #[arg(long)]
    pub confirmations: Option<u64>,

    /// Stop after gas estimation and print the projected cost. Nothing is sent.
    #[arg(long, alias = "dry-run")]
    pub estimate_only: bool,
}

impl Cli {
    /// Apply command-line overrides on top of the file/environment configuration.
    pub fn apply(&self, mut config: DeployConfig) -> anyhow::Result<DeployConfig> {
        if let Some(network) = self.network {
            config.rpc_url = network.to_rpc_url()?;
            config.chain_id = network.to_chain_id();
        }

        if let Some(rpc_url) = &self.rpc_url {
            config.rpc_url = rpc_url.clone();
        }

        if let Some(chain_id) = self.chain_id {
            config.chain_id = chain_id;
        }

        if let Some(private_key) = &self.private_key {
            config.private_key = Some(PrivateKey::new(private_key.clone()));
        }

        if let Some(artifact) = &self.artifact {
            config.artifact = artifact.clone();
        }

        if let Some(token) = &self.token {
            config.token_address = token.clone();
        }

        if let Some(confirmations) = self.confirmations {
            config.confirmations = confirmations;
        }

        Ok(config)
    }
}
