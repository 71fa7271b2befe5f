//! loteria-deploy - One-shot contract deployment over JSON-RPC.
//!
//! This crate resolves a signer, queries the network gas price, estimates the gas
//! of a contract creation, broadcasts it and waits for the receipt.

pub mod artifact;
pub mod config;
pub mod error;
mod pipeline;
pub mod rpc;
pub mod signer;
pub mod stages;
pub mod tx;

pub use artifact::ContractArtifact;
pub use config::{DEFAULT_CHAIN_ID, DEFAULT_RPC_URL, DEFAULT_TOKEN_ADDRESS, DeployConfig, PrivateKey};
pub use error::DeployError;
pub use pipeline::{DeploymentPipeline, DeploymentReport, PreparedDeployment};
pub use rpc::{CallRequest, ChainRpc, HttpRpc, RpcError, TransactionReceipt};
pub use signer::{Signer, SignerConfig, resolve_signer};
pub use stages::{
    ConfirmationOptions, DeployedContract, FeeEstimate, GasEstimate, SubmittedTransaction,
    TX_BASE_GAS,
};
pub use tx::{ConstructorArgs, UnsignedDeploymentTransaction};
