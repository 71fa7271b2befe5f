//! Error taxonomy for the deployment pipeline.

use thiserror::Error;

use crate::rpc::RpcError;

/// Errors that terminate a deployment run.
///
/// Each variant corresponds to the stage that produced it. No stage recovers
/// from another stage's error; the binary maps them to distinct exit codes.
#[derive(Debug, Error)]
pub enum DeployError {
    /// Missing or invalid credential, network or artifact configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// The network could not be reached or did not supply a fee price.
    #[error("Network unavailable: {0}")]
    NetworkUnavailable(String),
    /// Malformed constructor input, rejected before any network call.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// Gas estimation predicted that the deployment would fail.
    #[error("Simulation failed: {0}")]
    Simulation(String),
    /// The signed transaction could not be broadcast.
    #[error("Submission failed: {0}")]
    Submission(String),
    /// The broadcast transaction did not reach a successful final state.
    #[error("Confirmation failed for transaction {tx_hash}: {reason}")]
    Confirmation { tx_hash: String, reason: String },
}

impl DeployError {
    /// Process exit code for this error kind.
    ///
    /// `0` is success and `1` is left for failures outside the pipeline.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Configuration(_) => 2,
            Self::NetworkUnavailable(_) => 3,
            Self::InvalidArgument(_) => 4,
            Self::Simulation(_) => 5,
            Self::Submission(_) => 6,
            Self::Confirmation { .. } => 7,
        }
    }

    /// Short operator hint printed alongside the error.
    pub fn hint(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "check PRIVATE_KEY, the RPC URL, the chain id and the artifact path",
            Self::NetworkUnavailable(_) => "the RPC endpoint did not answer; nothing was sent",
            Self::InvalidArgument(_) => "fix the constructor argument; nothing was sent",
            Self::Simulation(_) => "the constructor would revert; nothing was sent",
            Self::Submission(_) => "the transaction was not accepted; re-run once the cause is fixed",
            Self::Confirmation { .. } => {
                "the transaction was broadcast; inspect its hash on an explorer before re-running"
            }
        }
    }

    /// Map a transport failure to `NetworkUnavailable` and a node error to `other`.
    pub(crate) fn from_rpc(err: RpcError, other: impl FnOnce(String) -> Self) -> Self {
        match err {
            RpcError::Transport(msg) => Self::NetworkUnavailable(msg),
            err => other(err.to_string()),
        }
    }
}

pub type Result<T, E = DeployError> = std::result::Result<T, E>;
