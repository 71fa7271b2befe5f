//! Signer resolution: turns configured key material into an identity bound to the network session.

use std::fmt;

use alloy_consensus::{SignableTransaction, Signed, TxLegacy};
use alloy_core::primitives::{Address, B256};
use alloy_network::TxSignerSync;
use alloy_signer_local::PrivateKeySigner;

use crate::{
    config::PrivateKey,
    error::{DeployError, Result},
    rpc::ChainRpc,
};

/// Credential configuration for [`resolve_signer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignerConfig {
    pub private_key: Option<PrivateKey>,
    /// Chain id the session must report before anything is signed for it.
    pub chain_id: u64,
}

/// The account that submits the deployment.
pub struct Signer {
    inner: PrivateKeySigner,
    chain_id: u64,
}

impl Signer {
    /// Build a signer from a hex-encoded key, with or without the `0x` prefix.
    pub fn from_private_key(key: &PrivateKey, chain_id: u64) -> Result<Self> {
        let hex_key = key.expose();
        let hex_key = hex_key.strip_prefix("0x").unwrap_or(hex_key);

        let bytes: [u8; 32] = hex::decode(hex_key)
            .map_err(|_| DeployError::Configuration("PRIVATE_KEY is not valid hex".to_string()))?
            .try_into()
            .map_err(|_| {
                DeployError::Configuration("PRIVATE_KEY must be exactly 32 bytes".to_string())
            })?;

        let inner = PrivateKeySigner::from_bytes(&B256::from(bytes)).map_err(|_| {
            DeployError::Configuration("PRIVATE_KEY is not a valid secp256k1 key".to_string())
        })?;

        Ok(Self { inner, chain_id })
    }

    pub fn address(&self) -> Address {
        self.inner.address()
    }

    /// Chain id of the session this signer is bound to.
    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Sign a legacy transaction. Its chain id must match the session's.
    pub fn sign_legacy(&self, mut tx: TxLegacy) -> Result<Signed<TxLegacy>> {
        if tx.chain_id != Some(self.chain_id) {
            return Err(DeployError::Submission(format!(
                "refusing to sign for chain {:?}, session is on chain {}",
                tx.chain_id, self.chain_id
            )));
        }

        let signature = self
            .inner
            .sign_transaction_sync(&mut tx)
            .map_err(|e| DeployError::Submission(format!("Failed to sign transaction: {e}")))?;

        Ok(tx.into_signed(signature))
    }
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signer")
            .field("address", &self.address())
            .field("chain_id", &self.chain_id)
            .finish_non_exhaustive()
    }
}

/// Resolve the deployer account and confirm the session points at the configured chain.
pub async fn resolve_signer<R: ChainRpc>(config: &SignerConfig, rpc: &R) -> Result<Signer> {
    let key = config.private_key.as_ref().ok_or_else(|| {
        DeployError::Configuration("PRIVATE_KEY is not set in the environment".to_string())
    })?;
    let signer = Signer::from_private_key(key, config.chain_id)?;

    let remote_chain_id = rpc
        .chain_id()
        .await
        .map_err(|e| DeployError::from_rpc(e, DeployError::NetworkUnavailable))?;

    if remote_chain_id != config.chain_id {
        return Err(DeployError::Configuration(format!(
            "RPC endpoint reports chain id {remote_chain_id}, expected {}",
            config.chain_id
        )));
    }

    tracing::info!(
        address = %signer.address(),
        chain_id = remote_chain_id,
        "Deploying with account"
    );

    Ok(signer)
}
