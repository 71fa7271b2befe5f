//! Signing and broadcasting the deployment transaction.
//!
//! This is the only stage that spends funds. Nothing here is retried: a failed
//! broadcast means fee, gas and nonce must all be re-derived by a fresh run.

use alloy_core::primitives::{Address, B256};

use crate::{
    error::{DeployError, Result},
    rpc::{ChainRpc, RpcError},
    signer::Signer,
    stages::{fees::FeeEstimate, gas::GasEstimate},
    tx::{SignedTransaction, UnsignedDeploymentTransaction},
};

/// A broadcast transaction awaiting inclusion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedTransaction {
    pub hash: B256,
    pub from: Address,
    pub nonce: u64,
    /// Address the CREATE rule assigns to `(from, nonce)`.
    pub expected_address: Address,
}

/// Sign `tx` with `gas` as the limit and `fee` as the price, then broadcast it.
pub async fn submit_deployment<R: ChainRpc>(
    rpc: &R,
    signer: &Signer,
    tx: UnsignedDeploymentTransaction,
    gas: GasEstimate,
    fee: FeeEstimate,
) -> Result<SubmittedTransaction> {
    let from = signer.address();
    let nonce = rpc
        .transaction_count(from)
        .await
        .map_err(|e| DeployError::Submission(format!("Failed to fetch nonce for {from}: {e}")))?;

    let legacy = tx.into_legacy(nonce, fee.gas_price, gas.units(), signer.chain_id());
    let signed = SignedTransaction::sign(legacy, signer)?;
    let expected_address = from.create(nonce);

    tracing::info!(
        tx_hash = %signed.hash,
        nonce,
        gas_limit = gas.units(),
        expected_address = %expected_address,
        "Broadcasting deployment transaction..."
    );

    let hash = rpc.send_raw_transaction(&signed.raw).await.map_err(|e| match e {
        // The node may have accepted the transaction before the connection dropped.
        RpcError::Transport(msg) => DeployError::Submission(format!(
            "broadcast outcome unknown, check transaction {} ({msg})",
            signed.hash
        )),
        other => DeployError::Submission(other.to_string()),
    })?;

    if hash != signed.hash {
        tracing::warn!(
            local = %signed.hash,
            remote = %hash,
            "Node reported a different transaction hash"
        );
    }

    Ok(SubmittedTransaction {
        hash,
        from,
        nonce,
        expected_address,
    })
}
