//! Waiting for the deployment to be included on-chain.

use std::time::Duration;

use alloy_core::primitives::{Address, B256};

use crate::{
    error::{DeployError, Result},
    rpc::{ChainRpc, TransactionReceipt},
    stages::submit::SubmittedTransaction,
};

/// How the waiter decides that a transaction is final.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmationOptions {
    /// Number of blocks, including the inclusion block, required on top of the receipt.
    pub confirmations: u64,
    pub poll_interval: Duration,
}

impl Default for ConfirmationOptions {
    fn default() -> Self {
        Self {
            confirmations: 1,
            poll_interval: Duration::from_secs(2),
        }
    }
}

/// A contract whose code now lives on-chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployedContract {
    pub address: Address,
    pub tx_hash: B256,
    pub block_number: u64,
    pub gas_used: u64,
}

/// Block until `submitted` is included with enough confirmations.
///
/// There is no timeout; the wait is bounded only by the network. Any RPC failure
/// while waiting ends the run, leaving the transaction for manual inspection.
pub async fn wait_for_confirmation<R: ChainRpc>(
    rpc: &R,
    submitted: &SubmittedTransaction,
    options: ConfirmationOptions,
) -> Result<DeployedContract> {
    let failed = |reason: String| DeployError::Confirmation {
        tx_hash: submitted.hash.to_string(),
        reason,
    };

    tracing::info!(tx_hash = %submitted.hash, "Waiting for confirmation...");

    let receipt = loop {
        match rpc.transaction_receipt(submitted.hash).await {
            Ok(Some(receipt)) if receipt.block_number.is_some() => break receipt,
            Ok(_) => tracing::trace!(tx_hash = %submitted.hash, "Transaction still pending"),
            Err(e) => return Err(failed(format!("receipt query failed: {e}"))),
        }
        tokio::time::sleep(options.poll_interval).await;
    };

    let block_number = inclusion_block(&receipt)?;

    if !receipt.succeeded() {
        return Err(failed(format!("deployment reverted in block {block_number}")));
    }

    let address = receipt
        .contract_address
        .ok_or_else(|| failed("receipt has no contract address".to_string()))?;

    if address != submitted.expected_address {
        tracing::warn!(
            expected = %submitted.expected_address,
            actual = %address,
            "Deployed address differs from the CREATE-derived address"
        );
    }

    if options.confirmations > 1 {
        let target = confirmation_target(block_number, options.confirmations);
        loop {
            let head = rpc
                .block_number()
                .await
                .map_err(|e| failed(format!("block number query failed: {e}")))?;
            if head >= target {
                break;
            }
            tracing::debug!(head, target, "Waiting for more confirmations");
            tokio::time::sleep(options.poll_interval).await;
        }
    }

    tracing::info!(
        address = %address,
        block = block_number,
        gas_used = receipt.gas_used.to::<u64>(),
        "Deployment confirmed"
    );

    Ok(DeployedContract {
        address,
        tx_hash: submitted.hash,
        block_number,
        gas_used: receipt.gas_used.to::<u64>(),
    })
}

/// Head block at which the inclusion block has `confirmations` blocks on top, itself included.
fn confirmation_target(block_number: u64, confirmations: u64) -> u64 {
    block_number.saturating_add(confirmations.saturating_sub(1))
}

fn inclusion_block(receipt: &TransactionReceipt) -> Result<u64> {
    receipt
        .block_number
        .map(|n| n.to::<u64>())
        .ok_or_else(|| DeployError::Confirmation {
            tx_hash: receipt.transaction_hash.to_string(),
            reason: "receipt has no block number".to_string(),
        })
}
