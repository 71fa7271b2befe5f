//! Gas estimation for the deployment transaction.

use alloy_core::primitives::{Address, Bytes};
use derive_more::{Deref, Display};

use crate::{
    error::{DeployError, Result},
    rpc::ChainRpc,
    tx::{ConstructorArgs, UnsignedDeploymentTransaction},
};

/// Intrinsic cost of the cheapest possible transaction.
pub const TX_BASE_GAS: u64 = 21_000;

/// Gas units the network predicts the deployment will consume.
///
/// Used as the gas limit of the submission, so it is a ceiling rather than the final cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deref, Display)]
pub struct GasEstimate(u64);

impl GasEstimate {
    pub fn units(self) -> u64 {
        self.0
    }
}

/// Build the unsigned deployment transaction from already validated arguments.
pub fn build_deployment(
    from: Address,
    bytecode: &Bytes,
    args: &ConstructorArgs,
) -> Result<UnsignedDeploymentTransaction> {
    let tx = UnsignedDeploymentTransaction::new(from, bytecode, args)?;
    tracing::debug!(from = %from, token = %args.token, "Deployment transaction built");
    Ok(tx)
}

/// Simulate the deployment against current network state.
pub async fn estimate_gas<R: ChainRpc>(
    rpc: &R,
    tx: &UnsignedDeploymentTransaction,
) -> Result<GasEstimate> {
    tracing::info!(init_code_len = tx.init_code().len(), "Estimating gas...");

    let units = rpc
        .estimate_gas(&tx.call_request())
        .await
        .map_err(|e| DeployError::from_rpc(e, DeployError::Simulation))?;

    // Contract creation alone costs more than a plain transfer.
    if units <= TX_BASE_GAS {
        return Err(DeployError::Simulation(format!(
            "estimate of {units} gas is not above the {TX_BASE_GAS} base cost"
        )));
    }

    tracing::info!(gas = units, "Estimated deployment gas");

    Ok(GasEstimate(units))
}
