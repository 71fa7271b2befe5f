//! Fee oracle query.

use alloy_core::primitives::{U256, utils::format_units};

use crate::{
    error::{DeployError, Result},
    rpc::ChainRpc,
};

/// Network-recommended price per gas unit, in wei.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeEstimate {
    pub gas_price: u128,
}

impl FeeEstimate {
    /// Price rendered in gwei for operator output.
    pub fn gwei(&self) -> String {
        format_units(U256::from(self.gas_price), "gwei").unwrap_or_else(|_| format!("{} wei", self.gas_price))
    }
}

/// Ask the network for its current gas price.
///
/// A `null` or zero answer is treated like an unreachable endpoint: the run must not
/// fall back to a made-up price.
pub async fn query_fee<R: ChainRpc>(rpc: &R) -> Result<FeeEstimate> {
    let gas_price = rpc
        .gas_price()
        .await
        .map_err(|e| DeployError::NetworkUnavailable(format!("eth_gasPrice failed: {e}")))?
        .ok_or_else(|| DeployError::NetworkUnavailable("network returned no gas price".to_string()))?;

    if gas_price.is_zero() {
        return Err(DeployError::NetworkUnavailable(
            "network returned a zero gas price".to_string(),
        ));
    }

    if gas_price > U256::from(u128::MAX) {
        return Err(DeployError::NetworkUnavailable(format!(
            "network returned an implausible gas price: {gas_price}"
        )));
    }

    let fee = FeeEstimate {
        gas_price: gas_price.to::<u128>(),
    };
    tracing::info!(gas_price_gwei = %fee.gwei(), "Recommended gas price");

    Ok(fee)
}
