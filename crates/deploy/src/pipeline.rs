//! Deployment execution engine.
//!
//! The stage order is fixed: Signer -> Fee -> Gas -> Submit -> Confirm.
//! [`DeploymentPipeline::prepare`] runs the first three stages and spends nothing;
//! [`DeploymentPipeline::commit`] broadcasts and waits.

use alloy_core::primitives::{Address, Bytes, U256, utils::format_ether};

use crate::{
    config::DeployConfig,
    error::Result,
    rpc::ChainRpc,
    signer::{Signer, resolve_signer},
    stages::{
        ConfirmationOptions, DeployedContract, FeeEstimate, GasEstimate, SubmittedTransaction,
        build_deployment, estimate_gas, query_fee, submit_deployment, wait_for_confirmation,
    },
    tx::{ConstructorArgs, UnsignedDeploymentTransaction},
};

/// Output of the side-effect-free half of the pipeline.
#[derive(Debug)]
pub struct PreparedDeployment {
    pub signer: Signer,
    pub fee: FeeEstimate,
    pub tx: UnsignedDeploymentTransaction,
    pub gas: GasEstimate,
}

impl PreparedDeployment {
    /// Upper bound on what the deployment can cost, in wei.
    pub fn max_cost(&self) -> U256 {
        U256::from(self.fee.gas_price) * U256::from(self.gas.units())
    }

    /// [`Self::max_cost`] in ether.
    pub fn max_cost_ether(&self) -> String {
        format_ether(self.max_cost())
    }
}

/// Everything observed during a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentReport {
    pub deployer: Address,
    pub fee: FeeEstimate,
    pub gas: GasEstimate,
    pub submitted: SubmittedTransaction,
    pub contract: DeployedContract,
}

/// Runs one deployment against a network session.
pub struct DeploymentPipeline<R> {
    rpc: R,
    config: DeployConfig,
}

impl<R: ChainRpc> DeploymentPipeline<R> {
    pub fn new(rpc: R, config: DeployConfig) -> Self {
        Self { rpc, config }
    }

    pub fn rpc(&self) -> &R {
        &self.rpc
    }

    /// Resolve the signer, query fees and estimate gas for deploying `bytecode`.
    pub async fn prepare(&self, bytecode: &Bytes) -> Result<PreparedDeployment> {
        self.config.validate()?;
        // Malformed constructor input must fail before the first network call.
        let args = ConstructorArgs::parse(&self.config.token_address)?;

        let signer = resolve_signer(&self.config.signer_config(), &self.rpc).await?;
        let fee = query_fee(&self.rpc).await?;
        let tx = build_deployment(signer.address(), bytecode, &args)?;
        let gas = estimate_gas(&self.rpc, &tx).await?;

        Ok(PreparedDeployment {
            signer,
            fee,
            tx,
            gas,
        })
    }

    /// Broadcast a prepared deployment and wait for it to be confirmed.
    pub async fn commit(&self, prepared: PreparedDeployment) -> Result<DeploymentReport> {
        let PreparedDeployment {
            signer,
            fee,
            tx,
            gas,
        } = prepared;

        let submitted = submit_deployment(&self.rpc, &signer, tx, gas, fee).await?;

        let options = ConfirmationOptions {
            confirmations: self.config.confirmations,
            poll_interval: self.config.poll_interval(),
        };
        let contract = wait_for_confirmation(&self.rpc, &submitted, options).await?;

        Ok(DeploymentReport {
            deployer: signer.address(),
            fee,
            gas,
            submitted,
            contract,
        })
    }

    /// Run all five stages.
    pub async fn run(&self, bytecode: &Bytes) -> Result<DeploymentReport> {
        let prepared = self.prepare(bytecode).await?;
        self.commit(prepared).await
    }
}
