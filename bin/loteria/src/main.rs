//! loteria deploys the Worldcoin lottery contract in a single run.

mod cli;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use cli::Cli;
use loteria_deploy::{ContractArtifact, DeployConfig, DeployError, DeploymentPipeline, HttpRpc};

#[tokio::main]
async fn main() -> ExitCode {
    // Load `.env` before parsing so `PRIVATE_KEY` can come from it.
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    // Initialize the logger.
    tracing_subscriber::fmt()
        .with_max_level(cli.verbosity)
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let (code, message) = failure_report(&err);
            tracing::error!(error = ?err, "Deployment failed");
            // Printed unconditionally so the reason survives `--verbosity off`.
            eprintln!("{message}");
            ExitCode::from(code)
        }
    }
}

/// Exit code and operator-facing message for a failed run.
fn failure_report(err: &anyhow::Error) -> (u8, String) {
    match err.downcast_ref::<DeployError>() {
        Some(deploy_err) => (
            deploy_err.exit_code(),
            format!("Error: {deploy_err}\nHint: {}", deploy_err.hint()),
        ),
        None => (1, format!("Error: {err:#}")),
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = cli.apply(DeployConfig::load(cli.config.as_deref())?)?;

    let artifact = ContractArtifact::load(&config.artifact)?;
    tracing::info!(
        artifact = %config.artifact.display(),
        contract = artifact.name.as_deref().unwrap_or("<unnamed>"),
        bytecode_len = artifact.bytecode.len(),
        "Loaded contract artifact"
    );

    let rpc = HttpRpc::new(config.rpc_url.clone())
        .map_err(|e| DeployError::Configuration(e.to_string()))?;
    tracing::info!(rpc_url = %rpc.url(), chain_id = config.chain_id, "Connecting to network");

    let pipeline = DeploymentPipeline::new(rpc, config);
    let prepared = pipeline.prepare(&artifact.bytecode).await?;

    if cli.estimate_only {
        println!("Deployer:       {}", prepared.signer.address());
        println!("Gas price:      {} gwei", prepared.fee.gwei());
        println!("Estimated gas:  {}", prepared.gas);
        println!("Max cost:       {} ETH", prepared.max_cost_ether());
        return Ok(());
    }

    let report = pipeline
        .commit(prepared)
        .await
        .context("Deployment did not complete")?;

    println!("Deployer:       {}", report.deployer);
    println!("Transaction:    {}", report.submitted.hash);
    println!("Block:          {}", report.contract.block_number);
    println!("Gas used:       {}", report.contract.gas_used);
    println!("Contract:       {}", report.contract.address);

    Ok(())
}
