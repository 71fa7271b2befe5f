//! Pipeline tests for loteria-deploy.
//!
//! These tests drive the full deployment pipeline against an in-memory chain that
//! mines one block per receipt poll. No network access is required.
//! Run with: cargo test --test pipeline_test

use std::{
    collections::HashMap,
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use alloy_core::primitives::{Address, B256, Bytes, U64, U256, keccak256};
use loteria_deploy::{
    CallRequest, ChainRpc, DeployConfig, DeployError, DeploymentPipeline, PrivateKey, RpcError,
    Signer, TX_BASE_GAS, TransactionReceipt,
};
use rand::Rng;

/// First default Anvil/Hardhat development account.
const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
const TOKEN: &str = "0x2cfc85d8e48f8eab294be644d9e25c3030863003";
const CHAIN_ID: u64 = 480;
const DEFAULT_ESTIMATE: u64 = 1_250_000;

/// Initialize tracing for tests (idempotent).
fn init_test_tracing() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_test_writer()
        .try_init()
        .ok();
}

struct PendingTx {
    contract_address: Address,
    polls_until_mined: u32,
}

#[derive(Default)]
struct MockState {
    block: u64,
    nonces: HashMap<Address, u64>,
    pending: HashMap<B256, PendingTx>,
    receipts: HashMap<B256, TransactionReceipt>,
}

/// In-memory chain with knobs for each failure mode.
struct MockChain {
    chain_id: u64,
    sender: Address,
    gas_price: Result<Option<U256>, RpcError>,
    estimate: Result<u64, RpcError>,
    broadcast_error: Option<RpcError>,
    revert_on_chain: bool,
    receipt_error: Option<RpcError>,
    calls: AtomicUsize,
    broadcasts: AtomicUsize,
    state: Mutex<MockState>,
}

impl MockChain {
    fn new(sender: Address) -> Self {
        Self {
            chain_id: CHAIN_ID,
            sender,
            gas_price: Ok(Some(U256::from(1_000_000_000u64))),
            estimate: Ok(DEFAULT_ESTIMATE),
            broadcast_error: None,
            revert_on_chain: false,
            receipt_error: None,
            calls: AtomicUsize::new(0),
            broadcasts: AtomicUsize::new(0),
            state: Mutex::new(MockState {
                block: 100,
                ..Default::default()
            }),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn broadcasts(&self) -> usize {
        self.broadcasts.load(Ordering::SeqCst)
    }

    fn touch(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

impl ChainRpc for MockChain {
    async fn chain_id(&self) -> Result<u64, RpcError> {
        self.touch();
        Ok(self.chain_id)
    }

    async fn gas_price(&self) -> Result<Option<U256>, RpcError> {
        self.touch();
        self.gas_price.clone()
    }

    async fn estimate_gas(&self, request: &CallRequest) -> Result<u64, RpcError> {
        self.touch();
        assert!(request.to.is_none(), "deployment must not have a recipient");
        assert_eq!(request.from, self.sender);
        self.estimate.clone()
    }

    async fn transaction_count(&self, address: Address) -> Result<u64, RpcError> {
        self.touch();
        let state = self.state.lock().unwrap();
        Ok(state.nonces.get(&address).copied().unwrap_or_default())
    }

    async fn send_raw_transaction(&self, raw: &Bytes) -> Result<B256, RpcError> {
        self.touch();
        self.broadcasts.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = &self.broadcast_error {
            return Err(err.clone());
        }

        let hash = keccak256(raw);
        let mut state = self.state.lock().unwrap();
        let nonce = state.nonces.entry(self.sender).or_default();
        let contract_address = self.sender.create(*nonce);
        *nonce += 1;
        state.pending.insert(
            hash,
            PendingTx {
                contract_address,
                polls_until_mined: 1,
            },
        );
        Ok(hash)
    }

    async fn transaction_receipt(&self, hash: B256) -> Result<Option<TransactionReceipt>, RpcError> {
        self.touch();
        if let Some(err) = &self.receipt_error {
            return Err(err.clone());
        }
        let mut state = self.state.lock().unwrap();
        if let Some(receipt) = state.receipts.get(&hash) {
            return Ok(Some(receipt.clone()));
        }

        let Some(pending) = state.pending.get_mut(&hash) else {
            return Ok(None);
        };
        if pending.polls_until_mined > 0 {
            pending.polls_until_mined -= 1;
            state.block += 1;
            return Ok(None);
        }

        let contract_address = pending.contract_address;
        state.pending.remove(&hash);
        let receipt = TransactionReceipt {
            transaction_hash: hash,
            block_number: Some(U64::from(state.block)),
            contract_address: (!self.revert_on_chain).then_some(contract_address),
            status: Some(U64::from(u64::from(!self.revert_on_chain))),
            gas_used: U64::from(DEFAULT_ESTIMATE - 50_000),
        };
        state.receipts.insert(hash, receipt.clone());
        Ok(Some(receipt))
    }

    async fn block_number(&self) -> Result<u64, RpcError> {
        self.touch();
        let mut state = self.state.lock().unwrap();
        state.block += 1;
        Ok(state.block)
    }
}

fn test_config(key: &str) -> DeployConfig {
    DeployConfig {
        chain_id: CHAIN_ID,
        private_key: Some(PrivateKey::new(key)),
        token_address: TOKEN.to_string(),
        poll_interval_ms: 1,
        ..Default::default()
    }
}

fn dev_address() -> Address {
    Signer::from_private_key(&PrivateKey::new(DEV_KEY), CHAIN_ID)
        .unwrap()
        .address()
}

fn bytecode() -> Bytes {
    Bytes::from(vec![0x60, 0x80, 0x60, 0x40, 0x52, 0x34, 0x80, 0x15])
}

fn is_well_formed_address(rendered: &str) -> bool {
    rendered.len() == 42
        && rendered.starts_with("0x")
        && rendered[2..].chars().all(|c| c.is_ascii_hexdigit())
}

#[tokio::test]
async fn test_successful_deployment() {
    init_test_tracing();
    let chain = MockChain::new(dev_address());
    let pipeline = DeploymentPipeline::new(chain, test_config(DEV_KEY));

    let report = pipeline.run(&bytecode()).await.unwrap();

    assert_eq!(report.deployer, dev_address());
    assert!(report.gas.units() > TX_BASE_GAS);
    assert_eq!(report.gas.units(), DEFAULT_ESTIMATE);
    assert_eq!(report.contract.address, dev_address().create(0));
    assert_eq!(report.contract.address, report.submitted.expected_address);
    assert_eq!(report.contract.tx_hash, report.submitted.hash);
    assert!(is_well_formed_address(&report.contract.address.to_string()));
    assert_eq!(pipeline.rpc().broadcasts(), 1);
}

#[tokio::test]
async fn test_zero_gas_price_aborts_before_broadcast() {
    init_test_tracing();
    let mut chain = MockChain::new(dev_address());
    chain.gas_price = Ok(Some(U256::ZERO));
    let pipeline = DeploymentPipeline::new(chain, test_config(DEV_KEY));

    let err = pipeline.run(&bytecode()).await.unwrap_err();

    assert!(matches!(err, DeployError::NetworkUnavailable(_)));
    assert_ne!(err.exit_code(), 0);
    assert_eq!(pipeline.rpc().broadcasts(), 0);
}

#[tokio::test]
async fn test_null_gas_price_aborts_before_broadcast() {
    let mut chain = MockChain::new(dev_address());
    chain.gas_price = Ok(None);
    let pipeline = DeploymentPipeline::new(chain, test_config(DEV_KEY));

    let err = pipeline.run(&bytecode()).await.unwrap_err();

    assert!(matches!(err, DeployError::NetworkUnavailable(_)));
    assert_eq!(pipeline.rpc().broadcasts(), 0);
}

#[tokio::test]
async fn test_unreachable_fee_oracle_aborts_before_broadcast() {
    let mut chain = MockChain::new(dev_address());
    chain.gas_price = Err(RpcError::Transport("connection refused".to_string()));
    let pipeline = DeploymentPipeline::new(chain, test_config(DEV_KEY));

    let err = pipeline.run(&bytecode()).await.unwrap_err();

    assert!(matches!(err, DeployError::NetworkUnavailable(_)));
    assert_eq!(err.exit_code(), 3);
    assert_eq!(pipeline.rpc().broadcasts(), 0);
}

#[tokio::test]
async fn test_simulated_revert_prevents_submission() {
    let mut chain = MockChain::new(dev_address());
    chain.estimate = Err(RpcError::Response {
        code: 3,
        message: "execution reverted: invalid token".to_string(),
    });
    let pipeline = DeploymentPipeline::new(chain, test_config(DEV_KEY));

    let err = pipeline.run(&bytecode()).await.unwrap_err();

    match &err {
        DeployError::Simulation(msg) => assert!(msg.contains("execution reverted")),
        other => panic!("expected simulation error, got {other:?}"),
    }
    assert_eq!(pipeline.rpc().broadcasts(), 0);
}

#[tokio::test]
async fn test_trivial_gas_estimate_is_rejected() {
    let mut chain = MockChain::new(dev_address());
    chain.estimate = Ok(TX_BASE_GAS);
    let pipeline = DeploymentPipeline::new(chain, test_config(DEV_KEY));

    let err = pipeline.run(&bytecode()).await.unwrap_err();

    assert!(matches!(err, DeployError::Simulation(_)));
    assert_eq!(pipeline.rpc().broadcasts(), 0);
}

#[tokio::test]
async fn test_rejected_broadcast_produces_no_contract() {
    let mut chain = MockChain::new(dev_address());
    chain.broadcast_error = Some(RpcError::Response {
        code: -32000,
        message: "insufficient funds for gas * price + value".to_string(),
    });
    let pipeline = DeploymentPipeline::new(chain, test_config(DEV_KEY));

    let err = pipeline.run(&bytecode()).await.unwrap_err();

    match &err {
        DeployError::Submission(msg) => assert!(msg.contains("insufficient funds")),
        other => panic!("expected submission error, got {other:?}"),
    }
    assert_ne!(err.exit_code(), 0);
    assert_eq!(pipeline.rpc().broadcasts(), 1);
    assert!(pipeline.rpc().state.lock().unwrap().receipts.is_empty());
}

#[tokio::test]
async fn test_two_runs_are_independent() {
    let chain = MockChain::new(dev_address());
    let pipeline = DeploymentPipeline::new(chain, test_config(DEV_KEY));

    let first = pipeline.run(&bytecode()).await.unwrap();
    let second = pipeline.run(&bytecode()).await.unwrap();

    assert_ne!(first.submitted.hash, second.submitted.hash);
    assert_ne!(first.contract.address, second.contract.address);
    assert_eq!(first.submitted.nonce + 1, second.submitted.nonce);
    assert_eq!(pipeline.rpc().broadcasts(), 2);
}

#[tokio::test]
async fn test_random_deployer_key() {
    let key = loop {
        let bytes: [u8; 32] = rand::rng().random();
        if bytes.iter().any(|b| *b != 0) {
            break format!("0x{}", hex::encode(bytes));
        }
    };
    let sender = Signer::from_private_key(&PrivateKey::new(&key), CHAIN_ID)
        .unwrap()
        .address();
    let pipeline = DeploymentPipeline::new(MockChain::new(sender), test_config(&key));

    let report = pipeline.run(&bytecode()).await.unwrap();

    assert_eq!(report.deployer, sender);
    assert_eq!(report.contract.address, sender.create(0));
}

#[tokio::test]
async fn test_malformed_token_fails_before_any_network_call() {
    let chain = MockChain::new(dev_address());
    let config = DeployConfig {
        token_address: "0x2cfc85d8e48f8eab294be644d9e25c30308630".to_string(),
        ..test_config(DEV_KEY)
    };
    let pipeline = DeploymentPipeline::new(chain, config);

    let err = pipeline.run(&bytecode()).await.unwrap_err();

    assert!(matches!(err, DeployError::InvalidArgument(_)));
    assert_eq!(pipeline.rpc().calls(), 0);
}

#[tokio::test]
async fn test_missing_private_key_is_configuration_error() {
    let chain = MockChain::new(dev_address());
    let config = DeployConfig {
        private_key: None,
        ..test_config(DEV_KEY)
    };
    let pipeline = DeploymentPipeline::new(chain, config);

    let err = pipeline.run(&bytecode()).await.unwrap_err();

    assert!(matches!(err, DeployError::Configuration(_)));
    assert_eq!(err.exit_code(), 2);
    assert_eq!(pipeline.rpc().calls(), 0);
}

#[tokio::test]
async fn test_chain_id_mismatch_is_configuration_error() {
    let mut chain = MockChain::new(dev_address());
    chain.chain_id = 1;
    let pipeline = DeploymentPipeline::new(chain, test_config(DEV_KEY));

    let err = pipeline.run(&bytecode()).await.unwrap_err();

    assert!(matches!(err, DeployError::Configuration(_)));
    assert_eq!(pipeline.rpc().broadcasts(), 0);
}

#[tokio::test]
async fn test_on_chain_revert_is_confirmation_error() {
    let mut chain = MockChain::new(dev_address());
    chain.revert_on_chain = true;
    let pipeline = DeploymentPipeline::new(chain, test_config(DEV_KEY));

    let err = pipeline.run(&bytecode()).await.unwrap_err();

    match &err {
        DeployError::Confirmation { tx_hash, reason } => {
            assert!(tx_hash.starts_with("0x"));
            assert!(reason.contains("reverted"));
        }
        other => panic!("expected confirmation error, got {other:?}"),
    }
    assert_eq!(err.exit_code(), 7);
}

#[tokio::test]
async fn test_receipt_failure_reports_broadcast_hash() {
    let mut chain = MockChain::new(dev_address());
    chain.receipt_error = Some(RpcError::Transport("connection reset".to_string()));
    let pipeline = DeploymentPipeline::new(chain, test_config(DEV_KEY));

    let err = pipeline.run(&bytecode()).await.unwrap_err();

    let broadcast_hash = {
        let state = pipeline.rpc().state.lock().unwrap();
        assert_eq!(state.pending.len(), 1);
        *state.pending.keys().next().unwrap()
    };
    match &err {
        DeployError::Confirmation { tx_hash, reason } => {
            assert_eq!(*tx_hash, broadcast_hash.to_string());
            assert!(reason.contains("connection reset"));
        }
        other => panic!("expected confirmation error, got {other:?}"),
    }
    assert_eq!(pipeline.rpc().broadcasts(), 1);
}

#[tokio::test]
async fn test_waits_for_extra_confirmations() {
    let chain = MockChain::new(dev_address());
    let config = DeployConfig {
        confirmations: 3,
        ..test_config(DEV_KEY)
    };
    let pipeline = DeploymentPipeline::new(chain, config);

    let report = pipeline.run(&bytecode()).await.unwrap();

    let head = pipeline.rpc().state.lock().unwrap().block;
    assert!(head >= report.contract.block_number + 2);
}

#[tokio::test]
async fn test_prepare_spends_nothing() {
    let chain = MockChain::new(dev_address());
    let pipeline = DeploymentPipeline::new(chain, test_config(DEV_KEY));

    let prepared = pipeline.prepare(&bytecode()).await.unwrap();

    assert_eq!(prepared.gas.units(), DEFAULT_ESTIMATE);
    assert_eq!(
        prepared.max_cost(),
        U256::from(1_000_000_000u64) * U256::from(DEFAULT_ESTIMATE)
    );
    assert_eq!(pipeline.rpc().broadcasts(), 0);
}
