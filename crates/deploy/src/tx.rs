//! Deployment transaction construction and EIP-155 legacy signing.

use alloy_consensus::{TxLegacy, transaction::RlpEcdsaEncodableTx};
use alloy_core::{
    primitives::{Address, B256, Bytes, TxKind, U256},
    sol_types::SolValue,
};

use crate::{
    error::{DeployError, Result},
    rpc::CallRequest,
    signer::Signer,
};

/// Constructor arguments of the lottery contract: the token it accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstructorArgs {
    pub token: Address,
}

impl ConstructorArgs {
    /// Parse the token address (`0x` followed by 40 hex characters).
    pub fn parse(token: &str) -> Result<Self> {
        validate_address(token)?;
        let token = token
            .parse::<Address>()
            .map_err(|e| DeployError::InvalidArgument(format!("Invalid token address '{token}': {e}")))?;
        Ok(Self { token })
    }

    /// ABI encoding appended to the creation bytecode.
    pub fn abi_encode(&self) -> Vec<u8> {
        self.token.abi_encode()
    }
}

/// Validate an address format (0x-prefixed, 40 hex chars).
fn validate_address(addr: &str) -> Result<()> {
    if !addr.starts_with("0x") || addr.len() != 42 {
        return Err(DeployError::InvalidArgument(format!(
            "Invalid address format: expected 0x-prefixed 40 hex chars, got '{addr}'"
        )));
    }

    if !addr[2..].chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(DeployError::InvalidArgument(format!(
            "Invalid address: contains non-hex characters: '{addr}'"
        )));
    }

    Ok(())
}

/// Creation transaction payload before nonce, fees and signature are attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedDeploymentTransaction {
    from: Address,
    init_code: Bytes,
}

impl UnsignedDeploymentTransaction {
    /// Concatenate creation bytecode and ABI-encoded constructor arguments.
    pub fn new(from: Address, bytecode: &Bytes, args: &ConstructorArgs) -> Result<Self> {
        if bytecode.is_empty() {
            return Err(DeployError::InvalidArgument(
                "creation bytecode is empty".to_string(),
            ));
        }

        let mut init_code = bytecode.to_vec();
        init_code.extend_from_slice(&args.abi_encode());

        Ok(Self {
            from,
            init_code: Bytes::from(init_code),
        })
    }

    pub fn init_code(&self) -> &Bytes {
        &self.init_code
    }

    /// Request used to simulate the deployment.
    pub fn call_request(&self) -> CallRequest {
        CallRequest {
            from: self.from,
            to: None,
            data: self.init_code.clone(),
        }
    }

    /// Attach nonce, price and limit as a type-0 creation with EIP-155 replay protection.
    pub fn into_legacy(self, nonce: u64, gas_price: u128, gas_limit: u64, chain_id: u64) -> TxLegacy {
        TxLegacy {
            chain_id: Some(chain_id),
            nonce,
            gas_price,
            gas_limit,
            to: TxKind::Create,
            value: U256::ZERO,
            input: self.init_code,
        }
    }
}

/// Raw signed transaction and its locally computed hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    pub hash: B256,
    pub raw: Bytes,
}

impl SignedTransaction {
    /// Sign `tx` and encode it for `eth_sendRawTransaction`.
    pub fn sign(tx: TxLegacy, signer: &Signer) -> Result<Self> {
        let signed = signer.sign_legacy(tx)?;

        let mut raw = Vec::new();
        signed.tx().rlp_encode_signed(signed.signature(), &mut raw);

        Ok(Self {
            hash: *signed.hash(),
            raw: Bytes::from(raw),
        })
    }
}
