//! Loading compiled contract bytecode from build artifacts.

use std::path::Path;

use alloy_core::primitives::Bytes;
use serde::Deserialize;

use crate::error::{DeployError, Result};

/// Creation bytecode read from a compiler artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractArtifact {
    /// Contract name, when the artifact records one.
    pub name: Option<String>,
    /// Creation (init) bytecode, without constructor arguments.
    pub bytecode: Bytes,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArtifact {
    #[serde(default)]
    contract_name: Option<String>,
    bytecode: RawBytecode,
}

/// Hardhat stores a hex string; Foundry nests it under `object`.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawBytecode {
    Hex(String),
    Object { object: String },
}

impl ContractArtifact {
    /// Read a Hardhat or Foundry artifact from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DeployError::Configuration(format!("Failed to read artifact {}: {e}", path.display()))
        })?;
        Self::parse(&content).map_err(|e| match e {
            DeployError::Configuration(msg) => {
                DeployError::Configuration(format!("{}: {msg}", path.display()))
            }
            other => other,
        })
    }

    /// Parse artifact JSON.
    pub fn parse(content: &str) -> Result<Self> {
        let raw: RawArtifact = serde_json::from_str(content)
            .map_err(|e| DeployError::Configuration(format!("Failed to parse artifact: {e}")))?;

        let hex_code = match &raw.bytecode {
            RawBytecode::Hex(code) => code,
            RawBytecode::Object { object } => object,
        };
        let hex_code = hex_code.strip_prefix("0x").unwrap_or(hex_code);

        // Unlinked library placeholders look like `__$...$__` and are not hex.
        if hex_code.contains("__") {
            return Err(DeployError::Configuration(
                "artifact bytecode has unlinked library references".to_string(),
            ));
        }

        let bytecode = hex::decode(hex_code)
            .map_err(|e| DeployError::Configuration(format!("artifact bytecode is not hex: {e}")))?;

        if bytecode.is_empty() {
            return Err(DeployError::Configuration(
                "artifact has no creation bytecode (abstract contract or interface?)".to_string(),
            ));
        }

        Ok(Self {
            name: raw.contract_name,
            bytecode: Bytes::from(bytecode),
        })
    }
}
