//! The five deployment stages, in execution order.
//!
//! Signer resolution lives in [`crate::signer`]; the remaining stages are here.
//! Each stage takes the previous stage's output as a typed input and returns a
//! [`crate::DeployError`] tagged with its own kind on failure.

pub mod confirm;
pub mod fees;
pub mod gas;
pub mod submit;

pub use confirm::{ConfirmationOptions, DeployedContract, wait_for_confirmation};
pub use fees::{FeeEstimate, query_fee};
pub use gas::{GasEstimate, TX_BASE_GAS, build_deployment, estimate_gas};
pub use submit::{SubmittedTransaction, submit_deployment};
