//! # Exit Generation Library
//!
//! Produces signed voluntary exits for validators whose keys live in a
//! Web3Signer instance:
//! - chain context (fork, genesis validators root, epoch) from a beacon node
//! - signatures from Web3Signer
//! - optional verification of each written file by an external tool

pub mod beacon_client;
pub mod exits;
pub mod signer_client;
pub mod types;
pub mod verifier;

pub use beacon_client::BeaconClient;
pub use exits::{ExitGenerator, ExitOutcome, KeySelection, RunSummary};
pub use signer_client::SignerClient;
pub use types::*;
pub use verifier::Verifier;
