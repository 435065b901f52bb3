//! Voluntary Exit Types
//!
//! JSON shapes shared by the beacon API, the Web3Signer signing API and the
//! signed exit files. Integers follow the beacon API convention of quoted
//! decimal strings.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Preset constants
pub mod preset {
    /// Slots per epoch on Ethereum mainnet and its public testnets
    pub const SLOTS_PER_EPOCH: u64 = 32;
}

/// Epoch containing `slot`
#[must_use]
pub const fn epoch_at_slot(slot: u64) -> u64 {
    slot / preset::SLOTS_PER_EPOCH
}

/// Fork data as reported by `/eth/v1/beacon/states/{state_id}/fork`
///
/// Held as the raw JSON object so the signer receives exactly what the node
/// sent, including fields this crate does not know about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fork(Value);

impl Fork {
    /// Wrap a fork object as returned by the beacon node
    #[must_use]
    pub fn new(raw: Value) -> Self {
        Self(raw)
    }

    /// Fork version in effect from the fork epoch onwards, if present
    #[must_use]
    pub fn current_version(&self) -> Option<&str> {
        self.0.get("current_version").and_then(Value::as_str)
    }

    /// The fork object as received
    #[must_use]
    pub fn as_json(&self) -> &Value {
        &self.0
    }
}

/// Chain identity the signer needs to compute the signing domain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForkInfo {
    pub fork: Fork,
    pub genesis_validators_root: String,
}

/// Unsigned voluntary exit message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoluntaryExit {
    /// Earliest epoch at which the exit can be processed
    #[serde(with = "serde_utils::quoted_u64")]
    pub epoch: u64,
    #[serde(with = "serde_utils::quoted_u64")]
    pub validator_index: u64,
}

/// Voluntary exit together with the validator's BLS signature
///
/// This is the content of each output file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedVoluntaryExit {
    pub message: VoluntaryExit,
    pub signature: String,
}

/// Web3Signer signing request type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SigningType {
    VoluntaryExit,
}

/// Body of `POST /api/v1/eth2/sign/{pubkey}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningRequest {
    #[serde(rename = "type")]
    pub signing_type: SigningType,
    pub fork_info: ForkInfo,
    pub voluntary_exit: VoluntaryExit,
}

impl SigningRequest {
    /// Build a voluntary exit signing request
    #[must_use]
    pub fn voluntary_exit(fork_info: ForkInfo, voluntary_exit: VoluntaryExit) -> Self {
        Self {
            signing_type: SigningType::VoluntaryExit,
            fork_info,
            voluntary_exit,
        }
    }
}

/// Chain state shared by every exit produced in one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainContext {
    /// Finalized fork
    pub fork: Fork,
    /// Genesis validators root (hex)
    pub genesis_validators_root: String,
    /// Slot of the head block
    pub head_slot: u64,
    /// Epoch of the head block, used as the exit epoch
    pub current_epoch: u64,
}

impl ChainContext {
    /// Create a context, deriving the current epoch from the head slot
    #[must_use]
    pub fn new(fork: Fork, genesis_validators_root: String, head_slot: u64) -> Self {
        Self {
            fork,
            genesis_validators_root,
            head_slot,
            current_epoch: epoch_at_slot(head_slot),
        }
    }

    /// Fork info block for signing requests
    #[must_use]
    pub fn fork_info(&self) -> ForkInfo {
        ForkInfo {
            fork: self.fork.clone(),
            genesis_validators_root: self.genesis_validators_root.clone(),
        }
    }

    /// Exit message for `validator_index` at the current epoch
    #[must_use]
    pub fn voluntary_exit(&self, validator_index: u64) -> VoluntaryExit {
        VoluntaryExit {
            epoch: self.current_epoch,
            validator_index,
        }
    }
}
