//! Beacon API HTTP Client
//!
//! Read-only queries against a consensus-layer node.

use crate::types::{ChainContext, Fork};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument};

/// Errors from beacon API operations
#[derive(Debug, Error)]
pub enum BeaconClientError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Unexpected status {status} from {url}")]
    UnexpectedStatus { url: String, status: StatusCode },

    /// The node did not return a validator record for this public key
    #[error("Could not get validator index for {pubkey}: {status}")]
    ValidatorUnavailable { pubkey: String, status: StatusCode },
}

/// Standard beacon API `{"data": ...}` envelope
#[derive(Deserialize)]
struct DataResponse<T> {
    data: T,
}

/// Client for interacting with the Beacon API
#[derive(Debug, Clone)]
pub struct BeaconClient {
    client: Client,
    base_url: String,
}

impl BeaconClient {
    /// Create a new beacon client
    ///
    /// # Arguments
    /// * `base_url` - Base URL of the beacon node (e.g., `http://localhost:5052`)
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Fetch fork data
    ///
    /// # Arguments
    /// * `state_id` - State identifier ("head", "finalized", slot number, etc.)
    ///
    /// # Errors
    /// Returns error if the request fails or the body is malformed
    #[instrument(skip(self))]
    pub async fn get_fork(&self, state_id: &str) -> Result<Fork, BeaconClientError> {
        let url = format!("{}/eth/v1/beacon/states/{state_id}/fork", self.base_url);
        let resp: DataResponse<Fork> = self.get_json(&url).await?;
        Ok(resp.data)
    }

    /// Fetch the genesis validators root
    ///
    /// # Errors
    /// Returns error if the request fails or the body is malformed
    #[instrument(skip(self))]
    pub async fn get_genesis_validators_root(&self) -> Result<String, BeaconClientError> {
        let url = format!("{}/eth/v1/beacon/genesis", self.base_url);

        #[derive(Deserialize)]
        struct GenesisData {
            genesis_validators_root: String,
        }

        let resp: DataResponse<GenesisData> = self.get_json(&url).await?;
        Ok(resp.data.genesis_validators_root)
    }

    /// Get the slot of the head block
    ///
    /// # Errors
    /// Returns error if the request fails or the slot is not a valid integer
    #[instrument(skip(self))]
    pub async fn get_head_slot(&self) -> Result<u64, BeaconClientError> {
        let url = format!("{}/eth/v2/beacon/blocks/head", self.base_url);

        #[derive(Deserialize)]
        struct SignedBlock {
            message: BlockMessage,
        }

        #[derive(Deserialize)]
        struct BlockMessage {
            slot: String,
        }

        let resp: DataResponse<SignedBlock> = self.get_json(&url).await?;
        resp.data
            .message
            .slot
            .parse()
            .map_err(|e| BeaconClientError::InvalidResponse(format!("Invalid slot: {e}")))
    }

    /// Look up a validator's index by public key at the head state
    ///
    /// # Errors
    /// Returns [`BeaconClientError::ValidatorUnavailable`] when the node
    /// answers with anything other than 200, and other variants for
    /// transport or decoding failures
    #[instrument(skip(self))]
    pub async fn get_validator_index(&self, pubkey: &str) -> Result<u64, BeaconClientError> {
        let url = format!(
            "{}/eth/v1/beacon/states/head/validators/{pubkey}",
            self.base_url
        );

        let response = self.client.get(&url).send().await?;

        if response.status() != StatusCode::OK {
            return Err(BeaconClientError::ValidatorUnavailable {
                pubkey: pubkey.to_string(),
                status: response.status(),
            });
        }

        #[derive(Deserialize)]
        struct ValidatorData {
            #[serde(with = "serde_utils::quoted_u64")]
            index: u64,
        }

        let resp: DataResponse<ValidatorData> = response.json().await?;
        debug!(index = resp.data.index, "Resolved validator index");
        Ok(resp.data.index)
    }

    /// Resolve the finalized fork, genesis validators root and head slot
    ///
    /// # Errors
    /// Returns error if any of the three requests fails
    #[instrument(skip(self))]
    pub async fn get_chain_context(&self) -> Result<ChainContext, BeaconClientError> {
        let fork = self.get_fork("finalized").await?;
        let genesis_validators_root = self.get_genesis_validators_root().await?;
        let head_slot = self.get_head_slot().await?;

        Ok(ChainContext::new(fork, genesis_validators_root, head_slot))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
    ) -> Result<T, BeaconClientError> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(BeaconClientError::UnexpectedStatus {
                url: url.to_string(),
                status: response.status(),
            });
        }

        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validator_unavailable_message() {
        let err = BeaconClientError::ValidatorUnavailable {
            pubkey: "0xaa".to_string(),
            status: StatusCode::NOT_FOUND,
        };
        assert_eq!(
            err.to_string(),
            "Could not get validator index for 0xaa: 404 Not Found"
        );
    }
}
