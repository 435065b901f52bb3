//! Web3Signer HTTP Client
//!
//! Lists the keys held by a remote signer and requests voluntary exit
//! signatures from it.

use crate::types::SigningRequest;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument};

/// Errors from signer API operations
#[derive(Debug, Error)]
pub enum SignerClientError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Unexpected status {status} from {url}")]
    UnexpectedStatus { url: String, status: StatusCode },
}

/// Client for the Web3Signer eth2 API
#[derive(Debug, Clone)]
pub struct SignerClient {
    client: Client,
    base_url: String,
}

impl SignerClient {
    /// Create a new signer client
    ///
    /// # Arguments
    /// * `base_url` - Base URL of Web3Signer (e.g., `http://localhost:9000`)
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Fetch every BLS public key the signer holds
    ///
    /// # Errors
    /// Returns error if the request fails or the body is not a list of strings
    #[instrument(skip(self))]
    pub async fn list_public_keys(&self) -> Result<Vec<String>, SignerClientError> {
        let url = format!("{}/api/v1/eth2/publicKeys", self.base_url);

        let response = self.client.get(&url).send().await?;
        let response = check_status(&url, response)?;

        let keys: Vec<String> = response.json().await?;
        debug!(count = keys.len(), "Fetched signer public keys");
        Ok(keys)
    }

    /// Ask the signer to sign `request` with the key `pubkey`
    ///
    /// Returns the hex-encoded BLS signature.
    ///
    /// # Errors
    /// Returns error if the request fails, the signer refuses, or the
    /// response has no `signature` field
    #[instrument(skip(self, request), fields(validator_index = request.voluntary_exit.validator_index))]
    pub async fn sign(
        &self,
        pubkey: &str,
        request: &SigningRequest,
    ) -> Result<String, SignerClientError> {
        let url = format!("{}/api/v1/eth2/sign/{pubkey}", self.base_url);

        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .json(request)
            .send()
            .await?;
        let response = check_status(&url, response)?;

        #[derive(Deserialize)]
        struct SignResponse {
            signature: String,
        }

        let resp: SignResponse = response.json().await?;
        Ok(resp.signature)
    }
}

fn check_status(
    url: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response, SignerClientError> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(SignerClientError::UnexpectedStatus {
            url: url.to_string(),
            status: response.status(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unexpected_status_message() {
        let err = SignerClientError::UnexpectedStatus {
            url: "http://127.0.0.1:9000/api/v1/eth2/sign/0xaa".to_string(),
            status: StatusCode::PRECONDITION_FAILED,
        };
        assert_eq!(
            err.to_string(),
            "Unexpected status 412 Precondition Failed from http://127.0.0.1:9000/api/v1/eth2/sign/0xaa"
        );
    }
}
