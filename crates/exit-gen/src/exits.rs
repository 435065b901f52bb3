//! Voluntary exit generation
//!
//! Drives one run: resolve chain context and keys, then for each key resolve
//! its validator index, have the signer sign the exit, write the signed exit
//! to disk and optionally verify it. Keys are handled one at a time, in order.

use crate::beacon_client::{BeaconClient, BeaconClientError};
use crate::signer_client::{SignerClient, SignerClientError};
use crate::types::{ChainContext, SignedVoluntaryExit, SigningRequest};
use crate::verifier::Verifier;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

/// Token that selects every key held by the signer
pub const AUTO_KEYS: &str = "auto";

/// Errors that abort a run
#[derive(Debug, Error)]
pub enum ExitError {
    #[error("Beacon node error: {0}")]
    Beacon(#[from] BeaconClientError),

    #[error("Signer error: {0}")]
    Signer(#[from] SignerClientError),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Which public keys to produce exits for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySelection {
    /// Every key the signer holds
    Auto,
    /// The given keys, in order
    Explicit(Vec<String>),
}

impl KeySelection {
    /// Interpret positional arguments; a lone `auto` selects all signer keys
    #[must_use]
    pub fn from_args(args: Vec<String>) -> Self {
        match args.as_slice() {
            [only] if only == AUTO_KEYS => Self::Auto,
            _ => Self::Explicit(args),
        }
    }
}

/// File name of the signed exit for a validator
#[must_use]
pub fn exit_filename(validator_index: u64, pubkey: &str) -> String {
    format!("{validator_index}-{pubkey}.json")
}

/// Whether `pubkey` is safe to embed in a request path and a file name
///
/// Keys are otherwise used verbatim; only path separators are refused so a
/// key can never address another endpoint or a file outside the output
/// directory.
#[must_use]
pub fn is_usable_pubkey(pubkey: &str) -> bool {
    !pubkey.is_empty() && !pubkey.contains(['/', '\\'])
}

/// Result of processing a single key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitOutcome {
    /// Signed exit written to `path`
    Written {
        path: PathBuf,
        validator_index: u64,
        /// `None` when verification was not requested
        verified: Option<bool>,
    },
    /// The key was unusable or no validator index could be resolved for it
    Skipped { pubkey: String },
}

/// What a run produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Signed exit files, in processing order
    pub written: Vec<PathBuf>,
    /// Unusable keys and keys without a resolvable validator index
    pub skipped: Vec<String>,
    /// Written files the verifier rejected
    pub verification_failures: Vec<PathBuf>,
}

impl RunSummary {
    fn record(&mut self, outcome: ExitOutcome) {
        match outcome {
            ExitOutcome::Written { path, verified, .. } => {
                if verified == Some(false) {
                    self.verification_failures.push(path.clone());
                }
                self.written.push(path);
            }
            ExitOutcome::Skipped { pubkey } => self.skipped.push(pubkey),
        }
    }
}

/// Produces signed voluntary exits for a set of validator keys
#[derive(Debug, Clone)]
pub struct ExitGenerator {
    beacon: BeaconClient,
    signer: SignerClient,
    verifier: Option<Verifier>,
    output_dir: PathBuf,
}

impl ExitGenerator {
    /// Create a generator writing into `output_dir`, without verification
    #[must_use]
    pub fn new(beacon: BeaconClient, signer: SignerClient, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            beacon,
            signer,
            verifier: None,
            output_dir: output_dir.into(),
        }
    }

    /// Verify every written file with `verifier`
    #[must_use]
    pub fn with_verifier(mut self, verifier: Verifier) -> Self {
        self.verifier = Some(verifier);
        self
    }

    /// Turn a key selection into a concrete list of public keys
    ///
    /// # Errors
    /// Returns error if `Auto` is selected and the signer cannot list its keys
    pub async fn resolve_keys(&self, selection: KeySelection) -> Result<Vec<String>, ExitError> {
        match selection {
            KeySelection::Auto => Ok(self.signer.list_public_keys().await?),
            KeySelection::Explicit(keys) => Ok(keys),
        }
    }

    /// Run the whole flow for `selection`
    ///
    /// # Errors
    /// Returns error on any failure other than an unresolvable validator
    /// index or a rejected verification
    #[instrument(skip_all)]
    pub async fn run(&self, selection: KeySelection) -> Result<RunSummary, ExitError> {
        let context = self.beacon.get_chain_context().await?;
        info!(
            head_slot = context.head_slot,
            epoch = context.current_epoch,
            fork_version = context.fork.current_version().unwrap_or_default(),
            "Resolved chain context"
        );

        let pubkeys = self.resolve_keys(selection).await?;
        info!(count = pubkeys.len(), "Generating voluntary exits");

        std::fs::create_dir_all(&self.output_dir).map_err(|source| ExitError::Io {
            path: self.output_dir.clone(),
            source,
        })?;

        let mut summary = RunSummary::default();
        for pubkey in &pubkeys {
            let outcome = self.process_key(&context, pubkey).await?;
            summary.record(outcome);
        }

        Ok(summary)
    }

    /// Produce the signed exit for a single key
    ///
    /// # Errors
    /// Returns error if signing or writing fails; a missing validator is
    /// reported as [`ExitOutcome::Skipped`]
    #[instrument(skip(self, context))]
    pub async fn process_key(
        &self,
        context: &ChainContext,
        pubkey: &str,
    ) -> Result<ExitOutcome, ExitError> {
        if !is_usable_pubkey(pubkey) {
            warn!(pubkey, "Public key is empty or contains a path separator, skipping");
            return Ok(ExitOutcome::Skipped {
                pubkey: pubkey.to_string(),
            });
        }

        let validator_index = match self.beacon.get_validator_index(pubkey).await {
            Ok(index) => index,
            Err(BeaconClientError::ValidatorUnavailable { status, .. }) => {
                warn!(pubkey, %status, "Could not get validator index, skipping");
                return Ok(ExitOutcome::Skipped {
                    pubkey: pubkey.to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        let message = context.voluntary_exit(validator_index);
        let request = SigningRequest::voluntary_exit(context.fork_info(), message);
        let signature = self.signer.sign(pubkey, &request).await?;

        let signed = SignedVoluntaryExit { message, signature };
        let path = self.write_signed_exit(&signed, pubkey)?;
        info!(validator_index, file = %path.display(), "Wrote signed exit");

        let verified = match &self.verifier {
            None => None,
            Some(verifier) => match verifier.verify(&path).await {
                Ok(()) => {
                    info!(validator_index, file = %path.display(), "Verified signed exit");
                    Some(true)
                }
                Err(e) => {
                    error!(
                        pubkey,
                        file = %path.display(),
                        error = %e,
                        "Verification of signed exit failed"
                    );
                    Some(false)
                }
            },
        };

        Ok(ExitOutcome::Written {
            path,
            validator_index,
            verified,
        })
    }

    fn write_signed_exit(
        &self,
        signed: &SignedVoluntaryExit,
        pubkey: &str,
    ) -> Result<PathBuf, ExitError> {
        let path = self
            .output_dir
            .join(exit_filename(signed.message.validator_index, pubkey));
        let json = serde_json::to_string_pretty(signed)?;

        std::fs::write(&path, json).map_err(|source| ExitError::Io {
            path: path.clone(),
            source,
        })?;

        Ok(path)
    }
}
