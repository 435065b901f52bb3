//! External verification of signed exit files
//!
//! Runs `<program> exit verify --connection=<cl> --signed-operation=<file>`,
//! which is the `ethdo` command line.

use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, instrument};

/// Default verification program
pub const DEFAULT_VERIFIER: &str = "ethdo";

/// Errors from a verification run
#[derive(Debug, Error)]
pub enum VerifierError {
    #[error("Failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}")]
    Rejected { program: String, status: ExitStatus },
}

/// Runs the external verifier against signed exit files
#[derive(Debug, Clone)]
pub struct Verifier {
    program: PathBuf,
    connection: String,
}

impl Verifier {
    /// Create a verifier
    ///
    /// # Arguments
    /// * `program` - Verifier executable, looked up on `PATH` if not a path
    /// * `connection` - Consensus-layer URL passed to the verifier
    #[must_use]
    pub fn new(program: impl Into<PathBuf>, connection: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            connection: connection.into(),
        }
    }

    /// Arguments passed to the verifier for `signed_file`
    #[must_use]
    pub fn args(&self, signed_file: &Path) -> Vec<String> {
        vec![
            "exit".to_string(),
            "verify".to_string(),
            format!("--connection={}", self.connection),
            format!("--signed-operation={}", signed_file.display()),
        ]
    }

    /// Verify one signed exit file
    ///
    /// # Errors
    /// Returns error if the program cannot be started or exits non-zero
    #[instrument(skip(self), fields(program = %self.program.display()))]
    pub async fn verify(&self, signed_file: &Path) -> Result<(), VerifierError> {
        let program = self.program.display().to_string();

        let status = Command::new(&self.program)
            .args(self.args(signed_file))
            .status()
            .await
            .map_err(|source| VerifierError::Launch {
                program: program.clone(),
                source,
            })?;

        if !status.success() {
            return Err(VerifierError::Rejected { program, status });
        }

        debug!(file = %signed_file.display(), "Verification passed");
        Ok(())
    }
}
