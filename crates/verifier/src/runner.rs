//! Spawns the external verifier on a file and classifies its output.

use std::path::Path;
use std::process::Command;

use crate::config::VerifierConfig;
use crate::error::VerifierError;
use crate::outcome::VerificationOutcome;
use crate::parser::parse_verifier_output;

/// Subprocess-based verifier client.
#[derive(Debug)]
pub struct CliVerifier {
    config: VerifierConfig,
}

impl CliVerifier {
    pub fn new(config: VerifierConfig) -> Self {
        Self { config }
    }

    /// Create a verifier with an auto-detected binary and default settings.
    pub fn with_default_config() -> Result<Self, VerifierError> {
        let config = VerifierConfig::auto_detect()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Run the backend on one file and collect the outcome.
    ///
    /// A long-running call by design; the orchestration loop treats it as a
    /// blocking suspension point and never overlaps two submissions.
    pub fn verify_file(&self, file: &Path) -> Result<VerificationOutcome, VerifierError> {
        self.config.validate()?;
        let args = self.config.args_for(file);
        tracing::debug!(binary = %self.config.binary.display(), ?args, "invoking verifier");

        let output = Command::new(&self.config.binary)
            .args(&args)
            .output()
            .map_err(|e| {
                VerifierError::ProcessError(format!("failed to start verifier: {e}"))
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let outcome = parse_verifier_output(&stdout, &stderr)?;
        tracing::info!(
            file = %file.display(),
            failed = outcome.failed.len(),
            errors = outcome.error_count,
            "verification finished"
        );
        Ok(outcome)
    }
}
