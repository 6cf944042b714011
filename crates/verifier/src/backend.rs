//! Abstraction over verification backends.
//!
//! The pipeline and the repair loop talk to a [`VerifierBackend`] trait
//! object, so tests and drivers can swap the real subprocess client for a
//! scripted stub without touching the orchestration code.

use std::path::Path;
use std::sync::Mutex;

use crate::error::VerifierError;
use crate::outcome::VerificationOutcome;
use crate::runner::CliVerifier;

/// A verification backend: give it a file, get back what failed.
pub trait VerifierBackend {
    fn verify_file(&self, file: &Path) -> Result<VerificationOutcome, VerifierError>;
}

impl VerifierBackend for CliVerifier {
    fn verify_file(&self, file: &Path) -> Result<VerificationOutcome, VerifierError> {
        CliVerifier::verify_file(self, file)
    }
}

/// Create the default backend: the auto-detected subprocess verifier.
pub fn create_default_backend() -> Result<Box<dyn VerifierBackend>, VerifierError> {
    let verifier = CliVerifier::with_default_config()?;
    tracing::debug!(config = %verifier.config(), "using subprocess verifier backend");
    Ok(Box::new(verifier))
}

/// Scripted backend for tests: returns pre-seeded outcomes in order, then
/// repeats the last one.
#[derive(Debug, Default)]
pub struct StaticOutcomeBackend {
    outcomes: Mutex<Vec<VerificationOutcome>>,
    cursor: Mutex<usize>,
}

impl StaticOutcomeBackend {
    pub fn new(outcomes: Vec<VerificationOutcome>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes),
            cursor: Mutex::new(0),
        }
    }

    /// Number of verification calls made so far.
    pub fn calls(&self) -> usize {
        *self.cursor.lock().unwrap()
    }
}

impl VerifierBackend for StaticOutcomeBackend {
    fn verify_file(&self, _file: &Path) -> Result<VerificationOutcome, VerifierError> {
        let outcomes = self.outcomes.lock().unwrap();
        let mut cursor = self.cursor.lock().unwrap();
        let idx = (*cursor).min(outcomes.len().saturating_sub(1));
        *cursor += 1;
        outcomes
            .get(idx)
            .cloned()
            .ok_or_else(|| VerifierError::ProcessError("no scripted outcome".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_backend_plays_outcomes_in_order() {
        let backend = StaticOutcomeBackend::new(vec![
            VerificationOutcome {
                failed: vec!["check_0".into()],
                error_count: 1,
            },
            VerificationOutcome::verified(),
        ]);
        let first = backend.verify_file(Path::new("a.dfy")).unwrap();
        assert!(!first.is_fully_verified());
        let second = backend.verify_file(Path::new("a.dfy")).unwrap();
        assert!(second.is_fully_verified());
        // Exhausted scripts repeat the last outcome.
        let third = backend.verify_file(Path::new("a.dfy")).unwrap();
        assert!(third.is_fully_verified());
        assert_eq!(backend.calls(), 3);
    }

    #[test]
    fn empty_script_is_an_error() {
        let backend = StaticOutcomeBackend::new(vec![]);
        assert!(backend.verify_file(Path::new("a.dfy")).is_err());
    }
}
