use std::fmt;
use std::path::PathBuf;

/// Errors from interaction with the external verification backend.
#[derive(Debug)]
pub enum VerifierError {
    /// Verifier binary not found at the specified path.
    NotFound(PathBuf),
    /// Process failed to start or crashed.
    ProcessError(String),
    /// Failed to make sense of the verifier's output.
    ParseError(String),
    /// Verification time limit exceeded.
    Timeout,
}

impl fmt::Display for VerifierError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerifierError::NotFound(path) => {
                write!(f, "verifier binary not found at: {}", path.display())
            }
            VerifierError::ProcessError(msg) => write!(f, "verifier process error: {msg}"),
            VerifierError::ParseError(msg) => {
                write!(f, "failed to parse verifier output: {msg}")
            }
            VerifierError::Timeout => write!(f, "verification time limit exceeded"),
        }
    }
}

impl std::error::Error for VerifierError {}

impl PartialEq for VerifierError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (VerifierError::NotFound(a), VerifierError::NotFound(b)) => a == b,
            (VerifierError::ProcessError(a), VerifierError::ProcessError(b)) => a == b,
            (VerifierError::ParseError(a), VerifierError::ParseError(b)) => a == b,
            (VerifierError::Timeout, VerifierError::Timeout) => true,
            _ => false,
        }
    }
}
