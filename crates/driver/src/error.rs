use std::fmt;

use veriloc_verifier::VerifierError;

use crate::candidate::CandidateError;
use crate::patch::RangeError;

/// Driver-level errors: everything the per-member pipeline can fail with.
#[derive(Debug)]
pub enum DriverError {
    /// Source patching hit an out-of-range coordinate.
    Range(RangeError),
    /// The verification backend could not be invoked or made sense of.
    /// Aborts the member; no partial suspicion set is emitted for it.
    Backend(VerifierError),
    /// The repair candidate source failed.
    Candidate(CandidateError),
    Io(std::io::Error),
    /// The AST provider handed over malformed JSON.
    Ast(serde_json::Error),
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriverError::Range(e) => write!(f, "source patch failed: {e}"),
            DriverError::Backend(e) => write!(f, "verification backend: {e}"),
            DriverError::Candidate(e) => write!(f, "candidate source: {e}"),
            DriverError::Io(e) => write!(f, "io: {e}"),
            DriverError::Ast(e) => write!(f, "malformed program AST: {e}"),
        }
    }
}

impl std::error::Error for DriverError {}

impl From<RangeError> for DriverError {
    fn from(e: RangeError) -> Self {
        DriverError::Range(e)
    }
}

impl From<VerifierError> for DriverError {
    fn from(e: VerifierError) -> Self {
        DriverError::Backend(e)
    }
}

impl From<CandidateError> for DriverError {
    fn from(e: CandidateError) -> Self {
        DriverError::Candidate(e)
    }
}

impl From<std::io::Error> for DriverError {
    fn from(e: std::io::Error) -> Self {
        DriverError::Io(e)
    }
}

impl From<serde_json::Error> for DriverError {
    fn from(e: serde_json::Error) -> Self {
        DriverError::Ast(e)
    }
}
