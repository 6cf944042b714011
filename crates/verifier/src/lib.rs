//! # veriloc-verifier
//!
//! Client for the external verification backend. The backend is spawned as
//! a subprocess on a source file containing the member under analysis plus
//! the generated `check_<i>` lemmas; its console output is parsed into the
//! set of failing declaration names and an error count.
//!
//! ## Usage
//!
//! ```no_run
//! use veriloc_verifier::{CliVerifier, VerifierBackend};
//!
//! let verifier = CliVerifier::with_default_config().unwrap();
//! let outcome = verifier.verify_file("check.dfy".as_ref()).unwrap();
//! if outcome.is_fully_verified() {
//!     println!("clean");
//! } else {
//!     println!("failed: {:?}", outcome.failed_checks());
//! }
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod outcome;
mod parser;
pub mod runner;

pub use backend::{create_default_backend, StaticOutcomeBackend, VerifierBackend};
pub use config::{VerifierConfig, VERIFIER_ENV};
pub use error::VerifierError;
pub use outcome::VerificationOutcome;
pub use runner::CliVerifier;
