//! # veriloc-driver
//!
//! Orchestration around the localization core: the per-member pipeline
//! (walk → lemmas → backend → suspicious lines), the candidate-driven
//! repair loop, mutation-based dataset generation, and artifact output.
//!
//! The binary (`veriloc`) is a thin wrapper over these modules; everything
//! here is usable as a library, with the verification backend and the
//! repair candidate source injected as trait objects.

pub mod candidate;
pub mod dataset;
pub mod error;
pub mod localize_run;
pub mod mutate;
pub mod output;
pub mod parallel;
pub mod patch;
pub mod repair;

pub use candidate::{CandidateSource, HttpCandidateSource, StaticCandidateSource};
pub use error::DriverError;
pub use localize_run::{failing_members, localize_member, localize_members, LocalizeReport};
pub use mutate::{mutate_method, Mutation, MutationKind};
pub use patch::{mark_buggy_line, replace_line, RangeError, BUGGY_MARKER};
pub use repair::{repair_member, CancelFlag, LineRepair, MemberRepair, RepairConfig};
