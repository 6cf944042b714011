//! # veriloc-analysis
//!
//! Control-flow-sensitive fault localization for contract-annotated
//! programs. Given a resolved method that fails verification, the walker
//! propagates a disjunctive symbolic state through the body, emits one
//! entailment obligation per path branch at every checkpoint (loop entry,
//! loop exit, end of body), and -- once the backend reports which generated
//! lemmas failed -- maps those failures back onto suspicious source lines.
//!
//! ## Pipeline
//!
//! ```no_run
//! use veriloc_analysis::{analyze_method, localize};
//! # let program: veriloc_analysis::ast::Program = todo!();
//!
//! let method = &program.methods[0];
//! let analysis = analyze_method(&program, method);
//! // ... serialize `analysis.obligations` as `check_<i>` lemmas, verify ...
//! let failing = vec!["check_2".to_string()];
//! let suspicious_lines = localize(&analysis, &failing);
//! ```
//!
//! The AST provider, the verification backend, and the repair candidate
//! source are external; this crate only reads the tree it is given.

pub mod ast;
pub mod diagnostics;
pub mod entailment;
pub mod localize;
pub mod predicate;
pub mod propagate;
pub mod subst;
pub mod walker;

pub use diagnostics::{Diagnostics, UnsupportedConstruct};
pub use entailment::{Obligation, ProofPhase};
pub use localize::{localize, parse_check_index, SuspicionSet, CHECK_PREFIX};
pub use predicate::{ConjunctiveState, DisjunctiveState, Predicate, PredicateKind};
pub use walker::{analyze_method, MemberAnalysis};
