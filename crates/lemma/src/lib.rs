//! # veriloc-lemma
//!
//! Serialization of entailment obligations into checkable lemma
//! declarations. Each obligation becomes a `lemma check_<i>` whose requires
//! clauses are the obligation's facts, whose ensures clauses are its goals,
//! and whose body replays the registered discharge statements. The rendered
//! block is spliced into the source file right after the member under
//! analysis, and the backend's failure report refers back to obligations by
//! the `check_<i>` name alone.

pub mod lemma;
pub mod printer;
pub mod script;

pub use lemma::LemmaDecl;
pub use printer::{render_expr, render_rhs, render_stmt};
pub use script::LemmaScript;
