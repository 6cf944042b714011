//! Parallel fan-out of the pure analysis phase.
//!
//! Each member's walk owns disjoint state, so independent members can be
//! analyzed concurrently. Only the walks run in parallel -- backend
//! submissions and the repair loop stay strictly sequential.

use rayon::prelude::*;

use veriloc_analysis::ast::{Method, Program};
use veriloc_analysis::{analyze_method, MemberAnalysis};

/// Analyze all `members` in parallel, preserving input order in the result.
pub fn analyze_members_parallel(program: &Program, members: &[&Method]) -> Vec<MemberAnalysis> {
    if members.len() <= 1 {
        return members.iter().map(|m| analyze_method(program, m)).collect();
    }
    tracing::debug!(members = members.len(), "analyzing members in parallel");
    members
        .par_iter()
        .map(|m| analyze_method(program, m))
        .collect()
}
