//! The per-member localization pipeline: walk the body, serialize the
//! obligations as lemmas, splice them into the source, submit to the
//! backend, and map the failures back to lines.
//!
//! Member failures are isolated: one member's backend error or patching
//! error never aborts the others.

use std::fs;
use std::path::Path;

use veriloc_analysis::ast::{Method, Program};
use veriloc_analysis::{analyze_method, localize, MemberAnalysis, SuspicionSet, UnsupportedConstruct};
use veriloc_lemma::LemmaScript;
use veriloc_verifier::{VerificationOutcome, VerifierBackend};

use crate::error::DriverError;
use crate::parallel::analyze_members_parallel;
use crate::patch::insert_at;

/// Localization result for one member.
#[derive(Debug)]
pub struct LocalizeOutcome {
    pub member: String,
    pub suspicious: std::collections::BTreeSet<u32>,
    /// Failing check names the backend reported.
    pub failed_checks: Vec<String>,
    pub obligation_count: usize,
    /// Unsupported-construct diagnostics: a non-empty list means the
    /// suspicion set is lower-confidence.
    pub diagnostics: Vec<UnsupportedConstruct>,
}

/// Whole-program localization report.
#[derive(Debug, Default)]
pub struct LocalizeReport {
    pub suspicions: SuspicionSet,
    pub outcomes: Vec<LocalizeOutcome>,
    /// Members whose pipeline failed, with the reason. No partial
    /// suspicion set is recorded for them.
    pub failures: Vec<(String, DriverError)>,
}

/// The members of `program` that the backend reported as failing.
pub fn failing_members<'a>(
    program: &'a Program,
    outcome: &VerificationOutcome,
) -> Vec<&'a Method> {
    program
        .methods
        .iter()
        .filter(|m| {
            outcome
                .failed
                .iter()
                .any(|f| f == &m.name || f.ends_with(&format!(".{}", m.name)))
        })
        .collect()
}

/// Localize one member: run the walk, then verify and map the results.
pub fn localize_member(
    program: &Program,
    method: &Method,
    source_text: &str,
    backend: &dyn VerifierBackend,
    workdir: &Path,
) -> Result<LocalizeOutcome, DriverError> {
    let analysis = analyze_method(program, method);
    verify_and_localize(method, analysis, source_text, backend, workdir)
}

/// Localize every given member. The pure walks fan out in parallel; the
/// backend submissions stay strictly sequential.
pub fn localize_members(
    program: &Program,
    members: &[&Method],
    source_text: &str,
    backend: &dyn VerifierBackend,
    workdir: &Path,
) -> LocalizeReport {
    let analyses = analyze_members_parallel(program, members);

    let mut report = LocalizeReport::default();
    for (method, analysis) in members.iter().zip(analyses) {
        match verify_and_localize(method, analysis, source_text, backend, workdir) {
            Ok(outcome) => {
                report
                    .suspicions
                    .insert(outcome.member.clone(), outcome.suspicious.clone());
                report.outcomes.push(outcome);
            }
            Err(e) => {
                tracing::warn!(member = %method.name, error = %e, "localization failed");
                report.failures.push((method.name.clone(), e));
            }
        }
    }
    report
}

fn verify_and_localize(
    method: &Method,
    analysis: MemberAnalysis,
    source_text: &str,
    backend: &dyn VerifierBackend,
    workdir: &Path,
) -> Result<LocalizeOutcome, DriverError> {
    let script = LemmaScript::from_analysis(&analysis, method);
    let block = script.render();
    let patched = insert_at(
        source_text,
        method.span.end.line as usize,
        method.span.end.col as usize,
        &block,
    )?;

    let check_path = workdir.join("check.dfy");
    fs::write(&check_path, &patched)?;

    let outcome = backend.verify_file(&check_path)?;
    let failed_checks = outcome.failed_checks();
    let suspicious = localize(&analysis, &failed_checks);

    Ok(LocalizeOutcome {
        member: analysis.method_name.clone(),
        suspicious,
        failed_checks,
        obligation_count: analysis.obligations.len(),
        diagnostics: analysis.diagnostics,
    })
}
