//! The repair loop: for each suspicious line, ask the candidate source for
//! a replacement, patch it in, and re-verify -- up to a hard retry ceiling,
//! stopping at the first candidate that verifies cleanly.
//!
//! Strict sequencing: a candidate is fully verified before the next one is
//! requested; lines are processed in suspicion-set order; cancellation is
//! checked between retries.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use veriloc_verifier::VerifierBackend;

use crate::candidate::{extract_expression, CandidateSource};
use crate::error::DriverError;
use crate::patch::{mark_buggy_line, replace_line};

/// Knobs for the repair loop.
#[derive(Debug, Clone)]
pub struct RepairConfig {
    /// Hard ceiling on candidates per suspicious line.
    pub max_attempts: usize,
    /// Stop the member at the first exhausted line instead of moving on.
    pub stop_at_first_exhaustion: bool,
}

impl Default for RepairConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            stop_at_first_exhaustion: false,
        }
    }
}

/// External cancellation signal, checked between retries and members.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// What happened to one suspicious line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineRepair {
    /// A candidate made the member verify cleanly.
    Repaired {
        line: u32,
        replacement: String,
        attempts: usize,
    },
    /// Every candidate still failed verification. An outcome, not an error.
    Exhausted { line: u32, attempts: usize },
    Cancelled { line: u32 },
}

/// Per-member repair report.
#[derive(Debug, Clone, Default)]
pub struct MemberRepair {
    pub member: String,
    pub lines: Vec<LineRepair>,
}

impl MemberRepair {
    /// The accepted repair, if any line succeeded.
    pub fn accepted(&self) -> Option<(u32, &str)> {
        self.lines.iter().find_map(|l| match l {
            LineRepair::Repaired {
                line, replacement, ..
            } => Some((*line, replacement.as_str())),
            _ => None,
        })
    }
}

/// Run the repair loop for one member.
///
/// `source_text` is the original program; each candidate is spliced into a
/// fresh copy, written to `workdir/check.dfy`, and submitted to the
/// backend. Candidate-source failures burn an attempt; backend failures
/// abort the member (no partial result is trustworthy after that).
pub fn repair_member(
    member: &str,
    source_text: &str,
    suspicious: &BTreeSet<u32>,
    candidates: &dyn CandidateSource,
    backend: &dyn VerifierBackend,
    workdir: &Path,
    config: &RepairConfig,
    cancel: &CancelFlag,
) -> Result<MemberRepair, DriverError> {
    let mut report = MemberRepair {
        member: member.to_string(),
        lines: Vec::new(),
    };
    let check_path = workdir.join("check.dfy");

    'lines: for &line in suspicious {
        if cancel.is_cancelled() {
            report.lines.push(LineRepair::Cancelled { line });
            break;
        }

        let marked = match mark_buggy_line(source_text, line as usize) {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!(member, line, error = %e, "cannot mark suspicious line");
                continue;
            }
        };

        let mut attempts = 0usize;
        while attempts < config.max_attempts {
            if cancel.is_cancelled() {
                report.lines.push(LineRepair::Cancelled { line });
                break 'lines;
            }
            attempts += 1;

            let response = match candidates.propose_fix(&marked) {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!(member, line, attempt = attempts, error = %e, "candidate request failed");
                    continue;
                }
            };
            let replacement = extract_expression(&response);
            let patched = match replace_line(source_text, line as usize, &replacement) {
                Ok(p) => p,
                Err(e) => {
                    tracing::warn!(member, line, error = %e, "cannot splice candidate");
                    continue;
                }
            };
            fs::write(&check_path, &patched)?;

            let outcome = backend.verify_file(&check_path)?;
            if outcome.is_fully_verified() {
                tracing::info!(member, line, attempts, "repair accepted");
                report.lines.push(LineRepair::Repaired {
                    line,
                    replacement,
                    attempts,
                });
                return Ok(report);
            }
            tracing::debug!(
                member,
                line,
                attempt = attempts,
                failed = outcome.failed.len(),
                "candidate rejected"
            );
        }

        report.lines.push(LineRepair::Exhausted {
            line,
            attempts: config.max_attempts,
        });
        if config.stop_at_first_exhaustion {
            break;
        }
    }

    Ok(report)
}
