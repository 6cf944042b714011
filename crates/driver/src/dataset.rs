//! Persisted artifacts: mutated benchmark files, per-member suspicious-line
//! lists, and accepted repairs.
//!
//! Every mutation is written twice -- a hinted copy with the buggy-line
//! marker and a plain copy -- under the same monotonically increasing index,
//! so the two datasets stay aligned file-for-file.

use std::fs;
use std::path::Path;

use veriloc_analysis::SuspicionSet;

use crate::error::DriverError;
use crate::mutate::Mutation;
use crate::patch::{replace_span, BUGGY_MARKER};

/// Write one mutation as a hinted/plain file pair named
/// `<base>_<index>.dfy`.
pub fn write_mutation_pair(
    source_text: &str,
    base_name: &str,
    index: usize,
    mutation: &Mutation,
    hints_dir: &Path,
    mutations_dir: &Path,
) -> Result<(), DriverError> {
    let span = mutation.span;
    let plain = replace_span(
        source_text,
        span.start.line as usize,
        span.start.col as usize,
        span.end.line as usize,
        span.end.col as usize,
        &mutation.replacement,
    )?;
    let hinted = replace_span(
        source_text,
        span.start.line as usize,
        span.start.col as usize,
        span.end.line as usize,
        span.end.col as usize,
        &format!("{} {}", mutation.replacement, BUGGY_MARKER),
    )?;

    let file_name = format!("{base_name}_{index}.dfy");
    fs::create_dir_all(mutations_dir)?;
    fs::create_dir_all(hints_dir)?;
    fs::write(mutations_dir.join(&file_name), plain)?;
    fs::write(hints_dir.join(&file_name), hinted)?;
    Ok(())
}

/// Write a whole mutation set; returns how many pairs landed on disk.
/// Individual range failures are logged and skipped, not fatal.
pub fn write_mutation_set(
    source_text: &str,
    base_name: &str,
    mutations: &[Mutation],
    hints_dir: &Path,
    mutations_dir: &Path,
) -> Result<usize, DriverError> {
    let mut written = 0usize;
    for (index, mutation) in mutations.iter().enumerate() {
        match write_mutation_pair(
            source_text,
            base_name,
            index,
            mutation,
            hints_dir,
            mutations_dir,
        ) {
            Ok(()) => written += 1,
            Err(DriverError::Range(e)) => {
                tracing::warn!(member = %mutation.member, error = %e, "skipping mutation");
            }
            Err(other) => return Err(other),
        }
    }
    tracing::info!(base = base_name, written, total = mutations.len(), "mutation set written");
    Ok(written)
}

/// Write the per-member suspicious-line lists: one line per member,
/// semicolon-separated line numbers.
pub fn write_suspicion_list(
    dir: &Path,
    base_name: &str,
    suspicions: &SuspicionSet,
) -> Result<(), DriverError> {
    fs::create_dir_all(dir)?;
    let mut out = String::new();
    for lines in suspicions.values() {
        let joined = lines
            .iter()
            .map(|l| l.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        out.push_str(&joined);
        out.push('\n');
    }
    fs::write(dir.join(format!("{base_name}.txt")), out)?;
    Ok(())
}

/// Persist an accepted repair: attempt count, line, and the replacement.
pub fn write_repair_result(
    dir: &Path,
    base_name: &str,
    attempts: usize,
    line: u32,
    replacement: &str,
) -> Result<(), DriverError> {
    fs::create_dir_all(dir)?;
    let content = format!("{attempts}\n{line}\n\n{replacement}");
    fs::write(dir.join(format!("{base_name}.txt")), content)?;
    Ok(())
}
