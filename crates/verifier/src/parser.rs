//! Parse the backend's console output into a [`VerificationOutcome`].
//!
//! The contract with the backend: each error line names the failing
//! declaration in a trailing parenthesized group (for generated lemmas,
//! `(check_<i>)`), and a summary line of the form
//! `... finished with N verified, M errors` closes the report. The error
//! count prefers the summary and falls back to counting error lines.

use crate::error::VerifierError;
use crate::outcome::VerificationOutcome;

/// Parse verifier stdout/stderr.
pub fn parse_verifier_output(
    stdout: &str,
    stderr: &str,
) -> Result<VerificationOutcome, VerifierError> {
    let combined = format!("{stdout}\n{stderr}");
    if combined.trim().is_empty() {
        return Err(VerifierError::ParseError(
            "empty verifier output".to_string(),
        ));
    }
    if combined.contains("Verification out of resource")
        || combined.to_lowercase().contains("timed out")
    {
        return Err(VerifierError::Timeout);
    }

    let mut failed: Vec<String> = Vec::new();
    let mut error_lines = 0usize;
    let mut summary_errors: Option<usize> = None;

    for line in combined.lines() {
        if let Some(count) = parse_summary_errors(line) {
            summary_errors = Some(count);
            continue;
        }
        let is_error_line = line.contains("Error") || line.contains("error:");
        if !is_error_line {
            continue;
        }
        error_lines += 1;
        if let Some(name) = declaration_name(line) {
            if !failed.contains(&name) {
                failed.push(name);
            }
        }
    }

    let error_count = summary_errors.unwrap_or(error_lines).max(failed.len());
    Ok(VerificationOutcome {
        failed,
        error_count,
    })
}

/// Extract `M` from a `... finished with N verified, M errors` summary.
fn parse_summary_errors(line: &str) -> Option<usize> {
    if !line.contains("finished with") {
        return None;
    }
    let after = line.split("finished with").nth(1)?;
    let mut last_number: Option<usize> = None;
    for token in after.split(|c: char| !c.is_ascii_digit()) {
        if token.is_empty() {
            continue;
        }
        if let Ok(n) = token.parse() {
            last_number = Some(n);
        }
    }
    // The trailing count is the error count only if the line says so.
    if after.contains("error") {
        last_number
    } else {
        None
    }
}

/// Pull the failing declaration's name from an error line: the trailing
/// parenthesized group, which must be identifier-shaped (letters, digits,
/// `_`, `.` for qualified names). File coordinates like `(41,0)` earlier in
/// the line never qualify.
fn declaration_name(line: &str) -> Option<String> {
    let line = line.trim_end();
    let inner = line.strip_suffix(')')?;
    let open = inner.rfind('(')?;
    let name = &inner[open + 1..];
    let identifier_shaped = !name.is_empty()
        && name.chars().any(|c| c.is_ascii_alphabetic())
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
    if identifier_shaped {
        Some(name.to_string())
    } else {
        None
    }
}
