//! Colored console output for localization and repair runs.
//!
//! Per-member status lines:
//!   [LOCALIZED] member (3 suspicious lines)
//!   [CLEAN]     member
//!   [REPAIRED]  member line 14 (attempt 2)
//!   [EXHAUSTED] member (no repair found)
//!   [ERROR]     member - detail
//!
//! Suspicious lines are rendered against the source with ariadne.

use std::collections::BTreeSet;

use ariadne::{ColorGenerator, Label, Report, ReportKind, Source};
use colored::Colorize;

use crate::localize_run::LocalizeReport;
use crate::repair::{LineRepair, MemberRepair};

/// Print a header for the run.
pub fn print_header(action: &str, path: &str) {
    eprintln!("{}", format!("{action} {path}").bold());
}

/// Print per-member localization results and a summary line.
pub fn print_localization(report: &LocalizeReport) {
    eprintln!();
    for outcome in &report.outcomes {
        if outcome.suspicious.is_empty() {
            eprintln!(
                "  {}  {} ({} checks)",
                "[CLEAN]".green().bold(),
                outcome.member,
                outcome.obligation_count,
            );
        } else {
            let mut line = format!(
                "  {}  {} ({} suspicious line{}, {} failing check{})",
                "[LOCALIZED]".yellow().bold(),
                outcome.member,
                outcome.suspicious.len(),
                if outcome.suspicious.len() == 1 { "" } else { "s" },
                outcome.failed_checks.len(),
                if outcome.failed_checks.len() == 1 { "" } else { "s" },
            );
            if !outcome.diagnostics.is_empty() {
                line.push_str(&format!(
                    " {}",
                    format!("({} unsupported constructs)", outcome.diagnostics.len()).dimmed()
                ));
            }
            eprintln!("{line}");
        }
    }
    for (member, err) in &report.failures {
        eprintln!("  {}  {member} - {err}", "[ERROR]".red().bold());
    }

    eprintln!();
    let localized = report
        .outcomes
        .iter()
        .filter(|o| !o.suspicious.is_empty())
        .count();
    let clean = report.outcomes.len() - localized;
    let mut parts = Vec::new();
    if localized > 0 {
        parts.push(format!("{} {}", localized, "LOCALIZED".yellow()));
    }
    if clean > 0 {
        parts.push(format!("{} {}", clean, "CLEAN".green()));
    }
    if !report.failures.is_empty() {
        parts.push(format!("{} {}", report.failures.len(), "ERROR".red()));
    }
    eprintln!("Summary: {}", parts.join(", "));
    eprintln!();
}

/// Render one member's suspicious lines against the source file.
pub fn print_member_suspicions(path: &str, source: &str, member: &str, lines: &BTreeSet<u32>) {
    if lines.is_empty() {
        return;
    }
    let offsets = line_offsets(source);
    let mut colors = ColorGenerator::new();

    let first = *lines.iter().next().unwrap() as usize;
    let anchor = offsets
        .get(first.saturating_sub(1))
        .map(|(start, _)| *start)
        .unwrap_or(0);

    let mut report = Report::build(ReportKind::Warning, path, anchor)
        .with_message(format!("suspicious lines in {member}"));
    for &line in lines {
        let Some(&(start, end)) = offsets.get((line as usize).saturating_sub(1)) else {
            continue;
        };
        report = report.with_label(
            Label::new((path, start..end))
                .with_message("candidate for repair")
                .with_color(colors.next()),
        );
    }
    let _ = report.finish().eprint((path, Source::from(source)));
}

/// Print one member's repair report.
pub fn print_repair(report: &MemberRepair) {
    for line in &report.lines {
        match line {
            LineRepair::Repaired {
                line,
                replacement,
                attempts,
            } => {
                eprintln!(
                    "  {}  {} line {line} (attempt {attempts}): {replacement}",
                    "[REPAIRED]".green().bold(),
                    report.member,
                );
            }
            LineRepair::Exhausted { line, attempts } => {
                eprintln!(
                    "  {}  {} line {line} (no repair found after {attempts} attempts)",
                    "[EXHAUSTED]".red().bold(),
                    report.member,
                );
            }
            LineRepair::Cancelled { line } => {
                eprintln!(
                    "  {}  {} line {line}",
                    "[CANCELLED]".yellow().bold(),
                    report.member,
                );
            }
        }
    }
}

/// Byte offset range `(start, end)` of each line.
fn line_offsets(source: &str) -> Vec<(usize, usize)> {
    let mut out = Vec::new();
    let mut start = 0usize;
    for line in source.lines() {
        let end = start + line.len();
        out.push((start, end));
        start = end + 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_offsets_cover_each_line() {
        let src = "ab\ncdef\n\ng";
        let offsets = line_offsets(src);
        assert_eq!(offsets, vec![(0, 2), (3, 7), (8, 8), (9, 10)]);
        assert_eq!(&src[offsets[1].0..offsets[1].1], "cdef");
    }

    #[test]
    fn print_member_suspicions_handles_out_of_range_lines() {
        // A line beyond the file must not panic, it is just skipped.
        print_member_suspicions(
            "t.dfy",
            "method m()\n{\n}\n",
            "m",
            &BTreeSet::from([2, 99]),
        );
    }
}
