//! Line/column-addressed source editing.
//!
//! All coordinates are 1-based lines. A failed bounds check is fatal for
//! that single operation only: the error carries the offending coordinates
//! and the untouched input stays valid.

use std::fmt;

/// Marker appended to the suspicious line before asking for a candidate.
pub const BUGGY_MARKER: &str = "//buggy line";

/// Out-of-bounds line/column when patching source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeError {
    pub line: usize,
    pub column: Option<usize>,
}

impl fmt::Display for RangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.column {
            Some(col) => write!(f, "position {}:{} is out of range", self.line, col),
            None => write!(f, "line {} is out of range", self.line),
        }
    }
}

impl std::error::Error for RangeError {}

fn split_lines(source: &str) -> Vec<String> {
    source.lines().map(str::to_string).collect()
}

fn join_lines(lines: Vec<String>, had_trailing_newline: bool) -> String {
    let mut out = lines.join("\n");
    if had_trailing_newline {
        out.push('\n');
    }
    out
}

fn check_line(lines: &[String], line: usize) -> Result<(), RangeError> {
    if line == 0 || line > lines.len() {
        Err(RangeError { line, column: None })
    } else {
        Ok(())
    }
}

/// Append the buggy-line marker to the given line.
pub fn mark_buggy_line(source: &str, line: usize) -> Result<String, RangeError> {
    let trailing = source.ends_with('\n');
    let mut lines = split_lines(source);
    check_line(&lines, line)?;
    let target = &mut lines[line - 1];
    target.push(' ');
    target.push_str(BUGGY_MARKER);
    Ok(join_lines(lines, trailing))
}

/// Replace the given line wholesale with `new_content`.
pub fn replace_line(source: &str, line: usize, new_content: &str) -> Result<String, RangeError> {
    let trailing = source.ends_with('\n');
    let mut lines = split_lines(source);
    check_line(&lines, line)?;
    lines[line - 1] = new_content.to_string();
    Ok(join_lines(lines, trailing))
}

/// Insert `text` on a fresh line after the first `col` characters of the
/// given line. Used to splice the generated lemma block right after a
/// member's closing brace.
pub fn insert_at(source: &str, line: usize, col: usize, text: &str) -> Result<String, RangeError> {
    let trailing = source.ends_with('\n');
    let mut lines = split_lines(source);
    check_line(&lines, line)?;
    let target = &lines[line - 1];
    let chars: Vec<char> = target.chars().collect();
    if col > chars.len() {
        return Err(RangeError {
            line,
            column: Some(col),
        });
    }
    let head: String = chars[..col].iter().collect();
    let tail: String = chars[col..].iter().collect();
    lines[line - 1] = format!("{head}\n{text}{tail}");
    Ok(join_lines(lines, trailing))
}

/// Replace the span from `(start_line, start_col)` through `(end_line,
/// end_col)` with `replacement`. `start_col` is 1-based inclusive;
/// `end_col` is the number of characters of the end line that the span
/// consumes. Used by the mutation writer to splice a perturbed statement
/// over the original.
pub fn replace_span(
    source: &str,
    start_line: usize,
    start_col: usize,
    end_line: usize,
    end_col: usize,
    replacement: &str,
) -> Result<String, RangeError> {
    let trailing = source.ends_with('\n');
    let lines = split_lines(source);
    check_line(&lines, start_line)?;
    check_line(&lines, end_line)?;
    if start_line > end_line {
        return Err(RangeError {
            line: start_line,
            column: Some(start_col),
        });
    }

    let start_chars: Vec<char> = lines[start_line - 1].chars().collect();
    if start_col == 0 || start_col - 1 > start_chars.len() {
        return Err(RangeError {
            line: start_line,
            column: Some(start_col),
        });
    }
    let end_chars: Vec<char> = lines[end_line - 1].chars().collect();
    if end_col > end_chars.len() {
        return Err(RangeError {
            line: end_line,
            column: Some(end_col),
        });
    }

    let head: String = start_chars[..start_col - 1].iter().collect();
    let tail: String = end_chars[end_col..].iter().collect();

    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    out.extend(lines[..start_line - 1].iter().cloned());
    out.push(format!("{head}{replacement}{tail}"));
    out.extend(lines[end_line..].iter().cloned());
    Ok(join_lines(out, trailing))
}
