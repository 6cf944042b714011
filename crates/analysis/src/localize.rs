//! Fault localization: map the backend's failing lemma names back onto
//! obligations, and onward onto suspicious source lines.
//!
//! The only linkage between a lemma and its obligation is the index embedded
//! in the lemma name (`check_<i>`, `i` = emission order). Indices are
//! compared exactly -- `check_1` never matches obligation 10.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::predicate::{PredId, PredicateKind};
use crate::walker::MemberAnalysis;

/// Localization output for a whole program: suspicious line numbers per
/// member, in deterministic iteration order.
pub type SuspicionSet = BTreeMap<String, BTreeSet<u32>>;

/// The lemma-name prefix the serializer and the localizer agree on.
pub const CHECK_PREFIX: &str = "check_";

/// Extract the obligation index from a lemma name.
///
/// Accepts qualified names (`Module.check_12`) by looking at the final
/// `_`-separated component. Returns `None` for names that do not carry the
/// prefix or a parseable index.
pub fn parse_check_index(name: &str) -> Option<usize> {
    let tail = name.rsplit('.').next().unwrap_or(name);
    let idx = tail.strip_prefix(CHECK_PREFIX)?;
    idx.parse().ok()
}

/// Map failing lemma names onto suspicious source lines for one member.
///
/// Obligations absent from the failing list are fully verified: every LHS
/// predicate identity is marked. For a failing obligation, `Requires`
/// predicates are marked (preconditions are never blamed) and `Else`
/// predicates inherit the status already recorded for the guarding if's own
/// guard predicate -- resolving whether the else branch is itself buggy or
/// merely downstream of a buggy guard. Everything left unmarked is a
/// candidate; its source lines, together with the lines of the discharge
/// statements failing obligations replay, form the result.
pub fn localize(analysis: &MemberAnalysis, failing: &[String]) -> BTreeSet<u32> {
    let mut fail_indices: Vec<usize> = failing
        .iter()
        .filter(|name| name.to_lowercase().contains("check"))
        .filter_map(|name| parse_check_index(name))
        .collect();
    fail_indices.sort_unstable();
    fail_indices.dedup();

    tracing::debug!(
        member = %analysis.method_name,
        failing = fail_indices.len(),
        obligations = analysis.obligations.len(),
        "localizing"
    );

    let mut verified: HashMap<PredId, bool> = HashMap::new();
    let mut failing_discharge_lines: BTreeSet<u32> = BTreeSet::new();
    let mark = |verified: &mut HashMap<PredId, bool>, id: PredId| {
        verified.insert(id, true);
    };

    let mut cursor = 0usize;
    for (i, ob) in analysis.obligations.iter().enumerate() {
        let is_failing = cursor < fail_indices.len() && fail_indices[cursor] == i;
        if is_failing {
            cursor += 1;
            // The discharge statements this obligation replays are related
            // statements: when the obligation fails, they are candidates
            // alongside the unverified facts (a failing assert body blames
            // the assert itself).
            for discharge in &ob.discharges {
                failing_discharge_lines.insert(discharge.line);
            }
            for pred in &ob.lhs {
                match pred.kind {
                    PredicateKind::Requires => mark(&mut verified, pred.id),
                    PredicateKind::Else => {
                        let Some(stmt) = pred.stmt else { continue };
                        let guard_ok = analysis
                            .guard_preds
                            .get(&stmt.id)
                            .map(|gid| verified.get(gid).copied().unwrap_or(false))
                            .unwrap_or(false);
                        if guard_ok {
                            mark(&mut verified, pred.id);
                        }
                    }
                    _ => {}
                }
            }
        } else {
            for pred in &ob.lhs {
                mark(&mut verified, pred.id);
            }
        }
    }

    let mut lines = failing_discharge_lines;
    for ob in &analysis.obligations {
        for pred in &ob.lhs {
            if verified.get(&pred.id).copied().unwrap_or(false) {
                continue;
            }
            if let Some(stmt) = pred.stmt {
                lines.insert(stmt.line);
            }
        }
    }
    lines
}
