//! Entailment obligations: one verification condition per path branch per
//! checkpoint, plus the normalization pass that keeps the backend from
//! seeing two bindings of one name.
//!
//! The index of an obligation in emission order is its identity: lemma
//! `check_<i>` is obligation `i`, and the localizer relies on that numbering
//! being preserved bit-for-bit.

use crate::ast::{BinOp, Expr};
use crate::diagnostics::Diagnostics;
use crate::predicate::{ConjunctiveState, PredId, StmtRef};
use crate::subst::substitute;

/// Which checkpoint produced an obligation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProofPhase {
    /// Invariants must follow from the state before the loop.
    Init,
    /// Invariants must be preserved by the loop body.
    Maintain,
    /// The state at loop exit must entail the method's postcondition.
    Terminate,
    /// End of body: the path facts must entail the ensures clauses.
    Postcondition,
}

/// One verification condition: LHS facts (and, for loop phases, the
/// invariant list) entail the RHS goals.
#[derive(Debug, Clone)]
pub struct Obligation {
    /// The branch's accumulated facts, program order.
    pub lhs: ConjunctiveState,
    /// Invariants assumed on the left for `Maintain`/`Terminate` proofs.
    pub lhs_invariants: Vec<Expr>,
    /// Goals; deep copies, so normalization never touches the method's own
    /// specification expressions.
    pub rhs: Vec<Expr>,
    /// Verification statements (assert/assume/calc/...) whose snapshot is a
    /// contiguous subsequence of this branch. Replayed as the lemma body,
    /// and blamed alongside the LHS facts when the obligation fails.
    pub discharges: Vec<StmtRef>,
    pub phase: ProofPhase,
}

impl Obligation {
    /// Loop-phase obligations participate in invariant normalization.
    pub fn is_invariant_proof(&self) -> bool {
        self.phase != ProofPhase::Postcondition
    }
}

/// A snapshot of the walker's state at a verification statement.
#[derive(Debug, Clone)]
pub struct StateSnapshot {
    pub stmt: StmtRef,
    /// Predicate-id sequence per branch at the time of the snapshot.
    pub branches: Vec<Vec<PredId>>,
}

/// Collect the verification statements whose snapshot matches `branch_ids`
/// by branch-local contiguous subsequence containment. Only a subset of the
/// state needs to be replayed, so equality of whole states is not required.
pub fn matching_discharges(branch_ids: &[PredId], snapshots: &[StateSnapshot]) -> Vec<StmtRef> {
    let mut out: Vec<StmtRef> = Vec::new();
    for snap in snapshots {
        for snap_branch in &snap.branches {
            if is_contiguous_subsequence(snap_branch, branch_ids) {
                if !out.iter().any(|s| s.id == snap.stmt.id) {
                    out.push(snap.stmt);
                }
                break;
            }
        }
    }
    out
}

fn is_contiguous_subsequence(needle: &[PredId], haystack: &[PredId]) -> bool {
    if needle.is_empty() {
        return true;
    }
    if needle.len() > haystack.len() {
        return false;
    }
    haystack.windows(needle.len()).any(|w| w == needle)
}

/// Normalization pass over a member's obligations.
///
/// For every invariant-phase obligation whose LHS contains an equality
/// `name == expr`, substitute `name` by `expr` throughout the RHS goals and
/// fold the now-redundant LHS fact out of the rendered clauses -- the backend
/// rejects two independent bindings of one name. LHS facts are processed in
/// reverse program order so the most recent definition wins; a fact is only
/// folded out when some goal actually changed.
///
/// Folded facts stay in `lhs` with `folded_out` set: the lemma serializer
/// skips them, but the localizer still blames their statements when the
/// obligation fails.
pub fn normalize_invariant_obligations(obligations: &mut [Obligation], diags: &mut Diagnostics) {
    for ob in obligations.iter_mut() {
        if !ob.is_invariant_proof() {
            continue;
        }
        for j in (0..ob.lhs.len()).rev() {
            if ob.lhs[j].folded_out {
                continue;
            }
            let Expr::Binary {
                op: BinOp::Eq,
                lhs,
                rhs,
            } = &ob.lhs[j].expr
            else {
                continue;
            };
            let Some(name) = lhs.as_name() else {
                continue;
            };
            let name = name.to_string();
            let def = (**rhs).clone();
            let mut changed = false;
            for goal in ob.rhs.iter_mut() {
                let rewritten = substitute(goal, &name, &def, diags);
                if rewritten != *goal {
                    *goal = rewritten;
                    changed = true;
                }
            }
            if changed {
                ob.lhs[j].folded_out = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Expr;
    use crate::predicate::{PredicateFactory, PredicateKind};

    #[test]
    fn contiguous_subsequence_matching() {
        assert!(is_contiguous_subsequence(&[2, 3], &[1, 2, 3, 4]));
        assert!(!is_contiguous_subsequence(&[2, 4], &[1, 2, 3, 4]));
        assert!(is_contiguous_subsequence(&[], &[1]));
        assert!(!is_contiguous_subsequence(&[1, 2], &[2]));
    }

    #[test]
    fn discharge_matching_dedups_statements() {
        let snapshots = vec![
            StateSnapshot {
                stmt: StmtRef { id: 7, line: 12 },
                branches: vec![vec![1, 2], vec![5, 6]],
            },
            StateSnapshot {
                stmt: StmtRef { id: 9, line: 14 },
                branches: vec![vec![4]],
            },
        ];
        let matched = matching_discharges(&[0, 1, 2, 3], &snapshots);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].id, 7);
    }

    #[test]
    fn normalization_substitutes_and_drops_fact() {
        // LHS [a == 1], RHS goal a == b  ~~>  RHS 1 == b, LHS empty.
        let mut f = PredicateFactory::new();
        let fact = f.make(
            Expr::eq(Expr::name("a"), Expr::int(1)),
            None,
            PredicateKind::Default,
            true,
        );
        let mut obs = vec![Obligation {
            lhs: vec![fact],
            lhs_invariants: vec![],
            rhs: vec![Expr::eq(Expr::name("a"), Expr::name("b"))],
            discharges: vec![],
            phase: ProofPhase::Init,
        }];
        let mut diags = Diagnostics::new();
        normalize_invariant_obligations(&mut obs, &mut diags);
        // Consumed fact leaves the rendered clauses but stays visible to
        // the localizer.
        assert!(obs[0].lhs[0].folded_out);
        assert_eq!(obs[0].rhs, vec![Expr::eq(Expr::int(1), Expr::name("b"))]);
    }

    #[test]
    fn normalization_keeps_unrelated_facts() {
        let mut f = PredicateFactory::new();
        let fact = f.make(
            Expr::eq(Expr::name("c"), Expr::int(1)),
            None,
            PredicateKind::Default,
            true,
        );
        let mut obs = vec![Obligation {
            lhs: vec![fact.clone()],
            lhs_invariants: vec![],
            rhs: vec![Expr::eq(Expr::name("a"), Expr::name("b"))],
            discharges: vec![],
            phase: ProofPhase::Maintain,
        }];
        let mut diags = Diagnostics::new();
        normalize_invariant_obligations(&mut obs, &mut diags);
        assert!(!obs[0].lhs[0].folded_out);
        assert_eq!(obs[0].rhs, vec![Expr::eq(Expr::name("a"), Expr::name("b"))]);
    }

    #[test]
    fn normalization_skips_postcondition_obligations() {
        let mut f = PredicateFactory::new();
        let fact = f.make(
            Expr::eq(Expr::name("a"), Expr::int(1)),
            None,
            PredicateKind::Default,
            true,
        );
        let mut obs = vec![Obligation {
            lhs: vec![fact],
            lhs_invariants: vec![],
            rhs: vec![Expr::eq(Expr::name("a"), Expr::name("b"))],
            discharges: vec![],
            phase: ProofPhase::Postcondition,
        }];
        let mut diags = Diagnostics::new();
        normalize_invariant_obligations(&mut obs, &mut diags);
        assert!(!obs[0].lhs[0].folded_out);
        assert_eq!(obs[0].rhs, vec![Expr::eq(Expr::name("a"), Expr::name("b"))]);
    }

    #[test]
    fn normalization_reverse_order_prefers_latest_definition() {
        // LHS [a == 1, a == 2]: the later definition rewrites the goal;
        // the earlier one then no longer matches anything and is kept.
        let mut f = PredicateFactory::new();
        let first = f.make(
            Expr::eq(Expr::name("a"), Expr::int(1)),
            None,
            PredicateKind::Default,
            true,
        );
        let second = f.make(
            Expr::eq(Expr::name("a"), Expr::int(2)),
            None,
            PredicateKind::Default,
            true,
        );
        let mut obs = vec![Obligation {
            lhs: vec![first.clone(), second],
            lhs_invariants: vec![],
            rhs: vec![Expr::eq(Expr::name("a"), Expr::name("b"))],
            discharges: vec![],
            phase: ProofPhase::Init,
        }];
        let mut diags = Diagnostics::new();
        normalize_invariant_obligations(&mut obs, &mut diags);
        assert_eq!(obs[0].rhs, vec![Expr::eq(Expr::int(2), Expr::name("b"))]);
        // The later definition was consumed; the earlier one no longer
        // matched anything and stays renderable.
        assert!(!obs[0].lhs[0].folded_out);
        assert!(obs[0].lhs[1].folded_out);
    }
}
