//! The predicate model: atomic facts, per-path conjunctions, and the
//! disjunctive "current state" the walker threads through a method body.
//!
//! A `DisjunctiveState` is a union of `ConjunctiveState` branches; each
//! branch is an AND-chain of `Predicate`s in program order. Forking a branch
//! (at an if/else, match arm, or loop) copies it; predicates cloned into a
//! fork keep their `PredId`, so identity survives copy-on-fork. The
//! localizer marks verification status against that identity -- a predicate
//! is one fact regardless of how many branches or obligations carry a copy.

use crate::ast::{Expr, StmtId};

/// Identity of a predicate across clones. Allocated once per fact by
/// [`PredicateFactory`]; preserved by `Clone`.
pub type PredId = u64;

/// Where a predicate came from, which decides how the localizer treats it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredicateKind {
    /// Method precondition; never blamed.
    Requires,
    /// Method postcondition goal.
    Ensures,
    /// Loop invariant re-seeded after a loop exits.
    Invariant,
    /// Negated guard of an if with an else branch; blame is inherited from
    /// the guard's own verification status.
    Else,
    /// Terminator: the branch returned, later appends are no-ops.
    Return,
    /// Terminator while its control-flow barrier is set.
    Break,
    /// Ordinary path fact (guards, updates, constraints).
    Default,
}

/// The statement a predicate is tied to, with its source line cached so the
/// localizer never needs the AST.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StmtRef {
    pub id: StmtId,
    pub line: u32,
}

/// An atomic logical fact on one path.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub id: PredId,
    pub expr: Expr,
    /// `None` for facts synthesized from specs (requires clauses, invariants).
    pub stmt: Option<StmtRef>,
    pub kind: PredicateKind,
    /// Latest-value-of-a-variable fact, subject to update folding.
    pub is_update: bool,
    /// Active control-flow barrier on a `Break` predicate. Cleared when the
    /// loop the break targets finishes.
    pub barrier: bool,
    /// Set by invariant normalization on an obligation's own copy: the fact
    /// was substituted into the goals and must not be rendered as a
    /// requires clause. The localizer still treats it as a candidate.
    pub folded_out: bool,
}

/// Allocates predicate identities for one member's walk.
#[derive(Debug, Default)]
pub struct PredicateFactory {
    next: PredId,
}

impl PredicateFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn make(
        &mut self,
        expr: Expr,
        stmt: Option<StmtRef>,
        kind: PredicateKind,
        is_update: bool,
    ) -> Predicate {
        let id = self.next;
        self.next += 1;
        Predicate {
            id,
            expr,
            stmt,
            kind,
            is_update,
            barrier: false,
            folded_out: false,
        }
    }
}

/// One path's accumulated facts, insertion order = program order.
pub type ConjunctiveState = Vec<Predicate>;

/// Union of paths: the walker's "current state" register.
#[derive(Debug, Clone, Default)]
pub struct DisjunctiveState {
    pub branches: Vec<ConjunctiveState>,
}

impl DisjunctiveState {
    /// The single empty branch every walk starts from.
    pub fn initial() -> Self {
        Self {
            branches: vec![Vec::new()],
        }
    }

    pub fn from_branches(branches: Vec<ConjunctiveState>) -> Self {
        Self { branches }
    }

    pub fn branch_count(&self) -> usize {
        self.branches.len()
    }

    /// Append a clone of `pred` to every open branch. Closed branches are
    /// untouched -- truncation after return/break is a silent no-op.
    pub fn append(&mut self, pred: &Predicate) {
        for branch in &mut self.branches {
            if branch_open(branch) {
                branch.push(pred.clone());
            }
        }
    }

    /// Keep only `Requires`-kind facts in every branch. Used at loop entry
    /// and loop exit: path facts do not survive an unbounded number of
    /// iterations, only the invariants (re-added separately) do.
    pub fn retain_requires(&self) -> Self {
        let branches = self
            .branches
            .iter()
            .map(|b| {
                b.iter()
                    .filter(|p| p.kind == PredicateKind::Requires)
                    .cloned()
                    .collect()
            })
            .collect();
        Self { branches }
    }

    /// Union of two states: branch lists concatenated, identities intact.
    pub fn union(mut self, other: DisjunctiveState) -> Self {
        self.branches.extend(other.branches);
        self
    }

    /// Clear the control-flow barrier on every copy of the given predicate.
    pub fn clear_barrier(&mut self, pred: PredId) {
        for branch in &mut self.branches {
            for p in branch.iter_mut() {
                if p.id == pred {
                    p.barrier = false;
                }
            }
        }
    }

    /// Retag every copy of the given predicates as `Return` terminators.
    pub fn mark_return(&mut self, preds: &[PredId]) {
        for branch in &mut self.branches {
            for p in branch.iter_mut() {
                if preds.contains(&p.id) {
                    p.kind = PredicateKind::Return;
                }
            }
        }
    }

    /// Per-branch predicate id sequences, for snapshot subsequence matching.
    pub fn id_lists(&self) -> Vec<Vec<PredId>> {
        self.branches
            .iter()
            .map(|b| b.iter().map(|p| p.id).collect())
            .collect()
    }
}

/// Whether a branch can still grow. A branch is closed once its last
/// predicate is a `Return`, or a `Break` whose barrier is still set.
pub fn branch_open(branch: &ConjunctiveState) -> bool {
    match branch.last() {
        None => true,
        Some(last) => {
            last.kind != PredicateKind::Return
                && !(last.kind == PredicateKind::Break && last.barrier)
        }
    }
}
