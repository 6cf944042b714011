//! The state propagator: per-statement-kind transformers.
//!
//! Each transformer takes the disjunctive state *before* a statement and
//! builds the state *after* it, together with the predicates the statement
//! appended and the variables it introduced. The walker owns sequencing and
//! control flow; a transformer never looks past its own statement.
//!
//! Guard-like facts (if/loop guards, break markers, such-that constraints)
//! are allocated once and cloned into every open branch, so all copies share
//! one predicate identity. Update equalities are allocated per branch,
//! because folding rewrites them against that branch's own history.

use crate::ast::{BinOp, CalleeTable, Expr, Rhs};
use crate::diagnostics::Diagnostics;
use crate::predicate::{
    branch_open, ConjunctiveState, DisjunctiveState, Predicate, PredicateFactory, PredicateKind,
    StmtRef,
};
use crate::subst::{instantiate_ensures, replace_expr};

/// Result of running one transformer: the after-state plus what it did.
#[derive(Debug)]
pub struct StatementContext {
    pub state_after: DisjunctiveState,
    /// Predicates this statement appended (the walker retags these for
    /// returns and records the first as an if-guard).
    pub appended: Vec<Predicate>,
    /// Simple-name assignment targets that became known variables.
    pub new_vars: Vec<String>,
}

impl StatementContext {
    fn passthrough(before: &DisjunctiveState) -> Self {
        Self {
            state_after: before.clone(),
            appended: Vec::new(),
            new_vars: Vec::new(),
        }
    }

    /// Ids of the appended predicates.
    pub fn appended_ids(&self) -> Vec<u64> {
        self.appended.iter().map(|p| p.id).collect()
    }
}

/// Append a guard-like fact to a copy of `before`. Used for if-guards
/// (`kind = Default`), negated else-guards (`kind = Else`), and else-if
/// negations (`kind = Default`). A `None` guard (the nondeterministic `*`)
/// contributes nothing.
pub fn guard(
    stmt: StmtRef,
    guard: Option<&Expr>,
    kind: PredicateKind,
    before: &DisjunctiveState,
    factory: &mut PredicateFactory,
) -> StatementContext {
    let mut ctx = StatementContext::passthrough(before);
    if let Some(g) = guard {
        let pred = factory.make(g.clone(), Some(stmt), kind, false);
        ctx.state_after.append(&pred);
        ctx.appended.push(pred);
    }
    ctx
}

/// Entry into a loop body: only `Requires`-kind facts survive (path facts do
/// not hold across an unbounded number of iterations), then the guard holds.
pub fn loop_entry(
    stmt: StmtRef,
    loop_guard: Option<&Expr>,
    before: &DisjunctiveState,
    factory: &mut PredicateFactory,
) -> StatementContext {
    let mut ctx = StatementContext {
        state_after: before.retain_requires(),
        appended: Vec::new(),
        new_vars: Vec::new(),
    };
    if let Some(g) = loop_guard {
        let pred = factory.make(g.clone(), Some(stmt), PredicateKind::Default, false);
        ctx.state_after.append(&pred);
        ctx.appended.push(pred);
    }
    ctx
}

/// Exit of a loop: body facts are dropped the same way, and the negated
/// guard holds. The walker re-seeds the invariants afterwards.
pub fn loop_exit(
    stmt: StmtRef,
    loop_guard: &Expr,
    before: &DisjunctiveState,
    factory: &mut PredicateFactory,
) -> StatementContext {
    let mut ctx = StatementContext {
        state_after: before.retain_requires(),
        appended: Vec::new(),
        new_vars: Vec::new(),
    };
    let not_guard = Expr::not(loop_guard.clone());
    let pred = factory.make(not_guard, Some(stmt), PredicateKind::Default, false);
    ctx.state_after.append(&pred);
    ctx.appended.push(pred);
    ctx
}

/// Synthetic for-loop index fact (`i == start` before the body,
/// `i == i + 1` after it). Not an update: the increment equation must not
/// fold away the initialization.
pub fn loop_index(
    stmt: StmtRef,
    index_eq: Expr,
    before: &DisjunctiveState,
    factory: &mut PredicateFactory,
) -> StatementContext {
    let mut ctx = StatementContext::passthrough(before);
    let pred = factory.make(index_eq, Some(stmt), PredicateKind::Default, false);
    ctx.state_after.append(&pred);
    ctx.appended.push(pred);
    ctx
}

/// A `break`: appends a barrier predicate that closes the branch until the
/// targeted loop finishes.
pub fn break_stmt(
    stmt: StmtRef,
    before: &DisjunctiveState,
    factory: &mut PredicateFactory,
) -> StatementContext {
    let mut ctx = StatementContext::passthrough(before);
    let mut pred = factory.make(Expr::bool(true), Some(stmt), PredicateKind::Break, false);
    pred.barrier = true;
    ctx.state_after.append(&pred);
    ctx.appended.push(pred);
    ctx
}

/// `x :| P(x)`: the existential constraint becomes a plain fact.
pub fn assign_such_that(
    stmt: StmtRef,
    constraint: &Expr,
    before: &DisjunctiveState,
    factory: &mut PredicateFactory,
) -> StatementContext {
    let mut ctx = StatementContext::passthrough(before);
    let pred = factory.make(constraint.clone(), Some(stmt), PredicateKind::Default, false);
    ctx.state_after.append(&pred);
    ctx.appended.push(pred);
    ctx
}

/// Assignment/update: appends `target == rhs` equalities with call and
/// constructor postconditions instantiated, folding repeated updates to the
/// same slot into a single live binding per branch.
pub fn update(
    stmt: StmtRef,
    targets: &[Expr],
    values: &[Rhs],
    before: &DisjunctiveState,
    callees: &CalleeTable,
    factory: &mut PredicateFactory,
    diags: &mut Diagnostics,
) -> StatementContext {
    let mut ctx = StatementContext::passthrough(before);
    // Slot cursor: plain expressions consume one target, a call consumes as
    // many as its contract has result slots.
    let mut slot = 0usize;
    for value in values {
        match value {
            Rhs::Expr(e) => {
                let Some(target) = targets.get(slot) else {
                    diags.record("propagate", "update: missing assignment target", Some(stmt.line));
                    continue;
                };
                append_update(&mut ctx, stmt, target, e, true, factory, diags);
                register_target(&mut ctx, target);
                slot += 1;
            }
            Rhs::ArrayAlloc { dims, init, .. } => {
                let Some(target) = targets.get(slot) else {
                    diags.record("propagate", "update: missing allocation target", Some(stmt.line));
                    continue;
                };
                for (j, dim) in dims.iter().enumerate() {
                    let len_field = if dims.len() == 1 {
                        "Length".to_string()
                    } else {
                        format!("Length{j}")
                    };
                    let len_eq = Expr::eq(Expr::field(target.clone(), len_field), dim.clone());
                    let pred = factory.make(len_eq, Some(stmt), PredicateKind::Default, false);
                    ctx.state_after.append(&pred);
                    ctx.appended.push(pred);
                }
                for (i, elem) in init.iter().enumerate() {
                    let cell = Expr::Select {
                        base: Box::new(target.clone()),
                        indices: vec![Expr::int(i as i64)],
                    };
                    append_update(&mut ctx, stmt, &cell, elem, true, factory, diags);
                }
                register_target(&mut ctx, target);
                slot += 1;
            }
            Rhs::Ctor { class, args } => {
                let Some(target) = targets.get(slot) else {
                    diags.record("propagate", "update: missing constructor target", Some(stmt.line));
                    continue;
                };
                match callees.get(class) {
                    Some(contract) if !contract.ensures.is_empty() => {
                        let facts =
                            instantiate_ensures(contract, args, &[], Some(target), diags);
                        for fact in facts {
                            append_instantiated(&mut ctx, stmt, fact, factory, diags);
                        }
                        register_target(&mut ctx, target);
                    }
                    Some(_) => {}
                    None => diags.record(
                        "propagate",
                        format!("update: unknown constructor {class}"),
                        Some(stmt.line),
                    ),
                }
                slot += 1;
            }
            Rhs::Call {
                callee,
                receiver,
                args,
            } => {
                let Some(contract) = callees.get(callee) else {
                    diags.record(
                        "propagate",
                        format!("update: unknown callee {callee}"),
                        Some(stmt.line),
                    );
                    slot += 1;
                    continue;
                };
                if contract.ensures.is_empty() {
                    slot += contract.outs.len().max(1);
                    continue;
                }
                let call_targets: Vec<Expr> = targets
                    .iter()
                    .skip(slot)
                    .take(contract.outs.len())
                    .cloned()
                    .collect();
                let recv = if call_targets.is_empty() {
                    receiver.as_ref()
                } else {
                    None
                };
                let facts = instantiate_ensures(contract, args, &call_targets, recv, diags);
                for fact in facts {
                    append_instantiated(&mut ctx, stmt, fact, factory, diags);
                }
                for target in &call_targets {
                    register_target(&mut ctx, target);
                }
                slot += contract.outs.len().max(1);
            }
        }
    }
    ctx
}

/// Append one `target == rhs` update equality per open branch, folding the
/// branch's prior binding of `target` into the incoming right-hand side.
fn append_update(
    ctx: &mut StatementContext,
    stmt: StmtRef,
    target: &Expr,
    rhs: &Expr,
    is_update: bool,
    factory: &mut PredicateFactory,
    diags: &mut Diagnostics,
) {
    for branch in &mut ctx.state_after.branches {
        if !branch_open(branch) {
            continue;
        }
        let folded = fold_into_branch(branch, target, rhs, diags);
        let pred = factory.make(
            Expr::eq(target.clone(), folded),
            Some(stmt),
            PredicateKind::Default,
            is_update,
        );
        branch.push(pred.clone());
        ctx.appended.push(pred);
    }
}

/// Append an already-instantiated postcondition fact (call/constructor) as
/// an update predicate, folding against the fact's own equality target.
fn append_instantiated(
    ctx: &mut StatementContext,
    stmt: StmtRef,
    fact: Expr,
    factory: &mut PredicateFactory,
    diags: &mut Diagnostics,
) {
    // A contract fact of the shape `slot == e` participates in folding like
    // a plain update; anything else is appended as an opaque update fact.
    if let Expr::Binary {
        op: BinOp::Eq,
        lhs,
        rhs,
    } = &fact
    {
        append_update(ctx, stmt, lhs, rhs, true, factory, diags);
    } else {
        for branch in &mut ctx.state_after.branches {
            if !branch_open(branch) {
                continue;
            }
            let pred = factory.make(fact.clone(), Some(stmt), PredicateKind::Default, true);
            branch.push(pred.clone());
            ctx.appended.push(pred);
        }
    }
}

/// Fold the branch's previous binding of `target` (if any) out of the
/// branch: the stale `target == def` predicate is removed, later update
/// predicates that mention `target` are rewritten against `def`, and the
/// incoming right-hand side comes back with `target` replaced by `def`.
/// The verification backend rejects two bindings of one name, so each
/// branch keeps a single-assignment-style chain.
fn fold_into_branch(
    branch: &mut ConjunctiveState,
    target: &Expr,
    rhs: &Expr,
    diags: &mut Diagnostics,
) -> Expr {
    let mut def: Option<(usize, Expr)> = None;
    for (j, p) in branch.iter().enumerate() {
        if !p.is_update {
            continue;
        }
        if let Expr::Binary {
            op: BinOp::Eq,
            lhs,
            rhs: r,
        } = &p.expr
        {
            if **lhs == *target {
                def = Some((j, (**r).clone()));
            } else if **r == *target {
                def = Some((j, (**lhs).clone()));
            }
        }
    }
    let Some((j, def_expr)) = def else {
        return rhs.clone();
    };
    for k in (j + 1)..branch.len() {
        if branch[k].is_update {
            branch[k].expr = replace_expr(&branch[k].expr, target, &def_expr, diags);
        }
    }
    let folded = replace_expr(rhs, target, &def_expr, diags);
    branch.remove(j);
    folded
}

fn register_target(ctx: &mut StatementContext, target: &Expr) {
    if let Some(name) = target.as_name() {
        if !ctx.new_vars.iter().any(|v| v == name) {
            ctx.new_vars.push(name.to_string());
        }
    }
}
