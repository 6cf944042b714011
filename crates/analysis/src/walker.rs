//! The procedure walker: drives the state propagator across a whole method
//! body, owns the live "current state" register, and checkpoints entailment
//! obligations at loop phases and at the end of the body.
//!
//! The walker contains no per-statement logic of its own -- it sequences
//! transformer invocations, maintains the variable table, and records the
//! bookkeeping the localizer needs later (guard predicate identities,
//! verification-statement snapshots, the pending break register).

use std::collections::HashMap;

use crate::ast::{
    BinOp, Expr, Formal, Method, Pattern, Program, Rhs, Stmt, StmtId, StmtKind, Ty,
};
use crate::diagnostics::{Diagnostics, UnsupportedConstruct};
use crate::entailment::{
    matching_discharges, normalize_invariant_obligations, Obligation, ProofPhase, StateSnapshot,
};
use crate::predicate::{
    DisjunctiveState, PredId, PredicateFactory, PredicateKind, StmtRef,
};
use crate::propagate;

/// Everything one member's walk produces. Input to the lemma serializer and
/// the localizer.
#[derive(Debug)]
pub struct MemberAnalysis {
    pub method_name: String,
    /// Obligations in emission order; the index is the `check_<i>` identity.
    pub obligations: Vec<Obligation>,
    /// Formals plus every variable introduced by assignments and loop
    /// indices -- the parameter list of every generated lemma.
    pub variables: Vec<Formal>,
    /// For each `if` statement, the identity of its guard predicate. The
    /// localizer resolves `Else` blame through this.
    pub guard_preds: HashMap<StmtId, PredId>,
    pub diagnostics: Vec<UnsupportedConstruct>,
}

/// Walk a method and produce its obligations.
///
/// This is the core entry point: seed the state from the requires clauses,
/// propagate through the body, checkpoint the postcondition at the end, and
/// normalize invariant obligations once everything is emitted.
pub fn analyze_method(program: &Program, method: &Method) -> MemberAnalysis {
    tracing::info!(method = %method.name, "analyzing member");
    let mut walk = MemberWalk::new(program, method);
    for stmt in &method.body {
        walk.walk_stmt(stmt);
    }
    walk.checkpoint_postcondition();
    normalize_invariant_obligations(&mut walk.obligations, &mut walk.diags);
    tracing::debug!(
        method = %method.name,
        obligations = walk.obligations.len(),
        branches = walk.state.branch_count(),
        "walk complete"
    );
    walk.finish()
}

struct MemberWalk<'a> {
    program: &'a Program,
    method: &'a Method,
    state: DisjunctiveState,
    obligations: Vec<Obligation>,
    variables: Vec<Formal>,
    /// Declared types for name resolution when assignments introduce
    /// variables (formals, locals, loop indices).
    var_types: HashMap<String, Ty>,
    snapshots: Vec<StateSnapshot>,
    /// Pending break whose barrier is still propagating outward.
    control_flow: Option<BreakRecord>,
    guard_preds: HashMap<StmtId, PredId>,
    factory: PredicateFactory,
    diags: Diagnostics,
}

struct BreakRecord {
    pred: PredId,
    target: Option<StmtId>,
}

impl<'a> MemberWalk<'a> {
    fn new(program: &'a Program, method: &'a Method) -> Self {
        let mut factory = PredicateFactory::new();
        let mut state = DisjunctiveState::initial();
        for req in &method.requires {
            let pred = factory.make(req.clone(), None, PredicateKind::Requires, false);
            state.append(&pred);
        }
        let mut var_types = HashMap::new();
        let mut variables = Vec::new();
        for formal in method.ins.iter().chain(method.outs.iter()) {
            var_types.insert(formal.name.clone(), formal.ty.clone());
            variables.push(formal.clone());
        }
        Self {
            program,
            method,
            state,
            obligations: Vec::new(),
            variables,
            var_types,
            snapshots: Vec::new(),
            control_flow: None,
            guard_preds: HashMap::new(),
            factory,
            diags: Diagnostics::new(),
        }
    }

    fn finish(self) -> MemberAnalysis {
        MemberAnalysis {
            method_name: self.method.name.clone(),
            obligations: self.obligations,
            variables: self.variables,
            guard_preds: self.guard_preds,
            diagnostics: self.diags.into_items(),
        }
    }

    fn sref(&self, stmt: &Stmt) -> StmtRef {
        StmtRef {
            id: stmt.id,
            line: stmt.span.start.line,
        }
    }

    fn walk_all(&mut self, stmts: &[Stmt]) {
        for s in stmts {
            self.walk_stmt(s);
        }
    }

    fn walk_stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Block(body) => self.walk_all(body),
            StmtKind::VarDecl { locals, init } => {
                for local in locals {
                    self.var_types
                        .insert(local.name.clone(), local.ty.clone());
                }
                if let Some(init) = init {
                    self.walk_stmt(init);
                }
            }
            StmtKind::Update { targets, values } => {
                let ctx = propagate::update(
                    self.sref(stmt),
                    targets,
                    values,
                    &self.state,
                    &self.program.callees,
                    &mut self.factory,
                    &mut self.diags,
                );
                self.adopt(ctx);
            }
            StmtKind::If {
                guard,
                then_body,
                else_body,
            } => self.walk_if(stmt, guard.as_ref(), then_body, else_body.as_deref()),
            StmtKind::AlternativeIf { arms } => {
                let before = self.state.clone();
                let mut merged = DisjunctiveState::from_branches(Vec::new());
                for arm in arms {
                    let aref = StmtRef {
                        id: stmt.id,
                        line: arm.span.start.line,
                    };
                    let ctx = propagate::guard(
                        aref,
                        Some(&arm.guard),
                        PredicateKind::Default,
                        &before,
                        &mut self.factory,
                    );
                    self.state = ctx.state_after;
                    self.walk_all(&arm.body);
                    merged = merged.union(std::mem::take(&mut self.state));
                }
                self.state = merged;
            }
            StmtKind::While {
                guard,
                invariants,
                body,
            } => {
                let sref = self.sref(stmt);
                self.run_loop(sref, stmt.id, guard.as_ref(), invariants, body);
            }
            StmtKind::For {
                index,
                start,
                end,
                up,
                invariants,
                body,
            } => self.walk_for(stmt, index, start, end, *up, invariants, body),
            StmtKind::AlternativeLoop { invariants, arms } => {
                let before = self.state.clone();
                let mut merged = DisjunctiveState::from_branches(Vec::new());
                for arm in arms {
                    let aref = StmtRef {
                        id: stmt.id,
                        line: arm.span.start.line,
                    };
                    self.state = before.clone();
                    self.run_loop(aref, stmt.id, Some(&arm.guard), invariants, &arm.body);
                    merged = merged.union(std::mem::take(&mut self.state));
                }
                self.state = merged;
            }
            StmtKind::Match { scrutinee, cases } => self.walk_match(stmt, scrutinee, cases),
            StmtKind::Return { values } => self.walk_return(stmt, values),
            StmtKind::Break { target } => {
                let ctx = propagate::break_stmt(self.sref(stmt), &self.state, &mut self.factory);
                let pred = ctx.appended[0].id;
                self.state = ctx.state_after;
                self.control_flow = Some(BreakRecord {
                    pred,
                    target: *target,
                });
            }
            StmtKind::AssignSuchThat { constraint, .. } => {
                let ctx = propagate::assign_such_that(
                    self.sref(stmt),
                    constraint,
                    &self.state,
                    &mut self.factory,
                );
                self.state = ctx.state_after;
            }
            StmtKind::Assert { .. }
            | StmtKind::Assume { .. }
            | StmtKind::Expect { .. }
            | StmtKind::Reveal { .. }
            | StmtKind::Calc { .. } => {
                // The logical state is unchanged; the snapshot lets the
                // obligation builder replay this statement as a discharge.
                self.snapshots.push(StateSnapshot {
                    stmt: self.sref(stmt),
                    branches: self.state.id_lists(),
                });
            }
            StmtKind::Opaque { .. } => {
                self.diags.record(
                    "propagate",
                    "statement: Opaque",
                    Some(stmt.span.start.line),
                );
            }
        }
    }

    fn adopt(&mut self, ctx: propagate::StatementContext) {
        for name in &ctx.new_vars {
            self.register_var(name);
        }
        self.state = ctx.state_after;
    }

    fn register_var(&mut self, name: &str) {
        if self.variables.iter().any(|v| v.name == name) {
            return;
        }
        let ty = self
            .var_types
            .get(name)
            .cloned()
            .unwrap_or(Ty::Int);
        self.variables.push(Formal::new(name, ty));
    }

    fn walk_if(
        &mut self,
        stmt: &Stmt,
        guard: Option<&Expr>,
        then_body: &[Stmt],
        else_body: Option<&Stmt>,
    ) {
        let sref = self.sref(stmt);
        let before = self.state.clone();

        let ctx = propagate::guard(
            sref,
            guard,
            PredicateKind::Default,
            &before,
            &mut self.factory,
        );
        if let Some(first) = ctx.appended.first() {
            self.guard_preds.insert(stmt.id, first.id);
        }
        self.state = ctx.state_after;
        self.walk_all(then_body);
        let after_then = std::mem::take(&mut self.state);

        match else_body {
            Some(els) => {
                if let Some(g) = guard {
                    let neg = Expr::not(g.clone());
                    // An else-if chain appends the negation as a plain fact;
                    // a final else block marks it Else so blame can be
                    // inherited from the guard.
                    let kind = if matches!(els.kind, StmtKind::If { .. }) {
                        PredicateKind::Default
                    } else {
                        PredicateKind::Else
                    };
                    let ctx_else =
                        propagate::guard(sref, Some(&neg), kind, &before, &mut self.factory);
                    self.state = ctx_else.state_after;
                } else {
                    self.state = before;
                }
                self.walk_stmt(els);
            }
            None => {
                if let Some(g) = guard {
                    let neg = Expr::not(g.clone());
                    let ctx_else = propagate::guard(
                        sref,
                        Some(&neg),
                        PredicateKind::Else,
                        &before,
                        &mut self.factory,
                    );
                    self.state = ctx_else.state_after;
                } else {
                    self.state = before;
                }
            }
        }
        let after_else = std::mem::take(&mut self.state);
        self.state = after_then.union(after_else);
    }

    /// The three-phase loop protocol shared by while loops, for loops
    /// (which wrap it with index bookkeeping), and alternative-loop arms.
    fn run_loop(
        &mut self,
        sref: StmtRef,
        loop_id: StmtId,
        guard: Option<&Expr>,
        invariants: &[Expr],
        body: &[Stmt],
    ) {
        // (1) Init: invariants must follow from the pre-state.
        self.checkpoint_invariants(invariants, ProofPhase::Init);

        // (2) Body: only requires-facts plus the guard survive entry.
        let ctx = propagate::loop_entry(sref, guard, &self.state, &mut self.factory);
        self.state = ctx.state_after;
        self.walk_all(body);
        self.checkpoint_invariants(invariants, ProofPhase::Maintain);

        self.resolve_break(loop_id);

        // (3) Terminate: invariants and the negated guard survive the loop.
        match guard {
            Some(g) => {
                let ctx_exit = propagate::loop_exit(sref, g, &self.state, &mut self.factory);
                self.state = ctx_exit.state_after;
            }
            None => {
                self.state = self.state.retain_requires();
            }
        }
        self.checkpoint_invariants(invariants, ProofPhase::Terminate);
        self.seed_invariants(invariants);
    }

    fn walk_for(
        &mut self,
        stmt: &Stmt,
        index: &Formal,
        start: &Expr,
        end: &Expr,
        up: bool,
        invariants: &[Expr],
        body: &[Stmt],
    ) {
        let sref = self.sref(stmt);
        let idx = Expr::name(index.name.clone());

        // index == start precedes the Init proof.
        let init_eq = Expr::eq(idx.clone(), start.clone());
        let ctx = propagate::loop_index(sref, init_eq, &self.state, &mut self.factory);
        self.state = ctx.state_after;
        self.var_types
            .insert(index.name.clone(), index.ty.clone());
        self.register_var(&index.name);

        self.checkpoint_invariants(invariants, ProofPhase::Init);

        let guard_op = if up { BinOp::Lt } else { BinOp::Gt };
        let guard_expr = Expr::binary(guard_op, idx.clone(), end.clone());
        let ctx = propagate::loop_entry(sref, Some(&guard_expr), &self.state, &mut self.factory);
        self.state = ctx.state_after;
        self.walk_all(body);

        // index == index ± 1 precedes the Maintain proof.
        let step_op = if up { BinOp::Add } else { BinOp::Sub };
        let step = Expr::eq(
            idx.clone(),
            Expr::binary(step_op, idx.clone(), Expr::int(1)),
        );
        let ctx = propagate::loop_index(sref, step, &self.state, &mut self.factory);
        self.state = ctx.state_after;
        self.checkpoint_invariants(invariants, ProofPhase::Maintain);

        self.resolve_break(stmt.id);

        let ctx = propagate::loop_exit(sref, &guard_expr, &self.state, &mut self.factory);
        self.state = ctx.state_after;
        self.checkpoint_invariants(invariants, ProofPhase::Terminate);
        self.seed_invariants(invariants);
    }

    /// If the pending break targets this loop, the exit state legitimately
    /// reflects control resuming here: clear the barrier. Otherwise it keeps
    /// propagating outward.
    fn resolve_break(&mut self, loop_id: StmtId) {
        if let Some(cf) = &self.control_flow {
            let targets_me = cf.target.map_or(true, |t| t == loop_id);
            if targets_me {
                self.state.clear_barrier(cf.pred);
                self.control_flow = None;
            }
        }
    }

    fn walk_match(&mut self, stmt: &Stmt, scrutinee: &Expr, cases: &[crate::ast::MatchCase]) {
        let before = self.state.clone();
        let mut merged = DisjunctiveState::from_branches(Vec::new());
        let mut prior_guards: Vec<Expr> = Vec::new();

        for case in cases {
            let cref = StmtRef {
                id: stmt.id,
                line: case.span.start.line,
            };
            let (guard_expr, binds): (Expr, Vec<(Formal, String)>) = match &case.pattern {
                Pattern::Ctor {
                    name,
                    binds,
                    fields,
                } => {
                    let tag_test =
                        Expr::paren(Expr::field(scrutinee.clone(), format!("{name}?")));
                    let pairs = binds
                        .iter()
                        .cloned()
                        .zip(fields.iter().cloned())
                        .collect();
                    (tag_test, pairs)
                }
                Pattern::Lit(lit) => (
                    Expr::paren(Expr::eq(scrutinee.clone(), Expr::Lit(lit.clone()))),
                    Vec::new(),
                ),
                Pattern::Wildcard => {
                    // Conjunction of the negations of all prior tag tests.
                    let mut neg = None;
                    for g in &prior_guards {
                        let n = Expr::not(g.clone());
                        neg = Some(match neg {
                            None => n,
                            Some(acc) => Expr::and(acc, n),
                        });
                    }
                    (
                        Expr::paren(neg.unwrap_or_else(|| Expr::bool(true))),
                        Vec::new(),
                    )
                }
            };
            prior_guards.push(guard_expr.clone());

            let ctx = propagate::guard(
                cref,
                Some(&guard_expr),
                PredicateKind::Default,
                &before,
                &mut self.factory,
            );
            self.state = ctx.state_after;

            // Field destructuring runs as synthesized updates ahead of the
            // case body.
            for (bind, field) in &binds {
                self.var_types
                    .insert(bind.name.clone(), bind.ty.clone());
                let ctx = propagate::update(
                    cref,
                    &[Expr::name(bind.name.clone())],
                    &[Rhs::Expr(Expr::field(scrutinee.clone(), field.clone()))],
                    &self.state,
                    &self.program.callees,
                    &mut self.factory,
                    &mut self.diags,
                );
                self.adopt(ctx);
            }

            self.walk_all(&case.body);
            merged = merged.union(std::mem::take(&mut self.state));
        }
        self.state = merged;
    }

    fn walk_return(&mut self, stmt: &Stmt, values: &[Rhs]) {
        let sref = self.sref(stmt);
        if !values.is_empty() && !self.method.outs.is_empty() {
            // The hidden update binds the out-parameters, then the appended
            // facts become Return terminators.
            let targets: Vec<Expr> = self
                .method
                .outs
                .iter()
                .map(|o| Expr::name(o.name.clone()))
                .collect();
            let ctx = propagate::update(
                sref,
                &targets,
                values,
                &self.state,
                &self.program.callees,
                &mut self.factory,
                &mut self.diags,
            );
            let appended = ctx.appended_ids();
            self.adopt(ctx);
            self.state.mark_return(&appended);
        } else {
            // A bare return closes every open branch.
            let marker = self.factory.make(
                Expr::bool(true),
                Some(sref),
                PredicateKind::Return,
                false,
            );
            self.state.append(&marker);
        }
    }

    fn checkpoint_invariants(&mut self, invariants: &[Expr], phase: ProofPhase) {
        let rhs: Vec<Expr> = match phase {
            ProofPhase::Init | ProofPhase::Maintain => invariants.to_vec(),
            ProofPhase::Terminate => self.method.ensures.clone(),
            ProofPhase::Postcondition => unreachable!("postcondition uses its own checkpoint"),
        };
        let lhs_invariants: Vec<Expr> = match phase {
            ProofPhase::Maintain | ProofPhase::Terminate => invariants.to_vec(),
            _ => Vec::new(),
        };
        for branch in &self.state.branches {
            let ids: Vec<PredId> = branch.iter().map(|p| p.id).collect();
            let discharges = matching_discharges(&ids, &self.snapshots);
            self.obligations.push(Obligation {
                lhs: branch.clone(),
                lhs_invariants: lhs_invariants.clone(),
                rhs: rhs.clone(),
                discharges,
                phase,
            });
        }
    }

    fn checkpoint_postcondition(&mut self) {
        for branch in &self.state.branches {
            let ids: Vec<PredId> = branch.iter().map(|p| p.id).collect();
            let discharges = matching_discharges(&ids, &self.snapshots);
            self.obligations.push(Obligation {
                lhs: branch.clone(),
                lhs_invariants: Vec::new(),
                rhs: self.method.ensures.clone(),
                discharges,
                phase: ProofPhase::Postcondition,
            });
        }
    }

    /// Once a loop terminates, its invariants are what the following code
    /// may rely on: re-seed them into every branch. Equality invariants act
    /// as bindings and take part in update folding.
    fn seed_invariants(&mut self, invariants: &[Expr]) {
        for inv in invariants {
            let is_update = matches!(
                inv,
                Expr::Binary {
                    op: BinOp::Eq,
                    ..
                }
            );
            let pred = self
                .factory
                .make(inv.clone(), None, PredicateKind::Invariant, is_update);
            self.state.append(&pred);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Pos, Span};

    fn stmt(id: StmtId, line: u32, kind: StmtKind) -> Stmt {
        Stmt {
            id,
            span: Span::line(line),
            kind,
        }
    }

    fn method(body: Vec<Stmt>) -> Method {
        Method {
            name: "m".into(),
            ins: vec![Formal::new("x", Ty::Int)],
            outs: vec![Formal::new("y", Ty::Int)],
            requires: vec![Expr::binary(BinOp::Ge, Expr::name("x"), Expr::int(0))],
            ensures: vec![Expr::binary(BinOp::Ge, Expr::name("y"), Expr::int(0))],
            body,
            span: Span {
                start: Pos::new(1, 1),
                end: Pos::new(20, 2),
            },
        }
    }

    fn program(m: Method) -> Program {
        Program {
            path: "test.dfy".into(),
            methods: vec![m],
            callees: Default::default(),
        }
    }

    fn assign(id: StmtId, line: u32, name: &str, value: Expr) -> Stmt {
        stmt(
            id,
            line,
            StmtKind::Update {
                targets: vec![Expr::name(name)],
                values: vec![Rhs::Expr(value)],
            },
        )
    }

    #[test]
    fn straight_line_body_yields_one_postcondition_obligation() {
        let prog = program(method(vec![assign(1, 2, "y", Expr::name("x"))]));
        let analysis = analyze_method(&prog, &prog.methods[0]);
        assert_eq!(analysis.obligations.len(), 1);
        let ob = &analysis.obligations[0];
        assert_eq!(ob.phase, ProofPhase::Postcondition);
        // requires fact + update fact
        assert_eq!(ob.lhs.len(), 2);
        assert_eq!(ob.lhs[0].kind, PredicateKind::Requires);
        assert!(ob.lhs[1].is_update);
        assert_eq!(ob.rhs, prog.methods[0].ensures);
    }

    #[test]
    fn conditional_conserves_branches() {
        // if x > 0 { y := 1 } else { y := -1 } -- two straight-line arms,
        // so the merged state has exactly two branches.
        let body = vec![stmt(
            1,
            2,
            StmtKind::If {
                guard: Some(Expr::binary(BinOp::Gt, Expr::name("x"), Expr::int(0))),
                then_body: vec![assign(2, 3, "y", Expr::int(1))],
                else_body: Some(Box::new(stmt(
                    3,
                    4,
                    StmtKind::Block(vec![assign(4, 5, "y", Expr::int(-1))]),
                ))),
            },
        )];
        let prog = program(method(body));
        let analysis = analyze_method(&prog, &prog.methods[0]);
        // One postcondition obligation per branch.
        assert_eq!(analysis.obligations.len(), 2);
        // The else branch carries an Else-kind negated guard.
        let else_ob = &analysis.obligations[1];
        assert!(else_ob
            .lhs
            .iter()
            .any(|p| p.kind == PredicateKind::Else));
        // The guard predicate identity was recorded for blame inheritance.
        assert!(analysis.guard_preds.contains_key(&1));
    }

    #[test]
    fn while_loop_emits_three_phases() {
        let body = vec![stmt(
            1,
            2,
            StmtKind::While {
                guard: Some(Expr::binary(BinOp::Lt, Expr::name("y"), Expr::int(10))),
                invariants: vec![Expr::binary(BinOp::Ge, Expr::name("y"), Expr::int(0))],
                body: vec![assign(
                    2,
                    3,
                    "y",
                    Expr::binary(BinOp::Add, Expr::name("y"), Expr::int(1)),
                )],
            },
        )];
        let prog = program(method(body));
        let analysis = analyze_method(&prog, &prog.methods[0]);
        let phases: Vec<ProofPhase> = analysis.obligations.iter().map(|o| o.phase).collect();
        assert_eq!(
            phases,
            vec![
                ProofPhase::Init,
                ProofPhase::Maintain,
                ProofPhase::Terminate,
                ProofPhase::Postcondition,
            ]
        );
        // Maintain and Terminate assume the invariants on the left.
        assert!(analysis.obligations[0].lhs_invariants.is_empty());
        assert_eq!(analysis.obligations[1].lhs_invariants.len(), 1);
        assert_eq!(analysis.obligations[2].lhs_invariants.len(), 1);
        // Terminate entails the postcondition, not the invariant.
        assert_eq!(analysis.obligations[2].rhs, prog.methods[0].ensures);
        // The body facts do not survive the loop: the final state carries
        // requires + ¬guard + re-seeded invariant.
        let post = &analysis.obligations[3];
        assert_eq!(post.phase, ProofPhase::Postcondition);
        assert!(post.lhs.iter().any(|p| p.kind == PredicateKind::Invariant));
        assert!(!post.lhs.iter().any(|p| p.is_update && p.stmt.is_some()));
    }

    #[test]
    fn return_truncates_branch() {
        let body = vec![
            stmt(
                1,
                2,
                StmtKind::Return {
                    values: vec![Rhs::Expr(Expr::int(0))],
                },
            ),
            assign(2, 3, "y", Expr::int(99)),
        ];
        let prog = program(method(body));
        let analysis = analyze_method(&prog, &prog.methods[0]);
        let ob = &analysis.obligations[0];
        // requires + the returned binding; the unreachable assignment after
        // the return appended nothing.
        assert_eq!(ob.lhs.len(), 2);
        assert_eq!(ob.lhs[1].kind, PredicateKind::Return);
        assert_eq!(
            ob.lhs[1].expr,
            Expr::eq(Expr::name("y"), Expr::int(0)),
        );
    }

    #[test]
    fn assert_snapshot_becomes_discharge() {
        let body = vec![
            assign(1, 2, "y", Expr::int(1)),
            stmt(
                2,
                3,
                StmtKind::Assert {
                    expr: Expr::binary(BinOp::Gt, Expr::name("y"), Expr::int(0)),
                },
            ),
        ];
        let prog = program(method(body));
        let analysis = analyze_method(&prog, &prog.methods[0]);
        assert_eq!(analysis.obligations[0].discharges.len(), 1);
        assert_eq!(analysis.obligations[0].discharges[0].id, 2);
        assert_eq!(analysis.obligations[0].discharges[0].line, 3);
    }

    #[test]
    fn for_loop_carries_index_facts() {
        let body = vec![stmt(
            1,
            2,
            StmtKind::For {
                index: Formal::new("i", Ty::Int),
                start: Expr::int(0),
                end: Expr::name("x"),
                up: true,
                invariants: vec![Expr::binary(BinOp::Ge, Expr::name("i"), Expr::int(0))],
                body: vec![assign(
                    2,
                    3,
                    "y",
                    Expr::binary(BinOp::Add, Expr::name("y"), Expr::int(1)),
                )],
            },
        )];
        let prog = program(method(body));
        let analysis = analyze_method(&prog, &prog.methods[0]);
        // Init obligation sees index == start.
        let init = &analysis.obligations[0];
        assert_eq!(init.phase, ProofPhase::Init);
        assert!(init
            .lhs
            .iter()
            .any(|p| p.expr == Expr::eq(Expr::name("i"), Expr::int(0))));
        // Maintain obligation sees the increment equation.
        let maintain = &analysis.obligations[1];
        assert!(maintain.lhs.iter().any(|p| p.expr
            == Expr::eq(
                Expr::name("i"),
                Expr::binary(BinOp::Add, Expr::name("i"), Expr::int(1)),
            )));
        // The index became a lemma parameter.
        assert!(analysis.variables.iter().any(|v| v.name == "i"));
    }

    #[test]
    fn break_targeting_loop_reopens_exit_state() {
        // while y < 10 { break; } y := 5 -- the assignment after the loop
        // must land in the exit state because the barrier was cleared.
        let body = vec![
            stmt(
                1,
                2,
                StmtKind::While {
                    guard: Some(Expr::binary(BinOp::Lt, Expr::name("y"), Expr::int(10))),
                    invariants: vec![],
                    body: vec![stmt(2, 3, StmtKind::Break { target: None })],
                },
            ),
            assign(3, 5, "y", Expr::int(5)),
        ];
        let prog = program(method(body));
        let analysis = analyze_method(&prog, &prog.methods[0]);
        let post = analysis
            .obligations
            .iter()
            .find(|o| o.phase == ProofPhase::Postcondition)
            .unwrap();
        assert!(post
            .lhs
            .iter()
            .any(|p| p.expr == Expr::eq(Expr::name("y"), Expr::int(5))));
    }

    #[test]
    fn match_desugars_to_exclusive_branches() {
        // match x { case 0 => y := 1 case _ => y := 2 }
        let body = vec![stmt(
            1,
            2,
            StmtKind::Match {
                scrutinee: Expr::name("x"),
                cases: vec![
                    crate::ast::MatchCase {
                        pattern: Pattern::Lit(crate::ast::Lit::Int(0)),
                        span: Span::line(3),
                        body: vec![assign(2, 3, "y", Expr::int(1))],
                    },
                    crate::ast::MatchCase {
                        pattern: Pattern::Wildcard,
                        span: Span::line(4),
                        body: vec![assign(3, 4, "y", Expr::int(2))],
                    },
                ],
            },
        )];
        let prog = program(method(body));
        let analysis = analyze_method(&prog, &prog.methods[0]);
        assert_eq!(analysis.obligations.len(), 2);
        // The wildcard arm's guard is the negated first tag test.
        let fallback = &analysis.obligations[1];
        let has_negation = fallback.lhs.iter().any(|p| {
            matches!(&p.expr, Expr::Paren(inner)
                if matches!(**inner, Expr::Unary { op: crate::ast::UnOp::Not, .. }))
        });
        assert!(has_negation);
    }
}
