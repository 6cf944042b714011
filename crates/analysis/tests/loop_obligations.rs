//! Three-phase loop protocol against a realistic summation method.

use veriloc_analysis::ast::{
    BinOp, Expr, Formal, Method, Pos, Program, Rhs, Span, Stmt, StmtId, StmtKind, Ty,
};
use veriloc_analysis::{analyze_method, localize, PredicateKind, ProofPhase};

fn stmt(id: StmtId, line: u32, kind: StmtKind) -> Stmt {
    Stmt {
        id,
        span: Span::line(line),
        kind,
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

/// method Sum(n: int) returns (s: int)
///   requires n >= 0
///   ensures s == n
/// {
///   var i := 0;               // line 4
///   s := 0;                   // line 5
///   while i < n               // line 6
///     invariant i <= n
///     invariant s == i
///   {
///     s := s + 1;             // line 9
///     i := i + 1;             // line 10
///   }
/// }
fn sum_method() -> Program {
    let inv_bound = Expr::binary(BinOp::Le, Expr::name("i"), Expr::name("n"));
    let inv_eq = Expr::eq(Expr::name("s"), Expr::name("i"));
    let body = vec![
        stmt(
            1,
            4,
            StmtKind::VarDecl {
                locals: vec![Formal::new("i", Ty::Int)],
                init: Some(Box::new(assign(2, 4, "i", Expr::int(0)))),
            },
        ),
        assign(3, 5, "s", Expr::int(0)),
        stmt(
            4,
            6,
            StmtKind::While {
                guard: Some(Expr::binary(BinOp::Lt, Expr::name("i"), Expr::name("n"))),
                invariants: vec![inv_bound, inv_eq],
                body: vec![
                    assign(5, 9, "s", Expr::binary(BinOp::Add, Expr::name("s"), Expr::int(1))),
                    assign(6, 10, "i", Expr::binary(BinOp::Add, Expr::name("i"), Expr::int(1))),
                ],
            },
        ),
    ];
    let method = Method {
        name: "Sum".into(),
        ins: vec![Formal::new("n", Ty::Int)],
        outs: vec![Formal::new("s", Ty::Int)],
        requires: vec![Expr::binary(BinOp::Ge, Expr::name("n"), Expr::int(0))],
        ensures: vec![Expr::eq(Expr::name("s"), Expr::name("n"))],
        body,
        span: Span {
            start: Pos::new(1, 1),
            end: Pos::new(12, 2),
        },
    };
    Program {
        path: "sum.dfy".into(),
        methods: vec![method],
        callees: Default::default(),
    }
}

#[test]
fn loop_emits_init_maintain_terminate_then_postcondition() {
    let prog = sum_method();
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
}

#[test]
fn init_proof_sees_initializations() {
    let prog = sum_method();
    let analysis = analyze_method(&prog, &prog.methods[0]);
    let init = &analysis.obligations[0];
    // i == 0 and s == 0 are both in scope before the loop. The invariant
    // normalization pass has rewritten the goals against them and dropped
    // the consumed bindings.
    assert!(init.lhs_invariants.is_empty());
    assert_eq!(
        init.rhs,
        vec![
            Expr::binary(BinOp::Le, Expr::int(0), Expr::name("n")),
            Expr::eq(Expr::int(0), Expr::int(0)),
        ]
    );
}

#[test]
fn maintain_proof_carries_invariants_and_body_facts() {
    let prog = sum_method();
    let analysis = analyze_method(&prog, &prog.methods[0]);
    let maintain = &analysis.obligations[1];
    assert_eq!(maintain.phase, ProofPhase::Maintain);
    assert_eq!(maintain.lhs_invariants.len(), 2);
    // The guard fact stays renderable; the body update bindings were
    // consumed by normalization and substituted into the goals.
    let guard = maintain
        .lhs
        .iter()
        .find(|p| p.expr == Expr::binary(BinOp::Lt, Expr::name("i"), Expr::name("n")))
        .expect("guard fact");
    assert!(!guard.folded_out);
    assert!(maintain
        .lhs
        .iter()
        .filter(|p| p.is_update)
        .all(|p| p.folded_out));
    // Goals became the stepped invariants: i + 1 <= n and s + 1 == i + 1.
    let stepped_i = Expr::binary(BinOp::Add, Expr::name("i"), Expr::int(1));
    let stepped_s = Expr::binary(BinOp::Add, Expr::name("s"), Expr::int(1));
    assert_eq!(
        maintain.rhs,
        vec![
            Expr::binary(BinOp::Le, stepped_i.clone(), Expr::name("n")),
            Expr::eq(stepped_s, stepped_i),
        ]
    );
}

#[test]
fn terminate_proof_targets_postcondition_with_invariants_on_lhs() {
    let prog = sum_method();
    let analysis = analyze_method(&prog, &prog.methods[0]);
    let terminate = &analysis.obligations[2];
    assert_eq!(terminate.phase, ProofPhase::Terminate);
    assert_eq!(terminate.lhs_invariants.len(), 2);
    assert_eq!(terminate.rhs, prog.methods[0].ensures);
    // Exit state: requires + ¬guard; body updates are gone.
    assert!(terminate.lhs.iter().any(|p| p.expr
        == Expr::not(Expr::binary(BinOp::Lt, Expr::name("i"), Expr::name("n")))));
    assert!(!terminate.lhs.iter().any(|p| p.is_update));
}

#[test]
fn post_loop_state_is_reseeded_with_invariants() {
    let prog = sum_method();
    let analysis = analyze_method(&prog, &prog.methods[0]);
    let post = &analysis.obligations[3];
    let invariant_facts: Vec<_> = post
        .lhs
        .iter()
        .filter(|p| p.kind == PredicateKind::Invariant)
        .collect();
    assert_eq!(invariant_facts.len(), 2);
    // The equality invariant is a binding and is flagged for folding.
    assert!(invariant_facts.iter().any(|p| p.is_update));
}

#[test]
fn maintain_failure_blames_loop_body_lines() {
    let prog = sum_method();
    let analysis = analyze_method(&prog, &prog.methods[0]);
    let lines = localize(&analysis, &["check_1".to_string()]);
    // The body assignments are suspects; the loop guard fact shares the
    // line of the while statement.
    assert!(lines.contains(&9));
    assert!(lines.contains(&10));
    // Initialization lines took part in verified checks (Init) only.
    assert!(!lines.contains(&4));
    assert!(!lines.contains(&5));
}

#[test]
fn loop_index_variables_become_lemma_parameters() {
    let prog = sum_method();
    let analysis = analyze_method(&prog, &prog.methods[0]);
    let names: Vec<&str> = analysis.variables.iter().map(|v| v.name.as_str()).collect();
    assert!(names.contains(&"n"));
    assert!(names.contains(&"s"));
    assert!(names.contains(&"i"));
}
