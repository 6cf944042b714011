//! Mutation-based bug injection for benchmark datasets.
//!
//! Walks method bodies for assignments, declarations, and returns whose
//! right-hand side is arithmetic, and derives four perturbations of each:
//! operator flip, literal perturbation, variable swap, and all three
//! combined. The RNG and the swap pool are explicit inputs -- reproducible
//! runs just seed the RNG.

use rand::Rng;

use veriloc_analysis::ast::{BinOp, Expr, Lit, Method, Rhs, Span, Stmt, StmtKind};
use veriloc_analysis::subst::names_in;
use veriloc_lemma::render_stmt;

/// The four perturbation families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    OperatorFlip,
    LiteralPerturb,
    VariableSwap,
    Combined,
}

impl MutationKind {
    pub const ALL: [MutationKind; 4] = [
        MutationKind::OperatorFlip,
        MutationKind::LiteralPerturb,
        MutationKind::VariableSwap,
        MutationKind::Combined,
    ];
}

/// One injected bug: the statement span to splice over and its replacement.
#[derive(Debug, Clone)]
pub struct Mutation {
    pub member: String,
    pub span: Span,
    pub line: u32,
    pub kind: MutationKind,
    /// Replacement statement text.
    pub replacement: String,
}

/// Derive every mutation for one method.
pub fn mutate_method(method: &Method, rng: &mut impl Rng) -> Vec<Mutation> {
    let mut out = Vec::new();
    collect(&method.body, method, rng, &mut out);
    tracing::debug!(method = %method.name, mutations = out.len(), "derived mutations");
    out
}

fn collect(stmts: &[Stmt], method: &Method, rng: &mut impl Rng, out: &mut Vec<Mutation>) {
    for stmt in stmts {
        match &stmt.kind {
            StmtKind::Update { .. } | StmtKind::Return { .. } => {
                mutate_stmt(stmt, method, rng, out);
            }
            StmtKind::VarDecl { init, .. } => {
                if let Some(init) = init.as_deref() {
                    // The declaration is the statement in the source; the
                    // init update carries the expressions.
                    mutate_decl(stmt, init, method, rng, out);
                }
            }
            StmtKind::Block(body) => collect(body, method, rng, out),
            StmtKind::If {
                then_body,
                else_body,
                ..
            } => {
                collect(then_body, method, rng, out);
                if let Some(els) = else_body.as_deref() {
                    collect(std::slice::from_ref(els), method, rng, out);
                }
            }
            StmtKind::While { body, .. } | StmtKind::For { body, .. } => {
                collect(body, method, rng, out)
            }
            StmtKind::AlternativeIf { arms } => {
                for arm in arms {
                    collect(&arm.body, method, rng, out);
                }
            }
            _ => {}
        }
    }
}

fn rhs_values(kind: &StmtKind) -> Option<&[Rhs]> {
    match kind {
        StmtKind::Update { values, .. } => Some(values),
        StmtKind::Return { values } => Some(values),
        _ => None,
    }
}

fn with_rhs_values(kind: &StmtKind, values: Vec<Rhs>) -> Option<StmtKind> {
    match kind {
        StmtKind::Update { targets, .. } => Some(StmtKind::Update {
            targets: targets.clone(),
            values,
        }),
        StmtKind::Return { .. } => Some(StmtKind::Return { values }),
        _ => None,
    }
}

fn mutate_stmt(stmt: &Stmt, method: &Method, rng: &mut impl Rng, out: &mut Vec<Mutation>) {
    let Some(values) = rhs_values(&stmt.kind) else {
        return;
    };
    for (slot, value) in values.iter().enumerate() {
        let Rhs::Expr(expr) = value else { continue };
        if !is_arithmetic(expr) {
            continue;
        }
        for kind in MutationKind::ALL {
            let mutated = apply_mutation(expr, kind, rng);
            if mutated == *expr {
                continue;
            }
            let mut new_values = values.to_vec();
            new_values[slot] = Rhs::Expr(mutated);
            let Some(new_kind) = with_rhs_values(&stmt.kind, new_values) else {
                continue;
            };
            let patched = Stmt {
                id: stmt.id,
                span: stmt.span,
                kind: new_kind,
            };
            if let Some(replacement) = render_stmt(&patched) {
                out.push(Mutation {
                    member: method.name.clone(),
                    span: stmt.span,
                    line: stmt.span.start.line,
                    kind,
                    replacement,
                });
            }
        }
    }
}

/// Mutations for `var x := <arith>` splice over the whole declaration.
fn mutate_decl(
    decl: &Stmt,
    init: &Stmt,
    method: &Method,
    rng: &mut impl Rng,
    out: &mut Vec<Mutation>,
) {
    let (StmtKind::VarDecl { locals, .. }, Some(values)) = (&decl.kind, rhs_values(&init.kind))
    else {
        return;
    };
    for (slot, value) in values.iter().enumerate() {
        let Rhs::Expr(expr) = value else { continue };
        if !is_arithmetic(expr) {
            continue;
        }
        for kind in MutationKind::ALL {
            let mutated = apply_mutation(expr, kind, rng);
            if mutated == *expr {
                continue;
            }
            let mut new_values = values.to_vec();
            new_values[slot] = Rhs::Expr(mutated);
            let Some(new_init_kind) = with_rhs_values(&init.kind, new_values) else {
                continue;
            };
            let new_init = Stmt {
                id: init.id,
                span: init.span,
                kind: new_init_kind,
            };
            let patched = Stmt {
                id: decl.id,
                span: decl.span,
                kind: StmtKind::VarDecl {
                    locals: locals.clone(),
                    init: Some(Box::new(new_init)),
                },
            };
            if let Some(replacement) = render_stmt(&patched) {
                out.push(Mutation {
                    member: method.name.clone(),
                    span: decl.span,
                    line: decl.span.start.line,
                    kind,
                    replacement,
                });
            }
        }
    }
}

/// Only arithmetic right-hand sides are worth perturbing.
fn is_arithmetic(expr: &Expr) -> bool {
    matches!(expr, Expr::Binary { op, .. } if op.is_arithmetic())
}

fn apply_mutation(expr: &Expr, kind: MutationKind, rng: &mut impl Rng) -> Expr {
    match kind {
        MutationKind::OperatorFlip => flip_operators(expr),
        MutationKind::LiteralPerturb => perturb_literals(expr, rng),
        MutationKind::VariableSwap => {
            let pool = names_in(expr);
            if pool.is_empty() {
                expr.clone()
            } else {
                swap_variables(expr, &pool, rng)
            }
        }
        MutationKind::Combined => {
            let pool = names_in(expr);
            combine_all(expr, &pool, rng)
        }
    }
}

fn flip_op(op: BinOp) -> BinOp {
    match op {
        BinOp::Add => BinOp::Sub,
        BinOp::Sub => BinOp::Add,
        BinOp::Div => BinOp::Mul,
        BinOp::Mul => BinOp::Div,
        BinOp::Mod => BinOp::Div,
        other => other,
    }
}

fn flip_operators(expr: &Expr) -> Expr {
    match expr {
        Expr::Binary { op, lhs, rhs } => Expr::Binary {
            op: flip_op(*op),
            lhs: Box::new(flip_operators(lhs)),
            rhs: Box::new(flip_operators(rhs)),
        },
        other => other.clone(),
    }
}

fn perturb_literals(expr: &Expr, rng: &mut impl Rng) -> Expr {
    match expr {
        Expr::Binary { op, lhs, rhs } => Expr::Binary {
            op: *op,
            lhs: Box::new(perturb_literals(lhs, rng)),
            rhs: Box::new(perturb_literals(rhs, rng)),
        },
        Expr::Lit(Lit::Int(n)) if *n > 0 => Expr::int(rng.gen_range(-*n..*n)),
        other => other.clone(),
    }
}

fn swap_variables(expr: &Expr, pool: &[String], rng: &mut impl Rng) -> Expr {
    match expr {
        Expr::Binary { op, lhs, rhs } => Expr::Binary {
            op: *op,
            lhs: Box::new(swap_variables(lhs, pool, rng)),
            rhs: Box::new(swap_variables(rhs, pool, rng)),
        },
        Expr::Name(_) => {
            let pick = rng.gen_range(0..pool.len());
            Expr::name(pool[pick].clone())
        }
        other => other.clone(),
    }
}

fn combine_all(expr: &Expr, pool: &[String], rng: &mut impl Rng) -> Expr {
    match expr {
        Expr::Binary { op, lhs, rhs } => Expr::Binary {
            op: flip_op(*op),
            lhs: Box::new(combine_all(lhs, pool, rng)),
            rhs: Box::new(combine_all(rhs, pool, rng)),
        },
        Expr::Name(_) if !pool.is_empty() => {
            let pick = rng.gen_range(0..pool.len());
            Expr::name(pool[pick].clone())
        }
        Expr::Lit(Lit::Int(n)) if *n > 0 => Expr::int(rng.gen_range(-*n..*n)),
        other => other.clone(),
    }
}
