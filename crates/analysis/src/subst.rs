//! Expression substitution engine.
//!
//! `substitute` is a structural recursion over the whole expression grammar:
//! compound nodes are rebuilt from substituted children, name nodes are
//! replaced when the identifier matches. Expressions are immutable values,
//! so unmodified subtrees are shared by the rebuild rather than copied in
//! spirit, and the original is never touched.
//!
//! Used for update folding, for instantiating a callee's postcondition at a
//! call site, and for the invariant-normalization pass over obligations.

use crate::ast::{CalleeContract, Expr};
use crate::diagnostics::Diagnostics;

/// Replace every free occurrence of the identifier `var` in `expr` with
/// `replacement`, rebuilding the tree. Quantifiers that re-bind `var`
/// shadow it, so their bodies are left alone.
///
/// `Opaque` nodes cannot be traversed; they are returned unchanged and
/// recorded as a diagnostic -- a known soundness gap, not a failure.
pub fn substitute(expr: &Expr, var: &str, replacement: &Expr, diags: &mut Diagnostics) -> Expr {
    match expr {
        Expr::Name(name) => {
            if name == var {
                replacement.clone()
            } else {
                expr.clone()
            }
        }
        Expr::Lit(_) | Expr::This => expr.clone(),
        Expr::Binary { op, lhs, rhs } => Expr::Binary {
            op: *op,
            lhs: Box::new(substitute(lhs, var, replacement, diags)),
            rhs: Box::new(substitute(rhs, var, replacement, diags)),
        },
        Expr::Unary { op, expr: inner } => Expr::Unary {
            op: *op,
            expr: Box::new(substitute(inner, var, replacement, diags)),
        },
        Expr::Paren(inner) => Expr::Paren(Box::new(substitute(inner, var, replacement, diags))),
        Expr::Chain { operands, ops } => Expr::Chain {
            operands: operands
                .iter()
                .map(|e| substitute(e, var, replacement, diags))
                .collect(),
            ops: ops.clone(),
        },
        Expr::Select { base, indices } => Expr::Select {
            base: Box::new(substitute(base, var, replacement, diags)),
            indices: indices
                .iter()
                .map(|e| substitute(e, var, replacement, diags))
                .collect(),
        },
        Expr::Field { base, name } => Expr::Field {
            base: Box::new(substitute(base, var, replacement, diags)),
            name: name.clone(),
        },
        Expr::Apply { callee, args } => Expr::Apply {
            callee: Box::new(substitute(callee, var, replacement, diags)),
            args: args
                .iter()
                .map(|e| substitute(e, var, replacement, diags))
                .collect(),
        },
        Expr::Quantifier {
            kind,
            bound,
            range,
            term,
        } => {
            if bound.iter().any(|b| b.name == var) {
                expr.clone()
            } else {
                Expr::Quantifier {
                    kind: *kind,
                    bound: bound.clone(),
                    range: range
                        .as_ref()
                        .map(|r| Box::new(substitute(r, var, replacement, diags))),
                    term: Box::new(substitute(term, var, replacement, diags)),
                }
            }
        }
        Expr::Old(inner) => Expr::Old(Box::new(substitute(inner, var, replacement, diags))),
        Expr::Fresh(inner) => Expr::Fresh(Box::new(substitute(inner, var, replacement, diags))),
        Expr::TypeTest { expr: inner, ty } => Expr::TypeTest {
            expr: Box::new(substitute(inner, var, replacement, diags)),
            ty: ty.clone(),
        },
        Expr::Conversion { expr: inner, ty } => Expr::Conversion {
            expr: Box::new(substitute(inner, var, replacement, diags)),
            ty: ty.clone(),
        },
        Expr::Opaque(_) => {
            diags.record("substitute", "expression: Opaque", None);
            expr.clone()
        }
    }
}

/// Replace every occurrence of the subtree `needle` in `expr` with
/// `replacement`, compared structurally. This generalizes [`substitute`] to
/// non-name assignment targets (`a[i]`, `obj.f`) during update folding.
pub fn replace_expr(expr: &Expr, needle: &Expr, replacement: &Expr, diags: &mut Diagnostics) -> Expr {
    if expr == needle {
        return replacement.clone();
    }
    if let Some(name) = needle.as_name() {
        return substitute(expr, name, replacement, diags);
    }
    match expr {
        Expr::Name(_) | Expr::Lit(_) | Expr::This => expr.clone(),
        Expr::Binary { op, lhs, rhs } => Expr::Binary {
            op: *op,
            lhs: Box::new(replace_expr(lhs, needle, replacement, diags)),
            rhs: Box::new(replace_expr(rhs, needle, replacement, diags)),
        },
        Expr::Unary { op, expr: inner } => Expr::Unary {
            op: *op,
            expr: Box::new(replace_expr(inner, needle, replacement, diags)),
        },
        Expr::Paren(inner) => Expr::Paren(Box::new(replace_expr(inner, needle, replacement, diags))),
        Expr::Chain { operands, ops } => Expr::Chain {
            operands: operands
                .iter()
                .map(|e| replace_expr(e, needle, replacement, diags))
                .collect(),
            ops: ops.clone(),
        },
        Expr::Select { base, indices } => Expr::Select {
            base: Box::new(replace_expr(base, needle, replacement, diags)),
            indices: indices
                .iter()
                .map(|e| replace_expr(e, needle, replacement, diags))
                .collect(),
        },
        Expr::Field { base, name } => Expr::Field {
            base: Box::new(replace_expr(base, needle, replacement, diags)),
            name: name.clone(),
        },
        Expr::Apply { callee, args } => Expr::Apply {
            callee: Box::new(replace_expr(callee, needle, replacement, diags)),
            args: args
                .iter()
                .map(|e| replace_expr(e, needle, replacement, diags))
                .collect(),
        },
        Expr::Quantifier {
            kind,
            bound,
            range,
            term,
        } => Expr::Quantifier {
            kind: *kind,
            bound: bound.clone(),
            range: range
                .as_ref()
                .map(|r| Box::new(replace_expr(r, needle, replacement, diags))),
            term: Box::new(replace_expr(term, needle, replacement, diags)),
        },
        Expr::Old(inner) => Expr::Old(Box::new(replace_expr(inner, needle, replacement, diags))),
        Expr::Fresh(inner) => Expr::Fresh(Box::new(replace_expr(inner, needle, replacement, diags))),
        Expr::TypeTest { expr: inner, ty } => Expr::TypeTest {
            expr: Box::new(replace_expr(inner, needle, replacement, diags)),
            ty: ty.clone(),
        },
        Expr::Conversion { expr: inner, ty } => Expr::Conversion {
            expr: Box::new(replace_expr(inner, needle, replacement, diags)),
            ty: ty.clone(),
        },
        Expr::Opaque(_) => {
            diags.record("substitute", "expression: Opaque", None);
            expr.clone()
        }
    }
}

/// Instantiate a callee's ensures clauses at a call site.
///
/// Formal in-parameters are replaced by the actual arguments; the callee's
/// result slots are replaced by the caller-side target expressions
/// (index-aligned with `contract.outs`). For constructors and receiver
/// calls, result slots become field accesses on `receiver` instead, since
/// the ensures clauses bind object fields rather than out-parameters.
pub fn instantiate_ensures(
    contract: &CalleeContract,
    args: &[Expr],
    targets: &[Expr],
    receiver: Option<&Expr>,
    diags: &mut Diagnostics,
) -> Vec<Expr> {
    contract
        .ensures
        .iter()
        .map(|ens| {
            let mut inst = ens.clone();
            for (formal, actual) in contract.ins.iter().zip(args.iter()) {
                inst = substitute(&inst, &formal.name, actual, diags);
            }
            for (slot, out) in contract.outs.iter().enumerate() {
                let bound = match receiver {
                    Some(recv) => Expr::field(recv.clone(), out.name.clone()),
                    None => match targets.get(slot) {
                        Some(t) => t.clone(),
                        None => continue,
                    },
                };
                inst = substitute(&inst, &out.name, &bound, diags);
            }
            inst
        })
        .collect()
}

/// Collect every free identifier in an expression, in first-occurrence
/// order. The mutation component draws its variable-swap pool from this.
pub fn names_in(expr: &Expr) -> Vec<String> {
    fn walk(expr: &Expr, out: &mut Vec<String>) {
        match expr {
            Expr::Name(n) => {
                if !out.iter().any(|seen| seen == n) {
                    out.push(n.clone());
                }
            }
            Expr::Lit(_) | Expr::This | Expr::Opaque(_) => {}
            Expr::Binary { lhs, rhs, .. } => {
                walk(lhs, out);
                walk(rhs, out);
            }
            Expr::Unary { expr, .. }
            | Expr::Paren(expr)
            | Expr::Old(expr)
            | Expr::Fresh(expr)
            | Expr::TypeTest { expr, .. }
            | Expr::Conversion { expr, .. } => walk(expr, out),
            Expr::Chain { operands, .. } => {
                for e in operands {
                    walk(e, out);
                }
            }
            Expr::Select { base, indices } => {
                walk(base, out);
                for e in indices {
                    walk(e, out);
                }
            }
            Expr::Field { base, .. } => walk(base, out),
            Expr::Apply { callee, args } => {
                walk(callee, out);
                for e in args {
                    walk(e, out);
                }
            }
            Expr::Quantifier { range, term, .. } => {
                if let Some(r) = range {
                    walk(r, out);
                }
                walk(term, out);
            }
        }
    }
    let mut out = Vec::new();
    walk(expr, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BinOp, Formal, QuantKind, Ty};

    fn subst(expr: &Expr, var: &str, rep: &Expr) -> (Expr, Diagnostics) {
        let mut diags = Diagnostics::new();
        let out = substitute(expr, var, rep, &mut diags);
        (out, diags)
    }

    #[test]
    fn replaces_matching_name() {
        let e = Expr::binary(BinOp::Add, Expr::name("x"), Expr::int(1));
        let (out, diags) = subst(&e, "x", &Expr::int(5));
        assert_eq!(out, Expr::binary(BinOp::Add, Expr::int(5), Expr::int(1)));
        assert!(diags.is_empty());
    }

    #[test]
    fn leaves_other_names_alone() {
        let e = Expr::name("y");
        let (out, _) = subst(&e, "x", &Expr::int(5));
        assert_eq!(out, Expr::name("y"));
    }

    #[test]
    fn descends_into_select_and_apply() {
        let e = Expr::Select {
            base: Box::new(Expr::name("a")),
            indices: vec![Expr::name("i")],
        };
        let (out, _) = subst(&e, "i", &Expr::int(0));
        assert_eq!(
            out,
            Expr::Select {
                base: Box::new(Expr::name("a")),
                indices: vec![Expr::int(0)],
            }
        );

        let call = Expr::Apply {
            callee: Box::new(Expr::name("f")),
            args: vec![Expr::name("i"), Expr::name("j")],
        };
        let (out, _) = subst(&call, "j", &Expr::name("k"));
        assert_eq!(
            out,
            Expr::Apply {
                callee: Box::new(Expr::name("f")),
                args: vec![Expr::name("i"), Expr::name("k")],
            }
        );
    }

    #[test]
    fn quantifier_binding_shadows() {
        let q = Expr::Quantifier {
            kind: QuantKind::Forall,
            bound: vec![Formal::new("i", Ty::Int)],
            range: None,
            term: Box::new(Expr::name("i")),
        };
        let (out, _) = subst(&q, "i", &Expr::int(3));
        assert_eq!(out, q);
    }

    #[test]
    fn quantifier_free_names_substituted() {
        let q = Expr::Quantifier {
            kind: QuantKind::Forall,
            bound: vec![Formal::new("i", Ty::Int)],
            range: Some(Box::new(Expr::binary(
                BinOp::Lt,
                Expr::name("i"),
                Expr::name("n"),
            ))),
            term: Box::new(Expr::name("i")),
        };
        let (out, _) = subst(&q, "n", &Expr::int(10));
        match out {
            Expr::Quantifier { range, .. } => {
                assert_eq!(
                    *range.unwrap(),
                    Expr::binary(BinOp::Lt, Expr::name("i"), Expr::int(10))
                );
            }
            other => panic!("expected quantifier, got {other:?}"),
        }
    }

    #[test]
    fn opaque_passes_through_with_diagnostic() {
        let e = Expr::Opaque("set x | x in s".into());
        let (out, diags) = subst(&e, "x", &Expr::int(1));
        assert_eq!(out, e);
        assert_eq!(diags.items().len(), 1);
        assert_eq!(diags.items()[0].component, "substitute");
    }

    #[test]
    fn old_wrapper_is_traversed() {
        let e = Expr::Old(Box::new(Expr::name("x")));
        let (out, _) = subst(&e, "x", &Expr::name("x0"));
        assert_eq!(out, Expr::Old(Box::new(Expr::name("x0"))));
    }

    #[test]
    fn replace_expr_matches_indexed_targets() {
        // a[i] == 5 rewritten when the needle is the whole select expression
        let target = Expr::Select {
            base: Box::new(Expr::name("a")),
            indices: vec![Expr::name("i")],
        };
        let e = Expr::binary(BinOp::Add, target.clone(), Expr::int(1));
        let mut diags = Diagnostics::new();
        let out = replace_expr(&e, &target, &Expr::int(5), &mut diags);
        assert_eq!(out, Expr::binary(BinOp::Add, Expr::int(5), Expr::int(1)));
    }

    #[test]
    fn instantiate_ensures_binds_formals_and_result() {
        // method Double(n: int) returns (r: int) ensures r == n + n
        let contract = CalleeContract {
            ins: vec![Formal::new("n", Ty::Int)],
            outs: vec![Formal::new("r", Ty::Int)],
            ensures: vec![Expr::eq(
                Expr::name("r"),
                Expr::binary(BinOp::Add, Expr::name("n"), Expr::name("n")),
            )],
            is_constructor: false,
        };
        let mut diags = Diagnostics::new();
        let inst = instantiate_ensures(
            &contract,
            &[Expr::name("a")],
            &[Expr::name("x")],
            None,
            &mut diags,
        );
        assert_eq!(
            inst,
            vec![Expr::eq(
                Expr::name("x"),
                Expr::binary(BinOp::Add, Expr::name("a"), Expr::name("a")),
            )]
        );
    }

    #[test]
    fn instantiate_ensures_rewrites_ctor_fields_on_receiver() {
        // constructor(v: int) ensures value == v
        let contract = CalleeContract {
            ins: vec![Formal::new("v", Ty::Int)],
            outs: vec![Formal::new("value", Ty::Int)],
            ensures: vec![Expr::eq(Expr::name("value"), Expr::name("v"))],
            is_constructor: true,
        };
        let mut diags = Diagnostics::new();
        let recv = Expr::name("c");
        let inst = instantiate_ensures(&contract, &[Expr::int(3)], &[], Some(&recv), &mut diags);
        assert_eq!(
            inst,
            vec![Expr::eq(
                Expr::field(Expr::name("c"), "value"),
                Expr::int(3),
            )]
        );
    }

    #[test]
    fn names_in_collects_in_first_occurrence_order() {
        let e = Expr::binary(
            BinOp::Add,
            Expr::binary(BinOp::Mul, Expr::name("b"), Expr::name("a")),
            Expr::name("b"),
        );
        assert_eq!(names_in(&e), vec!["b".to_string(), "a".to_string()]);
    }
}
