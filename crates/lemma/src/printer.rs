//! Surface-syntax renderer for expressions, types, and the statement kinds
//! that can appear in a lemma's discharge body or a mutation patch.
//!
//! Rendering is precedence-aware: parentheses are inserted exactly where the
//! tree structure demands them, so substituted expressions print back as
//! valid source without relying on explicit `Paren` nodes.

use veriloc_analysis::ast::{BinOp, Expr, Lit, QuantKind, Rhs, Stmt, StmtKind, UnOp};

/// Render an expression to surface syntax.
pub fn render_expr(expr: &Expr) -> String {
    let mut out = String::new();
    write_expr(&mut out, expr, 0);
    out
}

fn op_str(op: BinOp) -> &'static str {
    match op {
        BinOp::Iff => "<==>",
        BinOp::Imp => "==>",
        BinOp::And => "&&",
        BinOp::Or => "||",
        BinOp::Eq => "==",
        BinOp::Neq => "!=",
        BinOp::Lt => "<",
        BinOp::Le => "<=",
        BinOp::Gt => ">",
        BinOp::Ge => ">=",
        BinOp::Add => "+",
        BinOp::Sub => "-",
        BinOp::Mul => "*",
        BinOp::Div => "/",
        BinOp::Mod => "%",
        BinOp::In => "in",
        BinOp::NotIn => "!in",
    }
}

fn precedence(op: BinOp) -> u8 {
    match op {
        BinOp::Iff => 1,
        BinOp::Imp => 2,
        BinOp::Or => 3,
        BinOp::And => 4,
        BinOp::Eq
        | BinOp::Neq
        | BinOp::Lt
        | BinOp::Le
        | BinOp::Gt
        | BinOp::Ge
        | BinOp::In
        | BinOp::NotIn => 5,
        BinOp::Add | BinOp::Sub => 6,
        BinOp::Mul | BinOp::Div | BinOp::Mod => 7,
    }
}

/// Operators whose right operand needs parens at equal precedence.
fn right_sensitive(op: BinOp) -> bool {
    matches!(op, BinOp::Sub | BinOp::Div | BinOp::Mod)
}

fn write_expr(out: &mut String, expr: &Expr, parent_prec: u8) {
    match expr {
        Expr::Lit(lit) => write_lit(out, lit),
        Expr::Name(n) => out.push_str(n),
        Expr::This => out.push_str("this"),
        Expr::Binary { op, lhs, rhs } => {
            let prec = precedence(*op);
            let wrap = prec < parent_prec;
            if wrap {
                out.push('(');
            }
            write_expr(out, lhs, prec);
            out.push(' ');
            out.push_str(op_str(*op));
            out.push(' ');
            let right_min = if right_sensitive(*op) { prec + 1 } else { prec };
            write_expr(out, rhs, right_min);
            if wrap {
                out.push(')');
            }
        }
        Expr::Unary { op, expr: inner } => {
            match op {
                UnOp::Not => {
                    out.push('!');
                    write_expr(out, inner, 8);
                }
                UnOp::Neg => {
                    out.push('-');
                    write_expr(out, inner, 8);
                }
                UnOp::Cardinality => {
                    out.push('|');
                    write_expr(out, inner, 0);
                    out.push('|');
                }
            }
        }
        Expr::Paren(inner) => {
            out.push('(');
            write_expr(out, inner, 0);
            out.push(')');
        }
        Expr::Chain { operands, ops } => {
            let wrap = 5 < parent_prec;
            if wrap {
                out.push('(');
            }
            for (i, operand) in operands.iter().enumerate() {
                if i > 0 {
                    out.push(' ');
                    out.push_str(op_str(ops[i - 1]));
                    out.push(' ');
                }
                write_expr(out, operand, 6);
            }
            if wrap {
                out.push(')');
            }
        }
        Expr::Select { base, indices } => {
            write_expr(out, base, 9);
            out.push('[');
            for (i, idx) in indices.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_expr(out, idx, 0);
            }
            out.push(']');
        }
        Expr::Field { base, name } => {
            write_expr(out, base, 9);
            out.push('.');
            out.push_str(name);
        }
        Expr::Apply { callee, args } => {
            write_expr(out, callee, 9);
            out.push('(');
            for (i, arg) in args.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_expr(out, arg, 0);
            }
            out.push(')');
        }
        Expr::Quantifier {
            kind,
            bound,
            range,
            term,
        } => {
            out.push('(');
            out.push_str(match kind {
                QuantKind::Forall => "forall ",
                QuantKind::Exists => "exists ",
            });
            for (i, b) in bound.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(&b.name);
                out.push_str(": ");
                out.push_str(&b.ty.to_string());
            }
            if let Some(r) = range {
                out.push_str(" | ");
                write_expr(out, r, 0);
            }
            out.push_str(" :: ");
            write_expr(out, term, 0);
            out.push(')');
        }
        Expr::Old(inner) => {
            out.push_str("old(");
            write_expr(out, inner, 0);
            out.push(')');
        }
        Expr::Fresh(inner) => {
            out.push_str("fresh(");
            write_expr(out, inner, 0);
            out.push(')');
        }
        Expr::TypeTest { expr: inner, ty } => {
            write_expr(out, inner, 5);
            out.push_str(" is ");
            out.push_str(&ty.to_string());
        }
        Expr::Conversion { expr: inner, ty } => {
            write_expr(out, inner, 5);
            out.push_str(" as ");
            out.push_str(&ty.to_string());
        }
        Expr::Opaque(text) => out.push_str(text),
    }
}

fn write_lit(out: &mut String, lit: &Lit) {
    match lit {
        Lit::Int(v) => out.push_str(&v.to_string()),
        Lit::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Lit::Str(s) => {
            out.push('"');
            out.push_str(s);
            out.push('"');
        }
        Lit::Char(c) => {
            out.push('\'');
            out.push(*c);
            out.push('\'');
        }
    }
}

/// Render one right-hand side of an assignment.
pub fn render_rhs(rhs: &Rhs) -> String {
    match rhs {
        Rhs::Expr(e) => render_expr(e),
        Rhs::ArrayAlloc { elem_ty, dims, init } => {
            let dims_text = dims.iter().map(render_expr).collect::<Vec<_>>().join(", ");
            let mut out = format!("new {elem_ty}[{dims_text}]");
            if !init.is_empty() {
                let init_text = init.iter().map(render_expr).collect::<Vec<_>>().join(", ");
                out.push_str(&format!(" [{init_text}]"));
            }
            out
        }
        Rhs::Ctor { class, args } => {
            let args_text = args.iter().map(render_expr).collect::<Vec<_>>().join(", ");
            format!("new {class}({args_text})")
        }
        Rhs::Call {
            callee,
            receiver,
            args,
        } => {
            let args_text = args.iter().map(render_expr).collect::<Vec<_>>().join(", ");
            match receiver {
                Some(recv) => format!("{}.{callee}({args_text})", render_expr(recv)),
                None => format!("{callee}({args_text})"),
            }
        }
    }
}

/// Render a statement back to one line of surface syntax.
///
/// Covers the kinds that appear in discharge bodies (verification
/// statements) and mutation patches (assignments, declarations, returns).
/// Control-flow statements span multiple lines and are not renderable here.
pub fn render_stmt(stmt: &Stmt) -> Option<String> {
    match &stmt.kind {
        StmtKind::Assert { expr } => Some(format!("assert {};", render_expr(expr))),
        StmtKind::Assume { expr } => Some(format!("assume {};", render_expr(expr))),
        StmtKind::Expect { expr } => Some(format!("expect {};", render_expr(expr))),
        // Reveal and calc arrive as complete statement text from the
        // provider and are replayed verbatim.
        StmtKind::Reveal { text } | StmtKind::Calc { text } => Some(text.clone()),
        StmtKind::Update { targets, values } => {
            let lhs = targets.iter().map(render_expr).collect::<Vec<_>>().join(", ");
            let rhs = values.iter().map(render_rhs).collect::<Vec<_>>().join(", ");
            Some(format!("{lhs} := {rhs};"))
        }
        StmtKind::VarDecl { locals, init } => {
            let names = locals
                .iter()
                .map(|l| l.name.clone())
                .collect::<Vec<_>>()
                .join(", ");
            match init.as_deref() {
                Some(Stmt {
                    kind: StmtKind::Update { values, .. },
                    ..
                }) => {
                    let rhs = values.iter().map(render_rhs).collect::<Vec<_>>().join(", ");
                    Some(format!("var {names} := {rhs};"))
                }
                _ => Some(format!("var {names};")),
            }
        }
        StmtKind::Return { values } => {
            if values.is_empty() {
                Some("return;".to_string())
            } else {
                let rhs = values.iter().map(render_rhs).collect::<Vec<_>>().join(", ");
                Some(format!("return {rhs};"))
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veriloc_analysis::ast::{Formal, Span, Ty};

    #[test]
    fn binary_without_parens() {
        let e = Expr::binary(
            BinOp::Add,
            Expr::binary(BinOp::Mul, Expr::name("a"), Expr::name("b")),
            Expr::int(1),
        );
        assert_eq!(render_expr(&e), "a * b + 1");
    }

    #[test]
    fn lower_precedence_child_gets_parens() {
        let e = Expr::binary(
            BinOp::Mul,
            Expr::binary(BinOp::Add, Expr::name("a"), Expr::name("b")),
            Expr::int(2),
        );
        assert_eq!(render_expr(&e), "(a + b) * 2");
    }

    #[test]
    fn subtraction_right_operand_parenthesized() {
        let e = Expr::binary(
            BinOp::Sub,
            Expr::name("a"),
            Expr::binary(BinOp::Sub, Expr::name("b"), Expr::name("c")),
        );
        assert_eq!(render_expr(&e), "a - (b - c)");
    }

    #[test]
    fn substituted_definition_prints_correctly() {
        // x == 1 + 1, the shape produced by update folding.
        let e = Expr::eq(
            Expr::name("x"),
            Expr::binary(BinOp::Add, Expr::int(1), Expr::int(1)),
        );
        assert_eq!(render_expr(&e), "x == 1 + 1");
    }

    #[test]
    fn negation_and_comparison() {
        let e = Expr::not(Expr::binary(BinOp::Gt, Expr::name("x"), Expr::int(0)));
        assert_eq!(render_expr(&e), "!(x > 0)");
    }

    #[test]
    fn chain_renders_interleaved() {
        let e = Expr::Chain {
            operands: vec![Expr::int(0), Expr::name("i"), Expr::name("n")],
            ops: vec![BinOp::Le, BinOp::Lt],
        };
        assert_eq!(render_expr(&e), "0 <= i < n");
    }

    #[test]
    fn select_field_apply() {
        let e = Expr::Select {
            base: Box::new(Expr::name("a")),
            indices: vec![Expr::name("i")],
        };
        assert_eq!(render_expr(&e), "a[i]");
        assert_eq!(
            render_expr(&Expr::field(Expr::name("a"), "Length")),
            "a.Length"
        );
        let call = Expr::Apply {
            callee: Box::new(Expr::name("f")),
            args: vec![Expr::name("x"), Expr::int(2)],
        };
        assert_eq!(render_expr(&call), "f(x, 2)");
    }

    #[test]
    fn quantifier_with_range() {
        let e = Expr::Quantifier {
            kind: QuantKind::Forall,
            bound: vec![Formal::new("i", Ty::Int)],
            range: Some(Box::new(Expr::Chain {
                operands: vec![Expr::int(0), Expr::name("i"), Expr::name("n")],
                ops: vec![BinOp::Le, BinOp::Lt],
            })),
            term: Box::new(Expr::binary(
                BinOp::Gt,
                Expr::Select {
                    base: Box::new(Expr::name("a")),
                    indices: vec![Expr::name("i")],
                },
                Expr::int(0),
            )),
        };
        assert_eq!(render_expr(&e), "(forall i: int | 0 <= i < n :: a[i] > 0)");
    }

    #[test]
    fn old_and_fresh_wrappers() {
        assert_eq!(
            render_expr(&Expr::Old(Box::new(Expr::name("x")))),
            "old(x)"
        );
        assert_eq!(
            render_expr(&Expr::Fresh(Box::new(Expr::name("o")))),
            "fresh(o)"
        );
    }

    #[test]
    fn render_assert_statement() {
        let s = Stmt {
            id: 1,
            span: Span::line(3),
            kind: StmtKind::Assert {
                expr: Expr::binary(BinOp::Neq, Expr::name("y"), Expr::int(0)),
            },
        };
        assert_eq!(render_stmt(&s).as_deref(), Some("assert y != 0;"));
    }

    #[test]
    fn render_update_statement() {
        let s = Stmt {
            id: 1,
            span: Span::line(3),
            kind: StmtKind::Update {
                targets: vec![Expr::name("x")],
                values: vec![Rhs::Expr(Expr::binary(
                    BinOp::Sub,
                    Expr::name("a"),
                    Expr::name("b"),
                ))],
            },
        };
        assert_eq!(render_stmt(&s).as_deref(), Some("x := a - b;"));
    }

    #[test]
    fn render_var_decl_with_init() {
        let init = Stmt {
            id: 2,
            span: Span::line(3),
            kind: StmtKind::Update {
                targets: vec![Expr::name("i")],
                values: vec![Rhs::Expr(Expr::int(0))],
            },
        };
        let s = Stmt {
            id: 1,
            span: Span::line(3),
            kind: StmtKind::VarDecl {
                locals: vec![Formal::new("i", Ty::Int)],
                init: Some(Box::new(init)),
            },
        };
        assert_eq!(render_stmt(&s).as_deref(), Some("var i := 0;"));
    }

    #[test]
    fn render_array_alloc_rhs() {
        let rhs = Rhs::ArrayAlloc {
            elem_ty: Ty::Int,
            dims: vec![Expr::int(3)],
            init: vec![Expr::int(1), Expr::int(2), Expr::int(3)],
        };
        assert_eq!(render_rhs(&rhs), "new int[3] [1, 2, 3]");
    }

    #[test]
    fn control_flow_statements_are_not_single_line() {
        let s = Stmt {
            id: 1,
            span: Span::line(3),
            kind: StmtKind::Block(vec![]),
        };
        assert!(render_stmt(&s).is_none());
    }
}
