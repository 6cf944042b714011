//! One obligation, one lemma declaration.
//!
//! Layout mirrors what the backend expects to re-verify in isolation:
//!
//! ```text
//! lemma check_3(x:int,y:int)
//! requires <LHS invariant facts, one clause each>
//! requires <LHS facts, one clause each>
//! ensures <RHS goals, one clause each>
//! {
//! <discharge statements, original relative order>
//! }
//! ```
//!
//! The `check_<i>` index is the obligation's emission order and the only
//! linkage the localizer has back to source: it must survive serialization
//! and the backend's failure report bit-for-bit.

use veriloc_analysis::ast::{Formal, Method};
use veriloc_analysis::predicate::PredicateKind;
use veriloc_analysis::{Obligation, CHECK_PREFIX};

use crate::printer::{render_expr, render_stmt};

/// A renderable lemma declaration.
#[derive(Debug, Clone)]
pub struct LemmaDecl {
    pub name: String,
    /// `(name, type)` pairs -- the walker's variable table.
    pub params: Vec<(String, String)>,
    pub requires: Vec<String>,
    pub ensures: Vec<String>,
    /// Discharge statements replayed in the body.
    pub body: Vec<String>,
}

impl LemmaDecl {
    /// Build the lemma for obligation `index`.
    ///
    /// Facts folded out by normalization and bare control-flow markers
    /// contribute no clause; everything else renders one `requires` line in
    /// program order, invariant facts first.
    pub fn from_obligation(
        index: usize,
        obligation: &Obligation,
        variables: &[Formal],
        method: &Method,
    ) -> Self {
        let name = format!("{CHECK_PREFIX}{index}");

        let params = variables
            .iter()
            .map(|f| (f.name.clone(), f.ty.to_string()))
            .collect();

        let mut requires: Vec<String> = obligation
            .lhs_invariants
            .iter()
            .map(render_expr)
            .collect();
        for pred in &obligation.lhs {
            if pred.folded_out || pred.kind == PredicateKind::Break {
                continue;
            }
            requires.push(render_expr(&pred.expr));
        }

        let ensures = obligation.rhs.iter().map(render_expr).collect();

        let body = obligation
            .discharges
            .iter()
            .filter_map(|d| method.find_stmt(d.id))
            .filter_map(render_stmt)
            .collect();

        Self {
            name,
            params,
            requires,
            ensures,
            body,
        }
    }

    /// Append the declaration's source text to `out`.
    pub fn render(&self, out: &mut String) {
        out.push_str("lemma ");
        out.push_str(&self.name);
        out.push('(');
        for (i, (name, ty)) in self.params.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            out.push_str(name);
            out.push(':');
            out.push_str(ty);
        }
        out.push_str(")\n");
        for clause in &self.requires {
            out.push_str("requires ");
            out.push_str(clause);
            out.push('\n');
        }
        for clause in &self.ensures {
            out.push_str("ensures ");
            out.push_str(clause);
            out.push('\n');
        }
        out.push_str("{\n");
        for line in &self.body {
            out.push_str(line);
            out.push('\n');
        }
        out.push_str("}\n\n");
    }
}
