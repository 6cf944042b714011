//! Resolved surface AST consumed by the localization core.
//!
//! The parser/resolver lives outside this workspace; it hands the driver a
//! fully resolved program as JSON, which deserializes into these types. The
//! core only ever reads the tree: every transformation rebuilds new nodes
//! instead of mutating in place, so unmodified subtrees can be shared freely
//! via `Clone`.
//!
//! Statement and expression kinds are closed enums. Anything the resolver
//! cannot express in this grammar arrives as an `Opaque` node carrying its
//! raw source text; the analysis passes those through and records an
//! `UnsupportedConstruct` diagnostic rather than failing the member.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Dense statement index assigned by the AST provider.
pub type StmtId = u32;

/// A 1-based source position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pos {
    pub line: u32,
    pub col: u32,
}

impl Pos {
    pub fn new(line: u32, col: u32) -> Self {
        Self { line, col }
    }
}

/// Source range covered by a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: Pos,
    pub end: Pos,
}

impl Span {
    pub fn new(start: Pos, end: Pos) -> Self {
        Self { start, end }
    }

    /// Single-line span helper for tests and synthesized nodes.
    pub fn line(line: u32) -> Self {
        Self {
            start: Pos::new(line, 1),
            end: Pos::new(line, 1),
        }
    }
}

/// A whole compilation unit as delivered by the AST provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Program {
    /// Path of the source file this tree was resolved from.
    pub path: String,
    pub methods: Vec<Method>,
    /// Contracts of everything callable from the analyzed members.
    #[serde(default)]
    pub callees: CalleeTable,
}

impl Program {
    /// Look up a method declaration by name.
    pub fn method(&self, name: &str) -> Option<&Method> {
        self.methods.iter().find(|m| m.name == name)
    }
}

/// Contract summaries for callees, keyed by callable name.
///
/// An explicit value passed into the analysis -- never a process-global table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CalleeTable {
    entries: BTreeMap<String, CalleeContract>,
}

impl CalleeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, contract: CalleeContract) {
        self.entries.insert(name.into(), contract);
    }

    pub fn get(&self, name: &str) -> Option<&CalleeContract> {
        self.entries.get(name)
    }
}

/// The slice of a callee's signature the propagator needs at a call site:
/// formal in-parameters, result slots, and the ensures clauses to instantiate.
///
/// For constructors the `outs` are the field names the ensures clauses bind;
/// the propagator rewrites them as field accesses on the receiver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalleeContract {
    pub ins: Vec<Formal>,
    pub outs: Vec<Formal>,
    pub ensures: Vec<Expr>,
    #[serde(default)]
    pub is_constructor: bool,
}

/// A method (member) under analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Method {
    pub name: String,
    pub ins: Vec<Formal>,
    pub outs: Vec<Formal>,
    pub requires: Vec<Expr>,
    pub ensures: Vec<Expr>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

impl Method {
    /// Find a statement anywhere in the body by its provider-assigned id.
    pub fn find_stmt(&self, id: StmtId) -> Option<&Stmt> {
        fn walk<'a>(stmts: &'a [Stmt], id: StmtId) -> Option<&'a Stmt> {
            for s in stmts {
                if s.id == id {
                    return Some(s);
                }
                let found = match &s.kind {
                    StmtKind::Block(body) => walk(body, id),
                    StmtKind::VarDecl { init, .. } => {
                        init.as_deref().and_then(|u| walk(std::slice::from_ref(u), id))
                    }
                    StmtKind::If {
                        then_body,
                        else_body,
                        ..
                    } => walk(then_body, id).or_else(|| {
                        else_body
                            .as_deref()
                            .and_then(|e| walk(std::slice::from_ref(e), id))
                    }),
                    StmtKind::While { body, .. } | StmtKind::For { body, .. } => walk(body, id),
                    StmtKind::AlternativeIf { arms } | StmtKind::AlternativeLoop { arms, .. } => {
                        arms.iter().find_map(|a| walk(&a.body, id))
                    }
                    StmtKind::Match { cases, .. } => cases.iter().find_map(|c| walk(&c.body, id)),
                    _ => None,
                };
                if found.is_some() {
                    return found;
                }
            }
            None
        }
        walk(&self.body, id)
    }

    /// Largest statement id in the body, used to seed synthetic-id allocation.
    pub fn max_stmt_id(&self) -> StmtId {
        fn walk(stmts: &[Stmt], max: &mut StmtId) {
            for s in stmts {
                if s.id > *max {
                    *max = s.id;
                }
                match &s.kind {
                    StmtKind::Block(body) => walk(body, max),
                    StmtKind::VarDecl { init, .. } => {
                        if let Some(u) = init.as_deref() {
                            walk(std::slice::from_ref(u), max);
                        }
                    }
                    StmtKind::If {
                        then_body,
                        else_body,
                        ..
                    } => {
                        walk(then_body, max);
                        if let Some(e) = else_body.as_deref() {
                            walk(std::slice::from_ref(e), max);
                        }
                    }
                    StmtKind::While { body, .. } | StmtKind::For { body, .. } => walk(body, max),
                    StmtKind::AlternativeIf { arms } | StmtKind::AlternativeLoop { arms, .. } => {
                        for a in arms {
                            walk(&a.body, max);
                        }
                    }
                    StmtKind::Match { cases, .. } => {
                        for c in cases {
                            walk(&c.body, max);
                        }
                    }
                    _ => {}
                }
            }
        }
        let mut max = 0;
        walk(&self.body, &mut max);
        max
    }
}

/// A formal parameter or bound variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Formal {
    pub name: String,
    pub ty: Ty,
}

impl Formal {
    pub fn new(name: impl Into<String>, ty: Ty) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// Surface types, rendered back into source syntax for lemma parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Ty {
    Int,
    Nat,
    Bool,
    Real,
    Char,
    Str,
    Seq(Box<Ty>),
    Set(Box<Ty>),
    Multiset(Box<Ty>),
    Map(Box<Ty>, Box<Ty>),
    Array(Box<Ty>),
    Named(String),
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ty::Int => write!(f, "int"),
            Ty::Nat => write!(f, "nat"),
            Ty::Bool => write!(f, "bool"),
            Ty::Real => write!(f, "real"),
            Ty::Char => write!(f, "char"),
            Ty::Str => write!(f, "string"),
            Ty::Seq(t) => write!(f, "seq<{t}>"),
            Ty::Set(t) => write!(f, "set<{t}>"),
            Ty::Multiset(t) => write!(f, "multiset<{t}>"),
            Ty::Map(k, v) => write!(f, "map<{k},{v}>"),
            Ty::Array(t) => write!(f, "array<{t}>"),
            Ty::Named(n) => write!(f, "{n}"),
        }
    }
}

/// A statement with provider-assigned identity and source range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stmt {
    pub id: StmtId,
    pub span: Span,
    pub kind: StmtKind,
}

/// The closed set of statement kinds the propagator handles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StmtKind {
    Block(Vec<Stmt>),
    /// `var a, b := ...` -- declaration, optionally with an initializing update.
    VarDecl {
        locals: Vec<Formal>,
        init: Option<Box<Stmt>>,
    },
    /// Parallel assignment `a, b := rhs1, rhs2`, including calls with results.
    Update {
        targets: Vec<Expr>,
        values: Vec<Rhs>,
    },
    If {
        /// `None` is the nondeterministic `*` guard.
        guard: Option<Expr>,
        then_body: Vec<Stmt>,
        /// A `Block` or a nested `If` (else-if chain).
        else_body: Option<Box<Stmt>>,
    },
    /// `if { case g1 => ... case g2 => ... }`
    AlternativeIf { arms: Vec<GuardedArm> },
    While {
        guard: Option<Expr>,
        invariants: Vec<Expr>,
        body: Vec<Stmt>,
    },
    For {
        index: Formal,
        start: Expr,
        end: Expr,
        /// `true` for `to`, `false` for `downto`.
        up: bool,
        invariants: Vec<Expr>,
        body: Vec<Stmt>,
    },
    /// `while { case g1 => ... case g2 => ... }`
    AlternativeLoop {
        invariants: Vec<Expr>,
        arms: Vec<GuardedArm>,
    },
    Match {
        scrutinee: Expr,
        cases: Vec<MatchCase>,
    },
    /// `return e1, e2` -- values bind to the method's out-parameters.
    Return { values: Vec<Rhs> },
    Break {
        /// Resolved id of the loop this break leaves; `None` = innermost.
        target: Option<StmtId>,
    },
    /// `x :| P(x)`
    AssignSuchThat {
        targets: Vec<Expr>,
        constraint: Expr,
    },
    Assert { expr: Expr },
    Assume { expr: Expr },
    Expect { expr: Expr },
    /// Kept as raw text; replayed verbatim in discharge bodies.
    Reveal { text: String },
    Calc { text: String },
    /// A statement outside this grammar. Skipped with a diagnostic.
    Opaque { text: String },
}

/// One `case guard => body` arm of an alternative if/loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardedArm {
    pub guard: Expr,
    pub span: Span,
    pub body: Vec<Stmt>,
}

/// One arm of a `match` statement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchCase {
    pub pattern: Pattern,
    pub span: Span,
    pub body: Vec<Stmt>,
}

/// Patterns the match desugarer understands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Pattern {
    /// `Cons(head, tail)` -- `binds` are the bound variables, `fields` the
    /// datatype destructor names they project, index-aligned.
    Ctor {
        name: String,
        binds: Vec<Formal>,
        fields: Vec<String>,
    },
    Lit(Lit),
    Wildcard,
}

/// Right-hand side of one assignment slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Rhs {
    Expr(Expr),
    /// `new T[dim1, dim2] [init...]`
    ArrayAlloc {
        elem_ty: Ty,
        dims: Vec<Expr>,
        init: Vec<Expr>,
    },
    /// `new C(args)` -- constructor with a contract in the callee table.
    Ctor { class: String, args: Vec<Expr> },
    /// Method call; `receiver` is set for `obj.m(args)`.
    Call {
        callee: String,
        receiver: Option<Expr>,
        args: Vec<Expr>,
    },
}

/// Literal values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Lit {
    Int(i64),
    Bool(bool),
    Str(String),
    Char(char),
}

/// Binary operators, in surface syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp {
    Iff,
    Imp,
    And,
    Or,
    Eq,
    Neq,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    In,
    NotIn,
}

impl BinOp {
    /// Operators the mutation component is allowed to perturb.
    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Mod
        )
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnOp {
    Not,
    Neg,
    /// `|e|`
    Cardinality,
}

/// Quantifier kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuantKind {
    Forall,
    Exists,
}

/// The closed expression grammar.
///
/// Expressions are immutable values; the substitution engine rebuilds nodes
/// rather than editing them, so clones share structure conceptually and
/// structural equality (`PartialEq`) is the identity that matters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Lit(Lit),
    Name(String),
    This,
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Unary {
        op: UnOp,
        expr: Box<Expr>,
    },
    Paren(Box<Expr>),
    /// Chained comparison `0 <= i < n`: `ops.len() == operands.len() - 1`.
    Chain {
        operands: Vec<Expr>,
        ops: Vec<BinOp>,
    },
    /// `base[i]` / `base[i, j]`
    Select {
        base: Box<Expr>,
        indices: Vec<Expr>,
    },
    /// `base.name` -- field access or datatype tag test (`name` ends in `?`).
    Field {
        base: Box<Expr>,
        name: String,
    },
    /// `callee(args)`
    Apply {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Quantifier {
        kind: QuantKind,
        bound: Vec<Formal>,
        range: Option<Box<Expr>>,
        term: Box<Expr>,
    },
    Old(Box<Expr>),
    Fresh(Box<Expr>),
    /// `e is T`
    TypeTest {
        expr: Box<Expr>,
        ty: Ty,
    },
    /// `e as T`
    Conversion {
        expr: Box<Expr>,
        ty: Ty,
    },
    /// An expression outside this grammar, kept as raw text. Substitution
    /// passes it through unchanged and records a diagnostic.
    Opaque(String),
}

impl Expr {
    pub fn name(n: impl Into<String>) -> Self {
        Expr::Name(n.into())
    }

    pub fn int(v: i64) -> Self {
        Expr::Lit(Lit::Int(v))
    }

    pub fn bool(v: bool) -> Self {
        Expr::Lit(Lit::Bool(v))
    }

    pub fn binary(op: BinOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn eq(lhs: Expr, rhs: Expr) -> Self {
        Self::binary(BinOp::Eq, lhs, rhs)
    }

    pub fn and(lhs: Expr, rhs: Expr) -> Self {
        Self::binary(BinOp::And, lhs, rhs)
    }

    pub fn not(expr: Expr) -> Self {
        Expr::Unary {
            op: UnOp::Not,
            expr: Box::new(expr),
        }
    }

    pub fn paren(expr: Expr) -> Self {
        Expr::Paren(Box::new(expr))
    }

    pub fn field(base: Expr, name: impl Into<String>) -> Self {
        Expr::Field {
            base: Box::new(base),
            name: name.into(),
        }
    }

    /// The identifier if this is a plain (possibly parenthesized) name.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Expr::Name(n) => Some(n),
            Expr::Paren(inner) => inner.as_name(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stmt(id: StmtId, line: u32, kind: StmtKind) -> Stmt {
        Stmt {
            id,
            span: Span::line(line),
            kind,
        }
    }

    #[test]
    fn method_find_stmt_descends_into_nested_bodies() {
        let inner = stmt(
            3,
            4,
            StmtKind::Update {
                targets: vec![Expr::name("x")],
                values: vec![Rhs::Expr(Expr::int(1))],
            },
        );
        let body = vec![stmt(
            1,
            2,
            StmtKind::While {
                guard: Some(Expr::bool(true)),
                invariants: vec![],
                body: vec![stmt(2, 3, StmtKind::Block(vec![inner]))],
            },
        )];
        let m = Method {
            name: "m".into(),
            ins: vec![],
            outs: vec![],
            requires: vec![],
            ensures: vec![],
            body,
            span: Span::line(1),
        };
        assert!(m.find_stmt(3).is_some());
        assert!(m.find_stmt(99).is_none());
        assert_eq!(m.max_stmt_id(), 3);
    }

    #[test]
    fn expr_as_name_sees_through_parens() {
        let e = Expr::paren(Expr::name("total"));
        assert_eq!(e.as_name(), Some("total"));
        assert_eq!(Expr::int(3).as_name(), None);
    }

    #[test]
    fn ty_display_renders_surface_syntax() {
        assert_eq!(Ty::Int.to_string(), "int");
        assert_eq!(Ty::Seq(Box::new(Ty::Nat)).to_string(), "seq<nat>");
        assert_eq!(
            Ty::Map(Box::new(Ty::Int), Box::new(Ty::Bool)).to_string(),
            "map<int,bool>"
        );
        assert_eq!(Ty::Array(Box::new(Ty::Int)).to_string(), "array<int>");
    }

    #[test]
    fn binop_arithmetic_classification() {
        assert!(BinOp::Add.is_arithmetic());
        assert!(BinOp::Mod.is_arithmetic());
        assert!(!BinOp::Eq.is_arithmetic());
        assert!(!BinOp::And.is_arithmetic());
    }
}
