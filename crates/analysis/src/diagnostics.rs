//! Structured diagnostics for constructs the analysis cannot model.
//!
//! An unsupported node never aborts a member's analysis: the offending node
//! is passed through (expressions) or skipped (statements) and a diagnostic
//! is accumulated here. Callers decide how to surface them; results derived
//! through such a path are lower-confidence, not wrong-by-construction.

/// One unhandled construct, with enough context to find it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsupportedConstruct {
    /// What was encountered, e.g. `"statement: Opaque"` or `"expression: Opaque"`.
    pub construct: String,
    /// The component that hit it, e.g. `"substitute"` or `"propagate"`.
    pub component: &'static str,
    /// Source line, when the node carries one.
    pub line: Option<u32>,
}

/// Accumulator threaded through an analysis run.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    items: Vec<UnsupportedConstruct>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, component: &'static str, construct: impl Into<String>, line: Option<u32>) {
        let construct = construct.into();
        tracing::debug!(component, %construct, ?line, "unsupported construct");
        self.items.push(UnsupportedConstruct {
            construct,
            component,
            line,
        });
    }

    pub fn items(&self) -> &[UnsupportedConstruct] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_items(self) -> Vec<UnsupportedConstruct> {
        self.items
    }
}
