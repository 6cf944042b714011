//! A sequence of lemma declarations for one member, rendered as the block
//! of text spliced into the source file after the member's closing brace.

use veriloc_analysis::ast::Method;
use veriloc_analysis::MemberAnalysis;

use crate::lemma::LemmaDecl;

/// All `check_<i>` lemmas for one member, in obligation order.
#[derive(Debug, Clone, Default)]
pub struct LemmaScript {
    lemmas: Vec<LemmaDecl>,
}

impl LemmaScript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the full script for a walked member. The position of each
    /// lemma equals its obligation index -- the numbering contract.
    pub fn from_analysis(analysis: &MemberAnalysis, method: &Method) -> Self {
        let lemmas = analysis
            .obligations
            .iter()
            .enumerate()
            .map(|(i, ob)| LemmaDecl::from_obligation(i, ob, &analysis.variables, method))
            .collect();
        tracing::debug!(
            member = %analysis.method_name,
            lemmas = analysis.obligations.len(),
            "built lemma script"
        );
        Self { lemmas }
    }

    pub fn push(&mut self, lemma: LemmaDecl) {
        self.lemmas.push(lemma);
    }

    pub fn lemmas(&self) -> &[LemmaDecl] {
        &self.lemmas
    }

    pub fn len(&self) -> usize {
        self.lemmas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lemmas.is_empty()
    }

    /// Render every declaration into one block of source text.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for lemma in &self.lemmas {
            lemma.render(&mut out);
        }
        out
    }
}
