//! CompiledStyleSheet: merged fragment text plus its parsed rules.

use crate::css::model::{RuleSet, SelectorComponent};
use crate::css::parser::{parse_rules, StyleDiagnostic};

/// The single stylesheet attached to a compiled template.
///
/// Built from the document-order concatenation of every style fragment.
/// Compilation never fails: input that does not parse is recorded in
/// [`diagnostics`](Self::diagnostics) and skipped. Equality is structural, and
/// since rules and diagnostics are derived from the source text, two sheets
/// compiled from identical text are always equal.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledStyleSheet {
    source: String,
    rules: Vec<RuleSet>,
    diagnostics: Vec<StyleDiagnostic>,
}

impl CompiledStyleSheet {
    /// Compile merged stylesheet text.
    pub fn compile(source: impl Into<String>) -> Self {
        let source = source.into();
        let parsed = parse_rules(&source);
        if !parsed.diagnostics.is_empty() {
            tracing::debug!(
                diagnostics = parsed.diagnostics.len(),
                rules = parsed.rules.len(),
                "templates.style.compile_diagnostics"
            );
        }
        Self {
            source,
            rules: parsed.rules,
            diagnostics: parsed.diagnostics,
        }
    }

    /// The merged stylesheet text, exactly as concatenated.
    pub fn text(&self) -> &str {
        &self.source
    }

    /// Parsed rules in source order.
    pub fn rules(&self) -> &[RuleSet] {
        &self.rules
    }

    /// Problems skipped during compilation.
    pub fn diagnostics(&self) -> &[StyleDiagnostic] {
        &self.diagnostics
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    /// Rules with at least one selector whose subject names `type_name`
    /// (or is universal). Combinators are not evaluated.
    pub fn rules_for_type<'a>(&'a self, type_name: &'a str) -> impl Iterator<Item = &'a RuleSet> + 'a {
        self.rules.iter().filter(move |rule| {
            rule.selectors.iter().any(|selector| {
                selector.subject().is_some_and(|subject| {
                    subject.components.iter().any(|c| match c {
                        SelectorComponent::Type(name) => name == type_name,
                        SelectorComponent::Universal => true,
                        _ => false,
                    })
                })
            })
        })
    }
}
