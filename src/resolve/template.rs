//! CompiledTemplate: the cached unit.

use crate::css::CompiledStyleSheet;
use crate::markup::RawMarkupNode;

/// A document's component tree paired with its merged stylesheet.
///
/// Immutable once built. A refetch produces a new value, and two templates
/// are equal exactly when both parts are structurally equal, which is what
/// live reload uses to decide whether anything changed.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledTemplate {
    component: RawMarkupNode,
    style_sheet: CompiledStyleSheet,
}

impl CompiledTemplate {
    pub fn new(component: RawMarkupNode, style_sheet: CompiledStyleSheet) -> Self {
        Self {
            component,
            style_sheet,
        }
    }

    /// The first non-style child of the document.
    pub fn component(&self) -> &RawMarkupNode {
        &self.component
    }

    pub fn style_sheet(&self) -> &CompiledStyleSheet {
        &self.style_sheet
    }

    pub fn into_parts(self) -> (RawMarkupNode, CompiledStyleSheet) {
        (self.component, self.style_sheet)
    }
}
