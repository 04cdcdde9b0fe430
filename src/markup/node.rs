//! RawMarkupNode: an immutable element tree.

use indexmap::IndexMap;

/// One element of a parsed markup document.
///
/// Attributes keep their declaration order. Nodes are treated as immutable
/// values once a parser hands them over; the builder methods below exist for
/// parsers and tests constructing trees.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawMarkupNode {
    /// Element name (e.g. `"style"`, `"screen"`).
    pub name: String,
    /// Attribute name → value, in document order.
    pub attributes: IndexMap<String, String>,
    /// Child elements, in document order.
    pub children: Vec<RawMarkupNode>,
    /// Raw text content, if any.
    pub text: Option<String>,
}

impl RawMarkupNode {
    /// Create an element with no attributes, children, or text.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set an attribute (builder). A repeated name keeps its first position.
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Append a child (builder).
    pub fn with_child(mut self, child: RawMarkupNode) -> Self {
        self.children.push(child);
        self
    }

    /// Append several children (builder).
    pub fn with_children(mut self, children: impl IntoIterator<Item = RawMarkupNode>) -> Self {
        self.children.extend(children);
        self
    }

    /// Set the text content (builder).
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Look up an attribute value.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Whether the element name equals `name`.
    pub fn is_named(&self, name: &str) -> bool {
        self.name == name
    }

    /// Text content, or `""` when the node carries none.
    pub fn text_content(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_defaults() {
        let node = RawMarkupNode::new("screen");
        assert_eq!(node.name, "screen");
        assert!(node.attributes.is_empty());
        assert!(node.children.is_empty());
        assert!(node.text.is_none());
        assert_eq!(node.text_content(), "");
    }

    #[test]
    fn attributes_keep_order() {
        let node = RawMarkupNode::new("view")
            .with_attr("id", "main")
            .with_attr("class", "wide")
            .with_attr("flex", "1");
        let names: Vec<&str> = node.attributes.keys().map(String::as_str).collect();
        assert_eq!(names, ["id", "class", "flex"]);
        assert_eq!(node.attr("class"), Some("wide"));
        assert_eq!(node.attr("missing"), None);
    }

    #[test]
    fn repeated_attribute_overwrites_value() {
        let node = RawMarkupNode::new("view")
            .with_attr("id", "a")
            .with_attr("class", "x")
            .with_attr("id", "b");
        assert_eq!(node.attr("id"), Some("b"));
        assert_eq!(node.attributes.get_index(0).map(|(k, _)| k.as_str()), Some("id"));
    }

    #[test]
    fn children_in_order() {
        let node = RawMarkupNode::new("doc")
            .with_child(RawMarkupNode::new("style"))
            .with_children([RawMarkupNode::new("screen"), RawMarkupNode::new("footer")]);
        let names: Vec<&str> = node.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["style", "screen", "footer"]);
    }

    #[test]
    fn text_and_name_checks() {
        let node = RawMarkupNode::new("style").with_text("Label { color: red; }");
        assert!(node.is_named("style"));
        assert!(!node.is_named("Style"));
        assert_eq!(node.text_content(), "Label { color: red; }");
    }

    #[test]
    fn structural_equality() {
        let a = RawMarkupNode::new("screen").with_child(RawMarkupNode::new("text").with_text("hi"));
        let b = RawMarkupNode::new("screen").with_child(RawMarkupNode::new("text").with_text("hi"));
        let c = RawMarkupNode::new("screen").with_child(RawMarkupNode::new("text").with_text("ho"));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
