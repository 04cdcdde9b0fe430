//! Stylesheet AST: selectors, declarations, rule sets.
//!
//! Every node implements `Display`, writing a normalised form of the source
//! (single spaces, `;`-terminated declarations). Two rule sets that print the
//! same are structurally equal.

use std::fmt;

/// A simple selector inside a compound selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorComponent {
    /// `Button`
    Type(String),
    /// `*`
    Universal,
    /// `.primary`
    Class(String),
    /// `#main`
    Id(String),
    /// `:hover`
    PseudoClass(String),
}

/// Relationship between two compound selectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// `A B`
    Descendant,
    /// `A > B`
    Child,
}

/// Simple selectors written without whitespace, e.g. `Button.primary:hover`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CompoundSelector {
    pub components: Vec<SelectorComponent>,
}

impl CompoundSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, component: SelectorComponent) {
        self.components.push(component);
    }

    /// `true` for a lone `*`.
    pub fn is_universal(&self) -> bool {
        matches!(self.components.as_slice(), [SelectorComponent::Universal])
    }
}

/// Either a compound selector or the combinator joining two of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorPart {
    Compound(CompoundSelector),
    Combinator(Combinator),
}

/// Compound selectors joined by combinators. Starts and ends with a compound.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Selector {
    pub parts: Vec<SelectorPart>,
}

impl Selector {
    pub fn new() -> Self {
        Self::default()
    }

    /// The right-most compound selector, i.e. the element the rule targets.
    pub fn subject(&self) -> Option<&CompoundSelector> {
        self.parts.iter().rev().find_map(|part| match part {
            SelectorPart::Compound(compound) => Some(compound),
            SelectorPart::Combinator(_) => None,
        })
    }
}

/// One value inside a declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum DeclarationValue {
    /// `red`, `bold`
    Ident(String),
    /// `10`, `3.5`
    Number(f32),
    /// `1fr`, `50%`, `12px`
    Dimension(f32, String),
    /// Hex color without `#`, e.g. `"ff00aa"`.
    Color(String),
    /// Quoted string without quotes.
    String(String),
    /// Variable name without `$`.
    Variable(String),
}

/// `property: value value [!important];`
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub property: String,
    pub values: Vec<DeclarationValue>,
    pub important: bool,
}

impl Declaration {
    pub fn new(property: impl Into<String>, values: Vec<DeclarationValue>, important: bool) -> Self {
        Self {
            property: property.into(),
            values,
            important,
        }
    }
}

/// Selector list paired with its declaration block.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleSet {
    pub selectors: Vec<Selector>,
    pub declarations: Vec<Declaration>,
}

impl RuleSet {
    /// Last declaration for `property`, which is the one that applies.
    pub fn declaration(&self, property: &str) -> Option<&Declaration> {
        self.declarations.iter().rev().find(|d| d.property == property)
    }
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

impl fmt::Display for SelectorComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Type(name) => f.write_str(name),
            Self::Universal => f.write_str("*"),
            Self::Class(name) => write!(f, ".{name}"),
            Self::Id(name) => write!(f, "#{name}"),
            Self::PseudoClass(name) => write!(f, ":{name}"),
        }
    }
}

impl fmt::Display for CompoundSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.components.iter().try_for_each(|c| write!(f, "{c}"))
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for part in &self.parts {
            match part {
                SelectorPart::Compound(compound) => write!(f, "{compound}")?,
                SelectorPart::Combinator(Combinator::Descendant) => f.write_str(" ")?,
                SelectorPart::Combinator(Combinator::Child) => f.write_str(" > ")?,
            }
        }
        Ok(())
    }
}

impl fmt::Display for DeclarationValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ident(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{n}"),
            Self::Dimension(n, unit) => write!(f, "{n}{unit}"),
            Self::Color(hex) => write!(f, "#{hex}"),
            Self::String(s) => write!(f, "\"{s}\""),
            Self::Variable(name) => write!(f, "${name}"),
        }
    }
}

impl fmt::Display for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.property)?;
        for value in &self.values {
            write!(f, " {value}")?;
        }
        if self.important {
            f.write_str(" !important")?;
        }
        f.write_str(";")
    }
}

impl fmt::Display for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, selector) in self.selectors.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{selector}")?;
        }
        f.write_str(" {")?;
        for declaration in &self.declarations {
            write!(f, " {declaration}")?;
        }
        f.write_str(" }")
    }
}
