//! Markup documents as produced by an external parser.
//!
//! The markup grammar itself lives outside this crate; only the node shape and
//! the parser contract are defined here.

pub mod node;
pub mod parser;

pub use node::RawMarkupNode;
pub use parser::{MarkupParser, ParseError};
