//! Stylesheet engine: tokenizer, parser, compiled stylesheet.

pub mod model;
pub mod parser;
pub mod stylesheet;
pub mod tokenizer;

pub use parser::StyleDiagnostic;
pub use stylesheet::CompiledStyleSheet;
