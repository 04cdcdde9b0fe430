//! Markup parser contract.

use super::node::RawMarkupNode;

/// Malformed markup reported by a [`MarkupParser`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed markup at byte {offset}: {message}")]
pub struct ParseError {
    /// Byte offset where parsing failed.
    pub offset: usize,
    pub message: String,
}

impl ParseError {
    pub fn new(offset: usize, message: impl Into<String>) -> Self {
        Self {
            offset,
            message: message.into(),
        }
    }
}

/// Turns raw document bytes into a [`RawMarkupNode`] tree.
///
/// Implementations must be thread-safe: fetches run concurrently and each
/// completed fetch parses on whatever task finished it.
pub trait MarkupParser: Send + Sync {
    fn parse(&self, bytes: &[u8]) -> Result<RawMarkupNode, ParseError>;
}

impl<F> MarkupParser for F
where
    F: Fn(&[u8]) -> Result<RawMarkupNode, ParseError> + Send + Sync,
{
    fn parse(&self, bytes: &[u8]) -> Result<RawMarkupNode, ParseError> {
        self(bytes)
    }
}
