//! Raw resource fetching: the collaborator contract the orchestrator consumes.
//!
//! A [`ResourceFetcher`] loads a location and parses it by [`ParserKind`].
//! Fetches may run concurrently and finish in any order. The only caching knob
//! the orchestrator relies on is [`CachePolicy`].
//!
//! [`CachingFetcher`] is the stock implementation: a byte cache over any
//! [`ByteSource`], decoding markup through a [`MarkupParser`](crate::markup::MarkupParser).

pub mod cached;
pub mod source;

use async_trait::async_trait;

use crate::location::Location;
use crate::markup::{ParseError, RawMarkupNode};

pub use cached::CachingFetcher;
pub use source::{ByteSource, FileSource, MemorySource};

/// How a fetch treats the byte-level cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CachePolicy {
    /// Serve from and populate the byte cache.
    #[default]
    Normal,
    /// Ignore cached bytes and revalidate from origin.
    Bypass,
}

/// Which parser turns fetched bytes into a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParserKind {
    /// Markup document → [`RawMarkupNode`].
    Markup,
    /// Stylesheet → UTF-8 text.
    Style,
}

/// Parsed result of a fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedPayload {
    Markup(RawMarkupNode),
    Style(String),
}

impl ParsedPayload {
    pub fn kind(&self) -> ParserKind {
        match self {
            Self::Markup(_) => ParserKind::Markup,
            Self::Style(_) => ParserKind::Style,
        }
    }

    pub fn into_markup(self) -> Option<RawMarkupNode> {
        match self {
            Self::Markup(node) => Some(node),
            Self::Style(_) => None,
        }
    }

    pub fn into_style(self) -> Option<String> {
        match self {
            Self::Style(text) => Some(text),
            Self::Markup(_) => None,
        }
    }
}

/// Network, I/O or decoding failure from a fetcher.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("resource not found: {0}")]
    NotFound(Location),
    #[error("failed to read {location}: {message}")]
    Io { location: Location, message: String },
    #[error("{0} is not valid UTF-8")]
    InvalidUtf8(Location),
    #[error("failed to parse {location}")]
    Parse {
        location: Location,
        #[source]
        source: ParseError,
    },
    #[error("no source can load {0}")]
    UnsupportedLocation(Location),
}

impl FetchError {
    /// The location the failure belongs to.
    pub fn location(&self) -> &Location {
        match self {
            Self::NotFound(location)
            | Self::InvalidUtf8(location)
            | Self::UnsupportedLocation(location)
            | Self::Io { location, .. }
            | Self::Parse { location, .. } => location,
        }
    }
}

/// Asynchronous fetch-and-parse primitive.
#[async_trait]
pub trait ResourceFetcher: Send + Sync {
    async fn fetch(
        &self,
        location: &Location,
        kind: ParserKind,
        policy: CachePolicy,
    ) -> Result<ParsedPayload, FetchError>;

    /// Drop every cached byte payload. Called once per batch under
    /// [`CachePolicy::Bypass`].
    fn clear_cache(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc() -> Location {
        Location::parse("https://templates.test/a.xml").unwrap()
    }

    #[test]
    fn payload_accessors() {
        let markup = ParsedPayload::Markup(RawMarkupNode::new("doc"));
        assert_eq!(markup.kind(), ParserKind::Markup);
        assert!(markup.clone().into_style().is_none());
        assert_eq!(markup.into_markup(), Some(RawMarkupNode::new("doc")));

        let style = ParsedPayload::Style("Label {}".into());
        assert_eq!(style.kind(), ParserKind::Style);
        assert_eq!(style.into_style().as_deref(), Some("Label {}"));
    }

    #[test]
    fn default_policy_is_normal() {
        assert_eq!(CachePolicy::default(), CachePolicy::Normal);
    }

    #[test]
    fn error_location_and_display() {
        let err = FetchError::Parse {
            location: loc(),
            source: ParseError::new(3, "unclosed tag"),
        };
        assert_eq!(err.location(), &loc());
        assert_eq!(err.to_string(), "failed to parse https://templates.test/a.xml");
        let source = std::error::Error::source(&err).map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("malformed markup at byte 3: unclosed tag"));

        let err = FetchError::NotFound(loc());
        assert_eq!(err.to_string(), "resource not found: https://templates.test/a.xml");
    }
}
