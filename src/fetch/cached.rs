//! Byte-level caching fetcher.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;
use tokio::time::Instant;

use super::source::ByteSource;
use super::{CachePolicy, FetchError, ParsedPayload, ParserKind, ResourceFetcher};
use crate::location::Location;
use crate::markup::MarkupParser;

/// Default lifetime of a cached byte payload.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
struct CachedBytes {
    content: Bytes,
    stored_at: Instant,
}

/// [`ResourceFetcher`] that caches origin bytes from a [`ByteSource`] and
/// decodes them per [`ParserKind`].
///
/// Only bytes are cached; parsing runs on every fetch so each caller gets a
/// fresh payload. Under [`CachePolicy::Bypass`] the cached copy is ignored and
/// replaced by whatever the origin returns.
pub struct CachingFetcher<S, P> {
    source: S,
    parser: P,
    cache: RwLock<HashMap<Location, CachedBytes>>,
    ttl: Option<Duration>,
}

impl<S, P> CachingFetcher<S, P>
where
    S: ByteSource,
    P: MarkupParser,
{
    /// Create a fetcher with the default TTL.
    pub fn new(source: S, parser: P) -> Self {
        Self {
            source,
            parser,
            cache: RwLock::new(HashMap::new()),
            ttl: Some(DEFAULT_TTL),
        }
    }

    /// Set how long cached bytes stay valid (builder).
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Keep cached bytes until cleared (builder).
    pub fn without_ttl(mut self) -> Self {
        self.ttl = None;
        self
    }

    /// Drop the cached bytes for one location.
    pub fn invalidate(&self, location: &Location) {
        self.cache.write().remove(location);
    }

    /// Number of locations with cached bytes (expired ones included).
    pub fn cached_len(&self) -> usize {
        self.cache.read().len()
    }

    fn cached(&self, location: &Location) -> Option<Bytes> {
        let cache = self.cache.read();
        let entry = cache.get(location)?;
        if let Some(ttl) = self.ttl {
            if entry.stored_at.elapsed() > ttl {
                return None;
            }
        }
        Some(entry.content.clone())
    }

    async fn load(&self, location: &Location, policy: CachePolicy) -> Result<Bytes, FetchError> {
        if policy == CachePolicy::Normal {
            if let Some(content) = self.cached(location) {
                tracing::trace!(%location, "templates.fetch.cache_hit");
                return Ok(content);
            }
        }

        tracing::trace!(%location, ?policy, "templates.fetch.origin");
        let content = match self.source.load(location).await {
            Ok(content) => content,
            Err(err) => {
                self.invalidate(location);
                return Err(err);
            }
        };
        self.cache.write().insert(
            location.clone(),
            CachedBytes {
                content: content.clone(),
                stored_at: Instant::now(),
            },
        );
        Ok(content)
    }

    fn decode(
        &self,
        location: &Location,
        kind: ParserKind,
        content: &[u8],
    ) -> Result<ParsedPayload, FetchError> {
        match kind {
            ParserKind::Markup => self
                .parser
                .parse(content)
                .map(ParsedPayload::Markup)
                .map_err(|source| FetchError::Parse {
                    location: location.clone(),
                    source,
                }),
            ParserKind::Style => std::str::from_utf8(content)
                .map(|text| ParsedPayload::Style(text.to_owned()))
                .map_err(|_| FetchError::InvalidUtf8(location.clone())),
        }
    }
}

#[async_trait]
impl<S, P> ResourceFetcher for CachingFetcher<S, P>
where
    S: ByteSource,
    P: MarkupParser,
{
    async fn fetch(
        &self,
        location: &Location,
        kind: ParserKind,
        policy: CachePolicy,
    ) -> Result<ParsedPayload, FetchError> {
        let content = self.load(location, policy).await?;
        self.decode(location, kind, &content)
    }

    fn clear_cache(&self) {
        let mut cache = self.cache.write();
        if !cache.is_empty() {
            tracing::debug!(entries = cache.len(), "templates.fetch.cache_cleared");
        }
        cache.clear();
    }
}
