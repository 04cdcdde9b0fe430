//! Style resolution: split a document into component and style fragments,
//! then merge the fragments into a single stylesheet.
//!
//! Fragments are merged in document order no matter when remote fetches
//! finish. A remote fragment that fails to load contributes an empty string,
//! so one unreachable stylesheet never keeps the component from rendering.

use std::sync::Arc;

use tokio::task::JoinSet;

use crate::error::TemplateError;
use crate::fetch::{CachePolicy, ParsedPayload, ParserKind, ResourceFetcher};
use crate::location::Location;
use crate::markup::RawMarkupNode;

/// Element name marking a style child.
pub const STYLE_TAG: &str = "style";

/// Attribute on a style child pointing at a remote stylesheet.
pub const REMOTE_STYLE_ATTR: &str = "src";

/// One piece of a document's stylesheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StyleFragment {
    Inline(String),
    Remote(Location),
}

/// A document split into its component and style fragments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitDocument {
    pub component: RawMarkupNode,
    pub fragments: Vec<StyleFragment>,
}

/// Partition the document's direct children.
///
/// Every `<style>` child becomes a fragment, in order. The first other child
/// is the component; any later non-style children are ignored. Remote
/// references resolve against `location`.
pub fn split_document(
    document: RawMarkupNode,
    location: &Location,
) -> Result<SplitDocument, TemplateError> {
    let mut component = None;
    let mut fragments = Vec::new();

    for child in document.children {
        if child.is_named(STYLE_TAG) {
            fragments.push(style_fragment(child, location));
        } else if component.is_none() {
            component = Some(child);
        }
    }

    let component = component.ok_or_else(|| TemplateError::MissingComponent {
        location: location.clone(),
    })?;
    Ok(SplitDocument {
        component,
        fragments,
    })
}

fn style_fragment(node: RawMarkupNode, document: &Location) -> StyleFragment {
    let Some(reference) = node.attr(REMOTE_STYLE_ATTR) else {
        return StyleFragment::Inline(node.text.unwrap_or_default());
    };
    match document.join(reference) {
        Ok(remote) => StyleFragment::Remote(remote),
        Err(err) => {
            tracing::warn!(%document, reference, error = %err, "templates.style.unresolvable_reference");
            StyleFragment::Inline(String::new())
        }
    }
}

/// Merges style fragments, fetching remote ones concurrently.
#[derive(Clone)]
pub struct StyleResolver {
    fetcher: Arc<dyn ResourceFetcher>,
    policy: CachePolicy,
}

impl StyleResolver {
    pub fn new(fetcher: Arc<dyn ResourceFetcher>, policy: CachePolicy) -> Self {
        Self { fetcher, policy }
    }

    /// Concatenate fragment texts in the order given.
    ///
    /// Completes without suspending when there are no remote fragments.
    /// Remote fetches run as separate tasks, so this must be called inside a
    /// tokio runtime whenever a remote fragment is present.
    pub async fn resolve(&self, fragments: Vec<StyleFragment>) -> String {
        let mut texts: Vec<Option<String>> = Vec::with_capacity(fragments.len());
        let mut remotes = JoinSet::new();

        for (index, fragment) in fragments.into_iter().enumerate() {
            match fragment {
                StyleFragment::Inline(text) => texts.push(Some(text)),
                StyleFragment::Remote(location) => {
                    texts.push(None);
                    let fetcher = Arc::clone(&self.fetcher);
                    let policy = self.policy;
                    remotes.spawn(async move {
                        let text = fetch_remote(fetcher.as_ref(), &location, policy).await;
                        (index, text)
                    });
                }
            }
        }

        if !remotes.is_empty() {
            tracing::trace!(remotes = remotes.len(), "templates.style.fetch_remotes");
            while let Some(joined) = remotes.join_next().await {
                match joined {
                    Ok((index, text)) => texts[index] = Some(text),
                    // The slot stays `None` and contributes nothing.
                    Err(err) => tracing::warn!(error = %err, "templates.style.remote_aborted"),
                }
            }
        }

        texts.into_iter().flatten().collect()
    }
}

async fn fetch_remote(
    fetcher: &dyn ResourceFetcher,
    location: &Location,
    policy: CachePolicy,
) -> String {
    match fetcher.fetch(location, ParserKind::Style, policy).await {
        Ok(ParsedPayload::Style(text)) => text,
        Ok(other) => {
            tracing::warn!(%location, kind = ?other.kind(), "templates.style.unexpected_payload");
            String::new()
        }
        Err(err) => {
            tracing::warn!(%location, error = %err, "templates.style.remote_failed");
            String::new()
        }
    }
}
