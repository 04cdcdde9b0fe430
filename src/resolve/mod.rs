//! Turning fetched documents into compiled templates.
//!
//! - [`style`]: split a document into its component and style fragments, and
//!   merge the fragments into one stylesheet.
//! - [`batch`]: the countdown that joins one batch of per-location results.
//! - [`template`]: the [`CompiledTemplate`] value stored in the cache.

pub mod batch;
pub mod style;
pub mod template;

use std::sync::Arc;

use crate::css::CompiledStyleSheet;
use crate::error::TemplateError;
use crate::fetch::{CachePolicy, ParserKind, ResourceFetcher};
use crate::location::Location;

pub use batch::{BatchJoin, BatchOutcome, BatchReport};
pub use style::{split_document, SplitDocument, StyleFragment, StyleResolver};
pub use template::CompiledTemplate;

/// Fetch the document at `location` and build its template.
///
/// Remote style fragments are fetched concurrently with the same `policy`
/// and degrade to empty text on failure. Only the document itself can fail.
pub async fn compile_template(
    fetcher: Arc<dyn ResourceFetcher>,
    location: &Location,
    policy: CachePolicy,
) -> Result<CompiledTemplate, TemplateError> {
    tracing::trace!(%location, ?policy, "templates.compile.fetch");
    let document = fetcher
        .fetch(location, ParserKind::Markup, policy)
        .await?
        .into_markup()
        .ok_or_else(|| TemplateError::UnexpectedPayload {
            location: location.clone(),
        })?;

    let split = split_document(document, location)?;
    let text = StyleResolver::new(fetcher, policy)
        .resolve(split.fragments)
        .await;
    Ok(CompiledTemplate::new(
        split.component,
        CompiledStyleSheet::compile(text),
    ))
}
