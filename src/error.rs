//! Template resolution errors.
//!
//! Remote stylesheet failures never appear here: they degrade to an empty
//! fragment. Everything that prevents a location from producing a
//! [`CompiledTemplate`](crate::resolve::CompiledTemplate) is a
//! [`TemplateError`], wrapped per location in [`TemplateMissing`] and collected
//! into a [`BatchError`].

use crate::fetch::FetchError;
use crate::location::Location;

/// Why a single location failed to compile.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    /// The document could not be fetched or parsed.
    #[error(transparent)]
    Fetch(#[from] FetchError),
    /// The document has only style children.
    #[error("{location} has no component element")]
    MissingComponent { location: Location },
    /// The fetcher answered a markup request with a different payload kind.
    #[error("{location} did not produce a markup document")]
    UnexpectedPayload { location: Location },
    /// The task resolving the location panicked or was cancelled.
    #[error("resolution of {location} was aborted")]
    Aborted { location: Location },
}

/// A location whose template could not be produced.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("template missing at {location}")]
pub struct TemplateMissing {
    pub location: Location,
    #[source]
    pub reason: TemplateError,
}

/// Aggregate failure of a batch: every location that failed, in completion order.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{} of {total} template(s) failed to resolve", .failures.len())]
pub struct BatchError {
    pub(crate) failures: Vec<TemplateMissing>,
    pub(crate) total: usize,
}

impl BatchError {
    pub fn failures(&self) -> &[TemplateMissing] {
        &self.failures
    }

    /// The first failure to arrive.
    pub fn first(&self) -> Option<&TemplateMissing> {
        self.failures.first()
    }

    /// Locations that failed.
    pub fn locations(&self) -> impl Iterator<Item = &Location> {
        self.failures.iter().map(|f| &f.location)
    }

    /// Number of locations in the batch, failed or not.
    pub fn total(&self) -> usize {
        self.total
    }
}
