//! BatchJoin: the countdown joining one batch of per-location results.
//!
//! The join is keyed by location rather than by a bare counter. Each pending
//! location leaves the pending set exactly once, on either the resolved or
//! the failed path, and a second report for the same location is ignored.
//! The batch is complete when the pending set is empty.

use indexmap::IndexSet;

use crate::error::{BatchError, TemplateError, TemplateMissing};
use crate::location::Location;

/// Outstanding state of one batch.
#[derive(Debug, Clone, Default)]
pub struct BatchJoin {
    pending: IndexSet<Location>,
    resolved: Vec<Location>,
    failures: Vec<TemplateMissing>,
    total: usize,
}

impl BatchJoin {
    /// Start a join over `locations`. Duplicates count once.
    pub fn new(locations: impl IntoIterator<Item = Location>) -> Self {
        let pending: IndexSet<Location> = locations.into_iter().collect();
        let total = pending.len();
        Self {
            pending,
            resolved: Vec::with_capacity(total),
            failures: Vec::new(),
            total,
        }
    }

    /// Locations still outstanding, in input order.
    pub fn pending(&self) -> impl Iterator<Item = &Location> {
        self.pending.iter()
    }

    pub fn remaining(&self) -> usize {
        self.pending.len()
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn is_complete(&self) -> bool {
        self.pending.is_empty()
    }

    /// Mark `location` resolved. Returns `false` if it was not pending.
    pub fn resolved(&mut self, location: Location) -> bool {
        if !self.pending.shift_remove(&location) {
            return false;
        }
        self.resolved.push(location);
        true
    }

    /// Mark `location` failed. Returns `false` if it was not pending.
    pub fn failed(&mut self, location: Location, reason: TemplateError) -> bool {
        if !self.pending.shift_remove(&location) {
            return false;
        }
        self.failures.push(TemplateMissing { location, reason });
        true
    }

    /// Fail every location still pending with [`TemplateError::Aborted`].
    pub fn abandon_pending(&mut self) {
        for location in std::mem::take(&mut self.pending) {
            let reason = TemplateError::Aborted {
                location: location.clone(),
            };
            self.failures.push(TemplateMissing { location, reason });
        }
    }

    /// Close the join. Anything still pending counts as aborted.
    pub fn finish(mut self) -> BatchOutcome {
        self.abandon_pending();
        BatchOutcome {
            resolved: self.resolved,
            failures: self.failures,
            total: self.total,
        }
    }
}

/// Everything one batch produced, success and failure alike.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Locations whose template was committed, in completion order.
    pub resolved: Vec<Location>,
    /// Failed locations, in completion order.
    pub failures: Vec<TemplateMissing>,
    pub total: usize,
}

impl BatchOutcome {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Success when nothing failed, otherwise every failure at once.
    pub fn into_result(self) -> Result<BatchReport, BatchError> {
        if self.failures.is_empty() {
            Ok(BatchReport {
                resolved: self.resolved,
            })
        } else {
            Err(BatchError {
                failures: self.failures,
                total: self.total,
            })
        }
    }
}

/// Successful batch result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    resolved: Vec<Location>,
}

impl BatchReport {
    /// Locations now cached, in completion order.
    pub fn resolved(&self) -> &[Location] {
        &self.resolved
    }

    pub fn len(&self) -> usize {
        self.resolved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolved.is_empty()
    }
}
