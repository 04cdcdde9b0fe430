//! RecordingObserver: counts change notifications.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::service::TemplateObserver;

/// Observer that records how many times it was notified.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    notified: AtomicUsize,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> usize {
        self.notified.load(Ordering::Acquire)
    }
}

impl TemplateObserver for RecordingObserver {
    fn on_template_changed(&self) {
        self.notified.fetch_add(1, Ordering::AcqRel);
    }
}
