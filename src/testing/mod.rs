//! Test doubles for driving a [`TemplateService`](crate::service::TemplateService)
//! without a real origin.
//!
//! Use [`ScriptedFetcher`] to answer fetches with fixed payloads, delays or
//! failures and to count origin traffic. Use [`RecordingObserver`] to count
//! change notifications.

pub mod fetcher;
pub mod observer;

pub use fetcher::ScriptedFetcher;
pub use observer::RecordingObserver;
