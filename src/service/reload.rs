//! Live reload: re-resolve watched locations on an interval and notify
//! observers of locations whose template changed.
//!
//! The loop holds only a weak reference to the service, so it never keeps
//! the service alive. It exits when its [`CancellationToken`] is cancelled
//! or the service is gone. Cancellation is checked before every pass and
//! again before notifying.

use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::Inner;
use crate::resolve::BatchJoin;

/// Stops the live-reload loop of one service.
#[derive(Debug, Clone)]
pub struct LiveReloadHandle {
    token: CancellationToken,
}

impl LiveReloadHandle {
    pub(crate) fn new(token: CancellationToken) -> Self {
        Self { token }
    }

    /// Stop the loop. Idempotent.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Completes once the loop has been asked to stop.
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }
}

pub(crate) fn spawn(inner: Weak<Inner>, token: CancellationToken, interval: Duration) {
    tokio::spawn(run(inner, token, interval));
}

async fn run(inner: Weak<Inner>, token: CancellationToken, interval: Duration) {
    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }
        let Some(inner) = inner.upgrade() else {
            break;
        };
        let changed = pass(&inner, &token).await;
        tracing::trace!(changed, "templates.reload.pass");
    }
    tracing::info!("templates.reload.stop");
}

/// One re-resolution of the watched set. Returns how many locations changed.
async fn pass(inner: &Arc<Inner>, token: &CancellationToken) -> usize {
    let watched: Vec<_> = inner.domain.lock().watched.iter().cloned().collect();
    if watched.is_empty() {
        return 0;
    }
    let before = inner.cache.snapshot(&watched);
    let outcome = inner.run_batch(BatchJoin::new(watched)).await;

    for failure in &outcome.failures {
        tracing::debug!(location = %failure.location, error = %failure.reason, "templates.reload.skip");
    }
    if token.is_cancelled() {
        return 0;
    }

    let mut changed = 0;
    for location in &outcome.resolved {
        let Some(current) = inner.cache.get(location) else {
            continue;
        };
        let differs = before
            .get(location)
            .map_or(true, |previous| **previous != *current);
        if differs {
            changed += 1;
            let notified = inner.notify(location);
            tracing::info!(%location, notified, "templates.reload.changed");
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServiceConfig;
    use crate::fetch::FetchError;
    use crate::location::Location;
    use crate::markup::RawMarkupNode;
    use crate::service::TemplateService;
    use crate::testing::{RecordingObserver, ScriptedFetcher};

    const INTERVAL: Duration = Duration::from_secs(5);

    fn loc(path: &str) -> Location {
        Location::parse(&format!("https://templates.test/{path}")).unwrap()
    }

    fn document(component: &str) -> RawMarkupNode {
        RawMarkupNode::new("doc").with_child(RawMarkupNode::new(component))
    }

    fn live_service(fetcher: &Arc<ScriptedFetcher>) -> TemplateService {
        let config = ServiceConfig::new()
            .with_live_reload(true)
            .with_reload_interval(INTERVAL);
        TemplateService::new(fetcher.clone(), config)
    }

    /// Advance past one interval and let the pass finish.
    async fn next_pass() {
        tokio::time::sleep(INTERVAL + Duration::from_millis(1)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn notifies_only_on_change() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        fetcher.markup(loc("a.xml"), document("one"));
        let service = live_service(&fetcher);
        let observer = Arc::new(RecordingObserver::new());
        service.register_observer(&observer, loc("a.xml"));

        service.resolve_all([loc("a.xml")]).await.unwrap();
        next_pass().await;
        assert_eq!(fetcher.fetch_count(&loc("a.xml")), 2);
        assert_eq!(observer.notifications(), 0);

        fetcher.markup(loc("a.xml"), document("two"));
        next_pass().await;
        assert_eq!(observer.notifications(), 1);
        assert_eq!(service.compiled_template(&loc("a.xml")).unwrap().component().name, "two");

        next_pass().await;
        assert_eq!(observer.notifications(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_reload_keeps_entry_and_keeps_looping() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        fetcher.markup(loc("a.xml"), document("one"));
        let service = live_service(&fetcher);
        let observer = Arc::new(RecordingObserver::new());
        service.register_observer(&observer, loc("a.xml"));
        service.resolve_all([loc("a.xml")]).await.unwrap();

        fetcher.fail(loc("a.xml"), FetchError::NotFound(loc("a.xml")));
        next_pass().await;
        assert_eq!(observer.notifications(), 0);
        assert_eq!(service.compiled_template(&loc("a.xml")).unwrap().component().name, "one");

        fetcher.markup(loc("a.xml"), document("two"));
        next_pass().await;
        assert_eq!(observer.notifications(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_loop_stops_polling() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        fetcher.markup(loc("a.xml"), document("one"));
        let service = live_service(&fetcher);
        let handle = service.live_reload_handle();
        service.resolve_all([loc("a.xml")]).await.unwrap();

        next_pass().await;
        assert_eq!(fetcher.fetch_count(&loc("a.xml")), 2);

        handle.cancel();
        assert!(handle.is_cancelled());
        next_pass().await;
        next_pass().await;
        assert_eq!(fetcher.fetch_count(&loc("a.xml")), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_service_stops_the_loop() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        fetcher.markup(loc("a.xml"), document("one"));
        let service = live_service(&fetcher);
        let handle = service.live_reload_handle();
        service.resolve_all([loc("a.xml")]).await.unwrap();

        drop(service);
        handle.cancelled().await;
        next_pass().await;
        assert_eq!(fetcher.fetch_count(&loc("a.xml")), 1);
    }
}
