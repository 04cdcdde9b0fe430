//! Integration tests for gilt-templates.
//!
//! These tests drive the public API from outside the crate: a
//! `TemplateService` over either the scripted test fetcher or a real
//! `CachingFetcher` on top of an in-memory origin.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use tokio_test::assert_ready_ok;

use gilt_templates::fetch::MemorySource;
use gilt_templates::testing::{RecordingObserver, ScriptedFetcher};
use gilt_templates::{
    CachePolicy, CachingFetcher, FetchError, Location, ParseError, RawMarkupNode, ServiceConfig,
    TemplateError, TemplateService,
};

fn loc(path: &str) -> Location {
    Location::parse(&format!("https://templates.test/{path}")).unwrap()
}

fn inline(text: &str) -> RawMarkupNode {
    RawMarkupNode::new("style").with_text(text)
}

fn remote(reference: &str) -> RawMarkupNode {
    RawMarkupNode::new("style").with_attr("src", reference)
}

fn live_config() -> ServiceConfig {
    ServiceConfig::new()
        .with_live_reload(true)
        .with_reload_interval(Duration::from_secs(5))
}

/// One node per line: `style <text>`, `link <reference>` or `component <name>`.
fn parse_lines(bytes: &[u8]) -> Result<RawMarkupNode, ParseError> {
    let text = std::str::from_utf8(bytes).map_err(|e| ParseError::new(e.valid_up_to(), "not UTF-8"))?;
    let mut document = RawMarkupNode::new("doc");
    let mut offset = 0;
    for line in text.lines() {
        let (kind, rest) = line.split_once(' ').unwrap_or((line, ""));
        let child = match kind {
            "style" => inline(rest),
            "link" => remote(rest),
            "component" => RawMarkupNode::new(rest),
            _ => return Err(ParseError::new(offset, format!("unknown line `{line}`"))),
        };
        document = document.with_child(child);
        offset += line.len() + 1;
    }
    Ok(document)
}

// ---------------------------------------------------------------------------
// Batch completion
// ---------------------------------------------------------------------------

#[test]
fn test_empty_batch_completes_immediately() {
    let fetcher = Arc::new(ScriptedFetcher::new());
    let service = TemplateService::new(fetcher.clone(), ServiceConfig::default());

    let mut task = tokio_test::task::spawn(service.resolve_all(Vec::new()));
    let report = assert_ready_ok!(task.poll());
    assert!(report.is_empty());
    assert!(service.cached_locations().is_empty());
    assert_eq!(fetcher.total_fetches(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_completion_fires_once_for_any_arrival_order() {
    let fetcher = Arc::new(ScriptedFetcher::new());
    let locations: Vec<_> = (0..24).map(|i| loc(&format!("t{i}.xml"))).collect();
    for (i, location) in locations.iter().enumerate() {
        let name = format!("c{i}");
        let theme = format!("theme{i}.css");
        fetcher.markup(
            location.clone(),
            RawMarkupNode::new("doc")
                .with_child(remote(&theme))
                .with_child(RawMarkupNode::new(name)),
        );
        fetcher.delay(location.clone(), Duration::from_millis((i as u64 * 7) % 13));
        fetcher.style(loc(&theme), format!("S{i}"));
        fetcher.delay(loc(&theme), Duration::from_millis((i as u64 * 5) % 11));
    }
    fetcher.fail(locations[3].clone(), FetchError::NotFound(locations[3].clone()));
    fetcher.panic_on(locations[9].clone());

    let service = TemplateService::new(fetcher.clone(), ServiceConfig::default());
    let calls = Arc::new(AtomicUsize::new(0));
    let (tx, rx) = tokio::sync::oneshot::channel();
    let seen = Arc::clone(&calls);
    service.resolve_all_with(locations.clone(), move |result| {
        seen.fetch_add(1, Ordering::SeqCst);
        let _ = tx.send(result);
    });

    let err = rx.await.unwrap().unwrap_err();
    assert_eq!(err.total(), 24);
    let mut failed: Vec<_> = err.locations().cloned().collect();
    failed.sort();
    let mut expected = vec![locations[3].clone(), locations[9].clone()];
    expected.sort();
    assert_eq!(failed, expected);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(service.cached_locations().len(), 22);
}

// ---------------------------------------------------------------------------
// Style order and fail-soft
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn test_fragments_keep_document_order() {
    let fetcher = Arc::new(ScriptedFetcher::new());
    fetcher.markup(
        loc("main.xml"),
        RawMarkupNode::new("doc")
            .with_child(inline("a"))
            .with_child(remote("x.css"))
            .with_child(inline("b"))
            .with_child(RawMarkupNode::new("screen")),
    );
    fetcher.style(loc("x.css"), "B");
    fetcher.delay(loc("x.css"), Duration::from_millis(250));

    let service = TemplateService::new(fetcher, ServiceConfig::default());
    service.resolve_all([loc("main.xml")]).await.unwrap();
    let template = service.compiled_template(&loc("main.xml")).unwrap();
    assert_eq!(template.style_sheet().text(), "aBb");
}

#[tokio::test]
async fn test_failed_remote_style_degrades_to_empty() {
    let fetcher = Arc::new(ScriptedFetcher::new());
    fetcher.markup(
        loc("main.xml"),
        RawMarkupNode::new("doc")
            .with_child(inline("a"))
            .with_child(remote("x.css"))
            .with_child(inline("b"))
            .with_child(RawMarkupNode::new("screen")),
    );
    fetcher.fail(
        loc("x.css"),
        FetchError::Io {
            location: loc("x.css"),
            message: "connection reset".into(),
        },
    );

    let service = TemplateService::new(fetcher, ServiceConfig::default());
    let report = service.resolve_all([loc("main.xml")]).await.unwrap();
    assert_eq!(report.resolved(), &[loc("main.xml")]);
    let template = service.compiled_template(&loc("main.xml")).unwrap();
    assert_eq!(template.style_sheet().text(), "ab");
}

#[tokio::test]
async fn test_missing_component_writes_no_entry() {
    let fetcher = Arc::new(ScriptedFetcher::new());
    fetcher.markup(loc("styles-only.xml"), RawMarkupNode::new("doc").with_child(inline("a")));

    let service = TemplateService::new(fetcher, ServiceConfig::default());
    let err = service.resolve_all([loc("styles-only.xml")]).await.unwrap_err();
    let failure = err.first().unwrap();
    assert_eq!(failure.location, loc("styles-only.xml"));
    assert_eq!(
        failure.reason,
        TemplateError::MissingComponent {
            location: loc("styles-only.xml")
        }
    );
    assert!(service.compiled_template(&loc("styles-only.xml")).is_none());
}

// ---------------------------------------------------------------------------
// Live reload
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn test_identical_content_does_not_notify() {
    let fetcher = Arc::new(ScriptedFetcher::new());
    let document = RawMarkupNode::new("doc")
        .with_child(inline("Label { color: red; }"))
        .with_child(RawMarkupNode::new("screen"));
    fetcher.markup(loc("main.xml"), document.clone());

    let service = TemplateService::new(fetcher.clone(), live_config());
    let observer = Arc::new(RecordingObserver::new());
    service.register_observer(&observer, loc("main.xml")).unwrap();
    service.resolve_all([loc("main.xml")]).await.unwrap();
    let first = service.compiled_template(&loc("main.xml")).unwrap();

    fetcher.markup(loc("main.xml"), document);
    tokio::time::sleep(Duration::from_secs(16)).await;

    assert_eq!(fetcher.fetch_count(&loc("main.xml")), 4);
    let latest = service.compiled_template(&loc("main.xml")).unwrap();
    assert_eq!(*latest, *first);
    assert_eq!(observer.notifications(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_observers_notified_on_change() {
    let fetcher = Arc::new(ScriptedFetcher::new());
    fetcher.markup(
        loc("main.xml"),
        RawMarkupNode::new("doc").with_child(RawMarkupNode::new("screen")),
    );
    let service = TemplateService::new(fetcher.clone(), live_config());

    let a = Arc::new(RecordingObserver::new());
    let b = Arc::new(RecordingObserver::new());
    let gone = Arc::new(RecordingObserver::new());
    service.register_observer(&a, loc("main.xml")).unwrap();
    service.register_observer(&b, loc("main.xml")).unwrap();
    service.register_observer(&gone, loc("main.xml")).unwrap();
    drop(gone);

    service.resolve_all([loc("main.xml")]).await.unwrap();

    fetcher.markup(
        loc("main.xml"),
        RawMarkupNode::new("doc").with_child(RawMarkupNode::new("screen").with_attr("id", "v2")),
    );
    tokio::time::sleep(Duration::from_millis(5_001)).await;
    assert_eq!(a.notifications(), 1);
    assert_eq!(b.notifications(), 1);

    assert!(service.unregister_observer(&a, &loc("main.xml")));
    fetcher.markup(
        loc("main.xml"),
        RawMarkupNode::new("doc").with_child(RawMarkupNode::new("screen").with_attr("id", "v3")),
    );
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(a.notifications(), 1);
    assert_eq!(b.notifications(), 2);

    let template = service.compiled_template(&loc("main.xml")).unwrap();
    assert_eq!(template.component().attr("id"), Some("v3"));
}

#[tokio::test(start_paused = true)]
async fn test_stop_live_reload() {
    let fetcher = Arc::new(ScriptedFetcher::new());
    fetcher.markup(
        loc("main.xml"),
        RawMarkupNode::new("doc").with_child(RawMarkupNode::new("screen")),
    );
    let service = TemplateService::new(fetcher.clone(), live_config());
    service.resolve_all([loc("main.xml")]).await.unwrap();

    service.stop_live_reload();
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(fetcher.fetch_count(&loc("main.xml")), 1);

    let observer = Arc::new(RecordingObserver::new());
    assert!(service.register_observer(&observer, loc("main.xml")).is_none());
}

// ---------------------------------------------------------------------------
// Cache policy against a byte-level cache
// ---------------------------------------------------------------------------

fn origin() -> MemorySource {
    MemorySource::with_files([
        (loc("main.xml"), "style Label { color: red; }\nlink theme.css\ncomponent screen"),
        (loc("theme.css"), "Screen { background: #000000; }"),
    ])
}

#[tokio::test]
async fn test_normal_policy_serves_from_byte_cache() {
    let source = origin();
    let fetcher = Arc::new(CachingFetcher::new(source.clone(), parse_lines));
    let service = TemplateService::new(fetcher, ServiceConfig::default());

    service.resolve_all([loc("main.xml")]).await.unwrap();
    service.resolve_all([loc("main.xml")]).await.unwrap();
    assert_eq!(source.load_count(), 2);

    let template = service.compiled_template(&loc("main.xml")).unwrap();
    assert_eq!(template.component().name, "screen");
    assert_eq!(
        template.style_sheet().text(),
        "Label { color: red; }Screen { background: #000000; }"
    );
}

#[tokio::test]
async fn test_bypass_policy_always_hits_origin() {
    let source = origin();
    let fetcher = Arc::new(CachingFetcher::new(source.clone(), parse_lines));
    let config = ServiceConfig::new().with_cache_policy(CachePolicy::Bypass);
    let service = TemplateService::new(fetcher, config);

    service.resolve_all([loc("main.xml")]).await.unwrap();
    service.resolve_all([loc("main.xml")]).await.unwrap();
    assert_eq!(source.load_count(), 4);
}

#[tokio::test]
async fn test_parse_failure_is_reported_per_location() {
    let source = origin();
    source.insert(loc("broken.xml"), "oops");
    let fetcher = Arc::new(CachingFetcher::new(source, parse_lines));
    let service = TemplateService::new(fetcher, ServiceConfig::default());

    let err = service
        .resolve_all([loc("main.xml"), loc("broken.xml")])
        .await
        .unwrap_err();
    assert_eq!(err.locations().cloned().collect::<Vec<_>>(), vec![loc("broken.xml")]);
    assert!(matches!(
        err.first().unwrap().reason,
        TemplateError::Fetch(FetchError::Parse { .. })
    ));
    assert!(service.compiled_template(&loc("main.xml")).is_some());
}
