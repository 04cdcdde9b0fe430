//! ScriptedFetcher: an in-memory [`ResourceFetcher`] double.
//!
//! Each location is scripted with a response and an optional delay. Every
//! call is counted before the delay starts, so tests can assert on origin
//! traffic as well as on completion order.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};

use crate::fetch::{CachePolicy, FetchError, ParsedPayload, ParserKind, ResourceFetcher};
use crate::location::Location;
use crate::markup::RawMarkupNode;

#[derive(Debug, Clone)]
enum Response {
    Payload(ParsedPayload),
    Fail(FetchError),
    Panic,
}

#[derive(Debug, Clone)]
struct Script {
    response: Response,
    delay: Duration,
}

#[derive(Debug, Default)]
struct CallLog {
    counts: HashMap<Location, usize>,
    policies: HashMap<Location, CachePolicy>,
}

/// Fetcher whose responses are set per location.
///
/// Unscripted locations fail with [`FetchError::NotFound`]. The payload is
/// returned as scripted regardless of the requested [`ParserKind`].
#[derive(Debug, Default)]
pub struct ScriptedFetcher {
    scripts: RwLock<HashMap<Location, Script>>,
    calls: Mutex<CallLog>,
    clears: AtomicUsize,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    fn set(&self, location: Location, response: Response) {
        let mut scripts = self.scripts.write();
        let delay = scripts.get(&location).map(|s| s.delay).unwrap_or_default();
        scripts.insert(location, Script { response, delay });
    }

    /// Answer `location` with a markup document.
    pub fn markup(&self, location: Location, document: RawMarkupNode) {
        self.set(location, Response::Payload(ParsedPayload::Markup(document)));
    }

    /// Answer `location` with stylesheet text.
    pub fn style(&self, location: Location, text: impl Into<String>) {
        self.set(location, Response::Payload(ParsedPayload::Style(text.into())));
    }

    /// Fail `location` with `error`.
    pub fn fail(&self, location: Location, error: FetchError) {
        self.set(location, Response::Fail(error));
    }

    /// Panic inside the fetch for `location`.
    pub fn panic_on(&self, location: Location) {
        self.set(location, Response::Panic);
    }

    /// Delay every response for `location`. Keeps the scripted response.
    pub fn delay(&self, location: Location, delay: Duration) {
        let mut scripts = self.scripts.write();
        let not_found = Response::Fail(FetchError::NotFound(location.clone()));
        scripts
            .entry(location)
            .or_insert(Script {
                response: not_found,
                delay,
            })
            .delay = delay;
    }

    /// Forget the script for `location`.
    pub fn remove(&self, location: &Location) {
        self.scripts.write().remove(location);
    }

    /// Calls made for `location`.
    pub fn fetch_count(&self, location: &Location) -> usize {
        self.calls.lock().counts.get(location).copied().unwrap_or(0)
    }

    /// Calls made for every location.
    pub fn total_fetches(&self) -> usize {
        self.calls.lock().counts.values().sum()
    }

    /// Policy passed on the most recent call for `location`.
    pub fn last_policy(&self, location: &Location) -> Option<CachePolicy> {
        self.calls.lock().policies.get(location).copied()
    }

    /// Times [`ResourceFetcher::clear_cache`] was called.
    pub fn clear_count(&self) -> usize {
        self.clears.load(Ordering::Acquire)
    }
}

#[async_trait]
impl ResourceFetcher for ScriptedFetcher {
    async fn fetch(
        &self,
        location: &Location,
        _kind: ParserKind,
        policy: CachePolicy,
    ) -> Result<ParsedPayload, FetchError> {
        {
            let mut calls = self.calls.lock();
            *calls.counts.entry(location.clone()).or_default() += 1;
            calls.policies.insert(location.clone(), policy);
        }
        let script = self.scripts.read().get(location).cloned();
        let Some(script) = script else {
            return Err(FetchError::NotFound(location.clone()));
        };
        if !script.delay.is_zero() {
            tokio::time::sleep(script.delay).await;
        }
        match script.response {
            Response::Payload(payload) => Ok(payload),
            Response::Fail(error) => Err(error),
            Response::Panic => panic!("scripted panic fetching {location}"),
        }
    }

    fn clear_cache(&self) {
        self.clears.fetch_add(1, Ordering::AcqRel);
    }
}
