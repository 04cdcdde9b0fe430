//! Service configuration.

use std::time::Duration;

use crate::fetch::CachePolicy;

/// Default delay between live-reload passes.
pub const DEFAULT_RELOAD_INTERVAL: Duration = Duration::from_secs(5);

/// Configuration for a [`TemplateService`](crate::service::TemplateService).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Cache policy passed to every fetch.
    pub cache_policy: CachePolicy,
    /// Re-poll resolved locations and notify observers on change.
    pub live_reload: bool,
    /// Delay between the end of one resolution and the next live-reload pass.
    pub reload_interval: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            cache_policy: CachePolicy::Normal,
            live_reload: false,
            reload_interval: DEFAULT_RELOAD_INTERVAL,
        }
    }
}

impl ServiceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the cache policy (builder).
    pub fn with_cache_policy(mut self, policy: CachePolicy) -> Self {
        self.cache_policy = policy;
        self
    }

    /// Enable or disable live reload (builder).
    pub fn with_live_reload(mut self, enabled: bool) -> Self {
        self.live_reload = enabled;
        self
    }

    /// Set the live-reload interval (builder). A zero interval is clamped to
    /// one millisecond so the loop always yields between passes.
    pub fn with_reload_interval(mut self, interval: Duration) -> Self {
        self.reload_interval = interval.max(Duration::from_millis(1));
        self
    }
}
