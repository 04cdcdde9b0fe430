//! CacheStore: location-keyed compiled templates.
//!
//! Readers load the current map through [`ArcSwap`] and never block. Writers
//! copy the map, replace one entry and publish the copy, so a reader sees
//! either the previous template or the new one, never a mix. Writes happen
//! only inside the service's synchronization domain.

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::location::Location;
use crate::resolve::CompiledTemplate;

#[derive(Debug, Clone)]
struct CacheEntry {
    generation: u64,
    template: Arc<CompiledTemplate>,
}

type EntryMap = HashMap<Location, CacheEntry>;

/// Compiled templates by location.
#[derive(Debug, Default)]
pub struct CacheStore {
    entries: ArcSwap<EntryMap>,
}

impl CacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest committed template for `location`.
    pub fn get(&self, location: &Location) -> Option<Arc<CompiledTemplate>> {
        self.entries
            .load()
            .get(location)
            .map(|entry| Arc::clone(&entry.template))
    }

    /// Current entries for `locations`, taken from a single published map.
    /// Absent locations are left out.
    pub fn snapshot<'a>(
        &self,
        locations: impl IntoIterator<Item = &'a Location>,
    ) -> HashMap<Location, Arc<CompiledTemplate>> {
        let entries = self.entries.load();
        locations
            .into_iter()
            .filter_map(|location| {
                entries
                    .get(location)
                    .map(|entry| (location.clone(), Arc::clone(&entry.template)))
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.load().is_empty()
    }

    /// Cached locations, sorted.
    pub fn locations(&self) -> Vec<Location> {
        let mut locations: Vec<_> = self.entries.load().keys().cloned().collect();
        locations.sort();
        locations
    }

    /// Replace the entry at `location` unless a newer generation is stored.
    ///
    /// Returns whether the template was published. Callers must serialize
    /// commits; concurrent commits would lose each other's copies.
    pub(crate) fn commit(
        &self,
        location: Location,
        generation: u64,
        template: Arc<CompiledTemplate>,
    ) -> bool {
        let current = self.entries.load();
        if let Some(existing) = current.get(&location) {
            if existing.generation > generation {
                tracing::warn!(
                    %location,
                    generation,
                    stored = existing.generation,
                    "templates.cache.stale_commit"
                );
                return false;
            }
        }
        let mut next: EntryMap = (**current).clone();
        next.insert(
            location.clone(),
            CacheEntry {
                generation,
                template,
            },
        );
        self.entries.store(Arc::new(next));
        tracing::debug!(%location, generation, "templates.cache.commit");
        true
    }
}
