//! Observer registry: location-keyed, weakly held change listeners.
//!
//! Registration never extends an observer's lifetime. Each entry gets an
//! [`ObserverKey`] that its owner can remove directly; entries whose observer
//! has been dropped are pruned on the next lookup at their location.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use slotmap::{new_key_type, SlotMap};

use crate::location::Location;

new_key_type! {
    /// Handle for one registration.
    pub struct ObserverKey;
}

/// Something that re-reads a template when it changes.
///
/// Called with no payload; read the new value from
/// [`TemplateService::compiled_template`](crate::service::TemplateService::compiled_template).
/// Called outside the service's lock, so it may call back into the service.
pub trait TemplateObserver: Send + Sync {
    fn on_template_changed(&self);
}

impl<F> TemplateObserver for F
where
    F: Fn() + Send + Sync,
{
    fn on_template_changed(&self) {
        self()
    }
}

struct ObserverSlot {
    location: Location,
    observer: Weak<dyn TemplateObserver>,
}

/// Observers by location, with set semantics per location.
#[derive(Default)]
pub struct ObserverRegistry {
    slots: SlotMap<ObserverKey, ObserverSlot>,
    by_location: HashMap<Location, Vec<ObserverKey>>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `observer` at `location`. Registering the same observer twice at
    /// one location returns the existing key.
    pub fn register(&mut self, observer: Weak<dyn TemplateObserver>, location: Location) -> ObserverKey {
        if let Some(key) = self.find(&observer, &location) {
            return key;
        }
        let key = self.slots.insert(ObserverSlot {
            location: location.clone(),
            observer,
        });
        self.by_location.entry(location).or_default().push(key);
        key
    }

    /// Remove `observer` from `location`. Returns `false` if it was not there.
    pub fn unregister(&mut self, observer: &Weak<dyn TemplateObserver>, location: &Location) -> bool {
        match self.find(observer, location) {
            Some(key) => self.remove(key),
            None => false,
        }
    }

    /// Remove one registration by key. Returns `false` for an unknown key.
    pub fn remove(&mut self, key: ObserverKey) -> bool {
        let Some(slot) = self.slots.remove(key) else {
            return false;
        };
        if let Some(keys) = self.by_location.get_mut(&slot.location) {
            keys.retain(|k| *k != key);
            if keys.is_empty() {
                self.by_location.remove(&slot.location);
            }
        }
        true
    }

    /// Live observers at `location`, in registration order. Dead entries
    /// are pruned.
    pub fn live_at(&mut self, location: &Location) -> Vec<Arc<dyn TemplateObserver>> {
        let Some(keys) = self.by_location.get(location) else {
            return Vec::new();
        };
        let mut live = Vec::with_capacity(keys.len());
        let mut dead = Vec::new();
        for &key in keys {
            match self.slots.get(key).and_then(|slot| slot.observer.upgrade()) {
                Some(observer) => live.push(observer),
                None => dead.push(key),
            }
        }
        if !dead.is_empty() {
            tracing::trace!(%location, pruned = dead.len(), "templates.observer.prune");
            for key in dead {
                self.remove(key);
            }
        }
        live
    }

    /// Number of registrations, dead or alive.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.by_location.clear();
    }

    fn find(&self, observer: &Weak<dyn TemplateObserver>, location: &Location) -> Option<ObserverKey> {
        self.by_location.get(location)?.iter().copied().find(|&key| {
            self.slots
                .get(key)
                .is_some_and(|slot| Weak::ptr_eq(&slot.observer, observer))
        })
    }
}

impl std::fmt::Debug for ObserverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverRegistry")
            .field("registrations", &self.slots.len())
            .field("locations", &self.by_location.len())
            .finish()
    }
}
