//! Reference-counted tracking of host documents.
//!
//! The registry owns the lifecycle of [`HostDocument`]s keyed by URI.
//! Multiple trackers (e.g., multiple open views of one file) share a single
//! host document: `track` increments a reference count and constructs the
//! host on the 0→1 transition; `untrack` decrements it and discards the host
//! when it returns to 0. Lifecycle events and relayed virtual-document
//! changes fan out to registered observers.
//!
//! Refcount transitions are atomic per URI (dashmap entry API). Registry
//! mutation is expected to arrive from one coordination context; the map
//! guards against corruption, not against externally meaningful
//! Added/Removed interleavings.

mod events;
mod factory;

use std::sync::{Arc, Mutex, Weak};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use log::warn;
use url::Url;

pub use events::{RegistryEvent, RegistryObserver};
pub use factory::{EmbeddedLanguageFactory, VirtualDocumentFactory};

use crate::document::{BufferChangeListener, HostDocument, VersionedSnapshot};

struct TrackedHost {
    host: Arc<HostDocument>,
    ref_count: usize,
}

struct RegistryInner {
    hosts: DashMap<Url, TrackedHost>,
    factories: Vec<Arc<dyn VirtualDocumentFactory>>,
    observers: Mutex<Vec<Arc<dyn RegistryObserver>>>,
}

impl RegistryInner {
    /// Fan an event out to the observers registered at the time of the call.
    /// The observer lock is released before any observer runs.
    fn notify(&self, event: &RegistryEvent) {
        let observers = self
            .observers
            .lock()
            .unwrap_or_else(|poisoned| {
                warn!(
                    target: "utsushi::registry",
                    "Recovered from poisoned observer lock in notify"
                );
                poisoned.into_inner()
            })
            .clone();

        for observer in observers {
            observer.registry_event(event);
        }
    }
}

/// Relays one virtual document's buffer changes to registry observers.
struct ChangeRelay {
    host_uri: Url,
    inner: Weak<RegistryInner>,
}

impl BufferChangeListener for ChangeRelay {
    fn buffer_changed(&self, snapshot: &Arc<VersionedSnapshot>) {
        // The registry may already be gone during teardown.
        let Some(inner) = self.inner.upgrade() else {
            return;
        };

        inner.notify(&RegistryEvent::VirtualDocumentChanged {
            host_uri: self.host_uri.clone(),
            snapshot: Arc::clone(snapshot),
        });
    }
}

/// Reference-counted registry of host documents keyed by URI.
pub struct DocumentRegistry {
    inner: Arc<RegistryInner>,
}

impl DocumentRegistry {
    pub fn new(factories: Vec<Arc<dyn VirtualDocumentFactory>>) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                hosts: DashMap::new(),
                factories,
                observers: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Register an observer for `Added` / `Removed` /
    /// `VirtualDocumentChanged` events.
    pub fn add_observer(&self, observer: Arc<dyn RegistryObserver>) {
        self.inner
            .observers
            .lock()
            .unwrap_or_else(|poisoned| {
                warn!(
                    target: "utsushi::registry",
                    "Recovered from poisoned observer lock in add_observer"
                );
                poisoned.into_inner()
            })
            .push(observer);
    }

    /// Track a host document, constructing it on the 0→1 transition.
    ///
    /// On construction, every factory is consulted and the resulting virtual
    /// documents are wired to relay their buffer changes through this
    /// registry; an `Added` event carrying the initial snapshots fires before
    /// `track` returns.
    pub fn track(&self, uri: &Url) {
        let added = match self.inner.hosts.entry(uri.clone()) {
            Entry::Occupied(mut entry) => {
                entry.get_mut().ref_count += 1;
                None
            }
            Entry::Vacant(entry) => {
                let host = self.build_host(uri);
                entry.insert(TrackedHost {
                    host: Arc::clone(&host),
                    ref_count: 1,
                });
                Some(host)
            }
        };

        // The entry guard is released before observers run.
        if let Some(host) = added {
            self.inner.notify(&RegistryEvent::added(host));
        }
    }

    /// Untrack a host document, discarding it when the last tracker leaves.
    ///
    /// An untrack with no matching tracked document is a no-op; duplicate
    /// teardown notifications from the editor surface are tolerated.
    pub fn untrack(&self, uri: &Url) {
        let removed = match self.inner.hosts.entry(uri.clone()) {
            Entry::Occupied(mut entry) => {
                let tracked = entry.get_mut();
                tracked.ref_count -= 1;
                if tracked.ref_count == 0 {
                    Some(entry.remove().host)
                } else {
                    None
                }
            }
            Entry::Vacant(_) => {
                warn!(
                    target: "utsushi::registry",
                    "untrack for untracked host {}, ignoring",
                    uri
                );
                None
            }
        };

        if let Some(host) = removed {
            self.inner.notify(&RegistryEvent::Removed { host });
        }
    }

    /// Look up a tracked host document.
    pub fn try_get(&self, uri: &Url) -> Option<Arc<HostDocument>> {
        self.inner
            .hosts
            .get(uri)
            .map(|tracked| Arc::clone(&tracked.host))
    }

    fn build_host(&self, uri: &Url) -> Arc<HostDocument> {
        let mut virtual_documents: Vec<Arc<crate::document::VirtualDocument>> = Vec::new();

        for factory in &self.inner.factories {
            let Some(doc) = factory.try_create_for(uri) else {
                continue;
            };

            if virtual_documents.iter().any(|d| d.uri() == doc.uri()) {
                warn!(
                    target: "utsushi::registry",
                    "factory for {} produced duplicate virtual URI {} for host {}, skipping",
                    factory.language(),
                    doc.uri(),
                    uri
                );
                continue;
            }

            doc.add_change_listener(Arc::new(ChangeRelay {
                host_uri: uri.clone(),
                inner: Arc::downgrade(&self.inner),
            }));
            virtual_documents.push(Arc::new(doc));
        }

        Arc::new(HostDocument::new(uri.clone(), virtual_documents))
    }
}
