//! Wait-for-version synchronization between host edits and virtual documents.
//!
//! Consumers about to query an embedded-language service call
//! [`DocumentSynchronizer::wait_for_version`] to assert that a virtual
//! document reflects host edits up through a required version. The
//! synchronizer tracks the highest version observed per virtual document via
//! relayed buffer-changed notifications, and keeps at most one outstanding
//! [`SynchronizingContext`] per document: concurrent waiters for the same
//! version coalesce onto it, and a waiter for a different version supersedes
//! it.
//!
//! # Lock Discipline
//!
//! All synchronizer state lives under a single mutex (one short critical
//! section per operation). The seen-version read in `wait_for_version` and
//! the resolve check in the notification path share that mutex, so a wait
//! issued after its version was already applied resolves `true` immediately
//! and can never race into a timeout.

mod context;
mod timeout;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use log::{debug, warn};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use url::Url;

pub use timeout::SynchronizationTimeout;

use context::SynchronizingContext;

use crate::error::{ProjectionError, ProjectionResult};
use crate::registry::{RegistryEvent, RegistryObserver};

/// Per-virtual-document synchronization bookkeeping.
struct DocumentContext {
    /// Highest host document version observed via change notifications.
    /// `None` until the first update arrives.
    seen_host_document_version: Option<i32>,
    /// At most one outstanding wait; resolved contexts are cleared eagerly
    /// on the notification path and lazily on the wait path.
    active: Option<Arc<SynchronizingContext>>,
}

/// Lets callers wait, bounded by a timeout and cancellable, until a virtual
/// document's buffer reflects a required host document version.
///
/// Subscribe it to a [`DocumentRegistry`](crate::registry::DocumentRegistry)
/// so it learns which virtual documents exist and observes their updates:
///
/// ```ignore
/// let synchronizer = Arc::new(DocumentSynchronizer::default());
/// registry.add_observer(synchronizer.clone());
/// ```
pub struct DocumentSynchronizer {
    contexts: Mutex<HashMap<Url, DocumentContext>>,
    timeout: SynchronizationTimeout,
}

impl Default for DocumentSynchronizer {
    fn default() -> Self {
        Self::new(SynchronizationTimeout::default())
    }
}

impl DocumentSynchronizer {
    pub fn new(timeout: SynchronizationTimeout) -> Self {
        Self {
            contexts: Mutex::new(HashMap::new()),
            timeout,
        }
    }

    /// Wait until the virtual document's buffer reflects host edits up
    /// through `required_version`.
    ///
    /// Resolves `Ok(true)` when the document reaches exactly
    /// `required_version`, and `Ok(false)` when the wait gives up: the
    /// timeout fired, `cancel` was cancelled, the document was untracked, or
    /// the document advanced past the target (versions only increase, so the
    /// requested version can never be reached; such a wait is never retried
    /// automatically).
    ///
    /// Concurrent waits on the same document and version share one context
    /// and one timer. A wait targeting a different version than the active
    /// context supersedes it, resolving the superseded waiters `false`.
    ///
    /// # Errors
    /// [`ProjectionError::UnknownDocument`] if the registry has never
    /// announced `virtual_uri` to this synchronizer.
    pub async fn wait_for_version(
        &self,
        required_version: i32,
        virtual_uri: &Url,
        cancel: &CancellationToken,
    ) -> ProjectionResult<bool> {
        let mut receiver = {
            let mut contexts = self.lock_contexts("wait_for_version");
            let Some(context) = contexts.get_mut(virtual_uri) else {
                return Err(ProjectionError::unknown_document(virtual_uri.as_str()));
            };

            if context.seen_host_document_version == Some(required_version) {
                return Ok(true);
            }

            self.subscribe_to_wait(context, required_version)
        };

        tokio::select! {
            _ = cancel.cancelled() => Ok(false),
            changed = receiver.wait_for(|slot| slot.is_some()) => match changed {
                Ok(slot) => Ok((*slot).unwrap_or(false)),
                // Completion dropped unresolved; treat as give-up.
                Err(_) => Ok(false),
            },
        }
    }

    /// Join the active context if it targets the same version, otherwise
    /// supersede it with a fresh one and arm its timer.
    fn subscribe_to_wait(
        &self,
        context: &mut DocumentContext,
        required_version: i32,
    ) -> watch::Receiver<Option<bool>> {
        if let Some(active) = &context.active
            && !active.is_resolved()
            && active.required_host_document_version() == required_version
        {
            return active.subscribe();
        }

        if let Some(previous) = context.active.take() {
            previous.resolve(false);
        }

        let active = Arc::new(SynchronizingContext::new(required_version));
        let receiver = active.subscribe();
        self.arm_timeout(&active);
        context.active = Some(active);
        receiver
    }

    /// Spawn the single timeout timer for a new context. The timer resolves
    /// the shared completion; if a version match or teardown got there
    /// first, the firing is a no-op.
    fn arm_timeout(&self, context: &Arc<SynchronizingContext>) {
        let context = Arc::clone(context);
        let timeout = self.timeout.as_duration();

        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            if context.resolve(false) {
                debug!(
                    target: "utsushi::sync",
                    "wait for version {} timed out after {:?}",
                    context.required_host_document_version(),
                    timeout
                );
            }
        });
    }

    /// Start bookkeeping for a virtual document announced by the registry.
    fn track_virtual_document(&self, virtual_uri: Url, initial_version: Option<i32>) {
        let mut contexts = self.lock_contexts("track_virtual_document");
        contexts
            .entry(virtual_uri)
            .or_insert_with(|| DocumentContext {
                seen_host_document_version: initial_version,
                active: None,
            });
    }

    /// Drop bookkeeping for a removed virtual document, resolving any
    /// outstanding wait `false` so it is never left pending.
    fn untrack_virtual_document(&self, virtual_uri: &Url) {
        let mut contexts = self.lock_contexts("untrack_virtual_document");
        if let Some(context) = contexts.remove(virtual_uri)
            && let Some(active) = context.active
        {
            active.resolve(false);
        }
    }

    /// Record a buffer-changed notification and settle the active wait.
    ///
    /// An exact match resolves `true`. A version past the target resolves
    /// `false`: versions only increase, so the target can never be reached.
    fn record_change(&self, virtual_uri: &Url, new_version: Option<i32>) {
        let mut contexts = self.lock_contexts("record_change");
        let Some(context) = contexts.get_mut(virtual_uri) else {
            warn!(
                target: "utsushi::sync",
                "change notification for untracked virtual document {}",
                virtual_uri
            );
            return;
        };

        context.seen_host_document_version = new_version;

        let Some(version) = new_version else {
            return;
        };
        let Some(active) = &context.active else {
            return;
        };

        if version == active.required_host_document_version() {
            active.resolve(true);
            context.active = None;
        } else if version > active.required_host_document_version() {
            active.resolve(false);
            context.active = None;
        }
    }

    fn lock_contexts(&self, context: &str) -> MutexGuard<'_, HashMap<Url, DocumentContext>> {
        self.contexts.lock().unwrap_or_else(|poisoned| {
            warn!(
                target: "utsushi::sync",
                "Recovered from poisoned context map lock in {}",
                context
            );
            poisoned.into_inner()
        })
    }
}

impl RegistryObserver for DocumentSynchronizer {
    fn registry_event(&self, event: &RegistryEvent) {
        match event {
            RegistryEvent::Added {
                initial_snapshots, ..
            } => {
                for snapshot in initial_snapshots {
                    self.track_virtual_document(
                        snapshot.uri().clone(),
                        snapshot.host_document_sync_version(),
                    );
                }
            }
            RegistryEvent::Removed { host } => {
                for doc in host.virtual_documents() {
                    self.untrack_virtual_document(doc.uri());
                }
            }
            RegistryEvent::VirtualDocumentChanged { snapshot, .. } => {
                self.record_change(snapshot.uri(), snapshot.host_document_sync_version());
            }
        }
    }
}
