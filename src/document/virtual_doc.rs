//! Virtual document buffers for embedded languages.
//!
//! A `VirtualDocument` owns the projected text for one embedded language of
//! one host document. The external edit pipeline applies ordered edit batches
//! via [`VirtualDocument::update`]; every successful update republishes an
//! immutable [`VersionedSnapshot`] tagged with the host document version the
//! buffer now reflects, and publishes exactly one buffer-changed notification
//! before returning.
//!
//! # Provisional edits
//!
//! An update may be marked provisional (a speculative edit applied ahead of
//! authoritative confirmation). The pre-edit committed state is retained, and
//! any subsequent update first reverts to it byte-for-byte before applying
//! its own batch. Provisional edits therefore never compound and never leak
//! into the buffer seen by a later authoritative update. There is no explicit
//! commit: the next non-provisional update supersedes the provisional one.

use std::sync::{Arc, Mutex};

use arc_swap::ArcSwap;
use log::warn;
use url::Url;

use super::edits::{TextEdit, apply_edit_batch};
use super::snapshot::VersionedSnapshot;
use super::virtual_uri::VirtualDocumentUri;
use crate::error::ProjectionResult;

/// Observer for buffer-changed notifications.
///
/// Every successful update publishes exactly one notification carrying the
/// new snapshot, in update order, before `update` returns.
pub trait BufferChangeListener: Send + Sync {
    fn buffer_changed(&self, snapshot: &Arc<VersionedSnapshot>);
}

/// Committed buffer state saved while a provisional edit is pending.
struct CommittedState {
    text: String,
    host_document_sync_version: Option<i32>,
}

/// Mutable buffer state, guarded by the document's state mutex.
struct BufferState {
    text: String,
    host_document_sync_version: Option<i32>,
    /// `Some` while a provisional edit is pending; holds the state to revert
    /// to before the next update applies.
    saved_committed: Option<CommittedState>,
}

/// A projected buffer for one embedded language of one host document.
///
/// Updates are serialized (single-writer per document); the state mutex
/// enforces exclusion. `current_snapshot` reads are lock-free and observe
/// either the pre- or post-update snapshot, never a partial one.
pub struct VirtualDocument {
    uri: Url,
    language: String,
    state: Mutex<BufferState>,
    current_snapshot: ArcSwap<VersionedSnapshot>,
    listeners: Mutex<Vec<Arc<dyn BufferChangeListener>>>,
}

impl std::fmt::Debug for VirtualDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VirtualDocument")
            .field("uri", &self.uri.as_str())
            .field("language", &self.language)
            .field(
                "host_document_sync_version",
                &self.host_document_sync_version(),
            )
            .finish()
    }
}

impl VirtualDocument {
    /// Create a virtual document with its initial projected text.
    ///
    /// The initial snapshot carries no sync version; the version becomes
    /// known with the first update.
    pub fn new(virtual_uri: &VirtualDocumentUri, initial_text: impl Into<String>) -> Self {
        let uri = virtual_uri.to_url();
        let text = initial_text.into();
        let snapshot = VersionedSnapshot::new(uri.clone(), Arc::from(text.as_str()), None);

        Self {
            uri,
            language: virtual_uri.language().to_string(),
            state: Mutex::new(BufferState {
                text,
                host_document_sync_version: None,
                saved_committed: None,
            }),
            current_snapshot: ArcSwap::from_pointee(snapshot),
            listeners: Mutex::new(Vec::new()),
        }
    }

    pub fn uri(&self) -> &Url {
        &self.uri
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// The most recent snapshot. Lock-free; safe to call concurrently with
    /// an in-flight update.
    pub fn current_snapshot(&self) -> Arc<VersionedSnapshot> {
        self.current_snapshot.load_full()
    }

    /// The host document version the buffer currently reflects.
    pub fn host_document_sync_version(&self) -> Option<i32> {
        self.current_snapshot.load().host_document_sync_version()
    }

    /// Register a buffer-changed listener. Listeners are invoked
    /// synchronously inside `update`, in registration order.
    pub fn add_change_listener(&self, listener: Arc<dyn BufferChangeListener>) {
        self.lock_listeners("add_change_listener").push(listener);
    }

    /// Apply an ordered edit batch and advance the sync version.
    ///
    /// A pending provisional edit is first reverted to the saved committed
    /// state, then the new batch is applied. The sync version is set and a
    /// new snapshot captured even for an empty batch (a "touch" update used
    /// purely to advance the version tag).
    ///
    /// # Arguments
    /// * `edits` - Ordered batch; later ranges are expressed against the
    ///   buffer state after prior edits in the same batch
    /// * `host_document_version` - The host version these edits bring the
    ///   buffer up to
    /// * `provisional` - Retain the pre-edit state so the edit can be
    ///   reverted without a new update arriving
    ///
    /// # Errors
    /// [`ProjectionError::MalformedEdit`](crate::error::ProjectionError) if
    /// the batch contains an invalid range; the buffer, version, and any
    /// pending provisional state are all left unchanged.
    pub fn update(
        &self,
        edits: &[TextEdit],
        host_document_version: i32,
        provisional: bool,
    ) -> ProjectionResult<Arc<VersionedSnapshot>> {
        let mut state = self.lock_state("update");

        // This batch applies to the committed state: a pending provisional
        // edit is reverted so speculative text never composes with the batch.
        let (base_text, base_version) = match &state.saved_committed {
            Some(saved) => (saved.text.as_str(), saved.host_document_sync_version),
            None => (state.text.as_str(), state.host_document_sync_version),
        };

        // Validate and apply on a scratch copy; on failure nothing is
        // mutated, including the pending provisional state.
        let updated = apply_edit_batch(base_text, edits)?;

        if let Some(current) = base_version
            && host_document_version < current
        {
            warn!(
                target: "utsushi::document",
                "host version regressed from {} to {} for {}",
                current,
                host_document_version,
                self.uri
            );
        }

        let saved_committed = provisional.then(|| CommittedState {
            text: base_text.to_string(),
            host_document_sync_version: base_version,
        });

        state.text = updated;
        state.saved_committed = saved_committed;
        state.host_document_sync_version = Some(host_document_version);

        let snapshot = Arc::new(VersionedSnapshot::new(
            self.uri.clone(),
            Arc::from(state.text.as_str()),
            Some(host_document_version),
        ));
        self.current_snapshot.store(Arc::clone(&snapshot));

        // Notify while still holding the state lock: notifications must be
        // observed in update order, one per successful update, before this
        // call returns. Listeners never call back into the buffer state.
        self.notify_changed(&snapshot);
        drop(state);

        Ok(snapshot)
    }

    fn notify_changed(&self, snapshot: &Arc<VersionedSnapshot>) {
        let listeners = self.lock_listeners("notify_changed").clone();
        for listener in listeners {
            listener.buffer_changed(snapshot);
        }
    }

    fn lock_state(&self, context: &str) -> std::sync::MutexGuard<'_, BufferState> {
        self.state.lock().unwrap_or_else(|poisoned| {
            warn!(
                target: "utsushi::document",
                "Recovered from poisoned buffer state lock in {}",
                context
            );
            poisoned.into_inner()
        })
    }

    fn lock_listeners(
        &self,
        context: &str,
    ) -> std::sync::MutexGuard<'_, Vec<Arc<dyn BufferChangeListener>>> {
        self.listeners.lock().unwrap_or_else(|poisoned| {
            warn!(
                target: "utsushi::document",
                "Recovered from poisoned listener lock in {}",
                context
            );
            poisoned.into_inner()
        })
    }
}
