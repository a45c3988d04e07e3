//! Bookkeeping for one outstanding "wait until version V" request.

use tokio::sync::watch;

/// One outstanding wait: the target host document version plus a
/// single-assignment completion shared by every coalesced waiter.
///
/// Resolution is first-writer-wins: the version-match path, the timeout
/// timer, and teardown all race to `resolve`, and every attempt after the
/// first is a silent no-op. A context is discarded after resolution, never
/// reused.
pub(crate) struct SynchronizingContext {
    required_host_document_version: i32,
    completion: watch::Sender<Option<bool>>,
}

impl SynchronizingContext {
    pub(crate) fn new(required_host_document_version: i32) -> Self {
        let (completion, _initial_receiver) = watch::channel(None);
        Self {
            required_host_document_version,
            completion,
        }
    }

    pub(crate) fn required_host_document_version(&self) -> i32 {
        self.required_host_document_version
    }

    /// Resolve the wait. The first caller wins; returns whether this call
    /// performed the resolution.
    pub(crate) fn resolve(&self, synchronized: bool) -> bool {
        self.completion.send_if_modified(|slot| {
            if slot.is_none() {
                *slot = Some(synchronized);
                true
            } else {
                false
            }
        })
    }

    pub(crate) fn is_resolved(&self) -> bool {
        self.completion.borrow().is_some()
    }

    /// Subscribe a waiter. Subscribing after resolution observes the
    /// resolved value immediately.
    pub(crate) fn subscribe(&self) -> watch::Receiver<Option<bool>> {
        self.completion.subscribe()
    }

    /// Number of currently subscribed waiters.
    #[cfg(test)]
    pub(crate) fn waiter_count(&self) -> usize {
        self.completion.receiver_count()
    }
}
