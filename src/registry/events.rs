//! Events emitted by the document registry.

use std::sync::Arc;

use url::Url;

use crate::document::{HostDocument, VersionedSnapshot};

/// Notifications fired by [`DocumentRegistry`](super::DocumentRegistry).
#[derive(Debug, Clone)]
pub enum RegistryEvent {
    /// The first tracker arrived for a host URI; the host document and its
    /// virtual documents were constructed.
    Added {
        host: Arc<HostDocument>,
        initial_snapshots: Vec<Arc<VersionedSnapshot>>,
    },
    /// The last tracker left; the host document was discarded.
    Removed { host: Arc<HostDocument> },
    /// One of a tracked host's virtual documents applied an update.
    VirtualDocumentChanged {
        host_uri: Url,
        snapshot: Arc<VersionedSnapshot>,
    },
}

impl RegistryEvent {
    pub(crate) fn added(host: Arc<HostDocument>) -> Self {
        let initial_snapshots = host
            .virtual_documents()
            .iter()
            .map(|doc| doc.current_snapshot())
            .collect();
        Self::Added {
            host,
            initial_snapshots,
        }
    }
}

/// Observer for registry lifecycle and virtual-document change events.
///
/// Events for one host are delivered in occurrence order; `Added` is always
/// delivered before any `VirtualDocumentChanged` for that host's documents.
pub trait RegistryObserver: Send + Sync {
    fn registry_event(&self, event: &RegistryEvent);
}
