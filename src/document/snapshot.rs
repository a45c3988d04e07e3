//! Immutable versioned snapshots of virtual document buffers.

use std::sync::Arc;

use url::Url;

/// Immutable capture of a virtual document buffer, tagged with the host
/// document version whose edits the text fully reflects.
///
/// A new snapshot is produced by every successful update; a snapshot is never
/// mutated in place. The version is `None` until the first update arrives.
#[derive(Debug, Clone)]
pub struct VersionedSnapshot {
    uri: Url,
    text: Arc<str>,
    host_document_sync_version: Option<i32>,
}

impl VersionedSnapshot {
    pub(crate) fn new(uri: Url, text: Arc<str>, host_document_sync_version: Option<i32>) -> Self {
        Self {
            uri,
            text,
            host_document_sync_version,
        }
    }

    /// URI of the virtual document this snapshot was captured from.
    pub fn uri(&self) -> &Url {
        &self.uri
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// The most recent host document version whose edits have been fully
    /// applied to this text, if any update has arrived yet.
    pub fn host_document_sync_version(&self) -> Option<i32> {
        self.host_document_sync_version
    }
}
