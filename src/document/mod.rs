//! Host and virtual document data model.
//!
//! A host document projects into one virtual document per embedded language.
//! Virtual documents own their projected buffers and republish immutable
//! versioned snapshots as the external edit pipeline applies edit batches.

mod edits;
mod host;
mod snapshot;
mod virtual_doc;
mod virtual_uri;

pub use edits::{TextEdit, TextRange};
pub use host::HostDocument;
pub use snapshot::VersionedSnapshot;
pub use virtual_doc::{BufferChangeListener, VirtualDocument};
pub use virtual_uri::VirtualDocumentUri;
