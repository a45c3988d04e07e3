//! utsushi — document projection and version-synchronization engine for
//! composite-language editing.
//!
//! A composite-language file (e.g., a template embedding CSS and JavaScript)
//! is edited as one **host document**, while independent language services
//! operate on derived **virtual documents**, one per embedded language. This
//! crate keeps the virtual documents in lockstep with host edits and lets
//! consumers wait until a virtual document reflects a required host version
//! before asking an embedded-language service a question:
//!
//! - [`registry::DocumentRegistry`] tracks host documents by reference count
//!   and constructs their virtual documents through pluggable factories.
//! - [`document::VirtualDocument`] owns a projected buffer, applies ordered
//!   edit batches (including revertible provisional edits), and republishes
//!   an immutable [`document::VersionedSnapshot`] per update.
//! - [`sync::DocumentSynchronizer`] resolves wait-for-version requests from
//!   relayed buffer-changed notifications, bounded by a configurable timeout
//!   and cancellable per caller.

pub mod config;
pub mod document;
pub mod error;
pub mod registry;
pub mod sync;

pub use config::ProjectionSettings;
pub use document::{
    BufferChangeListener, HostDocument, TextEdit, TextRange, VersionedSnapshot, VirtualDocument,
    VirtualDocumentUri,
};
pub use error::{ProjectionError, ProjectionResult};
pub use registry::{
    DocumentRegistry, EmbeddedLanguageFactory, RegistryEvent, RegistryObserver,
    VirtualDocumentFactory,
};
pub use sync::{DocumentSynchronizer, SynchronizationTimeout};
