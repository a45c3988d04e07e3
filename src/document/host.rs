//! Host documents and their associated virtual documents.

use std::sync::Arc;

use url::Url;

use super::virtual_doc::VirtualDocument;

/// The single source-of-truth document a user edits, together with the
/// ordered virtual documents it projects into (one per embedded language).
///
/// Virtual documents within one host have distinct URIs and distinct
/// languages; the registry enforces this at construction.
#[derive(Debug)]
pub struct HostDocument {
    uri: Url,
    virtual_documents: Vec<Arc<VirtualDocument>>,
}

impl HostDocument {
    pub(crate) fn new(uri: Url, virtual_documents: Vec<Arc<VirtualDocument>>) -> Self {
        debug_assert!(
            virtual_documents
                .iter()
                .enumerate()
                .all(|(i, doc)| virtual_documents[..i].iter().all(|d| d.uri() != doc.uri())),
            "virtual document URIs must be distinct within one host"
        );

        Self {
            uri,
            virtual_documents,
        }
    }

    pub fn uri(&self) -> &Url {
        &self.uri
    }

    /// The virtual documents in factory order.
    pub fn virtual_documents(&self) -> &[Arc<VirtualDocument>] {
        &self.virtual_documents
    }

    pub fn virtual_document(&self, uri: &Url) -> Option<&Arc<VirtualDocument>> {
        self.virtual_documents.iter().find(|doc| doc.uri() == uri)
    }

    pub fn virtual_document_for_language(&self, language: &str) -> Option<&Arc<VirtualDocument>> {
        self.virtual_documents
            .iter()
            .find(|doc| doc.language() == language)
    }
}
