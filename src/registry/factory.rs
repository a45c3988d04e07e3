//! Pluggable construction of virtual documents for newly tracked hosts.

use url::Url;

use crate::document::{VirtualDocument, VirtualDocumentUri};

/// Produces the virtual document for one embedded language when a host
/// document is first tracked.
///
/// The registry consults every registered factory on a 0→1 track transition;
/// each factory contributes zero or one virtual document.
pub trait VirtualDocumentFactory: Send + Sync {
    /// The embedded language this factory projects into.
    fn language(&self) -> &str;

    /// Create the virtual document for `host_uri`, or `None` if this host
    /// does not embed the factory's language.
    fn try_create_for(&self, host_uri: &Url) -> Option<VirtualDocument>;
}

/// Factory that projects every tracked host into one initially empty virtual
/// document for a fixed language.
///
/// Suitable for host formats where every document may embed the language;
/// the projected text arrives through the regular update pipeline.
pub struct EmbeddedLanguageFactory {
    language: String,
}

impl EmbeddedLanguageFactory {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
        }
    }
}

impl VirtualDocumentFactory for EmbeddedLanguageFactory {
    fn language(&self) -> &str {
        &self.language
    }

    fn try_create_for(&self, host_uri: &Url) -> Option<VirtualDocument> {
        let virtual_uri = VirtualDocumentUri::new(host_uri, &self.language);
        Some(VirtualDocument::new(&virtual_uri, ""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_language_factory_creates_empty_document() {
        let factory = EmbeddedLanguageFactory::new("css");
        let host_uri = Url::parse("file:///project/page.tmpl").unwrap();

        let doc = factory
            .try_create_for(&host_uri)
            .expect("factory always creates");

        assert_eq!(doc.language(), "css");
        assert_eq!(doc.current_snapshot().text(), "");
        assert_eq!(doc.host_document_sync_version(), None);
    }
}
