//! Virtual document URIs derived from host document URIs.
//!
//! Each virtual document gets a URI derived deterministically from its host
//! URI and embedded language, so that language services see a stable,
//! per-language identity for the projected buffer. For most URIs (file://,
//! https://, etc.) the virtual URI preserves the host's scheme and directory.
//! For "cannot-be-a-base" URIs (untitled:, data:), an utsushi:// scheme
//! fallback is used.

use url::Url;

/// Marker embedded in virtual document filenames.
///
/// Distinctive enough to identify virtual URIs and avoid collisions with
/// real files.
const VIRTUAL_URI_MARKER: &str = ".utsushi-virtual.";

/// Virtual document URI for one embedded language of one host document.
///
/// ## URI Format
///
/// For normal URIs:
/// - Format: `{scheme}://{host_dir}/{host_filename}.utsushi-virtual.{ext}`
/// - Example: `file:///project/page.tmpl.utsushi-virtual.css`
///
/// For cannot-be-a-base URIs:
/// - Format: `utsushi:///virtual/{encoded_host}/{host_filename}.utsushi-virtual.{ext}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualDocumentUri {
    host_uri: Url,
    language: String,
}

impl VirtualDocumentUri {
    /// Create a virtual document URI for one embedded language.
    ///
    /// # Arguments
    /// * `host_uri` - The URI of the host document (e.g., a template file)
    /// * `language` - The embedded language identity (e.g., "css"). Must not be empty.
    ///
    /// # Panics (debug builds only)
    /// Panics if `language` is empty; callers always name a concrete language.
    pub fn new(host_uri: &Url, language: &str) -> Self {
        debug_assert!(!language.is_empty(), "language must not be empty");

        Self {
            host_uri: host_uri.clone(),
            language: language.to_string(),
        }
    }

    /// URI of the host document this virtual document projects from.
    pub fn host_uri(&self) -> &Url {
        &self.host_uri
    }

    /// The embedded language identity.
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Check if a URI string identifies a virtual document.
    ///
    /// Virtual document URIs carry the `.utsushi-virtual.` marker in their
    /// filename. Uses proper URL parsing so query strings containing slashes
    /// do not confuse the filename extraction.
    pub fn is_virtual_uri(uri: &str) -> bool {
        let Ok(url) = Url::parse(uri) else {
            return false;
        };

        let Some(filename) = url.path_segments().and_then(|mut s| s.next_back()) else {
            return false;
        };

        // Marker must be followed by a non-empty extension.
        filename
            .split_once(VIRTUAL_URI_MARKER)
            .is_some_and(|(_name, ext)| !ext.is_empty())
    }

    /// Derive the concrete URI for this virtual document.
    ///
    /// The virtual file sits in the same directory as the host document so
    /// that language services can resolve relative imports and find project
    /// configuration files. The extension is derived from the language so
    /// services recognize the file type.
    pub fn to_url(&self) -> Url {
        let extension = Self::language_to_extension(&self.language);

        let host_filename = self
            .host_uri
            .path_segments()
            .and_then(|mut s| s.next_back())
            .unwrap_or("")
            .to_string();
        let virtual_filename = format!("{host_filename}{VIRTUAL_URI_MARKER}{extension}");

        // Path-segment surgery works for base-able URIs (file://, https://, ...).
        let mut url = self.host_uri.clone();
        let modified = url
            .path_segments_mut()
            .map(|mut segments| {
                segments.pop();
                segments.push(&virtual_filename);
            })
            .is_ok();
        if modified {
            return url;
        }

        // Fallback for cannot-be-a-base URIs (untitled:, data:). The host URI
        // is form-encoded into a path segment for traceability.
        let encoded_host: String =
            url::form_urlencoded::byte_serialize(self.host_uri.as_str().as_bytes()).collect();
        let mut fallback =
            Url::parse("utsushi:///virtual").expect("static fallback base URI parses");
        if let Ok(mut segments) = fallback.path_segments_mut() {
            segments.push(&encoded_host);
            segments.push(&virtual_filename);
        }
        fallback
    }

    /// Map an embedded language to a file extension.
    ///
    /// Unknown languages fall back to the language name itself, which keeps
    /// virtual URIs for distinct languages distinct.
    fn language_to_extension(language: &str) -> &str {
        match language {
            "css" => "css",
            "html" => "html",
            "javascript" => "js",
            "typescript" => "ts",
            "lua" => "lua",
            "python" => "py",
            "rust" => "rs",
            "sql" => "sql",
            "yaml" => "yaml",
            other => other,
        }
    }
}
