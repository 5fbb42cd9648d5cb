//! Editor-side document handles

use std::fmt;
use std::path::Path;

use url::Url;

use super::error::{ConnectorError, Result};

/// Identifies an open document (an editor view), saved or not
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(pub u64);

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An open document as seen by the editor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    id: DocumentId,
    uri: Option<Url>,
    scope: String,
}

impl Document {
    /// A document backed by `uri`
    pub fn new(id: DocumentId, uri: Url, scope: impl Into<String>) -> Self {
        Self {
            id,
            uri: Some(uri),
            scope: scope.into(),
        }
    }

    /// A document with no backing file
    pub fn unsaved(id: DocumentId, scope: impl Into<String>) -> Self {
        Self {
            id,
            uri: None,
            scope: scope.into(),
        }
    }

    /// A document backed by a file on disk; `path` must be absolute
    pub fn from_path(id: DocumentId, path: impl AsRef<Path>, scope: impl Into<String>) -> Result<Self> {
        let path = path.as_ref();
        let uri = Url::from_file_path(path).map_err(|()| {
            ConnectorError::InvalidDocument(format!("not an absolute path: {}", path.display()))
        })?;
        Ok(Self::new(id, uri, scope))
    }

    /// The document's identity
    pub fn id(&self) -> DocumentId {
        self.id
    }

    /// Backing URI, if any
    pub fn uri(&self) -> Option<&Url> {
        self.uri.as_ref()
    }

    /// Base scope of the document's syntax (e.g. `source.markdown`)
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// The locator sent to the server: the URI, or `""` without a backing file
    pub fn locator(&self) -> String {
        self.uri.as_ref().map(Url::to_string).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locator_for_file() {
        let uri = Url::parse("file:///tmp/notes.md").unwrap();
        let doc = Document::new(DocumentId(1), uri, "source.markdown");
        assert_eq!(doc.locator(), "file:///tmp/notes.md");
        assert_eq!(doc.scope(), "source.markdown");
    }

    #[test]
    fn test_locator_for_unsaved() {
        let doc = Document::unsaved(DocumentId(2), "source.markdown");
        assert!(doc.uri().is_none());
        assert_eq!(doc.locator(), "");
    }

    #[test]
    #[cfg(unix)]
    fn test_from_path() {
        let doc = Document::from_path(DocumentId(3), "/tmp/page.html", "text.html").unwrap();
        assert_eq!(doc.locator(), "file:///tmp/page.html");
    }

    #[test]
    fn test_from_relative_path_fails() {
        let result = Document::from_path(DocumentId(4), "relative/page.html", "text.html");
        assert!(matches!(result, Err(ConnectorError::InvalidDocument(_))));
    }

    #[test]
    fn test_document_id_display() {
        assert_eq!(DocumentId(7).to_string(), "#7");
    }
}
