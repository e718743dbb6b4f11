//! Filesystem document source.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::BoxFuture;
use crate::manifest::DocumentEntry;

use super::{Document, DocumentSource, RetrievalError, check_relative};

/// Reads documents from a directory tree with async I/O.
///
/// Entry paths are resolved against `root`. Paths that would leave the root
/// are reported as [`RetrievalError::NotFound`].
#[derive(Debug, Clone)]
pub struct FsSource {
    root: PathBuf,
}

impl FsSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Full filesystem path for an entry, if it stays under the root.
    pub fn resolve(&self, entry: &DocumentEntry) -> Result<PathBuf, RetrievalError> {
        check_relative(entry).map(|rel| self.root.join(rel))
    }
}

impl DocumentSource for FsSource {
    fn name(&self) -> &str {
        "fs"
    }

    fn fetch(&self, entry: &DocumentEntry) -> BoxFuture<'_, Result<Document, RetrievalError>> {
        let entry = entry.clone();

        Box::pin(async move {
            let full = self.resolve(&entry)?;

            let bytes = tokio::fs::read(&full).await.map_err(|e| match e.kind() {
                ErrorKind::NotFound => RetrievalError::not_found(&entry),
                _ => RetrievalError::read_error(&entry, e.to_string()),
            })?;

            let content = String::from_utf8(bytes)
                .map_err(|_| RetrievalError::read_error(&entry, "document is not valid UTF-8"))?;

            Ok(Document {
                id: entry.id,
                path: entry.path,
                content,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::Tier;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn entry(id: &str, path: &str) -> DocumentEntry {
        DocumentEntry::new(id, id, path, Tier::High)
    }

    #[tokio::test]
    async fn test_fetch_existing_document() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::create_dir_all(tmp.path().join("references"))
            .await
            .unwrap();
        tokio::fs::write(tmp.path().join("references/ssr.md"), "# SSR\n")
            .await
            .unwrap();

        let source = FsSource::new(tmp.path());
        assert_eq!(source.root(), tmp.path());
        let doc = source
            .fetch(&entry("ssr", "references/ssr.md"))
            .await
            .unwrap();
        assert_eq!(doc.id, "ssr");
        assert_eq!(doc.path, "references/ssr.md");
        assert_eq!(doc.content, "# SSR\n");
    }

    #[tokio::test]
    async fn test_missing_document_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let source = FsSource::new(tmp.path());
        let err = source
            .fetch(&entry("ssr", "references/ssr.md"))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            RetrievalError::NotFound {
                id: "ssr".to_string(),
                path: "references/ssr.md".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_directory_is_read_error() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::create_dir_all(tmp.path().join("references"))
            .await
            .unwrap();

        let source = FsSource::new(tmp.path());
        let err = source
            .fetch(&entry("refs", "references"))
            .await
            .unwrap_err();
        assert!(matches!(err, RetrievalError::ReadError { .. }), "{err:?}");
        assert_eq!(err.id(), "refs");
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_read_error() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join("blob.md"), [0xff, 0xfe, 0x00])
            .await
            .unwrap();

        let source = FsSource::new(tmp.path());
        let err = source.fetch(&entry("blob", "blob.md")).await.unwrap_err();
        assert!(err.to_string().contains("not valid UTF-8"));
    }

    #[tokio::test]
    async fn test_traversal_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let docs = tmp.path().join("docs");
        tokio::fs::create_dir_all(&docs).await.unwrap();
        tokio::fs::write(tmp.path().join("secret.md"), "secret")
            .await
            .unwrap();

        let source = FsSource::new(&docs);
        let err = source
            .fetch(&entry("secret", "../secret.md"))
            .await
            .unwrap_err();
        assert!(matches!(err, RetrievalError::NotFound { .. }));
    }

    #[test]
    fn test_resolve_joins_root() {
        let source = FsSource::new("/srv/bundle");
        assert_eq!(
            source.resolve(&entry("ssr", "references/ssr.md")).unwrap(),
            PathBuf::from("/srv/bundle/references/ssr.md")
        );
    }
}
