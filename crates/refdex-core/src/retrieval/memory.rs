//! In-memory document source, for bundles compiled into a binary
//! (`include_str!`) and for tests.

use std::collections::HashMap;

use crate::BoxFuture;
use crate::manifest::DocumentEntry;

use super::{Document, DocumentSource, RetrievalError};

/// Documents held in memory, keyed by entry path.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    documents: HashMap<String, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document at `path`, replacing any previous content.
    pub fn with_document(mut self, path: impl Into<String>, content: impl Into<String>) -> Self {
        self.documents.insert(path.into(), content.into());
        self
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl DocumentSource for MemorySource {
    fn name(&self) -> &str {
        "memory"
    }

    fn fetch(&self, entry: &DocumentEntry) -> BoxFuture<'_, Result<Document, RetrievalError>> {
        let result = match self.documents.get(&entry.path) {
            Some(content) => Ok(Document {
                id: entry.id.clone(),
                path: entry.path.clone(),
                content: content.clone(),
            }),
            None => Err(RetrievalError::not_found(entry)),
        };
        Box::pin(async move { result })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::Tier;

    #[tokio::test]
    async fn test_memory_source_lookup_by_path() {
        let source = MemorySource::new().with_document("references/rss.md", "# RSS");
        assert_eq!(source.len(), 1);

        let rss = DocumentEntry::new("rss", "RSS", "references/rss.md", Tier::Low);
        assert_eq!(source.fetch(&rss).await.unwrap().content, "# RSS");

        let other = DocumentEntry::new("rss", "RSS", "rss.md", Tier::Low);
        assert!(matches!(
            source.fetch(&other).await,
            Err(RetrievalError::NotFound { .. })
        ));
    }
}
