//! Document retrieval: reading the documents an index entry points at.
//!
//! Retrieval is the external I/O half of the consumer contract. A
//! [`DocumentSource`] knows how to read one entry's document (filesystem,
//! HTTP, or an in-memory bundle); the [`Retriever`] wraps a source with a
//! timeout, cancellation, and bulk loading in index order.
//!
//! ```text
//!   ReferenceIndex ──load_order()──▶ Retriever ──fetch()──▶ DocumentSource
//!                                      │ timeout              ├─ FsSource
//!                                      │ cancel               ├─ HttpSource
//!                                      │ budget               └─ MemorySource
//! ```
//!
//! Every [`RetrievalError`] carries the offending entry's `id` and `path`.

use std::future::Future;
use std::path::{Component, Path};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::BoxFuture;
use crate::index::ReferenceIndex;
use crate::manifest::DocumentEntry;

pub mod fs;
pub mod http;
pub mod memory;

pub use fs::FsSource;
pub use http::HttpSource;
pub use memory::MemorySource;

/// Errors from retrieving a document.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RetrievalError {
    #[error("document {id:?} not found at {path:?}")]
    NotFound { id: String, path: String },

    #[error("failed to read document {id:?} at {path:?}: {reason}")]
    ReadError {
        id: String,
        path: String,
        reason: String,
    },

    #[error("retrieving document {id:?} at {path:?} timed out after {after:?}")]
    Timeout {
        id: String,
        path: String,
        after: Duration,
    },

    #[error("retrieval of document {id:?} at {path:?} was cancelled")]
    Cancelled { id: String, path: String },
}

impl RetrievalError {
    pub fn not_found(entry: &DocumentEntry) -> Self {
        Self::NotFound {
            id: entry.id.clone(),
            path: entry.path.clone(),
        }
    }

    pub fn read_error(entry: &DocumentEntry, reason: impl Into<String>) -> Self {
        Self::ReadError {
            id: entry.id.clone(),
            path: entry.path.clone(),
            reason: reason.into(),
        }
    }

    /// Id of the entry that failed.
    pub fn id(&self) -> &str {
        match self {
            Self::NotFound { id, .. }
            | Self::ReadError { id, .. }
            | Self::Timeout { id, .. }
            | Self::Cancelled { id, .. } => id,
        }
    }

    /// Path of the entry that failed.
    pub fn path(&self) -> &str {
        match self {
            Self::NotFound { path, .. }
            | Self::ReadError { path, .. }
            | Self::Timeout { path, .. }
            | Self::Cancelled { path, .. } => path,
        }
    }
}

/// A retrieved document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Id of the entry this document was fetched for.
    pub id: String,
    /// The entry's retrieval path.
    pub path: String,
    /// Document text.
    pub content: String,
}

impl Document {
    /// Size of the content in bytes.
    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// A backend that can read the document behind a manifest entry.
///
/// Implementations must be `Send + Sync`; the retriever shares them across
/// tasks. Uses `BoxFuture` so sources can be held as `Arc<dyn DocumentSource>`.
pub trait DocumentSource: Send + Sync {
    /// Backend name for logs (e.g. "fs", "http").
    fn name(&self) -> &str;

    /// Read the document for `entry`.
    fn fetch(&self, entry: &DocumentEntry) -> BoxFuture<'_, Result<Document, RetrievalError>>;
}

/// Reject entry paths that could leave the source's root: absolute paths,
/// drive prefixes, and `..` components.
pub(crate) fn check_relative(entry: &DocumentEntry) -> Result<&Path, RetrievalError> {
    let path = Path::new(entry.path.trim());
    let escapes = path.is_absolute()
        || path
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        warn!(id = %entry.id, path = %entry.path, "Rejected document path outside the root");
        return Err(RetrievalError::not_found(entry));
    }
    Ok(path)
}

/// Outcome of a budgeted load.
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Documents that fit, in load order.
    pub loaded: Vec<Document>,
    /// Ids of documents fetched but left out because they exceeded the budget.
    pub skipped: Vec<String>,
    /// Entries that could not be retrieved.
    pub failed: Vec<RetrievalError>,
    /// Bytes used by `loaded`.
    pub used_bytes: u64,
}

impl LoadReport {
    /// Ids of the loaded documents, in load order.
    pub fn loaded_ids(&self) -> Vec<&str> {
        self.loaded.iter().map(|d| d.id.as_str()).collect()
    }
}

/// Retrieval front end: timeouts, cancellation, and bulk loading over a
/// [`DocumentSource`].
///
/// Cloning is cheap; clones share the same source.
#[derive(Clone)]
pub struct Retriever {
    source: Arc<dyn DocumentSource>,
    timeout: Option<Duration>,
    max_concurrent: usize,
}

impl Retriever {
    /// Create a retriever with no timeout and a concurrency limit of 4.
    pub fn new(source: Arc<dyn DocumentSource>) -> Self {
        Self {
            source,
            timeout: None,
            max_concurrent: 4,
        }
    }

    /// Bound every fetch by `timeout` (`None` = unbounded).
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Limit the number of concurrent fetches in [`fetch_all`](Self::fetch_all).
    pub fn with_max_concurrent(mut self, n: usize) -> Self {
        self.max_concurrent = n.max(1);
        self
    }

    /// Name of the underlying source.
    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Fetch one document, bounded by the configured timeout.
    pub async fn fetch(&self, entry: &DocumentEntry) -> Result<Document, RetrievalError> {
        let result = match self.timeout {
            Some(after) => match tokio::time::timeout(after, self.source.fetch(entry)).await {
                Ok(result) => result,
                Err(_) => Err(RetrievalError::Timeout {
                    id: entry.id.clone(),
                    path: entry.path.clone(),
                    after,
                }),
            },
            None => self.source.fetch(entry).await,
        };

        match &result {
            Ok(doc) => debug!(
                source = self.source.name(),
                id = %entry.id,
                bytes = doc.len(),
                "Fetched document"
            ),
            Err(e) => debug!(source = self.source.name(), id = %entry.id, error = %e, "Fetch failed"),
        }
        result
    }

    /// Fetch one document, giving up as soon as `cancelled` completes.
    ///
    /// Any future works as the signal, e.g. a `watch` receiver's `changed()`
    /// or a `oneshot` receiver. Dropping the returned future also cancels.
    pub async fn fetch_cancellable<C>(
        &self,
        entry: &DocumentEntry,
        cancelled: C,
    ) -> Result<Document, RetrievalError>
    where
        C: Future<Output = ()>,
    {
        tokio::select! {
            result = self.fetch(entry) => result,
            () = cancelled => {
                debug!(id = %entry.id, "Fetch cancelled");
                Err(RetrievalError::Cancelled {
                    id: entry.id.clone(),
                    path: entry.path.clone(),
                })
            }
        }
    }

    /// Fetch entries one after another, in the given order.
    pub async fn fetch_ordered<'a, I>(&self, entries: I) -> Vec<Result<Document, RetrievalError>>
    where
        I: IntoIterator<Item = &'a DocumentEntry>,
    {
        let mut results = Vec::new();
        for entry in entries {
            results.push(self.fetch(entry).await);
        }
        results
    }

    /// Fetch entries concurrently (at most `max_concurrent` at a time).
    ///
    /// The result vector is aligned with the input order regardless of
    /// completion order. Dropping the returned future aborts every fetch
    /// still in flight.
    pub async fn fetch_all<'a, I>(&self, entries: I) -> Vec<Result<Document, RetrievalError>>
    where
        I: IntoIterator<Item = &'a DocumentEntry>,
    {
        let entries: Vec<&DocumentEntry> = entries.into_iter().collect();
        let permits = Arc::new(Semaphore::new(self.max_concurrent));
        let mut tasks = JoinSet::new();

        for (position, entry) in entries.iter().enumerate() {
            let retriever = self.clone();
            let permits = Arc::clone(&permits);
            let owned = (*entry).clone();
            tasks.spawn(async move {
                let _permit = permits.acquire_owned().await;
                (position, retriever.fetch(&owned).await)
            });
        }

        let mut slots: Vec<Option<Result<Document, RetrievalError>>> = vec![None; entries.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((position, result)) => slots[position] = Some(result),
                Err(e) => warn!(error = %e, "Retrieval task failed"),
            }
        }

        entries
            .iter()
            .zip(slots)
            .map(|(entry, slot)| {
                slot.unwrap_or_else(|| {
                    Err(RetrievalError::read_error(entry, "retrieval task failed"))
                })
            })
            .collect()
    }

    /// Walk the index in load order and keep documents while they fit in
    /// `max_bytes` (`None` = keep everything).
    ///
    /// Documents are packed greedily: one that does not fit is skipped and
    /// later, smaller documents may still be loaded. Failures are collected,
    /// never dropped.
    pub async fn fetch_within_budget(
        &self,
        index: &ReferenceIndex,
        max_bytes: Option<u64>,
    ) -> LoadReport {
        let mut report = LoadReport::default();

        for entry in index.load_order() {
            match self.fetch(entry).await {
                Ok(doc) => {
                    let size = doc.len() as u64;
                    let fits = max_bytes.is_none_or(|max| report.used_bytes + size <= max);
                    if fits {
                        report.used_bytes += size;
                        report.loaded.push(doc);
                    } else {
                        debug!(id = %entry.id, bytes = size, "Document exceeds remaining budget");
                        report.skipped.push(entry.id.clone());
                    }
                }
                Err(e) => {
                    warn!(id = %entry.id, path = %entry.path, error = %e, "Failed to load document");
                    report.failed.push(e);
                }
            }
        }

        debug!(
            loaded = report.loaded.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            used_bytes = report.used_bytes,
            "Budgeted load finished"
        );
        report
    }

    /// Check that every entry in the index can be retrieved.
    ///
    /// Paths are only checked lazily at retrieval time, so this is how a
    /// consumer validates a bundle up front. Returns the failures in load
    /// order; an empty vector means every document is readable.
    pub async fn verify(&self, index: &ReferenceIndex) -> Vec<RetrievalError> {
        let failures: Vec<RetrievalError> = self
            .fetch_all(index.load_order())
            .await
            .into_iter()
            .filter_map(Result::err)
            .collect();

        for failure in &failures {
            warn!(id = failure.id(), path = failure.path(), error = %failure, "Unreadable document");
        }
        failures
    }
}

impl std::fmt::Debug for Retriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Retriever")
            .field("source", &self.source.name())
            .field("timeout", &self.timeout)
            .field("max_concurrent", &self.max_concurrent)
            .finish()
    }
}
