#![deny(unsafe_code)]

//! refdex core: tiered reference manifests, priority lookup, and retrieval.
//!
//! A documentation bundle lists its topic documents in a root manifest, each
//! tagged `high`, `medium`, or `low`. This crate parses that manifest
//! ([`format`]), serves tier-ordered lookups over it ([`ReferenceIndex`]),
//! and reads the referenced documents on demand ([`retrieval`]).
//!
//! ```no_run
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let config = refdex_config::IndexConfig::parse("[manifest]\npath = \"SKILL.md\"")?;
//! let handle = refdex_core::IndexHandle::from_config(&config).await?;
//!
//! let index = handle.index();
//! for entry in index.load_order() {
//!     let doc = handle.retriever().fetch(entry).await?;
//!     println!("{} ({} bytes)", entry.title, doc.len());
//! }
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::pin::Pin;

/// A type-erased, `Send`-safe, boxed future, the standard return type for async
/// trait methods that require dynamic dispatch (`dyn Trait`).
///
/// Native `async fn` in traits produces opaque return types that are **not**
/// object-safe. [`retrieval::DocumentSource`] is consumed as
/// `Arc<dyn DocumentSource>`, so it returns a concrete `Pin<Box<dyn Future>>`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Manifest source formats (TOML, JSON, Markdown table).
pub mod format;
/// Startup wiring from configuration.
pub mod handle;
/// Tier-ordered lookups.
pub mod index;
/// Logging setup and in-memory log capture.
pub mod logging;
/// Manifest data model.
pub mod manifest;
/// Document sources and the retriever.
pub mod retrieval;

pub use format::ManifestFormat;
pub use handle::{HandleError, IndexHandle};
pub use index::{IndexError, ReferenceIndex};
pub use logging::{LogCollector, LogReader};
pub use manifest::{DocumentEntry, InvalidTier, Manifest, ManifestError, Tier};
pub use retrieval::{Document, DocumentSource, LoadReport, RetrievalError, Retriever};
