//! Startup wiring: build the index once and hand it out explicitly.
//!
//! There is no global manifest. A process constructs one [`IndexHandle`] at
//! startup and passes `Arc<ReferenceIndex>` / [`Retriever`] clones to the
//! components that need lookups or retrieval.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use refdex_config::{ConfigError, IndexConfig};

use crate::format::{self, ManifestFormat};
use crate::index::ReferenceIndex;
use crate::logging;
use crate::manifest::ManifestError;
use crate::retrieval::{DocumentSource, FsSource, HttpSource, LoadReport, Retriever};

/// Errors from building an [`IndexHandle`].
#[derive(Debug, thiserror::Error)]
pub enum HandleError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Manifest(#[from] ManifestError),
}

/// The index and retriever for one manifest, built from configuration.
#[derive(Debug, Clone)]
pub struct IndexHandle {
    index: Arc<ReferenceIndex>,
    retriever: Retriever,
    byte_budget: Option<u64>,
}

impl IndexHandle {
    /// Process startup from a configuration file: install logging at the
    /// configured level, then load the manifest the file points at.
    ///
    /// Relative paths in the file are resolved against its directory.
    pub async fn load(config_path: &Path) -> Result<Self, HandleError> {
        let config = IndexConfig::load(config_path).await?;
        Self::init_logging(&config);
        Self::from_config(&config).await
    }

    /// Install the global log subscriber at `[logging] level`.
    ///
    /// Returns `false` when a subscriber is already installed, in which case
    /// the existing one is left in place.
    pub fn init_logging(config: &IndexConfig) -> bool {
        let installed = logging::init(&config.logging.level);
        if !installed {
            debug!(level = %config.logging.level, "Log subscriber already installed");
        }
        installed
    }

    /// Read and validate the manifest named by `config`, and set up the
    /// configured retrieval backend.
    pub async fn from_config(config: &IndexConfig) -> Result<Self, HandleError> {
        config.validate()?;

        let manifest_path = Path::new(&config.manifest.path);
        let format = ManifestFormat::resolve(&config.manifest.format, manifest_path)?;
        let manifest = format::load(manifest_path, Some(format)).await?;
        let index = ReferenceIndex::new(manifest);

        let retriever = Retriever::new(build_source(config))
            .with_timeout(config.timeout())
            .with_max_concurrent(config.retrieval.max_concurrent);

        info!(
            manifest = %manifest_path.display(),
            source = retriever.source_name(),
            "{}",
            index.summary()
        );

        Ok(Self {
            index: Arc::new(index),
            retriever,
            byte_budget: config.byte_budget(),
        })
    }

    /// Wrap an already-built index and retriever.
    pub fn new(index: ReferenceIndex, retriever: Retriever) -> Self {
        Self {
            index: Arc::new(index),
            retriever,
            byte_budget: None,
        }
    }

    /// Budget applied by [`load_default`](Self::load_default).
    pub fn with_byte_budget(mut self, budget: Option<u64>) -> Self {
        self.byte_budget = budget;
        self
    }

    /// Shared handle to the index.
    pub fn index(&self) -> Arc<ReferenceIndex> {
        Arc::clone(&self.index)
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    /// Load documents in default order within the configured byte budget.
    pub async fn load_default(&self) -> LoadReport {
        self.retriever
            .fetch_within_budget(&self.index, self.byte_budget)
            .await
    }
}

fn build_source(config: &IndexConfig) -> Arc<dyn DocumentSource> {
    match config.retrieval.backend.as_str() {
        "http" => Arc::new(HttpSource::new(config.retrieval.base_url.clone())),
        _ => Arc::new(FsSource::new(config.document_root())),
    }
}
