//! On-disk documentation bundles for tests.
//!
//! A [`TestBundle`] writes a manifest and its documents into a temporary
//! directory, together with an [`IndexConfig`] pointing at them.

use std::path::PathBuf;

use refdex_config::IndexConfig;
use refdex_core::{Manifest, ManifestFormat};
use tempfile::TempDir;

/// A test-scoped bundle with an owned temp directory.
///
/// The temp directory is deleted automatically when this value is dropped,
/// guaranteeing cleanup even on panic.
pub struct TestBundle {
    pub root: PathBuf,
    pub manifest_path: PathBuf,
    pub config: IndexConfig,
    _temp_dir: TempDir,
}

impl TestBundle {
    /// Write `manifest` in `format` plus a `# <title>` document for every
    /// entry.
    pub async fn new(manifest: &Manifest, format: ManifestFormat) -> Self {
        let bundle = Self::without_documents(manifest, format).await;
        for entry in manifest {
            bundle
                .write_document(&entry.path, &format!("# {}\n", entry.title))
                .await;
        }
        bundle
    }

    /// Write only the manifest; every document path is left missing.
    pub async fn without_documents(manifest: &Manifest, format: ManifestFormat) -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let root = temp_dir.path().to_path_buf();

        let file_name = match format {
            ManifestFormat::Toml => "index.toml",
            ManifestFormat::Json => "index.json",
            ManifestFormat::Markdown => "SKILL.md",
        };
        let manifest_path = root.join(file_name);
        let text = format
            .render(manifest)
            .expect("failed to render test manifest");
        tokio::fs::write(&manifest_path, text)
            .await
            .expect("failed to write test manifest");
        tracing::debug!(path = %manifest_path.display(), "Wrote test manifest");

        let mut config = IndexConfig::default();
        config.manifest.path = manifest_path.display().to_string();

        Self {
            root,
            manifest_path,
            config,
            _temp_dir: temp_dir,
        }
    }

    /// Write (or overwrite) a document relative to the bundle root.
    pub async fn write_document(&self, path: &str, content: &str) {
        let full = self.root.join(path);
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .expect("failed to create document directory");
        }
        tokio::fs::write(&full, content)
            .await
            .expect("failed to write test document");
    }

    /// Delete a document so retrieval reports it missing.
    pub async fn remove_document(&self, path: &str) {
        tokio::fs::remove_file(self.root.join(path))
            .await
            .expect("failed to remove test document");
    }

    /// Write a `refdex.toml` into the bundle root and return its path.
    pub async fn write_config(&self, toml_content: &str) -> PathBuf {
        let path = self.root.join("refdex.toml");
        tokio::fs::write(&path, toml_content)
            .await
            .expect("failed to write test config");
        path
    }
}
