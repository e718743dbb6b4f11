//! HTTP document source.
//!
//! Fetches `base_url + entry.path` with a plain GET. Each path component is
//! percent-encoded as one URL segment, so `#` or `?` in a file name never
//! turns into a fragment or query. A 404 maps to
//! [`RetrievalError::NotFound`]; every other failure (transport error,
//! non-success status, undecodable body) maps to [`RetrievalError::ReadError`].

use std::path::Component;

use reqwest::{Client, StatusCode, Url};
use tracing::debug;

use crate::BoxFuture;
use crate::manifest::DocumentEntry;

use super::{Document, DocumentSource, RetrievalError, check_relative};

/// Reads documents over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
    base_url: String,
}

impl HttpSource {
    /// Create a source rooted at `base_url`. A trailing `/` is added if
    /// missing so entry paths are appended, not substituted.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    /// Use a preconfigured client (proxies, TLS roots, default headers).
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL for an entry, if its path stays under the base URL.
    pub fn url_for(&self, entry: &DocumentEntry) -> Result<Url, RetrievalError> {
        let rel = check_relative(entry)?;
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            RetrievalError::read_error(entry, format!("invalid base URL {:?}: {e}", self.base_url))
        })?;

        {
            let mut segments = url.path_segments_mut().map_err(|()| {
                RetrievalError::read_error(
                    entry,
                    format!("base URL {:?} cannot hold a path", self.base_url),
                )
            })?;
            segments.pop_if_empty();
            for component in rel.components() {
                if let Component::Normal(part) = component {
                    segments.push(&part.to_string_lossy());
                }
            }
        }
        Ok(url)
    }
}

impl DocumentSource for HttpSource {
    fn name(&self) -> &str {
        "http"
    }

    fn fetch(&self, entry: &DocumentEntry) -> BoxFuture<'_, Result<Document, RetrievalError>> {
        let entry = entry.clone();

        Box::pin(async move {
            let url = self.url_for(&entry)?;
            debug!(id = %entry.id, url = %url, "GET document");

            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| RetrievalError::read_error(&entry, e.to_string()))?;

            let status = response.status();
            if status == StatusCode::NOT_FOUND {
                return Err(RetrievalError::not_found(&entry));
            }
            if !status.is_success() {
                return Err(RetrievalError::read_error(&entry, format!("HTTP {status}")));
            }

            let content = response
                .text()
                .await
                .map_err(|e| RetrievalError::read_error(&entry, e.to_string()))?;

            Ok(Document {
                id: entry.id,
                path: entry.path,
                content,
            })
        })
    }
}
