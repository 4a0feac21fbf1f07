//! # Schema Source Loader
//!
//! Obtains the raw bytes of a schema document, either from a buffer the
//! host already holds or by fetching a location:
//!
//! - `http://` and `https://` URLs are fetched with `reqwest`;
//! - `file://` URLs and bare filesystem paths are read from disk.
//!
//! There are no retries and no internal timeout. Hosts that need bounded
//! latency pass a configured client to [`SchemaLoader::with_client`].

use std::path::Path;

use url::Url;

use crate::error::ConfigValidationError;

/// Immutable schema bytes plus the resource name used as their
/// compilation identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaDocument {
    name: String,
    content: Vec<u8>,
}

impl SchemaDocument {
    /// Resource name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw bytes.
    pub fn content(&self) -> &[u8] {
        &self.content
    }
}

/// Wrap bytes already held by the caller.
pub fn load_from_bytes(name: impl Into<String>, content: impl Into<Vec<u8>>) -> SchemaDocument {
    SchemaDocument {
        name: name.into(),
        content: content.into(),
    }
}

/// Fetches schema documents from URLs or paths.
#[derive(Debug, Clone, Default)]
pub struct SchemaLoader {
    http: reqwest::Client,
}

impl SchemaLoader {
    /// A loader with a default HTTP client.
    pub fn new() -> Self {
        Self::default()
    }

    /// A loader that issues requests through `http`.
    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// Fetch and fully read the document at `location`. The location
    /// string becomes the document's resource name.
    ///
    /// # Errors
    ///
    /// - [`ConfigValidationError::Transport`] if the request fails or the
    ///   server answers with a non-success status.
    /// - [`ConfigValidationError::ReadBody`] if the body cannot be read.
    /// - [`ConfigValidationError::Io`] if a file cannot be read.
    /// - [`ConfigValidationError::UnsupportedLocation`] for other schemes.
    pub async fn load_from_url(&self, location: &str) -> Result<SchemaDocument, ConfigValidationError> {
        match Url::parse(location) {
            Ok(url) => match url.scheme() {
                "http" | "https" => self.fetch(location, url).await,
                "file" => {
                    let path = url.to_file_path().map_err(|()| {
                        ConfigValidationError::UnsupportedLocation {
                            location: location.to_string(),
                            reason: "file URL does not name a local path".to_string(),
                        }
                    })?;
                    read_file(location, &path).await
                }
                scheme => Err(ConfigValidationError::UnsupportedLocation {
                    location: location.to_string(),
                    reason: format!("scheme '{scheme}' is not supported"),
                }),
            },
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                read_file(location, Path::new(location)).await
            }
            Err(e) => Err(ConfigValidationError::UnsupportedLocation {
                location: location.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    async fn fetch(&self, location: &str, url: Url) -> Result<SchemaDocument, ConfigValidationError> {
        let transport = |source: reqwest::Error| ConfigValidationError::Transport {
            url: location.to_string(),
            source,
        };

        let response = self
            .http
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(transport)?;

        let body = response
            .bytes()
            .await
            .map_err(|source| ConfigValidationError::ReadBody {
                url: location.to_string(),
                source,
            })?;

        tracing::debug!(url = location, bytes = body.len(), "fetched schema");
        Ok(load_from_bytes(location, body.to_vec()))
    }
}

async fn read_file(location: &str, path: &Path) -> Result<SchemaDocument, ConfigValidationError> {
    let content = tokio::fs::read(path)
        .await
        .map_err(|source| ConfigValidationError::Io {
            location: location.to_string(),
            source,
        })?;
    tracing::debug!(path = %path.display(), bytes = content.len(), "read schema file");
    Ok(load_from_bytes(location, content))
}
