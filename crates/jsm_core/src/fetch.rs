//! Retrieval of raw scene document bytes.
//!
//! A [`Fetcher`] turns a document identifier (a path or a URL) into bytes.
//! Fetching is a single attempt; failures are reported as [`FetchError`] and
//! never retried.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors that can occur while fetching a document.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[cfg(feature = "http")]
    #[error("HTTP error fetching {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Result type for fetch operations.
pub type FetchResult<T> = Result<T, FetchError>;

/// Asynchronous byte source for scene documents.
///
/// The returned future is not required to be `Send`; loads are driven on a
/// single thread.
#[allow(async_fn_in_trait)]
pub trait Fetcher {
    /// Fetch the raw bytes of the document named by `source`.
    async fn fetch(&self, source: &str) -> FetchResult<Vec<u8>>;
}

impl<F: Fetcher + ?Sized> Fetcher for &F {
    async fn fetch(&self, source: &str) -> FetchResult<Vec<u8>> {
        (**self).fetch(source).await
    }
}

/// Reads documents from the local filesystem.
#[derive(Clone, Debug, Default)]
pub struct FileFetcher {
    base_dir: Option<PathBuf>,
}

impl FileFetcher {
    /// Resolve document identifiers relative to the working directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative document identifiers against `base_dir`.
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Some(base_dir.into()),
        }
    }

    /// Path a document identifier maps to.
    pub fn resolve(&self, source: &str) -> PathBuf {
        match &self.base_dir {
            Some(base) => base.join(source),
            None => Path::new(source).to_path_buf(),
        }
    }
}

impl Fetcher for FileFetcher {
    async fn fetch(&self, source: &str) -> FetchResult<Vec<u8>> {
        let path = self.resolve(source);
        log::debug!("Reading scene document {}", path.display());
        std::fs::read(&path).map_err(|source| FetchError::Io { path, source })
    }
}

/// Serves documents from memory, keyed by identifier.
///
/// Useful for embedded assets and tests.
#[derive(Clone, Debug, Default)]
pub struct MemoryFetcher {
    documents: HashMap<String, Vec<u8>>,
}

impl MemoryFetcher {
    /// Create an empty fetcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document under `source`.
    pub fn with_document(mut self, source: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(source, bytes);
        self
    }

    /// Add or replace a document under `source`.
    pub fn insert(&mut self, source: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.documents.insert(source.into(), bytes.into());
    }
}

impl Fetcher for MemoryFetcher {
    async fn fetch(&self, source: &str) -> FetchResult<Vec<u8>> {
        self.documents
            .get(source)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(source.to_string()))
    }
}

/// Downloads documents over HTTP(S).
///
/// `reqwest` needs a Tokio runtime, so futures from this fetcher must be
/// polled inside one.
#[cfg(feature = "http")]
#[derive(Clone, Debug, Default)]
pub struct HttpFetcher {
    client: reqwest::Client,
    base_url: Option<reqwest::Url>,
}

#[cfg(feature = "http")]
impl HttpFetcher {
    /// Fetch absolute URLs only.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative identifiers against `base_url`.
    pub fn with_base_url(base_url: &str) -> FetchResult<Self> {
        let base_url = reqwest::Url::parse(base_url)
            .map_err(|_| FetchError::InvalidUrl(base_url.to_string()))?;
        Ok(Self {
            client: reqwest::Client::new(),
            base_url: Some(base_url),
        })
    }

    /// URL a document identifier maps to.
    pub fn resolve(&self, source: &str) -> FetchResult<reqwest::Url> {
        let url = match &self.base_url {
            Some(base) => base.join(source),
            None => reqwest::Url::parse(source),
        };
        url.map_err(|_| FetchError::InvalidUrl(source.to_string()))
    }
}

#[cfg(feature = "http")]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, source: &str) -> FetchResult<Vec<u8>> {
        let url = self.resolve(source)?;
        log::debug!("Downloading scene document {}", url);

        let to_error = |source: reqwest::Error| FetchError::Http {
            url: url.to_string(),
            source,
        };
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(to_error)?
            .error_for_status()
            .map_err(to_error)?;
        let bytes = response.bytes().await.map_err(to_error)?;
        Ok(bytes.to_vec())
    }
}

/// Returns true if `source` looks like an absolute URL rather than a path.
pub fn is_url(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}
