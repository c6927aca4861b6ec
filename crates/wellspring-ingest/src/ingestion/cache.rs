//! Disk-backed cache for fetched HTML, keyed by URL, so re-running a build
//! job against the same source set doesn't re-download every page.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tokio::fs;
use tracing::instrument;
use url::Url;

use crate::types::RagError;

/// Whether a fetch was served from cache or went out to the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Cached,
    Fetched,
}

/// A simple content-addressed directory cache: each cached page is stored
/// under `<root>/<sha256(url)>.html`.
#[derive(Clone, Debug)]
pub struct DocumentCache {
    root: PathBuf,
}

impl DocumentCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, url: &Url) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(url.as_str().as_bytes());
        let digest = format!("{:x}", hasher.finalize());
        self.root.join(format!("{digest}.html"))
    }

    pub async fn get(&self, url: &Url) -> Option<String> {
        fs::read_to_string(self.path_for(url)).await.ok()
    }

    pub async fn put(&self, url: &Url, body: &str) -> Result<(), RagError> {
        fs::create_dir_all(&self.root).await?;
        fs::write(self.path_for(url), body).await?;
        Ok(())
    }
}

/// Fetches `url`'s HTML body, preferring the cache and falling back to an
/// HTTP GET on a miss. The fetched body is written back into the cache.
#[instrument(skip(client, cache), fields(url = %url))]
pub async fn fetch_html(
    client: &reqwest::Client,
    cache: &DocumentCache,
    url: &Url,
) -> Result<(String, FetchOutcome), RagError> {
    if let Some(cached) = cache.get(url).await {
        return Ok((cached, FetchOutcome::Cached));
    }

    let response = client.get(url.clone()).send().await?;
    let status = response.status();
    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(RagError::SourceNotFound(url.to_string()));
    }
    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        return Err(RagError::SourceAuth(url.to_string()));
    }
    if !status.is_success() {
        return Err(RagError::SourceUnreachable(format!("{url}: HTTP {status}")));
    }

    let body = response.text().await?;
    cache.put(url, &body).await?;
    Ok((body, FetchOutcome::Fetched))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn cache_miss_then_hit() {
        let dir = tempdir().unwrap();
        let cache = DocumentCache::new(dir.path());
        let url = Url::parse("https://example.com/page").unwrap();

        assert!(cache.get(&url).await.is_none());
        cache.put(&url, "<html>hi</html>").await.unwrap();
        assert_eq!(cache.get(&url).await.unwrap(), "<html>hi</html>");
    }

    #[tokio::test]
    async fn fetch_html_uses_cache_before_network() {
        let dir = tempdir().unwrap();
        let cache = DocumentCache::new(dir.path());
        let url = Url::parse("https://example.com/cached-page").unwrap();
        cache.put(&url, "<html>from cache</html>").await.unwrap();

        let client = reqwest::Client::new();
        let (body, outcome) = fetch_html(&client, &cache, &url).await.unwrap();
        assert_eq!(body, "<html>from cache</html>");
        assert_eq!(outcome, FetchOutcome::Cached);
    }
}
