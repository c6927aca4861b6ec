//! Pluggable source adapters producing a uniform [`SourceFile`] stream.
//!
//! Three concrete adapters are provided, selected by URL scheme at build
//! time: [`web::WebCrawler`] for `http(s)://`, [`fileshare::FileShareReader`]
//! for `shpt://`, and [`objectstore::ObjectStorePrefixLister`] for `gs://`.

pub mod fileshare;
pub mod objectstore;
pub mod web;

use std::path::PathBuf;

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::types::RagError;

/// A document discovered by a source adapter, staged for normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    /// Human-readable name (file name or page title fallback).
    pub display_name: String,
    /// Canonical URL or path the file was discovered at.
    pub source_url: String,
    /// Path to the staged copy on local disk, if staged.
    pub local_staging_path: Option<PathBuf>,
    /// Path in the object store, if the adapter references one directly.
    pub object_store_path: Option<String>,
    /// Detected MIME type.
    pub mime_type: String,
    /// SHA-256 hex digest of the staged content; used for dedup within a build.
    pub content_hash: String,
    /// Owning QueryEngine id.
    pub engine_id: String,
}

impl SourceFile {
    pub fn content_hash_of(bytes: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        format!("{:x}", hasher.finalize())
    }

    pub fn detect_mime(name: &str, bytes: &[u8]) -> String {
        mime_guess::from_path(name)
            .first()
            .map(|m| m.essence_str().to_string())
            .unwrap_or_else(|| {
                if bytes.starts_with(b"%PDF") {
                    "application/pdf".to_string()
                } else {
                    "application/octet-stream".to_string()
                }
            })
    }
}

/// A lazily produced batch of source files. Adapters yield files as they are
/// discovered rather than materializing the whole crawl up front.
pub type SourceFileBatch = Vec<SourceFile>;

/// Uniform adapter contract: given a root URL and a staging directory,
/// produce a finite, lazy sequence of [`SourceFile`] values.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Discover and stage all source files reachable from `root_url`.
    ///
    /// `depth` bounds breadth-first traversal for adapters that crawl (the
    /// file-share and object-store adapters ignore it).
    async fn discover(
        &self,
        engine_id: &str,
        root_url: &str,
        depth: u32,
        staging_dir: &std::path::Path,
    ) -> Result<SourceFileBatch, RagError>;

    /// Fetches the raw bytes for a file `discover` previously returned.
    /// Content isn't staged during discovery, so the normalizer calls this
    /// to pull it just before decoding.
    async fn fetch_bytes(&self, file: &SourceFile) -> Result<Vec<u8>, RagError>;
}

/// Selects the adapter implied by a root URL's scheme.
pub fn adapter_for_scheme(root_url: &str) -> Result<Box<dyn SourceAdapter>, RagError> {
    if root_url.starts_with("http://") || root_url.starts_with("https://") {
        Ok(Box::new(web::WebCrawler::default()))
    } else if root_url.starts_with("shpt://") {
        Ok(Box::new(fileshare::FileShareReader::default()))
    } else if root_url.starts_with("gs://") {
        Ok(Box::new(objectstore::ObjectStorePrefixLister::default()))
    } else {
        Err(RagError::Validation(format!(
            "unsupported source url scheme: {root_url}"
        )))
    }
}

/// Deduplicates source files by content hash, keeping the first occurrence.
pub fn dedup_by_content_hash(files: Vec<SourceFile>) -> Vec<SourceFile> {
    let mut seen = rustc_hash::FxHashSet::default();
    let mut out = Vec::with_capacity(files.len());
    for file in files {
        if seen.insert(file.content_hash.clone()) {
            out.push(file);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(hash: &str) -> SourceFile {
        SourceFile {
            display_name: "a".into(),
            source_url: "https://example.com/a".into(),
            local_staging_path: None,
            object_store_path: None,
            mime_type: "text/html".into(),
            content_hash: hash.into(),
            engine_id: "engine-1".into(),
        }
    }

    #[test]
    fn dedup_keeps_first_occurrence_per_hash() {
        let files = vec![file("h1"), file("h1"), file("h2")];
        let deduped = dedup_by_content_hash(files);
        assert_eq!(deduped.len(), 2);
    }

    #[test]
    fn adapter_for_scheme_rejects_unknown_schemes() {
        assert!(adapter_for_scheme("ftp://example.com").is_err());
    }
}
