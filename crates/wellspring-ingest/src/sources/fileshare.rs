//! `shpt://` file-share folder source adapter.
//!
//! Reads a folder identified by an `shpt://host/path` URL using configured
//! client credentials, emitting each file with its server metadata. This is
//! a thin shim over whatever file-share client the deployment configures;
//! here it is grounded on a generic HTTP listing API since the concrete
//! client library is an external collaborator.

use std::path::Path;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{SourceAdapter, SourceFile, SourceFileBatch};
use crate::types::RagError;

#[derive(Debug, Deserialize)]
struct FolderListing {
    files: Vec<FolderEntry>,
}

#[derive(Debug, Deserialize)]
struct FolderEntry {
    name: String,
    download_url: String,
}

/// Reads a folder identified by an `shpt://` scheme using configured
/// client credentials.
pub struct FileShareReader {
    client: Client,
    credentials: Option<String>,
}

impl Default for FileShareReader {
    fn default() -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(60))
                .build()
                .expect("building reqwest client"),
            credentials: std::env::var("FILESHARE_CLIENT_TOKEN").ok(),
        }
    }
}

impl FileShareReader {
    fn api_url(root_url: &str) -> Result<String, RagError> {
        let rest = root_url
            .strip_prefix("shpt://")
            .ok_or_else(|| RagError::Validation(format!("not an shpt:// url: {root_url}")))?;
        Ok(format!("https://{rest}/_api/list"))
    }
}

#[async_trait]
impl SourceAdapter for FileShareReader {
    async fn discover(
        &self,
        engine_id: &str,
        root_url: &str,
        _depth: u32,
        _staging_dir: &Path,
    ) -> Result<SourceFileBatch, RagError> {
        let Some(token) = &self.credentials else {
            return Err(RagError::SourceAuth(
                "FILESHARE_CLIENT_TOKEN is not configured".to_string(),
            ));
        };

        let url = Self::api_url(root_url)?;
        let resp = self
            .client
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| RagError::SourceUnreachable(e.to_string()))?;

        if resp.status() == reqwest::StatusCode::UNAUTHORIZED
            || resp.status() == reqwest::StatusCode::FORBIDDEN
        {
            return Err(RagError::SourceAuth(format!(
                "credentials rejected for {root_url}"
            )));
        }
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(RagError::SourceNotFound(format!(
                "folder not found: {root_url}"
            )));
        }
        if !resp.status().is_success() {
            return Err(RagError::SourceUnreachable(format!(
                "{root_url} listing failed with status {}",
                resp.status()
            )));
        }

        let listing: FolderListing = resp
            .json()
            .await
            .map_err(|e| RagError::SourceUnreachable(e.to_string()))?;

        let mut files = Vec::with_capacity(listing.files.len());
        for entry in listing.files {
            let bytes = self
                .client
                .get(&entry.download_url)
                .bearer_auth(token)
                .send()
                .await
                .map_err(|e| RagError::SourceUnreachable(e.to_string()))?
                .bytes()
                .await
                .map_err(|e| RagError::SourceUnreachable(e.to_string()))?;

            files.push(SourceFile {
                mime_type: SourceFile::detect_mime(&entry.name, &bytes),
                content_hash: SourceFile::content_hash_of(&bytes),
                display_name: entry.name,
                source_url: entry.download_url,
                local_staging_path: None,
                object_store_path: None,
                engine_id: engine_id.to_string(),
            });
        }
        Ok(files)
    }

    async fn fetch_bytes(&self, file: &SourceFile) -> Result<Vec<u8>, RagError> {
        let Some(token) = &self.credentials else {
            return Err(RagError::SourceAuth(
                "FILESHARE_CLIENT_TOKEN is not configured".to_string(),
            ));
        };
        let bytes = self
            .client
            .get(&file.source_url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| RagError::SourceUnreachable(e.to_string()))?
            .bytes()
            .await
            .map_err(|e| RagError::SourceUnreachable(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_url_requires_shpt_scheme() {
        assert!(FileShareReader::api_url("https://example.com").is_err());
        assert_eq!(
            FileShareReader::api_url("shpt://fileshare.internal/team/docs").unwrap(),
            "https://fileshare.internal/team/docs/_api/list"
        );
    }
}
