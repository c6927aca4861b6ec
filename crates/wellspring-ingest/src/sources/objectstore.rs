//! `gs://bucket/prefix` object-store prefix lister.
//!
//! Lists blobs under a bucket prefix and emits each as a [`SourceFile`]
//! referencing its existing object-store path directly, with no re-upload.

use std::path::Path;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{SourceAdapter, SourceFile, SourceFileBatch};
use crate::types::RagError;

#[derive(Debug, Deserialize)]
struct BucketListing {
    items: Vec<BucketObject>,
}

#[derive(Debug, Deserialize)]
struct BucketObject {
    name: String,
    #[serde(rename = "contentType")]
    content_type: Option<String>,
    md5: Option<String>,
}

/// Lists blobs under a `gs://bucket/prefix` URL via the object store's JSON
/// listing API.
pub struct ObjectStorePrefixLister {
    client: Client,
}

impl Default for ObjectStorePrefixLister {
    fn default() -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(60))
                .build()
                .expect("building reqwest client"),
        }
    }
}

impl ObjectStorePrefixLister {
    fn parse_gs_url(root_url: &str) -> Result<(String, String), RagError> {
        let rest = root_url
            .strip_prefix("gs://")
            .ok_or_else(|| RagError::Validation(format!("not a gs:// url: {root_url}")))?;
        let (bucket, prefix) = rest.split_once('/').unwrap_or((rest, ""));
        if bucket.is_empty() {
            return Err(RagError::Validation(format!(
                "missing bucket name in {root_url}"
            )));
        }
        Ok((bucket.to_string(), prefix.to_string()))
    }
}

#[async_trait]
impl SourceAdapter for ObjectStorePrefixLister {
    async fn discover(
        &self,
        engine_id: &str,
        root_url: &str,
        _depth: u32,
        _staging_dir: &Path,
    ) -> Result<SourceFileBatch, RagError> {
        let (bucket, prefix) = Self::parse_gs_url(root_url)?;
        let api_url = format!(
            "https://storage.googleapis.com/storage/v1/b/{bucket}/o?prefix={prefix}"
        );

        let resp = self
            .client
            .get(&api_url)
            .send()
            .await
            .map_err(|e| RagError::SourceUnreachable(e.to_string()))?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(RagError::SourceNotFound(format!(
                "bucket or prefix not found: {root_url}"
            )));
        }
        if !resp.status().is_success() {
            return Err(RagError::SourceUnreachable(format!(
                "{root_url} listing failed with status {}",
                resp.status()
            )));
        }

        let listing: BucketListing = resp
            .json()
            .await
            .map_err(|e| RagError::SourceUnreachable(e.to_string()))?;

        let files = listing
            .items
            .into_iter()
            .map(|obj| {
                let object_path = format!("gs://{bucket}/{}", obj.name);
                SourceFile {
                    display_name: obj
                        .name
                        .rsplit('/')
                        .next()
                        .unwrap_or(&obj.name)
                        .to_string(),
                    mime_type: obj
                        .content_type
                        .unwrap_or_else(|| "application/octet-stream".to_string()),
                    content_hash: obj.md5.unwrap_or_else(|| {
                        SourceFile::content_hash_of(object_path.as_bytes())
                    }),
                    source_url: object_path.clone(),
                    local_staging_path: None,
                    object_store_path: Some(object_path),
                    engine_id: engine_id.to_string(),
                }
            })
            .collect();

        Ok(files)
    }

    async fn fetch_bytes(&self, file: &SourceFile) -> Result<Vec<u8>, RagError> {
        let object_path = file
            .object_store_path
            .as_ref()
            .ok_or_else(|| RagError::Validation(format!("not an object-store file: {}", file.source_url)))?;
        let (bucket, name) = Self::parse_gs_url(object_path)?;
        let media_url = format!(
            "https://storage.googleapis.com/storage/v1/b/{bucket}/o/{}?alt=media",
            urlencoding_compat(&name)
        );
        let bytes = self
            .client
            .get(&media_url)
            .send()
            .await
            .map_err(|e| RagError::SourceUnreachable(e.to_string()))?
            .bytes()
            .await
            .map_err(|e| RagError::SourceUnreachable(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

/// Percent-encodes `/` the way the object-store JSON API expects for an
/// object name embedded in the path segment.
fn urlencoding_compat(name: &str) -> String {
    name.replace('/', "%2F")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_gs_url_splits_bucket_and_prefix() {
        let (bucket, prefix) = ObjectStorePrefixLister::parse_gs_url("gs://my-bucket/docs/team").unwrap();
        assert_eq!(bucket, "my-bucket");
        assert_eq!(prefix, "docs/team");
    }

    #[test]
    fn parse_gs_url_rejects_other_schemes() {
        assert!(ObjectStorePrefixLister::parse_gs_url("s3://bucket/prefix").is_err());
    }
}
