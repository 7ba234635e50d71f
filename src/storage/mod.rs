//! Object storage collaborator issuing time-boxed upload URLs.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use url::Url;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("object store unavailable: {0}")]
    Unavailable(String),
    #[error("invalid object location: {0}")]
    InvalidLocation(String),
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// A URL allowing one direct PUT of `content_type` to `bucket/key` for `ttl`
    async fn presign_put(
        &self,
        bucket: &str,
        key: &str,
        content_type: &str,
        ttl: Duration,
    ) -> Result<String, StorageError>;
}

/// Issues upload URLs against a local endpoint.
///
/// The token in the query string is random, not a signature; whatever serves
/// the endpoint decides whether to honour it.
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    endpoint: Url,
}

impl LocalObjectStore {
    pub fn new(endpoint: &str) -> Result<Self, StorageError> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| StorageError::InvalidLocation(format!("{}: {}", endpoint, e)))?;
        if endpoint.cannot_be_a_base() {
            return Err(StorageError::InvalidLocation(endpoint.to_string()));
        }
        Ok(Self { endpoint })
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn presign_put(
        &self,
        bucket: &str,
        key: &str,
        content_type: &str,
        ttl: Duration,
    ) -> Result<String, StorageError> {
        let mut url = object_url(&self.endpoint, bucket, key)?;
        let expires = chrono::Utc::now().timestamp() + ttl.as_secs() as i64;
        url.query_pairs_mut()
            .append_pair("X-Content-Type", content_type)
            .append_pair("X-Expires", &expires.to_string())
            .append_pair("X-Token", &Uuid::new_v4().simple().to_string());
        Ok(url.into())
    }
}

/// `base` with `bucket` (when given) and each key segment appended to its path
pub fn object_url(base: &Url, bucket: &str, key: &str) -> Result<Url, StorageError> {
    let mut url = base.clone();
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| StorageError::InvalidLocation(base.to_string()))?;
        segments.pop_if_empty();
        if !bucket.is_empty() {
            segments.push(bucket);
        }
        for part in key.split('/').filter(|p| !p.is_empty()) {
            segments.push(part);
        }
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn presigned_url_targets_exact_key() {
        let store = LocalObjectStore::new("http://localhost:9000").unwrap();
        let url = store
            .presign_put("bucket", "uploads/a b.png", "image/png", Duration::from_secs(300))
            .await
            .unwrap();
        assert!(url.starts_with("http://localhost:9000/bucket/uploads/a%20b.png?"), "{}", url);
        assert!(url.contains("X-Content-Type=image%2Fpng"));
    }

    #[tokio::test]
    async fn tokens_differ_per_call() {
        let store = LocalObjectStore::new("http://localhost:9000").unwrap();
        let ttl = Duration::from_secs(300);
        let a = store.presign_put("b", "k", "image/png", ttl).await.unwrap();
        let b = store.presign_put("b", "k", "image/png", ttl).await.unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn rejects_non_base_endpoint() {
        assert!(LocalObjectStore::new("mailto:someone@example.com").is_err());
        assert!(LocalObjectStore::new("not a url").is_err());
    }
}
