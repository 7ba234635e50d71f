use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use url::Url;
use uuid::Uuid;

use crate::config::StorageConfig;
use crate::error::ApiError;
use crate::storage::{object_url, ObjectStore, StorageError};

const UPLOAD_PREFIX: &str = "uploads";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UploadRequest {
    pub file_name: Option<String>,
    #[serde(alias = "content_type")]
    pub file_type: Option<String>,
}

/// A direct-upload grant: where to PUT the bytes and where they will be readable
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadSlot {
    pub upload_url: String,
    pub image_url: String,
    pub key: String,
}

/// Issues short-lived upload URLs for ticket attachments
#[derive(Clone)]
pub struct UploadService {
    objects: Arc<dyn ObjectStore>,
    bucket: String,
    public_base: Url,
    ttl: Duration,
}

impl UploadService {
    pub fn new(objects: Arc<dyn ObjectStore>, config: &StorageConfig) -> Result<Self, StorageError> {
        let base = config
            .public_base_url
            .clone()
            .unwrap_or_else(|| format!("https://{}.s3.amazonaws.com", config.bucket));
        let public_base =
            Url::parse(&base).map_err(|e| StorageError::InvalidLocation(format!("{}: {}", base, e)))?;

        Ok(Self {
            objects,
            bucket: config.bucket.clone(),
            public_base,
            ttl: Duration::from_secs(config.upload_url_ttl_secs),
        })
    }

    pub async fn issue_upload_slot(&self, request: UploadRequest) -> Result<UploadSlot, ApiError> {
        let file_name = required(request.file_name, "file_name")?;
        let content_type = required(request.file_type, "file_type")?;

        let key = object_key(&file_name);
        let upload_url = self
            .objects
            .presign_put(&self.bucket, &key, &content_type, self.ttl)
            .await?;
        let image_url = object_url(&self.public_base, "", &key)?;

        tracing::info!(key = %key, content_type = %content_type, "Issued upload slot");
        Ok(UploadSlot {
            upload_url,
            image_url: image_url.into(),
            key,
        })
    }
}

impl std::fmt::Debug for UploadService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadService")
            .field("bucket", &self.bucket)
            .field("public_base", &self.public_base.as_str())
            .field("ttl", &self.ttl)
            .finish()
    }
}

/// `uploads/{uuid}-{unix_millis}-{sanitized name}`; unique even for identical names
pub fn object_key(file_name: &str) -> String {
    format!(
        "{}/{}-{}-{}",
        UPLOAD_PREFIX,
        Uuid::new_v4().simple(),
        chrono::Utc::now().timestamp_millis(),
        sanitize_file_name(file_name)
    )
}

/// Keeps ASCII alphanumerics, `.`, `-` and `_`; everything else becomes `_`
fn sanitize_file_name(file_name: &str) -> String {
    let base = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);
    let cleaned: String = base
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned.to_string()
    }
}

fn required(value: Option<String>, field: &str) -> Result<String, ApiError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::missing_field(field))
}
