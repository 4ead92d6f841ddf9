//! Blob storage for image bytes.
//!
//! Stores hand back a public URL for each uploaded object. The path of an
//! object can be recovered from its URL, which is what deletion relies on.

use async_trait::async_trait;
use std::path::PathBuf;
use uuid::Uuid;

/// Errors that can occur while talking to blob storage
#[derive(Debug)]
pub enum StorageError {
    IoError(std::io::Error),
    #[cfg(feature = "webdav")]
    WebDavError(String),
    InvalidPath(String),
    Other(String),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::IoError(e) => write!(f, "IO error: {}", e),
            #[cfg(feature = "webdav")]
            StorageError::WebDavError(e) => write!(f, "WebDAV error: {}", e),
            StorageError::InvalidPath(p) => write!(f, "Invalid storage path: {}", p),
            StorageError::Other(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::IoError(err)
    }
}

/// Object storage holding image bytes
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores `bytes` at `path` and returns the public URL
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError>;

    /// Removes the object at `path`
    async fn remove(&self, path: &str) -> Result<(), StorageError>;

    /// Maps a public URL back to its storage path
    fn path_for_url(&self, url: &str) -> Option<String>;
}

/// Replaces everything except ASCII letters, digits, `.`, `-` and `_`
pub fn sanitize_file_name(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.trim_matches(|c| c == '.' || c == '_').is_empty() {
        "image".to_string()
    } else {
        sanitized
    }
}

/// Storage path for a compressed upload:
/// `forklifts/<forklift_id>/<unix_millis>-<nonce>-<sanitized stem>.jpg`
///
/// Every upload becomes a JPEG, so `front.png` and `front.webp` share a
/// stem; the nonce keeps their paths apart.
pub fn blob_path(
    forklift_id: &Uuid,
    original_name: &str,
    timestamp_millis: i64,
    nonce: &Uuid,
) -> String {
    let stem = std::path::Path::new(original_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(original_name);
    let nonce = nonce.simple().to_string();

    format!(
        "forklifts/{}/{}-{}-{}.jpg",
        forklift_id,
        timestamp_millis,
        &nonce[..8],
        sanitize_file_name(stem)
    )
}

fn check_relative(path: &str) -> Result<(), StorageError> {
    if path.is_empty() || path.starts_with('/') || path.split('/').any(|part| part == "..") {
        return Err(StorageError::InvalidPath(path.to_string()));
    }
    Ok(())
}

/// Blob store backed by a local directory that a web server exposes
/// under `public_base_url`
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn full_path(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<String, StorageError> {
        check_relative(path)?;
        let full_path = self.full_path(path);

        tokio::task::spawn_blocking(move || {
            if let Some(parent) = full_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&full_path, bytes)
        })
        .await
        .map_err(|e| StorageError::Other(format!("Task join error: {}", e)))??;

        log::info!("Stored blob {}", path);
        Ok(format!("{}/{}", self.public_base_url, path))
    }

    async fn remove(&self, path: &str) -> Result<(), StorageError> {
        check_relative(path)?;
        let full_path = self.full_path(path);

        tokio::task::spawn_blocking(move || std::fs::remove_file(full_path))
            .await
            .map_err(|e| StorageError::Other(format!("Task join error: {}", e)))??;

        log::info!("Removed blob {}", path);
        Ok(())
    }

    fn path_for_url(&self, url: &str) -> Option<String> {
        url.strip_prefix(&self.public_base_url)
            .map(|rest| rest.trim_start_matches('/').to_string())
            .filter(|p| !p.is_empty())
    }
}

/// Configuration for the WebDAV blob store
#[cfg(feature = "webdav")]
#[derive(Debug, Clone)]
pub struct WebDavConfig {
    pub server_url: String,
    pub username: String,
    pub app_password: String,
    /// Remote directory that receives the `forklifts/...` tree
    pub remote_path: String,
    /// URL under which `remote_path` is publicly readable
    pub public_base_url: String,
}

/// Blob store writing to a WebDAV share (e.g. Nextcloud)
#[cfg(feature = "webdav")]
pub struct WebDavBlobStore {
    config: WebDavConfig,
    client: reqwest_dav::Client,
}

#[cfg(feature = "webdav")]
impl WebDavBlobStore {
    pub fn new(config: WebDavConfig) -> Result<Self, StorageError> {
        let webdav_url = format!(
            "{}/remote.php/dav/files/{}",
            config.server_url.trim_end_matches('/'),
            config.username
        );

        let client = reqwest_dav::ClientBuilder::new()
            .set_host(webdav_url)
            .set_auth(reqwest_dav::Auth::Basic(
                config.username.clone(),
                config.app_password.clone(),
            ))
            .build()
            .map_err(|e| StorageError::WebDavError(format!("WebDAV client error: {:?}", e)))?;

        Ok(Self { config, client })
    }

    fn remote(&self, path: &str) -> String {
        format!("{}/{}", self.config.remote_path.trim_end_matches('/'), path)
    }

    /// Creates each directory level of `path`; existing ones are fine
    async fn ensure_parents(&self, path: &str) {
        let mut current = self.config.remote_path.trim_end_matches('/').to_string();
        let parts: Vec<&str> = path.split('/').collect();
        for part in &parts[..parts.len().saturating_sub(1)] {
            current = format!("{}/{}", current, part);
            if let Err(e) = self.client.mkcol(&current).await {
                log::debug!("MKCOL '{}' note: {:?}", current, e);
            }
        }
    }
}

#[cfg(feature = "webdav")]
#[async_trait]
impl BlobStore for WebDavBlobStore {
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<String, StorageError> {
        check_relative(path)?;
        self.ensure_parents(path).await;

        let remote_path = self.remote(path);
        self.client
            .put(&remote_path, bytes)
            .await
            .map_err(|e| StorageError::WebDavError(format!("Upload failed: {:?}", e)))?;

        log::info!("Uploaded blob to {}", remote_path);

        let base = reqwest::Url::parse(&format!(
            "{}/",
            self.config.public_base_url.trim_end_matches('/')
        ))
        .map_err(|e| StorageError::Other(format!("Invalid public URL: {}", e)))?;
        let url = base
            .join(path)
            .map_err(|e| StorageError::InvalidPath(format!("{}: {}", path, e)))?;
        Ok(url.to_string())
    }

    async fn remove(&self, path: &str) -> Result<(), StorageError> {
        check_relative(path)?;
        let remote_path = self.remote(path);
        self.client
            .delete(&remote_path)
            .await
            .map_err(|e| StorageError::WebDavError(format!("Delete failed: {:?}", e)))?;

        log::info!("Removed blob {}", remote_path);
        Ok(())
    }

    fn path_for_url(&self, url: &str) -> Option<String> {
        url.strip_prefix(self.config.public_base_url.trim_end_matches('/'))
            .map(|rest| rest.trim_start_matches('/').to_string())
            .filter(|p| !p.is_empty())
    }
}
