use crate::error::AppError;
use listing_images::{ListingImagesConfig, WebDavConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable overriding the config file location
pub const CONFIG_ENV: &str = "FORKLIFT_ADMIN_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "forklift-admin.toml";

/// Application configuration, read from `forklift-admin.toml`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub database_path: PathBuf,
    /// Directory of the local blob store
    pub media_dir: PathBuf,
    /// URL under which `media_dir` is served
    pub public_base_url: String,
    /// Uploads go to WebDAV instead of `media_dir` when set
    pub webdav: Option<WebDavSettings>,
    pub images: ListingImagesConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("./data/forklift-admin.db"),
            media_dir: PathBuf::from("./data/media"),
            public_base_url: "http://localhost:8080/media".to_string(),
            webdav: None,
            images: ListingImagesConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WebDavSettings {
    pub server_url: String,
    pub username: String,
    pub app_password: String,
    #[serde(default = "default_remote_path")]
    pub remote_path: String,
    pub public_base_url: String,
}

fn default_remote_path() -> String {
    "forklift-media".to_string()
}

impl From<WebDavSettings> for WebDavConfig {
    fn from(s: WebDavSettings) -> Self {
        WebDavConfig {
            server_url: s.server_url,
            username: s.username,
            app_password: s.app_password,
            remote_path: s.remote_path,
            public_base_url: s.public_base_url,
        }
    }
}

impl AppConfig {
    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Reads the config file; a missing file yields the defaults
    pub fn load_from(path: &Path) -> Result<Self, AppError> {
        if !path.exists() {
            log::info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&content)
            .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn load() -> Result<Self, AppError> {
        let path = std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        Self::load_from(&path)
    }
}
