use crate::config::AppConfig;
use crate::database;
use crate::error::AppError;
use listing_images::{
    BlobStore, ImageManager, ImageStore, LocalBlobStore, SqliteImageStore, WebDavBlobStore,
};
use rusqlite::Connection;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

/// Shared services of the running app, provided to every component
#[derive(Clone)]
pub struct AppContext {
    conn: Arc<Mutex<Connection>>,
    blobs: Arc<dyn BlobStore>,
    images: Arc<dyn ImageStore>,
    config: AppConfig,
}

impl AppContext {
    pub fn init(config: AppConfig) -> Result<Self, AppError> {
        let conn = database::init_database(&config.database_path)?;
        let blobs = blob_store(&config)?;
        Ok(Self::with_parts(conn, blobs, config))
    }

    pub fn with_parts(conn: Connection, blobs: Arc<dyn BlobStore>, config: AppConfig) -> Self {
        let conn = Arc::new(Mutex::new(conn));
        let images: Arc<dyn ImageStore> = Arc::new(SqliteImageStore::new(conn.clone()));
        Self {
            conn,
            blobs,
            images,
            config,
        }
    }

    pub fn connection(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Image manager for a forklift; `None` while the forklift is unsaved
    pub fn image_manager(&self, forklift_id: Option<Uuid>) -> ImageManager {
        ImageManager::new(
            forklift_id,
            self.blobs.clone(),
            self.images.clone(),
            self.config.images.clone(),
        )
    }
}

fn blob_store(config: &AppConfig) -> Result<Arc<dyn BlobStore>, AppError> {
    match &config.webdav {
        Some(settings) => {
            log::info!("Storing images on WebDAV at {}", settings.server_url);
            Ok(Arc::new(WebDavBlobStore::new(settings.clone().into())?))
        }
        None => {
            std::fs::create_dir_all(&config.media_dir)?;
            log::info!("Storing images in {}", config.media_dir.display());
            Ok(Arc::new(LocalBlobStore::new(
                config.media_dir.clone(),
                config.public_base_url.clone(),
            )))
        }
    }
}
