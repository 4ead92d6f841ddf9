//! Image metadata storage.
//!
//! [`ImageStore`] is the relational side of listing images: one row per
//! image, keyed by forklift. [`SqliteImageStore`] implements it on top of
//! rusqlite.

use crate::models::{ImageMetadataPayload, ListingImage};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

/// Error type for metadata operations
#[derive(Debug)]
pub enum StoreError {
    DatabaseError(rusqlite::Error),
    NotFound(String),
    Other(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::DatabaseError(e) => write!(f, "Database error: {}", e),
            StoreError::NotFound(msg) => write!(f, "Not found: {}", msg),
            StoreError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::DatabaseError(err)
    }
}

/// Table of image records keyed by forklift
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Writes all records of the payload in one batch
    async fn insert_many(
        &self,
        payload: &ImageMetadataPayload,
    ) -> Result<Vec<ListingImage>, StoreError>;

    /// Marks `url` primary and every sibling non-primary in one statement
    async fn set_primary(&self, forklift_id: &Uuid, url: &str) -> Result<(), StoreError>;

    /// Deletes the record with `url` and returns it
    async fn delete_by_url(&self, forklift_id: &Uuid, url: &str)
        -> Result<ListingImage, StoreError>;

    /// All records of a forklift ordered by sort order
    async fn list(&self, forklift_id: &Uuid) -> Result<Vec<ListingImage>, StoreError>;
}

fn row_to_image(row: &Row) -> rusqlite::Result<ListingImage> {
    let id_str: String = row.get(0)?;
    Ok(ListingImage {
        id: Uuid::parse_str(&id_str).ok(),
        url: row.get(1)?,
        alt_text: row.get(2)?,
        is_primary: row.get(3)?,
        sort_order: row.get(4)?,
    })
}

/// SQLite backed [`ImageStore`]
#[derive(Clone)]
pub struct SqliteImageStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteImageStore {
    /// Wraps a connection whose schema is already initialised
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// In-memory store with a fresh schema
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        crate::schema::init_listing_images_schema(&conn)?;
        Ok(Self::new(Arc::new(Mutex::new(conn))))
    }

    fn connection(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn list_sync(conn: &Connection, forklift_id: &Uuid) -> Result<Vec<ListingImage>, StoreError> {
        let mut stmt = conn.prepare(
            "SELECT id, image_url, alt_text, is_primary, sort_order
             FROM forklift_images
             WHERE forklift_id = ?1
             ORDER BY sort_order ASC, created_at ASC",
        )?;

        let rows = stmt.query_map(params![forklift_id.to_string()], row_to_image)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

#[async_trait]
impl ImageStore for SqliteImageStore {
    async fn insert_many(
        &self,
        payload: &ImageMetadataPayload,
    ) -> Result<Vec<ListingImage>, StoreError> {
        let mut conn = self.connection();
        let tx = conn.transaction()?;
        let forklift_id = payload.forklift_id.to_string();
        let mut inserted = Vec::with_capacity(payload.images.len());

        for image in &payload.images {
            if image.is_primary {
                tx.execute(
                    "UPDATE forklift_images SET is_primary = 0 WHERE forklift_id = ?1",
                    params![forklift_id],
                )?;
            }

            let id = Uuid::new_v4();
            tx.execute(
                "INSERT INTO forklift_images (id, forklift_id, image_url, alt_text, is_primary, sort_order)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    id.to_string(),
                    forklift_id,
                    image.image_url,
                    image.alt_text,
                    image.is_primary,
                    image.sort_order,
                ],
            )?;

            inserted.push(ListingImage {
                id: Some(id),
                url: image.image_url.clone(),
                alt_text: image.alt_text.clone(),
                is_primary: image.is_primary,
                sort_order: image.sort_order,
            });
        }

        tx.commit()?;
        log::info!(
            "Saved {} image record(s) for forklift {}",
            inserted.len(),
            payload.forklift_id
        );
        Ok(inserted)
    }

    async fn set_primary(&self, forklift_id: &Uuid, url: &str) -> Result<(), StoreError> {
        let mut conn = self.connection();
        let tx = conn.transaction()?;

        let exists: Option<String> = tx
            .query_row(
                "SELECT id FROM forklift_images WHERE forklift_id = ?1 AND image_url = ?2",
                params![forklift_id.to_string(), url],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_none() {
            return Err(StoreError::NotFound(format!("Image {}", url)));
        }

        tx.execute(
            "UPDATE forklift_images SET is_primary = (image_url = ?2) WHERE forklift_id = ?1",
            params![forklift_id.to_string(), url],
        )?;
        tx.commit()?;

        log::info!("Primary image of forklift {} is now {}", forklift_id, url);
        Ok(())
    }

    async fn delete_by_url(
        &self,
        forklift_id: &Uuid,
        url: &str,
    ) -> Result<ListingImage, StoreError> {
        let mut conn = self.connection();
        let tx = conn.transaction()?;

        let image = tx
            .query_row(
                "SELECT id, image_url, alt_text, is_primary, sort_order
                 FROM forklift_images WHERE forklift_id = ?1 AND image_url = ?2",
                params![forklift_id.to_string(), url],
                row_to_image,
            )
            .optional()?
            .ok_or_else(|| StoreError::NotFound(format!("Image {}", url)))?;

        tx.execute(
            "DELETE FROM forklift_images WHERE forklift_id = ?1 AND image_url = ?2",
            params![forklift_id.to_string(), url],
        )?;
        tx.commit()?;

        Ok(image)
    }

    async fn list(&self, forklift_id: &Uuid) -> Result<Vec<ListingImage>, StoreError> {
        let conn = self.connection();
        Self::list_sync(&conn, forklift_id)
    }
}
