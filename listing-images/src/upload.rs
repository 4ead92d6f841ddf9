//! Upload of pending selections.
//!
//! Files are compressed and uploaded one after another. Only when every blob
//! is stored is the metadata written, in a single batch. A failed metadata
//! write does not undo the uploads: the caller gets the URLs together with a
//! warning so the images can still be shown.

use crate::compress::{compress_image_blocking, CompressError};
use crate::models::{ImageMetadata, ImageMetadataPayload, ListingImage, ListingImagesConfig};
use crate::primary;
use crate::selection::PendingSelection;
use crate::storage::{blob_path, BlobStore, StorageError};
use crate::store::ImageStore;
use crate::validation::{validate_image, ValidationError};
use std::sync::Arc;
use uuid::Uuid;

/// Result type for upload operations
pub type UploadResult<T> = Result<T, UploadError>;

/// Errors that abort an upload
#[derive(Debug)]
pub enum UploadError {
    /// The forklift has not been saved yet
    MissingParent,
    NothingToUpload,
    Invalid(ValidationError),
    Compress {
        name: String,
        source: CompressError,
        /// URLs stored before the failure; they are not cleaned up
        uploaded: Vec<String>,
    },
    Blob {
        name: String,
        source: StorageError,
        uploaded: Vec<String>,
    },
}

impl std::fmt::Display for UploadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UploadError::MissingParent => {
                write!(f, "Please save the forklift first before uploading images")
            }
            UploadError::NothingToUpload => write!(f, "No images selected for upload"),
            UploadError::Invalid(e) => write!(f, "{}", e),
            UploadError::Compress { name, source, .. } => {
                write!(f, "Could not process {}: {}", name, source)
            }
            UploadError::Blob { name, source, .. } => {
                write!(f, "Upload of {} failed: {}", name, source)
            }
        }
    }
}

impl std::error::Error for UploadError {}

impl From<ValidationError> for UploadError {
    fn from(err: ValidationError) -> Self {
        UploadError::Invalid(err)
    }
}

impl UploadError {
    /// Blobs that were stored before the upload aborted
    pub fn orphaned_urls(&self) -> &[String] {
        match self {
            UploadError::Compress { uploaded, .. } | UploadError::Blob { uploaded, .. } => uploaded,
            _ => &[],
        }
    }
}

/// Outcome of a completed upload
#[derive(Debug, Clone, PartialEq)]
pub struct UploadReport {
    /// Saved records, or the optimistic records if metadata was not saved
    pub images: Vec<ListingImage>,
    /// Set when the blobs are stored but the metadata write failed
    pub metadata_error: Option<String>,
}

impl UploadReport {
    pub fn is_partial(&self) -> bool {
        self.metadata_error.is_some()
    }
}

pub struct UploadPipeline {
    blobs: Arc<dyn BlobStore>,
    store: Arc<dyn ImageStore>,
    config: ListingImagesConfig,
}

impl UploadPipeline {
    pub fn new(
        blobs: Arc<dyn BlobStore>,
        store: Arc<dyn ImageStore>,
        config: ListingImagesConfig,
    ) -> Self {
        Self {
            blobs,
            store,
            config,
        }
    }

    /// Compresses and uploads `files` in order, then writes their metadata.
    ///
    /// New records are numbered from `first_sort_order` on.
    pub async fn upload_all(
        &self,
        forklift_id: Option<Uuid>,
        files: &[PendingSelection],
        first_sort_order: i32,
    ) -> UploadResult<UploadReport> {
        let forklift_id = forklift_id.ok_or(UploadError::MissingParent)?;
        if files.is_empty() {
            return Err(UploadError::NothingToUpload);
        }

        for pending in files {
            validate_image(&pending.file, self.config.upload_max_bytes)?;
        }

        log::info!(
            "Uploading {} image(s) for forklift {}",
            files.len(),
            forklift_id
        );

        let mut uploaded: Vec<String> = Vec::with_capacity(files.len());
        for pending in files {
            let name = pending.file.name.clone();
            log::debug!("Compressing {} ({} bytes)", name, pending.file.size);

            let compressed = match compress_image_blocking(
                pending.file.bytes.clone(),
                self.config.max_width,
                self.config.max_height,
                self.config.jpeg_quality,
            )
            .await
            {
                Ok(bytes) => bytes,
                Err(source) => {
                    log::error!("Compression of {} failed: {}", name, source);
                    return Err(UploadError::Compress {
                        name,
                        source,
                        uploaded,
                    });
                }
            };

            let path = blob_path(
                &forklift_id,
                &name,
                chrono::Utc::now().timestamp_millis(),
                &Uuid::new_v4(),
            );
            match self.blobs.upload(&path, compressed, "image/jpeg").await {
                Ok(url) => {
                    log::debug!("Uploaded {} to {}", name, url);
                    uploaded.push(url);
                }
                Err(source) => {
                    log::error!("Upload of {} failed: {}", name, source);
                    if !uploaded.is_empty() {
                        log::warn!("{} blob(s) left without metadata", uploaded.len());
                    }
                    return Err(UploadError::Blob {
                        name,
                        source,
                        uploaded,
                    });
                }
            }
        }

        let payload = ImageMetadataPayload {
            forklift_id,
            images: files
                .iter()
                .zip(uploaded)
                .map(|(pending, url)| ImageMetadata {
                    image_url: url,
                    alt_text: alt_text_for(&pending.file.name),
                    is_primary: pending.is_primary,
                    sort_order: first_sort_order + pending.sort_order,
                })
                .collect(),
        };

        let saved = match self.store.insert_many(&payload).await {
            Ok(saved) => saved,
            Err(e) => {
                log::warn!(
                    "Images uploaded for forklift {} but metadata not saved: {}",
                    forklift_id,
                    e
                );
                return Ok(UploadReport {
                    images: payload.to_images(),
                    metadata_error: Some(format!("Images uploaded, but metadata not saved: {}", e)),
                });
            }
        };

        let preferred = saved.iter().find(|i| i.is_primary).map(|i| i.url.clone());
        if let Err(e) = primary::reconcile(self.store.as_ref(), &forklift_id, preferred.as_deref()).await {
            log::error!("Could not reconcile primary image of {}: {}", forklift_id, e);
            return Ok(UploadReport {
                images: saved,
                metadata_error: Some(format!(
                    "Images saved, but the primary image could not be updated: {}",
                    e
                )),
            });
        }

        log::info!("Upload for forklift {} complete", forklift_id);
        Ok(UploadReport {
            images: saved,
            metadata_error: None,
        })
    }
}

/// Alt text derived from the original file name
fn alt_text_for(name: &str) -> Option<String> {
    let stem = std::path::Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())?
        .replace(['_', '-'], " ");
    let stem = stem.trim();
    if stem.is_empty() {
        None
    } else {
        Some(stem.to_string())
    }
}
