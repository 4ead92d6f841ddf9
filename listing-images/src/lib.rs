//! # Listing Images
//!
//! Image management for product listings (forklifts): picking files,
//! previewing them, compressing and uploading them, and keeping exactly one
//! primary image per listing.
//!
//! The crate is split into small layers:
//! - Validation and the selection queue decide what may be uploaded
//! - Blob storage holds the bytes, the metadata store holds the records
//! - The upload pipeline and the primary-image functions talk to both
//! - [`ImageManager`] ties it together around a pure reducer
//!
//! A TTL cache for editable page content lives in [`content`].
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use listing_images::{ImageManager, ListingImagesConfig, LocalBlobStore, SqliteImageStore};
//! use std::sync::Arc;
//!
//! let blobs = Arc::new(LocalBlobStore::new("/srv/media", "https://cdn.example.com/media"));
//! let store = Arc::new(SqliteImageStore::new(conn));
//! let manager = ImageManager::new(Some(forklift_id), blobs, store, ListingImagesConfig::default());
//!
//! manager.refresh().await?;
//! manager.add_files(files);
//! manager.upload_all_files().await?;
//! ```

pub mod compress;
pub mod content;
pub mod manager;
pub mod models;
pub mod preview;
pub mod primary;
pub mod schema;
pub mod selection;
pub mod state;
pub mod storage;
pub mod store;
pub mod upload;
pub mod validation;

#[cfg(feature = "components")]
pub mod components;

#[cfg(test)]
mod testing;

pub use compress::{calculate_resize_dimensions, compress_image, CompressError};
pub use content::{
    Clock, ContentCache, ContentError, ManualClock, PageContent, PageContentService,
    PageContentStore, SystemClock, DEFAULT_CONTENT_TTL,
};
pub use manager::{ImageManager, ImageManagerError};
pub use models::{ImageMetadata, ImageMetadataPayload, ListingImage, ListingImagesConfig};
pub use preview::{PreviewHandle, PreviewManager};
pub use schema::init_listing_images_schema;
pub use selection::{Admission, PendingSelection, SelectionQueue};
pub use state::{reduce, Action, ImageManagerState};
pub use storage::{blob_path, BlobStore, LocalBlobStore, StorageError};
pub use store::{ImageStore, SqliteImageStore, StoreError};
pub use upload::{UploadError, UploadPipeline, UploadReport, UploadResult};
pub use validation::{
    validate_image, SelectedFile, ValidationError, ALLOWED_MIME_TYPES, SELECTION_MAX_BYTES,
    UPLOAD_MAX_BYTES,
};

#[cfg(feature = "webdav")]
pub use storage::{WebDavBlobStore, WebDavConfig};

#[cfg(feature = "components")]
pub use components::{use_image_manager, ListingImageCard, PendingImageCard};
