use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// A persisted image belonging to one listing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListingImage {
    /// None until the metadata row has been written
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt_text: Option<String>,
    pub is_primary: bool,
    pub sort_order: i32,
}

impl ListingImage {
    pub fn new(url: impl Into<String>, is_primary: bool, sort_order: i32) -> Self {
        Self {
            id: None,
            url: url.into(),
            alt_text: None,
            is_primary,
            sort_order,
        }
    }
}

/// One image entry of the batch metadata write
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageMetadata {
    pub image_url: String,
    pub alt_text: Option<String>,
    pub is_primary: bool,
    pub sort_order: i32,
}

/// Payload of the batch metadata write:
/// `{forklift_id, images: [{image_url, alt_text, is_primary, sort_order}]}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageMetadataPayload {
    pub forklift_id: Uuid,
    pub images: Vec<ImageMetadata>,
}

impl ImageMetadataPayload {
    /// Listing images as they should render before the rows exist
    pub fn to_images(&self) -> Vec<ListingImage> {
        self.images
            .iter()
            .map(|m| ListingImage {
                id: None,
                url: m.image_url.clone(),
                alt_text: m.alt_text.clone(),
                is_primary: m.is_primary,
                sort_order: m.sort_order,
            })
            .collect()
    }
}

/// Configuration for listing image management
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ListingImagesConfig {
    /// Maximum images (persisted + pending) per listing
    pub max_images: usize,
    /// Size limit applied when files are picked
    pub selection_max_bytes: u64,
    /// Size limit applied right before upload
    pub upload_max_bytes: u64,
    /// Bounding box for compressed images
    pub max_width: u32,
    pub max_height: u32,
    /// JPEG quality (1-100)
    pub jpeg_quality: u8,
    /// How long a success message stays visible
    #[serde(with = "duration_secs")]
    pub success_clear_delay: Duration,
}

impl Default for ListingImagesConfig {
    fn default() -> Self {
        Self {
            max_images: 3,
            selection_max_bytes: crate::validation::SELECTION_MAX_BYTES,
            upload_max_bytes: crate::validation::UPLOAD_MAX_BYTES,
            max_width: 1920,
            max_height: 1080,
            jpeg_quality: 80,
            success_clear_delay: Duration::from_secs(5),
        }
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(d)?))
    }
}
