//! File checks applied before anything is queued or uploaded.

use std::path::Path;

/// Image types accepted for listings
pub const ALLOWED_MIME_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp"];

/// Limit applied when files are picked (5 MB)
pub const SELECTION_MAX_BYTES: u64 = 5 * 1024 * 1024;

/// Limit applied by the upload path (10 MB)
pub const UPLOAD_MAX_BYTES: u64 = 10 * 1024 * 1024;

/// A file picked by the user, not yet queued
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedFile {
    pub name: String,
    pub mime_type: String,
    pub size: u64,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            size: bytes.len() as u64,
            bytes,
        }
    }

    /// Reads a file from disk, guessing its MIME type from the extension
    pub fn from_path(path: &Path) -> Result<Self, std::io::Error> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("image")
            .to_string();
        Ok(Self::new(name, guess_mime_from_ext(path), bytes))
    }

    /// Two selections are duplicates when name and size match
    pub fn same_file(&self, other: &SelectedFile) -> bool {
        self.name == other.name && self.size == other.size
    }
}

/// Determines a MIME type from the file extension
pub fn guess_mime_from_ext(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_ascii_lowercase())
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        Some("heic") | Some("heif") => "image/heic",
        _ => "application/octet-stream",
    }
}

/// Why a file was not accepted
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    UnsupportedType { name: String, mime_type: String },
    TooLarge { name: String, size: u64, max_bytes: u64 },
    Duplicate { name: String },
    CapacityReached { dropped: usize, max_total: usize },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::UnsupportedType { name, mime_type } => write!(
                f,
                "{}: unsupported file type {} (allowed: JPEG, PNG, WebP)",
                name, mime_type
            ),
            ValidationError::TooLarge {
                name,
                size,
                max_bytes,
            } => write!(
                f,
                "{}: file is too large ({:.1} MB, maximum {} MB)",
                name,
                *size as f64 / (1024.0 * 1024.0),
                max_bytes / (1024 * 1024)
            ),
            ValidationError::Duplicate { name } => {
                write!(f, "{}: this file has already been selected", name)
            }
            ValidationError::CapacityReached { dropped, max_total } => write!(
                f,
                "Only {} images are allowed per forklift; {} file(s) were not added",
                max_total, dropped
            ),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Checks MIME type and size of a file
pub fn validate_image(file: &SelectedFile, max_bytes: u64) -> Result<(), ValidationError> {
    if !ALLOWED_MIME_TYPES.contains(&file.mime_type.as_str()) {
        return Err(ValidationError::UnsupportedType {
            name: file.name.clone(),
            mime_type: file.mime_type.clone(),
        });
    }

    if file.size > max_bytes {
        return Err(ValidationError::TooLarge {
            name: file.name.clone(),
            size: file.size,
            max_bytes,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(mime: &str, size: u64) -> SelectedFile {
        SelectedFile {
            name: "photo.jpg".to_string(),
            mime_type: mime.to_string(),
            size,
            bytes: Vec::new(),
        }
    }

    #[test]
    fn test_accepts_allowed_types() {
        for mime in ALLOWED_MIME_TYPES {
            assert!(validate_image(&file(mime, 1024), SELECTION_MAX_BYTES).is_ok());
        }
    }

    #[test]
    fn test_rejects_other_types() {
        let err = validate_image(&file("image/gif", 1024), SELECTION_MAX_BYTES).unwrap_err();
        assert!(matches!(err, ValidationError::UnsupportedType { .. }));
        assert!(err.to_string().contains("image/gif"));
    }

    #[test]
    fn test_limits_differ_per_path() {
        let seven_mb = file("image/png", 7 * 1024 * 1024);
        assert!(matches!(
            validate_image(&seven_mb, SELECTION_MAX_BYTES),
            Err(ValidationError::TooLarge { .. })
        ));
        assert!(validate_image(&seven_mb, UPLOAD_MAX_BYTES).is_ok());

        let eleven_mb = file("image/png", 11 * 1024 * 1024);
        assert!(validate_image(&eleven_mb, UPLOAD_MAX_BYTES).is_err());
    }

    #[test]
    fn test_exact_limit_is_accepted() {
        assert!(validate_image(&file("image/webp", SELECTION_MAX_BYTES), SELECTION_MAX_BYTES).is_ok());
    }

    #[test]
    fn test_guess_mime() {
        assert_eq!(guess_mime_from_ext(Path::new("a/B.JPG")), "image/jpeg");
        assert_eq!(guess_mime_from_ext(Path::new("x.webp")), "image/webp");
        assert_eq!(guess_mime_from_ext(Path::new("x")), "application/octet-stream");
    }
}
