//! Local preview URLs for files that have not been uploaded yet.
//!
//! Every handle handed out by [`PreviewManager::create`] must be released
//! exactly once. Releasing an unknown or already released handle is a no-op.

use crate::validation::SelectedFile;
use base64::Engine;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

/// Opaque reference to a registered preview
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PreviewHandle(Uuid);

impl PreviewHandle {
    pub fn id(&self) -> Uuid {
        self.0
    }
}

#[derive(Debug, Default)]
struct Registry {
    urls: HashMap<Uuid, String>,
    created: usize,
    released: usize,
}

/// Shared registry of preview data URLs
#[derive(Debug, Clone, Default)]
pub struct PreviewManager {
    inner: Arc<Mutex<Registry>>,
}

impl PreviewManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Registers a `data:` URL for the file and returns its handle
    pub fn create(&self, file: &SelectedFile) -> PreviewHandle {
        let b64 = base64::engine::general_purpose::STANDARD.encode(&file.bytes);
        let url = format!("data:{};base64,{}", file.mime_type, b64);
        let id = Uuid::new_v4();

        let mut registry = self.registry();
        registry.urls.insert(id, url);
        registry.created += 1;
        log::debug!("Preview {} created for {}", id, file.name);

        PreviewHandle(id)
    }

    /// Returns the URL of a live preview
    pub fn url(&self, handle: &PreviewHandle) -> Option<String> {
        self.registry().urls.get(&handle.0).cloned()
    }

    /// Releases a preview; repeated calls are ignored
    pub fn release(&self, handle: &PreviewHandle) {
        let mut registry = self.registry();
        if registry.urls.remove(&handle.0).is_some() {
            registry.released += 1;
            log::debug!("Preview {} released", handle.0);
        } else {
            log::debug!("Preview {} already released", handle.0);
        }
    }

    pub fn created(&self) -> usize {
        self.registry().created
    }

    pub fn released(&self) -> usize {
        self.registry().released
    }

    /// Number of previews that still hold memory
    pub fn live(&self) -> usize {
        self.registry().urls.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_builds_data_url() {
        let previews = PreviewManager::new();
        let handle = previews.create(&SelectedFile::new("a.png", "image/png", vec![1, 2, 3]));

        assert_eq!(previews.url(&handle).unwrap(), "data:image/png;base64,AQID");
        assert_eq!(previews.live(), 1);
    }

    #[test]
    fn test_release_is_idempotent() {
        let previews = PreviewManager::new();
        let handle = previews.create(&SelectedFile::new("a.png", "image/png", vec![0]));

        previews.release(&handle);
        previews.release(&handle);

        assert_eq!(previews.created(), 1);
        assert_eq!(previews.released(), 1);
        assert_eq!(previews.live(), 0);
        assert!(previews.url(&handle).is_none());
    }

    #[test]
    fn test_clones_share_registry() {
        let previews = PreviewManager::new();
        let other = previews.clone();
        let handle = previews.create(&SelectedFile::new("a.webp", "image/webp", vec![0]));

        other.release(&handle);
        assert_eq!(previews.live(), 0);
    }
}
