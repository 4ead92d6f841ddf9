//! Image manager: runs the backend calls around the pure reducer.
//!
//! State lives in a `tokio::sync::watch` channel so any number of views can
//! subscribe. Every mutation goes through [`reduce`]; the methods here only
//! decide which actions to dispatch once the backend has answered.

use crate::models::{ListingImage, ListingImagesConfig};
use crate::preview::{PreviewHandle, PreviewManager};
use crate::primary;
use crate::selection::PendingSelection;
use crate::state::{reduce, Action, ImageManagerState};
use crate::storage::BlobStore;
use crate::store::{ImageStore, StoreError};
use crate::upload::{UploadError, UploadPipeline, UploadReport};
use crate::validation::SelectedFile;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::watch;
use uuid::Uuid;

/// Errors reported by [`ImageManager`] operations
#[derive(Debug)]
pub enum ImageManagerError {
    /// The same operation is already running
    Busy,
    MissingParent,
    Upload(UploadError),
    Store(StoreError),
}

impl std::fmt::Display for ImageManagerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImageManagerError::Busy => write!(f, "Operation already in progress"),
            ImageManagerError::MissingParent => write!(f, "{}", UploadError::MissingParent),
            ImageManagerError::Upload(e) => write!(f, "{}", e),
            ImageManagerError::Store(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ImageManagerError {}

impl From<UploadError> for ImageManagerError {
    fn from(err: UploadError) -> Self {
        ImageManagerError::Upload(err)
    }
}

impl From<StoreError> for ImageManagerError {
    fn from(err: StoreError) -> Self {
        ImageManagerError::Store(err)
    }
}

#[derive(Debug, Clone, Copy)]
enum Busy {
    Uploading,
    Deleting,
    SettingPrimary,
}

impl Busy {
    fn is_set(self, state: &ImageManagerState) -> bool {
        match self {
            Busy::Uploading => state.is_uploading,
            Busy::Deleting => state.is_deleting,
            Busy::SettingPrimary => state.is_setting_primary,
        }
    }

    fn action(self, flag: bool) -> Action {
        match self {
            Busy::Uploading => Action::SetUploading(flag),
            Busy::Deleting => Action::SetDeleting(flag),
            Busy::SettingPrimary => Action::SetSettingPrimary(flag),
        }
    }
}

struct Inner {
    state: watch::Sender<ImageManagerState>,
    previews: PreviewManager,
    pipeline: UploadPipeline,
    blobs: Arc<dyn BlobStore>,
    store: Arc<dyn ImageStore>,
    config: ListingImagesConfig,
    success_generation: AtomicU64,
}

impl Inner {
    fn dispatch(&self, action: Action) {
        self.state.send_modify(|state| {
            let current = std::mem::take(state);
            *state = reduce(current, action);
        });
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        let state = self.state.borrow();
        for entry in state.upload_files.entries() {
            self.previews.release(&entry.preview);
        }
    }
}

/// Cloneable handle to the image manager of one forklift
#[derive(Clone)]
pub struct ImageManager {
    inner: Arc<Inner>,
}

impl ImageManager {
    pub fn new(
        forklift_id: Option<Uuid>,
        blobs: Arc<dyn BlobStore>,
        store: Arc<dyn ImageStore>,
        config: ListingImagesConfig,
    ) -> Self {
        let (state, _) = watch::channel(ImageManagerState::new(forklift_id, config.max_images));
        let pipeline = UploadPipeline::new(blobs.clone(), store.clone(), config.clone());

        Self {
            inner: Arc::new(Inner {
                state,
                previews: PreviewManager::new(),
                pipeline,
                blobs,
                store,
                config,
                success_generation: AtomicU64::new(0),
            }),
        }
    }

    /// Current state
    pub fn snapshot(&self) -> ImageManagerState {
        self.inner.state.borrow().clone()
    }

    /// Receiver notified on every state change
    pub fn subscribe(&self) -> watch::Receiver<ImageManagerState> {
        self.inner.state.subscribe()
    }

    pub fn previews(&self) -> &PreviewManager {
        &self.inner.previews
    }

    /// Preview URL of a pending selection
    pub fn preview_url(&self, handle: &PreviewHandle) -> Option<String> {
        self.inner.previews.url(handle)
    }

    pub fn available_slots(&self) -> usize {
        self.inner.state.borrow().available_slots()
    }

    pub fn can_add_more(&self) -> bool {
        self.inner.state.borrow().can_add_more()
    }

    fn dispatch(&self, action: Action) {
        self.inner.dispatch(action);
    }

    /// Sets the busy flag unless it is already set
    fn try_begin(&self, busy: Busy) -> bool {
        self.inner.state.send_if_modified(|state| {
            if busy.is_set(state) {
                false
            } else {
                let current = std::mem::take(state);
                *state = reduce(current, busy.action(true));
                true
            }
        })
    }

    fn finish(&self, busy: Busy) {
        self.dispatch(busy.action(false));
    }

    fn set_error(&self, message: String) {
        log::error!("{}", message);
        self.dispatch(Action::SetError(message));
    }

    /// Shows a success message and clears it after the configured delay
    /// unless a newer one replaced it
    fn set_success(&self, message: String) {
        let generation = self.inner.success_generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.dispatch(Action::SetSuccess(message));

        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let delay = self.inner.config.success_clear_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(inner) = weak.upgrade() {
                if inner.success_generation.load(Ordering::SeqCst) == generation {
                    inner.dispatch(Action::ClearSuccess);
                }
            }
        });
    }

    /// Records the id once the forklift has been saved
    pub fn set_forklift(&self, forklift_id: Option<Uuid>) {
        self.dispatch(Action::SetForklift(forklift_id));
    }

    pub fn set_images(&self, images: Vec<ListingImage>) {
        self.dispatch(Action::SetImages(images));
    }

    /// Reloads the persisted images of the forklift
    pub async fn refresh(&self) -> Result<(), ImageManagerError> {
        let forklift_id = self
            .inner
            .state
            .borrow()
            .forklift_id
            .ok_or(ImageManagerError::MissingParent)?;

        match self.inner.store.list(&forklift_id).await {
            Ok(images) => {
                self.set_images(images);
                Ok(())
            }
            Err(e) => {
                self.set_error(format!("Could not load images: {}", e));
                Err(e.into())
            }
        }
    }

    /// Validates and queues files. Returns how many were added; rejection
    /// reasons end up in the error message.
    pub fn add_files(&self, files: Vec<SelectedFile>) -> usize {
        let previews = &self.inner.previews;
        let max_bytes = self.inner.config.selection_max_bytes;
        let mut added = 0;
        let mut message = None;

        self.inner.state.send_modify(|state| {
            let admission =
                state
                    .upload_files
                    .admit(files, state.images.len(), state.max_images, max_bytes);
            message = admission.message();

            let entries: Vec<(SelectedFile, PreviewHandle)> = admission
                .accepted
                .into_iter()
                .map(|file| {
                    let handle = previews.create(&file);
                    (file, handle)
                })
                .collect();
            added = entries.len();

            let mut next = reduce(std::mem::take(state), Action::AddFiles(entries));
            if let Some(reason) = &message {
                next = reduce(next, Action::SetError(reason.clone()));
            }
            *state = next;
        });

        if let Some(reason) = message {
            log::debug!("Rejected files: {}", reason);
        }
        added
    }

    pub fn remove_upload_file(&self, index: usize) {
        let handle = self
            .inner
            .state
            .borrow()
            .upload_files
            .entries()
            .get(index)
            .map(|e| e.preview.clone());

        if let Some(handle) = handle {
            self.dispatch(Action::RemoveFile(index));
            self.inner.previews.release(&handle);
        }
    }

    pub fn set_primary_upload_file(&self, index: usize) {
        self.dispatch(Action::SetPrimaryFile(index));
    }

    pub fn clear_upload_files(&self) {
        let handles = self.pending_handles();
        self.dispatch(Action::ClearFiles);
        for handle in &handles {
            self.inner.previews.release(handle);
        }
    }

    fn pending_handles(&self) -> Vec<PreviewHandle> {
        self.inner
            .state
            .borrow()
            .upload_files
            .entries()
            .iter()
            .map(|e| e.preview.clone())
            .collect()
    }

    pub fn clear_error(&self) {
        self.dispatch(Action::ClearError);
    }

    pub fn clear_success(&self) {
        self.dispatch(Action::ClearSuccess);
    }

    /// Uploads every queued file.
    ///
    /// A failed metadata write still returns the report; the state then
    /// carries a warning in `error` and shows the uploaded images.
    pub async fn upload_all_files(&self) -> Result<UploadReport, ImageManagerError> {
        let (forklift_id, files, persisted, first_sort_order): (
            Option<Uuid>,
            Vec<PendingSelection>,
            Vec<ListingImage>,
            i32,
        ) = {
            let state = self.inner.state.borrow();
            (
                state.forklift_id,
                state.upload_files.entries().to_vec(),
                state.images.clone(),
                state.next_sort_order(),
            )
        };

        if forklift_id.is_none() {
            self.set_error(UploadError::MissingParent.to_string());
            return Err(ImageManagerError::MissingParent);
        }
        if !self.try_begin(Busy::Uploading) {
            log::debug!("Upload already running");
            return Err(ImageManagerError::Busy);
        }

        let result = self
            .inner
            .pipeline
            .upload_all(forklift_id, &files, first_sort_order)
            .await;

        let outcome = match result {
            Ok(report) => {
                let handles: Vec<PreviewHandle> = files.iter().map(|f| f.preview.clone()).collect();
                self.dispatch(Action::DiscardFiles(handles.clone()));
                for handle in &handles {
                    self.inner.previews.release(handle);
                }

                match &report.metadata_error {
                    None => {
                        let images = match forklift_id {
                            Some(id) => self.inner.store.list(&id).await.ok(),
                            None => None,
                        };
                        self.set_images(images.unwrap_or_else(|| merge(&persisted, &report.images)));
                        self.set_success(format!("{} image(s) uploaded", report.images.len()));
                    }
                    Some(warning) => {
                        log::warn!("{}", warning);
                        self.set_images(merge(&persisted, &report.images));
                        self.dispatch(Action::SetError(warning.clone()));
                    }
                }
                Ok(report)
            }
            Err(e) => {
                let message = e.to_string();
                self.dispatch(Action::MarkFilesFailed(message.clone()));
                self.set_error(message);
                Err(e.into())
            }
        };

        self.finish(Busy::Uploading);
        outcome
    }

    /// Deletes a persisted image and its blob
    pub async fn delete_image(&self, url: &str) -> Result<(), ImageManagerError> {
        let forklift_id = self
            .inner
            .state
            .borrow()
            .forklift_id
            .ok_or(ImageManagerError::MissingParent)?;

        if !self.try_begin(Busy::Deleting) {
            log::debug!("Delete already running");
            return Err(ImageManagerError::Busy);
        }

        let result = primary::delete(
            self.inner.store.as_ref(),
            self.inner.blobs.as_ref(),
            &forklift_id,
            url,
        )
        .await;

        let outcome = match result {
            Ok(deleted) => {
                self.dispatch(Action::RemoveImage(url.to_string()));
                match deleted.warning {
                    Some(warning) => {
                        if let Ok(images) = self.inner.store.list(&forklift_id).await {
                            self.set_images(images);
                        }
                        self.dispatch(Action::SetError(warning));
                    }
                    None => {
                        if let Some(promoted) = deleted.promoted {
                            self.dispatch(Action::SetPrimaryImage(promoted));
                        }
                        self.set_success("Image deleted".to_string());
                    }
                }
                Ok(())
            }
            Err(e) => {
                self.set_error(format!("Could not delete image: {}", e));
                Err(e.into())
            }
        };

        self.finish(Busy::Deleting);
        outcome
    }

    /// Makes a persisted image the primary one
    pub async fn set_primary_image(&self, url: &str) -> Result<(), ImageManagerError> {
        let forklift_id = self
            .inner
            .state
            .borrow()
            .forklift_id
            .ok_or(ImageManagerError::MissingParent)?;

        if !self.try_begin(Busy::SettingPrimary) {
            log::debug!("Primary update already running");
            return Err(ImageManagerError::Busy);
        }

        let outcome = match primary::promote(self.inner.store.as_ref(), &forklift_id, url).await {
            Ok(()) => {
                self.dispatch(Action::SetPrimaryImage(url.to_string()));
                self.set_success("Primary image updated".to_string());
                Ok(())
            }
            Err(e) => {
                self.set_error(format!("Could not set primary image: {}", e));
                Err(e.into())
            }
        };

        self.finish(Busy::SettingPrimary);
        outcome
    }

    /// Releases all previews and returns to the initial state
    pub fn reset(&self) {
        let handles = self.pending_handles();
        self.dispatch(Action::Reset);
        for handle in &handles {
            self.inner.previews.release(handle);
        }
    }
}

/// Existing images followed by new ones; a new primary takes over
fn merge(existing: &[ListingImage], added: &[ListingImage]) -> Vec<ListingImage> {
    let mut images: Vec<ListingImage> = existing.iter().chain(added).cloned().collect();
    match added.iter().find(|i| i.is_primary).map(|i| i.url.clone()) {
        Some(url) => primary::apply_promote(&mut images, &url),
        None => primary::normalize(&mut images),
    };
    images
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compress::tests::png_bytes;
    use crate::testing::{FlakyImageStore, MemoryBlobStore};
    use std::time::Duration;

    struct Fixture {
        manager: ImageManager,
        blobs: Arc<MemoryBlobStore>,
        store: Arc<FlakyImageStore>,
    }

    fn fixture(forklift_id: Option<Uuid>) -> Fixture {
        let blobs = Arc::new(MemoryBlobStore::default());
        let store = Arc::new(FlakyImageStore::new());
        let manager = ImageManager::new(
            forklift_id,
            blobs.clone(),
            store.clone(),
            ListingImagesConfig::default(),
        );
        Fixture {
            manager,
            blobs,
            store,
        }
    }

    fn png(name: &str) -> SelectedFile {
        SelectedFile::new(name, "image/png", png_bytes(6, 4))
    }

    #[tokio::test]
    async fn test_upload_two_files_end_to_end() {
        let id = Uuid::new_v4();
        let f = fixture(Some(id));
        assert_eq!(f.manager.add_files(vec![png("a.png"), png("b.png")]), 2);
        assert_eq!(f.manager.available_slots(), 1);

        let report = f.manager.upload_all_files().await.unwrap();
        assert_eq!(report.images.len(), 2);

        let state = f.manager.snapshot();
        assert!(state.upload_files.is_empty());
        assert!(!state.is_uploading);
        assert_eq!(state.images.len(), 2);
        assert!(state.images[0].is_primary);
        assert_eq!(state.images.iter().map(|i| i.sort_order).collect::<Vec<_>>(), vec![0, 1]);
        assert!(primary::invariant_holds(&state.images));
        assert_eq!(state.success_message.as_deref(), Some("2 image(s) uploaded"));
        assert_eq!(f.manager.previews().live(), 0);

        let persisted = f.store.list(&id).await.unwrap();
        assert_eq!(persisted.len(), 2);
        assert!(persisted[0].is_primary);
    }

    #[tokio::test]
    async fn test_upload_without_forklift() {
        let f = fixture(None);
        f.manager.add_files(vec![png("a.png")]);

        let err = f.manager.upload_all_files().await.unwrap_err();
        assert!(matches!(err, ImageManagerError::MissingParent));
        assert_eq!(f.blobs.calls(), 0);

        let state = f.manager.snapshot();
        assert!(state.error.unwrap().contains("save the forklift first"));
        assert_eq!(state.upload_files.len(), 1);
    }

    #[tokio::test]
    async fn test_metadata_failure_shows_images_with_warning() {
        let id = Uuid::new_v4();
        let f = fixture(Some(id));
        f.store
            .fail_insert
            .store(true, std::sync::atomic::Ordering::SeqCst);
        f.manager.add_files(vec![png("a.png")]);

        let report = f.manager.upload_all_files().await.unwrap();
        assert!(report.is_partial());

        let state = f.manager.snapshot();
        assert_eq!(state.images.len(), 1);
        assert!(state.error.unwrap().contains("metadata not saved"));
        assert!(state.success_message.is_none());
        assert!(!state.is_uploading);
    }

    #[tokio::test]
    async fn test_blob_failure_marks_pending_entries() {
        let f = fixture(Some(Uuid::new_v4()));
        *f.blobs.fail_on_upload.lock().unwrap() = Some(1);
        f.manager.add_files(vec![png("a.png"), png("b.png")]);

        assert!(f.manager.upload_all_files().await.is_err());
        let state = f.manager.snapshot();
        assert_eq!(state.upload_files.len(), 2);
        assert!(state
            .upload_files
            .entries()
            .iter()
            .all(|e| e.upload_error.is_some()));
        assert!(state.images.is_empty());
        assert!(!state.is_uploading);
    }

    #[tokio::test]
    async fn test_rejections_reported() {
        let f = fixture(Some(Uuid::new_v4()));
        let files = vec![
            png("a.png"),
            png("a.png"),
            SelectedFile::new("doc.pdf", "application/pdf", vec![1]),
            png("b.png"),
            png("c.png"),
            png("d.png"),
        ];

        assert_eq!(f.manager.add_files(files), 3);
        let state = f.manager.snapshot();
        let error = state.error.unwrap();
        assert!(error.contains("already been selected"));
        assert!(error.contains("unsupported file type"));
        assert!(error.contains("1 file(s) were not added"));
        assert!(!f.manager.can_add_more());
    }

    #[tokio::test]
    async fn test_previews_released_exactly_once() {
        let f = fixture(Some(Uuid::new_v4()));
        let previews = f.manager.previews().clone();

        f.manager.add_files(vec![png("a.png"), png("b.png")]);
        f.manager.remove_upload_file(0);
        f.manager.remove_upload_file(7);
        f.manager.add_files(vec![png("c.png"), png("d.png")]);
        f.manager.clear_upload_files();
        f.manager.clear_upload_files();
        f.manager.add_files(vec![png("e.png")]);
        f.manager.upload_all_files().await.unwrap();
        f.manager.add_files(vec![png("f.png")]);
        drop(f);

        assert_eq!(previews.created(), 6);
        assert_eq!(previews.released(), 6);
        assert_eq!(previews.live(), 0);
    }

    #[tokio::test]
    async fn test_remove_primary_pending_promotes_next() {
        let f = fixture(Some(Uuid::new_v4()));
        f.manager.add_files(vec![png("a.png"), png("b.png")]);
        f.manager.remove_upload_file(0);

        let state = f.manager.snapshot();
        assert_eq!(state.upload_files.len(), 1);
        assert!(state.upload_files.entries()[0].is_primary);

        f.manager.remove_upload_file(0);
        assert!(f.manager.snapshot().upload_files.is_empty());
    }

    async fn seeded(n: usize) -> (Fixture, Uuid) {
        let id = Uuid::new_v4();
        let f = fixture(Some(id));
        let files = (0..n).map(|i| png(&format!("{}.png", i))).collect();
        f.manager.add_files(files);
        f.manager.upload_all_files().await.unwrap();
        (f, id)
    }

    #[tokio::test]
    async fn test_delete_and_promote_keep_invariant() {
        let (f, id) = seeded(3).await;
        let urls: Vec<String> = f.manager.snapshot().images.iter().map(|i| i.url.clone()).collect();

        f.manager.set_primary_image(&urls[2]).await.unwrap();
        assert!(f.manager.snapshot().images[2].is_primary);

        f.manager.delete_image(&urls[2]).await.unwrap();
        let state = f.manager.snapshot();
        assert_eq!(state.images.len(), 2);
        assert!(primary::invariant_holds(&state.images));
        assert_eq!(state.primary_image().unwrap().url, urls[0]);
        assert_eq!(state.images, f.store.list(&id).await.unwrap());

        f.manager.delete_image(&urls[0]).await.unwrap();
        f.manager.delete_image(&urls[1]).await.unwrap();
        let state = f.manager.snapshot();
        assert!(state.images.is_empty());
        assert!(primary::invariant_holds(&state.images));
        assert_eq!(f.blobs.object_count(), 0);
    }

    #[tokio::test]
    async fn test_delete_with_unreadable_list_still_removes_image() {
        let (f, id) = seeded(2).await;
        let urls: Vec<String> = f.manager.snapshot().images.iter().map(|i| i.url.clone()).collect();
        f.store
            .fail_list
            .store(true, std::sync::atomic::Ordering::SeqCst);

        f.manager.delete_image(&urls[0]).await.unwrap();
        let state = f.manager.snapshot();
        assert_eq!(state.images.len(), 1);
        assert_eq!(state.images[0].url, urls[1]);
        assert!(state
            .error
            .unwrap()
            .starts_with("Image deleted, but no new primary image could be set"));
        assert!(state.success_message.is_none());
        assert!(!state.is_deleting);

        f.store
            .fail_list
            .store(false, std::sync::atomic::Ordering::SeqCst);
        assert_eq!(f.store.list(&id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_upload_after_delete_does_not_reuse_sort_order() {
        let (f, id) = seeded(3).await;
        let urls: Vec<String> = f.manager.snapshot().images.iter().map(|i| i.url.clone()).collect();
        f.manager.delete_image(&urls[1]).await.unwrap();

        f.manager.add_files(vec![png("late.png")]);
        f.manager.upload_all_files().await.unwrap();

        let orders: Vec<i32> = f
            .store
            .list(&id)
            .await
            .unwrap()
            .iter()
            .map(|i| i.sort_order)
            .collect();
        assert_eq!(orders, vec![0, 2, 3]);
    }

    #[tokio::test]
    async fn test_same_stem_files_upload_together() {
        let id = Uuid::new_v4();
        let f = fixture(Some(id));
        let webp = SelectedFile::new("front.webp", "image/webp", png_bytes(6, 4));
        assert_eq!(f.manager.add_files(vec![png("front.png"), webp]), 2);

        let report = f.manager.upload_all_files().await.unwrap();
        assert!(!report.is_partial());
        assert_eq!(f.blobs.object_count(), 2);

        let persisted = f.store.list(&id).await.unwrap();
        assert_eq!(persisted.len(), 2);
        assert_ne!(persisted[0].url, persisted[1].url);
        assert!(f.manager.snapshot().error.is_none());
    }

    #[tokio::test]
    async fn test_failed_promote_leaves_state_alone() {
        let (f, _) = seeded(2).await;
        let before = f.manager.snapshot().images;
        f.store
            .fail_set_primary
            .store(true, std::sync::atomic::Ordering::SeqCst);

        assert!(f.manager.set_primary_image(&before[1].url).await.is_err());
        let state = f.manager.snapshot();
        assert_eq!(state.images, before);
        assert!(state.error.is_some());
        assert!(!state.is_setting_primary);
    }

    #[tokio::test]
    async fn test_busy_flag_blocks_reentry() {
        let (f, _) = seeded(1).await;
        let url = f.manager.snapshot().images[0].url.clone();
        f.manager.dispatch(Action::SetDeleting(true));

        assert!(matches!(
            f.manager.delete_image(&url).await,
            Err(ImageManagerError::Busy)
        ));
        assert_eq!(f.manager.snapshot().images.len(), 1);
        // other operations are not blocked
        assert!(f.manager.set_primary_image(&url).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_message_auto_clears() {
        let id = Uuid::new_v4();
        let f = fixture(Some(id));
        f.store
            .inner
            .insert_many(&crate::models::ImageMetadataPayload {
                forklift_id: id,
                images: vec![crate::models::ImageMetadata {
                    image_url: "u0".to_string(),
                    alt_text: None,
                    is_primary: true,
                    sort_order: 0,
                }],
            })
            .await
            .unwrap();
        f.manager.refresh().await.unwrap();

        f.manager.set_primary_image("u0").await.unwrap();
        assert!(f.manager.snapshot().success_message.is_some());

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert!(f.manager.snapshot().success_message.is_some());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(f.manager.snapshot().success_message.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_newer_success_message_survives_old_timer() {
        let f = fixture(Some(Uuid::new_v4()));
        f.manager.set_success("first".to_string());
        tokio::time::sleep(Duration::from_secs(3)).await;
        f.manager.set_success("second".to_string());

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(f.manager.snapshot().success_message.as_deref(), Some("second"));

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(f.manager.snapshot().success_message.is_none());
    }
}
