//! State of the image manager and the pure reducer that evolves it.

use crate::models::{ListingImage, ListingImagesConfig};
use crate::preview::PreviewHandle;
use crate::primary;
use crate::selection::SelectionQueue;
use crate::validation::SelectedFile;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub struct ImageManagerState {
    /// None while the forklift has not been saved
    pub forklift_id: Option<Uuid>,
    pub max_images: usize,
    pub images: Vec<ListingImage>,
    pub upload_files: SelectionQueue,
    pub is_uploading: bool,
    pub is_deleting: bool,
    pub is_setting_primary: bool,
    pub error: Option<String>,
    pub success_message: Option<String>,
}

impl Default for ImageManagerState {
    fn default() -> Self {
        Self::new(None, ListingImagesConfig::default().max_images)
    }
}

impl ImageManagerState {
    pub fn new(forklift_id: Option<Uuid>, max_images: usize) -> Self {
        Self {
            forklift_id,
            max_images,
            images: Vec::new(),
            upload_files: SelectionQueue::new(),
            is_uploading: false,
            is_deleting: false,
            is_setting_primary: false,
            error: None,
            success_message: None,
        }
    }

    /// Slots left for new selections
    pub fn available_slots(&self) -> usize {
        self.upload_files
            .remaining_capacity(self.images.len(), self.max_images)
    }

    pub fn can_add_more(&self) -> bool {
        self.available_slots() > 0
    }

    pub fn primary_image(&self) -> Option<&ListingImage> {
        self.images.iter().find(|i| i.is_primary)
    }

    /// First sort position after every persisted image. Deletes leave gaps,
    /// so this is not the image count.
    pub fn next_sort_order(&self) -> i32 {
        self.images
            .iter()
            .map(|i| i.sort_order + 1)
            .max()
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SetForklift(Option<Uuid>),
    SetImages(Vec<ListingImage>),
    /// Admitted files with their previews
    AddFiles(Vec<(SelectedFile, PreviewHandle)>),
    RemoveFile(usize),
    SetPrimaryFile(usize),
    ClearFiles,
    /// Drops queue entries that have been uploaded
    DiscardFiles(Vec<PreviewHandle>),
    MarkFilesFailed(String),
    SetUploading(bool),
    SetDeleting(bool),
    SetSettingPrimary(bool),
    SetError(String),
    ClearError,
    SetSuccess(String),
    ClearSuccess,
    SetPrimaryImage(String),
    RemoveImage(String),
    Reset,
}

/// Applies one action. Error and success message never coexist.
pub fn reduce(mut state: ImageManagerState, action: Action) -> ImageManagerState {
    match action {
        Action::SetForklift(forklift_id) => state.forklift_id = forklift_id,
        Action::SetImages(mut images) => {
            images.sort_by_key(|i| i.sort_order);
            state.images = images;
        }
        Action::AddFiles(files) => {
            let persisted = state.images.len();
            state.upload_files.push(files, persisted);
        }
        Action::RemoveFile(index) => {
            state.upload_files.remove(index);
        }
        Action::SetPrimaryFile(index) => {
            state.upload_files.set_primary(index);
        }
        Action::ClearFiles => {
            state.upload_files.clear();
        }
        Action::DiscardFiles(handles) => {
            state.upload_files.discard(&handles);
        }
        Action::MarkFilesFailed(reason) => state.upload_files.mark_failed(&reason),
        Action::SetUploading(flag) => state.is_uploading = flag,
        Action::SetDeleting(flag) => state.is_deleting = flag,
        Action::SetSettingPrimary(flag) => state.is_setting_primary = flag,
        Action::SetError(message) => {
            state.error = Some(message);
            state.success_message = None;
        }
        Action::ClearError => state.error = None,
        Action::SetSuccess(message) => {
            state.success_message = Some(message);
            state.error = None;
        }
        Action::ClearSuccess => state.success_message = None,
        Action::SetPrimaryImage(url) => {
            primary::apply_promote(&mut state.images, &url);
        }
        Action::RemoveImage(url) => {
            primary::apply_delete(&mut state.images, &url);
        }
        Action::Reset => {
            state = ImageManagerState::new(state.forklift_id, state.max_images);
        }
    }
    state
}
