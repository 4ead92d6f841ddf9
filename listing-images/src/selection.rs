//! Queue of picked files waiting for upload.
//!
//! The queue only holds data. Preview handles are created and released by
//! the caller, which keeps every method here free of side effects.

use crate::preview::PreviewHandle;
use crate::validation::{validate_image, SelectedFile, ValidationError};

/// A file chosen by the user that has not been uploaded yet
#[derive(Debug, Clone, PartialEq)]
pub struct PendingSelection {
    pub file: SelectedFile,
    pub preview: PreviewHandle,
    pub is_primary: bool,
    pub sort_order: i32,
    /// Set when an upload containing this entry failed
    pub upload_error: Option<String>,
}

/// Outcome of [`SelectionQueue::admit`]
#[derive(Debug, Default, PartialEq)]
pub struct Admission {
    pub accepted: Vec<SelectedFile>,
    pub rejected: Vec<ValidationError>,
}

impl Admission {
    /// Rejection reasons joined for display
    pub fn message(&self) -> Option<String> {
        if self.rejected.is_empty() {
            None
        } else {
            Some(
                self.rejected
                    .iter()
                    .map(|e| e.to_string())
                    .collect::<Vec<_>>()
                    .join("\n"),
            )
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionQueue {
    entries: Vec<PendingSelection>,
}

impl SelectionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[PendingSelection] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Slots left for new selections
    pub fn remaining_capacity(&self, persisted_count: usize, max_total: usize) -> usize {
        max_total.saturating_sub(persisted_count + self.entries.len())
    }

    /// Decides which of `files` may join the queue
    pub fn admit(
        &self,
        files: Vec<SelectedFile>,
        persisted_count: usize,
        max_total: usize,
        max_bytes: u64,
    ) -> Admission {
        let mut admission = Admission::default();

        for file in files {
            if let Err(e) = validate_image(&file, max_bytes) {
                admission.rejected.push(e);
                continue;
            }

            let duplicate = self.entries.iter().any(|p| p.file.same_file(&file))
                || admission.accepted.iter().any(|f| f.same_file(&file));
            if duplicate {
                admission
                    .rejected
                    .push(ValidationError::Duplicate { name: file.name });
                continue;
            }

            admission.accepted.push(file);
        }

        let capacity = self.remaining_capacity(persisted_count, max_total);
        if admission.accepted.len() > capacity {
            let dropped = admission.accepted.len() - capacity;
            admission.accepted.truncate(capacity);
            admission
                .rejected
                .push(ValidationError::CapacityReached { dropped, max_total });
        }

        admission
    }

    /// Appends admitted files together with their previews
    pub fn push(&mut self, files: Vec<(SelectedFile, PreviewHandle)>, persisted_count: usize) {
        let mark_first = self.entries.is_empty() && persisted_count == 0;

        for (i, (file, preview)) in files.into_iter().enumerate() {
            self.entries.push(PendingSelection {
                file,
                preview,
                is_primary: mark_first && i == 0,
                sort_order: 0,
                upload_error: None,
            });
        }

        self.renumber();
    }

    /// Removes an entry; the caller releases its preview
    pub fn remove(&mut self, index: usize) -> Option<PendingSelection> {
        if index >= self.entries.len() {
            return None;
        }

        let removed = self.entries.remove(index);
        if removed.is_primary {
            if let Some(first) = self.entries.first_mut() {
                first.is_primary = true;
            }
        }

        self.renumber();
        Some(removed)
    }

    /// Marks exactly one entry as primary
    pub fn set_primary(&mut self, index: usize) -> bool {
        if index >= self.entries.len() {
            return false;
        }

        for (i, entry) in self.entries.iter_mut().enumerate() {
            entry.is_primary = i == index;
        }
        true
    }

    /// Empties the queue; the caller releases the previews
    pub fn clear(&mut self) -> Vec<PendingSelection> {
        std::mem::take(&mut self.entries)
    }

    /// Drops the entries whose preview is in `handles`, e.g. after they were
    /// uploaded. Returns the dropped entries.
    pub fn discard(&mut self, handles: &[PreviewHandle]) -> Vec<PendingSelection> {
        let (dropped, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.entries)
            .into_iter()
            .partition(|e| handles.contains(&e.preview));
        self.entries = kept;
        self.renumber();
        dropped
    }

    /// Flags every entry with the reason of a failed upload
    pub fn mark_failed(&mut self, reason: &str) {
        for entry in &mut self.entries {
            entry.upload_error = Some(reason.to_string());
        }
    }

    fn renumber(&mut self) {
        for (i, entry) in self.entries.iter_mut().enumerate() {
            entry.sort_order = i as i32;
        }
    }
}
