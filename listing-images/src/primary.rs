//! Keeps exactly one primary image per forklift.
//!
//! The pure helpers operate on an in-memory image list and are shared by
//! the reducer. The async functions apply the same rules to a store.

use crate::models::ListingImage;
use crate::storage::BlobStore;
use crate::store::{ImageStore, StoreError};
use uuid::Uuid;

pub fn primary_count(images: &[ListingImage]) -> usize {
    images.iter().filter(|i| i.is_primary).count()
}

/// Exactly one primary when non-empty, none when empty
pub fn invariant_holds(images: &[ListingImage]) -> bool {
    match images.len() {
        0 => primary_count(images) == 0,
        _ => primary_count(images) == 1,
    }
}

fn first_by_order(images: &[ListingImage]) -> Option<&ListingImage> {
    images.iter().min_by_key(|i| i.sort_order)
}

/// Sets `url` primary and clears every sibling. Returns false if `url` is unknown.
pub fn apply_promote(images: &mut [ListingImage], url: &str) -> bool {
    if !images.iter().any(|i| i.url == url) {
        return false;
    }
    for image in images.iter_mut() {
        image.is_primary = image.url == url;
    }
    true
}

/// Removes `url`; if it was primary the first remaining image takes over
pub fn apply_delete(images: &mut Vec<ListingImage>, url: &str) -> Option<ListingImage> {
    let index = images.iter().position(|i| i.url == url)?;
    let removed = images.remove(index);

    if removed.is_primary {
        if let Some(next) = first_by_order(images).map(|i| i.url.clone()) {
            apply_promote(images, &next);
        }
    }

    Some(removed)
}

/// Returns the URL that has to become primary for the invariant to hold,
/// or None if nothing needs to change. `preferred` wins when present.
pub fn choose_primary(images: &[ListingImage], preferred: Option<&str>) -> Option<String> {
    let target = match preferred.filter(|p| images.iter().any(|i| i.url == *p)) {
        Some(p) => p.to_string(),
        None => {
            let primaries: Vec<&ListingImage> = images.iter().filter(|i| i.is_primary).collect();
            match primaries.len() {
                1 => return None,
                0 => first_by_order(images)?.url.clone(),
                _ => primaries.iter().min_by_key(|i| i.sort_order)?.url.clone(),
            }
        }
    };

    let already = primary_count(images) == 1
        && images.iter().any(|i| i.url == target && i.is_primary);
    if already {
        None
    } else {
        Some(target)
    }
}

/// Fixes the flags in place so the invariant holds. Returns true if
/// anything changed.
pub fn normalize(images: &mut [ListingImage]) -> bool {
    match choose_primary(images, None) {
        Some(url) => apply_promote(images, &url),
        None => false,
    }
}

/// Makes `url` the primary image of the forklift
pub async fn promote(
    store: &dyn ImageStore,
    forklift_id: &Uuid,
    url: &str,
) -> Result<(), StoreError> {
    store.set_primary(forklift_id, url).await
}

/// Result of [`delete`]
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteOutcome {
    pub removed: ListingImage,
    /// Image promoted because the removed one was primary
    pub promoted: Option<String>,
    /// Set when the record is gone but a follow-up step failed
    pub warning: Option<String>,
}

/// Deletes an image record and its blob, handing the primary flag on
pub async fn delete(
    store: &dyn ImageStore,
    blobs: &dyn BlobStore,
    forklift_id: &Uuid,
    url: &str,
) -> Result<DeleteOutcome, StoreError> {
    let removed = store.delete_by_url(forklift_id, url).await?;
    log::info!("Deleted image record {} of forklift {}", url, forklift_id);

    match blobs.path_for_url(url) {
        Some(path) => {
            if let Err(e) = blobs.remove(&path).await {
                log::warn!("Blob {} left orphaned: {}", path, e);
            }
        }
        None => log::warn!("No storage path for {}, blob left in place", url),
    }

    let mut outcome = DeleteOutcome {
        removed,
        promoted: None,
        warning: None,
    };

    if !outcome.removed.is_primary {
        return Ok(outcome);
    }

    // The row is gone at this point; later failures only downgrade to a warning
    let promoted = match store.list(forklift_id).await {
        Ok(remaining) => match first_by_order(&remaining) {
            Some(next) => store
                .set_primary(forklift_id, &next.url)
                .await
                .map(|()| Some(next.url.clone())),
            None => Ok(None),
        },
        Err(e) => Err(e),
    };

    match promoted {
        Ok(url) => outcome.promoted = url,
        Err(e) => {
            log::error!("Could not promote a new primary of {} after delete: {}", forklift_id, e);
            outcome.warning = Some(format!(
                "Image deleted, but no new primary image could be set: {}",
                e
            ));
        }
    }

    Ok(outcome)
}

/// Brings the stored flags in line with the invariant. Returns the URL that
/// was promoted, if any.
pub async fn reconcile(
    store: &dyn ImageStore,
    forklift_id: &Uuid,
    preferred: Option<&str>,
) -> Result<Option<String>, StoreError> {
    let images = store.list(forklift_id).await?;
    match choose_primary(&images, preferred) {
        Some(url) => {
            store.set_primary(forklift_id, &url).await?;
            log::debug!("Reconciled primary image of {} to {}", forklift_id, url);
            Ok(Some(url))
        }
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ImageMetadata, ImageMetadataPayload};
    use crate::testing::{FlakyImageStore, MemoryBlobStore, BASE_URL};
    use std::sync::atomic::Ordering;

    fn images(flags: &[bool]) -> Vec<ListingImage> {
        flags
            .iter()
            .enumerate()
            .map(|(i, p)| ListingImage::new(format!("u{}", i), *p, i as i32))
            .collect()
    }

    async fn seed(store: &FlakyImageStore, blobs: &MemoryBlobStore, id: Uuid, n: usize) -> Vec<String> {
        let mut urls = Vec::new();
        for i in 0..n {
            let url = blobs
                .upload(&format!("forklifts/{}/{}.jpg", id, i), vec![0], "image/jpeg")
                .await
                .unwrap();
            urls.push(url);
        }
        let payload = ImageMetadataPayload {
            forklift_id: id,
            images: urls
                .iter()
                .enumerate()
                .map(|(i, u)| ImageMetadata {
                    image_url: u.clone(),
                    alt_text: None,
                    is_primary: i == 0,
                    sort_order: i as i32,
                })
                .collect(),
        };
        store.insert_many(&payload).await.unwrap();
        urls
    }

    #[test]
    fn test_invariant() {
        assert!(invariant_holds(&[]));
        assert!(invariant_holds(&images(&[false, true])));
        assert!(!invariant_holds(&images(&[false, false])));
        assert!(!invariant_holds(&images(&[true, true])));
    }

    #[test]
    fn test_apply_promote() {
        let mut list = images(&[true, false, false]);
        assert!(apply_promote(&mut list, "u2"));
        assert_eq!(list.iter().map(|i| i.is_primary).collect::<Vec<_>>(), vec![false, false, true]);
        assert!(!apply_promote(&mut list, "nope"));
        assert!(invariant_holds(&list));
    }

    #[test]
    fn test_apply_delete_hands_over_primary() {
        let mut list = images(&[true, false, false]);
        let removed = apply_delete(&mut list, "u0").unwrap();
        assert!(removed.is_primary);
        assert!(list[0].is_primary);
        assert_eq!(list[0].url, "u1");
        assert!(invariant_holds(&list));

        let mut single = images(&[true]);
        apply_delete(&mut single, "u0");
        assert!(single.is_empty());
        assert!(invariant_holds(&single));
    }

    #[test]
    fn test_choose_primary() {
        assert_eq!(choose_primary(&[], None), None);
        assert_eq!(choose_primary(&images(&[false, true]), None), None);
        assert_eq!(choose_primary(&images(&[false, false]), None), Some("u0".into()));
        assert_eq!(choose_primary(&images(&[false, true, true]), None), Some("u1".into()));
        assert_eq!(choose_primary(&images(&[true, false]), Some("u1")), Some("u1".into()));
        assert_eq!(choose_primary(&images(&[true, false]), Some("u0")), None);
        assert_eq!(choose_primary(&images(&[true, false]), Some("gone")), None);
    }

    #[test]
    fn test_normalize() {
        let mut none = images(&[false, false]);
        assert!(normalize(&mut none));
        assert!(none[0].is_primary);

        let mut two = images(&[false, true, true]);
        assert!(normalize(&mut two));
        assert!(invariant_holds(&two));
        assert!(two[1].is_primary);

        let mut fine = images(&[false, true]);
        assert!(!normalize(&mut fine));
    }

    #[tokio::test]
    async fn test_delete_primary_promotes_first_remaining() {
        let store = FlakyImageStore::new();
        let blobs = MemoryBlobStore::default();
        let id = Uuid::new_v4();
        let urls = seed(&store, &blobs, id, 3).await;

        let outcome = delete(&store, &blobs, &id, &urls[0]).await.unwrap();
        assert_eq!(outcome.promoted.as_deref(), Some(urls[1].as_str()));
        assert_eq!(blobs.object_count(), 2);

        let left = store.list(&id).await.unwrap();
        assert_eq!(left.len(), 2);
        assert!(invariant_holds(&left));
        assert!(left[0].is_primary);
    }

    #[tokio::test]
    async fn test_delete_sole_image_leaves_empty_set() {
        let store = FlakyImageStore::new();
        let blobs = MemoryBlobStore::default();
        let id = Uuid::new_v4();
        let urls = seed(&store, &blobs, id, 1).await;

        let outcome = delete(&store, &blobs, &id, &urls[0]).await.unwrap();
        assert!(outcome.promoted.is_none());
        let left = store.list(&id).await.unwrap();
        assert!(left.is_empty());
        assert!(invariant_holds(&left));
    }

    #[tokio::test]
    async fn test_delete_survives_blob_failure() {
        let store = FlakyImageStore::new();
        let blobs = MemoryBlobStore::default();
        let id = Uuid::new_v4();
        let urls = seed(&store, &blobs, id, 2).await;
        blobs.fail_remove.store(true, Ordering::SeqCst);

        let outcome = delete(&store, &blobs, &id, &urls[1]).await.unwrap();
        assert!(outcome.warning.is_none());
        assert_eq!(store.list(&id).await.unwrap().len(), 1);
        assert_eq!(blobs.object_count(), 2);
    }

    #[tokio::test]
    async fn test_delete_reports_warning_when_listing_fails() {
        let store = FlakyImageStore::new();
        let blobs = MemoryBlobStore::default();
        let id = Uuid::new_v4();
        let urls = seed(&store, &blobs, id, 2).await;
        store.fail_list.store(true, Ordering::SeqCst);

        let outcome = delete(&store, &blobs, &id, &urls[0]).await.unwrap();
        assert!(outcome.removed.is_primary);
        assert!(outcome.promoted.is_none());
        assert!(outcome
            .warning
            .unwrap()
            .starts_with("Image deleted, but no new primary image could be set"));

        store.fail_list.store(false, Ordering::SeqCst);
        assert_eq!(store.list(&id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_failure_touches_nothing() {
        let store = FlakyImageStore::new();
        let blobs = MemoryBlobStore::default();
        let id = Uuid::new_v4();
        let urls = seed(&store, &blobs, id, 2).await;
        store.fail_delete.store(true, Ordering::SeqCst);

        assert!(delete(&store, &blobs, &id, &urls[0]).await.is_err());
        assert_eq!(store.list(&id).await.unwrap().len(), 2);
        assert_eq!(blobs.remove_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_reconcile_fixes_missing_primary() {
        let store = FlakyImageStore::new();
        let id = Uuid::new_v4();
        let payload = ImageMetadataPayload {
            forklift_id: id,
            images: vec![
                ImageMetadata {
                    image_url: format!("{}/a.jpg", BASE_URL),
                    alt_text: None,
                    is_primary: false,
                    sort_order: 0,
                },
                ImageMetadata {
                    image_url: format!("{}/b.jpg", BASE_URL),
                    alt_text: None,
                    is_primary: false,
                    sort_order: 1,
                },
            ],
        };
        store.insert_many(&payload).await.unwrap();

        let promoted = reconcile(&store, &id, None).await.unwrap();
        assert_eq!(promoted, Some(format!("{}/a.jpg", BASE_URL)));
        assert!(invariant_holds(&store.list(&id).await.unwrap()));
        assert_eq!(reconcile(&store, &id, None).await.unwrap(), None);
    }
}
