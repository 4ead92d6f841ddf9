//! In-memory stores for tests. They count calls and fail on request.

use crate::models::{ImageMetadataPayload, ListingImage};
use crate::storage::{BlobStore, StorageError};
use crate::store::{ImageStore, SqliteImageStore, StoreError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

pub const BASE_URL: &str = "https://cdn.test/media";

#[derive(Default)]
pub struct MemoryBlobStore {
    pub objects: Mutex<HashMap<String, Vec<u8>>>,
    pub upload_calls: AtomicUsize,
    pub remove_calls: AtomicUsize,
    /// Upload number (1-based) that fails
    pub fail_on_upload: Mutex<Option<usize>>,
    pub fail_remove: AtomicBool,
}

impl MemoryBlobStore {
    pub fn calls(&self) -> usize {
        self.upload_calls.load(Ordering::SeqCst) + self.remove_calls.load(Ordering::SeqCst)
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<String, StorageError> {
        let n = self.upload_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if *self.fail_on_upload.lock().unwrap() == Some(n) {
            return Err(StorageError::Other("bucket unavailable".to_string()));
        }
        self.objects.lock().unwrap().insert(path.to_string(), bytes);
        Ok(format!("{}/{}", BASE_URL, path))
    }

    async fn remove(&self, path: &str) -> Result<(), StorageError> {
        self.remove_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_remove.load(Ordering::SeqCst) {
            return Err(StorageError::Other("remove refused".to_string()));
        }
        self.objects.lock().unwrap().remove(path);
        Ok(())
    }

    fn path_for_url(&self, url: &str) -> Option<String> {
        url.strip_prefix(BASE_URL)
            .map(|p| p.trim_start_matches('/').to_string())
    }
}

/// SQLite store that can be told to fail individual operations
pub struct FlakyImageStore {
    pub inner: SqliteImageStore,
    pub calls: AtomicUsize,
    pub fail_insert: AtomicBool,
    pub fail_set_primary: AtomicBool,
    pub fail_delete: AtomicBool,
    pub fail_list: AtomicBool,
}

impl FlakyImageStore {
    pub fn new() -> Self {
        Self {
            inner: SqliteImageStore::open_in_memory().unwrap(),
            calls: AtomicUsize::new(0),
            fail_insert: AtomicBool::new(false),
            fail_set_primary: AtomicBool::new(false),
            fail_delete: AtomicBool::new(false),
            fail_list: AtomicBool::new(false),
        }
    }

    fn check(&self, flag: &AtomicBool, what: &str) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if flag.load(Ordering::SeqCst) {
            Err(StoreError::Other(format!("{} rejected", what)))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ImageStore for FlakyImageStore {
    async fn insert_many(
        &self,
        payload: &ImageMetadataPayload,
    ) -> Result<Vec<ListingImage>, StoreError> {
        self.check(&self.fail_insert, "insert")?;
        self.inner.insert_many(payload).await
    }

    async fn set_primary(&self, forklift_id: &Uuid, url: &str) -> Result<(), StoreError> {
        self.check(&self.fail_set_primary, "set primary")?;
        self.inner.set_primary(forklift_id, url).await
    }

    async fn delete_by_url(
        &self,
        forklift_id: &Uuid,
        url: &str,
    ) -> Result<ListingImage, StoreError> {
        self.check(&self.fail_delete, "delete")?;
        self.inner.delete_by_url(forklift_id, url).await
    }

    async fn list(&self, forklift_id: &Uuid) -> Result<Vec<ListingImage>, StoreError> {
        self.check(&self.fail_list, "list")?;
        self.inner.list(forklift_id).await
    }
}
