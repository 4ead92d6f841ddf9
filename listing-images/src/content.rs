//! Cache for editable page content.
//!
//! [`ContentCache`] memoises values per key for a fixed time to live. The
//! clock is injected so expiry can be driven from tests, and concurrent
//! misses for the same key share a single fetch.

use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

pub const DEFAULT_CONTENT_TTL: Duration = Duration::from_secs(60);

/// Source of the current time
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<Instant>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self {
            now: Arc::new(Mutex::new(Instant::now())),
        }
    }
}

impl ManualClock {
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

struct Entry<V> {
    value: V,
    fetched_at: Instant,
}

struct Slots<V> {
    entries: HashMap<String, Entry<V>>,
    in_flight: HashMap<String, Arc<tokio::sync::Mutex<()>>>,
    /// Bumped by every invalidation so a fetch started earlier is not stored
    epoch: u64,
}

pub struct ContentCache<V, C = SystemClock> {
    ttl: Duration,
    clock: C,
    slots: Mutex<Slots<V>>,
}

impl<V: Clone> ContentCache<V, SystemClock> {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, SystemClock)
    }
}

impl<V: Clone, C: Clock> ContentCache<V, C> {
    pub fn with_clock(ttl: Duration, clock: C) -> Self {
        Self {
            ttl,
            clock,
            slots: Mutex::new(Slots {
                entries: HashMap::new(),
                in_flight: HashMap::new(),
                epoch: 0,
            }),
        }
    }

    fn slots(&self) -> MutexGuard<'_, Slots<V>> {
        self.slots.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Cached value younger than the time to live
    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        let slots = self.slots();
        slots
            .entries
            .get(key)
            .filter(|e| now.duration_since(e.fetched_at) < self.ttl)
            .map(|e| e.value.clone())
    }

    /// Returns the cached value or runs `fetch` to load it.
    ///
    /// Callers missing the same key at the same time wait for the first
    /// one's fetch instead of starting their own. Errors are not cached.
    pub async fn get_or_fetch<F, Fut, E>(&self, key: &str, fetch: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(key) {
            return Ok(value);
        }

        let lock = self
            .slots()
            .in_flight
            .entry(key.to_string())
            .or_default()
            .clone();
        let guard = lock.lock().await;

        let result = match self.get(key) {
            Some(value) => Ok(value),
            None => {
                let epoch = self.slots().epoch;
                log::debug!("Content cache miss for {}", key);
                let result = fetch().await;

                if let Ok(value) = &result {
                    let mut slots = self.slots();
                    if slots.epoch == epoch {
                        slots.entries.insert(
                            key.to_string(),
                            Entry {
                                value: value.clone(),
                                fetched_at: self.clock.now(),
                            },
                        );
                    }
                }
                result
            }
        };

        drop(guard);

        // Clones of the per-key lock are only taken and dropped under the
        // slots lock, so the last holder besides the map removes it.
        let mut slots = self.slots();
        let current = slots
            .in_flight
            .get(key)
            .is_some_and(|held| Arc::ptr_eq(held, &lock));
        if current && Arc::strong_count(&lock) <= 2 {
            slots.in_flight.remove(key);
        }
        drop(lock);
        drop(slots);
        result
    }

    #[cfg(test)]
    fn in_flight_len(&self) -> usize {
        self.slots().in_flight.len()
    }

    pub fn invalidate(&self, key: &str) {
        let mut slots = self.slots();
        slots.entries.remove(key);
        slots.epoch += 1;
    }

    pub fn invalidate_all(&self) {
        let mut slots = self.slots();
        slots.entries.clear();
        slots.epoch += 1;
        log::debug!("Content cache cleared");
    }
}

/// Error type for page content operations
#[derive(Debug)]
pub enum ContentError {
    DatabaseError(rusqlite::Error),
    NotFound(String),
}

impl std::fmt::Display for ContentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContentError::DatabaseError(e) => write!(f, "Database error: {}", e),
            ContentError::NotFound(key) => write!(f, "No content for {}", key),
        }
    }
}

impl std::error::Error for ContentError {}

impl From<rusqlite::Error> for ContentError {
    fn from(err: rusqlite::Error) -> Self {
        ContentError::DatabaseError(err)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageContent {
    pub key: String,
    pub content: String,
    pub updated_at: String,
}

/// Rows of the `page_content` table
#[derive(Clone)]
pub struct PageContentStore {
    conn: Arc<Mutex<Connection>>,
}

impl PageContentStore {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn connection(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn get(&self, key: &str) -> Result<Option<PageContent>, ContentError> {
        let conn = self.connection();
        let content = conn
            .query_row(
                "SELECT content_key, content, updated_at FROM page_content WHERE content_key = ?1",
                params![key],
                |row| {
                    Ok(PageContent {
                        key: row.get(0)?,
                        content: row.get(1)?,
                        updated_at: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(content)
    }

    pub fn upsert(&self, key: &str, content: &str) -> Result<(), ContentError> {
        let conn = self.connection();
        conn.execute(
            "INSERT INTO page_content (content_key, content, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(content_key) DO UPDATE SET content = excluded.content, updated_at = excluded.updated_at",
            params![key, content, chrono::Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn list(&self) -> Result<Vec<PageContent>, ContentError> {
        let conn = self.connection();
        let mut stmt = conn.prepare(
            "SELECT content_key, content, updated_at FROM page_content ORDER BY content_key",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(PageContent {
                key: row.get(0)?,
                content: row.get(1)?,
                updated_at: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

/// Page content read through the cache
pub struct PageContentService<C = SystemClock> {
    store: PageContentStore,
    cache: ContentCache<String, C>,
}

impl PageContentService<SystemClock> {
    pub fn new(store: PageContentStore) -> Self {
        Self::with_cache(store, ContentCache::new(DEFAULT_CONTENT_TTL))
    }
}

impl<C: Clock> PageContentService<C> {
    pub fn with_cache(store: PageContentStore, cache: ContentCache<String, C>) -> Self {
        Self { store, cache }
    }

    pub async fn get(&self, key: &str) -> Result<String, ContentError> {
        self.cache
            .get_or_fetch(key, || async {
                self.store
                    .get(key)?
                    .map(|c| c.content)
                    .ok_or_else(|| ContentError::NotFound(key.to_string()))
            })
            .await
    }

    /// Writes the content and drops the cached copy
    pub fn upsert(&self, key: &str, content: &str) -> Result<(), ContentError> {
        self.store.upsert(key, content)?;
        self.cache.invalidate(key);
        log::info!("Updated page content {}", key);
        Ok(())
    }

    pub fn list(&self) -> Result<Vec<PageContent>, ContentError> {
        self.store.list()
    }
}
