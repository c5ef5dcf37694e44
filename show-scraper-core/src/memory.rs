//! Process-local store, used when no database path is configured.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::contract::{PageCursorStore, ShowRepository};
use crate::error::StoreError;
use crate::model::Show;

#[derive(Debug, Default)]
pub struct InMemoryStore {
    shows: Mutex<BTreeMap<u64, Show>>,
    pages: Mutex<BTreeSet<u32>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts with pages `1..=page` already committed.
    pub fn with_completed_pages(page: u32) -> Self {
        let store = Self::default();
        store.lock_pages().extend(1..=page);
        store
    }

    pub fn show_count(&self) -> usize {
        self.lock_shows().len()
    }

    pub fn completed_pages(&self) -> Vec<u32> {
        self.lock_pages().iter().copied().collect()
    }

    fn lock_shows(&self) -> std::sync::MutexGuard<'_, BTreeMap<u64, Show>> {
        self.shows.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_pages(&self) -> std::sync::MutexGuard<'_, BTreeSet<u32>> {
        self.pages.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl ShowRepository for InMemoryStore {
    async fn insert(&self, show: Show) -> Result<(), StoreError> {
        let mut shows = self.lock_shows();
        if shows.contains_key(&show.id) {
            return Err(StoreError::DuplicateShow(show.id));
        }
        shows.insert(show.id, show);
        Ok(())
    }

    async fn find_by_id(&self, id: u64) -> Result<Option<Show>, StoreError> {
        Ok(self.lock_shows().get(&id).cloned())
    }

    async fn list_shows(&self, offset: u64, limit: u32) -> Result<Vec<Show>, StoreError> {
        let offset = usize::try_from(offset).unwrap_or(usize::MAX);
        Ok(self
            .lock_shows()
            .values()
            .skip(offset)
            .take(limit as usize)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl PageCursorStore for InMemoryStore {
    async fn last_completed_page(&self) -> Result<u32, StoreError> {
        Ok(self.lock_pages().last().copied().unwrap_or(0))
    }

    async fn mark_page_completed(&self, page: u32) -> Result<(), StoreError> {
        self.lock_pages().insert(page);
        Ok(())
    }
}
