//! In-memory progress store
//!
//! Keyed by (user, match). `upsert_with` and `modify` run the caller's
//! closure while holding the write lock: the read-modify-write for a single
//! key is atomic and rows commit whole or not at all. Rows are never removed.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use offerflow_types::{MatchId, OfferProgress, ProgressKey, ProgressStatus, Result};

/// Thread-safe store for progress rows
#[derive(Clone)]
pub struct ProgressStore {
    rows: Arc<RwLock<HashMap<ProgressKey, OfferProgress>>>,
}

impl ProgressStore {
    pub fn new() -> Self {
        Self {
            rows: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Fetch a snapshot of one row
    pub async fn get(&self, key: &ProgressKey) -> Option<OfferProgress> {
        self.rows.read().await.get(key).cloned()
    }

    /// Fetch-or-create the row for `key` and apply `f` to it under the
    /// write lock. Returns whatever `f` returns.
    pub async fn upsert_with<F, T>(&self, key: ProgressKey, f: F) -> Result<T>
    where
        F: FnOnce(&mut OfferProgress) -> T,
    {
        let mut rows = self.rows.write().await;
        let row = rows
            .entry(key.clone())
            .or_insert_with(|| OfferProgress::new(key.user_id, key.match_id));
        Ok(f(row))
    }

    /// Apply `f` to an existing row under the write lock; `None` if the row
    /// does not exist. Never creates rows.
    pub async fn modify<F, T>(&self, key: &ProgressKey, f: F) -> Option<T>
    where
        F: FnOnce(&mut OfferProgress) -> T,
    {
        let mut rows = self.rows.write().await;
        rows.get_mut(key).map(f)
    }

    /// All rows for a match currently at the given status
    pub async fn list_with_status(
        &self,
        match_id: &MatchId,
        status: ProgressStatus,
    ) -> Vec<OfferProgress> {
        let rows = self.rows.read().await;
        rows.values()
            .filter(|p| &p.match_id == match_id && p.status == status)
            .cloned()
            .collect()
    }

    /// All rows still InProgress, across every match (repair sweep input)
    pub async fn list_in_progress(&self) -> Vec<OfferProgress> {
        let rows = self.rows.read().await;
        rows.values()
            .filter(|p| p.status == ProgressStatus::InProgress)
            .cloned()
            .collect()
    }

    /// Total number of rows
    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

impl Default for ProgressStore {
    fn default() -> Self {
        Self::new()
    }
}
