use crate::store_trait::CountStore;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tallyvox_core::{RankEntry, SpeakerId, StoreError};

/// In-memory mirror of the durable tallies, shared between the worker threads
/// and the leaderboard query path.
///
/// Locking discipline: the mutex is held only around the map read-modify-write;
/// durable-store calls happen after it is released, so a slow store never
/// blocks another speaker's pipeline or the query path.
pub struct Scoreboard {
    inner: Mutex<ScoreboardInner>,
    store: Arc<dyn CountStore>,
}

#[derive(Default)]
struct ScoreboardInner {
    counts: HashMap<(SpeakerId, String), u64>,
    names: HashMap<SpeakerId, String>,
    // Speakers in the order their first hit was recorded (or read back).
    order: Vec<SpeakerId>,
}

impl Scoreboard {
    pub fn new(store: Arc<dyn CountStore>) -> Self {
        Self {
            inner: Mutex::new(ScoreboardInner::default()),
            store,
        }
    }

    /// Replace the mirror with the durable store's contents. Called once at
    /// startup so counts survive restarts.
    pub fn preload(&self) -> Result<(), StoreError> {
        let records = self.store.read_all()?;
        let names = self.store.read_names()?;

        let mut inner = self.inner.lock().unwrap();
        inner.counts.clear();
        inner.names.clear();
        inner.order.clear();
        for record in records {
            if !inner.order.contains(&record.speaker) {
                inner.order.push(record.speaker);
            }
            inner
                .counts
                .insert((record.speaker, record.keyword), record.count);
        }
        for (speaker, name) in names {
            inner.names.insert(speaker, name);
        }
        Ok(())
    }

    /// Record one fresh keyword hit: bump the mirror, refresh the cached
    /// display name, then push the increment to the durable store.
    ///
    /// The mirror is updated optimistically; a store failure is logged and
    /// not rolled back.
    pub fn record_hit(&self, speaker: SpeakerId, display_name: &str, keyword: &str) {
        {
            let mut inner = self.inner.lock().unwrap();
            if !inner.order.contains(&speaker) {
                inner.order.push(speaker);
            }
            inner.names.insert(speaker, display_name.to_string());
            *inner
                .counts
                .entry((speaker, keyword.to_string()))
                .or_insert(0) += 1;
        }

        if let Err(e) = self.store.increment_or_insert(speaker, keyword, 1) {
            tracing::warn!(%speaker, keyword, "count store increment failed: {e}");
        }
        if let Err(e) = self.store.record_name(speaker, display_name) {
            tracing::warn!(%speaker, "count store name update failed: {e}");
        }
    }

    /// Mirror count for one (speaker, keyword) pair.
    pub fn count(&self, speaker: SpeakerId, keyword: &str) -> u64 {
        self.inner
            .lock()
            .unwrap()
            .counts
            .get(&(speaker, keyword.to_string()))
            .copied()
            .unwrap_or(0)
    }

    /// Last-known display name, if any hit or preload recorded one.
    pub fn display_name(&self, speaker: SpeakerId) -> Option<String> {
        self.inner.lock().unwrap().names.get(&speaker).cloned()
    }

    /// Current leaderboard: per-speaker totals across all keywords, sorted
    /// descending, ties kept in first-detection order by the stable sort.
    pub fn ranking(&self) -> Vec<RankEntry> {
        let inner = self.inner.lock().unwrap();
        let mut entries: Vec<RankEntry> = inner
            .order
            .iter()
            .map(|&speaker| {
                let total = inner
                    .counts
                    .iter()
                    .filter(|((s, _), _)| *s == speaker)
                    .map(|(_, count)| count)
                    .sum();
                let display_name = inner
                    .names
                    .get(&speaker)
                    .cloned()
                    .unwrap_or_else(|| format!("speaker {speaker}"));
                RankEntry {
                    speaker,
                    display_name,
                    total,
                }
            })
            .collect();
        entries.sort_by(|a, b| b.total.cmp(&a.total));
        entries
    }
}
