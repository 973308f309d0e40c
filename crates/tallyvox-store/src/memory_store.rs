use crate::store_trait::CountStore;
use std::collections::HashMap;
use std::sync::Mutex;
use tallyvox_core::{CountRecord, SpeakerId, StoreError};

/// Volatile store for tests and dry runs. Keeps insertion order so reads
/// behave like the SQLite store's rowid order.
#[derive(Default)]
pub struct MemoryCountStore {
    inner: Mutex<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    counts: Vec<CountRecord>,
    names: HashMap<SpeakerId, String>,
}

impl MemoryCountStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CountStore for MemoryCountStore {
    fn increment_or_insert(
        &self,
        speaker: SpeakerId,
        keyword: &str,
        delta: u64,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let existing = inner
            .counts
            .iter()
            .position(|r| r.speaker == speaker && r.keyword == keyword);
        match existing {
            Some(index) => inner.counts[index].count += delta,
            None => inner.counts.push(CountRecord {
                speaker,
                keyword: keyword.to_string(),
                count: delta,
            }),
        }
        Ok(())
    }

    fn read_all(&self) -> Result<Vec<CountRecord>, StoreError> {
        Ok(self.inner.lock().unwrap().counts.clone())
    }

    fn record_name(&self, speaker: SpeakerId, name: &str) -> Result<(), StoreError> {
        self.inner
            .lock()
            .unwrap()
            .names
            .insert(speaker, name.to_string());
        Ok(())
    }

    fn read_names(&self) -> Result<Vec<(SpeakerId, String)>, StoreError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .names
            .iter()
            .map(|(id, name)| (*id, name.clone()))
            .collect())
    }
}
