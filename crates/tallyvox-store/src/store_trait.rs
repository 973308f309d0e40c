use tallyvox_core::{CountRecord, SpeakerId, StoreError};

/// Durable (speaker, keyword) tally storage.
///
/// `increment_or_insert` is the only mutation path for counts; implementations
/// must make it safe to call concurrently from several worker threads.
pub trait CountStore: Send + Sync {
    /// Atomic upsert: create the (speaker, keyword) row with `delta` if
    /// absent, otherwise add `delta` to the existing count.
    fn increment_or_insert(
        &self,
        speaker: SpeakerId,
        keyword: &str,
        delta: u64,
    ) -> Result<(), StoreError>;

    /// Read every persisted tally row.
    fn read_all(&self) -> Result<Vec<CountRecord>, StoreError>;

    /// Upsert the last-known display name for a speaker.
    fn record_name(&self, speaker: SpeakerId, name: &str) -> Result<(), StoreError>;

    /// Read every persisted (speaker, name) pair.
    fn read_names(&self) -> Result<Vec<(SpeakerId, String)>, StoreError>;
}
