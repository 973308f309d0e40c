use crate::engine_trait::{SpeechEngine, SpeechSession};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tallyvox_core::{Fragment, SttError};

/// Engine that recognizes nothing: every `accept` yields an empty partial.
/// Lets the full pipeline run without a model on disk.
pub struct NullEngine {
    accept_count: Arc<AtomicUsize>,
}

impl NullEngine {
    pub fn new() -> Self {
        Self {
            accept_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Total `accept` calls across all sessions opened from this engine.
    pub fn accept_count(&self) -> usize {
        self.accept_count.load(Ordering::Relaxed)
    }
}

impl Default for NullEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SpeechEngine for NullEngine {
    fn name(&self) -> &str {
        "null"
    }

    fn initialize(&mut self, _config: toml::Value) -> Result<(), SttError> {
        Ok(())
    }

    fn open_session(&self, sample_rate: u32) -> Result<Box<dyn SpeechSession>, SttError> {
        tracing::trace!(sample_rate, "opening null session");
        Ok(Box::new(NullSession {
            accept_count: Arc::clone(&self.accept_count),
        }))
    }
}

struct NullSession {
    accept_count: Arc<AtomicUsize>,
}

impl SpeechSession for NullSession {
    fn accept(&mut self, _pcm: &[i16]) -> Result<Fragment, SttError> {
        self.accept_count.fetch_add(1, Ordering::Relaxed);
        Ok(Fragment::Partial(String::new()))
    }

    fn reset(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_engine_name() {
        let engine = NullEngine::new();
        assert_eq!(engine.name(), "null");
    }

    #[test]
    fn test_null_engine_initialize_succeeds() {
        let mut engine = NullEngine::new();
        assert!(engine
            .initialize(toml::Value::Table(Default::default()))
            .is_ok());
    }

    #[test]
    fn test_null_session_yields_empty_partials() {
        let engine = NullEngine::new();
        let mut session = engine.open_session(16000).unwrap();
        let fragment = session.accept(&[0i16; 320]).unwrap();
        assert_eq!(fragment, Fragment::Partial(String::new()));
        assert!(!fragment.is_final());
    }

    #[test]
    fn test_null_engine_counts_accepts_across_sessions() {
        let engine = NullEngine::new();
        let mut a = engine.open_session(16000).unwrap();
        let mut b = engine.open_session(16000).unwrap();
        a.accept(&[0i16; 10]).unwrap();
        b.accept(&[0i16; 10]).unwrap();
        b.accept(&[0i16; 10]).unwrap();
        assert_eq!(engine.accept_count(), 3);
    }

    #[test]
    fn test_null_engine_implements_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<NullEngine>();
    }
}
