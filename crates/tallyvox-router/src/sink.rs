use crate::matcher::{KeywordMatcher, KeywordSet};
use crate::worker::WorkerHandle;
use crossbeam_channel::TrySendError;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tallyvox_audio::Resampler;
use tallyvox_core::{AudioError, AudioFrame, Speaker, SpeakerId};
use tallyvox_stt::SpeechEngine;
use tallyvox_store::Scoreboard;

#[derive(Debug, Clone)]
pub struct SinkConfig {
    /// Transport PCM rate (interleaved stereo S16LE).
    pub source_rate: u32,
    /// Recognizer PCM rate (mono S16LE).
    pub target_rate: u32,
    /// Per-(speaker, keyword) refractory interval.
    pub debounce: Duration,
    /// Bounded per-speaker frame queue; a full queue drops frames.
    pub queue_capacity: usize,
    /// How long an idle worker blocks before re-checking its stop flag.
    pub poll: Duration,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            source_rate: 48000,
            target_rate: 16000,
            debounce: Duration::from_secs(2),
            queue_capacity: 64,
            poll: Duration::from_secs(1),
        }
    }
}

/// Receives speaker-tagged audio from the voice transport and fans it out to
/// per-speaker workers.
///
/// `dispatch` runs on the transport's delivery path and may be called
/// concurrently for different speakers; the worker registry mutex is the only
/// synchronization on that path, held just for the lookup-or-create step.
/// A sink lives for one voice session: after `session_ended` it drops every
/// frame, and a new session gets a new sink.
pub struct VoiceSink {
    config: SinkConfig,
    resampler: Resampler,
    engine: Arc<dyn SpeechEngine>,
    keywords: Arc<KeywordSet>,
    scoreboard: Arc<Scoreboard>,
    workers: Mutex<HashMap<SpeakerId, WorkerHandle>>,
    closed: AtomicBool,
}

impl VoiceSink {
    pub fn new(
        config: SinkConfig,
        engine: Arc<dyn SpeechEngine>,
        keywords: Arc<KeywordSet>,
        scoreboard: Arc<Scoreboard>,
    ) -> Result<Self, AudioError> {
        // Validate the rate contract once; workers clone this instance.
        let resampler = Resampler::new(config.source_rate, config.target_rate)?;
        if keywords.is_empty() {
            tracing::warn!("keyword set is empty, nothing will ever be counted");
        }
        Ok(Self {
            config,
            resampler,
            engine,
            keywords,
            scoreboard,
            workers: Mutex::new(HashMap::new()),
            closed: AtomicBool::new(false),
        })
    }

    /// Transport delivery callback: route one frame to its speaker's worker,
    /// creating the worker on the speaker's first frame.
    ///
    /// Never blocks on a slow recognizer: a full queue drops the frame.
    /// Absent and bot speakers and empty buffers are dropped here, before any
    /// worker exists to receive them.
    pub fn dispatch(&self, speaker: Option<&Speaker>, pcm: &[u8]) {
        let Some(speaker) = speaker else {
            return;
        };
        if speaker.bot || pcm.is_empty() {
            return;
        }
        if self.closed.load(Ordering::Relaxed) {
            tracing::trace!(speaker = %speaker.id, "sink closed, frame dropped");
            return;
        }

        let frame = AudioFrame {
            speaker: speaker.clone(),
            pcm: pcm.to_vec(),
        };

        let tx = {
            let mut workers = self.workers.lock().unwrap();
            let handle = match workers.entry(speaker.id) {
                Entry::Occupied(entry) => entry.into_mut(),
                Entry::Vacant(slot) => {
                    let session = match self.engine.open_session(self.config.target_rate) {
                        Ok(session) => session,
                        Err(e) => {
                            tracing::error!(
                                speaker = %speaker.id,
                                "failed to open recognizer session: {e}"
                            );
                            return;
                        }
                    };
                    tracing::info!(
                        speaker = %speaker.id,
                        name = %speaker.display_name,
                        "starting worker on first frame"
                    );
                    slot.insert(WorkerHandle::spawn(
                        speaker.id,
                        self.config.queue_capacity,
                        self.config.poll,
                        self.resampler.clone(),
                        session,
                        KeywordMatcher::new(Arc::clone(&self.keywords), self.config.debounce),
                        Arc::clone(&self.scoreboard),
                    ))
                }
            };
            handle.sender()
        };

        match tx.try_send(frame) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                tracing::warn!(speaker = %speaker.id, "frame queue full, frame dropped");
            }
            Err(TrySendError::Disconnected(_)) => {
                tracing::debug!(speaker = %speaker.id, "worker gone, frame dropped");
            }
        }
    }

    /// Join notifications are consumed lazily: nothing is allocated until the
    /// speaker's first audio frame arrives.
    pub fn speaker_joined(&self, id: SpeakerId) {
        tracing::trace!(speaker = %id, "speaker joined");
    }

    /// The speaker's session ended: release their worker. The thread is
    /// signalled and left to wind down on its own; it is not joined here
    /// because this runs on the transport's event path.
    pub fn speaker_left(&self, id: SpeakerId) {
        let handle = self.workers.lock().unwrap().remove(&id);
        if let Some(handle) = handle {
            handle.signal_stop();
            tracing::info!(speaker = %id, "worker released");
        }
    }

    /// The whole voice session ended: close the sink and stop every worker,
    /// waiting for each to finish its in-flight frame. Queued frames are
    /// abandoned.
    pub fn session_ended(&self) {
        self.closed.store(true, Ordering::Relaxed);
        let handles: Vec<WorkerHandle> = {
            let mut workers = self.workers.lock().unwrap();
            workers.drain().map(|(_, handle)| handle).collect()
        };
        let count = handles.len();
        for handle in handles {
            handle.stop_and_join();
        }
        if count > 0 {
            tracing::info!(workers = count, "voice session ended, workers stopped");
        }
    }

    /// Number of live workers, i.e. speakers with audio since the session
    /// started (minus any already released).
    pub fn active_speakers(&self) -> usize {
        self.workers.lock().unwrap().len()
    }
}

impl Drop for VoiceSink {
    fn drop(&mut self) {
        // Threads exit on sender disconnect; raise the flags so abandoned
        // queues are not drained first.
        if let Ok(workers) = self.workers.lock() {
            for handle in workers.values() {
                handle.signal_stop();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tallyvox_store::{MemoryCountStore, Scoreboard};
    use tallyvox_stt::NullEngine;

    fn test_sink() -> VoiceSink {
        let engine: Arc<dyn SpeechEngine> = Arc::new(NullEngine::new());
        let keywords = Arc::new(KeywordSet::new(["hello"]));
        let scoreboard = Arc::new(Scoreboard::new(Arc::new(MemoryCountStore::new())));
        VoiceSink::new(SinkConfig::default(), engine, keywords, scoreboard).unwrap()
    }

    fn speaker(id: u64) -> Speaker {
        Speaker {
            id: SpeakerId(id),
            display_name: format!("speaker-{id}"),
            bot: false,
        }
    }

    #[test]
    fn test_new_rejects_bad_rate_ratio() {
        let engine: Arc<dyn SpeechEngine> = Arc::new(NullEngine::new());
        let keywords = Arc::new(KeywordSet::new(["hello"]));
        let scoreboard = Arc::new(Scoreboard::new(Arc::new(MemoryCountStore::new())));
        let config = SinkConfig {
            source_rate: 44100,
            ..SinkConfig::default()
        };
        assert!(VoiceSink::new(config, engine, keywords, scoreboard).is_err());
    }

    #[test]
    fn test_dispatch_none_speaker_is_dropped() {
        let sink = test_sink();
        sink.dispatch(None, &[0u8; 3840]);
        assert_eq!(sink.active_speakers(), 0);
    }

    #[test]
    fn test_dispatch_bot_speaker_is_dropped() {
        let sink = test_sink();
        let bot = Speaker {
            id: SpeakerId(1),
            display_name: "the bot".to_string(),
            bot: true,
        };
        sink.dispatch(Some(&bot), &[0u8; 3840]);
        assert_eq!(sink.active_speakers(), 0);
    }

    #[test]
    fn test_dispatch_empty_frame_creates_no_worker() {
        let sink = test_sink();
        sink.dispatch(Some(&speaker(1)), &[]);
        assert_eq!(sink.active_speakers(), 0);
    }

    #[test]
    fn test_dispatch_first_frame_creates_one_worker() {
        let sink = test_sink();
        sink.dispatch(Some(&speaker(1)), &[0u8; 3840]);
        sink.dispatch(Some(&speaker(1)), &[0u8; 3840]);
        assert_eq!(sink.active_speakers(), 1);
        sink.dispatch(Some(&speaker(2)), &[0u8; 3840]);
        assert_eq!(sink.active_speakers(), 2);
        sink.session_ended();
    }

    #[test]
    fn test_speaker_joined_allocates_nothing() {
        let sink = test_sink();
        sink.speaker_joined(SpeakerId(5));
        assert_eq!(sink.active_speakers(), 0);
    }

    #[test]
    fn test_speaker_left_releases_worker() {
        let sink = test_sink();
        sink.dispatch(Some(&speaker(1)), &[0u8; 3840]);
        assert_eq!(sink.active_speakers(), 1);
        sink.speaker_left(SpeakerId(1));
        assert_eq!(sink.active_speakers(), 0);
        // Unknown speaker: a no-op.
        sink.speaker_left(SpeakerId(99));
    }

    #[test]
    fn test_session_ended_closes_sink() {
        let sink = test_sink();
        sink.dispatch(Some(&speaker(1)), &[0u8; 3840]);
        sink.session_ended();
        assert_eq!(sink.active_speakers(), 0);

        sink.dispatch(Some(&speaker(1)), &[0u8; 3840]);
        assert_eq!(sink.active_speakers(), 0);
    }

    #[test]
    fn test_concurrent_first_frames_create_one_worker() {
        let sink = Arc::new(test_sink());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let sink = Arc::clone(&sink);
            handles.push(std::thread::spawn(move || {
                sink.dispatch(Some(&speaker(7)), &[0u8; 3840]);
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(sink.active_speakers(), 1);
        sink.session_ended();
    }
}
