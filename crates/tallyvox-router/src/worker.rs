use crate::matcher::KeywordMatcher;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tallyvox_audio::Resampler;
use tallyvox_core::{AudioFrame, Fragment, SpeakerId};
use tallyvox_stt::SpeechSession;
use tallyvox_store::Scoreboard;

/// The sink's grip on one running speaker thread.
///
/// Dropping the handle drops the frame sender, which the worker observes as a
/// disconnect; `signal_stop` additionally raises the cooperative stop flag so
/// any frames still queued are abandoned rather than drained.
pub(crate) struct WorkerHandle {
    tx: Sender<AudioFrame>,
    stop: Arc<AtomicBool>,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl WorkerHandle {
    pub(crate) fn spawn(
        speaker_id: SpeakerId,
        queue_capacity: usize,
        poll: Duration,
        resampler: Resampler,
        session: Box<dyn SpeechSession>,
        matcher: KeywordMatcher,
        scoreboard: Arc<Scoreboard>,
    ) -> Self {
        let (tx, rx) = crossbeam_channel::bounded(queue_capacity);
        let stop = Arc::new(AtomicBool::new(false));

        let worker = SpeakerWorker {
            speaker_id,
            frames: rx,
            stop: Arc::clone(&stop),
            poll,
            resampler,
            session,
            matcher,
            scoreboard,
        };
        let thread = std::thread::Builder::new()
            .name(format!("speaker-{speaker_id}"))
            .spawn(move || worker.run())
            .expect("failed to spawn speaker worker thread");

        Self {
            tx,
            stop,
            thread: Some(thread),
        }
    }

    pub(crate) fn sender(&self) -> Sender<AudioFrame> {
        self.tx.clone()
    }

    pub(crate) fn signal_stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    /// Signal and wait for the thread; bounded by one poll interval plus any
    /// in-flight frame.
    pub(crate) fn stop_and_join(mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// Per-speaker pipeline: one queue, one resampler, one recognizer session,
/// one matcher slice, consumed by a single dedicated thread. Nothing here is
/// shared with other speakers except the scoreboard, which guards itself.
struct SpeakerWorker {
    speaker_id: SpeakerId,
    frames: Receiver<AudioFrame>,
    stop: Arc<AtomicBool>,
    poll: Duration,
    resampler: Resampler,
    session: Box<dyn SpeechSession>,
    matcher: KeywordMatcher,
    scoreboard: Arc<Scoreboard>,
}

impl SpeakerWorker {
    fn run(mut self) {
        tracing::debug!(speaker = %self.speaker_id, "speaker worker started");
        loop {
            if self.stop.load(Ordering::Relaxed) {
                break;
            }
            match self.frames.recv_timeout(self.poll) {
                Ok(frame) => self.process(frame),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        tracing::debug!(speaker = %self.speaker_id, "speaker worker stopped");
    }

    fn process(&mut self, frame: AudioFrame) {
        if frame.pcm.is_empty() {
            return;
        }
        let samples = self.resampler.convert(&frame.pcm);
        if samples.is_empty() {
            return;
        }

        let fragment = match self.session.accept(&samples) {
            Ok(fragment) => fragment,
            Err(e) => {
                // Engine trouble costs this frame, not the worker.
                tracing::warn!(speaker = %self.speaker_id, "recognizer error, frame dropped: {e}");
                return;
            }
        };

        let hits = self
            .matcher
            .check(self.speaker_id, fragment.text(), Instant::now());
        for hit in &hits {
            tracing::info!(
                speaker = %self.speaker_id,
                keyword = %hit.keyword,
                "keyword detected"
            );
            self.scoreboard
                .record_hit(hit.speaker, &frame.speaker.display_name, &hit.keyword);
        }

        match fragment {
            Fragment::Final(_) => self.session.reset(),
            Fragment::Partial(_) => {}
        }
    }
}
