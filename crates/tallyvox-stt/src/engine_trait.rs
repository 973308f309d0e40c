use tallyvox_core::{Fragment, SttError};

/// A loaded speech-recognition backend from which per-speaker sessions are
/// opened. The engine (typically a shared acoustic model) is the expensive
/// part; sessions are cheap and short-lived by comparison.
pub trait SpeechEngine: Send + Sync {
    /// Returns the engine's registry name (e.g. `"vosk"`, `"null"`).
    fn name(&self) -> &str;
    /// One-time initialisation with engine-specific TOML configuration.
    /// A missing or unloadable model resource fails here, before any audio
    /// flows.
    fn initialize(&mut self, config: toml::Value) -> Result<(), SttError>;
    /// Open a fresh decoding session expecting mono S16LE PCM at
    /// `sample_rate`.
    fn open_session(&self, sample_rate: u32) -> Result<Box<dyn SpeechSession>, SttError>;
}

/// One speaker's streaming decoder state.
///
/// A session is opened once per speaker and reused for that speaker's whole
/// active period; it is owned exclusively by one worker and never shared.
/// `accept` may block for the duration of decoding.
pub trait SpeechSession: Send {
    /// Feed one buffer and read back the current transcript fragment.
    fn accept(&mut self, pcm: &[i16]) -> Result<Fragment, SttError>;
    /// Discard decoder state after a committed fragment, so already-committed
    /// audio is not reprocessed.
    fn reset(&mut self);
}
