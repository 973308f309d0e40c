use crate::engine_trait::{SpeechEngine, SpeechSession};
use tallyvox_core::{Fragment, SttError};
use vosk::{DecodingState, Model, Recognizer};

/// Adapter over the vosk streaming decoder. The model is loaded once and
/// shared; each speaker gets its own `Recognizer`.
pub struct VoskEngine {
    model: Option<Model>,
}

impl VoskEngine {
    pub fn new() -> Self {
        Self { model: None }
    }
}

impl Default for VoskEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SpeechEngine for VoskEngine {
    fn name(&self) -> &str {
        "vosk"
    }

    fn initialize(&mut self, config: toml::Value) -> Result<(), SttError> {
        let model_path = config
            .get("model_path")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                SttError::InitializationFailed("missing 'model_path' in vosk config".to_string())
            })?;

        let model = Model::new(model_path).ok_or_else(|| {
            SttError::InitializationFailed(format!(
                "failed to load vosk model from {model_path}"
            ))
        })?;
        self.model = Some(model);

        tracing::info!(model_path = %model_path, "vosk model loaded");
        Ok(())
    }

    fn open_session(&self, sample_rate: u32) -> Result<Box<dyn SpeechSession>, SttError> {
        let model = self.model.as_ref().ok_or_else(|| {
            SttError::SessionOpen("vosk engine not initialized".to_string())
        })?;
        let recognizer = Recognizer::new(model, sample_rate as f32).ok_or_else(|| {
            SttError::SessionOpen(format!(
                "failed to create vosk recognizer at {sample_rate} Hz"
            ))
        })?;
        Ok(Box::new(VoskSession { recognizer }))
    }
}

struct VoskSession {
    recognizer: Recognizer,
}

impl SpeechSession for VoskSession {
    fn accept(&mut self, pcm: &[i16]) -> Result<Fragment, SttError> {
        let state = self
            .recognizer
            .accept_waveform(pcm)
            .map_err(|e| SttError::ProcessingFailed(e.to_string()))?;

        match state {
            DecodingState::Finalized => {
                let text = self
                    .recognizer
                    .result()
                    .single()
                    .map(|r| r.text.to_string())
                    .unwrap_or_default();
                Ok(Fragment::Final(text))
            }
            DecodingState::Running => Ok(Fragment::Partial(
                self.recognizer.partial_result().partial.to_string(),
            )),
            DecodingState::Failed => Err(SttError::ProcessingFailed(
                "decoder failed on buffer".to_string(),
            )),
        }
    }

    fn reset(&mut self) {
        self.recognizer.reset();
    }
}
