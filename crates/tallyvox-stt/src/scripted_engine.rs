use crate::engine_trait::{SpeechEngine, SpeechSession};
use tallyvox_core::{Fragment, SttError};

/// Engine whose sessions replay a fixed fragment script, one fragment per
/// `accept` call, then empty partials once the script runs out.
///
/// Every session gets its own cursor over the same script, which keeps
/// multi-speaker behavior deterministic. `reset` is a no-op: a scripted
/// fragment models audio the decoder has already consumed.
pub struct ScriptedEngine {
    script: Vec<Fragment>,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self { script: Vec::new() }
    }

    pub fn with_script(script: Vec<Fragment>) -> Self {
        Self { script }
    }
}

impl Default for ScriptedEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SpeechEngine for ScriptedEngine {
    fn name(&self) -> &str {
        "scripted"
    }

    fn initialize(&mut self, config: toml::Value) -> Result<(), SttError> {
        let Some(entries) = config.get("fragments").and_then(|v| v.as_array()) else {
            return Ok(()); // empty script is valid
        };

        let mut script = Vec::with_capacity(entries.len());
        for entry in entries {
            let text = entry
                .get("text")
                .and_then(|v| v.as_str())
                .ok_or_else(|| {
                    SttError::InitializationFailed(
                        "scripted fragment missing 'text'".to_string(),
                    )
                })?
                .to_string();
            let is_final = entry.get("final").and_then(|v| v.as_bool()).unwrap_or(false);
            script.push(if is_final {
                Fragment::Final(text)
            } else {
                Fragment::Partial(text)
            });
        }
        self.script = script;
        Ok(())
    }

    fn open_session(&self, _sample_rate: u32) -> Result<Box<dyn SpeechSession>, SttError> {
        Ok(Box::new(ScriptedSession {
            script: self.script.clone(),
            cursor: 0,
        }))
    }
}

struct ScriptedSession {
    script: Vec<Fragment>,
    cursor: usize,
}

impl SpeechSession for ScriptedSession {
    fn accept(&mut self, _pcm: &[i16]) -> Result<Fragment, SttError> {
        match self.script.get(self.cursor) {
            Some(fragment) => {
                self.cursor += 1;
                Ok(fragment.clone())
            }
            None => Ok(Fragment::Partial(String::new())),
        }
    }

    fn reset(&mut self) {}
}
