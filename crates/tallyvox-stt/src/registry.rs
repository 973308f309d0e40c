use crate::engine_trait::SpeechEngine;
use std::collections::HashMap;
use tallyvox_core::SttError;

pub struct EngineRegistry {
    factories: HashMap<String, fn() -> Box<dyn SpeechEngine>>,
}

impl EngineRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            factories: HashMap::new(),
        };
        registry.register("null", || Box::new(crate::null_engine::NullEngine::new()));
        registry.register("scripted", || {
            Box::new(crate::scripted_engine::ScriptedEngine::new())
        });
        #[cfg(feature = "vosk")]
        registry.register("vosk", || Box::new(crate::vosk_engine::VoskEngine::new()));
        registry
    }

    pub fn register(&mut self, name: &str, factory: fn() -> Box<dyn SpeechEngine>) {
        self.factories.insert(name.to_string(), factory);
    }

    pub fn create(&self, name: &str) -> Result<Box<dyn SpeechEngine>, SttError> {
        self.factories
            .get(name)
            .map(|f| f())
            .ok_or_else(|| SttError::EngineNotFound(name.to_string()))
    }

    pub fn list_engines(&self) -> Vec<&str> {
        self.factories.keys().map(|s| s.as_str()).collect()
    }
}

impl Default for EngineRegistry {
    fn default() -> Self {
        Self::new()
    }
}
