pub mod engine_trait;
pub mod null_engine;
pub mod registry;
pub mod scripted_engine;

#[cfg(feature = "vosk")]
pub mod vosk_engine;

pub use engine_trait::{SpeechEngine, SpeechSession};
pub use null_engine::NullEngine;
pub use registry::EngineRegistry;
pub use scripted_engine::ScriptedEngine;

#[cfg(feature = "vosk")]
pub use vosk_engine::VoskEngine;
