pub mod config;
pub mod error;
pub mod types;

pub use config::AppConfig;
pub use error::{AudioError, ConfigError, SttError, StoreError};
pub use types::{AudioFrame, CountRecord, Fragment, KeywordHit, RankEntry, Speaker, SpeakerId};
