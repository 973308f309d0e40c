pub mod matcher;
pub mod sink;
mod worker;

pub use matcher::{KeywordMatcher, KeywordSet};
pub use sink::{SinkConfig, VoiceSink};
