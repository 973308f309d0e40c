use std::time::Instant;

/// Stable numeric identity of one voice-session participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpeakerId(pub u64);

impl std::fmt::Display for SpeakerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A participant as seen on the transport's delivery path. The display name
/// is whatever the transport last reported; it may lag renames.
#[derive(Debug, Clone)]
pub struct Speaker {
    pub id: SpeakerId,
    pub display_name: String,
    pub bot: bool,
}

/// One buffer of raw transport audio: interleaved 16-bit signed little-endian
/// PCM, two channels, at the configured source rate, tagged with the speaker
/// as reported at delivery time. Immutable once queued; ownership moves from
/// the sink to exactly one worker's queue.
#[derive(Debug, Clone)]
pub struct AudioFrame {
    pub speaker: Speaker,
    pub pcm: Vec<u8>,
}

/// A unit of transcribed text from one recognizer session.
///
/// A `Partial` is tentative and may be superseded by a later fragment covering
/// overlapping audio; a `Final` is committed. Call sites match exhaustively so
/// the reset-after-final rule cannot be skipped by accident.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    Partial(String),
    Final(String),
}

impl Fragment {
    pub fn text(&self) -> &str {
        match self {
            Fragment::Partial(text) | Fragment::Final(text) => text,
        }
    }

    pub fn is_final(&self) -> bool {
        matches!(self, Fragment::Final(_))
    }
}

/// A fresh, debounced keyword detection for one speaker.
#[derive(Debug, Clone)]
pub struct KeywordHit {
    pub speaker: SpeakerId,
    pub keyword: String,
    pub at: Instant,
}

/// One persisted (speaker, keyword) tally row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountRecord {
    pub speaker: SpeakerId,
    pub keyword: String,
    pub count: u64,
}

/// One leaderboard line: a speaker's total across all keywords.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankEntry {
    pub speaker: SpeakerId,
    pub display_name: String,
    pub total: u64,
}
