use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tallyvox_core::{KeywordHit, SpeakerId};

/// The session-wide keyword list: trimmed, lower-cased, empties and
/// duplicates dropped. Read-only after construction, so workers share it
/// without locking.
#[derive(Debug)]
pub struct KeywordSet {
    words: Vec<String>,
}

impl KeywordSet {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized = Vec::new();
        for word in words {
            let word = word.as_ref().trim().to_lowercase();
            if !word.is_empty() && !normalized.contains(&word) {
                normalized.push(word);
            }
        }
        Self { words: normalized }
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.words.iter().map(|w| w.as_str())
    }
}

/// Finds configured keywords in transcript fragments.
///
/// Matching is plain substring containment on the lower-cased text, so a
/// keyword inside a longer unrelated word also matches; that is a known and
/// accepted limitation. Each (speaker, keyword) pair has a refractory
/// interval so the overlapping partials a streaming recognizer emits cannot
/// count the same utterance twice.
pub struct KeywordMatcher {
    keywords: Arc<KeywordSet>,
    debounce: Duration,
    last_hit: HashMap<(SpeakerId, String), Instant>,
}

impl KeywordMatcher {
    pub fn new(keywords: Arc<KeywordSet>, debounce: Duration) -> Self {
        Self {
            keywords,
            debounce,
            last_hit: HashMap::new(),
        }
    }

    /// Check one fragment (partial or final alike) and return the hits whose
    /// debounce window has elapsed, stamping their clocks.
    pub fn check(&mut self, speaker: SpeakerId, text: &str, now: Instant) -> Vec<KeywordHit> {
        if text.is_empty() {
            return Vec::new();
        }
        let text = text.to_lowercase();

        let mut fresh = Vec::new();
        for keyword in &self.keywords.words {
            if !text.contains(keyword.as_str()) {
                continue;
            }
            let key = (speaker, keyword.clone());
            if let Some(&previous) = self.last_hit.get(&key) {
                if now.duration_since(previous) < self.debounce {
                    continue;
                }
            }
            self.last_hit.insert(key, now);
            fresh.push(KeywordHit {
                speaker,
                keyword: keyword.clone(),
                at: now,
            });
        }
        fresh
    }
}
