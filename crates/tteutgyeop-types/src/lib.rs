//! Shared types for the daily word game.
//!
//! Every layer above this crate (text processing, lexicon stores, the scoring
//! engine, the HTTP shell) speaks in terms of these values. Records are the
//! logical shape of a dictionary entry after schema adaptation; nothing here
//! knows about physical column names or storage.
//!
//! ```rust
//! use tteutgyeop_types::{DateKey, PartOfSpeech};
//!
//! let key = DateKey::parse("2025-03-01").unwrap();
//! assert_eq!(key.as_str(), "2025-03-01");
//! assert_eq!(PartOfSpeech::from_label("명사"), Some(PartOfSpeech::Noun));
//! ```

use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Offset of the reference timezone (Asia/Seoul, no daylight saving).
pub const REFERENCE_OFFSET_SECS: i32 = 9 * 60 * 60;

/// Part-of-speech tag carried by a dictionary entry.
///
/// Datasets spell these differently (`명사`, `noun`, `n`); unknown labels are
/// preserved verbatim in [`PartOfSpeech::Other`] so that two records tagged
/// with the same unusual label still compare equal.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PartOfSpeech {
    Noun,
    Pronoun,
    Numeral,
    Verb,
    Adjective,
    Adverb,
    Determiner,
    Interjection,
    Particle,
    Other(String),
}

impl PartOfSpeech {
    /// Parse a dataset label. Blank labels yield `None`.
    pub fn from_label(raw: &str) -> Option<Self> {
        let label = raw.trim().trim_matches(|c| c == '「' || c == '」');
        if label.is_empty() {
            return None;
        }
        Some(match label.to_lowercase().as_str() {
            "명사" | "noun" | "n" => PartOfSpeech::Noun,
            "대명사" | "pronoun" | "pron" => PartOfSpeech::Pronoun,
            "수사" | "numeral" | "num" => PartOfSpeech::Numeral,
            "동사" | "verb" | "v" => PartOfSpeech::Verb,
            "형용사" | "adjective" | "adj" | "a" => PartOfSpeech::Adjective,
            "부사" | "adverb" | "adv" | "r" => PartOfSpeech::Adverb,
            "관형사" | "determiner" | "det" => PartOfSpeech::Determiner,
            "감탄사" | "interjection" | "intj" => PartOfSpeech::Interjection,
            "조사" | "particle" => PartOfSpeech::Particle,
            _ => PartOfSpeech::Other(label.to_string()),
        })
    }

    /// Korean display label.
    pub fn label(&self) -> &str {
        match self {
            PartOfSpeech::Noun => "명사",
            PartOfSpeech::Pronoun => "대명사",
            PartOfSpeech::Numeral => "수사",
            PartOfSpeech::Verb => "동사",
            PartOfSpeech::Adjective => "형용사",
            PartOfSpeech::Adverb => "부사",
            PartOfSpeech::Determiner => "관형사",
            PartOfSpeech::Interjection => "감탄사",
            PartOfSpeech::Particle => "조사",
            PartOfSpeech::Other(label) => label,
        }
    }
}

impl fmt::Display for PartOfSpeech {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<String> for PartOfSpeech {
    fn from(value: String) -> Self {
        PartOfSpeech::from_label(&value).unwrap_or(PartOfSpeech::Other(value))
    }
}

impl From<PartOfSpeech> for String {
    fn from(value: PartOfSpeech) -> Self {
        value.label().to_string()
    }
}

/// Vocabulary difficulty attached to some dataset versions.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Beginner,
    Intermediate,
    Advanced,
}

impl Level {
    /// Parse the difficulty spellings seen across dataset versions.
    pub fn from_label(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "초급" | "beginner" | "easy" | "1" => Some(Level::Beginner),
            "중급" | "intermediate" | "medium" | "2" => Some(Level::Intermediate),
            "고급" | "advanced" | "hard" | "3" => Some(Level::Advanced),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Level::Beginner => "초급",
            Level::Intermediate => "중급",
            Level::Advanced => "고급",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A dictionary entry in its logical shape.
///
/// `word` is already the canonical headword (separators and caret markers
/// stripped). Missing text fields are empty strings, never absent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LexicalRecord {
    pub id: u64,
    pub word: String,
    pub part_of_speech: Option<PartOfSpeech>,
    pub level: Option<Level>,
    pub definition: String,
    pub example: String,
}

impl LexicalRecord {
    /// Headword length in characters (syllables for Hangul).
    pub fn word_len(&self) -> usize {
        self.word.chars().count()
    }
}

/// Calendar day in the reference timezone, formatted `YYYY-MM-DD`.
#[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DateKey(String);

#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[error("invalid date key {0:?}, expected YYYY-MM-DD")]
pub struct DateKeyError(pub String);

impl DateKey {
    /// Validate a `YYYY-MM-DD` key.
    pub fn parse(raw: &str) -> Result<Self, DateKeyError> {
        let trimmed = raw.trim();
        if trimmed.len() != 10 {
            return Err(DateKeyError(raw.to_string()));
        }
        NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
            .map(Self::from_date)
            .map_err(|_| DateKeyError(raw.to_string()))
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self(date.format("%Y-%m-%d").to_string())
    }

    /// Day containing `instant` in the reference timezone.
    pub fn for_instant(instant: DateTime<Utc>) -> Self {
        let local = instant + Duration::seconds(i64::from(REFERENCE_OFFSET_SECS));
        Self::from_date(local.date_naive())
    }

    /// Today's key in the reference timezone.
    pub fn today() -> Self {
        Self::for_instant(Utc::now())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for DateKey {
    type Error = DateKeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        DateKey::parse(&value)
    }
}

impl From<DateKey> for String {
    fn from(value: DateKey) -> Self {
        value.0
    }
}

/// The answer chosen for one calendar day.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DailyAnswer {
    pub date_key: DateKey,
    pub record: LexicalRecord,
}

impl DailyAnswer {
    /// Public view that does not leak the word or its definition.
    pub fn summary(&self) -> AnswerSummary {
        AnswerSummary {
            date_key: self.date_key.clone(),
            word_len: self.record.word_len(),
            part_of_speech: self.record.part_of_speech.clone(),
            level: self.record.level,
        }
    }
}

/// Answer metadata that is safe to show before the game ends.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnswerSummary {
    pub date_key: DateKey,
    pub word_len: usize,
    pub part_of_speech: Option<PartOfSpeech>,
    pub level: Option<Level>,
}

/// One leaderboard row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RankEntry {
    pub word: String,
    pub raw_score: f64,
    pub rank: usize,
    pub percent: u8,
}

/// Top-K leaderboard for one date key.
///
/// `entries` are ordered by `rank` ascending, ranks are dense and 1-based, and
/// the answer's own word never appears.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RankTable {
    pub date_key: DateKey,
    pub answer: AnswerSummary,
    pub max_raw_score: f64,
    pub entries: Vec<RankEntry>,
}

impl RankTable {
    pub fn empty(answer: AnswerSummary) -> Self {
        Self {
            date_key: answer.date_key.clone(),
            answer,
            max_raw_score: 0.0,
            entries: Vec::new(),
        }
    }

    /// Find a word's row. Linear; tables are bounded by Top-K.
    pub fn entry(&self, word: &str) -> Option<&RankEntry> {
        self.entries.iter().find(|e| e.word == word)
    }
}

/// Outcome of a single guess.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GuessResult {
    pub word: String,
    pub percent: u8,
    pub rank: Option<usize>,
    pub is_correct: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn date_key_rejects_malformed_input() {
        assert!(DateKey::parse("2025-02-30").is_err());
        assert!(DateKey::parse("2025-2-3").is_err());
        assert!(DateKey::parse("yesterday").is_err());
        assert_eq!(DateKey::parse(" 2025-02-03 ").unwrap().as_str(), "2025-02-03");
    }

    #[test]
    fn date_key_error_is_a_std_error() {
        let err = DateKey::parse("yesterday").unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid date key \"yesterday\", expected YYYY-MM-DD"
        );
        let boxed: Box<dyn std::error::Error> = Box::new(err);
        assert!(boxed.source().is_none());
    }

    #[test]
    fn date_key_rolls_over_in_reference_timezone() {
        // 15:00 UTC is already midnight in Seoul.
        let before = Utc.with_ymd_and_hms(2025, 1, 31, 14, 59, 59).unwrap();
        let after = Utc.with_ymd_and_hms(2025, 1, 31, 15, 0, 0).unwrap();
        assert_eq!(DateKey::for_instant(before).as_str(), "2025-01-31");
        assert_eq!(DateKey::for_instant(after).as_str(), "2025-02-01");
    }

    #[test]
    fn part_of_speech_accepts_dataset_spellings() {
        assert_eq!(PartOfSpeech::from_label("「명사」"), Some(PartOfSpeech::Noun));
        assert_eq!(PartOfSpeech::from_label("Verb"), Some(PartOfSpeech::Verb));
        assert_eq!(PartOfSpeech::from_label("  "), None);
        assert_eq!(
            PartOfSpeech::from_label("의존 명사"),
            Some(PartOfSpeech::Other("의존 명사".into()))
        );
    }

    #[test]
    fn summary_hides_word_and_definition() {
        let answer = DailyAnswer {
            date_key: DateKey::parse("2025-03-01").unwrap(),
            record: LexicalRecord {
                id: 7,
                word: "사과".into(),
                part_of_speech: Some(PartOfSpeech::Noun),
                level: Some(Level::Beginner),
                definition: "사과나무의 열매".into(),
                example: String::new(),
            },
        };
        let json = serde_json::to_string(&answer.summary()).unwrap();
        assert!(!json.contains("사과"));
        assert!(json.contains("\"word_len\":2"));
        assert!(json.contains("명사"));
    }

    #[test]
    fn serde_round_trips_through_cache_format() {
        let table = RankTable::empty(AnswerSummary {
            date_key: DateKey::parse("2025-03-01").unwrap(),
            word_len: 2,
            part_of_speech: Some(PartOfSpeech::Other("의존 명사".into())),
            level: None,
        });
        let raw = serde_json::to_string(&table).unwrap();
        let back: RankTable = serde_json::from_str(&raw).unwrap();
        assert_eq!(back, table);
    }
}
