use thiserror::Error;
use tteutgyeop_types::DateKey;

/// Failures surfaced to callers of the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The guess is empty or cannot be normalized into a word. Not retried.
    #[error("invalid input: {0}")]
    Input(String),
    /// The guessed word is not in the lexicon (distinct from a low score).
    #[error("not in dictionary: {0}")]
    NotFound(String),
    /// Corpus unreachable or empty; the caller may retry later.
    #[error("data unavailable: {0}")]
    DataUnavailable(String),
    /// No eligible answer within the retry bound. Indicates bad data.
    #[error("no eligible answer for {date_key} after {attempts} attempts")]
    EligibilityExhausted { date_key: DateKey, attempts: u32 },
}

impl EngineError {
    pub(crate) fn input<T: Into<String>>(msg: T) -> Self {
        EngineError::Input(msg.into())
    }

    /// Wrap a store failure, keeping the whole cause chain in the message.
    pub(crate) fn unavailable(context: &str, err: anyhow::Error) -> Self {
        EngineError::DataUnavailable(format!("{context}: {err:#}"))
    }
}

/// Failures of the cache collaborator. Never escape the engine: every call
/// site logs and degrades to a cache miss.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend unavailable: {0}")]
    Backend(String),
    #[error("cached value under {key} is unreadable: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("value for {key} cannot be encoded: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}
