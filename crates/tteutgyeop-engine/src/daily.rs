//! Deterministic choice of one answer per calendar day.
//!
//! Selection is a pure function of the date key and the corpus snapshot:
//! the seed is an FNV-1a hash of a namespaced date key, the offset is the
//! seed modulo the size of the answer pool, and a rejected record reseeds
//! with the attempt number appended. The retry bound is explicit in
//! [`Selection`].

use tracing::{debug, error, info};
use tteutgyeop_lexicon::{AnswerFilter, LexiconStore};
use tteutgyeop_text::is_hangul_syllable;
use tteutgyeop_types::{DailyAnswer, DateKey, LexicalRecord, Level};

use crate::error::EngineError;

pub const SEED_NAMESPACE: &str = "tteutgyeop:daily:";
pub const MAX_ATTEMPTS: u32 = 12;

const MIN_DEFINITION_CHARS: usize = 4;
const MAX_DEFINITION_CHARS: usize = 200;
const MIN_WORD_SYLLABLES: usize = 2;
const MAX_WORD_SYLLABLES: usize = 6;

/// Definition markers for entries players should never get as an answer:
/// dialect, archaic and North Korean usage, non-standard spellings, slurs.
const RED_FLAGS: &[&str] = &[
    "방언",
    "사투리",
    "옛말",
    "고어",
    "북한어",
    "북한에서",
    "잘못",
    "비표준어",
    "속되게",
    "속된",
    "낮잡아",
    "비속어",
    "은어",
];

const FNV_OFFSET: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

pub fn fnv1a32(bytes: &[u8]) -> u32 {
    bytes.iter().fold(FNV_OFFSET, |hash, b| {
        (hash ^ u32::from(*b)).wrapping_mul(FNV_PRIME)
    })
}

/// Seed for the given attempt. Attempt 0 hashes the bare key.
pub fn daily_seed(date_key: &DateKey, attempt: u32) -> u32 {
    let mut input = format!("{SEED_NAMESPACE}{date_key}");
    if attempt > 0 {
        input.push('#');
        input.push_str(&attempt.to_string());
    }
    fnv1a32(input.as_bytes())
}

/// Why a record was turned down as an answer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Ineligible {
    DefinitionLength(usize),
    WordShape,
    RedFlag(&'static str),
}

pub fn check_eligibility(record: &LexicalRecord) -> Result<(), Ineligible> {
    let definition = record.definition.trim();
    let chars = definition.chars().count();
    if !(MIN_DEFINITION_CHARS..=MAX_DEFINITION_CHARS).contains(&chars) {
        return Err(Ineligible::DefinitionLength(chars));
    }
    let syllables = record.word_len();
    if !(MIN_WORD_SYLLABLES..=MAX_WORD_SYLLABLES).contains(&syllables)
        || !record.word.chars().all(is_hangul_syllable)
    {
        return Err(Ineligible::WordShape);
    }
    if let Some(flag) = RED_FLAGS.iter().copied().find(|flag| definition.contains(flag)) {
        return Err(Ineligible::RedFlag(flag));
    }
    Ok(())
}

pub fn is_eligible(record: &LexicalRecord) -> bool {
    check_eligibility(record).is_ok()
}

/// Levels preferred for answers when the corpus carries levels at all.
pub fn answer_pool() -> AnswerFilter {
    AnswerFilter::levels([Level::Beginner, Level::Intermediate])
}

/// Selector state. Every transition either accepts, moves to the next
/// attempt, or exhausts, so the loop in [`select_daily_answer`] is bounded
/// by [`MAX_ATTEMPTS`].
#[derive(Debug)]
pub enum Selection {
    Seeking { attempt: u32 },
    Validating { attempt: u32, record: Option<LexicalRecord> },
    Accepted(LexicalRecord),
    Exhausted,
}

impl Selection {
    fn after_validation(attempt: u32, record: Option<LexicalRecord>) -> Self {
        match record {
            Some(record) => match check_eligibility(&record) {
                Ok(()) => Selection::Accepted(record),
                Err(reason) => {
                    debug!("attempt {attempt}: rejected {:?} ({reason:?})", record.word);
                    Selection::next(attempt)
                }
            },
            None => {
                debug!("attempt {attempt}: no record at offset");
                Selection::next(attempt)
            }
        }
    }

    fn next(attempt: u32) -> Self {
        if attempt + 1 >= MAX_ATTEMPTS {
            Selection::Exhausted
        } else {
            Selection::Seeking {
                attempt: attempt + 1,
            }
        }
    }
}

/// Pick the answer for `date_key`.
///
/// Records at beginner or intermediate level are preferred; a corpus without
/// any such record falls back to the whole corpus.
pub async fn select_daily_answer<S: LexiconStore>(
    date_key: &DateKey,
    store: &S,
) -> Result<DailyAnswer, EngineError> {
    let mut filter = answer_pool();
    let mut pool = store
        .count(&filter)
        .await
        .map_err(|err| EngineError::unavailable("count answer pool", err))?;
    if pool == 0 {
        filter = AnswerFilter::any();
        pool = store
            .count(&filter)
            .await
            .map_err(|err| EngineError::unavailable("count corpus", err))?;
    }
    if pool == 0 {
        return Err(EngineError::DataUnavailable("lexicon is empty".into()));
    }

    let mut state = Selection::Seeking { attempt: 0 };
    loop {
        state = match state {
            Selection::Seeking { attempt } => {
                let offset = daily_seed(date_key, attempt) as usize % pool;
                let record = store
                    .fetch_at_offset(offset, &filter)
                    .await
                    .map_err(|err| EngineError::unavailable("fetch answer candidate", err))?;
                Selection::Validating { attempt, record }
            }
            Selection::Validating { attempt, record } => {
                Selection::after_validation(attempt, record)
            }
            Selection::Accepted(record) => {
                info!("daily answer for {date_key} selected from a pool of {pool}");
                return Ok(DailyAnswer {
                    date_key: date_key.clone(),
                    record,
                });
            }
            Selection::Exhausted => {
                error!(
                    "no eligible answer for {date_key} in {MAX_ATTEMPTS} attempts; \
                     check corpus quality"
                );
                return Err(EngineError::EligibilityExhausted {
                    date_key: date_key.clone(),
                    attempts: MAX_ATTEMPTS,
                });
            }
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(word: &str, definition: &str) -> LexicalRecord {
        LexicalRecord {
            id: 1,
            word: word.into(),
            part_of_speech: None,
            level: None,
            definition: definition.into(),
            example: String::new(),
        }
    }

    #[test]
    fn fnv1a_matches_reference_vectors() {
        assert_eq!(fnv1a32(b""), 0x811c_9dc5);
        assert_eq!(fnv1a32(b"a"), 0xe40c_292c);
        assert_eq!(fnv1a32(b"foobar"), 0xbf9c_f968);
    }

    #[test]
    fn seeds_differ_per_day_and_attempt() {
        let today = DateKey::parse("2025-03-01").unwrap();
        let tomorrow = DateKey::parse("2025-03-02").unwrap();
        assert_eq!(daily_seed(&today, 0), daily_seed(&today, 0));
        assert_ne!(daily_seed(&today, 0), daily_seed(&tomorrow, 0));
        assert_ne!(daily_seed(&today, 0), daily_seed(&today, 1));
        assert_eq!(
            daily_seed(&today, 3),
            fnv1a32("tteutgyeop:daily:2025-03-01#3".as_bytes())
        );
    }

    #[test]
    fn eligibility_rules() {
        assert!(is_eligible(&record("사과", "사과나무의 열매.")));
        assert_eq!(
            check_eligibility(&record("사과", "열매")),
            Err(Ineligible::DefinitionLength(2))
        );
        assert_eq!(
            check_eligibility(&record("해", "하늘에 떠 있는 별.")),
            Err(Ineligible::WordShape)
        );
        assert_eq!(
            check_eligibility(&record("TV방송", "텔레비전으로 하는 방송.")),
            Err(Ineligible::WordShape)
        );
        assert_eq!(
            check_eligibility(&record("가새", "‘가위’의 방언.")),
            Err(Ineligible::RedFlag("방언"))
        );
        let long = "가".repeat(201);
        assert!(!is_eligible(&record("사과", &long)));
    }

    #[test]
    fn selection_is_bounded() {
        let mut state = Selection::Seeking { attempt: 0 };
        let mut steps = 0;
        while let Selection::Seeking { attempt } = state {
            state = Selection::after_validation(attempt, Some(record("해", "너무 짧은 단어.")));
            steps += 1;
        }
        assert!(matches!(state, Selection::Exhausted));
        assert_eq!(steps, MAX_ATTEMPTS);
    }
}
