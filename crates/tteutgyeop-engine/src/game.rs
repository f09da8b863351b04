use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use tteutgyeop_lexicon::LexiconStore;
use tteutgyeop_text::{choseong, is_hangul_syllable, normalize};
use tteutgyeop_types::{
    AnswerSummary, DailyAnswer, DateKey, GuessResult, Level, PartOfSpeech, RankEntry, RankTable,
};

use crate::cache::{Cache, DAILY_TTL, DailyCache, answer_key, rank_key};
use crate::daily::select_daily_answer;
use crate::error::EngineError;
use crate::percent::{EXACT_PERCENT, PercentScale};
use crate::queue::RankBuildQueue;
use crate::rank::{RankConfig, build_daily_ranking};
use crate::scoring::SimilarityScorer;

pub const DEFAULT_TOP_LIMIT: usize = 10;
pub const MAX_COMMON_KEYWORDS: usize = 10;
pub const MAX_HINT_LEVEL: u8 = 3;

/// Engine tunables.
#[derive(Clone, Debug, PartialEq)]
pub struct EngineConfig {
    pub rank: RankConfig,
    pub cache_ttl: Duration,
    /// Entries returned by [`Game::top`] when the caller gives no limit.
    pub default_top: usize,
    /// Shared keywords reported with a guess.
    pub max_common: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rank: RankConfig::default(),
            cache_ttl: DAILY_TTL,
            default_top: DEFAULT_TOP_LIMIT,
            max_common: MAX_COMMON_KEYWORDS,
        }
    }
}

/// Extra feedback that accompanies a guess without revealing the answer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuessClues {
    /// Both parts of speech are known and equal.
    pub pos_match: bool,
    /// Absolute difference in syllable count.
    pub length_diff: usize,
    /// Meaningful words both entries use, longest first.
    pub common: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GuessOutcome {
    #[serde(flatten)]
    pub result: GuessResult,
    pub clues: GuessClues,
}

/// Progressive hint. Each level adds one fact and never the word itself.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hint {
    pub level: u8,
    pub part_of_speech: Option<PartOfSpeech>,
    pub word_len: usize,
    pub choseong: Option<String>,
    pub vocabulary_level: Option<Level>,
}

/// The game service: daily answer, guesses, hints, and the leaderboard.
///
/// Cheap to clone; every clone shares the store, cache, and build queue.
pub struct Game<S, C> {
    store: Arc<S>,
    cache: DailyCache<C>,
    scorer: Arc<SimilarityScorer>,
    config: Arc<EngineConfig>,
    queue: RankBuildQueue,
}

impl<S, C> Clone for Game<S, C> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            cache: self.cache.clone(),
            scorer: Arc::clone(&self.scorer),
            config: Arc::clone(&self.config),
            queue: self.queue.clone(),
        }
    }
}

impl<S, C> Game<S, C>
where
    S: LexiconStore + 'static,
    C: Cache + 'static,
{
    pub fn new(store: Arc<S>, cache: Arc<C>, config: EngineConfig) -> Self {
        Self {
            store,
            cache: DailyCache::with_ttl(cache, config.cache_ttl),
            scorer: Arc::new(SimilarityScorer::default()),
            config: Arc::new(config),
            queue: RankBuildQueue::new(),
        }
    }

    pub fn with_scorer(mut self, scorer: SimilarityScorer) -> Self {
        self.scorer = Arc::new(scorer);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn queue(&self) -> &RankBuildQueue {
        &self.queue
    }

    pub async fn daily_answer(&self, date_key: &DateKey) -> Result<DailyAnswer, EngineError> {
        self.cache
            .get_or_build(&answer_key(date_key), || {
                select_daily_answer(date_key, &*self.store)
            })
            .await
    }

    /// The day's leaderboard, building it on a cache miss.
    pub async fn ranking(&self, date_key: &DateKey) -> Result<RankTable, EngineError> {
        let answer = self.daily_answer(date_key).await?;
        let key = rank_key(date_key, self.config.rank.top_k);
        self.cache
            .get_or_build(&key, || {
                build_daily_ranking(&answer, &*self.store, &self.scorer, &self.config.rank)
            })
            .await
    }

    /// The day's leaderboard if it has already been built.
    pub async fn cached_ranking(&self, date_key: &DateKey) -> Option<RankTable> {
        self.cache
            .get(&rank_key(date_key, self.config.rank.top_k))
            .await
    }

    /// Queue a background leaderboard build for `date_key`. Returns `false`
    /// when a build for the same day is already running.
    pub fn warm_up(&self, date_key: &DateKey) -> bool {
        let key = rank_key(date_key, self.config.rank.top_k);
        let game = self.clone();
        let date_key = date_key.clone();
        self.queue.submit(key, async move {
            if let Err(err) = game.ranking(&date_key).await {
                warn!("background ranking for {date_key} failed: {err}");
            }
        })
    }

    /// Public facts about today's answer. Also starts the leaderboard build.
    pub async fn meta(&self, date_key: &DateKey) -> Result<AnswerSummary, EngineError> {
        let answer = self.daily_answer(date_key).await?;
        self.warm_up(date_key);
        Ok(answer.summary())
    }

    pub async fn guess(&self, date_key: &DateKey, raw: &str) -> Result<GuessOutcome, EngineError> {
        let word = normalize(raw);
        if word.is_empty() {
            return Err(EngineError::input("guess is empty"));
        }
        if !word.chars().any(is_hangul_syllable) {
            return Err(EngineError::input(format!("{raw:?} is not a Korean word")));
        }

        let answer = self.daily_answer(date_key).await?;
        let target = &answer.record;
        if word == target.word {
            info!("{date_key} solved");
            return Ok(GuessOutcome {
                result: GuessResult {
                    word,
                    percent: EXACT_PERCENT,
                    rank: None,
                    is_correct: true,
                },
                clues: GuessClues {
                    pos_match: target.part_of_speech.is_some(),
                    length_diff: 0,
                    common: Vec::new(),
                },
            });
        }

        let record = self
            .store
            .find_by_word(&word)
            .await
            .map_err(|err| EngineError::unavailable("look up guess", err))?
            .ok_or_else(|| EngineError::NotFound(word.clone()))?;

        let guess_profile = self.scorer.profile(&record);
        let answer_profile = self.scorer.profile(target);
        let raw_score = self.scorer.score_profiles(&guess_profile, &answer_profile);

        let table = self.cached_ranking(date_key).await;
        if table.is_none() {
            self.warm_up(date_key);
        }
        let entry = table.as_ref().and_then(|t| t.entry(&word));
        let percent = match entry {
            Some(entry) => entry.percent,
            None => {
                PercentScale::for_max(table.as_ref().map_or(0.0, |t| t.max_raw_score))
                    .percent(raw_score)
            }
        };

        let pos_match = matches!(
            (&record.part_of_speech, &target.part_of_speech),
            (Some(a), Some(b)) if a == b
        );
        let clues = GuessClues {
            pos_match,
            length_diff: record.word_len().abs_diff(target.word_len()),
            common: self.scorer.shared_keywords(
                &guess_profile,
                &answer_profile,
                self.config.max_common,
            ),
        };

        Ok(GuessOutcome {
            result: GuessResult {
                word,
                percent,
                rank: entry.map(|e| e.rank),
                is_correct: false,
            },
            clues,
        })
    }

    /// Hint for `level` (1..=3; higher levels are treated as 3).
    pub async fn hints(&self, date_key: &DateKey, level: u8) -> Result<Hint, EngineError> {
        if level == 0 {
            return Err(EngineError::input("hint level starts at 1"));
        }
        let level = level.min(MAX_HINT_LEVEL);
        let record = self.daily_answer(date_key).await?.record;
        Ok(Hint {
            level,
            part_of_speech: record.part_of_speech.clone(),
            word_len: record.word_len(),
            choseong: (level >= 2).then(|| choseong(&record.word)),
            vocabulary_level: if level >= 3 { record.level } else { None },
        })
    }

    /// Reveal the full answer.
    pub async fn give_up(&self, date_key: &DateKey) -> Result<DailyAnswer, EngineError> {
        let answer = self.daily_answer(date_key).await?;
        info!("{date_key} revealed");
        Ok(answer)
    }

    /// First `limit` leaderboard rows. An unavailable corpus yields an empty
    /// list; the leaderboard is not worth failing a page over.
    pub async fn top(
        &self,
        date_key: &DateKey,
        limit: Option<usize>,
    ) -> Result<Vec<RankEntry>, EngineError> {
        let limit = limit
            .unwrap_or(self.config.default_top)
            .min(self.config.rank.top_k);
        match self.ranking(date_key).await {
            Ok(table) => Ok(table.entries.into_iter().take(limit).collect()),
            Err(EngineError::DataUnavailable(msg)) => {
                warn!("leaderboard for {date_key} unavailable: {msg}");
                Ok(Vec::new())
            }
            Err(err) => Err(err),
        }
    }
}
