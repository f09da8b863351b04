use std::collections::HashSet;
use std::time::Instant;

use tracing::{info, warn};
use tteutgyeop_lexicon::LexiconStore;
use tteutgyeop_text::tokenize;
use tteutgyeop_types::{DailyAnswer, LexicalRecord, RankEntry, RankTable};

use crate::daily::fnv1a32;
use crate::error::EngineError;
use crate::percent::relative_percent;
use crate::scoring::SimilarityScorer;

pub const DEFAULT_TOP_K: usize = 3000;
pub const DEFAULT_CANDIDATE_LIMIT: usize = 4000;
pub const DEFAULT_CANDIDATE_FLOOR: usize = 400;
pub const DEFAULT_KEYWORD_LIMIT: usize = 20;

const SAMPLE_NAMESPACE: &str = "tteutgyeop:sample:";

/// Bounds for one leaderboard build.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RankConfig {
    /// Rows kept in the table.
    pub top_k: usize,
    /// Ceiling on records fetched and scored.
    pub candidate_limit: usize,
    /// Below this many search hits, random samples are merged in.
    pub candidate_floor: usize,
    /// Keywords taken from the answer for the narrowing search.
    pub keyword_limit: usize,
}

impl Default for RankConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            candidate_limit: DEFAULT_CANDIDATE_LIMIT,
            candidate_floor: DEFAULT_CANDIDATE_FLOOR,
            keyword_limit: DEFAULT_KEYWORD_LIMIT,
        }
    }
}

/// Search terms for an answer: the headword, then distinct definition and
/// example tokens in source order.
pub fn answer_keywords(record: &LexicalRecord, limit: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    std::iter::once(record.word.clone())
        .chain(tokenize(&record.definition))
        .chain(tokenize(&record.example))
        .filter(|token| !token.is_empty() && seen.insert(token.clone()))
        .take(limit)
        .collect()
}

/// Score a bounded candidate set against the day's answer and keep the
/// best `top_k`.
///
/// An empty or entirely unrelated candidate set yields an empty table. The
/// build fails only when the store could not produce candidates at all, so
/// that nothing gets cached for the day.
pub async fn build_daily_ranking<S: LexiconStore>(
    answer: &DailyAnswer,
    store: &S,
    scorer: &SimilarityScorer,
    config: &RankConfig,
) -> Result<RankTable, EngineError> {
    let start = Instant::now();
    let candidates = gather_candidates(answer, store, config).await?;
    let fetched = candidates.len();

    let target = scorer.profile(&answer.record);
    let mut seen = HashSet::new();
    let mut scored: Vec<(String, f64)> = Vec::new();
    for candidate in candidates {
        if candidate.word == answer.record.word || !seen.insert(candidate.word.clone()) {
            continue;
        }
        let raw = scorer.score_profiles(&scorer.profile(&candidate), &target);
        if raw > 0.0 {
            scored.push((candidate.word, raw));
        }
    }

    scored.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    let max_raw_score = scored.first().map_or(0.0, |(_, raw)| *raw);
    scored.truncate(config.top_k);

    let entries: Vec<RankEntry> = scored
        .into_iter()
        .enumerate()
        .map(|(idx, (word, raw_score))| RankEntry {
            percent: relative_percent(raw_score, max_raw_score),
            word,
            raw_score,
            rank: idx + 1,
        })
        .collect();

    info!(
        "ranking for {} built: {fetched} candidates, {} ranked, max {:.3} in {} ms",
        answer.date_key,
        entries.len(),
        max_raw_score,
        start.elapsed().as_millis()
    );

    Ok(RankTable {
        date_key: answer.date_key.clone(),
        answer: answer.summary(),
        max_raw_score,
        entries,
    })
}

async fn gather_candidates<S: LexiconStore>(
    answer: &DailyAnswer,
    store: &S,
    config: &RankConfig,
) -> Result<Vec<LexicalRecord>, EngineError> {
    let limit = config.candidate_limit;
    let mut candidates = Vec::new();
    let mut searched = false;

    if store.supports_search() {
        let keywords = answer_keywords(&answer.record, config.keyword_limit);
        match store.search(&keywords, limit).await {
            Ok(found) => {
                candidates = found;
                searched = true;
            }
            Err(err) => warn!("candidate search for {} failed: {err:#}", answer.date_key),
        }
    }

    if candidates.len() < config.candidate_floor.min(limit) {
        let wanted = limit - candidates.len();
        let seed = fnv1a32(format!("{SAMPLE_NAMESPACE}{}", answer.date_key).as_bytes());
        match store.random_sample(wanted, u64::from(seed)).await {
            Ok(sample) => candidates.extend(sample),
            Err(err) if searched => {
                warn!("candidate sample for {} failed: {err:#}", answer.date_key);
            }
            Err(err) => return Err(EngineError::unavailable("sample candidates", err)),
        }
    }

    Ok(candidates)
}
