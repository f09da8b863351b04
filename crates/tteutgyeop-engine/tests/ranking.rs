use anyhow::{Result, anyhow};
use tteutgyeop_engine::percent::MAX_PERCENT;
use tteutgyeop_engine::{EngineError, RankConfig, SimilarityScorer, build_daily_ranking};
use tteutgyeop_lexicon::{AnswerFilter, LexiconStore, MemoryLexicon};
use tteutgyeop_types::{DailyAnswer, DateKey, LexicalRecord, Level, PartOfSpeech};

fn record(id: u64, word: &str, pos: PartOfSpeech, definition: &str, example: &str) -> LexicalRecord {
    LexicalRecord {
        id,
        word: word.into(),
        part_of_speech: Some(pos),
        level: Some(Level::Beginner),
        definition: definition.into(),
        example: example.into(),
    }
}

fn fruit_corpus() -> Vec<LexicalRecord> {
    use PartOfSpeech::*;
    vec![
        record(
            1,
            "사과",
            Noun,
            "사과나무의 열매. 모양은 둥글고 빛깔은 붉으며 맛은 새콤하고 달다.",
            "아침마다 사과를 하나씩 먹는다.",
        ),
        record(
            2,
            "자두",
            Noun,
            "자두나무의 열매. 모양은 둥글고 빛깔은 붉으며 맛은 새콤하다.",
            "",
        ),
        record(
            3,
            "포도",
            Noun,
            "포도나무의 열매. 작고 둥근 알이 송이를 이루며 맛은 새콤하고 달다.",
            "",
        ),
        record(
            4,
            "배",
            Noun,
            "배나무의 열매. 모양은 둥글고 껍질은 누런 갈색이며 맛은 달고 시원하다.",
            "",
        ),
        record(5, "바다", Noun, "지구 표면에서 짠물이 괴어 있는 넓은 곳.", ""),
        record(6, "달리다", Verb, "빠르게 움직여 나아가다.", "아이들이 운동장을 달린다."),
        record(7, "책상", Noun, "글을 읽거나 쓸 때 앞에 놓고 쓰는 상.", ""),
        // Duplicate headword from another dataset row.
        record(
            8,
            "자두",
            Noun,
            "자두나무의 열매. 모양은 둥글고 빛깔은 붉으며 맛은 새콤하다.",
            "",
        ),
    ]
}

fn answer(record: LexicalRecord) -> DailyAnswer {
    DailyAnswer {
        date_key: DateKey::parse("2025-03-01").unwrap(),
        record,
    }
}

fn config() -> RankConfig {
    RankConfig {
        top_k: 100,
        candidate_limit: 100,
        candidate_floor: 3,
        keyword_limit: 20,
    }
}

#[tokio::test]
async fn leaderboard_excludes_answer_and_is_dense() {
    let corpus = fruit_corpus();
    let lexicon = MemoryLexicon::from_records(corpus.clone());
    let answer = answer(corpus[0].clone());
    let table = build_daily_ranking(&answer, &lexicon, &SimilarityScorer::default(), &config())
        .await
        .unwrap();

    assert!(!table.entries.is_empty());
    assert!(table.entries.iter().all(|e| e.word != "사과"));
    for (idx, entry) in table.entries.iter().enumerate() {
        assert_eq!(entry.rank, idx + 1);
        assert!(entry.raw_score > 0.0);
        assert!(entry.percent <= MAX_PERCENT);
    }
    for pair in table.entries.windows(2) {
        assert!(pair[0].percent >= pair[1].percent);
        assert!(
            pair[0].raw_score > pair[1].raw_score
                || (pair[0].raw_score == pair[1].raw_score && pair[0].word < pair[1].word)
        );
    }

    let best = &table.entries[0];
    assert_eq!(best.word, "자두");
    assert_eq!(best.percent, MAX_PERCENT);
    assert_eq!(table.max_raw_score, best.raw_score);
    assert_eq!(
        table.entries.iter().filter(|e| e.word == "자두").count(),
        1
    );
    assert_eq!(table.answer, answer.summary());
}

#[tokio::test]
async fn rebuilding_yields_the_same_table() {
    let corpus = fruit_corpus();
    let lexicon = MemoryLexicon::from_records(corpus.clone());
    let answer = answer(corpus[2].clone());
    let scorer = SimilarityScorer::default();
    let first = build_daily_ranking(&answer, &lexicon, &scorer, &config()).await.unwrap();
    let second = build_daily_ranking(&answer, &lexicon, &scorer, &config()).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn truncates_to_top_k() {
    let corpus = fruit_corpus();
    let lexicon = MemoryLexicon::from_records(corpus.clone());
    let answer = answer(corpus[0].clone());
    let scorer = SimilarityScorer::default();
    let full = build_daily_ranking(&answer, &lexicon, &scorer, &config()).await.unwrap();
    let top_two = build_daily_ranking(
        &answer,
        &lexicon,
        &scorer,
        &RankConfig {
            top_k: 2,
            ..config()
        },
    )
    .await
    .unwrap();
    assert_eq!(top_two.entries.len(), 2.min(full.entries.len()));
    assert_eq!(top_two.entries[..], full.entries[..top_two.entries.len()]);
    assert_eq!(top_two.max_raw_score, full.max_raw_score);
}

#[tokio::test]
async fn empty_corpus_gives_empty_table() {
    let lexicon = MemoryLexicon::from_records(Vec::new());
    let answer = answer(fruit_corpus()[0].clone());
    let table = build_daily_ranking(&answer, &lexicon, &SimilarityScorer::default(), &config())
        .await
        .unwrap();
    assert!(table.entries.is_empty());
    assert_eq!(table.max_raw_score, 0.0);
}

#[tokio::test]
async fn unrelated_corpus_gives_empty_table() {
    let corpus = fruit_corpus();
    let lexicon = MemoryLexicon::from_records(vec![corpus[4].clone(), corpus[6].clone()]);
    let answer = answer(corpus[5].clone());
    let table = build_daily_ranking(&answer, &lexicon, &SimilarityScorer::default(), &config())
        .await
        .unwrap();
    assert!(table.entries.is_empty());
    assert_eq!(table.max_raw_score, 0.0);
}

/// Store whose keyword search is down; everything else works.
struct SearchDown(MemoryLexicon);

impl LexiconStore for SearchDown {
    async fn find_by_word(&self, word: &str) -> Result<Option<LexicalRecord>> {
        self.0.find_by_word(word).await
    }

    async fn count(&self, filter: &AnswerFilter) -> Result<usize> {
        self.0.count(filter).await
    }

    async fn fetch_at_offset(
        &self,
        offset: usize,
        filter: &AnswerFilter,
    ) -> Result<Option<LexicalRecord>> {
        self.0.fetch_at_offset(offset, filter).await
    }

    async fn search(&self, _keywords: &[String], _limit: usize) -> Result<Vec<LexicalRecord>> {
        Err(anyhow!("full-text index offline"))
    }

    async fn random_sample(&self, limit: usize, seed: u64) -> Result<Vec<LexicalRecord>> {
        self.0.random_sample(limit, seed).await
    }
}

/// Store that cannot be reached at all.
struct Offline;

impl LexiconStore for Offline {
    async fn find_by_word(&self, _word: &str) -> Result<Option<LexicalRecord>> {
        Err(anyhow!("connection refused"))
    }

    async fn count(&self, _filter: &AnswerFilter) -> Result<usize> {
        Err(anyhow!("connection refused"))
    }

    async fn fetch_at_offset(
        &self,
        _offset: usize,
        _filter: &AnswerFilter,
    ) -> Result<Option<LexicalRecord>> {
        Err(anyhow!("connection refused"))
    }

    async fn search(&self, _keywords: &[String], _limit: usize) -> Result<Vec<LexicalRecord>> {
        Err(anyhow!("connection refused"))
    }

    async fn random_sample(&self, _limit: usize, _seed: u64) -> Result<Vec<LexicalRecord>> {
        Err(anyhow!("connection refused"))
    }
}

#[tokio::test]
async fn failed_search_falls_back_to_sampling() {
    let corpus = fruit_corpus();
    let store = SearchDown(MemoryLexicon::from_records(corpus.clone()));
    let answer = answer(corpus[0].clone());
    let table = build_daily_ranking(&answer, &store, &SimilarityScorer::default(), &config())
        .await
        .unwrap();
    assert_eq!(table.entries[0].word, "자두");
}

#[tokio::test]
async fn unreachable_store_is_data_unavailable() {
    let answer = answer(fruit_corpus()[0].clone());
    let err = build_daily_ranking(&answer, &Offline, &SimilarityScorer::default(), &config())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::DataUnavailable(_)), "{err}");
}
