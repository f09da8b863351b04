use std::path::PathBuf;

use tteutgyeop_lexicon::{AnswerFilter, LexiconStore, LoadMode, MemoryLexicon, SchemaDescriptor};
use tteutgyeop_types::{Level, PartOfSpeech};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

#[tokio::test]
async fn loads_modern_corpus_in_both_modes() {
    for mode in [LoadMode::Mmap, LoadMode::Owned] {
        let lexicon = MemoryLexicon::open(fixture("modern.jsonl"), mode).expect("load fixture");
        // Malformed line and blank headword are skipped.
        assert_eq!(lexicon.len(), 4, "mode {mode:?}");
        assert_eq!(lexicon.schema().unwrap().word, "word");

        let apple = lexicon.find_by_word("사과").await.unwrap().unwrap();
        assert_eq!(apple.id, 10);
        assert_eq!(apple.part_of_speech, Some(PartOfSpeech::Noun));
        assert_eq!(apple.level, Some(Level::Beginner));
        assert!(apple.example.contains("아침마다"));
        assert!(lexicon.find_by_word("포도").await.unwrap().is_none());
    }
}

#[tokio::test]
async fn adapts_legacy_column_names() {
    let lexicon = MemoryLexicon::open(fixture("legacy.jsonl"), LoadMode::Owned).unwrap();
    assert_eq!(lexicon.len(), 2);
    assert_eq!(lexicon.schema().unwrap().word, "display_word");

    // Sorted by id: 꽃 (3) before 나무 (7).
    let first = lexicon.get(0).unwrap();
    assert_eq!(first.word, "꽃");
    let tree = lexicon.find_by_word("나무").await.unwrap().unwrap();
    assert_eq!(tree.id, 7);
    assert_eq!(tree.part_of_speech, Some(PartOfSpeech::Noun));
    assert_eq!(tree.level, Some(Level::Intermediate));
    assert!(tree.definition.is_empty());
    assert_eq!(tree.example, "나무를 심다.");
}

#[tokio::test]
async fn explicit_schema_skips_detection() {
    let schema = SchemaDescriptor::detect(["id", "word", "definition"]).unwrap();
    let lexicon =
        MemoryLexicon::open_with_schema(fixture("modern.jsonl"), LoadMode::Mmap, schema.clone())
            .unwrap();
    assert_eq!(lexicon.schema(), Some(&schema));
    let apple = lexicon.find_by_word("사과").await.unwrap().unwrap();
    // Columns outside the pinned schema are ignored.
    assert_eq!(apple.part_of_speech, None);
    assert!(apple.example.is_empty());
}

#[tokio::test]
async fn level_filter_selects_answer_pool() {
    let lexicon = MemoryLexicon::open(fixture("modern.jsonl"), LoadMode::Mmap).unwrap();
    let pool = AnswerFilter::levels([Level::Beginner, Level::Intermediate]);
    assert_eq!(lexicon.count(&pool).await.unwrap(), 3);
    let mut words = Vec::new();
    for offset in 0..3 {
        words.push(lexicon.fetch_at_offset(offset, &pool).await.unwrap().unwrap().word);
    }
    assert_eq!(words, vec!["사과", "바다", "달리다"]);
}

#[tokio::test]
async fn search_finds_definition_keywords() {
    let lexicon = MemoryLexicon::open(fixture("modern.jsonl"), LoadMode::Mmap).unwrap();
    let found = lexicon.search(&["열매".to_string()], 10).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].word, "사과");
}

#[test]
fn missing_file_is_an_error() {
    let err = MemoryLexicon::open(fixture("absent.jsonl"), LoadMode::Mmap).unwrap_err();
    assert!(err.to_string().contains("absent.jsonl"));
}

#[test]
fn empty_file_loads_empty_corpus() {
    let file = tempfile::NamedTempFile::new().unwrap();
    let lexicon = MemoryLexicon::open(file.path(), LoadMode::Mmap).unwrap();
    assert!(lexicon.is_empty());
    assert!(lexicon.schema().is_none());
}
