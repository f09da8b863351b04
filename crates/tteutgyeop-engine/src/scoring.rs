//! Multi-signal lexical similarity between two dictionary entries.
//!
//! The score is a weighted blend of set overlaps. Each pair of token sets is
//! compared with `max(jaccard, overlap coefficient)` so that a short, precise
//! definition which is nearly a subset of a longer one is not punished for
//! the length difference.
//!
//! | signal     | weight | tokens                                          |
//! |------------|--------|-------------------------------------------------|
//! | concept    | 0.35   | concept tokens from headword, definition, example |
//! | definition | 0.35   | definition tokens plus their concepts           |
//! | example    | 0.20   | example tokens plus their concepts              |
//! | headword   | 0.10   | headword token set or character bigrams         |
//!
//! Parts of speech that are both known and different multiply the blend by
//! [`POS_MISMATCH_PENALTY`]. When the two entries share fewer than
//! [`MIN_SHARED_LITERALS`] meaningful literal tokens, the definition and
//! example terms are capped at [`COINCIDENCE_CAP`].

use std::collections::HashSet;
use std::sync::Arc;

use tteutgyeop_text::{ConceptTable, char_bigrams, is_concept, is_stop_word, normalize, tokenize};
use tteutgyeop_types::{LexicalRecord, PartOfSpeech};

pub const CONCEPT_WEIGHT: f64 = 0.35;
pub const DEFINITION_WEIGHT: f64 = 0.35;
pub const EXAMPLE_WEIGHT: f64 = 0.20;
pub const HEADWORD_WEIGHT: f64 = 0.10;
pub const POS_MISMATCH_PENALTY: f64 = 0.6;
pub const MIN_SHARED_LITERALS: usize = 2;
pub const COINCIDENCE_CAP: f64 = 0.15;
/// Blends below this are reported as 0.
pub const NOISE_FLOOR: f64 = 0.05;

/// Literal tokens of a record's free-text fields, in source order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TokenSet {
    pub definition: Vec<String>,
    pub example: Vec<String>,
}

impl TokenSet {
    pub fn from_record(record: &LexicalRecord) -> Self {
        Self {
            definition: tokenize(&record.definition).collect(),
            example: tokenize(&record.example).collect(),
        }
    }
}

/// Everything the scorer needs from one record, computed once.
#[derive(Clone, Debug)]
pub struct Profile {
    word: String,
    part_of_speech: Option<PartOfSpeech>,
    headword: HashSet<String>,
    definition: HashSet<String>,
    example: HashSet<String>,
    concepts: HashSet<String>,
    literals: HashSet<String>,
    bigrams: HashSet<String>,
}

impl Profile {
    pub fn word(&self) -> &str {
        &self.word
    }

    pub fn part_of_speech(&self) -> Option<&PartOfSpeech> {
        self.part_of_speech.as_ref()
    }
}

/// Scores guesses against answers with a fixed concept table.
#[derive(Clone, Debug)]
pub struct SimilarityScorer {
    concepts: Arc<ConceptTable>,
}

impl Default for SimilarityScorer {
    fn default() -> Self {
        Self::new(Arc::new(ConceptTable::builtin().clone()))
    }
}

impl SimilarityScorer {
    pub fn new(concepts: Arc<ConceptTable>) -> Self {
        Self { concepts }
    }

    pub fn concepts(&self) -> &ConceptTable {
        &self.concepts
    }

    pub fn profile(&self, record: &LexicalRecord) -> Profile {
        let tokens = TokenSet::from_record(record);
        let word = normalize(&record.word);

        let headword: HashSet<String> = self.concepts.expand([word.clone()]).collect();
        let definition: HashSet<String> =
            self.concepts.expand(tokens.definition.iter().cloned()).collect();
        let example: HashSet<String> =
            self.concepts.expand(tokens.example.iter().cloned()).collect();
        let concepts = headword
            .iter()
            .chain(&definition)
            .chain(&example)
            .filter(|t| is_concept(t))
            .cloned()
            .collect();
        let literals = tokens
            .definition
            .iter()
            .chain(&tokens.example)
            .filter(|t| is_meaningful_literal(t))
            .cloned()
            .collect();
        let bigrams = char_bigrams(&word).into_iter().collect();

        Profile {
            word,
            part_of_speech: record.part_of_speech.clone(),
            headword,
            definition,
            example,
            concepts,
            literals,
            bigrams,
        }
    }

    /// Similarity of `guess` to `answer` in `[0, 1]`.
    pub fn score(&self, guess: &LexicalRecord, answer: &LexicalRecord) -> f64 {
        self.score_profiles(&self.profile(guess), &self.profile(answer))
    }

    pub fn score_profiles(&self, guess: &Profile, answer: &Profile) -> f64 {
        if !guess.word.is_empty() && guess.word == answer.word {
            return 1.0;
        }

        let concept = set_similarity(&guess.concepts, &answer.concepts);
        let mut definition = set_similarity(&guess.definition, &answer.definition);
        let mut example = set_similarity(&guess.example, &answer.example);
        let headword = set_similarity(&guess.headword, &answer.headword)
            .max(jaccard(&guess.bigrams, &answer.bigrams));

        if guess.literals.intersection(&answer.literals).count() < MIN_SHARED_LITERALS {
            definition = definition.min(COINCIDENCE_CAP);
            example = example.min(COINCIDENCE_CAP);
        }

        let mut blended = CONCEPT_WEIGHT * concept
            + DEFINITION_WEIGHT * definition
            + EXAMPLE_WEIGHT * example
            + HEADWORD_WEIGHT * headword;

        if let (Some(a), Some(b)) = (&guess.part_of_speech, &answer.part_of_speech)
            && a != b
        {
            blended *= POS_MISMATCH_PENALTY;
        }

        let clamped = blended.clamp(0.0, 1.0);
        if clamped < NOISE_FLOOR { 0.0 } else { clamped }
    }

    /// Meaningful literal tokens both entries use, longest first, never
    /// including anything that spells out the answer.
    pub fn shared_keywords(&self, guess: &Profile, answer: &Profile, limit: usize) -> Vec<String> {
        let mut shared: Vec<&String> = guess
            .literals
            .intersection(&answer.literals)
            .filter(|t| !t.contains(answer.word.as_str()))
            .collect();
        shared.sort_by(|a, b| {
            b.chars()
                .count()
                .cmp(&a.chars().count())
                .then_with(|| a.cmp(b))
        });
        shared.into_iter().take(limit).cloned().collect()
    }
}

/// [`SimilarityScorer::score`] with the built-in concept table.
pub fn score(guess: &LexicalRecord, answer: &LexicalRecord) -> f64 {
    SimilarityScorer::default().score(guess, answer)
}

fn is_meaningful_literal(token: &str) -> bool {
    token.chars().count() >= 2 && !is_stop_word(token) && !is_concept(token)
}

/// `max(jaccard, overlap coefficient)`; 0 when either side is empty.
fn set_similarity(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let shared = a.intersection(b).count() as f64;
    let union = (a.len() + b.len()) as f64 - shared;
    let overlap = shared / a.len().min(b.len()) as f64;
    (shared / union).max(overlap)
}

fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let shared = a.intersection(b).count() as f64;
    shared / ((a.len() + b.len()) as f64 - shared)
}
