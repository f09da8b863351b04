use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result, bail};
use bitvec::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};
use tteutgyeop_text::tokenize;
use tteutgyeop_types::{LexicalRecord, Level};

use crate::schema::SchemaDescriptor;
use crate::store::{AnswerFilter, LexiconStore};
use crate::{LoadMode, load_file, strip_cr};

type BitSet = BitVec<usize, Lsb0>;

/// Whole corpus held in memory with a token index for keyword search.
///
/// Records are ordered by id, so offsets are stable across restarts as long
/// as the corpus file does not change.
#[derive(Debug, Clone)]
pub struct MemoryLexicon {
    records: Vec<LexicalRecord>,
    by_word: HashMap<String, u32>,
    postings: HashMap<String, Vec<u32>>,
    by_level: HashMap<Level, BitSet>,
    schema: Option<SchemaDescriptor>,
}

impl MemoryLexicon {
    /// Load a JSON Lines corpus, detecting field names from the first row.
    pub fn open(path: impl AsRef<Path>, mode: LoadMode) -> Result<Self> {
        Self::load(path.as_ref(), mode, None)
    }

    /// Load a JSON Lines corpus with field names fixed by the caller.
    pub fn open_with_schema(
        path: impl AsRef<Path>,
        mode: LoadMode,
        schema: SchemaDescriptor,
    ) -> Result<Self> {
        Self::load(path.as_ref(), mode, Some(schema))
    }

    fn load(path: &Path, mode: LoadMode, schema: Option<SchemaDescriptor>) -> Result<Self> {
        let buffer = load_file(path, mode)?;
        let mut schema = schema;
        let mut records = Vec::new();
        let mut malformed = 0usize;
        let mut rejected = 0usize;

        for (lineno, raw) in buffer.as_slice().split(|b| *b == b'\n').enumerate() {
            let line = strip_cr(raw);
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            let row: Map<String, Value> = match serde_json::from_slice(line) {
                Ok(row) => row,
                Err(err) => {
                    debug!("{}:{}: skipping malformed row: {err}", path.display(), lineno + 1);
                    malformed += 1;
                    continue;
                }
            };
            if schema.is_none() {
                let detected = SchemaDescriptor::detect(row.keys().map(String::as_str))
                    .with_context(|| {
                        format!("detect schema from {}:{}", path.display(), lineno + 1)
                    })?;
                info!("detected lexicon schema {detected:?}");
                schema = Some(detected);
            }
            let adapted = schema
                .as_ref()
                .and_then(|descriptor| descriptor.adapt(&row, lineno as u64 + 1));
            match adapted {
                Some(record) => records.push(record),
                None => rejected += 1,
            }
        }

        if malformed > 0 || rejected > 0 {
            warn!(
                "{}: skipped {malformed} malformed and {rejected} headword-less rows",
                path.display()
            );
        }
        if records.is_empty() && malformed > 0 {
            bail!("no usable rows in {}", path.display());
        }

        let mut lexicon = Self::from_records(records);
        lexicon.schema = schema;
        info!(
            "loaded {} records ({} distinct words, {} index terms) from {}",
            lexicon.len(),
            lexicon.by_word.len(),
            lexicon.postings.len(),
            path.display()
        );
        Ok(lexicon)
    }

    /// Build the store from already-adapted records.
    pub fn from_records(mut records: Vec<LexicalRecord>) -> Self {
        records.sort_by_key(|r| r.id);

        let mut by_word = HashMap::new();
        let mut postings: HashMap<String, Vec<u32>> = HashMap::new();
        let mut by_level: HashMap<Level, BitSet> = HashMap::new();
        let len = records.len();

        for (idx, record) in records.iter().enumerate() {
            let idx = idx as u32;
            by_word.entry(record.word.clone()).or_insert(idx);

            let text = tokenize(&record.definition).chain(tokenize(&record.example));
            for term in std::iter::once(record.word.clone()).chain(text) {
                let list = postings.entry(term).or_default();
                if list.last() != Some(&idx) {
                    list.push(idx);
                }
            }

            if let Some(level) = record.level {
                by_level
                    .entry(level)
                    .or_insert_with(|| bitvec![usize, Lsb0; 0; len])
                    .set(idx as usize, true);
            }
        }

        Self {
            records,
            by_word,
            postings,
            by_level,
            schema: None,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&LexicalRecord> {
        self.records.get(idx)
    }

    /// Field mapping used for the loaded file, if it came from one.
    pub fn schema(&self) -> Option<&SchemaDescriptor> {
        self.schema.as_ref()
    }

    /// Records admitted by `filter`; `None` means all of them.
    fn mask(&self, filter: &AnswerFilter) -> Option<BitSet> {
        if filter.is_any() {
            return None;
        }
        let mut mask = bitvec![usize, Lsb0; 0; self.records.len()];
        for level in filter.allowed_levels() {
            if let Some(bits) = self.by_level.get(level) {
                mask |= bits;
            }
        }
        Some(mask)
    }
}

impl LexiconStore for MemoryLexicon {
    async fn find_by_word(&self, word: &str) -> Result<Option<LexicalRecord>> {
        Ok(self
            .by_word
            .get(word)
            .map(|idx| self.records[*idx as usize].clone()))
    }

    async fn count(&self, filter: &AnswerFilter) -> Result<usize> {
        Ok(match self.mask(filter) {
            None => self.records.len(),
            Some(mask) => mask.count_ones(),
        })
    }

    async fn fetch_at_offset(
        &self,
        offset: usize,
        filter: &AnswerFilter,
    ) -> Result<Option<LexicalRecord>> {
        let idx = match self.mask(filter) {
            None => Some(offset),
            Some(mask) => mask.iter_ones().nth(offset),
        };
        Ok(idx.and_then(|idx| self.records.get(idx)).cloned())
    }

    async fn search(&self, keywords: &[String], limit: usize) -> Result<Vec<LexicalRecord>> {
        let mut hits: HashMap<u32, u32> = HashMap::new();
        let mut seen_terms = Vec::with_capacity(keywords.len());
        for keyword in keywords {
            if seen_terms.contains(&keyword) {
                continue;
            }
            seen_terms.push(keyword);
            for idx in self.postings.get(keyword).into_iter().flatten() {
                *hits.entry(*idx).or_default() += 1;
            }
        }

        let mut ranked: Vec<(u32, u32)> = hits.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked.truncate(limit);
        Ok(ranked
            .into_iter()
            .map(|(idx, _)| self.records[idx as usize].clone())
            .collect())
    }

    async fn random_sample(&self, limit: usize, seed: u64) -> Result<Vec<LexicalRecord>> {
        let amount = limit.min(self.records.len());
        let mut rng = StdRng::seed_from_u64(seed);
        Ok(rand::seq::index::sample(&mut rng, self.records.len(), amount)
            .into_iter()
            .map(|idx| self.records[idx].clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tteutgyeop_types::PartOfSpeech;

    fn record(id: u64, word: &str, level: Option<Level>, definition: &str) -> LexicalRecord {
        LexicalRecord {
            id,
            word: word.into(),
            part_of_speech: Some(PartOfSpeech::Noun),
            level,
            definition: definition.into(),
            example: String::new(),
        }
    }

    fn sample() -> MemoryLexicon {
        MemoryLexicon::from_records(vec![
            record(3, "바다", Some(Level::Beginner), "지구 표면의 넓은 소금물."),
            record(1, "사과", Some(Level::Beginner), "사과나무의 둥근 열매."),
            record(2, "배", Some(Level::Advanced), "배나무의 열매."),
            record(4, "호수", None, "땅이 우묵하게 들어가 물이 괸 곳."),
        ])
    }

    #[tokio::test]
    async fn orders_by_id_and_filters_by_level() {
        let lexicon = sample();
        assert_eq!(lexicon.get(0).unwrap().word, "사과");

        let easy = AnswerFilter::levels([Level::Beginner]);
        assert_eq!(lexicon.count(&easy).await.unwrap(), 2);
        assert_eq!(lexicon.count(&AnswerFilter::any()).await.unwrap(), 4);
        let second = lexicon.fetch_at_offset(1, &easy).await.unwrap().unwrap();
        assert_eq!(second.word, "바다");
        assert!(lexicon.fetch_at_offset(2, &easy).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn search_ranks_by_keyword_hits() {
        let lexicon = sample();
        let keywords = vec!["열매".to_string(), "사과나무".to_string(), "열매".to_string()];
        let found = lexicon.search(&keywords, 10).await.unwrap();
        let words: Vec<&str> = found.iter().map(|r| r.word.as_str()).collect();
        assert_eq!(words, vec!["사과", "배"]);
        assert_eq!(lexicon.search(&keywords, 1).await.unwrap().len(), 1);
        assert!(lexicon.search(&[], 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn seeded_sample_is_reproducible() {
        let lexicon = sample();
        let first = lexicon.random_sample(3, 7).await.unwrap();
        let second = lexicon.random_sample(3, 7).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
        assert_eq!(lexicon.random_sample(10, 7).await.unwrap().len(), 4);
    }
}
