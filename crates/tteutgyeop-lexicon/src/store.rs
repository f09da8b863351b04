use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use tteutgyeop_types::{LexicalRecord, Level};

/// Restricts which records count toward [`LexiconStore::count`] and
/// [`LexiconStore::fetch_at_offset`].
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AnswerFilter {
    levels: Vec<Level>,
}

impl AnswerFilter {
    /// Every record, regardless of level.
    pub fn any() -> Self {
        Self::default()
    }

    /// Only records tagged with one of `levels`. Untagged records are
    /// excluded.
    pub fn levels(levels: impl IntoIterator<Item = Level>) -> Self {
        let mut levels: Vec<Level> = levels.into_iter().collect();
        levels.sort();
        levels.dedup();
        Self { levels }
    }

    pub fn is_any(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn allowed_levels(&self) -> &[Level] {
        &self.levels
    }

    pub fn matches(&self, record: &LexicalRecord) -> bool {
        self.is_any()
            || record
                .level
                .is_some_and(|level| self.levels.contains(&level))
    }
}

/// Read-only access to the corpus.
///
/// Offsets are stable for a given corpus snapshot and filter, which is what
/// makes daily selection reproducible. Implementations deal with physical
/// schema differences themselves; callers only ever see [`LexicalRecord`].
pub trait LexiconStore: Send + Sync {
    fn find_by_word(
        &self,
        word: &str,
    ) -> impl Future<Output = Result<Option<LexicalRecord>>> + Send;

    fn count(&self, filter: &AnswerFilter) -> impl Future<Output = Result<usize>> + Send;

    fn fetch_at_offset(
        &self,
        offset: usize,
        filter: &AnswerFilter,
    ) -> impl Future<Output = Result<Option<LexicalRecord>>> + Send;

    /// Records mentioning any of `keywords`, best matches first.
    fn search(
        &self,
        keywords: &[String],
        limit: usize,
    ) -> impl Future<Output = Result<Vec<LexicalRecord>>> + Send;

    /// Up to `limit` records drawn without replacement. The same seed over
    /// the same snapshot yields the same sample.
    fn random_sample(
        &self,
        limit: usize,
        seed: u64,
    ) -> impl Future<Output = Result<Vec<LexicalRecord>>> + Send;

    /// Whether [`LexiconStore::search`] narrows anything. Stores without an
    /// index return `false` and callers go straight to sampling.
    fn supports_search(&self) -> bool {
        true
    }
}

impl<S: LexiconStore> LexiconStore for Arc<S> {
    fn find_by_word(
        &self,
        word: &str,
    ) -> impl Future<Output = Result<Option<LexicalRecord>>> + Send {
        (**self).find_by_word(word)
    }

    fn count(&self, filter: &AnswerFilter) -> impl Future<Output = Result<usize>> + Send {
        (**self).count(filter)
    }

    fn fetch_at_offset(
        &self,
        offset: usize,
        filter: &AnswerFilter,
    ) -> impl Future<Output = Result<Option<LexicalRecord>>> + Send {
        (**self).fetch_at_offset(offset, filter)
    }

    fn search(
        &self,
        keywords: &[String],
        limit: usize,
    ) -> impl Future<Output = Result<Vec<LexicalRecord>>> + Send {
        (**self).search(keywords, limit)
    }

    fn random_sample(
        &self,
        limit: usize,
        seed: u64,
    ) -> impl Future<Output = Result<Vec<LexicalRecord>>> + Send {
        (**self).random_sample(limit, seed)
    }

    fn supports_search(&self) -> bool {
        (**self).supports_search()
    }
}
