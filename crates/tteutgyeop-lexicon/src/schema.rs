use anyhow::{Result, bail};
use serde_json::{Map, Value};
use tteutgyeop_text::normalize;
use tteutgyeop_types::{LexicalRecord, Level, PartOfSpeech};

const ID_ALIASES: &[&str] = &["id", "entry_id", "word_id", "target_code"];
const WORD_ALIASES: &[&str] = &["word", "headword", "display_word", "writtenForm", "lemma"];
const POS_ALIASES: &[&str] = &["pos", "part_of_speech", "partOfSpeech"];
const LEVEL_ALIASES: &[&str] = &["level", "vocabularyLevel", "vocabulary_level", "difficulty"];
const DEFINITION_ALIASES: &[&str] = &["definition", "def", "gloss", "sense"];
const EXAMPLE_ALIASES: &[&str] = &["example", "examples", "usage", "sentence"];

/// Physical field names for the logical [`LexicalRecord`] fields.
///
/// Dataset versions disagree on column names (`word` vs `display_word`,
/// `example` vs `examples`, ...). A descriptor is resolved once when a corpus
/// is opened and then applied to every row, so nothing past this boundary
/// has to care which version it is reading.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SchemaDescriptor {
    pub id: Option<String>,
    pub word: String,
    pub part_of_speech: Option<String>,
    pub level: Option<String>,
    pub definition: Option<String>,
    pub example: Option<String>,
}

impl SchemaDescriptor {
    /// Pick field names from the columns present in a sample row.
    ///
    /// Only the headword is mandatory; every other logical field may be
    /// missing from a dataset version and degrades to empty.
    pub fn detect<'a>(columns: impl IntoIterator<Item = &'a str>) -> Result<Self> {
        let columns: Vec<&str> = columns.into_iter().collect();
        let pick = |aliases: &[&str]| {
            aliases
                .iter()
                .find(|alias| columns.contains(*alias))
                .map(|alias| alias.to_string())
        };
        let Some(word) = pick(WORD_ALIASES) else {
            bail!(
                "no headword column among {:?} (expected one of {:?})",
                columns,
                WORD_ALIASES
            );
        };
        Ok(Self {
            id: pick(ID_ALIASES),
            word,
            part_of_speech: pick(POS_ALIASES),
            level: pick(LEVEL_ALIASES),
            definition: pick(DEFINITION_ALIASES),
            example: pick(EXAMPLE_ALIASES),
        })
    }

    /// Map one physical row into the logical record shape.
    ///
    /// Returns `None` when the headword is missing or normalizes to nothing.
    /// `fallback_id` is used when the dataset carries no usable id.
    pub fn adapt(&self, row: &Map<String, Value>, fallback_id: u64) -> Option<LexicalRecord> {
        let word = normalize(&text_field(row, Some(self.word.as_str()))?);
        if word.is_empty() {
            return None;
        }
        let id = self
            .id
            .as_deref()
            .and_then(|col| row.get(col))
            .and_then(id_value)
            .unwrap_or(fallback_id);
        let part_of_speech = text_field(row, self.part_of_speech.as_deref())
            .and_then(|raw| PartOfSpeech::from_label(&raw));
        let level =
            text_field(row, self.level.as_deref()).and_then(|raw| Level::from_label(&raw));

        Some(LexicalRecord {
            id,
            word,
            part_of_speech,
            level,
            definition: text_field(row, self.definition.as_deref()).unwrap_or_default(),
            example: text_field(row, self.example.as_deref()).unwrap_or_default(),
        })
    }
}

fn text_field(row: &Map<String, Value>, column: Option<&str>) -> Option<String> {
    let value = row.get(column?)?;
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        // Example lists: first non-blank entry.
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .find(|s| !s.is_empty())?
            .to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn id_value(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
