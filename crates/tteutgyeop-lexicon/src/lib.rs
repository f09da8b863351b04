//! Lexicon access for the daily word game.
//!
//! The engine only ever talks to a [`LexiconStore`]; this crate defines that
//! interface, the [`SchemaDescriptor`] boundary that maps heterogeneous
//! dataset rows into [`tteutgyeop_types::LexicalRecord`], and
//! [`MemoryLexicon`], an in-process store loaded from a JSON Lines corpus.
//! The corpus file can be memory-mapped or read into an owned buffer at
//! runtime via [`LoadMode`].
//!
//! # Example
//! ```no_run
//! use tteutgyeop_lexicon::{LexiconStore, LoadMode, MemoryLexicon};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let lexicon = MemoryLexicon::open("data/lexicon.jsonl", LoadMode::Mmap)?;
//! if let Some(record) = lexicon.find_by_word("사과").await? {
//!     println!("{}: {}", record.word, record.definition);
//! }
//! # Ok(()) }
//! ```

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use memmap2::Mmap;

mod memory;
mod schema;
mod store;

pub use memory::MemoryLexicon;
pub use schema::SchemaDescriptor;
pub use store::{AnswerFilter, LexiconStore};

/// Backing storage for the corpus file.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum LoadMode {
    /// Memory-map the corpus file (fast, no upfront copy).
    #[default]
    Mmap,
    /// Read the corpus file into an owned buffer (portable fallback).
    Owned,
}

impl FromStr for LoadMode {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "mmap" => Ok(LoadMode::Mmap),
            "owned" => Ok(LoadMode::Owned),
            other => bail!("unknown load mode {other:?} (expected mmap or owned)"),
        }
    }
}

pub(crate) enum Buffer {
    Mmap(Mmap),
    Owned(Vec<u8>),
}

impl Buffer {
    pub(crate) fn as_slice(&self) -> &[u8] {
        match self {
            Buffer::Mmap(m) => m.as_ref(),
            Buffer::Owned(v) => v.as_slice(),
        }
    }
}

pub(crate) fn load_file(path: &Path, mode: LoadMode) -> Result<Buffer> {
    match mode {
        LoadMode::Mmap => {
            let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
            // An empty file cannot be mapped on every platform.
            let len = file
                .metadata()
                .with_context(|| format!("stat {}", path.display()))?
                .len();
            if len == 0 {
                return Ok(Buffer::Owned(Vec::new()));
            }
            unsafe { Mmap::map(&file) }
                .map(Buffer::Mmap)
                .with_context(|| format!("mmap {}", path.display()))
        }
        LoadMode::Owned => {
            let mut file = File::open(path).with_context(|| format!("open {}", path.display()))?;
            let mut buf = Vec::new();
            file.read_to_end(&mut buf)
                .with_context(|| format!("read {}", path.display()))?;
            Ok(Buffer::Owned(buf))
        }
    }
}

pub(crate) fn strip_cr(line: &[u8]) -> &[u8] {
    line.strip_suffix(b"\r").unwrap_or(line)
}
