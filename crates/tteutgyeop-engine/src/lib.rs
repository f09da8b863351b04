//! Scoring and ranking engine for the daily word game.
//!
//! - [`scoring`] compares two dictionary entries with transparent
//!   set-overlap signals; no embeddings, every score can be explained.
//! - [`daily`] picks one answer per date key, reproducibly.
//! - [`rank`] scores a bounded candidate set against the answer and keeps
//!   the Top-K leaderboard; [`percent`] maps raw scores to what players see.
//! - [`cache`] memoizes daily values; [`queue`] runs background builds with
//!   at most one in flight per key.
//! - [`Game`] wires these together behind the operations the HTTP layer
//!   exposes.
//!
//! # Example
//! ```no_run
//! use std::sync::Arc;
//! use tteutgyeop_engine::{EngineConfig, Game, MemoryCache};
//! use tteutgyeop_lexicon::{LoadMode, MemoryLexicon};
//! use tteutgyeop_types::DateKey;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let lexicon = MemoryLexicon::open("data/lexicon.jsonl", LoadMode::Mmap)?;
//! let game = Game::new(Arc::new(lexicon), Arc::new(MemoryCache::new()), EngineConfig::default());
//! let today = DateKey::today();
//! let outcome = game.guess(&today, "사과").await?;
//! println!("{}% (rank {:?})", outcome.result.percent, outcome.result.rank);
//! # Ok(()) }
//! ```

pub mod cache;
pub mod daily;
pub mod error;
pub mod game;
pub mod percent;
pub mod queue;
pub mod rank;
pub mod scoring;

pub use cache::{Cache, DailyCache, MemoryCache};
pub use daily::select_daily_answer;
pub use error::{CacheError, EngineError};
pub use game::{EngineConfig, Game, GuessClues, GuessOutcome, Hint};
pub use percent::PercentScale;
pub use queue::RankBuildQueue;
pub use rank::{RankConfig, build_daily_ranking};
pub use scoring::{SimilarityScorer, TokenSet, score};
