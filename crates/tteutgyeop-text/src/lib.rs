//! Text processing tuned to Korean dictionary entries.
//!
//! Three layers, each total over arbitrary input:
//! 1. [`normalize`] canonicalises a headword (NFKC, separators, whitespace).
//! 2. [`tokenize`] lazily segments free text into Hangul tokens, dropping
//!    stop-words and single-syllable noise and stripping trailing particles.
//! 3. [`ConceptTable::expand`] appends canonical concept tokens for known
//!    synonym clusters without dropping the literal tokens.
//!
//! # Example
//! ```rust
//! use tteutgyeop_text::{ConceptTable, tokenize};
//!
//! let tokens: Vec<String> = tokenize("금년에 수확한 과일을 먹었다").collect();
//! assert_eq!(tokens[0], "금년");
//!
//! let expanded: Vec<String> = ConceptTable::builtin().expand(tokens).collect();
//! assert!(expanded.iter().any(|t| t == "#올해"));
//! ```

mod concepts;
mod hangul;
mod normalize;
mod tokenize;

pub use concepts::{CONCEPT_PREFIX, ConceptTable, expand_concepts, is_concept};
pub use hangul::{char_bigrams, choseong, is_hangul_syllable};
pub use normalize::normalize;
pub use tokenize::{KEEP_SINGLE, PARTICLES, STOP_WORDS, Tokens, is_stop_word, tokenize};
