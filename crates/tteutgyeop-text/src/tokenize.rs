use std::borrow::Cow;
use std::collections::HashSet;
use std::sync::LazyLock;

use unicode_normalization::{UnicodeNormalization, is_nfkc};

use crate::hangul::is_hangul_syllable;
use crate::normalize::normalize;

/// Connectives, pronoun fillers, light verbs, and definitional boilerplate
/// ("…을 이르는 말") that carry no meaning of their own.
pub const STOP_WORDS: &[&str] = &[
    "그리고", "그래서", "하지만", "그러나", "또는", "또한", "및", "등", "따위", "것", "수", "때문",
    "위해", "위하여", "같은", "같이", "통해", "통하여", "따라", "따른", "경우", "정도", "여러",
    "어떤", "대한", "대하여", "관한", "관하여", "무엇", "하다", "되다", "있다", "없다", "이다",
    "아니다", "하는", "하여", "하게", "하고", "하기", "하며", "한다", "했다", "되는", "되어",
    "된다", "있는", "없는", "이르는", "이르다", "일컫는", "가리키는", "뜻하는", "나타내는",
    "말하는", "그런", "이런", "저런", "그것", "이것", "저것",
];

/// Single-syllable words that are meaningful on their own (calendar and
/// nature words mostly); every other single syllable is treated as noise.
pub const KEEP_SINGLE: &[&str] = &[
    "해", "달", "날", "년", "월", "주", "봄", "밤", "낮", "물", "불", "땅", "별", "꽃", "밥", "돈",
    "집", "몸", "옷", "눈", "비", "산", "강", "길", "숲", "말", "배", "차", "책", "손", "발",
];

/// Trailing particles and light-verb endings, longest first so the first
/// match is the longest match.
pub const PARTICLES: &[&str] = &[
    "에서부터", "으로부터", "으로써", "으로서", "으로는", "에게서", "에서는", "에서도", "이라는",
    "적으로", "로부터", "에서", "에는", "에도", "로는", "에게", "한테", "까지", "부터", "으로",
    "로써", "로서", "처럼", "보다", "마다", "조차", "이나", "이며", "이다", "라는", "하는", "하여",
    "하게", "하고", "하기", "하며", "되는", "되어", "적인", "을", "를", "은", "는", "가", "의",
    "에", "와", "과", "도", "로", "만",
];

static STOP_SET: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| STOP_WORDS.iter().copied().collect());
static KEEP_SET: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| KEEP_SINGLE.iter().copied().collect());

pub fn is_stop_word(token: &str) -> bool {
    STOP_SET.contains(token)
}

fn is_kept_single(token: &str) -> bool {
    KEEP_SET.contains(token)
}

/// Segment free text into normalized Hangul tokens.
///
/// The returned iterator is lazy and finite. Cloning it (or calling
/// `tokenize` again) restarts from the same position and yields the same
/// sequence. Tokens come out in source order and are not deduplicated.
pub fn tokenize(text: &str) -> Tokens<'_> {
    let text = if is_nfkc(text) {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(text.nfkc().collect())
    };
    Tokens { text, pos: 0 }
}

/// Lazy token stream returned by [`tokenize`].
#[derive(Clone, Debug)]
pub struct Tokens<'a> {
    text: Cow<'a, str>,
    pos: usize,
}

impl Iterator for Tokens<'_> {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let rest = &self.text[self.pos..];
            let start = rest.find(is_hangul_syllable)?;
            let run = &rest[start..];
            let len = run
                .find(|c: char| !is_hangul_syllable(c))
                .unwrap_or(run.len());
            let word = &run[..len];
            self.pos += start + len;

            if let Some(token) = accept(word) {
                return Some(token);
            }
        }
    }
}

fn accept(word: &str) -> Option<String> {
    if is_stop_word(word) {
        return None;
    }
    let stem = strip_particle(word);
    if stem.chars().count() < 2 && !is_kept_single(stem) {
        return None;
    }
    let token = normalize(stem);
    (!is_stop_word(&token)).then_some(token)
}

/// Case markers that may follow a single-syllable bound noun (`것을`,
/// `수는`). Other particles behind one syllable usually belong to the word
/// itself (`수도`, `등대`).
const CASE_MARKERS: &[&str] = &["을", "를", "은", "는", "가"];

/// Remove the longest trailing particle. Single-syllable particles only come
/// off when the remaining stem is still a plausible word, or a stop-word
/// followed by a case marker.
fn strip_particle(word: &str) -> &str {
    for particle in PARTICLES {
        let Some(stem) = word.strip_suffix(particle) else {
            continue;
        };
        if stem.is_empty() {
            continue;
        }
        let single = particle.chars().count() == 1;
        if single
            && stem.chars().count() < 2
            && !is_kept_single(stem)
            && !(is_stop_word(stem) && CASE_MARKERS.contains(particle))
        {
            continue;
        }
        return stem;
    }
    word
}
