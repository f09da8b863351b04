use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::hangul::is_hangul_syllable;

/// Interpuncts and hyphen-class characters used as morpheme separators in
/// dictionary headwords, plus the caret used to mark spacing points. `ㆍ`
/// folds to U+119E under NFKC, so both forms are listed.
const SEPARATORS: &[char] = &[
    '^', '·', 'ㆍ', '\u{119E}', '\u{2027}', '-', '\u{2010}', '\u{2011}', '\u{2012}',
    '\u{2013}', '\u{2014}', '\u{2015}',
];

/// Canonicalise a headword.
///
/// Drops separator characters and whitespace (headwords are compared without
/// spacing), then applies NFKC to what is left so that jamo split by a
/// separator still compose. Diacritics are stripped from non-Hangul letters,
/// which are also lowercased. Idempotent.
pub fn normalize(word: &str) -> String {
    let joined: String = word.nfkc().filter(|c| !is_separator(*c)).collect();
    let mut out = String::with_capacity(joined.len());
    for c in joined.nfkc() {
        if is_hangul_syllable(c) {
            out.push(c);
            continue;
        }
        out.extend(
            std::iter::once(c)
                .nfd()
                .flat_map(char::to_lowercase)
                .filter(|d| !is_combining_mark(*d)),
        );
    }
    out
}

fn is_separator(c: char) -> bool {
    c.is_whitespace() || SEPARATORS.contains(&c)
}
