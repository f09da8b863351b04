const SYLLABLE_BASE: u32 = 0xAC00;
const SYLLABLE_LAST: u32 = 0xD7A3;
const SYLLABLES_PER_INITIAL: u32 = 21 * 28;

const CHOSEONG: [char; 19] = [
    'ㄱ', 'ㄲ', 'ㄴ', 'ㄷ', 'ㄸ', 'ㄹ', 'ㅁ', 'ㅂ', 'ㅃ', 'ㅅ', 'ㅆ', 'ㅇ', 'ㅈ', 'ㅉ', 'ㅊ', 'ㅋ', 'ㅌ',
    'ㅍ', 'ㅎ',
];

/// True for precomposed Hangul syllables (가..힣).
pub fn is_hangul_syllable(c: char) -> bool {
    (SYLLABLE_BASE..=SYLLABLE_LAST).contains(&(c as u32))
}

/// Replace each Hangul syllable with its initial consonant; other characters
/// pass through unchanged.
pub fn choseong(word: &str) -> String {
    word.chars()
        .map(|c| {
            if !is_hangul_syllable(c) {
                return c;
            }
            let idx = (c as u32 - SYLLABLE_BASE) / SYLLABLES_PER_INITIAL;
            CHOSEONG[idx as usize]
        })
        .collect()
}

/// Character bigrams of a word. A single-character word yields itself so that
/// short headwords still carry a spelling signal.
pub fn char_bigrams(word: &str) -> Vec<String> {
    let chars: Vec<char> = word.chars().collect();
    match chars.len() {
        0 => Vec::new(),
        1 => vec![chars[0].to_string()],
        _ => chars.windows(2).map(|w| w.iter().collect()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_initial_consonants() {
        assert_eq!(choseong("사과"), "ㅅㄱ");
        assert_eq!(choseong("까치"), "ㄲㅊ");
        assert_eq!(choseong("힣"), "ㅎ");
        assert_eq!(choseong("TV방송"), "TVㅂㅅ");
    }

    #[test]
    fn bigrams_cover_short_words() {
        assert_eq!(char_bigrams(""), Vec::<String>::new());
        assert_eq!(char_bigrams("해"), vec!["해"]);
        assert_eq!(char_bigrams("사과나무"), vec!["사과", "과나", "나무"]);
    }
}
