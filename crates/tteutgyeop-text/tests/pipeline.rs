use tteutgyeop_text::{ConceptTable, choseong, is_concept, is_stop_word, normalize, tokenize};

const DEFINITIONS: &[&str] = &[
    "사과나무의 열매. 모양은 둥글고 빛깔은 붉다.",
    "금년에 처음으로 수확한 곡식이나 과일을 이르는 말.",
    "어떤 일을 하기 위하여 필요한 것을 미리 갖추어 놓음.",
    "해가 진 뒤부터 다시 해가 뜨기 전까지의 동안.",
    "",
    "(방언) 「1」 ‘가위’의 잘못.",
];

#[test]
fn tokenization_is_repeatable() {
    for text in DEFINITIONS {
        let first: Vec<String> = tokenize(text).collect();
        let second: Vec<String> = tokenize(text).collect();
        assert_eq!(first, second, "text {text:?}");
    }
}

#[test]
fn tokens_are_normalized_and_non_trivial() {
    for text in DEFINITIONS {
        for token in tokenize(text) {
            assert_eq!(normalize(&token), token);
            assert!(!token.is_empty());
            assert!(!is_concept(&token));
            assert!(!is_stop_word(&token), "{token:?} from {text:?}");
        }
    }
}

#[test]
fn expansion_preserves_literal_order() {
    let table = ConceptTable::builtin();
    let literal: Vec<String> = tokenize(DEFINITIONS[1]).collect();
    let expanded: Vec<String> = table.expand(literal.clone()).collect();
    let without_concepts: Vec<String> = expanded
        .iter()
        .filter(|t| !is_concept(t))
        .cloned()
        .collect();
    assert_eq!(without_concepts, literal);
    assert!(expanded.iter().any(|t| t == "#올해"));
    assert!(expanded.iter().any(|t| t == "#과일"));
}

#[test]
fn night_definition_keeps_calendar_words() {
    let tokens: Vec<String> = tokenize(DEFINITIONS[3]).collect();
    assert!(tokens.iter().any(|t| t == "해"));
    assert_eq!(choseong("밤"), "ㅂ");
}
