use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::LazyLock;

use anyhow::{Context, Result};

use crate::normalize::normalize;

/// Marks canonical concept tokens. Tokenizer output is Hangul-only, so a
/// concept token can never collide with a literal one.
pub const CONCEPT_PREFIX: char = '#';

/// Built-in synonym/association clusters: `(concept, members)`.
const BUILTIN_CLUSTERS: &[(&str, &[&str])] = &[
    ("올해", &["올해", "금년", "금년도", "당해", "당년", "올"]),
    ("작년", &["작년", "지난해", "전년", "객년"]),
    ("내년", &["내년", "다음해", "명년", "이듬해"]),
    ("하루", &["하루", "날", "일일", "당일", "하룻날"]),
    ("시간", &["시간", "시각", "때", "시기", "무렵", "시절"]),
    ("계절", &["계절", "철", "봄", "여름", "가을", "겨울"]),
    ("해", &["해", "태양", "햇빛", "햇볕"]),
    ("달", &["달", "월", "보름달", "초승달"]),
    ("하늘", &["하늘", "공중", "창공", "허공"]),
    ("물", &["물", "식수", "액체", "냇물", "강물"]),
    ("불", &["불", "화염", "불꽃", "불길"]),
    ("땅", &["땅", "토지", "대지", "흙", "지면"]),
    ("사람", &["사람", "인간", "인물", "개인", "사람들"]),
    ("가족", &["가족", "식구", "가정", "집안", "가문"]),
    ("부모", &["부모", "어버이", "아버지", "어머니", "아빠", "엄마", "부친", "모친"]),
    ("아이", &["아이", "어린이", "아동", "자녀", "자식", "아기"]),
    ("친구", &["친구", "벗", "동무", "동료"]),
    ("음식", &["음식", "먹을거리", "식품", "요리", "밥", "반찬", "식사"]),
    ("과일", &["과일", "과실", "열매", "사과", "배", "포도", "감"]),
    ("집", &["집", "주택", "가옥", "주거", "거처"]),
    ("돈", &["돈", "금전", "화폐", "재물", "자금", "현금"]),
    ("말", &["말", "언어", "말씀", "대화", "이야기", "낱말", "단어"]),
    ("글", &["글", "문장", "글자", "문자", "책", "서적"]),
    ("몸", &["몸", "신체", "육체", "몸통"]),
    ("마음", &["마음", "감정", "느낌", "기분", "정서", "심정"]),
    ("기쁨", &["기쁨", "즐거움", "행복", "기쁘다", "즐겁다"]),
    ("슬픔", &["슬픔", "비애", "슬프다", "서러움", "눈물"]),
    ("동물", &["동물", "짐승", "가축", "새", "물고기"]),
    ("식물", &["식물", "풀", "나무", "꽃", "잎", "뿌리"]),
    ("공부", &["공부", "학습", "배움", "교육", "수업"]),
    ("학교", &["학교", "학원", "교실", "교육기관"]),
    ("일", &["노동", "작업", "업무", "직업", "근무"]),
    ("이동", &["이동", "움직임", "옮김", "운반", "이사"]),
    ("탈것", &["탈것", "자동차", "차량", "차", "기차", "버스", "배편"]),
    ("길", &["길", "도로", "거리", "골목"]),
    ("크다", &["크다", "큰", "거대", "대형", "커다란"]),
    ("작다", &["작다", "작은", "소형", "조그만"]),
    ("나라", &["나라", "국가", "국토", "조국"]),
    ("마을", &["마을", "도시", "시내", "동네", "고장"]),
    ("옷", &["옷", "의복", "의류", "복장"]),
    ("병", &["병", "질병", "질환", "아픔", "통증"]),
];

static BUILTIN: LazyLock<ConceptTable> = LazyLock::new(|| {
    let mut table = ConceptTable::empty();
    for (concept, members) in BUILTIN_CLUSTERS {
        table.insert_cluster(concept, members.iter().copied());
    }
    table
});

/// Many-to-one mapping from literal tokens to canonical concept tokens.
#[derive(Clone, Debug, Default)]
pub struct ConceptTable {
    members: HashMap<String, String>,
}

impl ConceptTable {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in clusters shared by every scorer.
    pub fn builtin() -> &'static ConceptTable {
        &BUILTIN
    }

    /// Built-in clusters extended with the clusters in `path`.
    ///
    /// One cluster per line: `concept member member ...`. Blank lines and
    /// `#` comments are skipped; a missing file is treated as empty. Later
    /// clusters win when a member is listed twice.
    pub fn load_with_builtin(path: impl AsRef<Path>) -> Result<Self> {
        let mut table = BUILTIN.clone();
        table.merge_file(path.as_ref())?;
        Ok(table)
    }

    fn merge_file(&mut self, path: &Path) -> Result<()> {
        if !path.exists() {
            return Ok(());
        }
        let file =
            File::open(path).with_context(|| format!("open concept file {}", path.display()))?;
        let reader = BufReader::new(file);
        for (lineno, line) in reader.lines().enumerate() {
            let line =
                line.with_context(|| format!("read line {} in {}", lineno + 1, path.display()))?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut parts = line.split_whitespace();
            let Some(concept) = parts.next() else {
                continue;
            };
            self.insert_cluster(concept, parts);
        }
        Ok(())
    }

    /// Register `members` (and the concept's own name) under `concept`.
    pub fn insert_cluster<'a>(
        &mut self,
        concept: &str,
        members: impl IntoIterator<Item = &'a str>,
    ) {
        let name = normalize(concept);
        if name.is_empty() {
            return;
        }
        let tag = format!("{CONCEPT_PREFIX}{name}");
        self.members.insert(name, tag.clone());
        for member in members {
            let member = normalize(member);
            if !member.is_empty() {
                self.members.insert(member, tag.clone());
            }
        }
    }

    /// Concept token for a literal token, if it belongs to a cluster.
    pub fn concept_of(&self, token: &str) -> Option<&str> {
        self.members.get(token).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Emit every token followed by its concept token, if any. Additive:
    /// literal tokens are never replaced.
    pub fn expand<'a, I>(&'a self, tokens: I) -> impl Iterator<Item = String> + 'a
    where
        I: IntoIterator<Item = String>,
        I::IntoIter: 'a,
    {
        tokens.into_iter().flat_map(move |token| {
            let concept = self.concept_of(&token).map(str::to_string);
            std::iter::once(token).chain(concept)
        })
    }
}

/// [`ConceptTable::expand`] over the built-in table.
pub fn expand_concepts<I>(tokens: I) -> impl Iterator<Item = String>
where
    I: IntoIterator<Item = String>,
    I::IntoIter: 'static,
{
    BUILTIN.expand(tokens)
}

pub fn is_concept(token: &str) -> bool {
    token.starts_with(CONCEPT_PREFIX)
}
