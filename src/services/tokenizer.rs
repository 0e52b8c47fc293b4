//! # 토크나이저 (단어 추출기)
//!
//! 메시지 본문을 단어 빈도 집계가 가능한 토큰으로 정규화합니다.
//!
//! 규칙:
//! 1. 공백(스페이스/탭 연속)으로 나눕니다.
//! 2. 각 토큰에서 ASCII 영문/숫자와 한글 완성형 음절(가–힣)만 남기고
//!    나머지 문자(문장부호, 이모지, 자모 단독 등)는 제거합니다.
//! 3. 남은 문자열을 소문자로 바꿉니다.
//! 4. 길이가 2자 이상이고 불용어가 아닌 토큰만 남깁니다.
//!
//! 불용어 집합은 기본 목록(아래 30개)과 호출자가 넘긴 단어를 합친 뒤
//! 소문자로 통일하고 중복을 제거한 것입니다.

use std::collections::HashSet;

/// 기본 불용어 목록.
///
/// 대화에서 의미 없이 자주 등장하는 접속사/지시어와,
/// 카톡 내보내기가 본문 자리에 남기는 첨부 표시("사진", "이모티콘" 등)입니다.
pub const DEFAULT_STOP_WORDS: &[&str] = &[
    "사진", "이모티콘", "동영상", "파일", "그리고", "그래서", "그런데", "근데", "그냥", "진짜",
    "정말", "너무", "오늘", "내일", "지금", "우리", "하지만", "그럼", "아니", "네네", "맞아",
    "같아", "이제", "혹시", "아마", "일단", "약간", "이거", "저거", "그거",
];

/// 불용어 집합을 품은 토크나이저. 분석 요청마다 하나씩 만들어 사용합니다.
pub struct Tokenizer {
    stop_words: HashSet<String>,
}

impl Tokenizer {
    /// 기본 불용어만 가진 토크나이저를 만듭니다.
    pub fn new() -> Self {
        Self::with_extra_words(&[])
    }

    /// 기본 불용어에 호출자 제공 단어를 합친 토크나이저를 만듭니다.
    ///
    /// 모든 단어는 소문자로 통일되며(대소문자 무시 비교),
    /// HashSet이므로 중복은 자연스럽게 제거됩니다.
    pub fn with_extra_words(extra: &[String]) -> Self {
        let stop_words = DEFAULT_STOP_WORDS
            .iter()
            .map(|w| w.to_lowercase())
            .chain(extra.iter().map(|w| w.to_lowercase()))
            .collect();
        Self { stop_words }
    }

    /// 현재 불용어 집합 전체를 정렬된 목록으로 돌려줍니다.
    ///
    /// 세션 저장 시 이 목록이 JSON 배열로 직렬화됩니다.
    /// (집합 → 목록 변환이므로 중복이 없고, 정렬로 순서가 결정적입니다.)
    pub fn stop_word_list(&self) -> Vec<String> {
        let mut words: Vec<String> = self.stop_words.iter().cloned().collect();
        words.sort();
        words
    }

    /// 메시지 본문을 집계용 토큰 목록으로 변환합니다.
    ///
    /// 빈 본문은 빈 목록을 반환합니다 (에러 아님).
    /// 반환되는 모든 토큰은 길이 2자 이상이며 불용어가 아닙니다.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        if text.is_empty() {
            return Vec::new();
        }

        text.split_whitespace()
            .filter_map(|raw| {
                // 허용 문자만 남기고 소문자로 정규화합니다.
                let cleaned: String = raw.chars().filter(|c| is_word_char(*c)).collect();
                let cleaned = cleaned.to_lowercase();

                // .chars().count(): 유니코드 문자 단위 길이.
                // (.len()은 바이트 길이라 한글에는 부적합합니다)
                if cleaned.chars().count() > 1 && !self.stop_words.contains(&cleaned) {
                    Some(cleaned)
                } else {
                    None
                }
            })
            .collect()
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new()
    }
}

/// 집계 대상 문자인지 판별합니다.
///
/// ASCII 영문/숫자, 그리고 한글 완성형 음절(U+AC00 '가' ~ U+D7A3 '힣')만
/// 허용합니다. 자모 단독(ㅋ, ㅠ 등)은 완성형이 아니므로 제거됩니다.
fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || ('가'..='힣').contains(&c)
}

/// 호출자가 올린 불용어 입력(줄바꿈/쉼표 구분 문자열)을 단어 목록으로 나눕니다.
///
/// 빈 조각은 버립니다. 대소문자 통일과 중복 제거는
/// [`Tokenizer::with_extra_words`]가 담당합니다.
pub fn parse_stop_words(raw: Option<&str>) -> Vec<String> {
    match raw {
        Some(raw) => raw
            .split(|c| c == '\n' || c == ',')
            .map(str::trim)
            .filter(|w| !w.is_empty())
            .map(String::from)
            .collect(),
        None => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_basic() {
        let tokenizer = Tokenizer::new();
        assert_eq!(tokenizer.tokenize("안녕 안녕 하이"), vec!["안녕", "안녕", "하이"]);
    }

    #[test]
    fn test_tokenize_strips_punctuation_and_jamo() {
        let tokenizer = Tokenizer::new();
        // 문장부호와 자모(ㅋ)는 제거되고, 한글+영문 혼합은 남습니다.
        assert_eq!(tokenizer.tokenize("안녕!! rust짱 ㅋㅋㅋ"), vec!["안녕", "rust짱"]);
    }

    #[test]
    fn test_tokenize_lowercases_ascii() {
        let tokenizer = Tokenizer::new();
        assert_eq!(tokenizer.tokenize("Rust RUST rust"), vec!["rust", "rust", "rust"]);
    }

    #[test]
    fn test_tokenize_drops_single_char_tokens() {
        let tokenizer = Tokenizer::new();
        // "응"(1자), "a"(1자)는 버려집니다.
        assert_eq!(tokenizer.tokenize("응 a 좋아요"), vec!["좋아요"]);
    }

    #[test]
    fn test_tokenize_empty_text_is_noop() {
        let tokenizer = Tokenizer::new();
        assert!(tokenizer.tokenize("").is_empty());
    }

    #[test]
    fn test_stop_words_case_insensitive() {
        let tokenizer = Tokenizer::with_extra_words(&["Hello".to_string()]);
        // 불용어 비교는 대소문자를 무시합니다.
        assert!(tokenizer.tokenize("HELLO hello Hello").is_empty());
    }

    #[test]
    fn test_default_stop_words_filtered() {
        let tokenizer = Tokenizer::new();
        // "사진", "이모티콘"은 기본 불용어입니다.
        assert_eq!(tokenizer.tokenize("사진 이모티콘 여행"), vec!["여행"]);
    }

    #[test]
    fn test_every_token_is_valid() {
        let tokenizer = Tokenizer::with_extra_words(&["커피".to_string()]);
        let tokens = tokenizer.tokenize("오늘 커피 마시러 갈래? ㅋㅋ coffee COFFEE 가자!");
        for token in &tokens {
            assert!(token.chars().count() > 1);
            assert!(!tokenizer.stop_words.contains(token));
        }
    }

    #[test]
    fn test_parse_stop_words_mixed_separators() {
        let words = parse_stop_words(Some("커피, 녹차\n홍차 , \n"));
        assert_eq!(words, vec!["커피", "녹차", "홍차"]);
    }

    #[test]
    fn test_parse_stop_words_none() {
        assert!(parse_stop_words(None).is_empty());
    }

    #[test]
    fn test_stop_word_list_sorted_deduped() {
        let tokenizer =
            Tokenizer::with_extra_words(&["커피".to_string(), "커피".to_string(), "ABC".to_string()]);
        let list = tokenizer.stop_word_list();
        // 중복 없음
        assert_eq!(list.iter().filter(|w| *w == "커피").count(), 1);
        // 소문자 통일
        assert!(list.contains(&"abc".to_string()));
        // 정렬됨
        let mut sorted = list.clone();
        sorted.sort();
        assert_eq!(list, sorted);
    }

    #[test]
    fn test_default_stop_word_count() {
        assert_eq!(DEFAULT_STOP_WORDS.len(), 30);
    }
}
