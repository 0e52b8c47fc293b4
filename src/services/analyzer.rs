//! # 분석기 (집계 + 요약)
//!
//! 파서/날짜 필터를 통과한 메시지를 참여자별로 모으고(Aggregator),
//! 스트림이 끝나면 순위표와 대상자 요약으로 줄입니다(요약 빌더).
//!
//! 순서 규칙 — 이 모듈의 핵심 불변식:
//! - 참여자 목록과 단어 목록은 **처음 등장한 순서**를 유지합니다.
//!   (Vec + 인덱스 맵. HashMap만 쓰면 순서가 사라집니다.)
//! - 정렬은 전부 안정(stable) 정렬이라, 동률일 때 먼저 등장한 쪽이 앞에 옵니다.
//! - 메시지는 어느 단계에서도 시각순으로 재정렬하지 않습니다.
//!   파일에서 읽힌 순서가 그대로 보존됩니다.
//!
//! 집계 상태는 요청마다 새로 만든 `Aggregator` 값이 소유하며,
//! 요청 간에 공유되는 전역 상태는 없습니다.

use std::collections::HashMap;

use crate::models::{
    MessageEntry, NewParticipant, ParsedMessage, TargetUserSummary, UserSummary, WordCount,
};
use crate::services::tokenizer::Tokenizer;

/// 순위표의 상위 단어 개수
const TABLE_TOP_WORDS: usize = 10;
/// 대상자 요약의 상위 단어 개수
const TARGET_TOP_WORDS: usize = 20;
/// 순위표에 싣는 최근 메시지 표본 개수
const SAMPLE_MESSAGES: usize = 5;

/// 참여자 한 명의 집계 상태. 분석 요청 하나 동안만 살아있습니다.
pub struct UserAggregate {
    pub sender: String,
    /// 파일에서 읽힌 순서 그대로의 메시지 목록
    pub messages: Vec<MessageEntry>,
    /// 단어 → 횟수. 처음 등장한 순서를 유지하는 Vec
    word_counts: Vec<WordCount>,
    /// 단어 → word_counts 인덱스 (횟수 증가를 O(1)로)
    word_index: HashMap<String, usize>,
}

impl UserAggregate {
    fn new(sender: String) -> Self {
        Self {
            sender,
            messages: Vec::new(),
            word_counts: Vec::new(),
            word_index: HashMap::new(),
        }
    }

    /// 메시지 하나를 기록합니다.
    ///
    /// 메시지 목록에는 본문이 비어 있어도 무조건 추가합니다.
    /// 단어 집계는 본문이 있을 때만 수행합니다.
    fn record(&mut self, message: &ParsedMessage, tokenizer: &Tokenizer) {
        self.messages.push(MessageEntry {
            timestamp: message.timestamp,
            text: message.text.clone(),
        });

        if !message.text.is_empty() {
            for token in tokenizer.tokenize(&message.text) {
                self.count_word(token);
            }
        }
    }

    fn count_word(&mut self, word: String) {
        match self.word_index.get(&word) {
            Some(&i) => self.word_counts[i].count += 1,
            None => {
                // 처음 보는 단어: 목록 끝에 추가하고 인덱스를 기억합니다.
                self.word_index.insert(word.clone(), self.word_counts.len());
                self.word_counts.push(WordCount { word, count: 1 });
            }
        }
    }

    /// 횟수 내림차순 상위 `limit`개 단어.
    ///
    /// sort_by는 안정 정렬이므로 횟수가 같은 단어는
    /// 먼저 등장한 순서를 유지합니다.
    pub fn top_words(&self, limit: usize) -> Vec<WordCount> {
        let mut words = self.word_counts.clone();
        words.sort_by(|a, b| b.count.cmp(&a.count));
        words.truncate(limit);
        words
    }
}

/// 분석 요청 하나를 담당하는 집계기.
pub struct Aggregator {
    tokenizer: Tokenizer,
    /// 참여자 집계 목록 (처음 등장한 순서)
    aggregates: Vec<UserAggregate>,
    /// 보낸사람 이름 → aggregates 인덱스
    index: HashMap<String, usize>,
}

impl Aggregator {
    pub fn new(tokenizer: Tokenizer) -> Self {
        Self {
            tokenizer,
            aggregates: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// 필터를 통과한 메시지 하나를 집계에 반영합니다.
    pub fn push(&mut self, message: &ParsedMessage) {
        let i = match self.index.get(&message.sender) {
            Some(&i) => i,
            None => {
                let i = self.aggregates.len();
                self.index.insert(message.sender.clone(), i);
                self.aggregates.push(UserAggregate::new(message.sender.clone()));
                i
            }
        };
        self.aggregates[i].record(message, &self.tokenizer);
    }

    /// 집계를 끝내고 참여자 집계 목록을 꺼냅니다 (처음 등장한 순서).
    pub fn into_aggregates(self) -> Vec<UserAggregate> {
        self.aggregates
    }
}

/// 요약 빌더의 최종 산출물. 응답 생성과 저장에 필요한 모든 것을 담습니다.
pub struct AnalysisOutcome {
    /// 메시지 수 내림차순 순위표
    pub table: Vec<UserSummary>,
    /// 대상자 요약. 대상 이름이 어떤 참여자와도 일치하지 않으면 None
    pub target: Option<TargetUserSummary>,
    /// 저장용 참여자 데이터 (순위 순서, 전체 메시지 포함)
    pub participants: Vec<NewParticipant>,
    /// 전체 메시지 수
    pub total_messages: i64,
}

/// 참여자 집계 목록을 순위표 + 대상자 요약으로 줄입니다.
///
/// `target_user`는 호출 전에 trim과 기본값 처리가 끝난 이름이어야 합니다.
pub fn build_outcome(aggregates: Vec<UserAggregate>, target_user: &str) -> AnalysisOutcome {
    let mut ranked = aggregates;
    // 메시지 수 내림차순. 안정 정렬이므로 동률은 처음 등장한 순서를 유지합니다.
    ranked.sort_by(|a, b| b.messages.len().cmp(&a.messages.len()));

    let table: Vec<UserSummary> = ranked.iter().map(summarize).collect();
    let target = build_target_summary(&ranked, &table, target_user);
    let total_messages = table.iter().map(|s| s.total_messages).sum();

    // 집계를 저장용 구조체로 옮깁니다. 전체 메시지 목록은 여기서
    // 소유권이 이동하므로 복사가 일어나지 않습니다.
    let participants = ranked
        .into_iter()
        .zip(table.iter())
        .map(|(aggregate, summary)| NewParticipant {
            name: aggregate.sender,
            total_messages: summary.total_messages,
            top_words: summary.top_words.clone(),
            messages: aggregate.messages,
        })
        .collect();

    AnalysisOutcome {
        table,
        target,
        participants,
        total_messages,
    }
}

/// 집계 하나를 순위표 행으로 요약합니다.
fn summarize(aggregate: &UserAggregate) -> UserSummary {
    // 표본은 파일 순서 기준 마지막 5개입니다.
    // saturating_sub: 5개 미만이면 0부터 (음수 방지)
    let sample_start = aggregate.messages.len().saturating_sub(SAMPLE_MESSAGES);

    UserSummary {
        name: aggregate.sender.clone(),
        total_messages: aggregate.messages.len() as i64,
        top_words: aggregate.top_words(TABLE_TOP_WORDS),
        sample_messages: aggregate.messages[sample_start..].to_vec(),
    }
}

/// 대상자 요약을 만듭니다.
///
/// 대상 이름과 일치하는 참여자가 없으면 `None`입니다 — 에러가 아니며
/// 다른 출력에는 아무 영향을 주지 않습니다.
///
/// 대상자의 단어가 전부 걸러져 상위 단어가 비면(예: 불용어만 보낸 경우)
/// 빈 목록 대신 순위표에 실린 같은 이름의 상위 단어를 사용합니다.
fn build_target_summary(
    ranked: &[UserAggregate],
    table: &[UserSummary],
    target_user: &str,
) -> Option<TargetUserSummary> {
    let aggregate = ranked.iter().find(|a| a.sender == target_user)?;

    let mut top_words = aggregate.top_words(TARGET_TOP_WORDS);
    if top_words.is_empty() {
        top_words = table
            .iter()
            .find(|s| s.name == target_user)
            .map(|s| s.top_words.clone())
            .unwrap_or_default();
    }

    Some(TargetUserSummary {
        name: aggregate.sender.clone(),
        total_messages: aggregate.messages.len() as i64,
        top_words,
        chronological_messages: aggregate.messages.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn msg(sender: &str, text: &str) -> ParsedMessage {
        ParsedMessage {
            timestamp: NaiveDate::from_ymd_opt(2024, 1, 5)
                .unwrap()
                .and_hms_opt(21, 15, 0)
                .unwrap(),
            sender: sender.to_string(),
            text: text.to_string(),
        }
    }

    fn aggregate_all(messages: &[ParsedMessage]) -> Vec<UserAggregate> {
        let mut aggregator = Aggregator::new(Tokenizer::new());
        for m in messages {
            aggregator.push(m);
        }
        aggregator.into_aggregates()
    }

    #[test]
    fn test_word_counts_keep_first_encounter_order() {
        let aggregates = aggregate_all(&[msg("A", "하이 안녕 안녕")]);
        let top = aggregates[0].top_words(10);
        // 안녕(2) > 하이(1), 횟수 내림차순
        assert_eq!(top[0], WordCount { word: "안녕".into(), count: 2 });
        assert_eq!(top[1], WordCount { word: "하이".into(), count: 1 });
    }

    #[test]
    fn test_top_words_tie_keeps_first_encounter_order() {
        let aggregates = aggregate_all(&[msg("A", "하이 안녕 모두 안녕 하이 모두")]);
        let top = aggregates[0].top_words(10);
        // 전부 2회 동률 → 먼저 등장한 순서: 하이, 안녕, 모두
        let words: Vec<&str> = top.iter().map(|w| w.word.as_str()).collect();
        assert_eq!(words, vec!["하이", "안녕", "모두"]);
    }

    #[test]
    fn test_top_words_limit() {
        let text = "가나 다라 마바 사아 자차 카타 파하 나가 라다 바마 아사 차자";
        let aggregates = aggregate_all(&[msg("A", text)]);
        assert_eq!(aggregates[0].top_words(10).len(), 10);
    }

    #[test]
    fn test_empty_text_counts_message_but_no_words() {
        let aggregates = aggregate_all(&[msg("A", "")]);
        assert_eq!(aggregates[0].messages.len(), 1);
        assert!(aggregates[0].top_words(10).is_empty());
    }

    #[test]
    fn test_table_sorted_by_total_desc_ties_stable() {
        // B가 2건, A와 C가 각 1건 (A가 C보다 먼저 등장)
        let outcome = build_outcome(
            aggregate_all(&[msg("A", "하나"), msg("B", "하나"), msg("C", "하나"), msg("B", "둘이")]),
            "없는사람",
        );
        let names: Vec<&str> = outcome.table.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["B", "A", "C"]);
        assert_eq!(outcome.total_messages, 4);
    }

    #[test]
    fn test_sample_messages_are_last_five() {
        let messages: Vec<ParsedMessage> =
            (0..7).map(|i| msg("A", &format!("메시지 {i}번"))).collect();
        let outcome = build_outcome(aggregate_all(&messages), "없는사람");
        let samples = &outcome.table[0].sample_messages;
        assert_eq!(samples.len(), 5);
        // 파일 순서 기준 마지막 5개 (2번~6번)
        assert_eq!(samples[0].text, "메시지 2번");
        assert_eq!(samples[4].text, "메시지 6번");
    }

    #[test]
    fn test_target_missing_is_none_and_table_unaffected() {
        let outcome = build_outcome(aggregate_all(&[msg("A", "안녕")]), "이호준");
        assert!(outcome.target.is_none());
        assert_eq!(outcome.table.len(), 1);
        assert_eq!(outcome.total_messages, 1);
    }

    #[test]
    fn test_target_summary_has_all_messages_in_encounter_order() {
        let messages = vec![msg("A", "첫번째"), msg("B", "다른사람"), msg("A", "두번째")];
        let outcome = build_outcome(aggregate_all(&messages), "A");
        let target = outcome.target.unwrap();
        assert_eq!(target.name, "A");
        assert_eq!(target.total_messages, 2);
        assert_eq!(target.chronological_messages.len(), 2);
        assert_eq!(target.chronological_messages[0].text, "첫번째");
        assert_eq!(target.chronological_messages[1].text, "두번째");
    }

    #[test]
    fn test_target_empty_word_table_falls_back_to_table_words() {
        // 대상자 본문이 전부 불용어/1자라 단어 집계가 비는 경우
        let outcome = build_outcome(aggregate_all(&[msg("A", "사진 응")]), "A");
        let target = outcome.target.unwrap();
        // 순위표 쪽 상위 단어도 비어 있으므로 결과적으로 빈 목록이지만,
        // 대체 경로를 타서 panic 없이 동작해야 합니다.
        assert!(target.top_words.is_empty());
        assert_eq!(target.total_messages, 1);
    }

    #[test]
    fn test_participants_ranked_order_with_full_messages() {
        let outcome = build_outcome(
            aggregate_all(&[msg("A", "하나"), msg("B", "하나 둘셋"), msg("B", "둘이")]),
            "없는사람",
        );
        assert_eq!(outcome.participants[0].name, "B");
        assert_eq!(outcome.participants[0].messages.len(), 2);
        assert_eq!(outcome.participants[1].name, "A");
        // 순위표의 상위 단어와 저장용 상위 단어가 일치합니다.
        assert_eq!(outcome.participants[0].top_words, outcome.table[0].top_words);
    }
}
