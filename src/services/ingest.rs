//! # 분석 파이프라인 (Ingest)
//!
//! 임시 저장된 업로드 파일을 줄 단위 스트림으로 읽어
//! 파서 → 날짜 필터 → 집계기 순으로 흘려보냅니다.
//!
//! ```text
//! 업로드 파일 ─(줄 스트림)→ LineParser ─→ DateRange ─→ Aggregator ─→ AnalysisOutcome
//! ```
//!
//! 파일 전체를 메모리에 올리지 않습니다. BufReader의 읽기 버퍼만큼만
//! 메모리를 쓰며, 메모리 사용량은 파일 크기가 아니라 참여자 수 ×
//! 메시지 수 × 어휘 크기에 비례합니다.

use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::error::AppError;
use crate::services::analyzer::{build_outcome, Aggregator, AnalysisOutcome};
use crate::services::parser::LineParser;
use crate::services::tokenizer::Tokenizer;

/// 선택적인 날짜 범위 (양끝 포함).
///
/// 범위 밖 메시지는 집계기에 닿기 전에 버려지며,
/// 어떤 집계에도 포함되지 않습니다.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    /// 타임스탬프의 날짜가 범위 안(양끝 포함)인지 확인합니다.
    pub fn contains(&self, timestamp: &NaiveDateTime) -> bool {
        let date = timestamp.date();
        if let Some(start) = self.start {
            if date < start {
                return false;
            }
        }
        if let Some(end) = self.end {
            if date > end {
                return false;
            }
        }
        true
    }
}

/// 파일을 줄 단위로 분석하여 요약 산출물을 만듭니다.
///
/// # 매개변수
/// - `path`: 임시 저장된 업로드 파일 경로
/// - `range`: 날짜 필터 (없으면 전체 통과)
/// - `tokenizer`: 이번 요청의 불용어가 반영된 토크나이저
/// - `target_user`: trim/기본값 처리가 끝난 대상자 이름
///
/// # 에러
/// 파일 열기/읽기 실패 시 `AppError::Io`.
/// 파싱 실패는 에러가 아니며 해당 줄만 조용히 건너뜁니다.
pub async fn analyze_file(
    path: &Path,
    range: &DateRange,
    tokenizer: Tokenizer,
    target_user: &str,
) -> Result<AnalysisOutcome, AppError> {
    let parser = LineParser::new();
    let mut aggregator = Aggregator::new(tokenizer);

    let file = File::open(path).await?;
    let reader = BufReader::new(file);

    // split(b'\n'): 줄 단위 바이트 스트림. lines()와 달리 UTF-8이 아닌
    // 바이트가 섞여 있어도 에러 없이 읽을 수 있습니다.
    // (내보내기 파일에 깨진 문자가 섞이는 일이 실제로 있습니다)
    let mut segments = reader.split(b'\n');
    let mut line_count: u64 = 0;
    let mut parsed_count: u64 = 0;

    // while let Some(...) = ...: 스트림이 끝날 때까지 반복합니다.
    while let Some(segment) = segments.next_segment().await? {
        line_count += 1;

        // from_utf8_lossy: 깨진 바이트를 U+FFFD로 바꿔 문자열로 만듭니다.
        let line = String::from_utf8_lossy(&segment);

        // 파서가 인식하지 못한 줄은 조용히 건너뜁니다 (집계 안 됨).
        let Some(parsed) = parser.parse(&line) else {
            continue;
        };

        // 날짜 범위 밖 메시지도 집계 전에 버립니다.
        if !range.contains(&parsed.timestamp) {
            continue;
        }

        parsed_count += 1;
        aggregator.push(&parsed);
    }

    tracing::debug!(
        "Analyzed {} lines, {} messages survived parse + date filter",
        line_count,
        parsed_count
    );

    Ok(build_outcome(aggregator.into_aggregates(), target_user))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WordCount;
    use std::io::Write;

    fn range(start: Option<&str>, end: Option<&str>) -> DateRange {
        let parse = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap();
        DateRange {
            start: start.map(parse),
            end: end.map(parse),
        }
    }

    fn write_temp(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(content.as_bytes()).expect("write fixture");
        file
    }

    #[test]
    fn test_date_range_inclusive() {
        let r = range(Some("2024-01-01"), Some("2024-01-31"));
        let ts = |s: &str| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap().and_hms_opt(12, 0, 0).unwrap()
        };
        assert!(r.contains(&ts("2024-01-01"))); // 시작일 포함
        assert!(r.contains(&ts("2024-01-31"))); // 종료일 포함
        assert!(!r.contains(&ts("2023-12-31")));
        assert!(!r.contains(&ts("2024-02-01")));
    }

    #[test]
    fn test_date_range_open_ended() {
        assert!(DateRange::default().contains(
            &NaiveDate::from_ymd_opt(1999, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap()
        ));
    }

    #[tokio::test]
    async fn test_analyze_single_line_file() {
        // 한 줄짜리 파일의 전체 경로 검증
        let file = write_temp("2024. 3. 1. 오전 10:00, A : 안녕 안녕 하이\n");
        let outcome =
            analyze_file(file.path(), &DateRange::default(), Tokenizer::new(), "이호준")
                .await
                .expect("analyze");

        assert_eq!(outcome.total_messages, 1);
        assert!(outcome.target.is_none());
        assert_eq!(outcome.table.len(), 1);

        let summary = &outcome.table[0];
        assert_eq!(summary.name, "A");
        assert_eq!(summary.total_messages, 1);
        assert_eq!(
            summary.top_words,
            vec![
                WordCount { word: "안녕".into(), count: 2 },
                WordCount { word: "하이".into(), count: 1 },
            ]
        );
    }

    #[tokio::test]
    async fn test_analyze_skips_unparsable_lines() {
        let file = write_temp(
            "2024. 1. 5. 오후 9:15, 철수 : 안녕\n\
             이어서 친 멀티라인 본문\n\
             \n\
             2024. 1. 5. 오후 9:16, 영희 : 그래 안녕\n",
        );
        let outcome =
            analyze_file(file.path(), &DateRange::default(), Tokenizer::new(), "이호준")
                .await
                .expect("analyze");

        // 형식에 맞는 2줄만 집계됩니다.
        assert_eq!(outcome.total_messages, 2);
        assert_eq!(outcome.table.len(), 2);
    }

    #[tokio::test]
    async fn test_analyze_applies_date_filter() {
        let file = write_temp(
            "2024. 1. 5. 오후 9:15, 철수 : 일월 메시지\n\
             2024. 2. 5. 오후 9:15, 철수 : 이월 메시지\n\
             2024. 3. 5. 오후 9:15, 철수 : 삼월 메시지\n",
        );
        let outcome = analyze_file(
            file.path(),
            &range(Some("2024-02-01"), Some("2024-02-28")),
            Tokenizer::new(),
            "철수",
        )
        .await
        .expect("analyze");

        // 범위 밖 메시지는 어떤 집계에도 없습니다.
        assert_eq!(outcome.total_messages, 1);
        let target = outcome.target.expect("target present");
        assert_eq!(target.chronological_messages.len(), 1);
        assert_eq!(target.chronological_messages[0].text, "이월 메시지");
    }

    #[tokio::test]
    async fn test_analyze_counts_attributed_lines() {
        // totalMessages = 파싱과 날짜 필터를 통과해 그 사람에게 귀속된 줄 수
        let file = write_temp(
            "2024. 1. 5. 오후 9:15, 철수 : 하나\n\
             2024. 1. 5. 오후 9:16, 영희 : 둘\n\
             2024. 1. 5. 오후 9:17, 철수 : 셋\n\
             깨진 줄\n",
        );
        let outcome =
            analyze_file(file.path(), &DateRange::default(), Tokenizer::new(), "철수")
                .await
                .expect("analyze");

        let chulsu = outcome.table.iter().find(|s| s.name == "철수").unwrap();
        assert_eq!(chulsu.total_messages, 2);
        assert_eq!(outcome.target.unwrap().total_messages, 2);
    }
}
