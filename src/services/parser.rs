//! # 대화 줄 파서 (Line Parser)
//!
//! 내보내기된 대화 파일의 한 줄을 `ParsedMessage`로 분류합니다.
//! 카톡 내보내기 파일은 기기/버전에 따라 형식이 제각각이므로,
//! 고정된 우선순위의 전략(strategy) 목록을 차례로 시도합니다.
//!
//! | 우선순위 | 전략 | 예시 |
//! |----------|------|------|
//! | 1 | 기본 내보내기 형식 | `2024. 1. 5. 오후 9:15, 철수 : 안녕` |
//! | 2 | 탭 구분 | `2024-01-05 21:15:00<TAB>철수/서울<TAB>안녕` |
//! | 3 | 쉼표 구분 (따옴표 허용) | `"2024-01-05 21:15","철수","안녕, 뭐해"` |
//!
//! 첫 번째로 성공한 전략의 결과를 사용합니다. 새 내보내기 형식 지원은
//! 전략을 하나 추가하는 것으로 끝나며, 기존 전략을 고칠 필요가 없습니다.
//!
//! 어떤 전략으로도 유효한 날짜/시각을 얻지 못한 줄은 **조용히 건너뜁니다**.
//! (에러가 아니며, 어디에도 집계되지 않습니다. 사람이 이어서 친 멀티라인
//! 본문, 시스템 안내문 등 메시지가 아닌 줄이 섞여 있는 것이 정상이므로
//! 재현율보다 견고함을 우선합니다.)

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;

use crate::models::ParsedMessage;

/// 하나의 줄 형식을 해석하는 전략.
///
/// 트레이트 객체(`Box<dyn ParseStrategy>`)로 보관하여
/// `LineParser`가 전략 목록을 순서대로 시도할 수 있게 합니다.
trait ParseStrategy: Send + Sync {
    /// 이 전략이 아는 형식이면 `Some(ParsedMessage)`, 아니면 `None`.
    fn try_parse(&self, line: &str) -> Option<ParsedMessage>;
}

/// 고정 우선순위의 전략 체인으로 줄을 분류하는 파서.
///
/// 요청(분석 1회)마다 하나씩 만들어 사용합니다.
pub struct LineParser {
    strategies: Vec<Box<dyn ParseStrategy>>,
}

impl LineParser {
    /// 기본 전략 체인(기본 형식 → 탭 구분 → 쉼표 구분)을 가진 파서를 만듭니다.
    pub fn new() -> Self {
        Self {
            // 순서가 곧 우선순위입니다. 앞의 전략이 성공하면 뒤는 시도하지 않습니다.
            strategies: vec![
                Box::new(KakaoExportStrategy::new()),
                Box::new(TabDelimitedStrategy),
                Box::new(CommaDelimitedStrategy),
            ],
        }
    }

    /// 한 줄을 파싱합니다.
    ///
    /// # 반환값
    /// - `Some(ParsedMessage)`: 어떤 전략이 형식을 인식하고 유효한 시각을 얻은 경우
    /// - `None`: 공백 줄이거나, 모든 전략이 실패한 경우 (조용히 건너뜀)
    pub fn parse(&self, line: &str) -> Option<ParsedMessage> {
        let line = line.trim();
        // 공백 줄은 전략을 시도하기 전에 걸러냅니다.
        if line.is_empty() {
            return None;
        }
        // find_map: 각 전략의 try_parse를 순서대로 호출하여
        // 처음으로 Some을 반환한 결과를 돌려줍니다.
        self.strategies.iter().find_map(|s| s.try_parse(line))
    }
}

impl Default for LineParser {
    fn default() -> Self {
        Self::new()
    }
}

// ── 전략 1: 카톡 기본 내보내기 형식 ──

/// `YYYY. M. D. 오전|오후 H:MM, 보낸사람 : 본문` 형식.
///
/// 모바일 내보내기가 쓰는 12시간제 한국어 표기를 24시간제로 변환합니다.
struct KakaoExportStrategy {
    pattern: Regex,
}

impl KakaoExportStrategy {
    fn new() -> Self {
        Self {
            // 캡처 그룹: 1=년 2=월 3=일 4=오전/오후 5=시 6=분 7=보낸사람 8=본문
            // (.+?)는 게으른(lazy) 매칭: 첫 번째 " : " 앞까지가 보낸사람이 되고,
            // 본문에 콜론이 들어 있어도 본문 쪽으로 넘어갑니다.
            pattern: Regex::new(
                r"^(\d{4})\.\s*(\d{1,2})\.\s*(\d{1,2})\.\s*(오전|오후)\s*(\d{1,2}):(\d{2}),\s*(.+?)\s*:\s*(.*)$",
            )
            .expect("kakao export pattern is valid"),
        }
    }
}

impl ParseStrategy for KakaoExportStrategy {
    fn try_parse(&self, line: &str) -> Option<ParsedMessage> {
        let caps = self.pattern.captures(line)?;

        // 캡처 그룹은 전부 \d 패턴이므로 parse::<u32>()가 실패하지 않지만,
        // ok()?로 안전하게 처리합니다.
        let year: i32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let day: u32 = caps[3].parse().ok()?;
        let hour: u32 = caps[5].parse().ok()?;
        let minute: u32 = caps[6].parse().ok()?;

        // 12시간제 → 24시간제 변환 규칙:
        // - 오후 + 12시가 아니면 → +12 (오후 9시 → 21시)
        // - 오전 + 12시면 → 0시 (자정)
        // - 그 외는 그대로 (오후 12시 → 12시, 오전 9시 → 9시)
        let hour = match (&caps[4], hour) {
            ("오후", h) if h != 12 => h + 12,
            ("오전", 12) => 0,
            (_, h) => h,
        };

        // from_ymd_opt / and_hms_opt: 달력상 유효하지 않은 값(13월, 32일,
        // 25시 등)이면 None을 반환합니다. 이때 줄 전체가 건너뛰어집니다.
        let timestamp = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, 0)?;

        Some(ParsedMessage {
            timestamp,
            sender: caps[7].trim().to_string(),
            text: caps[8].trim().to_string(),
        })
    }
}

// ── 전략 2: 탭 구분 형식 ──

/// `타임스탬프<TAB>보낸사람<TAB>본문...` 형식.
///
/// PC 버전 내보내기/스프레드시트 저장본에서 나타나는 형식입니다.
/// 보낸사람 필드에 `/`가 있으면 첫 조각만 이름으로 사용합니다
/// (예: "철수/서울모임" → "철수"). 세 번째 이후 필드는 공백 하나로
/// 이어붙여 본문으로 취급합니다.
struct TabDelimitedStrategy;

impl ParseStrategy for TabDelimitedStrategy {
    fn try_parse(&self, line: &str) -> Option<ParsedMessage> {
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 2 {
            return None;
        }
        message_from_fields(&fields)
    }
}

// ── 전략 3: 쉼표 구분 형식 (따옴표 허용) ──

/// `타임스탬프,보낸사람,본문` 형식. 필드가 큰따옴표로 감싸져 있으면
/// 내부의 쉼표를 구분자로 취급하지 않고, 감싼 따옴표는 벗겨냅니다.
///
/// 필드 해석은 탭 구분 전략과 동일합니다.
struct CommaDelimitedStrategy;

impl ParseStrategy for CommaDelimitedStrategy {
    fn try_parse(&self, line: &str) -> Option<ParsedMessage> {
        let fields = split_quoted_csv(line);
        if fields.len() < 2 {
            return None;
        }
        let refs: Vec<&str> = fields.iter().map(String::as_str).collect();
        message_from_fields(&refs)
    }
}

/// 탭/쉼표 구분 전략이 공유하는 필드 → 메시지 변환.
///
/// - 필드 0: 범용 타임스탬프 파싱 (실패하면 줄 전체가 건너뛰어짐)
/// - 필드 1: `/`로 나눈 첫 조각이 보낸사람
/// - 필드 2..: 공백 하나로 이어붙인 본문 (필드가 2개뿐이면 빈 본문)
fn message_from_fields(fields: &[&str]) -> Option<ParsedMessage> {
    let timestamp = parse_generic_timestamp(fields[0].trim())?;
    let sender = fields[1].split('/').next().unwrap_or(fields[1]).trim().to_string();
    let text = fields[2..].join(" ");
    Some(ParsedMessage { timestamp, sender, text })
}

/// 큰따옴표를 존중하며 한 줄을 쉼표로 나눕니다.
///
/// 따옴표 안의 쉼표는 구분자가 아닙니다. 나눈 뒤 각 필드를 감싼
/// 따옴표는 벗겨냅니다.
fn split_quoted_csv(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in line.chars() {
        match ch {
            '"' => {
                // 따옴표 상태를 토글하되 문자는 남겨둡니다.
                // 감싼 따옴표 제거는 필드 단위로 아래에서 처리합니다.
                in_quotes = !in_quotes;
                current.push(ch);
            }
            ',' if !in_quotes => {
                // std::mem::take: current의 내용을 꺼내고 빈 String으로 바꿉니다.
                // (clone 없이 소유권을 이동시키는 관용구)
                fields.push(std::mem::take(&mut current));
            }
            _ => current.push(ch),
        }
    }
    fields.push(current);

    fields.into_iter().map(strip_wrapping_quotes).collect()
}

/// 필드를 감싼 큰따옴표 한 쌍을 벗겨냅니다. 감싸져 있지 않으면 그대로 둡니다.
fn strip_wrapping_quotes(field: String) -> String {
    let trimmed = field.trim();
    trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(trimmed)
        .to_string()
}

// ── 범용 타임스탬프 파싱 ──

/// 날짜+시각 형식 후보 (위에서부터 순서대로 시도)
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%Y.%m.%d %H:%M:%S",
    "%Y.%m.%d %H:%M",
];

/// 날짜만 있는 형식 후보 (자정으로 해석)
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d"];

/// 형식을 알 수 없는 타임스탬프 문자열을 여러 chrono 포맷으로 시도합니다.
///
/// 날짜+시각 포맷을 먼저, 날짜만 있는 포맷(자정 취급)을 나중에 시도하며
/// 전부 실패하면 `None`을 반환합니다.
pub(crate) fn parse_generic_timestamp(raw: &str) -> Option<NaiveDateTime> {
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt);
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    None
}
