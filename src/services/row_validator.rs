//! 이체 시트 행 검증 - 업무 능력층
//!
//! 원본 범위 `E:K` 의 7칸 행을 검사한다.
//! 제외(reject)는 이체 대상에서 빠지고, 표시(flag)는 포함되지만 확인이 필요하다.

use serde::Serialize;

/// 최소 열 수 (E:K)
pub const ROW_WIDTH: usize = 7;
/// 이름 열 (F)
const NAME_INDEX: usize = 1;
/// 계좌 표시 열 (I)
const ACCOUNT_INDEX: usize = 4;
/// 주민번호 열 (J)
const ID_INDEX: usize = 5;
const ID_DIGITS: usize = 13;

pub const REASON_NO_ACCOUNT: &str = "계좌번호 없음";
pub const REASON_ID_DIGITS: &str = "주민번호 자리수 오류";
pub const REASON_NO_NAME: &str = "이름 없음";
pub const REASON_NAME_MISMATCH: &str = "계좌 표시명과 불일치";

/// 제외되거나 표시된 행
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowIssue {
    /// 원본 시트의 행 번호 (1부터)
    pub row_number: usize,
    pub cells: Vec<String>,
    pub reason: &'static str,
}

/// 한 범위의 검증 결과
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// 통과한 행 (원래 순서, 계좌 열 정리됨)
    pub accepted: Vec<Vec<String>>,
    pub rejected: Vec<RowIssue>,
    pub flagged: Vec<RowIssue>,
}

/// 한글 문자 여부 (음절, 자모, 호환 자모, 확장 자모, 반각 자모)
pub fn is_hangul(ch: char) -> bool {
    matches!(
        ch,
        '\u{AC00}'..='\u{D7A3}'
            | '\u{1100}'..='\u{11FF}'
            | '\u{3130}'..='\u{318F}'
            | '\u{A960}'..='\u{A97F}'
            | '\u{D7B0}'..='\u{D7FF}'
            | '\u{FFA0}'..='\u{FFDC}'
    )
}

/// 계좌 칸 정리: 괄호 제거, 숫자/영문/한글/하이픈/공백만 남기고 앞뒤 공백 제거
pub fn clean_account_text(text: &str) -> String {
    text.chars()
        .filter(|&c| c.is_ascii_alphanumeric() || c == '-' || c == ' ' || is_hangul(c))
        .collect::<String>()
        .trim()
        .to_string()
}

fn digit_count(text: &str) -> usize {
    text.chars().filter(|c| c.is_ascii_digit()).count()
}

/// 행 목록 검증
///
/// `first_row` 는 `rows[0]` 의 원본 행 번호다.
pub fn validate_rows(rows: &[Vec<String>], first_row: usize) -> ValidationReport {
    let mut report = ValidationReport::default();

    for (offset, raw) in rows.iter().enumerate() {
        let row_number = first_row + offset;
        let mut cells = raw.clone();
        if cells.len() < ROW_WIDTH {
            cells.resize(ROW_WIDTH, String::new());
        }
        cells[ACCOUNT_INDEX] = clean_account_text(&cells[ACCOUNT_INDEX]);

        let reject = if cells[ACCOUNT_INDEX].is_empty() {
            Some(REASON_NO_ACCOUNT)
        } else if digit_count(&cells[ID_INDEX]) != ID_DIGITS {
            Some(REASON_ID_DIGITS)
        } else {
            None
        };

        if let Some(reason) = reject {
            report.rejected.push(RowIssue {
                row_number,
                cells,
                reason,
            });
            continue;
        }

        let name = cells[NAME_INDEX].trim();
        let flag = if name.is_empty() {
            Some(REASON_NO_NAME)
        } else if !cells[ACCOUNT_INDEX].contains(name) {
            Some(REASON_NAME_MISMATCH)
        } else {
            None
        };

        if let Some(reason) = flag {
            report.flagged.push(RowIssue {
                row_number,
                cells: cells.clone(),
                reason,
            });
        }

        report.accepted.push(cells);
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    const ID: &str = "900101-1234567";

    #[test]
    fn test_clean_account_text() {
        assert_eq!(
            clean_account_text(" 신한(홍길동) 110-123-456! "),
            "신한홍길동 110-123-456"
        );
        assert_eq!(clean_account_text("KB*국민#123"), "KB국민123");
        assert_eq!(clean_account_text("ㅎㄱ 12"), "ㅎㄱ 12");
        assert_eq!(clean_account_text("(  )"), "");
    }

    #[test]
    fn test_hangul_ranges() {
        assert!(is_hangul('한'));
        assert!(is_hangul('ㄱ'));
        assert!(is_hangul('\u{1100}'));
        assert!(!is_hangul('漢'));
        assert!(!is_hangul('a'));
        assert!(!is_hangul('é'));
    }

    #[test]
    fn test_accepted_row() {
        let rows = vec![row(&["A상품", "홍길동", "", "", "신한 홍길동 110-123", ID, "5000"])];
        let report = validate_rows(&rows, 2);
        assert_eq!(report.accepted.len(), 1);
        assert!(report.rejected.is_empty());
        assert!(report.flagged.is_empty());
    }

    #[test]
    fn test_short_id_is_rejected() {
        let rows = vec![
            row(&["A", "홍길동", "", "", "신한 홍길동 1", "12345", "1"]),
            row(&["A", "", "", "", "", "900101-12345678", "1"]),
        ];
        let report = validate_rows(&rows, 12);
        assert!(report.accepted.is_empty());
        assert_eq!(report.rejected[0].reason, REASON_ID_DIGITS);
        assert_eq!(report.rejected[0].row_number, 12);
        // 계좌가 비면 주민번호 검사 전에 제외
        assert_eq!(report.rejected[1].reason, REASON_NO_ACCOUNT);
        assert_eq!(report.rejected[1].row_number, 13);
    }

    #[test]
    fn test_empty_account_checked_first() {
        let rows = vec![row(&["A", "홍길동", "", "", "()", "1", "1"])];
        let report = validate_rows(&rows, 2);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].reason, REASON_NO_ACCOUNT);
    }

    #[test]
    fn test_short_row_is_padded() {
        let rows = vec![row(&["A", "홍길동"])];
        let report = validate_rows(&rows, 2);
        assert_eq!(report.rejected[0].cells.len(), ROW_WIDTH);
        assert_eq!(report.rejected[0].reason, REASON_NO_ACCOUNT);
    }

    #[test]
    fn test_flagged_rows_are_kept() {
        let rows = vec![
            row(&["A", "", "", "", "국민 123", ID, "1"]),
            row(&["A", "김철수", "", "", "국민 이영희 123", ID, "1"]),
        ];
        let report = validate_rows(&rows, 2);
        assert_eq!(report.accepted.len(), 2);
        assert_eq!(report.flagged.len(), 2);
        assert_eq!(report.flagged[0].reason, REASON_NO_NAME);
        assert_eq!(report.flagged[1].reason, REASON_NAME_MISMATCH);
        assert_eq!(report.flagged[1].row_number, 3);
    }
}
