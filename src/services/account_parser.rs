//! 계좌 칸 전처리 - 업무 능력층
//!
//! "은행명 + 계좌번호" 로 적힌 칸을 표준 은행명과 숫자만 남은 계좌번호로 나눈다.
//! 형식이 맞지 않는 입력은 오류 없이 빈 값으로 내려간다.

use crate::models::transfer::ParsedAccount;
use regex::Regex;
use std::sync::LazyLock;

/// 앞쪽 비숫자 구간 + 숫자/공백/하이픈 구간
static ACCOUNT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\D+)\s*([\d\s\-]+)").expect("고정 정규식"));

/// 키워드 → 표준명 규칙
///
/// 앞에서부터 검사하고 처음 걸린 규칙을 쓴다. 순서를 바꾸면 결과가 달라진다
/// (예: "카카오페이증권" 은 17번 규칙에 먼저 걸려 카카오뱅크가 된다).
const BANK_RULES: &[(&[&str], &str)] = &[
    (&["sc제일", "제일"], "SC제일은행"),
    (&["제일은행"], "SC제일은행"),
    (&["하나"], "하나은행"),
    (&["경남"], "경남은행"),
    (&["광주"], "광주은행"),
    (&["국민"], "국민은행"),
    (&["기업"], "기업은행"),
    (&["농협은행", "nh농협", "농협/"], "농협"),
    (&["대구", "im뱅크", "대구은행"], "iM뱅크(대구)"),
    (&["부산"], "부산은행"),
    (&["새마을"], "새마을금고"),
    (&["수협"], "수협은행"),
    (&["신한"], "신한은행"),
    (&["우리"], "우리은행"),
    (&["전북"], "전북은행"),
    (&["제주"], "제주은행"),
    (&["카카오", "카뱅"], "카카오뱅크"),
    (&["씨티"], "한국씨티은행"),
    (&["토스"], "토스뱅크"),
    (&["카카오페이증권"], "카카오페이증권"),
    (&["미래에셋대우", "미래에셋"], "미래에셋증권"),
];

/// 은행명 표준화
///
/// 어떤 규칙에도 걸리지 않으면 소문자로 바꾸고 앞뒤 공백을 뺀 입력을 그대로 돌려준다.
pub fn standardize_bank_name(bank_name: &str) -> String {
    let name = bank_name.trim().to_lowercase();
    BANK_RULES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| name.contains(k)))
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or(name)
}

/// 계좌 칸 분리
pub fn parse_account(raw: &str) -> ParsedAccount {
    let Some(caps) = ACCOUNT_PATTERN.captures(raw) else {
        return ParsedAccount::default();
    };

    let bank_name = standardize_bank_name(caps[1].trim());
    let account_number: String = caps[2]
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect();

    ParsedAccount {
        bank_name,
        account_number,
    }
}
