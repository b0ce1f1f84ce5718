use crate::error::RowError;
use crate::models::bank::bank_code;
use serde::Serialize;
use std::fmt;

/// 다계좌이체 화면 한 번에 입력 가능한 최대 건수
pub const MAX_BATCH_ENTRIES: usize = 10;

/// 이체 요청 한 줄 (시트/엑셀의 한 행)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRow {
    /// 원본 행 번호 (1부터, 헤더 포함)
    pub row_number: usize,
    pub product_name: String,
    pub customer_name: String,
    /// "<은행명><구분자><숫자>" 형식의 원본 계좌 칸
    pub raw_account: String,
    pub amount: u64,
}

/// 계좌 칸을 분리한 결과
///
/// 형식이 맞지 않으면 두 필드 모두 빈 문자열이다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedAccount {
    pub bank_name: String,
    pub account_number: String,
}

impl ParsedAccount {
    pub fn is_empty(&self) -> bool {
        self.bank_name.is_empty() && self.account_number.is_empty()
    }

    /// 이체 화면 은행 코드
    pub fn bank_code(&self) -> Option<&'static str> {
        bank_code(&self.bank_name)
    }
}

/// 이체 화면에 입력할 한 건
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferEntry {
    pub row_number: usize,
    pub bank_name: String,
    pub bank_code: Option<&'static str>,
    pub account_number: String,
    /// 출금통장 표시 내용 (이름 + 제품명)
    pub name_product: String,
    /// 입금통장 표시 내용 (제품명)
    pub product_name: String,
    pub amount: u64,
}

impl TransferEntry {
    pub fn new(row: &TransferRow, account: ParsedAccount) -> Self {
        let bank_code = account.bank_code();
        Self {
            row_number: row.row_number,
            bank_name: account.bank_name,
            bank_code,
            account_number: account.account_number,
            name_product: format!("{}{}", row.customer_name, row.product_name),
            product_name: row.product_name.clone(),
            amount: row.amount,
        }
    }
}

impl fmt::Display for TransferEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "은행: {} ({}), 계좌번호: {}, 이름.제품명: {}, 제품명: {}, 금액: {}",
            self.bank_name,
            self.bank_code.unwrap_or("코드 없음"),
            self.account_number,
            self.name_product,
            self.product_name,
            self.amount
        )
    }
}

/// 한 번에 제출할 이체 묶음 (최대 10건)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TransferBatch {
    /// 데이터 출처 설명 (엑셀 시트명 등)
    pub source: String,
    pub entries: Vec<TransferEntry>,
}

impl TransferBatch {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            entries: Vec::new(),
        }
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= MAX_BATCH_ENTRIES
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn total_amount(&self) -> u64 {
        self.entries.iter().map(|e| e.amount).sum()
    }

    /// 은행 코드를 찾지 못한 건 (화면에서 은행이 비게 됨)
    pub fn unresolved_banks(&self) -> impl Iterator<Item = &TransferEntry> {
        self.entries.iter().filter(|e| e.bank_code.is_none())
    }
}

/// 셀 문자열을 금액으로 변환
///
/// 쉼표, 공백, 끝의 '원' 을 제거하고 소수부가 0인 실수(엑셀 숫자)도 허용한다.
pub fn parse_amount(value: &str, row: usize) -> Result<u64, RowError> {
    let invalid = || RowError::InvalidAmount {
        value: value.to_string(),
        row,
    };

    let cleaned: String = value
        .trim()
        .trim_end_matches('원')
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();

    if cleaned.is_empty() {
        return Err(invalid());
    }

    if let Ok(n) = cleaned.parse::<u64>() {
        return Ok(n);
    }

    match cleaned.parse::<f64>() {
        Ok(f) if f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 => Ok(f as u64),
        _ => Err(invalid()),
    }
}
