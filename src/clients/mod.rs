//! 외부 API 클라이언트
//!
//! 스프레드시트 접근은 모두 [`SheetsApi`] 를 거친다. 실제 구현은
//! [`SheetsClient`] (Google Sheets v4 REST) 이고, 테스트는 [`MemorySheets`] 를 쓴다.

pub mod auth;
pub mod memory;
pub mod sheets_client;

pub use auth::{default_token_path, Authenticator, StoredToken};
pub use memory::{MemorySheets, RecordedCall};
pub use sheets_client::SheetsClient;

use crate::error::AppResult;
use crate::models::status::SheetInfo;
use serde_json::Value as JsonValue;

/// 값 입력 방식
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueInputOption {
    /// 입력 그대로 저장
    Raw,
    /// 사용자가 입력한 것처럼 해석 (수식, 숫자 변환)
    UserEntered,
}

impl ValueInputOption {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueInputOption::Raw => "RAW",
            ValueInputOption::UserEntered => "USER_ENTERED",
        }
    }
}

/// 스프레드시트 API 능력
#[allow(async_fn_in_trait)]
pub trait SheetsApi {
    /// 스프레드시트의 시트 목록 (표시 순서)
    async fn list_sheets(&self, spreadsheet_id: &str) -> AppResult<Vec<SheetInfo>>;

    /// 범위 값 읽기 (뒤쪽 빈 칸은 잘려서 온다)
    async fn get_values(&self, spreadsheet_id: &str, range: &str) -> AppResult<Vec<Vec<JsonValue>>>;

    /// 범위 값 덮어쓰기
    async fn update_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: Vec<Vec<JsonValue>>,
        input: ValueInputOption,
    ) -> AppResult<()>;

    /// 표 끝에 행 추가
    async fn append_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: Vec<Vec<JsonValue>>,
        input: ValueInputOption,
    ) -> AppResult<()>;

    /// `spreadsheets.batchUpdate` (요청 목록은 한 번에 적용)
    async fn batch_update(&self, spreadsheet_id: &str, requests: Vec<JsonValue>) -> AppResult<JsonValue>;
}

/// 셀 값을 문자열로 (숫자는 그대로 표기, null 은 빈 문자열)
pub fn cell_text(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        JsonValue::Null => String::new(),
        other => other.to_string(),
    }
}

/// 응답 값 전체를 문자열 행으로
pub fn text_rows(values: &[Vec<JsonValue>]) -> Vec<Vec<String>> {
    values
        .iter()
        .map(|row| row.iter().map(cell_text).collect())
        .collect()
}

/// 문자열 행을 요청 값으로
pub fn json_rows(rows: &[Vec<String>]) -> Vec<Vec<JsonValue>> {
    rows.iter()
        .map(|row| row.iter().map(|c| JsonValue::String(c.clone())).collect())
        .collect()
}

/// 시트 이름을 A1 표기에 쓸 수 있게 감싼다 (`'6월 (1)'!A1`)
pub fn quote_sheet_name(name: &str) -> String {
    let plain = name.chars().all(|c| c.is_alphanumeric() || c == '_');
    if plain {
        name.to_string()
    } else {
        format!("'{}'", name.replace('\'', "''"))
    }
}

/// 시트 이름 + 범위
pub fn sheet_range(sheet_name: &str, range: &str) -> String {
    format!("{}!{}", quote_sheet_name(sheet_name), range)
}
