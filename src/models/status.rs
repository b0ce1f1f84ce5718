//! 입금 현황판의 상태 값과 시트 행 모델

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// 완료 표시 (시트명/상태에 포함되면 처리 대상에서 제외)
pub const DONE_MARKER: &str = "완료";
/// 상태 열 인덱스 (P열)
pub const STATUS_COLUMN: usize = 15;
/// 이름 열 인덱스 (F열)
pub const NAME_COLUMN: usize = 5;
/// 현황판 읽기 범위
pub const STATUS_SHEET_RANGE: &str = "A1:P1000";

pub const DEPOSIT_REQUESTED: &str = "입금요청";
pub const DEPOSIT_ERROR: &str = "입금오류";
pub const DEPOSIT_COMPLETE_PREFIX: &str = "입금완료_";

/// 현황판 상태 값
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DepositStatus {
    /// 입금요청
    Requested,
    /// 입금오류
    Error,
    /// 그 외 (입금완료_YYMMDD, 빈 칸 등)
    Other(String),
}

impl DepositStatus {
    /// 셀 값 해석 (앞뒤 공백 무시, 대소문자 무시)
    pub fn parse(cell: &str) -> Self {
        let normalized = cell.trim().to_lowercase();
        match normalized.as_str() {
            DEPOSIT_REQUESTED => DepositStatus::Requested,
            DEPOSIT_ERROR => DepositStatus::Error,
            _ => DepositStatus::Other(cell.trim().to_string()),
        }
    }
}

/// 입금완료 상태 문구 (`입금완료_YYMMDD`)
pub fn deposit_complete_text(date: NaiveDate) -> String {
    format!("{}{}", DEPOSIT_COMPLETE_PREFIX, date.format("%y%m%d"))
}

/// 완료 표시가 붙은 시트인지
pub fn is_done_sheet(sheet_name: &str) -> bool {
    sheet_name.contains(DONE_MARKER)
}

/// 스프레드시트 안의 시트 하나
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetInfo {
    pub sheet_id: i64,
    pub title: String,
}

/// 현황판의 한 행
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetStatusRow {
    pub sheet_id: i64,
    pub sheet_name: String,
    /// 시트상의 행 번호 (1부터)
    pub row_number: usize,
    pub cells: Vec<String>,
    pub status: DepositStatus,
}

impl SheetStatusRow {
    /// 상태 열이 있는 행만 생성
    pub fn from_cells(sheet: &SheetInfo, row_number: usize, cells: Vec<String>) -> Option<Self> {
        if cells.len() <= STATUS_COLUMN {
            return None;
        }
        let status = DepositStatus::parse(&cells[STATUS_COLUMN]);
        Some(Self {
            sheet_id: sheet.sheet_id,
            sheet_name: sheet.title.clone(),
            row_number,
            cells,
            status,
        })
    }

    /// F열 이름
    pub fn customer_name(&self) -> &str {
        self.cells.get(NAME_COLUMN).map(|s| s.trim()).unwrap_or("")
    }
}

/// 백업 시트에 추가되는 한 행: [원본 시트명, 시각, ...원본 행]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupRecord {
    pub origin_sheet: String,
    pub timestamp: NaiveDateTime,
    pub cells: Vec<String>,
}

impl BackupRecord {
    pub fn new(origin_sheet: impl Into<String>, timestamp: NaiveDateTime, cells: Vec<String>) -> Self {
        Self {
            origin_sheet: origin_sheet.into(),
            timestamp,
            cells,
        }
    }

    pub fn to_values(&self) -> Vec<String> {
        let mut values = Vec::with_capacity(self.cells.len() + 2);
        values.push(self.origin_sheet.clone());
        values.push(self.timestamp.format("%Y-%m-%d %H:%M:%S").to_string());
        values.extend(self.cells.iter().cloned());
        values
    }
}

/// 셀 배경색 (0.0 ~ 1.0)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Color {
    pub red: f32,
    pub green: f32,
    pub blue: f32,
}

impl Color {
    /// 입금완료 행 (밝은 회색)
    pub const LIGHT_GRAY: Color = Color {
        red: 0.8,
        green: 0.8,
        blue: 0.8,
    };
    /// 입금오류 행 (주황색)
    pub const ORANGE: Color = Color {
        red: 1.0,
        green: 0.6,
        blue: 0.0,
    };
}
