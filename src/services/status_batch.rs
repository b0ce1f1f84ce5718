//! 상태 전환 일괄 요청 생성 - 업무 능력층
//!
//! 현황판 값을 읽어 백업 대상 행과 `batchUpdate` 요청 목록을 만든다.
//! 날짜는 호출자가 넘기므로 이 모듈은 외부 상태에 의존하지 않는다.

use crate::models::status::{
    deposit_complete_text, Color, DepositStatus, SheetInfo, SheetStatusRow,
    DEPOSIT_ERROR, STATUS_COLUMN,
};
use chrono::NaiveDate;
use serde_json::{json, Value as JsonValue};

/// 색칠 시작 열 (B)
const COLOR_START_COLUMN: usize = 1;
/// 색칠 끝 열 (P, 미포함 경계)
const COLOR_END_COLUMN: usize = 16;

/// 행 배경색 변경 요청 (B..P)
pub fn row_color_request(sheet_id: i64, row_number: usize, color: Color) -> JsonValue {
    let cell = json!({ "userEnteredFormat": { "backgroundColor": color } });
    let cells = vec![cell; COLOR_END_COLUMN - COLOR_START_COLUMN];
    json!({
        "updateCells": {
            "range": {
                "sheetId": sheet_id,
                "startRowIndex": row_number - 1,
                "endRowIndex": row_number,
                "startColumnIndex": COLOR_START_COLUMN,
                "endColumnIndex": COLOR_END_COLUMN
            },
            "rows": [{ "values": cells }],
            "fields": "userEnteredFormat.backgroundColor"
        }
    })
}

/// 단일 셀 문자열 변경 요청
pub fn cell_text_request(sheet_id: i64, row_number: usize, column: usize, text: &str) -> JsonValue {
    json!({
        "updateCells": {
            "range": {
                "sheetId": sheet_id,
                "startRowIndex": row_number - 1,
                "endRowIndex": row_number,
                "startColumnIndex": column,
                "endColumnIndex": column + 1
            },
            "rows": [{ "values": [{ "userEnteredValue": { "stringValue": text } }] }],
            "fields": "userEnteredValue.stringValue"
        }
    })
}

/// 시트 하나에 대한 처리 계획
#[derive(Debug, Clone, PartialEq)]
pub struct StatusBatch {
    pub sheet: SheetInfo,
    /// 백업할 원본 행 (변경 전 값)
    pub backup_rows: Vec<Vec<String>>,
    /// 한 번의 batchUpdate 로 보낼 요청
    pub requests: Vec<JsonValue>,
    /// 입금요청 → 입금완료 처리 행 수
    pub completed: usize,
    /// 입금오류 색칠 행 수
    pub errored: usize,
}

impl StatusBatch {
    pub fn new(sheet: SheetInfo) -> Self {
        Self {
            sheet,
            backup_rows: Vec::new(),
            requests: Vec::new(),
            completed: 0,
            errored: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.backup_rows.is_empty() && self.requests.is_empty()
    }

    /// 입금요청 행: 회색 + 입금완료 문구
    fn mark_complete(&mut self, row: &SheetStatusRow, today: NaiveDate) {
        self.requests
            .push(row_color_request(row.sheet_id, row.row_number, Color::LIGHT_GRAY));
        self.requests.push(cell_text_request(
            row.sheet_id,
            row.row_number,
            STATUS_COLUMN,
            &deposit_complete_text(today),
        ));
        self.completed += 1;
    }

    /// 입금오류 행: 주황색만
    fn mark_error_color(&mut self, row: &SheetStatusRow) {
        self.requests
            .push(row_color_request(row.sheet_id, row.row_number, Color::ORANGE));
        self.errored += 1;
    }

    /// 이름 지정 오류 처리: 주황색 + 입금오류 문구
    pub fn mark_deposit_error(&mut self, row: &SheetStatusRow) {
        self.backup_rows.push(row.cells.clone());
        self.mark_error_color(row);
        self.requests.push(cell_text_request(
            row.sheet_id,
            row.row_number,
            STATUS_COLUMN,
            DEPOSIT_ERROR,
        ));
    }
}

/// 시트 값(1행부터)을 상태 행으로 변환 (P열이 없는 행은 제외)
pub fn status_rows(sheet: &SheetInfo, values: &[Vec<String>]) -> Vec<SheetStatusRow> {
    values
        .iter()
        .enumerate()
        .filter_map(|(i, cells)| SheetStatusRow::from_cells(sheet, i + 1, cells.clone()))
        .collect()
}

/// 시트 하나의 상태 전환 계획 생성
pub fn build_status_batch(sheet: &SheetInfo, values: &[Vec<String>], today: NaiveDate) -> StatusBatch {
    let mut batch = StatusBatch::new(sheet.clone());

    for row in status_rows(sheet, values) {
        match row.status {
            DepositStatus::Requested => {
                batch.backup_rows.push(row.cells.clone());
                batch.mark_complete(&row, today);
            }
            DepositStatus::Error => {
                batch.backup_rows.push(row.cells.clone());
                batch.mark_error_color(&row);
            }
            DepositStatus::Other(_) => {}
        }
    }

    batch
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    fn sheet(id: i64, title: &str) -> SheetInfo {
        SheetInfo {
            sheet_id: id,
            title: title.to_string(),
        }
    }

    fn status_row(name: &str, status: &str) -> Vec<String> {
        let mut cells = vec![String::new(); 16];
        cells[5] = name.to_string();
        cells[15] = status.to_string();
        cells
    }

    #[test]
    fn test_color_request_shape() {
        let req = row_color_request(9, 4, Color::LIGHT_GRAY);
        let range = &req["updateCells"]["range"];
        assert_eq!(range["sheetId"], 9);
        assert_eq!(range["startRowIndex"], 3);
        assert_eq!(range["endRowIndex"], 4);
        assert_eq!(range["startColumnIndex"], 1);
        assert_eq!(range["endColumnIndex"], 16);
        let values = req["updateCells"]["rows"][0]["values"].as_array().unwrap();
        assert_eq!(values.len(), 15);
        let bg = &values[0]["userEnteredFormat"]["backgroundColor"];
        assert!((bg["red"].as_f64().unwrap() - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_requested_row_text() {
        let values = vec![status_row("홍길동", " 입금요청 ")];
        let batch = build_status_batch(&sheet(1, "6월"), &values, date());
        assert_eq!(batch.requests.len(), 2);
        assert_eq!(
            batch.requests[1]["updateCells"]["rows"][0]["values"][0]["userEnteredValue"]["stringValue"],
            "입금완료_240501"
        );
        assert_eq!(batch.requests[1]["updateCells"]["range"]["startColumnIndex"], 15);
        assert_eq!(batch.completed, 1);
    }

    #[test]
    fn test_short_rows_are_ignored() {
        let mut short = vec![String::new(); 15];
        short[5] = "x".to_string();
        let batch = build_status_batch(&sheet(1, "6월"), &[short], date());
        assert!(batch.is_empty());
    }

    #[test]
    fn test_request_and_error_rows() {
        let values = vec![
            status_row("이름", "상태"),
            status_row("홍길동", "입금요청"),
            status_row("김철수", "입금완료_240430"),
            status_row("이영희", "입금오류"),
        ];
        let batch = &build_status_batch(&sheet(1, "6월"), &values, date());

        assert_eq!(batch.backup_rows.len(), 2);
        assert_eq!(batch.backup_rows[0][5], "홍길동");
        assert_eq!(batch.backup_rows[1][5], "이영희");

        // 요청 행: 색 + 문구, 오류 행: 색만
        assert_eq!(batch.requests.len(), 3);
        assert_eq!(batch.completed, 1);
        assert_eq!(batch.errored, 1);
        assert_eq!(batch.requests[0]["updateCells"]["range"]["startRowIndex"], 1);
        assert_eq!(batch.requests[1]["updateCells"]["fields"], "userEnteredValue.stringValue");
        assert_eq!(batch.requests[2]["updateCells"]["range"]["startRowIndex"], 3);
        assert_eq!(
            batch.requests[2]["updateCells"]["fields"],
            "userEnteredFormat.backgroundColor"
        );
    }

    #[test]
    fn test_mark_deposit_error() {
        let info = sheet(3, "7월");
        let row = SheetStatusRow::from_cells(&info, 5, status_row("홍길동", "입금요청")).unwrap();
        let mut batch = StatusBatch::new(info);
        batch.mark_deposit_error(&row);
        assert_eq!(batch.backup_rows.len(), 1);
        assert_eq!(batch.requests.len(), 2);
        assert_eq!(
            batch.requests[1]["updateCells"]["rows"][0]["values"][0]["userEnteredValue"]["stringValue"],
            "입금오류"
        );
    }
}
