//! 메모리 스프레드시트
//!
//! [`SheetsApi`] 를 프로세스 안에서 흉내 낸다. 워크플로 테스트에 쓴다.
//! A1 범위 읽기/쓰기, 행 추가, `addSheet` 와 `updateCells` 요청을 반영한다.

use crate::clients::{cell_text, SheetsApi, ValueInputOption};
use crate::error::{ApiError, AppResult};
use crate::infrastructure::excel_store::{CellRange, CellRef};
use crate::models::status::SheetInfo;
use serde_json::{json, Value as JsonValue};
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

#[derive(Debug, Clone, Default)]
struct MemorySheet {
    info: SheetInfo,
    values: Vec<Vec<JsonValue>>,
    /// (행, 열) → 배경색
    backgrounds: BTreeMap<(usize, usize), JsonValue>,
}

impl MemorySheet {
    fn set(&mut self, row: usize, col: usize, value: JsonValue) {
        if self.values.len() <= row {
            self.values.resize(row + 1, Vec::new());
        }
        let cells = &mut self.values[row];
        if cells.len() <= col {
            cells.resize(col + 1, JsonValue::String(String::new()));
        }
        cells[col] = value;
    }

    fn last_filled_row(&self) -> usize {
        self.values
            .iter()
            .rposition(|row| row.iter().any(|c| !cell_text(c).trim().is_empty()))
            .map(|i| i + 1)
            .unwrap_or(0)
    }
}

/// 기록된 호출
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    Update { spreadsheet_id: String, range: String, values: Vec<Vec<JsonValue>>, input: ValueInputOption },
    Append { spreadsheet_id: String, range: String, values: Vec<Vec<JsonValue>>, input: ValueInputOption },
    BatchUpdate { spreadsheet_id: String, requests: Vec<JsonValue> },
}

/// 메모리 스프레드시트 모음
#[derive(Debug, Default)]
pub struct MemorySheets {
    books: Mutex<HashMap<String, Vec<MemorySheet>>>,
    calls: Mutex<Vec<RecordedCall>>,
    /// 다음 호출들이 돌려줄 오류 상태 코드
    failures: Mutex<Vec<(String, u16)>>,
}

impl MemorySheets {
    pub fn new() -> Self {
        Self::default()
    }

    /// 시트 추가 (값은 1행부터)
    pub fn add_sheet(&self, spreadsheet_id: &str, sheet_id: i64, title: &str, rows: Vec<Vec<JsonValue>>) {
        if let Ok(mut books) = self.books.lock() {
            books.entry(spreadsheet_id.to_string()).or_default().push(MemorySheet {
                info: SheetInfo {
                    sheet_id,
                    title: title.to_string(),
                },
                values: rows,
                backgrounds: BTreeMap::new(),
            });
        }
    }

    /// 문자열 행으로 시트 추가
    pub fn add_text_sheet(&self, spreadsheet_id: &str, sheet_id: i64, title: &str, rows: &[Vec<&str>]) {
        let rows = rows
            .iter()
            .map(|r| r.iter().map(|c| json!(c)).collect())
            .collect();
        self.add_sheet(spreadsheet_id, sheet_id, title, rows);
    }

    /// `endpoint` 호출이 다음 한 번 `status` 로 실패하게 한다
    pub fn fail_next(&self, endpoint: &str, status: u16) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.push((endpoint.to_string(), status));
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// 시트 전체 값 (문자열)
    pub fn text_values(&self, spreadsheet_id: &str, title: &str) -> Vec<Vec<String>> {
        self.with_sheet(spreadsheet_id, title, |sheet| {
            sheet
                .values
                .iter()
                .map(|row| row.iter().map(cell_text).collect())
                .collect()
        })
        .unwrap_or_default()
    }

    /// 행 배경색 (B열 기준)
    pub fn background(&self, spreadsheet_id: &str, title: &str, row_number: usize) -> Option<JsonValue> {
        self.with_sheet(spreadsheet_id, title, |sheet| {
            sheet.backgrounds.get(&(row_number - 1, 1)).cloned()
        })
        .flatten()
    }

    pub fn sheet_titles(&self, spreadsheet_id: &str) -> Vec<String> {
        self.books
            .lock()
            .ok()
            .and_then(|books| {
                books
                    .get(spreadsheet_id)
                    .map(|sheets| sheets.iter().map(|s| s.info.title.clone()).collect())
            })
            .unwrap_or_default()
    }

    fn with_sheet<T>(&self, spreadsheet_id: &str, title: &str, f: impl FnOnce(&MemorySheet) -> T) -> Option<T> {
        let books = self.books.lock().ok()?;
        let sheet = books.get(spreadsheet_id)?.iter().find(|s| s.info.title == title)?;
        Some(f(sheet))
    }

    fn take_failure(&self, endpoint: &str) -> AppResult<()> {
        let Ok(mut failures) = self.failures.lock() else {
            return Ok(());
        };
        if let Some(i) = failures.iter().position(|(e, _)| e == endpoint) {
            let (_, status) = failures.remove(i);
            return Err(ApiError::BadStatus {
                endpoint: endpoint.to_string(),
                status,
                message: "injected".to_string(),
            }
            .into());
        }
        Ok(())
    }

    fn record(&self, call: RecordedCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }

    /// 범위 문자열 → (시트 위치, 시작 셀, 끝 셀)
    ///
    /// 시트 이름만 있으면 끝 셀이 없다 (시트 전체).
    fn locate(sheets: &[MemorySheet], range: &str) -> AppResult<(usize, CellRef, Option<CellRef>)> {
        let (sheet_part, cells_part) = match range.rsplit_once('!') {
            Some((sheet, cells)) => (Some(sheet), Some(cells)),
            None if CellRef::parse(range.split(':').next().unwrap_or("")).is_ok() => (None, Some(range)),
            None => (Some(range), None),
        };

        let index = match sheet_part {
            Some(name) => {
                let name = name.trim_matches('\'').replace("''", "'");
                sheets
                    .iter()
                    .position(|s| s.info.title == name)
                    .ok_or(ApiError::SheetNotFound(name))?
            }
            None if !sheets.is_empty() => 0,
            None => return Err(ApiError::SheetNotFound(range.to_string()).into()),
        };

        match cells_part {
            Some(cells) if cells.contains(':') => {
                let parsed = CellRange::parse(cells)?;
                Ok((index, parsed.start, Some(parsed.end)))
            }
            Some(cells) => {
                let cell = CellRef::parse(cells)?;
                Ok((index, cell, Some(cell)))
            }
            None => Ok((index, CellRef { row: 0, col: 0 }, None)),
        }
    }

    fn apply_request(sheets: &mut Vec<MemorySheet>, request: &JsonValue) {
        if let Some(title) = request["addSheet"]["properties"]["title"].as_str() {
            let next_id = sheets.iter().map(|s| s.info.sheet_id).max().unwrap_or(0) + 1;
            sheets.push(MemorySheet {
                info: SheetInfo {
                    sheet_id: next_id,
                    title: title.to_string(),
                },
                ..MemorySheet::default()
            });
            return;
        }

        let update = &request["updateCells"];
        let Some(sheet_id) = update["range"]["sheetId"].as_i64() else {
            return;
        };
        let Some(sheet) = sheets.iter_mut().find(|s| s.info.sheet_id == sheet_id) else {
            return;
        };
        let row = update["range"]["startRowIndex"].as_u64().unwrap_or(0) as usize;
        let start_col = update["range"]["startColumnIndex"].as_u64().unwrap_or(0) as usize;
        let Some(values) = update["rows"][0]["values"].as_array() else {
            return;
        };

        for (offset, cell) in values.iter().enumerate() {
            let col = start_col + offset;
            if let Some(text) = cell["userEnteredValue"]["stringValue"].as_str() {
                sheet.set(row, col, json!(text));
            }
            let background = &cell["userEnteredFormat"]["backgroundColor"];
            if !background.is_null() {
                sheet.backgrounds.insert((row, col), background.clone());
            }
        }
    }
}

impl SheetsApi for MemorySheets {
    async fn list_sheets(&self, spreadsheet_id: &str) -> AppResult<Vec<SheetInfo>> {
        self.take_failure("spreadsheets.get")?;
        let books = self.books.lock().map_err(|_| ApiError::SheetNotFound(spreadsheet_id.to_string()))?;
        Ok(books
            .get(spreadsheet_id)
            .map(|sheets| sheets.iter().map(|s| s.info.clone()).collect())
            .unwrap_or_default())
    }

    async fn get_values(&self, spreadsheet_id: &str, range: &str) -> AppResult<Vec<Vec<JsonValue>>> {
        self.take_failure("values.get")?;
        let books = self.books.lock().map_err(|_| ApiError::SheetNotFound(spreadsheet_id.to_string()))?;
        let sheets = books
            .get(spreadsheet_id)
            .ok_or_else(|| ApiError::SheetNotFound(spreadsheet_id.to_string()))?;
        let (index, start, end) = Self::locate(sheets, range)?;
        let sheet = &sheets[index];
        let (end_row, end_col) = match end {
            Some(end) => (end.row as usize, end.col as usize),
            None => (usize::MAX, usize::MAX),
        };

        let mut rows: Vec<Vec<JsonValue>> = sheet
            .values
            .iter()
            .enumerate()
            .skip(start.row as usize)
            .take_while(|(r, _)| *r <= end_row)
            .map(|(_, row)| {
                let mut cells: Vec<JsonValue> = row
                    .iter()
                    .enumerate()
                    .skip(start.col as usize)
                    .take_while(|(c, _)| *c <= end_col)
                    .map(|(_, v)| v.clone())
                    .collect();
                while cells.last().is_some_and(|c| cell_text(c).is_empty()) {
                    cells.pop();
                }
                cells
            })
            .collect();
        while rows.last().is_some_and(|r| r.is_empty()) {
            rows.pop();
        }
        Ok(rows)
    }

    async fn update_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: Vec<Vec<JsonValue>>,
        input: ValueInputOption,
    ) -> AppResult<()> {
        self.take_failure("values.update")?;
        {
            let mut books = self.books.lock().map_err(|_| ApiError::SheetNotFound(spreadsheet_id.to_string()))?;
            let sheets = books
                .get_mut(spreadsheet_id)
                .ok_or_else(|| ApiError::SheetNotFound(spreadsheet_id.to_string()))?;
            let (index, start, _) = Self::locate(sheets, range)?;
            for (r, row) in values.iter().enumerate() {
                for (c, value) in row.iter().enumerate() {
                    sheets[index].set(start.row as usize + r, start.col as usize + c, value.clone());
                }
            }
        }
        self.record(RecordedCall::Update {
            spreadsheet_id: spreadsheet_id.to_string(),
            range: range.to_string(),
            values,
            input,
        });
        Ok(())
    }

    async fn append_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: Vec<Vec<JsonValue>>,
        input: ValueInputOption,
    ) -> AppResult<()> {
        self.take_failure("values.append")?;
        {
            let mut books = self.books.lock().map_err(|_| ApiError::SheetNotFound(spreadsheet_id.to_string()))?;
            let sheets = books
                .get_mut(spreadsheet_id)
                .ok_or_else(|| ApiError::SheetNotFound(spreadsheet_id.to_string()))?;
            let (index, _, _) = Self::locate(sheets, range)?;
            let first = sheets[index].last_filled_row();
            for (r, row) in values.iter().enumerate() {
                for (c, value) in row.iter().enumerate() {
                    sheets[index].set(first + r, c, value.clone());
                }
            }
        }
        self.record(RecordedCall::Append {
            spreadsheet_id: spreadsheet_id.to_string(),
            range: range.to_string(),
            values,
            input,
        });
        Ok(())
    }

    async fn batch_update(&self, spreadsheet_id: &str, requests: Vec<JsonValue>) -> AppResult<JsonValue> {
        self.take_failure("batchUpdate")?;
        {
            let mut books = self.books.lock().map_err(|_| ApiError::SheetNotFound(spreadsheet_id.to_string()))?;
            let sheets = books.entry(spreadsheet_id.to_string()).or_default();
            for request in &requests {
                Self::apply_request(sheets, request);
            }
        }
        let replies = requests.len();
        self.record(RecordedCall::BatchUpdate {
            spreadsheet_id: spreadsheet_id.to_string(),
            requests,
        });
        Ok(json!({ "spreadsheetId": spreadsheet_id, "replies": vec![json!({}); replies] }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book() -> MemorySheets {
        let api = MemorySheets::new();
        api.add_text_sheet(
            "S",
            0,
            "시트1",
            &[
                vec!["h1", "h2", "h3"],
                vec!["a", "b", ""],
                vec!["c", "", ""],
            ],
        );
        api.add_text_sheet("S", 7, "6월 입금", &[vec!["x"]]);
        api
    }

    #[tokio::test]
    async fn test_get_values_with_bounds() {
        let api = book();
        let rows = api.get_values("S", "시트1!B2:C3").await.unwrap();
        // 뒤쪽 빈 칸과 빈 행은 잘린다
        assert_eq!(rows, vec![vec![json!("b")]]);

        let all = api.get_values("S", "'6월 입금'!A1:P1000").await.unwrap();
        assert_eq!(all, vec![vec![json!("x")]]);

        let whole = api.get_values("S", "시트1").await.unwrap();
        assert_eq!(whole.len(), 3);
        assert!(api.get_values("S", "없음!A1:B2").await.is_err());
    }

    #[tokio::test]
    async fn test_update_append_and_batch() {
        let api = book();
        api.update_values("S", "시트1!C5:D5", vec![vec![json!("p"), json!("q")]], ValueInputOption::Raw)
            .await
            .unwrap();
        api.append_values("S", "시트1!A1", vec![vec![json!("z")]], ValueInputOption::UserEntered)
            .await
            .unwrap();
        let values = api.text_values("S", "시트1");
        assert_eq!(values[4][2], "p");
        assert_eq!(values[5][0], "z");

        api.batch_update("S", vec![json!({ "addSheet": { "properties": { "title": "BackupData" } } })])
            .await
            .unwrap();
        assert!(api.sheet_titles("S").contains(&"BackupData".to_string()));
        assert_eq!(api.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_injected_failure_once() {
        let api = book();
        api.fail_next("values.get", 502);
        let err = api.get_values("S", "시트1").await.unwrap_err();
        assert!(err.is_bad_gateway());
        assert!(api.get_values("S", "시트1").await.is_ok());
    }
}
