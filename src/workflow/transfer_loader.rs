//! 이체 대상 로드 - 흐름층
//!
//! 두 출처에서 최대 10건의 [`TransferBatch`] 를 만든다.
//! - 로컬 엑셀: 첫 번째 시트 (D: 제품, E: 이름, H: 계좌, J: 금액)
//! - 입금요청 내역 시트: 상태(Q)가 빈 행만 (E: 제품, F: 이름, I: 계좌, K: 금액)
//!
//! 열 매핑은 헤더 행으로 먼저 검증한다.

use anyhow::{Context, Result};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::clients::{sheet_range, text_rows, SheetsApi, ValueInputOption};
use crate::error::ExcelError;
use crate::infrastructure::ExcelStore;
use crate::models::column_map::is_blank_row;
use crate::models::{ColumnMapping, TransferBatch, TransferEntry};
use crate::services::parse_account;

/// 입금요청 내역 시트 읽기 범위
pub const REQUEST_SHEET_RANGE: &str = "A1:Q1000";
/// 상태 열 (Q)
const REQUEST_STATUS_INDEX: usize = 16;
/// 주민번호 열 (J)
const REQUEST_ID_INDEX: usize = 9;
const ID_DIGITS: usize = 13;
/// 주민번호 형식 오류 표시
pub const ID_ERROR_TEXT: &str = "주민번호 오류";

/// 비어 있거나 하이픈 제외 13자리인 주민번호
pub fn is_valid_id_number(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || value.chars().filter(|c| c.is_ascii_digit()).count() == ID_DIGITS
}

/// 헤더 다음 행부터 최대 10건 변환
///
/// `rows[0]` 은 헤더이고 시트 1행이다.
fn collect_entries<'a>(
    source: &str,
    mapping: ColumnMapping,
    rows: impl IntoIterator<Item = (usize, &'a Vec<String>)>,
) -> Result<TransferBatch> {
    let mut batch = TransferBatch::new(source);

    for (row_number, cells) in rows {
        if batch.is_full() {
            debug!("최대 건수 도달, {}행 이후 무시", row_number);
            break;
        }
        if is_blank_row(cells) {
            continue;
        }

        let row = mapping
            .extract(row_number, cells)
            .with_context(|| format!("{} {}행을 읽지 못했습니다", source, row_number))?;
        let account = parse_account(&row.raw_account);
        if account.account_number.is_empty() {
            warn!("⚠️ {}행 계좌번호를 찾지 못했습니다: '{}'", row_number, row.raw_account);
        }
        batch.entries.push(TransferEntry::new(&row, account));
    }

    Ok(batch)
}

/// 로컬 엑셀 첫 번째 시트에서 로드
pub fn load_from_excel(store: &ExcelStore) -> Result<TransferBatch> {
    let sheet = store
        .first_sheet()
        .ok_or_else(|| ExcelError::SheetNotFound(store.path().display().to_string()))?;
    let rows = sheet.rows();
    let Some(header) = rows.first() else {
        info!("'{}' 시트가 비어 있습니다.", sheet.name);
        return Ok(TransferBatch::new(&sheet.name));
    };

    let mapping = ColumnMapping::EXCEL;
    mapping
        .validate(header)
        .with_context(|| format!("'{}' 시트 헤더가 이체 양식과 맞지 않습니다", sheet.name))?;

    let batch = collect_entries(
        &sheet.name,
        mapping,
        rows.iter().enumerate().skip(1).map(|(i, r)| (i + 1, r)),
    )?;
    info!("📥 '{}' 시트에서 {}건 로드", sheet.name, batch.len());
    Ok(batch)
}

/// 입금요청 내역 시트에서 로드
///
/// 상태가 빈 행 중 주민번호 자리수가 틀린 행은 상태 칸에 `주민번호 오류` 를 쓰고 제외한다.
pub async fn load_from_sheet<S: SheetsApi>(
    api: &S,
    spreadsheet_id: &str,
    sheet_name: &str,
) -> Result<TransferBatch> {
    let values = api
        .get_values(spreadsheet_id, &sheet_range(sheet_name, REQUEST_SHEET_RANGE))
        .await
        .with_context(|| format!("'{}' 시트를 읽지 못했습니다", sheet_name))?;
    let rows = text_rows(&values);
    let Some(header) = rows.first() else {
        info!("'{}' 시트가 비어 있습니다.", sheet_name);
        return Ok(TransferBatch::new(sheet_name));
    };

    let mapping = ColumnMapping::REQUEST_SHEET;
    mapping
        .validate(header)
        .with_context(|| format!("'{}' 시트 헤더가 이체 양식과 맞지 않습니다", sheet_name))?;

    fn cell(cells: &[String], index: usize) -> &str {
        cells.get(index).map(|s| s.trim()).unwrap_or("")
    }
    let mut eligible = Vec::new();

    for (i, cells) in rows.iter().enumerate().skip(1) {
        let row_number = i + 1;
        if is_blank_row(cells) || !cell(cells, REQUEST_STATUS_INDEX).is_empty() {
            continue;
        }

        let id_number = cell(cells, REQUEST_ID_INDEX);
        if !is_valid_id_number(id_number) {
            warn!(
                "행 {}: 주민번호 오류 감지 - \"{}\" (하이픈 제외 {}자리)",
                row_number,
                id_number,
                id_number.chars().filter(|c| c.is_ascii_digit()).count()
            );
            if let Err(e) = api
                .update_values(
                    spreadsheet_id,
                    &sheet_range(sheet_name, &format!("Q{}", row_number)),
                    vec![vec![json!(ID_ERROR_TEXT)]],
                    ValueInputOption::UserEntered,
                )
                .await
            {
                warn!("⚠️ {}행 상태 기록 실패, 계속 진행합니다: {}", row_number, e);
            }
            continue;
        }

        eligible.push((row_number, cells));
    }

    let batch = collect_entries(sheet_name, mapping, eligible)?;
    info!("📥 '{}' 시트에서 {}건 로드", sheet_name, batch.len());
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::{MemorySheets, RecordedCall};
    use crate::error::RowError;
    use crate::infrastructure::CellRef;

    fn text(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn excel_row(product: &str, name: &str, account: &str, amount: &str) -> Vec<String> {
        text(&["", "", "", product, name, "", "", account, "", amount])
    }

    fn store_with(rows: &[Vec<String>]) -> ExcelStore {
        let mut store = ExcelStore::empty("이체정보.xlsx");
        store
            .sheet_mut_or_create("Sheet3")
            .write_rows(CellRef { row: 0, col: 0 }, rows);
        store.sheet_mut_or_create("Sheet1");
        store
    }

    fn header() -> Vec<String> {
        text(&["A", "B", "C", "제품", "이름", "F", "G", "계좌", "I", "금액"])
    }

    #[test]
    fn test_excel_first_sheet_entries() {
        let store = store_with(&[
            header(),
            excel_row("A상품", "홍길동", "신한 110-123-456", "50,000"),
            vec![],
            excel_row("B상품", "김철수", "카뱅 3333-01-2345678", "15000"),
        ]);
        let batch = load_from_excel(&store).unwrap();

        assert_eq!(batch.source, "Sheet3");
        assert_eq!(batch.len(), 2);
        let first = &batch.entries[0];
        assert_eq!(first.row_number, 2);
        assert_eq!(first.bank_name, "신한은행");
        assert_eq!(first.bank_code, Some("088"));
        assert_eq!(first.account_number, "110123456");
        assert_eq!(first.name_product, "홍길동A상품");
        assert_eq!(first.amount, 50000);
        assert_eq!(batch.entries[1].bank_name, "카카오뱅크");
        assert_eq!(batch.entries[1].row_number, 4);
    }

    #[test]
    fn test_excel_stops_at_ten() {
        let mut rows = vec![header()];
        for i in 0..12 {
            rows.push(excel_row("P", &format!("고객{i}"), "국민 123-45", "1000"));
        }
        let batch = load_from_excel(&store_with(&rows)).unwrap();
        assert_eq!(batch.len(), 10);
        assert!(batch.is_full());
        assert_eq!(batch.entries[9].row_number, 11);
    }

    #[test]
    fn test_excel_narrow_header_fails_fast() {
        let store = store_with(&[text(&["A", "B", "C"]), excel_row("P", "N", "국민 1", "1")]);
        let err = load_from_excel(&store).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RowError>(),
            Some(RowError::ColumnOutOfRange { field: "product_name", width: 3, .. })
        ));
    }

    #[test]
    fn test_excel_unparsed_account_is_kept_empty() {
        let store = store_with(&[header(), excel_row("P", "N", "계좌미상", "1000")]);
        let batch = load_from_excel(&store).unwrap();
        assert_eq!(batch.entries[0].bank_name, "");
        assert_eq!(batch.unresolved_banks().count(), 1);
    }

    #[test]
    fn test_excel_without_sheets() {
        let err = load_from_excel(&ExcelStore::empty("x.xlsx")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ExcelError>(),
            Some(ExcelError::SheetNotFound(_))
        ));
    }

    fn request_row(name: &str, id: &str, status: &str) -> Vec<serde_json::Value> {
        let mut cells = vec![json!(""); 17];
        cells[4] = json!("A상품");
        cells[5] = json!(name);
        cells[8] = json!("우리 1002-123-456789");
        cells[9] = json!(id);
        cells[10] = json!("30,000");
        cells[16] = json!(status);
        cells
    }

    #[tokio::test]
    async fn test_sheet_filters_status_and_marks_bad_id() {
        let api = MemorySheets::new();
        let mut head = vec![json!("h"); 17];
        head[16] = json!("상태");
        api.add_sheet(
            "R",
            0,
            "시트1",
            vec![
                head,
                request_row("홍길동", "900101-1234567", ""),
                request_row("김철수", "900101-12345", ""),
                request_row("이영희", "", "완료"),
                request_row("박민수", "", ""),
            ],
        );

        let batch = load_from_sheet(&api, "R", "시트1").await.unwrap();
        let names: Vec<_> = batch.entries.iter().map(|e| e.name_product.as_str()).collect();
        assert_eq!(names, vec!["홍길동A상품", "박민수A상품"]);
        assert_eq!(batch.entries[0].bank_name, "우리은행");
        assert_eq!(batch.entries[1].row_number, 5);

        assert_eq!(api.text_values("R", "시트1")[2][16], ID_ERROR_TEXT);
        let calls = api.calls();
        assert_eq!(calls.len(), 1);
        assert!(matches!(
            &calls[0],
            RecordedCall::Update { range, .. } if range == "시트1!Q3"
        ));
    }

    #[tokio::test]
    async fn test_sheet_status_write_failure_keeps_loading() {
        let api = MemorySheets::new();
        let mut head = vec![json!("h"); 17];
        head[16] = json!("상태");
        api.add_sheet(
            "R",
            0,
            "시트1",
            vec![
                head,
                request_row("김철수", "12345", ""),
                request_row("홍길동", "9001011234567", ""),
            ],
        );
        api.fail_next("values.update", 500);

        let batch = load_from_sheet(&api, "R", "시트1").await.unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.entries[0].name_product, "홍길동A상품");
        assert!(api.calls().is_empty());
        assert_eq!(api.text_values("R", "시트1")[1][16], "");
    }

    #[test]
    fn test_excel_bank_without_account_number() {
        let store = store_with(&[header(), excel_row("P", "N", "계좌 미입력", "1000")]);
        let batch = load_from_excel(&store).unwrap();
        assert_eq!(batch.entries[0].bank_name, "계좌");
        assert_eq!(batch.entries[0].account_number, "");
    }

    #[tokio::test]
    async fn test_sheet_empty() {
        let api = MemorySheets::new();
        api.add_text_sheet("R", 0, "시트1", &[]);
        let batch = load_from_sheet(&api, "R", "시트1").await.unwrap();
        assert!(batch.is_empty());
    }

    #[test]
    fn test_id_number_rule() {
        assert!(is_valid_id_number(""));
        assert!(is_valid_id_number(" 9001011234567 "));
        assert!(is_valid_id_number("900101-1234567"));
        assert!(!is_valid_id_number("900101-123456"));
    }
}
