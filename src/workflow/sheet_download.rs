//! 이체 시트 다운로드 - 흐름층
//!
//! 입금요청 내역 시트의 10행 묶음 10개(`E2:K11` … `E92:K101`)를 읽어
//! 검증한 뒤 로컬 엑셀 `Sheet1` … `Sheet10` 의 `D2:J11` 에 채운다.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};

use crate::clients::{sheet_range, text_rows, SheetsApi};
use crate::config::Config;
use crate::infrastructure::{CellRange, ExcelStore};
use crate::services::{validate_rows, RowIssue};

/// 묶음 수 (엑셀 시트 수)
pub const BLOCK_COUNT: usize = 10;
/// 묶음당 행 수
pub const BLOCK_ROWS: usize = 10;
/// 첫 묶음의 시작 행
const FIRST_SOURCE_ROW: usize = 2;
/// 엑셀 쪽 대상 범위
pub const TARGET_RANGE: &str = "D2:J11";

/// 원본 범위 하나와 대상 시트
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadBlock {
    pub source_range: String,
    pub first_row: usize,
    pub target_sheet: String,
}

/// `E2:K11 → Sheet1` … `E92:K101 → Sheet10`
pub fn download_blocks() -> Vec<DownloadBlock> {
    (0..BLOCK_COUNT)
        .map(|i| {
            let first_row = FIRST_SOURCE_ROW + i * BLOCK_ROWS;
            DownloadBlock {
                source_range: format!("E{}:K{}", first_row, first_row + BLOCK_ROWS - 1),
                first_row,
                target_sheet: format!("Sheet{}", i + 1),
            }
        })
        .collect()
}

/// 천 단위 구분 쉼표 제거
fn strip_commas(rows: Vec<Vec<String>>) -> Vec<Vec<String>> {
    rows.into_iter()
        .map(|row| row.into_iter().map(|cell| cell.replace(',', "")).collect())
        .collect()
}

/// 시트별로 묶인 문제 행
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SheetIssue {
    pub target_sheet: String,
    pub issue: RowIssue,
}

/// 다운로드 결과
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DownloadReport {
    /// (대상 시트, 기록한 행 수)
    pub sheets: Vec<(String, usize)>,
    pub rejected: Vec<SheetIssue>,
    pub flagged: Vec<SheetIssue>,
}

impl DownloadReport {
    pub fn total_rows(&self) -> usize {
        self.sheets.iter().map(|(_, n)| n).sum()
    }

    /// 결과 요약 출력
    pub fn log_summary(&self) {
        info!("{}", "=".repeat(60));
        info!("📊 총 {}개 행이 처리되었습니다.", self.total_rows());
        for (sheet, rows) in &self.sheets {
            info!("  {}: {}개 행", sheet, rows);
        }

        if self.rejected.is_empty() {
            info!("제외된 행이 없습니다.");
        } else {
            warn!("⚠️ 제외된 행: {}개", self.rejected.len());
            for item in &self.rejected {
                warn!(
                    "  [{}] 원본행 {} 사유: {} -> {}",
                    item.target_sheet,
                    item.issue.row_number,
                    item.issue.reason,
                    item.issue.cells.join(" | ")
                );
            }
        }

        if !self.flagged.is_empty() {
            warn!("⚠️ 이름/계좌 확인 필요: {}개", self.flagged.len());
            for item in &self.flagged {
                warn!(
                    "  [{}] 원본행 {} 사유: {} -> {}",
                    item.target_sheet,
                    item.issue.row_number,
                    item.issue.reason,
                    item.issue.cells.join(" | ")
                );
            }
        }
        info!("{}", "=".repeat(60));
    }
}

/// 시트 다운로드 흐름
pub struct SheetDownloadFlow {
    spreadsheet_id: String,
    sheet_name: String,
}

impl SheetDownloadFlow {
    pub fn new(config: &Config) -> Self {
        Self::with_source(&config.request_spreadsheet_id, &config.request_sheet_name)
    }

    pub fn with_source(spreadsheet_id: impl Into<String>, sheet_name: impl Into<String>) -> Self {
        Self {
            spreadsheet_id: spreadsheet_id.into(),
            sheet_name: sheet_name.into(),
        }
    }

    /// 읽고 검증해서 통합 문서에 채우기 (저장은 하지 않음)
    pub async fn fill<S: SheetsApi>(&self, api: &S, store: &mut ExcelStore) -> Result<DownloadReport> {
        let target = CellRange::parse(TARGET_RANGE)?;
        let mut report = DownloadReport::default();

        for block in download_blocks() {
            info!("📄 {} 처리 중... ({})", block.target_sheet, block.source_range);
            let values = api
                .get_values(&self.spreadsheet_id, &sheet_range(&self.sheet_name, &block.source_range))
                .await
                .with_context(|| format!("{} 범위를 가져오지 못했습니다", block.source_range))?;
            let rows = strip_commas(text_rows(&values));
            let checked = validate_rows(&rows, block.first_row);

            let sheet = store.sheet_mut_or_create(&block.target_sheet);
            sheet.clear_range(&target);
            sheet.write_rows(target.start, &checked.accepted);

            report
                .sheets
                .push((block.target_sheet.clone(), checked.accepted.len()));
            let tag = |issue: RowIssue| SheetIssue {
                target_sheet: block.target_sheet.clone(),
                issue,
            };
            report.rejected.extend(checked.rejected.into_iter().map(tag));
            report.flagged.extend(checked.flagged.into_iter().map(tag));
        }

        Ok(report)
    }

    /// 채운 뒤 저장
    pub async fn run<S: SheetsApi>(&self, api: &S, store: &mut ExcelStore) -> Result<DownloadReport> {
        let report = self.fill(api, store).await?;
        store
            .save()
            .await
            .with_context(|| format!("{} 저장 실패", store.path().display()))?;
        info!("💾 엑셀 파일 업데이트 완료: {}", store.path().display());
        report.log_summary();
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::MemorySheets;
    use crate::infrastructure::CellRef;
    use serde_json::json;
    use crate::services::row_validator::{REASON_ID_DIGITS, REASON_NAME_MISMATCH};

    fn source_row(name: &str, account: &str, id: &str, amount: &str) -> Vec<serde_json::Value> {
        // A..K (E 부터 7칸이 대상)
        ["", "", "", "", "상품", name, "", "", account, id, amount]
            .iter()
            .map(|c| json!(c))
            .collect()
    }

    #[test]
    fn test_blocks_cover_hundred_rows() {
        let blocks = download_blocks();
        assert_eq!(blocks.len(), 10);
        assert_eq!(blocks[0].source_range, "E2:K11");
        assert_eq!(blocks[0].target_sheet, "Sheet1");
        assert_eq!(blocks[9].source_range, "E92:K101");
        assert_eq!(blocks[9].first_row, 92);
        assert_eq!(blocks[9].target_sheet, "Sheet10");
    }

    #[tokio::test]
    async fn test_fill_validates_and_writes() {
        let api = MemorySheets::new();
        let mut rows = vec![vec![json!("헤더")]];
        rows.push(source_row("홍길동", "신한(홍길동) 110-123", "900101-1234567", "1,500,000"));
        rows.push(source_row("김철수", "국민 123", "9001", "1000"));
        rows.push(source_row("이영희", "우리 1002", "9001011234567", "2000"));
        for _ in 0..7 {
            rows.push(vec![]);
        }
        rows.push(source_row("박민수", "농협 박민수 302", "9001011234567", "3000"));
        api.add_sheet("R", 0, "시트1", rows);

        let mut store = ExcelStore::empty("이체정보.xlsx");
        store
            .sheet_mut_or_create("Sheet1")
            .write_rows(CellRef::parse("D5").unwrap(), &[vec!["stale".to_string()]]);

        let flow = SheetDownloadFlow::with_source("R", "시트1");
        let report = flow.fill(&api, &mut store).await.unwrap();

        let sheet1 = store.sheet("Sheet1").unwrap().rows();
        assert_eq!(sheet1[1][3], "상품");
        assert_eq!(sheet1[1][7], "신한홍길동 110-123");
        assert_eq!(sheet1[1][9], "1500000");
        assert_eq!(sheet1[2][4], "이영희");
        assert_eq!(sheet1.len(), 3, "이전 값은 지워져야 함");

        let sheet2 = store.sheet("Sheet2").unwrap().rows();
        assert_eq!(sheet2[1][4], "박민수");

        assert_eq!(report.total_rows(), 3);
        assert_eq!(report.sheets.len(), 10);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].issue.row_number, 3);
        assert_eq!(report.rejected[0].issue.reason, REASON_ID_DIGITS);
        assert_eq!(report.flagged.len(), 1);
        assert_eq!(report.flagged[0].issue.reason, REASON_NAME_MISMATCH);
        assert_eq!(report.flagged[0].target_sheet, "Sheet1");
        assert_eq!(store.sheet_names().len(), 10);
    }

    #[tokio::test]
    async fn test_run_saves_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("이체정보.xlsx");
        let api = MemorySheets::new();
        api.add_sheet(
            "R",
            0,
            "시트1",
            vec![vec![json!("헤더")], source_row("홍길동", "신한 홍길동 110", "9001011234567", "10")],
        );

        let mut store = ExcelStore::open(&path).unwrap();
        let flow = SheetDownloadFlow::with_source("R", "시트1");
        flow.run(&api, &mut store).await.unwrap();

        let reopened = ExcelStore::open(&path).unwrap();
        assert_eq!(reopened.sheet("Sheet1").unwrap().rows()[1][4], "홍길동");
    }
}
