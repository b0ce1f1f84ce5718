//! 입금오류 지정 흐름 - 흐름층
//!
//! 이름 목록을 받아 모든 시트에서 `입금요청` 상태인 행을 찾고,
//! 확인을 거쳐 백업한 뒤 주황색과 `입금오류` 문구로 바꾼다.

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::clients::{sheet_range, text_rows, SheetsApi};
use crate::config::Config;
use crate::infrastructure::Prompt;
use crate::models::status::{
    is_done_sheet, DepositStatus, SheetInfo, SheetStatusRow, STATUS_SHEET_RANGE,
};
use crate::services::status_batch::status_rows;
use crate::services::{BackupWriter, StatusBatch};

/// 쉼표로 구분된 이름 입력 분리 (빈 항목 제외)
pub fn split_names(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// 여러 시트에서 발견된 이름에 대한 선택
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetChoice {
    /// 모두 처리 (`y`)
    All,
    /// 건너뛰기 (`n`)
    Skip,
    /// 나열한 시트를 빼고 처리
    Exclude(Vec<String>),
}

impl SheetChoice {
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        if trimmed.eq_ignore_ascii_case("y") {
            SheetChoice::All
        } else if trimmed.eq_ignore_ascii_case("n") {
            SheetChoice::Skip
        } else {
            SheetChoice::Exclude(split_names(trimmed))
        }
    }

    /// 선택을 적용한 처리 대상
    pub fn apply(&self, locations: Vec<SheetStatusRow>) -> Vec<SheetStatusRow> {
        match self {
            SheetChoice::All => locations,
            SheetChoice::Skip => Vec::new(),
            SheetChoice::Exclude(sheets) => locations
                .into_iter()
                .filter(|row| !sheets.contains(&row.sheet_name))
                .collect(),
        }
    }
}

/// 이름별 처리 결과
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorMarkingSummary {
    pub marked_rows: usize,
    pub skipped_names: Vec<String>,
    pub not_found: Vec<String>,
}

/// 입금오류 지정 흐름
pub struct ErrorMarkingFlow {
    spreadsheet_id: String,
    backup_writer: BackupWriter,
}

impl ErrorMarkingFlow {
    pub fn new(config: &Config) -> Self {
        Self {
            spreadsheet_id: config.spreadsheet_id.clone(),
            backup_writer: BackupWriter::new(config),
        }
    }

    pub fn with_parts(spreadsheet_id: impl Into<String>, backup_writer: BackupWriter) -> Self {
        Self {
            spreadsheet_id: spreadsheet_id.into(),
            backup_writer,
        }
    }

    /// 이름마다 입금요청 행 위치 찾기 (시트 순서, 행 순서)
    pub async fn find_locations<S: SheetsApi>(
        &self,
        api: &S,
        names: &[String],
    ) -> Result<BTreeMap<String, Vec<SheetStatusRow>>> {
        let mut locations: BTreeMap<String, Vec<SheetStatusRow>> =
            names.iter().map(|n| (n.clone(), Vec::new())).collect();

        let sheets = api
            .list_sheets(&self.spreadsheet_id)
            .await
            .context("현황판 시트 목록을 가져오지 못했습니다")?;

        for sheet in sheets {
            if is_done_sheet(&sheet.title) {
                info!("'{}' 시트는 '완료'가 포함되어 제외됩니다.", sheet.title);
                continue;
            }
            info!("🔍 시트 '{}' 검사 중...", sheet.title);
            let values = api
                .get_values(&self.spreadsheet_id, &sheet_range(&sheet.title, STATUS_SHEET_RANGE))
                .await
                .with_context(|| format!("'{}' 시트를 읽지 못했습니다", sheet.title))?;

            for row in status_rows(&sheet, &text_rows(&values)) {
                if row.status != DepositStatus::Requested {
                    continue;
                }
                if let Some(found) = locations.get_mut(row.customer_name()) {
                    found.push(row);
                }
            }
        }

        Ok(locations)
    }

    /// 이름 목록 처리
    pub async fn run<S: SheetsApi, P: Prompt + ?Sized>(
        &self,
        api: &S,
        prompt: &P,
        names: &[String],
        now: NaiveDateTime,
    ) -> Result<ErrorMarkingSummary> {
        info!("처리할 인원: {}", names.join(", "));
        let mut locations = self.find_locations(api, names).await?;
        let mut summary = ErrorMarkingSummary::default();

        for name in names {
            let found = locations.remove(name).unwrap_or_default();
            if found.is_empty() {
                info!("'{}'님은 '입금요청' 상태로 어떤 시트에서도 발견되지 않았습니다.", name);
                summary.not_found.push(name.clone());
                continue;
            }

            info!("'{}'님은 다음 시트에서 발견되었습니다:", name);
            for (i, row) in found.iter().enumerate() {
                info!("  {}. {} (행: {})", i + 1, row.sheet_name, row.row_number);
            }

            let targets = if found.len() > 1 {
                let answer = prompt.ask(&format!(
                    "'{}'님 처리에서 제외할 시트 이름을 쉼표(,)로 구분하여 입력하세요 (모두 처리: y, 모두 건너뛰기: n): ",
                    name
                ))?;
                SheetChoice::parse(&answer).apply(found)
            } else {
                found
            };

            if targets.is_empty() {
                info!("'{}'님 처리를 건너뛰었습니다.", name);
                summary.skipped_names.push(name.clone());
                continue;
            }

            summary.marked_rows += self.mark(api, name, &targets, now).await?;
        }

        Ok(summary)
    }

    /// 백업 후 입금오류 표시
    async fn mark<S: SheetsApi>(
        &self,
        api: &S,
        name: &str,
        rows: &[SheetStatusRow],
        now: NaiveDateTime,
    ) -> Result<usize> {
        // 원본 시트별로 백업 묶음을 나눈다
        let mut per_sheet: Vec<StatusBatch> = Vec::new();
        for row in rows {
            let index = match per_sheet.iter().position(|b| b.sheet.sheet_id == row.sheet_id) {
                Some(i) => i,
                None => {
                    per_sheet.push(StatusBatch::new(SheetInfo {
                        sheet_id: row.sheet_id,
                        title: row.sheet_name.clone(),
                    }));
                    per_sheet.len() - 1
                }
            };
            per_sheet[index].mark_deposit_error(row);
            info!("시트 '{}', Row {}: {}님 입금오류 처리", row.sheet_name, row.row_number, name);
        }

        for batch in &per_sheet {
            if let Err(e) = self
                .backup_writer
                .append(api, &batch.sheet.title, &batch.backup_rows, now)
                .await
            {
                warn!("⚠️ 백업 중 오류 발생: {}", e);
                warn!("백업에 실패했지만, 원본 시트 업데이트는 계속 진행합니다.");
            }
        }

        let requests: Vec<_> = per_sheet.iter().flat_map(|b| b.requests.clone()).collect();
        api.batch_update(&self.spreadsheet_id, requests)
            .await
            .with_context(|| format!("{}님 입금오류 업데이트 실패", name))?;

        info!("✓ {}님 업데이트 완료 ({} 행 처리됨)", name, rows.len());
        Ok(rows.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::MemorySheets;
    use crate::infrastructure::ScriptedPrompt;
    use chrono::NaiveDate;
    use serde_json::json;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 2)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    fn row(name: &str, status: &str) -> Vec<serde_json::Value> {
        let mut cells = vec![json!(""); 16];
        cells[5] = json!(name);
        cells[15] = json!(status);
        cells
    }

    fn setup() -> (MemorySheets, ErrorMarkingFlow) {
        let api = MemorySheets::new();
        api.add_sheet("T", 1, "6월", vec![row("홍길동", "입금요청"), row("김철수", "입금요청")]);
        api.add_sheet("T", 2, "7월", vec![row("홍길동", "입금요청"), row("이영희", "입금완료_240401")]);
        api.add_sheet("B", 0, "BackupData", vec![]);
        let flow = ErrorMarkingFlow::with_parts("T", BackupWriter::with_target("B", "BackupData"));
        (api, flow)
    }

    #[test]
    fn test_split_and_choice() {
        assert_eq!(split_names(" 홍길동, 김철수 ,,"), vec!["홍길동", "김철수"]);
        assert_eq!(SheetChoice::parse("Y"), SheetChoice::All);
        assert_eq!(SheetChoice::parse("n"), SheetChoice::Skip);
        assert_eq!(
            SheetChoice::parse("6월, 7월"),
            SheetChoice::Exclude(vec!["6월".to_string(), "7월".to_string()])
        );
    }

    #[tokio::test]
    async fn test_single_location_is_marked_without_prompt() {
        let (api, flow) = setup();
        let prompt = ScriptedPrompt::new(Vec::<String>::new());
        let summary = flow
            .run(&api, &prompt, &["김철수".to_string()], now())
            .await
            .unwrap();

        assert_eq!(summary.marked_rows, 1);
        assert!(prompt.asked().is_empty());
        assert_eq!(api.text_values("T", "6월")[1][15], "입금오류");
        assert_eq!(api.text_values("B", "BackupData")[0][0], "6월");
    }

    #[tokio::test]
    async fn test_multiple_locations_with_exclusion() {
        let (api, flow) = setup();
        let prompt = ScriptedPrompt::new(["6월"]);
        let summary = flow
            .run(&api, &prompt, &["홍길동".to_string(), "없는사람".to_string()], now())
            .await
            .unwrap();

        assert_eq!(summary.marked_rows, 1);
        assert_eq!(summary.not_found, vec!["없는사람"]);
        assert_eq!(api.text_values("T", "6월")[0][15], "입금요청");
        assert_eq!(api.text_values("T", "7월")[0][15], "입금오류");
        // 백업에는 실제 원본 시트명이 남는다
        assert_eq!(api.text_values("B", "BackupData")[0][0], "7월");
    }

    #[tokio::test]
    async fn test_done_sheets_are_not_touched() {
        let api = MemorySheets::new();
        api.add_sheet("T", 1, "완료_5월", vec![row("홍길동", "입금요청")]);
        api.add_sheet("B", 0, "BackupData", vec![]);
        let flow = ErrorMarkingFlow::with_parts("T", BackupWriter::with_target("B", "BackupData"));
        let prompt = ScriptedPrompt::new(Vec::<String>::new());

        let summary = flow
            .run(&api, &prompt, &["홍길동".to_string()], now())
            .await
            .unwrap();

        assert_eq!(summary.marked_rows, 0);
        assert_eq!(summary.not_found, vec!["홍길동"]);
        assert_eq!(api.text_values("T", "완료_5월")[0][15], "입금요청");
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_skip_answer() {
        let (api, flow) = setup();
        let prompt = ScriptedPrompt::new(["n"]);
        let summary = flow
            .run(&api, &prompt, &["홍길동".to_string()], now())
            .await
            .unwrap();
        assert_eq!(summary.skipped_names, vec!["홍길동"]);
        assert_eq!(summary.marked_rows, 0);
        assert!(api.calls().is_empty());
    }
}
