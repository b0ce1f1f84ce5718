//! 입금요청 모아보기 수식 설치 - 흐름층

use anyhow::{bail, Context, Result};
use serde_json::json;
use tracing::info;

use crate::clients::{sheet_range, SheetsApi, ValueInputOption};
use crate::config::Config;
use crate::services::query_formula::active_sheet_names;
use crate::services::build_query_formula;

/// 수식을 쓰는 셀
const FORMULA_CELL: &str = "A2";

/// 현황판 시트 목록으로 QUERY 수식을 만들어 입금요청 내역 시트에 쓴다
pub struct FormulaSetupFlow {
    source_spreadsheet_id: String,
    target_spreadsheet_id: String,
    target_sheet_name: String,
}

impl FormulaSetupFlow {
    pub fn new(config: &Config) -> Self {
        Self {
            source_spreadsheet_id: config.spreadsheet_id.clone(),
            target_spreadsheet_id: config.request_spreadsheet_id.clone(),
            target_sheet_name: config.request_sheet_name.clone(),
        }
    }

    /// 수식 생성 후 기록 (기록한 수식 반환)
    pub async fn run<S: SheetsApi>(&self, api: &S) -> Result<String> {
        let sheets = api
            .list_sheets(&self.source_spreadsheet_id)
            .await
            .context("현황판 시트 목록을 가져오지 못했습니다")?;
        let names = active_sheet_names(sheets.iter().map(|s| s.title.as_str()));
        info!("시트명 가져오기 성공: {} 시트", names.len());
        if names.is_empty() {
            bail!("진행 중인 시트가 없어 수식을 만들 수 없습니다.");
        }

        let formula = build_query_formula(&self.source_spreadsheet_id, &names);
        api.update_values(
            &self.target_spreadsheet_id,
            &sheet_range(&self.target_sheet_name, FORMULA_CELL),
            vec![vec![json!(formula)]],
            ValueInputOption::UserEntered,
        )
        .await
        .context("수식 입력 실패")?;

        info!("✅ {}!{} 에 수식 입력 완료", self.target_sheet_name, FORMULA_CELL);
        Ok(formula)
    }
}
