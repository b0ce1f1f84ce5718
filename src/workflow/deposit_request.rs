//! 입금요청 입력 - 흐름층
//!
//! 이름과 주민번호를 받아 현황판 시트의 다음 빈 행 `C:J` 에 기록한다.
//! 시트 목록은 담당자가 입력하는 동안 백그라운드로 가져온다.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use serde_json::{json, Value as JsonValue};
use std::sync::Arc;
use tracing::info;

use crate::clients::{cell_text, quote_sheet_name, sheet_range, SheetsApi, ValueInputOption};
use crate::config::Config;
use crate::error::AppResult;
use crate::infrastructure::Prompt;
use crate::models::SheetInfo;

/// 입력 대상에서 빠지는 시트 표시
const DONE_SHEET_PREFIX: &str = "완료_";

/// 완료되지 않은 시트 이름 (표시 순서)
pub fn request_sheet_names(sheets: &[SheetInfo]) -> Vec<String> {
    sheets
        .iter()
        .map(|s| s.title.clone())
        .filter(|title| !title.is_empty() && !title.contains(DONE_SHEET_PREFIX))
        .collect()
}

/// 마지막으로 값이 있는 행 다음 행 번호 (1부터)
pub fn next_row_number(values: &[Vec<JsonValue>]) -> usize {
    values
        .iter()
        .rposition(|row| row.iter().any(|c| !cell_text(c).trim().is_empty()))
        .map(|i| i + 2)
        .unwrap_or(1)
}

/// `C:J` 에 쓸 값 (날짜, 이름, 주민번호)
pub fn request_values(date: NaiveDate, name: &str, id_number: &str) -> Vec<JsonValue> {
    vec![
        json!(date.format("%y%m%d").to_string()),
        json!(""),
        json!(""),
        json!(name),
        json!(""),
        json!(""),
        json!(""),
        json!(id_number),
    ]
}

/// 번호(1부터) 또는 시트명으로 선택
pub fn choose_sheet(names: &[String], input: &str) -> Option<String> {
    let input = input.trim();
    if let Ok(n) = input.parse::<usize>() {
        if (1..=names.len()).contains(&n) {
            return Some(names[n - 1].clone());
        }
    }
    names.iter().find(|name| name.as_str() == input).cloned()
}

/// 기록 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositRequestResult {
    pub sheet_name: String,
    pub row_number: usize,
}

/// 입금요청 입력 흐름
pub struct DepositRequestFlow {
    spreadsheet_id: String,
}

impl DepositRequestFlow {
    pub fn new(config: &Config) -> Self {
        Self::with_target(&config.spreadsheet_id)
    }

    pub fn with_target(spreadsheet_id: impl Into<String>) -> Self {
        Self {
            spreadsheet_id: spreadsheet_id.into(),
        }
    }

    /// 선택한 시트의 다음 행에 기록
    pub async fn write<S: SheetsApi>(
        &self,
        api: &S,
        sheet_name: &str,
        name: &str,
        id_number: &str,
        date: NaiveDate,
    ) -> Result<DepositRequestResult> {
        let values = api
            .get_values(&self.spreadsheet_id, &quote_sheet_name(sheet_name))
            .await
            .with_context(|| format!("'{}' 시트를 읽지 못했습니다", sheet_name))?;
        let row_number = next_row_number(&values);

        api.update_values(
            &self.spreadsheet_id,
            &sheet_range(sheet_name, &format!("C{0}:J{0}", row_number)),
            vec![request_values(date, name, id_number)],
            ValueInputOption::Raw,
        )
        .await
        .with_context(|| format!("'{}' 시트 {}행 기록 실패", sheet_name, row_number))?;

        info!("✅ {} 시트 {}행에 입력했습니다.", sheet_name, row_number);
        Ok(DepositRequestResult {
            sheet_name: sheet_name.to_string(),
            row_number,
        })
    }

    /// 입력받기, 시트 선택, 기록
    pub async fn run<S: SheetsApi>(
        &self,
        api: &S,
        prompt: Arc<dyn Prompt>,
        date: NaiveDate,
    ) -> Result<DepositRequestResult> {
        let input_prompt = Arc::clone(&prompt);
        let input = tokio::task::spawn_blocking(move || -> AppResult<(String, String)> {
            let name = input_prompt.ask("이름: ")?;
            let id_number = input_prompt.ask("주민번호: ")?;
            Ok((name, id_number))
        });

        let sheets = api.list_sheets(&self.spreadsheet_id).await;
        let (name, id_number) = input.await.context("입력 작업이 중단되었습니다")??;
        let sheets = sheets.context("시트 목록을 가져오지 못했습니다")?;

        if name.is_empty() || id_number.is_empty() {
            bail!("이름과 주민번호를 모두 입력하세요.");
        }

        let names = request_sheet_names(&sheets);
        if names.is_empty() {
            bail!("입력할 수 있는 시트가 없습니다.");
        }
        for (i, title) in names.iter().enumerate() {
            info!("  {}. {}", i + 1, title);
        }

        let answer = prompt.ask("시트 번호 또는 이름: ")?;
        let Some(sheet_name) = choose_sheet(&names, &answer) else {
            bail!("목록에서 시트를 선택하세요: '{}'", answer);
        };

        self.write(api, &sheet_name, &name, &id_number, date).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::{MemorySheets, RecordedCall};
    use crate::infrastructure::ScriptedPrompt;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    #[test]
    fn test_next_row_number() {
        assert_eq!(next_row_number(&[]), 1);
        let values = vec![
            vec![json!("헤더")],
            vec![json!("a")],
            vec![],
            vec![json!(" ")],
        ];
        assert_eq!(next_row_number(&values), 3);
    }

    #[test]
    fn test_sheet_names_and_choice() {
        let sheets: Vec<SheetInfo> = ["6월", "완료_5월", "7월"]
            .iter()
            .enumerate()
            .map(|(i, t)| SheetInfo {
                sheet_id: i as i64,
                title: t.to_string(),
            })
            .collect();
        let names = request_sheet_names(&sheets);
        assert_eq!(names, vec!["6월", "7월"]);
        assert_eq!(choose_sheet(&names, "2"), Some("7월".to_string()));
        assert_eq!(choose_sheet(&names, "6월"), Some("6월".to_string()));
        assert_eq!(choose_sheet(&names, "3"), None);
        assert_eq!(choose_sheet(&names, "완료_5월"), None);
    }

    #[test]
    fn test_request_values_layout() {
        let values = request_values(date(), "홍길동", "900101-1234567");
        assert_eq!(values.len(), 8);
        assert_eq!(values[0], json!("240501"));
        assert_eq!(values[3], json!("홍길동"));
        assert_eq!(values[7], json!("900101-1234567"));
    }

    #[tokio::test]
    async fn test_run_writes_next_row_raw() {
        let api = MemorySheets::new();
        api.add_text_sheet("T", 1, "완료_5월", &[vec!["x"]]);
        api.add_text_sheet("T", 2, "6월", &[vec!["", "", "날짜"], vec!["", "", "240430"]]);
        let prompt: Arc<dyn Prompt> = Arc::new(ScriptedPrompt::new(["홍길동", "9001011234567", "1"]));

        let flow = DepositRequestFlow::with_target("T");
        let result = flow.run(&api, prompt, date()).await.unwrap();
        assert_eq!(
            result,
            DepositRequestResult {
                sheet_name: "6월".to_string(),
                row_number: 3
            }
        );

        let values = api.text_values("T", "6월");
        assert_eq!(values[2][2], "240501");
        assert_eq!(values[2][5], "홍길동");
        assert_eq!(values[2][9], "9001011234567");
        assert!(matches!(
            &api.calls()[0],
            RecordedCall::Update { range, input: ValueInputOption::Raw, .. } if range == "6월!C3:J3"
        ));
    }

    #[tokio::test]
    async fn test_run_rejects_missing_input() {
        let api = MemorySheets::new();
        api.add_text_sheet("T", 1, "6월", &[]);
        let prompt: Arc<dyn Prompt> = Arc::new(ScriptedPrompt::new(["홍길동", ""]));
        let flow = DepositRequestFlow::with_target("T");
        assert!(flow.run(&api, prompt, date()).await.is_err());
        assert!(api.calls().is_empty());
    }
}
