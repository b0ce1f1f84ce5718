//! 백업 기록 서비스 - 업무 능력층
//!
//! 상태를 바꾸기 전에 원본 행을 백업 스프레드시트에 덧붙인다.

use crate::clients::{json_rows, sheet_range, SheetsApi, ValueInputOption};
use crate::config::Config;
use crate::error::AppResult;
use crate::models::status::BackupRecord;
use chrono::NaiveDateTime;
use serde_json::json;
use tracing::{debug, info};

/// 백업 기록 서비스
///
/// 백업 시트가 없으면 먼저 만들고, 각 행 앞에 원본 시트명과 시각을 붙여 추가한다.
pub struct BackupWriter {
    spreadsheet_id: String,
    sheet_name: String,
}

impl BackupWriter {
    pub fn new(config: &Config) -> Self {
        Self::with_target(&config.backup_spreadsheet_id, &config.backup_sheet_name)
    }

    pub fn with_target(spreadsheet_id: impl Into<String>, sheet_name: impl Into<String>) -> Self {
        Self {
            spreadsheet_id: spreadsheet_id.into(),
            sheet_name: sheet_name.into(),
        }
    }

    /// 백업 시트 확보
    pub async fn ensure_sheet<S: SheetsApi>(&self, api: &S) -> AppResult<()> {
        let sheets = api.list_sheets(&self.spreadsheet_id).await?;
        if sheets.iter().any(|s| s.title == self.sheet_name) {
            return Ok(());
        }

        let request = json!({ "addSheet": { "properties": { "title": self.sheet_name } } });
        api.batch_update(&self.spreadsheet_id, vec![request]).await?;
        info!("📄 '{}' 시트가 생성되었습니다.", self.sheet_name);
        Ok(())
    }

    /// 행 백업 (추가된 행 수 반환)
    pub async fn append<S: SheetsApi>(
        &self,
        api: &S,
        origin_sheet: &str,
        rows: &[Vec<String>],
        timestamp: NaiveDateTime,
    ) -> AppResult<usize> {
        if rows.is_empty() {
            return Ok(0);
        }
        self.ensure_sheet(api).await?;

        let values: Vec<Vec<String>> = rows
            .iter()
            .map(|cells| BackupRecord::new(origin_sheet, timestamp, cells.clone()).to_values())
            .collect();

        debug!("백업 대상: {} → {} 행", origin_sheet, values.len());
        api.append_values(
            &self.spreadsheet_id,
            &sheet_range(&self.sheet_name, "A1"),
            json_rows(&values),
            ValueInputOption::UserEntered,
        )
        .await?;

        info!("💾 {} 행이 백업되었습니다.", values.len());
        Ok(values.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::{MemorySheets, RecordedCall};
    use chrono::NaiveDate;

    fn timestamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(18, 5, 9)
            .unwrap()
    }

    #[tokio::test]
    async fn test_creates_sheet_and_appends() {
        let api = MemorySheets::new();
        api.add_text_sheet("B", 0, "기존", &[vec!["x"]]);
        let writer = BackupWriter::with_target("B", "BackupData");

        let rows = vec![vec![String::new(), "A상품".to_string()]];
        let added = writer.append(&api, "6월", &rows, timestamp()).await.unwrap();
        assert_eq!(added, 1);

        assert_eq!(api.sheet_titles("B"), vec!["기존", "BackupData"]);
        let values = api.text_values("B", "BackupData");
        assert_eq!(values[0], vec!["6월", "2024-05-01 18:05:09", "", "A상품"]);

        let calls = api.calls();
        assert!(matches!(
            &calls[1],
            RecordedCall::Append { input: ValueInputOption::UserEntered, .. }
        ));
    }

    #[tokio::test]
    async fn test_existing_sheet_is_reused() {
        let api = MemorySheets::new();
        api.add_text_sheet("B", 0, "BackupData", &[vec!["old"]]);
        let writer = BackupWriter::with_target("B", "BackupData");

        writer
            .append(&api, "7월", &[vec!["r".to_string()]], timestamp())
            .await
            .unwrap();
        // addSheet 없이 추가만
        assert_eq!(api.calls().len(), 1);
        assert_eq!(api.text_values("B", "BackupData")[1][0], "7월");
    }

    #[tokio::test]
    async fn test_empty_rows_skip_api() {
        let api = MemorySheets::new();
        let writer = BackupWriter::with_target("B", "BackupData");
        assert_eq!(writer.append(&api, "6월", &[], timestamp()).await.unwrap(), 0);
        assert!(api.calls().is_empty());
    }
}
