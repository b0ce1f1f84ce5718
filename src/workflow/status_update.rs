//! 입금 완료 처리 흐름 - 흐름층
//!
//! 흐름 순서 (시트마다):
//! 1. `A1:P1000` 읽기
//! 2. 입금요청/입금오류 행으로 계획 생성
//! 3. 백업 (실패해도 계속)
//! 4. 색/문구 변경을 batchUpdate 한 번으로 적용

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use tracing::{info, warn};

use crate::clients::{sheet_range, text_rows, SheetsApi};
use crate::config::Config;
use crate::models::status::{is_done_sheet, STATUS_SHEET_RANGE};
use crate::services::{build_status_batch, BackupWriter, StatusBatch};

/// 처리 결과 집계
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusUpdateSummary {
    pub sheets_processed: usize,
    pub sheets_skipped: usize,
    /// 입금완료로 바뀐 행
    pub completed: usize,
    /// 주황색으로 칠한 입금오류 행
    pub errored: usize,
    pub backed_up: usize,
    pub backup_failures: usize,
}

/// 입금 완료 처리 흐름
pub struct StatusUpdateFlow {
    spreadsheet_id: String,
    backup_writer: BackupWriter,
}

impl StatusUpdateFlow {
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

    /// 모든 진행 중 시트 처리
    pub async fn run<S: SheetsApi>(&self, api: &S, now: NaiveDateTime) -> Result<StatusUpdateSummary> {
        let sheets = api
            .list_sheets(&self.spreadsheet_id)
            .await
            .context("현황판 시트 목록을 가져오지 못했습니다")?;

        let mut summary = StatusUpdateSummary::default();

        for sheet in sheets {
            if is_done_sheet(&sheet.title) {
                info!("'{}' 시트는 '완료'가 포함되어 제외됩니다.", sheet.title);
                summary.sheets_skipped += 1;
                continue;
            }

            info!("📄 시트 처리 중: {} (ID: {})", sheet.title, sheet.sheet_id);
            let values = api
                .get_values(&self.spreadsheet_id, &sheet_range(&sheet.title, STATUS_SHEET_RANGE))
                .await
                .with_context(|| format!("'{}' 시트를 읽지 못했습니다", sheet.title))?;

            if values.is_empty() {
                info!("{}에서 데이터를 찾을 수 없습니다.", sheet.title);
                summary.sheets_processed += 1;
                continue;
            }

            let batch = build_status_batch(&sheet, &text_rows(&values), now.date());
            self.apply(api, &batch, now, &mut summary).await?;
            summary.sheets_processed += 1;
        }

        Ok(summary)
    }

    /// 백업 후 변경 적용
    async fn apply<S: SheetsApi>(
        &self,
        api: &S,
        batch: &StatusBatch,
        now: NaiveDateTime,
        summary: &mut StatusUpdateSummary,
    ) -> Result<()> {
        let title = &batch.sheet.title;

        match self
            .backup_writer
            .append(api, title, &batch.backup_rows, now)
            .await
        {
            Ok(n) => summary.backed_up += n,
            Err(e) => {
                warn!("⚠️ 백업 중 오류 발생: {}", e);
                warn!("백업에 실패했지만, 원본 시트 업데이트는 계속 진행합니다.");
                summary.backup_failures += 1;
            }
        }

        if batch.requests.is_empty() {
            info!("{}에서 업데이트할 내용이 없습니다.", title);
            return Ok(());
        }

        api.batch_update(&self.spreadsheet_id, batch.requests.clone())
            .await
            .with_context(|| format!("'{}' 시트 업데이트 실패", title))?;

        summary.completed += batch.completed;
        summary.errored += batch.errored;
        info!(
            "✓ {} 업데이트 완료 (입금완료 {}건, 입금오류 {}건)",
            title, batch.completed, batch.errored
        );
        Ok(())
    }
}
