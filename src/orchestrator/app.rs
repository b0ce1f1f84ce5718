use anyhow::{bail, Result};
use chrono::Local;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::clients::{Authenticator, SheetsApi, SheetsClient};
use crate::config::Config;
use crate::infrastructure::{ConsolePrompt, ExcelStore, Prompt, SystemClock};
use crate::orchestrator::retry::retry_on_bad_gateway;
use crate::utils::logging::{init_log_file, log_startup, print_final_stats, truncate_text};
use crate::workflow::{
    split_names, DepositRequestFlow, ErrorMarkingFlow, FormulaSetupFlow, LoadSource, ManualPortal,
    SheetDownloadFlow, StatusUpdateFlow, TransferSession,
};

/// 실행할 작업
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    /// 입금요청 내역 → 로컬 엑셀
    Download,
    /// 입금요청 → 입금완료, 입금오류 색 표시
    UpdateStatus,
    /// 이름 목록을 입금오류로 (비어 있으면 입력받음)
    MarkError { names: Vec<String> },
    /// 대화형 이체 세션
    Transfer { from_sheet: bool },
    /// 입금요청 모아보기 수식 설치
    QueryFormula,
    /// 입금요청 한 건 입력
    Request,
}

impl Task {
    pub fn name(&self) -> &'static str {
        match self {
            Task::Download => "download",
            Task::UpdateStatus => "update-status",
            Task::MarkError { .. } => "mark-error",
            Task::Transfer { .. } => "transfer",
            Task::QueryFormula => "query-formula",
            Task::Request => "request",
        }
    }

    /// 재시도해도 안전한 작업 (대화형 세션은 제외)
    fn retryable(&self) -> bool {
        !matches!(self, Task::Transfer { .. })
    }
}

/// 애플리케이션 주 구조
pub struct App<S = SheetsClient> {
    config: Config,
    sheets: S,
    prompt: Arc<dyn Prompt>,
}

impl App<SheetsClient> {
    /// 설정으로 실제 클라이언트 구성
    pub async fn initialize(config: Config) -> Result<Self> {
        let auth = Authenticator::new(&config)?;
        info!("🔑 토큰 파일: {}", auth.token_path().display());
        let sheets = SheetsClient::new(auth);
        Ok(Self::with_parts(config, sheets, Arc::new(ConsolePrompt)))
    }
}

impl<S: SheetsApi> App<S> {
    pub fn with_parts(config: Config, sheets: S, prompt: Arc<dyn Prompt>) -> Self {
        Self {
            config,
            sheets,
            prompt,
        }
    }

    pub fn sheets(&self) -> &S {
        &self.sheets
    }

    /// 작업 실행 (502 오류는 처음부터 다시)
    pub async fn run(&self, task: &Task) -> Result<Vec<String>> {
        init_log_file(&self.config.output_log_file, task.name())?;
        log_startup(task.name(), self.config.server_retry_limit);

        let limit = if task.retryable() {
            self.config.server_retry_limit
        } else {
            0
        };
        let lines = retry_on_bad_gateway(
            &SystemClock::new(),
            limit,
            Duration::from_secs(self.config.server_retry_delay_secs),
            move |attempt| {
                if attempt > 0 {
                    info!("🔁 {} 다시 실행 ({}번째 재시도)", task.name(), attempt);
                }
                self.run_once(task)
            },
        )
        .await?;

        print_final_stats(task.name(), &lines, &self.config.output_log_file);
        Ok(lines)
    }

    /// 작업 한 번 실행 (결과 요약 줄 반환)
    async fn run_once(&self, task: &Task) -> Result<Vec<String>> {
        let config = &self.config;
        match task {
            Task::Download => {
                Config::require(&config.request_spreadsheet_id, "request_spreadsheet_id")?;
                let mut store = ExcelStore::open(&config.excel_path)?;
                let report = SheetDownloadFlow::new(config)
                    .run(&self.sheets, &mut store)
                    .await?;
                Ok(vec![
                    format!("✅ 기록한 행: {}", report.total_rows()),
                    format!("⚠️ 제외된 행: {}", report.rejected.len()),
                    format!("🔎 확인 필요 행: {}", report.flagged.len()),
                ])
            }
            Task::UpdateStatus => {
                Config::require(&config.spreadsheet_id, "spreadsheet_id")?;
                Config::require(&config.backup_spreadsheet_id, "backup_spreadsheet_id")?;
                let summary = StatusUpdateFlow::new(config)
                    .run(&self.sheets, Local::now().naive_local())
                    .await?;
                Ok(vec![
                    format!("📄 처리한 시트: {} (제외 {})", summary.sheets_processed, summary.sheets_skipped),
                    format!("✅ 입금완료: {}", summary.completed),
                    format!("🟧 입금오류 표시: {}", summary.errored),
                    format!("💾 백업 행: {} (실패 {})", summary.backed_up, summary.backup_failures),
                ])
            }
            Task::MarkError { names } => {
                Config::require(&config.spreadsheet_id, "spreadsheet_id")?;
                Config::require(&config.backup_spreadsheet_id, "backup_spreadsheet_id")?;
                let names = if names.is_empty() {
                    split_names(&self.prompt.ask("입금오류로 처리할 이름을 쉼표(,)로 구분하여 입력하세요: ")?)
                } else {
                    names.clone()
                };
                if names.is_empty() {
                    bail!("처리할 이름이 없습니다.");
                }
                let summary = ErrorMarkingFlow::new(config)
                    .run(&self.sheets, &*self.prompt, &names, Local::now().naive_local())
                    .await?;
                Ok(vec![
                    format!("🟧 입금오류 처리 행: {}", summary.marked_rows),
                    format!("⏭️ 건너뛴 이름: {}", summary.skipped_names.join(", ")),
                    format!("❓ 찾지 못한 이름: {}", summary.not_found.join(", ")),
                ])
            }
            Task::Transfer { from_sheet } => {
                let source = if *from_sheet {
                    Config::require(&config.request_spreadsheet_id, "request_spreadsheet_id")?;
                    LoadSource::Sheet {
                        spreadsheet_id: config.request_spreadsheet_id.clone(),
                        sheet_name: config.request_sheet_name.clone(),
                    }
                } else {
                    LoadSource::Excel
                };
                let store = ExcelStore::open(&config.excel_path)?;
                let portal = ManualPortal::new(Arc::clone(&self.prompt));
                let mut session =
                    TransferSession::new(&self.sheets, &portal, &*self.prompt, store, source);
                let summary = session.run().await?;
                Ok(vec![
                    format!("📦 제출한 묶음: {}", summary.batches_submitted),
                    format!("🧾 입력한 건수: {}", summary.entries_submitted),
                    format!("✅ 실행까지 마친 묶음: {}", summary.batches_executed),
                ])
            }
            Task::QueryFormula => {
                Config::require(&config.spreadsheet_id, "spreadsheet_id")?;
                Config::require(&config.request_spreadsheet_id, "request_spreadsheet_id")?;
                let formula = FormulaSetupFlow::new(config).run(&self.sheets).await?;
                Ok(vec![format!("📝 수식: {}", truncate_text(&formula, 80))])
            }
            Task::Request => {
                Config::require(&config.spreadsheet_id, "spreadsheet_id")?;
                let result = DepositRequestFlow::new(config)
                    .run(&self.sheets, Arc::clone(&self.prompt), Local::now().date_naive())
                    .await?;
                Ok(vec![format!(
                    "✅ {} 시트 {}행에 입력",
                    result.sheet_name, result.row_number
                )])
            }
        }
    }
}
