//! 이체 세션 - 흐름층
//!
//! 상태: `Idle → SheetSelected → TransferPending → TransferDone`
//!
//! [`transition`] 은 상태와 명령만 보고 다음 상태와 할 일을 정한다.
//! [`TransferSession`] 이 그 일을 실제로 수행하고, 성공했을 때만 상태를 옮긴다.

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use crate::clients::SheetsApi;
use crate::infrastructure::{ExcelStore, Prompt};
use crate::models::TransferBatch;
use crate::workflow::portal::{SubmitMode, SubmitOutcome, TransferPortal};
use crate::workflow::transfer_loader::{load_from_excel, load_from_sheet};

pub const HELP_TEXT: &str = "\
명령 목록:
  list                 시트 목록 보기
  select <번호|시트명>  시트를 맨 앞으로 (Sheet1 은 맨 뒤로)
  clean                Sheet1-10 순서로 정리
  load                 맨 앞 시트에서 이체 대상 읽기
  submit [--auto]      이체 입력 (--auto: 다계좌이체 실행까지)
  reset                처음 상태로
  help                 도움말
  exit                 종료";

/// 세션 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    SheetSelected,
    TransferPending,
    TransferDone,
}

/// 세션 명령
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List,
    Select(String),
    Clean,
    Load,
    Submit { auto: bool },
    Reset,
    Help,
    Exit,
}

impl Command {
    /// 한 줄 입력 해석
    pub fn parse(input: &str) -> Result<Self, String> {
        let mut parts = input.split_whitespace();
        let Some(head) = parts.next() else {
            return Err("명령을 입력하세요 (help)".to_string());
        };
        let rest: Vec<&str> = parts.collect();

        let command = match head.to_lowercase().as_str() {
            "list" | "ls" => Command::List,
            "select" => {
                if rest.is_empty() {
                    return Err("select 뒤에 시트 번호나 이름을 입력하세요".to_string());
                }
                Command::Select(rest.join(" "))
            }
            "clean" => Command::Clean,
            "load" => Command::Load,
            "submit" => match rest.as_slice() {
                [] => Command::Submit { auto: false },
                ["--auto"] => Command::Submit { auto: true },
                _ => return Err(format!("알 수 없는 submit 옵션: {}", rest.join(" "))),
            },
            "reset" => Command::Reset,
            "help" | "?" => Command::Help,
            "exit" | "quit" => Command::Exit,
            other => return Err(format!("알 수 없는 명령: {}", other)),
        };
        Ok(command)
    }
}

/// 전이에 따라 수행할 일
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    ShowHelp,
    ShowSheets,
    BringToFront(String),
    CleanOrder,
    LoadBatch,
    Submit(SubmitMode),
    Reset,
    Reject(&'static str),
    Quit,
}

/// 전이 결과 (`next` 는 `action` 이 성공했을 때의 상태)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub next: SessionState,
    pub action: Action,
}

/// 상태 전이
pub fn transition(state: SessionState, command: &Command) -> Step {
    use SessionState::*;

    let stay = |action| Step { next: state, action };
    let reject = |reason| Step {
        next: state,
        action: Action::Reject(reason),
    };

    match (state, command) {
        (_, Command::Help) => stay(Action::ShowHelp),
        (_, Command::List) => stay(Action::ShowSheets),
        (_, Command::Exit) => stay(Action::Quit),
        (_, Command::Reset) => Step {
            next: Idle,
            action: Action::Reset,
        },

        (TransferPending, Command::Select(_) | Command::Clean) => {
            reject("입력 대기 중인 이체가 있습니다. submit 또는 reset 을 먼저 하세요.")
        }
        (_, Command::Select(input)) => Step {
            next: SheetSelected,
            action: Action::BringToFront(input.clone()),
        },
        (_, Command::Clean) => Step {
            next: Idle,
            action: Action::CleanOrder,
        },

        (TransferDone, Command::Load) => {
            reject("이미 이체한 시트입니다. 다음 시트를 select 하세요.")
        }
        (_, Command::Load) => Step {
            next: TransferPending,
            action: Action::LoadBatch,
        },

        (TransferPending, Command::Submit { auto }) => Step {
            next: TransferDone,
            action: Action::Submit(if *auto {
                SubmitMode::Execute
            } else {
                SubmitMode::FillOnly
            }),
        },
        (_, Command::Submit { .. }) => reject("제출할 이체가 없습니다. load 를 먼저 하세요."),
    }
}

/// 이체 대상 출처
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadSource {
    /// 로컬 엑셀 맨 앞 시트
    Excel,
    /// 입금요청 내역 시트
    Sheet {
        spreadsheet_id: String,
        sheet_name: String,
    },
}

/// 세션 집계
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub batches_submitted: usize,
    pub entries_submitted: usize,
    pub batches_executed: usize,
}

/// 대화형 이체 세션
pub struct TransferSession<'a, S, T, P: ?Sized> {
    api: &'a S,
    portal: &'a T,
    prompt: &'a P,
    store: ExcelStore,
    source: LoadSource,
    state: SessionState,
    selected: Option<String>,
    batch: Option<TransferBatch>,
    summary: SessionSummary,
}

impl<'a, S, T, P> TransferSession<'a, S, T, P>
where
    S: SheetsApi,
    T: TransferPortal,
    P: Prompt + ?Sized,
{
    pub fn new(api: &'a S, portal: &'a T, prompt: &'a P, store: ExcelStore, source: LoadSource) -> Self {
        Self {
            api,
            portal,
            prompt,
            store,
            source,
            state: SessionState::Idle,
            selected: None,
            batch: None,
            summary: SessionSummary::default(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn store(&self) -> &ExcelStore {
        &self.store
    }

    pub fn batch(&self) -> Option<&TransferBatch> {
        self.batch.as_ref()
    }

    pub fn summary(&self) -> &SessionSummary {
        &self.summary
    }

    /// `exit` 또는 입력 끝까지 명령 처리
    pub async fn run(&mut self) -> Result<SessionSummary> {
        info!("{}", HELP_TEXT);
        self.show_front();

        loop {
            let line = match self.prompt.ask("🟢명령 (help): ") {
                Ok(line) => line,
                Err(e) => {
                    info!("입력이 끝나 세션을 종료합니다: {}", e);
                    break;
                }
            };
            let command = match Command::parse(&line) {
                Ok(command) => command,
                Err(message) => {
                    warn!("{}", message);
                    continue;
                }
            };
            if !self.handle(&command).await {
                break;
            }
        }

        Ok(self.summary.clone())
    }

    /// 명령 하나 처리 (`false` 면 종료)
    pub async fn handle(&mut self, command: &Command) -> bool {
        let step = transition(self.state, command);
        if step.action == Action::Quit {
            return false;
        }

        match self.perform(&step.action).await {
            Ok(true) => self.state = step.next,
            Ok(false) => {}
            Err(e) => error!("❌ {:#}", e),
        }
        true
    }

    /// 할 일 수행 (`false` 면 상태 유지)
    async fn perform(&mut self, action: &Action) -> Result<bool> {
        match action {
            Action::ShowHelp => {
                info!("{}", HELP_TEXT);
                Ok(true)
            }
            Action::ShowSheets => {
                self.show_sheets();
                Ok(true)
            }
            Action::BringToFront(input) => {
                let Some(name) = self.store.resolve_sheet(input) else {
                    warn!("해당 시트를 찾을 수 없습니다: {}", input);
                    self.show_sheets();
                    return Ok(false);
                };
                self.store.bring_to_front(&name)?;
                self.save().await?;
                info!("'{}'를 맨 앞으로 이동했습니다.", name);
                self.selected = Some(name);
                self.batch = None;
                Ok(true)
            }
            Action::CleanOrder => {
                self.store.clean_order();
                self.save().await?;
                info!("시트를 Sheet1-10 순서로 정리했습니다.");
                self.selected = None;
                self.batch = None;
                self.show_front();
                Ok(true)
            }
            Action::LoadBatch => {
                let batch = match &self.source {
                    LoadSource::Excel => load_from_excel(&self.store)?,
                    LoadSource::Sheet {
                        spreadsheet_id,
                        sheet_name,
                    } => load_from_sheet(self.api, spreadsheet_id, sheet_name).await?,
                };
                if batch.is_empty() {
                    warn!("⚠️ 이체할 데이터가 없습니다 ({})", batch.source);
                    return Ok(false);
                }
                for entry in &batch.entries {
                    info!("  {}", entry);
                }
                info!("📦 {}건, 합계 {}원 준비됨", batch.len(), batch.total_amount());
                self.batch = Some(batch);
                Ok(true)
            }
            Action::Submit(mode) => {
                let Some(batch) = self.batch.as_ref() else {
                    return Ok(false);
                };
                if !self
                    .prompt
                    .confirm(&format!("{}건을 이체 화면에 입력할까요?", batch.len()))?
                {
                    info!("이체를 취소했습니다.");
                    return Ok(false);
                }

                match self.portal.submit(batch, *mode).await? {
                    SubmitOutcome::Cancelled => Ok(false),
                    SubmitOutcome::Filled { entries } => {
                        self.summary.batches_submitted += 1;
                        self.summary.entries_submitted += entries;
                        Ok(true)
                    }
                    SubmitOutcome::Executed { entries } => {
                        self.summary.batches_submitted += 1;
                        self.summary.batches_executed += 1;
                        self.summary.entries_submitted += entries;
                        Ok(true)
                    }
                }
            }
            Action::Reset => {
                self.selected = None;
                self.batch = None;
                info!("처음 상태로 돌아갑니다.");
                Ok(true)
            }
            Action::Reject(reason) => {
                warn!("{}", reason);
                Ok(false)
            }
            Action::Quit => Ok(true),
        }
    }

    async fn save(&self) -> Result<()> {
        self.store
            .save()
            .await
            .with_context(|| format!("{} 저장 실패", self.store.path().display()))
    }

    fn show_front(&self) {
        if let Some(first) = self.store.first_sheet() {
            info!("현재 맨 앞에 있는 시트명은 👉 '{}'입니다.", first.name);
        }
    }

    fn show_sheets(&self) {
        info!("현재 시트 목록: {}", self.store.sheet_names().join(", "));
        if let Some(selected) = &self.selected {
            info!("선택된 시트: {}", selected);
        }
    }
}
