use anyhow::Result;
use batch_transfer::config::Config;
use batch_transfer::orchestrator::{App, Task};
use batch_transfer::utils::logging;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "batch_transfer", about = "입금요청 시트 정리, 다계좌이체 준비, 입금 상태 기록 도구")]
struct Cli {
    /// 설정 파일 (기본: ./batch_transfer.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// 상세 로그
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 입금요청 내역을 로컬 엑셀 Sheet1-10 으로 내려받기
    Download,
    /// 입금요청 행을 입금완료로 바꾸고 입금오류 행을 표시
    UpdateStatus,
    /// 이름으로 찾은 입금요청 행을 입금오류로 표시
    MarkError {
        /// 처리할 이름 (없으면 입력받음)
        names: Vec<String>,
    },
    /// 대화형 이체 세션
    Transfer {
        /// 로컬 엑셀 대신 입금요청 내역 시트에서 읽기
        #[arg(long)]
        from_sheet: bool,
    },
    /// 입금요청 모아보기 QUERY 수식 설치
    QueryFormula,
    /// 입금요청 한 건 입력
    Request,
}

impl From<Commands> for Task {
    fn from(command: Commands) -> Self {
        match command {
            Commands::Download => Task::Download,
            Commands::UpdateStatus => Task::UpdateStatus,
            Commands::MarkError { names } => Task::MarkError {
                names: names
                    .iter()
                    .flat_map(|n| batch_transfer::workflow::split_names(n))
                    .collect(),
            },
            Commands::Transfer { from_sheet } => Task::Transfer { from_sheet },
            Commands::QueryFormula => Task::QueryFormula,
            Commands::Request => Task::Request,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 설정 로드
    let config = Config::load(cli.config.as_deref())?;

    // 로그 초기화
    logging::init(cli.verbose || config.verbose_logging);

    // 초기화 후 실행
    let task = Task::from(cli.command);
    App::initialize(config).await?.run(&task).await?;

    Ok(())
}
