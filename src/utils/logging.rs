use anyhow::{Context, Result};
/// 로그 도구 모듈
///
/// 구독자 초기화와 실행 로그 머리말, 배너 출력을 모아 둔다
use std::fs;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 콘솔 로그 초기화
///
/// `RUST_LOG` 가 있으면 그것을, 없으면 `verbose` 에 따라 info/debug 를 쓴다.
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .try_init();
}

/// 실행 로그 파일 머리말 쓰기
///
/// # 매개변수
/// - `log_file_path`: 로그 파일 경로
/// - `command`: 실행한 명령 이름
pub fn init_log_file(log_file_path: &str, command: &str) -> Result<()> {
    let log_header = format!(
        "{}\n{} 실행 로그 - {}\n{}\n\n",
        "=".repeat(60),
        command,
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)
        .with_context(|| format!("로그 파일을 만들 수 없습니다: {}", log_file_path))?;
    Ok(())
}

/// 프로그램 시작 정보
pub fn log_startup(command: &str, retry_limit: u32) {
    info!("{}", "=".repeat(60));
    info!("🚀 프로그램 시작 - {}", command);
    info!("🔁 502 오류 재시도 한도: {}회", retry_limit);
    info!("{}", "=".repeat(60));
}

/// 최종 결과 출력
///
/// # 매개변수
/// - `command`: 실행한 명령 이름
/// - `lines`: 명령별 집계 줄
/// - `log_file_path`: 로그 파일 경로
pub fn print_final_stats(command: &str, lines: &[String], log_file_path: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 {} 완료", command);
    info!(
        "완료 시각: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    for line in lines {
        info!("{}", line);
    }
    info!("{}", "=".repeat(60));
    info!("\n로그 파일: {}", log_file_path);
}

/// 긴 문자열을 로그용으로 자르기
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
