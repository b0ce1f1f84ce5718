use crate::error::{AppError, AppResult, ConfigError};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// 기본 설정 파일 이름
pub const DEFAULT_CONFIG_FILE: &str = "batch_transfer.toml";

/// 프로그램 설정
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 입금 현황판 스프레드시트 ID (시트별 상태 관리)
    pub spreadsheet_id: String,
    /// 백업 스프레드시트 ID
    pub backup_spreadsheet_id: String,
    /// 백업 스프레드시트의 시트 이름
    pub backup_sheet_name: String,
    /// 입금요청 내역 스프레드시트 ID
    pub request_spreadsheet_id: String,
    /// 입금요청 내역 시트 이름
    pub request_sheet_name: String,
    /// OAuth 토큰 캐시 경로 (없으면 OS 기본 경로)
    pub credential_path: Option<PathBuf>,
    /// 이체정보 엑셀 파일 경로
    pub excel_path: PathBuf,
    // --- OAuth 클라이언트 ---
    pub oauth_client_id: String,
    pub oauth_client_secret: String,
    /// 502 오류 시 전체 재시도 횟수
    pub server_retry_limit: u32,
    /// 502 오류 시 재시도 전 대기 시간(초)
    pub server_retry_delay_secs: u64,
    /// 상세 로그 출력 여부
    pub verbose_logging: bool,
    /// 실행 로그 파일
    pub output_log_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            spreadsheet_id: String::new(),
            backup_spreadsheet_id: String::new(),
            backup_sheet_name: "BackupData".to_string(),
            request_spreadsheet_id: String::new(),
            request_sheet_name: "시트1".to_string(),
            credential_path: None,
            excel_path: PathBuf::from("이체정보.xlsx"),
            oauth_client_id: String::new(),
            oauth_client_secret: String::new(),
            server_retry_limit: 3,
            server_retry_delay_secs: 30,
            verbose_logging: false,
            output_log_file: "transfer_log.txt".to_string(),
        }
    }
}

impl Config {
    /// 기본값 위에 환경 변수만 적용
    pub fn from_env() -> AppResult<Self> {
        Self::default().apply_env()
    }

    /// 설정 파일(있으면)과 환경 변수를 차례로 적용
    ///
    /// `path` 가 없으면 현재 디렉터리의 `batch_transfer.toml` 을 찾고,
    /// 그것도 없으면 기본값에서 시작한다.
    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        let base = match path {
            Some(p) => Self::from_file(p)?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(default_path)?
                } else {
                    Self::default()
                }
            }
        };
        base.apply_env()
    }

    /// TOML 설정 파일 읽기
    pub fn from_file(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::io(path.display().to_string(), e))?;
        let config = Self::from_toml_str(&content, &path.display().to_string())?;
        debug!("설정 파일 로드: {}", path.display());
        Ok(config)
    }

    fn from_toml_str(content: &str, origin: &str) -> AppResult<Self> {
        toml::from_str(content).map_err(|source| {
            ConfigError::TomlParseFailed {
                path: origin.to_string(),
                source,
            }
            .into()
        })
    }

    fn apply_env(self) -> AppResult<Self> {
        self.apply_vars(|name| std::env::var(name).ok())
    }

    /// 환경 변수 조회 함수를 받아 덮어쓰기 (테스트에서 주입)
    fn apply_vars(mut self, var: impl Fn(&str) -> Option<String>) -> AppResult<Self> {
        if let Some(v) = var("SPREADSHEET_ID") {
            self.spreadsheet_id = v;
        }
        if let Some(v) = var("BACKUP_SPREADSHEET_ID") {
            self.backup_spreadsheet_id = v;
        }
        if let Some(v) = var("BACKUP_SHEET_NAME") {
            self.backup_sheet_name = v;
        }
        if let Some(v) = var("REQUEST_SPREADSHEET_ID") {
            self.request_spreadsheet_id = v;
        }
        if let Some(v) = var("REQUEST_SHEET_NAME") {
            self.request_sheet_name = v;
        }
        if let Some(v) = var("CREDENTIAL_PATH") {
            self.credential_path = Some(PathBuf::from(v));
        }
        if let Some(v) = var("EXCEL_PATH") {
            self.excel_path = PathBuf::from(v);
        }
        if let Some(v) = var("OAUTH_CLIENT_ID") {
            self.oauth_client_id = v;
        }
        if let Some(v) = var("OAUTH_CLIENT_SECRET") {
            self.oauth_client_secret = v;
        }
        if let Some(v) = var("SERVER_RETRY_LIMIT") {
            self.server_retry_limit = parse_var("SERVER_RETRY_LIMIT", &v, "u32")?;
        }
        if let Some(v) = var("SERVER_RETRY_DELAY_SECS") {
            self.server_retry_delay_secs = parse_var("SERVER_RETRY_DELAY_SECS", &v, "u64")?;
        }
        if let Some(v) = var("VERBOSE_LOGGING") {
            self.verbose_logging = parse_var("VERBOSE_LOGGING", &v, "bool")?;
        }
        if let Some(v) = var("OUTPUT_LOG_FILE") {
            self.output_log_file = v;
        }
        Ok(self)
    }

    /// 필수 스프레드시트 ID 확인
    pub fn require(value: &str, name: &'static str) -> AppResult<()> {
        if value.trim().is_empty() {
            return Err(ConfigError::Missing(name).into());
        }
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(var_name: &str, value: &str, expected_type: &str) -> AppResult<T> {
    value.trim().parse().map_err(|_| {
        ConfigError::EnvVarParseFailed {
            var_name: var_name.to_string(),
            value: value.to_string(),
            expected_type: expected_type.to_string(),
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_toml_overrides_defaults() {
        let toml = r#"
            spreadsheet_id = "status-sheet"
            backup_spreadsheet_id = "backup-sheet"
            excel_path = "data/이체정보.xlsx"
            server_retry_limit = 5
        "#;
        let config = Config::from_toml_str(toml, "inline").unwrap();
        assert_eq!(config.spreadsheet_id, "status-sheet");
        assert_eq!(config.backup_spreadsheet_id, "backup-sheet");
        assert_eq!(config.excel_path, PathBuf::from("data/이체정보.xlsx"));
        assert_eq!(config.server_retry_limit, 5);
        // 나머지는 기본값 유지
        assert_eq!(config.backup_sheet_name, "BackupData");
        assert_eq!(config.request_sheet_name, "시트1");
        assert!(config.credential_path.is_none());
    }

    #[test]
    fn test_env_overrides_file() {
        let vars: HashMap<&str, &str> = [
            ("SPREADSHEET_ID", "from-env"),
            ("CREDENTIAL_PATH", "/tmp/token.json"),
            ("VERBOSE_LOGGING", "true"),
        ]
        .into_iter()
        .collect();

        let config = Config::default()
            .apply_vars(|name| vars.get(name).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.spreadsheet_id, "from-env");
        assert_eq!(config.credential_path, Some(PathBuf::from("/tmp/token.json")));
        assert!(config.verbose_logging);
    }

    #[test]
    fn test_env_parse_error() {
        let err = Config::default()
            .apply_vars(|name| (name == "SERVER_RETRY_LIMIT").then(|| "many".to_string()))
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Config(ConfigError::EnvVarParseFailed { .. })
        ));
    }

    #[test]
    fn test_require_rejects_blank() {
        assert!(Config::require("abc", "spreadsheet_id").is_ok());
        assert!(Config::require("  ", "spreadsheet_id").is_err());
    }
}
