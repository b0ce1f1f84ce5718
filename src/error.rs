use thiserror::Error;

/// 애플리케이션 오류 타입
#[derive(Debug, Error)]
pub enum AppError {
    /// 스프레드시트 API 호출 오류
    #[error("API 오류: {0}")]
    Api(#[from] ApiError),
    /// OAuth 인증 오류
    #[error("인증 오류: {0}")]
    Auth(#[from] AuthError),
    /// 로컬 엑셀 파일 오류
    #[error("엑셀 오류: {0}")]
    Excel(#[from] ExcelError),
    /// 행/열 데이터 오류
    #[error("행 데이터 오류: {0}")]
    Row(#[from] RowError),
    /// 설정 오류
    #[error("설정 오류: {0}")]
    Config(#[from] ConfigError),
    /// 파일 입출력 오류
    #[error("파일 오류 ({path}): {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// 스프레드시트 API 오류
#[derive(Debug, Error)]
pub enum ApiError {
    /// 네트워크 요청 실패
    #[error("API 요청 실패 ({endpoint}): {source}")]
    RequestFailed {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    /// 2xx 이외의 응답
    #[error("API 오류 응답 ({endpoint}): status={status}, message={message}")]
    BadStatus {
        endpoint: String,
        status: u16,
        message: String,
    },
    /// JSON 파싱 실패
    #[error("JSON 파싱 실패: {0}")]
    JsonParseFailed(#[from] serde_json::Error),
    /// 스프레드시트에 해당 시트가 없음
    #[error("시트를 찾을 수 없습니다: {0}")]
    SheetNotFound(String),
}

/// OAuth 인증 오류
#[derive(Debug, Error)]
pub enum AuthError {
    /// 클라이언트 ID/시크릿 미설정
    #[error("OAuth 클라이언트 정보가 설정되지 않았습니다 (OAUTH_CLIENT_ID / OAUTH_CLIENT_SECRET)")]
    MissingClient,
    /// 토큰 갱신 실패
    #[error("토큰 갱신 실패: {0}")]
    RefreshFailed(String),
    /// 동의 화면 흐름 실패
    #[error("인증 동의 처리 실패: {0}")]
    ConsentFailed(String),
    /// 토큰 파일 형식 오류
    #[error("토큰 파일 파싱 실패 ({path}): {source}")]
    TokenFileInvalid {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// 엑셀 파일 오류
#[derive(Debug, Error)]
pub enum ExcelError {
    /// 읽기 실패
    #[error("엑셀 읽기 실패 ({path}): {message}")]
    ReadFailed { path: String, message: String },
    /// 쓰기 실패
    #[error("엑셀 저장 실패 ({path}): {message}")]
    WriteFailed { path: String, message: String },
    /// 다른 프로그램이 파일을 잡고 있음
    #[error("엑셀 파일이 다른 프로그램에서 열려 있습니다 ({path}), {waited_secs}초 대기 후 포기")]
    Locked { path: String, waited_secs: u64 },
    /// 잘못된 셀 주소
    #[error("잘못된 셀 주소: {0}")]
    InvalidAddress(String),
    /// 시트 없음
    #[error("시트를 찾을 수 없습니다: {0}")]
    SheetNotFound(String),
}

/// 행/열 데이터 오류
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RowError {
    /// 열 매핑이 행 너비를 벗어남
    #[error("열 범위 초과: {field} 열 인덱스 {index}, 행 너비 {width} (행 {row})")]
    ColumnOutOfRange {
        field: &'static str,
        index: usize,
        width: usize,
        row: usize,
    },
    /// 금액을 정수로 변환할 수 없음
    #[error("금액 형식 오류: '{value}' (행 {row})")]
    InvalidAmount { value: String, row: usize },
}

/// 설정 오류
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 설정 파일 파싱 실패
    #[error("설정 파일 파싱 실패 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    /// 환경 변수 값 변환 실패
    #[error("환경 변수 {var_name} 파싱 실패: 값 '{value}' 을(를) {expected_type}(으)로 변환할 수 없습니다")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 필수 항목 누락
    #[error("필수 설정 누락: {0}")]
    Missing(&'static str),
}

// ========== 편의 생성자 ==========

impl AppError {
    /// 파일 입출력 오류 생성
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::Io {
            path: path.into(),
            source,
        }
    }

    /// API 요청 실패 오류 생성
    pub fn api_request_failed(endpoint: impl Into<String>, source: reqwest::Error) -> Self {
        AppError::Api(ApiError::RequestFailed {
            endpoint: endpoint.into(),
            source,
        })
    }

    /// 502 Bad Gateway 여부 (최상위 재시도 대상)
    pub fn is_bad_gateway(&self) -> bool {
        matches!(self, AppError::Api(ApiError::BadStatus { status: 502, .. }))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Api(ApiError::JsonParseFailed(err))
    }
}

/// 애플리케이션 결과 타입
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_gateway_detection() {
        let err = AppError::Api(ApiError::BadStatus {
            endpoint: "values.get".to_string(),
            status: 502,
            message: "Bad Gateway".to_string(),
        });
        assert!(err.is_bad_gateway());

        let err = AppError::Api(ApiError::BadStatus {
            endpoint: "values.get".to_string(),
            status: 500,
            message: "Internal".to_string(),
        });
        assert!(!err.is_bad_gateway());
        assert!(!AppError::Config(ConfigError::Missing("spreadsheet_id")).is_bad_gateway());
    }

    #[test]
    fn test_bad_gateway_survives_anyhow() {
        let err: anyhow::Error = AppError::Api(ApiError::BadStatus {
            endpoint: "batchUpdate".to_string(),
            status: 502,
            message: String::new(),
        })
        .into();
        let app_err = err.downcast_ref::<AppError>().expect("AppError 로 다운캐스트 가능해야 함");
        assert!(app_err.is_bad_gateway());
    }
}
