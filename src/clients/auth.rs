//! Google OAuth 토큰 관리
//!
//! 토큰 캐시 파일을 읽고, 만료됐으면 refresh token 으로 갱신하고,
//! 그것도 안 되면 로컬 루프백 주소로 동의 화면 흐름을 진행한다.
//! 캐시 파일 형식은 Google 의 `authorized_user` JSON 과 같아서 다른 도구와 공유된다.

use crate::config::Config;
use crate::error::{AppError, AppResult, AuthError};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Router,
};
use chrono::{DateTime, Duration, Utc};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::{oneshot, Mutex};
use tracing::{debug, info, warn};

pub const AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
pub const TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// 토큰 파일을 다른 도구와 공유하므로 같은 범위를 요청한다
pub const SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/drive",
    "https://www.googleapis.com/auth/spreadsheets",
    "https://www.googleapis.com/auth/documents",
    "https://www.googleapis.com/auth/calendar",
];

/// 만료 직전 토큰은 미리 갱신
const EXPIRY_MARGIN_SECS: i64 = 60;

/// OS 별 기본 토큰 경로
///
/// Windows: `%APPDATA%\GoogleAPI\token.json`, 그 외: `~/.config/GoogleAPI/token.json`
pub fn default_token_path() -> Option<PathBuf> {
    let base = if cfg!(windows) {
        dirs::config_dir()
    } else {
        dirs::home_dir().map(|home| home.join(".config"))
    };
    base.map(|dir| dir.join("GoogleAPI").join("token.json"))
}

/// 캐시된 토큰 (authorized_user 형식)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredToken {
    pub token: Option<String>,
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default)]
    pub scopes: Vec<String>,
    /// RFC 3339 만료 시각
    pub expiry: Option<String>,
}

fn default_token_uri() -> String {
    TOKEN_URI.to_string()
}

impl StoredToken {
    fn expiry_time(&self) -> Option<DateTime<Utc>> {
        let raw = self.expiry.as_deref()?;
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|t| t.with_timezone(&Utc))
            .or_else(|| {
                // 시간대 없이 저장된 값은 UTC 로 본다
                chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                    .ok()
                    .map(|t| t.and_utc())
            })
    }

    /// 지금 바로 쓸 수 있는 토큰인지
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        match (&self.token, self.expiry_time()) {
            (Some(_), Some(expiry)) => expiry - Duration::seconds(EXPIRY_MARGIN_SECS) > now,
            (Some(_), None) => true,
            _ => false,
        }
    }

    pub fn can_refresh(&self) -> bool {
        self.refresh_token.is_some()
    }

    /// 토큰 엔드포인트 응답 반영
    fn apply(&mut self, response: TokenResponse, now: DateTime<Utc>) {
        self.token = Some(response.access_token);
        if let Some(refresh) = response.refresh_token {
            self.refresh_token = Some(refresh);
        }
        if let Some(secs) = response.expires_in {
            let expiry = now + Duration::seconds(secs);
            self.expiry = Some(expiry.to_rfc3339_opts(chrono::SecondsFormat::Micros, true));
        }
        if let Some(scope) = response.scope {
            self.scopes = scope.split_whitespace().map(str::to_string).collect();
        }
    }

    pub fn load(path: &Path) -> AppResult<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::io(path.display().to_string(), e))?;
        let token = serde_json::from_str(&content).map_err(|source| AuthError::TokenFileInvalid {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Some(token))
    }

    pub fn save(&self, path: &Path) -> AppResult<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| AppError::io(dir.display().to_string(), e))?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| AppError::io(path.display().to_string(), e))
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<i64>,
    refresh_token: Option<String>,
    scope: Option<String>,
}

/// 액세스 토큰 제공자
pub struct Authenticator {
    http: reqwest::Client,
    token_path: PathBuf,
    client_id: String,
    client_secret: String,
    cached: Mutex<Option<StoredToken>>,
}

impl Authenticator {
    pub fn new(config: &Config) -> AppResult<Self> {
        let token_path = match &config.credential_path {
            Some(path) => path.clone(),
            None => default_token_path()
                .ok_or_else(|| AuthError::ConsentFailed("홈 디렉터리를 찾을 수 없습니다".to_string()))?,
        };
        debug!("토큰 경로: {}", token_path.display());

        Ok(Self {
            http: reqwest::Client::new(),
            token_path,
            client_id: config.oauth_client_id.clone(),
            client_secret: config.oauth_client_secret.clone(),
            cached: Mutex::new(None),
        })
    }

    pub fn token_path(&self) -> &Path {
        &self.token_path
    }

    /// 유효한 액세스 토큰 반환 (필요하면 갱신/재인증)
    pub async fn access_token(&self) -> AppResult<String> {
        let mut cached = self.cached.lock().await;
        if cached.is_none() {
            *cached = StoredToken::load(&self.token_path)?;
        }

        let now = Utc::now();
        if let Some(token) = cached.as_ref().filter(|t| t.is_valid_at(now)) {
            if let Some(access) = &token.token {
                return Ok(access.clone());
            }
        }

        let mut renewed = None;
        if let Some(token) = cached.as_ref().filter(|t| t.can_refresh()) {
            match self.refresh(token.clone()).await {
                Ok(t) => renewed = Some(t),
                Err(e) => warn!("⚠️ 토큰 갱신 중 오류 발생, 다시 인증합니다: {}", e),
            }
        }

        let token = match renewed {
            Some(t) => t,
            None => self.consent().await?,
        };
        token.save(&self.token_path)?;

        let access = token
            .token
            .clone()
            .ok_or_else(|| AuthError::RefreshFailed("응답에 access_token 이 없습니다".to_string()))?;
        *cached = Some(token);
        Ok(access)
    }

    async fn refresh(&self, mut token: StoredToken) -> AppResult<StoredToken> {
        let refresh_token = token.refresh_token.clone().unwrap_or_default();
        let client_id = non_empty_or(&token.client_id, &self.client_id);
        let client_secret = non_empty_or(&token.client_secret, &self.client_secret);

        debug!("🔄 토큰 갱신 요청");
        let params = [
            ("client_id", client_id.as_str()),
            ("client_secret", client_secret.as_str()),
            ("refresh_token", refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ];
        let response = self.post_token(&token.token_uri, &params).await?;

        token.client_id = client_id;
        token.client_secret = client_secret;
        token.apply(response, Utc::now());
        info!("✓ 토큰 갱신 완료");
        Ok(token)
    }

    /// 루프백 동의 흐름
    async fn consent(&self) -> AppResult<StoredToken> {
        if self.client_id.is_empty() || self.client_secret.is_empty() {
            return Err(AuthError::MissingClient.into());
        }

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| AuthError::ConsentFailed(e.to_string()))?;
        let port = listener
            .local_addr()
            .map_err(|e| AuthError::ConsentFailed(e.to_string()))?
            .port();
        let redirect_uri = format!("http://localhost:{}/", port);

        let auth_url = consent_url(&self.client_id, &redirect_uri)?;
        info!("🌐 브라우저에서 아래 주소를 열어 Google 계정 접근을 허용하세요:");
        info!("{}", auth_url);

        let code = wait_for_code(listener).await?;

        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("code", code.as_str()),
            ("redirect_uri", redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ];
        let response = self.post_token(TOKEN_URI, &params).await?;

        let mut token = StoredToken {
            token: None,
            refresh_token: None,
            token_uri: TOKEN_URI.to_string(),
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            scopes: SCOPES.iter().map(|s| s.to_string()).collect(),
            expiry: None,
        };
        token.apply(response, Utc::now());
        info!("✓ 인증 완료, 토큰 저장: {}", self.token_path.display());
        Ok(token)
    }

    async fn post_token(&self, token_uri: &str, params: &[(&str, &str)]) -> AppResult<TokenResponse> {
        let response = self
            .http
            .post(token_uri)
            .form(params)
            .send()
            .await
            .map_err(|e| AuthError::RefreshFailed(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AuthError::RefreshFailed(e.to_string()))?;
        if !status.is_success() {
            return Err(AuthError::RefreshFailed(format!("status={}, body={}", status, body)).into());
        }
        Ok(serde_json::from_str(&body)?)
    }
}

fn non_empty_or(primary: &str, fallback: &str) -> String {
    if primary.is_empty() {
        fallback.to_string()
    } else {
        primary.to_string()
    }
}

/// 동의 화면 주소
pub fn consent_url(client_id: &str, redirect_uri: &str) -> AppResult<Url> {
    let scope = SCOPES.join(" ");
    Url::parse_with_params(
        AUTH_URI,
        &[
            ("client_id", client_id),
            ("redirect_uri", redirect_uri),
            ("response_type", "code"),
            ("scope", scope.as_str()),
            ("access_type", "offline"),
            ("prompt", "consent"),
        ],
    )
    .map_err(|e| AuthError::ConsentFailed(e.to_string()).into())
}

/// 리다이렉트 쿼리 (`/?code=...&scope=...` 또는 `/?error=...`)
#[derive(Debug, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub error: Option<String>,
}

impl CallbackParams {
    /// 인증 응답이 아닌 요청 (브라우저의 빈 요청 등)
    fn is_empty(&self) -> bool {
        self.code.is_none() && self.error.is_none()
    }

    /// `code` 가 있으면 그것, 없으면 `error` 내용으로 실패
    pub fn into_code(self) -> Result<String, AuthError> {
        match (self.code, self.error) {
            (Some(code), _) => Ok(code),
            (None, error) => Err(AuthError::ConsentFailed(
                error.unwrap_or_else(|| "응답에 code 가 없습니다".to_string()),
            )),
        }
    }
}

type CallbackSender = Arc<Mutex<Option<oneshot::Sender<Result<String, AuthError>>>>>;

async fn handle_callback(
    State(sender): State<CallbackSender>,
    Query(params): Query<CallbackParams>,
) -> (StatusCode, &'static str) {
    if params.is_empty() {
        return (StatusCode::NOT_FOUND, "");
    }

    let result = params.into_code();
    let body = match &result {
        Ok(_) => "인증이 완료되었습니다. 이 창을 닫아도 됩니다.",
        Err(_) => "인증에 실패했습니다. 터미널을 확인하세요.",
    };
    if let Some(tx) = sender.lock().await.take() {
        if tx.send(result).is_err() {
            debug!("인증 결과를 받을 쪽이 이미 종료됨");
        }
    }
    (StatusCode::OK, body)
}

/// 루프백 주소에서 첫 인증 응답을 기다린다
async fn wait_for_code(listener: TcpListener) -> AppResult<String> {
    let (tx, rx) = oneshot::channel();
    let sender: CallbackSender = Arc::new(Mutex::new(Some(tx)));

    let app = Router::new()
        .route("/", get(handle_callback))
        .with_state(sender);

    let server = tokio::spawn(async move { axum::serve(listener, app).await });

    let result = rx.await.map_err(|_| {
        AuthError::ConsentFailed("인증 응답을 받기 전에 콜백 서버가 종료되었습니다".to_string())
    });
    server.abort();
    Ok(result??)
}
