/// Google Sheets v4 REST 클라이언트
///
/// 인증은 [`Authenticator`] 에 맡기고, 요청마다 Bearer 토큰을 붙인다.
use crate::clients::{Authenticator, SheetsApi, ValueInputOption};
use crate::error::{ApiError, AppError, AppResult};
use crate::models::status::SheetInfo;
use reqwest::{Method, Url};
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use tracing::debug;

pub const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetProperties {
    sheet_id: i64,
    title: String,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<JsonValue>>,
}

/// 스프레드시트 API 클라이언트
pub struct SheetsClient {
    http: reqwest::Client,
    auth: Authenticator,
    base_url: String,
}

impl SheetsClient {
    /// 새 클라이언트 생성
    pub fn new(auth: Authenticator) -> Self {
        Self::with_base_url(auth, SHEETS_API_BASE)
    }

    /// 다른 엔드포인트 사용 (프록시/테스트 서버)
    pub fn with_base_url(auth: Authenticator, base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            auth,
            base_url: base_url.into(),
        }
    }

    /// `{base}/{spreadsheet_id}/{segments...}` 주소 생성 (세그먼트는 퍼센트 인코딩)
    fn endpoint(&self, spreadsheet_id: &str, segments: &[&str]) -> AppResult<Url> {
        let mut url = Url::parse(&self.base_url).map_err(|e| ApiError::BadStatus {
            endpoint: self.base_url.clone(),
            status: 0,
            message: e.to_string(),
        })?;
        url.path_segments_mut()
            .map_err(|_| ApiError::BadStatus {
                endpoint: self.base_url.clone(),
                status: 0,
                message: "base URL 에 경로를 붙일 수 없습니다".to_string(),
            })?
            .pop_if_empty()
            .push(spreadsheet_id)
            .extend(segments);
        Ok(url)
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<JsonValue>,
        label: &str,
    ) -> AppResult<JsonValue> {
        let token = self.auth.access_token().await?;
        debug!("📡 {} {}", label, url);

        let mut request = self.http.request(method, url).bearer_auth(token);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::api_request_failed(label, e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AppError::api_request_failed(label, e))?;

        if !status.is_success() {
            return Err(ApiError::BadStatus {
                endpoint: label.to_string(),
                status: status.as_u16(),
                message: error_message(&text),
            }
            .into());
        }

        if text.trim().is_empty() {
            return Ok(JsonValue::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}

/// 오류 응답 본문에서 메시지 추출 (`{"error": {"message": ...}}`)
fn error_message(body: &str) -> String {
    serde_json::from_str::<JsonValue>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.chars().take(200).collect())
}

impl SheetsApi for SheetsClient {
    async fn list_sheets(&self, spreadsheet_id: &str) -> AppResult<Vec<SheetInfo>> {
        let mut url = self.endpoint(spreadsheet_id, &[])?;
        url.query_pairs_mut()
            .append_pair("fields", "sheets.properties(sheetId,title)");

        let body = self.send(Method::GET, url, None, "spreadsheets.get").await?;
        let meta: SpreadsheetMeta = serde_json::from_value(body)?;

        Ok(meta
            .sheets
            .into_iter()
            .map(|s| SheetInfo {
                sheet_id: s.properties.sheet_id,
                title: s.properties.title,
            })
            .collect())
    }

    async fn get_values(&self, spreadsheet_id: &str, range: &str) -> AppResult<Vec<Vec<JsonValue>>> {
        let url = self.endpoint(spreadsheet_id, &["values", range])?;
        let body = self.send(Method::GET, url, None, "values.get").await?;
        let range: ValueRange = serde_json::from_value(body)?;
        Ok(range.values)
    }

    async fn update_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: Vec<Vec<JsonValue>>,
        input: ValueInputOption,
    ) -> AppResult<()> {
        let mut url = self.endpoint(spreadsheet_id, &["values", range])?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", input.as_str());

        let body = json!({ "range": range, "majorDimension": "ROWS", "values": values });
        self.send(Method::PUT, url, Some(body), "values.update").await?;
        Ok(())
    }

    async fn append_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: Vec<Vec<JsonValue>>,
        input: ValueInputOption,
    ) -> AppResult<()> {
        let segment = format!("{}:append", range);
        let mut url = self.endpoint(spreadsheet_id, &["values", &segment])?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", input.as_str())
            .append_pair("insertDataOption", "INSERT_ROWS");

        let body = json!({ "majorDimension": "ROWS", "values": values });
        self.send(Method::POST, url, Some(body), "values.append").await?;
        Ok(())
    }

    async fn batch_update(&self, spreadsheet_id: &str, requests: Vec<JsonValue>) -> AppResult<JsonValue> {
        let segment = format!("{}:batchUpdate", spreadsheet_id);
        let url = self.endpoint(&segment, &[])?;
        let body = json!({ "requests": requests });
        self.send(Method::POST, url, Some(body), "batchUpdate").await
    }
}
