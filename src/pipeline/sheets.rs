//! Master-curriculum fetch from Google Sheets.
//!
//! ## Flow
//!
//! ```text
//! service-account key ──▶ signed JWT ──▶ token endpoint ──▶ access token
//!                                                              │
//!   Drive files.list (name = title) ◀──────────────────────────┤
//!   Sheets spreadsheets.get (sheet titles) ◀───────────────────┤
//!   Sheets values.get ('Worksheet') ◀──────────────────────────┘
//! ```
//!
//! Spreadsheets and worksheets are addressed by their human-readable titles,
//! the same way the form asks for them. The whole worksheet is loaded into
//! memory; there is no pagination.

use crate::config::{ComparisonConfig, DEFAULT_TOKEN_URI};
use crate::error::SheetError;
use crate::secrets::{ServiceAccountKey, SHEETS_SCOPES};
use async_trait::async_trait;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Rows × cells, mirroring the worksheet layout.
pub type SheetGrid = Vec<Vec<String>>;

/// Anything that can fetch all values of a named worksheet.
#[async_trait]
pub trait SheetSource: Send + Sync {
    async fn fetch(
        &self,
        credentials: &ServiceAccountKey,
        spreadsheet: &str,
        worksheet: &str,
    ) -> Result<SheetGrid, SheetError>;
}

/// Google Drive + Sheets REST client.
#[derive(Debug, Clone)]
pub struct GoogleSheetsClient {
    http: reqwest::Client,
    drive_base_url: String,
    sheets_base_url: String,
}

impl GoogleSheetsClient {
    pub fn new(config: &ComparisonConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    pub fn with_client(http: reqwest::Client, config: &ComparisonConfig) -> Self {
        Self {
            http,
            drive_base_url: config.drive_base_url.trim_end_matches('/').to_string(),
            sheets_base_url: config.sheets_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Exchange a signed JWT for a bearer token (OAuth2 JWT-bearer grant).
    async fn access_token(&self, key: &ServiceAccountKey) -> Result<String, SheetError> {
        let token_uri = key.token_uri.as_deref().unwrap_or(DEFAULT_TOKEN_URI);
        let assertion = sign_assertion(key, token_uri, chrono::Utc::now().timestamp())?;

        let response = self
            .http
            .post(token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SheetError::Auth(format!("HTTP {}: {}", status.as_u16(), body)));
        }

        let token: TokenResponse = response.json().await?;
        debug!("Obtained access token (expires in {:?}s)", token.expires_in);
        Ok(token.access_token)
    }

    /// Resolve a spreadsheet title to its file id.
    async fn spreadsheet_id(&self, token: &str, name: &str) -> Result<String, SheetError> {
        let url = format!("{}/files", self.drive_base_url);
        let query = drive_query(name);
        let response = self
            .http
            .get(&url)
            .bearer_auth(token)
            .query(&[
                ("q", query.as_str()),
                ("fields", "files(id,name)"),
                ("supportsAllDrives", "true"),
                ("includeItemsFromAllDrives", "true"),
            ])
            .send()
            .await?;
        let list: DriveFileList = check_status("drive.files.list", response)
            .await?
            .json()
            .await?;

        list.files
            .into_iter()
            .next()
            .map(|f| f.id)
            .ok_or_else(|| SheetError::SpreadsheetNotFound {
                name: name.to_string(),
            })
    }

    /// Titles of every worksheet in the spreadsheet.
    async fn worksheet_titles(&self, token: &str, id: &str) -> Result<Vec<String>, SheetError> {
        let url = format!("{}/spreadsheets/{}", self.sheets_base_url, id);
        let response = self
            .http
            .get(&url)
            .bearer_auth(token)
            .query(&[("fields", "sheets.properties.title")])
            .send()
            .await?;
        let meta: SpreadsheetMeta = check_status("sheets.spreadsheets.get", response)
            .await?
            .json()
            .await?;
        Ok(meta.sheets.into_iter().map(|s| s.properties.title).collect())
    }

    async fn values(&self, token: &str, id: &str, worksheet: &str) -> Result<SheetGrid, SheetError> {
        let url = format!(
            "{}/spreadsheets/{}/values/{}",
            self.sheets_base_url,
            id,
            urlencoding::encode(&worksheet_range(worksheet))
        );
        let response = self.http.get(&url).bearer_auth(token).send().await?;
        let range: ValueRange = check_status("sheets.values.get", response)
            .await?
            .json()
            .await?;
        Ok(pad_rows(range.values))
    }
}

#[async_trait]
impl SheetSource for GoogleSheetsClient {
    async fn fetch(
        &self,
        credentials: &ServiceAccountKey,
        spreadsheet: &str,
        worksheet: &str,
    ) -> Result<SheetGrid, SheetError> {
        info!("Fetching worksheet '{}' of '{}'", worksheet, spreadsheet);
        let token = self.access_token(credentials).await?;
        let id = self.spreadsheet_id(&token, spreadsheet).await?;

        let titles = self.worksheet_titles(&token, &id).await?;
        if !titles.iter().any(|t| t == worksheet) {
            return Err(SheetError::WorksheetNotFound {
                spreadsheet: spreadsheet.to_string(),
                worksheet: worksheet.to_string(),
            });
        }

        let grid = self.values(&token, &id, worksheet).await?;
        info!(
            "Fetched {} rows × {} columns",
            grid.len(),
            grid.first().map(Vec::len).unwrap_or(0)
        );
        Ok(grid)
    }
}

// ── Wire types ────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: String,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct DriveFileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
}

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
struct SheetProperties {
    title: String,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    /// Absent when the worksheet is empty.
    #[serde(default)]
    values: Vec<Vec<String>>,
}

// ── Helpers ───────────────────────────────────────────────────────────────

/// Build the signed RS256 assertion for the token exchange.
fn sign_assertion(key: &ServiceAccountKey, token_uri: &str, now: i64) -> Result<String, SheetError> {
    let claims = Claims {
        iss: &key.client_email,
        scope: SHEETS_SCOPES.join(" "),
        aud: token_uri,
        iat: now,
        exp: now + 3600,
    };
    let mut header = Header::new(Algorithm::RS256);
    header.kid = key.private_key_id.clone();

    let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
        .map_err(|e| SheetError::Auth(format!("invalid private key: {}", e)))?;
    jsonwebtoken::encode(&header, &claims, &encoding_key)
        .map_err(|e| SheetError::Auth(format!("failed to sign assertion: {}", e)))
}

async fn check_status(
    endpoint: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response, SheetError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(SheetError::Status {
        endpoint,
        status: status.as_u16(),
        body,
    })
}

/// Drive search expression matching a spreadsheet by exact title.
pub fn drive_query(name: &str) -> String {
    let escaped = name.replace('\\', "\\\\").replace('\'', "\\'");
    format!(
        "name = '{}' and mimeType = 'application/vnd.google-apps.spreadsheet' and trashed = false",
        escaped
    )
}

/// A1 range covering a whole worksheet: the quoted title.
pub fn worksheet_range(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

/// Right-pad every row with empty cells to the widest row.
///
/// The values API trims trailing empty cells per row; padding restores the
/// rectangular layout of the worksheet.
pub fn pad_rows(mut rows: SheetGrid) -> SheetGrid {
    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    for row in &mut rows {
        row.resize(width, String::new());
    }
    rows
}

/// Render the grid as pipe-separated lines for a prompt.
pub fn render_grid(grid: &SheetGrid) -> String {
    grid.iter()
        .map(|row| row.join(" | ").trim_end_matches([' ', '|']).to_string())
        .collect::<Vec<_>>()
        .join("\n")
}
