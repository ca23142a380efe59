// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google Drive v3 / Sheets v4 client.
//!
//! Handles:
//! - Spreadsheet lookup by title (Drive `files.list`)
//! - Spreadsheet creation with named tabs
//! - Header writes (`values.batchUpdate`), appends, single and batched reads
//!
//! Each call authenticates with the signed-in user's access token.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::TabularStore;
use crate::error::AppError;
use crate::models::{Region, Row, StoreId};

const DRIVE_BASE_URL: &str = "https://www.googleapis.com";
const SHEETS_BASE_URL: &str = "https://sheets.googleapis.com";
const SPREADSHEET_MIME_TYPE: &str = "application/vnd.google-apps.spreadsheet";
const VALUE_INPUT_OPTION: &str = "USER_ENTERED";

/// Google Sheets-backed [`TabularStore`].
#[derive(Clone)]
pub struct GoogleSheetsStore {
    http: reqwest::Client,
    drive_base_url: String,
    sheets_base_url: String,
}

impl Default for GoogleSheetsStore {
    fn default() -> Self {
        Self::new()
    }
}

impl GoogleSheetsStore {
    pub fn new() -> Self {
        Self::with_base_urls(DRIVE_BASE_URL, SHEETS_BASE_URL)
    }

    /// Point the client at alternate API hosts (used against a mock server in tests).
    pub fn with_base_urls(drive_base_url: &str, sheets_base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            drive_base_url: drive_base_url.trim_end_matches('/').to_string(),
            sheets_base_url: sheets_base_url.trim_end_matches('/').to_string(),
        }
    }

    fn spreadsheet_url(&self, id: &StoreId) -> String {
        format!(
            "{}/v4/spreadsheets/{}",
            self.sheets_base_url,
            urlencoding::encode(id.as_str())
        )
    }

    /// Check response and parse JSON body.
    async fn check_response_json<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, AppError> {
        let response = check_status(response).await?;
        response
            .json()
            .await
            .map_err(|e| AppError::GoogleApi(format!("JSON parse error: {}", e)))
    }
}

/// Map non-success statuses onto `AppError::GoogleApi`.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, AppError> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    if status.as_u16() == 429 {
        tracing::warn!("Google API rate limit hit (429)");
        return Err(AppError::GoogleApi(AppError::GOOGLE_RATE_LIMIT.to_string()));
    }

    if status.as_u16() == 401 {
        return Err(AppError::GoogleApi(AppError::GOOGLE_TOKEN_ERROR.to_string()));
    }

    Err(AppError::GoogleApi(format!("HTTP {}: {}", status, body)))
}

/// Drive query matching a non-trashed spreadsheet by exact title.
fn title_query(name: &str) -> String {
    let escaped = name.replace('\\', "\\\\").replace('\'', "\\'");
    format!(
        "name = '{}' and mimeType = '{}' and trashed = false",
        escaped, SPREADSHEET_MIME_TYPE
    )
}

/// Cells come back as strings by default, but numbers and booleans are
/// possible when a sheet was edited by hand.
fn cell_to_string(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn into_rows(values: Option<Vec<Vec<serde_json::Value>>>) -> Vec<Row> {
    values
        .unwrap_or_default()
        .into_iter()
        .map(|row| row.into_iter().map(cell_to_string).collect())
        .collect()
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
#[serde(rename_all = "camelCase")]
struct CreatedSpreadsheet {
    spreadsheet_id: String,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    values: Option<Vec<Vec<serde_json::Value>>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BatchValueRanges {
    #[serde(default)]
    value_ranges: Vec<ValueRange>,
}

#[async_trait]
impl TabularStore for GoogleSheetsStore {
    async fn find_by_name(&self, token: &str, name: &str) -> Result<Option<StoreId>, AppError> {
        let url = format!("{}/drive/v3/files", self.drive_base_url);

        let response = self
            .http
            .get(&url)
            .bearer_auth(token)
            .query(&[
                ("q", title_query(name)),
                ("fields", "files(id, name)".to_string()),
                ("spaces", "drive".to_string()),
            ])
            .send()
            .await
            .map_err(|e| AppError::GoogleApi(e.to_string()))?;

        let list: DriveFileList = self.check_response_json(response).await?;
        Ok(list.files.into_iter().next().map(|f| StoreId::new(f.id)))
    }

    async fn create(
        &self,
        token: &str,
        name: &str,
        regions: &[Region],
    ) -> Result<StoreId, AppError> {
        let url = format!("{}/v4/spreadsheets", self.sheets_base_url);

        let sheets: Vec<serde_json::Value> = regions
            .iter()
            .map(|region| json!({ "properties": { "title": region.title() } }))
            .collect();
        let body = json!({
            "properties": { "title": name },
            "sheets": sheets,
        });

        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::GoogleApi(format!("Spreadsheet create failed: {}", e)))?;

        let created: CreatedSpreadsheet = self.check_response_json(response).await?;
        tracing::info!(store_id = %created.spreadsheet_id, title = name, "Created spreadsheet");
        Ok(StoreId::new(created.spreadsheet_id))
    }

    async fn write_headers(
        &self,
        token: &str,
        id: &StoreId,
        headers: &[(Region, Row)],
    ) -> Result<(), AppError> {
        let url = format!("{}/values:batchUpdate", self.spreadsheet_url(id));

        let data: Vec<serde_json::Value> = headers
            .iter()
            .map(|(region, header)| {
                json!({
                    "range": region.header_range(),
                    "values": [header],
                })
            })
            .collect();
        let body = json!({
            "valueInputOption": VALUE_INPUT_OPTION,
            "data": data,
        });

        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::GoogleApi(e.to_string()))?;

        check_status(response).await?;
        Ok(())
    }

    async fn append_rows(
        &self,
        token: &str,
        id: &StoreId,
        region: Region,
        rows: Vec<Row>,
    ) -> Result<(), AppError> {
        let url = format!(
            "{}/values/{}:append",
            self.spreadsheet_url(id),
            urlencoding::encode(&region.append_range())
        );

        let row_count = rows.len();
        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .query(&[
                ("valueInputOption", VALUE_INPUT_OPTION),
                ("insertDataOption", "INSERT_ROWS"),
            ])
            .json(&json!({ "values": rows }))
            .send()
            .await
            .map_err(|e| AppError::GoogleApi(e.to_string()))?;

        check_status(response).await?;
        tracing::debug!(store_id = %id, region = %region, rows = row_count, "Rows appended");
        Ok(())
    }

    async fn read_rows(
        &self,
        token: &str,
        id: &StoreId,
        range: &str,
    ) -> Result<Vec<Row>, AppError> {
        let url = format!(
            "{}/values/{}",
            self.spreadsheet_url(id),
            urlencoding::encode(range)
        );

        let response = self
            .http
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| AppError::GoogleApi(e.to_string()))?;

        let value_range: ValueRange = self.check_response_json(response).await?;
        Ok(into_rows(value_range.values))
    }

    async fn batch_read(
        &self,
        token: &str,
        id: &StoreId,
        ranges: &[String],
    ) -> Result<Vec<Vec<Row>>, AppError> {
        let url = format!("{}/values:batchGet", self.spreadsheet_url(id));
        let query: Vec<(&str, &str)> = ranges.iter().map(|r| ("ranges", r.as_str())).collect();

        let response = self
            .http
            .get(&url)
            .bearer_auth(token)
            .query(&query)
            .send()
            .await
            .map_err(|e| AppError::GoogleApi(e.to_string()))?;

        let batch: BatchValueRanges = self.check_response_json(response).await?;
        if batch.value_ranges.len() != ranges.len() {
            return Err(AppError::GoogleApi(format!(
                "batchGet returned {} ranges, expected {}",
                batch.value_ranges.len(),
                ranges.len()
            )));
        }

        Ok(batch
            .value_ranges
            .into_iter()
            .map(|vr| into_rows(vr.values))
            .collect())
    }
}
