use super::{SheetsGateway, SheetsResponse, SyncError};
use crate::config::SheetsConfig;
use crate::escalas::ScheduleEntry;
use reqwest::header::CONTENT_TYPE;
use tracing::debug;

/// reqwest-backed client for the Apps Script web app.
#[derive(Debug, Clone)]
pub struct SheetsClient {
    http: reqwest::Client,
    api_url: String,
}

impl SheetsClient {
    pub fn from_config(config: &SheetsConfig) -> Result<Self, SyncError> {
        let api_url = config.require_api_url()?.to_string();
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| SyncError::Transport(err.to_string()))?;
        Ok(Self { http, api_url })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }
}

impl SheetsGateway for SheetsClient {
    async fn fetch(&self, unit: &str) -> Result<SheetsResponse, SyncError> {
        // `t` busts intermediate caches the same way the web client does.
        let nonce = chrono::Utc::now().timestamp_millis().to_string();
        debug!(unit, "fetching schedules from sheets");

        let response = self
            .http
            .get(&self.api_url)
            .query(&[("unidade", unit), ("t", nonce.as_str())])
            .send()
            .await
            .map_err(|err| SyncError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::Upstream {
                status: status.as_u16(),
            });
        }

        response
            .json::<SheetsResponse>()
            .await
            .map_err(|err| SyncError::Decode(err.to_string()))
    }

    /// Posts one entry. The web client posts blind and never sees a status;
    /// here a non-2xx answer counts as a failed submission, so the caller
    /// keeps the draft. The response body is not read.
    async fn submit(&self, entry: &ScheduleEntry) -> Result<(), SyncError> {
        let body = serde_json::to_string(entry).map_err(SyncError::Encode)?;

        let response = self
            .http
            .post(&self.api_url)
            .header(CONTENT_TYPE, mime::TEXT_PLAIN_UTF_8.as_ref())
            .body(body)
            .send()
            .await
            .map_err(|err| SyncError::Transport(err.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(SyncError::Upstream {
                status: status.as_u16(),
            })
        }
    }
}
