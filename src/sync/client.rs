//! HTTP Sync Client
//!
//! `RemoteStore` over a REST-like key-value endpoint:
//!
//! | op      | request               |
//! |---------|-----------------------|
//! | create  | `POST <base>`         |
//! | fetch   | `GET <base>/{code}`   |
//! | replace | `PUT <base>/{code}`   |
//! | remove  | `DELETE <base>/{code}`|
//!
//! Any non-2xx answer is an error; nothing is retried here.

use async_trait::async_trait;
use reqwest::{Response, StatusCode};

use super::wire::{HabitPayload, RemoteRecord};
use crate::codec;
use crate::config::SyncConfig;
use crate::domain::{DomainError, DomainResult, HabitList, Passcode};
use crate::repository::RemoteStore;

#[derive(Debug, Clone)]
pub struct SyncClient {
    http: reqwest::Client,
    base_url: String,
}

impl SyncClient {
    pub fn new(config: &SyncConfig) -> DomainResult<Self> {
        let builder = reqwest::Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.timeout(config.timeout());
        let http = builder
            .build()
            .map_err(|e| DomainError::Remote(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.api_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn record_url(&self, passcode: &Passcode) -> String {
        format!("{}/{}", self.base_url, passcode)
    }
}

/// Whether a failed request certainly never reached the server
fn never_sent(e: &reqwest::Error) -> bool {
    #[cfg(not(target_arch = "wasm32"))]
    {
        e.is_builder() || e.is_connect()
    }
    #[cfg(target_arch = "wasm32")]
    {
        e.is_builder()
    }
}

fn transport_error(action: &str, e: reqwest::Error) -> DomainError {
    DomainError::Remote(format!("{} failed: {}", action, e))
}

async fn ensure_success(action: &str, response: Response) -> DomainResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let body = body.trim();
    Err(DomainError::Remote(if body.is_empty() {
        format!("{} returned {}", action, status)
    } else {
        format!("{} returned {}: {}", action, status, body)
    }))
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl RemoteStore for SyncClient {
    async fn create_at(&self, passcode: &Passcode, habits: &HabitList) -> DomainResult<()> {
        let payload = HabitPayload::new(passcode, habits);
        let response = match self.http.post(&self.base_url).json(&payload).send().await {
            Ok(response) => response,
            Err(e) if never_sent(&e) => return Err(transport_error("Saving habits", e)),
            Err(e) => {
                log::warn!("Create for {} ended ambiguously: {}", passcode, e);
                return Err(DomainError::Unconfirmed {
                    passcode: passcode.to_string(),
                    reason: e.to_string(),
                });
            }
        };
        ensure_success("Saving habits", response).await?;
        log::info!("Created habit list {} with {} habits", passcode, habits.len());
        Ok(())
    }

    async fn fetch(&self, passcode: &Passcode) -> DomainResult<HabitList> {
        let response = self
            .http
            .get(self.record_url(passcode))
            .send()
            .await
            .map_err(|e| transport_error("Fetching habits", e))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(DomainError::NotFound(passcode.to_string()));
        }
        let response = ensure_success("Fetching habits", response).await?;
        let body = response
            .text()
            .await
            .map_err(|e| transport_error("Reading habits", e))?;

        let record: Option<RemoteRecord> = if body.trim().is_empty() {
            None
        } else {
            serde_json::from_str(&body)
                .map_err(|e| DomainError::Remote(format!("Unexpected response body: {}", e)))?
        };
        let entries = record
            .and_then(|record| record.habits)
            .ok_or_else(|| DomainError::NotFound(passcode.to_string()))?;

        let habits = codec::decode_all(&entries);
        if habits.len() != entries.len() {
            log::warn!(
                "Dropped {} unreadable habits from {}",
                entries.len() - habits.len(),
                passcode
            );
        }
        log::info!("Fetched {} habits for {}", habits.len(), passcode);
        Ok(habits)
    }

    async fn replace(&self, passcode: &Passcode, habits: &HabitList) -> DomainResult<()> {
        let payload = HabitPayload::new(passcode, habits);
        let response = self
            .http
            .put(self.record_url(passcode))
            .json(&payload)
            .send()
            .await
            .map_err(|e| transport_error("Updating habits", e))?;
        ensure_success("Updating habits", response).await?;
        log::info!("Replaced habit list {} with {} habits", passcode, habits.len());
        Ok(())
    }

    async fn remove(&self, passcode: &Passcode) -> DomainResult<()> {
        let response = self
            .http
            .delete(self.record_url(passcode))
            .send()
            .await
            .map_err(|e| transport_error("Deleting habits", e))?;
        ensure_success("Deleting habits", response).await?;
        log::info!("Deleted habit list {}", passcode);
        Ok(())
    }
}
