// src/session_store.rs

use crate::constants::{DOCUMENTS_PATH, PROFILE_PATH, TOKEN_KEY};
use crate::errors::{FundChatError, FundChatResult};
use crate::logging::log_api_call;
use crate::models::{ApiCallLog, DocumentMetadata, UserProfile};
use crate::storage::KeyValueStore;
use async_trait::async_trait;
use chrono::Utc;
use log::{debug, warn};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Anything that can hand over the raw bytes of a document.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    async fn download_document(&self, id: &str) -> FundChatResult<Vec<u8>>;
}

/// HTTP client for the backend that owns users and documents.
///
/// Every call carries the stored session token (key `token`) as a bearer
/// credential when one is present.
#[derive(Clone)]
pub struct SessionStoreClient {
    client: Client,
    base_url: String,
    store: Arc<dyn KeyValueStore>,
}

impl SessionStoreClient {
    pub fn new(
        base_url: impl Into<String>,
        store: Arc<dyn KeyValueStore>,
        timeout: Duration,
    ) -> FundChatResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(SessionStoreClient {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            store,
        })
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    /// `GET /auth/profile`
    pub async fn profile(&self) -> FundChatResult<UserProfile> {
        let response = self.get(PROFILE_PATH, "profile").await?;
        parse_json(response).await
    }

    /// `GET /documents`, retried once on failure. An expired session is not
    /// retried.
    pub async fn list_documents(&self) -> FundChatResult<Vec<DocumentMetadata>> {
        match self.fetch_documents().await {
            Ok(documents) => Ok(documents),
            Err(FundChatError::Unauthorized) => Err(FundChatError::Unauthorized),
            Err(e) => {
                warn!("Document list failed, retrying once: {}", e);
                self.fetch_documents().await
            }
        }
    }

    async fn fetch_documents(&self) -> FundChatResult<Vec<DocumentMetadata>> {
        let response = self.get(DOCUMENTS_PATH, "list documents").await?;
        parse_json(response).await
    }

    async fn get(&self, path: &str, summary: &str) -> FundChatResult<Response> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.get(&url);
        if let Some(token) = self.store.get(TOKEN_KEY)? {
            request = request.bearer_auth(token);
        }

        let start_time = Instant::now();
        let response = request.send().await?;

        log_api_call(&ApiCallLog {
            timestamp: Utc::now(),
            endpoint: path.to_string(),
            request_summary: summary.to_string(),
            response_status: response.status().as_u16(),
            response_time_ms: start_time.elapsed().as_millis(),
        });

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(FundChatError::Unauthorized);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| v["message"].as_str().map(str::to_string));
            debug!("{} returned {}: {}", path, status, body);
            return Err(FundChatError::Rejected {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl DocumentSource for SessionStoreClient {
    /// `GET /documents/{id}/download`
    async fn download_document(&self, id: &str) -> FundChatResult<Vec<u8>> {
        let path = format!("{}/{}/download", DOCUMENTS_PATH, id);
        let response = self.get(&path, "download document").await?;
        Ok(response.bytes().await?.to_vec())
    }
}

async fn parse_json<T: DeserializeOwned>(response: Response) -> FundChatResult<T> {
    let body = response.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
}
