// src/gateway.rs

use crate::constants::{CHAT_ROUTE, NO_RESPONSE};
use crate::errors::{FundChatError, FundChatResult};
use crate::logging::log_api_call;
use crate::models::{ApiCallLog, ChatCompletionRequest};
use async_trait::async_trait;
use chrono::Utc;
use log::debug;
use reqwest::Client;
use serde_json::Value;
use std::time::{Duration, Instant};

/// Sends a chat-completion request and returns the raw response body.
#[async_trait]
pub trait ChatGateway: Send + Sync {
    async fn complete(&self, request: &ChatCompletionRequest) -> FundChatResult<Value>;
}

/// Talks to the proxy's `POST /api/chat`. The client never sees the
/// upstream credential.
pub struct HttpGateway {
    client: Client,
    endpoint: String,
}

impl HttpGateway {
    pub fn new(proxy_url: &str, timeout: Duration) -> FundChatResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(HttpGateway {
            client,
            endpoint: format!("{}{}", proxy_url.trim_end_matches('/'), CHAT_ROUTE),
        })
    }
}

#[async_trait]
impl ChatGateway for HttpGateway {
    async fn complete(&self, request: &ChatCompletionRequest) -> FundChatResult<Value> {
        let start_time = Instant::now();
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| FundChatError::api_error(format!("Request failed: {}", e)))?;

        let status = response.status();
        log_api_call(&ApiCallLog {
            timestamp: Utc::now(),
            endpoint: CHAT_ROUTE.to_string(),
            request_summary: format!(
                "chat model={} messages={}",
                request.model,
                request.messages.len()
            ),
            response_status: status.as_u16(),
            response_time_ms: start_time.elapsed().as_millis(),
        });

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            debug!("Proxy error body: {}", error_text);
            return Err(FundChatError::api_error(format!(
                "API request failed: {}",
                status
            )));
        }

        response
            .json()
            .await
            .map_err(|e| FundChatError::api_error(format!("Failed to parse API response: {}", e)))
    }
}

/// Pulls the assistant text out of a completion response.
///
/// Falls back from the first choice's `content` to its `reasoning`, then to
/// a fixed placeholder; a malformed body is never an error.
pub fn extract_reply(body: &Value) -> String {
    let message = &body["choices"][0]["message"];

    let non_blank = |v: &Value| {
        v.as_str()
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string)
    };

    non_blank(&message["content"])
        .or_else(|| non_blank(&message["reasoning"]))
        .unwrap_or_else(|| NO_RESPONSE.to_string())
}
