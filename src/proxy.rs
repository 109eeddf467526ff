// src/proxy.rs

use crate::config::Config;
use crate::constants::{API_KEY_ENV, CHAT_ROUTE};
use crate::errors::{FundChatError, FundChatResult};
use crate::logging::log_api_call;
use crate::models::ApiCallLog;
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use chrono::Utc;
use log::{error, info, warn};
use reqwest::{header::CONTENT_TYPE, Client};
use serde_json::{json, Value};
use std::env;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Where the upstream bearer credential comes from.
///
/// Resolution happens per request and fails closed: there is no fallback
/// value.
#[derive(Clone)]
pub enum CredentialSource {
    /// Read the named environment variable on every request.
    Env(String),
    /// A value handed over by the embedding process (secret manager, tests).
    Static(Arc<str>),
}

impl CredentialSource {
    pub fn from_env() -> Self {
        CredentialSource::Env(API_KEY_ENV.to_string())
    }

    pub fn resolve(&self) -> FundChatResult<String> {
        self.resolve_with(|var| env::var(var).ok())
    }

    /// Resolves against `lookup` instead of the process environment.
    pub fn resolve_with<F>(&self, lookup: F) -> FundChatResult<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = match self {
            CredentialSource::Env(var) => lookup(var),
            CredentialSource::Static(value) => Some(value.to_string()),
        };
        match value {
            Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
            _ => Err(FundChatError::Credential),
        }
    }
}

impl fmt::Debug for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::Env(var) => f.debug_tuple("Env").field(var).finish(),
            CredentialSource::Static(_) => f.write_str("Static(<redacted>)"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ProxyState {
    client: Client,
    upstream_url: String,
    credential: CredentialSource,
}

impl ProxyState {
    pub fn new(
        upstream_url: impl Into<String>,
        credential: CredentialSource,
        timeout: Duration,
    ) -> FundChatResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(ProxyState {
            client,
            upstream_url: upstream_url.into(),
            credential,
        })
    }
}

pub fn router(state: ProxyState) -> Router {
    Router::new()
        .route(CHAT_ROUTE, post(chat_completion))
        .with_state(state)
}

/// `POST /api/chat`: forwards the body upstream with the server-side
/// credential attached. Upstream status is flattened to 200; any failure
/// becomes `{ "error": message }` with 500.
async fn chat_completion(State(state): State<ProxyState>, body: Bytes) -> Response {
    match forward(&state, body).await {
        Ok(data) => Json(data).into_response(),
        Err(e) => {
            error!("Upstream API error: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

async fn forward(state: &ProxyState, body: Bytes) -> FundChatResult<Value> {
    let payload: Value = serde_json::from_slice(&body)?;
    let api_key = state.credential.resolve()?;

    let start_time = Instant::now();
    let response = state
        .client
        .post(&state.upstream_url)
        .bearer_auth(api_key)
        .header(CONTENT_TYPE, "application/json")
        .body(body.to_vec())
        .send()
        .await?;

    let status = response.status();
    log_api_call(&ApiCallLog {
        timestamp: Utc::now(),
        endpoint: CHAT_ROUTE.to_string(),
        request_summary: format!("forward model={}", payload["model"].as_str().unwrap_or("?")),
        response_status: status.as_u16(),
        response_time_ms: start_time.elapsed().as_millis(),
    });
    if !status.is_success() {
        warn!("Upstream returned {}, passing body through", status);
    }

    Ok(response.json::<Value>().await?)
}

/// Binds `listen_addr` and serves the proxy until Ctrl-C.
pub async fn serve(config: &Config) -> FundChatResult<()> {
    let credential = CredentialSource::from_env();
    if credential.resolve().is_err() {
        warn!(
            "{} is not set; chat requests will be rejected until it is",
            API_KEY_ENV
        );
    }

    let state = ProxyState::new(
        config.upstream_url.clone(),
        credential,
        Duration::from_secs(config.request_timeout_secs),
    )?;

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    info!("Proxy listening on {}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Proxy stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
}
