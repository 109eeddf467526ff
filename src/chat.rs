// src/chat.rs

use crate::config::Config;
use crate::constants::{
    DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE, DOCUMENT_PREFIX, QUESTION_SEPARATOR,
};
use crate::conversation::HistoryRepository;
use crate::document::DocumentTextLoader;
use crate::errors::{FundChatError, FundChatResult};
use crate::gateway::{extract_reply, ChatGateway};
use crate::models::{ChatCompletionRequest, Message, ModelType};
use log::{debug, warn};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Where the session is in its send cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    Idle,
    Sending,
    /// The last exchange failed; cleared by the next submit or a clear.
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChatSettings {
    pub model: ModelType,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for ChatSettings {
    fn default() -> Self {
        ChatSettings {
            model: ModelType::default(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

impl ChatSettings {
    pub fn from_config(config: &Config) -> FundChatResult<Self> {
        let model = config
            .default_model
            .parse::<ModelType>()
            .map_err(FundChatError::config_error)?;
        Ok(ChatSettings {
            model,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }
}

/// The currently selected document. `generation` moves on every selection
/// change so a load that finishes late can tell it is stale.
#[derive(Debug, Default)]
struct DocumentSelection {
    generation: u64,
    document_id: Option<String>,
    text: String,
}

/// Builds the user turn sent upstream, framing the question with the
/// document text when there is any.
pub fn compose_user_content(user_text: &str, document_text: &str) -> String {
    if document_text.is_empty() {
        user_text.to_string()
    } else {
        format!(
            "{}{}{}{}",
            DOCUMENT_PREFIX, document_text, QUESTION_SEPARATOR, user_text
        )
    }
}

/// One user's conversation: history, model choice, the optional attached
/// document and the pending input.
///
/// `submit` takes `&mut self`, so a second send cannot start while one is
/// in flight.
pub struct ChatSession {
    gateway: Arc<dyn ChatGateway>,
    history: Arc<dyn HistoryRepository>,
    loader: Arc<DocumentTextLoader>,
    settings: ChatSettings,
    messages: Vec<Message>,
    input: String,
    selection: Arc<Mutex<DocumentSelection>>,
    status: SessionStatus,
}

impl ChatSession {
    /// Creates the session and reads the persisted history once.
    pub fn mount(
        gateway: Arc<dyn ChatGateway>,
        history: Arc<dyn HistoryRepository>,
        loader: Arc<DocumentTextLoader>,
        settings: ChatSettings,
    ) -> Self {
        let messages = history.load().unwrap_or_else(|e| {
            warn!("Starting with empty history: {}", e);
            Vec::new()
        });

        ChatSession {
            gateway,
            history,
            loader,
            settings,
            messages,
            input: String::new(),
            selection: Arc::new(Mutex::new(DocumentSelection::default())),
            status: SessionStatus::Idle,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn status(&self) -> &SessionStatus {
        &self.status
    }

    pub fn model(&self) -> ModelType {
        self.settings.model
    }

    pub fn set_model(&mut self, model: ModelType) {
        debug!("Model set to {}", model);
        self.settings.model = model;
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    pub async fn selected_document(&self) -> Option<String> {
        self.selection.lock().await.document_id.clone()
    }

    pub async fn document_text(&self) -> String {
        self.selection.lock().await.text.clone()
    }

    /// Changes the attached document and starts loading its text.
    ///
    /// Any previously loaded text is dropped immediately. The returned
    /// handle resolves once the load has finished; its result is applied
    /// only if no other selection happened in the meantime. `None` (or an
    /// empty id) detaches the document.
    pub async fn select_document(&self, document_id: Option<String>) -> Option<JoinHandle<()>> {
        let document_id = document_id.filter(|id| !id.is_empty());

        let generation = {
            let mut selection = self.selection.lock().await;
            selection.generation += 1;
            selection.document_id = document_id.clone();
            selection.text.clear();
            selection.generation
        };

        let id = document_id?;
        let loader = Arc::clone(&self.loader);
        let selection = Arc::clone(&self.selection);

        Some(tokio::spawn(async move {
            let text = loader.load(&id).await;
            let mut selection = selection.lock().await;
            if selection.generation == generation {
                selection.text = text;
            } else {
                debug!("Discarding stale load of document {}", id);
            }
        }))
    }

    /// Sends the pending input.
    pub async fn submit_input(&mut self) -> FundChatResult<Option<String>> {
        let text = self.input.clone();
        self.submit(&text).await
    }

    /// Sends one user message and records the exchange.
    ///
    /// Returns `Ok(None)` for blank input. On success the user's own words
    /// (without document framing) and the reply are appended and persisted,
    /// and the input and document selection are reset. On failure nothing is
    /// recorded and the input is kept.
    pub async fn submit(&mut self, user_text: &str) -> FundChatResult<Option<String>> {
        if user_text.trim().is_empty() {
            return Ok(None);
        }

        let document_text = self.document_text().await;
        let mut outgoing = self.messages.clone();
        outgoing.push(Message::user(compose_user_content(
            user_text,
            &document_text,
        )));

        let request = ChatCompletionRequest {
            model: self.settings.model.id().to_string(),
            messages: outgoing,
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
        };

        self.status = SessionStatus::Sending;
        let result = self.exchange(user_text, &request).await;

        match result {
            Ok(reply) => {
                self.status = SessionStatus::Idle;
                self.input.clear();
                self.select_document(None).await;
                Ok(Some(reply))
            }
            Err(e) => {
                warn!("Chat exchange failed: {}", e);
                self.status = SessionStatus::Failed(e.to_string());
                Err(e)
            }
        }
    }

    async fn exchange(
        &mut self,
        user_text: &str,
        request: &ChatCompletionRequest,
    ) -> FundChatResult<String> {
        let body = self.gateway.complete(request).await?;
        let reply = extract_reply(&body);

        let mut updated = self.messages.clone();
        updated.push(Message::user(user_text));
        updated.push(Message::assistant(reply.clone()));

        // Only commit in memory what made it to storage.
        self.history.save(&updated)?;
        self.messages = updated;
        Ok(reply)
    }

    /// Forgets everything: persisted history, messages, input and document.
    pub async fn clear(&mut self) -> FundChatResult<()> {
        self.messages.clear();
        self.input.clear();
        self.status = SessionStatus::Idle;
        self.select_document(None).await;
        self.history.clear()
    }
}
