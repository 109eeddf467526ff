// src/conversation.rs

use crate::constants::HISTORY_KEY;
use crate::errors::{FundChatError, FundChatResult};
use crate::models::Message;
use crate::storage::KeyValueStore;
use log::debug;
use std::sync::Arc;

/// Persistence for the conversation history. The chat session is the only
/// writer.
pub trait HistoryRepository: Send + Sync {
    fn load(&self) -> FundChatResult<Vec<Message>>;
    fn save(&self, history: &[Message]) -> FundChatResult<()>;
    fn clear(&self) -> FundChatResult<()>;
}

/// Keeps the whole history as one JSON blob under the `chatMessages` key.
pub struct StoredHistory {
    store: Arc<dyn KeyValueStore>,
}

impl StoredHistory {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        StoredHistory { store }
    }
}

impl HistoryRepository for StoredHistory {
    fn load(&self) -> FundChatResult<Vec<Message>> {
        match self.store.get(HISTORY_KEY)? {
            Some(json_str) => {
                let history: Vec<Message> = serde_json::from_str(&json_str).map_err(|e| {
                    FundChatError::storage_error(format!("Corrupt conversation history: {}", e))
                })?;
                debug!("Conversation history loaded ({} messages).", history.len());
                Ok(history)
            }
            None => {
                debug!("No existing conversation history found.");
                Ok(Vec::new())
            }
        }
    }

    fn save(&self, history: &[Message]) -> FundChatResult<()> {
        let json_str = serde_json::to_string(history)?;
        self.store.set(HISTORY_KEY, &json_str)?;
        debug!("Conversation history saved ({} messages).", history.len());
        Ok(())
    }

    fn clear(&self) -> FundChatResult<()> {
        self.store.remove(HISTORY_KEY)
    }
}
