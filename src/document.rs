// src/document.rs

use crate::constants::{DOCUMENT_LIST_FAILED, DOCUMENT_LOAD_FAILED};
use crate::errors::FundChatError;
use crate::models::DocumentOption;
use crate::notify::Notifier;
use crate::session_store::{DocumentSource, SessionStoreClient};
use log::{debug, warn};
use std::sync::Arc;

/// Returns at most the first `max_chars` characters of `text`.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Downloads a document and turns it into prompt-sized text.
pub struct DocumentTextLoader {
    source: Arc<dyn DocumentSource>,
    notifier: Arc<dyn Notifier>,
    max_chars: usize,
}

impl DocumentTextLoader {
    pub fn new(
        source: Arc<dyn DocumentSource>,
        notifier: Arc<dyn Notifier>,
        max_chars: usize,
    ) -> Self {
        DocumentTextLoader {
            source,
            notifier,
            max_chars,
        }
    }

    /// Never fails: a download error becomes an empty string plus a
    /// notification. Longer text is cut silently.
    pub async fn load(&self, document_id: &str) -> String {
        match self.source.download_document(document_id).await {
            Ok(bytes) => {
                let text = String::from_utf8_lossy(&bytes);
                let truncated = truncate_chars(&text, self.max_chars);
                debug!(
                    "Loaded document {} ({} of {} bytes kept)",
                    document_id,
                    truncated.len(),
                    text.len()
                );
                truncated.to_string()
            }
            Err(e) => {
                warn!("Failed to load document {}: {}", document_id, e);
                self.notifier.error(DOCUMENT_LOAD_FAILED);
                String::new()
            }
        }
    }
}

/// Fetches the document picker entries. On failure the user is notified and
/// `None` is returned so the picker stays hidden until the next attempt.
pub async fn fetch_document_options(
    client: &SessionStoreClient,
    notifier: &dyn Notifier,
) -> Option<Vec<DocumentOption>> {
    match client.list_documents().await {
        Ok(documents) => Some(documents.iter().map(DocumentOption::from).collect()),
        Err(e) => {
            warn!("Failed to load documents: {}", e);
            let message = match e {
                FundChatError::Rejected {
                    message: Some(message),
                    ..
                } => message,
                _ => DOCUMENT_LIST_FAILED.to_string(),
            };
            notifier.error(&message);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::MAX_DOCUMENT_CHARS;
    use crate::errors::FundChatResult;
    use crate::notify::{Level, RecordingNotifier};
    use crate::storage::MemoryStore;
    use async_trait::async_trait;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::{
        matchers::{method, path},
        Mock, MockServer, ResponseTemplate,
    };

    struct FixedSource(FundChatResult<Vec<u8>>);

    #[async_trait]
    impl DocumentSource for FixedSource {
        async fn download_document(&self, _id: &str) -> FundChatResult<Vec<u8>> {
            match &self.0 {
                Ok(bytes) => Ok(bytes.clone()),
                Err(_) => Err(FundChatError::api_error("boom")),
            }
        }
    }

    fn loader(source: FixedSource, notifier: Arc<RecordingNotifier>) -> DocumentTextLoader {
        DocumentTextLoader::new(Arc::new(source), notifier, MAX_DOCUMENT_CHARS)
    }

    #[test]
    fn test_truncate_chars_keeps_short_text_identical() {
        assert_eq!(truncate_chars("abc", 3), "abc");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("", 10), "");
    }

    #[test]
    fn test_truncate_chars_cuts_on_char_boundary() {
        assert_eq!(truncate_chars("abcdef", 4), "abcd");
        assert_eq!(truncate_chars("żółw", 2), "żó");
    }

    #[tokio::test]
    async fn test_load_returns_min_of_length_and_budget() {
        let notifier = Arc::new(RecordingNotifier::new());

        let long = "x".repeat(MAX_DOCUMENT_CHARS + 500);
        let text = loader(FixedSource(Ok(long.into_bytes())), notifier.clone())
            .load("d1")
            .await;
        assert_eq!(text.chars().count(), MAX_DOCUMENT_CHARS);

        let exact = "y".repeat(MAX_DOCUMENT_CHARS);
        let text = loader(FixedSource(Ok(exact.clone().into_bytes())), notifier.clone())
            .load("d2")
            .await;
        assert_eq!(text, exact);

        assert!(notifier.messages().is_empty());
    }

    #[tokio::test]
    async fn test_load_replaces_invalid_utf8() {
        let notifier = Arc::new(RecordingNotifier::new());
        let text = loader(FixedSource(Ok(vec![b'o', b'k', 0xff])), notifier)
            .load("d1")
            .await;
        assert_eq!(text, "ok\u{fffd}");
    }

    #[tokio::test]
    async fn test_load_failure_is_swallowed_and_notified() {
        let notifier = Arc::new(RecordingNotifier::new());
        let text = loader(
            FixedSource(Err(FundChatError::api_error("boom"))),
            notifier.clone(),
        )
        .load("missing")
        .await;

        assert_eq!(text, "");
        assert_eq!(
            notifier.messages(),
            vec![(Level::Error, DOCUMENT_LOAD_FAILED.to_string())]
        );
    }

    #[tokio::test]
    async fn test_fetch_document_options_maps_title_and_id() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/documents"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "id": "d1", "title": "Factsheet", "type": "FACTSHEET" }
            ])))
            .mount(&server)
            .await;

        let client = SessionStoreClient::new(
            server.uri(),
            Arc::new(MemoryStore::new()),
            Duration::from_secs(5),
        )
        .unwrap();
        let notifier = RecordingNotifier::new();
        let options = fetch_document_options(&client, &notifier).await.unwrap();

        assert_eq!(
            options,
            vec![DocumentOption {
                label: "Factsheet".to_string(),
                value: "d1".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn test_fetch_document_options_notifies_server_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/documents"))
            .respond_with(
                ResponseTemplate::new(403).set_body_json(json!({ "message": "Forbidden fund" })),
            )
            .mount(&server)
            .await;

        let client = SessionStoreClient::new(
            server.uri(),
            Arc::new(MemoryStore::new()),
            Duration::from_secs(5),
        )
        .unwrap();
        let notifier = RecordingNotifier::new();

        assert!(fetch_document_options(&client, &notifier).await.is_none());
        assert_eq!(
            notifier.messages(),
            vec![(Level::Error, "Forbidden fund".to_string())]
        );
    }
}
