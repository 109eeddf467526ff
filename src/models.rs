// src/models.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Who authored a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Represents a message in the conversation.
///
/// This is both the persisted history entry and the upstream wire shape.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Message {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Message {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Body of an upstream chat-completion request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Upstream models offered in the model picker.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ModelType {
    GptOss120b,
    #[default]
    GptOss20b,
    Gemma3_27bIt,
    DeepSeekChimera,
    Llama3_2_11bVision,
    Gemma3_4b,
    Gemma3_12b,
}

impl ModelType {
    pub const ALL: [ModelType; 7] = [
        ModelType::GptOss120b,
        ModelType::GptOss20b,
        ModelType::Gemma3_27bIt,
        ModelType::DeepSeekChimera,
        ModelType::Llama3_2_11bVision,
        ModelType::Gemma3_4b,
        ModelType::Gemma3_12b,
    ];

    /// Identifier sent upstream.
    pub fn id(self) -> &'static str {
        match self {
            ModelType::GptOss120b => "openai/gpt-oss-120b:free",
            ModelType::GptOss20b => "openai/gpt-oss-20b:free",
            ModelType::Gemma3_27bIt => "google/gemma-3-27b-it:free",
            ModelType::DeepSeekChimera => "tngtech/deepseek-r1t2-chimera:free",
            ModelType::Llama3_2_11bVision => "meta-llama/llama-3.2-11b-vision-instruct:free",
            ModelType::Gemma3_4b => "google/gemma-3-4b-it:free",
            ModelType::Gemma3_12b => "google/gemma-3-12b-it:free",
        }
    }

    /// Human-readable name for the picker.
    pub fn label(self) -> &'static str {
        match self {
            ModelType::GptOss120b => "OpenAI gpt OSS-120b",
            ModelType::GptOss20b => "OpenAI gpt Oss 20b",
            ModelType::Gemma3_27bIt => "Google Gemma 3 27b it",
            ModelType::DeepSeekChimera => "DeepSeek Chimera",
            ModelType::Llama3_2_11bVision => "Llama 3 2 11B Vision",
            ModelType::Gemma3_4b => "Gemma 3 4B",
            ModelType::Gemma3_12b => "Gemma 3 12B",
        }
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for ModelType {
    type Err = String;

    /// Accepts either the upstream id or the label (case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        ModelType::ALL
            .into_iter()
            .find(|m| m.id() == needle || m.label().eq_ignore_ascii_case(needle))
            .ok_or_else(|| format!("Unknown model: {}", needle))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Admin,
    Auditor,
    ComplianceOfficer,
    FundManager,
}

/// Current user as returned by `GET /auth/profile`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Fund {
    #[serde(default)]
    pub id: Option<String>,
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocType {
    QuarterlyReport,
    AnnualReport,
    Kiid,
    Factsheet,
    LegalContract,
    #[serde(other)]
    Unknown,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocStatus {
    Pending,
    InReview,
    Approved,
    Rejected,
    Archived,
    #[serde(other)]
    Unknown,
}

/// Document metadata record from `GET /documents`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub doc_type: DocType,
    #[serde(default)]
    pub fund_id: Option<String>,
    #[serde(default)]
    pub fund: Option<Fund>,
    #[serde(default)]
    pub status: Option<DocStatus>,
    #[serde(default)]
    pub period_start: Option<String>,
    #[serde(default)]
    pub period_end: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// An entry in the document picker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentOption {
    pub label: String,
    pub value: String,
}

impl From<&DocumentMetadata> for DocumentOption {
    fn from(doc: &DocumentMetadata) -> Self {
        DocumentOption {
            label: doc.title.clone(),
            value: doc.id.clone(),
        }
    }
}

/// Logs details of each API call.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiCallLog {
    pub timestamp: DateTime<Utc>,
    pub endpoint: String,
    pub request_summary: String,
    pub response_status: u16,
    pub response_time_ms: u128,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_wire_shape() {
        let value = serde_json::to_value(Message::user("Hello")).unwrap();
        assert_eq!(value, json!({ "role": "user", "content": "Hello" }));
    }

    #[test]
    fn test_request_wire_shape() {
        let request = ChatCompletionRequest {
            model: "m1".to_string(),
            messages: vec![Message::user("Hello")],
            temperature: 0.7,
            max_tokens: 500,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["model"], "m1");
        assert_eq!(value["max_tokens"], 500);
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value.as_object().unwrap().len(), 4);
    }

    #[test]
    fn test_model_parse_by_id_and_label() {
        assert_eq!(
            "google/gemma-3-4b-it:free".parse::<ModelType>(),
            Ok(ModelType::Gemma3_4b)
        );
        assert_eq!(
            "deepseek chimera".parse::<ModelType>(),
            Ok(ModelType::DeepSeekChimera)
        );
        assert!("gpt-9".parse::<ModelType>().is_err());
        assert_eq!(ModelType::default().id(), crate::constants::DEFAULT_MODEL);
    }

    #[test]
    fn test_document_metadata_tolerates_partial_records() {
        let doc: DocumentMetadata = serde_json::from_value(json!({
            "id": "d1",
            "title": "Q1 Report",
            "type": "QUARTERLY_REPORT",
            "fund": { "name": "Alpha Fund", "code": "ALF" },
            "status": "IN_REVIEW",
            "periodStart": "2024-01-01"
        }))
        .unwrap();

        assert_eq!(doc.doc_type, DocType::QuarterlyReport);
        assert_eq!(doc.status, Some(DocStatus::InReview));
        assert_eq!(doc.fund.as_ref().map(|f| f.code.as_str()), Some("ALF"));
        assert_eq!(
            DocumentOption::from(&doc),
            DocumentOption {
                label: "Q1 Report".to_string(),
                value: "d1".to_string()
            }
        );
    }

    #[test]
    fn test_unrecognised_type_and_status_map_to_unknown() {
        let doc: DocumentMetadata = serde_json::from_value(json!({
            "id": "d2",
            "title": "Prospectus",
            "type": "PROSPECTUS",
            "status": "SUPERSEDED"
        }))
        .unwrap();

        assert_eq!(doc.doc_type, DocType::Unknown);
        assert_eq!(doc.status, Some(DocStatus::Unknown));
    }

    #[test]
    fn test_user_role_wire_names() {
        let profile: UserProfile = serde_json::from_value(json!({
            "id": "u1",
            "email": "a@b.c",
            "name": "Ana",
            "role": "COMPLIANCE_OFFICER"
        }))
        .unwrap();
        assert_eq!(profile.role, UserRole::ComplianceOfficer);
        assert_eq!(profile.status, None);
    }
}
