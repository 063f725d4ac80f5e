use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::errors::FailureKind;

/// Model used when the configuration does not name one
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Attachments are always sent to the remote service as JPEG, regardless of
/// the source format.
pub const IMAGE_MIME_TYPE: &str = "image/jpeg";

/// Helper struct to encapsulate model details
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ModelHandle {
    pub api_key: String,
    pub model_name: String,
}

impl ModelHandle {
    pub fn new(api_key: String, model_name: Option<String>) -> Self {
        Self {
            api_key,
            model_name: model_name.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        }
    }
}

/// Author of a conversation turn, in the application vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

impl TurnRole {
    /// Parse a stored role string, coercing anything unrecognized to `User`.
    ///
    /// Unknown roles can only come from records written by something else;
    /// dropping the turn would silently shrink history, so we keep it.
    pub fn parse_lossy(raw: &str) -> Self {
        match raw {
            "user" => TurnRole::User,
            "assistant" => TurnRole::Assistant,
            other => {
                warn!(role = other, "unrecognized turn role, coercing to user");
                TurnRole::User
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TurnRole::User => "user",
            TurnRole::Assistant => "assistant",
        }
    }
}

/// Author of a history entry, in the remote service's vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireRole {
    User,
    Model,
}

impl From<TurnRole> for WireRole {
    fn from(role: TurnRole) -> Self {
        match role {
            TurnRole::User => WireRole::User,
            TurnRole::Assistant => WireRole::Model,
        }
    }
}

/// A base64-encoded image attached to a single message.
///
/// The payload lives for one call only; the orchestrator never retains it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagePayload {
    pub data: String,
}

impl ImagePayload {
    pub fn from_base64(data: impl Into<String>) -> Self {
        Self { data: data.into() }
    }

    /// Accepts a `data:*;base64,...` URL and keeps only the payload after
    /// the comma. A bare base64 string passes through unchanged.
    pub fn from_data_url(url: &str) -> Self {
        let data = match url.split_once(',') {
            Some((_, payload)) => payload,
            None => url,
        };
        Self {
            data: data.to_string(),
        }
    }
}

/// One persisted message in a conversation. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub id: String,
    pub role: TurnRole,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment: Option<ImagePayload>,
    pub created_at: DateTime<Utc>,
}

impl Turn {
    /// Materialize a draft, assigning the id and the store-side timestamp.
    pub fn from_draft(draft: TurnDraft) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: draft.role,
            content: draft.content,
            attachment: draft.attachment,
            created_at: Utc::now(),
        }
    }
}

/// A turn as composed by a caller, before the store assigns id and timestamp
#[derive(Debug, Clone, PartialEq)]
pub struct TurnDraft {
    pub role: TurnRole,
    pub content: String,
    pub attachment: Option<ImagePayload>,
}

impl TurnDraft {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
            attachment: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
            attachment: None,
        }
    }

    pub fn with_attachment(mut self, attachment: ImagePayload) -> Self {
        self.attachment = Some(attachment);
        self
    }
}

/// Where a reply came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyOrigin {
    /// The remote service answered
    Live,
    /// No usable credential was configured; the remote service was never called
    Simulated,
    /// The remote call was attempted and failed
    Fallback(FailureKind),
}

/// The normalized result of every completion call
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub role: TurnRole,
    pub content: String,
    pub origin: ReplyOrigin,
}

impl Reply {
    pub(crate) fn live(content: String) -> Self {
        Self {
            role: TurnRole::Assistant,
            content,
            origin: ReplyOrigin::Live,
        }
    }

    pub(crate) fn simulated(content: String) -> Self {
        Self {
            role: TurnRole::Assistant,
            content,
            origin: ReplyOrigin::Simulated,
        }
    }

    pub(crate) fn fallback(kind: FailureKind, content: String) -> Self {
        Self {
            role: TurnRole::Assistant,
            content,
            origin: ReplyOrigin::Fallback(kind),
        }
    }
}

// --- Structs for Gemini API Request/Response --- //

/// Request to the Gemini API to generate content
#[derive(Serialize, Debug)]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

/// Content structure for requests
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct Content {
    pub parts: Vec<Part>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<WireRole>,
}

/// Part structure for a piece of content
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(rename = "inlineData", skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineData>,
}

impl Part {
    pub fn text(text: String) -> Self {
        Self {
            text: Some(text),
            inline_data: None,
        }
    }

    pub fn inline_image(data: String) -> Self {
        Self {
            text: None,
            inline_data: Some(InlineData {
                mime_type: IMAGE_MIME_TYPE.to_string(),
                data,
            }),
        }
    }
}

/// Inline binary data carried in a part
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct InlineData {
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    pub data: String,
}

/// Generation configuration options
#[derive(Serialize, Debug, Default)]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// Response from the Gemini API
#[derive(Deserialize, Debug)]
pub struct GenerateContentResponse {
    pub candidates: Vec<Candidate>,
}

/// Candidate in the response
#[derive(Deserialize, Debug)]
pub struct Candidate {
    pub content: Option<ContentData>,
}

/// Content part in the response
#[derive(Deserialize, Debug)]
pub struct ContentData {
    pub parts: Vec<PartResponse>,
    pub role: Option<String>,
}

/// Part response from the API
#[derive(Deserialize, Debug)]
pub struct PartResponse {
    pub text: Option<String>,
}
