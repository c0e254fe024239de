//! Conversation message types.
//!
//! This module contains types for representing turns in a conversation,
//! including roles, knowledge scopes, and citation descriptors.

use serde::{Deserialize, Serialize};

/// Represents the role of a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Message from the user.
    User,
    /// Message from the AI assistant.
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl std::str::FromStr for MessageRole {
    type Err = crate::error::RaglineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            other => Err(crate::error::RaglineError::internal(format!(
                "unknown message role: {}",
                other
            ))),
        }
    }
}

/// Which knowledge corpus a question is answered against.
///
/// Recorded on every message at creation time and never mutated; when an
/// edited question is regenerated, the scope stored on the edited message
/// is reused rather than whatever scope is currently selected in the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// The user's personal document corpus.
    #[default]
    Local,
    /// The shared team document corpus.
    Shared,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Shared => "shared",
        }
    }
}

impl std::str::FromStr for Scope {
    type Err = crate::error::RaglineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local" => Ok(Self::Local),
            "shared" => Ok(Self::Shared),
            other => Err(crate::error::RaglineError::internal(format!(
                "unknown scope: {}",
                other
            ))),
        }
    }
}

/// A citation descriptor attached to an assistant message.
///
/// Opaque to the engine; passed through verbatim from the answering backend
/// to the display collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SourceRef {
    /// Snippet of the cited document.
    #[serde(default)]
    pub content: String,
    /// Origin label (file name or collection name).
    #[serde(default)]
    pub source: String,
    /// Identifier of the cited document.
    #[serde(default)]
    pub document_id: String,
}

/// A single turn in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// The role of the message sender.
    pub role: MessageRole,
    /// The content of the message. Mutable only through the edit operation.
    pub content: String,
    /// Citations backing an assistant answer. Empty for user messages.
    #[serde(default)]
    pub sources: Vec<SourceRef>,
    /// Backend latency in milliseconds, set only on assistant messages.
    #[serde(default)]
    pub response_time_ms: Option<u64>,
    /// The knowledge scope this turn was (or will be) answered against.
    #[serde(default)]
    pub scope: Scope,
    /// Timestamp when the message was created (RFC 3339 format).
    #[serde(default)]
    pub created_at: String,
}

impl ChatMessage {
    /// Creates a user message with the given scope.
    pub fn user(content: impl Into<String>, scope: Scope) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
            sources: Vec::new(),
            response_time_ms: None,
            scope,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Creates an assistant message carrying the answer payload.
    pub fn assistant(
        content: impl Into<String>,
        sources: Vec<SourceRef>,
        response_time_ms: Option<u64>,
        scope: Scope,
    ) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
            sources,
            response_time_ms,
            scope,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn is_user(&self) -> bool {
        self.role == MessageRole::User
    }

    pub fn is_assistant(&self) -> bool {
        self.role == MessageRole::Assistant
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_and_scope_serialize_lowercase() {
        assert_eq!(
            serde_json::to_string(&MessageRole::Assistant).unwrap(),
            "\"assistant\""
        );
        assert_eq!(serde_json::to_string(&Scope::Shared).unwrap(), "\"shared\"");
    }

    #[test]
    fn test_scope_defaults_to_local() {
        assert_eq!(Scope::default(), Scope::Local);
        let message: ChatMessage =
            serde_json::from_str(r#"{"role":"user","content":"hi"}"#).unwrap();
        assert_eq!(message.scope, Scope::Local);
        assert!(message.sources.is_empty());
    }

    #[test]
    fn test_constructors_record_scope() {
        let question = ChatMessage::user("what is x?", Scope::Shared);
        assert!(question.is_user());
        assert_eq!(question.scope, Scope::Shared);
        assert!(question.response_time_ms.is_none());

        let answer = ChatMessage::assistant("x is y", Vec::new(), Some(120), Scope::Shared);
        assert!(answer.is_assistant());
        assert_eq!(answer.response_time_ms, Some(120));
        assert_eq!(answer.scope, Scope::Shared);
    }
}
