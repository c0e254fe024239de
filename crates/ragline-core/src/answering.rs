//! Answering backend seam.
//!
//! Defines the interface the engine consumes to submit questions, reload
//! session history, and manage the server-side session list. The concrete
//! HTTP implementation lives in `ragline-interaction`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::message::{ChatMessage, Scope, SourceRef};

/// One answer from the backend, as returned by `submit_query`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryReply {
    /// The session this turn belongs to. For a first dispatch with no bound
    /// session, this is the server-assigned id of the newly created session.
    pub session_id: String,
    /// The answer text.
    pub answer: String,
    /// Citations backing the answer, passed through verbatim.
    #[serde(default)]
    pub sources: Vec<SourceRef>,
    /// Backend latency in milliseconds.
    pub response_time_ms: u64,
    /// The knowledge scope the question was answered against.
    #[serde(default)]
    pub scope: Scope,
}

/// A session directory entry, as listed by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub message_count: usize,
    #[serde(default)]
    pub created_at: String,
}

/// An abstract answering backend.
///
/// Implementations should map transport failures to
/// `RaglineError::Network` and failure statuses to `RaglineError::Server`;
/// the engine recovers from both by inserting a synthetic apology message.
#[async_trait]
pub trait AnsweringService: Send + Sync {
    /// Submits a question against the given knowledge scope.
    ///
    /// `session_id` is `None` for the first turn of a new conversation; the
    /// backend then creates a session and returns its id in the reply.
    async fn submit_query(
        &self,
        text: &str,
        session_id: Option<&str>,
        scope: Scope,
    ) -> Result<QueryReply>;

    /// Fetches the full ordered message history of a session.
    async fn fetch_history(&self, session_id: &str) -> Result<Vec<ChatMessage>>;

    /// Lists the stored sessions, newest first.
    async fn list_sessions(&self) -> Result<Vec<SessionSummary>>;

    /// Renames a session.
    async fn rename_session(&self, session_id: &str, title: &str) -> Result<()>;

    /// Deletes a session and all of its messages.
    async fn delete_session(&self, session_id: &str) -> Result<()>;
}
