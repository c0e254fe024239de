//! HTTP implementation of the answering backend seam.
//!
//! Talks to the backend's query and session endpoints:
//!
//! - `POST {base}/query` — answer a question against a knowledge scope
//! - `GET {base}/sessions` — list stored sessions
//! - `GET {base}/sessions/{id}/messages` — ordered session history
//! - `PUT {base}/sessions/{id}` — rename a session
//! - `DELETE {base}/sessions/{id}` — delete a session

use std::time::Duration;

use async_trait::async_trait;
use ragline_core::error::{RaglineError, Result};
use ragline_core::message::{ChatMessage, MessageRole, Scope, SourceRef};
use ragline_core::{AnsweringService, QueryReply, SessionSummary};
use ragline_infrastructure::config_service::ClientConfig;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};

/// Query answering may involve model inference; give it generous headroom.
const QUERY_TIMEOUT: Duration = Duration::from_secs(120);
const SESSION_TIMEOUT: Duration = Duration::from_secs(30);

/// Answering backend client over the HTTP query/session API.
#[derive(Debug, Clone)]
pub struct HttpAnsweringClient {
    client: Client,
    base_url: String,
    api_token: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    query: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    session_id: Option<&'a str>,
    use_rag: bool,
    db_scope: Scope,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    answer: String,
    #[serde(default)]
    sources: Vec<SourceRef>,
    session_id: String,
    response_time_ms: u64,
    #[serde(default)]
    db_scope: Scope,
}

/// History rows carry no scope on the wire; the backend does not store one
/// per message. Reloaded history is installed with the default scope.
#[derive(Debug, Deserialize)]
struct HistoryRow {
    role: MessageRole,
    content: String,
    #[serde(default)]
    sources: Option<Vec<SourceRef>>,
    #[serde(default)]
    response_time_ms: Option<u64>,
    #[serde(default)]
    created_at: String,
}

impl From<HistoryRow> for ChatMessage {
    fn from(row: HistoryRow) -> Self {
        Self {
            role: row.role,
            content: row.content,
            sources: row.sources.unwrap_or_default(),
            response_time_ms: row.response_time_ms,
            scope: Scope::default(),
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
struct UpdateSessionRequest<'a> {
    title: &'a str,
}

impl HttpAnsweringClient {
    /// Creates a new client against the given base URL.
    ///
    /// When a token is provided it is injected as a bearer `Authorization`
    /// header on every request.
    pub fn new(base_url: impl Into<String>, api_token: Option<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            client: Client::new(),
            base_url,
            api_token,
        }
    }

    /// Creates a client from the loaded configuration
    /// (config file + `RAGLINE_BASE_URL` / `RAGLINE_API_TOKEN` overrides).
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.base_url.clone(), config.api_token.clone())
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_token {
            Some(token) => request.header("Authorization", format!("Bearer {}", token)),
            None => request,
        }
    }

    async fn check_status(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "unknown error".to_string());
        Err(RaglineError::server(status.as_u16(), message))
    }
}

#[async_trait]
impl AnsweringService for HttpAnsweringClient {
    async fn submit_query(
        &self,
        text: &str,
        session_id: Option<&str>,
        scope: Scope,
    ) -> Result<QueryReply> {
        let url = format!("{}/query", self.base_url);
        let body = ChatRequest {
            query: text,
            session_id,
            use_rag: true,
            db_scope: scope,
        };

        tracing::debug!(target: "api_client", scope = scope.as_str(), session = ?session_id, "submitting query");
        let response = self
            .authorized(self.client.post(&url))
            .json(&body)
            .timeout(QUERY_TIMEOUT)
            .send()
            .await?;
        let response = Self::check_status(response).await?;
        let payload: ChatResponse = response.json().await?;

        Ok(QueryReply {
            session_id: payload.session_id,
            answer: payload.answer,
            sources: payload.sources,
            response_time_ms: payload.response_time_ms,
            scope: payload.db_scope,
        })
    }

    async fn fetch_history(&self, session_id: &str) -> Result<Vec<ChatMessage>> {
        let url = format!("{}/sessions/{}/messages", self.base_url, session_id);
        let response = self
            .authorized(self.client.get(&url))
            .timeout(SESSION_TIMEOUT)
            .send()
            .await?;
        let response = Self::check_status(response).await?;
        let rows: Vec<HistoryRow> = response.json().await?;
        Ok(rows.into_iter().map(ChatMessage::from).collect())
    }

    async fn list_sessions(&self) -> Result<Vec<SessionSummary>> {
        let url = format!("{}/sessions", self.base_url);
        let response = self
            .authorized(self.client.get(&url))
            .timeout(SESSION_TIMEOUT)
            .send()
            .await?;
        let response = Self::check_status(response).await?;
        Ok(response.json().await?)
    }

    async fn rename_session(&self, session_id: &str, title: &str) -> Result<()> {
        let url = format!("{}/sessions/{}", self.base_url, session_id);
        let response = self
            .authorized(self.client.put(&url))
            .json(&UpdateSessionRequest { title })
            .timeout(SESSION_TIMEOUT)
            .send()
            .await?;
        Self::check_status(response).await?;
        Ok(())
    }

    async fn delete_session(&self, session_id: &str) -> Result<()> {
        let url = format!("{}/sessions/{}", self.base_url, session_id);
        let response = self
            .authorized(self.client.delete(&url))
            .timeout(SESSION_TIMEOUT)
            .send()
            .await?;
        Self::check_status(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_chat_request_wire_shape() {
        let body = ChatRequest {
            query: "What is X?",
            session_id: Some("s-1"),
            use_rag: true,
            db_scope: Scope::Shared,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(
            value,
            json!({
                "query": "What is X?",
                "session_id": "s-1",
                "use_rag": true,
                "db_scope": "shared",
            })
        );
    }

    #[test]
    fn test_chat_request_omits_missing_session_id() {
        let body = ChatRequest {
            query: "hi",
            session_id: None,
            use_rag: true,
            db_scope: Scope::Local,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert!(value.get("session_id").is_none());
        assert_eq!(value["db_scope"], "local");
    }

    #[test]
    fn test_chat_response_deserializes() {
        let payload: ChatResponse = serde_json::from_value(json!({
            "answer": "X is Y",
            "sources": [
                {"content": "snippet...", "source": "doc.md", "document_id": "d1"}
            ],
            "session_id": "s-9",
            "response_time_ms": 314,
            "db_scope": "shared",
        }))
        .unwrap();
        assert_eq!(payload.answer, "X is Y");
        assert_eq!(payload.sources.len(), 1);
        assert_eq!(payload.sources[0].source, "doc.md");
        assert_eq!(payload.db_scope, Scope::Shared);
    }

    #[test]
    fn test_history_row_tolerates_null_sources() {
        // User rows have no sources column value and no latency.
        let row: HistoryRow = serde_json::from_value(json!({
            "id": "m-1",
            "role": "user",
            "content": "What is X?",
            "sources": null,
            "response_time_ms": null,
            "created_at": "2024-05-01T10:00:00",
        }))
        .unwrap();
        let message = ChatMessage::from(row);
        assert_eq!(message.role, MessageRole::User);
        assert!(message.sources.is_empty());
        assert_eq!(message.scope, Scope::Local);
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client = HttpAnsweringClient::new("http://localhost:8000/api/chat/", None);
        assert_eq!(client.base_url, "http://localhost:8000/api/chat");
    }
}
