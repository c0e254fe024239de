//! The transcript store.
//!
//! A `Transcript` exclusively owns the ordered message sequence for the
//! currently bound session. It is replaced wholesale (never merged) whenever
//! the bound session changes.

use crate::error::{RaglineError, Result};
use crate::message::{ChatMessage, MessageRole, Scope};

/// Ordered, mutable sequence of messages for the active session.
///
/// Appends are strictly FIFO; the only in-place mutation is the
/// edit-with-truncation protocol used to regenerate an answer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn get(&self, index: usize) -> Option<&ChatMessage> {
        self.messages.get(index)
    }

    /// Clears the message sequence. Always succeeds.
    pub fn reset(&mut self) {
        self.messages.clear();
    }

    /// Appends a message at the end.
    pub fn append(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// Installs an already-ordered history verbatim, including the scope
    /// recorded on each message. Used when history is loaded after a
    /// session change.
    pub fn replace_all(&mut self, messages: Vec<ChatMessage>) {
        self.messages = messages;
    }

    /// Rewrites the content of the user message at `index` and removes the
    /// stale answer that immediately follows it, if any.
    ///
    /// Returns the scope recorded on the edited message; regeneration must
    /// use that scope, not the scope currently selected in the input UI.
    ///
    /// # Errors
    ///
    /// `InvalidEditTarget` if `index` is out of range or does not refer to
    /// a user message. The transcript is left unchanged in that case.
    pub fn edit_and_truncate(&mut self, index: usize, new_content: &str) -> Result<Scope> {
        match self.messages.get(index) {
            Some(message) if message.role == MessageRole::User => {}
            _ => return Err(RaglineError::InvalidEditTarget { index }),
        }

        self.messages[index].content = new_content.to_string();
        let scope = self.messages[index].scope;

        // The stale answer is discarded; a fresh regeneration replaces it.
        if self
            .messages
            .get(index + 1)
            .is_some_and(|next| next.role == MessageRole::Assistant)
        {
            self.messages.remove(index + 1);
        }

        Ok(scope)
    }

    /// Renders the transcript as plain text, one `[role]`-prefixed block per
    /// message. Multi-line content is preserved as continuation lines.
    pub fn export_text(&self) -> String {
        let mut out = String::new();
        for message in &self.messages {
            out.push('[');
            out.push_str(message.role.as_str());
            out.push_str("] ");
            out.push_str(&message.content);
            out.push('\n');
        }
        out
    }

    /// Parses the plain-text rendering produced by [`export_text`].
    ///
    /// Only the ordered (role, content) pairs survive the round trip;
    /// sources, latency, and scope are not part of the text format.
    ///
    /// [`export_text`]: Self::export_text
    pub fn from_text(text: &str) -> Self {
        let mut messages: Vec<ChatMessage> = Vec::new();
        for line in text.lines() {
            let header = [MessageRole::User, MessageRole::Assistant]
                .into_iter()
                .find_map(|role| {
                    let prefix = format!("[{}] ", role.as_str());
                    line.strip_prefix(prefix.as_str()).map(|rest| (role, rest))
                });

            match header {
                Some((MessageRole::User, rest)) => {
                    messages.push(ChatMessage::user(rest, Scope::default()));
                }
                Some((MessageRole::Assistant, rest)) => {
                    messages.push(ChatMessage::assistant(
                        rest,
                        Vec::new(),
                        None,
                        Scope::default(),
                    ));
                }
                None => {
                    // Continuation line of a multi-line message.
                    if let Some(last) = messages.last_mut() {
                        last.content.push('\n');
                        last.content.push_str(line);
                    }
                }
            }
        }
        Self { messages }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::SourceRef;

    fn question(content: &str, scope: Scope) -> ChatMessage {
        ChatMessage::user(content, scope)
    }

    fn answer(content: &str, scope: Scope) -> ChatMessage {
        ChatMessage::assistant(content, Vec::new(), Some(42), scope)
    }

    #[test]
    fn test_append_preserves_call_order() {
        let mut transcript = Transcript::new();
        for i in 0..5 {
            transcript.append(question(&format!("q{}", i), Scope::Local));
        }
        let contents: Vec<&str> = transcript
            .messages()
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(contents, vec!["q0", "q1", "q2", "q3", "q4"]);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut transcript = Transcript::new();
        transcript.append(question("q", Scope::Local));
        transcript.append(answer("a", Scope::Local));
        transcript.reset();
        assert!(transcript.is_empty());
    }

    #[test]
    fn test_replace_all_installs_verbatim_with_scope() {
        let mut transcript = Transcript::new();
        transcript.append(question("old", Scope::Local));

        let history = vec![question("q1", Scope::Shared), answer("a1", Scope::Shared)];
        transcript.replace_all(history.clone());

        assert_eq!(transcript.messages(), history.as_slice());
        assert_eq!(transcript.get(0).unwrap().scope, Scope::Shared);
    }

    #[test]
    fn test_edit_rewrites_and_truncates_stale_answer() {
        let mut transcript = Transcript::new();
        transcript.append(question("q1", Scope::Shared));
        transcript.append(answer("a1", Scope::Shared));

        let scope = transcript.edit_and_truncate(0, "q1-revised").unwrap();

        assert_eq!(scope, Scope::Shared);
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript.get(0).unwrap().content, "q1-revised");
        assert_eq!(transcript.get(0).unwrap().role, MessageRole::User);
    }

    #[test]
    fn test_edit_without_following_answer_only_rewrites() {
        let mut transcript = Transcript::new();
        transcript.append(question("q1", Scope::Local));
        transcript.append(answer("a1", Scope::Local));
        transcript.append(question("q2", Scope::Local));

        // No assistant message follows q2, nothing to truncate.
        transcript.edit_and_truncate(2, "q2-revised").unwrap();
        assert_eq!(transcript.len(), 3);
        assert_eq!(transcript.get(2).unwrap().content, "q2-revised");
    }

    #[test]
    fn test_edit_does_not_remove_following_user_message() {
        let mut transcript = Transcript::new();
        transcript.append(question("q1", Scope::Local));
        transcript.append(question("q2", Scope::Local));

        transcript.edit_and_truncate(0, "q1-revised").unwrap();
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript.get(1).unwrap().content, "q2");
    }

    #[test]
    fn test_edit_rejects_assistant_target() {
        let mut transcript = Transcript::new();
        transcript.append(question("q1", Scope::Local));
        transcript.append(answer("a1", Scope::Local));
        let before = transcript.clone();

        let err = transcript.edit_and_truncate(1, "nope").unwrap_err();
        assert!(err.is_invalid_edit_target());
        assert_eq!(transcript, before);
    }

    #[test]
    fn test_edit_rejects_out_of_range_index() {
        let mut transcript = Transcript::new();
        transcript.append(question("q1", Scope::Local));
        let before = transcript.clone();

        let err = transcript.edit_and_truncate(7, "nope").unwrap_err();
        assert!(err.is_invalid_edit_target());
        assert_eq!(transcript, before);
    }

    #[test]
    fn test_export_then_parse_round_trips_role_content_pairs() {
        let mut transcript = Transcript::new();
        transcript.append(question("What is X?", Scope::Shared));
        transcript.append(ChatMessage::assistant(
            "X is:\n- a thing\n- another thing",
            vec![SourceRef {
                content: "snippet".into(),
                source: "doc.md".into(),
                document_id: "d1".into(),
            }],
            Some(250),
            Scope::Shared,
        ));
        transcript.append(question("And Y?", Scope::Local));

        let reparsed = Transcript::from_text(&transcript.export_text());

        let pairs = |t: &Transcript| -> Vec<(MessageRole, String)> {
            t.messages()
                .iter()
                .map(|m| (m.role, m.content.clone()))
                .collect()
        };
        assert_eq!(pairs(&reparsed), pairs(&transcript));
    }
}
