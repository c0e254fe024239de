//! The conversation engine.
//!
//! `ConversationEngine` owns the transcript for the currently bound session
//! and implements the dispatch and edit/regenerate protocols on top of the
//! answering backend. It also keeps the transcript aligned with the shared
//! "current session id" pointer, which sibling components (e.g. a sidebar
//! session list) rewrite out of band.
//!
//! # Concurrency
//!
//! At most one dispatch is in flight per engine; a second `dispatch`/`edit`
//! is rejected with `Busy` rather than queued, so appends are strictly
//! sequential in the order their triggering operations were initiated.
//!
//! A session change arriving during an in-flight dispatch follows the
//! discard-on-mismatch policy: the binding observed when the request was
//! issued is compared with the binding at response arrival, and a stale
//! answer is simply not installed. The binding lock is held across the
//! poller's reset-and-reload, so reconciliation and the dispatch-time id
//! assignment serialize rather than race.

use std::sync::Arc;
use std::sync::RwLock as StdRwLock;
use std::time::Duration;

use ragline_core::error::{RaglineError, Result};
use ragline_core::message::{ChatMessage, Scope};
use ragline_core::{
    AnsweringService, DispatchState, EngineEvent, QueryReply, SessionDirectory, SessionSummary,
    Transcript,
};
use tokio::sync::{Mutex, RwLock, broadcast};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Default cadence of the session-pointer poll.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Content of the synthetic assistant message inserted when the answering
/// backend fails. The failure is recovered locally; the conversation
/// remains usable.
pub const APOLOGY_CONTENT: &str =
    "Sorry, an error occurred while generating the answer. Please try again.";

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Conversation session and message-reconciliation engine.
pub struct ConversationEngine {
    answering: Arc<dyn AnsweringService>,
    directory: Arc<dyn SessionDirectory>,
    transcript: RwLock<Transcript>,
    /// The session id the transcript is bound to. `None` until the first
    /// successful dispatch returns a server-assigned id.
    binding: RwLock<Option<String>>,
    /// Mutual exclusion for dispatches; `try_lock` failure maps to `Busy`.
    dispatch_gate: Mutex<()>,
    dispatch_state: StdRwLock<DispatchState>,
    events: broadcast::Sender<EngineEvent>,
}

impl ConversationEngine {
    pub fn new(answering: Arc<dyn AnsweringService>, directory: Arc<dyn SessionDirectory>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            answering,
            directory,
            transcript: RwLock::new(Transcript::new()),
            binding: RwLock::new(None),
            dispatch_gate: Mutex::new(()),
            dispatch_state: StdRwLock::new(DispatchState::Idle),
            events,
        }
    }

    /// Subscribes to the engine's exported events.
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    /// Returns the sender half of the event channel, for collaborators
    /// (e.g. `InputCapture`) that publish onto the same stream.
    pub fn event_sender(&self) -> broadcast::Sender<EngineEvent> {
        self.events.clone()
    }

    /// Returns a snapshot of the current transcript.
    pub async fn transcript_snapshot(&self) -> Vec<ChatMessage> {
        self.transcript.read().await.messages().to_vec()
    }

    /// Renders the current transcript as plain text.
    pub async fn export_transcript(&self) -> String {
        self.transcript.read().await.export_text()
    }

    /// Returns the session id the transcript is currently bound to.
    pub async fn bound_session(&self) -> Option<String> {
        self.binding.read().await.clone()
    }

    pub fn dispatch_state(&self) -> DispatchState {
        *self.dispatch_state.read().expect("dispatch state poisoned")
    }

    fn emit(&self, event: EngineEvent) {
        // Nobody listening is fine; the display collaborator is optional.
        let _ = self.events.send(event);
    }

    fn set_state(&self, state: DispatchState) {
        *self.dispatch_state.write().expect("dispatch state poisoned") = state;
        self.emit(EngineEvent::DispatchStateChanged { state });
    }

    /// Sends a new question to the answering backend.
    ///
    /// The user message is appended optimistically before the request goes
    /// out. On success the answer is appended with the same scope that was
    /// sent; on a backend failure a synthetic apology message is appended
    /// instead and `Ok(())` is still returned.
    ///
    /// # Errors
    ///
    /// `Busy` if another dispatch is already in flight; nothing is appended
    /// in that case.
    pub async fn dispatch(&self, text: impl Into<String>, scope: Scope) -> Result<()> {
        let _gate = self
            .dispatch_gate
            .try_lock()
            .map_err(|_| RaglineError::Busy)?;
        let text = text.into();
        self.set_state(DispatchState::Dispatching);

        {
            let mut transcript = self.transcript.write().await;
            transcript.append(ChatMessage::user(text.clone(), scope));
        }
        self.emit(EngineEvent::TranscriptChanged);

        self.run_query(&text, scope).await;
        self.set_state(DispatchState::Idle);
        Ok(())
    }

    /// Edits a previously sent question and regenerates its answer.
    ///
    /// The message at `index` is rewritten in place and its stale answer
    /// removed; the regeneration then runs exactly like a dispatch, with
    /// the scope recorded on the edited message and without appending a new
    /// user message.
    ///
    /// # Errors
    ///
    /// `Busy` if a dispatch is in flight; `InvalidEditTarget` if `index`
    /// does not refer to a user message (the transcript is left unchanged).
    pub async fn edit(&self, index: usize, new_content: impl Into<String>) -> Result<()> {
        let _gate = self
            .dispatch_gate
            .try_lock()
            .map_err(|_| RaglineError::Busy)?;
        let new_content = new_content.into();

        let scope = {
            let mut transcript = self.transcript.write().await;
            transcript.edit_and_truncate(index, &new_content)?
        };
        self.emit(EngineEvent::TranscriptChanged);

        self.set_state(DispatchState::Dispatching);
        self.run_query(&new_content, scope).await;
        self.set_state(DispatchState::Idle);
        Ok(())
    }

    async fn run_query(&self, text: &str, scope: Scope) {
        let origin = self.binding.read().await.clone();
        match self
            .answering
            .submit_query(text, origin.as_deref(), scope)
            .await
        {
            Ok(reply) => self.install_reply(origin, reply, scope).await,
            Err(err) if err.is_backend_failure() => {
                tracing::warn!(target: "dispatch", "query failed: {}", err);
                self.install_apology(origin, scope).await;
            }
            Err(err) => {
                tracing::error!(target: "dispatch", "unexpected dispatch failure: {}", err);
                self.install_apology(origin, scope).await;
            }
        }
    }

    async fn install_reply(&self, origin: Option<String>, reply: QueryReply, scope: Scope) {
        let mut binding = self.binding.write().await;
        if *binding != origin {
            tracing::debug!(
                target: "dispatch",
                session = %reply.session_id,
                "session changed mid-dispatch, stale answer discarded"
            );
            return;
        }
        if binding.is_none() {
            // First successful dispatch of a new conversation: the
            // server-assigned id becomes the binding, exactly once.
            *binding = Some(reply.session_id.clone());
            if let Err(err) = self
                .directory
                .set_current_session(reply.session_id.clone())
                .await
            {
                tracing::warn!(target: "dispatch", "failed to persist session id: {}", err);
            }
        }

        let message = ChatMessage::assistant(
            reply.answer,
            reply.sources,
            Some(reply.response_time_ms),
            scope,
        );
        let mut transcript = self.transcript.write().await;
        transcript.append(message);
        drop(transcript);
        drop(binding);
        self.emit(EngineEvent::TranscriptChanged);
    }

    async fn install_apology(&self, origin: Option<String>, scope: Scope) {
        let binding = self.binding.read().await;
        if *binding != origin {
            tracing::debug!(target: "dispatch", "session changed mid-dispatch, apology dropped");
            return;
        }
        let mut transcript = self.transcript.write().await;
        transcript.append(ChatMessage::assistant(
            APOLOGY_CONTENT,
            Vec::new(),
            None,
            scope,
        ));
        drop(transcript);
        drop(binding);
        self.emit(EngineEvent::TranscriptChanged);
    }

    /// Starts a fresh conversation: clears the binding, the shared session
    /// pointer, and the transcript.
    ///
    /// # Errors
    ///
    /// `Busy` while a dispatch is in flight.
    pub async fn new_conversation(&self) -> Result<()> {
        let _gate = self
            .dispatch_gate
            .try_lock()
            .map_err(|_| RaglineError::Busy)?;
        let mut binding = self.binding.write().await;
        *binding = None;
        self.directory.clear_current_session().await?;
        let mut transcript = self.transcript.write().await;
        transcript.reset();
        drop(transcript);
        drop(binding);
        self.emit(EngineEvent::TranscriptChanged);
        Ok(())
    }

    /// Selects a session: writes the shared pointer, then reconciles
    /// immediately instead of waiting for the next poll tick.
    pub async fn select_session(&self, session_id: &str) -> Result<()> {
        self.directory
            .set_current_session(session_id.to_string())
            .await?;
        self.sync_with_directory().await?;
        Ok(())
    }

    /// Compares the shared session pointer against the binding and
    /// reconciles on change: rebind, reset the transcript, then reload the
    /// new session's history. Returns whether a change was observed.
    ///
    /// The reset happens before the load, so a failed history fetch leaves
    /// the transcript empty rather than partially populated.
    pub async fn sync_with_directory(&self) -> Result<bool> {
        let mut binding = self.binding.write().await;
        let observed = self.directory.current_session().await;
        if observed == *binding {
            return Ok(false);
        }

        tracing::info!(
            target: "session_watch",
            from = ?*binding,
            to = ?observed,
            "session pointer changed, reloading"
        );
        *binding = observed.clone();
        {
            let mut transcript = self.transcript.write().await;
            transcript.reset();
        }
        self.emit(EngineEvent::TranscriptChanged);

        if let Some(session_id) = observed {
            let history = self.answering.fetch_history(&session_id).await?;
            let mut transcript = self.transcript.write().await;
            transcript.replace_all(history);
            drop(transcript);
            self.emit(EngineEvent::TranscriptChanged);
        }
        Ok(true)
    }

    /// Spawns the session-pointer poller.
    ///
    /// The pointer lives in shared persisted state with no direct call
    /// channel from its writers, so changes are observed by poll-and-diff
    /// at the given cadence (see [`DEFAULT_POLL_INTERVAL`]).
    pub fn spawn_directory_watch(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let engine = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(err) = engine.sync_with_directory().await {
                    tracing::warn!(target: "session_watch", "history reload failed: {}", err);
                }
            }
        })
    }

    /// Lists the stored sessions.
    pub async fn list_sessions(&self) -> Result<Vec<SessionSummary>> {
        self.answering.list_sessions().await
    }

    /// Renames a session.
    pub async fn rename_session(&self, session_id: &str, title: &str) -> Result<()> {
        self.answering.rename_session(session_id, title).await
    }

    /// Deletes a session. Deleting the bound session also clears the
    /// binding, the shared pointer, and the transcript.
    pub async fn delete_session(&self, session_id: &str) -> Result<()> {
        self.answering.delete_session(session_id).await?;

        let mut binding = self.binding.write().await;
        if binding.as_deref() == Some(session_id) {
            *binding = None;
            self.directory.clear_current_session().await?;
            let mut transcript = self.transcript.write().await;
            transcript.reset();
            drop(transcript);
            drop(binding);
            self.emit(EngineEvent::TranscriptChanged);
        }
        Ok(())
    }
}
