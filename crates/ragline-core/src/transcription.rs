//! Speech-to-text source seam.
//!
//! The platform transcription capability is consumed as an asynchronous,
//! event-driven text source; the engine only installs final-result text.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::Result;

/// Classifies a capture error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptionErrorKind {
    /// The platform refused microphone access. Must be surfaced to the
    /// user as a blocking notice.
    PermissionDenied,
    /// No speech was detected before the platform gave up.
    NoSpeech,
    /// The capture was aborted by the platform.
    Aborted,
    /// Any other platform error.
    Other(String),
}

/// Signals emitted by an active capture session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptionEvent {
    /// The platform started listening.
    Started,
    /// A transcribed fragment. Only fragments with `is_final` set are
    /// installed into the pending-input buffer.
    Result { text: String, is_final: bool },
    /// A capture error; the capture session ends after this.
    Error { kind: TranscriptionErrorKind },
    /// The capture session ended.
    Ended,
}

/// An abstract transcription source.
///
/// At most one capture session is active at a time; that is enforced by the
/// consumer (`InputCapture`), not by implementations.
#[async_trait]
pub trait TranscriptionSource: Send + Sync {
    /// Begins a capture session. Events arrive on the returned receiver
    /// until an `Ended` or `Error` event (or the channel closing).
    ///
    /// # Errors
    ///
    /// `Unsupported` if the platform offers no transcription capability.
    async fn start(&self) -> Result<mpsc::Receiver<TranscriptionEvent>>;

    /// Requests the active capture session to stop.
    async fn stop(&self) -> Result<()>;
}
