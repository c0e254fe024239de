//! Events exported to the display collaborator.

use serde::{Deserialize, Serialize};

/// The query dispatcher state machine.
///
/// Only one dispatch may be in flight per transcript; a request arriving
/// while `Dispatching` is rejected rather than queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchState {
    Idle,
    Dispatching,
}

/// Severity of a user-facing notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    /// Informational, may be shown non-modally.
    Info,
    /// Must be surfaced to the user as a blocking notice.
    Blocking,
}

/// High-level events published by the engine for the display collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    /// The transcript was mutated (append, edit, reset, or reload); the
    /// display should scroll to the latest message.
    TranscriptChanged,
    /// The query dispatcher changed state.
    DispatchStateChanged { state: DispatchState },
    /// The speech capture session started or stopped.
    CaptureStateChanged { listening: bool },
    /// The pending-input buffer received a transcribed fragment.
    PendingInputChanged,
    /// A user-facing notice (e.g. capture unsupported, permission denied).
    Notice { level: NoticeLevel, message: String },
}
