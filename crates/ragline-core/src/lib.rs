//! Core domain model for the ragline conversation engine.
//!
//! This crate contains the types and trait seams the rest of the workspace
//! is built on:
//!
//! - `message`: conversation turn types (`MessageRole`, `Scope`, `ChatMessage`)
//! - `transcript`: the ordered, exclusively-owned message store
//! - `event`: events exported to the display collaborator
//! - `answering`: the answering backend seam (`AnsweringService`)
//! - `directory`: the shared "current session id" pointer seam
//! - `transcription`: the speech-to-text source seam
//! - `error`: the shared error type (`RaglineError`)

pub mod answering;
pub mod directory;
pub mod error;
pub mod event;
pub mod message;
pub mod transcript;
pub mod transcription;

pub use answering::{AnsweringService, QueryReply, SessionSummary};
pub use directory::SessionDirectory;
pub use error::{RaglineError, Result};
pub use event::{DispatchState, EngineEvent, NoticeLevel};
pub use message::{ChatMessage, MessageRole, Scope, SourceRef};
pub use transcript::Transcript;
pub use transcription::{TranscriptionErrorKind, TranscriptionEvent, TranscriptionSource};
