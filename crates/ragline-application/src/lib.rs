//! Use-case layer of ragline.
//!
//! - `engine`: the conversation engine (query dispatcher, edit/regenerate
//!   protocol, session binding against the shared session pointer)
//! - `input`: the pending-input buffer fed by typed text and a
//!   transcription source

pub mod engine;
pub mod input;

pub use engine::{ConversationEngine, DEFAULT_POLL_INTERVAL};
pub use input::InputCapture;
