//! Collaborator implementations that talk to the outside world.
//!
//! - `api_client`: HTTP implementation of the answering backend seam
//! - `transcription`: transcription source adapters

pub mod api_client;
pub mod transcription;

pub use api_client::HttpAnsweringClient;
pub use transcription::{ChannelTranscription, UnsupportedTranscription};
