//! Transcription source adapters.
//!
//! The engine consumes speech-to-text as a stream of
//! [`TranscriptionEvent`]s. `ChannelTranscription` bridges a platform feed
//! (native speech API, remote STT service) into that contract;
//! `UnsupportedTranscription` stands in where the platform offers no
//! capability at all.

use async_trait::async_trait;
use ragline_core::error::{RaglineError, Result};
use ragline_core::transcription::{TranscriptionEvent, TranscriptionSource};
use tokio::sync::{Mutex, mpsc};

const EVENT_CHANNEL_CAPACITY: usize = 32;

/// Bridges an external transcription feed into the engine's event contract.
///
/// `start` hands the receiver half to the engine; the platform layer obtains
/// the sender half via [`feed`](Self::feed) and pushes events as they occur.
pub struct ChannelTranscription {
    feed: Mutex<Option<mpsc::Sender<TranscriptionEvent>>>,
}

impl ChannelTranscription {
    pub fn new() -> Self {
        Self {
            feed: Mutex::new(None),
        }
    }

    /// Returns the sender half of the active capture session, if any.
    pub async fn feed(&self) -> Option<mpsc::Sender<TranscriptionEvent>> {
        self.feed.lock().await.clone()
    }
}

impl Default for ChannelTranscription {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TranscriptionSource for ChannelTranscription {
    async fn start(&self) -> Result<mpsc::Receiver<TranscriptionEvent>> {
        let mut feed = self.feed.lock().await;
        // A sender whose receiver was dropped belongs to a finished session.
        if feed.as_ref().is_some_and(|sender| !sender.is_closed()) {
            return Err(RaglineError::internal("capture session already active"));
        }
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        *feed = Some(tx);
        Ok(rx)
    }

    async fn stop(&self) -> Result<()> {
        if let Some(sender) = self.feed.lock().await.take() {
            let _ = sender.send(TranscriptionEvent::Ended).await;
        }
        Ok(())
    }
}

/// Stand-in for platforms without any transcription capability.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedTranscription;

#[async_trait]
impl TranscriptionSource for UnsupportedTranscription {
    async fn start(&self) -> Result<mpsc::Receiver<TranscriptionEvent>> {
        Err(RaglineError::unsupported(
            "speech capture is not available on this platform",
        ))
    }

    async fn stop(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_feed_events_reach_the_receiver() {
        let source = ChannelTranscription::new();
        let mut rx = source.start().await.unwrap();
        let feed = source.feed().await.unwrap();

        feed.send(TranscriptionEvent::Started).await.unwrap();
        feed.send(TranscriptionEvent::Result {
            text: "hello".into(),
            is_final: true,
        })
        .await
        .unwrap();

        assert_eq!(rx.recv().await, Some(TranscriptionEvent::Started));
        assert_eq!(
            rx.recv().await,
            Some(TranscriptionEvent::Result {
                text: "hello".into(),
                is_final: true,
            })
        );
    }

    #[tokio::test]
    async fn test_second_start_is_rejected_while_active() {
        let source = ChannelTranscription::new();
        let _rx = source.start().await.unwrap();
        assert!(source.start().await.is_err());
    }

    #[tokio::test]
    async fn test_stop_sends_ended_and_allows_restart() {
        let source = ChannelTranscription::new();
        let mut rx = source.start().await.unwrap();
        source.stop().await.unwrap();
        assert_eq!(rx.recv().await, Some(TranscriptionEvent::Ended));
        drop(rx);
        assert!(source.start().await.is_ok());
    }

    #[tokio::test]
    async fn test_unsupported_source_signals_unsupported() {
        let err = UnsupportedTranscription.start().await.unwrap_err();
        assert!(err.is_unsupported());
    }
}
