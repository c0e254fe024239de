//! The pending-input buffer.
//!
//! Two text-producing sources feed one buffer: typed text (direct,
//! synchronous) and the platform transcription source (asynchronous,
//! event-driven). The dispatcher drains the buffer via
//! [`take_pending`](InputCapture::take_pending).

use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use std::sync::atomic::{AtomicBool, Ordering};

use ragline_core::error::Result;
use ragline_core::transcription::{TranscriptionErrorKind, TranscriptionEvent, TranscriptionSource};
use ragline_core::{EngineEvent, NoticeLevel};
use tokio::sync::{broadcast, mpsc};

const UNSUPPORTED_NOTICE: &str = "Speech capture is not available on this platform";
const PERMISSION_NOTICE: &str = "Microphone access was denied; speech capture cannot be used";

/// Pending-input buffer with an attached speech capture toggle.
pub struct InputCapture {
    source: Arc<dyn TranscriptionSource>,
    buffer: StdMutex<String>,
    listening: AtomicBool,
    /// Set after the first `Unsupported` signal; later toggles are inert.
    unsupported: AtomicBool,
    events: broadcast::Sender<EngineEvent>,
}

impl InputCapture {
    /// Creates a capture funnel over the given transcription source,
    /// publishing onto the engine's event stream.
    pub fn new(
        source: Arc<dyn TranscriptionSource>,
        events: broadcast::Sender<EngineEvent>,
    ) -> Self {
        Self {
            source,
            buffer: StdMutex::new(String::new()),
            listening: AtomicBool::new(false),
            unsupported: AtomicBool::new(false),
            events,
        }
    }

    /// Returns the current buffer content.
    pub fn pending(&self) -> String {
        self.buffer.lock().expect("input buffer poisoned").clone()
    }

    /// Replaces the buffer with typed text.
    pub fn set_pending(&self, text: impl Into<String>) {
        *self.buffer.lock().expect("input buffer poisoned") = text.into();
    }

    /// Drains the buffer for dispatch.
    pub fn take_pending(&self) -> String {
        std::mem::take(&mut *self.buffer.lock().expect("input buffer poisoned"))
    }

    pub fn is_listening(&self) -> bool {
        self.listening.load(Ordering::SeqCst)
    }

    fn emit(&self, event: EngineEvent) {
        let _ = self.events.send(event);
    }

    fn set_listening(&self, listening: bool) {
        if self.listening.swap(listening, Ordering::SeqCst) != listening {
            self.emit(EngineEvent::CaptureStateChanged { listening });
        }
    }

    /// Appends a final transcribed fragment, preserving any text the user
    /// had already typed.
    fn push_final_fragment(&self, text: &str) {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return;
        }
        {
            let mut buffer = self.buffer.lock().expect("input buffer poisoned");
            if !buffer.is_empty() && !buffer.ends_with(char::is_whitespace) {
                buffer.push(' ');
            }
            buffer.push_str(trimmed);
        }
        self.emit(EngineEvent::PendingInputChanged);
    }

    /// Toggles the capture session: stops when listening, starts otherwise.
    ///
    /// Returns whether the capture session is listening after the toggle.
    /// The first toggle on a platform without transcription surfaces
    /// `Unsupported` once; the toggle is inert afterwards.
    pub async fn toggle(self: &Arc<Self>) -> Result<bool> {
        if self.is_listening() {
            if let Err(err) = self.source.stop().await {
                tracing::warn!(target: "capture", "failed to stop capture: {}", err);
            }
            self.set_listening(false);
            return Ok(false);
        }

        if self.unsupported.load(Ordering::SeqCst) {
            return Ok(false);
        }

        match self.source.start().await {
            Ok(receiver) => {
                self.set_listening(true);
                let capture = Arc::clone(self);
                tokio::spawn(async move { capture.consume(receiver).await });
                Ok(true)
            }
            Err(err) if err.is_unsupported() => {
                self.unsupported.store(true, Ordering::SeqCst);
                self.emit(EngineEvent::Notice {
                    level: NoticeLevel::Info,
                    message: UNSUPPORTED_NOTICE.to_string(),
                });
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    async fn consume(&self, mut receiver: mpsc::Receiver<TranscriptionEvent>) {
        while let Some(event) = receiver.recv().await {
            match event {
                TranscriptionEvent::Started => {}
                TranscriptionEvent::Result { text, is_final } => {
                    if is_final {
                        self.push_final_fragment(&text);
                    }
                    // Interim results are ignored.
                }
                TranscriptionEvent::Error {
                    kind: TranscriptionErrorKind::PermissionDenied,
                } => {
                    self.emit(EngineEvent::Notice {
                        level: NoticeLevel::Blocking,
                        message: PERMISSION_NOTICE.to_string(),
                    });
                    break;
                }
                TranscriptionEvent::Error { kind } => {
                    // Any other capture error just ends the session.
                    tracing::warn!(target: "capture", ?kind, "capture error");
                    break;
                }
                TranscriptionEvent::Ended => break,
            }
        }
        self.set_listening(false);
    }
}

/// Convenience used by hosts: drain the buffer and hand its content to a
/// dispatch, returning `None` when the buffer holds nothing but whitespace.
impl InputCapture {
    pub fn take_pending_nonempty(&self) -> Option<String> {
        let text = self.take_pending();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }
}
