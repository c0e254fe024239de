//! Session directory seam.

use async_trait::async_trait;

use crate::error::Result;

/// The shared persisted "current session id" pointer.
///
/// This value is read by the engine's session-binding poller and written
/// both by the engine (dispatch-time new-id assignment, new-conversation)
/// and by sibling components such as a sidebar session list. There is no
/// direct call channel between those writers and the engine; changes are
/// observed by poll-and-diff, so only eventual (sub-second) consistency is
/// expected. Last-write-wins is acceptable.
#[async_trait]
pub trait SessionDirectory: Send + Sync {
    /// Returns the currently selected session id, if any.
    async fn current_session(&self) -> Option<String>;

    /// Sets the currently selected session id.
    async fn set_current_session(&self, session_id: String) -> Result<()>;

    /// Clears the currently selected session id.
    async fn clear_current_session(&self) -> Result<()>;
}
