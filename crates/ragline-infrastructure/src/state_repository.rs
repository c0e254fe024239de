//! File-backed session directory implementation.
//!
//! The "current session id" pointer is shared between views of the
//! application; sibling components rewrite the state file out of band and
//! the engine's poller observes the change. Reads therefore go back to disk
//! on every observation, with the in-memory copy kept as a fallback for
//! transient IO failures.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use ragline_core::SessionDirectory;
use ragline_core::error::Result;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::paths;

/// Application state that persists across restarts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct AppState {
    /// The currently selected session id.
    current_session_id: Option<String>,
}

/// TOML-file-backed [`SessionDirectory`].
pub struct TomlSessionDirectory {
    /// Last successfully loaded state; fallback when the file is unreadable.
    state: Mutex<AppState>,
    path: PathBuf,
}

impl TomlSessionDirectory {
    /// Opens the directory at the default state file location.
    pub async fn new() -> Result<Self> {
        Self::with_path(paths::state_file()?).await
    }

    /// Opens the directory at an explicit path. Used by tests and by hosts
    /// that manage their own state location.
    pub async fn with_path(path: PathBuf) -> Result<Self> {
        let state = Self::load(&path).await?;
        Ok(Self {
            state: Mutex::new(state),
            path,
        })
    }

    async fn load(path: &Path) -> Result<AppState> {
        match tokio::fs::read_to_string(path).await {
            Ok(raw) => Ok(toml::from_str(&raw)?),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(AppState::default()),
            Err(err) => Err(err.into()),
        }
    }

    async fn save(&self, state: &AppState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let raw = toml::to_string_pretty(state)?;
        tokio::fs::write(&self.path, raw).await?;
        Ok(())
    }

    async fn update<F>(&self, mutate: F) -> Result<()>
    where
        F: FnOnce(&mut AppState),
    {
        let mut state = self.state.lock().await;
        // Re-read first so we do not clobber a sibling's concurrent write.
        if let Ok(on_disk) = Self::load(&self.path).await {
            *state = on_disk;
        }
        mutate(&mut state);
        let snapshot = state.clone();
        drop(state);
        self.save(&snapshot).await
    }
}

#[async_trait]
impl SessionDirectory for TomlSessionDirectory {
    async fn current_session(&self) -> Option<String> {
        match Self::load(&self.path).await {
            Ok(on_disk) => {
                let mut state = self.state.lock().await;
                *state = on_disk;
                state.current_session_id.clone()
            }
            Err(err) => {
                tracing::warn!(target: "state_repository", "failed to read state file: {}", err);
                self.state.lock().await.current_session_id.clone()
            }
        }
    }

    async fn set_current_session(&self, session_id: String) -> Result<()> {
        self.update(|state| state.current_session_id = Some(session_id))
            .await
    }

    async fn clear_current_session(&self) -> Result<()> {
        self.update(|state| state.current_session_id = None).await
    }
}
