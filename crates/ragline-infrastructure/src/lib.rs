//! Persisted application state for ragline.
//!
//! - `state_repository`: file-backed implementation of the shared
//!   "current session id" pointer
//! - `config_service`: client configuration loading
//! - `paths`: platform config-directory resolution

pub mod config_service;
pub mod paths;
pub mod state_repository;

pub use config_service::ClientConfig;
pub use state_repository::TomlSessionDirectory;
