// SPDX-License-Identifier: MIT

//! Storage errors

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Session corrupted: {0}")]
    Corrupted(String),

    #[error("Session {session_id} has unsupported state version '{version}'")]
    UnsupportedVersion { session_id: String, version: String },

    #[error("Invalid session id '{0}'")]
    InvalidSessionId(String),
}
