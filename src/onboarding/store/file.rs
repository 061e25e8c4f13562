// SPDX-License-Identifier: MIT

//! File-based session store
//!
//! Each session is stored as `<dir>/<encoded id>.json`, where the id is
//! form-urlencoded so any caller-supplied string maps to one safe file name.
//! Writes go to a temporary file first and are renamed into place, so a
//! crash never leaves a half-written session behind.

use super::{check_version, SessionStore, StoreError};
use crate::onboarding::session::{Session, SessionSummary};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use url::form_urlencoded;

/// Leaves room for the `.json.tmp` suffix under the usual 255 byte limit
const MAX_FILE_STEM: usize = 240;

pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Ensure storage directory exists
    pub async fn init(&self) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    fn session_path(&self, session_id: &str) -> Result<PathBuf, StoreError> {
        let stem: String = form_urlencoded::byte_serialize(session_id.as_bytes()).collect();
        if stem.is_empty() || stem.len() > MAX_FILE_STEM {
            return Err(StoreError::InvalidSessionId(session_id.to_string()));
        }
        Ok(self.dir.join(format!("{}.json", stem)))
    }

    fn decode(session_id: &str, contents: &str) -> Result<Session, StoreError> {
        let session: Session = serde_json::from_str(contents)
            .map_err(|e| StoreError::Corrupted(format!("{}: {}", session_id, e)))?;
        check_version(&session)?;
        Ok(session)
    }
}

#[async_trait]
impl SessionStore for FileStore {
    async fn load(&self, session_id: &str) -> Result<Option<Session>, StoreError> {
        let path = self.session_path(session_id)?;
        let contents = match fs::read_to_string(&path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Self::decode(session_id, &contents).map(Some)
    }

    async fn save(&self, session: &Session) -> Result<(), StoreError> {
        let path = self.session_path(&session.session_id)?;
        self.init().await?;

        let json = serde_json::to_string_pretty(session)?;

        let temp_path = path.with_extension("json.tmp");
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(json.as_bytes()).await?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&temp_path, &path).await?;
        log::debug!("Saved session {} to {}", session.session_id, path.display());
        Ok(())
    }

    async fn list(&self) -> Result<Vec<SessionSummary>, StoreError> {
        self.init().await?;

        let mut entries = fs::read_dir(&self.dir).await?;
        let mut summaries = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let name = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or_default()
                .to_string();

            let contents = match fs::read_to_string(&path).await {
                Ok(c) => c,
                Err(e) => {
                    log::warn!("Skipping unreadable session file {}: {}", path.display(), e);
                    continue;
                }
            };
            match Self::decode(&name, &contents) {
                Ok(session) => summaries.push(session.summary()),
                Err(e) => log::warn!("Skipping session file {}: {}", path.display(), e),
            }
        }

        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(summaries)
    }
}
