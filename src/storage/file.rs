use crate::error::{ClientError, Result};
use crate::storage::{SessionStore, TOKEN_KEY};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::debug;

const SESSION_FILE: &str = "session.json";

/// Credential store backed by a JSON document on disk.
///
/// The document is `{"token": "<credential>"}`. Writes go to a uniquely named
/// temp file in the same directory which is then renamed over the target, so
/// readers never observe a partially written credential.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(SESSION_FILE)
    }

    async fn read_document(&self, path: &Path) -> Result<Option<Map<String, Value>>> {
        let raw = match tokio::fs::read(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(ClientError::Storage(format!(
                    "Failed to read session file {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        let document = serde_json::from_slice::<Value>(&raw).map_err(|e| {
            ClientError::Storage(format!(
                "Session file {} is corrupt: {}",
                path.display(),
                e
            ))
        })?;

        match document {
            Value::Object(map) => Ok(Some(map)),
            _ => Err(ClientError::Storage(format!(
                "Session file {} is not a JSON object",
                path.display()
            ))),
        }
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn get(&self) -> Result<Option<String>> {
        let document = self.read_document(&self.path()).await?;
        Ok(document
            .and_then(|mut map| map.remove(TOKEN_KEY))
            .and_then(|v| v.as_str().map(str::to_string)))
    }

    async fn set(&self, token: &str) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            ClientError::Storage(format!(
                "Failed to create session directory {}: {}",
                self.dir.display(),
                e
            ))
        })?;

        let mut document = Map::new();
        document.insert(TOKEN_KEY.to_string(), Value::String(token.to_string()));
        let data = serde_json::to_vec_pretty(&Value::Object(document))?;

        let tmp_path = self
            .dir
            .join(format!(".{}.{}.tmp", SESSION_FILE, uuid::Uuid::new_v4()));
        let mut file = tokio::fs::File::create(&tmp_path).await?;
        file.write_all(&data).await?;
        file.sync_all().await?;
        drop(file);

        let path = self.path();
        if let Err(e) = tokio::fs::rename(&tmp_path, &path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(ClientError::Storage(format!(
                "Failed to replace session file: {}",
                e
            )));
        }

        debug!(path = %path.display(), "stored session credential");
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let path = self.path();
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!(path = %path.display(), "removed session credential");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ClientError::Storage(format!(
                "Failed to remove session file: {}",
                e
            ))),
        }
    }
}
