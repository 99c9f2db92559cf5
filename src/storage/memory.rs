use crate::error::{ClientError, Result};
use crate::storage::SessionStore;
use async_trait::async_trait;
use std::sync::RwLock;

/// Process-local credential store
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    token: RwLock<Option<String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self) -> Result<Option<String>> {
        let guard = self.token.read().map_err(|_| {
            ClientError::Storage("Failed to acquire token read lock".to_string())
        })?;
        Ok(guard.clone())
    }

    async fn set(&self, token: &str) -> Result<()> {
        let mut guard = self.token.write().map_err(|_| {
            ClientError::Storage("Failed to acquire token write lock".to_string())
        })?;
        *guard = Some(token.to_string());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let mut guard = self.token.write().map_err(|_| {
            ClientError::Storage("Failed to acquire token write lock".to_string())
        })?;
        *guard = None;
        Ok(())
    }
}
