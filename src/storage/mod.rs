//! Session credential storage
//!
//! The stored credential is the single piece of shared session state. It is
//! accessed through [`SessionStore`] so the durable file store can be swapped
//! for [`MemorySessionStore`] in tests.

mod file;
mod memory;

pub use file::FileSessionStore;
pub use memory::MemorySessionStore;

use crate::error::Result;
use async_trait::async_trait;

/// Key under which the credential is persisted
pub const TOKEN_KEY: &str = "token";

/// Get/set/clear access to the one active credential
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Current credential, if any
    async fn get(&self) -> Result<Option<String>>;

    /// Replace the stored credential. Either the new value is stored or the
    /// previous state is left untouched.
    async fn set(&self, token: &str) -> Result<()>;

    /// Remove the credential. Clearing an empty store succeeds.
    async fn clear(&self) -> Result<()>;
}
