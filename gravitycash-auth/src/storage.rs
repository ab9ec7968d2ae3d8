use std::path::PathBuf;

use async_trait::async_trait;
use gravitycash_api::types::User;
use log::*;
use tokio::sync::Mutex;

use crate::error::Result;

/// Where the logged in user survives restarts
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self) -> Result<Option<User>>;
    async fn save(&self, user: &User) -> Result<()>;
    async fn clear(&self) -> Result<()>;
}

/// Keeps the session record as a JSON file on disk
pub struct FileSessionStore {
    pub path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileSessionStore { path: path.into() }
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn load(&self) -> Result<Option<User>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, user: &User) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let body = serde_json::to_vec_pretty(user)?;
        tokio::fs::write(&self.path, body).await?;
        debug!("Stored session of user {} at {}", user.id, self.path.display());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Session store that lives as long as the process
#[derive(Default)]
pub struct MemorySessionStore {
    user: Mutex<Option<User>>,
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self) -> Result<Option<User>> {
        Ok(self.user.lock().await.clone())
    }

    async fn save(&self, user: &User) -> Result<()> {
        *self.user.lock().await = Some(user.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        *self.user.lock().await = None;
        Ok(())
    }
}
