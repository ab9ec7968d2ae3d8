use std::{future::Future, sync::Arc, time::Duration};

use gravitycash_api::types::{SigninEmail, User};
use log::*;
use tokio::sync::Mutex;

pub mod error;
pub mod storage;

use error::{Error, Result};
use storage::SessionStore;

/// Simulated latency of the login round trip
pub const DEFAULT_LOGIN_DELAY: Duration = Duration::from_millis(1000);

/// Authentication capability handed explicitly to everything that needs the
/// current user. Cloning shares the same session.
#[derive(Clone)]
pub struct Session {
    user: Arc<Mutex<Option<User>>>,
    store: Arc<dyn SessionStore>,
    login_delay: Duration,
}

impl Session {
    pub fn new(store: Arc<dyn SessionStore>, login_delay: Duration) -> Self {
        Session {
            user: Arc::new(Mutex::new(None)),
            store,
            login_delay,
        }
    }

    /// Session that is already logged in as `user`, the store is left untouched
    pub fn authenticated(store: Arc<dyn SessionStore>, user: User) -> Self {
        Session {
            user: Arc::new(Mutex::new(Some(user))),
            store,
            login_delay: DEFAULT_LOGIN_DELAY,
        }
    }

    /// Pick up a session persisted by an earlier run. A corrupted record is
    /// treated as logged out.
    pub async fn restore(&self) -> Result<Option<User>> {
        let stored = match self.store.load().await {
            Ok(stored) => stored,
            Err(Error::Json(e)) => {
                warn!("Dropping malformed session record: {e}");
                self.store.clear().await?;
                None
            }
            Err(e) => return Err(e),
        };
        if let Some(user) = &stored {
            info!("Restored session of user {}", user.id);
        }
        *self.user.lock().await = stored.clone();
        Ok(stored)
    }

    pub async fn login(&self, credentials: SigninEmail) -> Result<User> {
        tokio::time::sleep(self.login_delay).await;
        if credentials.email.is_empty() || credentials.password.is_empty() {
            debug!("Rejected login with empty credentials");
            return Err(Error::InvalidCredentials);
        }
        let user = User::demo();
        self.store.save(&user).await?;
        *self.user.lock().await = Some(user.clone());
        info!("User {} logged in as {}", credentials.email, user.id);
        Ok(user)
    }

    pub async fn logout(&self) -> Result<()> {
        let previous = self.user.lock().await.take();
        self.store.clear().await?;
        if let Some(user) = previous {
            info!("User {} logged out", user.id);
        }
        Ok(())
    }

    pub async fn current_user(&self) -> Option<User> {
        self.user.lock().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.user.lock().await.is_some()
    }
}

/// Helper for actions that require an authenticated user
pub async fn require_auth<F, Fut, R>(session: &Session, future: F) -> Result<R>
where
    F: FnOnce(User) -> Fut,
    Fut: Future<Output = Result<R>>,
{
    match session.current_user().await {
        Some(user) => future(user).await,
        None => Err(Error::AuthRequired),
    }
}
