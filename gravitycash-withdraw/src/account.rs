use async_trait::async_trait;
use gravitycash_api::types::AccountSnapshot;
use gravitycash_auth::Session;

/// Read-only source of the balance a withdrawal is checked against
#[async_trait]
pub trait AccountContext: Send + Sync {
    /// `None` when nobody is authenticated
    async fn snapshot(&self) -> Option<AccountSnapshot>;
}

#[async_trait]
impl AccountContext for Session {
    async fn snapshot(&self) -> Option<AccountSnapshot> {
        self.current_user().await.map(|user| user.snapshot())
    }
}

/// Account with a fixed snapshot
pub struct StaticAccount {
    pub snapshot: Option<AccountSnapshot>,
}

impl StaticAccount {
    pub fn new(snapshot: AccountSnapshot) -> Self {
        StaticAccount {
            snapshot: Some(snapshot),
        }
    }

    pub fn anonymous() -> Self {
        StaticAccount { snapshot: None }
    }
}

#[async_trait]
impl AccountContext for StaticAccount {
    async fn snapshot(&self) -> Option<AccountSnapshot> {
        self.snapshot.clone()
    }
}
