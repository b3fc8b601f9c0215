//! Session store: the bearer token and cached profile of the signed-in user.
//!
//! The two halves live under separate keys ([`TOKEN_KEY`], [`USER_INFO_KEY`])
//! but are always written and cleared together. A lone key left behind by an
//! interrupted write reads as logged out. A lone token still authorizes
//! requests, so the profile can be fetched again and written back with
//! [`SessionStore::update_user`], completing the session.

use serde_json::Value;
use tracing::{info, warn};

use crate::kv::{KvStore, StoreError};
use crate::models::UserInfo;

/// Key holding the bearer token as a JSON string.
pub const TOKEN_KEY: &str = "token";
/// Key holding the cached [`UserInfo`].
pub const USER_INFO_KEY: &str = "userInfo";

/// A signed-in session.
#[derive(Clone, Debug, PartialEq)]
pub struct Session {
    pub token: String,
    pub user: UserInfo,
}

/// Session persistence over any [`KvStore`].
#[derive(Clone, Debug)]
pub struct SessionStore<S> {
    store: S,
}

impl<S: KvStore> SessionStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The backing store, for components that keep their own keys next to the session.
    pub fn backend(&self) -> &S {
        &self.store
    }

    /// Load the session, or `None` when either half is missing or unreadable.
    pub async fn get(&self) -> Option<Session> {
        let token = self.read_token().await?;
        let user = self.read_user().await?;
        Some(Session { token, user })
    }

    /// The stored bearer token, whether or not a profile is cached next to it.
    pub async fn token(&self) -> Option<String> {
        self.read_token().await
    }

    pub async fn is_logged_in(&self) -> bool {
        self.get().await.is_some()
    }

    /// Persist both halves of `session`.
    ///
    /// If the profile cannot be written the token is removed again.
    pub async fn set(&self, session: &Session) -> Result<(), StoreError> {
        let user = serde_json::to_value(&session.user)?;
        self.store
            .set(TOKEN_KEY, Value::String(session.token.clone()))
            .await?;
        if let Err(e) = self.store.set(USER_INFO_KEY, user).await {
            if let Err(rollback) = self.store.remove(TOKEN_KEY).await {
                warn!("failed to roll back token after profile write failed: {rollback}");
            }
            return Err(e);
        }
        info!(user = %session.user.display_name(), "session stored");
        Ok(())
    }

    /// Remove both halves. Both removals are attempted even if the first fails.
    pub async fn clear(&self) -> Result<(), StoreError> {
        let token = self.store.remove(TOKEN_KEY).await;
        let user = self.store.remove(USER_INFO_KEY).await;
        info!("session cleared");
        token.and(user)
    }

    /// Replace the cached profile, or restore it next to a lone token.
    ///
    /// Returns `false` without writing anything when no token is stored.
    pub async fn update_user(&self, user: &UserInfo) -> Result<bool, StoreError> {
        if self.read_token().await.is_none() {
            return Ok(false);
        }
        self.store
            .set(USER_INFO_KEY, serde_json::to_value(user)?)
            .await?;
        Ok(true)
    }

    async fn read_token(&self) -> Option<String> {
        match self.store.get(TOKEN_KEY).await {
            Ok(Some(Value::String(token))) if !token.is_empty() => Some(token),
            Ok(_) => None,
            Err(e) => {
                warn!("failed to read token: {e}");
                None
            }
        }
    }

    async fn read_user(&self) -> Option<UserInfo> {
        match self.store.get(USER_INFO_KEY).await {
            Ok(Some(value)) => match serde_json::from_value(value) {
                Ok(user) => Some(user),
                Err(e) => {
                    warn!("cached user info is malformed: {e}");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!("failed to read user info: {e}");
                None
            }
        }
    }
}
