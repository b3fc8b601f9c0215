//! User page: profile display and editing, and logout.

use api::{Api, ProfileUpdate};
use store::{KvStore, UserInfo};
use tracing::{debug, warn};

use crate::effect::{Effect, Route};
use crate::validation::ValidationError;

pub struct UserPage<S> {
    api: Api<S>,
    pub user: Option<UserInfo>,
    pub saving: bool,
}

impl<S: KvStore> UserPage<S> {
    pub fn new(api: Api<S>) -> Self {
        Self {
            api,
            user: None,
            saving: false,
        }
    }

    /// Show the cached profile, fetching it from the backend when only the
    /// token survived. Without a token there is nothing to fetch.
    pub async fn load(&mut self) -> Effect {
        if let Some(session) = self.api.session().get().await {
            self.user = Some(session.user);
            return Effect::none();
        }
        if self.api.session().token().await.is_none() {
            return Effect::navigate(Route::Login);
        }

        match self.api.profile().await {
            Ok(user) => {
                if let Err(e) = self.api.session().update_user(&user).await {
                    warn!("failed to cache profile: {e}");
                }
                self.user = Some(user);
                Effect::none()
            }
            Err(e) => {
                debug!("failed to fetch profile: {e}");
                Effect::failed(&e)
            }
        }
    }

    pub async fn update_profile(&mut self, update: ProfileUpdate) -> Effect {
        if update.is_empty() {
            return ValidationError::EmptyUpdate.into();
        }

        self.saving = true;
        let result = self.api.update_profile(&update).await;
        self.saving = false;

        match result {
            Ok(Some(user)) => {
                self.user = Some(user);
                Effect::success("profile updated")
            }
            Ok(None) => {
                if let Some(user) = self.user.as_mut() {
                    apply(user, update);
                    if let Err(e) = self.api.session().update_user(user).await {
                        warn!("failed to cache profile: {e}");
                    }
                }
                Effect::success("profile updated")
            }
            Err(e) => Effect::failed(&e),
        }
    }

    pub async fn logout(&mut self) -> Effect {
        match self.api.logout().await {
            Ok(()) => {
                self.user = None;
                Effect::success("logged out").then(Route::Login)
            }
            Err(e) => Effect::error(format!("failed to log out: {e}")),
        }
    }
}

fn apply(user: &mut UserInfo, update: ProfileUpdate) {
    if let Some(nickname) = update.nickname {
        user.nickname = nickname;
    }
    if let Some(avatar) = update.avatar {
        user.avatar = Some(avatar);
    }
}
