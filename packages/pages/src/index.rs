//! Home page: greets the signed-in user.

use api::Api;
use store::{KvStore, UserInfo};

use crate::effect::{Effect, Route};

pub struct IndexPage<S> {
    api: Api<S>,
    pub user: Option<UserInfo>,
}

impl<S: KvStore> IndexPage<S> {
    pub fn new(api: Api<S>) -> Self {
        Self { api, user: None }
    }

    /// Load the cached user; without a session the user is sent to login.
    pub async fn load(&mut self) -> Effect {
        self.user = self.api.session().get().await.map(|session| session.user);
        match self.user {
            Some(_) => Effect::none(),
            None => Effect::navigate(Route::Login),
        }
    }

    pub fn greeting(&self) -> Option<String> {
        self.user
            .as_ref()
            .map(|user| format!("Hello, {}", user.display_name()))
    }
}
