//! What a page asks the front end to do after an action.

use api::RequestError;

use crate::validation::ValidationError;

/// Screens of the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    Login,
    Index,
    Upload,
    History,
    User,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// A transient message, the equivalent of a toast.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Effect {
    pub notice: Option<Notice>,
    pub navigate: Option<Route>,
}

impl Effect {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self::notice(NoticeLevel::Success, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::notice(NoticeLevel::Error, text)
    }

    pub fn navigate(route: Route) -> Self {
        Self::none().then(route)
    }

    /// Error notice for a failed request. An expired session also routes to login.
    pub fn failed(err: &RequestError) -> Self {
        let effect = Self::error(err.user_message());
        if err.is_auth_expired() {
            effect.then(Route::Login)
        } else {
            effect
        }
    }

    pub fn then(mut self, route: Route) -> Self {
        self.navigate = Some(route);
        self
    }

    pub fn is_error(&self) -> bool {
        matches!(
            self.notice,
            Some(Notice {
                level: NoticeLevel::Error,
                ..
            })
        )
    }

    fn notice(level: NoticeLevel, text: impl Into<String>) -> Self {
        Self {
            notice: Some(Notice {
                level,
                text: text.into(),
            }),
            navigate: None,
        }
    }
}

impl From<ValidationError> for Effect {
    fn from(err: ValidationError) -> Self {
        Self::error(err.to_string())
    }
}
