//! Login page: phone + verification code sign-in.
//!
//! The typed code is remembered per phone in the [`VerificationCache`] while a
//! login is in flight, so re-entering the same phone within five minutes after
//! a failed attempt fills the code back in. A successful login forgets it.
//!
//! The resend countdown is also recorded in the cache, so a page opened later
//! for the same phone picks up the remaining wait.

use api::Api;
use store::{Clock, KvStore, SystemClock, VerificationCache};
use tracing::{debug, warn};

use crate::effect::{Effect, Route};
use crate::validation::{check_code, check_phone, ValidationError};

/// Seconds before another code may be requested.
pub const COUNTDOWN_SECS: u32 = 60;

/// Per-field validation messages shown under the inputs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldErrors {
    pub phone: Option<ValidationError>,
    pub code: Option<ValidationError>,
}

impl FieldErrors {
    pub fn is_empty(&self) -> bool {
        self.phone.is_none() && self.code.is_none()
    }
}

pub struct LoginPage<S, C = SystemClock> {
    api: Api<S>,
    codes: VerificationCache<S, C>,
    pub phone: String,
    pub code: String,
    pub countdown: u32,
    pub loading: bool,
    pub errors: FieldErrors,
}

impl<S: KvStore + Clone> LoginPage<S> {
    pub fn new(api: Api<S>) -> Self {
        let codes = VerificationCache::new(api.session().backend().clone());
        Self::with_cache(api, codes)
    }
}

impl<S: KvStore, C: Clock> LoginPage<S, C> {
    pub fn with_cache(api: Api<S>, codes: VerificationCache<S, C>) -> Self {
        Self {
            api,
            codes,
            phone: String::new(),
            code: String::new(),
            countdown: 0,
            loading: false,
            errors: FieldErrors::default(),
        }
    }

    /// Set the phone field, clearing its error and restoring a remembered code.
    pub async fn input_phone(&mut self, value: impl Into<String>) {
        self.phone = value.into();
        self.errors.phone = None;
        if self.code.is_empty() && check_phone(&self.phone).is_ok() {
            if let Some(code) = self.codes.get(&self.phone).await {
                debug!("restored remembered verification code");
                self.code = code;
            }
        }
    }

    pub fn input_code(&mut self, value: impl Into<String>) {
        self.code = value.into();
        self.errors.code = None;
    }

    /// Advance the resend countdown by one second.
    pub fn tick(&mut self) -> u32 {
        self.countdown = self.countdown.saturating_sub(1);
        self.countdown
    }

    pub async fn send_code(&mut self) -> Effect {
        if let Err(e) = check_phone(&self.phone) {
            self.errors.phone = Some(e);
            return Effect::none();
        }
        let wait = self
            .countdown
            .max(self.codes.resend_wait(&self.phone, COUNTDOWN_SECS).await);
        if wait > 0 {
            self.countdown = wait;
            return ValidationError::CountdownActive(wait).into();
        }

        self.loading = true;
        let result = self.api.send_code(&self.phone).await;
        self.loading = false;

        match result {
            Ok(()) => {
                self.countdown = COUNTDOWN_SECS;
                if let Err(e) = self.codes.mark_sent(&self.phone).await {
                    warn!("failed to record code request time: {e}");
                }
                Effect::success("verification code sent")
            }
            Err(e) => Effect::failed(&e),
        }
    }

    pub async fn login(&mut self) -> Effect {
        let errors = FieldErrors {
            phone: check_phone(&self.phone).err(),
            code: check_code(&self.code).err(),
        };
        if !errors.is_empty() {
            self.errors = errors;
            return Effect::none();
        }

        if let Err(e) = self.codes.save(&self.phone, &self.code).await {
            warn!("failed to remember verification code: {e}");
        }

        self.loading = true;
        let result = self.api.login(&self.phone, &self.code).await;
        self.loading = false;

        match result {
            Ok(_) => {
                if let Err(e) = self.codes.clear(&self.phone).await {
                    warn!("failed to forget verification code: {e}");
                }
                Effect::success("logged in").then(Route::Index)
            }
            Err(e) => Effect::failed(&e),
        }
    }
}
