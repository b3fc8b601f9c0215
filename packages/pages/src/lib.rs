//! This crate contains the view state of every page in the client.
//!
//! A page holds the fields its screen shows, runs one user action at a time
//! against [`api::Api`], and answers with an [`Effect`]: an optional
//! [`Notice`] to flash and an optional [`Route`] to move to. Drawing the page,
//! showing the notice and switching screens are left to the front end.

use store::{KvStore, SessionStore};

mod effect;
pub use effect::{Effect, Notice, NoticeLevel, Route};

mod validation;
pub use validation::{check_code, check_phone, ValidationError};

pub mod format;
pub use format::{format_file_size, format_time};

mod login;
pub use login::{FieldErrors, LoginPage, COUNTDOWN_SECS};

mod index;
pub use index::IndexPage;

mod upload;
pub use upload::{PendingUpload, SelectedFile, UploadPage, ACCEPTED_EXTENSIONS, MAX_UPLOAD_BYTES};

mod history;
pub use history::HistoryPage;

mod user;
pub use user::UserPage;

/// The first page to show on launch.
pub async fn initial_route<S: KvStore>(session: &SessionStore<S>) -> Route {
    if session.is_logged_in().await {
        Route::Index
    } else {
        Route::Login
    }
}
