//! # API crate — client bindings for the layer-generation service
//!
//! This crate is everything between the pages and the network: settings,
//! the request gateway with its single response classifier, input validators,
//! wire models, and [`Api`], which binds each backend route to a typed method.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`error`] | [`RequestError`] taxonomy and [`ErrorKind`] |
//! | [`gateway`] | [`Gateway`]: bearer credentials, JSON / multipart / download requests, classification |
//! | [`models`] | Request bodies and payloads, [`LayerType`], [`HistoryRecord`] |
//! | [`settings`] | [`Settings`] loaded with the `config` crate |
//! | [`validate`] | Phone and verification-code format checks |
//!
//! ## Routes bound by [`Api`]
//!
//! - **Auth**: `send_code`, `login` (persists the session), `logout` (local only)
//! - **User**: `profile`, `update_profile`
//! - **Upload**: `upload_file`
//! - **KML**: `generate`, `history`, `download_url`, `download`

use std::path::Path;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use store::{KvStore, Session, SessionStore, StoreError, UserInfo};
use tracing::info;

pub mod error;
pub mod gateway;
pub mod models;
pub mod settings;
pub mod validate;

pub use error::{ErrorKind, RequestError};
pub use gateway::Gateway;
pub use models::{
    GenerateRequest, GenerateResult, HistoryRecord, LayerType, LoginResponse, ProfileUpdate,
    UnknownLayerType, UploadedFile,
};
pub use settings::Settings;
pub use validate::{is_valid_code, is_valid_phone};

const SEND_CODE: &str = "/api/auth/send_code";
const LOGIN: &str = "/api/auth/login";
const PROFILE: &str = "/api/user/profile";
const UPLOAD_FILE: &str = "/api/upload/file";
const KML_GENERATE: &str = "/api/kml/generate";
const KML_HISTORY: &str = "/api/kml/history";
const KML_DOWNLOAD: &str = "/api/kml/download";

/// Typed bindings for every backend route, sharing one [`Gateway`].
#[derive(Clone, Debug)]
pub struct Api<S> {
    gateway: Gateway<S>,
}

impl<S: KvStore> Api<S> {
    pub fn new(gateway: Gateway<S>) -> Self {
        Self { gateway }
    }

    pub fn from_settings(settings: &Settings, session: SessionStore<S>) -> Self {
        Self::new(Gateway::new(settings.api.base_url.clone(), session))
    }

    pub fn gateway(&self) -> &Gateway<S> {
        &self.gateway
    }

    pub fn session(&self) -> &SessionStore<S> {
        self.gateway.session()
    }

    /// Ask the backend to text a verification code to `phone`.
    pub async fn send_code(&self, phone: &str) -> Result<(), RequestError> {
        let body = models::SendCodeRequest { phone };
        self.gateway
            .send(Method::POST, SEND_CODE, Some(&body))
            .await?;
        Ok(())
    }

    /// Exchange a phone and verification code for a session, and persist it.
    pub async fn login(&self, phone: &str, code: &str) -> Result<Session, RequestError> {
        let body = models::LoginRequest { phone, code };
        let value = self.gateway.send(Method::POST, LOGIN, Some(&body)).await?;
        let LoginResponse { token, user } = decode(value)?;

        let session = Session { token, user };
        self.session().set(&session).await?;
        info!(user = %session.user.display_name(), "logged in");
        Ok(session)
    }

    /// Forget the local session. The backend keeps no logout state.
    pub async fn logout(&self) -> Result<(), StoreError> {
        self.session().clear().await
    }

    pub async fn profile(&self) -> Result<UserInfo, RequestError> {
        let value = self.gateway.get(PROFILE).await?;
        let response: models::ProfileResponse = decode(value)?;
        Ok(response.user)
    }

    /// Change profile fields. When the backend echoes the updated user, the
    /// cached profile is refreshed and returned.
    pub async fn update_profile(
        &self,
        update: &ProfileUpdate,
    ) -> Result<Option<UserInfo>, RequestError> {
        let value = self
            .gateway
            .send(Method::PUT, PROFILE, Some(update))
            .await?;
        let response: models::ProfileUpdateResponse = decode(value)?;
        if let Some(user) = &response.user {
            self.session().update_user(user).await?;
        }
        Ok(response.user)
    }

    pub async fn upload_file(&self, path: &Path) -> Result<UploadedFile, RequestError> {
        let value = self.gateway.upload(UPLOAD_FILE, path, &[]).await?;
        decode(value)
    }

    /// Request generation of a KML layer from an uploaded file.
    pub async fn generate(
        &self,
        file_id: &str,
        layer_type: LayerType,
        config: Option<&Value>,
    ) -> Result<GenerateResult, RequestError> {
        let body = GenerateRequest {
            file_id,
            layer_type,
            config: config.map(Value::to_string),
        };
        let value = self
            .gateway
            .send(Method::POST, KML_GENERATE, Some(&body))
            .await?;
        decode(value)
    }

    pub async fn history(&self) -> Result<Vec<HistoryRecord>, RequestError> {
        let value = self.gateway.get(KML_HISTORY).await?;
        let response: models::HistoryResponse = decode(value)?;
        Ok(response.data)
    }

    /// Absolute download URL for a generated file.
    pub fn download_url(&self, filename: &str) -> Result<String, RequestError> {
        let mut url = self.gateway.endpoint(KML_DOWNLOAD)?;
        url.query_pairs_mut().append_pair("filename", filename);
        Ok(url.into())
    }

    /// Fetch the bytes of a generated KML file.
    pub async fn download(&self, filename: &str) -> Result<Vec<u8>, RequestError> {
        self.gateway
            .download(KML_DOWNLOAD, &[("filename", filename)])
            .await
    }
}

/// Decode a success envelope into its payload type.
fn decode<T: DeserializeOwned>(value: Value) -> Result<T, RequestError> {
    serde_json::from_value(value)
        .map_err(|e| RequestError::Transport(format!("unexpected response payload: {e}")))
}
