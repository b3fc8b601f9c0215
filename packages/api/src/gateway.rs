//! # Request gateway
//!
//! [`Gateway`] issues every HTTP request the client makes. It owns the base URL
//! and a handle to the [`SessionStore`], attaches `Authorization: Bearer <token>`
//! whenever a session exists, and runs each response through one classifier
//! ([`classify`] for JSON envelopes, [`check_status`] for raw downloads).
//!
//! When the classifier reports [`RequestError::AuthExpired`] the gateway clears
//! the stored session before handing the error back, so every caller observes a
//! logged-out state afterwards no matter which page made the request.
//!
//! The gateway imposes no timeout and never retries.

use std::path::Path;

use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde_json::Value;
use store::{KvStore, SessionStore};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::RequestError;

/// Form field the backend reads the uploaded file from.
pub const UPLOAD_FIELD: &str = "file";

/// HTTP client bound to one backend and one session.
#[derive(Clone, Debug)]
pub struct Gateway<S> {
    http: reqwest::Client,
    base_url: String,
    session: SessionStore<S>,
}

impl<S: KvStore> Gateway<S> {
    pub fn new(base_url: impl Into<String>, session: SessionStore<S>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, session)
    }

    pub fn with_client(
        http: reqwest::Client,
        base_url: impl Into<String>,
        session: SessionStore<S>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http,
            base_url,
            session,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &SessionStore<S> {
        &self.session
    }

    /// Absolute URL for an API path such as `/api/kml/history`.
    pub fn endpoint(&self, path: &str) -> Result<Url, RequestError> {
        Ok(Url::parse(&format!("{}{}", self.base_url, path))?)
    }

    /// Send a JSON request and return the success envelope.
    pub async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Value, RequestError> {
        debug!(%method, path, "sending request");
        let mut request = self.http.request(method, self.endpoint(path)?);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = self.dispatch(request).await?;
        self.finish_json(response).await
    }

    /// Shorthand for a bodiless GET.
    pub async fn get(&self, path: &str) -> Result<Value, RequestError> {
        self.send::<()>(Method::GET, path, None).await
    }

    /// Upload a local file as multipart form data under [`UPLOAD_FIELD`],
    /// together with any extra text `fields`.
    pub async fn upload(
        &self,
        path: &str,
        file: &Path,
        fields: &[(&str, &str)],
    ) -> Result<Value, RequestError> {
        let bytes = tokio::fs::read(file)
            .await
            .map_err(|source| RequestError::File {
                path: file.to_path_buf(),
                source,
            })?;
        let file_name = file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| UPLOAD_FIELD.to_string());
        debug!(path, file = %file_name, size = bytes.len(), "uploading file");

        let mut form = Form::new().part(UPLOAD_FIELD, Part::bytes(bytes).file_name(file_name));
        for (name, value) in fields {
            form = form.text(name.to_string(), value.to_string());
        }

        let request = self
            .http
            .request(Method::POST, self.endpoint(path)?)
            .multipart(form);
        let response = self.dispatch(request).await?;
        self.finish_json(response).await
    }

    /// GET a binary resource. The body is returned as-is on HTTP 200.
    pub async fn download(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<u8>, RequestError> {
        debug!(path, "downloading");
        let request = self
            .http
            .request(Method::GET, self.endpoint(path)?)
            .query(query);
        let response = self.dispatch(request).await?;
        let status = response.status();
        let body = response.bytes().await.map_err(RequestError::transport)?;
        self.settle(check_status(status, &body)).await?;
        Ok(body.to_vec())
    }

    async fn dispatch(&self, request: RequestBuilder) -> Result<Response, RequestError> {
        let request = match self.session.token().await {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        request.send().await.map_err(RequestError::transport)
    }

    async fn finish_json(&self, response: Response) -> Result<Value, RequestError> {
        let status = response.status();
        let body = response.bytes().await.map_err(RequestError::transport)?;
        self.settle(classify(status, &body)).await
    }

    /// Apply the session side effect of an expired login.
    async fn settle<T>(&self, outcome: Result<T, RequestError>) -> Result<T, RequestError> {
        if let Err(RequestError::AuthExpired) = &outcome {
            info!("server rejected the session, logging out locally");
            if let Err(e) = self.session.clear().await {
                warn!("failed to clear expired session: {e}");
            }
        }
        outcome
    }
}

/// Split a response by HTTP status alone.
///
/// 200 passes, 401 means the session expired, anything else is an HTTP error
/// carrying the server's `detail` or `message` when the body has one.
pub fn check_status(status: StatusCode, body: &[u8]) -> Result<(), RequestError> {
    match status {
        StatusCode::OK => Ok(()),
        StatusCode::UNAUTHORIZED => Err(RequestError::AuthExpired),
        other => Err(RequestError::Http {
            status: other.as_u16(),
            message: error_detail(body),
        }),
    }
}

/// Classify a JSON response into its success envelope or a [`RequestError`].
pub fn classify(status: StatusCode, body: &[u8]) -> Result<Value, RequestError> {
    check_status(status, body)?;

    let envelope: Value = serde_json::from_slice(body)
        .map_err(|e| RequestError::Transport(format!("malformed response body: {e}")))?;
    match envelope.get("code").and_then(Value::as_i64) {
        Some(0) => Ok(envelope),
        Some(code) => {
            let message = envelope
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("request rejected by server")
                .to_string();
            Err(RequestError::Business { code, message })
        }
        None => Err(RequestError::Transport(
            "response envelope has no `code`".to_string(),
        )),
    }
}

fn error_detail(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    ["detail", "message"]
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}
