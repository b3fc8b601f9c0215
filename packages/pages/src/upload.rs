//! Upload page: pick a spreadsheet and a layer type, then upload and generate.
//!
//! Upload and generate run as one sequential chain; the page stays in the
//! `uploading` state until the chain resolves either way.

use std::path::{Path, PathBuf};

use api::{Api, GenerateResult, LayerType, RequestError};
use store::KvStore;
use tracing::info;

use crate::effect::{Effect, Route};
use crate::format::format_file_size;
use crate::validation::ValidationError;

/// Largest spreadsheet the backend accepts: 5 MiB.
pub const MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;
/// Spreadsheet extensions the backend can parse.
pub const ACCEPTED_EXTENSIONS: [&str; 3] = ["xlsx", "xls", "csv"];

/// A local file the user picked.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectedFile {
    pub path: PathBuf,
    pub size_bytes: u64,
}

impl SelectedFile {
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn size_label(&self) -> String {
        format_file_size(self.size_bytes)
    }
}

/// Everything needed to run the upload chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingUpload {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub layer_type: LayerType,
}

pub struct UploadPage<S> {
    api: Api<S>,
    pub selected_file: Option<SelectedFile>,
    pub layer_type: Option<LayerType>,
    pub uploading: bool,
    pub last_result: Option<GenerateResult>,
}

impl<S: KvStore> UploadPage<S> {
    pub fn new(api: Api<S>) -> Self {
        Self {
            api,
            selected_file: None,
            layer_type: None,
            uploading: false,
            last_result: None,
        }
    }

    pub async fn choose_file(&mut self, path: impl Into<PathBuf>) -> Effect {
        match inspect_file(&path.into()).await {
            Ok(file) => {
                self.selected_file = Some(file);
                Effect::none()
            }
            Err(e) => e.into(),
        }
    }

    pub fn delete_file(&mut self) {
        self.selected_file = None;
    }

    pub fn select_layer_type(&mut self, layer_type: LayerType) {
        self.layer_type = Some(layer_type);
    }

    /// The upload the page would run now, or why it cannot.
    pub fn pending_upload(&self) -> Result<PendingUpload, ValidationError> {
        let file = self
            .selected_file
            .as_ref()
            .ok_or(ValidationError::MissingFile)?;
        let layer_type = self.layer_type.ok_or(ValidationError::MissingLayerType)?;
        Ok(PendingUpload {
            path: file.path.clone(),
            size_bytes: file.size_bytes,
            layer_type,
        })
    }

    pub async fn submit(&mut self) -> Effect {
        let pending = match self.pending_upload() {
            Ok(pending) => pending,
            Err(e) => return e.into(),
        };

        self.uploading = true;
        let result = upload_and_generate(&self.api, &pending).await;
        self.uploading = false;

        match result {
            Ok(generated) => {
                info!(layer = %pending.layer_type, "layer generated");
                self.selected_file = None;
                self.last_result = Some(generated);
                Effect::success("KML generated").then(Route::History)
            }
            Err(e) => Effect::failed(&e),
        }
    }
}

async fn upload_and_generate<S: KvStore>(
    api: &Api<S>,
    pending: &PendingUpload,
) -> Result<GenerateResult, RequestError> {
    let uploaded = api.upload_file(&pending.path).await?;
    api.generate(&uploaded.file_id, pending.layer_type, None)
        .await
}

async fn inspect_file(path: &Path) -> Result<SelectedFile, ValidationError> {
    let accepted = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            ACCEPTED_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false);
    if !accepted {
        return Err(ValidationError::UnsupportedFileType);
    }

    let unreadable = || ValidationError::UnreadableFile(path.display().to_string());
    let metadata = tokio::fs::metadata(path).await.map_err(|_| unreadable())?;
    if !metadata.is_file() {
        return Err(unreadable());
    }
    if metadata.len() > MAX_UPLOAD_BYTES {
        return Err(ValidationError::FileTooLarge);
    }

    Ok(SelectedFile {
        path: path.to_path_buf(),
        size_bytes: metadata.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sheet(dir: &tempfile::TempDir, name: &str, size: usize) -> PathBuf {
        let file = dir.path().join(name);
        std::fs::write(&file, vec![b'x'; size]).unwrap();
        file
    }

    async fn mount_upload(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/api/upload/file"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": 0, "file_id": "F1", "file_name": "cells.xlsx",
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_choose_file_checks_type_and_size() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let mut page = UploadPage::new(testing::logged_in_api(&server).await);

        let effect = page.choose_file(sheet(&dir, "notes.txt", 10)).await;
        assert_eq!(effect, Effect::from(ValidationError::UnsupportedFileType));
        assert!(page.selected_file.is_none());

        let big = sheet(&dir, "big.csv", MAX_UPLOAD_BYTES as usize + 1);
        assert_eq!(page.choose_file(big).await, Effect::from(ValidationError::FileTooLarge));

        let effect = page.choose_file(dir.path().join("missing.xlsx")).await;
        assert!(effect.is_error());

        let exact = sheet(&dir, "Cells.XLSX", MAX_UPLOAD_BYTES as usize);
        assert_eq!(page.choose_file(exact).await, Effect::none());
        let selected = page.selected_file.clone().unwrap();
        assert_eq!(selected.name(), "Cells.XLSX");
        assert_eq!(selected.size_label(), "5.00MB");

        page.delete_file();
        assert!(page.selected_file.is_none());
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_submit_requires_file_and_layer() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let mut page = UploadPage::new(testing::logged_in_api(&server).await);

        assert_eq!(page.submit().await, Effect::from(ValidationError::MissingFile));

        page.choose_file(sheet(&dir, "cells.csv", 64)).await;
        assert_eq!(page.submit().await, Effect::from(ValidationError::MissingLayerType));

        assert!(!page.uploading);
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upload_then_generate_navigates_to_history() {
        let server = MockServer::start().await;
        mount_upload(&server).await;
        Mock::given(method("POST"))
            .and(path("/api/kml/generate"))
            .and(body_json(json!({"file_id": "F1", "layer_type": "sector", "config": null})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": 0})))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let mut page = UploadPage::new(testing::logged_in_api(&server).await);
        page.choose_file(sheet(&dir, "cells.xlsx", 2048)).await;
        page.select_layer_type(LayerType::Sector);

        let pending = page.pending_upload().unwrap();
        assert_eq!(pending.size_bytes, 2048);
        assert_eq!(pending.layer_type, LayerType::Sector);

        let effect = page.submit().await;
        assert!(!effect.is_error());
        assert_eq!(effect.navigate, Some(Route::History));
        assert!(!page.uploading);
        assert!(page.selected_file.is_none());
        assert_eq!(page.last_result, Some(GenerateResult::default()));
    }

    #[tokio::test]
    async fn test_failed_generate_keeps_selection() {
        let server = MockServer::start().await;
        mount_upload(&server).await;
        Mock::given(method("POST"))
            .and(path("/api/kml/generate"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"code": 3, "message": "missing column RSRP"})),
            )
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let mut page = UploadPage::new(testing::logged_in_api(&server).await);
        page.choose_file(sheet(&dir, "points.csv", 128)).await;
        page.select_layer_type(LayerType::Rsrp);

        let effect = page.submit().await;
        assert_eq!(effect.notice.unwrap().text, "missing column RSRP");
        assert!(effect.navigate.is_none());
        assert!(!page.uploading);
        assert!(page.selected_file.is_some());
    }

    #[tokio::test]
    async fn test_expired_session_during_upload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/upload/file"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let api = testing::logged_in_api(&server).await;
        let mut page = UploadPage::new(api.clone());
        page.choose_file(sheet(&dir, "sites.xls", 128)).await;
        page.select_layer_type(LayerType::Facility);

        let effect = page.submit().await;
        assert!(effect.is_error());
        assert_eq!(effect.navigate, Some(Route::Login));
        assert!(!page.uploading);
        assert!(api.session().get().await.is_none());
        // Generate is never attempted after a failed upload
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }
}
