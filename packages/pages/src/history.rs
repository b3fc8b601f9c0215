//! History page: previously generated layers and their downloads.

use std::path::{Path, PathBuf};

use api::{Api, HistoryRecord};
use store::KvStore;
use tracing::debug;

use crate::effect::Effect;

/// Used when a record's filename has no usable final component.
const FALLBACK_FILENAME: &str = "layer.kml";

pub struct HistoryPage<S> {
    api: Api<S>,
    pub records: Vec<HistoryRecord>,
    pub loading: bool,
    pub downloading: bool,
    pub last_download: Option<PathBuf>,
}

impl<S: KvStore> HistoryPage<S> {
    pub fn new(api: Api<S>) -> Self {
        Self {
            api,
            records: Vec::new(),
            loading: true,
            downloading: false,
            last_download: None,
        }
    }

    pub async fn load(&mut self) -> Effect {
        self.loading = true;
        let result = self.api.history().await;
        self.loading = false;

        match result {
            Ok(records) => {
                debug!(count = records.len(), "history loaded");
                self.records = records;
                Effect::none()
            }
            Err(e) => Effect::failed(&e),
        }
    }

    /// Look a record up by 1-based position or by filename.
    ///
    /// A number outside the list is tried as a filename.
    pub fn find(&self, key: &str) -> Option<usize> {
        if let Ok(position) = key.parse::<usize>() {
            if (1..=self.records.len()).contains(&position) {
                return Some(position - 1);
            }
        }
        self.records
            .iter()
            .position(|record| record.filename == key || record.download_filename() == key)
    }

    /// Download the record at `index` into `dest_dir`.
    pub async fn download(&mut self, index: usize, dest_dir: &Path) -> Effect {
        let Some(record) = self.records.get(index) else {
            return Effect::error("no such history record");
        };
        let filename = record.download_filename();

        self.downloading = true;
        let result = self.api.download(&filename).await;
        self.downloading = false;

        let bytes = match result {
            Ok(bytes) => bytes,
            Err(e) => return Effect::failed(&e),
        };

        let target = dest_dir.join(local_name(&filename));
        let written = async {
            tokio::fs::create_dir_all(dest_dir).await?;
            tokio::fs::write(&target, &bytes).await
        }
        .await;
        match written {
            Ok(()) => {
                let effect = Effect::success(format!("saved {}", target.display()));
                self.last_download = Some(target);
                effect
            }
            Err(e) => Effect::error(format!("failed to save {}: {e}", target.display())),
        }
    }
}

/// Final path component of a server-supplied name, so downloads stay in `dest_dir`.
fn local_name(filename: &str) -> &str {
    Path::new(filename)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(FALLBACK_FILENAME)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::Route;
    use crate::testing;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount_history(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/api/kml/history"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": 0,
                "data": [
                    {
                        "id": 2,
                        "layer_type": "rsrp",
                        "file_name": "rsrp_2.kml",
                        "kml_url": "/api/kml/download?filename=rsrp_2.kml",
                        "status": "success",
                        "created_at": "2026-01-06T08:00:00",
                    },
                    {
                        "id": 1,
                        "layer_type": "sector",
                        "file_name": "sector_1.kml",
                        "kml_url": "/api/kml/download?filename=sector_1.kml",
                        "status": "success",
                        "created_at": "2026-01-05T10:30:00",
                    },
                ],
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_load_and_find() {
        let server = MockServer::start().await;
        mount_history(&server).await;

        let mut page = HistoryPage::new(testing::logged_in_api(&server).await);
        assert!(page.loading);
        assert_eq!(page.load().await, Effect::none());
        assert!(!page.loading);
        assert_eq!(page.records.len(), 2);

        assert_eq!(page.find("1"), Some(0));
        assert_eq!(page.find("2"), Some(1));
        assert_eq!(page.find("0"), None);
        assert_eq!(page.find("3"), None);
        assert_eq!(page.find("sector_1.kml"), Some(1));
        assert_eq!(page.find("other.kml"), None);
    }

    #[tokio::test]
    async fn test_find_numeric_filename() {
        let server = MockServer::start().await;
        let mut page = HistoryPage::new(testing::api(&server));
        page.records = serde_json::from_value(json!([
            {"id": 1, "layer_type": "sector", "file_name": "20260105", "created_at": "2026-01-05T10:30:00"},
            {"id": 2, "layer_type": "rsrp", "file_name": "rsrp_2.kml", "created_at": "2026-01-06T08:00:00"},
        ]))
        .unwrap();

        assert_eq!(page.find("2"), Some(1));
        assert_eq!(page.find("20260105"), Some(0));
        assert_eq!(page.find("99"), None);
    }

    #[tokio::test]
    async fn test_load_failure_resets_loading() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/kml/history"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let mut page = HistoryPage::new(testing::logged_in_api(&server).await);
        let effect = page.load().await;
        assert!(effect.is_error());
        assert!(!page.loading);
        assert!(page.records.is_empty());
    }

    #[tokio::test]
    async fn test_load_when_session_expired() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/kml/history"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let api = testing::logged_in_api(&server).await;
        let mut page = HistoryPage::new(api.clone());
        assert_eq!(page.load().await.navigate, Some(Route::Login));
        assert!(api.session().get().await.is_none());
    }

    #[tokio::test]
    async fn test_download_writes_file() {
        let server = MockServer::start().await;
        mount_history(&server).await;
        Mock::given(method("GET"))
            .and(path("/api/kml/download"))
            .and(query_param("filename", "sector_1.kml"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<kml>sector</kml>"))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let mut page = HistoryPage::new(testing::logged_in_api(&server).await);
        page.load().await;

        let effect = page.download(1, &dir.path().join("out")).await;
        assert!(!effect.is_error());
        assert!(!page.downloading);

        let saved = page.last_download.clone().unwrap();
        assert_eq!(saved, dir.path().join("out/sector_1.kml"));
        assert_eq!(std::fs::read_to_string(saved).unwrap(), "<kml>sector</kml>");

        assert!(page.download(5, dir.path()).await.is_error());
    }

    #[tokio::test]
    async fn test_download_missing_file() {
        let server = MockServer::start().await;
        mount_history(&server).await;
        Mock::given(method("GET"))
            .and(path("/api/kml/download"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "file not found"})))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let mut page = HistoryPage::new(testing::logged_in_api(&server).await);
        page.load().await;

        let effect = page.download(0, dir.path()).await;
        assert_eq!(effect.notice.unwrap().text, "file not found");
        assert!(page.last_download.is_none());
    }

    #[test]
    fn test_local_name_strips_directories() {
        assert_eq!(local_name("sector_1.kml"), "sector_1.kml");
        assert_eq!(local_name("../../etc/passwd"), "passwd");
        assert_eq!(local_name(".."), FALLBACK_FILENAME);
    }
}
