//! # Wire models for the layer-generation API
//!
//! Request bodies and success payloads of the routes bound in [`crate::Api`].
//! Every success payload arrives inside the `{code, message, ...}` envelope;
//! these types describe the fields next to `code`.
//!
//! | Type | Route |
//! |------|-------|
//! | [`LoginResponse`] | `POST /api/auth/login` |
//! | [`ProfileUpdate`] | `PUT /api/user/profile` (body) |
//! | [`UploadedFile`] | `POST /api/upload/file` |
//! | [`GenerateRequest`] / [`GenerateResult`] | `POST /api/kml/generate` |
//! | [`HistoryRecord`] | `GET /api/kml/history` |

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use store::UserInfo;
use url::Url;

/// Which generation logic the backend applies to an uploaded sheet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerType {
    /// Cell-sector wedges around each site.
    Sector,
    /// Signal-strength (RSRP) sample points.
    Rsrp,
    /// Facility sites such as fiber cabinets and equipment rooms.
    Facility,
}

impl LayerType {
    pub const ALL: [LayerType; 3] = [LayerType::Sector, LayerType::Rsrp, LayerType::Facility];

    pub fn as_str(&self) -> &'static str {
        match self {
            LayerType::Sector => "sector",
            LayerType::Rsrp => "rsrp",
            LayerType::Facility => "facility",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LayerType::Sector => "cell sectors",
            LayerType::Rsrp => "RSRP points",
            LayerType::Facility => "facility sites",
        }
    }
}

impl fmt::Display for LayerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown layer type {0:?} (expected sector, rsrp or facility)")]
pub struct UnknownLayerType(pub String);

impl FromStr for LayerType {
    type Err = UnknownLayerType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        LayerType::ALL
            .into_iter()
            .find(|layer| layer.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownLayerType(s.to_string()))
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct SendCodeRequest<'a> {
    pub phone: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub phone: &'a str,
    pub code: &'a str,
}

/// Successful login: the bearer token and the signed-in user.
#[derive(Clone, Debug, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserInfo,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProfileResponse {
    pub user: UserInfo,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProfileUpdateResponse {
    #[serde(default)]
    pub user: Option<UserInfo>,
}

/// Profile fields to change. Fields left as `None` are not sent.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.nickname.is_none() && self.avatar.is_none()
    }
}

/// A spreadsheet accepted by the backend, referenced by `file_id` afterwards.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct UploadedFile {
    pub file_id: String,
    #[serde(default)]
    pub file_name: Option<String>,
}

/// Body of `POST /api/kml/generate`.
///
/// `config` travels as a JSON-encoded string, or `null` for the backend defaults.
#[derive(Debug, Serialize)]
pub struct GenerateRequest<'a> {
    pub file_id: &'a str,
    pub layer_type: LayerType,
    pub config: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct GenerateResult {
    #[serde(default)]
    pub kml_url: Option<String>,
    #[serde(default)]
    pub history_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct HistoryResponse {
    #[serde(default)]
    pub data: Vec<HistoryRecord>,
}

/// One previously generated KML file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(rename = "file_name", alias = "filename")]
    pub filename: String,
    #[serde(default)]
    pub layer_type: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub kml_url: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl HistoryRecord {
    /// The layer type, when the backend reported one this client knows.
    pub fn layer(&self) -> Option<LayerType> {
        self.layer_type.parse().ok()
    }

    /// Name to pass to `/api/kml/download`.
    ///
    /// Taken from the `filename` query parameter of `kml_url` when present,
    /// otherwise the record's own filename.
    pub fn download_filename(&self) -> String {
        self.kml_url
            .as_deref()
            .and_then(filename_from_url)
            .unwrap_or_else(|| self.filename.clone())
    }
}

fn filename_from_url(kml_url: &str) -> Option<String> {
    let base = Url::parse("http://localhost/").ok()?;
    let url = base.join(kml_url).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == "filename")
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}
