use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_TAGLINE: &str = "💖 Welcome to Patz Brat 💖";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub short_caption: String,
}

/// The one persisted document behind the whole site.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SiteRecord {
    #[serde(default = "default_tagline")]
    pub tagline: String,
    #[serde(alias = "views", default)]
    pub view_count: u64,
    #[serde(default)]
    pub links: Vec<Link>,
    #[serde(default)]
    pub images: Vec<String>,
}

fn default_tagline() -> String {
    DEFAULT_TAGLINE.to_string()
}

impl Default for SiteRecord {
    fn default() -> Self {
        Self {
            tagline: default_tagline(),
            view_count: 0,
            links: Vec::new(),
            images: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateSiteRequest {
    pub tagline: String,
    #[serde(default)]
    pub links: Vec<Link>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteRequest {
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ViewsQuery {
    pub count: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ViewsResponse {
    pub views: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse {
    pub success: bool,
    pub removed_url: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthStatus {
    pub logged_in: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ClickStats {
    pub count: u64,
    pub last_clicked: String,
}

pub type ClickTally = BTreeMap<String, ClickStats>;
