//! Image blob storage.
//!
//! Two backends share one contract: `store` hands back a public URL for the
//! uploaded bytes, `remove` deletes whatever that URL points at. The remote
//! host is Cloudinary; the local-disk backend is kept for running without
//! credentials and serves files from `/uploads`.

use crate::errors::MediaError;
use axum::body::Bytes;
use chrono::Utc;
use reqwest::{
    Client,
    multipart::{Form, Part},
};
use serde::Deserialize;
use sha1::{Digest, Sha1};
use std::{io::ErrorKind, path::PathBuf};
use tokio::fs;
use tracing::{info, warn};

pub const LOCAL_URL_PREFIX: &str = "/uploads";
const CLOUDINARY_API: &str = "https://api.cloudinary.com/v1_1";

#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Bytes,
}

#[derive(Clone)]
pub enum MediaStore {
    Cloudinary(CloudinaryStore),
    LocalDisk(LocalDiskStore),
}

impl MediaStore {
    pub async fn store(&self, upload: Upload) -> Result<String, MediaError> {
        match self {
            MediaStore::Cloudinary(store) => store.store(upload).await,
            MediaStore::LocalDisk(store) => store.store(upload).await,
        }
    }

    pub async fn remove(&self, url: &str) -> Result<(), MediaError> {
        match self {
            MediaStore::Cloudinary(store) => store.remove(url).await,
            MediaStore::LocalDisk(store) => store.remove(url).await,
        }
    }

    pub fn local(&self) -> Option<&LocalDiskStore> {
        match self {
            MediaStore::LocalDisk(store) => Some(store),
            MediaStore::Cloudinary(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CloudinaryCredentials {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}

#[derive(Clone)]
pub struct CloudinaryStore {
    client: Client,
    credentials: CloudinaryCredentials,
    folder: String,
    api_base: String,
}

#[derive(Debug, Deserialize)]
struct UploadResult {
    secure_url: Option<String>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct DestroyResult {
    result: Option<String>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

impl CloudinaryStore {
    pub fn new(credentials: CloudinaryCredentials, folder: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            credentials,
            folder: folder.into(),
            api_base: CLOUDINARY_API.to_string(),
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    async fn store(&self, upload: Upload) -> Result<String, MediaError> {
        let timestamp = Utc::now().timestamp().to_string();
        let signature = self.sign(&[
            ("folder", self.folder.as_str()),
            ("timestamp", timestamp.as_str()),
        ]);

        let part = Part::bytes(upload.bytes.to_vec()).file_name(upload.file_name);
        let form = Form::new()
            .part("file", part)
            .text("api_key", self.credentials.api_key.clone())
            .text("folder", self.folder.clone())
            .text("timestamp", timestamp)
            .text("signature", signature);

        let response: UploadResult = self
            .client
            .post(self.endpoint("upload"))
            .multipart(form)
            .send()
            .await?
            .json()
            .await?;

        match response {
            UploadResult {
                secure_url: Some(url),
                ..
            } => {
                info!("image uploaded to media host: {url}");
                Ok(url)
            }
            UploadResult { error, .. } => Err(MediaError::Rejected(
                error.map_or_else(|| "no url returned".to_string(), |err| err.message),
            )),
        }
    }

    async fn remove(&self, url: &str) -> Result<(), MediaError> {
        let public_id =
            public_id_from_url(url).ok_or_else(|| MediaError::MalformedUrl(url.to_string()))?;

        if !public_id.starts_with(&format!("{}/", self.folder)) {
            warn!(
                "derived media id {public_id} is outside folder {}, skipping remote delete",
                self.folder
            );
            return Ok(());
        }

        info!("deleting media host object: {public_id}");
        let timestamp = Utc::now().timestamp().to_string();
        let signature = self.sign(&[
            ("public_id", public_id.as_str()),
            ("timestamp", timestamp.as_str()),
        ]);
        let params = [
            ("public_id", public_id.as_str()),
            ("timestamp", timestamp.as_str()),
            ("api_key", self.credentials.api_key.as_str()),
            ("signature", signature.as_str()),
        ];

        let response: DestroyResult = self
            .client
            .post(self.endpoint("destroy"))
            .form(&params)
            .send()
            .await?
            .json()
            .await?;

        match (response.result.as_deref(), response.error) {
            (Some("ok"), _) => Ok(()),
            (Some("not found"), _) => {
                warn!("media host had no object {public_id}");
                Ok(())
            }
            (_, Some(err)) => Err(MediaError::Rejected(err.message)),
            (other, None) => Err(MediaError::Rejected(format!(
                "unexpected destroy result: {}",
                other.unwrap_or("none")
            ))),
        }
    }

    fn endpoint(&self, action: &str) -> String {
        format!(
            "{}/{}/image/{action}",
            self.api_base, self.credentials.cloud_name
        )
    }

    /// Params must already be sorted by key.
    fn sign(&self, params: &[(&str, &str)]) -> String {
        let joined = params
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("&");
        let mut hasher = Sha1::new();
        hasher.update(joined.as_bytes());
        hasher.update(self.credentials.api_secret.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

/// Media host object id for a delivery URL: the trailing `folder/name`
/// with the extension dropped.
pub fn public_id_from_url(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next()?;
    let mut segments = path.rsplit('/').filter(|segment| !segment.is_empty());
    let file = segments.next()?;
    let folder = segments.next()?;
    if folder.contains(':') {
        return None;
    }
    let stem = match file.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => file,
    };
    Some(format!("{folder}/{stem}"))
}

#[derive(Debug, Clone)]
pub struct LocalDiskStore {
    dir: PathBuf,
}

impl LocalDiskStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path on disk for a served filename, refusing anything that could escape
    /// the upload directory.
    pub fn path_for(&self, file_name: &str) -> Option<PathBuf> {
        is_safe_file_name(file_name).then(|| self.dir.join(file_name))
    }

    async fn store(&self, upload: Upload) -> Result<String, MediaError> {
        fs::create_dir_all(&self.dir).await?;
        let file_name = format!(
            "{}-{}",
            Utc::now().timestamp_millis(),
            sanitize_file_name(&upload.file_name)
        );
        fs::write(self.dir.join(&file_name), &upload.bytes).await?;
        info!("image stored on disk: {file_name}");
        Ok(local_url(&file_name))
    }

    async fn remove(&self, url: &str) -> Result<(), MediaError> {
        let file_name = url
            .rsplit('/')
            .next()
            .filter(|name| is_safe_file_name(name))
            .ok_or_else(|| MediaError::MalformedUrl(url.to_string()))?;

        match fs::remove_file(self.dir.join(file_name)).await {
            Ok(()) => {
                info!("deleted image file: {file_name}");
                Ok(())
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                warn!("image file already gone: {file_name}");
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }
}

pub fn local_url(file_name: &str) -> String {
    format!("{LOCAL_URL_PREFIX}/{file_name}")
}

pub fn content_type_for(file_name: &str) -> &'static str {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "avif" => "image/avif",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "image".to_string()
    } else {
        cleaned.to_string()
    }
}

fn is_safe_file_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}
