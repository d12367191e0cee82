use crate::auth::{AdminCredentials, PasswordHash};
use crate::carousel::CarouselTiming;
use crate::config::Config;
use crate::errors::StoreError;
use crate::media::{CloudinaryStore, LocalDiskStore, MediaStore};
use crate::models::ClickTally;
use crate::session::SessionStore;
use crate::storage::{Backend, SiteStore};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

#[derive(Clone)]
pub struct AppState {
    pub store: SiteStore,
    pub media: MediaStore,
    pub sessions: SessionStore,
    pub admin: Arc<AdminCredentials>,
    pub clicks: Arc<Mutex<ClickTally>>,
    pub carousel: CarouselTiming,
}

impl AppState {
    pub fn new(
        store: SiteStore,
        media: MediaStore,
        sessions: SessionStore,
        admin: AdminCredentials,
        carousel: CarouselTiming,
    ) -> Self {
        Self {
            store,
            media,
            sessions,
            admin: Arc::new(admin),
            clicks: Arc::new(Mutex::new(ClickTally::new())),
            carousel,
        }
    }

    pub async fn from_config(config: &Config) -> Result<Self, StoreError> {
        let store = SiteStore::open(Backend::JsonFile(config.data_path.clone())).await?;

        let media = match &config.cloudinary {
            Some(credentials) => {
                info!("storing uploads on media host {}", credentials.cloud_name);
                let store = CloudinaryStore::new(credentials.clone(), config.media_folder.clone());
                MediaStore::Cloudinary(match &config.media_api_base {
                    Some(base) => store.with_api_base(base.clone()),
                    None => store,
                })
            }
            None => MediaStore::LocalDisk(LocalDiskStore::new(config.upload_dir.clone())),
        };

        let hash = match config.admin_hash.as_deref().map(PasswordHash::parse) {
            Some(Some(hash)) => hash,
            Some(None) => {
                warn!("ADMIN_HASH is not a pbkdf2-sha256 hash, deriving from ADMIN_PASS");
                PasswordHash::derive(&config.admin_pass)
            }
            None => PasswordHash::derive(&config.admin_pass),
        };

        Ok(Self::new(
            store,
            media,
            SessionStore::new(config.session_secret.clone()),
            AdminCredentials::new(config.admin_user.clone(), hash),
            config.carousel,
        ))
    }
}
