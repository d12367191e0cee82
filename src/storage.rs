use crate::auth::AdminToken;
use crate::errors::StoreError;
use crate::models::{Link, SiteRecord};
use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::{fs, sync::Mutex};
use tracing::{error, info};

/// Where the site record lives between restarts.
#[derive(Debug, Clone)]
pub enum Backend {
    JsonFile(PathBuf),
    Memory,
}

impl Backend {
    async fn load(&self) -> Result<Option<SiteRecord>, StoreError> {
        let Backend::JsonFile(path) = self else {
            return Ok(None);
        };
        match fs::read(path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map(Some).map_err(|err| {
                error!("failed to parse site data at {}: {err}", path.display());
                StoreError::Io(std::io::Error::new(ErrorKind::InvalidData, err))
            }),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => {
                error!("failed to read site data at {}: {err}", path.display());
                Err(err.into())
            }
        }
    }

    async fn save(&self, record: &SiteRecord) -> Result<(), StoreError> {
        let Backend::JsonFile(path) = self else {
            return Ok(());
        };
        persist_record(path, record).await
    }
}

/// Repository over the single site record.
///
/// All access goes through one mutex, so sequential increments from this
/// process never lose updates. Mutations are applied to a copy and only
/// committed once the backend has persisted it.
#[derive(Clone)]
pub struct SiteStore {
    backend: Backend,
    record: Arc<Mutex<SiteRecord>>,
}

impl SiteStore {
    pub async fn open(backend: Backend) -> Result<Self, StoreError> {
        let record = match backend.load().await? {
            Some(record) => record,
            None => {
                info!("no site data found, creating default record");
                let record = SiteRecord::default();
                backend.save(&record).await?;
                record
            }
        };

        Ok(Self {
            backend,
            record: Arc::new(Mutex::new(record)),
        })
    }

    pub fn in_memory(record: SiteRecord) -> Self {
        Self {
            backend: Backend::Memory,
            record: Arc::new(Mutex::new(record)),
        }
    }

    pub async fn read(&self) -> SiteRecord {
        self.record.lock().await.clone()
    }

    pub async fn images(&self) -> Vec<String> {
        self.record.lock().await.images.clone()
    }

    pub async fn view_count(&self) -> u64 {
        self.record.lock().await.view_count
    }

    pub async fn write(
        &self,
        _admin: &AdminToken,
        tagline: String,
        links: Vec<Link>,
    ) -> Result<SiteRecord, StoreError> {
        self.update(|record| {
            record.tagline = tagline;
            record.links = links;
            Ok(())
        })
        .await
    }

    pub async fn append_image(
        &self,
        _admin: &AdminToken,
        url: String,
    ) -> Result<SiteRecord, StoreError> {
        self.update(|record| {
            record.images.push(url);
            Ok(())
        })
        .await
    }

    pub async fn remove_image(&self, _admin: &AdminToken, url: &str) -> Result<SiteRecord, StoreError> {
        self.update(|record| {
            let index = record
                .images
                .iter()
                .position(|image| image == url)
                .ok_or(StoreError::ImageNotFound)?;
            record.images.remove(index);
            Ok(())
        })
        .await
    }

    pub async fn increment_views(&self) -> Result<u64, StoreError> {
        let record = self
            .update(|record| {
                record.view_count = record.view_count.saturating_add(1);
                Ok(())
            })
            .await?;
        Ok(record.view_count)
    }

    async fn update<F>(&self, apply: F) -> Result<SiteRecord, StoreError>
    where
        F: FnOnce(&mut SiteRecord) -> Result<(), StoreError>,
    {
        let mut current = self.record.lock().await;
        let mut next = current.clone();
        apply(&mut next)?;
        self.backend.save(&next).await?;
        *current = next.clone();
        Ok(next)
    }
}

pub fn resolve_data_path(configured: Option<String>) -> PathBuf {
    configured
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data/site.json"))
}

pub async fn persist_record(path: &Path, record: &SiteRecord) -> Result<(), StoreError> {
    let payload = serde_json::to_vec_pretty(record)?;
    let staging = path.with_extension("json.tmp");
    fs::write(&staging, payload).await?;
    fs::rename(&staging, path).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unique_data_path() -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let mut path = std::env::temp_dir();
        path.push(format!("link_page_store_{}_{}.json", std::process::id(), nanos));
        path
    }

    #[tokio::test]
    async fn missing_file_yields_default_record_and_creates_it() {
        let path = unique_data_path();
        let store = SiteStore::open(Backend::JsonFile(path.clone())).await.unwrap();

        assert_eq!(store.read().await, SiteRecord::default());
        assert!(path.exists());
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn writes_survive_reopen() {
        let path = unique_data_path();
        let admin = AdminToken::issue();
        {
            let store = SiteStore::open(Backend::JsonFile(path.clone())).await.unwrap();
            store.append_image(&admin, "https://img/a.png".into()).await.unwrap();
            store.increment_views().await.unwrap();
        }

        let reopened = SiteStore::open(Backend::JsonFile(path.clone())).await.unwrap();
        let record = reopened.read().await;
        assert_eq!(record.images, vec!["https://img/a.png".to_string()]);
        assert_eq!(record.view_count, 1);
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn write_replaces_tagline_and_links_only() {
        let store = SiteStore::in_memory(SiteRecord {
            view_count: 9,
            images: vec!["a".into()],
            ..SiteRecord::default()
        });
        let links = vec![Link {
            name: "Site".into(),
            url: "https://example.com".into(),
            icon: String::new(),
            short_caption: String::new(),
        }];

        let record = store
            .write(&AdminToken::issue(), "Hello".into(), links.clone())
            .await
            .unwrap();

        assert_eq!(record.tagline, "Hello");
        assert_eq!(record.links, links);
        assert_eq!(record.view_count, 9);
        assert_eq!(record.images, vec!["a".to_string()]);
    }

    #[tokio::test]
    async fn remove_preserves_order_of_the_rest() {
        let admin = AdminToken::issue();
        let store = SiteStore::in_memory(SiteRecord::default());
        for url in ["a", "b", "c", "d"] {
            store.append_image(&admin, url.into()).await.unwrap();
        }

        store.remove_image(&admin, "b").await.unwrap();
        assert_eq!(store.images().await, vec!["a", "c", "d"]);

        store.append_image(&admin, "e".into()).await.unwrap();
        store.remove_image(&admin, "e").await.unwrap();
        assert_eq!(store.images().await, vec!["a", "c", "d"]);
    }

    #[tokio::test]
    async fn removing_absent_image_is_not_found_and_changes_nothing() {
        let admin = AdminToken::issue();
        let store = SiteStore::in_memory(SiteRecord {
            images: vec!["a".into(), "b".into()],
            ..SiteRecord::default()
        });

        let err = store.remove_image(&admin, "zzz").await.unwrap_err();
        assert!(matches!(err, StoreError::ImageNotFound));
        assert_eq!(store.images().await, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn sequential_increments_are_not_lost() {
        let store = SiteStore::in_memory(SiteRecord {
            view_count: 40,
            ..SiteRecord::default()
        });
        for _ in 0..25 {
            store.increment_views().await.unwrap();
        }
        assert_eq!(store.view_count().await, 65);
    }

    #[tokio::test]
    async fn failed_persist_leaves_record_untouched() {
        let mut path = unique_data_path();
        path.push("nested/does/not/exist.json");
        let store = SiteStore {
            backend: Backend::JsonFile(path),
            record: Arc::new(Mutex::new(SiteRecord::default())),
        };

        assert!(store.increment_views().await.is_err());
        assert_eq!(store.view_count().await, 0);
    }
}
