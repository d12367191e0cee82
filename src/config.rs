use crate::carousel::CarouselTiming;
use crate::media::CloudinaryCredentials;
use std::{env, fmt::Display, path::PathBuf, str::FromStr, time::Duration};
use tracing::{info, warn};

const FALLBACK_SESSION_SECRET: &str = "fallback-secret";

pub struct Config {
    pub port: u16,
    pub data_path: PathBuf,
    pub admin_user: String,
    pub admin_pass: String,
    pub admin_hash: Option<String>,
    pub session_secret: String,
    pub cloudinary: Option<CloudinaryCredentials>,
    pub media_api_base: Option<String>,
    pub media_folder: String,
    pub upload_dir: PathBuf,
    pub carousel: CarouselTiming,
}

impl Config {
    pub fn load() -> Self {
        let session_secret = var("SESSION_SECRET").unwrap_or_else(|_| {
            warn!("SESSION_SECRET not set, sessions are signed with a fallback secret");
            FALLBACK_SESSION_SECRET.to_string()
        });

        Self {
            port: try_load("PORT", "3000"),
            data_path: crate::storage::resolve_data_path(var("APP_DATA_PATH").ok()),
            admin_user: try_load("ADMIN_USER", "admin"),
            admin_pass: var("ADMIN_PASS").unwrap_or_else(|_| "password123".to_string()),
            admin_hash: var("ADMIN_HASH").ok(),
            session_secret,
            cloudinary: load_cloudinary(),
            media_api_base: var("MEDIA_API_BASE").ok(),
            media_folder: try_load("MEDIA_FOLDER", "patz-brat-gallery"),
            upload_dir: try_load("UPLOAD_DIR", "uploads"),
            carousel: load_carousel(),
        }
    }
}

fn load_carousel() -> CarouselTiming {
    let interval = Duration::from_millis(try_load("CAROUSEL_INTERVAL_MS", "4000"));
    let fade = Duration::from_millis(try_load("CAROUSEL_FADE_MS", "1000"));
    let timing = CarouselTiming::new(interval, fade);
    if timing.fade != fade {
        warn!(
            "CAROUSEL_FADE_MS must be shorter than CAROUSEL_INTERVAL_MS, using {}ms",
            timing.fade.as_millis()
        );
    }
    timing
}

fn load_cloudinary() -> Option<CloudinaryCredentials> {
    match (
        var("CLOUDINARY_CLOUD_NAME"),
        var("CLOUDINARY_API_KEY"),
        var("CLOUDINARY_API_SECRET"),
    ) {
        (Ok(cloud_name), Ok(api_key), Ok(api_secret)) => Some(CloudinaryCredentials {
            cloud_name,
            api_key,
            api_secret,
        }),
        _ => {
            info!("media host credentials incomplete, storing uploads on local disk");
            None
        }
    }
}

fn var(key: &str) -> Result<String, ()> {
    env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or(())
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
        })
        .expect("Environment misconfigured!")
}
