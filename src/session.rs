use axum::http::{HeaderMap, HeaderValue, header::COOKIE};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac};
use rand::{RngCore, rngs::OsRng};
use sha2::Sha256;
use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::RwLock;

pub const SESSION_COOKIE: &str = "sid";
pub const SESSION_TTL: Duration = Duration::from_secs(60 * 60 * 24);

type HmacSha256 = Hmac<Sha256>;

/// Server-side login sessions: id -> expiry.
#[derive(Clone)]
pub struct SessionStore {
    secret: Arc<Vec<u8>>,
    ttl: Duration,
    sessions: Arc<RwLock<HashMap<String, Instant>>>,
}

impl SessionStore {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self::with_ttl(secret, SESSION_TTL)
    }

    pub fn with_ttl(secret: impl Into<Vec<u8>>, ttl: Duration) -> Self {
        Self {
            secret: Arc::new(secret.into()),
            ttl,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Opens a session and returns the signed cookie value for it.
    pub async fn create(&self) -> String {
        let mut raw = [0u8; 32];
        OsRng.fill_bytes(&mut raw);
        let id = URL_SAFE_NO_PAD.encode(raw);
        let now = Instant::now();

        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, expires| *expires > now);
        sessions.insert(id.clone(), now + self.ttl);

        format!("{id}.{}", self.sign(&id))
    }

    pub async fn is_active(&self, cookie_value: &str) -> bool {
        let Some(id) = self.verified_id(cookie_value) else {
            return false;
        };
        let now = Instant::now();
        {
            let sessions = self.sessions.read().await;
            match sessions.get(id) {
                Some(expires) if *expires > now => return true,
                None => return false,
                Some(_) => {}
            }
        }
        self.sessions.write().await.remove(id);
        false
    }

    pub async fn destroy(&self, cookie_value: &str) {
        if let Some(id) = self.verified_id(cookie_value) {
            self.sessions.write().await.remove(id);
        }
    }

    pub fn set_cookie(&self, value: &str) -> HeaderValue {
        cookie_header(&format!(
            "{SESSION_COOKIE}={value}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
            self.ttl.as_secs()
        ))
    }

    pub fn clear_cookie(&self) -> HeaderValue {
        cookie_header(&format!(
            "{SESSION_COOKIE}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0"
        ))
    }

    fn verified_id<'a>(&self, cookie_value: &'a str) -> Option<&'a str> {
        let (id, signature) = cookie_value.rsplit_once('.')?;
        let signature = URL_SAFE_NO_PAD.decode(signature).ok()?;
        self.mac(id).verify_slice(&signature).ok()?;
        Some(id)
    }

    fn sign(&self, id: &str) -> String {
        URL_SAFE_NO_PAD.encode(self.mac(id).finalize().into_bytes())
    }

    fn mac(&self, id: &str) -> HmacSha256 {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).expect("HMAC accepts keys of any length");
        mac.update(id.as_bytes());
        mac
    }
}

fn cookie_header(value: &str) -> HeaderValue {
    HeaderValue::from_str(value).unwrap_or_else(|_| HeaderValue::from_static(""))
}

/// Pulls the session cookie out of the request headers, if any.
pub fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn created_session_is_active_until_destroyed() {
        let store = SessionStore::new("secret");
        let cookie = store.create().await;
        assert!(store.is_active(&cookie).await);

        store.destroy(&cookie).await;
        assert!(!store.is_active(&cookie).await);
    }

    #[tokio::test]
    async fn tampered_or_foreign_cookies_are_rejected() {
        let store = SessionStore::new("secret");
        let cookie = store.create().await;
        let (id, _) = cookie.rsplit_once('.').unwrap();

        assert!(!store.is_active(id).await);
        assert!(!store.is_active(&format!("{id}.AAAA")).await);

        let other = SessionStore::new("other-secret");
        assert!(!other.is_active(&cookie).await);
    }

    #[tokio::test]
    async fn expired_sessions_are_inactive() {
        let store = SessionStore::with_ttl("secret", Duration::ZERO);
        let cookie = store.create().await;
        assert!(!store.is_active(&cookie).await);
    }

    #[test]
    fn session_cookie_is_found_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("theme=dark; sid=abc.def; x=1"));
        assert_eq!(session_cookie(&headers).as_deref(), Some("abc.def"));

        let mut empty = HeaderMap::new();
        empty.insert(COOKIE, HeaderValue::from_static("sid="));
        assert_eq!(session_cookie(&empty), None);
    }

    #[test]
    fn set_cookie_carries_browser_flags() {
        let store = SessionStore::new("secret");
        let header = store.set_cookie("abc.def");
        let header = header.to_str().unwrap();
        assert!(header.contains("HttpOnly"));
        assert!(header.contains("SameSite=Lax"));
        assert!(header.contains("Max-Age=86400"));
    }
}
