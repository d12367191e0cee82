//! Single-admin authentication.
//!
//! The admin password is never kept in plain text once the process is up: the
//! configured hash (or one derived from the default password at start) is a
//! PBKDF2-HMAC-SHA256 key encoded as `pbkdf2-sha256$<rounds>$<salt>$<key>`.

use base64::{Engine, engine::general_purpose::STANDARD as B64};
use pbkdf2::pbkdf2_hmac;
use rand::{RngCore, rngs::OsRng};
use sha2::Sha256;
use subtle::ConstantTimeEq;

const SCHEME: &str = "pbkdf2-sha256";
const DEFAULT_ROUNDS: u32 = 100_000;
const SALT_LEN: usize = 16;
const KEY_LEN: usize = 32;

/// Proof that the caller holds an authenticated admin session.
///
/// Only this crate can mint one, so every mutating store operation that asks
/// for `&AdminToken` is unreachable from unauthenticated code paths.
#[derive(Debug)]
pub struct AdminToken {
    _private: (),
}

impl AdminToken {
    pub(crate) fn issue() -> Self {
        Self { _private: () }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordHash {
    rounds: u32,
    salt: Vec<u8>,
    key: Vec<u8>,
}

impl PasswordHash {
    pub fn derive(password: &str) -> Self {
        let mut salt = vec![0u8; SALT_LEN];
        OsRng.fill_bytes(&mut salt);
        Self::derive_with(password, salt, DEFAULT_ROUNDS)
    }

    pub fn derive_with(password: &str, salt: Vec<u8>, rounds: u32) -> Self {
        let key = derive_key(password, &salt, rounds);
        Self { rounds, salt, key }
    }

    pub fn parse(encoded: &str) -> Option<Self> {
        let mut parts = encoded.trim().split('$');
        if parts.next()? != SCHEME {
            return None;
        }
        let rounds: u32 = parts.next()?.parse().ok().filter(|rounds| *rounds > 0)?;
        let salt = B64.decode(parts.next()?).ok()?;
        let key = B64.decode(parts.next()?).ok()?;
        if parts.next().is_some() || salt.is_empty() || key.len() != KEY_LEN {
            return None;
        }
        Some(Self { rounds, salt, key })
    }

    pub fn encode(&self) -> String {
        format!(
            "{SCHEME}${}${}${}",
            self.rounds,
            B64.encode(&self.salt),
            B64.encode(&self.key)
        )
    }

    pub fn verify(&self, password: &str) -> bool {
        let candidate = derive_key(password, &self.salt, self.rounds);
        bool::from(candidate.as_slice().ct_eq(&self.key))
    }
}

#[derive(Debug, Clone)]
pub struct AdminCredentials {
    username: String,
    hash: PasswordHash,
}

impl AdminCredentials {
    pub fn new(username: impl Into<String>, hash: PasswordHash) -> Self {
        Self {
            username: username.into(),
            hash,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Both fields are always checked so a wrong username costs the same as a
    /// wrong password.
    pub fn verify(&self, username: &str, password: &str) -> bool {
        let user_ok = username.as_bytes().ct_eq(self.username.as_bytes());
        let pass_ok = subtle::Choice::from(u8::from(self.hash.verify(password)));
        bool::from(user_ok & pass_ok)
    }
}

fn derive_key(password: &str, salt: &[u8], rounds: u32) -> Vec<u8> {
    let mut key = vec![0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, rounds, &mut key);
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_hash(password: &str) -> PasswordHash {
        PasswordHash::derive_with(password, b"0123456789abcdef".to_vec(), 1_000)
    }

    #[test]
    fn verify_accepts_only_the_right_password() {
        let hash = fast_hash("hunter2");
        assert!(hash.verify("hunter2"));
        assert!(!hash.verify("hunter3"));
        assert!(!hash.verify(""));
    }

    #[test]
    fn encoded_hash_parses_back() {
        let hash = fast_hash("secret");
        let parsed = PasswordHash::parse(&hash.encode()).expect("parse");
        assert_eq!(parsed, hash);
        assert!(parsed.verify("secret"));
    }

    #[test]
    fn parse_rejects_foreign_formats() {
        assert!(PasswordHash::parse("$2b$10$abcdefghijklmnopqrstuv").is_none());
        assert!(PasswordHash::parse("pbkdf2-sha256$0$AAAA$AAAA").is_none());
        assert!(PasswordHash::parse("pbkdf2-sha256$10$!!$AAAA").is_none());
    }

    #[test]
    fn credentials_require_both_fields() {
        let creds = AdminCredentials::new("admin", fast_hash("pw"));
        assert!(creds.verify("admin", "pw"));
        assert!(!creds.verify("admin", "nope"));
        assert!(!creds.verify("root", "pw"));
        assert!(!creds.verify("adm", "pw"));
    }

    #[test]
    fn derived_salts_differ() {
        let a = PasswordHash::derive_with("pw", vec![1; SALT_LEN], 10);
        let b = PasswordHash::derive_with("pw", vec![2; SALT_LEN], 10);
        assert_ne!(a.encode(), b.encode());
    }
}
