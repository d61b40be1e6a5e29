//! Access-key credentials and request signing

use base64::{engine::general_purpose::STANDARD, Engine};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;

type HmacSha256 = Hmac<Sha256>;

/// Access-key pair used to sign requests
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    access_key_id: String,
    access_key_secret: String,
}

impl Credentials {
    /// Create credentials from an access-key id and secret
    pub fn new(access_key_id: impl Into<String>, access_key_secret: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            access_key_secret: access_key_secret.into(),
        }
    }

    /// Credentials for unsigned requests
    pub fn anonymous() -> Self {
        Self::new("", "")
    }

    /// Load from `LARA_ACCESS_KEY_ID` and `LARA_ACCESS_KEY_SECRET`
    ///
    /// Missing variables yield anonymous credentials.
    pub fn from_env() -> Self {
        Self::new(
            std::env::var("LARA_ACCESS_KEY_ID").unwrap_or_default(),
            std::env::var("LARA_ACCESS_KEY_SECRET").unwrap_or_default(),
        )
    }

    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    /// Signing is skipped when either half of the pair is empty
    pub fn is_anonymous(&self) -> bool {
        self.access_key_id.is_empty() || self.access_key_secret.is_empty()
    }

    /// Value of the `Authorization` header for one request, or `None` for anonymous credentials
    pub fn authorization(
        &self,
        method: &str,
        path: &str,
        content_md5: &str,
        content_type: &str,
        date: &str,
    ) -> Option<String> {
        if self.is_anonymous() {
            return None;
        }

        let signature = sign(
            &self.access_key_secret,
            method,
            path,
            content_md5,
            content_type,
            date,
        );
        Some(format!("Lara {}:{}", self.access_key_id, signature))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("access_key_secret", &"<redacted>")
            .finish()
    }
}

/// Compute the base64 HMAC-SHA256 signature of one request.
///
/// The signed string is the upper-cased method, path, content hash, content
/// type and date joined by `\n`. Empty fields keep their line.
pub fn sign(
    secret: &str,
    method: &str,
    path: &str,
    content_md5: &str,
    content_type: &str,
    date: &str,
) -> String {
    let string_to_sign = format!(
        "{}\n{}\n{}\n{}\n{}",
        method.to_uppercase(),
        path,
        content_md5,
        content_type,
        date
    );

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(string_to_sign.as_bytes());

    STANDARD.encode(mac.finalize().into_bytes())
}
