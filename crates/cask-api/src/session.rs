//! Upload session cookie.
//!
//! The server keeps no per-session state: the client's cookie carries an
//! ordered list of staging directory paths, most-recently-used first. The
//! value is HMAC-SHA256 signed so clients cannot point uploads at arbitrary
//! directories; a tampered or unparseable cookie is treated as an empty
//! session.

use axum::http::HeaderMap;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::path::{Path, PathBuf};

pub const SESSION_COOKIE: &str = "cask-session";

/// Ordered staging-directory list replayed by the client across PUTs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadSession {
    pub upload_dirs: Vec<PathBuf>,
}

impl UploadSession {
    /// Move `dir` to the front of the list, inserting it if absent.
    pub fn promote(&mut self, dir: &Path) {
        self.upload_dirs.retain(|d| d != dir);
        self.upload_dirs.insert(0, dir.to_path_buf());
    }
}

/// Signs and verifies the session cookie value.
#[derive(Clone)]
pub struct SessionCodec {
    secret: Vec<u8>,
}

impl SessionCodec {
    pub fn new(secret: &str) -> Self {
        Self {
            secret: secret.as_bytes().to_vec(),
        }
    }

    fn sign(&self, payload: &[u8]) -> Vec<u8> {
        let mut mac =
            Hmac::<Sha256>::new_from_slice(&self.secret).expect("HMAC accepts any key size");
        mac.update(payload);
        mac.finalize().into_bytes().to_vec()
    }

    /// Encode a session as `base64url(payload).base64url(mac)`.
    pub fn encode(&self, session: &UploadSession) -> String {
        let payload = serde_json::to_vec(session).expect("session serializes");
        let tag = self.sign(&payload);
        format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(&payload),
            URL_SAFE_NO_PAD.encode(&tag)
        )
    }

    /// Decode a cookie value, returning `None` on any mismatch.
    pub fn decode(&self, value: &str) -> Option<UploadSession> {
        let (payload_b64, tag_b64) = value.split_once('.')?;
        let payload = URL_SAFE_NO_PAD.decode(payload_b64).ok()?;
        let tag = URL_SAFE_NO_PAD.decode(tag_b64).ok()?;
        let mut mac =
            Hmac::<Sha256>::new_from_slice(&self.secret).expect("HMAC accepts any key size");
        mac.update(&payload);
        mac.verify_slice(&tag).ok()?;
        serde_json::from_slice(&payload).ok()
    }

    /// Extract the session from request headers; tampered cookies are an
    /// empty session, never an error.
    pub fn from_headers(&self, headers: &HeaderMap) -> UploadSession {
        headers
            .get(axum::http::header::COOKIE)
            .and_then(|h| h.to_str().ok())
            .and_then(|cookies| {
                cookies.split(';').find_map(|c| {
                    let (name, value) = c.trim().split_once('=')?;
                    if name == SESSION_COOKIE {
                        self.decode(value)
                    } else {
                        None
                    }
                })
            })
            .unwrap_or_default()
    }

    /// `Set-Cookie` header value carrying the updated session.
    pub fn set_cookie_value(&self, session: &UploadSession) -> String {
        format!(
            "{}={}; Path=/; HttpOnly",
            SESSION_COOKIE,
            self.encode(session)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::COOKIE;

    fn codec() -> SessionCodec {
        SessionCodec::new("test-session-secret-at-least-32-chars!!")
    }

    #[test]
    fn test_round_trip() {
        let codec = codec();
        let mut session = UploadSession::default();
        session.promote(Path::new("/tmp/upload-aaa"));
        session.promote(Path::new("/tmp/upload-bbb"));

        let decoded = codec.decode(&codec.encode(&session)).unwrap();
        assert_eq!(decoded, session);
        assert_eq!(
            decoded.upload_dirs,
            vec![
                PathBuf::from("/tmp/upload-bbb"),
                PathBuf::from("/tmp/upload-aaa")
            ]
        );
    }

    #[test]
    fn test_promote_moves_to_front() {
        let mut session = UploadSession::default();
        session.promote(Path::new("/a"));
        session.promote(Path::new("/b"));
        session.promote(Path::new("/a"));
        assert_eq!(
            session.upload_dirs,
            vec![PathBuf::from("/a"), PathBuf::from("/b")]
        );
    }

    #[test]
    fn test_tampered_cookie_is_rejected() {
        let codec = codec();
        let mut session = UploadSession::default();
        session.promote(Path::new("/tmp/upload-aaa"));
        let value = codec.encode(&session);

        let mut tampered = value.clone();
        tampered.replace_range(0..1, "X");
        assert!(codec.decode(&tampered).is_none());

        let other = SessionCodec::new("another-secret-entirely-32-chars-long!");
        assert!(other.decode(&value).is_none());
    }

    #[test]
    fn test_from_headers_with_garbage_is_empty() {
        let codec = codec();
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, "cask-session=not-a-real-cookie".parse().unwrap());
        assert_eq!(codec.from_headers(&headers), UploadSession::default());
        assert_eq!(codec.from_headers(&HeaderMap::new()), UploadSession::default());
    }

    #[test]
    fn test_from_headers_picks_our_cookie() {
        let codec = codec();
        let mut session = UploadSession::default();
        session.promote(Path::new("/tmp/upload-ccc"));
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            format!("other=1; {}={}; more=2", SESSION_COOKIE, codec.encode(&session))
                .parse()
                .unwrap(),
        );
        assert_eq!(codec.from_headers(&headers), session);
    }
}
