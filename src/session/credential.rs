//! Session credential and validity rules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Cookie carrying the authentication token.
pub const AUTH_COOKIE: &str = "auth_token";

/// Cookie carrying the CSRF token.
pub const CSRF_COOKIE: &str = "ct0";

/// One browser cookie, in the shape browsers export them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCookie {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default = "default_path")]
    pub path: String,
    /// Expiry in Unix seconds; zero or negative marks a session cookie.
    #[serde(default)]
    pub expires: f64,
    #[serde(default)]
    pub http_only: bool,
    #[serde(default)]
    pub secure: bool,
}

fn default_path() -> String {
    "/".to_string()
}

/// An authenticated cookie set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionCredential {
    pub cookies: Vec<SessionCookie>,
}

impl SessionCredential {
    pub fn new(cookies: Vec<SessionCookie>) -> Self {
        Self { cookies }
    }

    pub fn cookie(&self, name: &str) -> Option<&SessionCookie> {
        self.cookies.iter().find(|c| c.name == name)
    }

    /// Valid when both the auth and CSRF cookies exist and expire strictly after `now`.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        let now = now.timestamp_millis() as f64 / 1000.0;

        [AUTH_COOKIE, CSRF_COOKIE]
            .iter()
            .all(|name| self.cookie(name).is_some_and(|c| c.expires > now))
    }

    /// Validity against the current clock. Always re-evaluated, never cached.
    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const T: i64 = 1_700_000_000;

    fn cookie(name: &str, expires: i64) -> SessionCookie {
        SessionCookie {
            name: name.to_string(),
            value: "v".to_string(),
            domain: ".x.com".to_string(),
            path: "/".to_string(),
            expires: expires as f64,
            http_only: true,
            secure: true,
        }
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_valid_until_first_expiry() {
        let session = SessionCredential::new(vec![cookie(AUTH_COOKIE, T + 100), cookie(CSRF_COOKIE, T + 200)]);

        assert!(session.is_valid_at(at(T)));
        assert!(session.is_valid_at(at(T + 50)));
        assert!(!session.is_valid_at(at(T + 150)));
        assert!(!session.is_valid_at(at(T + 250)));
    }

    #[test]
    fn test_expiry_must_be_strictly_in_future() {
        let session = SessionCredential::new(vec![cookie(AUTH_COOKIE, T), cookie(CSRF_COOKIE, T + 100)]);

        assert!(session.is_valid_at(at(T - 1)));
        assert!(!session.is_valid_at(at(T)));
        assert!(!session.is_valid_at(at(T + 50)));
    }

    #[test]
    fn test_missing_cookie_is_invalid() {
        let session = SessionCredential::new(vec![cookie(AUTH_COOKIE, T + 100)]);
        assert!(!session.is_valid_at(at(T)));

        let session = SessionCredential::new(vec![cookie("other", T + 100), cookie(CSRF_COOKIE, T + 100)]);
        assert!(!session.is_valid_at(at(T)));
    }

    #[test]
    fn test_session_cookie_never_validates() {
        let session = SessionCredential::new(vec![cookie(AUTH_COOKIE, -1), cookie(CSRF_COOKIE, T + 100)]);
        assert!(!session.is_valid_at(at(T)));
    }

    #[test]
    fn test_deserializes_browser_cookie_shape() {
        let json = r#"{"cookies":[{"name":"ct0","value":"abc","domain":".x.com","path":"/",
            "expires":1900000000.5,"size":35,"httpOnly":false,"secure":true,"session":false,
            "sameSite":"Lax"}]}"#;

        let session: SessionCredential = serde_json::from_str(json).unwrap();
        let ct0 = session.cookie(CSRF_COOKIE).unwrap();
        assert_eq!(ct0.value, "abc");
        assert!(ct0.secure);
        assert!(!ct0.http_only);
    }
}
