//! HTTP Basic credential codec (RFC 7617).

use std::fmt;

use axum::http::header::{self, InvalidHeaderValue};
use axum::http::{HeaderMap, HeaderValue};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

const MAX_BASIC_CREDENTIALS_BYTES: usize = 4096;

#[derive(Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print the password
        f.debug_struct("BasicCredentials")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Parse `Authorization: Basic <base64(user:pass)>`.
///
/// Returns `None` for any other scheme or a malformed payload.
pub fn parse_basic(headers: &HeaderMap) -> Option<BasicCredentials> {
    let raw = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let mut parts = raw.split_whitespace();
    let scheme = parts.next()?;
    let encoded = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    if encoded.len() > MAX_BASIC_CREDENTIALS_BYTES {
        return None;
    }

    let decoded = STANDARD.decode(encoded).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;

    Some(BasicCredentials {
        username: username.to_string(),
        password: password.to_string(),
    })
}

/// Build an `Authorization` header value for `username:password`.
pub fn basic_header_value(
    username: &str,
    password: &str,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let encoded = STANDARD.encode(format!("{username}:{password}"));
    HeaderValue::try_from(format!("Basic {encoded}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_authorization(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(value).expect("header value"),
        );
        headers
    }

    #[test]
    fn parses_basic_credentials_case_insensitively() {
        // "alice:s3cret"
        let creds = parse_basic(&with_authorization("Basic YWxpY2U6czNjcmV0")).unwrap();
        assert_eq!(creds.username, "alice");
        assert_eq!(creds.password, "s3cret");

        let creds = parse_basic(&with_authorization("basic YWxpY2U6czNjcmV0")).unwrap();
        assert_eq!(creds.username, "alice");
    }

    #[test]
    fn password_may_contain_colons_and_be_empty() {
        let headers = with_authorization(&format!("Basic {}", STANDARD.encode("bob:a:b")));
        let creds = parse_basic(&headers).unwrap();
        assert_eq!(creds.username, "bob");
        assert_eq!(creds.password, "a:b");

        let headers = with_authorization(&format!("Basic {}", STANDARD.encode("bob:")));
        assert_eq!(parse_basic(&headers).unwrap().password, "");
    }

    #[test]
    fn rejects_other_schemes_and_garbage() {
        assert_eq!(parse_basic(&HeaderMap::new()), None);
        assert_eq!(parse_basic(&with_authorization("Bearer abc")), None);
        assert_eq!(parse_basic(&with_authorization("Basic")), None);
        assert_eq!(parse_basic(&with_authorization("Basic !!!")), None);
        assert_eq!(parse_basic(&with_authorization("Basic YWxpY2U6 extra")), None);
        // "alice" without a colon
        assert_eq!(parse_basic(&with_authorization("Basic YWxpY2U=")), None);

        let long = format!("Basic {}", "a".repeat(MAX_BASIC_CREDENTIALS_BYTES + 4));
        assert_eq!(parse_basic(&with_authorization(&long)), None);
    }

    #[test]
    fn header_value_is_derived_from_the_principal() {
        let alice = basic_header_value("alice", "").unwrap();
        let bob = basic_header_value("bob", "").unwrap();
        assert_ne!(alice, bob);

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, alice);
        let creds = parse_basic(&headers).unwrap();
        assert_eq!(creds.username, "alice");
        assert_eq!(creds.password, "");
    }

    #[test]
    fn debug_output_redacts_the_password() {
        let creds = BasicCredentials {
            username: "alice".to_string(),
            password: "s3cret".to_string(),
        };
        let printed = format!("{creds:?}");
        assert!(printed.contains("alice"));
        assert!(!printed.contains("s3cret"));
    }
}
