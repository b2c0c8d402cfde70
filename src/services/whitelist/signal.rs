//! Trust marker inspection.
//!
//! The reverse proxy in front of the server classifies client addresses and
//! sets the marker header; this module only checks it. It must be stripped
//! from client input by the proxy, which is outside this crate.

use axum::http::{HeaderMap, HeaderName, HeaderValue};

#[derive(Debug, Clone)]
pub struct TrustSignal {
    header: HeaderName,
    expected: HeaderValue,
}

impl TrustSignal {
    pub fn new(header: HeaderName, expected: HeaderValue) -> Self {
        Self { header, expected }
    }

    /// `true` iff the marker occurs exactly once with the canonical value.
    ///
    /// Comparison is byte-exact: no trimming, no case folding, no truthiness.
    pub fn read(&self, headers: &HeaderMap) -> bool {
        let mut values = headers.get_all(&self.header).iter();
        let (Some(value), None) = (values.next(), values.next()) else {
            return false;
        };
        value.as_bytes() == self.expected.as_bytes()
    }
}
