//! `Content-ID` / `Message-ID` style identifiers: `<local@domain>`.

use std::fmt;

/// A `msg-id` value (RFC 5322 §3.6.4), used for both `Message-ID` and
/// `Content-ID` headers. Always serializes with angle brackets.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentID {
    local: String,
    domain: String,
}

impl ContentID {
    pub fn new(local: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            local: local.into(),
            domain: domain.into(),
        }
    }

    /// Generate a fresh identifier for `domain` using a random UUID as the
    /// local part, the same fallback the teacher's multipart boundary
    /// generator uses when the caller doesn't supply one explicitly.
    pub fn generate(domain: impl Into<String>) -> Self {
        Self {
            local: uuid::Uuid::new_v4().simple().to_string(),
            domain: domain.into(),
        }
    }

    pub fn local(&self) -> &str {
        &self.local
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// The identifier without angle brackets, suitable for a `cid:` URI.
    pub fn as_bare(&self) -> String {
        format!("{}@{}", self.local, self.domain)
    }
}

impl fmt::Display for ContentID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}@{}>", self.local, self.domain)
    }
}
