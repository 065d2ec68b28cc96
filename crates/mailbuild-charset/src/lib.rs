//! Charset registry: resolves an IANA-ish label to something that can turn
//! a Rust `&str` into the bytes of that charset.
//!
//! This is deliberately narrow: callers that need charset *detection* or
//! *decoding* (inbound mail) should reach for a crate such as `charset` or
//! `charset-normalizer-rs`; this crate only answers "given this label, can I
//! turn this string into bytes, and what is the canonical name I should put
//! in a `charset=` parameter".

use encoding_rs::Encoding;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CharsetError {
    #[error("no charset registered for label '{0}'")]
    NoCharacterSetName(String),
    #[error("charset '{charset}' cannot represent the supplied text")]
    DataConversionFailure { charset: String },
}

/// A resolved charset, capable of turning `&str` into bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharsetEncoder {
    /// Plain UTF-8: every `&str` encodes losslessly.
    Utf8,
    /// US-ASCII: encodes only if every scalar is within 0x00..=0x7F.
    /// Handled specially because the WHATWG encoding standard that
    /// `encoding_rs` implements maps the `us-ascii` label to windows-1252,
    /// which is not what RFC 2047/5321 mean by US-ASCII.
    Ascii,
    /// Any other label, delegated to `encoding_rs`.
    Other(&'static Encoding),
}

impl CharsetEncoder {
    /// Resolve a label such as "utf-8", "UTF8", "iso-2022-jp", "us-ascii".
    pub fn for_label(label: &str) -> Option<Self> {
        let normalized = label.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "utf-8" | "utf8" => Some(Self::Utf8),
            "us-ascii" | "ascii" | "ansi_x3.4-1968" | "ansi_x3.4-1986" | "iso646-us" | "us" => {
                Some(Self::Ascii)
            }
            _ => Encoding::for_label(normalized.as_bytes()).map(Self::Other),
        }
    }

    /// The canonical, lower-cased label to put in a `charset=` parameter.
    pub fn canonical_name(&self) -> &'static str {
        match self {
            Self::Utf8 => "utf-8",
            Self::Ascii => "us-ascii",
            Self::Other(enc) => canonical_lower_name(enc),
        }
    }

    /// Encode `text` in this charset, failing if any scalar cannot be
    /// represented (spec's `DataConversionFailure`).
    pub fn encode(&self, text: &str) -> Result<Vec<u8>, CharsetError> {
        match self {
            Self::Utf8 => Ok(text.as_bytes().to_vec()),
            Self::Ascii => {
                if text.is_ascii() {
                    Ok(text.as_bytes().to_vec())
                } else {
                    Err(CharsetError::DataConversionFailure {
                        charset: self.canonical_name().to_string(),
                    })
                }
            }
            Self::Other(enc) => {
                let (bytes, _actual, had_unmappable) = enc.encode(text);
                if had_unmappable {
                    Err(CharsetError::DataConversionFailure {
                        charset: self.canonical_name().to_string(),
                    })
                } else {
                    Ok(bytes.into_owned())
                }
            }
        }
    }

    /// True if every scalar in `text` is known to be representable without
    /// doing the full encode; used by the binary-search budget fitting in
    /// the header tokenizer to avoid re-encoding prefixes from scratch when
    /// the charset is UTF-8/ASCII (the common case).
    pub fn is_self_describing_prefix_growth(&self) -> bool {
        matches!(self, Self::Utf8 | Self::Ascii)
    }
}

fn canonical_lower_name(enc: &'static Encoding) -> &'static str {
    // encoding_rs names are already IANA-preferred casing (e.g. "UTF-8",
    // "ISO-2022-JP", "windows-1252", "ISO-8859-1"); lower-casing them
    // matches the lower-case convention used throughout RFC 2045 examples.
    // `Encoding::name()` returns a `&'static str`, but we need a lower-cased
    // `&'static str` without allocating on every call, so a small static
    // table covers the labels this registry actually promises to support.
    match enc.name() {
        "UTF-8" => "utf-8",
        "ISO-2022-JP" => "iso-2022-jp",
        "ISO-8859-1" => "iso-8859-1",
        "windows-1252" => "windows-1252",
        other => {
            // Fall back to a leaked lower-cased copy for any other label
            // the underlying encoding_rs table resolves; this only happens
            // for charsets outside the small required set.
            Box::leak(other.to_ascii_lowercase().into_boxed_str())
        }
    }
}

/// Resolve `label`, returning the `NoCharacterSetName` error spec.md names
/// when nothing matches.
pub fn resolve(label: &str) -> Result<CharsetEncoder, CharsetError> {
    CharsetEncoder::for_label(label).ok_or_else(|| CharsetError::NoCharacterSetName(label.to_string()))
}
