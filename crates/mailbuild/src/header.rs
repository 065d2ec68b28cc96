//! A single header field and how it gets written to the wire.
//!
//! Unlike the teacher's `Header`, this one never parses an inbound header
//! line; it only holds a name and an already-decided wire value (or, for
//! free-form text values, the logical Unicode text plus a charset so the
//! RFC 2047 tokenizer can do its job at write time).

use mailbuild_charset::CharsetEncoder;

use crate::error::MailBuildError;
use crate::tokenizer::encode_header_value;

/// A header field name: a `ftext` token (printable US-ASCII except `:`),
/// validated once at construction so later code never has to re-check it.
fn validate_header_name(name: &str) -> Result<(), MailBuildError> {
    if name.is_empty() || name.chars().any(|c| !(0x21..=0x7E).contains(&(c as u32)) || c == ':') {
        return Err(MailBuildError::InvalidHeaderName(name.to_string()));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum HeaderValue {
    /// Already wire-ready (address lists, message-ids, content-type
    /// parameters, ...): written verbatim after the `Name: ` prefix.
    Verbatim(String),
    /// Free-form text (Subject, Comments, ...) that still needs RFC 2047
    /// encoding and folding at write time.
    Unstructured(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    name: String,
    value: HeaderValue,
}

impl Header {
    pub fn new_verbatim(name: impl Into<String>, value: impl Into<String>) -> Result<Self, MailBuildError> {
        let name = name.into();
        validate_header_name(&name)?;
        Ok(Self {
            name,
            value: HeaderValue::Verbatim(value.into()),
        })
    }

    pub fn new_unstructured(name: impl Into<String>, value: impl Into<String>) -> Result<Self, MailBuildError> {
        let name = name.into();
        validate_header_name(&name)?;
        Ok(Self {
            name,
            value: HeaderValue::Unstructured(value.into()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn raw_value(&self) -> &str {
        match &self.value {
            HeaderValue::Verbatim(s) | HeaderValue::Unstructured(s) => s,
        }
    }

    /// Write `"Name: value\r\n"`, folding and RFC 2047-encoding
    /// unstructured values as needed.
    pub fn write(&self, out: &mut String, charset: CharsetEncoder) -> Result<(), MailBuildError> {
        out.push_str(&self.name);
        out.push_str(": ");
        let initial_column = self.name.len() + 2;
        match &self.value {
            HeaderValue::Verbatim(s) => out.push_str(s),
            HeaderValue::Unstructured(s) => {
                out.push_str(&encode_header_value(charset, s, initial_column).map_err(|e| {
                    MailBuildError::HeaderValueEncoding {
                        header_name: self.name.clone(),
                        error: e.to_string(),
                    }
                })?)
            }
        }
        out.push_str("\r\n");
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn rejects_colon_in_name() {
        assert!(Header::new_verbatim("Bad:Name", "x").is_err());
    }

    #[test]
    fn writes_unstructured_value_encoded() {
        let h = Header::new_unstructured("Subject", "héllo").unwrap();
        let mut out = String::new();
        h.write(&mut out, CharsetEncoder::Utf8).unwrap();
        assert!(out.starts_with("Subject: =?utf-8?B?"));
        assert!(out.ends_with("\r\n"));
    }

    #[test]
    fn writes_verbatim_value_untouched() {
        let h = Header::new_verbatim("Content-Type", "text/plain; charset=\"utf-8\"").unwrap();
        let mut out = String::new();
        h.write(&mut out, CharsetEncoder::Utf8).unwrap();
        k9::assert_equal!(out, "Content-Type: text/plain; charset=\"utf-8\"\r\n");
    }
}
