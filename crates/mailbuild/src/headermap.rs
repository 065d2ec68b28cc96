//! An ordered collection of headers, preserving insertion order (so a
//! caller that wants headers in a particular order just inserts them in
//! that order) while still supporting case-insensitive lookup by name.

use crate::error::MailBuildError;
use crate::header::Header;

/// Ordered list of headers. Derefs to `Vec<Header>` for bulk mutation;
/// the named methods below are for the common "does this header already
/// exist / replace it" cases a builder needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    headers: Vec<Header>,
}

impl std::ops::Deref for HeaderMap {
    type Target = Vec<Header>;
    fn deref(&self) -> &Vec<Header> {
        &self.headers
    }
}

impl std::ops::DerefMut for HeaderMap {
    fn deref_mut(&mut self) -> &mut Vec<Header> {
        &mut self.headers
    }
}

impl HeaderMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, header: Header) {
        self.headers.push(header);
    }

    /// Insert `header` at the front; used for the handful of headers
    /// (`Received`, trace headers) that conventionally lead a message.
    pub fn prepend(&mut self, header: Header) {
        self.headers.insert(0, header);
    }

    /// Replace the first header named `name` with `header`, or append it
    /// if none exists yet.
    pub fn set(&mut self, header: Header) {
        match self.headers.iter().position(|h| h.name().eq_ignore_ascii_case(header.name())) {
            Some(idx) => self.headers[idx] = header,
            None => self.headers.push(header),
        }
    }

    pub fn get_first(&self, name: &str) -> Option<&Header> {
        self.iter_named(name).next()
    }

    pub fn get_all(&self, name: &str) -> Vec<&Header> {
        self.iter_named(name).collect()
    }

    pub fn remove_all(&mut self, name: &str) {
        self.headers.retain(|h| !h.name().eq_ignore_ascii_case(name));
    }

    pub fn iter_named<'a>(&'a self, name: &'a str) -> impl DoubleEndedIterator<Item = &'a Header> + 'a {
        self.headers.iter().filter(move |h| h.name().eq_ignore_ascii_case(name))
    }

    /// Write every header in order, each followed by `CRLF`, with a
    /// blank-line separator appended by the caller once headers are done.
    pub fn write(&self, out: &mut String, charset: mailbuild_charset::CharsetEncoder) -> Result<(), MailBuildError> {
        for header in &self.headers {
            header.write(out, charset)?;
        }
        Ok(())
    }
}
