//! A small MIME-type value: `type/subtype` plus an ordered set of
//! parameters. This crate only constructs and round-trips values the
//! caller already knows to be well-formed; it is not a parser for MIME
//! type text found in the wild (spec treats that as a separate,
//! externally-owned concern).

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MimeValue {
    type_: String,
    subtype: String,
    params: Vec<(String, String)>,
}

impl MimeValue {
    pub fn new(type_: &str, subtype: &str) -> Self {
        Self {
            type_: type_.to_string(),
            subtype: subtype.to_string(),
            params: vec![],
        }
    }

    pub fn type_(&self) -> &str {
        &self.type_
    }

    pub fn subtype(&self) -> &str {
        &self.subtype
    }

    pub fn full_type(&self) -> String {
        format!("{}/{}", self.type_, self.subtype)
    }

    pub fn is_multipart(&self) -> bool {
        self.type_.eq_ignore_ascii_case("multipart") || self.type_.eq_ignore_ascii_case("message")
    }

    pub fn is_text(&self) -> bool {
        self.type_.eq_ignore_ascii_case("text")
    }

    /// Set (replacing any existing) a logical parameter value. The value is
    /// the decoded, Unicode-capable logical value; encoding it for the wire
    /// (RFC 2231 continuations, percent-encoding) is the header-emission
    /// layer's job, not this value type's.
    pub fn set_param(&mut self, name: &str, value: &str) {
        self.remove_param(name);
        self.params.push((name.to_string(), value.to_string()));
    }

    pub fn remove_param(&mut self, name: &str) {
        self.params.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
    }

    pub fn get_param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn params(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

impl std::fmt::Display for MimeValue {
    /// Canonical text form, with simple unconditional quoting of parameter
    /// values. This is meant for short, all-ASCII parameters used in tests
    /// and diagnostics; real header emission goes through the RFC 2231
    /// encoder in `mailbuild`, which knows when quoting vs. continuation is
    /// required.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.type_, self.subtype)?;
        for (name, value) in &self.params {
            write!(f, "; {name}=\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))?;
        }
        Ok(())
    }
}
