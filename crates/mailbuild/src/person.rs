//! `Person` (an optional display-name plus a mail address) and `Group` (a
//! named, ordered list of `Person`s), the two shapes an address-bearing
//! header (`From`, `To`, `Cc`, ...) is built out of.

use mailbuild_address::MailAddress;
use mailbuild_charset::CharsetEncoder;

use crate::error::MailBuildError;
use crate::tokenizer::encode_header_value;

fn phrase_is_bare_safe(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == ' ' || c == '-' || c == '\'')
}

fn quote_phrase(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 2);
    out.push('"');
    for c in name.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// A display-name plus an address, e.g. `Jane Doe <jane@example.com>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Person {
    display_name: Option<String>,
    address: MailAddress,
}

impl Person {
    pub fn new(address: MailAddress) -> Self {
        Self {
            display_name: None,
            address,
        }
    }

    pub fn with_name(name: impl Into<String>, address: MailAddress) -> Self {
        Self {
            display_name: Some(name.into()),
            address,
        }
    }

    pub fn address(&self) -> &MailAddress {
        &self.address
    }

    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// Serialize as either `addr` or `display-name <addr>`, encoding the
    /// display name per RFC 2047 if it isn't plain ASCII.
    pub fn encode(&self, charset: CharsetEncoder) -> Result<String, MailBuildError> {
        match &self.display_name {
            None => Ok(self.address.to_string()),
            Some(name) if name.is_ascii() && phrase_is_bare_safe(name) => {
                Ok(format!("{name} <{}>", self.address))
            }
            Some(name) if name.is_ascii() => Ok(format!("{} <{}>", quote_phrase(name), self.address)),
            Some(name) => {
                let encoded = encode_header_value(charset, name, 0)?;
                Ok(format!("{encoded} <{}>", self.address))
            }
        }
    }
}

impl From<MailAddress> for Person {
    fn from(address: MailAddress) -> Self {
        Self::new(address)
    }
}

/// A named group of addresses, e.g. `Undisclosed-Recipients: jane@a, joe@b;`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    name: String,
    members: Vec<Person>,
}

impl Group {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
        }
    }

    pub fn with_members(name: impl Into<String>, members: Vec<Person>) -> Self {
        Self {
            name: name.into(),
            members,
        }
    }

    pub fn push(&mut self, person: Person) {
        self.members.push(person);
    }

    pub fn members(&self) -> &[Person] {
        &self.members
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Serialize as `name: member,member,...;`. Members are joined with a
    /// bare comma and no space (spec §3's `Group` serialization), unlike
    /// the comma-space join `MessageBuilder` uses for a plain `To`/`Cc`
    /// address list.
    pub fn encode(&self, charset: CharsetEncoder) -> Result<String, MailBuildError> {
        let mut parts = Vec::with_capacity(self.members.len());
        for member in &self.members {
            parts.push(member.encode(charset)?);
        }
        Ok(format!("{}: {};", self.name, parts.join(",")))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn addr(s: &str) -> MailAddress {
        MailAddress::parse(s).unwrap()
    }

    #[test]
    fn bare_address_has_no_angle_brackets() {
        let p = Person::new(addr("jane@example.com"));
        k9::assert_equal!(p.encode(CharsetEncoder::Utf8).unwrap(), "jane@example.com");
    }

    #[test]
    fn ascii_display_name() {
        let p = Person::with_name("Jane Doe", addr("jane@example.com"));
        k9::assert_equal!(p.encode(CharsetEncoder::Utf8).unwrap(), "Jane Doe <jane@example.com>");
    }

    #[test]
    fn display_name_with_comma_gets_quoted() {
        let p = Person::with_name("Doe, Jane", addr("jane@example.com"));
        k9::assert_equal!(
            p.encode(CharsetEncoder::Utf8).unwrap(),
            "\"Doe, Jane\" <jane@example.com>"
        );
    }

    #[test]
    fn non_ascii_display_name_is_encoded_word() {
        let p = Person::with_name("Jané Doe", addr("jane@example.com"));
        let out = p.encode(CharsetEncoder::Utf8).unwrap();
        assert!(out.contains("=?utf-8?B?"));
        assert!(out.ends_with("<jane@example.com>"));
    }

    #[test]
    fn group_serializes_with_trailing_semicolon() {
        let g = Group::with_members(
            "Undisclosed-Recipients",
            vec![Person::new(addr("a@example.com")), Person::new(addr("b@example.com"))],
        );
        k9::assert_equal!(
            g.encode(CharsetEncoder::Utf8).unwrap(),
            "Undisclosed-Recipients: a@example.com,b@example.com;"
        );
    }
}
