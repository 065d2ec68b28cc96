use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

use crate::error::AddressError;
use crate::scalars::is_dot_atom_safe;

/// An IP-address literal as it appears in a domain part, e.g. `[192.0.2.1]`
/// or `[IPv6:2001:db8::1]`. Parsing the interior text is delegated to
/// `std::net`, which is the "external IP-address parser" the data model
/// treats as a collaborator rather than something this crate re-implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IpLiteral {
    V4(Ipv4Addr),
    V6(Ipv6Addr),
}

impl IpLiteral {
    /// Parse the text found between a `[` and `]` pair, already known not
    /// to be lexically invalid. Returns `None` if it isn't actually a valid
    /// address (caller maps that to `InvalidIPAddressLiteral`).
    pub(crate) fn from_bracket_interior(interior: &str) -> Option<Self> {
        if let Some(rest) = interior.strip_prefix("IPv6:") {
            rest.parse::<Ipv6Addr>().ok().map(Self::V6)
        } else {
            interior.parse::<Ipv4Addr>().ok().map(Self::V4)
        }
    }
}

impl fmt::Display for IpLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V4(v4) => write!(f, "[{v4}]"),
            Self::V6(v6) => write!(f, "[IPv6:{v6}]"),
        }
    }
}

/// A validated domain name: a dot-separated sequence of dot-atom-safe
/// labels. This crate does not resolve domains or check registry
/// existence; it only validates mail-address syntax.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Domain(String);

impl Domain {
    /// Validate `s` as a domain: non-empty, dot-separated labels, each
    /// label dot-atom-safe, no leading/trailing/consecutive dots.
    pub fn try_from(s: &str) -> Option<Self> {
        if s.is_empty() || s.starts_with('.') || s.ends_with('.') || s.contains("..") {
            return None;
        }
        if !s.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.') {
            return None;
        }
        if s.split('.').any(|label| label.is_empty() || label.starts_with('-') || label.ends_with('-')) {
            return None;
        }
        Some(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The part of a mail address after the `@`: either a textual domain or an
/// IP-address literal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DomainPart {
    Domain(Domain),
    IpLiteral(IpLiteral),
}

impl fmt::Display for DomainPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Domain(d) => d.fmt(f),
            Self::IpLiteral(ip) => ip.fmt(f),
        }
    }
}

/// Join dot-atom-safe domain labels collected by the stage-3 parser and
/// validate the result, distinguishing `ConsecutiveDots` from the more
/// general `InvalidDomain` where the spec calls for it.
pub(crate) fn domain_from_labels(joined: &str) -> Result<Domain, AddressError> {
    if joined.contains("..") {
        return Err(AddressError::ConsecutiveDots);
    }
    if !is_dot_atom_safe(joined) {
        return Err(AddressError::InvalidDomain);
    }
    Domain::try_from(joined).ok_or(AddressError::InvalidDomain)
}
