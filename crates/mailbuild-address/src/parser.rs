use std::fmt;

use crate::domain::{domain_from_labels, Domain, DomainPart, IpLiteral};
use crate::error::AddressError;
use crate::lexer::lex;
use crate::preparser::{preparse, MailNode};
use crate::scalars::{is_dot_atom_safe, quote_escape};

const MAX_ADDRESS_LEN: usize = 255;
// Local-parts up to 64 scalars are valid (spec.md's testable property:
// "∀ dot-atom s of length < 65 ... parse(s + "@example.com").local_part
// == s"), so the rejection threshold is 65, not 64.
const MAX_LOCAL_PART_LEN: usize = 65;

/// A validated mail address: `local-part@domain-part`.
///
/// Construction always goes through [`MailAddress::parse`] (precise
/// errors) or [`MailAddress::try_from`] (best-effort, discarding the
/// reason); there is no way to build one from parts that skips validation,
/// since `local_part` and `domain_part` must agree with each other's
/// length limits and escaping rules.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MailAddress {
    local_part: String,
    domain_part: DomainPart,
}

impl MailAddress {
    /// Parse a mail-address surface form (the three-stage lex / nest /
    /// validate pipeline), returning a specific [`AddressError`] on
    /// failure.
    pub fn parse(input: &str) -> Result<Self, AddressError> {
        if input.chars().count() >= MAX_ADDRESS_LEN {
            return Err(AddressError::TooLong);
        }

        let tokens = lex(input)?;
        let tree = preparse(tokens)?;

        let at_positions: Vec<usize> = tree
            .iter()
            .enumerate()
            .filter(|(_, n)| matches!(n, MailNode::AtSign))
            .map(|(i, _)| i)
            .collect();

        match at_positions.len() {
            0 => return Err(AddressError::MissingAtSign),
            1 => {}
            _ => return Err(AddressError::DuplicateAtSigns),
        }
        let at = at_positions[0];

        let local_slice = &tree[..at];
        let domain_slice = &tree[at + 1..];

        if local_slice.is_empty() {
            return Err(AddressError::MissingLocalPart);
        }
        if domain_slice.is_empty() {
            return Err(AddressError::MissingDomain);
        }

        let local_slice = strip_boundary_comments(local_slice)?;
        let domain_slice = strip_boundary_comments(domain_slice)?;

        let local_part = parse_local_part(local_slice)?;
        let domain_part = parse_domain_part(domain_slice)?;

        if local_part.chars().count() >= MAX_LOCAL_PART_LEN {
            return Err(AddressError::TooLongLocalPart);
        }

        Ok(Self {
            local_part,
            domain_part,
        })
    }

    /// Best-effort construction: `Some` on success, `None` on any parse
    /// failure. Prefer [`MailAddress::parse`] when the caller can act on
    /// *why* an address was rejected.
    pub fn try_from(input: &str) -> Option<Self> {
        Self::parse(input).ok()
    }

    pub fn local_part(&self) -> &str {
        &self.local_part
    }

    pub fn domain_part(&self) -> &DomainPart {
        &self.domain_part
    }

    pub fn domain(&self) -> Option<&Domain> {
        match &self.domain_part {
            DomainPart::Domain(d) => Some(d),
            DomainPart::IpLiteral(_) => None,
        }
    }

    pub fn ip_literal(&self) -> Option<&IpLiteral> {
        match &self.domain_part {
            DomainPart::IpLiteral(ip) => Some(ip),
            DomainPart::Domain(_) => None,
        }
    }
}

/// Strip any run of `Comment` nodes from the front and back of `slice`.
/// A `Comment` surviving in the middle after stripping is a position
/// error: comments may only bracket a local-part or domain-part, never
/// split one.
fn strip_boundary_comments(slice: &[MailNode]) -> Result<&[MailNode], AddressError> {
    let mut start = 0;
    while start < slice.len() && matches!(slice[start], MailNode::Comment(_)) {
        start += 1;
    }
    let mut end = slice.len();
    while end > start && matches!(slice[end - 1], MailNode::Comment(_)) {
        end -= 1;
    }
    let middle = &slice[start..end];
    if middle.iter().any(|n| matches!(n, MailNode::Comment(_))) {
        return Err(AddressError::InvalidCommentPosition);
    }
    Ok(middle)
}

fn parse_local_part(nodes: &[MailNode]) -> Result<String, AddressError> {
    if nodes.is_empty() {
        return Err(AddressError::MissingLocalPart);
    }
    if matches!(nodes.first(), Some(MailNode::Dot)) || matches!(nodes.last(), Some(MailNode::Dot)) {
        return Err(AddressError::InvalidDotPosition);
    }

    let mut out = String::new();
    let mut prev_was_dot_or_boundary = true;
    for (i, node) in nodes.iter().enumerate() {
        match node {
            MailNode::Dot => {
                if prev_was_dot_or_boundary {
                    return Err(AddressError::ConsecutiveDots);
                }
                out.push('.');
                prev_was_dot_or_boundary = true;
            }
            MailNode::PlainText(s) => {
                if !s.chars().all(is_dot_atom_scalar_char) {
                    return Err(AddressError::InvalidScalarInLocalPart);
                }
                out.push_str(s);
                prev_was_dot_or_boundary = false;
            }
            MailNode::QuotedText(s) => {
                let next_is_dot_or_boundary = matches!(nodes.get(i + 1), None | Some(MailNode::Dot));
                if !prev_was_dot_or_boundary || !next_is_dot_or_boundary {
                    return Err(AddressError::InvalidQuotedStringPosition);
                }
                if is_dot_atom_safe(s) {
                    out.push_str(s);
                } else {
                    out.push_str(&quote_escape(s));
                }
                prev_was_dot_or_boundary = false;
            }
            MailNode::AtSign => return Err(AddressError::InvalidScalarInLocalPart),
            MailNode::IpAddress(_) => return Err(AddressError::InvalidScalarInLocalPart),
            MailNode::Comment(_) => return Err(AddressError::InvalidCommentPosition),
        }
    }
    Ok(out)
}

fn is_dot_atom_scalar_char(c: char) -> bool {
    crate::scalars::is_dot_atom_scalar(c) && c != '.'
}

fn parse_domain_part(nodes: &[MailNode]) -> Result<DomainPart, AddressError> {
    if nodes.is_empty() {
        return Err(AddressError::MissingDomain);
    }

    if nodes.len() == 1 {
        if let MailNode::IpAddress(ip) = &nodes[0] {
            return Ok(DomainPart::IpLiteral(*ip));
        }
    }

    if matches!(nodes.first(), Some(MailNode::Dot)) || matches!(nodes.last(), Some(MailNode::Dot)) {
        return Err(AddressError::InvalidDotPosition);
    }

    let mut joined = String::new();
    let mut prev_was_dot_or_boundary = true;
    for node in nodes {
        match node {
            MailNode::Dot => {
                if prev_was_dot_or_boundary {
                    return Err(AddressError::ConsecutiveDots);
                }
                joined.push('.');
                prev_was_dot_or_boundary = true;
            }
            MailNode::PlainText(s) => {
                joined.push_str(s);
                prev_was_dot_or_boundary = false;
            }
            MailNode::QuotedText(_) => return Err(AddressError::InvalidDomain),
            MailNode::AtSign => return Err(AddressError::InvalidDomain),
            MailNode::IpAddress(_) => return Err(AddressError::InvalidDomain),
            MailNode::Comment(_) => return Err(AddressError::InvalidCommentPosition),
        }
    }

    domain_from_labels(&joined).map(DomainPart::Domain)
}

impl fmt::Display for MailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if is_dot_atom_safe(&self.local_part) {
            write!(f, "{}@{}", self.local_part, self.domain_part)
        } else {
            write!(f, "{}@{}", quote_escape(&self.local_part), self.domain_part)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_plain_address() {
        let a = MailAddress::parse("user.name@example.com").unwrap();
        k9::assert_equal!(a.local_part(), "user.name");
        k9::assert_equal!(a.domain().unwrap().as_str(), "example.com");
        k9::assert_equal!(a.to_string(), "user.name@example.com");
    }

    #[test]
    fn parses_quoted_local_part() {
        let a = MailAddress::parse("\"john smith\"@example.com").unwrap();
        k9::assert_equal!(a.local_part(), "john smith");
        k9::assert_equal!(a.to_string(), "\"john smith\"@example.com");
    }

    #[test]
    fn quoted_content_that_is_dot_atom_safe_normalizes() {
        let a = MailAddress::parse("\"johnsmith\"@example.com").unwrap();
        k9::assert_equal!(a.to_string(), "johnsmith@example.com");
    }

    #[test]
    fn ip_literal_domain() {
        let a = MailAddress::parse("postmaster@[192.0.2.1]").unwrap();
        assert!(a.ip_literal().is_some());
        k9::assert_equal!(a.to_string(), "postmaster@[192.0.2.1]");
    }

    #[test]
    fn ipv6_literal_domain() {
        let a = MailAddress::parse("postmaster@[IPv6:2001:db8::1]").unwrap();
        k9::assert_equal!(a.to_string(), "postmaster@[IPv6:2001:db8::1]");
    }

    #[test]
    fn comment_before_and_after() {
        let a = MailAddress::parse("(hello)user@example.com(world)").unwrap();
        k9::assert_equal!(a.local_part(), "user");
        k9::assert_equal!(a.domain().unwrap().as_str(), "example.com");
    }

    #[test]
    fn missing_at_sign() {
        k9::assert_equal!(MailAddress::parse("userexample.com"), Err(AddressError::MissingAtSign));
    }

    #[test]
    fn duplicate_at_signs() {
        k9::assert_equal!(
            MailAddress::parse("user@foo@example.com"),
            Err(AddressError::DuplicateAtSigns)
        );
    }

    #[test]
    fn missing_local_part() {
        k9::assert_equal!(MailAddress::parse("@example.com"), Err(AddressError::MissingLocalPart));
    }

    #[test]
    fn missing_domain() {
        k9::assert_equal!(MailAddress::parse("user@"), Err(AddressError::MissingDomain));
    }

    #[test]
    fn consecutive_dots_in_local_part() {
        k9::assert_equal!(
            MailAddress::parse("user..name@example.com"),
            Err(AddressError::ConsecutiveDots)
        );
    }

    #[test]
    fn leading_dot_in_local_part() {
        k9::assert_equal!(
            MailAddress::parse(".user@example.com"),
            Err(AddressError::InvalidDotPosition)
        );
    }

    #[test]
    fn comment_in_the_middle_is_invalid() {
        k9::assert_equal!(
            MailAddress::parse("user(comment)name@example.com"),
            Err(AddressError::InvalidCommentPosition)
        );
    }

    #[test]
    fn quoted_string_must_be_bordered_by_dots() {
        k9::assert_equal!(
            MailAddress::parse("user\"name\"@example.com"),
            Err(AddressError::InvalidQuotedStringPosition)
        );
    }

    #[test]
    fn too_long_local_part() {
        let local = "a".repeat(70);
        let input = format!("{local}@example.com");
        k9::assert_equal!(MailAddress::parse(&input), Err(AddressError::TooLongLocalPart));
    }

    #[test]
    fn local_part_of_exactly_64_scalars_parses() {
        let local = "a".repeat(64);
        let a = MailAddress::parse(&format!("{local}@example.com")).unwrap();
        k9::assert_equal!(a.local_part(), local.as_str());
    }

    #[test]
    fn try_from_discards_error() {
        assert!(MailAddress::try_from("not an address").is_none());
        assert!(MailAddress::try_from("user@example.com").is_some());
    }
}
