//! Mail-address parsing and validation: `local-part@domain-part`, per
//! RFC 5321/5322 syntax, plus IP-address literal domains.
//!
//! The pipeline is three stages, each its own module:
//! [`lexer`] splits a surface form into tokens, [`preparser`] nests
//! balanced parentheses into a comment tree, and [`parser`] validates the
//! result and produces a [`MailAddress`]. Most callers only need
//! [`MailAddress::parse`]/[`MailAddress::try_from`]; the intermediate
//! stages are exposed for testing and for callers that want the comment
//! tree itself (e.g. to strip comments before display).

mod domain;
mod error;
mod lexer;
mod parser;
mod preparser;
mod scalars;

pub use domain::{Domain, DomainPart, IpLiteral};
pub use error::AddressError;
pub use lexer::{lex, MailToken};
pub use parser::MailAddress;
pub use preparser::{preparse, MailNode};
