use crate::domain::IpLiteral;
use crate::error::AddressError;
use crate::lexer::MailToken;
use crate::scalars::quote_escape;

/// A node of the tree stage 2 builds out of the flat token stream. Nodes
/// other than `Comment` carry the same payload as their originating token;
/// `Comment` nests whatever was found between a matching pair of
/// parentheses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MailNode {
    Comment(Vec<MailNode>),
    Dot,
    AtSign,
    IpAddress(IpLiteral),
    PlainText(String),
    QuotedText(String),
}

/// Render a node back to its mail-address surface form. Used both to
/// flatten tokens found nested inside a comment (where structure doesn't
/// matter, only the literal text) and to re-serialize quoted content.
fn render_as_text(node: &MailNode) -> String {
    match node {
        MailNode::Comment(children) => {
            let mut s = String::from("(");
            for child in children {
                s.push_str(&render_as_text(child));
            }
            s.push(')');
            s
        }
        MailNode::Dot => ".".to_string(),
        MailNode::AtSign => "@".to_string(),
        MailNode::IpAddress(ip) => ip.to_string(),
        MailNode::PlainText(s) => s.clone(),
        MailNode::QuotedText(s) => quote_escape(s),
    }
}

/// Nest a flat token stream into a tree, turning balanced `(`/`)` pairs
/// into `Comment` nodes. Tokens found strictly inside a comment lose their
/// identity: per the data model, only top-level tokens are structurally
/// meaningful, so anything nested one level deeper is flattened to its
/// plain-text surface form (including nested comments, whose surface form
/// is their own parenthesized rendering).
pub fn preparse(tokens: Vec<MailToken>) -> Result<Vec<MailNode>, AddressError> {
    let mut stack: Vec<Vec<MailNode>> = vec![Vec::new()];

    for token in tokens {
        match token {
            MailToken::OpenComment => stack.push(Vec::new()),
            MailToken::CloseComment => {
                let children = stack.pop().ok_or(AddressError::UnbalancedParenthesis)?;
                if stack.is_empty() {
                    return Err(AddressError::UnbalancedParenthesis);
                }
                push_node(&mut stack, MailNode::Comment(children));
            }
            MailToken::Dot => push_node(&mut stack, MailNode::Dot),
            MailToken::AtSign => push_node(&mut stack, MailNode::AtSign),
            MailToken::IpAddress(ip) => push_node(&mut stack, MailNode::IpAddress(ip)),
            MailToken::PlainText(s) => push_node(&mut stack, MailNode::PlainText(s)),
            MailToken::QuotedText(s) => push_node(&mut stack, MailNode::QuotedText(s)),
        }
    }

    if stack.len() != 1 {
        return Err(AddressError::UnbalancedParenthesis);
    }
    Ok(stack.pop().unwrap())
}

fn push_node(stack: &mut [Vec<MailNode>], node: MailNode) {
    let depth_below_top = stack.len() - 1;
    let top = stack.last_mut().expect("stack always has a root level");
    if depth_below_top > 0 {
        top.push(MailNode::PlainText(render_as_text(&node)));
    } else {
        top.push(node);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::lexer::lex;

    #[test]
    fn flattens_comment_contents() {
        let tokens = lex("foo(a.b@c)@example.com").unwrap();
        let tree = preparse(tokens).unwrap();
        k9::assert_equal!(
            tree,
            vec![
                MailNode::PlainText("foo".into()),
                MailNode::Comment(vec![MailNode::PlainText("a.b@c".into())]),
                MailNode::AtSign,
                MailNode::PlainText("example".into()),
                MailNode::Dot,
                MailNode::PlainText("com".into()),
            ]
        );
    }

    #[test]
    fn unbalanced_close() {
        let tokens = lex("foo)@example.com").unwrap();
        k9::assert_equal!(preparse(tokens), Err(AddressError::UnbalancedParenthesis));
    }

    #[test]
    fn unbalanced_open() {
        let tokens = lex("foo(@example.com").unwrap();
        k9::assert_equal!(preparse(tokens), Err(AddressError::UnbalancedParenthesis));
    }

    #[test]
    fn nested_comments_flatten_fully() {
        let tokens = lex("foo((inner))@example.com").unwrap();
        let tree = preparse(tokens).unwrap();
        k9::assert_equal!(
            tree,
            vec![
                MailNode::PlainText("foo".into()),
                MailNode::Comment(vec![MailNode::PlainText("(inner)".into())]),
                MailNode::AtSign,
                MailNode::PlainText("example".into()),
                MailNode::Dot,
                MailNode::PlainText("com".into()),
            ]
        );
    }
}
