//! Expression-body capture.
//!
//! FQL expression bodies are not parsed. When the grammar reaches an
//! opening brace that introduces a body, a raw scan finds the matching
//! closing brace — respecting string literals, escapes, `//` comments and
//! nested braces — and the region in between is stored verbatim as an
//! [`ExprBlob`]. The token stream is then fast-forwarded past the region.

use super::error::SyntaxError;
use super::Parser;
use fsl_ast::{ExprBlob, Span};
use fsl_lexer::Token;

/// Parse `{ … balanced FQL … }`, returning the captured blob.
pub(crate) fn parse_expr_block(p: &mut Parser<'_>) -> Result<ExprBlob, SyntaxError> {
    let open = match p.stream.current_range() {
        Some(range) if p.stream.check(&Token::LBrace) => range.start,
        _ => {
            return Err(SyntaxError::expected(
                "`{`",
                p.stream.peek().cloned(),
                p.stream.current_span(),
            ));
        }
    };
    p.stream.advance();

    let close = scan_balanced(p.source, open).ok_or_else(|| {
        SyntaxError::expected(
            "`}`",
            None,
            Span::new(p.file_id, p.source.len() as u32, p.source.len() as u32),
        )
    })?;

    p.stream.skip_to_offset(close);
    p.stream.expect(Token::RBrace)?;
    p.blob_ranges.push(open..close + 1);

    let text = p.source[open + 1..close].to_string();
    Ok(ExprBlob::new(
        text,
        Span::new(p.file_id, open as u32, (close + 1) as u32),
    ))
}

/// Find the byte offset of the `}` matching the `{` at `open`.
///
/// Returns `None` when the braces never balance.
fn scan_balanced(source: &str, open: usize) -> Option<usize> {
    debug_assert_eq!(source.as_bytes().get(open), Some(&b'{'));
    let mut depth = 1usize;
    let mut chars = source[open + 1..].char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        let at = open + 1 + i;
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(at);
                }
            }
            '"' => {
                // Skip the string literal, honoring escapes.
                let mut closed = false;
                while let Some((_, sc)) = chars.next() {
                    match sc {
                        '\\' => {
                            chars.next();
                        }
                        '"' => {
                            closed = true;
                            break;
                        }
                        _ => {}
                    }
                }
                if !closed {
                    return None;
                }
            }
            '/' if matches!(chars.peek(), Some((_, '/'))) => {
                // Line comment: braces inside do not count.
                for (_, cc) in chars.by_ref() {
                    if cc == '\n' {
                        break;
                    }
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::scan_balanced;

    #[test]
    fn simple_body() {
        let src = "{ x + 1 }";
        assert_eq!(scan_balanced(src, 0), Some(8));
    }

    #[test]
    fn nested_braces() {
        let src = "{ if (x) { y } else { z } }";
        assert_eq!(scan_balanced(src, 0), Some(src.len() - 1));
    }

    #[test]
    fn brace_inside_string_ignored() {
        let src = r#"{ "}" + x }"#;
        assert_eq!(scan_balanced(src, 0), Some(src.len() - 1));
    }

    #[test]
    fn escaped_quote_inside_string() {
        let src = r#"{ "a\"}" }"#;
        assert_eq!(scan_balanced(src, 0), Some(src.len() - 1));
    }

    #[test]
    fn brace_inside_comment_ignored() {
        let src = "{ x // }\n}";
        assert_eq!(scan_balanced(src, 0), Some(src.len() - 1));
    }

    #[test]
    fn unbalanced_returns_none() {
        assert_eq!(scan_balanced("{ x", 0), None);
        assert_eq!(scan_balanced("{ \"unterminated }", 0), None);
    }
}
