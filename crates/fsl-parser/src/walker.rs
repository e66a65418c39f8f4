//! Lazy identifier walker over FQL expression text.
//!
//! The linker needs to find UDF references inside expression bodies
//! without a full FQL parse. A minimal tokenizer is enough: identifiers,
//! strings, numbers, everything else. The walker yields each identifier
//! with its byte range; [`rewrite_identifiers`] rebuilds a body applying a
//! whole-identifier substitution.

use std::iter::Peekable;
use std::ops::Range;
use std::str::CharIndices;

/// An identifier occurrence inside an expression body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentRef<'a> {
    pub text: &'a str,
    pub range: Range<usize>,
}

/// Iterator over the identifiers of an expression body.
pub struct IdentWalker<'a> {
    text: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

/// Walk the identifiers of `text` in source order.
pub fn identifiers(text: &str) -> IdentWalker<'_> {
    IdentWalker {
        text,
        chars: text.char_indices().peekable(),
    }
}

impl<'a> Iterator for IdentWalker<'a> {
    type Item = IdentRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((i, c)) = self.chars.next() {
            match c {
                '"' => {
                    // String literal; escapes keep the closing quote honest.
                    while let Some((_, sc)) = self.chars.next() {
                        match sc {
                            '\\' => {
                                self.chars.next();
                            }
                            '"' => break,
                            _ => {}
                        }
                    }
                }
                '/' if matches!(self.chars.peek(), Some((_, '/'))) => {
                    for (_, cc) in self.chars.by_ref() {
                        if cc == '\n' {
                            break;
                        }
                    }
                }
                c if c.is_ascii_digit() => {
                    // Number; swallow any trailing alphanumerics so `1e3`
                    // never yields `e3` as an identifier.
                    while let Some((_, nc)) = self.chars.peek().copied() {
                        if nc.is_ascii_alphanumeric() || nc == '.' || nc == '_' {
                            self.chars.next();
                        } else {
                            break;
                        }
                    }
                }
                c if c.is_ascii_alphabetic() || c == '_' => {
                    let start = i;
                    let mut end = i + c.len_utf8();
                    while let Some((j, nc)) = self.chars.peek().copied() {
                        if nc.is_ascii_alphanumeric() || nc == '_' {
                            end = j + nc.len_utf8();
                            self.chars.next();
                        } else {
                            break;
                        }
                    }
                    return Some(IdentRef {
                        text: &self.text[start..end],
                        range: start..end,
                    });
                }
                _ => {}
            }
        }
        None
    }
}

/// Rebuild `text` with every identifier for which `lookup` returns a
/// replacement swapped in. Strings, numbers and comments pass through
/// untouched; only whole identifiers match.
pub fn rewrite_identifiers<F>(text: &str, mut lookup: F) -> String
where
    F: FnMut(&str) -> Option<String>,
{
    let mut out = String::with_capacity(text.len());
    let mut copied = 0usize;
    for ident in identifiers(text) {
        if let Some(replacement) = lookup(ident.text) {
            out.push_str(&text[copied..ident.range.start]);
            out.push_str(&replacement);
            copied = ident.range.end;
        }
    }
    out.push_str(&text[copied..]);
    out
}
