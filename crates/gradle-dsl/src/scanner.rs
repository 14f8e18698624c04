//! Tokenizer shared by the Groovy and Kotlin dialects.
//!
//! The scanner is lossless: concatenating the spans of all tokens yields the
//! input. String interpolation (`${ ... }`) is skipped as part of the string
//! token, including nested braces and nested string literals.

use crate::error::ParseError;
use crate::position::{LineOffsetTable, Position, Span};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuoteStyle {
    Single,
    Double,
    TripleSingle,
    TripleDouble,
}

impl QuoteStyle {
    pub const fn delimiter_len(self) -> usize {
        match self {
            Self::Single | Self::Double => 1,
            Self::TripleSingle | Self::TripleDouble => 3,
        }
    }

    pub const fn supports_interpolation(self) -> bool {
        matches!(self, Self::Double | Self::TripleDouble)
    }

    pub const fn quote_char(self) -> char {
        match self {
            Self::Single | Self::TripleSingle => '\'',
            Self::Double | Self::TripleDouble => '"',
        }
    }

    fn detect(rest: &[u8]) -> Option<Self> {
        if rest.starts_with(b"\"\"\"") {
            Some(Self::TripleDouble)
        } else if rest.starts_with(b"'''") {
            Some(Self::TripleSingle)
        } else {
            match rest.first() {
                Some(b'"') => Some(Self::Double),
                Some(b'\'') => Some(Self::Single),
                _ => None,
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Identifier,
    String(QuoteStyle),
    Number,
    LBrace,
    RBrace,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Semicolon,
    /// `.` or `?.`
    Dot,
    Colon,
    Operator,
    LineComment,
    BlockComment,
    Whitespace,
    Newline,
}

impl TokenKind {
    /// Tokens with no syntactic meaning. Newlines are not trivia: they end
    /// statements.
    pub const fn is_trivia(self) -> bool {
        matches!(
            self,
            Self::Whitespace | Self::LineComment | Self::BlockComment
        )
    }

    pub const fn is_comment(self) -> bool {
        matches!(self, Self::LineComment | Self::BlockComment)
    }

    pub const fn is_open(self) -> bool {
        matches!(self, Self::LBrace | Self::LParen | Self::LBracket)
    }

    pub const fn is_close(self) -> bool {
        matches!(self, Self::RBrace | Self::RParen | Self::RBracket)
    }

    /// Closing partner of an opening delimiter.
    pub const fn closing(self) -> Option<Self> {
        match self {
            Self::LBrace => Some(Self::RBrace),
            Self::LParen => Some(Self::RParen),
            Self::LBracket => Some(Self::RBracket),
            _ => None,
        }
    }

    pub const fn delimiter_char(self) -> Option<char> {
        match self {
            Self::LBrace => Some('{'),
            Self::RBrace => Some('}'),
            Self::LParen => Some('('),
            Self::RParen => Some(')'),
            Self::LBracket => Some('['),
            Self::RBracket => Some(']'),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn text(self, src: &str) -> &str {
        self.span.text(src)
    }
}

/// Multi-character operators, longest first.
const OPERATORS: &[&str] = &[
    "==~", "===", "!==", "..<", "...", "?:", "->", "==", "!=", "<=", ">=", "&&", "||", "+=",
    "-=", "*=", "/=", "%=", "++", "--", "=~", "**", "!!", "..", "::",
];

/// Restartable token iterator over one source text.
///
/// Yields `Err` at most once; the sequence ends after a scan error.
#[derive(Debug, Clone)]
pub struct Scanner<'a> {
    src: &'a str,
    pos: usize,
    done: bool,
}

impl<'a> Scanner<'a> {
    pub const fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            done: false,
        }
    }

    /// Rewinds to the start of the input.
    pub fn restart(&mut self) {
        self.pos = 0;
        self.done = false;
    }

    fn at(&self, offset: usize) -> Position {
        LineOffsetTable::new(self.src).position(self.src, offset)
    }

    fn lex(&self, start: usize) -> Result<(TokenKind, usize), ParseError> {
        let bytes = self.src.as_bytes();
        let rest = &bytes[start..];

        if start == 0 && rest.starts_with("\u{feff}".as_bytes()) {
            return Ok((TokenKind::Whitespace, 3));
        }
        if start == 0 && rest.starts_with(b"#!") {
            return Ok((TokenKind::LineComment, self.line_comment_end(start)));
        }

        let kind_len = match rest[0] {
            b'\n' => (TokenKind::Newline, 1),
            b'\r' if rest.get(1) == Some(&b'\n') => (TokenKind::Newline, 2),
            b' ' | b'\t' | b'\r' | b'\x0c' => {
                let len = rest
                    .iter()
                    .position(|&b| !matches!(b, b' ' | b'\t' | b'\x0c'))
                    .unwrap_or(rest.len())
                    .max(1);
                (TokenKind::Whitespace, len)
            }
            b'/' if rest.get(1) == Some(&b'/') => {
                (TokenKind::LineComment, self.line_comment_end(start) - start)
            }
            b'/' if rest.get(1) == Some(&b'*') => {
                let Some(close) = self.src[start + 2..].find("*/") else {
                    return Err(ParseError::UnterminatedComment { at: self.at(start) });
                };
                (TokenKind::BlockComment, close + 4)
            }
            b'"' | b'\'' => {
                let style = QuoteStyle::detect(rest).unwrap_or(QuoteStyle::Double);
                let Some(end) = self.string_end(start, style) else {
                    return Err(ParseError::UnterminatedString { at: self.at(start) });
                };
                (TokenKind::String(style), end - start)
            }
            b'`' => match self.src[start + 1..].find(['`', '\n']) {
                Some(i) if bytes[start + 1 + i] == b'`' => (TokenKind::Identifier, i + 2),
                _ => (TokenKind::Operator, 1),
            },
            b'0'..=b'9' => (TokenKind::Number, self.number_len(start)),
            b'{' => (TokenKind::LBrace, 1),
            b'}' => (TokenKind::RBrace, 1),
            b'(' => (TokenKind::LParen, 1),
            b')' => (TokenKind::RParen, 1),
            b'[' => (TokenKind::LBracket, 1),
            b']' => (TokenKind::RBracket, 1),
            b',' => (TokenKind::Comma, 1),
            b';' => (TokenKind::Semicolon, 1),
            b'?' if rest.get(1) == Some(&b'.') => (TokenKind::Dot, 2),
            _ => {
                if let Some(op) = OPERATORS.iter().find(|op| rest.starts_with(op.as_bytes())) {
                    (TokenKind::Operator, op.len())
                } else {
                    match rest[0] {
                        b'.' => (TokenKind::Dot, 1),
                        b':' => (TokenKind::Colon, 1),
                        _ => {
                            let ch = self.src[start..].chars().next().unwrap_or(' ');
                            if ch.is_alphabetic() || ch == '_' || ch == '$' {
                                (TokenKind::Identifier, self.identifier_len(start))
                            } else {
                                (TokenKind::Operator, ch.len_utf8())
                            }
                        }
                    }
                }
            }
        };

        Ok((kind_len.0, start + kind_len.1))
    }

    fn line_comment_end(&self, start: usize) -> usize {
        let end = self.src[start..]
            .find('\n')
            .map_or(self.src.len(), |i| start + i);
        if end > start && self.src.as_bytes()[end - 1] == b'\r' {
            end - 1
        } else {
            end
        }
    }

    fn identifier_len(&self, start: usize) -> usize {
        self.src[start..]
            .char_indices()
            .find(|&(_, c)| !(c.is_alphanumeric() || c == '_' || c == '$'))
            .map_or(self.src.len() - start, |(i, _)| i)
    }

    fn number_len(&self, start: usize) -> usize {
        let bytes = &self.src.as_bytes()[start..];
        let mut i = 0;
        while i < bytes.len() {
            let b = bytes[i];
            let fraction = b == b'.' && bytes.get(i + 1).is_some_and(u8::is_ascii_digit);
            if b.is_ascii_alphanumeric() || b == b'_' || fraction {
                i += 1;
            } else {
                break;
            }
        }
        i
    }

    /// End offset (exclusive) of the string literal opening at `start`.
    fn string_end(&self, start: usize, style: QuoteStyle) -> Option<usize> {
        let bytes = self.src.as_bytes();
        let quote = style.quote_char() as u8;
        let triple = style.delimiter_len() == 3;
        let mut i = start + style.delimiter_len();

        while i < bytes.len() {
            match bytes[i] {
                b'\\' => {
                    i += 1;
                    i += self.src.get(i..)?.chars().next().map_or(0, char::len_utf8);
                }
                b'\n' if !triple => return None,
                b'$' if style.supports_interpolation() && bytes.get(i + 1) == Some(&b'{') => {
                    i = self.interpolation_end(i + 2)?;
                }
                b if b == quote => {
                    if !triple {
                        return Some(i + 1);
                    }
                    if bytes[i..].starts_with(&[quote; 3]) {
                        return Some(i + 3);
                    }
                    i += 1;
                }
                _ => i += 1,
            }
        }
        None
    }

    /// Skips a `${ ... }` body starting just after `${`.
    fn interpolation_end(&self, mut i: usize) -> Option<usize> {
        let bytes = self.src.as_bytes();
        let mut depth = 1usize;
        while i < bytes.len() {
            match bytes[i] {
                b'{' => {
                    depth += 1;
                    i += 1;
                }
                b'}' => {
                    depth -= 1;
                    i += 1;
                    if depth == 0 {
                        return Some(i);
                    }
                }
                b'"' | b'\'' => {
                    let style = QuoteStyle::detect(&bytes[i..])?;
                    i = self.string_end(i, style)?;
                }
                _ => i += 1,
            }
        }
        None
    }
}

impl Iterator for Scanner<'_> {
    type Item = Result<Token, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.pos >= self.src.len() {
            return None;
        }
        let start = self.pos;
        match self.lex(start) {
            Ok((kind, end)) => {
                self.pos = end;
                Some(Ok(Token {
                    kind,
                    span: Span::new(start, end),
                }))
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

/// Scans the whole input, stopping at the first error.
pub fn tokenize(src: &str) -> Result<Vec<Token>, ParseError> {
    Scanner::new(src).collect()
}
