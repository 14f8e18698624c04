//! Generic statement tree for Groovy and Kotlin build scripts.
//!
//! The tree is deliberately shallow: it knows about blocks, assignments,
//! call chains and simple literal expressions. Anything compound is kept as a
//! raw span over the original text so that later stages can still slice it.

use crate::error::ParseError;
use crate::position::{LineOffsetTable, Span};
use crate::scanner::{QuoteStyle, Token, TokenKind};

const NO_PARTNER: usize = usize::MAX;

const MODIFIERS: &[&str] = &[
    "val", "var", "def", "final", "private", "public", "internal", "static", "const",
    "lateinit",
];

const BINARY_OPERATORS: &[&str] = &[
    "+", "-", "*", "/", "%", "==", "!=", "===", "!==", "<", ">", "<=", ">=", "&&", "||", "?:",
    "..", "..<", "=~", "==~", "**", "|", "&", "^",
];

const INFIX_KEYWORDS: &[&str] = &["as", "to", "in", "is", "until"];

/// Keywords that continue a statement after its closing brace.
const CLAUSE_KEYWORDS: &[&str] = &["else", "catch", "finally"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    pub statements: Vec<Statement>,
}

/// `{ ... }` with its statements. `open` and `close` are the brace offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub statements: Vec<Statement>,
    pub open: usize,
    pub close: usize,
}

impl Block {
    /// Text between the braces.
    pub fn body<'s>(&self, src: &'s str) -> &'s str {
        &src[self.open + 1..self.close]
    }

    pub const fn span(&self) -> Span {
        Span::new(self.open, self.close + 1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Assign(Assignment),
    Call(CallChain),
    /// Statement the tree does not model (imports, control flow fragments,
    /// expressions without a leading call).
    Other(Span),
}

impl Statement {
    pub const fn span(&self) -> Span {
        match self {
            Self::Assign(a) => a.span,
            Self::Call(c) => c.span,
            Self::Other(span) => *span,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    /// `x = v`
    Set,
    /// `x += v`
    Append,
    /// `x -= v`
    Remove,
    /// `val x = v`, `def x = v`, `String x = v`
    Declare,
    /// `val x by extra(v)`
    Delegate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    /// Assigned name with modifiers and type annotations removed, otherwise
    /// verbatim (`ext.kotlinVersion`, `extra["x"]`).
    pub target: String,
    pub target_span: Span,
    pub op: AssignOp,
    pub value: Expr,
    pub span: Span,
}

/// `head tail*`: `id("x").version("1")`, `id 'x' version '1' apply false`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallChain {
    pub head: Invocation,
    pub tail: Vec<Invocation>,
    pub span: Span,
}

impl CallChain {
    pub fn calls(&self) -> impl Iterator<Item = &Invocation> {
        std::iter::once(&self.head).chain(self.tail.iter())
    }

    /// Last closure attached anywhere along the chain.
    pub fn closure(&self) -> Option<&Block> {
        self.calls().filter_map(|c| c.closure.as_ref()).last()
    }

    pub fn find(&self, name: &str) -> Option<&Invocation> {
        self.tail.iter().find(|c| c.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Dotted name, back-ticks removed: `tasks.register`, `java-library`.
    pub name: String,
    pub name_span: Span,
    pub type_args: Option<String>,
    pub args: Vec<Argument>,
    pub parenthesized: bool,
    pub closure: Option<Block>,
    pub span: Span,
}

impl Invocation {
    pub fn named(&self, name: &str) -> Option<&Argument> {
        self.args.iter().find(|a| a.name.as_deref() == Some(name))
    }

    pub fn positional(&self) -> impl Iterator<Item = &Argument> {
        self.args.iter().filter(|a| a.name.is_none())
    }

    pub fn first_arg(&self) -> Option<&Expr> {
        self.args.first().map(|a| &a.value)
    }

    pub fn has_named_args(&self) -> bool {
        self.args.iter().any(|a| a.name.is_some())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgStyle {
    Positional,
    /// Groovy map entry, `group: 'x'`.
    Colon,
    /// Kotlin named argument, `group = "x"`.
    Equals,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argument {
    pub name: Option<String>,
    pub style: ArgStyle,
    pub value: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Str(StrLit),
    Number(Span),
    Bool(bool, Span),
    Null(Span),
    /// Dotted reference: `libs.guava`, `JavaVersion.VERSION_17`.
    Ref(String, Span),
    Call(Box<Invocation>),
    List(Vec<Expr>, Span),
    Map(Vec<Argument>, Span),
    Raw(Span),
}

impl Expr {
    pub const fn span(&self) -> Span {
        match self {
            Self::Str(s) => s.span,
            Self::Call(inv) => inv.span,
            Self::Number(span)
            | Self::Bool(_, span)
            | Self::Null(span)
            | Self::Ref(_, span)
            | Self::List(_, span)
            | Self::Map(_, span)
            | Self::Raw(span) => *span,
        }
    }

    pub fn text<'s>(&self, src: &'s str) -> &'s str {
        self.span().text(src)
    }

    pub const fn as_str(&self) -> Option<&StrLit> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_call(&self) -> Option<&Invocation> {
        match self {
            Self::Call(inv) => Some(inv),
            _ => None,
        }
    }

    pub fn as_ref_path(&self) -> Option<&str> {
        match self {
            Self::Ref(path, _) => Some(path),
            _ => None,
        }
    }

    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b, _) => Some(*b),
            _ => None,
        }
    }

    /// Literal text of a string or number, or the path of a reference.
    pub fn scalar<'s>(&'s self, src: &'s str) -> Option<&'s str> {
        match self {
            Self::Str(s) => Some(&s.value),
            Self::Number(span) => Some(span.text(src)),
            Self::Bool(_, span) => Some(span.text(src)),
            Self::Ref(path, _) => Some(path),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrLit {
    /// Content with escapes resolved. Templates are kept as written.
    pub value: String,
    pub quote: QuoteStyle,
    /// The whole literal including quotes.
    pub span: Span,
    /// Content between the quotes, escapes unresolved.
    pub content: Span,
    pub interpolated: bool,
}

/// Returns the property a string template consists of, if it is nothing but
/// `$name` or `${name}`.
pub fn interpolation_reference(text: &str) -> Option<&str> {
    let inner = if let Some(rest) = text.strip_prefix("${") {
        rest.strip_suffix('}')?.trim()
    } else {
        text.strip_prefix('$')?
    };
    let valid = inner
        .chars()
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
        && inner
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '.');
    valid.then_some(inner)
}

fn has_template(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    bytes.iter().enumerate().any(|(i, &b)| {
        b == b'$'
            && (i == 0 || bytes[i - 1] != b'\\')
            && bytes
                .get(i + 1)
                .is_some_and(|&n| n == b'{' || n == b'_' || n.is_ascii_alphabetic())
    })
}

fn unescape(raw: &str) -> String {
    if !raw.contains('\\') {
        return raw.to_string();
    }
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// Parses a token stream into a statement tree.
///
/// Fails only on unbalanced delimiters; statements that do not fit the
/// grammar become [`Statement::Other`].
pub fn parse_script(
    src: &str,
    tokens: &[Token],
    table: &LineOffsetTable,
) -> Result<Script, ParseError> {
    let (toks, partner) = structure(src, tokens, table)?;
    let limit = toks.len();
    let mut parser = Parser {
        src,
        toks,
        partner,
        pos: 0,
        end: limit,
        prev_end: 0,
    };
    Ok(Script {
        statements: parser.statements(limit),
    })
}

/// Drops trivia and bracket-internal newlines, then matches delimiters.
fn structure(
    src: &str,
    tokens: &[Token],
    table: &LineOffsetTable,
) -> Result<(Vec<Token>, Vec<usize>), ParseError> {
    let mut toks: Vec<Token> = Vec::with_capacity(tokens.len() / 2);
    let mut partner = Vec::with_capacity(tokens.len() / 2);
    let mut stack: Vec<usize> = Vec::new();

    for &tok in tokens {
        if tok.kind.is_trivia() {
            continue;
        }
        if tok.kind == TokenKind::Newline
            && stack
                .last()
                .is_some_and(|&open| toks[open].kind != TokenKind::LBrace)
        {
            continue;
        }

        let idx = toks.len();
        toks.push(tok);
        partner.push(NO_PARTNER);

        if tok.kind.is_open() {
            stack.push(idx);
        } else if tok.kind.is_close() {
            let found = tok.kind.delimiter_char().unwrap_or('?');
            let at = table.position(src, tok.span.start);
            let Some(open) = stack.pop() else {
                return Err(ParseError::UnexpectedClose {
                    delimiter: found,
                    at,
                });
            };
            let expected = toks[open].kind.closing();
            if expected != Some(tok.kind) {
                return Err(ParseError::MismatchedDelimiter {
                    expected: expected
                        .and_then(TokenKind::delimiter_char)
                        .unwrap_or('?'),
                    found,
                    at,
                });
            }
            partner[open] = idx;
            partner[idx] = open;
        }
    }

    if let Some(&open) = stack.last() {
        let tok = toks[open];
        return Err(ParseError::UnmatchedOpen {
            delimiter: tok.kind.delimiter_char().unwrap_or('?'),
            at: table.position(src, tok.span.start),
        });
    }

    Ok((toks, partner))
}

struct Parser<'a> {
    src: &'a str,
    toks: Vec<Token>,
    partner: Vec<usize>,
    pos: usize,
    /// Exclusive token limit of the current statement or argument.
    end: usize,
    /// End offset of the last consumed token.
    prev_end: usize,
}

impl<'a> Parser<'a> {
    fn text(&self, tok: Token) -> &'a str {
        tok.text(self.src)
    }

    fn ident_text(&self, tok: Token) -> &'a str {
        self.text(tok).trim_matches('`')
    }

    fn is_op(&self, tok: Token, op: &str) -> bool {
        tok.kind == TokenKind::Operator && self.text(tok) == op
    }

    fn skip_newlines(&mut self) {
        while self.pos < self.end && self.toks[self.pos].kind == TokenKind::Newline {
            self.pos += 1;
        }
    }

    fn peek(&mut self) -> Option<Token> {
        self.skip_newlines();
        (self.pos < self.end).then(|| self.toks[self.pos])
    }

    /// First non-newline token after index `i`, within the current limit.
    fn peek_after(&self, i: usize) -> Option<Token> {
        self.toks[i + 1..self.end]
            .iter()
            .find(|t| t.kind != TokenKind::Newline)
            .copied()
    }

    fn bump(&mut self) -> Token {
        self.skip_newlines();
        let tok = self.toks[self.pos];
        self.pos += 1;
        self.prev_end = tok.span.end;
        tok
    }

    /// Moves past the delimiter group opening at the current position.
    fn skip_group(&mut self) {
        let close = self.partner[self.pos];
        self.pos = close + 1;
        self.prev_end = self.toks[close].span.end;
    }

    fn at_end(&mut self) -> bool {
        self.peek().is_none()
    }

    fn statements(&mut self, limit: usize) -> Vec<Statement> {
        let mut out = Vec::new();
        loop {
            while self.pos < limit
                && matches!(
                    self.toks[self.pos].kind,
                    TokenKind::Newline | TokenKind::Semicolon
                )
            {
                self.pos += 1;
            }
            if self.pos >= limit {
                break;
            }
            let stmt_end = self.statement_end(self.pos, limit);
            self.end = stmt_end;
            out.push(self.statement());
            self.pos = stmt_end;
            self.end = limit;
        }
        out
    }

    /// Index one past the last token of the statement starting at `start`.
    ///
    /// Besides newlines and semicolons, a statement also ends after a
    /// closure followed by a fresh identifier (`plugins { } group = 'a'`),
    /// and after an assigned value followed by another assignment target
    /// (`group = 'a' version = '1'`).
    fn statement_end(&self, start: usize, limit: usize) -> usize {
        let mut i = start;
        let mut assigned = false;
        while i < limit {
            let tok = self.toks[i];
            if tok.kind.is_open() {
                i = self.partner[i] + 1;
                if i < limit
                    && ((tok.kind == TokenKind::LBrace && self.starts_statement(i))
                        || (assigned && self.assignment_target_at(i, limit)))
                {
                    return i;
                }
                continue;
            }
            match tok.kind {
                TokenKind::Semicolon => return i,
                TokenKind::Newline if !self.continues(i, start, limit) => return i,
                TokenKind::Operator if matches!(self.text(tok), "=" | "+=" | "-=") => {
                    assigned = true;
                    i += 1;
                }
                TokenKind::String(_) | TokenKind::Number | TokenKind::Identifier
                    if assigned && self.assignment_target_at(i + 1, limit) =>
                {
                    return i + 1;
                }
                _ => i += 1,
            }
        }
        limit
    }

    /// Whether the token at `i`, right after a closure, opens a new statement.
    fn starts_statement(&self, i: usize) -> bool {
        let tok = self.toks[i];
        tok.kind == TokenKind::Identifier && {
            let text = self.text(tok);
            !CLAUSE_KEYWORDS.contains(&text) && !INFIX_KEYWORDS.contains(&text)
        }
    }

    /// Whether `a`, `a.b` or `a.b.c` followed by `=`, `+=` or `-=` starts at `i`.
    fn assignment_target_at(&self, mut i: usize, limit: usize) -> bool {
        if i >= limit || self.toks[i].kind != TokenKind::Identifier {
            return false;
        }
        while i + 2 < limit
            && self.toks[i + 1].kind == TokenKind::Dot
            && self.toks[i + 2].kind == TokenKind::Identifier
        {
            i += 2;
        }
        i + 1 < limit && {
            let op = self.toks[i + 1];
            op.kind == TokenKind::Operator && matches!(self.text(op), "=" | "+=" | "-=")
        }
    }

    /// Whether the newline at `i` is a line continuation.
    fn continues(&self, i: usize, start: usize, limit: usize) -> bool {
        let prev = self.toks[start..i]
            .iter()
            .rev()
            .find(|t| t.kind != TokenKind::Newline);
        if let Some(&prev) = prev {
            match prev.kind {
                TokenKind::Comma | TokenKind::Dot | TokenKind::Colon => return true,
                TokenKind::Operator
                    if !matches!(self.text(prev), "->" | ">" | "++" | "--" | "!!" | "*") =>
                {
                    return true;
                }
                _ => {}
            }
        }
        let next = self.toks[i + 1..limit]
            .iter()
            .find(|t| t.kind != TokenKind::Newline);
        next.is_some_and(|&t| {
            t.kind == TokenKind::Dot
                || (t.kind == TokenKind::Operator && matches!(self.text(t), "?:" | "&&" | "||"))
        })
    }

    fn statement(&mut self) -> Statement {
        let start = self.pos;
        let last = self.toks[start..self.end]
            .iter()
            .rev()
            .find(|t| t.kind != TokenKind::Newline)
            .map_or(self.toks[start].span.end, |t| t.span.end);
        let span = Span::new(self.toks[start].span.start, last);

        if let Some(assign) = self.assignment(span) {
            return Statement::Assign(assign);
        }

        self.pos = start;
        if let Some(chain) = self.chain()
            && self.at_end()
        {
            return Statement::Call(chain);
        }

        Statement::Other(span)
    }

    fn assignment(&mut self, span: Span) -> Option<Assignment> {
        let start = self.pos;
        let mut i = start;
        let mut declared = false;
        while i < self.end
            && self.toks[i].kind == TokenKind::Identifier
            && MODIFIERS.contains(&self.text(self.toks[i]))
        {
            declared = true;
            i += 1;
        }

        let mut found = None;
        let mut j = i;
        while j < self.end {
            let tok = self.toks[j];
            if tok.kind.is_open() {
                j = self.partner[j] + 1;
                continue;
            }
            let op = match (tok.kind, self.text(tok)) {
                (TokenKind::Operator, "=") => Some(AssignOp::Set),
                (TokenKind::Operator, "+=") => Some(AssignOp::Append),
                (TokenKind::Operator, "-=") => Some(AssignOp::Remove),
                (TokenKind::Identifier, "by") if declared => Some(AssignOp::Delegate),
                _ => None,
            };
            if let Some(op) = op {
                found = Some((j, op));
                break;
            }
            j += 1;
        }
        let (k, mut op) = found?;

        let target: Vec<Token> = self.toks[i..k]
            .iter()
            .filter(|t| t.kind != TokenKind::Newline)
            .copied()
            .collect();
        let (name, target_span) = match target.as_slice() {
            [] => return None,
            [name, colon, ..]
                if name.kind == TokenKind::Identifier && colon.kind == TokenKind::Colon =>
            {
                (self.ident_text(*name).to_string(), name.span)
            }
            [ty, name]
                if ty.kind == TokenKind::Identifier && name.kind == TokenKind::Identifier =>
            {
                declared = true;
                (self.ident_text(*name).to_string(), name.span)
            }
            [first, .., last] => {
                let span = Span::new(first.span.start, last.span.end);
                (span.text(self.src).to_string(), span)
            }
            [only] => (self.ident_text(*only).to_string(), only.span),
        };

        if declared && op == AssignOp::Set {
            op = AssignOp::Declare;
        }

        self.pos = k + 1;
        let value = self.expr_to_end()?;

        Some(Assignment {
            target: name,
            target_span,
            op,
            value,
            span,
        })
    }

    /// Parses an expression that must fill the rest of the current range;
    /// falls back to a raw span.
    fn expr_to_end(&mut self) -> Option<Expr> {
        let first = self.peek()?;
        let start = self.pos;
        if let Some(expr) = self.expr()
            && self.at_end()
        {
            return Some(expr);
        }
        let last = self.toks[start..self.end]
            .iter()
            .rev()
            .find(|t| t.kind != TokenKind::Newline)
            .map_or(first.span.end, |t| t.span.end);
        self.pos = self.end;
        Some(Expr::Raw(Span::new(first.span.start, last)))
    }

    fn chain(&mut self) -> Option<CallChain> {
        let start = self.peek()?.span.start;
        let head = self.invocation(true)?;
        let mut tail = Vec::new();

        while let Some(tok) = self.peek() {
            match tok.kind {
                TokenKind::Dot => {
                    self.bump();
                    tail.push(self.invocation(false)?);
                }
                TokenKind::Identifier => tail.push(self.invocation(true)?),
                _ => break,
            }
        }

        Some(CallChain {
            head,
            tail,
            span: Span::new(start, self.prev_end),
        })
    }

    fn invocation(&mut self, command: bool) -> Option<Invocation> {
        let (name, name_span) = self.path()?;
        let type_args = self.type_arguments();

        let mut args = Vec::new();
        let mut parenthesized = false;
        match self.peek().map(|t| t.kind) {
            Some(TokenKind::LParen) => {
                let close = self.partner[self.pos];
                self.pos += 1;
                args = self.delimited_arguments(close);
                self.skip_group_at_close(close);
                parenthesized = true;
            }
            Some(
                TokenKind::String(_)
                | TokenKind::Number
                | TokenKind::Identifier
                | TokenKind::LBracket,
            ) if command => {
                args = self.command_arguments()?;
            }
            _ => {}
        }

        let closure = match self.peek() {
            Some(tok) if tok.kind == TokenKind::LBrace => Some(self.block()),
            _ => None,
        };

        Some(Invocation {
            name,
            name_span,
            type_args,
            args,
            parenthesized,
            closure,
            span: Span::new(name_span.start, self.prev_end),
        })
    }

    fn skip_group_at_close(&mut self, close: usize) {
        self.pos = close + 1;
        self.prev_end = self.toks[close].span.end;
    }

    /// `ident (. ident)*`
    fn path(&mut self) -> Option<(String, Span)> {
        let first = self.peek()?;
        if first.kind != TokenKind::Identifier {
            return None;
        }
        self.bump();
        let mut name = self.ident_text(first).to_string();
        let mut end = first.span.end;

        while let Some(dot) = self.peek() {
            if dot.kind != TokenKind::Dot {
                break;
            }
            match self.peek_after(self.pos) {
                Some(next) if next.kind == TokenKind::Identifier => {
                    self.bump();
                    self.bump();
                    name.push('.');
                    name.push_str(self.ident_text(next));
                    end = next.span.end;
                }
                _ => break,
            }
        }

        Some((name, Span::new(first.span.start, end)))
    }

    /// Kotlin generic arguments after a call name: `register<Copy>`.
    fn type_arguments(&mut self) -> Option<String> {
        let open = self.peek()?;
        if !self.is_op(open, "<") {
            return None;
        }
        let start = self.pos;
        let mut depth = 0usize;
        let mut i = start;
        while i < self.end {
            let tok = self.toks[i];
            match tok.kind {
                TokenKind::Operator if self.text(tok) == "<" => depth += 1,
                TokenKind::Operator if self.text(tok) == ">" => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                TokenKind::Operator if self.text(tok) == "?" => {}
                TokenKind::Identifier | TokenKind::Dot | TokenKind::Comma => {}
                _ => return None,
            }
            i += 1;
        }
        if i >= self.end {
            return None;
        }
        let follows = self.toks.get(i + 1).filter(|_| i + 1 < self.end);
        if follows.is_some_and(|t| {
            !matches!(
                t.kind,
                TokenKind::LParen | TokenKind::LBrace | TokenKind::Dot | TokenKind::Newline
            )
        }) {
            return None;
        }
        let text = Span::new(self.toks[start].span.end, self.toks[i].span.start)
            .text(self.src)
            .trim()
            .to_string();
        self.pos = i + 1;
        self.prev_end = self.toks[i].span.end;
        Some(text)
    }

    /// Comma-separated arguments up to the token index `close`.
    fn delimited_arguments(&mut self, close: usize) -> Vec<Argument> {
        let saved_end = self.end;
        let mut args = Vec::new();
        let mut i = self.pos;

        while i < close {
            let mut j = i;
            while j < close && self.toks[j].kind != TokenKind::Comma {
                j = if self.toks[j].kind.is_open() {
                    self.partner[j] + 1
                } else {
                    j + 1
                };
            }
            let range: Vec<Token> = self.toks[i..j]
                .iter()
                .filter(|t| t.kind != TokenKind::Newline)
                .copied()
                .collect();
            if let (Some(first), Some(last)) = (range.first(), range.last()) {
                self.pos = i;
                self.end = j;
                let parsed = self.argument().filter(|_| self.at_end());
                let span = Span::new(first.span.start, last.span.end);
                args.push(parsed.unwrap_or(Argument {
                    name: None,
                    style: ArgStyle::Positional,
                    value: Expr::Raw(span),
                    span,
                }));
            }
            i = j + 1;
        }

        self.end = saved_end;
        args
    }

    fn command_arguments(&mut self) -> Option<Vec<Argument>> {
        let mut args = Vec::new();
        loop {
            args.push(self.argument()?);
            match self.peek() {
                Some(tok) if tok.kind == TokenKind::Comma => {
                    self.bump();
                }
                _ => break,
            }
        }
        Some(args)
    }

    fn argument(&mut self) -> Option<Argument> {
        let first = self.peek()?;
        let next = self.peek_after(self.pos);

        let style = match (first.kind, next) {
            (TokenKind::Identifier | TokenKind::String(_), Some(n)) if n.kind == TokenKind::Colon => {
                Some(ArgStyle::Colon)
            }
            (TokenKind::Identifier, Some(n)) if self.is_op(n, "=") => Some(ArgStyle::Equals),
            _ => None,
        };

        if let Some(style) = style {
            let name = match first.kind {
                TokenKind::String(quote) => self.string_literal(first, quote).value,
                _ => self.ident_text(first).to_string(),
            };
            self.bump();
            self.bump();
            let value = self.expr()?;
            return Some(Argument {
                name: Some(name),
                style,
                value,
                span: Span::new(first.span.start, self.prev_end),
            });
        }

        let value = self.expr()?;
        Some(Argument {
            name: None,
            style: ArgStyle::Positional,
            span: value.span(),
            value,
        })
    }

    fn expr(&mut self) -> Option<Expr> {
        let start = self.peek()?.span.start;
        let first = self.operand()?;
        let mut compound = false;

        while let Some(tok) = self.peek() {
            let text = self.text(tok);
            let infix = match tok.kind {
                TokenKind::Operator => BINARY_OPERATORS.contains(&text) || text == "?",
                TokenKind::Identifier => INFIX_KEYWORDS.contains(&text),
                _ => false,
            };
            if !infix {
                break;
            }
            self.bump();
            self.operand()?;
            if text == "?" {
                match self.peek() {
                    Some(colon) if colon.kind == TokenKind::Colon => {
                        self.bump();
                        self.operand()?;
                    }
                    _ => return None,
                }
            }
            compound = true;
        }

        if compound {
            Some(Expr::Raw(Span::new(start, self.prev_end)))
        } else {
            Some(first)
        }
    }

    fn operand(&mut self) -> Option<Expr> {
        let tok = self.peek()?;
        if tok.kind == TokenKind::Operator && matches!(self.text(tok), "-" | "+" | "!") {
            self.bump();
            self.operand()?;
            return Some(Expr::Raw(Span::new(tok.span.start, self.prev_end)));
        }

        let mut expr = self.primary()?;
        loop {
            let Some(tok) = self.peek() else { break };
            match tok.kind {
                TokenKind::Dot => {
                    let Some(member) = self.peek_after(self.pos) else {
                        return None;
                    };
                    if member.kind != TokenKind::Identifier {
                        return None;
                    }
                    self.bump();
                    self.bump();
                    if self
                        .peek()
                        .is_some_and(|t| matches!(t.kind, TokenKind::LParen))
                    {
                        self.skip_group();
                    }
                    if self
                        .peek()
                        .is_some_and(|t| matches!(t.kind, TokenKind::LBrace))
                    {
                        self.skip_group();
                    }
                }
                TokenKind::LBracket => self.skip_group(),
                TokenKind::Operator if self.text(tok) == "!!" => {
                    self.bump();
                }
                TokenKind::Operator if self.text(tok) == "::" => {
                    self.bump();
                    match self.peek() {
                        Some(t) if t.kind == TokenKind::Identifier => {
                            self.bump();
                        }
                        _ => return None,
                    }
                }
                _ => break,
            }
            expr = Expr::Raw(Span::new(expr.span().start, self.prev_end));
        }
        Some(expr)
    }

    fn primary(&mut self) -> Option<Expr> {
        let tok = self.peek()?;
        match tok.kind {
            TokenKind::String(quote) => {
                self.bump();
                Some(Expr::Str(self.string_literal(tok, quote)))
            }
            TokenKind::Number => {
                self.bump();
                Some(Expr::Number(tok.span))
            }
            TokenKind::Identifier => match self.text(tok) {
                "true" | "false" => {
                    self.bump();
                    Some(Expr::Bool(self.text(tok) == "true", tok.span))
                }
                "null" => {
                    self.bump();
                    Some(Expr::Null(tok.span))
                }
                _ => self.reference_or_call(),
            },
            TokenKind::LBracket => Some(self.collection()),
            TokenKind::LBrace | TokenKind::LParen => {
                self.skip_group();
                Some(Expr::Raw(Span::new(tok.span.start, self.prev_end)))
            }
            _ => None,
        }
    }

    fn reference_or_call(&mut self) -> Option<Expr> {
        let save = self.pos;
        let (path, span) = self.path()?;
        match self.peek().map(|t| t.kind) {
            Some(TokenKind::LParen | TokenKind::LBrace) => {
                self.pos = save;
                let inv = self.invocation(false)?;
                Some(Expr::Call(Box::new(inv)))
            }
            _ => Some(Expr::Ref(path, span)),
        }
    }

    /// `[a, b]` or `[k: v]`.
    fn collection(&mut self) -> Expr {
        let open = self.pos;
        let close = self.partner[open];
        let span = Span::new(self.toks[open].span.start, self.toks[close].span.end);

        let inner = &self.toks[open + 1..close];
        if inner.len() == 1 && inner[0].kind == TokenKind::Colon {
            self.skip_group_at_close(close);
            return Expr::Map(Vec::new(), span);
        }

        self.pos = open + 1;
        let args = self.delimited_arguments(close);
        self.skip_group_at_close(close);

        if args.iter().any(|a| a.name.is_some()) {
            Expr::Map(args, span)
        } else {
            Expr::List(args.into_iter().map(|a| a.value).collect(), span)
        }
    }

    fn block(&mut self) -> Block {
        let open = self.pos;
        let close = self.partner[open];
        let saved_end = self.end;

        self.pos = open + 1;
        let statements = self.statements(close);

        self.end = saved_end;
        self.skip_group_at_close(close);

        Block {
            statements,
            open: self.toks[open].span.start,
            close: self.toks[close].span.start,
        }
    }

    fn string_literal(&self, tok: Token, quote: QuoteStyle) -> StrLit {
        let delim = quote.delimiter_len();
        let content = Span::new(tok.span.start + delim, tok.span.end - delim);
        let raw = content.text(self.src);
        StrLit {
            value: unescape(raw),
            quote,
            span: tok.span,
            content,
            interpolated: quote.supports_interpolation() && has_template(raw),
        }
    }
}
