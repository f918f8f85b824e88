//! Display-only reconstruction of parameterized SQL.
//!
//! The scanner walks a statement once and reports where its positional `?`
//! placeholders sit, skipping anything quoted or commented out. The
//! interpolated string is cosmetic: it is shown in the toolbar and must never
//! be fed back to a database.

use super::quote::{Binding, Quote};

/// A position of interest in a SQL template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    /// Byte offset of a positional `?` placeholder.
    Placeholder(usize),
    /// Byte offset of a `??` pair, the escaped form of a literal `?`.
    EscapedMark(usize),
}

/// Scanner over a SQL template yielding its placeholders and escaped marks.
pub struct Scanner<'a> {
    sql: &'a [u8],
    pos: usize,
    backslash_escapes: bool,
}

impl<'a> Scanner<'a> {
    pub fn new(sql: &'a str, backslash_escapes: bool) -> Self {
        Self {
            sql: sql.as_bytes(),
            pos: 0,
            backslash_escapes,
        }
    }

    /// Only the placeholder offsets.
    pub fn placeholders(self) -> impl Iterator<Item = usize> + 'a {
        self.filter_map(|token| match token {
            Token::Placeholder(at) => Some(at),
            Token::EscapedMark(_) => None,
        })
    }

    fn peek(&self, offset: usize) -> Option<u8> {
        self.sql.get(self.pos + offset).copied()
    }

    /// Skip a quoted run opened at `self.pos` and closed by `close`.
    /// A doubled closing quote stays inside the run.
    fn skip_quoted(&mut self, close: u8, allow_backslash: bool) {
        self.pos += 1;
        while let Some(b) = self.peek(0) {
            if allow_backslash && b == b'\\' {
                self.pos += 2;
                continue;
            }
            self.pos += 1;
            if b == close {
                if self.peek(0) == Some(close) {
                    self.pos += 1;
                    continue;
                }
                return;
            }
        }
        // Unterminated: everything to the end is quoted.
        self.pos = self.sql.len();
    }

    fn skip_line_comment(&mut self) {
        while let Some(b) = self.peek(0) {
            self.pos += 1;
            if b == b'\n' {
                return;
            }
        }
    }

    fn skip_block_comment(&mut self) {
        self.pos += 2;
        while self.pos < self.sql.len() {
            if self.peek(0) == Some(b'*') && self.peek(1) == Some(b'/') {
                self.pos += 2;
                return;
            }
            self.pos += 1;
        }
    }
}

impl Iterator for Scanner<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        while let Some(b) = self.peek(0) {
            match b {
                b'\'' => self.skip_quoted(b'\'', self.backslash_escapes),
                b'"' => self.skip_quoted(b'"', false),
                b'`' => self.skip_quoted(b'`', false),
                b'-' if self.peek(1) == Some(b'-') => self.skip_line_comment(),
                b'/' if self.peek(1) == Some(b'*') => self.skip_block_comment(),
                b'?' if self.peek(1) == Some(b'?') => {
                    let at = self.pos;
                    self.pos += 2;
                    return Some(Token::EscapedMark(at));
                }
                b'?' => {
                    let at = self.pos;
                    self.pos += 1;
                    return Some(Token::Placeholder(at));
                }
                _ => self.pos += 1,
            }
        }
        None
    }
}

/// Substitute `bindings` into the placeholders of `sql`, one for one, left
/// to right, and show each escaped `??` as the single `?` the database saw.
/// Placeholders without a binding stay literal; surplus bindings are ignored.
/// The quoter's own escaping rules decide what counts as a string literal.
pub fn interpolate<Q>(sql: &str, bindings: &[Binding], quoter: &Q) -> String
where
    Q: Quote + ?Sized,
{
    let mut out = String::with_capacity(sql.len() + bindings.len() * 8);
    let mut bindings = bindings.iter();
    let mut last = 0;

    for token in Scanner::new(sql, quoter.backslash_escapes()) {
        match token {
            Token::EscapedMark(at) => {
                out.push_str(&sql[last..at]);
                out.push('?');
                last = at + 2;
            }
            Token::Placeholder(at) => {
                if let Some(binding) = bindings.next() {
                    out.push_str(&sql[last..at]);
                    out.push_str(&binding.to_sql(quoter));
                    last = at + 1;
                }
            }
        }
    }
    out.push_str(&sql[last..]);
    out
}
