use regex::Regex;
use std::sync::OnceLock;
use tracing::trace;

use crate::error::SyntaxError;
use crate::scanner::Scanner;
use crate::token::{Token, TokenType};

/// Lexer rules, tried in order at the current position. The first match wins, not the longest.
///
/// `Newline` goes before `Space` and `Space` excludes `\n`, so every line feed is a token of
/// its own.
const RULES: [(TokenType, &str); 5] = [
    (TokenType::EndTag, r"^\[/[^\]]+\]"),
    (TokenType::Tag, r"^\[[^/\]]+\]"),
    (TokenType::Newline, r"^\n"),
    (TokenType::Space, r"^[^\S\n]+"),
    (TokenType::Word, r"^[^\s\[\]]+"),
];

/// Compiled [`RULES`].
static RULES_RE: OnceLock<Vec<(TokenType, Regex)>> = OnceLock::new();

fn rules() -> &'static [(TokenType, Regex)] {
    RULES_RE.get_or_init(|| {
        RULES
            .iter()
            .map(|(kind, pattern)| (*kind, Regex::new(pattern).unwrap()))
            .collect()
    })
}

/// Split source text into tokens.
///
/// Tokens are produced lazily through [`Iterator`], each one carries the matched text and its
/// byte offset. The iterator stops after the first error.
pub struct Lexer<'a> {
    /// Inner scanner.
    source: Scanner<'a>,

    /// Met a character no rule accepts.
    failed: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source: Scanner::new(source),
            failed: false,
        }
    }

    /// Run the process, collect all tokens.
    ///
    /// # Errors
    ///
    /// The first [`SyntaxError`] met.
    pub fn scan(self) -> Result<Vec<Token>, SyntaxError> {
        self.collect()
    }

    /// Scan one token at current position.
    ///
    /// Return `Ok(None)` if reached the end.
    pub fn next_token(&mut self) -> Result<Option<Token>, SyntaxError> {
        if self.source.done() {
            return Ok(None);
        }

        let rest = self.source.remaining();
        let index = self.source.position();
        for (kind, re) in rules() {
            if let Some(m) = re.find(rest) {
                self.source.advance(m.len());
                trace!(?kind, index, text = m.as_str(), "scanned token");
                return Ok(Some(Token::lexeme(*kind, m.as_str(), index)));
            }
        }

        Err(self.unexpected_character())
    }

    fn unexpected_character(&self) -> SyntaxError {
        let offset = self.source.position();
        SyntaxError::UnexpectedCharacter {
            offset,
            found: self.source.curr().unwrap_or_default(),
            pointer: self.source.pointer(offset),
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Token, SyntaxError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let token = self.next_token();
        self.failed = token.is_err();
        token.transpose()
    }
}
