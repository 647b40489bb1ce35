use crate::token::TokenType;

/// The only error surfaced by lexing and parsing.
///
/// Malformed but lexable tags never produce an error, they fall back to plain words.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SyntaxError {
    /// No lexer rule matches the character run at `offset`.
    ///
    /// `pointer` is the source line holding `offset` with a caret line under the character.
    #[error("unexpected token at position {offset}: '{found}'\n{pointer}")]
    UnexpectedCharacter {
        offset: usize,
        found: char,
        pointer: String,
    },

    /// The lexer produced a token type the grammar does not accept.
    ///
    /// * 0: token type.
    /// * 1: byte offset of the token.
    #[error("unknown token type {0:?} at position {1}")]
    UnexpectedToken(TokenType, usize),
}

impl SyntaxError {
    /// Byte offset in source where the error happened.
    pub fn offset(&self) -> usize {
        match self {
            SyntaxError::UnexpectedCharacter { offset, .. } => *offset,
            SyntaxError::UnexpectedToken(_, offset) => *offset,
        }
    }
}
