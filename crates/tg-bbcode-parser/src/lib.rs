//! Parse bracket-tag markup (`[tag]...[/tag]`) into a linked token tree.
//!
//! ```text
//! [band]Emperor[/band]
//!
//! Text
//!  └─ tail: Tag(band)
//!            ├─ content: Word("Emperor")
//!            ├─ terminator: EndTag(band)
//!            └─ tail: EOF
//! ```

pub mod bbcode;
pub mod error;
pub mod lexer;
pub mod parser;
mod scanner;
mod stack;
pub mod tag;
pub mod token;

pub use bbcode::{bbcode_to_string, BBCode};
pub use error::SyntaxError;
pub use lexer::Lexer;
pub use parser::Parser;
pub use tag::{ClosingRequirement, TagRegistry};
pub use token::{Parameter, ParameterValue, Token, TokenType};

const OPEN: char = '[';
const CLOSE: char = ']';
const SLASH: char = '/';
const EQUAL: char = '=';

/// Parse `source` with the built-in tag registry.
///
/// Returns the root [`TokenType::Text`] token.
///
/// # Errors
///
/// When some character run in `source` can not be lexed.
pub fn parse_bbcode(source: impl AsRef<str>) -> Result<Token, SyntaxError> {
    Parser::new().parse(source.as_ref())
}
