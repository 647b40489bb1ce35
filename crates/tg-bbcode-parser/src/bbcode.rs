use std::fmt;
use std::fmt::Formatter;

use crate::token::Token;

/// Types that can be written back as bbcode text.
pub trait BBCode {
    fn to_bbcode(&self, formatter: &mut Formatter<'_>) -> fmt::Result;
}

struct BBCodeWrapper<'a, T: ?Sized>(&'a T);

impl<'a, T: BBCode + ?Sized> fmt::Display for BBCodeWrapper<'a, T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.0.to_bbcode(f)
    }
}

pub fn bbcode_to_string<T: BBCode + ?Sized>(code: &T) -> String {
    BBCodeWrapper(code).to_string()
}

/// Write the source text of every token in document order.
///
/// For a tag that is the tag head, the content chain, then the end tag, then the tail.
/// Parsing is lossless so the output equals the parsed source.
impl BBCode for Token {
    fn to_bbcode(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        let mut pending = vec![self];
        while let Some(token) = pending.pop() {
            if let Some(v) = &token.matched {
                formatter.write_str(v)?;
            }
            pending.extend(
                [
                    token.tail.as_deref(),
                    token.end_tag.as_deref(),
                    token.content.as_deref(),
                ]
                .into_iter()
                .flatten(),
            );
        }
        Ok(())
    }
}

/// A lexed token stream.
impl BBCode for [Token] {
    fn to_bbcode(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        for token in self.iter() {
            token.to_bbcode(formatter)?
        }
        Ok(())
    }
}

impl BBCode for Vec<Token> {
    fn to_bbcode(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        self.as_slice().to_bbcode(formatter)
    }
}
