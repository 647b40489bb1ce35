use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::fmt;

use crate::stack::ensure_sufficient_stack;

/// All types of tokens.
///
/// The same set is used for lexer output and for nodes in the parsed tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum TokenType {
    /// Root of a parsed document, wraps everything through its tail.
    Text,

    /// Run of characters that are not whitespace or brackets.
    ///
    /// Also the fallback of tags and end tags that failed to fit the grammar.
    Word,

    /// Run of whitespace, excluding line feed.
    Space,

    /// A single `\n`.
    Newline,

    /// Reserved, no lexer rule produces it.
    Number,

    /// Tag head.
    ///
    /// `[$name]`, `[$name=$default]` or `[$name $key=$value $flag]`
    Tag,

    /// Tag tail.
    ///
    /// `[/$name]`
    EndTag,

    /// End of the document.
    #[serde(rename = "EOF")]
    Eof,
}

/// Value of a tag parameter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParameterValue {
    /// `key=value`, everything after the first `=`.
    Text(String),

    /// Bare `key` without `=`, serialized as `true`.
    Flag,
}

impl Serialize for ParameterValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            ParameterValue::Text(v) => serializer.serialize_str(v),
            ParameterValue::Flag => serializer.serialize_bool(true),
        }
    }
}

/// A `(key, value)` pair in tag head, kept in source order.
pub type Parameter = (String, ParameterValue);

/// The single node type of the token tree.
///
/// The tree is a right-leaning chain linked by [`Token::tail`]. Closed tags hang their
/// inner chain on [`Token::content`] and keep the closing tag in [`Token::end_tag`].
///
/// Chains grow with input size, so every trait walking the links either loops over an explicit
/// stack or grows the call stack on demand.
pub struct Token {
    pub kind: TokenType,

    /// Tag or end tag name.
    pub name: Option<String>,

    /// Exact source text this token was lexed from.
    ///
    /// Absent on the synthetic root and EOF tokens.
    pub matched: Option<String>,

    /// Byte offset in source.
    pub index: Option<usize>,

    /// Value given in head as `[$name=$value]`.
    pub default_parameter: Option<String>,

    pub parameters: Vec<Parameter>,

    /// The end tag closed this tag.
    ///
    /// Serialized as `terminator`.
    pub end_tag: Option<Box<Token>>,

    /// First node between the tag and its end tag.
    pub content: Option<Box<Token>>,

    /// Rest of the chain.
    pub tail: Option<Box<Token>>,
}

impl Token {
    /// Construct a token with type `kind` and nothing else.
    pub fn new(kind: TokenType) -> Self {
        Self {
            kind,
            name: None,
            matched: None,
            index: None,
            default_parameter: None,
            parameters: vec![],
            end_tag: None,
            content: None,
            tail: None,
        }
    }

    /// Construct a token lexed from `matched` at byte `index`.
    pub fn lexeme(kind: TokenType, matched: impl Into<String>, index: usize) -> Self {
        let mut token = Self::new(kind);
        token.matched = Some(matched.into());
        token.index = Some(index);
        token
    }

    /// Construct the document root holding `tail`.
    pub fn root(tail: Option<Box<Token>>) -> Self {
        let mut token = Self::new(TokenType::Text);
        token.tail = tail;
        token
    }

    /// Construct the terminal token.
    pub fn eof() -> Self {
        Self::new(TokenType::Eof)
    }

    pub fn is(&self, kind: TokenType) -> bool {
        self.kind == kind
    }

    /// Tag found its end tag.
    pub fn is_closed(&self) -> bool {
        self.end_tag.is_some()
    }

    /// Fall back into a plain [`TokenType::Word`].
    ///
    /// Only the source text and position survive.
    pub fn demote(mut self) -> Self {
        self.demote_in_place();
        self
    }

    pub(crate) fn demote_in_place(&mut self) {
        self.kind = TokenType::Word;
        self.name = None;
        self.default_parameter = None;
        self.parameters.clear();
        self.end_tag = None;
        self.content = None;
    }

    /// Walk the chain starting from current token, following [`Token::tail`].
    pub fn chain(&self) -> Chain<'_> {
        Chain { next: Some(self) }
    }

    /// Find the value of parameter `key`, the first one if duplicated.
    pub fn parameter(&self, key: &str) -> Option<&ParameterValue> {
        self.parameters
            .iter()
            .find_map(|(k, v)| if k == key { Some(v) } else { None })
    }

    fn take_children(&mut self) -> impl Iterator<Item = Box<Token>> {
        [self.content.take(), self.end_tag.take(), self.tail.take()]
            .into_iter()
            .flatten()
    }

    /// Copy of every field except the links.
    fn clone_fields(&self) -> Self {
        let mut token = Self::new(self.kind);
        token.name = self.name.clone();
        token.matched = self.matched.clone();
        token.index = self.index;
        token.default_parameter = self.default_parameter.clone();
        token.parameters = self.parameters.clone();
        token
    }

    fn eq_fields(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.name == other.name
            && self.matched == other.matched
            && self.index == other.index
            && self.default_parameter == other.default_parameter
            && self.parameters == other.parameters
    }
}

impl Clone for Token {
    fn clone(&self) -> Self {
        // Pre-order: node, content, end tag, tail.
        let mut order = vec![];
        let mut pending = vec![self];
        while let Some(token) = pending.pop() {
            order.push(token);
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

        // Walking backwards, the links of a token are the last ones built.
        let mut built: Vec<Token> = vec![];
        for token in order.into_iter().rev() {
            let mut copy = token.clone_fields();
            if token.content.is_some() {
                copy.content = built.pop().map(Box::new);
            }
            if token.end_tag.is_some() {
                copy.end_tag = built.pop().map(Box::new);
            }
            if token.tail.is_some() {
                copy.tail = built.pop().map(Box::new);
            }
            built.push(copy);
        }
        built.pop().unwrap_or_else(|| self.clone_fields())
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        let mut pending = vec![(self, other)];
        while let Some((lhs, rhs)) = pending.pop() {
            if !lhs.eq_fields(rhs) {
                return false;
            }
            for (l, r) in [
                (&lhs.content, &rhs.content),
                (&lhs.end_tag, &rhs.end_tag),
                (&lhs.tail, &rhs.tail),
            ] {
                match (l.as_deref(), r.as_deref()) {
                    (Some(l), Some(r)) => pending.push((l, r)),
                    (None, None) => {}
                    _ => return false,
                }
            }
        }
        true
    }
}

impl Eq for Token {}

/// A linked token, serialized and formatted on a stack grown when needed.
struct Linked<'a>(&'a Token);

impl Serialize for Linked<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        ensure_sufficient_stack(|| self.0.serialize(serializer))
    }
}

impl fmt::Debug for Linked<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        ensure_sufficient_stack(|| fmt::Debug::fmt(self.0, f))
    }
}

/// Keys present only when the field is set, `parameters` only when not empty.
///
/// ```json
/// {"type": "Tag", "name": "b", "match": "[b]", "index": 0,
///  "terminator": {..}, "content": {..}, "tail": {..}}
/// ```
impl Serialize for Token {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("Token", 9)?;
        state.serialize_field("type", &self.kind)?;
        if let Some(v) = &self.name {
            state.serialize_field("name", v)?;
        }
        if let Some(v) = &self.matched {
            state.serialize_field("match", v)?;
        }
        if let Some(v) = &self.index {
            state.serialize_field("index", v)?;
        }
        if let Some(v) = &self.default_parameter {
            state.serialize_field("defaultParameter", v)?;
        }
        if !self.parameters.is_empty() {
            state.serialize_field("parameters", &self.parameters)?;
        }
        if let Some(v) = &self.end_tag {
            state.serialize_field("terminator", &Linked(v))?;
        }
        if let Some(v) = &self.content {
            state.serialize_field("content", &Linked(v))?;
        }
        if let Some(v) = &self.tail {
            state.serialize_field("tail", &Linked(v))?;
        }
        state.end()
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("kind", &self.kind)
            .field("name", &self.name)
            .field("matched", &self.matched)
            .field("index", &self.index)
            .field("default_parameter", &self.default_parameter)
            .field("parameters", &self.parameters)
            .field("end_tag", &self.end_tag.as_deref().map(Linked))
            .field("content", &self.content.as_deref().map(Linked))
            .field("tail", &self.tail.as_deref().map(Linked))
            .finish()
    }
}

impl Drop for Token {
    fn drop(&mut self) {
        let mut pending = self.take_children().collect::<Vec<_>>();
        while let Some(mut token) = pending.pop() {
            pending.extend(token.take_children());
        }
    }
}

/// Iterator over a chain of tokens linked by tail.
pub struct Chain<'a> {
    next: Option<&'a Token>,
}

impl<'a> Iterator for Chain<'a> {
    type Item = &'a Token;

    fn next(&mut self) -> Option<Self::Item> {
        let curr = self.next?;
        self.next = curr.tail.as_deref();
        Some(curr)
    }
}

/// Link `tokens` into a chain in order, ending with `last`.
pub(crate) fn link(tokens: Vec<Token>, last: Option<Token>) -> Option<Box<Token>> {
    let mut tail = last.map(Box::new);
    for mut token in tokens.into_iter().rev() {
        token.tail = tail;
        tail = Some(Box::new(token));
    }
    tail
}
