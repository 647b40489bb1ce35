use std::collections::HashMap;
use tracing::{debug, trace};

use crate::error::SyntaxError;
use crate::lexer::Lexer;
use crate::tag::{ClosingRequirement, TagRegistry};
use crate::token::{link, Parameter, ParameterValue, Token, TokenType};
use crate::{CLOSE, EQUAL, OPEN, SLASH};

/// Parser turning source text into a token tree.
///
/// Holds the [`TagRegistry`] deciding which tags exist and whether they need end tags. A
/// parser can be reused, each [`Parser::parse`] call has its own lexer and context.
#[derive(Clone, Debug, Default)]
pub struct Parser {
    registry: TagRegistry,
}

impl Parser {
    /// Parser with the built-in registry.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_registry(registry: TagRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &TagRegistry {
        &self.registry
    }

    /// Parse `source` into a tree.
    ///
    /// Returns the root [`TokenType::Text`] token, its tail chain ends with exactly one
    /// [`TokenType::Eof`].
    ///
    /// # Errors
    ///
    /// Only when the lexer fails. Tags not fitting the grammar are kept as words.
    pub fn parse(&self, source: &str) -> Result<Token, SyntaxError> {
        Context::new(&self.registry, source)?.build()
    }
}

/// An open tag waiting for its end tag.
struct Frame {
    name: String,

    /// Slot of the tag in [`Context::tokens`], tokens after it belong to this frame.
    start: usize,

    requirement: ClosingRequirement,
}

/// State of a single parse.
///
/// The frame stack is the context stack: the innermost open tag is on the top. All tokens
/// live in one flat list until their tag closes, so giving up a tag only rewrites its slot.
struct Context<'a> {
    registry: &'a TagRegistry,

    lexer: Lexer<'a>,

    /// One token lookahead.
    lookahead: Option<Token>,

    /// Tokens not yet moved into the content of a closed tag, in document order.
    tokens: Vec<Token>,

    frames: Vec<Frame>,

    /// Count of open frames per tag name.
    open: HashMap<String, usize>,
}

impl<'a> Context<'a> {
    fn new(registry: &'a TagRegistry, source: &'a str) -> Result<Self, SyntaxError> {
        let mut lexer = Lexer::new(source);
        let lookahead = lexer.next_token()?;
        Ok(Self {
            registry,
            lexer,
            lookahead,
            tokens: vec![],
            frames: vec![],
            open: HashMap::new(),
        })
    }

    /// Take the lookahead token and read the next one.
    fn consume(&mut self) -> Result<Option<Token>, SyntaxError> {
        let token = self.lookahead.take();
        if token.is_some() {
            self.lookahead = self.lexer.next_token()?;
        }
        Ok(token)
    }

    /// Name of the innermost open tag.
    fn context(&self) -> Option<&str> {
        self.frames.last().map(|x| x.name.as_str())
    }

    fn is_open(&self, name: &str) -> bool {
        self.open.contains_key(name)
    }

    fn build(mut self) -> Result<Token, SyntaxError> {
        while let Some(token) = self.consume()? {
            self.literal(token)?;
        }

        // Nothing left to close the remaining tags.
        while !self.frames.is_empty() {
            self.abandon();
        }

        Ok(Token::root(link(self.tokens, Some(Token::eof()))))
    }

    fn literal(&mut self, token: Token) -> Result<(), SyntaxError> {
        match token.kind {
            TokenType::Space | TokenType::Newline | TokenType::Word => self.tokens.push(token),
            TokenType::Tag => self.tag(token),
            TokenType::EndTag => self.end_tag(token),
            TokenType::Text | TokenType::Number | TokenType::Eof => {
                return Err(SyntaxError::UnexpectedToken(
                    token.kind,
                    token.index.unwrap_or_default(),
                ))
            }
        }
        Ok(())
    }

    fn tag(&mut self, token: Token) {
        let tag = parse_tag_head(token);
        let name = tag.name.as_deref().unwrap_or_default();

        if !self.registry.is_valid(name) {
            debug!(name, index = tag.index, "unknown tag, fallback to word");
            self.tokens.push(tag.demote());
            return;
        }

        match self.registry.requirement(name) {
            ClosingRequirement::None => self.tokens.push(tag),
            requirement => {
                trace!(name, index = tag.index, "open tag");
                let name = name.to_string();
                *self.open.entry(name.clone()).or_default() += 1;
                self.frames.push(Frame {
                    name,
                    start: self.tokens.len(),
                    requirement,
                });
                self.tokens.push(tag);
            }
        }
    }

    fn end_tag(&mut self, token: Token) {
        let end_tag = parse_end_tag(token);
        let name = end_tag.name.as_deref().unwrap_or_default();

        if !self.is_open(name) {
            debug!(
                name,
                context = self.context(),
                index = end_tag.index,
                "end tag closes nothing, fallback to word"
            );
            self.tokens.push(end_tag.demote());
            return;
        }

        // Closes the innermost open tag with the same name even when it is not on top:
        // `[b][i]x[/b]` closes `b` and gives up `i`. Tags opened later are never closed.
        while self.frames.last().is_some_and(|x| x.name != name) {
            self.abandon();
        }
        self.close(end_tag);
    }

    fn release(&mut self, name: &str) {
        if let Some(count) = self.open.get_mut(name) {
            *count -= 1;
            if *count == 0 {
                self.open.remove(name);
            }
        }
    }

    /// Close the innermost open tag with `end_tag`.
    fn close(&mut self, end_tag: Token) {
        let Some(frame) = self.frames.pop() else {
            return;
        };
        self.release(&frame.name);
        let content = self.tokens.split_off(frame.start + 1);
        if let Some(tag) = self.tokens.get_mut(frame.start) {
            trace!(name = frame.name.as_str(), index = tag.index, "close tag");
            tag.content = link(content, None);
            tag.end_tag = Some(Box::new(end_tag));
        }
    }

    /// Give up the innermost open tag, the tokens after it stay flat where they are.
    fn abandon(&mut self) {
        let Some(frame) = self.frames.pop() else {
            return;
        };
        self.release(&frame.name);
        if frame.requirement != ClosingRequirement::Required {
            return;
        }
        if let Some(tag) = self.tokens.get_mut(frame.start) {
            debug!(
                name = frame.name.as_str(),
                index = tag.index,
                "required end tag missing, fallback to word"
            );
            tag.demote_in_place();
        }
    }
}

/// Fill name and parameters of a [`TokenType::Tag`] token from its source text.
///
/// ```console
/// [album=x id=1234 live]
///  |     | |       |-> ("live", Flag)
///  |     | |-> ("id", Text("1234"))
///  |     |-> default parameter
///  |-> name
/// ```
///
/// Fragments are split on whitespace, `=` splits only once. Leading whitespace leaves an
/// empty name which is never a registered tag.
fn parse_tag_head(mut token: Token) -> Token {
    let head = token
        .matched
        .as_deref()
        .and_then(|x| x.strip_prefix(OPEN))
        .and_then(|x| x.strip_suffix(CLOSE))
        .unwrap_or_default();

    let mut fragments = head.split(char::is_whitespace);
    let first = fragments.next().unwrap_or_default();
    let (name, default_parameter) = match first.split_once(EQUAL) {
        Some((name, value)) => (name, Some(value.to_string())),
        None => (first, None),
    };
    let parameters = fragments
        .filter(|x| !x.is_empty())
        .map(parse_parameter)
        .collect::<Vec<_>>();

    token.name = Some(name.to_string());
    token.default_parameter = default_parameter;
    token.parameters = parameters;
    token
}

fn parse_parameter(fragment: &str) -> Parameter {
    match fragment.split_once(EQUAL) {
        Some((key, value)) => (key.to_string(), ParameterValue::Text(value.to_string())),
        None => (fragment.to_string(), ParameterValue::Flag),
    }
}

/// Fill name of a [`TokenType::EndTag`] token, the text between `[/` and `]`.
fn parse_end_tag(mut token: Token) -> Token {
    let name = token
        .matched
        .as_deref()
        .and_then(|x| x.strip_prefix(OPEN))
        .and_then(|x| x.strip_prefix(SLASH))
        .and_then(|x| x.strip_suffix(CLOSE))
        .unwrap_or_default()
        .to_string();
    token.name = Some(name);
    token
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(source: &str) -> Token {
        Parser::new().parse(source).unwrap()
    }

    /// Top level chain after root, without the EOF.
    fn top(root: &Token) -> Vec<&Token> {
        root.tail
            .as_deref()
            .unwrap()
            .chain()
            .filter(|x| !x.is(TokenType::Eof))
            .collect()
    }

    fn texts<'a>(tokens: impl IntoIterator<Item = &'a Token>) -> Vec<(TokenType, &'a str)> {
        tokens
            .into_iter()
            .map(|x| (x.kind, x.matched.as_deref().unwrap_or_default()))
            .collect()
    }

    fn content(token: &Token) -> Vec<&Token> {
        token
            .content
            .as_deref()
            .map(|x| x.chain().collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_closed_tag() {
        let root = parse("[band]Emperor[/band]");
        assert!(root.is(TokenType::Text));
        assert_eq!(root.matched, None);

        let band = root.tail.as_deref().unwrap();
        assert!(band.is(TokenType::Tag));
        assert_eq!(band.name.as_deref(), Some("band"));
        assert_eq!(
            texts(content(band)),
            vec![(TokenType::Word, "Emperor")]
        );
        let end_tag = band.end_tag.as_deref().unwrap();
        assert!(end_tag.is(TokenType::EndTag));
        assert_eq!(end_tag.name.as_deref(), Some("band"));
        assert_eq!(end_tag.tail, None);

        let eof = band.tail.as_deref().unwrap();
        assert!(eof.is(TokenType::Eof));
        assert_eq!(eof.tail, None);
    }

    #[test]
    fn test_empty_source() {
        let root = parse("");
        assert!(top(&root).is_empty());
        assert!(root.tail.as_deref().unwrap().is(TokenType::Eof));
    }

    #[test]
    fn test_required_without_end_tag_is_word() {
        let root = parse("[b]bold");
        assert_eq!(
            texts(top(&root)),
            vec![(TokenType::Word, "[b]"), (TokenType::Word, "bold")]
        );
        assert_eq!(top(&root)[0].name, None);
    }

    #[test]
    fn test_optional_without_end_tag_stays_tag() {
        let root = parse("[band id=123] x");
        let tokens = top(&root);
        assert_eq!(
            texts(tokens.clone()),
            vec![
                (TokenType::Tag, "[band id=123]"),
                (TokenType::Space, " "),
                (TokenType::Word, "x"),
            ]
        );
        assert_eq!(tokens[0].content, None);
        assert_eq!(tokens[0].end_tag, None);
        assert_eq!(
            tokens[0].parameters,
            vec![("id".to_string(), ParameterValue::Text("123".to_string()))]
        );
    }

    #[test]
    fn test_none_tag_is_never_closed() {
        let root = parse("[hr]x[/hr]");
        let tokens = top(&root);
        assert_eq!(
            texts(tokens.clone()),
            vec![
                (TokenType::Tag, "[hr]"),
                (TokenType::Word, "x"),
                (TokenType::Word, "[/hr]"),
            ]
        );
        assert!(!tokens[0].is_closed());
    }

    #[test]
    fn test_unknown_tag_is_word() {
        let root = parse("[bogus]hi[/bogus]");
        assert_eq!(
            texts(top(&root)),
            vec![
                (TokenType::Word, "[bogus]"),
                (TokenType::Word, "hi"),
                (TokenType::Word, "[/bogus]"),
            ]
        );
    }

    #[test]
    fn test_end_tag_closes_innermost_matching_tag() {
        // `[/b]` passes the open `i`, which falls back to a word as it is required.
        let root = parse("[b][i]x[/b][/i]");
        let tokens = top(&root);
        assert_eq!(
            texts(tokens.clone()),
            vec![(TokenType::Tag, "[b]"), (TokenType::Word, "[/i]")]
        );
        assert_eq!(
            texts(content(tokens[0])),
            vec![(TokenType::Word, "[i]"), (TokenType::Word, "x")]
        );
        assert_eq!(
            tokens[0].end_tag.as_deref().unwrap().matched.as_deref(),
            Some("[/b]")
        );
    }

    #[test]
    fn test_optional_inner_tag_stays_unclosed() {
        let root = parse("[b][band]x[/b]");
        let b = top(&root)[0];
        let inner = content(b);
        assert_eq!(
            texts(inner.clone()),
            vec![(TokenType::Tag, "[band]"), (TokenType::Word, "x")]
        );
        assert!(!inner[0].is_closed());
    }

    #[test]
    fn test_same_name_nesting() {
        let root = parse("[b]1[b]2[/b]3[/b]");
        let outer = top(&root)[0];
        let inner = content(outer);
        assert_eq!(
            texts(inner.clone()),
            vec![
                (TokenType::Word, "1"),
                (TokenType::Tag, "[b]"),
                (TokenType::Word, "3"),
            ]
        );
        assert_eq!(texts(content(inner[1])), vec![(TokenType::Word, "2")]);
    }

    #[test]
    fn test_extra_end_tag_after_close_is_word() {
        let root = parse("[b]x[/b][/b]");
        assert_eq!(
            texts(top(&root)),
            vec![(TokenType::Tag, "[b]"), (TokenType::Word, "[/b]")]
        );
    }

    #[test]
    fn test_closed_tag_with_nothing_inside() {
        let root = parse("[b][/b]");
        let b = top(&root)[0];
        assert!(b.is_closed());
        assert_eq!(b.content, None);
    }

    #[test]
    fn test_tag_head_parameters() {
        let root = parse("[url=http:x id=1=2 live  a=]t[/url]");
        let url = top(&root)[0];
        assert_eq!(url.name.as_deref(), Some("url"));
        assert_eq!(url.default_parameter.as_deref(), Some("http:x"));
        assert_eq!(
            url.parameters,
            vec![
                ("id".to_string(), ParameterValue::Text("1=2".to_string())),
                ("live".to_string(), ParameterValue::Flag),
                ("a".to_string(), ParameterValue::Text(String::new())),
            ]
        );
    }

    #[test]
    fn test_duplicated_parameters_kept_in_order() {
        let root = parse("[album x=1 x=2]");
        let album = top(&root)[0];
        assert_eq!(album.parameters.len(), 2);
        assert_eq!(
            album.parameter("x"),
            Some(&ParameterValue::Text("1".to_string()))
        );
    }

    #[test]
    fn test_bare_tag_has_no_parameters() {
        let root = parse("[band]");
        let band = top(&root)[0];
        assert!(band.parameters.is_empty());
        assert_eq!(band.default_parameter, None);
    }

    #[test]
    fn test_leading_space_in_head_is_unknown_tag() {
        let root = parse("[ b]x[/b]");
        assert_eq!(
            texts(top(&root)),
            vec![
                (TokenType::Word, "[ b]"),
                (TokenType::Word, "x"),
                (TokenType::Word, "[/b]"),
            ]
        );
    }

    #[test]
    fn test_custom_registry() {
        let parser = Parser::with_registry(
            TagRegistry::empty().with("spoiler", ClosingRequirement::Required),
        );
        let root = parser.parse("[spoiler]x[/spoiler] [b]y[/b]").unwrap();
        let tokens = top(&root);
        assert!(tokens[0].is_closed());
        assert_eq!(
            texts(tokens[2..].iter().copied()),
            vec![
                (TokenType::Word, "[b]"),
                (TokenType::Word, "y"),
                (TokenType::Word, "[/b]"),
            ]
        );
    }

    #[test]
    fn test_lexer_error_aborts() {
        let err = Parser::new().parse("[b]x[/b] ]").unwrap_err();
        assert_eq!(err.offset(), 9);
    }

    #[test]
    fn test_newlines_in_content() {
        let root = parse("[quote]a\nb[/quote]");
        assert_eq!(
            texts(content(top(&root)[0])),
            vec![
                (TokenType::Word, "a"),
                (TokenType::Newline, "\n"),
                (TokenType::Word, "b"),
            ]
        );
    }

    #[test]
    fn test_many_unclosed_optional_tags() {
        let root = parse(&"[band]x".repeat(100_000));
        let tokens = top(&root);
        assert_eq!(tokens.len(), 200_000);
        assert!(tokens
            .iter()
            .step_by(2)
            .all(|x| x.is(TokenType::Tag) && !x.is_closed()));
    }

    #[test]
    fn test_many_unclosed_required_tags() {
        let root = parse(&"[b]x".repeat(100_000));
        let tokens = top(&root);
        assert_eq!(tokens.len(), 200_000);
        assert!(tokens.iter().all(|x| x.is(TokenType::Word)));
        assert_eq!(tokens[199_998].matched.as_deref(), Some("[b]"));
    }

    #[test]
    fn test_many_end_tags_matching_nothing() {
        let source = "[b]".repeat(50_000) + &"[/i]".repeat(50_000);
        let root = parse(&source);
        let tokens = top(&root);
        assert_eq!(tokens.len(), 100_000);
        assert!(tokens.iter().all(|x| x.is(TokenType::Word)));
        assert_eq!(tokens[0].matched.as_deref(), Some("[b]"));
        assert_eq!(tokens[99_999].matched.as_deref(), Some("[/i]"));
    }

    #[test]
    fn test_end_tag_gives_up_many_inner_tags() {
        let source = "[b]".to_string() + &"[i]".repeat(50_000) + "[/b]";
        let root = parse(&source);
        let tokens = top(&root);
        assert_eq!(tokens.len(), 1);
        assert!(tokens[0].is_closed());
        let inner = content(tokens[0]);
        assert_eq!(inner.len(), 50_000);
        assert!(inner.iter().all(|x| x.matched.as_deref() == Some("[i]")));
    }

    #[test]
    fn test_deep_nesting_does_not_overflow() {
        let source = "[b]".repeat(50_000) + "x" + &"[/b]".repeat(50_000);
        let root = parse(&source);
        let mut depth = 0;
        let mut curr = root.tail.as_deref();
        while let Some(token) = curr {
            if !token.is(TokenType::Tag) {
                break;
            }
            depth += 1;
            curr = token.content.as_deref();
        }
        assert_eq!(depth, 50_000);
    }
}
