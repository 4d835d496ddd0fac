//! Pull tokenizer for BBCode input.
//!
//! The tokenizer knows nothing about which tags exist; it only splits the input into text, line
//! breaks and syntactically valid opening/closing tags. Deciding what a tag means is left to
//! [`tree`].
use std::ops::Range;

pub(crate) mod tree;

#[doc(alias = "tokenizer")]
pub struct BBParser<'a> {
    input: &'a str,
    loc: usize,
}

impl<'a> BBParser<'a> {
    pub fn new(input: &'a str) -> BBParser<'a> {
        Self { input, loc: 0 }
    }

    /// Returns all input text left to parse
    pub fn remaining(&self) -> &'a str {
        &self.input[self.loc..]
    }

    /// Length of the tag candidate at the start of `rem` (which begins with `[`), including both
    /// brackets. `None` when a line break or another `[` shows up before the closing `]`.
    ///
    /// A `]` inside a quoted argument (`[url="a]b"]`) does not end the tag. Only a quote directly
    /// after the `=` opens a quoted argument.
    fn tag_extent(rem: &str) -> Option<usize> {
        let mut quotable = false;
        let mut quote: Option<char> = None;

        for (idx, ch) in rem.char_indices().skip(1) {
            match (quote, ch) {
                (_, '\n' | '\r') => return None,
                (Some(q), c) if c == q => quote = None,
                (Some(_), _) => {}
                (None, '=') => quotable = true,
                (None, '"' | '\'') if quotable => {
                    quote = Some(ch);
                    quotable = false;
                }
                (None, '[') => return None,
                (None, ']') => return Some(idx + 1),
                (None, c) if !c.is_whitespace() => quotable = false,
                _ => {}
            }
        }

        None
    }

    /// Interpret the inside of a `[...]` pair.
    fn to_token_kind(contents: &'a str) -> Option<TokenKind<'a>> {
        let contents = contents.trim();

        let (closing, contents) = match contents.strip_prefix('/') {
            Some(rest) => (true, rest.trim_start()),
            None => (false, contents),
        };

        let (name, arg) = match contents.split_once('=') {
            Some((name, arg)) => (name.trim_end(), Some(unquote(arg.trim()))),
            None => (contents, None),
        };

        if name.is_empty() || name.contains(char::is_whitespace) {
            return None;
        }

        if closing {
            // Closing tags never carry arguments.
            arg.is_none().then_some(TokenKind::CloseTag(BBTag { name, arg: None }))
        } else {
            Some(TokenKind::OpenTag(BBTag { name, arg }))
        }
    }
}

fn unquote(arg: &str) -> &str {
    let bytes = arg.as_bytes();
    match bytes {
        [first @ (b'"' | b'\''), .., last] if first == last && bytes.len() >= 2 => &arg[1..arg.len() - 1],
        _ => arg,
    }
}

impl<'a> Iterator for BBParser<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        const LINE_BREAKS: &[char] = &['\n', '\r'];

        let rem = self.remaining();
        let first_char = rem.chars().next()?;
        let start = self.loc;

        let (len, kind) = 'tk: {
            if rem.starts_with("\r\n") {
                break 'tk (2, TokenKind::Newline);
            }

            if LINE_BREAKS.contains(&first_char) {
                break 'tk (1, TokenKind::Newline);
            }

            if first_char == '[' {
                if let Some(extent) = Self::tag_extent(rem) {
                    if let Some(kind) = Self::to_token_kind(&rem[1..extent - 1]) {
                        break 'tk (extent, kind);
                    }
                }
            }

            // Plain text runs until the next bracket or line break. A `[` that failed to open a
            // tag is part of the text and scanning resumes right after it.
            let skip = first_char.len_utf8();
            let end = rem[skip..]
                .find(['[', '\n', '\r'])
                .map(|idx| idx + skip)
                .unwrap_or(rem.len());
            (end, TokenKind::Text)
        };

        self.loc += len;
        let token = Token {
            span: &self.input[start..self.loc],
            start,
            kind,
        };
        log::trace!(target: "bbrender::parser", "token: {token:?}");
        Some(token)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub span: &'a str,
    pub start: usize,
    pub kind: TokenKind<'a>,
}

impl<'a> Token<'a> {
    pub fn range(&self) -> Range<usize> {
        self.start..(self.start + self.span.len())
    }

    pub fn is_text(&self) -> bool {
        matches!(self.kind, TokenKind::Text)
    }

    pub fn is_newline(&self) -> bool {
        matches!(self.kind, TokenKind::Newline)
    }

    /// Whether this is an opening tag named `tag` (case-insensitive).
    pub fn is_open(&self, tag: &str) -> bool {
        matches!(&self.kind, TokenKind::OpenTag(t) if t.name.eq_ignore_ascii_case(tag))
    }

    /// Whether this is an opening tag named `tag` without an argument.
    pub fn is_open_argless(&self, tag: &str) -> bool {
        matches!(&self.kind, TokenKind::OpenTag(t) if t.name.eq_ignore_ascii_case(tag) && t.arg.is_none())
    }

    /// Whether this is a closing tag named `tag` (case-insensitive).
    pub fn is_close(&self, tag: &str) -> bool {
        matches!(&self.kind, TokenKind::CloseTag(t) if t.name.eq_ignore_ascii_case(tag))
    }

    pub fn tag_name(&self) -> Option<&'a str> {
        match &self.kind {
            TokenKind::OpenTag(t) | TokenKind::CloseTag(t) => Some(t.name),
            _ => None,
        }
    }

    pub fn args(&self) -> Option<&'a str> {
        match &self.kind {
            TokenKind::OpenTag(t) => t.arg,
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BBTag<'a> {
    /// Tag name as written, without surrounding whitespace.
    pub name: &'a str,
    /// Argument after `=`, trimmed and unquoted.
    pub arg: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind<'a> {
    OpenTag(BBTag<'a>),
    CloseTag(BBTag<'a>),
    Newline,
    Text,
}
