//! Placeholder tokens (`{TEXT}`, `{COLOR1}`, `{RANGE=2,15}`, `{CHOICE=a,b}`) and the value
//! checks behind each placeholder kind.
use std::{fmt, ops::Range};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::DefinitionError;

/// Anything of the form `{NAME}` / `{NAME=modifier}`; other braces are plain text.
static PLACEHOLDER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([A-Z]+)([0-9]*)(?:=([^{}]*))?\}").unwrap());

static COLOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:[A-Za-z]+|#[0-9A-Fa-f]{3}|#[0-9A-Fa-f]{6})$").unwrap());

static NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[+-]?[0-9]+$").unwrap());

static SIMPLE_TEXT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9\-+.,_ ]+$").unwrap());

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(?:\.[A-Za-z0-9\-]+)+$").unwrap()
});

static URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)^(?:(?:https?|ftp)://[^\s<>"]+|[a-z0-9](?:[a-z0-9\-]*[a-z0-9])?(?:\.[a-z0-9](?:[a-z0-9\-]*[a-z0-9])?)*\.[a-z]{2,6}(?::[0-9]+)?(?:[/?#][^\s<>"]*)?)$"#,
    )
    .unwrap()
});

/// What values a placeholder accepts.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaceholderKind {
    /// Anything at all.
    Text,
    /// Letters, digits, spaces and `-+.,_`.
    SimpleText,
    /// A CSS color word, `#RGB` or `#RRGGBB`.
    Color,
    /// An optionally signed integer.
    Number,
    Url,
    Email,
    /// A number within `min..=max`.
    Range { min: f64, max: f64 },
    /// One of a fixed set of values.
    Choice(Vec<String>),
}

impl PlaceholderKind {
    pub fn accepts(&self, value: &str) -> bool {
        match self {
            PlaceholderKind::Text => true,
            PlaceholderKind::SimpleText => SIMPLE_TEXT_RE.is_match(value),
            PlaceholderKind::Color => COLOR_RE.is_match(value),
            PlaceholderKind::Number => NUMBER_RE.is_match(value),
            PlaceholderKind::Url => URL_RE.is_match(value),
            PlaceholderKind::Email => EMAIL_RE.is_match(value),
            PlaceholderKind::Range { min, max } => value
                .trim()
                .parse::<f64>()
                .map_or(false, |v| !v.is_nan() && *min <= v && v <= *max),
            PlaceholderKind::Choice(choices) => choices.iter().any(|c| c == value),
        }
    }

    /// Free text is prose; every other kind holds a single value.
    pub fn is_free_text(&self) -> bool {
        matches!(self, PlaceholderKind::Text)
    }

    fn from_token(base: &str, modifier: Option<&str>, token: &str) -> Result<Self, DefinitionError> {
        let malformed = || DefinitionError::MalformedPlaceholder(token.to_owned());

        let simple = match base {
            "TEXT" => Some(PlaceholderKind::Text),
            "SIMPLETEXT" => Some(PlaceholderKind::SimpleText),
            "COLOR" => Some(PlaceholderKind::Color),
            "NUMBER" => Some(PlaceholderKind::Number),
            "URL" => Some(PlaceholderKind::Url),
            "EMAIL" => Some(PlaceholderKind::Email),
            _ => None,
        };

        if let Some(kind) = simple {
            return match modifier {
                None => Ok(kind),
                Some(_) => Err(malformed()),
            };
        }

        match (base, modifier) {
            ("RANGE", Some(bounds)) => {
                let (min, max) = bounds.split_once(',').ok_or_else(malformed)?;
                let min: f64 = min.trim().parse().map_err(|_| malformed())?;
                let max: f64 = max.trim().parse().map_err(|_| malformed())?;
                // NaN fails this comparison too.
                if !(min <= max) {
                    return Err(malformed());
                }
                Ok(PlaceholderKind::Range { min, max })
            }
            ("CHOICE", Some(list)) => {
                let choices: Vec<String> = list.split(',').map(|c| c.trim().to_owned()).collect();
                if choices.iter().any(String::is_empty) {
                    return Err(malformed());
                }
                Ok(PlaceholderKind::Choice(choices))
            }
            ("RANGE" | "CHOICE", None) => Err(malformed()),
            _ => Err(DefinitionError::UnknownPlaceholder(
                token.trim_matches(|c| c == '{' || c == '}').to_owned(),
            )),
        }
    }
}

/// A named slot shared between a tag definition and its HTML template.
#[derive(Debug, Clone, PartialEq)]
pub struct Placeholder {
    name: String,
    modifier: Option<String>,
    kind: PlaceholderKind,
}

impl Placeholder {
    pub fn new(name: impl Into<String>, kind: PlaceholderKind) -> Self {
        Self {
            name: name.into(),
            modifier: None,
            kind,
        }
    }

    /// The `{TEXT}` placeholder.
    pub fn text() -> Self {
        Self::new("TEXT", PlaceholderKind::Text)
    }

    /// Parse a whole placeholder token such as `{CHOICE1=red,blue}`.
    pub fn parse(token: &str) -> Result<Self, DefinitionError> {
        match scan(token).next() {
            Some(found) if found.range == (0..token.len()) => found.resolve(),
            _ => Err(DefinitionError::MalformedPlaceholder(token.to_owned())),
        }
    }

    /// Name including its index, e.g. `TEXT1`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn modifier(&self) -> Option<&str> {
        self.modifier.as_deref()
    }

    pub fn kind(&self) -> &PlaceholderKind {
        &self.kind
    }

    pub fn accepts(&self, value: &str) -> bool {
        self.kind.accepts(value)
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.modifier {
            Some(modifier) => write!(f, "{{{}={}}}", self.name, modifier),
            None => write!(f, "{{{}}}", self.name),
        }
    }
}

/// A placeholder token as written, before its kind is checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Token<'a> {
    pub range: Range<usize>,
    /// The whole token, braces included.
    pub text: &'a str,
    /// Name including its index, e.g. `CHOICE2`.
    pub name: String,
    pub modifier: Option<&'a str>,
    base: &'a str,
}

impl Token<'_> {
    /// The placeholder this token declares.
    pub fn resolve(&self) -> Result<Placeholder, DefinitionError> {
        let kind = PlaceholderKind::from_token(self.base, self.modifier, self.text)?;
        Ok(Placeholder {
            name: self.name.clone(),
            modifier: self.modifier.map(str::to_owned),
            kind,
        })
    }
}

/// Every placeholder token in `text`, in order.
pub(crate) fn scan(text: &str) -> impl Iterator<Item = Token<'_>> + '_ {
    PLACEHOLDER_RE.captures_iter(text).filter_map(|caps| {
        let whole = caps.get(0)?;
        let base = caps.get(1)?.as_str();
        let index = caps.get(2).map_or("", |m| m.as_str());

        Some(Token {
            range: whole.range(),
            text: whole.as_str(),
            name: format!("{base}{index}"),
            modifier: caps.get(3).map(|m| m.as_str().trim()),
            base,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    pub fn parses_indexed_names() {
        let p = Placeholder::parse("{TEXT1}").unwrap();
        assert_eq!(p.name(), "TEXT1");
        assert_eq!(p.kind(), &PlaceholderKind::Text);
    }

    #[test]
    pub fn parses_modifiers() {
        let p = Placeholder::parse("{CHOICE2=red, blue}").unwrap();
        assert_eq!(
            p.kind(),
            &PlaceholderKind::Choice(vec!["red".to_owned(), "blue".to_owned()])
        );
        assert!(p.accepts("blue"));
        assert!(!p.accepts("green"));

        let p = Placeholder::parse("{RANGE=2,15}").unwrap();
        assert!(p.accepts("2"));
        assert!(p.accepts("15"));
        assert!(p.accepts("7.5"));
        assert!(!p.accepts("16"));
        assert!(!p.accepts("big"));
    }

    #[test]
    pub fn rejects_bad_tokens() {
        assert!(matches!(
            Placeholder::parse("{UNKNOWN}"),
            Err(DefinitionError::UnknownPlaceholder(name)) if name == "UNKNOWN"
        ));
        assert!(matches!(
            Placeholder::parse("{RANGE}"),
            Err(DefinitionError::MalformedPlaceholder(_))
        ));
        assert!(matches!(
            Placeholder::parse("{RANGE=9,2}"),
            Err(DefinitionError::MalformedPlaceholder(_))
        ));
        assert!(matches!(
            Placeholder::parse("{TEXT=foo}"),
            Err(DefinitionError::MalformedPlaceholder(_))
        ));
        assert!(Placeholder::parse("{TEXT#1}").is_err());
        assert!(Placeholder::parse("{text}").is_err());
    }

    #[test]
    pub fn kind_checks() {
        assert!(PlaceholderKind::Color.accepts("green"));
        assert!(PlaceholderKind::Color.accepts("#FFF"));
        assert!(PlaceholderKind::Color.accepts("#a0b1c2"));
        assert!(!PlaceholderKind::Color.accepts("some words"));
        assert!(!PlaceholderKind::Color.accepts("#FFFF"));
        assert!(!PlaceholderKind::Color.accepts("<script></script>"));

        assert!(PlaceholderKind::Number.accepts("24"));
        assert!(PlaceholderKind::Number.accepts("-3"));
        assert!(!PlaceholderKind::Number.accepts(""));
        assert!(!PlaceholderKind::Number.accepts("hello"));

        assert!(PlaceholderKind::Email.accepts("xyz@xyz.com"));
        assert!(!PlaceholderKind::Email.accepts("xyz.com"));

        assert!(PlaceholderKind::Url.accepts("http://www.foo.com/bar/img.png"));
        assert!(PlaceholderKind::Url.accepts("google.com"));
        assert!(!PlaceholderKind::Url.accepts("not a url"));

        assert!(PlaceholderKind::SimpleText.accepts("Hello, world-1"));
        assert!(!PlaceholderKind::SimpleText.accepts("<b>"));
    }

    #[test]
    pub fn scan_skips_plain_braces() {
        let found: Vec<_> = scan("if (x) { y(); } <b>{TEXT}</b> {TEXT#1}")
            .map(|t| t.name)
            .collect();
        assert_eq!(found, ["TEXT"]);
    }

    #[test]
    pub fn tokens_resolve_on_demand() {
        let tokens: Vec<_> = scan("<span data-x=\"{CHOICE2}\">{RANGE1=2, 15}</span>").collect();
        assert_eq!(tokens.len(), 2);

        assert_eq!(tokens[0].name, "CHOICE2");
        assert_eq!(tokens[0].modifier, None);
        assert!(tokens[0].resolve().is_err());

        assert_eq!(tokens[1].text, "{RANGE1=2, 15}");
        assert_eq!(tokens[1].modifier, Some("2, 15"));
        assert!(tokens[1].resolve().unwrap().accepts("15"));
    }
}
