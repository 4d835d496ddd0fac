//! Compiles user-authored tag definitions.
//!
//! A definition string describes the BBCode side of a tag (`[food={CHOICE=a,b}]{TEXT}[/food]`)
//! and a format string the HTML side (`<span class="{CHOICE}">{TEXT}</span>`). Both must use
//! exactly the same placeholders.
use once_cell::sync::Lazy;
use regex::Regex;

use super::{placeholder, ArgumentSlot, Placeholder, TagOptions, TagRender, TagSpec, Template, TemplatePiece};
use crate::error::DefinitionError;

static HTML_ELEMENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"</?[A-Za-z][^<>]*>").unwrap());

/// The parsed BBCode side of a definition.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Pattern {
    pub name: String,
    pub argument: ArgumentSlot,
    pub body: Option<Placeholder>,
    pub closing: bool,
}

/// Validate a tag name and normalize it to lowercase.
pub(crate) fn check_name(name: &str) -> Result<String, DefinitionError> {
    if name.is_empty() {
        return Err(DefinitionError::MissingName);
    }

    if !name.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return Err(DefinitionError::InvalidName(name.to_owned()));
    }

    Ok(name.to_ascii_lowercase())
}

impl Pattern {
    pub(crate) fn parse(definition: &str, options: TagOptions) -> Result<Self, DefinitionError> {
        let malformed = || DefinitionError::MalformedDefinition(definition.to_owned());

        let rest = definition.strip_prefix('[').ok_or_else(malformed)?;
        let end = rest.find(']').ok_or_else(malformed)?;
        let (opening, rest) = (&rest[..end], &rest[end + 1..]);

        let (name, argument) = match opening.split_once('=') {
            Some((name, argument)) => (name, Some(argument)),
            None => (opening, None),
        };

        let name = check_name(name)?;
        let argument = match argument {
            Some(token) => ArgumentSlot::Required(Placeholder::parse(token)?),
            None => ArgumentSlot::None,
        };

        if options.contains(TagOptions::STANDALONE) {
            if !rest.is_empty() {
                return Err(DefinitionError::StandaloneWithContent);
            }

            return Ok(Self {
                name,
                argument,
                body: None,
                closing: false,
            });
        }

        if !rest.starts_with('{') {
            return Err(DefinitionError::MissingContent);
        }

        let token_end = rest
            .find('}')
            .ok_or_else(|| DefinitionError::MalformedPlaceholder(rest.to_owned()))?;
        let body = Placeholder::parse(&rest[..=token_end])?;
        let rest = &rest[token_end + 1..];

        if argument.placeholder().is_some_and(|a| a.name() == body.name()) {
            return Err(DefinitionError::DuplicatePlaceholder(body.name().to_owned()));
        }

        let closing = if rest.is_empty() {
            let implicit = TagOptions::SAME_TAG_CLOSES
                | TagOptions::NEWLINE_CLOSES
                | TagOptions::END_TAG_CLOSES;
            if !options.intersects(implicit) {
                return Err(DefinitionError::MissingClosingTag);
            }
            false
        } else {
            let closing_name = rest
                .strip_prefix("[/")
                .and_then(|r| r.strip_suffix(']'))
                .ok_or_else(malformed)?;

            if !closing_name.eq_ignore_ascii_case(&name) {
                return Err(DefinitionError::MismatchedClosingTag {
                    opening: name,
                    closing: closing_name.to_owned(),
                });
            }
            true
        };

        Ok(Self {
            name,
            argument,
            body: Some(body),
            closing,
        })
    }
}

/// Compile a definition and format string into a [`TagSpec`].
pub fn compile(definition: &str, format: &str, options: TagOptions) -> Result<TagSpec, DefinitionError> {
    let pattern = Pattern::parse(definition, options)?;
    let template = compile_template(&pattern, format)?;

    Ok(TagSpec::from_parts(
        pattern.name,
        pattern.argument,
        pattern.body,
        pattern.closing,
        TagRender::Template(template),
        options,
    ))
}

fn compile_template(pattern: &Pattern, format: &str) -> Result<Template, DefinitionError> {
    let argument = pattern.argument.placeholder();
    let body = pattern.body.as_ref();

    let mut pieces = Vec::new();
    let mut literal_html = String::new();
    let mut used_argument = false;
    let mut used_body = false;
    let mut last = 0;

    // Format tokens refer to definition placeholders by name; a modifier, if repeated, must be
    // the definition's.
    for found in placeholder::scan(format) {
        let (piece, defined) = if let Some(a) = argument.filter(|a| a.name() == found.name) {
            used_argument = true;
            (TemplatePiece::Argument, a)
        } else if let Some(b) = body.filter(|b| b.name() == found.name) {
            used_body = true;
            (TemplatePiece::Body, b)
        } else {
            found.resolve()?;
            return Err(DefinitionError::UndefinedPlaceholder(found.name));
        };

        if found.modifier.is_some() && found.modifier != defined.modifier() {
            return Err(DefinitionError::MalformedPlaceholder(found.text.to_owned()));
        }

        let literal = &format[last..found.range.start];
        if !literal.is_empty() {
            literal_html.push_str(literal);
            pieces.push(TemplatePiece::Literal(literal.to_owned()));
        }
        pieces.push(piece);
        last = found.range.end;
    }

    let tail = &format[last..];
    if !tail.is_empty() {
        literal_html.push_str(tail);
        pieces.push(TemplatePiece::Literal(tail.to_owned()));
    }

    if let Some(a) = argument.filter(|_| !used_argument) {
        return Err(DefinitionError::UnusedPlaceholder(a.name().to_owned()));
    }
    if let Some(b) = body.filter(|_| !used_body) {
        return Err(DefinitionError::UnusedPlaceholder(b.name().to_owned()));
    }

    if !HTML_ELEMENT_RE.is_match(&literal_html) {
        return Err(DefinitionError::MissingHtml);
    }

    Ok(Template::new(pieces))
}
