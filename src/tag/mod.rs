//! Tag specifications: the grammar of a single tag and how it turns into HTML.
use std::{fmt, sync::Arc};

use bitflags::bitflags;
use static_assertions::assert_obj_safe;

use crate::error::DefinitionError;

pub mod definition;
pub mod placeholder;

pub use placeholder::{Placeholder, PlaceholderKind};

bitflags! {
    /// Per-tag parsing and rendering switches.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct TagOptions: u32 {
        /// No content and no closing tag, e.g. `[hr]`.
        const STANDALONE = 1 << 0;
        /// An identical opening tag closes the open one.
        const SAME_TAG_CLOSES = 1 << 1;
        /// Any registered closing tag closes this one.
        const END_TAG_CLOSES = 1 << 2;
        /// A line break closes the tag.
        const NEWLINE_CLOSES = 1 << 3;
        /// Line breaks in the content become newline markup.
        const TRANSFORM_NEWLINES = 1 << 4;
        /// Tags inside the content are parsed.
        const RENDER_EMBEDDED = 1 << 5;
        /// Text inside the content is HTML-escaped.
        const ESCAPE_HTML = 1 << 6;
        /// Bare URLs inside the content become links.
        const REPLACE_LINKS = 1 << 7;
        /// Leading and trailing whitespace of the content is dropped.
        const STRIP = 1 << 8;
        /// The line break right after the closing tag is dropped.
        const SWALLOW_TRAILING_NEWLINE = 1 << 9;
        /// Editor hint, not used while rendering.
        const DISPLAY_ON_EDITOR = 1 << 10;
    }
}

impl Default for TagOptions {
    fn default() -> Self {
        Self::TRANSFORM_NEWLINES
            | Self::RENDER_EMBEDDED
            | Self::ESCAPE_HTML
            | Self::REPLACE_LINKS
            | Self::DISPLAY_ON_EDITOR
    }
}

/// Custom rendering for tags that need more than placeholder substitution.
///
/// `body` is the rendered HTML of the tag's content and `argument` the value after `=`, escaped
/// when the tag escapes HTML. `parent` is the enclosing tag, if any.
pub trait TagRenderer: Send + Sync {
    fn render(&self, body: &str, argument: Option<&str>, parent: Option<&TagSpec>) -> String;
}

assert_obj_safe!(TagRenderer);

impl<F> TagRenderer for F
where
    F: Fn(&str, Option<&str>, Option<&TagSpec>) -> String + Send + Sync,
{
    fn render(&self, body: &str, argument: Option<&str>, parent: Option<&TagSpec>) -> String {
        self(body, argument, parent)
    }
}

/// The `=value` part of an opening tag.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgumentSlot {
    None,
    Required(Placeholder),
    Optional(Placeholder),
}

impl ArgumentSlot {
    pub fn placeholder(&self) -> Option<&Placeholder> {
        match self {
            ArgumentSlot::None => None,
            ArgumentSlot::Required(p) | ArgumentSlot::Optional(p) => Some(p),
        }
    }

    /// Whether an opening tag carrying `argument` fits this slot.
    pub fn accepts(&self, argument: Option<&str>) -> bool {
        let argument = argument.filter(|a| !a.is_empty());
        match (self, argument) {
            (ArgumentSlot::None, None) | (ArgumentSlot::Optional(_), None) => true,
            (ArgumentSlot::None, Some(_)) | (ArgumentSlot::Required(_), None) => false,
            (ArgumentSlot::Required(p), Some(value)) | (ArgumentSlot::Optional(p), Some(value)) => {
                p.accepts(value)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplatePiece {
    Literal(String),
    Argument,
    Body,
}

/// A compiled HTML format string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Template {
    pieces: Vec<TemplatePiece>,
}

impl Template {
    pub fn new(pieces: Vec<TemplatePiece>) -> Self {
        Self { pieces }
    }

    /// `open` + body + `close`.
    pub fn wrap(open: &str, close: &str) -> Self {
        Self::new(vec![
            TemplatePiece::Literal(open.to_owned()),
            TemplatePiece::Body,
            TemplatePiece::Literal(close.to_owned()),
        ])
    }

    /// `prefix` + argument + `infix` + body + `close`.
    pub fn wrap_with_argument(prefix: &str, infix: &str, close: &str) -> Self {
        Self::new(vec![
            TemplatePiece::Literal(prefix.to_owned()),
            TemplatePiece::Argument,
            TemplatePiece::Literal(infix.to_owned()),
            TemplatePiece::Body,
            TemplatePiece::Literal(close.to_owned()),
        ])
    }

    pub fn pieces(&self) -> &[TemplatePiece] {
        &self.pieces
    }

    pub fn render(&self, argument: &str, body: &str, out: &mut String) {
        for piece in &self.pieces {
            match piece {
                TemplatePiece::Literal(text) => out.push_str(text),
                TemplatePiece::Argument => out.push_str(argument),
                TemplatePiece::Body => out.push_str(body),
            }
        }
    }
}

#[derive(Clone)]
pub enum TagRender {
    Template(Template),
    Custom(Arc<dyn TagRenderer>),
}

impl fmt::Debug for TagRender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagRender::Template(template) => f.debug_tuple("Template").field(template).finish(),
            TagRender::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Everything the parser and the HTML emitter need to know about one tag.
#[derive(Debug, Clone)]
pub struct TagSpec {
    name: String,
    argument: ArgumentSlot,
    body: Option<Placeholder>,
    closing: bool,
    render: TagRender,
    options: TagOptions,
    helpline: Option<String>,
    /// A tag that only exists directly inside this one, such as a list item.
    child: Option<Arc<TagSpec>>,
}

impl TagSpec {
    /// Compile a definition string such as `[color={COLOR}]{TEXT}[/color]` together with an HTML
    /// format string using the same placeholders.
    pub fn compile(definition: &str, format: &str, options: TagOptions) -> Result<Self, DefinitionError> {
        definition::compile(definition, format, options)
    }

    /// A definition string rendered by `renderer` instead of a format string.
    pub fn with_definition(
        definition: &str,
        renderer: impl TagRenderer + 'static,
        options: TagOptions,
    ) -> Result<Self, DefinitionError> {
        let pattern = definition::Pattern::parse(definition, options)?;
        Ok(Self::from_parts(
            pattern.name,
            pattern.argument,
            pattern.body,
            pattern.closing,
            TagRender::Custom(Arc::new(renderer)),
            options,
        ))
    }

    /// A `[name]...[/name]` tag with an optional argument, rendered by `renderer`.
    pub fn custom(
        name: &str,
        renderer: impl TagRenderer + 'static,
        options: TagOptions,
    ) -> Result<Self, DefinitionError> {
        let name = definition::check_name(name)?;
        let standalone = options.contains(TagOptions::STANDALONE);
        Ok(Self::from_parts(
            name,
            ArgumentSlot::Optional(Placeholder::text()),
            (!standalone).then(Placeholder::text),
            !standalone,
            TagRender::Custom(Arc::new(renderer)),
            options,
        ))
    }

    pub(crate) fn from_parts(
        name: impl Into<String>,
        argument: ArgumentSlot,
        body: Option<Placeholder>,
        closing: bool,
        render: TagRender,
        options: TagOptions,
    ) -> Self {
        Self {
            name: name.into(),
            argument,
            body,
            closing,
            render,
            options,
            helpline: None,
            child: None,
        }
    }

    /// Scope `child` to the content of this tag. The child is recognized only while this tag,
    /// or a child it opened, is the innermost open tag, and it closes together with this tag.
    pub(crate) fn with_child(mut self, child: TagSpec) -> Self {
        self.child = Some(Arc::new(child));
        self
    }

    pub fn child(&self) -> Option<&Arc<TagSpec>> {
        self.child.as_ref()
    }

    pub fn with_helpline(mut self, helpline: impl Into<String>) -> Self {
        self.helpline = Some(helpline.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn argument(&self) -> &ArgumentSlot {
        &self.argument
    }

    pub fn body(&self) -> Option<&Placeholder> {
        self.body.as_ref()
    }

    /// Whether the definition spells out a closing tag.
    pub fn has_closing_tag(&self) -> bool {
        self.closing
    }

    pub fn render(&self) -> &TagRender {
        &self.render
    }

    pub fn options(&self) -> TagOptions {
        self.options
    }

    pub fn helpline(&self) -> Option<&str> {
        self.helpline.as_deref()
    }

    pub fn is(&self, option: TagOptions) -> bool {
        self.options.contains(option)
    }

    /// Whether the tag can end without its own closing tag.
    pub fn closes_implicitly(&self) -> bool {
        self.options.intersects(
            TagOptions::SAME_TAG_CLOSES | TagOptions::NEWLINE_CLOSES | TagOptions::END_TAG_CLOSES,
        )
    }

    /// Whether `name` refers to this tag.
    pub fn matches(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

/// Prints the tag back as a definition string.
impl fmt::Display for TagSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}", self.name)?;
        if let Some(argument) = self.argument.placeholder() {
            write!(f, "={argument}")?;
        }
        f.write_str("]")?;
        if let Some(body) = &self.body {
            write!(f, "{body}")?;
        }
        if self.closing {
            write!(f, "[/{}]", self.name)?;
        }
        Ok(())
    }
}
