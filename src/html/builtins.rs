//! The standard tag library, installed into every [`Registry`][crate::Registry] built with
//! [`with_builtins`][crate::Registry::with_builtins].
use std::{borrow::Cow, sync::Arc};

use once_cell::sync::Lazy;
use regex::Regex;

use super::{escape, links};
use crate::tag::{
    ArgumentSlot, Placeholder, PlaceholderKind, TagOptions, TagRender, TagRenderer, TagSpec, Template,
};

/// A tag of the standard library.
pub trait StandardTag {
    /// The name the tag is registered under.
    const NAME: &'static str;

    fn spec() -> TagSpec;
}

macro_rules! simple_tag {
    ($doc:expr, $name:ident, $tag:expr, $open:expr, $close:expr, $options:expr) => {
        #[derive(Copy, Clone, Debug, Default)]
        #[doc = $doc]
        #[doc = "<br/>"]
        #[doc = "This matches the BBCode tag `"]
        #[doc = $tag]
        #[doc = "`"]
        #[doc = "# Exact output"]
        #[doc = "This tag converts exactly to"]
        #[doc = "```html"]
        #[doc = $open]
        #[doc = " contents"]
        #[doc = $close]
        #[doc = "```"]
        pub struct $name;

        impl StandardTag for $name {
            const NAME: &'static str = $tag;

            fn spec() -> TagSpec {
                TagSpec::from_parts(
                    $tag,
                    ArgumentSlot::None,
                    Some(Placeholder::text()),
                    true,
                    TagRender::Template(Template::wrap($open, $close)),
                    $options,
                )
            }
        }
    };
    ($doc:expr, $name:ident, $tag:expr, $open:expr, $close:expr) => {
        simple_tag!($doc, $name, $tag, $open, $close, TagOptions::default());
    };
}

macro_rules! argument_tag {
    ($doc:expr, $name:ident, $tag:expr, $placeholder:expr, $kind:expr, $prefix:expr, $infix:expr, $close:expr) => {
        #[derive(Copy, Clone, Debug, Default)]
        #[doc = $doc]
        #[doc = "<br/>"]
        #[doc = "This matches the BBCode tag `"]
        #[doc = $tag]
        #[doc = "`, which requires an argument."]
        #[doc = "# Exact output"]
        #[doc = "```html"]
        #[doc = $prefix]
        #[doc = " argument "]
        #[doc = $infix]
        #[doc = " contents"]
        #[doc = $close]
        #[doc = "```"]
        pub struct $name;

        impl StandardTag for $name {
            const NAME: &'static str = $tag;

            fn spec() -> TagSpec {
                TagSpec::from_parts(
                    $tag,
                    ArgumentSlot::Required(Placeholder::new($placeholder, $kind)),
                    Some(Placeholder::text()),
                    true,
                    TagRender::Template(Template::wrap_with_argument($prefix, $infix, $close)),
                    TagOptions::default(),
                )
            }
        }
    };
}

simple_tag! {
    "A bold tag with no arguments, which converts directly to HTML5 `<strong>`.",
    BoldTag, "b", "<strong>", "</strong>"
}
simple_tag! {
    "An italic tag with no arguments, which converts directly to HTML5 `<em>`.",
    ItalicTag, "i", "<em>", "</em>"
}
simple_tag! {
    "An underline tag with no arguments, which converts directly to HTML5 `<u>`.",
    UnderlineTag, "u", "<u>", "</u>"
}
simple_tag! {
    "A strikethrough tag with no arguments, which converts to `<strike>`.",
    StrikeTag, "s", "<strike>", "</strike>"
}
simple_tag! {
    "Centering tag with no arguments, which converts to a div with centered text.",
    CenterTag, "center", "<div style=\"text-align:center;\">", "</div>"
}
simple_tag! {
    "Code styling tag. Its content is shown verbatim, tags included.",
    CodeTag, "code", "<code>", "</code>",
    TagOptions::ESCAPE_HTML | TagOptions::DISPLAY_ON_EDITOR
}
simple_tag! {
    "A block quote tag with no arguments, which converts directly to HTML5 `<blockquote>`. Surrounding whitespace is stripped.",
    QuoteTag, "quote", "<blockquote>", "</blockquote>",
    TagOptions::default() | TagOptions::STRIP
}

argument_tag! {
    "Text color, given as a CSS color word, `#RGB` or `#RRGGBB`.",
    ColorTag, "color", "COLOR", PlaceholderKind::Color, "<span style=\"color:", ";\">", "</span>"
}
argument_tag! {
    "Font size in pixels.",
    SizeTag, "size", "NUMBER", PlaceholderKind::Number, "<span style=\"font-size:", "px;\">", "</span>"
}

static MARKUP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());

/// Links. `[url]target[/url]` shows the target itself, `[url=target]text[/url]` shows the text.
///
/// Bare hosts such as `google.com` get an `http://` scheme; paths and other targets are kept as
/// written. Without an argument the target is the text of the content, so `[url][b]a.com[/b][/url]`
/// links to `http://a.com`.
#[derive(Copy, Clone, Debug, Default)]
pub struct UrlTag;

impl TagRenderer for UrlTag {
    fn render(&self, body: &str, argument: Option<&str>, _: Option<&TagSpec>) -> String {
        let target = match argument {
            Some(argument) => Cow::Borrowed(argument),
            // Markup gone, and whatever could still end the attribute escaped.
            None => Cow::Owned(escape(&MARKUP_RE.replace_all(body, "")).into_owned()),
        };
        let href = links::url_href(target.trim());
        let text = if body.trim().is_empty() { &*href } else { body };
        format!("<a href=\"{href}\">{text}</a>")
    }
}

impl StandardTag for UrlTag {
    const NAME: &'static str = "url";

    fn spec() -> TagSpec {
        TagSpec::from_parts(
            Self::NAME,
            ArgumentSlot::Optional(Placeholder::text()),
            Some(Placeholder::text()),
            true,
            TagRender::Custom(Arc::new(Self)),
            TagOptions::default() - TagOptions::REPLACE_LINKS,
        )
    }
}

/// Images. The content must be a URL and is not parsed for tags.
#[derive(Copy, Clone, Debug, Default)]
pub struct ImgTag;

impl TagRenderer for ImgTag {
    fn render(&self, body: &str, _: Option<&str>, _: Option<&TagSpec>) -> String {
        format!("<img src=\"{body}\" alt=\"\" />")
    }
}

impl StandardTag for ImgTag {
    const NAME: &'static str = "img";

    fn spec() -> TagSpec {
        TagSpec::from_parts(
            Self::NAME,
            ArgumentSlot::None,
            Some(Placeholder::new("URL", PlaceholderKind::Url)),
            true,
            TagRender::Custom(Arc::new(Self)),
            TagOptions::ESCAPE_HTML | TagOptions::STRIP | TagOptions::DISPLAY_ON_EDITOR,
        )
    }
}

/// Lists. Items are introduced by `[*]`, which is only a tag directly inside a list; `[list=1]`,
/// `[list=01]`, `[list=a]`, `[list=A]`, `[list=i]` and `[list=I]` produce ordered lists.
#[derive(Copy, Clone, Debug, Default)]
pub struct ListTag;

impl ListTag {
    const STYLES: [(&'static str, &'static str); 6] = [
        ("1", "decimal"),
        ("01", "decimal-leading-zero"),
        ("a", "lower-alpha"),
        ("A", "upper-alpha"),
        ("i", "lower-roman"),
        ("I", "upper-roman"),
    ];

    /// `[*]`: closed by the next item or by the end of its list.
    fn item() -> TagSpec {
        TagSpec::from_parts(
            "*",
            ArgumentSlot::None,
            Some(Placeholder::text()),
            false,
            TagRender::Template(Template::wrap("<li>", "</li>")),
            TagOptions::default() | TagOptions::SAME_TAG_CLOSES | TagOptions::STRIP,
        )
    }
}

impl TagRenderer for ListTag {
    fn render(&self, body: &str, argument: Option<&str>, _: Option<&TagSpec>) -> String {
        let style = argument.and_then(|arg| Self::STYLES.iter().find(|(key, _)| *key == arg));

        match style {
            Some((_, style)) => format!("<ol style=\"list-style-type:{style};\">{body}</ol>"),
            None => format!("<ul>{body}</ul>"),
        }
    }
}

impl StandardTag for ListTag {
    const NAME: &'static str = "list";

    fn spec() -> TagSpec {
        let styles = Self::STYLES.iter().map(|(key, _)| (*key).to_owned()).collect();
        TagSpec::from_parts(
            Self::NAME,
            ArgumentSlot::Optional(Placeholder::new("CHOICE", PlaceholderKind::Choice(styles))),
            Some(Placeholder::text()),
            true,
            TagRender::Custom(Arc::new(Self)),
            (TagOptions::default() - TagOptions::TRANSFORM_NEWLINES) | TagOptions::STRIP,
        )
        .with_child(Self::item())
    }
}

macro_rules! tag_list {
    ($($tag:ident),*) => {
        vec![
            $(
                $tag::spec(),
            )*
        ]
    };
}

/// Every tag of the standard library.
/// # Included tags
/// - [BoldTag]
/// - [ItalicTag]
/// - [UnderlineTag]
/// - [StrikeTag]
/// - [CenterTag]
/// - [ColorTag]
/// - [SizeTag]
/// - [CodeTag]
/// - [QuoteTag]
/// - [ListTag]
/// - [UrlTag]
/// - [ImgTag]
pub fn standard_tags() -> Vec<TagSpec> {
    tag_list! {
        BoldTag,
        ItalicTag,
        UnderlineTag,
        StrikeTag,
        CenterTag,
        ColorTag,
        SizeTag,
        CodeTag,
        QuoteTag,
        ListTag,
        UrlTag,
        ImgTag
    }
}
