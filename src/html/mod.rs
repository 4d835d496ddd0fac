//! HTML serialization of a parsed BBCode document.
//!
//! Text is escaped, auto-linked, smiley-replaced and line-break-transformed according to the
//! enclosing tag's options, each AND-ed with the renderer's global [`RenderFeature`] switches.
use std::{borrow::Cow, fmt, sync::Arc};

use html_escape::encode_double_quoted_attribute;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    config::{RenderConfig, RenderFeature},
    parser::tree::{self, Document, Node, TagNode},
    registry::{Smiley, TagSet},
    tag::{TagOptions, TagRender, TagSpec},
};

pub mod builtins;
mod links;

/// A character reference that is already escaped: `&lt;`, `&#39;`, `&#x1F600;`.
static CHARACTER_REFERENCE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(?:[A-Za-z][A-Za-z0-9]{1,31}|#[0-9]{1,7}|#[xX][0-9A-Fa-f]{1,6});").unwrap()
});

/// Escapes `&`, `<`, `>` and `"`. An `&` that starts a character reference is left alone, so
/// text that is already escaped comes out unchanged.
pub(crate) fn escape(text: &str) -> Cow<'_, str> {
    let mut references = CHARACTER_REFERENCE_RE.find_iter(text).peekable();
    if references.peek().is_none() {
        return encode_double_quoted_attribute(text);
    }

    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for reference in references {
        out.push_str(&encode_double_quoted_attribute(&text[last..reference.start()]));
        out.push_str(reference.as_str());
        last = reference.end();
    }
    out.push_str(&encode_double_quoted_attribute(&text[last..]));
    Cow::Owned(out)
}

/// Renders BBCode to HTML against a fixed snapshot of registered tags.
///
/// Rendering is total: malformed or unknown markup is echoed back (escaped) instead of failing.
#[derive(Clone)]
pub struct HtmlRenderer {
    tags: Arc<TagSet>,
    config: RenderConfig,
}

impl fmt::Debug for HtmlRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HtmlRenderer")
            .field("tags", &self.tags.len())
            .field("config", &self.config)
            .finish()
    }
}

impl HtmlRenderer {
    pub fn new(tags: Arc<TagSet>) -> Self {
        Self::with_config(tags, RenderConfig::default())
    }

    pub fn with_config(tags: Arc<TagSet>, config: RenderConfig) -> Self {
        log::debug!(
            "building renderer over {} tags and {} smilies, features {:?}",
            tags.len(),
            tags.smilies().len(),
            config.feature_flags
        );
        Self { tags, config }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn tags(&self) -> &TagSet {
        &self.tags
    }

    /// Render `input` to HTML.
    pub fn render(&self, input: &str) -> String {
        let document = tree::build(input, &self.tags);
        let mut out = String::with_capacity(input.len());
        let context = TextContext::root(self.config.feature_flags);
        self.write_nodes(&document, &document.nodes, context, None, &mut out);
        out
    }

    fn write_nodes(
        &self,
        document: &Document<'_>,
        nodes: &[Node<'_>],
        context: TextContext,
        parent: Option<&TagSpec>,
        out: &mut String,
    ) {
        for node in nodes {
            match node {
                Node::Text(range) => self.write_text(document.slice(range), context, out),
                Node::Newline(_) if context.newlines => out.push_str(&self.config.newline),
                Node::Newline(range) => out.push_str(document.slice(range)),
                Node::Tag(tag) => self.write_tag(document, tag, context, parent, out),
            }
        }
    }

    fn write_tag(
        &self,
        document: &Document<'_>,
        node: &TagNode<'_>,
        context: TextContext,
        parent: Option<&TagSpec>,
        out: &mut String,
    ) {
        let spec = &*node.spec;
        let inner = context.enter(spec, self.config.feature_flags);

        let mut body = String::new();
        self.write_nodes(document, &node.children, inner, Some(spec), &mut body);

        if let Some(placeholder) = spec.body() {
            if !placeholder.accepts(&body) {
                log::trace!(target: "bbrender::html", "[{}] rejects its content {body:?}", spec.name());
                self.write_literal(document.slice(&node.open), context, out);
                out.push_str(&body);
                if let Some(close) = &node.close {
                    self.write_literal(document.slice(close), context, out);
                }
                return;
            }
        }

        let argument = node
            .argument
            .map(|arg| if inner.escape { escape(arg) } else { Cow::Borrowed(arg) });

        match spec.render() {
            TagRender::Template(template) => {
                template.render(argument.as_deref().unwrap_or_default(), &body, out)
            }
            TagRender::Custom(renderer) => {
                out.push_str(&renderer.render(&body, argument.as_deref(), parent))
            }
        }
    }

    fn write_literal(&self, text: &str, context: TextContext, out: &mut String) {
        if context.escape {
            out.push_str(&escape(text));
        } else {
            out.push_str(text);
        }
    }

    /// Free text: links first, then smilies, escaping whatever is left.
    fn write_text(&self, text: &str, context: TextContext, out: &mut String) {
        if !context.links {
            return self.write_smilies(text, context, out);
        }

        let mut last = 0;
        for link in links::find_links(text) {
            self.write_smilies(&text[last..link.range.start], context, out);
            out.push_str("<a href=\"");
            out.push_str(&escape(&link.href));
            out.push_str("\">");
            self.write_literal(&text[link.range.clone()], context, out);
            out.push_str("</a>");
            last = link.range.end;
        }
        self.write_smilies(&text[last..], context, out);
    }

    fn write_smilies(&self, text: &str, context: TextContext, out: &mut String) {
        let smilies = self.tags.smilies();
        if !context.smilies || smilies.is_empty() {
            return self.write_literal(text, context, out);
        }

        let mut last = 0;
        let mut at = 0;
        while at < text.len() {
            match smiley_at(smilies, text, at) {
                Some(smiley) => {
                    self.write_literal(&text[last..at], context, out);
                    out.push_str(&smiley.html);
                    at += smiley.code.len();
                    last = at;
                }
                None => {
                    at += text[at..].chars().next().map_or(1, char::len_utf8);
                }
            }
        }
        self.write_literal(&text[last..], context, out);
    }
}

/// The longest smiley whose code starts at `at` and stands on its own, i.e. is surrounded by
/// whitespace or the ends of the text.
fn smiley_at<'s>(smilies: &'s [Smiley], text: &str, at: usize) -> Option<&'s Smiley> {
    let standalone_before = text[..at].chars().next_back().map_or(true, char::is_whitespace);
    if !standalone_before {
        return None;
    }

    smilies
        .iter()
        .filter(|s| text[at..].starts_with(s.code.as_str()))
        .filter(|s| {
            text[at + s.code.len()..]
                .chars()
                .next()
                .map_or(true, char::is_whitespace)
        })
        .max_by_key(|s| s.code.len())
}

/// How free text is written at some depth of the tree.
#[derive(Debug, Clone, Copy)]
struct TextContext {
    escape: bool,
    links: bool,
    smilies: bool,
    newlines: bool,
}

impl TextContext {
    fn root(features: RenderFeature) -> Self {
        Self {
            escape: features.contains(RenderFeature::ESCAPE_HTML),
            links: features.contains(RenderFeature::REPLACE_LINKS),
            smilies: features.contains(RenderFeature::SMILIES),
            newlines: features.contains(RenderFeature::TRANSFORM_NEWLINES),
        }
    }

    /// The context for the content of `spec`. Escaping and line breaks follow the tag itself,
    /// links and smilies need every enclosing tag to allow them.
    fn enter(self, spec: &TagSpec, features: RenderFeature) -> Self {
        let free_text = spec.body().map_or(true, |p| p.kind().is_free_text());
        Self {
            escape: features.contains(RenderFeature::ESCAPE_HTML) && spec.is(TagOptions::ESCAPE_HTML),
            links: self.links && free_text && spec.is(TagOptions::REPLACE_LINKS),
            smilies: self.smilies && free_text && spec.is(TagOptions::RENDER_EMBEDDED),
            newlines: features.contains(RenderFeature::TRANSFORM_NEWLINES)
                && spec.is(TagOptions::TRANSFORM_NEWLINES),
        }
    }
}

#[cfg(test)]
mod tests;
