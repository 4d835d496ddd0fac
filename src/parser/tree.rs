//! Tree construction on top of the token stream.
//!
//! Opening tags that never get closed are demoted to literal text and the whole build is retried,
//! so a stray `[b]` can never swallow the rest of a post. A failed attempt demotes every open tag
//! of the innermost one's name at once, which keeps the number of retries bounded by the number
//! of distinct tag names rather than the number of tags.
use std::{collections::HashSet, ops::Range, sync::Arc};

use crate::{
    parser::{BBParser, Token, TokenKind},
    registry::TagSet,
    tag::{TagOptions, TagSpec},
};

const TARGET: &str = "bbrender::parser::tree";

#[derive(Debug)]
pub(crate) enum Node<'a> {
    /// Literal input, including tags that were demoted to text.
    Text(Range<usize>),
    Newline(Range<usize>),
    Tag(TagNode<'a>),
}

#[derive(Debug)]
pub(crate) struct TagNode<'a> {
    pub spec: Arc<TagSpec>,
    /// Never empty; `[tag=]` carries no argument.
    pub argument: Option<&'a str>,
    pub children: Vec<Node<'a>>,
    /// Span of the opening tag.
    pub open: Range<usize>,
    /// Span of the closing tag. `None` for standalone and implicitly closed tags.
    pub close: Option<Range<usize>>,
}

#[derive(Debug)]
pub(crate) struct Document<'a> {
    pub input: &'a str,
    pub nodes: Vec<Node<'a>>,
}

impl<'a> Document<'a> {
    pub fn slice(&self, range: &Range<usize>) -> &'a str {
        &self.input[range.clone()]
    }
}

/// Parse `input` against the tags in `tags`. Never fails.
pub(crate) fn build<'a>(input: &'a str, tags: &TagSet) -> Document<'a> {
    let tokens: Vec<Token<'a>> = BBParser::new(input).collect();
    let resolved: Vec<Option<Arc<TagSpec>>> = tokens.iter().map(|t| resolve(t, tags)).collect();
    let mut literal = never_closed(&tokens, &resolved);

    let builder = TreeBuilder {
        input,
        tokens: &tokens,
        resolved: &resolved,
        tags,
    };

    loop {
        match builder.attempt(&literal) {
            Ok(nodes) => return Document { input, nodes },
            Err(unclosed) => {
                // Every failed attempt demotes at least one token that was still live.
                for idx in unclosed {
                    log::trace!(target: TARGET, "backtracking, {:?} is never closed", tokens[idx].span);
                    literal[idx] = true;
                }
            }
        }
    }
}

/// The tag an opening token refers to, if the tag exists and accepts the given argument.
fn resolve(token: &Token<'_>, tags: &TagSet) -> Option<Arc<TagSpec>> {
    let TokenKind::OpenTag(tag) = &token.kind else {
        return None;
    };

    let spec = tags.get(tag.name)?;
    if spec.argument().accepts(tag.arg) {
        Some(spec.clone())
    } else {
        log::trace!(target: TARGET, "[{}] rejects argument {:?}", spec.name(), tag.arg);
        None
    }
}

fn needs_closing_tag(spec: &TagSpec) -> bool {
    spec.has_closing_tag() && !spec.is(TagOptions::STANDALONE) && !spec.closes_implicitly()
}

/// Marks opening tags without any closing tag of their name further down the input.
fn never_closed(tokens: &[Token<'_>], resolved: &[Option<Arc<TagSpec>>]) -> Vec<bool> {
    let mut literal = vec![false; tokens.len()];
    let mut closed_later = HashSet::new();

    for (idx, token) in tokens.iter().enumerate().rev() {
        match (&token.kind, &resolved[idx]) {
            (TokenKind::CloseTag(tag), _) => {
                closed_later.insert(tag.name.to_ascii_lowercase());
            }
            (TokenKind::OpenTag(_), Some(spec))
                if needs_closing_tag(spec) && !closed_later.contains(spec.name()) =>
            {
                log::trace!(target: TARGET, "{:?} has no closing tag", token.span);
                literal[idx] = true;
            }
            _ => {}
        }
    }

    literal
}

struct Frame<'a> {
    token: usize,
    node: TagNode<'a>,
    /// Opened as the scoped child of the frame below.
    scoped: bool,
}

#[derive(Default)]
struct Tree<'a> {
    root: Vec<Node<'a>>,
    stack: Vec<Frame<'a>>,
}

impl<'a> Tree<'a> {
    fn top(&self) -> Option<&Arc<TagSpec>> {
        self.stack.last().map(|f| &f.node.spec)
    }

    /// The scoped child named `name` that may open here, if any.
    fn scoped_child(&self, name: &str) -> Option<Arc<TagSpec>> {
        let mut frames = self.stack.iter().rev();
        let mut owner = frames.next()?;
        if owner.scoped {
            owner = frames.next()?;
        }
        owner.node.spec.child().filter(|child| child.matches(name)).cloned()
    }

    /// Whether the innermost tag is a scoped child whose owner is named `name`.
    fn owner_is(&self, name: &str) -> bool {
        match self.stack.as_slice() {
            [.., owner, top] => top.scoped && owner.node.spec.matches(name),
            _ => false,
        }
    }

    /// Inside a tag that does not parse its content.
    fn verbatim(&self) -> bool {
        self.top()
            .map_or(false, |spec| !spec.is(TagOptions::RENDER_EMBEDDED))
    }

    fn push(&mut self, node: Node<'a>) {
        let siblings = match self.stack.last_mut() {
            Some(frame) => &mut frame.node.children,
            None => &mut self.root,
        };

        if let (Node::Text(next), Some(Node::Text(prev))) = (&node, siblings.last_mut()) {
            if prev.end == next.start {
                prev.end = next.end;
                return;
            }
        }

        siblings.push(node);
    }

    fn close(&mut self, input: &str, close: Option<Range<usize>>) {
        if let Some(Frame { mut node, .. }) = self.stack.pop() {
            node.close = close;
            if node.spec.is(TagOptions::STRIP) {
                strip(input, &mut node.children);
            }
            self.push(Node::Tag(node));
        }
    }
}

struct TreeBuilder<'t, 'a> {
    input: &'a str,
    tokens: &'t [Token<'a>],
    resolved: &'t [Option<Arc<TagSpec>>],
    tags: &'t TagSet,
}

impl<'t, 'a> TreeBuilder<'t, 'a> {
    /// One pass over the tokens. Fails with the opening tags to demote: the innermost tag left
    /// open at the end of input, and every other open tag of that name that needs a closing tag.
    fn attempt(&self, literal: &[bool]) -> Result<Vec<Node<'a>>, Vec<usize>> {
        let mut tree = Tree::default();
        let mut swallow = false;

        for (idx, token) in self.tokens.iter().enumerate() {
            if std::mem::take(&mut swallow) && token.is_newline() {
                continue;
            }

            match &token.kind {
                TokenKind::Text => tree.push(Node::Text(token.range())),
                TokenKind::Newline => {
                    while tree.top().map_or(false, |s| s.is(TagOptions::NEWLINE_CLOSES)) {
                        tree.close(self.input, None);
                    }
                    tree.push(Node::Newline(token.range()));
                }
                TokenKind::OpenTag(tag) => {
                    if literal[idx] || tree.verbatim() {
                        tree.push(Node::Text(token.range()));
                        continue;
                    }

                    let scoped = tree
                        .scoped_child(tag.name)
                        .filter(|child| child.argument().accepts(tag.arg));
                    let is_scoped = scoped.is_some();
                    let Some(spec) = scoped.or_else(|| self.resolved[idx].clone()) else {
                        tree.push(Node::Text(token.range()));
                        continue;
                    };

                    if tree
                        .top()
                        .map_or(false, |top| top.is(TagOptions::SAME_TAG_CLOSES) && top.matches(spec.name()))
                    {
                        tree.close(self.input, None);
                    }

                    let node = TagNode {
                        argument: token.args().filter(|a| !a.is_empty()),
                        children: Vec::new(),
                        open: token.range(),
                        close: None,
                        spec,
                    };

                    if node.spec.is(TagOptions::STANDALONE) {
                        swallow = node.spec.is(TagOptions::SWALLOW_TRAILING_NEWLINE);
                        tree.push(Node::Tag(node));
                    } else {
                        tree.stack.push(Frame {
                            token: idx,
                            node,
                            scoped: is_scoped,
                        });
                    }
                }
                TokenKind::CloseTag(tag) => loop {
                    let Some(top) = tree.top().cloned() else {
                        tree.push(Node::Text(token.range()));
                        break;
                    };

                    if top.matches(tag.name) {
                        swallow = top.is(TagOptions::SWALLOW_TRAILING_NEWLINE);
                        tree.close(self.input, Some(token.range()));
                        break;
                    }

                    if tree.owner_is(tag.name) {
                        tree.close(self.input, None);
                        continue;
                    }

                    // Re-examine the closing tag against the next tag down.
                    if top.is(TagOptions::RENDER_EMBEDDED)
                        && top.is(TagOptions::END_TAG_CLOSES)
                        && self.tags.get(tag.name).is_some()
                    {
                        tree.close(self.input, None);
                        continue;
                    }

                    tree.push(Node::Text(token.range()));
                    break;
                },
            }
        }

        while let Some(frame) = tree.stack.last() {
            let spec = &frame.node.spec;
            if spec.is(TagOptions::NEWLINE_CLOSES) || !spec.has_closing_tag() {
                tree.close(self.input, None);
                continue;
            }

            // Demoting the innermost tag cannot give a same-named tag further out a closing tag
            // it did not already see, so those go too.
            let unclosed = tree
                .stack
                .iter()
                .filter(|f| {
                    f.token == frame.token
                        || (f.node.spec.matches(spec.name()) && needs_closing_tag(&f.node.spec))
                })
                .map(|f| f.token)
                .collect();
            return Err(unclosed);
        }

        Ok(tree.root)
    }
}

/// Drops surrounding whitespace and line breaks from a tag's content.
fn strip(input: &str, children: &mut Vec<Node<'_>>) {
    while let Some(first) = children.first_mut() {
        match first {
            Node::Newline(_) => {
                children.remove(0);
            }
            Node::Text(range) => {
                let kept = input[range.clone()].trim_start().len();
                range.start = range.end - kept;
                if !range.is_empty() {
                    break;
                }
                children.remove(0);
            }
            Node::Tag(_) => break,
        }
    }

    while let Some(last) = children.last_mut() {
        match last {
            Node::Newline(_) => {
                children.pop();
            }
            Node::Text(range) => {
                let kept = input[range.clone()].trim_end().len();
                range.end = range.start + kept;
                if !range.is_empty() {
                    break;
                }
                children.pop();
            }
            Node::Tag(_) => break,
        }
    }
}
