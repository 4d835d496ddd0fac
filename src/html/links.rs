//! Bare URL detection for free text, and `href` normalization.
use std::{borrow::Cow, ops::Range};

use once_cell::sync::Lazy;
use regex::Regex;

static LINK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)\b(?:(?:https?|ftp)://[^\s<>"'\[\]]+|www\.[^\s<>"'\[\]]+|[a-z0-9](?:[a-z0-9\-]*[a-z0-9])?(?:\.[a-z0-9](?:[a-z0-9\-]*[a-z0-9])?)*\.[a-z]{2,6}\b(?:[/?#][^\s<>"'\[\]]*)?)"#,
    )
    .unwrap()
});

/// A bare host with an optional port and path, e.g. `google.com` or `foo.com:8080/bar`.
static BARE_HOST_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^[a-z0-9](?:[a-z0-9\-]*[a-z0-9])?(?:\.[a-z0-9](?:[a-z0-9\-]*[a-z0-9])?)*\.[a-z]{2,6}(?::[0-9]+)?(?:[/?#].*)?$",
    )
    .unwrap()
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Link {
    /// Where the link text sits in the scanned string.
    pub range: Range<usize>,
    pub href: String,
}

/// Every bare URL in `text`, in order.
pub(crate) fn find_links(text: &str) -> impl Iterator<Item = Link> + '_ {
    LINK_RE.find_iter(text).filter_map(move |m| {
        let before = text[..m.start()].chars().next_back();
        if before.map_or(false, |c| {
            c.is_alphanumeric() || matches!(c, '@' | '.' | '-' | '_' | '/' | ':')
        }) {
            return None;
        }

        let candidate = trim_trailing(m.as_str());
        if text[m.start() + candidate.len()..].starts_with('@') {
            return None;
        }

        let schemed = candidate.contains("://");
        let host = candidate.split_once("://").map_or(candidate, |(_, rest)| rest);
        if host.is_empty() || (!schemed && !host.trim_start_matches("www.").contains('.')) {
            return None;
        }

        Some(Link {
            range: m.start()..m.start() + candidate.len(),
            href: with_scheme(candidate).into_owned(),
        })
    })
}

/// Strips punctuation that ends a sentence rather than the URL.
fn trim_trailing(candidate: &str) -> &str {
    let mut end = candidate.len();
    loop {
        let current = &candidate[..end];
        match current.chars().next_back() {
            Some('.' | ',' | ';' | ':' | '!' | '?' | '\'' | '"' | ']' | '}') => end -= 1,
            Some(')') if current.matches(')').count() > current.matches('(').count() => end -= 1,
            _ => return current,
        }
    }
}

fn has_scheme(target: &str) -> bool {
    target.contains("://")
        || target
            .get(..7)
            .map_or(false, |prefix| prefix.eq_ignore_ascii_case("mailto:"))
}

/// `http://` prepended unless `target` already names a scheme.
pub(crate) fn with_scheme(target: &str) -> Cow<'_, str> {
    if has_scheme(target) {
        Cow::Borrowed(target)
    } else {
        Cow::Owned(format!("http://{target}"))
    }
}

/// The `href` for a `[url]` target: bare hosts get `http://`, paths and anything else stay as
/// they are.
pub(crate) fn url_href(target: &str) -> Cow<'_, str> {
    if target.starts_with(['/', '.', '#', '?']) || has_scheme(target) || !BARE_HOST_RE.is_match(target)
    {
        Cow::Borrowed(target)
    } else {
        Cow::Owned(format!("http://{target}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hrefs(text: &str) -> Vec<String> {
        find_links(text).map(|l| l.href).collect()
    }

    fn spans(text: &str) -> Vec<&str> {
        find_links(text).map(|l| &text[l.range]).collect()
    }

    #[test]
    pub fn finds_all_forms() {
        assert_eq!(
            hrefs("www.google.com foo.com/bar http://xyz.ci"),
            ["http://www.google.com", "http://foo.com/bar", "http://xyz.ci"]
        );
        assert_eq!(hrefs("ftp://files.example.org/pub"), ["ftp://files.example.org/pub"]);
    }

    #[test]
    pub fn trims_sentence_punctuation() {
        assert_eq!(spans("see http://foo.com/bar."), ["http://foo.com/bar"]);
        assert_eq!(spans("(see foo.com)"), ["foo.com"]);
        assert_eq!(
            spans("http://en.wikipedia.org/wiki/Rust_(programming_language)!"),
            ["http://en.wikipedia.org/wiki/Rust_(programming_language)"]
        );
        assert_eq!(spans("is it google.com?"), ["google.com"]);
    }

    #[test]
    pub fn skips_email_addresses() {
        assert!(hrefs("mail xyz@xyz.com now").is_empty());
        assert!(hrefs("first.last@example.com").is_empty());
    }

    #[test]
    pub fn skips_plain_words() {
        assert!(hrefs("hello world! version 2.0.1").is_empty());
        assert!(hrefs("http:// www.").is_empty());
    }

    #[test]
    pub fn url_targets() {
        assert_eq!(url_href("google.com"), "http://google.com");
        assert_eq!(url_href("http://google.com"), "http://google.com");
        assert_eq!(url_href("relative/foo/bar.html"), "relative/foo/bar.html");
        assert_eq!(url_href("/absolute/foo/bar.html"), "/absolute/foo/bar.html");
        assert_eq!(url_href("./hello.html"), "./hello.html");
        assert_eq!(url_href("mailto:a@b.com"), "mailto:a@b.com");
        assert_eq!(
            url_href("&lt;script&gt;alert(1);&lt;/script&gt;"),
            "&lt;script&gt;alert(1);&lt;/script&gt;"
        );
    }
}
