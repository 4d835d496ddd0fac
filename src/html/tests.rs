use html_escape::encode_double_quoted_attribute;
use proptest::prelude::*;

use crate::{
    html::builtins::{standard_tags, BoldTag, StandardTag},
    render, DefinitionError, Registry, RenderConfig, RenderFeature, TagOptions, TagSpec,
};

fn with(extra: TagOptions) -> TagOptions {
    TagOptions::default() | extra
}

fn without(removed: TagOptions) -> TagOptions {
    TagOptions::default() - removed
}

fn check(renderer: &super::HtmlRenderer, cases: &[(&str, &str)]) {
    for (input, expected) in cases {
        assert_eq!(&renderer.render(input), expected, "rendering {input:?}");
    }
}

const DEFAULT_TAGS: &[(&str, &str)] = &[
    ("[b]hello world![/b]", "<strong>hello world!</strong>"),
    ("[b]hello [i]world![/i][/b]", "<strong>hello <em>world!</em></strong>"),
    ("[b]hello [ world![/b]", "<strong>hello [ world!</strong>"),
    ("[b]]he[llo [ w]orld![/b]", "<strong>]he[llo [ w]orld!</strong>"),
    ("[ b ]hello [u]world![/u][ /b ]", "<strong>hello <u>world!</u></strong>"),
    ("[b]hello [] world![/b]", "<strong>hello [] world!</strong>"),
    ("[s]gone[/s] [center]middle[/center]", "<strike>gone</strike> <div style=\"text-align:center;\">middle</div>"),
    ("[list]\n[*]one\n[*]two\n[/list]", "<ul><li>one</li><li>two</li></ul>"),
    (
        "[list=1]\n[*]item 1\n[*]item 2\n[/list]",
        "<ol style=\"list-style-type:decimal;\"><li>item 1</li><li>item 2</li></ol>",
    ),
    (
        "[list] [*]Item 1 [*]Item 2 [*]Item 3   [/list]",
        "<ul><li>Item 1</li><li>Item 2</li><li>Item 3</li></ul>",
    ),
    (
        "[list=01][*]a[/list][list=I][*]b[/list]",
        "<ol style=\"list-style-type:decimal-leading-zero;\"><li>a</li></ol><ol style=\"list-style-type:upper-roman;\"><li>b</li></ol>",
    ),
    ("[list=7][*]a[/list]", "[list=7][*]a[/list]"),
    (">> some special chars >< <>", "&gt;&gt; some special chars &gt;&lt; &lt;&gt;"),
    ("\"quoted text\"", "&quot;quoted text&quot;"),
    (">> some other special chars", "&gt;&gt; some other special chars"),
    (
        "[url]http://foo.com/bar.php?some--data[/url]",
        "<a href=\"http://foo.com/bar.php?some--data\">http://foo.com/bar.php?some--data</a>",
    ),
    (
        "[url]http://www.google.com[/url]",
        "<a href=\"http://www.google.com\">http://www.google.com</a>",
    ),
    ("[url=google.com]goto google[/url]", "<a href=\"http://google.com\">goto google</a>"),
    ("[url=http://google.com][/url]", "<a href=\"http://google.com\">http://google.com</a>"),
    ("[URL=google.com]goto google[/URL]", "<a href=\"http://google.com\">goto google</a>"),
    (
        "[url=<script>alert(1);</script>]xss[/url]",
        "<a href=\"&lt;script&gt;alert(1);&lt;/script&gt;\">xss</a>",
    ),
    (
        "www.google.com foo.com/bar http://xyz.ci",
        "<a href=\"http://www.google.com\">www.google.com</a> <a href=\"http://foo.com/bar\">foo.com/bar</a> <a href=\"http://xyz.ci\">http://xyz.ci</a>",
    ),
    ("[url=relative/foo/bar.html]link[/url]", "<a href=\"relative/foo/bar.html\">link</a>"),
    ("[url=/absolute/foo/bar.html]link[/url]", "<a href=\"/absolute/foo/bar.html\">link</a>"),
    ("[url=./hello.html]world![/url]", "<a href=\"./hello.html\">world!</a>"),
    (
        "[img]http://www.foo.com/bar/img.png[/img]",
        "<img src=\"http://www.foo.com/bar/img.png\" alt=\"\" />",
    ),
    ("[img]javascript alert(1)[/img]", "[img]javascript alert(1)[/img]"),
    ("[quote] \r\nhello\nworld! [/quote]", "<blockquote>hello<br />world!</blockquote>"),
    ("[code][b]hello world![/b][/code]", "<code>[b]hello world![/b]</code>"),
    ("[code]a\nwww.google.com[/code]", "<code>a\nwww.google.com</code>"),
    (
        "[color=green]goto [url=google.com]google website[/url][/color]",
        "<span style=\"color:green;\">goto <a href=\"http://google.com\">google website</a></span>",
    ),
    ("[color=#FFFFFF]white[/color]", "<span style=\"color:#FFFFFF;\">white</span>"),
    (
        "[color=<script></script>]xss[/color]",
        "[color=&lt;script&gt;&lt;/script&gt;]xss[/color]",
    ),
    ("[COLOR=blue]hello world![/color]", "<span style=\"color:blue;\">hello world!</span>"),
    ("[size=24]big[/size]", "<span style=\"font-size:24px;\">big</span>"),
    // Syntax errors
    ("[b]z sdf s s", "[b]z sdf s s"),
    ("[b][i]hello world![/b][/i]", "[b]<em>hello world![/b]</em>"),
    ("[b]hello [i]world![/i]", "[b]hello <em>world!</em>"),
    ("[color]test[/color]", "[color]test[/color]"),
    ("[/abcdef][/i]", "[/abcdef][/i]"),
    ("[b\n hello [i]the[/i] world![/b]", "[b<br /> hello <em>the</em> world![/b]"),
    ("[b]hello [i]the[/b] world![/i]", "[b]hello <em>the[/b] world!</em>"),
    ("[b][b][b]x[/b]", "[b][b]<strong>x</strong>"),
    // Semantic errors
    ("[color=some words]test[/color]", "[color=some words]test[/color]"),
    ("[size=]hello world![/size]", "[size=]hello world![/size]"),
    ("[size=hello]hello world![/size]", "[size=hello]hello world![/size]"),
    ("[b=bold]x[/b]", "[b=bold]x[/b]"),
    // Unknown tags
    ("[unknown][hello][/unknown]", "[unknown][hello][/unknown]"),
];

#[test]
pub fn default_tags() {
    check(&Registry::with_builtins().renderer(), DEFAULT_TAGS);
}

#[test]
pub fn crate_level_render() {
    assert_eq!(render("[b]Foo<b>bar[/b] baz."), "<strong>Foo&lt;b&gt;bar</strong> baz.");
}

#[test]
pub fn escapes_exactly_once() {
    assert_eq!(render("&lt;b&gt; &amp; &quot;"), "&lt;b&gt; &amp; &quot;");
    assert_eq!(render("&#39; &#x1F600; &nbsp;"), "&#39; &#x1F600; &nbsp;");
    assert_eq!(render("fish & chips, AT&T; a&b"), "fish &amp; chips, AT&amp;T; a&amp;b");
    assert_eq!(render("&lt <&gt;>"), "&amp;lt &lt;&gt;&gt;");
    assert_eq!(render("[b]&lt;i&gt;[/b]"), "<strong>&lt;i&gt;</strong>");
    assert_eq!(render("it's"), "it's");

    let once = render("<a href=\"x\">&</a>");
    assert_eq!(render(&once), once);
}

#[test]
pub fn url_targets_are_plain_text() {
    check(
        &Registry::with_builtins().renderer(),
        &[
            (
                "[url][b]google.com[/b][/url]",
                "<a href=\"http://google.com\"><strong>google.com</strong></a>",
            ),
            (
                "[url][color=red]x[/color][/url]",
                "<a href=\"x\"><span style=\"color:red;\">x</span></a>",
            ),
            (
                "[url]http://a.com/?q=\"x\"[/url]",
                "<a href=\"http://a.com/?q=&quot;x&quot;\">http://a.com/?q=&quot;x&quot;</a>",
            ),
            (
                "[url=a.com][b]bold[/b] link[/url]",
                "<a href=\"http://a.com\"><strong>bold</strong> link</a>",
            ),
        ],
    );
}

#[test]
pub fn list_items_belong_to_their_list() {
    check(
        &Registry::with_builtins().renderer(),
        &[
            ("[list][*]a [b]x[*]y[/b][/list]", "<ul><li>a <strong>x[*]y</strong></li></ul>"),
            ("[*]not in a list", "[*]not in a list"),
            (
                "[list][*]a[list=a][*]b[*]c[/list][*]d[/list]",
                "<ul><li>a<ol style=\"list-style-type:lower-alpha;\"><li>b</li><li>c</li></ol></li><li>d</li></ul>",
            ),
            ("[list][*]one\ntwo[/list]", "<ul><li>one<br />two</li></ul>"),
            ("[list][*=x]a[/list]", "<ul>[*=x]a</ul>"),
        ],
    );
}

#[test]
pub fn many_unclosed_tags() {
    let input = format!("{}x[/b]", "[b]".repeat(5000));
    let expected = format!("{}<strong>x</strong>", "[b]".repeat(4999));
    assert_eq!(render(&input), expected);

    let input = format!("{}x[/i][/b]", "[b][i]".repeat(2000));
    let expected = format!("{}<strong><em>x</em></strong>", "[b][i]".repeat(1999));
    assert_eq!(render(&input), expected);
}

#[test]
pub fn auto_links() {
    check(
        &Registry::with_builtins().renderer(),
        &[
            (
                "[b]see www.google.com.[/b]",
                "<strong>see <a href=\"http://www.google.com\">www.google.com</a>.</strong>",
            ),
            ("mail me at xyz@xyz.com", "mail me at xyz@xyz.com"),
            (
                "go to http://a.com/?x=\"1\"&y=2",
                "go to <a href=\"http://a.com/?x=\">http://a.com/?x=</a>&quot;1&quot;&amp;y=2",
            ),
            (
                "(http://a.com/x&y)",
                "(<a href=\"http://a.com/x&amp;y\">http://a.com/x&amp;y</a>)",
            ),
        ],
    );
}

const SPOILER: &str = r#"<div class="spoiler"><input type="button" value="Show" onclick="if (this.nextSibling.style.display != '') { this.nextSibling.style.display = ''; } else { this.nextSibling.style.display = 'none'; }" /><div style="display: none;">{TEXT}</div></div>"#;

const YOUTUBE: &str = r#"<object width="425" height="350"><param name="movie" value="http://www.youtube.com/v/{TEXT}"></param><embed src="http://www.youtube.com/v/{TEXT}" type="application/x-shockwave-flash" width="425" height="350"></embed></object>"#;

const H1: &str = r#"<span style="border-left:6px {COLOR} solid;border-bottom:1px {COLOR} dotted;font-size:150%;color:{COLOR};">{TEXT}</span><br />"#;

fn custom_registry() -> Registry {
    let mut registry = Registry::with_builtins();
    let tags = [
        ("justify", "[justify]{TEXT}[/justify]", "<div style=\"text-align:justify;\">{TEXT}</div>", TagOptions::default()),
        ("spoiler", "[spoiler]{TEXT}[/spoiler]", SPOILER, TagOptions::default()),
        ("youtube", "[youtube]{TEXT}[/youtube]", YOUTUBE, TagOptions::default()),
        ("h1", "[h1={COLOR}]{TEXT}[/h1]", H1, TagOptions::default()),
        ("hr", "[hr]", "<hr />", with(TagOptions::STANDALONE)),
        ("size", "[size={NUMBER}]{TEXT}[/size]", "<span style=\"font-size:{NUMBER}pt;\">{TEXT}</span>", TagOptions::default()),
    ];

    for (name, definition, format, options) in tags {
        registry.register_default_tag(name, definition, format, options).unwrap();
    }
    registry
}

#[test]
pub fn custom_tags() {
    let spoiler = SPOILER.replace("{TEXT}", "hidden!");
    let youtube = YOUTUBE.replace("{TEXT}", "ztD3mRMdqSw");
    let h1 = H1.replace("{COLOR}", "#FFF").replace("{TEXT}", "hello world!");

    check(
        &custom_registry().renderer(),
        &[
            ("[justify]hello world![/justify]", "<div style=\"text-align:justify;\">hello world!</div>"),
            ("[spoiler]hidden![/spoiler]", spoiler.as_str()),
            ("[youtube]ztD3mRMdqSw[/youtube]", youtube.as_str()),
            ("[h1=#FFF]hello world![/h1]", h1.as_str()),
            ("[hr]", "<hr />"),
            ("a[hr]b[/hr]", "a<hr />b[/hr]"),
            // Dynamic registrations shadow the built-in tag of the same name.
            ("[size=24]hello world![/size]", "<span style=\"font-size:24pt;\">hello world!</span>"),
            ("[size=]hello world![/size]", "[size=]hello world![/size]"),
            ("[size=hello]hello world![/size]", "[size=hello]hello world![/size]"),
        ],
    );
}

#[test]
pub fn custom_renderers() {
    let mut registry = Registry::with_builtins();
    registry
        .register_tag(
            TagSpec::custom(
                "fooalt",
                |body: &str, _: Option<&str>, _: Option<&TagSpec>| format!("<pre>{body}</pre>"),
                without(TagOptions::RENDER_EMBEDDED),
            )
            .unwrap(),
        )
        .unwrap();
    registry
        .register_tag(
            TagSpec::custom(
                "bar",
                |body: &str, option: Option<&str>, _: Option<&TagSpec>| match option {
                    Some(color) => format!("<div class=\"bar\" style=\"color:{color};\">{body}</div>"),
                    None => format!("<div class=\"bar\">{body}</div>"),
                },
                TagOptions::default(),
            )
            .unwrap(),
        )
        .unwrap();
    registry
        .register_tag(
            TagSpec::custom(
                "who",
                |_: &str, _: Option<&str>, parent: Option<&TagSpec>| {
                    parent.map_or("nobody".to_owned(), |p| p.name().to_owned())
                },
                TagOptions::default(),
            )
            .unwrap(),
        )
        .unwrap();

    check(
        &registry.renderer(),
        &[
            ("[fooalt]hello world![/fooalt]", "<pre>hello world!</pre>"),
            ("[bar]hello world![/bar]", "<div class=\"bar\">hello world!</div>"),
            ("[fooalt]hello [bar]world![/bar][/fooalt]", "<pre>hello [bar]world![/bar]</pre>"),
            ("[bar]hello [fooalt]world![/fooalt][/bar]", "<div class=\"bar\">hello <pre>world!</pre></div>"),
            ("[bar]안녕하세요![/bar]", "<div class=\"bar\">안녕하세요!</div>"),
            ("[bar=\"a<b\"]x[/bar]", "<div class=\"bar\" style=\"color:a&lt;b;\">x</div>"),
            ("[who]x[/who] [u][who]x[/who][/u]", "nobody <u>u</u>"),
        ],
    );
}

#[test]
pub fn tag_options() {
    let mut registry = Registry::with_builtins();
    let tags = [
        ("[pre3]{TEXT}[/pre3]", "<pre>{TEXT}</pre>", with(TagOptions::NEWLINE_CLOSES)),
        ("[oo]{TEXT}", "<li>{TEXT}</li>", with(TagOptions::SAME_TAG_CLOSES)),
        ("[troll]{TEXT}[/troll]", "<div class=\"troll\">{TEXT}</div>", with(TagOptions::END_TAG_CLOSES)),
        ("[idea]{TEXT1}[/idea]", "<div class=\"idea\">{TEXT1}</div>", without(TagOptions::RENDER_EMBEDDED)),
        ("[idea1]{TEXT1}[/idea1]", "<div class=\"idea\">{TEXT1}</div>", without(TagOptions::ESCAPE_HTML)),
        ("[flat]{TEXT}[/flat]", "<p>{TEXT}</p>", without(TagOptions::TRANSFORM_NEWLINES)),
        ("[link]{URL}[/link]", "<div class=\"idea\">{URL}</div>", without(TagOptions::REPLACE_LINKS)),
        ("[link1]{URL}[/link1]", "<div class=\"idea\">{URL}</div>", with(TagOptions::STRIP)),
        (
            "[mailto]{EMAIL}[/mailto]",
            "<a href=\"mailto:{EMAIL}\">{EMAIL}</a>",
            with(TagOptions::SWALLOW_TRAILING_NEWLINE),
        ),
        ("[food]{CHOICE=apple,tomato,orange}[/food]", "<span>{CHOICE=apple,tomato,orange}</span>", TagOptions::default()),
        ("[big]{RANGE=2,15}[/big]", "<span>{RANGE=2,15}</span>", TagOptions::default()),
        (
            "[pick={CHOICE2=red,blue}]{CHOICE1=apple,tomato}[/pick]",
            "<span data-choice=\"{CHOICE2}\">{CHOICE1}</span>",
            TagOptions::default(),
        ),
    ];
    for (definition, format, options) in tags {
        registry
            .register_tag(TagSpec::compile(definition, format, options).unwrap())
            .unwrap();
    }

    check(
        &registry.renderer(),
        &[
            ("[pre3]line one\nline two", "<pre>line one</pre><br />line two"),
            ("[pre3]only line", "<pre>only line</pre>"),
            ("[pre3]x[/pre3]\ny", "<pre>x</pre><br />y"),
            ("[oo]one[oo]two", "<li>one</li><li>two</li>"),
            ("[b][troll]x[/b]", "<strong><div class=\"troll\">x</div></strong>"),
            ("[troll]x[/troll]", "<div class=\"troll\">x</div>"),
            ("[idea][b]x[/b] <y>[/idea]", "<div class=\"idea\">[b]x[/b] &lt;y&gt;</div>"),
            ("[idea1]<b>x</b>[/idea1]", "<div class=\"idea\"><b>x</b></div>"),
            ("[flat]a\nb[/flat]", "<p>a\nb</p>"),
            ("[link]http://a.com[/link]", "<div class=\"idea\">http://a.com</div>"),
            ("[link]not a url[/link]", "[link]not a url[/link]"),
            ("[link1]  http://a.com  [/link1]", "<div class=\"idea\">http://a.com</div>"),
            ("[mailto]xyz@xyz.com[/mailto]\nnext", "<a href=\"mailto:xyz@xyz.com\">xyz@xyz.com</a>next"),
            ("[mailto]xyz@xyz.com[/mailto]x\nnext", "<a href=\"mailto:xyz@xyz.com\">xyz@xyz.com</a>x<br />next"),
            ("[food]apple[/food]", "<span>apple</span>"),
            ("[food]pear[/food]", "[food]pear[/food]"),
            ("[big]7[/big] [big]20[/big]", "<span>7</span> [big]20[/big]"),
            ("[pick=red]tomato[/pick]", "<span data-choice=\"red\">tomato</span>"),
            ("[pick=green]tomato[/pick]", "[pick=green]tomato[/pick]"),
        ],
    );
}

#[test]
pub fn render_config() {
    let registry = Registry::with_builtins();

    let raw = registry.renderer_with(RenderConfig {
        feature_flags: RenderFeature::default() - RenderFeature::ESCAPE_HTML,
        ..Default::default()
    });
    assert_eq!(raw.render("[b]<i>x</i>[/b]"), "<strong><i>x</i></strong>");

    let plain = registry.renderer_with(RenderConfig {
        feature_flags: RenderFeature::ESCAPE_HTML,
        newline: "<br>".to_owned(),
    });
    assert_eq!(plain.render("www.google.com\nx"), "www.google.com\nx");

    let html5 = registry.renderer_with(RenderConfig {
        newline: "<br>".to_owned(),
        ..Default::default()
    });
    assert_eq!(html5.render("a\r\nb"), "a<br>b");
}

#[test]
pub fn smilies() {
    let mut registry = Registry::with_builtins();
    registry.add_smiley(":)", "<img src=\"smile.png\" alt=\":)\" />");
    registry.add_smiley(":))", "<img src=\"laugh.png\" alt=\":))\" />");

    check(
        &registry.renderer(),
        &[
            (":) hi", "<img src=\"smile.png\" alt=\":)\" /> hi"),
            ("[b]:))[/b]", "<strong><img src=\"laugh.png\" alt=\":))\" /></strong>"),
            ("a:) :)b", "a:) :)b"),
            ("[code]:)[/code]", "<code>:)</code>"),
        ],
    );

    let off = registry.renderer_with(RenderConfig {
        feature_flags: RenderFeature::default() - RenderFeature::SMILIES,
        ..Default::default()
    });
    assert_eq!(off.render(":)"), ":)");
}

#[test]
pub fn renderers_keep_their_snapshot() {
    let mut registry = Registry::with_builtins();
    let before = registry.renderer();
    registry.unregister_tag(BoldTag::NAME).unwrap();

    assert_eq!(before.render("[b]x[/b]"), "<strong>x</strong>");
    assert_eq!(registry.renderer().render("[b]x[/b]"), "[b]x[/b]");
}

#[test]
pub fn standard_tags_are_well_formed() {
    let tags = standard_tags();
    assert_eq!(tags.len(), 12);
    for tag in &tags {
        assert!(tag.name().bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit()));
        assert!(tag.has_closing_tag());
    }
}

fn plain_text() -> impl Strategy<Value = String> {
    // No dots or colons, so nothing looks like a link, and no semicolons, so nothing looks like
    // a character reference.
    "[a-zA-Z0-9 ,!?'\"<>&\u{e9}\u{c548}]{0,60}"
}

fn unknown_tag_name() -> impl Strategy<Value = String> {
    "[a-z]{1,8}".prop_filter("not a standard tag", |name| {
        !standard_tags().iter().any(|tag| tag.matches(name))
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn plain_text_is_only_escaped(content in plain_text()) {
        prop_assert_eq!(render(&content), encode_double_quoted_attribute(&content));
    }

    #[test]
    fn escaped_text_renders_unchanged(content in "[a-z0-9 ;&#<>\"]{0,60}") {
        let once = render(&content);
        prop_assert_eq!(render(&once), once);
    }

    #[test]
    fn unknown_tags_pass_through(tag in unknown_tag_name(), content in plain_text()) {
        let input = format!("[{tag}]{content}[/{tag}]");
        let expected = format!("[{tag}]{}[/{tag}]", encode_double_quoted_attribute(&content));
        prop_assert_eq!(render(&input), expected);
    }

    #[test]
    fn known_tags_wrap_content(content in plain_text()) {
        let input = format!("[b]{content}[/b]");
        let expected = format!("<strong>{}</strong>", encode_double_quoted_attribute(&content));
        prop_assert_eq!(render(&input), expected);
    }

    #[test]
    fn rendering_never_panics(input in "[\\[\\]/=a-z\"' \n*]{0,80}") {
        render(&input);
    }

    #[test]
    fn rendering_arbitrary_text_never_panics(input in "\\PC{0,120}") {
        render(&input);
    }

    #[test]
    fn placeholders_must_match(
        argument in prop::option::of(prop::sample::select(vec!["COLOR", "NUMBER", "TEXT2"])),
        use_argument in any::<bool>(),
        use_body in any::<bool>(),
        stray in prop::option::of(prop::sample::select(vec!["TEXT3", "URL", "EMAIL"]))
    ) {
        let definition = match argument {
            Some(arg) => format!("[t={{{arg}}}]{{TEXT1}}[/t]"),
            None => "[t]{TEXT1}[/t]".to_owned(),
        };

        let mut format = String::from("<p>");
        if let (Some(arg), true) = (argument, use_argument) {
            format.push_str(&format!("{{{arg}}}"));
        }
        if use_body {
            format.push_str("{TEXT1}");
        }
        if let Some(stray) = stray {
            format.push_str(&format!("{{{stray}}}"));
        }
        format.push_str("</p>");

        let bijection = (argument.is_none() || use_argument) && use_body && stray.is_none();
        match TagSpec::compile(&definition, &format, TagOptions::default()) {
            Ok(_) => prop_assert!(bijection),
            Err(error) => {
                prop_assert!(!bijection);
                let placeholder_error = matches!(
                    error,
                    DefinitionError::UnusedPlaceholder(_) | DefinitionError::UndefinedPlaceholder(_)
                );
                prop_assert!(placeholder_error);
            }
        }
    }
}
