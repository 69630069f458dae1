use std::fmt::Write;

use lazy_static::lazy_static;
use regex::{Captures, Match, Regex};
use spdlog::{debug, trace};

use crate::content::inline_renderer::InlineNode;
use crate::content::text_structure::{structure_text, TextNode};
use crate::content::{is_storage_path, ContentBlock};
use crate::media_cache::{MediaState, MediaUrlCache};

/// External syntax highlighter. `lang` is `"auto"` when undeclared.
pub trait SyntaxHighlighter {
    fn highlight(&self, code: &str, lang: &str) -> Result<String, String>;
}

/// External diagram engine for mermaid sources. Errors are shown to the reader as-is.
pub trait DiagramRenderer {
    fn render(&self, source: &str) -> Result<String, String>;
}

lazy_static! {
    static ref CSS_COLOR: Regex = Regex::new(r"^[#a-zA-Z0-9(),.%\s-]+$").unwrap();
    static ref SCRIPT_SCHEME: Regex = Regex::new(r"(?i)^\s*javascript\s*:").unwrap();
    static ref HTML_MEDIA_TAG: Regex = Regex::new(
        r#"(?i)<(?:img|video|source)\b[^>]*?[\s/]src\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))[^>]*>"#
    ).unwrap();
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Storage paths referenced by `src` attributes of media tags in `html`.
pub fn html_media_paths(html: &str) -> Vec<&str> {
    HTML_MEDIA_TAG.captures_iter(html)
        .filter_map(|caps| src_value(&caps).map(|m| m.as_str()))
        .filter(|src| is_storage_path(src))
        .collect()
}

fn src_value<'h>(caps: &Captures<'h>) -> Option<Match<'h>> {
    caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3))
}

/// Fallback for unhighlighted code: only `&`, `<` and `>` are escaped.
pub fn escape_code(code: &str) -> String {
    code.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

pub struct BlockRenderer<'a> {
    media: &'a MediaUrlCache,
    highlighter: Option<&'a dyn SyntaxHighlighter>,
    diagrams: Option<&'a dyn DiagramRenderer>,
}

impl<'a> BlockRenderer<'a> {
    pub fn new(media: &'a MediaUrlCache) -> Self {
        BlockRenderer {
            media,
            highlighter: None,
            diagrams: None,
        }
    }

    pub fn with_highlighter(mut self, highlighter: &'a dyn SyntaxHighlighter) -> Self {
        self.highlighter = Some(highlighter);
        self
    }

    pub fn with_diagrams(mut self, diagrams: &'a dyn DiagramRenderer) -> Self {
        self.diagrams = Some(diagrams);
        self
    }

    pub fn render(&self, blocks: &[ContentBlock]) -> String {
        blocks.iter().map(|block| self.render_block(block)).collect()
    }

    pub fn render_block(&self, block: &ContentBlock) -> String {
        match block {
            ContentBlock::Text { value } => render_text(value),
            ContentBlock::Code { lang, code } => self.render_code(lang, code),
            ContentBlock::Mermaid { code } => self.render_mermaid(code),
            ContentBlock::Image { value } => match self.media_url(value) {
                Some(url) => format!("<img src=\"{}\" alt=\"\" loading=\"lazy\"/>\n", escape_html(&url)),
                None => String::new(),
            },
            ContentBlock::Video { value } => match self.media_url(value) {
                Some(url) => format!("<video controls src=\"{}\"></video>\n", escape_html(&url)),
                None => String::new(),
            },
            ContentBlock::Html { value } => self.resolve_html_media(value),
        }
    }

    /// Swaps storage paths in media tags for their URLs. Tags whose path is
    /// still pending are removed.
    pub fn resolve_html_media(&self, html: &str) -> String {
        HTML_MEDIA_TAG.replace_all(html, |caps: &Captures| {
            let (Some(whole), Some(src)) = (caps.get(0), src_value(caps)) else {
                return caps[0].to_string();
            };
            if !is_storage_path(src.as_str()) {
                return whole.as_str().to_string();
            }
            match self.media_url(src.as_str()) {
                Some(url) => {
                    let tag = whole.as_str();
                    let (from, to) = (src.start() - whole.start(), src.end() - whole.start());
                    format!("{}{}{}", &tag[..from], escape_html(&url), &tag[to..])
                }
                None => String::new(),
            }
        }).into_owned()
    }

    /// A displayable URL, or `None` while a storage path is unresolved.
    pub fn media_url(&self, reference: &str) -> Option<String> {
        if is_storage_path(reference) {
            return match self.media.get(reference) {
                MediaState::Resolved(url) => Some(url),
                MediaState::Pending => {
                    trace!("media {} not resolved yet", reference);
                    None
                }
            };
        }
        if SCRIPT_SCHEME.is_match(reference) {
            return None;
        }
        Some(reference.to_string())
    }

    fn render_code(&self, lang: &str, code: &str) -> String {
        let body = match self.highlighter.map(|h| h.highlight(code, lang)) {
            Some(Ok(highlighted)) => highlighted,
            Some(Err(e)) => {
                debug!("highlighting failed for lang {}: {}", lang, e);
                escape_code(code)
            }
            None => escape_code(code),
        };
        format!("<pre><code class=\"language-{}\">{}</code></pre>\n", escape_html(lang), body)
    }

    fn render_mermaid(&self, source: &str) -> String {
        match self.diagrams.map(|d| d.render(source)) {
            Some(Ok(svg)) => format!("<div class=\"mermaid-diagram\">{}</div>\n", svg),
            Some(Err(message)) => format!("<div class=\"mermaid-error\">{}</div>\n", escape_html(&message)),
            None => format!("<pre class=\"mermaid\">{}</pre>\n", escape_code(source)),
        }
    }
}

pub fn render_text(value: &str) -> String {
    let mut html = String::new();
    for node in structure_text(value) {
        match node {
            TextNode::Heading { level, content } => {
                let _ = writeln!(&mut html, "<h{0}>{1}</h{0}>", level, render_inline_html(&content));
            }
            TextNode::Paragraph { content } => {
                let _ = writeln!(&mut html, "<p>{}</p>", render_inline_html(&content));
            }
            TextNode::List { ordered, start, items } => {
                let open = match (ordered, start) {
                    (false, _) => "<ul>".to_string(),
                    (true, 1) => "<ol>".to_string(),
                    (true, n) => format!("<ol start=\"{}\">", n),
                };
                html.push_str(&open);
                html.push('\n');
                for item in &items {
                    let _ = writeln!(&mut html, "<li>{}</li>", render_inline_html(item));
                }
                html.push_str(if ordered { "</ol>\n" } else { "</ul>\n" });
            }
        }
    }
    html
}

pub fn render_inline_html(nodes: &[InlineNode]) -> String {
    let mut html = String::new();
    for node in nodes {
        match node {
            InlineNode::Text(text) => html.push_str(&escape_html(text).replace('\n', "<br/>\n")),
            InlineNode::Bold(children) => {
                let _ = write!(&mut html, "<strong>{}</strong>", render_inline_html(children));
            }
            InlineNode::Italic(children) => {
                let _ = write!(&mut html, "<em>{}</em>", render_inline_html(children));
            }
            InlineNode::Color(spec, children) => html.push_str(&styled_span("color", spec, children)),
            InlineNode::Background(spec, children) => html.push_str(&styled_span("background-color", spec, children)),
            InlineNode::Hand(level, children) => {
                let _ = write!(&mut html, "<span class=\"hand hand-{}\">{}</span>", level, render_inline_html(children));
            }
        }
    }
    html
}

fn styled_span(property: &str, spec: &str, children: &[InlineNode]) -> String {
    let inner = render_inline_html(children);
    if CSS_COLOR.is_match(spec) {
        format!("<span style=\"{}: {}\">{}</span>", property, spec.trim(), inner)
    } else {
        format!("<span>{}</span>", inner)
    }
}
