use lazy_static::lazy_static;
use regex::Regex;

use crate::content::block_parser::{parse_legacy_blocks, Fence};
use crate::content::content_format::ContentFormat;
use crate::content::inline_renderer::{plain_text, render_inline};
use crate::content::text_structure::{structure_text, TextNode};
use crate::content::ContentBlock;

pub const WORDS_PER_MINUTE: usize = 220;

/// Spoken in place of code and diagram blocks.
pub const CODE_PLACEHOLDER: &str = "Code snippet.";

lazy_static! {
    static ref PRE_ELEMENT: Regex = Regex::new(r"(?is)<pre\b[^>]*>.*?</pre\s*>").unwrap();
    static ref CODE_ELEMENT: Regex = Regex::new(r"(?is)<code\b[^>]*>.*?</code\s*>").unwrap();
    static ref MEDIA_TAG: Regex = Regex::new(r"(?i)</?(?:img|video|source|audio|iframe)\b[^>]*>").unwrap();
    static ref BLOCK_BREAK: Regex = Regex::new(
        r"(?i)</(?:p|div|h[1-6]|li|ul|ol|blockquote|pre|tr|td|th)\s*>|<br\s*/?>"
    ).unwrap();
    static ref ANY_TAG: Regex = Regex::new(r"<[^>]+>").unwrap();
    static ref INLINE_MEDIA_MARKER: Regex = Regex::new(r"\[\[(?:img|vid):[^\]]*\]\]").unwrap();
}

/// Estimated minutes to read a post body, never less than one.
pub fn read_time_minutes(body: &str) -> usize {
    read_time_with(body, WORDS_PER_MINUTE)
}

pub fn read_time_with(body: &str, words_per_minute: usize) -> usize {
    let words = count_words(&readable_text(body));
    words.div_ceil(words_per_minute.max(1)).max(1)
}

pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// The words a reader actually reads: no markup, media or code.
pub fn readable_text(body: &str) -> String {
    match ContentFormat::detect(body) {
        ContentFormat::Html => html_to_text(body, None),
        ContentFormat::Legacy => legacy_to_text(body),
    }
}

/// Strips markup, turning block ends into spaces. `<pre>` and `<code>`
/// elements are dropped, or replaced by `code_placeholder` when given.
pub fn html_to_text(html: &str, code_placeholder: Option<&str>) -> String {
    let replacement = code_placeholder.map(|p| format!(" {} ", p)).unwrap_or_else(|| " ".to_string());
    let text = PRE_ELEMENT.replace_all(html, replacement.as_str());
    let text = CODE_ELEMENT.replace_all(&text, replacement.as_str());
    let text = MEDIA_TAG.replace_all(&text, " ");
    let text = BLOCK_BREAK.replace_all(&text, " ");
    let text = ANY_TAG.replace_all(&text, "");
    let text = text.replace("&nbsp;", " ");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn legacy_to_text(body: &str) -> String {
    let mut kept: Vec<String> = vec![];
    let mut lines = body.lines();
    while let Some(line) = lines.next() {
        if let Some((fence, _lang)) = Fence::open(line) {
            fence.take_body(&mut lines);
            continue;
        }
        kept.push(INLINE_MEDIA_MARKER.replace_all(line, " ").into_owned());
    }
    kept.join("\n")
}

/// Text handed to speech synthesis: prose without markup, with a fixed
/// sentence standing in for each code or diagram block.
pub fn speech_text(body: &str) -> String {
    if ContentFormat::detect(body) == ContentFormat::Html {
        return html_to_text(body, Some(CODE_PLACEHOLDER));
    }

    parse_legacy_blocks(body)
        .iter()
        .filter_map(|block| match block {
            ContentBlock::Text { value } => Some(speakable_text(value)),
            block if block.is_code_like() => Some(CODE_PLACEHOLDER.to_string()),
            _ => None,
        })
        .filter(|text| !text.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn speakable_text(value: &str) -> String {
    let mut parts: Vec<String> = vec![];
    for node in structure_text(value) {
        match node {
            TextNode::Heading { content, .. } | TextNode::Paragraph { content } => parts.push(plain_text(&content)),
            TextNode::List { items, .. } => parts.extend(items.iter().map(|item| plain_text(item))),
        }
    }
    parts.join("\n")
}

/// A post title without inline style tags or markup.
pub fn plain_title(title: &str) -> String {
    let title = ANY_TAG.replace_all(title, "");
    plain_text(&render_inline(&title)).trim().to_string()
}

#[cfg(test)]
mod tests {
    use crate::test_data::{HTML_POST, LEGACY_POST};

    use super::*;

    #[test]
    fn test_read_time_floor() {
        assert_eq!(read_time_minutes(""), 1);
        assert_eq!(read_time_minutes("one two three"), 1);
    }

    #[test]
    fn test_read_time_scales() {
        let words = vec!["word"; 220].join(" ");
        assert_eq!(read_time_minutes(&words), 1);
        let words = vec!["word"; 221].join(" ");
        assert_eq!(read_time_minutes(&words), 2);
        let words = vec!["word"; 661].join(" ");
        assert_eq!(read_time_minutes(&words), 4);
        assert_eq!(read_time_with(&words, 100), 7);
    }

    #[test]
    fn test_legacy_readable_text_drops_code_and_media() {
        let text = readable_text("intro words\n[[img:media/a.png]]\n```js\nlet a = 1;\nlet b = 2;\n```\ncodestart\nx\ncodeend\nend");
        assert_eq!(count_words(&text), 3);
    }

    #[test]
    fn test_html_readable_text() {
        let text = readable_text("<p>one two</p><p>three</p><pre>skip these words</pre><img src=\"a.png\">four<br/>five");
        assert_eq!(text, "one two three four five");
    }

    #[test]
    fn test_html_fixture_words() {
        let text = readable_text(HTML_POST);
        assert!(text.starts_with("Moving to serverless We replaced the old servers"));
        assert!(!text.contains("terraform"));
    }

    #[test]
    fn test_speech_text_legacy() {
        let speech = speech_text(LEGACY_POST);
        assert_eq!(speech, "Deploying a static site\nToday we ship the blog to the cloud.\n\n\
The build step is simple:\n\n\
Code snippet.\n\n\
Then wire up the pipeline:\n\n\
Code snippet.\n\n\
That's it. Happy shipping!");
    }

    #[test]
    fn test_speech_text_html() {
        let speech = speech_text("<p>Run this:</p><pre><code>ls</code></pre><p>Done.</p>");
        assert_eq!(speech, "Run this: Code snippet. Done.");
    }

    #[test]
    fn test_plain_title() {
        assert_eq!(plain_title("  **Deploying** [color=red]fast[/color] "), "Deploying fast");
        assert_eq!(plain_title("<b>Bold</b> title"), "Bold title");
    }
}
