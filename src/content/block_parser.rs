use lazy_static::lazy_static;
use regex::Regex;
use spdlog::debug;

use crate::content::code_detector::{split_code_runs, AUTO_LANG};
use crate::content::content_format::ContentFormat;
use crate::content::sanitizer::sanitize_html;
use crate::content::ContentBlock;

const CODESTART: &str = "codestart";
const CODEEND: &str = "codeend";
const BACKTICK_FENCE: &str = "```";
const MERMAID_LANG: &str = "mermaid";

lazy_static! {
    static ref MEDIA_MARKER: Regex = Regex::new(r"^\[\[(img|vid):([^\]]+)\]\]$").unwrap();
    static ref MARKDOWN_IMAGE: Regex = Regex::new(r"^!\[[^\]]*\]\(([^()\s]+)\)$").unwrap();
    static ref VIDEO_URL: Regex = Regex::new(r"(?i)\.(?:mp4|webm|ogg|ogv|mov|m4v)(?:\?.*)?$").unwrap();
}

/// A post body split into blocks, with the format it was classified as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedBody {
    pub format: ContentFormat,
    pub blocks: Vec<ContentBlock>,
}

/// Classifies the body once and produces its blocks: a single sanitized
/// `html` block for editor content, segmented blocks otherwise.
pub fn parse_body(body: &str) -> ParsedBody {
    let format = ContentFormat::detect(body);
    debug!("post body classified as {:?} ({} bytes)", format, body.len());

    let blocks = match format {
        ContentFormat::Html => {
            let value = sanitize_html(body);
            if value.trim().is_empty() {
                vec![]
            } else {
                vec![ContentBlock::Html { value }]
            }
        }
        ContentFormat::Legacy => parse_legacy_blocks(body),
    };

    ParsedBody { format, blocks }
}

pub fn is_video_url(url: &str) -> bool {
    VIDEO_URL.is_match(url)
}

fn declared_lang(rest: &str) -> String {
    let lang = rest.trim().to_lowercase();
    if lang.is_empty() {
        AUTO_LANG.to_string()
    } else {
        lang
    }
}

fn media_block(line: &str) -> Option<ContentBlock> {
    if let Some(caps) = MEDIA_MARKER.captures(line) {
        let value = caps[2].trim().to_string();
        if value.is_empty() {
            return None;
        }
        return Some(match &caps[1] {
            "img" => ContentBlock::Image { value },
            _ => ContentBlock::Video { value },
        });
    }

    let caps = MARKDOWN_IMAGE.captures(line)?;
    let value = caps[1].to_string();
    if is_video_url(&value) {
        Some(ContentBlock::Video { value })
    } else {
        Some(ContentBlock::Image { value })
    }
}

/// Explicit code region delimiters of legacy content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fence {
    /// `codestart [lang]` .. `codeend`
    CodeStart,
    /// Triple backticks, optionally followed by a language.
    Backticks,
}

impl Fence {
    /// Recognizes an opening fence line and returns its declared language.
    pub fn open(line: &str) -> Option<(Fence, String)> {
        let trimmed = line.trim();
        let lowered = trimmed.to_lowercase();
        if lowered.starts_with(CODESTART) {
            return Some((Fence::CodeStart, declared_lang(&lowered[CODESTART.len()..])));
        }
        trimmed.strip_prefix(BACKTICK_FENCE).map(|rest| (Fence::Backticks, declared_lang(rest)))
    }

    pub fn is_close(&self, line: &str) -> bool {
        match self {
            Fence::CodeStart => line.trim().to_lowercase() == CODEEND,
            Fence::Backticks => line.trim().starts_with(BACKTICK_FENCE),
        }
    }

    /// Collects lines up to the closing fence, which is consumed. An unclosed
    /// fence runs to the end of the input.
    pub fn take_body<'a, I>(&self, lines: &mut I) -> String
    where
        I: Iterator<Item = &'a str>,
    {
        let mut body: Vec<&str> = vec![];
        for line in lines.by_ref() {
            if self.is_close(line) {
                break;
            }
            body.push(line);
        }
        body.join("\n")
    }
}

fn flush_pending(pending: &mut Vec<&str>, blocks: &mut Vec<ContentBlock>) {
    if pending.is_empty() {
        return;
    }
    blocks.extend(split_code_runs(pending));
    pending.clear();
}

/// Segments a legacy body line by line into text, code, mermaid, image and video blocks.
pub fn parse_legacy_blocks(body: &str) -> Vec<ContentBlock> {
    let mut blocks = vec![];
    let mut pending: Vec<&str> = vec![];
    let mut lines = body.lines();

    while let Some(line) = lines.next() {
        if let Some((fence, lang)) = Fence::open(line) {
            flush_pending(&mut pending, &mut blocks);
            let code = fence.take_body(&mut lines);
            if code.trim().is_empty() {
                continue;
            }
            if fence == Fence::Backticks && lang == MERMAID_LANG {
                blocks.push(ContentBlock::mermaid(code));
            } else {
                blocks.push(ContentBlock::code(lang, code));
            }
            continue;
        }

        if let Some(block) = media_block(line.trim()) {
            flush_pending(&mut pending, &mut blocks);
            blocks.push(block);
            continue;
        }

        pending.push(line);
    }

    flush_pending(&mut pending, &mut blocks);
    blocks
}

#[cfg(test)]
mod tests {
    use crate::test_data::LEGACY_POST;

    use super::*;

    fn image(value: &str) -> ContentBlock {
        ContentBlock::Image { value: value.to_string() }
    }

    fn video(value: &str) -> ContentBlock {
        ContentBlock::Video { value: value.to_string() }
    }

    #[test]
    fn test_backtick_fence() {
        let blocks = parse_legacy_blocks("Hello\n```js\nconsole.log(1)\n```\nWorld");
        assert_eq!(blocks, vec![
            ContentBlock::text("Hello"),
            ContentBlock::code("js", "console.log(1)"),
            ContentBlock::text("World"),
        ]);
    }

    #[test]
    fn test_mermaid_fence() {
        let blocks = parse_legacy_blocks("```mermaid\ngraph TD; A-->B\n```");
        assert_eq!(blocks, vec![ContentBlock::mermaid("graph TD; A-->B")]);

        let blocks = parse_legacy_blocks("```Mermaid\nconst x = 1;\n```");
        assert_eq!(blocks, vec![ContentBlock::mermaid("const x = 1;")]);
    }

    #[test]
    fn test_codestart_fence() {
        let body = "Intro\nCodeStart Python\ndef main():\n    pass\n  CODEEND  \nOutro";
        assert_eq!(parse_legacy_blocks(body), vec![
            ContentBlock::text("Intro"),
            ContentBlock::code("python", "def main():\n    pass"),
            ContentBlock::text("Outro"),
        ]);
    }

    #[test]
    fn test_codestart_without_lang_is_auto() {
        assert_eq!(parse_legacy_blocks("codestart\nx\ncodeend"), vec![ContentBlock::code("auto", "x")]);
    }

    #[test]
    fn test_unclosed_fences_run_to_end() {
        assert_eq!(parse_legacy_blocks("codestart sh\nls -la\necho done"), vec![
            ContentBlock::code("sh", "ls -la\necho done"),
        ]);
        assert_eq!(parse_legacy_blocks("text\n```\nopen"), vec![
            ContentBlock::text("text"),
            ContentBlock::code("auto", "open"),
        ]);
    }

    #[test]
    fn test_empty_fences_are_skipped() {
        assert!(parse_legacy_blocks("```js\n```").is_empty());
        assert!(parse_legacy_blocks("codestart\n   \ncodeend").is_empty());
    }

    #[test]
    fn test_media_markers() {
        assert_eq!(parse_legacy_blocks("[[img:media/abc.png]]"), vec![image("media/abc.png")]);
        assert_eq!(parse_legacy_blocks("  [[vid: https://cdn.example.com/v.mp4 ]]"), vec![
            video("https://cdn.example.com/v.mp4"),
        ]);
    }

    #[test]
    fn test_two_markers_on_one_line_stay_text() {
        let line = "[[img:media/a.png]] and [[img:media/b.png]]";
        assert_eq!(parse_legacy_blocks(line), vec![ContentBlock::text(line)]);
    }

    #[test]
    fn test_markdown_image_lines() {
        assert_eq!(parse_legacy_blocks("![cover](https://x.io/a.jpg)"), vec![image("https://x.io/a.jpg")]);
        assert_eq!(parse_legacy_blocks("![](media/clip.MP4?t=3)"), vec![video("media/clip.MP4?t=3")]);
        // not alone on its line
        assert_eq!(parse_legacy_blocks("see ![x](a.png) here"), vec![ContentBlock::text("see ![x](a.png) here")]);
    }

    #[test]
    fn test_marker_inside_fence_is_code() {
        assert_eq!(parse_legacy_blocks("```\n[[img:media/a.png]]\n```"), vec![
            ContentBlock::code("auto", "[[img:media/a.png]]"),
        ]);
    }

    #[test]
    fn test_unfenced_code_is_detected() {
        assert_eq!(parse_legacy_blocks("const x = 1;\nlet y = 2;"), vec![
            ContentBlock::code("auto", "const x = 1;\nlet y = 2;"),
        ]);
    }

    #[test]
    fn test_block_order_and_counts() {
        let blocks = parse_legacy_blocks(LEGACY_POST);
        let kinds: Vec<&str> = blocks.iter().map(|b| match b {
            ContentBlock::Text { .. } => "text",
            ContentBlock::Code { .. } => "code",
            ContentBlock::Mermaid { .. } => "mermaid",
            ContentBlock::Image { .. } => "image",
            ContentBlock::Video { .. } => "video",
            ContentBlock::Html { .. } => "html",
        }).collect();
        assert_eq!(kinds, vec!["text", "image", "text", "code", "text", "mermaid", "video", "text"]);
    }

    #[test]
    fn test_parse_body_html_is_single_block() {
        let parsed = parse_body("<p>Hi</p>\n[[img:media/a.png]]<script>x</script>");
        assert_eq!(parsed.format, ContentFormat::Html);
        assert_eq!(parsed.blocks, vec![ContentBlock::Html { value: "<p>Hi</p>\n[[img:media/a.png]]".to_string() }]);
    }

    #[test]
    fn test_parse_body_legacy() {
        let parsed = parse_body("[[img:media/abc.png]]");
        assert_eq!(parsed.format, ContentFormat::Legacy);
        assert_eq!(parsed.blocks, vec![image("media/abc.png")]);
        assert!(parse_body("").blocks.is_empty());
    }
}
