use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use crate::content::block_parser::parse_legacy_blocks;
use crate::content::content_format::ContentFormat;
use crate::content::{is_storage_path, ContentBlock};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
}

/// Representative media of a post. At most one of `url` and `path` is set;
/// everything is `None` when the body has no media.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CoverMedia {
    pub url: Option<String>,
    pub path: Option<String>,
    pub media_type: Option<MediaType>,
}

impl CoverMedia {
    pub fn new(reference: &str, media_type: MediaType) -> Self {
        let reference = reference.to_string();
        let (url, path) = if is_storage_path(&reference) {
            (None, Some(reference))
        } else {
            (Some(reference), None)
        };
        CoverMedia {
            url,
            path,
            media_type: Some(media_type),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.url.is_none() && self.path.is_none()
    }
}

lazy_static! {
    static ref HTML_MEDIA_SRC: Regex = Regex::new(
        r#"(?i)<(img|video|source)\b[^>]*?[\s/]src\s*=\s*(?:"([^"]+)"|'([^']+)'|([^\s"'>]+))"#
    ).unwrap();
}

pub fn cover_media(body: &str) -> CoverMedia {
    match ContentFormat::detect(body) {
        ContentFormat::Html => html_cover(body),
        ContentFormat::Legacy => legacy_cover(body),
    }
}

fn html_cover(body: &str) -> CoverMedia {
    let Some(caps) = HTML_MEDIA_SRC.captures(body) else {
        return CoverMedia::default();
    };
    let media_type = if caps[1].eq_ignore_ascii_case("img") {
        MediaType::Image
    } else {
        MediaType::Video
    };
    let src = caps.get(2)
        .or_else(|| caps.get(3))
        .or_else(|| caps.get(4))
        .map(|m| m.as_str().trim())
        .unwrap_or("");
    CoverMedia::new(src, media_type)
}

fn legacy_cover(body: &str) -> CoverMedia {
    parse_legacy_blocks(body)
        .iter()
        .find_map(|block| match block {
            ContentBlock::Image { value } => Some(CoverMedia::new(value, MediaType::Image)),
            ContentBlock::Video { value } => Some(CoverMedia::new(value, MediaType::Video)),
            _ => None,
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use crate::test_data::{HTML_POST, LEGACY_POST};

    use super::*;

    #[test]
    fn test_legacy_storage_path() {
        let cover = cover_media(LEGACY_POST);
        assert_eq!(cover, CoverMedia {
            url: None,
            path: Some("media/architecture.png".to_string()),
            media_type: Some(MediaType::Image),
        });
    }

    #[test]
    fn test_legacy_video_url() {
        let cover = cover_media("intro\n[[vid:https://cdn.example.com/v.webm]]\n[[img:media/late.png]]");
        assert_eq!(cover.url.as_deref(), Some("https://cdn.example.com/v.webm"));
        assert_eq!(cover.path, None);
        assert_eq!(cover.media_type, Some(MediaType::Video));
    }

    #[test]
    fn test_html_first_media() {
        let cover = cover_media(HTML_POST);
        assert_eq!(cover.path.as_deref(), Some("media/uploads/diagram.png"));
        assert_eq!(cover.media_type, Some(MediaType::Image));

        let cover = cover_media(r#"<p>clip</p><video controls><source type="video/mp4" src="https://x.io/c.mp4"></video>"#);
        assert_eq!(cover.url.as_deref(), Some("https://x.io/c.mp4"));
        assert_eq!(cover.media_type, Some(MediaType::Video));
    }

    #[test]
    fn test_html_unquoted_src() {
        let cover = cover_media("<p>a</p><img alt=x src=media/a.png>");
        assert_eq!(cover.path.as_deref(), Some("media/a.png"));
        assert_eq!(cover.media_type, Some(MediaType::Image));

        let cover = cover_media("<p>a</p><img data-src=\"media/lazy.png\" src='https://x.io/b.png'>");
        assert_eq!(cover.url.as_deref(), Some("https://x.io/b.png"));
    }

    #[test]
    fn test_no_media() {
        assert!(cover_media("<p>words only</p>").is_empty());
        let cover = cover_media("just text\n```\n[[img:media/in-code.png]]\n```");
        assert_eq!(cover, CoverMedia::default());
        assert_eq!(serde_json::to_string(&cover).unwrap(), r#"{"url":null,"path":null,"media_type":null}"#);
    }
}
