use spdlog::debug;

use crate::content::block_parser::parse_body;
use crate::content::content_file::PostRecord;
use crate::content::content_format::ContentFormat;
use crate::content::cover_media::{cover_media, CoverMedia};
use crate::content::{is_storage_path, ContentBlock};
use crate::text_utils::{plain_title, read_time_with};
use crate::view::block_renderer::{html_media_paths, BlockRenderer};

/// Everything a post page needs, derived from one stored body.
#[derive(Debug, Clone)]
pub struct RenderedPost {
    pub title: String,
    pub format: ContentFormat,
    pub blocks: Vec<ContentBlock>,
    pub body_html: String,
    pub read_time: usize,
    pub cover: CoverMedia,
    pub cover_url: Option<String>,
}

/// Every storage path referenced by the blocks, in order and without duplicates.
pub fn media_paths(blocks: &[ContentBlock]) -> Vec<&str> {
    let mut paths: Vec<&str> = vec![];
    for block in blocks {
        let found = match block {
            ContentBlock::Html { value } => html_media_paths(value),
            _ => block.media_ref().filter(|r| is_storage_path(r)).into_iter().collect(),
        };
        for path in found {
            if !paths.contains(&path) {
                paths.push(path);
            }
        }
    }
    paths
}

/// Runs the whole pipeline. Media must already be in the renderer's cache
/// to show up; see [`media_paths`] for what to resolve first.
pub fn render_post(post: &PostRecord, renderer: &BlockRenderer, words_per_minute: usize) -> RenderedPost {
    let parsed = parse_body(&post.content);
    let body_html = renderer.render(&parsed.blocks);
    let cover = cover_media(&post.content);
    let cover_url = cover.url.clone()
        .or_else(|| cover.path.as_deref().and_then(|path| renderer.media_url(path)));

    debug!("rendered post '{}' into {} blocks", post.title, parsed.blocks.len());

    RenderedPost {
        title: plain_title(&post.title),
        format: parsed.format,
        blocks: parsed.blocks,
        body_html,
        read_time: read_time_with(&post.content, words_per_minute),
        cover,
        cover_url,
    }
}
