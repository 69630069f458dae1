use std::io;
use std::io::ErrorKind;

use ramhorns::Template;

use crate::content::content_file::PostRecord;
use crate::content::cover_media::MediaType;
use crate::post_render::RenderedPost;

/// Page used when no template file is configured.
pub const DEFAULT_VIEW_TEMPLATE: &str = r##"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{{title}}</title>
</head>
<body>
<article>
<h1>{{title}}</h1>
<p class="meta">{{#author}}{{author}} · {{/author}}{{date}} · {{read_time}} min read</p>
{{#has_cover}}{{#cover_is_video}}<video class="cover" controls src="{{cover_url}}"></video>{{/cover_is_video}}{{^cover_is_video}}<img class="cover" src="{{cover_url}}" alt="">{{/cover_is_video}}{{/has_cover}}
<div class="post-content">
{{{post_content}}}
</div>
</article>
</body>
</html>
"##;

#[derive(ramhorns::Content)]
struct ViewItem<'a> {
    id: &'a str,
    title: &'a str,
    author: &'a str,
    date: &'a str,
    read_time: String,
    has_cover: bool,
    cover_is_video: bool,
    cover_url: &'a str,
    post_content: &'a str,
}

pub struct PostRenderer<'a> {
    pub template: Template<'a>,
}

impl PostRenderer<'_> {
    pub fn new(view_tpl_src: &str) -> io::Result<PostRenderer> {
        let template = match Template::new(view_tpl_src) {
            Ok(x) => x,
            Err(e) => {
                return Err(io::Error::new(ErrorKind::InvalidInput, format!("Error parsing post view template: {}", e)));
            }
        };

        Ok(PostRenderer {
            template,
        })
    }

    pub fn render(&self, post: &PostRecord, rendered: &RenderedPost) -> String {
        let date = post.created_at
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        let cover_url = rendered.cover_url.as_deref().unwrap_or("");

        self.template.render(&ViewItem {
            id: post.id.as_deref().unwrap_or(""),
            title: rendered.title.as_str(),
            author: post.author.as_deref().unwrap_or(""),
            date: date.as_str(),
            read_time: rendered.read_time.to_string(),
            has_cover: !cover_url.is_empty(),
            cover_is_video: rendered.cover.media_type == Some(MediaType::Video),
            cover_url,
            post_content: rendered.body_html.as_str(),
        })
    }
}
