use serde::Serialize;

pub mod content_file;
pub mod content_format;
pub mod sanitizer;
pub mod block_parser;
pub mod code_detector;
pub mod inline_renderer;
pub mod text_structure;
pub mod cover_media;

/// Storage-relative media paths start with this prefix and need a signed URL before display.
pub const MEDIA_PATH_PREFIX: &str = "media/";

/// One typed unit of a parsed post body, in source order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentBlock {
    Text { value: String },
    Code { lang: String, code: String },
    Mermaid { code: String },
    Image { value: String },
    Video { value: String },
    Html { value: String },
}

impl ContentBlock {
    pub fn text(value: impl Into<String>) -> Self {
        ContentBlock::Text { value: value.into() }
    }

    pub fn code(lang: impl Into<String>, code: impl Into<String>) -> Self {
        ContentBlock::Code { lang: lang.into(), code: code.into() }
    }

    pub fn mermaid(code: impl Into<String>) -> Self {
        ContentBlock::Mermaid { code: code.into() }
    }

    /// Media reference carried by image and video blocks.
    pub fn media_ref(&self) -> Option<&str> {
        match self {
            ContentBlock::Image { value } | ContentBlock::Video { value } => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn is_code_like(&self) -> bool {
        matches!(self, ContentBlock::Code { .. } | ContentBlock::Mermaid { .. })
    }
}

pub fn is_storage_path(reference: &str) -> bool {
    reference.starts_with(MEDIA_PATH_PREFIX)
}
