pub mod config;
pub mod logger;
pub mod content;
pub mod media_cache;
pub mod text_utils;
pub mod post_render;
pub mod view;
mod test_data;
