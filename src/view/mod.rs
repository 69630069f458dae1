pub mod block_renderer;
pub mod post_renderer;
