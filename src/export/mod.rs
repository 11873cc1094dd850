//! Rendering resolved pages and writing the output tree.

mod render;
mod writer;

pub use render::{
    DEFAULT_STYLESHEET, RenderContext, RenderOptions, copyright_line, parent_trail, recency_order,
    render_page, title_trail,
};
pub use writer::{BuildReport, write_site};
