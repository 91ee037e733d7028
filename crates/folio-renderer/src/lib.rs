//! folio-renderer: deterministic rendering of stored content.
//!
//! Both content models render to the same [`ViewNode`] tree, which hosts can
//! map onto their own UI or serialize with [`to_html`].

pub mod blocks;
pub mod html;
pub mod text;
pub mod tree;
pub mod view;

use folio_common::Body;

pub use blocks::{RenderMode, placeholder_text, render_block, render_blocks};
pub use html::to_html;
pub use text::{TextStats, excerpt};
pub use tree::{heading_level, render_tree};
pub use view::{Element, ViewNode};

/// Render either body shape. Tree bodies render identically in both modes.
pub fn render_body(body: &Body, mode: RenderMode) -> ViewNode {
    match body {
        Body::Tree(doc) => render_tree(doc),
        Body::Blocks(blocks) => render_blocks(blocks, mode),
    }
}

/// Statistics of the reader view of a body.
pub fn body_stats(body: &Body) -> TextStats {
    TextStats::from_view(&render_body(body, RenderMode::Reader))
}
