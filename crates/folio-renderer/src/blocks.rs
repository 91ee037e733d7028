//! Rendering of the flat block model, for the editor canvas and the reader.

use folio_common::block::{Block, BlockType};
use folio_common::SmolStr;
use smol_str::format_smolstr;

use crate::view::{Element, ViewNode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    /// Empty blocks show a placeholder the user can click.
    Editor,
    /// Empty blocks are omitted.
    #[default]
    Reader,
}

const VIDEO_ALLOW: &str =
    "accelerometer; autoplay; clipboard-write; encrypted-media; gyroscope; picture-in-picture";

/// Prompt shown in place of an empty block in editor mode.
pub fn placeholder_text(block_type: &BlockType) -> &'static str {
    match block_type {
        BlockType::Text => "Click to add text...",
        BlockType::Heading => "Click to add heading...",
        BlockType::Image => "Upload Image",
        BlockType::Video => "Add Video URL",
        BlockType::Button => "Click here",
        BlockType::Code => "Add a code snippet",
        BlockType::Quote => "Click to add a quote...",
        BlockType::Divider | BlockType::Unknown(_) => "",
    }
}

pub fn render_blocks(blocks: &[Block], mode: RenderMode) -> ViewNode {
    let children = blocks.iter().filter_map(|block| render_block(block, mode));
    Element::new("div").class("folio-blocks").children(children).into()
}

/// Render one block, or `None` when reader mode skips it.
pub fn render_block(block: &Block, mode: RenderMode) -> Option<ViewNode> {
    let body = if block.is_empty() {
        match mode {
            RenderMode::Reader => return None,
            RenderMode::Editor => Element::new("div")
                .class("folio-placeholder")
                .child(ViewNode::text(placeholder_text(&block.block_type))),
        }
    } else {
        render_content(block)
    };
    let wrapper = Element::new("div")
        .class("folio-block")
        .class(&format!("folio-block-{}", block.block_type))
        .attr("data-block-id", SmolStr::new(block.id.as_str()))
        .child(body);
    Some(wrapper.into())
}

fn text(content: &str) -> ViewNode {
    ViewNode::text(content)
}

fn render_content(block: &Block) -> Element {
    match &block.block_type {
        BlockType::Text => Element::new("p").child(text(&block.content)),
        BlockType::Heading => {
            let level = match block.level {
                Some(l @ 1..=3) => l,
                _ => folio_common::block::DEFAULT_HEADING_LEVEL,
            };
            Element::new(format_smolstr!("h{}", level)).child(text(&block.content))
        }
        BlockType::Image => {
            let alt = block.alt.clone().unwrap_or_else(|| SmolStr::new_static("Blog image"));
            let mut figure = Element::new("figure").child(
                Element::new("img")
                    .attr("src", block.url.clone().unwrap_or_default())
                    .attr("alt", alt),
            );
            if let Some(caption) = block.alt.as_deref().filter(|a| !a.is_empty()) {
                figure = figure.child(Element::new("figcaption").child(text(caption)));
            }
            figure
        }
        BlockType::Video => Element::new("div").class("folio-video").child(
            Element::new("iframe")
                .attr("src", block.url.clone().unwrap_or_default())
                .attr("allow", VIDEO_ALLOW)
                .attr("allowfullscreen", ""),
        ),
        BlockType::Button => Element::new("div").class("folio-button").child(
            Element::new("a")
                .attr("href", block.link_url.clone().unwrap_or_default())
                .attr("target", "_blank")
                .attr("rel", "noopener noreferrer")
                .child(text(block.link_text.as_deref().unwrap_or_default())),
        ),
        BlockType::Code => {
            let language = block
                .language
                .as_deref()
                .unwrap_or(folio_common::block::DEFAULT_CODE_LANGUAGE);
            Element::new("pre").child(
                Element::new("code")
                    .class(&format!("language-{}", language))
                    .child(text(&block.content)),
            )
        }
        BlockType::Quote => Element::new("blockquote").child(text(&block.content)),
        BlockType::Divider => Element::new("hr"),
        BlockType::Unknown(name) => Element::new("div")
            .class("folio-unknown")
            .attr("data-kind", name.clone())
            .child(text(&block.content)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_common::block::BlockPatch;

    #[test]
    fn test_reader_skips_empty_blocks_but_not_dividers() {
        let blocks = vec![
            Block::text(""),
            Block::new(BlockType::Divider),
            Block::new(BlockType::Image),
            Block::text("kept"),
        ];
        let view = render_blocks(&blocks, RenderMode::Reader);
        assert_eq!(view.children().len(), 2);
        assert_eq!(view.plain_text(), "kept");
    }

    #[test]
    fn test_editor_shows_placeholders() {
        let blocks = vec![Block::new(BlockType::Quote)];
        let view = render_blocks(&blocks, RenderMode::Editor);
        let wrapper = &view.children()[0];
        let placeholder = wrapper.children()[0].as_element().unwrap();
        assert!(placeholder.has_class("folio-placeholder"));
        assert_eq!(view.plain_text(), "Click to add a quote...");
    }

    #[test]
    fn test_block_id_is_exposed() {
        let block = Block::with_id("b1".into(), BlockType::Text);
        let view = render_block(&block, RenderMode::Editor).unwrap();
        let el = view.as_element().unwrap();
        assert_eq!(el.get_attr("data-block-id"), Some("b1"));
        assert!(el.has_class("folio-block-text"));
    }

    #[test]
    fn test_image_caption_and_code_language() {
        let mut image = Block::new(BlockType::Image);
        image.apply(&BlockPatch {
            url: Some("/a.png".into()),
            alt: Some("A cat".into()),
            ..Default::default()
        });
        let mut code = Block::new(BlockType::Code);
        code.content = "x".into();

        let view = render_blocks(&[image, code], RenderMode::Reader);
        assert_eq!(view.find("img").unwrap().get_attr("alt"), Some("A cat"));
        assert_eq!(
            view.find("figcaption").unwrap().children,
            vec![ViewNode::text("A cat")]
        );
        assert!(view.find("code").unwrap().has_class("language-javascript"));
    }
}
