//! Explicit mapping between the flat block model and the content tree.
//!
//! Neither direction is lossless in general. Each conversion returns the
//! converted value together with every [`Loss`] it incurred, so callers can
//! warn before switching a document's content model.

use smol_str::SmolStr;

use crate::block::{Block, BlockId, BlockType};
use crate::mark::{Mark, MarkSet};
use crate::node::{Node, NodeKind, NodePath};

/// Something a conversion could not carry over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Loss {
    /// Inline marks under a tree node were flattened to plain text.
    Marks { path: NodePath },
    /// The node's `textAlign` has no flat counterpart.
    Alignment { path: NodePath },
    /// Nested children were flattened into one block.
    NestedStructure { path: NodePath },
    /// A list was split into one text block per item.
    List { path: NodePath },
    /// A block type with no tree node; kept as a linked paragraph.
    BlockType { id: BlockId, block_type: BlockType },
    /// Image width/height are not stored on blocks.
    ImageDimensions { path: NodePath },
    /// An unrecognised node kind, reduced to its text.
    UnknownKind { path: NodePath, kind: SmolStr },
    /// An unrecognised block type, reduced to its content.
    UnknownBlockType { id: BlockId, name: SmolStr },
}

fn text_children(content: &str) -> Vec<Node> {
    if content.is_empty() {
        Vec::new()
    } else {
        vec![Node::text(content)]
    }
}

fn linked_paragraph(text: &str, href: Option<&str>) -> Node {
    let children = match href.filter(|h| !h.is_empty()) {
        Some(href) if !text.is_empty() => {
            let marks: MarkSet = [Mark::link(href)].into_iter().collect();
            vec![Node::marked_text(text, marks)]
        }
        _ => text_children(text),
    };
    Node::paragraph(children)
}

fn block_to_node(block: &Block, losses: &mut Vec<Loss>) -> Option<Node> {
    let mut node = match &block.block_type {
        BlockType::Text => Node::paragraph(text_children(&block.content)),
        BlockType::Heading => Node::heading(
            i64::from(block.level.unwrap_or(crate::block::DEFAULT_HEADING_LEVEL)),
            text_children(&block.content),
        ),
        BlockType::Code => Node::code_block(block.language.as_deref(), &block.content),
        BlockType::Quote => Node::blockquote(vec![Node::paragraph(text_children(&block.content))]),
        BlockType::Divider => Node::horizontal_rule(),
        BlockType::Image => {
            let src = block.url.as_deref().filter(|u| !u.is_empty())?;
            let mut image = Node::image(src);
            image.attrs.alt = block.alt.clone();
            image
        }
        BlockType::Video => {
            losses.push(Loss::BlockType {
                id: block.id.clone(),
                block_type: block.block_type.clone(),
            });
            linked_paragraph(&block.content, block.url.as_deref())
        }
        BlockType::Button => {
            losses.push(Loss::BlockType {
                id: block.id.clone(),
                block_type: block.block_type.clone(),
            });
            match (&block.link_text, &block.link_url) {
                (Some(text), Some(url)) => linked_paragraph(text, Some(url)),
                _ => Node::paragraph(text_children(&block.content)),
            }
        }
        BlockType::Unknown(name) => {
            losses.push(Loss::UnknownBlockType {
                id: block.id.clone(),
                name: name.clone(),
            });
            Node::paragraph(text_children(&block.content))
        }
    };
    node.attrs.block_id = Some(SmolStr::new(block.id.as_str()));
    Some(node)
}

/// Build a `Doc` from flat blocks. Block ids are kept in the `blockId`
/// attribute. Images without an uploaded URL have nothing to show and are
/// skipped.
pub fn blocks_to_tree(blocks: &[Block]) -> (Node, Vec<Loss>) {
    let mut losses = Vec::new();
    let children = blocks
        .iter()
        .filter_map(|block| {
            let node = block_to_node(block, &mut losses);
            if node.is_none() {
                tracing::debug!(target: "folio::wire", id = %block.id, "skipping image without media");
            }
            node
        })
        .collect();
    (Node::doc(children), losses)
}

fn has_marks(node: &Node) -> bool {
    !node.marks.is_empty() || node.children.iter().any(has_marks)
}

fn block_id_of(node: &Node) -> BlockId {
    match &node.attrs.block_id {
        Some(id) => BlockId::from(id.clone()),
        None => BlockId::generate(),
    }
}

fn flat_block(node: &Node, block_type: BlockType, content: String) -> Block {
    let mut block = Block::with_id(block_id_of(node), block_type);
    block.content = content;
    block
}

/// Joined text of each child, one per line.
fn lines_of(node: &Node) -> String {
    node.children
        .iter()
        .map(Node::text_content)
        .collect::<Vec<_>>()
        .join("\n")
}

fn node_to_blocks(node: &Node, path: NodePath, out: &mut Vec<Block>, losses: &mut Vec<Loss>) {
    if node.attrs.text_align.is_some() {
        losses.push(Loss::Alignment { path: path.clone() });
    }
    let inline_marks = has_marks(node);
    match &node.kind {
        NodeKind::Paragraph | NodeKind::Text => {
            if inline_marks {
                losses.push(Loss::Marks { path: path.clone() });
            }
            out.push(flat_block(node, BlockType::Text, node.text_content()));
        }
        NodeKind::Heading => {
            if inline_marks {
                losses.push(Loss::Marks { path: path.clone() });
            }
            let level = match node.attrs.level {
                None => 1,
                Some(l @ 1..=3) => l as u8,
                Some(_) => 2,
            };
            let mut block = flat_block(node, BlockType::Heading, node.text_content());
            block.level = Some(level);
            out.push(block);
        }
        NodeKind::CodeBlock => {
            let mut block = flat_block(node, BlockType::Code, node.text_content());
            block.language = node.attrs.language.clone();
            out.push(block);
        }
        NodeKind::Blockquote => {
            if inline_marks {
                losses.push(Loss::Marks { path: path.clone() });
            }
            let simple = node.children.len() <= 1
                && node.children.iter().all(|c| c.kind == NodeKind::Paragraph);
            if !simple {
                losses.push(Loss::NestedStructure { path: path.clone() });
            }
            out.push(flat_block(node, BlockType::Quote, lines_of(node)));
        }
        NodeKind::BulletList | NodeKind::OrderedList => {
            losses.push(Loss::List { path: path.clone() });
            if inline_marks {
                losses.push(Loss::Marks { path: path.clone() });
            }
            for (i, item) in node.children.iter().enumerate() {
                if item.children.len() > 1 {
                    losses.push(Loss::NestedStructure { path: path.join(i) });
                }
                out.push(flat_block(item, BlockType::Text, lines_of(item)));
            }
        }
        NodeKind::ListItem => {
            losses.push(Loss::List { path: path.clone() });
            out.push(flat_block(node, BlockType::Text, lines_of(node)));
        }
        NodeKind::Image => {
            if node.attrs.width.is_some() || node.attrs.height.is_some() {
                losses.push(Loss::ImageDimensions { path: path.clone() });
            }
            let mut block = flat_block(node, BlockType::Image, String::new());
            block.url = node.attrs.src.clone();
            block.alt = node.attrs.alt.clone();
            out.push(block);
        }
        NodeKind::HorizontalRule => {
            out.push(flat_block(node, BlockType::Divider, String::new()));
        }
        NodeKind::Doc => {
            losses.push(Loss::NestedStructure { path: path.clone() });
            for (i, child) in node.children.iter().enumerate() {
                node_to_blocks(child, path.join(i), out, losses);
            }
        }
        NodeKind::Unknown(kind) => {
            losses.push(Loss::UnknownKind {
                path: path.clone(),
                kind: kind.clone(),
            });
            out.push(flat_block(node, BlockType::Text, node.text_content()));
        }
    }
}

/// Flatten a `Doc` into blocks, one per top-level node (one per item for
/// lists).
pub fn tree_to_blocks(doc: &Node) -> (Vec<Block>, Vec<Loss>) {
    let mut out = Vec::new();
    let mut losses = Vec::new();
    for (i, child) in doc.children.iter().enumerate() {
        node_to_blocks(child, NodePath::child(i), &mut out, &mut losses);
    }
    if !losses.is_empty() {
        tracing::debug!(target: "folio::wire", count = losses.len(), "tree flattened with losses");
    }
    (out, losses)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::TextAlign;

    fn block(id: &str, block_type: BlockType, content: &str) -> Block {
        let mut b = Block::with_id(id.into(), block_type);
        b.content = content.into();
        b
    }

    #[test]
    fn test_supported_blocks_round_trip_through_tree() {
        let mut heading = block("h", BlockType::Heading, "Hello");
        heading.level = Some(1);
        let mut code = block("c", BlockType::Code, "fn main() {}");
        code.language = Some("rust".into());
        let mut image = block("i", BlockType::Image, "");
        image.url = Some("https://cdn.example/a.png".into());
        image.alt = Some("a".into());
        let blocks = vec![
            heading,
            block("t", BlockType::Text, "World"),
            code,
            block("q", BlockType::Quote, "Said"),
            block("d", BlockType::Divider, ""),
            image,
        ];

        let (tree, losses) = blocks_to_tree(&blocks);
        assert!(losses.is_empty());
        assert_eq!(tree.children.len(), 6);

        let (back, losses) = tree_to_blocks(&tree);
        assert!(losses.is_empty(), "{losses:?}");
        assert_eq!(back, blocks);
    }

    #[test]
    fn test_video_and_button_are_reported() {
        let mut video = block("v", BlockType::Video, "https://youtu.be/dQw4w9WgXcQ");
        video.url = Some("https://www.youtube.com/embed/dQw4w9WgXcQ".into());
        let mut button = block("b", BlockType::Button, "Go - https://x.example");
        button.link_url = Some("https://x.example".into());
        button.link_text = Some("Go".into());

        let (tree, losses) = blocks_to_tree(&[video, button]);
        assert_eq!(losses.len(), 2);
        let link = &tree.children[1].children[0];
        assert_eq!(link.text_str(), "Go");
        assert_eq!(
            link.marks.get(crate::mark::MarkKind::Link),
            Some(&Mark::link("https://x.example"))
        );
    }

    #[test]
    fn test_tree_losses() {
        let bold: MarkSet = [Mark::Bold].into_iter().collect();
        let mut image = Node::image("/a.png");
        image.attrs.width = Some(100);
        let doc = Node::doc(vec![
            Node::paragraph(vec![Node::marked_text("x", bold)]).with_align(TextAlign::Center),
            Node::bullet_list(vec![
                Node::list_item(vec![Node::paragraph(vec![Node::text("one")])]),
                Node::list_item(vec![Node::paragraph(vec![Node::text("two")])]),
            ]),
            image,
        ]);

        let (blocks, losses) = tree_to_blocks(&doc);
        assert_eq!(blocks.len(), 4);
        assert_eq!(blocks[1].content, "one");
        assert_eq!(blocks[2].content, "two");
        assert_eq!(
            losses,
            vec![
                Loss::Alignment {
                    path: NodePath::child(0)
                },
                Loss::Marks {
                    path: NodePath::child(0)
                },
                Loss::List {
                    path: NodePath::child(1)
                },
                Loss::ImageDimensions {
                    path: NodePath::child(2)
                },
            ]
        );
    }

    #[test]
    fn test_heading_levels_are_clamped() {
        let doc = Node::doc(vec![
            Node::heading(7, vec![Node::text("a")]),
            Node {
                attrs: Default::default(),
                ..Node::heading(1, vec![Node::text("b")])
            },
        ]);
        let (blocks, _) = tree_to_blocks(&doc);
        assert_eq!(blocks[0].level, Some(2));
        assert_eq!(blocks[1].level, Some(1));
    }
}
