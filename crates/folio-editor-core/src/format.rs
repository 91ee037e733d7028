//! Structural and inline formatting commands on the content tree, plus the
//! heading toggle for flat blocks.

use std::ops::Range;

use folio_common::node::{Node, NodeKind, NodePath, TextAlign};
use folio_common::{Block, BlockType, Mark, MarkKind, MarkSet, SmolStr};

use crate::error::CommandError;

/// What to do with a mark over a range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkOp {
    Add(Mark),
    Remove(MarkKind),
    /// Remove when every character in the range already carries a mark of
    /// this kind, add otherwise.
    Toggle(Mark),
}

fn node_mut<'a>(doc: &'a mut Node, path: &NodePath) -> Result<&'a mut Node, CommandError> {
    doc.node_at_mut(path)
        .ok_or_else(|| CommandError::BadPath { path: path.clone() })
}

fn char_len(node: &Node) -> usize {
    if node.is_text() {
        node.text_str().chars().count()
    } else {
        0
    }
}

fn split_text(node: &Node, at: usize) -> (Node, Node) {
    let text = node.text_str();
    let byte = text.char_indices().nth(at).map_or(text.len(), |(i, _)| i);
    let mut left = node.clone();
    let mut right = node.clone();
    left.text = Some(SmolStr::new(&text[..byte]));
    right.text = Some(SmolStr::new(&text[byte..]));
    (left, right)
}

/// Split text children so that `range` falls exactly on run boundaries.
/// Returns the new children and the index range of the runs inside `range`.
fn split_runs(children: Vec<Node>, range: &Range<usize>) -> (Vec<Node>, Range<usize>) {
    let mut out = Vec::with_capacity(children.len() + 2);
    let mut first = None;
    let mut last = 0;
    let mut offset = 0;
    for child in children {
        let len = char_len(&child);
        let (start, end) = (offset, offset + len);
        offset = end;
        if !child.is_text() || end <= range.start || start >= range.end {
            out.push(child);
            continue;
        }
        let mut rest = child;
        if range.start > start {
            let (before, after) = split_text(&rest, range.start - start);
            out.push(before);
            rest = after;
        }
        let rest_start = start.max(range.start);
        if range.end < end {
            let (inside, after) = split_text(&rest, range.end - rest_start);
            first.get_or_insert(out.len());
            out.push(inside);
            last = out.len();
            out.push(after);
        } else {
            first.get_or_insert(out.len());
            out.push(rest);
            last = out.len();
        }
    }
    let first = first.unwrap_or(last);
    (out, first..last)
}

/// Join neighbouring text runs with equal mark sets and drop empty runs.
fn merge_runs(children: Vec<Node>) -> Vec<Node> {
    let mut out: Vec<Node> = Vec::with_capacity(children.len());
    for child in children {
        if child.is_text() && child.children.is_empty() && child.text_str().is_empty() {
            continue;
        }
        if let Some(prev) = out.last_mut() {
            if prev.is_text()
                && child.is_text()
                && prev.children.is_empty()
                && child.children.is_empty()
                && prev.marks.same_marks(&child.marks)
            {
                let joined = format!("{}{}", prev.text_str(), child.text_str());
                prev.text = Some(SmolStr::new(joined));
                continue;
            }
        }
        out.push(child);
    }
    out
}

fn apply_to_set(marks: &mut MarkSet, op: &MarkOp, remove: bool) {
    match op {
        MarkOp::Add(mark) => marks.insert(mark.clone()),
        MarkOp::Remove(kind) => {
            marks.remove(*kind);
        }
        MarkOp::Toggle(mark) if remove => {
            marks.remove(mark.kind());
        }
        MarkOp::Toggle(mark) => marks.insert(mark.clone()),
    }
}

/// Apply a mark operation to characters `range` of the textblock at `path`.
pub fn apply_mark(
    doc: &mut Node,
    path: &NodePath,
    range: Range<usize>,
    op: &MarkOp,
) -> Result<(), CommandError> {
    let block = node_mut(doc, path)?;
    if !block.kind.is_textblock() {
        return Err(CommandError::NotTextblock { path: path.clone() });
    }
    let len: usize = block.children.iter().map(char_len).sum();
    if range.start > range.end || range.end > len {
        return Err(CommandError::BadRange {
            start: range.start,
            end: range.end,
            len,
        });
    }
    if range.is_empty() {
        return Ok(());
    }

    let children = std::mem::take(&mut block.children);
    let (mut children, selected) = split_runs(children, &range);
    let remove = match op {
        MarkOp::Toggle(mark) => children[selected.clone()]
            .iter()
            .filter(|c| c.is_text())
            .all(|c| c.marks.contains(mark.kind())),
        _ => false,
    };
    for child in &mut children[selected] {
        if child.is_text() {
            apply_to_set(&mut child.marks, op, remove);
        }
    }
    block.children = merge_runs(children);
    tracing::debug!(target: "folio::session", %path, ?op, "applied mark");
    Ok(())
}

/// Set or clear the alignment of a block node.
pub fn set_text_align(
    doc: &mut Node,
    path: &NodePath,
    align: Option<TextAlign>,
) -> Result<(), CommandError> {
    let node = node_mut(doc, path)?;
    if node.is_text() || path.0.is_empty() {
        return Err(CommandError::BadPath { path: path.clone() });
    }
    node.attrs.text_align = align;
    Ok(())
}

/// Insert `node` as child `index` (clamped) of the node at `parent`.
/// Returns the path of the inserted node.
pub fn insert_node(
    doc: &mut Node,
    parent: &NodePath,
    index: usize,
    node: Node,
) -> Result<NodePath, CommandError> {
    let container = node_mut(doc, parent)?;
    if container.kind.is_leaf() {
        return Err(CommandError::BadPath {
            path: parent.clone(),
        });
    }
    let index = index.min(container.children.len());
    container.children.insert(index, node);
    Ok(parent.join(index))
}

/// Remove and return the node at `path`. The root cannot be removed.
pub fn remove_node(doc: &mut Node, path: &NodePath) -> Result<Node, CommandError> {
    let bad_path = || CommandError::BadPath { path: path.clone() };
    let (parent, index) = path.split_last().ok_or_else(bad_path)?;
    let container = doc.node_at_mut(&parent).ok_or_else(bad_path)?;
    if index >= container.children.len() {
        return Err(bad_path());
    }
    Ok(container.children.remove(index))
}

/// Turn a paragraph into a heading of `level`, or a heading of that same
/// level back into a paragraph.
pub fn toggle_heading_node(doc: &mut Node, path: &NodePath, level: u8) -> Result<(), CommandError> {
    let node = node_mut(doc, path)?;
    match node.kind {
        NodeKind::Heading if node.attrs.level == Some(i64::from(level)) => {
            node.kind = NodeKind::Paragraph;
            node.attrs.level = None;
        }
        NodeKind::Heading | NodeKind::Paragraph => {
            node.kind = NodeKind::Heading;
            node.attrs.level = Some(i64::from(level));
        }
        _ => return Err(CommandError::NotTextblock { path: path.clone() }),
    }
    Ok(())
}

/// Block counterpart of [`toggle_heading_node`]: text becomes a heading,
/// a heading of the same level becomes text. Other block types are refused.
pub fn toggle_heading_block(block: &mut Block, level: u8) -> Result<(), CommandError> {
    match block.block_type {
        BlockType::Heading if block.level == Some(level) => {
            block.block_type = BlockType::Text;
        }
        BlockType::Text | BlockType::Heading => {
            block.block_type = BlockType::Heading;
            block.level = Some(level);
        }
        _ => {
            return Err(CommandError::NotTextBlock {
                id: block.id.clone(),
            });
        }
    }
    block.normalize();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn para(children: Vec<Node>) -> Node {
        Node::doc(vec![Node::paragraph(children)])
    }

    fn marks(list: &[Mark]) -> MarkSet {
        list.iter().cloned().collect()
    }

    fn first_para(doc: &Node) -> &Node {
        &doc.children[0]
    }

    #[test]
    fn test_bold_middle_of_run() {
        let mut doc = para(vec![Node::text("Hello world")]);
        apply_mark(&mut doc, &NodePath::child(0), 6..11, &MarkOp::Add(Mark::Bold)).unwrap();
        assert_eq!(
            first_para(&doc).children,
            vec![
                Node::text("Hello "),
                Node::marked_text("world", marks(&[Mark::Bold])),
            ]
        );
    }

    #[test]
    fn test_remove_merges_runs() {
        let mut doc = para(vec![
            Node::text("a"),
            Node::marked_text("b", marks(&[Mark::Italic])),
            Node::text("c"),
        ]);
        apply_mark(
            &mut doc,
            &NodePath::child(0),
            0..3,
            &MarkOp::Remove(MarkKind::Italic),
        )
        .unwrap();
        assert_eq!(first_para(&doc).children, vec![Node::text("abc")]);
    }

    #[test]
    fn test_toggle_removes_when_fully_marked() {
        let mut doc = para(vec![Node::marked_text("bold", marks(&[Mark::Bold]))]);
        let path = NodePath::child(0);
        apply_mark(&mut doc, &path, 0..4, &MarkOp::Toggle(Mark::Bold)).unwrap();
        assert_eq!(first_para(&doc).children, vec![Node::text("bold")]);

        apply_mark(&mut doc, &path, 1..3, &MarkOp::Toggle(Mark::Bold)).unwrap();
        assert_eq!(
            first_para(&doc).children,
            vec![
                Node::text("b"),
                Node::marked_text("ol", marks(&[Mark::Bold])),
                Node::text("d"),
            ]
        );
    }

    #[test]
    fn test_toggle_partially_marked_adds() {
        let mut doc = para(vec![
            Node::marked_text("ab", marks(&[Mark::Bold])),
            Node::text("cd"),
        ]);
        apply_mark(&mut doc, &NodePath::child(0), 0..4, &MarkOp::Toggle(Mark::Bold)).unwrap();
        assert_eq!(
            first_para(&doc).children,
            vec![Node::marked_text("abcd", marks(&[Mark::Bold]))]
        );
    }

    #[test]
    fn test_range_spanning_multibyte_text() {
        let mut doc = para(vec![Node::text("héllo")]);
        apply_mark(&mut doc, &NodePath::child(0), 1..2, &MarkOp::Add(Mark::Code)).unwrap();
        assert_eq!(
            first_para(&doc).children,
            vec![
                Node::text("h"),
                Node::marked_text("é", marks(&[Mark::Code])),
                Node::text("llo"),
            ]
        );
    }

    #[test]
    fn test_mark_errors() {
        let mut doc = Node::doc(vec![Node::paragraph(vec![Node::text("abc")]), Node::horizontal_rule()]);
        assert_eq!(
            apply_mark(&mut doc, &NodePath::child(0), 2..9, &MarkOp::Add(Mark::Bold)),
            Err(CommandError::BadRange {
                start: 2,
                end: 9,
                len: 3
            })
        );
        assert_eq!(
            apply_mark(&mut doc, &NodePath::child(1), 0..0, &MarkOp::Add(Mark::Bold)),
            Err(CommandError::NotTextblock {
                path: NodePath::child(1)
            })
        );
        assert!(matches!(
            apply_mark(&mut doc, &NodePath::child(7), 0..1, &MarkOp::Add(Mark::Bold)),
            Err(CommandError::BadPath { .. })
        ));
    }

    #[test]
    fn test_insert_and_remove_nodes() {
        let mut doc = Node::doc(vec![Node::paragraph(vec![])]);
        let path = insert_node(&mut doc, &NodePath::root(), 99, Node::horizontal_rule()).unwrap();
        assert_eq!(path, NodePath::child(1));
        let removed = remove_node(&mut doc, &NodePath::child(0)).unwrap();
        assert_eq!(removed.kind, NodeKind::Paragraph);
        assert_eq!(doc.children, vec![Node::horizontal_rule()]);
        assert!(remove_node(&mut doc, &NodePath::root()).is_err());
        assert!(insert_node(&mut doc, &NodePath::child(0), 0, Node::text("x")).is_err());
    }

    #[test]
    fn test_heading_toggles() {
        let mut doc = Node::doc(vec![Node::paragraph(vec![Node::text("t")])]);
        let path = NodePath::child(0);
        toggle_heading_node(&mut doc, &path, 2).unwrap();
        assert_eq!(doc.children[0].kind, NodeKind::Heading);
        assert_eq!(doc.children[0].attrs.level, Some(2));
        toggle_heading_node(&mut doc, &path, 2).unwrap();
        assert_eq!(doc.children[0].kind, NodeKind::Paragraph);
        assert_eq!(doc.children[0].attrs.level, None);

        let mut block = Block::text("x");
        toggle_heading_block(&mut block, 1).unwrap();
        assert_eq!((block.block_type.clone(), block.level), (BlockType::Heading, Some(1)));
        toggle_heading_block(&mut block, 3).unwrap();
        assert_eq!(block.level, Some(3));
        toggle_heading_block(&mut block, 3).unwrap();
        assert_eq!((block.block_type, block.level), (BlockType::Text, None));
    }

    #[test]
    fn test_heading_toggle_refuses_media_blocks() {
        let mut image = Block::new(BlockType::Image);
        image.url = Some("/media/a.png".into());
        let before = image.clone();
        assert_eq!(
            toggle_heading_block(&mut image, 2),
            Err(CommandError::NotTextBlock { id: image.id.clone() })
        );
        assert_eq!(image, before);
    }

    #[test]
    fn test_align() {
        let mut doc = Node::doc(vec![Node::paragraph(vec![Node::text("t")])]);
        set_text_align(&mut doc, &NodePath::child(0), Some(TextAlign::Center)).unwrap();
        assert_eq!(doc.children[0].attrs.text_align, Some(TextAlign::Center));
        assert!(set_text_align(&mut doc, &NodePath::from(vec![0, 0]), None).is_err());
    }
}
