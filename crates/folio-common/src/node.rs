//! Rich content tree.
//!
//! The tree is deliberately permissive: stored content from newer or buggy
//! clients (unknown kinds, unknown attributes, misplaced children) still
//! deserializes, and [`Node::malformation`] tells the renderer which nodes need
//! the inert fallback.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use smol_str::SmolStr;

use crate::mark::MarkSet;

/// Kind of a tree node. Unknown names are preserved for forward compatibility.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "SmolStr", into = "SmolStr")]
pub enum NodeKind {
    Doc,
    Paragraph,
    Heading,
    BulletList,
    OrderedList,
    ListItem,
    Blockquote,
    CodeBlock,
    Image,
    HorizontalRule,
    Text,
    Unknown(SmolStr),
}

impl NodeKind {
    pub fn as_str(&self) -> &str {
        match self {
            NodeKind::Doc => "Doc",
            NodeKind::Paragraph => "Paragraph",
            NodeKind::Heading => "Heading",
            NodeKind::BulletList => "BulletList",
            NodeKind::OrderedList => "OrderedList",
            NodeKind::ListItem => "ListItem",
            NodeKind::Blockquote => "Blockquote",
            NodeKind::CodeBlock => "CodeBlock",
            NodeKind::Image => "Image",
            NodeKind::HorizontalRule => "HorizontalRule",
            NodeKind::Text => "Text",
            NodeKind::Unknown(name) => name.as_str(),
        }
    }

    /// The kind of a node stored without one.
    pub fn missing() -> Self {
        NodeKind::Unknown(SmolStr::default())
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, NodeKind::Unknown(name) if name.is_empty())
    }

    /// Nodes that hold inline text children directly.
    pub fn is_textblock(&self) -> bool {
        matches!(
            self,
            NodeKind::Paragraph | NodeKind::Heading | NodeKind::CodeBlock
        )
    }

    /// Kinds that never have children.
    pub fn is_leaf(&self) -> bool {
        matches!(
            self,
            NodeKind::Text | NodeKind::Image | NodeKind::HorizontalRule
        )
    }
}

impl From<SmolStr> for NodeKind {
    fn from(name: SmolStr) -> Self {
        // The camelCase spellings are what the previous editor stored.
        match name.as_str() {
            "Doc" | "doc" => NodeKind::Doc,
            "Paragraph" | "paragraph" => NodeKind::Paragraph,
            "Heading" | "heading" => NodeKind::Heading,
            "BulletList" | "bulletList" => NodeKind::BulletList,
            "OrderedList" | "orderedList" => NodeKind::OrderedList,
            "ListItem" | "listItem" => NodeKind::ListItem,
            "Blockquote" | "blockquote" => NodeKind::Blockquote,
            "CodeBlock" | "codeBlock" => NodeKind::CodeBlock,
            "Image" | "image" => NodeKind::Image,
            "HorizontalRule" | "horizontalRule" => NodeKind::HorizontalRule,
            "Text" | "text" => NodeKind::Text,
            _ => NodeKind::Unknown(name),
        }
    }
}

impl From<NodeKind> for SmolStr {
    fn from(kind: NodeKind) -> Self {
        match kind {
            NodeKind::Unknown(name) => name,
            other => SmolStr::new(other.as_str()),
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

impl TextAlign {
    pub fn as_str(self) -> &'static str {
        match self {
            TextAlign::Left => "left",
            TextAlign::Center => "center",
            TextAlign::Right => "right",
        }
    }
}

/// Pull `key` out of `raw` as a `T`. A value of the wrong shape is left in
/// `raw`, so it is written back unchanged and the typed field stays empty.
fn take_attr<T: DeserializeOwned>(raw: &mut BTreeMap<String, Value>, key: &str) -> Option<T> {
    let value = raw.remove(key)?;
    if value.is_null() {
        return None;
    }
    match T::deserialize(&value) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            tracing::warn!(target: "folio::wire", key, value = %value, error = %e, "keeping unreadable attribute as stored");
            raw.insert(key.to_string(), value);
            None
        }
    }
}

/// Node attributes. Only the keys a kind understands are interpreted; any other
/// key, and any known key whose value has the wrong shape, survives a round
/// trip through `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeAttrs {
    /// Heading level as stored. May be out of range; the renderer clamps.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<SmolStr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<SmolStr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_align: Option<TextAlign>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<SmolStr>,
    /// Id of the flat block this node was converted from, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_id: Option<SmolStr>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl<'de> Deserialize<'de> for NodeAttrs {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut raw = match Value::deserialize(deserializer)? {
            Value::Object(map) => map.into_iter().collect::<BTreeMap<_, _>>(),
            Value::Null => BTreeMap::new(),
            other => {
                tracing::warn!(target: "folio::wire", value = %other, "ignoring attrs that are not an object");
                BTreeMap::new()
            }
        };
        Ok(Self {
            level: take_attr(&mut raw, "level"),
            src: take_attr(&mut raw, "src"),
            alt: take_attr(&mut raw, "alt"),
            width: take_attr(&mut raw, "width"),
            height: take_attr(&mut raw, "height"),
            text_align: take_attr(&mut raw, "textAlign"),
            language: take_attr(&mut raw, "language"),
            block_id: take_attr(&mut raw, "blockId"),
            extra: raw,
        })
    }
}

impl NodeAttrs {
    pub fn is_empty(&self) -> bool {
        self.level.is_none()
            && self.src.is_none()
            && self.alt.is_none()
            && self.width.is_none()
            && self.height.is_none()
            && self.text_align.is_none()
            && self.language.is_none()
            && self.block_id.is_none()
            && self.extra.is_empty()
    }
}

/// One node of the content tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// A node stored without a kind reads as an unnamed unknown kind and is
    /// written back without one.
    #[serde(default = "NodeKind::missing", skip_serializing_if = "NodeKind::is_missing")]
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "NodeAttrs::is_empty")]
    pub attrs: NodeAttrs,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
    #[serde(default, skip_serializing_if = "MarkSet::is_empty")]
    pub marks: MarkSet,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<SmolStr>,
}

/// Why a node cannot be rendered as its kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Malformation {
    /// A Text node with children.
    TextWithChildren,
    /// A leaf kind (image, rule) with children.
    LeafWithChildren,
    /// An image without a source.
    ImageWithoutSource,
    /// Marks on something other than text.
    MarksOnContainer,
    /// A Doc anywhere but the root.
    NestedDoc,
}

/// Child-index path from the root `Doc`. The empty path is the root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct NodePath(pub Vec<usize>);

impl NodePath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn child(index: usize) -> Self {
        Self(vec![index])
    }

    pub fn join(&self, index: usize) -> Self {
        let mut path = self.0.clone();
        path.push(index);
        Self(path)
    }

    /// Split into the parent path and the last index.
    pub fn split_last(&self) -> Option<(NodePath, usize)> {
        let (last, parent) = self.0.split_last()?;
        Some((NodePath(parent.to_vec()), *last))
    }
}

impl From<Vec<usize>> for NodePath {
    fn from(v: Vec<usize>) -> Self {
        Self(v)
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("/")?;
        for (i, idx) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{}", idx)?;
        }
        Ok(())
    }
}

impl Node {
    fn container(kind: NodeKind, children: Vec<Node>) -> Self {
        Self {
            kind,
            attrs: NodeAttrs::default(),
            children,
            marks: MarkSet::new(),
            text: None,
        }
    }

    pub fn doc(children: Vec<Node>) -> Self {
        Self::container(NodeKind::Doc, children)
    }

    pub fn paragraph(children: Vec<Node>) -> Self {
        Self::container(NodeKind::Paragraph, children)
    }

    pub fn heading(level: i64, children: Vec<Node>) -> Self {
        let mut node = Self::container(NodeKind::Heading, children);
        node.attrs.level = Some(level);
        node
    }

    pub fn bullet_list(items: Vec<Node>) -> Self {
        Self::container(NodeKind::BulletList, items)
    }

    pub fn ordered_list(items: Vec<Node>) -> Self {
        Self::container(NodeKind::OrderedList, items)
    }

    pub fn list_item(children: Vec<Node>) -> Self {
        Self::container(NodeKind::ListItem, children)
    }

    pub fn blockquote(children: Vec<Node>) -> Self {
        Self::container(NodeKind::Blockquote, children)
    }

    pub fn code_block(language: Option<&str>, code: &str) -> Self {
        let children = if code.is_empty() {
            Vec::new()
        } else {
            vec![Node::text(code)]
        };
        let mut node = Self::container(NodeKind::CodeBlock, children);
        node.attrs.language = language.map(SmolStr::new);
        node
    }

    pub fn image(src: impl Into<SmolStr>) -> Self {
        let mut node = Self::container(NodeKind::Image, Vec::new());
        node.attrs.src = Some(src.into());
        node
    }

    pub fn horizontal_rule() -> Self {
        Self::container(NodeKind::HorizontalRule, Vec::new())
    }

    pub fn text(text: impl Into<SmolStr>) -> Self {
        Self {
            kind: NodeKind::Text,
            attrs: NodeAttrs::default(),
            children: Vec::new(),
            marks: MarkSet::new(),
            text: Some(text.into()),
        }
    }

    pub fn marked_text(text: impl Into<SmolStr>, marks: MarkSet) -> Self {
        let mut node = Self::text(text);
        node.marks = marks;
        node
    }

    pub fn with_align(mut self, align: TextAlign) -> Self {
        self.attrs.text_align = Some(align);
        self
    }

    pub fn is_text(&self) -> bool {
        self.kind == NodeKind::Text
    }

    /// Text of this leaf, or empty for containers.
    pub fn text_str(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }

    /// Concatenated text of every descendant leaf.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        if let Some(text) = &self.text {
            out.push_str(text);
        }
        for child in &self.children {
            child.collect_text(out);
        }
    }

    pub fn node_at(&self, path: &NodePath) -> Option<&Node> {
        path.0
            .iter()
            .try_fold(self, |node, &idx| node.children.get(idx))
    }

    pub fn node_at_mut(&mut self, path: &NodePath) -> Option<&mut Node> {
        path.0
            .iter()
            .try_fold(self, |node, &idx| node.children.get_mut(idx))
    }

    /// Check this node in isolation. `is_root` is true only for the tree root.
    pub fn malformation(&self, is_root: bool) -> Option<Malformation> {
        match &self.kind {
            NodeKind::Doc if !is_root => Some(Malformation::NestedDoc),
            NodeKind::Text if !self.children.is_empty() => Some(Malformation::TextWithChildren),
            NodeKind::Text => None,
            _ if !self.marks.is_empty() => Some(Malformation::MarksOnContainer),
            NodeKind::Image if self.attrs.src.as_deref().is_none_or(str::is_empty) => {
                Some(Malformation::ImageWithoutSource)
            }
            kind if kind.is_leaf() && !self.children.is_empty() => {
                Some(Malformation::LeafWithChildren)
            }
            _ => None,
        }
    }

    /// Every malformed node in the tree, by path.
    pub fn malformations(&self) -> Vec<(NodePath, Malformation)> {
        let mut out = Vec::new();
        if self.kind != NodeKind::Doc {
            tracing::debug!(target: "folio::wire", kind = %self.kind, "tree root is not a Doc");
        }
        self.collect_malformations(&NodePath::root(), true, &mut out);
        out
    }

    fn collect_malformations(
        &self,
        path: &NodePath,
        is_root: bool,
        out: &mut Vec<(NodePath, Malformation)>,
    ) {
        if let Some(m) = self.malformation(is_root) {
            out.push((path.clone(), m));
        }
        for (i, child) in self.children.iter().enumerate() {
            child.collect_malformations(&path.join(i), false, out);
        }
    }
}
