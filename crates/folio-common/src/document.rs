//! The document aggregate: metadata plus a body in either content model.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::block::{Block, BlockType};
use crate::error::ValidationError;
use crate::node::Node;

/// Title stored when the user has not typed one.
pub const UNTITLED: &str = "Untitled";

/// Maximum number of tags on a document.
pub const MAX_TAGS: usize = 5;

/// Identity assigned by the store on first create.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(SmolStr);

impl DocumentId {
    pub fn new(id: impl Into<SmolStr>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque reference to the author, owned by the identity collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthorId(SmolStr);

impl AuthorId {
    pub fn new(id: impl Into<SmolStr>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublishState {
    #[default]
    Draft,
    Published,
}

/// Lower-cased, trimmed, de-duplicated tags in the order they were added.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<SmolStr>", into = "Vec<SmolStr>")]
pub struct Tags(Vec<SmolStr>);

impl Tags {
    /// Normalize user-supplied tags, rejecting empty ones and more than
    /// [`MAX_TAGS`] distinct tags.
    pub fn parse<I, S>(raw: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut tags: Vec<SmolStr> = Vec::new();
        for tag in raw {
            let normalized = SmolStr::new(tag.as_ref().trim().to_lowercase());
            if normalized.is_empty() {
                return Err(ValidationError::EmptyTag);
            }
            if !tags.contains(&normalized) {
                tags.push(normalized);
            }
        }
        if tags.len() > MAX_TAGS {
            return Err(ValidationError::TooManyTags {
                count: tags.len(),
                max: MAX_TAGS,
            });
        }
        Ok(Self(tags))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(SmolStr::as_str)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.0.iter().any(|t| t == tag)
    }
}

impl From<Vec<SmolStr>> for Tags {
    /// Stored tags are normalized the same way, keeping the first
    /// [`MAX_TAGS`] valid ones.
    fn from(raw: Vec<SmolStr>) -> Self {
        let mut tags: Vec<SmolStr> = Vec::new();
        for tag in raw {
            let normalized = SmolStr::new(tag.trim().to_lowercase());
            if normalized.is_empty() || tags.contains(&normalized) {
                continue;
            }
            if tags.len() == MAX_TAGS {
                tracing::warn!(target: "folio::wire", tag = %normalized, "dropping tag beyond limit");
                continue;
            }
            tags.push(normalized);
        }
        Self(tags)
    }
}

impl From<Tags> for Vec<SmolStr> {
    fn from(tags: Tags) -> Self {
        tags.0
    }
}

/// Article body in one of the two content models.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Body {
    Tree(Node),
    Blocks(Vec<Block>),
}

impl Body {
    pub fn empty_blocks() -> Self {
        Body::Blocks(Vec::new())
    }

    pub fn empty_tree() -> Self {
        Body::Tree(Node::doc(Vec::new()))
    }

    /// Starter content for a brand new article.
    pub fn placeholder_blocks() -> Self {
        let mut heading = Block::heading(1, "Welcome to your new blog");
        heading.normalize();
        Body::Blocks(vec![
            heading,
            Block::text("Start writing your awesome content here..."),
        ])
    }

    /// Starter content for a brand new rich-text article.
    pub fn placeholder_tree() -> Self {
        Body::Tree(Node::doc(vec![
            Node::heading(1, vec![Node::text("Welcome to your new blog")]),
            Node::paragraph(vec![Node::text(
                "Start writing your awesome content here...",
            )]),
        ]))
    }

    pub fn as_blocks(&self) -> Option<&[Block]> {
        match self {
            Body::Blocks(blocks) => Some(blocks),
            Body::Tree(_) => None,
        }
    }

    pub fn as_blocks_mut(&mut self) -> Option<&mut Vec<Block>> {
        match self {
            Body::Blocks(blocks) => Some(blocks),
            Body::Tree(_) => None,
        }
    }

    pub fn as_tree(&self) -> Option<&Node> {
        match self {
            Body::Tree(node) => Some(node),
            Body::Blocks(_) => None,
        }
    }

    pub fn as_tree_mut(&mut self) -> Option<&mut Node> {
        match self {
            Body::Tree(node) => Some(node),
            Body::Blocks(_) => None,
        }
    }

    /// "tree" or "blocks", for diagnostics.
    pub fn shape_name(&self) -> &'static str {
        match self {
            Body::Tree(_) => "tree",
            Body::Blocks(_) => "blocks",
        }
    }

    pub fn find_block(&self, block_type: &BlockType) -> Option<&Block> {
        self.as_blocks()?
            .iter()
            .find(|b| &b.block_type == block_type)
    }
}

impl<'de> Deserialize<'de> for Body {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        crate::wire::body_from_value(value).map_err(de::Error::custom)
    }
}

/// Aggregate root for one article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Absent until the store assigns one on first create.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<DocumentId>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub tags: Tags,
    #[serde(default)]
    pub publish_state: PublishState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub author_id: AuthorId,
    pub body: Body,
}

impl Document {
    pub fn new(author_id: AuthorId, body: Body, now: DateTime<Utc>) -> Self {
        Self {
            id: None,
            title: String::new(),
            tags: Tags::default(),
            publish_state: PublishState::Draft,
            created_at: now,
            updated_at: now,
            author_id,
            body,
        }
    }

    /// An unsaved draft with no content at all.
    pub fn blank(author_id: AuthorId, now: DateTime<Utc>) -> Self {
        Self::new(author_id, Body::empty_blocks(), now)
    }

    /// An unsaved draft with the starter heading and paragraph.
    pub fn starter(author_id: AuthorId, now: DateTime<Utc>) -> Self {
        Self::new(author_id, Body::placeholder_blocks(), now)
    }

    /// Advance `updated_at`, never moving it backwards.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        if now > self.updated_at {
            self.updated_at = now;
        }
    }

    /// The title to persist: the placeholder when the user left it blank.
    pub fn title_or_placeholder(&self) -> &str {
        let trimmed = self.title.trim();
        if trimmed.is_empty() { UNTITLED } else { trimmed }
    }

    pub fn is_published(&self) -> bool {
        self.publish_state == PublishState::Published
    }

    pub fn can_publish(&self) -> bool {
        !self.tags.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_tags_normalize() {
        let tags = Tags::parse(["Rust", " rust ", "WASM"]).unwrap();
        assert_eq!(tags.iter().collect::<Vec<_>>(), vec!["rust", "wasm"]);
    }

    #[test]
    fn test_tags_limit() {
        let err = Tags::parse(["a", "b", "c", "d", "e", "f"]).unwrap_err();
        assert_eq!(err, ValidationError::TooManyTags { count: 6, max: 5 });
        // duplicates do not count towards the limit
        assert!(Tags::parse(["a", "b", "c", "d", "e", "A"]).is_ok());
        assert_eq!(Tags::parse(["ok", "  "]), Err(ValidationError::EmptyTag));
    }

    #[test]
    fn test_stored_tags_are_normalized() {
        let tags: Tags = serde_json::from_str(r#"["A","a","b","c","d","e","f"]"#).unwrap();
        assert_eq!(tags.len(), MAX_TAGS);
        assert!(tags.contains("a"));
        assert!(!tags.contains("f"));
    }

    #[test]
    fn test_touch_is_monotonic() {
        let mut doc = Document::blank(AuthorId::new("u1"), at(100));
        doc.touch(at(200));
        assert_eq!(doc.updated_at, at(200));
        doc.touch(at(150));
        assert_eq!(doc.updated_at, at(200));
    }

    #[test]
    fn test_title_placeholder() {
        let mut doc = Document::blank(AuthorId::new("u1"), at(0));
        assert_eq!(doc.title_or_placeholder(), UNTITLED);
        doc.title = "  My post ".into();
        assert_eq!(doc.title_or_placeholder(), "My post");
    }

    #[test]
    fn test_starter_body() {
        let doc = Document::starter(AuthorId::new("u1"), at(0));
        let blocks = doc.body.as_blocks().unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].block_type, BlockType::Heading);
        assert_eq!(blocks[0].level, Some(1));
        assert_eq!(blocks[1].block_type, BlockType::Text);
    }
}
