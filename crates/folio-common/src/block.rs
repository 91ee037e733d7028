//! Flat block model used by the per-block editor.

use std::fmt;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Stable identifier of a block within its document. Never changes once
/// assigned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(SmolStr);

impl BlockId {
    /// A fresh random (v4 UUID) id.
    pub fn generate() -> Self {
        Self(SmolStr::new(uuid::Uuid::new_v4().to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for BlockId {
    fn from(s: &str) -> Self {
        Self(SmolStr::new(s))
    }
}

impl From<SmolStr> for BlockId {
    fn from(s: SmolStr) -> Self {
        Self(s)
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The fixed set of block types. Unknown names survive a round trip and
/// render through the fallback.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "SmolStr", into = "SmolStr")]
pub enum BlockType {
    Text,
    Heading,
    Image,
    Video,
    Button,
    Code,
    Quote,
    Divider,
    Unknown(SmolStr),
}

impl BlockType {
    pub const ALL: [BlockType; 8] = [
        BlockType::Text,
        BlockType::Heading,
        BlockType::Image,
        BlockType::Video,
        BlockType::Button,
        BlockType::Code,
        BlockType::Quote,
        BlockType::Divider,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            BlockType::Text => "text",
            BlockType::Heading => "heading",
            BlockType::Image => "image",
            BlockType::Video => "video",
            BlockType::Button => "button",
            BlockType::Code => "code",
            BlockType::Quote => "quote",
            BlockType::Divider => "divider",
            BlockType::Unknown(name) => name.as_str(),
        }
    }

    /// Multi-line types commit with Ctrl+Enter; the rest with Enter.
    pub fn is_multiline(&self) -> bool {
        matches!(self, BlockType::Text | BlockType::Code | BlockType::Quote)
    }
}

impl From<SmolStr> for BlockType {
    fn from(name: SmolStr) -> Self {
        match name.as_str() {
            "text" => BlockType::Text,
            "heading" => BlockType::Heading,
            "image" => BlockType::Image,
            "video" => BlockType::Video,
            "button" => BlockType::Button,
            "code" => BlockType::Code,
            "quote" => BlockType::Quote,
            "divider" => BlockType::Divider,
            _ => BlockType::Unknown(name),
        }
    }
}

impl From<BlockType> for SmolStr {
    fn from(ty: BlockType) -> Self {
        match ty {
            BlockType::Unknown(name) => name,
            other => SmolStr::new(other.as_str()),
        }
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Default level of a freshly inserted heading block.
pub const DEFAULT_HEADING_LEVEL: u8 = 2;

/// Default language of a code block committed without one.
pub const DEFAULT_CODE_LANGUAGE: &str = "javascript";

/// One self-contained unit of flat content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub id: BlockId,
    #[serde(rename = "type")]
    pub block_type: BlockType,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<SmolStr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<SmolStr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<SmolStr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_url: Option<SmolStr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_text: Option<SmolStr>,
}

impl Block {
    /// An empty block of `block_type` with a fresh id.
    pub fn new(block_type: BlockType) -> Self {
        Self::with_id(BlockId::generate(), block_type)
    }

    pub fn with_id(id: BlockId, block_type: BlockType) -> Self {
        let level = (block_type == BlockType::Heading).then_some(DEFAULT_HEADING_LEVEL);
        Self {
            id,
            block_type,
            content: String::new(),
            url: None,
            alt: None,
            level,
            language: None,
            link_url: None,
            link_text: None,
        }
    }

    pub fn text(content: impl Into<String>) -> Self {
        let mut block = Self::new(BlockType::Text);
        block.content = content.into();
        block
    }

    pub fn heading(level: u8, content: impl Into<String>) -> Self {
        let mut block = Self::new(BlockType::Heading);
        block.level = Some(level);
        block.content = content.into();
        block
    }

    /// Whether the block has nothing to show yet. An image only counts as
    /// non-empty once it has a resolved media URL.
    pub fn is_empty(&self) -> bool {
        match self.block_type {
            BlockType::Image | BlockType::Video => self.url.as_deref().is_none_or(str::is_empty),
            BlockType::Button => {
                self.link_url.as_deref().is_none_or(str::is_empty)
                    || self.link_text.as_deref().is_none_or(str::is_empty)
            }
            BlockType::Divider => false,
            _ => self.content.is_empty(),
        }
    }

    /// Merge a partial update. The id and type never change through a patch.
    pub fn apply(&mut self, patch: &BlockPatch) {
        if let Some(content) = &patch.content {
            self.content.clone_from(content);
        }
        if let Some(url) = &patch.url {
            self.url = Some(url.clone());
        }
        if let Some(alt) = &patch.alt {
            // An empty alt clears the field so renderers fall back to their default.
            self.alt = (!alt.is_empty()).then(|| alt.clone());
        }
        if let Some(level) = patch.level {
            self.level = Some(level);
        }
        if let Some(language) = &patch.language {
            self.language = Some(language.clone());
        }
        if let Some(link_url) = &patch.link_url {
            self.link_url = Some(link_url.clone());
        }
        if let Some(link_text) = &patch.link_text {
            self.link_text = Some(link_text.clone());
        }
        self.normalize();
    }

    /// Drop fields that carry no meaning for this block's type.
    pub fn normalize(&mut self) {
        let ty = &self.block_type;
        if !matches!(ty, BlockType::Heading | BlockType::Unknown(_)) {
            self.level = None;
        }
        if !matches!(ty, BlockType::Code | BlockType::Unknown(_)) {
            self.language = None;
        }
        if !matches!(
            ty,
            BlockType::Image | BlockType::Video | BlockType::Unknown(_)
        ) {
            self.url = None;
        }
        if !matches!(ty, BlockType::Image | BlockType::Unknown(_)) {
            self.alt = None;
        }
        if !matches!(ty, BlockType::Button | BlockType::Unknown(_)) {
            self.link_url = None;
            self.link_text = None;
        }
    }
}

/// Partial update of a block. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<SmolStr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<SmolStr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<SmolStr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_url: Option<SmolStr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_text: Option<SmolStr>,
}

impl BlockPatch {
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Default::default()
        }
    }

    pub fn with_level(mut self, level: u8) -> Self {
        self.level = Some(level);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
