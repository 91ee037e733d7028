//! folio-common: the content model shared by the renderer and the editor.
//!
//! - [`node`] and [`mark`]: the rich content tree
//! - [`block`]: the flat block model
//! - [`document`]: the document aggregate and its body
//! - [`wire`] and [`convert`]: persistence shapes and model mapping
//! - [`store`]: contracts for the external collaborators

pub mod block;
pub mod convert;
pub mod document;
pub mod error;
pub mod mark;
pub mod node;
pub mod store;
pub mod video;
pub mod wire;

pub use block::{Block, BlockId, BlockPatch, BlockType};
pub use convert::{Loss, blocks_to_tree, tree_to_blocks};
pub use document::{AuthorId, Body, Document, DocumentId, PublishState, Tags};
pub use error::{StoreError, ValidationError, WireError};
pub use mark::{Mark, MarkKind, MarkSet};
pub use node::{Malformation, Node, NodeAttrs, NodeKind, NodePath, TextAlign};
pub use smol_str::SmolStr;
pub use store::{DocumentPatch, DocumentStore, MediaResolver, MediaUpload};
pub use video::{VideoEmbed, VideoProvider, is_embed_url, parse_video_url};
