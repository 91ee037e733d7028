//! Contracts for the external persistence and media collaborators.
//!
//! The engine never talks to a backend directly. Hosts implement these
//! traits over whatever remote store they use.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::document::{Body, Document, DocumentId, PublishState, Tags};
use crate::error::StoreError;

/// Partial update sent with `update_document`. `None` fields are untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Tags>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish_state: Option<PublishState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Body>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl DocumentPatch {
    /// Every editable field of `document`, as written by a save.
    pub fn snapshot(document: &Document, excerpt: impl Into<String>) -> Self {
        Self {
            title: Some(document.title.clone()),
            tags: Some(document.tags.clone()),
            publish_state: Some(document.publish_state),
            body: Some(document.body.clone()),
            excerpt: Some(excerpt.into()),
            updated_at: Some(document.updated_at),
        }
    }

    /// Merge into a stored document, as a store would.
    pub fn apply_to(&self, document: &mut Document) {
        if let Some(title) = &self.title {
            document.title.clone_from(title);
        }
        if let Some(tags) = &self.tags {
            document.tags = tags.clone();
        }
        if let Some(state) = self.publish_state {
            document.publish_state = state;
        }
        if let Some(body) = &self.body {
            document.body = body.clone();
        }
        if let Some(updated_at) = self.updated_at {
            document.touch(updated_at);
        }
    }
}

/// A file picked by the user, not yet uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaUpload {
    pub file_name: SmolStr,
    pub content_type: SmolStr,
    pub data: Bytes,
}

/// Document persistence. Last write wins; no version checks.
#[allow(async_fn_in_trait)]
pub trait DocumentStore {
    async fn load_document(&self, id: &DocumentId) -> Result<Document, StoreError>;

    /// Persist a document that has no id yet. The returned document carries
    /// the identity the store assigned.
    async fn create_document(
        &self,
        document: &Document,
        excerpt: &str,
    ) -> Result<Document, StoreError>;

    async fn update_document(
        &self,
        id: &DocumentId,
        patch: &DocumentPatch,
    ) -> Result<Document, StoreError>;
}

/// Uploads media and returns the public URL to store on a block.
#[allow(async_fn_in_trait)]
pub trait MediaResolver {
    async fn resolve_media_upload(&self, upload: &MediaUpload) -> Result<SmolStr, StoreError>;
}
