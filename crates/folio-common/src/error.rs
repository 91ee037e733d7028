//! Error types shared by the model, the renderer and the editor.

use miette::Diagnostic;
use smol_str::SmolStr;

use crate::document::DocumentId;

/// Malformed user input for a block or document field. Recovered locally:
/// the offending edit is not committed.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum ValidationError {
    #[error("not a recognised YouTube or Vimeo URL: {url}")]
    #[diagnostic(
        code(folio::validation::video_url),
        help("paste a youtube.com/watch?v=…, youtu.be/… or vimeo.com/… link")
    )]
    UnrecognizedVideoUrl { url: String },

    #[error("a button needs both a link URL and link text")]
    #[diagnostic(code(folio::validation::button_fields))]
    MissingButtonFields,

    #[error("the image has no uploaded media yet")]
    #[diagnostic(code(folio::validation::missing_media))]
    MissingMediaUrl,

    #[error("at most {max} tags are allowed, got {count}")]
    #[diagnostic(code(folio::validation::too_many_tags))]
    TooManyTags { count: usize, max: usize },

    #[error("tags cannot be empty")]
    #[diagnostic(code(folio::validation::empty_tag))]
    EmptyTag,
}

/// Failure reported by the external document or media store.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum StoreError {
    #[error("document not found: {id}")]
    #[diagnostic(code(folio::store::not_found))]
    NotFound { id: DocumentId },

    #[error("store failure: {0}")]
    #[diagnostic(code(folio::store::failure))]
    Failure(SmolStr),
}

impl StoreError {
    pub fn failure(reason: impl Into<SmolStr>) -> Self {
        StoreError::Failure(reason.into())
    }

    /// Short reason suitable for an autosave status line.
    pub fn reason(&self) -> SmolStr {
        match self {
            StoreError::NotFound { id } => smol_str::format_smolstr!("not found: {}", id),
            StoreError::Failure(reason) => reason.clone(),
        }
    }
}

/// A persisted body that is not one of the two accepted wire shapes.
#[derive(thiserror::Error, Debug, Diagnostic)]
pub enum WireError {
    #[error(transparent)]
    #[diagnostic(code(folio::wire::json))]
    Json(#[from] serde_json::Error),

    #[error("body must be a JSON array (flat) or object (tree), got {found}")]
    #[diagnostic(code(folio::wire::shape))]
    UnexpectedShape { found: &'static str },
}
