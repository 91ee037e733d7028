//! Error types for editor commands and configuration.

use folio_common::{BlockId, NodePath, StoreError, ValidationError};
use miette::Diagnostic;
use thiserror::Error;

use crate::session::SessionState;

/// A command the session refused. The working document is unchanged.
#[derive(Debug, Error, Diagnostic, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("command not accepted while the session is {state:?}")]
    #[diagnostic(code(folio::command::invalid_state))]
    InvalidState { state: SessionState },

    #[error("no block with id {id}")]
    #[diagnostic(code(folio::command::unknown_block))]
    UnknownBlock { id: BlockId },

    #[error("command needs a {expected} body but the document holds {found}")]
    #[diagnostic(
        code(folio::command::body_mismatch),
        help("convert the body explicitly before using this command")
    )]
    BodyMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("no node at {path}")]
    #[diagnostic(code(folio::command::bad_path))]
    BadPath { path: NodePath },

    #[error("node at {path} does not hold inline text")]
    #[diagnostic(code(folio::command::not_textblock))]
    NotTextblock { path: NodePath },

    #[error("range {start}..{end} is outside the {len} characters of the text")]
    #[diagnostic(code(folio::command::bad_range))]
    BadRange { start: usize, end: usize, len: usize },

    #[error("block {id} is not a text or heading block")]
    #[diagnostic(code(folio::command::not_text_block))]
    NotTextBlock { id: BlockId },

    #[error("block {id} cannot hold media")]
    #[diagnostic(code(folio::command::not_media))]
    NotMediaBlock { id: BlockId },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Validation(#[from] ValidationError),

    #[error("media upload failed")]
    #[diagnostic(code(folio::command::media))]
    Media(#[source] StoreError),

    #[error("could not load the document")]
    #[diagnostic(code(folio::command::load))]
    Load(#[source] StoreError),
}

/// Invalid editor configuration.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("invalid configuration value for {var}: {message}")]
    #[diagnostic(code(folio::config::invalid))]
    Invalid { var: &'static str, message: String },
}
