//! folio-editor-core: editing logic without UI framework dependencies.
//!
//! This crate provides:
//! - `EditorSession` - the command set, publish gate and save lifecycle
//! - `AutosaveScheduler` - debounced, single in-flight autosave
//! - `BlockEditor` - per-block edit/view toggle and draft validation
//! - Reordering and drag recognition, formatting, undo history

pub mod block_edit;
pub mod clock;
pub mod config;
pub mod error;
pub mod format;
pub mod gesture;
pub mod history;
pub mod reorder;
pub mod scheduler;
pub mod session;

pub use block_edit::{BlockCommit, BlockDraft, BlockEditor, EditMode, EditTrigger};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::EditorConfig;
pub use error::{CommandError, ConfigError};
pub use format::MarkOp;
pub use gesture::{CancelReason, DragGesture, DragOutcome, DropTarget, Point, Rect};
pub use history::{History, UndoManager};
pub use reorder::{Keyed, move_by_key, reorder};
pub use scheduler::{AutosaveScheduler, AutosaveStatus, SaveId, SaveRequest};
pub use session::{
    Command, CommandOutcome, EditorSession, HeadingTarget, PublishOutcome, SaveSnapshot,
    SessionState, perform_save,
};
