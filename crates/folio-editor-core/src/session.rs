//! The editor session: one working document, its command set, its undo
//! history and its autosave.
//!
//! The session is an explicit value; every command takes `&mut self`, so
//! commands never interleave. Persistence is sans-IO at the core:
//! [`EditorSession::poll_save`] hands out a [`SaveRequest`] ticket and
//! [`EditorSession::complete_save`] takes the store's answer. Commands may
//! keep arriving while a ticket is outstanding. The async helpers
//! ([`EditorSession::flush`], [`EditorSession::save_to`],
//! [`EditorSession::publish_to`]) drive the tickets against a
//! [`DocumentStore`] for hosts that just want to await a save.

use std::ops::Range;

use folio_common::block::DEFAULT_CODE_LANGUAGE;
use folio_common::{
    Block, BlockId, BlockPatch, BlockType, Body, Document, DocumentId, DocumentPatch,
    DocumentStore, MediaResolver, MediaUpload, Node, NodePath, PublishState, StoreError, Tags,
    TextAlign, ValidationError,
};
use folio_renderer::{RenderMode, TextStats, ViewNode, body_stats, render_body};
use web_time::Instant;

use crate::block_edit::{BlockEditor, EditTrigger, check_block};
use crate::clock::{Clock, SystemClock};
use crate::config::EditorConfig;
use crate::error::CommandError;
use crate::format::{self, MarkOp};
use crate::gesture::{CancelReason, DragGesture, DragOutcome, DropTarget, Point};
use crate::history::{History, UndoManager};
use crate::reorder::{move_by_key, reorder};
use crate::scheduler::{AutosaveScheduler, AutosaveStatus, SaveId, SaveRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// No document yet.
    Empty,
    Loading,
    /// Open with nothing unsaved.
    Ready,
    /// Open with unsaved changes.
    Editing,
    /// A save ticket is outstanding.
    Saving,
    /// Publish succeeded. Terminal.
    Published,
    /// Torn down. Terminal.
    Closed,
}

impl SessionState {
    pub fn accepts_commands(self) -> bool {
        matches!(self, Self::Ready | Self::Editing | Self::Saving)
    }
}

/// What `toggleHeadingLevel` should act on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeadingTarget {
    Block(BlockId),
    Node(NodePath),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Insert an empty block at `position` (clamped), or at the end.
    InsertBlock {
        block_type: BlockType,
        position: Option<usize>,
    },
    UpdateBlock {
        id: BlockId,
        patch: BlockPatch,
    },
    RemoveBlock {
        id: BlockId,
    },
    Reorder {
        from: usize,
        to: usize,
    },
    /// Move block `id` into the slot block `over` holds now.
    MoveBlock {
        id: BlockId,
        over: BlockId,
    },
    SetTitle(String),
    SetTags(Vec<String>),
    ApplyMark {
        path: NodePath,
        range: Range<usize>,
        op: MarkOp,
    },
    ToggleHeadingLevel {
        target: HeadingTarget,
        level: u8,
    },
    SetTextAlign {
        path: NodePath,
        align: Option<TextAlign>,
    },
    InsertNode {
        parent: NodePath,
        index: usize,
        node: Node,
    },
    RemoveNode {
        path: NodePath,
    },
    Undo,
    Redo,
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::InsertBlock { .. } => "insert_block",
            Command::UpdateBlock { .. } => "update_block",
            Command::RemoveBlock { .. } => "remove_block",
            Command::Reorder { .. } => "reorder",
            Command::MoveBlock { .. } => "move_block",
            Command::SetTitle(_) => "set_title",
            Command::SetTags(_) => "set_tags",
            Command::ApplyMark { .. } => "apply_mark",
            Command::ToggleHeadingLevel { .. } => "toggle_heading_level",
            Command::SetTextAlign { .. } => "set_text_align",
            Command::InsertNode { .. } => "insert_node",
            Command::RemoveNode { .. } => "remove_node",
            Command::Undo => "undo",
            Command::Redo => "redo",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Applied,
    BlockInserted(BlockId),
    NodeInserted(NodePath),
    /// Accepted, but the document already looked like that.
    Unchanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// The document has no tags. The caller should collect some and retry.
    TagsRequired,
    /// A publishing save was queued ahead of any debounce.
    Submitted,
}

/// Everything one save writes.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveSnapshot {
    /// The document as it should be stored, title placeholder applied.
    pub document: Document,
    pub excerpt: String,
    /// Mutation sequence the snapshot reflects.
    pub seq: u64,
    /// Whether this save publishes the document.
    pub publish: bool,
}

impl SaveSnapshot {
    /// A snapshot without an id must be created; anything else is an update.
    pub fn is_create(&self) -> bool {
        self.document.id.is_none()
    }

    pub fn patch(&self) -> DocumentPatch {
        DocumentPatch::snapshot(&self.document, self.excerpt.as_str())
    }
}

/// Write `snapshot` to `store`: create when it has no id, update otherwise.
pub async fn perform_save<S: DocumentStore>(
    store: &S,
    snapshot: &SaveSnapshot,
) -> Result<Document, StoreError> {
    match &snapshot.document.id {
        None => {
            store
                .create_document(&snapshot.document, &snapshot.excerpt)
                .await
        }
        Some(id) => store.update_document(id, &snapshot.patch()).await,
    }
}

#[derive(Debug, Clone, Copy)]
struct InFlight {
    id: SaveId,
    seq: u64,
    publish: bool,
}

pub struct EditorSession<C = SystemClock> {
    config: EditorConfig,
    clock: C,
    state: SessionState,
    document: Option<Document>,
    scheduler: AutosaveScheduler<SaveSnapshot>,
    history: History<Body>,
    /// Accepted commands so far.
    seq: u64,
    /// Command seq of the last mutation.
    mutation_seq: u64,
    /// Highest mutation seq known to be stored.
    saved_seq: u64,
    in_flight: Option<InFlight>,
    /// A publishing snapshot is waiting in the scheduler.
    waiting_publish: bool,
    last_validation_error: Option<ValidationError>,
}

impl EditorSession<SystemClock> {
    pub fn new(config: EditorConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> EditorSession<C> {
    pub fn with_clock(config: EditorConfig, clock: C) -> Self {
        Self {
            scheduler: AutosaveScheduler::new(config.autosave_delay),
            history: History::new(config.history_limit),
            config,
            clock,
            state: SessionState::Empty,
            document: None,
            seq: 0,
            mutation_seq: 0,
            saved_seq: 0,
            in_flight: None,
            waiting_publish: false,
            last_validation_error: None,
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    pub fn block(&self, id: &BlockId) -> Option<&Block> {
        self.document
            .as_ref()?
            .body
            .as_blocks()?
            .iter()
            .find(|b| &b.id == id)
    }

    /// Whether some mutation has not been stored yet.
    pub fn is_dirty(&self) -> bool {
        self.mutation_seq > self.saved_seq
    }

    pub fn autosave_status(&self) -> &AutosaveStatus {
        self.scheduler.status()
    }

    pub fn last_applied_command_seq(&self) -> u64 {
        self.seq
    }

    pub fn last_validation_error(&self) -> Option<&ValidationError> {
        self.last_validation_error.as_ref()
    }

    /// When the host should next call [`poll_save`](Self::poll_save).
    pub fn next_deadline(&self) -> Option<Instant> {
        self.scheduler.next_deadline()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Word and character counts of the reader view.
    pub fn stats(&self) -> TextStats {
        self.document
            .as_ref()
            .map(|doc| body_stats(&doc.body))
            .unwrap_or_default()
    }

    pub fn render(&self, mode: RenderMode) -> Option<ViewNode> {
        self.document
            .as_ref()
            .map(|doc| render_body(&doc.body, mode))
    }

    fn ensure_state(&self, allowed: &[SessionState]) -> Result<(), CommandError> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(CommandError::InvalidState { state: self.state })
        }
    }

    fn ensure_accepting(&self) -> Result<(), CommandError> {
        if self.state.accepts_commands() && self.document.is_some() {
            Ok(())
        } else {
            Err(CommandError::InvalidState { state: self.state })
        }
    }

    fn reset_for(&mut self, document: Document) {
        self.document = Some(document);
        self.history.clear_history();
        self.mutation_seq = self.seq;
        self.saved_seq = self.seq;
        self.last_validation_error = None;
        self.state = SessionState::Ready;
    }

    /// Open a document that is already in memory, such as a fresh
    /// [`Document::starter`].
    pub fn open(&mut self, document: Document) -> Result<(), CommandError> {
        self.ensure_state(&[SessionState::Empty])?;
        tracing::debug!(target: "folio::session", id = ?document.id, "opened document");
        self.reset_for(document);
        Ok(())
    }

    pub fn begin_load(&mut self) -> Result<(), CommandError> {
        self.ensure_state(&[SessionState::Empty])?;
        self.state = SessionState::Loading;
        Ok(())
    }

    /// Finish a load started with [`begin_load`](Self::begin_load). A
    /// failed load returns the session to `Empty`.
    pub fn finish_load(&mut self, result: Result<Document, StoreError>) -> Result<(), CommandError> {
        self.ensure_state(&[SessionState::Loading])?;
        match result {
            Ok(document) => {
                tracing::debug!(target: "folio::session", id = ?document.id, "loaded document");
                self.reset_for(document);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(target: "folio::session", error = %e, "load failed");
                self.state = SessionState::Empty;
                Err(CommandError::Load(e))
            }
        }
    }

    pub async fn load<S: DocumentStore>(
        &mut self,
        store: &S,
        id: &DocumentId,
    ) -> Result<(), CommandError> {
        self.begin_load()?;
        let result = store.load_document(id).await;
        self.finish_load(result)
    }

    /// Tear the session down. The pending deadline is cancelled and the
    /// result of a save already in flight will be ignored.
    pub fn close(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        if self.is_dirty() {
            tracing::warn!(target: "folio::session", "closing with unsaved changes");
        }
        self.scheduler.cancel();
        self.in_flight = None;
        self.waiting_publish = false;
        self.state = SessionState::Closed;
    }

    /// Apply one command to the working document.
    ///
    /// A rejected command leaves the document untouched. Validation
    /// failures are also kept as the last validation error.
    pub fn apply(&mut self, command: Command) -> Result<CommandOutcome, CommandError> {
        self.ensure_accepting()?;
        let name = command.name();
        let result = self.dispatch(command);
        self.finish_command(name, result)
    }

    fn finish_command(
        &mut self,
        name: &'static str,
        result: Result<(CommandOutcome, bool), CommandError>,
    ) -> Result<CommandOutcome, CommandError> {
        match result {
            Ok((outcome, mutated)) => {
                self.seq += 1;
                if mutated {
                    self.after_mutation();
                }
                tracing::debug!(target: "folio::session", command = name, seq = self.seq, mutated, "command applied");
                Ok(outcome)
            }
            Err(e) => {
                tracing::debug!(target: "folio::session", command = name, error = %e, "command rejected");
                if let CommandError::Validation(v) = &e {
                    self.last_validation_error = Some(v.clone());
                }
                Err(e)
            }
        }
    }

    fn dispatch(&mut self, command: Command) -> Result<(CommandOutcome, bool), CommandError> {
        match command {
            Command::InsertBlock {
                block_type,
                position,
            } => {
                let mut block = Block::new(block_type);
                if block.block_type == BlockType::Code {
                    block.language = Some(DEFAULT_CODE_LANGUAGE.into());
                }
                self.edit_body(|body| {
                    let blocks = blocks_mut(body)?;
                    let at = position.unwrap_or(blocks.len()).min(blocks.len());
                    let id = block.id.clone();
                    blocks.insert(at, block);
                    Ok(CommandOutcome::BlockInserted(id))
                })
            }
            Command::UpdateBlock { id, patch } => self.edit_body(|body| {
                let block = find_block_mut(body, &id)?;
                block.apply(&patch);
                check_block(block)?;
                Ok(CommandOutcome::Applied)
            }),
            Command::RemoveBlock { id } => self.edit_body(|body| {
                let blocks = blocks_mut(body)?;
                let index = blocks
                    .iter()
                    .position(|b| b.id == id)
                    .ok_or(CommandError::UnknownBlock { id })?;
                blocks.remove(index);
                Ok(CommandOutcome::Applied)
            }),
            Command::Reorder { from, to } => self.edit_body(|body| {
                let blocks = blocks_mut(body)?;
                *blocks = reorder(blocks, from, to);
                Ok(CommandOutcome::Applied)
            }),
            Command::MoveBlock { id, over } => self.edit_body(|body| {
                let blocks = blocks_mut(body)?;
                let to = blocks
                    .iter()
                    .position(|b| b.id == over)
                    .ok_or(CommandError::UnknownBlock { id: over })?;
                if !move_by_key(blocks, &id, to) {
                    return Err(CommandError::UnknownBlock { id });
                }
                Ok(CommandOutcome::Applied)
            }),
            Command::SetTitle(title) => {
                let doc = self.working_mut()?;
                if doc.title == title {
                    return Ok((CommandOutcome::Unchanged, false));
                }
                doc.title = title;
                Ok((CommandOutcome::Applied, true))
            }
            Command::SetTags(raw) => {
                let tags = Tags::parse(&raw)?;
                let doc = self.working_mut()?;
                if doc.tags == tags {
                    return Ok((CommandOutcome::Unchanged, false));
                }
                doc.tags = tags;
                Ok((CommandOutcome::Applied, true))
            }
            Command::ApplyMark { path, range, op } => self.edit_body(|body| {
                format::apply_mark(tree_mut(body)?, &path, range, &op)?;
                Ok(CommandOutcome::Applied)
            }),
            Command::ToggleHeadingLevel { target, level } => {
                let level = level.clamp(1, 3);
                self.edit_body(|body| {
                    match &target {
                        HeadingTarget::Block(id) => {
                            format::toggle_heading_block(find_block_mut(body, id)?, level)?
                        }
                        HeadingTarget::Node(path) => {
                            format::toggle_heading_node(tree_mut(body)?, path, level)?
                        }
                    }
                    Ok(CommandOutcome::Applied)
                })
            }
            Command::SetTextAlign { path, align } => self.edit_body(|body| {
                format::set_text_align(tree_mut(body)?, &path, align)?;
                Ok(CommandOutcome::Applied)
            }),
            Command::InsertNode {
                parent,
                index,
                node,
            } => self.edit_body(|body| {
                let path = format::insert_node(tree_mut(body)?, &parent, index, node)?;
                Ok(CommandOutcome::NodeInserted(path))
            }),
            Command::RemoveNode { path } => self.edit_body(|body| {
                format::remove_node(tree_mut(body)?, &path)?;
                Ok(CommandOutcome::Applied)
            }),
            Command::Undo => {
                let Some(doc) = self.document.as_mut() else {
                    return Err(CommandError::InvalidState { state: self.state });
                };
                if self.history.undo(&mut doc.body) {
                    Ok((CommandOutcome::Applied, true))
                } else {
                    Ok((CommandOutcome::Unchanged, false))
                }
            }
            Command::Redo => {
                let Some(doc) = self.document.as_mut() else {
                    return Err(CommandError::InvalidState { state: self.state });
                };
                if self.history.redo(&mut doc.body) {
                    Ok((CommandOutcome::Applied, true))
                } else {
                    Ok((CommandOutcome::Unchanged, false))
                }
            }
        }
    }

    fn working_mut(&mut self) -> Result<&mut Document, CommandError> {
        let state = self.state;
        self.document
            .as_mut()
            .ok_or(CommandError::InvalidState { state })
    }

    /// Run `edit` on the body and record the previous body for undo if it
    /// changed. On error the body is restored.
    fn edit_body(
        &mut self,
        edit: impl FnOnce(&mut Body) -> Result<CommandOutcome, CommandError>,
    ) -> Result<(CommandOutcome, bool), CommandError> {
        let state = self.state;
        let Some(doc) = self.document.as_mut() else {
            return Err(CommandError::InvalidState { state });
        };
        let before = doc.body.clone();
        match edit(&mut doc.body) {
            Ok(outcome) if doc.body == before => {
                let outcome = match outcome {
                    CommandOutcome::Applied => CommandOutcome::Unchanged,
                    other => other,
                };
                Ok((outcome, false))
            }
            Ok(outcome) => {
                self.history.record(before);
                Ok((outcome, true))
            }
            Err(e) => {
                doc.body = before;
                Err(e)
            }
        }
    }

    fn after_mutation(&mut self) {
        self.mutation_seq = self.seq;
        let now = self.clock.utc_now();
        if let Some(doc) = self.document.as_mut() {
            doc.touch(now);
        }
        if self.state == SessionState::Ready {
            self.state = SessionState::Editing;
        }
        if let Some(snapshot) = self.snapshot(false) {
            self.scheduler.schedule(snapshot, self.clock.now());
        }
    }

    /// The document as a save should write it now. A publish that is
    /// already waiting stays a publish.
    fn snapshot(&self, publish: bool) -> Option<SaveSnapshot> {
        let doc = self.document.as_ref()?;
        let publish = publish || self.waiting_publish;
        let mut document = doc.clone();
        document.title = doc.title_or_placeholder().to_string();
        if publish {
            document.publish_state = PublishState::Published;
        }
        Some(SaveSnapshot {
            excerpt: body_stats(&doc.body).excerpt,
            document,
            seq: self.mutation_seq,
            publish,
        })
    }

    /// Commit the block editor's draft on `trigger` and dispatch the
    /// resulting update. A rejected draft is recorded as the last
    /// validation error and the editor stays in edit mode.
    pub fn commit_edit(
        &mut self,
        editor: &mut BlockEditor,
        trigger: EditTrigger,
    ) -> Result<CommandOutcome, CommandError> {
        self.ensure_accepting()?;
        match editor.handle(trigger) {
            Ok(Some(commit)) => {
                self.last_validation_error = None;
                self.apply(Command::UpdateBlock {
                    id: commit.id,
                    patch: commit.patch,
                })
            }
            Ok(None) => Ok(CommandOutcome::Unchanged),
            Err(e) => {
                self.last_validation_error = Some(e.clone());
                Err(e.into())
            }
        }
    }

    /// Start dragging block `id` with the configured activation distance.
    pub fn begin_drag(&self, id: BlockId, pointer: Point) -> DragGesture<BlockId> {
        DragGesture::begin(id, pointer, self.config.drag_activation_px)
    }

    /// Release a drag and move the dragged block, if the drag describes a
    /// move. The blocks are matched by id against the current document, so
    /// edits made while the drag was in progress do not shift the move. The
    /// returned indices are positions in the current document.
    pub fn finish_drag(
        &mut self,
        gesture: DragGesture<BlockId>,
        pointer: Point,
        targets: &[DropTarget<BlockId>],
    ) -> Result<DragOutcome, CommandError> {
        self.ensure_accepting()?;
        let active = gesture.active().clone();
        let outcome = gesture.release(pointer, targets);
        let DragOutcome::Reorder { to, .. } = outcome else {
            return Ok(outcome);
        };
        let Some(over) = targets.get(to).map(|t| t.key.clone()) else {
            return Ok(DragOutcome::Cancelled(CancelReason::OutsideTargets));
        };
        let position = |id: &BlockId| {
            self.document
                .as_ref()
                .and_then(|d| d.body.as_blocks())
                .and_then(|blocks| blocks.iter().position(|b| &b.id == id))
        };
        let Some(from) = position(&active) else {
            return Ok(DragOutcome::Cancelled(CancelReason::ActiveGone));
        };
        let Some(to) = position(&over) else {
            return Ok(DragOutcome::Cancelled(CancelReason::OutsideTargets));
        };
        if from == to {
            return Ok(DragOutcome::Cancelled(CancelReason::SameSlot));
        }
        self.apply(Command::MoveBlock { id: active, over })?;
        Ok(DragOutcome::Reorder { from, to })
    }

    /// Queue an immediate save. Nothing is queued for a stored document
    /// with no unsaved changes.
    pub fn save(&mut self) -> Result<(), CommandError> {
        self.ensure_accepting()?;
        let stored = self.document.as_ref().is_some_and(|d| d.id.is_some());
        if stored && !self.is_dirty() && !self.waiting_publish {
            tracing::debug!(target: "folio::session", "save skipped; nothing to write");
            return Ok(());
        }
        if let Some(snapshot) = self.snapshot(false) {
            self.scheduler.save_now(snapshot);
        }
        self.seq += 1;
        Ok(())
    }

    /// Publish the document, or report that tags must be collected first.
    pub fn publish(&mut self) -> Result<PublishOutcome, CommandError> {
        self.ensure_accepting()?;
        let has_tags = self.document.as_ref().is_some_and(Document::can_publish);
        if !has_tags {
            tracing::info!(target: "folio::session", "publish needs at least one tag");
            return Ok(PublishOutcome::TagsRequired);
        }
        if let Some(snapshot) = self.snapshot(true) {
            self.scheduler.save_now(snapshot);
            self.waiting_publish = true;
        }
        self.seq += 1;
        tracing::info!(target: "folio::session", "publish submitted");
        Ok(PublishOutcome::Submitted)
    }

    /// The next save ticket, if one is due and none is outstanding.
    ///
    /// Call this when [`next_deadline`](Self::next_deadline) passes, after
    /// [`save`](Self::save) or [`publish`](Self::publish), and after every
    /// [`complete_save`](Self::complete_save).
    pub fn poll_save(&mut self) -> Option<SaveRequest<SaveSnapshot>> {
        if !matches!(
            self.state,
            SessionState::Ready
                | SessionState::Editing
                | SessionState::Saving
                | SessionState::Published
        ) {
            return None;
        }
        let request = self.scheduler.poll(self.clock.now())?;
        if request.snapshot.publish {
            self.waiting_publish = false;
        }
        self.in_flight = Some(InFlight {
            id: request.id,
            seq: request.snapshot.seq,
            publish: request.snapshot.publish,
        });
        if self.state != SessionState::Published {
            self.state = SessionState::Saving;
        }
        tracing::debug!(
            target: "folio::session",
            id = %request.id,
            create = request.snapshot.is_create(),
            publish = request.snapshot.publish,
            "save ticket issued"
        );
        Some(request)
    }

    /// Report the store's answer for ticket `id`. Answers for tickets the
    /// session no longer tracks (after [`close`](Self::close)) are ignored.
    pub fn complete_save(&mut self, id: SaveId, result: Result<Document, StoreError>) {
        let Some(flight) = self.in_flight.filter(|f| f.id == id) else {
            tracing::debug!(target: "folio::session", %id, "ignoring result of untracked save");
            return;
        };
        self.in_flight = None;

        match result {
            Ok(stored) => {
                self.scheduler.complete(id, Ok(self.clock.utc_now()));
                self.saved_seq = self.saved_seq.max(flight.seq);
                if let Some(doc) = self.document.as_mut() {
                    if doc.id.is_none() {
                        if let Some(assigned) = &stored.id {
                            tracing::info!(target: "folio::session", id = %assigned, "document created");
                        }
                        doc.id = stored.id;
                    }
                    if flight.publish {
                        doc.publish_state = PublishState::Published;
                    }
                }

                // Waiting snapshots were taken before the answer arrived.
                let assigned = self.document.as_ref().and_then(|d| d.id.clone());
                let saved_seq = self.saved_seq;
                let published = flight.publish;
                self.scheduler.retain_waiting(|snapshot| {
                    if snapshot.document.id.is_none() {
                        snapshot.document.id = assigned;
                    }
                    if published {
                        snapshot.document.publish_state = PublishState::Published;
                    }
                    snapshot.publish || snapshot.seq > saved_seq
                });

                if flight.publish {
                    self.state = SessionState::Published;
                }
            }
            Err(e) => {
                self.scheduler.complete(id, Err(e.reason()));
            }
        }

        if self.state == SessionState::Saving {
            self.state = if self.is_dirty() {
                SessionState::Editing
            } else {
                SessionState::Ready
            };
        }
    }

    /// Perform every save that is ready now, one at a time.
    pub async fn flush<S: DocumentStore>(&mut self, store: &S) {
        while let Some(request) = self.poll_save() {
            let result = perform_save(store, &request.snapshot).await;
            self.complete_save(request.id, result);
        }
    }

    /// [`save`](Self::save) and wait for it. The outcome is reflected in
    /// [`autosave_status`](Self::autosave_status).
    pub async fn save_to<S: DocumentStore>(&mut self, store: &S) -> Result<(), CommandError> {
        self.save()?;
        self.flush(store).await;
        Ok(())
    }

    /// [`publish`](Self::publish) and wait for it. On success the session
    /// is `Published`.
    pub async fn publish_to<S: DocumentStore>(
        &mut self,
        store: &S,
    ) -> Result<PublishOutcome, CommandError> {
        let outcome = self.publish()?;
        if outcome == PublishOutcome::Submitted {
            self.flush(store).await;
        }
        Ok(outcome)
    }

    /// Upload media through `resolver` and store the URL on the image or
    /// video block `id`.
    pub async fn attach_media<M: MediaResolver>(
        &mut self,
        resolver: &M,
        id: &BlockId,
        upload: &MediaUpload,
    ) -> Result<CommandOutcome, CommandError> {
        self.ensure_accepting()?;
        let block = self
            .block(id)
            .ok_or_else(|| CommandError::UnknownBlock { id: id.clone() })?;
        if !matches!(block.block_type, BlockType::Image | BlockType::Video) {
            return Err(CommandError::NotMediaBlock { id: id.clone() });
        }
        let url = resolver
            .resolve_media_upload(upload)
            .await
            .map_err(CommandError::Media)?;
        tracing::debug!(target: "folio::session", block = %id, %url, "media attached");
        // Uploaded media is hosted by the resolver, so the video link rules
        // applied to `UpdateBlock` do not hold here.
        let patch = BlockPatch {
            url: Some(url),
            ..Default::default()
        };
        let result = self.edit_body(|body| {
            find_block_mut(body, id)?.apply(&patch);
            Ok(CommandOutcome::Applied)
        });
        self.finish_command("attach_media", result)
    }
}

fn blocks_mut(body: &mut Body) -> Result<&mut Vec<Block>, CommandError> {
    let found = body.shape_name();
    body.as_blocks_mut().ok_or(CommandError::BodyMismatch {
        expected: "blocks",
        found,
    })
}

fn tree_mut(body: &mut Body) -> Result<&mut Node, CommandError> {
    let found = body.shape_name();
    body.as_tree_mut().ok_or(CommandError::BodyMismatch {
        expected: "tree",
        found,
    })
}

fn find_block_mut<'a>(body: &'a mut Body, id: &BlockId) -> Result<&'a mut Block, CommandError> {
    blocks_mut(body)?
        .iter_mut()
        .find(|b| &b.id == id)
        .ok_or_else(|| CommandError::UnknownBlock { id: id.clone() })
}
