//! Per-block edit/view toggle and draft validation.
//!
//! A [`BlockEditor`] starts in view mode. Activation copies the block into a
//! [`BlockDraft`] the host binds its inputs to; a commit gesture validates
//! the draft and yields the patch to dispatch. A draft that fails
//! validation stays in edit mode so the user can fix it.

use folio_common::block::DEFAULT_CODE_LANGUAGE;
use folio_common::{
    Block, BlockId, BlockPatch, BlockType, SmolStr, ValidationError, is_embed_url, parse_video_url,
};

/// Input that may end an edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditTrigger {
    Enter,
    CtrlEnter,
    /// Discard the draft.
    Escape,
    /// Focus left the block.
    Blur,
}

/// Editable copy of a block's fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockDraft {
    /// Text for text-like blocks; the pasted link for video.
    pub content: String,
    pub url: String,
    pub alt: String,
    pub level: Option<u8>,
    pub language: String,
    pub link_url: String,
    pub link_text: String,
}

impl BlockDraft {
    pub fn from_block(block: &Block) -> Self {
        let owned = |s: &Option<SmolStr>| s.as_deref().unwrap_or_default().to_string();
        Self {
            content: block.content.clone(),
            url: owned(&block.url),
            alt: owned(&block.alt),
            level: block.level,
            language: owned(&block.language),
            link_url: owned(&block.link_url),
            link_text: owned(&block.link_text),
        }
    }

    /// Check the draft against the rules for `block_type` and build the
    /// patch that commits it.
    pub fn validate(&self, block_type: &BlockType) -> Result<BlockPatch, ValidationError> {
        let mut patch = BlockPatch::default();
        match block_type {
            BlockType::Video => {
                let embed = parse_video_url(&self.content)?;
                patch.url = Some(embed.embed_url);
                patch.content = Some(self.content.trim().to_string());
            }
            BlockType::Button => {
                let url = self.link_url.trim();
                let text = self.link_text.trim();
                if url.is_empty() || text.is_empty() {
                    return Err(ValidationError::MissingButtonFields);
                }
                patch.content = Some(format!("{} - {}", text, url));
                patch.link_url = Some(SmolStr::new(url));
                patch.link_text = Some(SmolStr::new(text));
            }
            BlockType::Image => {
                let url = self.url.trim();
                if url.is_empty() {
                    return Err(ValidationError::MissingMediaUrl);
                }
                patch.url = Some(SmolStr::new(url));
                let alt = self.alt.trim();
                patch.alt = (!alt.is_empty()).then(|| SmolStr::new(alt));
            }
            BlockType::Code => {
                let language = match self.language.trim() {
                    "" => DEFAULT_CODE_LANGUAGE,
                    lang => lang,
                };
                patch.language = Some(SmolStr::new(language));
                patch.content = Some(self.content.clone());
            }
            BlockType::Heading => {
                patch.content = Some(self.content.clone());
                patch.level = self.level;
            }
            BlockType::Text | BlockType::Quote | BlockType::Unknown(_) => {
                patch.content = Some(self.content.clone());
            }
            BlockType::Divider => {}
        }
        Ok(patch)
    }
}

/// Check a block after an update merged into it. A video link that is not
/// yet an embed URL is converted to one. Buttons with link fields need both.
pub fn check_block(block: &mut Block) -> Result<(), ValidationError> {
    match block.block_type {
        BlockType::Video => {
            let Some(url) = block.url.as_deref().map(str::trim).filter(|u| !u.is_empty()) else {
                return Ok(());
            };
            if !is_embed_url(url) {
                let embed = parse_video_url(url)?;
                block.url = Some(embed.embed_url);
            }
        }
        BlockType::Button if block.link_url.is_some() || block.link_text.is_some() => {
            let filled = |field: &Option<SmolStr>| field.as_deref().is_some_and(|v| !v.trim().is_empty());
            if !filled(&block.link_url) || !filled(&block.link_text) {
                return Err(ValidationError::MissingButtonFields);
            }
        }
        _ => {}
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditMode {
    View,
    Editing(BlockDraft),
}

/// A validated edit ready to dispatch as an update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockCommit {
    pub id: BlockId,
    pub patch: BlockPatch,
}

/// Edit/view state of one block.
#[derive(Debug, Clone)]
pub struct BlockEditor {
    id: BlockId,
    block_type: BlockType,
    mode: EditMode,
    last_error: Option<ValidationError>,
}

impl BlockEditor {
    pub fn new(block: &Block) -> Self {
        Self {
            id: block.id.clone(),
            block_type: block.block_type.clone(),
            mode: EditMode::View,
            last_error: None,
        }
    }

    pub fn block_id(&self) -> &BlockId {
        &self.id
    }

    pub fn mode(&self) -> &EditMode {
        &self.mode
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.mode, EditMode::Editing(_))
    }

    pub fn last_error(&self) -> Option<&ValidationError> {
        self.last_error.as_ref()
    }

    /// Enter edit mode with a draft of `block`. Dividers have nothing to
    /// edit; returns whether edit mode was entered.
    pub fn activate(&mut self, block: &Block) -> bool {
        if block.block_type == BlockType::Divider {
            return false;
        }
        if !self.is_editing() {
            self.block_type = block.block_type.clone();
            self.mode = EditMode::Editing(BlockDraft::from_block(block));
            self.last_error = None;
        }
        true
    }

    pub fn draft(&self) -> Option<&BlockDraft> {
        match &self.mode {
            EditMode::Editing(draft) => Some(draft),
            EditMode::View => None,
        }
    }

    pub fn draft_mut(&mut self) -> Option<&mut BlockDraft> {
        match &mut self.mode {
            EditMode::Editing(draft) => Some(draft),
            EditMode::View => None,
        }
    }

    fn commits_on(&self, trigger: EditTrigger) -> bool {
        match trigger {
            EditTrigger::Blur | EditTrigger::CtrlEnter => true,
            EditTrigger::Enter => !self.block_type.is_multiline(),
            EditTrigger::Escape => false,
        }
    }

    /// Handle an input while editing.
    ///
    /// `Ok(None)` means nothing to dispatch: not editing, the trigger does
    /// not commit this type (Enter in a multi-line block), or the draft was
    /// discarded. A validation failure keeps the draft in edit mode.
    pub fn handle(&mut self, trigger: EditTrigger) -> Result<Option<BlockCommit>, ValidationError> {
        let Some(draft) = self.draft() else {
            return Ok(None);
        };
        if trigger == EditTrigger::Escape {
            self.mode = EditMode::View;
            self.last_error = None;
            return Ok(None);
        }
        if !self.commits_on(trigger) {
            return Ok(None);
        }
        match draft.validate(&self.block_type) {
            Ok(patch) => {
                self.mode = EditMode::View;
                self.last_error = None;
                Ok(Some(BlockCommit {
                    id: self.id.clone(),
                    patch,
                }))
            }
            Err(e) => {
                tracing::debug!(target: "folio::session", block = %self.id, error = %e, "draft rejected");
                self.last_error = Some(e.clone());
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn editing(block: &Block) -> BlockEditor {
        let mut editor = BlockEditor::new(block);
        assert!(editor.activate(block));
        editor
    }

    #[test]
    fn test_enter_commits_single_line_only() {
        let heading = Block::heading(2, "Old");
        let mut editor = editing(&heading);
        editor.draft_mut().unwrap().content = "New".into();
        let commit = editor.handle(EditTrigger::Enter).unwrap().unwrap();
        assert_eq!(commit.id, heading.id);
        assert_eq!(commit.patch.content.as_deref(), Some("New"));
        assert!(!editor.is_editing());

        let text = Block::text("para");
        let mut editor = editing(&text);
        assert_eq!(editor.handle(EditTrigger::Enter), Ok(None));
        assert!(editor.is_editing());
        assert!(editor.handle(EditTrigger::CtrlEnter).unwrap().is_some());
    }

    #[test]
    fn test_divider_has_no_edit_mode() {
        let divider = Block::new(BlockType::Divider);
        let mut editor = BlockEditor::new(&divider);
        assert!(!editor.activate(&divider));
        assert_eq!(editor.handle(EditTrigger::Blur), Ok(None));
    }

    #[test]
    fn test_video_stores_embed_and_raw_input() {
        let video = Block::new(BlockType::Video);
        let mut editor = editing(&video);
        editor.draft_mut().unwrap().content = "https://youtu.be/dQw4w9WgXcQ".into();
        let commit = editor.handle(EditTrigger::Blur).unwrap().unwrap();
        assert_eq!(
            commit.patch.url.as_deref(),
            Some("https://www.youtube.com/embed/dQw4w9WgXcQ")
        );
        assert_eq!(
            commit.patch.content.as_deref(),
            Some("https://youtu.be/dQw4w9WgXcQ")
        );
    }

    #[test]
    fn test_invalid_video_stays_in_edit_mode() {
        let video = Block::new(BlockType::Video);
        let mut editor = editing(&video);
        editor.draft_mut().unwrap().content = "https://example.com/clip.mp4".into();
        let err = editor.handle(EditTrigger::Enter).unwrap_err();
        assert!(matches!(err, ValidationError::UnrecognizedVideoUrl { .. }));
        assert!(editor.is_editing());
        assert_eq!(editor.last_error(), Some(&err));
    }

    #[test]
    fn test_button_requires_both_fields() {
        let button = Block::new(BlockType::Button);
        let mut editor = editing(&button);
        editor.draft_mut().unwrap().link_text = "Go".into();
        assert_eq!(
            editor.handle(EditTrigger::Enter),
            Err(ValidationError::MissingButtonFields)
        );
        editor.draft_mut().unwrap().link_url = " https://x.example ".into();
        let commit = editor.handle(EditTrigger::Enter).unwrap().unwrap();
        assert_eq!(commit.patch.content.as_deref(), Some("Go - https://x.example"));
    }

    #[test]
    fn test_code_language_default_and_escape() {
        let code = Block::new(BlockType::Code);
        let mut editor = editing(&code);
        editor.draft_mut().unwrap().content = "let x = 1;".into();
        let commit = editor.handle(EditTrigger::CtrlEnter).unwrap().unwrap();
        assert_eq!(commit.patch.language.as_deref(), Some("javascript"));

        editor.activate(&code);
        assert_eq!(editor.handle(EditTrigger::Escape), Ok(None));
        assert!(!editor.is_editing());
    }

    #[test]
    fn test_image_needs_media() {
        let image = Block::new(BlockType::Image);
        let mut editor = editing(&image);
        assert_eq!(
            editor.handle(EditTrigger::Enter),
            Err(ValidationError::MissingMediaUrl)
        );
    }

    #[test]
    fn test_blank_alt_is_left_unset() {
        let image = Block::new(BlockType::Image);
        let mut editor = editing(&image);
        let draft = editor.draft_mut().unwrap();
        draft.url = "/media/a.png".into();
        draft.alt = "   ".into();
        let commit = editor.handle(EditTrigger::Enter).unwrap().unwrap();
        assert_eq!(commit.patch.alt, None);

        editor.activate(&image);
        let draft = editor.draft_mut().unwrap();
        draft.url = "/media/a.png".into();
        draft.alt = " A cat ".into();
        let commit = editor.handle(EditTrigger::Enter).unwrap().unwrap();
        assert_eq!(commit.patch.alt.as_deref(), Some("A cat"));
    }

    #[test]
    fn test_check_block_rules() {
        let mut video = Block::new(BlockType::Video);
        video.url = Some("https://evil.example/x.mp4".into());
        assert!(matches!(
            check_block(&mut video),
            Err(ValidationError::UnrecognizedVideoUrl { .. })
        ));

        video.url = Some("https://vimeo.com/76979871".into());
        check_block(&mut video).unwrap();
        assert_eq!(video.url.as_deref(), Some("https://player.vimeo.com/video/76979871"));

        let mut button = Block::new(BlockType::Button);
        check_block(&mut button).unwrap();
        button.link_text = Some("Go".into());
        assert_eq!(check_block(&mut button), Err(ValidationError::MissingButtonFields));
    }
}
