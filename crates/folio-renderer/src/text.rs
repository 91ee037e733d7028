//! Plain-text statistics derived from a rendered view.

use crate::view::ViewNode;

/// Characters kept in an excerpt.
pub const EXCERPT_CHARS: usize = 150;

/// Reading speed used for the reading-time estimate.
pub const WORDS_PER_MINUTE: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextStats {
    pub words: usize,
    pub characters: usize,
    /// Whole minutes, rounded up. Zero only for an empty document.
    pub reading_minutes: usize,
    pub excerpt: String,
}

impl TextStats {
    pub fn from_text(text: &str) -> Self {
        let words = text.split_whitespace().count();
        Self {
            words,
            characters: text.chars().count(),
            reading_minutes: words.div_ceil(WORDS_PER_MINUTE),
            excerpt: excerpt(text),
        }
    }

    pub fn from_view(view: &ViewNode) -> Self {
        Self::from_text(&view.plain_text())
    }
}

/// First [`EXCERPT_CHARS`] characters, with line breaks flattened to spaces.
pub fn excerpt(text: &str) -> String {
    text.chars()
        .take(EXCERPT_CHARS)
        .map(|c| if c == '\n' { ' ' } else { c })
        .collect()
}
