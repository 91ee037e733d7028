//! Hosted-video URL recognition.

use std::sync::LazyLock;

use regex::Regex;
use smol_str::{SmolStr, format_smolstr};

use crate::error::ValidationError;

static YOUTUBE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(https?://)?(www\.)?(youtube\.com|youtu\.be)/(watch\?v=)?(?P<id>[a-zA-Z0-9_-]{11})$")
        .unwrap()
});

static VIMEO_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(https?://)?(www\.)?vimeo\.com/(?P<id>\d+)$").unwrap());

static EMBED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^https://(www\.youtube\.com/embed/[a-zA-Z0-9_-]{11}|player\.vimeo\.com/video/\d+)$",
    )
    .unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoProvider {
    YouTube,
    Vimeo,
}

/// A recognised video link and the URL to embed it with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoEmbed {
    pub provider: VideoProvider,
    pub video_id: SmolStr,
    pub embed_url: SmolStr,
}

/// Recognise a YouTube or Vimeo link. Surrounding whitespace is ignored.
pub fn parse_video_url(input: &str) -> Result<VideoEmbed, ValidationError> {
    let url = input.trim();
    if let Some(caps) = YOUTUBE_RE.captures(url) {
        let id = &caps["id"];
        return Ok(VideoEmbed {
            provider: VideoProvider::YouTube,
            video_id: SmolStr::new(id),
            embed_url: format_smolstr!("https://www.youtube.com/embed/{}", id),
        });
    }
    if let Some(caps) = VIMEO_RE.captures(url) {
        let id = &caps["id"];
        return Ok(VideoEmbed {
            provider: VideoProvider::Vimeo,
            video_id: SmolStr::new(id),
            embed_url: format_smolstr!("https://player.vimeo.com/video/{}", id),
        });
    }
    Err(ValidationError::UnrecognizedVideoUrl {
        url: url.to_owned(),
    })
}

/// Whether `url` is an embed URL as produced by [`parse_video_url`].
pub fn is_embed_url(url: &str) -> bool {
    EMBED_RE.is_match(url)
}
