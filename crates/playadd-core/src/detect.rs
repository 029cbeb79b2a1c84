use regex::Regex;

use crate::models::TabState;

/// Default pattern matching a YouTube watch URL (note the "/watch?").
pub const DEFAULT_VIDEO_URL_PATTERN: &str = r"^https://www\.youtube\.com/watch\?";

/// Decides whether a tab URL counts as watching a video, and folds tab
/// update events into per-tab state.
#[derive(Debug, Clone)]
pub struct VideoDetector {
    pattern: Regex,
}

impl VideoDetector {
    pub fn new() -> Self {
        Self::with_pattern(DEFAULT_VIDEO_URL_PATTERN)
            .expect("default video URL pattern is valid")
    }

    /// Build a detector from a user-supplied pattern (config override).
    pub fn with_pattern(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
        })
    }

    pub fn is_video_url(&self, url: &str) -> bool {
        self.pattern.is_match(url)
    }

    /// Fold one tab update event into the previous tab state.
    ///
    /// URL and title changes arrive as separate events, so an absent field
    /// leaves the prior value alone. The title is only recorded while the
    /// tab is on a video page; navigating away discards it.
    pub fn observe(&self, prev: &TabState, url: Option<&str>, title: Option<&str>) -> TabState {
        let mut next = prev.clone();

        if let Some(url) = url {
            next.is_watching_video = self.is_video_url(url);
            if !next.is_watching_video {
                next.video_title = None;
            }
        }

        if let Some(title) = title {
            if next.is_watching_video {
                next.video_title = Some(title.to_string());
            }
        }

        next
    }
}

impl Default for VideoDetector {
    fn default() -> Self {
        Self::new()
    }
}
