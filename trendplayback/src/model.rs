use std::fmt;
use std::time::Duration;

/// Identifies one media element: the owning post and the media's position
/// in that post's media list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MediaKey {
    pub post_id: i64,
    pub media_id: i64,
}

impl MediaKey {
    pub fn new(post_id: i64, media_id: i64) -> Self {
        Self { post_id, media_id }
    }
}

impl fmt::Display for MediaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.post_id, self.media_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Image,
    Video,
}

/// Layout of an item in viewport coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LayoutRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl LayoutRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }
}

/// One entry of a scroll-visibility report
#[derive(Debug, Clone, PartialEq)]
pub struct ViewToken {
    pub post_id: i64,
    /// Missing until the list has measured the item
    pub layout: Option<LayoutRect>,
    pub is_viewable: bool,
}

impl ViewToken {
    pub fn new(post_id: i64, layout: LayoutRect) -> Self {
        Self {
            post_id,
            layout: Some(layout),
            is_viewable: true,
        }
    }

    pub fn hidden(post_id: i64, layout: LayoutRect) -> Self {
        Self {
            post_id,
            layout: Some(layout),
            is_viewable: false,
        }
    }
}

/// Size of the window the scrolling container lives in
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Thresholds a scrolling container applies before it reports an item as
/// viewable. The coordinator exposes them but never evaluates them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewabilityConfig {
    pub min_visible_percent: u8,
    pub min_view_time: Duration,
}

impl Default for ViewabilityConfig {
    fn default() -> Self {
        Self {
            min_visible_percent: 50,
            min_view_time: Duration::from_millis(300),
        }
    }
}

/// Observable coordinator transitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackEvent {
    /// A media became the single playing one
    Activated(MediaKey),
    /// Nothing is active anymore
    Deactivated,
    PlaybackAllowed(bool),
}
