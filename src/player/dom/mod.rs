//! Host page access. The page belongs to someone else and its markup can
//! change at any time, so every lookup goes through ordered selector lists
//! and every read degrades to `None`.

pub mod page;
pub mod reader;
pub mod seek;

pub use page::{Markup, PageEvent, SimulatedPage};
pub use reader::PlayerReader;
pub use seek::SeekActuator;

use crate::error::DomError;

pub mod selectors {
    pub const POSITION: &[&str] = &[
        r#"[data-testid="playback-position"]"#,
        ".playback-bar__progress-time-elapsed",
    ];

    pub const DURATION: &[&str] = &[
        r#"[data-testid="playback-duration"]"#,
        ".playback-bar__progress-time-total",
    ];

    pub const TRACK_NAME: &[&str] = &[
        r#"[data-testid="context-item-link"]"#,
        r#"[data-testid="context-item-info-title"]"#,
        ".Root__now-playing-widget .track-info__name a",
        ".now-playing .track-info__name",
    ];

    pub const PLAY_PAUSE: &str = r#"[data-testid="control-button-playpause"]"#;
    pub const PLAY_PAUSE_LABEL: &str = "aria-label";

    /// Accessible labels the play/pause control carries while playing.
    pub const PAUSE_KEYWORDS: &[&str] = &["Pause", "一時停止", "Pausar", "Pausieren", "Приостановить"];

    pub const PROGRESS_BAR: &[&str] = &[
        r#"[data-testid="progress-bar"]"#,
        ".progress-bar",
        r#"[role="progressbar"]"#,
        r#"input[type="range"]"#,
    ];

    pub const CONTROLS: &[&str] = &[
        r#"[data-testid="player-controls"]"#,
        ".player-controls",
        ".Root__now-playing-bar .player-controls",
        ".now-playing-bar .player-controls",
        r#"[class*="player-controls"]"#,
    ];

    pub const SHUFFLE: &str = r#"[data-testid="control-button-shuffle"]"#;
    pub const REPEAT: &str = r#"[data-testid="control-button-repeat"]"#;

    pub const RIGHT_CONTROLS: &[&str] = &[
        ".Root__now-playing-bar .extra-controls",
        ".now-playing-bar .extra-controls",
        r#"[class*="extra-controls"]"#,
        r#"[class*="right-controls"]"#,
        ".player-controls-right",
        r#"[data-testid="extra-controls"]"#,
    ];
}

/// A `input[type="range"]` found next to the progress indicator.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeInput {
    pub index: usize,
    /// Raw `max` attribute, if any.
    pub max: Option<String>,
}

impl RangeInput {
    /// `parseFloat(max)` semantics: missing, unparseable or zero means 100.
    pub fn max_value(&self) -> f64 {
        self.max
            .as_deref()
            .and_then(|m| m.trim().parse::<f64>().ok())
            .filter(|m| *m != 0.0 && m.is_finite())
            .unwrap_or(100.0)
    }
}

/// Where an injected element lands relative to its anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertPosition {
    Before,
    After,
    Prepend,
    Append,
}

/// The three controls the add-on injects into the player bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ButtonId {
    PointA,
    PointB,
    LoopToggle,
}

impl ButtonId {
    /// Marker class shared by every injected element.
    pub const MARKER_CLASS: &'static str = "abloop-btn";

    pub fn class_name(self) -> &'static str {
        match self {
            ButtonId::PointA => "abloop-btn abloop-a-btn",
            ButtonId::PointB => "abloop-btn abloop-b-btn",
            ButtonId::LoopToggle => "abloop-btn abloop-loop-toggle-btn",
        }
    }
}

/// What an injected button currently shows.
#[derive(Debug, Clone, PartialEq)]
pub struct ButtonView {
    pub label: String,
    pub color: String,
    pub title: String,
}

/// The slice of the DOM the add-on touches.
///
/// Implementations use interior mutability: the page is shared between the
/// content script and whoever renders it.
pub trait HostPage: Send + Sync {
    /// Trimmed text content of the first element matching `selector`.
    fn text(&self, selector: &str) -> Option<String>;
    fn attribute(&self, selector: &str, name: &str) -> Option<String>;
    fn exists(&self, selector: &str) -> bool;

    /// Range inputs under the parent of the first element matching `anchor`.
    fn sibling_ranges(&self, anchor: &str) -> Vec<RangeInput>;
    fn set_range_value(&self, anchor: &str, index: usize, value: f64) -> Result<(), DomError>;
    /// Fire a bubbling DOM event (`input`, `change`) on a sibling range input.
    fn dispatch(&self, anchor: &str, index: usize, event: &str) -> Result<(), DomError>;

    /// Selector of the closest element containing both `a` and `b`.
    fn common_parent(&self, a: &str, b: &str) -> Option<String>;

    fn insert_button(
        &self,
        id: ButtonId,
        view: &ButtonView,
        anchor: &str,
        at: InsertPosition,
    ) -> Result<(), DomError>;
    /// Remove every element carrying `class`; returns how many went away.
    fn remove_by_class(&self, class: &str) -> usize;
    /// Restyle an injected button. `false` when it is not in the page.
    fn update_button(&self, id: ButtonId, view: &ButtonView) -> bool;
}

/// First candidate selector that matches anything.
pub fn first_present<'a>(page: &dyn HostPage, candidates: &[&'a str]) -> Option<&'a str> {
    candidates.iter().copied().find(|s| page.exists(s))
}

/// First candidate whose text is non-empty.
pub fn first_text(page: &dyn HostPage, candidates: &[&str]) -> Option<String> {
    candidates
        .iter()
        .filter_map(|s| page.text(s))
        .find(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_max_defaults_to_hundred() {
        let missing = RangeInput { index: 0, max: None };
        let junk = RangeInput { index: 0, max: Some("wide".into()) };
        let zero = RangeInput { index: 0, max: Some("0".into()) };
        let ms = RangeInput { index: 0, max: Some("215000".into()) };

        assert_eq!(missing.max_value(), 100.0);
        assert_eq!(junk.max_value(), 100.0);
        assert_eq!(zero.max_value(), 100.0);
        assert_eq!(ms.max_value(), 215000.0);
    }

    #[test]
    fn test_class_names_share_marker() {
        for id in [ButtonId::PointA, ButtonId::PointB, ButtonId::LoopToggle] {
            assert!(id.class_name().starts_with(ButtonId::MARKER_CLASS));
        }
    }
}
