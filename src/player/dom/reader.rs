use super::{first_present, first_text, selectors, HostPage};
use crate::player::time::parse_time_string;
use std::sync::Arc;

/// Read-only view of the host player 🔍
///
/// Every method is total: a selector miss yields 0, "" or `false`.
#[derive(Clone)]
pub struct PlayerReader {
    page: Arc<dyn HostPage>,
}

impl PlayerReader {
    pub fn new(page: Arc<dyn HostPage>) -> Self {
        Self { page }
    }

    pub fn read_position(&self) -> f64 {
        first_text(self.page.as_ref(), selectors::POSITION)
            .map(|t| parse_time_string(&t))
            .unwrap_or(0.0)
    }

    pub fn read_duration(&self) -> f64 {
        first_text(self.page.as_ref(), selectors::DURATION)
            .map(|t| parse_time_string(&t))
            .unwrap_or(0.0)
    }

    pub fn read_track_name(&self) -> String {
        first_text(self.page.as_ref(), selectors::TRACK_NAME).unwrap_or_default()
    }

    /// Playing when the play/pause control offers to pause. A missing
    /// control counts as stopped.
    pub fn is_playing(&self) -> bool {
        if !self.page.exists(selectors::PLAY_PAUSE) {
            tracing::trace!("play/pause control not found");
            return false;
        }
        let label = self
            .page
            .attribute(selectors::PLAY_PAUSE, selectors::PLAY_PAUSE_LABEL)
            .unwrap_or_default();
        selectors::PAUSE_KEYWORDS.iter().any(|k| label.contains(k))
    }

    /// Selector of the progress indicator, once the player has rendered.
    pub fn progress_bar(&self) -> Option<&'static str> {
        first_present(self.page.as_ref(), selectors::PROGRESS_BAR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::player::dom::{Markup, SimulatedPage};

    fn reader_for(page: &SimulatedPage) -> PlayerReader {
        PlayerReader::new(Arc::new(page.clone()))
    }

    #[test]
    fn test_reads_modern_markup() {
        let clock = Arc::new(ManualClock::new(0));
        let page = SimulatedPage::new(clock.clone(), "Song Name", 187.0);
        page.seek_display(42.0);
        let reader = reader_for(&page);

        assert_eq!(reader.read_position(), 42.0);
        assert_eq!(reader.read_duration(), 187.0);
        assert_eq!(reader.read_track_name(), "Song Name");
        assert!(reader.progress_bar().is_some());
    }

    #[test]
    fn test_reads_legacy_markup() {
        let clock = Arc::new(ManualClock::new(0));
        let page = SimulatedPage::new(clock, "Old Song", 120.0);
        page.set_markup(Markup::Legacy);
        page.seek_display(61.0);
        let reader = reader_for(&page);

        assert_eq!(reader.read_position(), 61.0);
        assert_eq!(reader.read_duration(), 120.0);
        assert_eq!(reader.read_track_name(), "Old Song");
        assert_eq!(reader.progress_bar(), Some(".progress-bar"));
    }

    #[test]
    fn test_missing_markup_degrades_to_defaults() {
        let clock = Arc::new(ManualClock::new(0));
        let page = SimulatedPage::new(clock, "Hidden", 100.0);
        page.set_markup(Markup::Loading);
        let reader = reader_for(&page);

        assert_eq!(reader.read_position(), 0.0);
        assert_eq!(reader.read_duration(), 0.0);
        assert_eq!(reader.read_track_name(), "");
        assert!(!reader.is_playing());
        assert!(reader.progress_bar().is_none());
    }

    #[test]
    fn test_playing_follows_localized_label() {
        let clock = Arc::new(ManualClock::new(0));
        let page = SimulatedPage::new(clock, "Song", 100.0);
        let reader = reader_for(&page);

        page.set_labels("一時停止", "再生");
        page.set_playing(true);
        assert!(reader.is_playing());

        page.set_playing(false);
        assert!(!reader.is_playing());

        page.set_labels("Pausieren", "Wiedergabe");
        page.set_playing(true);
        assert!(reader.is_playing());
    }
}
