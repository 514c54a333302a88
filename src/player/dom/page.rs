use super::{selectors, ButtonId, ButtonView, HostPage, InsertPosition, RangeInput};
use crate::clock::Clock;
use crate::error::DomError;
use crate::player::time::format_time;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;

/// Which generation of player markup the page renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Markup {
    /// `data-testid` attributes everywhere.
    #[default]
    Modern,
    /// Class-based markup, no controls container id.
    Legacy,
    /// App shell only; the player bar has not rendered yet.
    Loading,
}

/// Something the user did inside the page that the content script reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageEvent {
    ButtonClicked(ButtonId),
}

#[derive(Debug, Clone)]
struct InjectedButton {
    id: ButtonId,
    view: ButtonView,
    anchor: String,
    at: InsertPosition,
}

struct PageState {
    markup: Markup,
    track_name: String,
    duration: f64,
    // Playback position = at_anchor + elapsed since anchor_ms while playing
    at_anchor: f64,
    anchor_ms: u64,
    playing: bool,
    pause_label: String,
    play_label: String,
    range_max: Option<f64>,
    range_writable: bool,
    pending_value: Option<f64>,
    buttons: Vec<InjectedButton>,
    events: Option<mpsc::UnboundedSender<PageEvent>>,
}

/// In-memory stand-in for the web player 🎧
///
/// Serves the selectors the reader looks for, advances its position with the
/// clock while playing, and applies range-input writes on `change` the way
/// the real page's listeners do. Cloning shares the same page.
#[derive(Clone)]
pub struct SimulatedPage {
    clock: Arc<dyn Clock>,
    state: Arc<Mutex<PageState>>,
}

const MODERN_TRACK: &str = r#"[data-testid="context-item-info-title"]"#;
const MODERN_EXTRA: &str = r#"[data-testid="extra-controls"]"#;
const LEGACY_TRACK: &str = ".now-playing .track-info__name";
const LEGACY_EXTRA: &str = ".now-playing-bar .extra-controls";
const LEGACY_CONTROLS_PARENT: &str = ".player-controls__buttons";

impl SimulatedPage {
    pub fn new(clock: Arc<dyn Clock>, track_name: &str, duration_secs: f64) -> Self {
        let now = clock.now_ms();
        Self {
            clock,
            state: Arc::new(Mutex::new(PageState {
                markup: Markup::Modern,
                track_name: track_name.to_string(),
                duration: duration_secs.max(0.0),
                at_anchor: 0.0,
                anchor_ms: now,
                playing: false,
                pause_label: "Pause".to_string(),
                play_label: "Play".to_string(),
                range_max: None,
                range_writable: true,
                pending_value: None,
                buttons: Vec::new(),
                events: None,
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, PageState> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn position_of(&self, s: &PageState) -> f64 {
        if !s.playing {
            return s.at_anchor;
        }
        let elapsed = self.clock.now_ms().saturating_sub(s.anchor_ms) as f64 / 1000.0;
        (s.at_anchor + elapsed).clamp(0.0, s.duration)
    }

    fn range_max_of(s: &PageState) -> f64 {
        s.range_max.unwrap_or(s.duration * 1000.0)
    }

    // --- Playback 🎵 ---

    pub fn position(&self) -> f64 {
        let s = self.state();
        self.position_of(&s)
    }

    pub fn duration(&self) -> f64 {
        self.state().duration
    }

    pub fn track_name(&self) -> String {
        self.state().track_name.clone()
    }

    pub fn is_playing(&self) -> bool {
        self.state().playing
    }

    pub fn set_playing(&self, playing: bool) {
        let now = self.clock.now_ms();
        let mut s = self.state();
        s.at_anchor = self.position_of(&s);
        s.anchor_ms = now;
        s.playing = playing;
    }

    pub fn toggle_play(&self) -> bool {
        let playing = !self.is_playing();
        self.set_playing(playing);
        playing
    }

    /// Move the playhead directly, like a user dragging the bar.
    pub fn seek_display(&self, secs: f64) {
        let now = self.clock.now_ms();
        let mut s = self.state();
        s.at_anchor = secs.clamp(0.0, s.duration);
        s.anchor_ms = now;
    }

    pub fn scrub(&self, delta_secs: f64) {
        let target = self.position() + delta_secs;
        self.seek_display(target);
    }

    pub fn load_track(&self, track_name: &str, duration_secs: f64) {
        let now = self.clock.now_ms();
        let mut s = self.state();
        s.track_name = track_name.to_string();
        s.duration = duration_secs.max(0.0);
        s.at_anchor = 0.0;
        s.anchor_ms = now;
    }

    // --- Markup knobs 🧪 ---

    pub fn set_markup(&self, markup: Markup) {
        self.state().markup = markup;
    }

    pub fn markup(&self) -> Markup {
        self.state().markup
    }

    pub fn set_labels(&self, pause_label: &str, play_label: &str) {
        let mut s = self.state();
        s.pause_label = pause_label.to_string();
        s.play_label = play_label.to_string();
    }

    /// `None` uses a millisecond scale (duration * 1000).
    pub fn set_range_max(&self, max: Option<f64>) {
        self.state().range_max = max;
    }

    pub fn set_range_writable(&self, writable: bool) {
        self.state().range_writable = writable;
    }

    // --- Injected controls 🔘 ---

    /// Listen for clicks on injected buttons. Replaces any earlier listener.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<PageEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.state().events = Some(tx);
        rx
    }

    /// Click an injected button. `false` when it is not on the page.
    pub fn click(&self, id: ButtonId) -> bool {
        let s = self.state();
        if !s.buttons.iter().any(|b| b.id == id) {
            return false;
        }
        match &s.events {
            Some(tx) => tx.send(PageEvent::ButtonClicked(id)).is_ok(),
            None => false,
        }
    }

    pub fn button(&self, id: ButtonId) -> Option<ButtonView> {
        self.state()
            .buttons
            .iter()
            .find(|b| b.id == id)
            .map(|b| b.view.clone())
    }

    pub fn button_count(&self) -> usize {
        self.state().buttons.len()
    }

    /// Navigation: injected elements vanish and the content script's
    /// listener is dropped, ending its event stream.
    pub fn reload(&self) {
        let mut s = self.state();
        s.buttons.clear();
        s.events = None;
        s.pending_value = None;
    }

    fn has(&self, s: &PageState, selector: &str) -> bool {
        match s.markup {
            Markup::Loading => false,
            Markup::Modern => {
                selector == selectors::POSITION[0]
                    || selector == selectors::DURATION[0]
                    || selector == MODERN_TRACK
                    || selector == selectors::PLAY_PAUSE
                    || selector == selectors::PROGRESS_BAR[0]
                    || selector == selectors::CONTROLS[0]
                    || selector == selectors::SHUFFLE
                    || selector == selectors::REPEAT
                    || selector == MODERN_EXTRA
            }
            Markup::Legacy => {
                selector == selectors::POSITION[1]
                    || selector == selectors::DURATION[1]
                    || selector == LEGACY_TRACK
                    || selector == selectors::PLAY_PAUSE
                    || selector == selectors::PROGRESS_BAR[1]
                    || selector == selectors::SHUFFLE
                    || selector == selectors::REPEAT
                    || selector == LEGACY_EXTRA
                    || selector == LEGACY_CONTROLS_PARENT
            }
        }
    }

    fn is_progress_bar(&self, s: &PageState, selector: &str) -> bool {
        selectors::PROGRESS_BAR.contains(&selector) && self.has(s, selector)
    }
}

impl HostPage for SimulatedPage {
    fn text(&self, selector: &str) -> Option<String> {
        let s = self.state();
        if !self.has(&s, selector) {
            return None;
        }
        if selectors::POSITION.contains(&selector) {
            Some(format_time(Some(self.position_of(&s))))
        } else if selectors::DURATION.contains(&selector) {
            Some(format_time(Some(s.duration)))
        } else if selector == MODERN_TRACK || selector == LEGACY_TRACK {
            Some(s.track_name.trim().to_string())
        } else {
            Some(String::new())
        }
    }

    fn attribute(&self, selector: &str, name: &str) -> Option<String> {
        let s = self.state();
        if selector == selectors::PLAY_PAUSE && name == selectors::PLAY_PAUSE_LABEL && self.has(&s, selector) {
            let label = if s.playing { &s.pause_label } else { &s.play_label };
            return Some(label.clone());
        }
        None
    }

    fn exists(&self, selector: &str) -> bool {
        let s = self.state();
        self.has(&s, selector)
    }

    fn sibling_ranges(&self, anchor: &str) -> Vec<RangeInput> {
        let s = self.state();
        if !self.is_progress_bar(&s, anchor) {
            return Vec::new();
        }
        vec![RangeInput {
            index: 0,
            max: Some(format!("{}", Self::range_max_of(&s))),
        }]
    }

    fn set_range_value(&self, anchor: &str, index: usize, value: f64) -> Result<(), DomError> {
        let mut s = self.state();
        if !self.is_progress_bar(&s, anchor) || index != 0 {
            return Err(DomError::NotFound(format!("{} input[{}]", anchor, index)));
        }
        if !s.range_writable {
            return Err(DomError::Rejected("input is read-only".to_string()));
        }
        s.pending_value = Some(value);
        Ok(())
    }

    fn dispatch(&self, anchor: &str, index: usize, event: &str) -> Result<(), DomError> {
        let now = self.clock.now_ms();
        let mut s = self.state();
        if !self.is_progress_bar(&s, anchor) || index != 0 {
            return Err(DomError::NotFound(format!("{} input[{}]", anchor, index)));
        }
        if event != "change" {
            return Ok(());
        }
        if let Some(value) = s.pending_value.take() {
            let max = Self::range_max_of(&s);
            let secs = if max > 1000.0 {
                value / 1000.0
            } else if max > 0.0 {
                value / max * s.duration
            } else {
                value
            };
            s.at_anchor = secs.clamp(0.0, s.duration);
            s.anchor_ms = now;
        }
        Ok(())
    }

    fn common_parent(&self, a: &str, b: &str) -> Option<String> {
        let s = self.state();
        if !self.has(&s, a) || !self.has(&s, b) {
            return None;
        }
        match s.markup {
            Markup::Modern => Some(selectors::CONTROLS[0].to_string()),
            Markup::Legacy => Some(LEGACY_CONTROLS_PARENT.to_string()),
            Markup::Loading => None,
        }
    }

    fn insert_button(
        &self,
        id: ButtonId,
        view: &ButtonView,
        anchor: &str,
        at: InsertPosition,
    ) -> Result<(), DomError> {
        let mut s = self.state();
        if !self.has(&s, anchor) {
            return Err(DomError::NotFound(anchor.to_string()));
        }
        s.buttons.push(InjectedButton {
            id,
            view: view.clone(),
            anchor: anchor.to_string(),
            at,
        });
        Ok(())
    }

    fn remove_by_class(&self, class: &str) -> usize {
        let mut s = self.state();
        let before = s.buttons.len();
        s.buttons
            .retain(|b| !b.id.class_name().split(' ').any(|c| c == class));
        before - s.buttons.len()
    }

    fn update_button(&self, id: ButtonId, view: &ButtonView) -> bool {
        let mut s = self.state();
        match s.buttons.iter_mut().find(|b| b.id == id) {
            Some(b) => {
                b.view = view.clone();
                true
            }
            None => false,
        }
    }
}

impl std::fmt::Debug for SimulatedPage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = self.state();
        f.debug_struct("SimulatedPage")
            .field("markup", &s.markup)
            .field("track_name", &s.track_name)
            .field("playing", &s.playing)
            .field("buttons", &s.buttons.iter().map(|b| (b.id, b.anchor.clone(), b.at)).collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn page_with_clock() -> (Arc<ManualClock>, SimulatedPage) {
        let clock = Arc::new(ManualClock::new(0));
        let page = SimulatedPage::new(clock.clone(), "Song", 100.0);
        (clock, page)
    }

    #[test]
    fn test_position_advances_only_while_playing() {
        let (clock, page) = page_with_clock();
        clock.advance(5_000);
        assert_eq!(page.position(), 0.0);

        page.set_playing(true);
        clock.advance(2_500);
        assert_eq!(page.position(), 2.5);

        page.set_playing(false);
        clock.advance(10_000);
        assert_eq!(page.position(), 2.5);
    }

    #[test]
    fn test_position_clamps_to_duration() {
        let (clock, page) = page_with_clock();
        page.seek_display(99.0);
        page.set_playing(true);
        clock.advance(60_000);
        assert_eq!(page.position(), 100.0);

        page.scrub(-500.0);
        assert_eq!(page.position(), 0.0);
    }

    #[test]
    fn test_change_event_applies_pending_write() {
        let (_clock, page) = page_with_clock();
        let anchor = selectors::PROGRESS_BAR[0];

        page.set_range_value(anchor, 0, 42_000.0).unwrap();
        page.dispatch(anchor, 0, "input").unwrap();
        assert_eq!(page.position(), 0.0);

        page.dispatch(anchor, 0, "change").unwrap();
        assert_eq!(page.position(), 42.0);
    }

    #[test]
    fn test_click_requires_injected_button_and_listener() {
        let (_clock, page) = page_with_clock();
        let view = ButtonView {
            label: "A".into(),
            color: "#b3b3b3".into(),
            title: "Set point A".into(),
        };
        assert!(!page.click(ButtonId::PointA));

        page.insert_button(ButtonId::PointA, &view, selectors::SHUFFLE, InsertPosition::Before)
            .unwrap();
        assert!(!page.click(ButtonId::PointA));

        let mut rx = page.subscribe();
        assert!(page.click(ButtonId::PointA));
        assert_eq!(rx.try_recv().unwrap(), PageEvent::ButtonClicked(ButtonId::PointA));

        page.reload();
        assert_eq!(page.button_count(), 0);
        assert!(!page.click(ButtonId::PointA));
    }

    #[test]
    fn test_remove_by_marker_class() {
        let (_clock, page) = page_with_clock();
        let view = ButtonView {
            label: "AB".into(),
            color: "#b3b3b3".into(),
            title: String::new(),
        };
        page.insert_button(ButtonId::LoopToggle, &view, MODERN_EXTRA, InsertPosition::Prepend)
            .unwrap();
        page.insert_button(ButtonId::PointB, &view, selectors::REPEAT, InsertPosition::After)
            .unwrap();

        assert_eq!(page.remove_by_class("abloop-b-btn"), 1);
        assert_eq!(page.remove_by_class(ButtonId::MARKER_CLASS), 1);
        assert_eq!(page.button_count(), 0);
    }
}
