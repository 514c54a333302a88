use crate::looper::{LoopState, Point};
use crate::messaging::{ContentRequest, TabRegistry};
use crate::player::{format_time, PlayerStatus};
use crate::storage::SharedStorage;
use serde_json::Value;

pub const NOT_SET: &str = "Not set";
pub const DETECTING: &str = "Detecting...";
const NO_LENGTH: &str = "--";

/// What the popup panel shows.
#[derive(Debug, Clone, PartialEq)]
pub struct PopupView {
    pub loop_enabled: bool,
    pub point_a: String,
    pub point_b: String,
    pub current_time: String,
    pub track_name: String,
    pub loop_length: String,
    pub jump_enabled: bool,
}

impl PopupView {
    pub fn from_state(state: &LoopState) -> Self {
        let point = |p: Option<f64>| p.map_or_else(|| NOT_SET.to_string(), |s| format_time(Some(s)));
        Self {
            loop_enabled: state.enabled,
            point_a: point(state.point_a),
            point_b: point(state.point_b),
            current_time: format_time(Some(state.current_time)),
            track_name: if state.track_name.is_empty() {
                DETECTING.to_string()
            } else {
                state.track_name.clone()
            },
            loop_length: match (state.point_a, state.point_b) {
                (Some(a), Some(b)) => format_time(Some((b - a).abs())),
                _ => NO_LENGTH.to_string(),
            },
            jump_enabled: state.point_a.is_some(),
        }
    }
}

/// The toolbar popup of the active tab 🎛️
///
/// Keeps its own copy of the loop record, saves it on every action and
/// forwards the action to the tab. A tab that does not answer is ignored.
pub struct PopupController {
    tab_id: Option<u32>,
    tabs: TabRegistry,
    storage: SharedStorage,
    state: LoopState,
}

impl PopupController {
    /// Open on `tab_id`: load the stored record and push it into the tab.
    pub async fn open(tab_id: Option<u32>, tabs: TabRegistry, storage: SharedStorage) -> Self {
        let mut popup = Self {
            tab_id,
            tabs,
            storage,
            state: LoopState::default(),
        };
        popup.load_stored_state();
        popup.sync_state_to_content().await;
        popup
    }

    pub fn state(&self) -> &LoopState {
        &self.state
    }

    pub fn view(&self) -> PopupView {
        PopupView::from_state(&self.state)
    }

    fn load_stored_state(&mut self) {
        match LoopState::load(self.storage.as_ref()) {
            Ok(Some(stored)) => self.state = stored,
            Ok(None) => {}
            Err(e) => tracing::warn!("popup could not load state: {}", e),
        }
    }

    /// Re-read the stored record, keeping the last polled time and track.
    pub fn reload_stored_state(&mut self) {
        let current_time = self.state.current_time;
        let track_name = std::mem::take(&mut self.state.track_name);
        self.load_stored_state();
        self.state.current_time = current_time;
        if !track_name.is_empty() {
            self.state.track_name = track_name;
        }
    }

    fn save_state(&self) {
        if let Err(e) = self.state.save(self.storage.as_ref()) {
            tracing::warn!("popup could not save state: {}", e);
        }
    }

    async fn send(&self, request: &ContentRequest) -> Option<Value> {
        let tab_id = self.tab_id?;
        self.tabs.ask(tab_id, request).await
    }

    async fn sync_state_to_content(&self) -> bool {
        let request = ContentRequest::InitState {
            state: self.state.sync_state(),
        };
        let synced = self
            .send(&request)
            .await
            .and_then(|reply| reply.get("success").and_then(Value::as_bool))
            .unwrap_or(false);
        if synced {
            tracing::info!("popup state synced to tab");
        } else {
            tracing::info!("popup state sync failed");
        }
        synced
    }

    /// Loop checkbox.
    /// Switching off drops both points, here and in the tab.
    pub async fn set_loop_enabled(&mut self, enabled: bool) {
        self.state.set_enabled(enabled);
        self.save_state();
        self.send(&ContentRequest::ToggleLoop { enabled }).await;
    }

    /// Capture the tab's current time as a point. `false` when the tab did
    /// not report a time.
    pub async fn set_point(&mut self, point: Point) -> bool {
        let time = self
            .send(&ContentRequest::GetCurrentTime)
            .await
            .and_then(|reply| reply.get("time").and_then(Value::as_f64));
        let Some(time) = time else {
            return false;
        };

        if self.state.set_point(point, time) {
            tracing::info!("both points set, loop enabled");
        }
        self.save_state();
        self.send(&ContentRequest::SetLoopPoints {
            point_a: self.state.point_a,
            point_b: self.state.point_b,
        })
        .await;
        true
    }

    pub async fn clear_points(&mut self) {
        self.state.point_a = None;
        self.state.point_b = None;
        self.save_state();
        self.send(&ContentRequest::ClearLoopPoints).await;
    }

    /// Only meaningful once A is set.
    pub async fn jump_to_a(&self) -> bool {
        let Some(time) = self.state.point_a else {
            return false;
        };
        self.send(&ContentRequest::JumpToTime { time })
            .await
            .and_then(|reply| reply.get("success").and_then(Value::as_bool))
            .unwrap_or(false)
    }

    /// One status poll. Returns whether the view changed.
    pub async fn refresh_status(&mut self) -> bool {
        let Some(reply) = self.send(&ContentRequest::GetStatus).await else {
            return false;
        };
        let Ok(status) = serde_json::from_value::<PlayerStatus>(reply) else {
            return false;
        };

        let mut changed = self.state.current_time != status.current_time;
        self.state.current_time = status.current_time;
        if !status.track_name.is_empty() && status.track_name != self.state.track_name {
            self.state.track_name = status.track_name;
            changed = true;
        }
        changed
    }
}
