use super::state::{LoopState, Point};
use crate::player::dom::{first_present, selectors, ButtonId, ButtonView, HostPage, InsertPosition};
use crate::player::time::format_time;
use std::sync::Arc;

pub const COLOR_ACTIVE: &str = "#1ed760";
pub const COLOR_IDLE: &str = "#b3b3b3";
pub const COLOR_ALERT: &str = "#ff6b6b";

/// Where loop state is reflected for the user (the injected buttons).
pub trait Overlay: Send + Sync {
    fn reflect(&self, state: &LoopState);

    /// Brief feedback on the loop button after it was pressed.
    fn flash_loop(&self, _enabled: bool) {}
}

/// Reflects nothing. For headless controllers.
pub struct NoOverlay;

impl Overlay for NoOverlay {
    fn reflect(&self, _state: &LoopState) {}
}

pub fn point_button_view(point: Point, value: Option<f64>) -> ButtonView {
    let name = point.label();
    match value {
        Some(secs) => ButtonView {
            label: format!("{}:{}", name, format_time(Some(secs))),
            color: COLOR_ACTIVE.to_string(),
            title: format!("Point {}: {} (click to clear)", name, format_time(Some(secs))),
        },
        None => ButtonView {
            label: name.to_string(),
            color: COLOR_IDLE.to_string(),
            title: format!("Set point {}", name),
        },
    }
}

pub fn loop_button_view(enabled: bool) -> ButtonView {
    ButtonView {
        label: "AB".to_string(),
        color: if enabled { COLOR_ACTIVE } else { COLOR_IDLE }.to_string(),
        title: "Toggle A-B loop".to_string(),
    }
}

/// The A, B and loop buttons injected next to the page's own controls 🔘
pub struct DomOverlay {
    page: Arc<dyn HostPage>,
}

impl DomOverlay {
    pub fn new(page: Arc<dyn HostPage>) -> Self {
        Self { page }
    }

    fn controls_container(&self) -> Option<String> {
        first_present(self.page.as_ref(), selectors::CONTROLS)
            .map(str::to_string)
            .or_else(|| self.page.common_parent(selectors::SHUFFLE, selectors::REPEAT))
    }

    /// Place the buttons. `false` while the player bar is not there yet;
    /// the caller retries.
    pub fn inject(&self, state: &LoopState) -> bool {
        let removed = self.page.remove_by_class(ButtonId::MARKER_CLASS);
        if removed > 0 {
            tracing::debug!("removed {} stale injected buttons", removed);
        }

        let Some(container) = self.controls_container() else {
            tracing::debug!("waiting for the player controls");
            return false;
        };
        tracing::info!("player controls found: {}", container);

        if !self.page.exists(selectors::SHUFFLE) || !self.page.exists(selectors::REPEAT) {
            tracing::warn!("shuffle or repeat control missing, buttons not injected");
            return false;
        }

        let a = point_button_view(Point::A, state.point_a);
        let b = point_button_view(Point::B, state.point_b);
        let placed = self
            .page
            .insert_button(ButtonId::PointA, &a, selectors::SHUFFLE, InsertPosition::Before)
            .and_then(|_| {
                self.page
                    .insert_button(ButtonId::PointB, &b, selectors::REPEAT, InsertPosition::After)
            });
        if let Err(e) = placed {
            tracing::warn!("point buttons not injected: {}", e);
            return false;
        }

        let toggle = loop_button_view(state.enabled);
        let loop_placed = match first_present(self.page.as_ref(), selectors::RIGHT_CONTROLS) {
            Some(right) => self
                .page
                .insert_button(ButtonId::LoopToggle, &toggle, right, InsertPosition::Prepend),
            None => self.page.insert_button(
                ButtonId::LoopToggle,
                &toggle,
                selectors::CONTROLS[0],
                InsertPosition::Append,
            ),
        };
        if let Err(e) = loop_placed {
            tracing::warn!("loop toggle not injected: {}", e);
        }

        tracing::info!("A/B loop buttons injected");
        true
    }
}

impl Overlay for DomOverlay {
    fn reflect(&self, state: &LoopState) {
        self.page
            .update_button(ButtonId::PointA, &point_button_view(Point::A, state.point_a));
        self.page
            .update_button(ButtonId::PointB, &point_button_view(Point::B, state.point_b));
        self.page
            .update_button(ButtonId::LoopToggle, &loop_button_view(state.enabled));
    }

    fn flash_loop(&self, enabled: bool) {
        let mut view = loop_button_view(enabled);
        if !enabled {
            view.color = COLOR_ALERT.to_string();
        }
        self.page.update_button(ButtonId::LoopToggle, &view);
    }
}
