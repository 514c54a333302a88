use crate::app::keys::KeyConfig;
use crate::app::App;
use crate::looper::Point;
use crate::player::dom::ButtonId;
use crossterm::event::KeyEvent;

const SCRUB_SECS: f64 = 5.0;

/// What a key press asks the simulator to do.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    Quit,
    TogglePlay,
    Scrub(f64),
    Reload,
    Click(ButtonId),
    PopupSetPoint(Point),
    PopupToggleLoop,
    PopupClear,
    PopupJump,
}

pub fn action_for(keys: &KeyConfig, key: KeyEvent) -> Option<Action> {
    let bindings = [
        (&keys.quit, Action::Quit),
        (&keys.play_pause, Action::TogglePlay),
        (&keys.scrub_forward, Action::Scrub(SCRUB_SECS)),
        (&keys.scrub_backward, Action::Scrub(-SCRUB_SECS)),
        (&keys.reload, Action::Reload),
        (&keys.click_a, Action::Click(ButtonId::PointA)),
        (&keys.click_b, Action::Click(ButtonId::PointB)),
        (&keys.click_loop, Action::Click(ButtonId::LoopToggle)),
        (&keys.popup_set_a, Action::PopupSetPoint(Point::A)),
        (&keys.popup_set_b, Action::PopupSetPoint(Point::B)),
        (&keys.popup_toggle_loop, Action::PopupToggleLoop),
        (&keys.popup_clear, Action::PopupClear),
        (&keys.popup_jump, Action::PopupJump),
    ];
    bindings
        .into_iter()
        .find(|(binding, _)| keys.matches(key, binding))
        .map(|(_, action)| action)
}

pub async fn handle_key(key: KeyEvent, app: &mut App) {
    let Some(action) = action_for(&app.keys, key) else {
        return;
    };
    tracing::debug!("key action {:?}", action);

    match action {
        Action::Quit => app.is_running = false,
        Action::TogglePlay => {
            let playing = app.page.toggle_play();
            app.show_toast(if playing { "▶ Play" } else { "⏸ Pause" });
        }
        Action::Scrub(delta) => app.page.scrub(delta),
        Action::Reload => app.reload_page(),
        Action::Click(id) => {
            if !app.page.click(id) {
                app.show_toast("⏳ Buttons not injected yet");
            }
        }
        Action::PopupSetPoint(point) => {
            if app.popup.set_point(point).await {
                app.show_toast(&format!("📍 Point {} set", point.label()));
            } else {
                app.show_toast("❌ No response from the tab");
            }
        }
        Action::PopupToggleLoop => {
            let enabled = !app.popup.state().enabled;
            app.popup.set_loop_enabled(enabled).await;
            app.show_toast(if enabled { "🔁 Loop on" } else { "⏹ Loop off" });
        }
        Action::PopupClear => {
            app.popup.clear_points().await;
            app.show_toast("🧹 Points cleared");
        }
        Action::PopupJump => {
            if app.popup.jump_to_a().await {
                app.show_toast("⏮ Back to A");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyModifiers};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_default_bindings() {
        let keys = KeyConfig::default();
        assert_eq!(action_for(&keys, key(KeyCode::Char('q'))), Some(Action::Quit));
        assert_eq!(action_for(&keys, key(KeyCode::Left)), Some(Action::Scrub(-5.0)));
        assert_eq!(
            action_for(&keys, key(KeyCode::Char('l'))),
            Some(Action::Click(ButtonId::LoopToggle))
        );
        assert_eq!(
            action_for(&keys, key(KeyCode::Char('2'))),
            Some(Action::PopupSetPoint(Point::B))
        );
        assert_eq!(action_for(&keys, key(KeyCode::Char('z'))), None);
    }
}
