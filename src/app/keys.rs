use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde::{Deserialize, Serialize};

/// Simulator key bindings, `[keys]` in config.toml.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyConfig {
    // Global
    pub quit: String,
    pub play_pause: String,
    pub scrub_forward: String,
    pub scrub_backward: String,
    pub reload: String,

    // Injected page buttons
    pub click_a: String,
    pub click_b: String,
    pub click_loop: String,

    // Popup
    pub popup_set_a: String,
    pub popup_set_b: String,
    pub popup_toggle_loop: String,
    pub popup_clear: String,
    pub popup_jump: String,
}

impl Default for KeyConfig {
    fn default() -> Self {
        Self {
            quit: "q".to_string(),
            play_pause: "Space".to_string(),
            scrub_forward: "Right".to_string(),
            scrub_backward: "Left".to_string(),
            reload: "r".to_string(),

            click_a: "a".to_string(),
            click_b: "b".to_string(),
            click_loop: "l".to_string(),

            popup_set_a: "1".to_string(),
            popup_set_b: "2".to_string(),
            popup_toggle_loop: "p".to_string(),
            popup_clear: "c".to_string(),
            popup_jump: "j".to_string(),
        }
    }
}

impl KeyConfig {
    pub fn matches(&self, event: KeyEvent, key_str: &str) -> bool {
        match key_str {
            "Space" => event.code == KeyCode::Char(' '),
            "Enter" => event.code == KeyCode::Enter,
            "Esc" => event.code == KeyCode::Esc,
            "Up" => event.code == KeyCode::Up,
            "Down" => event.code == KeyCode::Down,
            "Left" => event.code == KeyCode::Left,
            "Right" => event.code == KeyCode::Right,
            s if s.chars().count() == 1 => match s.chars().next() {
                // Uppercase binding also accepts shift + lowercase
                Some(ch) if ch.is_uppercase() => {
                    event.code == KeyCode::Char(ch)
                        || (event.code == KeyCode::Char(ch.to_ascii_lowercase())
                            && event.modifiers.contains(KeyModifiers::SHIFT))
                }
                Some(ch) => event.code == KeyCode::Char(ch),
                None => false,
            },
            _ => false,
        }
    }

    // Helper for UI display
    pub fn display(&self, key_str: &str) -> String {
        match key_str {
            "Up" => "↑".to_string(),
            "Down" => "↓".to_string(),
            "Left" => "←".to_string(),
            "Right" => "→".to_string(),
            _ => key_str.to_string(),
        }
    }
}
