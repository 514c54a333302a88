use ratatui::style::Color;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Simulator palette, overridable from `theme.toml`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    pub background: Color,
    pub surface: Color,
    pub muted: Color,
    pub text: Color,
    /// Loop on, points set, progress.
    pub accent: Color,
    pub alert: Color,
    pub warning: Color,
    pub info: Color,
    pub highlight: Color,
}

impl Default for Theme {
    fn default() -> Self {
        // Web player dark mode
        Self {
            background: Color::Rgb(18, 18, 18),
            surface: Color::Rgb(40, 40, 40),
            muted: Color::Rgb(179, 179, 179),
            text: Color::Rgb(255, 255, 255),
            accent: Color::Rgb(30, 215, 96),
            alert: Color::Rgb(255, 107, 107),
            warning: Color::Rgb(255, 196, 87),
            info: Color::Rgb(80, 155, 245),
            highlight: Color::Rgb(175, 40, 150),
        }
    }
}

impl Theme {
    /// Injected buttons carry CSS hex colors; anything unparseable renders as text.
    pub fn css(&self, hex: &str) -> Color {
        hex.parse::<Color>().unwrap_or(self.text)
    }
}

#[derive(Deserialize)]
struct Wrapped {
    theme: Theme,
}

/// `theme.toml` in the config dir, nested `[theme]` or flat. Missing or
/// unreadable files give the default palette.
pub fn load_theme(path: &Path) -> Theme {
    let Ok(content) = fs::read_to_string(path) else {
        return Theme::default();
    };
    match toml::from_str::<Wrapped>(&content) {
        Ok(wrapped) => wrapped.theme,
        Err(_) => toml::from_str::<Theme>(&content).unwrap_or_else(|e| {
            tracing::warn!("{} unreadable, default palette: {}", path.display(), e);
            Theme::default()
        }),
    }
}
