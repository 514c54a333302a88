use crate::background::SyncSettings;
use crate::content::ContentSettings;
use crate::looper::MonitorSettings;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// User-editable configuration (ReadOnly by App after load)
/// stored in `config.toml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub simulator: SimulatorConfig,
    #[serde(default)]
    pub keys: crate::app::keys::KeyConfig,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            monitor: MonitorConfig::default(),
            sync: SyncConfig::default(),
            simulator: SimulatorConfig::default(),
            keys: crate::app::keys::KeyConfig::default(),
        }
    }
}

/// Loop monitor timing ⏱️
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub period_ms: u64,
    pub cooldown_ms: u64,
    pub convergence_window_secs: f64,
    pub verify_delay_ms: u64,
    pub verify_tolerance_secs: f64,
    pub button_flash_ms: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            period_ms: 100,
            cooldown_ms: 3000,
            convergence_window_secs: 3.0,
            verify_delay_ms: 1500,
            verify_tolerance_secs: 2.0,
            button_flash_ms: 200,
        }
    }
}

impl MonitorConfig {
    pub fn settings(&self) -> MonitorSettings {
        MonitorSettings {
            // A zero period would make tokio's interval panic
            period: Duration::from_millis(self.period_ms.max(1)),
            cooldown_ms: self.cooldown_ms,
            convergence_window: self.convergence_window_secs,
            verify_delay_ms: self.verify_delay_ms,
            verify_tolerance: self.verify_tolerance_secs,
            button_flash_ms: self.button_flash_ms,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub delay_ms: u64,
    pub host: String,
    pub player_poll_ms: u64,
    pub status_poll_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            delay_ms: 2000,
            host: "open.spotify.com".to_string(),
            player_poll_ms: 1000,
            status_poll_ms: 1000,
        }
    }
}

impl SyncConfig {
    pub fn settings(&self) -> SyncSettings {
        SyncSettings {
            delay: Duration::from_millis(self.delay_ms),
            host: self.host.clone(),
        }
    }

    pub fn status_poll(&self) -> Duration {
        Duration::from_millis(self.status_poll_ms.max(1))
    }
}

/// The fake player page the terminal simulator hosts 🎧
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    pub track_name: String,
    pub duration_secs: f64,
    /// Slider `max` attribute; 0 means a millisecond scale over the duration.
    pub range_max: f64,
    pub pause_label: String,
    pub play_label: String,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            track_name: "Bohemian Rhapsody".to_string(),
            duration_secs: 215.0,
            range_max: 0.0,
            pause_label: "Pause".to_string(),
            play_label: "Play".to_string(),
        }
    }
}

impl UserConfig {
    pub fn content_settings(&self) -> ContentSettings {
        let poll = Duration::from_millis(self.sync.player_poll_ms.max(1));
        ContentSettings {
            monitor: self.monitor.settings(),
            player_poll: poll,
            controls_poll: poll,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_monitor_defaults() {
        let config = UserConfig::default();
        assert_eq!(config.monitor.settings(), MonitorSettings::default());
        assert_eq!(config.sync.settings(), SyncSettings::default());
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_partial_file() {
        let config: UserConfig = toml::from_str(
            r#"
            log_level = "debug"

            [monitor]
            cooldown_ms = 1000

            [simulator]
            track_name = "Loop Me"
            "#,
        )
        .unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.monitor.cooldown_ms, 1000);
        assert_eq!(config.monitor.period_ms, 100);
        assert_eq!(config.simulator.track_name, "Loop Me");
        assert_eq!(config.simulator.duration_secs, 215.0);
        assert_eq!(config.sync.host, "open.spotify.com");
    }

    #[test]
    fn test_default_round_trips_through_toml() {
        let text = toml::to_string_pretty(&UserConfig::default()).unwrap();
        let back: UserConfig = toml::from_str(&text).unwrap();
        assert_eq!(back, UserConfig::default());
    }

    #[test]
    fn test_zero_period_is_clamped() {
        let mut config = MonitorConfig::default();
        config.period_ms = 0;
        assert_eq!(config.settings().period, Duration::from_millis(1));
    }
}
