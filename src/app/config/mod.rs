use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub mod user;

pub use user::{MonitorConfig, SimulatorConfig, SyncConfig, UserConfig};

pub struct AppConfig;

impl AppConfig {
    pub fn get_config_dir() -> PathBuf {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        let xdg_dir = home.join(".config").join("abloop");

        // Ensure it exists
        if !xdg_dir.exists() {
            let _ = fs::create_dir_all(&xdg_dir);
        }

        xdg_dir
    }

    pub fn get_config_path() -> PathBuf {
        Self::get_config_dir().join("config.toml")
    }

    /// File backend of the key-value store.
    pub fn get_storage_path() -> PathBuf {
        Self::get_config_dir().join("storage.json")
    }

    pub fn get_log_path() -> PathBuf {
        Self::get_config_dir().join("abloop.log")
    }

    pub fn load() -> UserConfig {
        Self::load_from(&Self::get_config_path())
    }

    /// Read `path`, writing the defaults there first when it is missing.
    /// A file that does not parse falls back to defaults.
    pub fn load_from(path: &Path) -> UserConfig {
        if path.exists() {
            match fs::read_to_string(path) {
                Ok(content) => toml::from_str(&content).unwrap_or_else(|e| {
                    tracing::warn!("{} unreadable, using defaults: {}", path.display(), e);
                    UserConfig::default()
                }),
                Err(_) => UserConfig::default(),
            }
        } else {
            // Create default config.toml if missing
            let c = UserConfig::default();
            if let Ok(content) = toml::to_string_pretty(&c) {
                let _ = fs::write(path, content);
            }
            c
        }
    }

    /// The default file, for `--generate-config`.
    pub fn default_toml() -> Result<String> {
        toml::to_string_pretty(&UserConfig::default()).context("Failed to render default config")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("abloop-config-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_missing_file_is_created_with_defaults() {
        let dir = scratch_dir("missing");
        let path = dir.join("config.toml");

        assert_eq!(AppConfig::load_from(&path), UserConfig::default());
        assert!(path.exists());
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_broken_file_falls_back() {
        let dir = scratch_dir("broken");
        let path = dir.join("config.toml");
        fs::write(&path, "[monitor\nperiod_ms = ").unwrap();

        assert_eq!(AppConfig::load_from(&path), UserConfig::default());
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_default_toml_has_sections() {
        let text = AppConfig::default_toml().unwrap();
        assert!(text.contains("[monitor]"));
        assert!(text.contains("[sync]"));
        assert!(text.contains("[simulator]"));
    }
}
