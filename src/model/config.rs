use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULTS: &str = include_str!("../../config/default.toml");

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub panel: PanelConfig,
    pub framing: FramingConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PanelConfig {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FramingConfig {
    pub gap: f64,
    pub name_prefix: String,
    pub lock_aspect_ratio: bool,
    pub undo_label: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        toml::from_str(DEFAULTS).expect("embedded default config is valid")
    }
}

impl AppConfig {
    /// Load configuration with layering: defaults → user config.
    ///
    /// `explicit` wins over the per-user `config.toml`; a missing explicit file
    /// is an error, a missing user file is not.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut merged: toml::Table = toml::from_str(DEFAULTS)?;

        let user_path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => user_config_path().filter(|path| path.exists()),
        };

        if let Some(path) = user_path {
            let user_str = fs::read_to_string(&path)
                .with_context(|| format!("reading config {}", path.display()))?;
            let user: toml::Table = toml::from_str(&user_str)
                .with_context(|| format!("parsing config {}", path.display()))?;
            merge_tables(&mut merged, user);
        }

        let config: AppConfig = toml::Value::Table(merged).try_into()?;
        Ok(config)
    }

    pub fn log_dir() -> PathBuf {
        directories::ProjectDirs::from("", "", "framer")
            .map(|d| d.data_dir().to_path_buf())
            .unwrap_or_else(|| std::env::temp_dir().join("framer"))
    }
}

fn user_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "framer").map(|d| d.config_dir().join("config.toml"))
}

fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match value {
            toml::Value::Table(incoming) => {
                if let Some(toml::Value::Table(existing)) = base.get_mut(&key) {
                    merge_tables(existing, incoming);
                } else {
                    base.insert(key, toml::Value::Table(incoming));
                }
            }
            value => {
                base.insert(key, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_panel_contract() {
        let config = AppConfig::default();
        assert_eq!((config.panel.width, config.panel.height), (320, 300));
        assert_eq!(config.framing.gap, 200.0);
        assert!(config.framing.name_prefix.is_empty());
        assert!(config.framing.lock_aspect_ratio);
    }

    #[test]
    fn user_file_overrides_single_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[framing]\ngap = 48.0\nname_prefix = \"Frame - \"\n").unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.framing.gap, 48.0);
        assert_eq!(config.framing.name_prefix, "Frame - ");
        assert!(config.framing.lock_aspect_ratio);
        assert_eq!(config.panel.width, 320);
        assert_eq!(config.logging.filter, "framer=info");
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = AppConfig::load(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(format!("{err:#}").contains("absent.toml"));
    }

    #[test]
    fn wrong_types_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[panel]\nwidth = \"wide\"\n").unwrap();
        assert!(AppConfig::load(Some(&path)).is_err());
    }
}
