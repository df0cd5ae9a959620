///! CLI configuration management

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where the trash panel gets its records from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrashSourceKind {
    /// Built-in sample records, nothing leaves the process
    #[default]
    Fixture,
    /// The backend's `/api/trash` endpoints
    Remote,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub default_server: String,
    pub default_output: String,
    /// Session token, only ever read by the client
    pub token: Option<String>,
    /// Where locally retained backups are saved
    pub download_dir: Option<PathBuf>,
    pub trash_source: TrashSourceKind,
    pub log_level: String,
    /// Enables the JSON log file when set
    pub log_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_server: "http://localhost:8080".to_string(),
            default_output: "table".to_string(),
            token: None,
            download_dir: None,
            trash_source: TrashSourceKind::default(),
            log_level: "warn".to_string(),
            log_dir: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(config_path)?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(config_path, contents)?;

        Ok(())
    }

    /// Directory downloads land in, the working directory unless configured
    pub fn download_dir(&self) -> PathBuf {
        self.download_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    fn config_path() -> Result<PathBuf> {
        let home = std::env::var("HOME")?;
        Ok(PathBuf::from(home).join(".config/lms-admin/cli.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_falls_back_to_defaults() {
        let config = Config::parse(
            r#"
            token = "secret"
            trash_source = "remote"
            "#,
        )
        .unwrap();

        assert_eq!(config.token.as_deref(), Some("secret"));
        assert_eq!(config.trash_source, TrashSourceKind::Remote);
        assert_eq!(config.default_server, "http://localhost:8080");
        assert_eq!(config.download_dir(), PathBuf::from("."));
    }

    #[test]
    fn test_roundtrip() {
        let mut config = Config::default();
        config.download_dir = Some(PathBuf::from("/tmp/backups"));

        let text = toml::to_string_pretty(&config).unwrap();
        let parsed = Config::parse(&text).unwrap();

        assert_eq!(parsed.download_dir(), PathBuf::from("/tmp/backups"));
        assert_eq!(parsed.trash_source, TrashSourceKind::Fixture);
        assert!(parsed.token.is_none());
    }

    #[test]
    fn test_unknown_trash_source_is_rejected() {
        assert!(Config::parse(r#"trash_source = "database""#).is_err());
    }
}
