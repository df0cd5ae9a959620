//! Backup record types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

use crate::Error;

/// Where a backup artifact is kept
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RetentionLocation {
    Local,  // downloaded to this device
    Server, // kept by the backup service
}

impl std::fmt::Display for RetentionLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Server => write!(f, "server"),
        }
    }
}

impl FromStr for RetentionLocation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "server" => Ok(Self::Server),
            other => Err(Error::UnknownTag {
                kind: "retention location",
                value: other.to_string(),
            }),
        }
    }
}

/// Reference to the stored backup payload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum BackupLocator {
    /// File saved on this device during the current session. Never sent to the server.
    Session(PathBuf),
    /// Durable URL handed out by the backup service
    Remote(String),
}

impl std::fmt::Display for BackupLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Session(path) => write!(f, "{}", path.display()),
            Self::Remote(url) => write!(f, "{}", url),
        }
    }
}

/// A backup as shown in the backup panel
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BackupRecord {
    pub id: String,
    pub name: String,
    pub date: String, // RFC 3339
    pub retention: RetentionLocation,
    pub locator: Option<BackupLocator>,
}

impl BackupRecord {
    /// Parsed creation time, `None` when the service sent something unparseable
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.date)
            .ok()
            .map(|d| d.with_timezone(&Utc))
    }

    pub fn remote_url(&self) -> Option<&str> {
        match &self.locator {
            Some(BackupLocator::Remote(url)) => Some(url),
            _ => None,
        }
    }
}

/// Item of the backup listing as it comes off the wire
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackupListItem {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub retention: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl From<BackupListItem> for BackupRecord {
    fn from(item: BackupListItem) -> Self {
        // The listing comes from the server, so anything unrecognised is a server backup
        let retention = item
            .retention
            .as_deref()
            .and_then(|r| r.parse().ok())
            .unwrap_or(RetentionLocation::Server);

        let locator = item
            .url
            .filter(|u| !u.trim().is_empty())
            .map(BackupLocator::Remote);

        Self {
            id: item.id.unwrap_or_default(),
            name: item.name.unwrap_or_default(),
            date: item.date.unwrap_or_default(),
            retention,
            locator,
        }
    }
}
