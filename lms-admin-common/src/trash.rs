//! Soft-deleted (trash) record types

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::{Error, Result};

/// Days a soft-deleted record stays recoverable
pub const RETENTION_DAYS: i64 = 30;

/// Kind of entity that was soft-deleted
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Student,
    Course,
    Document,
    Payment,
    Other,
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Student => write!(f, "student"),
            Self::Course => write!(f, "course"),
            Self::Document => write!(f, "document"),
            Self::Payment => write!(f, "payment"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Category filter of the trash panel
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TrashTab {
    #[default]
    All,
    Student,
    Course,
    Document,
    Payment,
    Other,
}

impl TrashTab {
    /// Entity type this tab is restricted to, `None` for the unfiltered tab
    pub fn entity_type(self) -> Option<EntityType> {
        match self {
            Self::All => None,
            Self::Student => Some(EntityType::Student),
            Self::Course => Some(EntityType::Course),
            Self::Document => Some(EntityType::Document),
            Self::Payment => Some(EntityType::Payment),
            Self::Other => Some(EntityType::Other),
        }
    }

    pub fn admits(self, entity_type: EntityType) -> bool {
        self.entity_type().map_or(true, |t| t == entity_type)
    }
}

impl std::fmt::Display for TrashTab {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.entity_type() {
            Some(entity_type) => write!(f, "{}", entity_type),
            None => write!(f, "all"),
        }
    }
}

impl FromStr for TrashTab {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(Self::All),
            "student" => Ok(Self::Student),
            "course" => Ok(Self::Course),
            "document" => Ok(Self::Document),
            "payment" => Ok(Self::Payment),
            "other" => Ok(Self::Other),
            other => Err(Error::UnknownTag {
                kind: "trash tab",
                value: other.to_string(),
            }),
        }
    }
}

/// A soft-deleted entity awaiting restore or permanent deletion
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrashRecord {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub deleted_at: DateTime<Utc>,
    pub deleted_by: String,
    pub expire_at: DateTime<Utc>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub description: Option<String>,
}

impl TrashRecord {
    /// Create a record whose expiry follows the retention window
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        entity_type: EntityType,
        deleted_at: DateTime<Utc>,
        deleted_by: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            entity_type,
            deleted_at,
            deleted_by: deleted_by.into(),
            expire_at: deleted_at + Duration::days(RETENTION_DAYS),
            size: None,
            description: None,
        }
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Expiry must come strictly after deletion
    pub fn validate(&self) -> Result<()> {
        if self.expire_at <= self.deleted_at {
            return Err(Error::Validation(format!(
                "trash record '{}' expires at {} which is not after its deletion at {}",
                self.id, self.expire_at, self.deleted_at
            )));
        }
        Ok(())
    }

    /// Case-insensitive substring match on name, description and deleting actor.
    /// `needle` must already be lowercased.
    pub fn matches_search(&self, needle: &str) -> bool {
        if needle.is_empty() {
            return true;
        }

        self.name.to_lowercase().contains(needle)
            || self.deleted_by.to_lowercase().contains(needle)
            || self
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(needle))
    }
}
