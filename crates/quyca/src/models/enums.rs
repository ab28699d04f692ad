//! Enum types for entity kinds and request options.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::common::TypeTag;
use crate::config::collections;

/// Kind of entity a plot or product listing is computed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Top-level affiliation (university, company, hospital, ...).
    Institution,
    /// Faculty of an institution.
    Faculty,
    /// Department of a faculty.
    Department,
    /// Research group.
    Group,
    /// Researcher.
    Person,
    /// Journal or other venue.
    Source,
}

impl EntityKind {
    /// Snake-case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Institution => "institution",
            Self::Faculty => "faculty",
            Self::Department => "department",
            Self::Group => "group",
            Self::Person => "person",
            Self::Source => "source",
        }
    }

    /// Whether the entity lives in the affiliations collection.
    #[must_use]
    pub const fn is_affiliation(self) -> bool {
        matches!(self, Self::Institution | Self::Faculty | Self::Department | Self::Group)
    }

    /// Collection holding the entity.
    #[must_use]
    pub const fn collection(self) -> &'static str {
        match self {
            Self::Person => collections::PERSON,
            Self::Source => collections::SOURCES,
            _ => collections::AFFILIATIONS,
        }
    }

    /// Work field that links a work to this entity.
    #[must_use]
    pub const fn work_field(self) -> &'static str {
        match self {
            Self::Person => "authors.id",
            Self::Source => "source.id",
            _ => "authors.affiliations.id",
        }
    }

    /// Kind of the sub-units shown in per-affiliation plots.
    #[must_use]
    pub const fn child_kind(self) -> Option<Self> {
        match self {
            Self::Institution => Some(Self::Faculty),
            Self::Faculty => Some(Self::Department),
            Self::Department => Some(Self::Group),
            Self::Group => Some(Self::Person),
            Self::Person | Self::Source => None,
        }
    }

    /// Classify an affiliation from its type tags.
    ///
    /// Anything that is not tagged as a faculty, department or group is an institution.
    #[must_use]
    pub fn from_affiliation_types(types: &[TypeTag]) -> Self {
        let has = |name: &str| types.iter().any(|t| t.r#type.eq_ignore_ascii_case(name));
        if has("group") {
            Self::Group
        } else if has("department") {
            Self::Department
        } else if has("faculty") {
            Self::Faculty
        } else {
            Self::Institution
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "institution" => Ok(Self::Institution),
            "faculty" => Ok(Self::Faculty),
            "department" => Ok(Self::Department),
            "group" => Ok(Self::Group),
            "person" => Ok(Self::Person),
            "source" => Ok(Self::Source),
            other => Err(format!("unknown entity kind '{other}'")),
        }
    }
}

/// Top-level resource addressed by the HTTP surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Affiliation,
    Person,
    Source,
    Work,
    Patent,
    Project,
}

impl Resource {
    /// Collection holding the resource.
    #[must_use]
    pub const fn collection(self) -> &'static str {
        match self {
            Self::Affiliation => collections::AFFILIATIONS,
            Self::Person => collections::PERSON,
            Self::Source => collections::SOURCES,
            Self::Work => collections::WORKS,
            Self::Patent => collections::PATENTS,
            Self::Project => collections::PROJECTS,
        }
    }
}

impl FromStr for Resource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "affiliation" | "affiliations" | "institution" | "faculty" | "department" | "group" => {
                Ok(Self::Affiliation)
            }
            "person" | "persons" | "author" => Ok(Self::Person),
            "source" | "sources" => Ok(Self::Source),
            "work" | "works" => Ok(Self::Work),
            "patent" | "patents" => Ok(Self::Patent),
            "project" | "projects" => Ok(Self::Project),
            other => Err(format!("unknown resource '{other}'")),
        }
    }
}

/// Sort order of product listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    CitationsDesc,
    CitationsAsc,
    YearDesc,
    YearAsc,
    AlphabeticalAsc,
    AlphabeticalDesc,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "citations_desc" | "citations" => Ok(Self::CitationsDesc),
            "citations_asc" => Ok(Self::CitationsAsc),
            "year_desc" | "year" => Ok(Self::YearDesc),
            "year_asc" => Ok(Self::YearAsc),
            "alphabetical_asc" | "alphabetical" => Ok(Self::AlphabeticalAsc),
            "alphabetical_desc" => Ok(Self::AlphabeticalDesc),
            other => Err(format!("unknown sort '{other}'")),
        }
    }
}

/// Export output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown export format '{other}'")),
        }
    }
}
