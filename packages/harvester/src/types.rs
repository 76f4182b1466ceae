//! Core data types: index entries, section references and seed records.
//!
//! Index entries and seed records are the harvester's output artifacts and
//! serialize with camelCase field names, the format the database-build
//! step reads.

use serde::{Deserialize, Serialize};

use crate::text::short_name;

/// Identity of a statute: `(year, act number)`.
pub type ActKey = (u32, String);

/// Deterministic record id for an act.
///
/// # Examples
/// ```
/// use statute_harvester::types::record_id;
///
/// assert_eq!(record_id("45", 1860), "act-45-1860");
/// ```
#[must_use]
pub fn record_id(act_number: &str, year: u32) -> String {
    format!("act-{}-{year}", act_number.trim())
}

/// One statute discovered on the listing endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexEntry {
    pub title: String,
    pub year: u32,
    pub act_number: String,
    pub url: String,
    /// RFC 3339 timestamp of the crawl that found this entry.
    pub last_seen: String,
}

impl IndexEntry {
    #[must_use]
    pub fn key(&self) -> ActKey {
        (self.year, self.act_number.clone())
    }

    #[must_use]
    pub fn record_id(&self) -> String {
        record_id(&self.act_number, self.year)
    }
}

/// Reference to one section on an act page, used to fetch its content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionRef {
    pub act_id: String,
    pub section_id: String,
    pub section_number: String,
    pub title: String,
}

impl SectionRef {
    /// Compound key `actId#sectionId`.
    #[must_use]
    pub fn key(&self) -> String {
        format!("{}#{}", self.act_id, self.section_id)
    }
}

/// Section-level unit of statute text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Provision {
    pub provision_ref: String,
    pub section_number: String,
    pub title: String,
    pub content: String,
}

/// Legal status of a statute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatuteStatus {
    InForce,
    Amended,
    Repealed,
}

impl StatuteStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InForce => "in_force",
            Self::Amended => "amended",
            Self::Repealed => "repealed",
        }
    }

    /// Derive the status from an explicit status label and the title.
    ///
    /// A title marked "(Repealed)" wins over everything; otherwise the label
    /// decides, and statutes without a recognisable label are in force.
    #[must_use]
    pub fn derive(status_label: Option<&str>, title: &str) -> Self {
        let label = status_label.unwrap_or_default().to_lowercase();
        if title.to_lowercase().contains("repealed") || label.contains("repeal") {
            Self::Repealed
        } else if label.contains("amend") {
            Self::Amended
        } else {
            Self::InForce
        }
    }
}

/// Record kind marker; seed files only ever hold statutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    #[default]
    Statute,
}

/// How far harvesting of a statute got.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecordState {
    /// At least one provision has content; never fetched again.
    Complete,
    /// Sections were found but no content could be retrieved; retried next run.
    Incomplete,
    /// Negative cache entry for a statute that could not be harvested.
    Placeholder { reason: String },
}

/// Seed record for one statute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatuteRecord {
    pub id: String,
    pub kind: RecordKind,
    pub title: String,
    pub short_name: String,
    pub status: StatuteStatus,
    pub issued_date: Option<String>,
    pub url: String,
    pub provisions: Vec<Provision>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    pub state: RecordState,
}

impl StatuteRecord {
    /// Minimal record for an act that could not be harvested.
    #[must_use]
    pub fn placeholder(entry: &IndexEntry, reason: impl Into<String>) -> Self {
        Self {
            id: entry.record_id(),
            kind: RecordKind::Statute,
            title: entry.title.clone(),
            short_name: short_name(&entry.title, entry.year),
            status: StatuteStatus::derive(None, &entry.title),
            issued_date: None,
            url: entry.url.clone(),
            provisions: Vec::new(),
            language: None,
            state: RecordState::Placeholder {
                reason: reason.into(),
            },
        }
    }

    /// Whether any provision carries text.
    #[must_use]
    pub fn has_content(&self) -> bool {
        self.provisions.iter().any(|p| !p.content.is_empty())
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.state == RecordState::Complete
    }

    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        matches!(self.state, RecordState::Placeholder { .. })
    }
}
