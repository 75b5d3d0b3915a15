//! Resource and record types stored in the archive

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceKind {
    Glossary,
    Translation,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Glossary => "GLOSSARY",
            ResourceKind::Translation => "TRANSLATION",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Glossary => f.pad("glossary"),
            ResourceKind::Translation => f.pad("translation"),
        }
    }
}

impl FromStr for ResourceKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "glossary" | "glossaries" => Ok(ResourceKind::Glossary),
            "translation" | "translations" => Ok(ResourceKind::Translation),
            _ => anyhow::bail!("Unknown resource kind: {} (expected glossary or translation)", s),
        }
    }
}

/// Owning container of records.
#[derive(Debug, Clone, Serialize)]
pub struct Resource {
    pub id: i64,
    pub title: String,
    pub kind: ResourceKind,
    pub field: String,
    pub client: String,
    pub translator: String,
    pub notes: String,
    pub created_on: DateTime<Utc>,
    pub created_by: String,
    pub updated_on: DateTime<Utc>,
    pub updated_by: String,
}

/// Descriptive fields supplied when a resource is created or uploaded into.
#[derive(Debug, Clone, Default)]
pub struct ResourceMeta {
    pub notes: String,
    pub field: String,
    pub client: String,
    pub translator: String,
}

impl Resource {
    /// Append new notes on their own line, keeping what was there.
    pub fn merge_notes(&mut self, new_notes: &str) {
        if new_notes.is_empty() {
            return;
        }
        if self.notes.is_empty() {
            self.notes = new_notes.to_string();
        } else {
            self.notes = format!("{}\n{}", self.notes, new_notes);
        }
    }
}

/// A stored source/target pair.
#[derive(Debug, Clone, Serialize)]
pub struct Record {
    pub id: i64,
    pub resource_id: i64,
    pub source: String,
    pub target: String,
    pub notes: String,
    pub created_on: DateTime<Utc>,
    pub created_by: String,
    pub updated_on: DateTime<Utc>,
    pub updated_by: String,
}

/// A parsed pair that has not been written yet. The owning resource and the
/// audit fields are stamped when the draft is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RecordDraft {
    pub source: String,
    pub target: String,
    pub notes: String,
}

impl RecordDraft {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            notes: String::new(),
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }
}

/// Changes to a resource; `None` leaves the field as it is. The kind of a
/// resource never changes.
#[derive(Debug, Clone, Default)]
pub struct ResourceUpdate {
    pub title: Option<String>,
    pub notes: Option<String>,
    pub field: Option<String>,
    pub client: Option<String>,
    pub translator: Option<String>,
}

impl ResourceUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.notes.is_none()
            && self.field.is_none()
            && self.client.is_none()
            && self.translator.is_none()
    }

    pub fn apply(&self, resource: &mut Resource) {
        for (value, slot) in [
            (&self.title, &mut resource.title),
            (&self.notes, &mut resource.notes),
            (&self.field, &mut resource.field),
            (&self.client, &mut resource.client),
            (&self.translator, &mut resource.translator),
        ] {
            if let Some(value) = value {
                *slot = value.clone();
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecordUpdate {
    pub source: Option<String>,
    pub target: Option<String>,
    pub notes: Option<String>,
}

impl RecordUpdate {
    pub fn is_empty(&self) -> bool {
        self.source.is_none() && self.target.is_none() && self.notes.is_none()
    }

    pub fn apply(&self, record: &mut Record) {
        for (value, slot) in [
            (&self.source, &mut record.source),
            (&self.target, &mut record.target),
            (&self.notes, &mut record.notes),
        ] {
            if let Some(value) = value {
                *slot = value.clone();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_resource(notes: &str) -> Resource {
        let now = Utc::now();
        Resource {
            id: 1,
            title: "Patents".to_string(),
            kind: ResourceKind::Glossary,
            field: String::new(),
            client: String::new(),
            translator: String::new(),
            notes: notes.to_string(),
            created_on: now,
            created_by: "alice".to_string(),
            updated_on: now,
            updated_by: "alice".to_string(),
        }
    }

    #[test]
    fn test_merge_notes_into_empty() {
        let mut resource = sample_resource("");
        resource.merge_notes("second batch");
        assert_eq!(resource.notes, "second batch");
    }

    #[test]
    fn test_merge_notes_appends_line() {
        let mut resource = sample_resource("first batch");
        resource.merge_notes("second batch");
        assert_eq!(resource.notes, "first batch\nsecond batch");

        resource.merge_notes("");
        assert_eq!(resource.notes, "first batch\nsecond batch");
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!("Glossary".parse::<ResourceKind>().unwrap(), ResourceKind::Glossary);
        assert_eq!(
            "translations".parse::<ResourceKind>().unwrap(),
            ResourceKind::Translation
        );
        assert!("memo".parse::<ResourceKind>().is_err());
    }

    #[test]
    fn test_kind_display_honors_width() {
        assert_eq!(format!("{:<12}|", ResourceKind::Glossary), "glossary    |");
        assert_eq!(format!("{:>12}|", ResourceKind::Translation), " translation|");
    }

    #[test]
    fn test_update_is_empty() {
        assert!(ResourceUpdate::default().is_empty());
        assert!(RecordUpdate::default().is_empty());
        assert!(
            !RecordUpdate {
                notes: Some(String::new()),
                ..Default::default()
            }
            .is_empty()
        );
    }
}
