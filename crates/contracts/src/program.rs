//! Program / ResultEntry - the announcement data model
//!
//! A `Program` is a competition event holding its results in announcement
//! order. Results are immutable once ingested; the only mutable field on a
//! program is `read`, which only ever flips from `false` to `true`.

use serde::{Deserialize, Deserializer, Serialize};

use crate::{DisplayProgram, DisplayResult, ProgramKey};

/// Competition program (event/category)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    /// Session-unique key
    pub key: ProgramKey,

    /// Display name
    #[serde(rename = "program_name")]
    pub name: String,

    /// Section / category (e.g. "Senior")
    pub section: String,

    /// Every result has been announced
    #[serde(default)]
    pub read: bool,

    /// Results in ingestion order
    #[serde(default)]
    pub results: Vec<ResultEntry>,
}

impl Program {
    /// Create an unread program without results
    pub fn new(key: ProgramKey, name: impl Into<String>, section: impl Into<String>) -> Self {
        Self {
            key,
            name: name.into(),
            section: section.into(),
            read: false,
            results: Vec::new(),
        }
    }

    /// Copy without results, as returned by list endpoints
    pub fn summary(&self) -> Self {
        Self {
            key: self.key.clone(),
            name: self.name.clone(),
            section: self.section.clone(),
            read: self.read,
            results: Vec::new(),
        }
    }

    /// Mark as read (irreversible)
    pub fn mark_read(&mut self) {
        self.read = true;
    }

    /// Payload for a program-selected event
    pub fn display(&self) -> DisplayProgram {
        DisplayProgram {
            program_key: Some(self.key.clone()),
            program_name: self.name.clone(),
            section: self.section.clone(),
        }
    }

    /// Payload for a result-selected event, `None` if `index` is out of range
    pub fn display_result(&self, index: usize) -> Option<DisplayResult> {
        let result = self.results.get(index)?;
        Some(DisplayResult {
            program_key: Some(self.key.clone()),
            program_name: self.name.clone(),
            section: self.section.clone(),
            result_index: Some(index),
            result: result.clone(),
        })
    }
}

/// One ranked participant or team entry within a program
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultEntry {
    /// Place as written in the source ("1", "2", "Special")
    #[serde(default, deserialize_with = "text_or_number")]
    pub position: String,

    /// Grade, empty when not graded
    #[serde(default)]
    pub grade: String,

    /// Participant name
    #[serde(default)]
    pub name: String,

    /// Team / house / school
    #[serde(default)]
    pub team: String,

    /// Chest (bib) number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chest_no: Option<String>,

    /// Photo reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}

/// Accept `"1"`, `1` and `1.0` alike for text fields that sources emit as numbers
fn text_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
        Float(f64),
        Null(()),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Int(n) => n.to_string(),
        Raw::Float(f) => format_number(f),
        Raw::Null(()) => String::new(),
    })
}

/// Render a spreadsheet number the way a person typed it (`1`, not `1.0`)
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}
