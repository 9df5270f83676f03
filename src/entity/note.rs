// src/entity/note.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::tags::tag_matches;

/// Seconds between the Unix epoch and the Core Data reference date
/// (2001-01-01T00:00:00Z).
const CORE_DATA_EPOCH_OFFSET: i64 = 978_307_200;

/// A point-in-time snapshot of one Bear note.
///
/// Bear owns the record. `id` is Bear's `ZUNIQUEIDENTIFIER` and is the only
/// safe key for targeting a note; titles are not unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    pub text: String,
    /// Tags found in the note body, in order of first appearance.
    pub tags: Vec<String>,
    pub pinned: bool,
    pub archived: bool,
    pub trashed: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub modified_at: Option<DateTime<Utc>>,
}

impl Note {
    /// Whether the note carries `tag` or one of its nested children.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| tag_matches(t, tag))
    }

    /// Case-insensitive substring match over title and body.
    pub fn contains_text(&self, query: &str) -> bool {
        let needle = query.to_lowercase();
        self.title.to_lowercase().contains(&needle) || self.text.to_lowercase().contains(&needle)
    }
}

/// Convert a Core Data timestamp (seconds since 2001-01-01 UTC) to UTC.
pub fn core_data_timestamp(seconds: f64) -> Option<DateTime<Utc>> {
    if !seconds.is_finite() {
        return None;
    }
    let whole = seconds.floor();
    let nanos = (((seconds - whole) * 1e9).round() as u32).min(999_999_999);
    DateTime::from_timestamp((whole as i64).checked_add(CORE_DATA_EPOCH_OFFSET)?, nanos)
}
