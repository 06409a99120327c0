//! Live sync feed payloads
//!
//! Each message targets exactly one entity by id. `fields` carries a partial
//! JSON object for upserts (merged key-by-key onto the existing entity) or the
//! full entity when the id is new. Stall inserts name their hall via `hall_id`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Field naming the owning hall on stall inserts/moves
pub const HALL_ID_FIELD: &str = "hall_id";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Stall,
    Hall,
    Fixture,
    Path,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Stall => "stall",
            EntityKind::Hall => "hall",
            EntityKind::Fixture => "fixture",
            EntityKind::Path => "path",
        }
    }

    /// Stream this kind of mutation arrives on
    pub fn topic(self) -> SyncTopic {
        match self {
            EntityKind::Stall => SyncTopic::StallMutations,
            EntityKind::Hall | EntityKind::Fixture | EntityKind::Path => SyncTopic::LayoutMutations,
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOp {
    Upsert,
    Delete,
}

/// The two per-exhibition streams a viewer subscribes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncTopic {
    /// status / price / occupant changes for single stalls
    StallMutations,
    /// halls, fixtures and paths added, resized or removed
    LayoutMutations,
}

impl SyncTopic {
    pub const ALL: [SyncTopic; 2] = [SyncTopic::StallMutations, SyncTopic::LayoutMutations];

    /// Channel name scoped by exhibition, e.g. `exhibition:<uuid>:stalls`
    pub fn channel_name(self, exhibition_id: Uuid) -> String {
        let suffix = match self {
            SyncTopic::StallMutations => "stalls",
            SyncTopic::LayoutMutations => "layout",
        };
        format!("exhibition:{exhibition_id}:{suffix}")
    }
}

/// One entity mutation from the push feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncEvent {
    pub exhibition_id: Uuid,
    pub entity_kind: EntityKind,
    pub op: SyncOp,
    pub entity_id: String,
    #[serde(default)]
    pub fields: serde_json::Value,
    /// Server-side emission time, informational only
    #[serde(default)]
    pub emitted_at: Option<DateTime<Utc>>,
}

impl SyncEvent {
    pub fn upsert(
        exhibition_id: Uuid,
        entity_kind: EntityKind,
        entity_id: impl Into<String>,
        fields: serde_json::Value,
    ) -> Self {
        Self {
            exhibition_id,
            entity_kind,
            op: SyncOp::Upsert,
            entity_id: entity_id.into(),
            fields,
            emitted_at: None,
        }
    }

    pub fn delete(exhibition_id: Uuid, entity_kind: EntityKind, entity_id: impl Into<String>) -> Self {
        Self {
            exhibition_id,
            entity_kind,
            op: SyncOp::Delete,
            entity_id: entity_id.into(),
            fields: serde_json::Value::Null,
            emitted_at: None,
        }
    }

    pub fn topic(&self) -> SyncTopic {
        self.entity_kind.topic()
    }

    /// Decode one feed line. Accepts bare JSON or an SSE `data:` line.
    pub fn from_feed_line(line: &str) -> Result<Self, FeedDecodeError> {
        let trimmed = line.trim();
        let payload = trimmed.strip_prefix("data:").map(str::trim).unwrap_or(trimmed);
        if payload.is_empty() {
            return Err(FeedDecodeError::Empty);
        }
        serde_json::from_str(payload).map_err(FeedDecodeError::Json)
    }
}

#[derive(Debug, Error)]
pub enum FeedDecodeError {
    #[error("empty feed line")]
    Empty,
    #[error("invalid sync event JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_sse_data_line() {
        let id = Uuid::new_v4();
        let line = format!(
            "data: {{\"exhibition_id\":\"{id}\",\"entity_kind\":\"stall\",\"op\":\"upsert\",\"entity_id\":\"s-1\",\"fields\":{{\"status\":\"booked\"}}}}"
        );
        let event = SyncEvent::from_feed_line(&line).unwrap();
        assert_eq!(event.exhibition_id, id);
        assert_eq!(event.entity_kind, EntityKind::Stall);
        assert_eq!(event.op, SyncOp::Upsert);
        assert_eq!(event.fields, json!({"status": "booked"}));
        assert_eq!(event.topic(), SyncTopic::StallMutations);
    }

    #[test]
    fn empty_and_garbage_lines_are_errors() {
        assert!(matches!(SyncEvent::from_feed_line("   "), Err(FeedDecodeError::Empty)));
        assert!(matches!(SyncEvent::from_feed_line("data:"), Err(FeedDecodeError::Empty)));
        assert!(matches!(
            SyncEvent::from_feed_line("{not json"),
            Err(FeedDecodeError::Json(_))
        ));
    }

    #[test]
    fn delete_has_no_fields() {
        let event = SyncEvent::delete(Uuid::nil(), EntityKind::Fixture, "f-9");
        assert_eq!(event.fields, serde_json::Value::Null);
        assert_eq!(event.topic(), SyncTopic::LayoutMutations);
    }

    #[test]
    fn channel_names_are_scoped_by_exhibition() {
        let id = Uuid::nil();
        assert_eq!(
            SyncTopic::StallMutations.channel_name(id),
            "exhibition:00000000-0000-0000-0000-000000000000:stalls"
        );
        assert!(SyncTopic::LayoutMutations.channel_name(id).ends_with(":layout"));
    }
}
