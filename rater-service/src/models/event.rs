use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::rating::Rating;

/// Lifecycle stage of the rating that produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatingEventKind {
    Created,
    Updated,
    Deleted,
}

impl RatingEventKind {
    /// SSE event name for this kind.
    pub fn event_name(&self) -> &'static str {
        match self {
            RatingEventKind::Created => "rating.created",
            RatingEventKind::Updated => "rating.updated",
            RatingEventKind::Deleted => "rating.deleted",
        }
    }
}

/// Immutable snapshot of one rating mutation, emitted after the write has
/// been committed. Consumed by the statistics engine and the event broker;
/// never modified after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingEvent {
    pub kind: RatingEventKind,
    pub id: Uuid,
    pub user_id: Uuid,
    pub contest_id: Uuid,
    pub act_id: Uuid,
    pub song: i32,
    pub singing: i32,
    pub show: i32,
    pub looks: i32,
    pub clothes: i32,
    pub total: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RatingEvent {
    pub fn new(kind: RatingEventKind, rating: &Rating) -> Self {
        Self {
            kind,
            id: rating.id,
            user_id: rating.user_id,
            contest_id: rating.contest_id,
            act_id: rating.act_id,
            song: rating.song,
            singing: rating.singing,
            show: rating.show,
            looks: rating.looks,
            clothes: rating.clothes,
            total: rating.total(),
            created_at: rating.created_at,
            updated_at: rating.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_maps_to_event_name() {
        assert_eq!(RatingEventKind::Created.event_name(), "rating.created");
        assert_eq!(RatingEventKind::Updated.event_name(), "rating.updated");
        assert_eq!(RatingEventKind::Deleted.event_name(), "rating.deleted");
    }

    #[test]
    fn kind_serializes_snake_case() {
        let json = serde_json::to_string(&RatingEventKind::Created).unwrap();
        assert_eq!(json, "\"created\"");
    }
}
