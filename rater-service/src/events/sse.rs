use bytes::Bytes;

use crate::error::{AppError, AppResult};
use crate::models::RatingEvent;

/// Reconnect hint sent with every frame, in milliseconds.
const RETRY_MILLIS: u64 = 10_000;

/// One server-sent-events wire frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SseFrame {
    pub event: Option<String>,
    pub id: Option<String>,
    pub data: Option<String>,
    pub retry: Option<u64>,
    pub comment: Option<String>,
}

impl SseFrame {
    /// Frame carrying one rating lifecycle event as JSON.
    pub fn rating(event: &RatingEvent) -> AppResult<Self> {
        let data = serde_json::to_string(event)
            .map_err(|e| AppError::Internal(format!("failed to serialize rating event: {e}")))?;

        Ok(Self {
            event: Some(event.kind.event_name().to_string()),
            id: Some(event.id.to_string()),
            data: Some(data),
            retry: Some(RETRY_MILLIS),
            comment: None,
        })
    }

    /// Periodic keep-alive marker. Carries no payload besides the type tag
    /// and the reconnect hint.
    pub fn keep_alive() -> Self {
        Self {
            event: Some("ping".to_string()),
            retry: Some(RETRY_MILLIS),
            comment: Some("keep-alive".to_string()),
            ..Self::default()
        }
    }

    /// Encode to the text/event-stream format, terminated by the blank
    /// line that marks the end of a frame.
    pub fn to_bytes(&self) -> Bytes {
        let mut out = String::new();

        if let Some(comment) = &self.comment {
            out.push_str(": ");
            out.push_str(comment);
            out.push('\n');
        }
        if let Some(event) = &self.event {
            out.push_str("event: ");
            out.push_str(event);
            out.push('\n');
        }
        if let Some(id) = &self.id {
            out.push_str("id: ");
            out.push_str(id);
            out.push('\n');
        }
        if let Some(data) = &self.data {
            // Multi-line payloads need one data: line each.
            for line in data.split('\n') {
                out.push_str("data: ");
                out.push_str(line);
                out.push('\n');
            }
        }
        if let Some(retry) = self.retry {
            out.push_str("retry: ");
            out.push_str(&retry.to_string());
            out.push('\n');
        }
        out.push('\n');

        Bytes::from(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Rating, RatingEventKind};
    use chrono::Utc;
    use uuid::Uuid;

    fn sample_event() -> RatingEvent {
        let rating = Rating {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            contest_id: Uuid::new_v4(),
            act_id: Uuid::new_v4(),
            song: 2,
            singing: 2,
            show: 2,
            looks: 2,
            clothes: 2,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        RatingEvent::new(RatingEventKind::Created, &rating)
    }

    #[test]
    fn rating_frame_carries_event_name_and_json() {
        let event = sample_event();
        let frame = SseFrame::rating(&event).unwrap();
        let text = String::from_utf8(frame.to_bytes().to_vec()).unwrap();

        assert!(text.contains("event: rating.created\n"));
        assert!(text.contains(&format!("id: {}\n", event.id)));
        assert!(text.contains("\"total\":10"));
        assert!(text.contains("retry: 10000\n"));
        assert!(text.ends_with("\n\n"));
    }

    #[test]
    fn keep_alive_frame_has_no_data() {
        let text = String::from_utf8(SseFrame::keep_alive().to_bytes().to_vec()).unwrap();

        assert!(text.starts_with(": keep-alive\n"));
        assert!(text.contains("event: ping\n"));
        assert!(!text.contains("data:"));
    }

    #[test]
    fn frame_round_trips_payload_as_single_data_line() {
        let event = sample_event();
        let frame = SseFrame::rating(&event).unwrap();
        let text = String::from_utf8(frame.to_bytes().to_vec()).unwrap();

        let data_line = text
            .lines()
            .find(|l| l.starts_with("data: "))
            .expect("data line present");
        let parsed: RatingEvent = serde_json::from_str(&data_line["data: ".len()..]).unwrap();
        assert_eq!(parsed, event);
    }
}
