//! Activity feed assembly.
//!
//! Each report pulls bounded slices of several entity types, projects them
//! into one uniform entry shape, and merges them into a single time-ordered
//! feed. The projection happens in the reporting queries; this module owns
//! the uniform shape and the merge.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Upper bound on the merged feed length for both reports.
pub const FEED_LIMIT: usize = 10;

/// Entry kinds, serialized as the `type` field of a feed entry.
pub const KIND_USER_REGISTERED: &str = "user_registered";
pub const KIND_EVENT_CREATED: &str = "event_created";
pub const KIND_RESERVATION_MADE: &str = "reservation_made";
pub const KIND_PAYMENT_COMPLETED: &str = "payment_completed";

/// One human-readable feed entry.
#[derive(Debug, Clone, Serialize)]
pub struct ActivityEntry {
    /// Composite id, `<type>-<entity uuid>`.
    pub id: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub description: String,
    pub timestamp: DateTime<Utc>,
}

impl ActivityEntry {
    pub fn new(
        kind: &'static str,
        entity_id: Uuid,
        description: String,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: format!("{}-{}", kind, entity_id),
            kind,
            description,
            timestamp,
        }
    }
}

/// Merge independently fetched sources into one feed: newest first,
/// truncated to [`FEED_LIMIT`]. Entries with equal timestamps keep their
/// source order (stable sort).
pub fn merge_feeds(sources: Vec<Vec<ActivityEntry>>) -> Vec<ActivityEntry> {
    let mut merged: Vec<ActivityEntry> = sources.into_iter().flatten().collect();
    merged.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    merged.truncate(FEED_LIMIT);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, minute, 0).unwrap()
    }

    fn entry(kind: &'static str, minute: u32) -> ActivityEntry {
        ActivityEntry::new(kind, Uuid::new_v4(), format!("at {minute}"), at(minute))
    }

    #[test]
    fn merges_newest_first() {
        let feed = merge_feeds(vec![
            vec![entry(KIND_USER_REGISTERED, 5), entry(KIND_USER_REGISTERED, 1)],
            vec![entry(KIND_PAYMENT_COMPLETED, 9)],
            vec![entry(KIND_RESERVATION_MADE, 3)],
        ]);

        let minutes: Vec<u32> = feed.iter().map(|e| e.timestamp.format("%M").to_string().parse().unwrap()).collect();
        assert_eq!(minutes, vec![9, 5, 3, 1]);
        for pair in feed.windows(2) {
            assert!(pair[0].timestamp >= pair[1].timestamp);
        }
    }

    #[test]
    fn truncates_to_feed_limit() {
        let source: Vec<ActivityEntry> = (0..15).map(|m| entry(KIND_EVENT_CREATED, m)).collect();
        let feed = merge_feeds(vec![source]);
        assert_eq!(feed.len(), FEED_LIMIT);
        // The oldest entries fall off, not the newest.
        assert_eq!(feed[0].timestamp, at(14));
        assert_eq!(feed[9].timestamp, at(5));
    }

    #[test]
    fn empty_sources_produce_empty_feed() {
        assert!(merge_feeds(vec![]).is_empty());
        assert!(merge_feeds(vec![vec![], vec![]]).is_empty());
    }

    #[test]
    fn id_embeds_kind_and_entity() {
        let id = Uuid::new_v4();
        let e = ActivityEntry::new(KIND_RESERVATION_MADE, id, "x".into(), at(0));
        assert_eq!(e.id, format!("reservation_made-{id}"));
    }

    #[test]
    fn equal_timestamps_keep_source_order() {
        let a = ActivityEntry::new(KIND_USER_REGISTERED, Uuid::new_v4(), "a".into(), at(7));
        let b = ActivityEntry::new(KIND_EVENT_CREATED, Uuid::new_v4(), "b".into(), at(7));
        let feed = merge_feeds(vec![vec![a.clone()], vec![b.clone()]]);
        assert_eq!(feed[0].id, a.id);
        assert_eq!(feed[1].id, b.id);
    }
}
