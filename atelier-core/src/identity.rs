//! Identity types for atelier entities

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Record identifier using UUIDv7 for timestamp-sortable IDs.
/// UUIDv7 embeds a Unix timestamp, making IDs naturally sortable by creation time.
pub type RecordId = Uuid;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Free-form metadata mapping attached to messages and records.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Generate a new UUIDv7 RecordId (timestamp-sortable).
pub fn new_record_id() -> RecordId {
    Uuid::now_v7()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_id_is_v7() {
        let id = new_record_id();
        assert_eq!(id.get_version_num(), 7);
    }

    #[test]
    fn test_record_ids_are_sortable() {
        let id1 = new_record_id();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let id2 = new_record_id();
        // UUIDv7 should be lexicographically sortable by time
        assert!(id1.to_string() < id2.to_string());
    }
}
