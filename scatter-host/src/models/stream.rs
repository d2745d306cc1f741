//! Stream records: the latest frame held under a name

use chrono::{DateTime, Duration, Utc};
use scatter_embed::frame::Frame;
use serde::Serialize;

#[derive(Clone, Debug)]
pub struct StreamRecord {
    pub name: String,
    pub frame: Frame,
    /// Number of frames stored under this name so far
    pub revision: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StreamRecord {
    pub fn new(name: impl Into<String>, frame: Frame) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            frame,
            revision: 1,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn replace_frame(&mut self, frame: Frame) {
        self.frame = frame;
        self.revision += 1;
        self.updated_at = Utc::now();
    }

    pub fn is_expired(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        now - self.updated_at > ttl
    }
}

/// Stream listing entry (no frame data)
#[derive(Clone, Debug, Serialize)]
pub struct StreamSummary {
    pub name: String,
    pub rows: usize,
    pub columns: Vec<String>,
    pub revision: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub connections: u64,
}

impl StreamSummary {
    pub fn new(record: &StreamRecord, connections: u64) -> Self {
        Self {
            name: record.name.clone(),
            rows: record.frame.row_count(),
            columns: record.frame.header.clone(),
            revision: record.revision,
            created_at: record.created_at,
            updated_at: record.updated_at,
            connections,
        }
    }
}

/// Stream names end up in URLs and log lines
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 64
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replacing_bumps_revision() {
        let mut record = StreamRecord::new("a", Frame::default());
        let first = record.updated_at;
        record.replace_frame(Frame::new(vec!["size".into()], vec![]));
        assert_eq!(record.revision, 2);
        assert!(record.updated_at >= first);
        assert_eq!(record.frame.header, vec!["size"]);
    }

    #[test]
    fn expiry_uses_last_update() {
        let record = StreamRecord::new("a", Frame::default());
        let ttl = Duration::seconds(60);
        assert!(!record.is_expired(ttl, record.updated_at + Duration::seconds(30)));
        assert!(record.is_expired(ttl, record.updated_at + Duration::seconds(61)));
    }

    #[test]
    fn validates_names() {
        assert!(is_valid_name("cloud_01-a"));
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("a/b"));
        assert!(!is_valid_name(&"x".repeat(65)));
    }
}
