//! In-memory frame store: the latest frame per stream name

use chrono::{Duration, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use scatter_embed::frame::Frame;

use crate::models::StreamRecord;

pub struct FrameStore {
    streams: DashMap<String, StreamRecord>,
}

impl FrameStore {
    pub fn new() -> Self {
        Self {
            streams: DashMap::new(),
        }
    }

    /// Store `frame` as the latest for `name`, creating the stream if needed.
    pub fn put(&self, name: &str, frame: Frame) -> StreamRecord {
        match self.streams.entry(name.to_string()) {
            Entry::Occupied(mut entry) => {
                entry.get_mut().replace_frame(frame);
                entry.get().clone()
            }
            Entry::Vacant(entry) => entry.insert(StreamRecord::new(name, frame)).value().clone(),
        }
    }

    pub fn get(&self, name: &str) -> Option<StreamRecord> {
        self.streams.get(name).map(|r| r.clone())
    }

    /// All streams, most recently updated first
    pub fn list(&self) -> Vec<StreamRecord> {
        let mut records: Vec<StreamRecord> =
            self.streams.iter().map(|entry| entry.value().clone()).collect();
        records.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        records
    }

    pub fn delete(&self, name: &str) -> bool {
        self.streams.remove(name).is_some()
    }

    /// Drop streams idle longer than `ttl`, skipping those with viewers.
    /// Returns the names removed.
    pub fn cleanup_expired(&self, active: &[String], ttl: Duration) -> Vec<String> {
        let now = Utc::now();
        let expired: Vec<String> = self
            .streams
            .iter()
            .filter(|entry| !active.contains(entry.key()))
            .filter(|entry| entry.value().is_expired(ttl, now))
            .map(|entry| entry.key().clone())
            .collect();

        expired
            .into_iter()
            .filter(|name| {
                self.streams
                    .remove_if(name, |_, record| record.is_expired(ttl, now))
                    .is_some()
            })
            .collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.streams.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.streams.len()
    }
}

impl Default for FrameStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scatter_embed::frame::Cell;

    fn frame(rows: usize) -> Frame {
        Frame::new(vec!["size".into()], vec![vec![Cell::Number(1.0)]; rows])
    }

    #[test]
    fn put_creates_then_replaces() {
        let store = FrameStore::new();
        let first = store.put("a", frame(1));
        assert_eq!(first.revision, 1);
        assert_eq!(first.frame.row_count(), 1);

        let second = store.put("a", frame(3));
        assert_eq!(second.revision, 2);
        assert_eq!(store.get("a").unwrap().frame.row_count(), 3);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn delete_reports_presence() {
        let store = FrameStore::new();
        store.put("a", frame(1));
        assert!(store.delete("a"));
        assert!(!store.delete("a"));
        assert!(store.get("a").is_none());
    }

    #[test]
    fn list_is_newest_first() {
        let store = FrameStore::new();
        store.put("old", frame(1));
        std::thread::sleep(std::time::Duration::from_millis(5));
        store.put("new", frame(1));
        let names: Vec<String> = store.list().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["new", "old"]);
    }

    #[test]
    fn cleanup_keeps_watched_streams() {
        let store = FrameStore::new();
        store.put("watched", frame(1));
        store.put("idle", frame(1));
        let removed = store.cleanup_expired(&["watched".to_string()], Duration::seconds(-1));
        assert_eq!(removed, vec!["idle".to_string()]);
        assert!(store.get("watched").is_some());
        assert!(store.get("idle").is_none());
    }

    #[test]
    fn cleanup_skips_fresh_streams() {
        let store = FrameStore::new();
        store.put("fresh", frame(1));
        assert!(store.cleanup_expired(&[], Duration::hours(1)).is_empty());
        assert!(store.contains("fresh"));
    }
}
