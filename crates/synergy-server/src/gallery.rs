//! In-memory blueprint gallery.

use crate::config::DEFAULT_GALLERY_CAPACITY;
use std::collections::VecDeque;
use synergy_blueprint::Blueprint;

/// Blueprints generated since the node started, bounded by a capacity.
/// Inserting into a full gallery evicts the oldest insert.
#[derive(Debug)]
pub struct Gallery {
    blueprints: VecDeque<Blueprint>,
    capacity: usize,
}

impl Default for Gallery {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_GALLERY_CAPACITY)
    }
}

impl Gallery {
    pub fn new() -> Self {
        Self::default()
    }

    /// A gallery holding at most `capacity` blueprints (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            blueprints: VecDeque::with_capacity(capacity.min(DEFAULT_GALLERY_CAPACITY)),
            capacity,
        }
    }

    /// Store `blueprint`, returning the evicted entry when the gallery was full.
    pub fn insert(&mut self, blueprint: Blueprint) -> Option<Blueprint> {
        let evicted = if self.blueprints.len() >= self.capacity {
            self.blueprints.pop_front()
        } else {
            None
        };
        self.blueprints.push_back(blueprint);
        evicted
    }

    pub fn get(&self, id: &str) -> Option<&Blueprint> {
        self.blueprints.iter().find(|b| b.id == id)
    }

    /// All blueprints, newest first. Ties keep the later insert first.
    pub fn list(&self) -> Vec<Blueprint> {
        let mut list: Vec<Blueprint> = self.blueprints.iter().rev().cloned().collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        list
    }

    pub fn len(&self) -> usize {
        self.blueprints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blueprints.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use synergy_blueprint::parse_description;

    fn blueprint(name: &str, millis: i64) -> Blueprint {
        let parsed = parse_description("3 bedroom modern").unwrap();
        let at = Utc.timestamp_millis_opt(millis).unwrap();
        Blueprint::from_parsed(name, "3 bedroom modern", &parsed, at).unwrap()
    }

    #[test]
    fn newest_first() {
        let mut gallery = Gallery::new();
        gallery.insert(blueprint("old", 1_000));
        gallery.insert(blueprint("new", 3_000));
        gallery.insert(blueprint("middle", 2_000));

        let names: Vec<_> = gallery.list().into_iter().map(|b| b.name).collect();
        assert_eq!(names, vec!["new", "middle", "old"]);
    }

    #[test]
    fn lookup_by_id() {
        let mut gallery = Gallery::new();
        assert!(gallery.is_empty());
        let bp = blueprint("house", 5_000);
        let id = bp.id.clone();
        gallery.insert(bp);

        assert_eq!(gallery.len(), 1);
        assert_eq!(gallery.get(&id).map(|b| b.name.as_str()), Some("house"));
        assert!(gallery.get("bp_0_missing").is_none());
    }

    #[test]
    fn full_gallery_evicts_oldest() {
        let mut gallery = Gallery::with_capacity(2);
        assert!(gallery.insert(blueprint("first", 1_000)).is_none());
        assert!(gallery.insert(blueprint("second", 2_000)).is_none());

        let evicted = gallery.insert(blueprint("third", 3_000)).unwrap();
        assert_eq!(evicted.name, "first");
        assert_eq!(gallery.len(), 2);
        assert!(gallery.get(&evicted.id).is_none());

        let names: Vec<_> = gallery.list().into_iter().map(|b| b.name).collect();
        assert_eq!(names, vec!["third", "second"]);
    }

    #[test]
    fn capacity_is_at_least_one() {
        let mut gallery = Gallery::with_capacity(0);
        assert_eq!(gallery.capacity(), 1);
        gallery.insert(blueprint("a", 1_000));
        gallery.insert(blueprint("b", 2_000));
        assert_eq!(gallery.len(), 1);
        assert_eq!(Gallery::new().capacity(), DEFAULT_GALLERY_CAPACITY);
    }
}
