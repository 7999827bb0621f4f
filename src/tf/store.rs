//! Transform table keyed by `(parent, child)` frame names.
//!
//! Static and dynamic transform streams are merged into the same table. There
//! is no history and no graph search: each key holds the latest transform.

use std::collections::HashMap;

use crate::core::types::Transform;

/// Strip leading `/` from a frame id (`/map` and `map` are the same frame).
#[inline]
pub fn normalize_frame_id(name: &str) -> &str {
    name.trim_start_matches('/')
}

/// Compose `a` then `b`; see [`Transform::compose`].
#[inline]
pub fn compose(a: &Transform, b: &Transform) -> Transform {
    a.compose(b)
}

/// One stamped transform from an inbound batch.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformEntry {
    pub parent: String,
    pub child: String,
    pub transform: Transform,
}

impl TransformEntry {
    pub fn new(parent: impl Into<String>, child: impl Into<String>, transform: Transform) -> Self {
        Self {
            parent: parent.into(),
            child: child.into(),
            transform,
        }
    }
}

/// Latest transform per `(parent, child)` pair.
#[derive(Debug, Default, Clone)]
pub struct TransformStore {
    /// parent -> child -> transform
    entries: HashMap<String, HashMap<String, Transform>>,
    len: usize,
}

impl TransformStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the transform for `(parent, child)`.
    ///
    /// Returns `false` without touching the table when either name is empty
    /// after normalization.
    pub fn upsert(&mut self, parent: &str, child: &str, transform: Transform) -> bool {
        let parent = normalize_frame_id(parent);
        let child = normalize_frame_id(child);
        if parent.is_empty() || child.is_empty() {
            return false;
        }

        let stored = Transform::new(transform.translation, transform.rotation);
        let children = self.entries.entry(parent.to_string()).or_default();
        if children.insert(child.to_string(), stored).is_none() {
            self.len += 1;
        }
        true
    }

    /// Apply every entry of a batch; returns how many were accepted.
    pub fn upsert_batch(&mut self, entries: &[TransformEntry]) -> usize {
        entries
            .iter()
            .filter(|e| self.upsert(&e.parent, &e.child, e.transform))
            .count()
    }

    /// Direct lookup of `(parent, child)`. Never chains transforms.
    pub fn lookup(&self, parent: &str, child: &str) -> Option<Transform> {
        self.entries
            .get(normalize_frame_id(parent))?
            .get(normalize_frame_id(child))
            .copied()
    }

    /// Number of stored `(parent, child)` pairs.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Drop every transform (used when the bus reconnects).
    pub fn clear(&mut self) {
        self.entries.clear();
        self.len = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Quaternion, Vec3};
    use approx::assert_relative_eq;

    #[test]
    fn test_upsert_and_lookup() {
        let mut store = TransformStore::new();
        assert!(store.upsert("map", "odom", Transform::planar(1.0, 2.0, 0.0)));
        let t = store.lookup("map", "odom").unwrap();
        assert_relative_eq!(t.translation.x, 1.0);
        assert_relative_eq!(t.translation.y, 2.0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_leading_slashes_are_stripped() {
        let mut store = TransformStore::new();
        assert!(store.upsert("/map", "//odom", Transform::identity()));
        assert!(store.lookup("map", "odom").is_some());
        assert!(store.lookup("/map", "/odom").is_some());
    }

    #[test]
    fn test_empty_names_rejected() {
        let mut store = TransformStore::new();
        assert!(!store.upsert("", "odom", Transform::identity()));
        assert!(!store.upsert("map", "", Transform::identity()));
        assert!(!store.upsert("///", "odom", Transform::identity()));
        assert!(store.is_empty());
    }

    #[test]
    fn test_last_write_wins() {
        let mut store = TransformStore::new();
        store.upsert("odom", "base_link", Transform::planar(1.0, 0.0, 0.0));
        store.upsert("odom", "base_link", Transform::planar(5.0, 0.0, 0.0));
        assert_eq!(store.len(), 1);
        assert_relative_eq!(store.lookup("odom", "base_link").unwrap().translation.x, 5.0);
    }

    #[test]
    fn test_lookup_is_direct_only() {
        let mut store = TransformStore::new();
        store.upsert("map", "odom", Transform::identity());
        store.upsert("odom", "base_link", Transform::identity());
        assert!(store.lookup("map", "base_link").is_none());
        // Keys are directional
        assert!(store.lookup("odom", "map").is_none());
    }

    #[test]
    fn test_stored_rotation_is_normalized() {
        let mut store = TransformStore::new();
        let raw = Transform {
            translation: Vec3::ZERO,
            rotation: Quaternion::new(0.0, 0.0, 0.0, 4.0),
        };
        store.upsert("map", "odom", raw);
        assert_relative_eq!(store.lookup("map", "odom").unwrap().rotation.w, 1.0);
    }

    #[test]
    fn test_batch_counts_accepted() {
        let mut store = TransformStore::new();
        let batch = vec![
            TransformEntry::new("map", "odom", Transform::identity()),
            TransformEntry::new("", "odom", Transform::identity()),
            TransformEntry::new("odom", "base_footprint", Transform::identity()),
        ];
        assert_eq!(store.upsert_batch(&batch), 2);
        assert_eq!(store.len(), 2);
        store.clear();
        assert!(store.is_empty());
        assert!(store.lookup("map", "odom").is_none());
    }
}
