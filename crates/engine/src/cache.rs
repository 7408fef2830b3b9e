use std::collections::{HashMap, VecDeque};

use crate::media::Frame;
use crate::time::POSITION_EPSILON;

/// LRU cache for decoded frames bucketed by timeline position.
///
/// # Example
/// ```
/// use std::sync::Arc;
///
/// use engine::Frame;
/// use engine::cache::FrameCache;
///
/// let mut cache = FrameCache::new(8, 0.04);
/// cache.insert(
///     1.5,
///     Frame {
///         width: 2,
///         height: 2,
///         bytes: Arc::from(vec![0; 16]),
///     },
/// );
///
/// assert!(cache.get(1.51).is_some());
/// ```
#[derive(Debug)]
pub struct FrameCache {
    capacity: usize,
    bucket_seconds: f64,
    entries: HashMap<i64, Frame>,
    lru_order: VecDeque<i64>,
}

impl FrameCache {
    /// Creates a frame cache.
    ///
    /// A zero `capacity` is raised to one and a non-positive bucket size
    /// falls back to one 25 fps frame.
    pub fn new(capacity: usize, bucket_seconds: f64) -> Self {
        let bucket_seconds = if bucket_seconds.is_finite() && bucket_seconds > 0.0 {
            bucket_seconds
        } else {
            1.0 / 25.0
        };
        Self {
            capacity: capacity.max(1),
            bucket_seconds,
            entries: HashMap::new(),
            lru_order: VecDeque::new(),
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.lru_order.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn bucket_seconds(&self) -> f64 {
        self.bucket_seconds
    }

    /// Returns true when a frame in the same bucket already exists.
    pub fn contains(&self, position: f64) -> bool {
        self.entries.contains_key(&self.bucket_of(position))
    }

    /// Returns one cached frame and marks it as recently used.
    pub fn get(&mut self, position: f64) -> Option<Frame> {
        let key = self.bucket_of(position);
        let frame = self.entries.get(&key)?.clone();
        self.touch(key);
        Some(frame)
    }

    pub fn insert(&mut self, position: f64, frame: Frame) {
        let key = self.bucket_of(position);
        self.entries.insert(key, frame);
        self.touch(key);
        self.evict_if_needed();
    }

    fn bucket_of(&self, position: f64) -> i64 {
        ((position.max(0.0) + POSITION_EPSILON) / self.bucket_seconds).floor() as i64
    }

    fn touch(&mut self, key: i64) {
        if let Some(index) = self.lru_order.iter().position(|existing| *existing == key) {
            let _ = self.lru_order.remove(index);
        }
        self.lru_order.push_back(key);
    }

    fn evict_if_needed(&mut self) {
        while self.entries.len() > self.capacity {
            let Some(oldest) = self.lru_order.pop_front() else {
                break;
            };
            let _ = self.entries.remove(&oldest);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::media::Frame;

    use super::FrameCache;

    #[test]
    fn get_hits_for_positions_in_the_same_frame() {
        let mut cache = FrameCache::new(8, 0.04);
        cache.insert(1.5, sample_frame(10));

        let frame = cache.get(1.51).expect("frame should be cached");
        assert_eq!(frame.bytes[0], 10);
        assert!(!cache.contains(1.56));
    }

    #[test]
    fn insert_evicts_least_recently_used_frame_when_capacity_is_reached() {
        let mut cache = FrameCache::new(2, 0.04);
        cache.insert(1.0, sample_frame(1));
        cache.insert(2.0, sample_frame(2));

        let _ = cache.get(1.0).expect("first frame should exist");
        cache.insert(3.0, sample_frame(3));

        assert!(cache.get(1.0).is_some());
        assert!(cache.get(2.0).is_none());
        assert!(cache.get(3.0).is_some());
        assert_eq!(cache.len(), 2);
    }

    fn sample_frame(value: u8) -> Frame {
        Frame {
            width: 1,
            height: 1,
            bytes: Arc::from(vec![value; 4]),
        }
    }
}
