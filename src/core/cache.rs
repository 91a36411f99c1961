use std::{
    collections::{HashMap, VecDeque},
    sync::Arc,
};

use parking_lot::RwLock;
use tracing::debug;

use crate::types::plan::TripPlan;

/// Shared store of generated plans keyed by request fingerprint.
///
/// Clones share the same entries. Unbounded unless built with
/// [`TripCache::with_capacity`], in which case the oldest insertion is
/// evicted first.
#[derive(Debug, Clone, Default)]
pub struct TripCache {
    inner: Arc<RwLock<CacheState>>,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<String, TripPlan>,
    order: VecDeque<String>,
    capacity: Option<usize>,
}

impl TripCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let state = CacheState {
            capacity: Some(capacity.max(1)),
            ..CacheState::default()
        };
        Self {
            inner: Arc::new(RwLock::new(state)),
        }
    }

    pub fn capacity(&self) -> Option<usize> {
        self.inner.read().capacity
    }

    pub fn get(&self, key: &str) -> Option<TripPlan> {
        self.inner.read().entries.get(key).cloned()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.read().entries.contains_key(key)
    }

    /// Store `plan` under `key`, replacing any previous plan.
    pub fn insert(&self, key: impl Into<String>, plan: TripPlan) {
        let key = key.into();
        let mut state = self.inner.write();

        if state.entries.insert(key.clone(), plan).is_some() {
            debug!(target: "tripplanner::cache", key = %key, "replaced cached plan");
            return;
        }
        state.order.push_back(key.clone());

        if let Some(capacity) = state.capacity {
            while state.order.len() > capacity {
                if let Some(evicted) = state.order.pop_front() {
                    state.entries.remove(&evicted);
                    debug!(target: "tripplanner::cache", key = %evicted, "evicted cached plan");
                }
            }
        }
        debug!(
            target: "tripplanner::cache",
            key = %key,
            size = state.entries.len(),
            "cached plan"
        );
    }

    pub fn remove(&self, key: &str) -> Option<TripPlan> {
        let mut state = self.inner.write();
        let removed = state.entries.remove(key);
        if removed.is_some() {
            state.order.retain(|existing| existing != key);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().entries.is_empty()
    }

    pub fn clear(&self) {
        let mut state = self.inner.write();
        state.entries.clear();
        state.order.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::plan::DayPlan;

    fn plan_with_days(days: u32) -> TripPlan {
        let itinerary = (1..=days)
            .map(|day| DayPlan {
                day,
                ..DayPlan::default()
            })
            .collect();
        TripPlan::new(Vec::new(), itinerary)
    }

    #[test]
    fn test_insert_and_get() {
        let cache = TripCache::new();
        assert!(cache.is_empty());

        cache.insert("Goa_2", plan_with_days(2));

        assert_eq!(cache.len(), 1);
        assert!(cache.contains_key("Goa_2"));
        assert_eq!(cache.get("Goa_2").unwrap().day_count(), 2);
        assert!(cache.get("Goa_3").is_none());
    }

    #[test]
    fn test_clones_share_entries() {
        let cache = TripCache::new();
        let handle = cache.clone();

        handle.insert("Goa_1", plan_with_days(1));

        assert!(cache.contains_key("Goa_1"));
    }

    #[test]
    fn test_replace_keeps_single_entry() {
        let cache = TripCache::new();
        cache.insert("Goa_3", plan_with_days(1));
        cache.insert("Goa_3", plan_with_days(3));

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("Goa_3").unwrap().day_count(), 3);
    }

    #[test]
    fn test_bounded_cache_evicts_oldest() {
        let cache = TripCache::with_capacity(2);
        cache.insert("a", plan_with_days(1));
        cache.insert("b", plan_with_days(1));
        // replacing does not refresh insertion order
        cache.insert("a", plan_with_days(2));
        cache.insert("c", plan_with_days(1));

        assert_eq!(cache.len(), 2);
        assert!(!cache.contains_key("a"));
        assert!(cache.contains_key("b"));
        assert!(cache.contains_key("c"));
    }

    #[test]
    fn test_remove_and_clear() {
        let cache = TripCache::with_capacity(2);
        cache.insert("a", plan_with_days(1));
        cache.insert("b", plan_with_days(1));

        assert!(cache.remove("a").is_some());
        cache.insert("c", plan_with_days(1));
        assert!(cache.contains_key("b"));
        assert!(cache.contains_key("c"));

        cache.clear();
        assert!(cache.is_empty());
    }
}
