//! Bounded LRU of recently seen message ids, used for cross-transport
//! inbound de-duplication (spec §4.5, §8 property 4).

use crate::domain_types::{DedupCacheSize, MessageId};
use std::collections::HashSet;
use std::collections::VecDeque;
use std::sync::Mutex;

/// A bounded least-recently-*inserted* cache of [`MessageId`]s.
///
/// Guarded by a single mutex with O(1) insert/contains, matching spec §5's
/// "LRU de-dup caches: guarded by a single mutex with O(1) operations."
/// Eviction is FIFO by insertion order, which is sufficient here since
/// entries are never "touched" again after insertion — the only query is
/// "have we seen this id before."
pub struct DedupCache {
    inner: Mutex<DedupCacheInner>,
}

struct DedupCacheInner {
    capacity: usize,
    order: VecDeque<MessageId>,
    members: HashSet<MessageId>,
}

impl DedupCache {
    /// Creates a cache with the given capacity.
    #[must_use]
    pub fn new(capacity: DedupCacheSize) -> Self {
        let capacity = capacity.as_usize();
        Self {
            inner: Mutex::new(DedupCacheInner {
                capacity,
                order: VecDeque::with_capacity(capacity),
                members: HashSet::with_capacity(capacity),
            }),
        }
    }

    /// Records `id` as seen and returns `true` if it was already present
    /// (i.e. this is a duplicate arrival that should be dropped silently).
    pub fn record_and_check_duplicate(&self, id: MessageId) -> bool {
        let mut inner = self.inner.lock().expect("dedup cache mutex poisoned");
        if inner.members.contains(&id) {
            return true;
        }
        if inner.order.len() >= inner.capacity {
            if let Some(oldest) = inner.order.pop_front() {
                inner.members.remove(&oldest);
            }
        }
        inner.order.push_back(id);
        inner.members.insert(id);
        false
    }

    /// Number of ids currently tracked.
    pub fn len(&self) -> usize {
        self.inner.lock().expect("dedup cache mutex poisoned").members.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
