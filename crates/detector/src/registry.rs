//! Explicit per-element detector registry.
//!
//! The at-most-one-sentinel-pair invariant is enforced through this map
//! rather than through incidental DOM queries: construction registers the
//! detector under its observed element, later constructions over the same
//! element reuse the registered pair. Entries are weak, so a dropped
//! detector falls out on the next lookup.

use crate::detector::DetectorShared;
use crate::lock;
use crate::sentinel::SentinelPair;
use resize_host::NodeKey;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

/// Weak map from observed element to the detector state watching it.
#[derive(Clone, Default)]
pub struct DetectorRegistry {
    inner: Arc<Mutex<HashMap<NodeKey, Weak<Mutex<DetectorShared>>>>>,
}

impl DetectorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sentinel pair of the live detector registered for `element`, if
    /// any. Dead entries are pruned on the way.
    pub fn lookup_pair(&self, element: NodeKey) -> Option<SentinelPair> {
        let mut map = lock(&self.inner);
        match map.get(&element).and_then(Weak::upgrade) {
            Some(shared) => {
                let pair = lock(&shared).pair;
                Some(pair)
            }
            None => {
                map.remove(&element);
                None
            }
        }
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        let mut map = lock(&self.inner);
        map.retain(|_, weak| weak.strong_count() > 0);
        map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn register(&self, element: NodeKey, shared: &Arc<Mutex<DetectorShared>>) {
        lock(&self.inner).insert(element, Arc::downgrade(shared));
    }

    pub(crate) fn unregister(&self, element: NodeKey) {
        lock(&self.inner).remove(&element);
    }
}
