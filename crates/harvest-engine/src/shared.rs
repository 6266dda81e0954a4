//! Thread-safe collector handle.
//!
//! All mutation of a collector goes through its mutex, so concurrent
//! `collect` calls serialize and never double-count elapsed time. Readers
//! that only need the latest collection detail use the published copy
//! and never contend with writers.

use crate::collector::{Collection, CollectionDetail, ResourceCollector};
use crate::error::Result;
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct SharedCollector {
    inner: Arc<Mutex<ResourceCollector>>,
    published: Arc<RwLock<Option<CollectionDetail>>>,
}

impl SharedCollector {
    pub fn new(collector: ResourceCollector) -> Self {
        let published = collector.last_collection_detail().ok();
        Self {
            inner: Arc::new(Mutex::new(collector)),
            published: Arc::new(RwLock::new(published)),
        }
    }

    /// Run `f` with exclusive access, then republish the latest detail.
    pub fn with<T>(&self, f: impl FnOnce(&mut ResourceCollector) -> T) -> T {
        let mut collector = self.inner.lock();
        let out = f(&mut *collector);
        *self.published.write() = collector.last_collection_detail().ok();
        out
    }

    /// Run `f` with shared access; nothing is republished.
    pub fn read<T>(&self, f: impl FnOnce(&ResourceCollector) -> T) -> T {
        f(&*self.inner.lock())
    }

    pub fn collect(&self, now: DateTime<Utc>) -> Result<Collection> {
        self.with(|c| c.collect(now))
    }

    /// Detail of the most recent collection, without locking the collector.
    pub fn last_detail(&self) -> Option<CollectionDetail> {
        self.published.read().clone()
    }

    pub fn ptr_eq(&self, other: &SharedCollector) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}
