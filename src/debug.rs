//! Shared debug-mode flag and the bounded log of intercepted API calls.
//!
//! One `DebugStore` lives for the whole session behind an `Arc`; every page of
//! the dashboard reads it and every outgoing call is funnelled through
//! [`crate::intercept::Intercepted`], which appends here.

use crate::models::ApiCallRecord;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_LOG_CAPACITY: usize = 500;

#[derive(Debug, Error)]
pub enum DebugError {
    #[error("failed to capture API call: {0}")]
    Capture(String),
    #[error("failed to serialize captured body")]
    Serialize(#[from] serde_json::Error),
    #[error("no API call record with id {0}")]
    NoSuchRecord(u64),
}

struct Inner {
    enabled: bool,
    log: VecDeque<ApiCallRecord>,
}

pub struct DebugStore {
    inner: Mutex<Inner>,
    capacity: usize,
    next_id: AtomicU64,
    version: AtomicU64,
}

impl Default for DebugStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DebugStore {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_LOG_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Mutex::new(Inner { enabled: false, log: VecDeque::with_capacity(capacity.min(64)) }),
            capacity,
            next_id: AtomicU64::new(1),
            version: AtomicU64::new(0),
        }
    }

    // Each mutation is a single push/pop/clear, so the data is consistent even
    // if another holder panicked.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn bump(&self) {
        self.version.fetch_add(1, Ordering::Release);
    }

    /// Switching off clears the log. Switching on never pre-populates it.
    pub fn set_debug_mode(&self, enabled: bool) {
        let mut inner = self.lock();
        if inner.enabled == enabled {
            return;
        }
        inner.enabled = enabled;
        if !enabled {
            inner.log.clear();
        }
        drop(inner);
        debug!(enabled, "debug mode changed");
        self.bump();
    }

    pub fn debug_mode(&self) -> bool {
        self.lock().enabled
    }

    pub fn toggle(&self) -> bool {
        let next = !self.debug_mode();
        self.set_debug_mode(next);
        next
    }

    /// Snapshot of the log in completion order.
    pub fn log(&self) -> Vec<ApiCallRecord> {
        self.lock().log.iter().cloned().collect()
    }

    pub fn get(&self, index: usize) -> Option<ApiCallRecord> {
        self.lock().log.get(index).cloned()
    }

    /// Looks a record up by id; `None` once it has been evicted or cleared.
    pub fn find(&self, id: u64) -> Option<ApiCallRecord> {
        self.lock().log.iter().find(|r| r.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear_log(&self) {
        self.lock().log.clear();
        self.bump();
    }

    /// Monotonic change counter; viewers compare it to skip redundant redraws.
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    pub(crate) fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Appends a record regardless of the current flag: the capture decision was
    /// already made when the call was dispatched. Evicts the oldest entry when full.
    pub fn record(&self, record: ApiCallRecord) {
        let mut inner = self.lock();
        if inner.log.len() == self.capacity {
            inner.log.pop_front();
        }
        inner.log.push_back(record);
        drop(inner);
        self.bump();
    }
}
