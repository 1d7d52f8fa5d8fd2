//! Process-wide report cache.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use crate::filter::{EventSource, FilterSpec};
use crate::report::ComparisonReport;
use crate::window::Bucketing;

/// Cache key: the full filter selection plus the bucketing mode. Built from
/// the filter's ordered sets, so logically equal selections hit the same
/// entry regardless of input order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReportKey {
    brands: Vec<String>,
    features: Vec<String>,
    source: Option<EventSource>,
    bucketing: Bucketing,
}

impl ReportKey {
    pub fn new(filter: &FilterSpec, bucketing: Bucketing) -> Self {
        Self {
            brands: filter.brands.iter().cloned().collect(),
            features: filter.features.iter().cloned().collect(),
            source: filter.source,
            bucketing,
        }
    }
}

struct CacheEntry {
    report: ComparisonReport,
    stored_at: Instant,
}

/// TTL cache for assembled reports. Entries are read and overwritten
/// atomically per key under one async lock; expiry is checked on read.
pub struct ReportCache {
    ttl: Duration,
    entries: Mutex<HashMap<ReportKey, CacheEntry>>,
}

impl ReportCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub async fn get(&self, key: &ReportKey) -> Option<ComparisonReport> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(entry) if entry.stored_at.elapsed() < self.ttl => Some(entry.report.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub async fn put(&self, key: ReportKey, report: ComparisonReport) {
        let mut entries = self.entries.lock().await;
        entries.insert(
            key,
            CacheEntry {
                report,
                stored_at: Instant::now(),
            },
        );
    }

    /// Drop every entry. Used by explicit user-triggered refresh.
    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }
}
