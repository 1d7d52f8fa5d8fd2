//! The comparative metrics aggregation engine.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use chrono_tz::Tz;
use tracing::{debug, info};

use crate::cache::{ReportCache, ReportKey};
use crate::counter::Counter;
use crate::error::EngineError;
use crate::filter::FilterSpec;
use crate::report::{merge_windows, truncate_future_hours, ComparisonReport, DataOrigin};
use crate::source::{Grouping, MetricsSource};
use crate::window::{hour_in_tz, Bucketing, ComparisonWindow};

/// Orchestrates one fetch: validate the filter, define the windows at the
/// current instant, fetch both sides, truncate not-yet-populated hours,
/// merge, and attach the population total. Results are cached per
/// (filter, bucketing) for the configured TTL.
pub struct ComparisonEngine {
    source: Arc<dyn MetricsSource>,
    timezone: Tz,
    cache: ReportCache,
}

impl ComparisonEngine {
    pub fn new(source: Arc<dyn MetricsSource>, timezone: Tz, cache_ttl: Duration) -> Self {
        Self {
            source,
            timezone,
            cache: ReportCache::new(cache_ttl),
        }
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// The merged comparison report for `filter` at `bucketing` granularity.
    ///
    /// The window is re-evaluated on every live fetch so `today_end` tracks
    /// the caller's current instant; a cache hit returns the previously
    /// assembled rowset without re-querying.
    pub async fn report(
        &self,
        filter: &FilterSpec,
        bucketing: Bucketing,
    ) -> Result<ComparisonReport, EngineError> {
        filter.validate()?;

        let key = ReportKey::new(filter, bucketing);
        if let Some(report) = self.cache.get(&key).await {
            debug!(?bucketing, "report cache hit");
            return Ok(report);
        }

        let window = ComparisonWindow::for_reference(Utc::now(), self.timezone);
        let grouping = match bucketing {
            Bucketing::Day => Grouping::BrandFeature,
            Bucketing::Hour => Grouping::BrandFeatureHour,
        };

        let mut rows = self.source.fetch_aggregates(&window, filter, grouping).await?;
        if bucketing == Bucketing::Hour {
            // Hours after the current hour in the reporting timezone have not
            // happened yet for today; drop them even if the source zero-filled
            // them. Last week keeps all 24.
            let current_hour = hour_in_tz(window.reference_instant, self.timezone);
            truncate_future_hours(&mut rows.today, current_hour);
        }

        let population = self
            .source
            .fetch_population_total(&window, filter, Counter::NewDevices)
            .await?;

        let report = ComparisonReport {
            window: window.to_metadata(),
            bucketing,
            origin: DataOrigin::Live,
            rows: merge_windows(rows),
            population: Some(population),
        };

        info!(rows = report.rows.len(), ?bucketing, "report assembled");
        self.cache.put(key, report.clone()).await;
        Ok(report)
    }

    /// Drop every cached report; the next call re-queries the source.
    pub async fn invalidate(&self) {
        self.cache.clear().await;
        info!("report cache invalidated");
    }
}
