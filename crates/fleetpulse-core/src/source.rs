//! Metrics source abstraction.

use thiserror::Error;

use crate::counter::{Counter, PopulationTotal};
use crate::filter::FilterSpec;
use crate::report::WindowRows;
use crate::window::ComparisonWindow;

/// Grouping key set for an aggregate fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grouping {
    BrandFeature,
    BrandFeatureHour,
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("source unreachable: {0}")]
    Unreachable(#[source] anyhow::Error),

    #[error("query timed out after {0:?}")]
    Timeout(std::time::Duration),
}

/// The engine's only external boundary: a data source that can aggregate raw
/// event counters into the two comparison windows.
///
/// Implementations must pass every filter value as a bound statement
/// parameter, never as interpolated query text. Results are sparse: absence
/// of a key combination means zero, not an explicit zero row.
#[async_trait::async_trait]
pub trait MetricsSource: Send + Sync + 'static {
    /// Aggregate the tabular counters into both window sides, grouped by
    /// `grouping`. Hour keys in the result are already hour-of-day in the
    /// declared reporting timezone; nothing downstream applies a second
    /// conversion.
    async fn fetch_aggregates(
        &self,
        window: &ComparisonWindow,
        filter: &FilterSpec,
        grouping: Grouping,
    ) -> Result<WindowRows, SourceError>;

    /// Total for a counter tracked at filter granularity only (distinct
    /// devices are not additive across brand/feature rows).
    async fn fetch_population_total(
        &self,
        window: &ComparisonWindow,
        filter: &FilterSpec,
        counter: Counter,
    ) -> Result<PopulationTotal, SourceError>;
}
