use async_trait::async_trait;

use fleetpulse_core::counter::{Counter, PopulationTotal};
use fleetpulse_core::filter::FilterSpec;
use fleetpulse_core::report::WindowRows;
use fleetpulse_core::source::{Grouping, MetricsSource, SourceError};
use fleetpulse_core::window::ComparisonWindow;

use crate::DuckDbBackend;

#[async_trait]
impl MetricsSource for DuckDbBackend {
    async fn fetch_aggregates(
        &self,
        window: &ComparisonWindow,
        filter: &FilterSpec,
        grouping: Grouping,
    ) -> Result<WindowRows, SourceError> {
        crate::queries::aggregates::fetch_aggregates_inner(self, window, filter, grouping)
            .await
            .map_err(SourceError::Unreachable)
    }

    async fn fetch_population_total(
        &self,
        window: &ComparisonWindow,
        filter: &FilterSpec,
        counter: Counter,
    ) -> Result<PopulationTotal, SourceError> {
        crate::queries::population::fetch_population_total_inner(self, window, filter, counter)
            .await
            .map_err(SourceError::Unreachable)
    }
}
