//! Window merge, delta computation, and report assembly.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::counter::{Counter, MetricValue, PopulationTotal};
use crate::window::{Bucketing, WindowMeta};

/// Dimensions a metric row is aggregated by. Ordering is (brand, feature,
/// hour) ascending, which fixes the display and test ordering of every
/// merged rowset.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct GroupingKey {
    pub brand: String,
    pub feature: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hour: Option<u32>,
}

/// Sparse aggregate row for one window side, as returned by the source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRow {
    pub brand: String,
    pub feature: String,
    pub hour: Option<u32>,
    pub counters: BTreeMap<Counter, f64>,
}

impl RawRow {
    pub fn key(&self) -> GroupingKey {
        GroupingKey {
            brand: self.brand.clone(),
            feature: self.feature.clone(),
            hour: self.hour,
        }
    }
}

/// The two sides of one aggregate fetch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WindowRows {
    pub today: Vec<RawRow>,
    pub last_week: Vec<RawRow>,
}

/// One merged row: every tabular counter compared across the two windows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRow {
    #[serde(flatten)]
    pub key: GroupingKey,
    pub counters: BTreeMap<Counter, MetricValue>,
}

/// Full outer join of the two window rowsets on the grouping key.
///
/// Every key present on either side appears exactly once; the missing side
/// reads as zero. Each output row carries the full [`Counter::TABULAR`] set,
/// so counter sets that differ between the two fetches are normalized (an
/// absent counter is 0), never surfaced as an error. Duplicate keys within
/// one side accumulate. `BTreeMap` iteration gives the ascending
/// (brand, feature, hour) output order.
pub fn merge_windows(rows: WindowRows) -> Vec<MetricRow> {
    type Side = BTreeMap<Counter, f64>;
    let mut joined: BTreeMap<GroupingKey, (Side, Side)> = BTreeMap::new();

    for row in rows.today {
        let sides = joined.entry(row.key()).or_default();
        for (counter, value) in row.counters {
            *sides.0.entry(counter).or_insert(0.0) += value;
        }
    }
    for row in rows.last_week {
        let sides = joined.entry(row.key()).or_default();
        for (counter, value) in row.counters {
            *sides.1.entry(counter).or_insert(0.0) += value;
        }
    }

    joined
        .into_iter()
        .map(|(key, (today, last_week))| MetricRow {
            key,
            counters: Counter::TABULAR
                .iter()
                .map(|&counter| {
                    let t = today.get(&counter).copied().unwrap_or(0.0);
                    let l = last_week.get(&counter).copied().unwrap_or(0.0);
                    (counter, MetricValue::from_windows(t, l))
                })
                .collect(),
        })
        .collect()
}

/// Drop today-side hourly rows after `current_hour`.
///
/// A warehouse may zero-fill hours that have not happened yet; keeping them
/// would imply data exists for the future. Last-week rows are not truncated.
/// Daily rows (no hour key) pass through.
pub fn truncate_future_hours(rows: &mut Vec<RawRow>, current_hour: u32) {
    rows.retain(|row| row.hour.map_or(true, |h| h <= current_hour));
}

/// Whether a report holds live warehouse data or the clearly-labeled
/// placeholder dataset served when the source is unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataOrigin {
    Live,
    Placeholder,
}

/// The merged result set handed to rendering, export, and insight derivation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonReport {
    pub window: WindowMeta,
    pub bucketing: Bucketing,
    pub origin: DataOrigin,
    pub rows: Vec<MetricRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub population: Option<PopulationTotal>,
}

impl ComparisonReport {
    /// The brand-combined view of this report. The population total is
    /// carried through untouched; it already represents the full filtered
    /// population and must not be re-scaled.
    pub fn combined(&self) -> ComparisonReport {
        ComparisonReport {
            window: self.window.clone(),
            bucketing: self.bucketing,
            origin: self.origin,
            rows: crate::combine::combine_brands(&self.rows),
            population: self.population.clone(),
        }
    }
}
