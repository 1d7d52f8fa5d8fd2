//! Counter names and per-counter comparison values.

use serde::{Deserialize, Serialize};

/// Named counters tracked by the metrics source.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Counter {
    Revenue,
    NotificationsShown,
    ExperiencesShown,
    Installs,
    NewDevices,
}

impl Counter {
    /// Counters aggregated per grouping key, in display order.
    ///
    /// `NewDevices` is excluded: it is tracked at filter granularity only,
    /// because the same device shows up under several brand/feature
    /// combinations and summing per-row values would double count it.
    pub const TABULAR: [Counter; 4] = [
        Counter::Revenue,
        Counter::NotificationsShown,
        Counter::ExperiencesShown,
        Counter::Installs,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Counter::Revenue => "revenue",
            Counter::NotificationsShown => "notifications_shown",
            Counter::ExperiencesShown => "experiences_shown",
            Counter::Installs => "installs",
            Counter::NewDevices => "new_devices",
        }
    }

    pub fn is_currency(&self) -> bool {
        matches!(self, Counter::Revenue)
    }
}

/// Round to one decimal place.
pub(crate) fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

/// One counter's comparison across the two windows.
///
/// `diff` is always `today - last_week`. `pct_diff` exists only when the
/// last-week baseline is positive; a zero baseline makes relative change
/// meaningless, so the field stays `None` (JSON `null`) rather than being
/// coerced to 0 or a sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricValue {
    pub today: f64,
    pub last_week: f64,
    pub diff: f64,
    pub pct_diff: Option<f64>,
}

impl MetricValue {
    pub fn from_windows(today: f64, last_week: f64) -> Self {
        let diff = today - last_week;
        let pct_diff = (last_week > 0.0).then(|| round1(diff / last_week * 100.0));
        Self {
            today,
            last_week,
            diff,
            pct_diff,
        }
    }
}

/// A filter-granularity total attached to a report as metadata rather than
/// as rows. Brand combination carries it through unchanged since it already
/// covers the full filtered population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationTotal {
    pub counter: Counter,
    pub value: MetricValue,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delta_and_percentage_from_positive_baseline() {
        let value = MetricValue::from_windows(120.0, 100.0);
        assert_eq!(value.diff, 20.0);
        assert_eq!(value.pct_diff, Some(20.0));
    }

    #[test]
    fn zero_baseline_leaves_percentage_undefined() {
        let value = MetricValue::from_windows(50.0, 0.0);
        assert_eq!(value.diff, 50.0);
        assert_eq!(value.pct_diff, None);
    }

    #[test]
    fn percentage_rounds_to_one_decimal() {
        let value = MetricValue::from_windows(1.0, 3.0);
        assert_eq!(value.pct_diff, Some(-66.7));
    }

    #[test]
    fn tabular_set_excludes_new_devices() {
        assert!(!Counter::TABULAR.contains(&Counter::NewDevices));
        assert_eq!(Counter::TABULAR.len(), 4);
    }

    #[test]
    fn counter_serializes_as_snake_case() {
        let json = serde_json::to_string(&Counter::NotificationsShown).expect("serialize");
        assert_eq!(json, "\"notifications_shown\"");
    }
}
