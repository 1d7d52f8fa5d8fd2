//! Threshold-rule observations over an assembled report.

use serde::Serialize;

use crate::counter::{Counter, PopulationTotal};
use crate::report::MetricRow;

/// Named thresholds, in percentage points. Kept explicit so the rules read
/// in one place instead of inline in formatting code.
#[derive(Debug, Clone)]
pub struct InsightRules {
    /// Absolute `pct_diff` beyond which a move is worth flagging.
    pub swing_pct: f64,
    /// `pct_diff` at or above which a move reads as a surge.
    pub surge_pct: f64,
    /// `pct_diff` at or below which a move reads as a collapse.
    pub collapse_pct: f64,
}

impl Default for InsightRules {
    fn default() -> Self {
        Self {
            swing_pct: 20.0,
            surge_pct: 50.0,
            collapse_pct: -50.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    Surge,
    Rising,
    Falling,
    Collapse,
    NewActivity,
    WentQuiet,
    PopulationShift,
}

#[derive(Debug, Clone, Serialize)]
pub struct Insight {
    pub kind: InsightKind,
    pub counter: Counter,
    /// Row the observation is about; absent for filter-level totals.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feature: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pct_diff: Option<f64>,
    pub message: String,
}

/// Pure function over the already-merged rowset: no fetching, no state.
/// Rows with an undefined percentage never produce percentage insights.
pub fn derive_insights(
    rows: &[MetricRow],
    population: Option<&PopulationTotal>,
    rules: &InsightRules,
) -> Vec<Insight> {
    let mut insights = Vec::new();

    for row in rows {
        for (&counter, value) in &row.counters {
            let subject = format!("{}/{}", row.key.brand, row.key.feature);
            if value.today == 0.0 && value.last_week > 0.0 {
                insights.push(Insight {
                    kind: InsightKind::WentQuiet,
                    counter,
                    brand: Some(row.key.brand.clone()),
                    feature: Some(row.key.feature.clone()),
                    pct_diff: value.pct_diff,
                    message: format!(
                        "{subject} {} went quiet: {} last week, nothing today",
                        counter.as_str(),
                        value.last_week
                    ),
                });
                continue;
            }
            match value.pct_diff {
                Some(pct) if pct >= rules.surge_pct => insights.push(Insight {
                    kind: InsightKind::Surge,
                    counter,
                    brand: Some(row.key.brand.clone()),
                    feature: Some(row.key.feature.clone()),
                    pct_diff: Some(pct),
                    message: format!(
                        "{subject} {} surged {pct:+.1}% vs last week",
                        counter.as_str()
                    ),
                }),
                Some(pct) if pct > rules.swing_pct => insights.push(Insight {
                    kind: InsightKind::Rising,
                    counter,
                    brand: Some(row.key.brand.clone()),
                    feature: Some(row.key.feature.clone()),
                    pct_diff: Some(pct),
                    message: format!(
                        "{subject} {} up {pct:+.1}% vs last week",
                        counter.as_str()
                    ),
                }),
                Some(pct) if pct <= rules.collapse_pct => insights.push(Insight {
                    kind: InsightKind::Collapse,
                    counter,
                    brand: Some(row.key.brand.clone()),
                    feature: Some(row.key.feature.clone()),
                    pct_diff: Some(pct),
                    message: format!(
                        "{subject} {} collapsed {pct:+.1}% vs last week",
                        counter.as_str()
                    ),
                }),
                Some(pct) if pct < -rules.swing_pct => insights.push(Insight {
                    kind: InsightKind::Falling,
                    counter,
                    brand: Some(row.key.brand.clone()),
                    feature: Some(row.key.feature.clone()),
                    pct_diff: Some(pct),
                    message: format!(
                        "{subject} {} down {pct:+.1}% vs last week",
                        counter.as_str()
                    ),
                }),
                None if value.today > 0.0 => insights.push(Insight {
                    kind: InsightKind::NewActivity,
                    counter,
                    brand: Some(row.key.brand.clone()),
                    feature: Some(row.key.feature.clone()),
                    pct_diff: None,
                    message: format!(
                        "{subject} {} is new activity: {} today, none last week",
                        counter.as_str(),
                        value.today
                    ),
                }),
                _ => {}
            }
        }
    }

    if let Some(total) = population {
        if let Some(pct) = total.value.pct_diff {
            if pct.abs() > rules.swing_pct {
                insights.push(Insight {
                    kind: InsightKind::PopulationShift,
                    counter: total.counter,
                    brand: None,
                    feature: None,
                    pct_diff: Some(pct),
                    message: format!(
                        "{} across the selection moved {pct:+.1}% vs last week",
                        total.counter.as_str()
                    ),
                });
            }
        }
    }

    insights
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counter::MetricValue;
    use crate::report::GroupingKey;

    fn row_with(counter: Counter, today: f64, last_week: f64) -> MetricRow {
        MetricRow {
            key: GroupingKey {
                brand: "acme".to_string(),
                feature: "oobe".to_string(),
                hour: None,
            },
            counters: [(counter, MetricValue::from_windows(today, last_week))]
                .into_iter()
                .collect(),
        }
    }

    fn kinds(rows: &[MetricRow]) -> Vec<InsightKind> {
        derive_insights(rows, None, &InsightRules::default())
            .into_iter()
            .map(|i| i.kind)
            .collect()
    }

    #[test]
    fn large_positive_move_is_a_surge() {
        assert_eq!(
            kinds(&[row_with(Counter::Revenue, 180.0, 100.0)]),
            vec![InsightKind::Surge]
        );
    }

    #[test]
    fn moderate_moves_flag_direction() {
        assert_eq!(
            kinds(&[row_with(Counter::Installs, 130.0, 100.0)]),
            vec![InsightKind::Rising]
        );
        assert_eq!(
            kinds(&[row_with(Counter::Installs, 70.0, 100.0)]),
            vec![InsightKind::Falling]
        );
    }

    #[test]
    fn small_moves_stay_silent() {
        assert!(kinds(&[row_with(Counter::Revenue, 110.0, 100.0)]).is_empty());
    }

    #[test]
    fn zero_baseline_with_activity_is_new_activity_not_a_percentage() {
        let insights = derive_insights(
            &[row_with(Counter::Revenue, 50.0, 0.0)],
            None,
            &InsightRules::default(),
        );
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].kind, InsightKind::NewActivity);
        assert_eq!(insights[0].pct_diff, None);
    }

    #[test]
    fn vanished_activity_reads_went_quiet() {
        assert_eq!(
            kinds(&[row_with(Counter::Installs, 0.0, 40.0)]),
            vec![InsightKind::WentQuiet]
        );
    }

    #[test]
    fn population_swing_is_reported_without_a_row_subject() {
        let total = PopulationTotal {
            counter: Counter::NewDevices,
            value: MetricValue::from_windows(30.0, 100.0),
        };
        let insights = derive_insights(&[], Some(&total), &InsightRules::default());
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].kind, InsightKind::PopulationShift);
        assert_eq!(insights[0].brand, None);
    }
}
