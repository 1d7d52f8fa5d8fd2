//! Brand combination.

use std::collections::{BTreeMap, BTreeSet};

use crate::counter::{Counter, MetricValue};
use crate::report::{GroupingKey, MetricRow};

/// Label recorded on a synthetic combined row.
pub fn combined_label(brand_count: usize) -> String {
    format!("combined ({brand_count} brands)")
}

/// Collapse rows that differ only in brand into one synthetic row per
/// remaining key (feature, or feature+hour).
///
/// Both window sides are summed independently across the contributing rows
/// and the derived metrics are recomputed from the sums — never by averaging
/// per-brand percentages, since percentage-of-sums differs from
/// sum-of-percentages. A summed zero baseline therefore still yields an
/// undefined percentage.
///
/// With fewer than two distinct brands present this is a pass-through.
pub fn combine_brands(rows: &[MetricRow]) -> Vec<MetricRow> {
    let brands: BTreeSet<&str> = rows.iter().map(|r| r.key.brand.as_str()).collect();
    if brands.len() < 2 {
        return rows.to_vec();
    }
    let label = combined_label(brands.len());

    // (feature, hour) -> counter -> (today sum, last_week sum)
    let mut sums: BTreeMap<(String, Option<u32>), BTreeMap<Counter, (f64, f64)>> = BTreeMap::new();
    for row in rows {
        let slot = sums
            .entry((row.key.feature.clone(), row.key.hour))
            .or_default();
        for (counter, value) in &row.counters {
            let acc = slot.entry(*counter).or_insert((0.0, 0.0));
            acc.0 += value.today;
            acc.1 += value.last_week;
        }
    }

    sums.into_iter()
        .map(|((feature, hour), counters)| MetricRow {
            key: GroupingKey {
                brand: label.clone(),
                feature,
                hour,
            },
            counters: counters
                .into_iter()
                .map(|(counter, (today, last_week))| {
                    (counter, MetricValue::from_windows(today, last_week))
                })
                .collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(brand: &str, feature: &str, hour: Option<u32>, today: f64, last_week: f64) -> MetricRow {
        MetricRow {
            key: GroupingKey {
                brand: brand.to_string(),
                feature: feature.to_string(),
                hour,
            },
            counters: Counter::TABULAR
                .iter()
                .map(|&c| (c, MetricValue::from_windows(today, last_week)))
                .collect(),
        }
    }

    #[test]
    fn combination_sums_both_sides_and_recomputes() {
        // 100 vs ~91 (+10%) and 200 vs ~133 (+50%): the naive percentage
        // average would be 30%, the recomputed one is not.
        let rows = vec![
            row("acme", "oobe", None, 100.0, 90.909),
            row("zephyr", "oobe", None, 200.0, 133.333),
        ];
        let combined = combine_brands(&rows);
        assert_eq!(combined.len(), 1);
        let value = combined[0].counters[&Counter::Revenue];
        assert_eq!(value.today, 300.0);
        let expected = ((300.0 - 224.242) / 224.242 * 1000.0_f64).round() / 10.0;
        assert_eq!(value.pct_diff, Some(expected));
        assert_ne!(value.pct_diff, Some(30.0));
        assert_eq!(combined[0].key.brand, "combined (2 brands)");
    }

    #[test]
    fn combination_is_sum_preserving_per_remaining_key() {
        let rows = vec![
            row("acme", "oobe", Some(3), 10.0, 5.0),
            row("zephyr", "oobe", Some(3), 30.0, 15.0),
            row("acme", "gotw", Some(3), 7.0, 0.0),
        ];
        let combined = combine_brands(&rows);
        assert_eq!(combined.len(), 2);
        let gotw = &combined[0];
        let oobe = &combined[1];
        assert_eq!(gotw.key.feature, "gotw");
        assert_eq!(gotw.counters[&Counter::Installs].today, 7.0);
        assert_eq!(oobe.counters[&Counter::Installs].today, 40.0);
        assert_eq!(oobe.counters[&Counter::Installs].last_week, 20.0);
    }

    #[test]
    fn zero_summed_baseline_stays_undefined() {
        let rows = vec![
            row("acme", "oobe", None, 10.0, 0.0),
            row("zephyr", "oobe", None, 4.0, 0.0),
        ];
        let combined = combine_brands(&rows);
        let value = combined[0].counters[&Counter::Revenue];
        assert_eq!(value.today, 14.0);
        assert_eq!(value.pct_diff, None);
    }

    #[test]
    fn single_brand_is_a_no_op() {
        let rows = vec![
            row("acme", "oobe", None, 10.0, 5.0),
            row("acme", "gotw", None, 3.0, 6.0),
        ];
        assert_eq!(combine_brands(&rows), rows);
    }

    #[test]
    fn empty_input_passes_through() {
        assert!(combine_brands(&[]).is_empty());
    }
}
