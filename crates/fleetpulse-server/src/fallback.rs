//! Placeholder dataset for degraded fetches.
//!
//! When the metrics source is unreachable the report routes can serve this
//! clearly-labeled stand-in instead of a blank screen. It is generated from
//! a per-key seed so repeated renders of the same selection look stable, it
//! is marked `origin: placeholder`, and it is never cached — a recovered
//! source wins on the very next request.

use std::collections::BTreeMap;
use std::hash::{DefaultHasher, Hash, Hasher};

use chrono::Utc;
use chrono_tz::Tz;
use rand::{rngs::StdRng, Rng, SeedableRng};

use fleetpulse_core::counter::{Counter, MetricValue, PopulationTotal};
use fleetpulse_core::filter::FilterSpec;
use fleetpulse_core::report::{merge_windows, ComparisonReport, DataOrigin, RawRow, WindowRows};
use fleetpulse_core::window::{hour_in_tz, Bucketing, ComparisonWindow};

pub fn placeholder_report(filter: &FilterSpec, bucketing: Bucketing, tz: Tz) -> ComparisonReport {
    let window = ComparisonWindow::for_reference(Utc::now(), tz);
    let current_hour = hour_in_tz(window.reference_instant, tz);

    let mut today = Vec::new();
    let mut last_week = Vec::new();
    for brand in &filter.brands {
        for feature in &filter.features {
            let mut rng = StdRng::seed_from_u64(seed_for(brand, feature));
            match bucketing {
                Bucketing::Day => {
                    today.push(raw_row(brand, feature, None, &mut rng));
                    last_week.push(raw_row(brand, feature, None, &mut rng));
                }
                Bucketing::Hour => {
                    // Today only up to the current hour; last week all 24.
                    for hour in 0..=current_hour {
                        today.push(raw_row(brand, feature, Some(hour), &mut rng));
                    }
                    for hour in 0..24 {
                        last_week.push(raw_row(brand, feature, Some(hour), &mut rng));
                    }
                }
            }
        }
    }

    let mut rng = StdRng::seed_from_u64(seed_for("population", "new_devices"));
    let population = PopulationTotal {
        counter: Counter::NewDevices,
        value: MetricValue::from_windows(
            rng.gen_range(50.0_f64..500.0).round(),
            rng.gen_range(50.0_f64..500.0).round(),
        ),
    };

    ComparisonReport {
        window: window.to_metadata(),
        bucketing,
        origin: DataOrigin::Placeholder,
        rows: merge_windows(WindowRows { today, last_week }),
        population: Some(population),
    }
}

fn raw_row(brand: &str, feature: &str, hour: Option<u32>, rng: &mut StdRng) -> RawRow {
    let counters: BTreeMap<Counter, f64> = Counter::TABULAR
        .iter()
        .map(|&counter| {
            let base = rng.gen_range(100.0_f64..1000.0);
            (counter, (base * 100.0).round() / 100.0)
        })
        .collect();
    RawRow {
        brand: brand.to_string(),
        feature: feature.to_string(),
        hour,
        counters,
    }
}

fn seed_for(brand: &str, feature: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    brand.hash(&mut hasher);
    feature.hash(&mut hasher);
    hasher.finish()
}
