pub mod aggregates;
pub mod population;

use chrono::{DateTime, Utc};

use fleetpulse_core::filter::FilterSpec;

/// Format a UTC instant the way `delivery_events.occurred_at` is stored.
pub(crate) fn bind_instant(instant: &DateTime<Utc>) -> String {
    instant
        .naive_utc()
        .format("%Y-%m-%d %H:%M:%S%.6f")
        .to_string()
}

/// `?N, ?N+1, ...` placeholder list for `len` values starting at `*idx`,
/// advancing `*idx` past them.
fn placeholder_list(idx: &mut usize, len: usize) -> String {
    let list = (*idx..*idx + len)
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ");
    *idx += len;
    list
}

/// Append the brand/feature/source restriction as `AND ... IN (?..)` clauses.
///
/// Every value is a bound parameter; nothing from the filter is ever spliced
/// into the SQL text. The filter's sets are ordered, so the generated SQL and
/// parameter list are stable for a given selection.
pub(crate) fn filter_clause(
    filter: &FilterSpec,
    idx: &mut usize,
    params: &mut Vec<Box<dyn duckdb::types::ToSql>>,
) -> String {
    let mut sql = format!(
        " AND brand IN ({})",
        placeholder_list(idx, filter.brands.len())
    );
    for brand in &filter.brands {
        params.push(Box::new(brand.clone()));
    }

    sql.push_str(&format!(
        " AND feature IN ({})",
        placeholder_list(idx, filter.features.len())
    ));
    for feature in &filter.features {
        params.push(Box::new(feature.clone()));
    }

    if let Some(source) = filter.source {
        sql.push_str(&format!(" AND source = ?{}", *idx));
        *idx += 1;
        params.push(Box::new(source.as_str().to_string()));
    }

    sql
}
