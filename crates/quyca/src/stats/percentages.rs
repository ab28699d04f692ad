//! Share-of-total breakdowns for pie charts.

use std::collections::HashMap;

use serde::Serialize;

/// One slice of a breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Share {
    pub name: String,
    pub value: i64,
    /// Percentage of the total, rounded to two decimals.
    pub percentage: f64,
}

/// Round to two decimal places.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn merged<I>(counts: I) -> Vec<(String, i64)>
where
    I: IntoIterator<Item = (String, i64)>,
{
    let mut totals: HashMap<String, i64> = HashMap::new();
    for (name, value) in counts {
        *totals.entry(name).or_insert(0) += value.max(0);
    }
    let mut merged: Vec<(String, i64)> = totals.into_iter().collect();
    merged.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    merged
}

fn with_percentages(entries: Vec<(String, i64)>) -> Vec<Share> {
    let total: i64 = entries.iter().map(|(_, v)| v).sum();
    entries
        .into_iter()
        .map(|(name, value)| {
            let percentage = if total == 0 {
                0.0
            } else {
                round2(value as f64 * 100.0 / total as f64)
            };
            Share { name, value, percentage }
        })
        .collect()
}

/// Percentages of the total for each name.
///
/// Duplicate names are merged. Output is sorted by value descending, then by
/// name. A zero total yields 0 for every slice.
#[must_use]
pub fn percentages<I>(counts: I) -> Vec<Share>
where
    I: IntoIterator<Item = (String, i64)>,
{
    with_percentages(merged(counts))
}

/// The `n` largest slices plus one `rest_label` slice holding the remainder.
///
/// The remainder slice is only added when something was folded into it.
#[must_use]
pub fn top_n_with_rest<I>(counts: I, n: usize, rest_label: &str) -> Vec<Share>
where
    I: IntoIterator<Item = (String, i64)>,
{
    let mut entries = merged(counts);
    if entries.len() > n {
        let rest: i64 = entries.split_off(n).iter().map(|(_, v)| v).sum();
        entries.push((rest_label.to_string(), rest));
    }
    with_percentages(entries)
}
