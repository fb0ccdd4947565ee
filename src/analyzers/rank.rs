//! Row ordering and top-N truncation for summary tables.

use crate::analyzers::types::SummaryRow;
use crate::dataset::KeyPart;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// How rows are ordered before any truncation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RowOrder {
    /// Ascending by group key, the order of a sorted group-by.
    KeyAscending,
    /// Largest value first; ties keep first-encounter order.
    ValueDescending,
}

/// Truncation policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TopN {
    /// Keep the `n` largest rows.
    Rows(usize),
    /// Keep every row whose first key is among the `n` first keys with the
    /// largest summed value.
    Parent(usize),
}

/// Descending by value with NaN last.
fn descending(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.total_cmp(&a),
    }
}

/// Stable sort of `rows` in place.
pub fn order_rows(rows: &mut [SummaryRow], order: RowOrder) {
    match order {
        RowOrder::KeyAscending => rows.sort_by(|a, b| a.keys.cmp(&b.keys)),
        RowOrder::ValueDescending => rows.sort_by(|a, b| descending(a.value, b.value)),
    }
}

/// Applies `top` to rows in first-encounter order; equal values keep the
/// earlier row, and equal parent totals keep the earlier parent.
pub fn truncate(rows: Vec<SummaryRow>, top: TopN) -> Vec<SummaryRow> {
    match top {
        TopN::Rows(n) => {
            let mut rows = rows;
            order_rows(&mut rows, RowOrder::ValueDescending);
            rows.truncate(n);
            rows
        }
        TopN::Parent(n) => {
            let mut parents: Vec<(KeyPart, f64)> = Vec::new();
            let mut slots: HashMap<KeyPart, usize> = HashMap::new();
            for row in &rows {
                let Some(parent) = row.keys.first() else {
                    continue;
                };
                let slot = *slots.entry(parent.clone()).or_insert_with(|| {
                    parents.push((parent.clone(), 0.0));
                    parents.len() - 1
                });
                if !row.value.is_nan() {
                    parents[slot].1 += row.value;
                }
            }
            parents.sort_by(|a, b| descending(a.1, b.1));
            let kept: HashSet<KeyPart> = parents.into_iter().take(n).map(|(k, _)| k).collect();

            rows.into_iter()
                .filter(|r| r.keys.first().is_some_and(|k| kept.contains(k)))
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, value: f64) -> SummaryRow {
        SummaryRow::new(vec![KeyPart::Text(name.to_string())], value)
    }

    fn pair(parent: &str, child: f64, value: f64) -> SummaryRow {
        SummaryRow::new(
            vec![KeyPart::Text(parent.to_string()), KeyPart::Number(child)],
            value,
        )
    }

    #[test]
    fn test_descending_is_stable_on_ties() {
        let mut rows = vec![row("a", 1.0), row("b", 3.0), row("c", 1.0), row("d", 3.0)];
        order_rows(&mut rows, RowOrder::ValueDescending);

        let labels: Vec<&str> = rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["b", "d", "a", "c"]);
    }

    #[test]
    fn test_nan_sorts_last() {
        let mut rows = vec![row("a", f64::NAN), row("b", 1.0)];
        order_rows(&mut rows, RowOrder::ValueDescending);

        assert_eq!(rows[0].label, "b");
    }

    #[test]
    fn test_key_ascending() {
        let mut rows = vec![row("Worn Out", 1.0), row("Good", 2.0), row("New", 3.0)];
        order_rows(&mut rows, RowOrder::KeyAscending);

        let labels: Vec<&str> = rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["Good", "New", "Worn Out"]);
    }

    #[test]
    fn test_top_rows_keeps_largest() {
        let rows: Vec<SummaryRow> = (0..15).map(|i| row(&format!("m{i}"), i as f64)).collect();
        let kept = truncate(rows.clone(), TopN::Rows(10));

        assert_eq!(kept.len(), 10);
        let min_kept = kept.iter().map(|r| r.value).fold(f64::INFINITY, f64::min);
        let kept_labels: HashSet<&str> = kept.iter().map(|r| r.label.as_str()).collect();
        for excluded in rows.iter().filter(|r| !kept_labels.contains(r.label.as_str())) {
            assert!(min_kept >= excluded.value);
        }
    }

    #[test]
    fn test_top_rows_with_fewer_rows() {
        let kept = truncate(vec![row("a", 1.0), row("b", 2.0)], TopN::Rows(10));
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].label, "b");
    }

    #[test]
    fn test_top_parents_keeps_all_children() {
        let rows = vec![
            pair("Bus", 0.0, 1.0),
            pair("Car", 0.0, 2.0),
            pair("Car", 1.0, 2.0),
            pair("Van", 2.0, 3.0),
        ];
        let kept = truncate(rows, TopN::Parent(2));

        let labels: Vec<&str> = kept.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["Car - 0", "Car - 1", "Van - 2"]);
    }

    #[test]
    fn test_top_parents_ties_keep_first_seen() {
        let rows = vec![
            pair("Van", 0.0, 2.0),
            pair("Bus", 0.0, 1.0),
            pair("Bus", 1.0, 1.0),
            pair("Car", 0.0, 2.0),
        ];
        let kept = truncate(rows, TopN::Parent(1));

        let labels: Vec<&str> = kept.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["Van - 0"]);
    }
}
