use crate::analyzers::aggregate::TABLE_PLACES;
use crate::analyzers::types::SummaryRow;
use crate::analyzers::utility::round_to;

/// Adds a percentage to every row: its value over the sum of the rows present.
///
/// The base is whatever is in `rows` at call time, so callers truncate first.
/// NaN values do not count toward the base and get a NaN percentage. A zero
/// base gives every row 0.
pub fn normalize(rows: &mut [SummaryRow]) {
    let total: f64 = rows.iter().map(|r| r.value).filter(|v| !v.is_nan()).sum();

    for row in rows.iter_mut() {
        let pct = if total == 0.0 {
            0.0
        } else {
            row.value / total * 100.0
        };
        row.percentage = Some(round_to(pct, TABLE_PLACES));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::KeyPart;

    fn rows(values: &[f64]) -> Vec<SummaryRow> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| SummaryRow::new(vec![KeyPart::Number(i as f64)], *v))
            .collect()
    }

    #[test]
    fn test_two_to_one_split() {
        let mut r = rows(&[2.0, 1.0]);
        normalize(&mut r);

        assert_eq!(r[0].percentage, Some(66.667));
        assert_eq!(r[1].percentage, Some(33.333));
    }

    #[test]
    fn test_percentages_sum_to_hundred() {
        let mut r = rows(&[17.123, 3.5, 44.0, 0.001, 9.87]);
        normalize(&mut r);

        let total: f64 = r.iter().filter_map(|row| row.percentage).sum();
        assert!((total - 100.0).abs() <= 0.01);
    }

    #[test]
    fn test_zero_total() {
        let mut r = rows(&[0.0, 0.0]);
        normalize(&mut r);

        assert_eq!(r[0].percentage, Some(0.0));
        assert_eq!(r[1].percentage, Some(0.0));
    }

    #[test]
    fn test_nan_rows_excluded_from_base() {
        let mut r = rows(&[f64::NAN, 5.0]);
        normalize(&mut r);

        assert!(r[0].percentage.unwrap().is_nan());
        assert_eq!(r[1].percentage, Some(100.0));
    }
}
