/// Keeps only the values that take part in numeric reductions.
pub fn finite(values: impl IntoIterator<Item = f64>) -> Vec<f64> {
    values.into_iter().filter(|v| !v.is_nan()).collect()
}

/// Computes the arithmetic mean of a slice of values. Returns NaN for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Computes the sample standard deviation (n - 1) given a pre-computed mean.
/// Returns NaN for fewer than two values.
pub fn stddev(values: &[f64], mean: f64) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;

    variance.sqrt()
}

/// Rounds half away from zero to `places` decimal digits.
pub fn round_to(value: f64, places: i32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_empty_is_nan() {
        assert!(mean(&[]).is_nan());
    }

    #[test]
    fn test_mean_and_stddev() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let avg = mean(&values);

        assert_eq!(avg, 5.0);
        assert_eq!(round_to(stddev(&values, avg), 3), 2.138);
    }

    #[test]
    fn test_stddev_needs_two_values() {
        assert!(stddev(&[3.0], 3.0).is_nan());
    }

    #[test]
    fn test_finite_drops_nan() {
        assert_eq!(finite([1.0, f64::NAN, 3.0]), vec![1.0, 3.0]);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(66.66666, 3), 66.667);
        assert_eq!(round_to(0.175, 2), 0.18);
        assert_eq!(round_to(2.5, 0), 3.0);
        assert!(round_to(f64::NAN, 2).is_nan());
    }
}
