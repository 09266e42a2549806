//! Shared numeric utilities used by the comparator, summarizer and key-offset
//! analyzer: population statistics and the "type 7" percentile definition.
//!
//! Every function here operates on `&[f32]` with missingness already
//! stripped out by the caller — nothing in this module propagates `NaN`.

/// Arithmetic mean. `None` for an empty slice.
pub fn mean(values: &[f32]) -> Option<f32> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f32>() / values.len() as f32)
}

/// Population standard deviation (divides by `n`, not `n - 1`).
pub fn population_std(values: &[f32]) -> Option<f32> {
    let m = mean(values)?;
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f32>() / values.len() as f32;
    Some(variance.sqrt())
}

/// Median via the linear-interpolation percentile definition below (p = 0.5).
pub fn median(values: &[f32]) -> Option<f32> {
    percentile(values, 0.5)
}

/// Linear-interpolation percentile ("type 7": the definition used by NumPy's
/// default and R's default `quantile` type). `p` is in `[0, 1]`.
///
/// Returns `None` for an empty slice. Does not mutate or require the caller's
/// slice to be pre-sorted.
pub fn percentile(values: &[f32], p: f32) -> Option<f32> {
    if values.is_empty() {
        return None;
    }
    let mut sorted: Vec<f32> = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let n = sorted.len();
    if n == 1 {
        return Some(sorted[0]);
    }
    let rank = p.clamp(0.0, 1.0) * (n - 1) as f32;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        return Some(sorted[lo]);
    }
    let frac = rank - lo as f32;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Fraction of `values` satisfying `pred`, or `0.0` for an empty slice.
pub fn fraction_where(values: &[f32], pred: impl Fn(f32) -> bool) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let hits = values.iter().filter(|&&v| pred(v)).count();
    hits as f32 / values.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_of_empty_is_none() {
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn mean_basic() {
        assert_eq!(mean(&[1.0, 2.0, 3.0]), Some(2.0));
    }

    #[test]
    fn population_std_of_constant_is_zero() {
        let std = population_std(&[5.0, 5.0, 5.0]).unwrap();
        assert!(std.abs() < 1e-6);
    }

    #[test]
    fn median_odd_count() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
    }

    #[test]
    fn median_even_count_interpolates() {
        assert_eq!(median(&[1.0, 2.0, 3.0, 4.0]), Some(2.5));
    }

    #[test]
    fn percentile_bounds() {
        let data = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(percentile(&data, 0.0), Some(1.0));
        assert_eq!(percentile(&data, 1.0), Some(5.0));
    }

    #[test]
    fn percentile_type7_matches_known_value() {
        // numpy.percentile([1,2,3,4,5,6,7,8,9,10], 10) == 1.9
        let data: Vec<f32> = (1..=10).map(|i| i as f32).collect();
        let p10 = percentile(&data, 0.10).unwrap();
        assert!((p10 - 1.9).abs() < 1e-4, "got {p10}");
    }

    #[test]
    fn fraction_where_counts_matches() {
        let data = [-50.0, -10.0, 0.0, 10.0, 50.0];
        let frac = fraction_where(&data, |v| v.abs() <= 40.0);
        assert!((frac - 0.6).abs() < 1e-6);
    }
}
