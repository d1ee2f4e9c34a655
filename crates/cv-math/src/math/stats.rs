//! Descriptive statistics over `f64` slices.
//!
//! Conventions match the tabular tooling the datasets come from:
//! sample standard deviation (n - 1) and linearly interpolated quantiles.

/// Arithmetic mean. Returns `None` for empty input.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (denominator n - 1).
///
/// Returns `None` for fewer than two values.
pub fn std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some((ss / (values.len() - 1) as f64).sqrt())
}

/// Median via linear interpolation.
pub fn median(values: &[f64]) -> Option<f64> {
    quantile(values, 0.5)
}

/// Quantile `q` in `[0, 1]` with linear interpolation between order statistics.
///
/// NaN values are ignored. Returns `None` when no finite values remain or `q`
/// is outside `[0, 1]`.
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if !(0.0..=1.0).contains(&q) {
        return None;
    }
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);
    Some(quantile_sorted(&sorted, q))
}

/// Several quantiles at once, sorting only once.
pub fn quantiles(values: &[f64], qs: &[f64]) -> Option<Vec<f64>> {
    if qs.iter().any(|q| !(0.0..=1.0).contains(q)) {
        return None;
    }
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);
    Some(qs.iter().map(|&q| quantile_sorted(&sorted, q)).collect())
}

fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Round to a fixed number of decimal places.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_and_std() {
        let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_eq!(mean(&v), Some(5.0));
        let sd = std_dev(&v).unwrap();
        assert!((sd - 2.138_089_935_299_395).abs() < 1e-12);
    }

    #[test]
    fn empty_inputs_yield_none() {
        assert_eq!(mean(&[]), None);
        assert_eq!(median(&[]), None);
        assert_eq!(std_dev(&[1.0]), None);
    }

    #[test]
    fn quantile_interpolates() {
        let v = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile(&v, 0.0), Some(1.0));
        assert_eq!(quantile(&v, 1.0), Some(4.0));
        assert_eq!(median(&v), Some(2.5));
        assert_eq!(quantile(&v, 0.25), Some(1.75));
    }

    #[test]
    fn quantile_rejects_out_of_range() {
        assert_eq!(quantile(&[1.0], 1.5), None);
        assert_eq!(quantiles(&[1.0], &[0.5, -0.1]), None);
    }

    #[test]
    fn quantiles_match_single_calls() {
        let v = [9.0, 1.0, 5.0, 3.0, 7.0];
        let qs = quantiles(&v, &[0.25, 0.5, 0.75]).unwrap();
        assert_eq!(qs[0], quantile(&v, 0.25).unwrap());
        assert_eq!(qs[1], 5.0);
        assert_eq!(qs[2], quantile(&v, 0.75).unwrap());
    }

    #[test]
    fn rounding() {
        assert_eq!(round_to(0.666_666, 3), 0.667);
        assert_eq!(round_to(12.344, 2), 12.34);
    }
}
