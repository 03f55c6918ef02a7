//! Goodness-of-fit tests for digit distributions.
//!
//! Provides a two-sample Kolmogorov-Smirnov test and, built on it, the Benford's
//! Law conformance test applied to leading-digit percentages. Each test returns a
//! [`TestResult`] with a p-value (where applicable), a pass/fail determination,
//! and a letter grade (A through F).
//!
//! The p-value is a heuristic signal: a high value means the observed leading-digit
//! profile cannot be told apart from Benford's reference, nothing more.

use std::cmp::Ordering;

// ═══════════════════════════════════════════════════════════════════════════════
// Core types
// ═══════════════════════════════════════════════════════════════════════════════

/// Result of a single goodness-of-fit test.
#[derive(Debug, Clone, PartialEq)]
pub struct TestResult {
    pub name: String,
    pub passed: bool,
    pub p_value: Option<f64>,
    pub statistic: f64,
    pub details: String,
    pub grade: char,
}

impl TestResult {
    /// Assign a letter grade based on p-value.
    ///
    /// - A: p >= 0.1
    /// - B: p >= 0.05
    /// - C: p >= 0.01
    /// - D: p >= 0.001
    /// - F: otherwise or None
    pub fn grade_from_p(p: Option<f64>) -> char {
        match p {
            Some(p) if p >= 0.1 => 'A',
            Some(p) if p >= 0.05 => 'B',
            Some(p) if p >= 0.01 => 'C',
            Some(p) if p >= 0.001 => 'D',
            _ => 'F',
        }
    }

    /// Determine pass/fail from p-value against a threshold.
    pub fn pass_from_p(p: Option<f64>, threshold: f64) -> bool {
        match p {
            Some(p) => p >= threshold,
            None => false,
        }
    }
}

/// Significance level used to mark a column as Benford-conformant.
pub const BENFORD_ALPHA: f64 = 0.05;

/// Expected percentage of each leading digit 1 through 9 under Benford's Law.
pub const BENFORD_REFERENCE: [f64; 9] = [30.1, 17.6, 12.5, 9.7, 7.9, 6.7, 5.8, 5.1, 4.6];

// ═══════════════════════════════════════════════════════════════════════════════
// Helpers
// ═══════════════════════════════════════════════════════════════════════════════

/// Return a failing `TestResult` when a sample is empty.
fn insufficient(name: &str, n: usize, m: usize) -> TestResult {
    TestResult {
        name: name.to_string(),
        passed: false,
        p_value: None,
        statistic: 0.0,
        details: format!("Insufficient data: need two non-empty samples, got n={n}, m={m}"),
        grade: 'F',
    }
}

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();
    out.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    out
}

/// Number of elements in the sorted slice that are `<= x`.
fn count_le(sorted: &[f64], x: f64) -> usize {
    sorted.partition_point(|&v| v <= x)
}

fn gcd(mut a: usize, mut b: usize) -> usize {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Round half away from zero to `places` decimals.
pub fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}

/// Exact two-sided p-value for equal sample sizes: probability that a lattice path
/// from (0, 0) to (n, n) leaves the band |i - j| < h.
fn exact_equal_p(n: usize, h: usize) -> f64 {
    let mut p = 0.0;
    let mut k = (n / h) as i64;
    while k >= 0 {
        let kh = k as usize * h;
        let mut term = 1.0;
        for j in 0..h {
            term = (n as f64 - kh as f64 - j as f64) * term / (n + kh + j + 1) as f64;
        }
        p = term * (1.0 - p);
        k -= 1;
    }
    (2.0 * p).clamp(0.0, 1.0)
}

/// Asymptotic two-sided p-value from the Kolmogorov distribution.
///
/// Fallback for unequal sample sizes only. [`benford_conformance`] always compares
/// nine values against nine and takes the exact path.
fn asymptotic_p(d: f64, n: usize, m: usize) -> f64 {
    let en = ((n * m) as f64 / (n + m) as f64).sqrt();
    let lambda = (en + 0.12 + 0.11 / en) * d;
    if lambda < 1e-3 {
        return 1.0;
    }
    let mut p = 0.0;
    for k in 1..=100i32 {
        let sign = if k % 2 == 0 { -1.0 } else { 1.0 };
        p += sign * (-2.0 * (k as f64 * lambda).powi(2)).exp();
    }
    (2.0 * p).clamp(0.0, 1.0)
}

// ═══════════════════════════════════════════════════════════════════════════════
// Distribution tests
// ═══════════════════════════════════════════════════════════════════════════════

/// Two-sample Kolmogorov-Smirnov test.
///
/// The statistic is the largest vertical distance between the two empirical CDFs,
/// evaluated at every pooled observation. Equal-size samples get the exact lattice-path
/// p-value; unequal sizes fall back to the asymptotic Kolmogorov series.
pub fn ks_two_sample(a: &[f64], b: &[f64]) -> TestResult {
    let name = "Two-sample Kolmogorov-Smirnov";
    let (n, m) = (a.len(), b.len());
    if n == 0 || m == 0 {
        return insufficient(name, n, m);
    }

    let a_sorted = sorted(a);
    let b_sorted = sorted(b);
    let mut d_max = 0.0f64;
    for &x in a_sorted.iter().chain(b_sorted.iter()) {
        let fa = count_le(&a_sorted, x) as f64 / n as f64;
        let fb = count_le(&b_sorted, x) as f64 / m as f64;
        d_max = d_max.max((fa - fb).abs());
    }

    let (p, method) = if n == m {
        // Snap D onto the 1/n lattice it lives on before counting paths.
        let lcm = (n / gcd(n, m)) * m;
        let h = (d_max * lcm as f64).round() as usize;
        let p = if h == 0 { 1.0 } else { exact_equal_p(n, h) };
        (p, "exact")
    } else {
        (asymptotic_p(d_max, n, m), "asymptotic")
    };

    TestResult {
        name: name.to_string(),
        passed: TestResult::pass_from_p(Some(p), BENFORD_ALPHA),
        p_value: Some(p),
        statistic: d_max,
        details: format!("D={d_max:.6}, n={n}, m={m}, method={method}"),
        grade: TestResult::grade_from_p(Some(p)),
    }
}

/// Benford's Law conformance of leading digits 1 through 9, given as percentages.
///
/// Runs [`ks_two_sample`] with [`BENFORD_REFERENCE`] as the first sample and the
/// observed percentages as the second. The p-value is rounded to 4 decimals.
pub fn benford_conformance(lead_percentages: &[f64; 9]) -> TestResult {
    let ks = ks_two_sample(&BENFORD_REFERENCE, lead_percentages);
    let p = ks.p_value.map(|p| round_to(p, 4));
    TestResult {
        name: "Benford Conformance".to_string(),
        passed: TestResult::pass_from_p(p, BENFORD_ALPHA),
        p_value: p,
        statistic: ks.statistic,
        details: ks.details,
        grade: TestResult::grade_from_p(p),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grade_from_p() {
        assert_eq!(TestResult::grade_from_p(Some(0.5)), 'A');
        assert_eq!(TestResult::grade_from_p(Some(0.07)), 'B');
        assert_eq!(TestResult::grade_from_p(Some(0.02)), 'C');
        assert_eq!(TestResult::grade_from_p(Some(0.005)), 'D');
        assert_eq!(TestResult::grade_from_p(Some(0.00001)), 'F');
        assert_eq!(TestResult::grade_from_p(None), 'F');
    }

    #[test]
    fn test_pass_from_p() {
        assert!(TestResult::pass_from_p(Some(0.05), 0.05));
        assert!(!TestResult::pass_from_p(Some(0.049), 0.05));
        assert!(!TestResult::pass_from_p(None, 0.05));
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(0.033566, 4), 0.0336);
        assert_eq!(round_to(33.33333, 1), 33.3);
        assert_eq!(round_to(0.0, 4), 0.0);
    }

    #[test]
    fn test_empty_sample_is_insufficient() {
        let result = ks_two_sample(&[], &[1.0, 2.0]);
        assert!(!result.passed);
        assert!(result.p_value.is_none());
        assert!(result.details.contains("Insufficient"));
    }

    #[test]
    fn test_identical_samples() {
        let result = ks_two_sample(&[1.0, 2.0, 3.0], &[3.0, 1.0, 2.0]);
        assert_eq!(result.statistic, 0.0);
        assert_eq!(result.p_value, Some(1.0));
        assert_eq!(result.grade, 'A');
    }

    #[test]
    fn test_disjoint_equal_samples() {
        // Completely separated samples: p = 2 / C(2n, n).
        let a: Vec<f64> = (0..9).map(f64::from).collect();
        let b: Vec<f64> = (100..109).map(f64::from).collect();
        let result = ks_two_sample(&a, &b);
        assert_eq!(result.statistic, 1.0);
        let expected = 2.0 / 48620.0;
        assert!((result.p_value.unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_statistic_with_ties() {
        let result = ks_two_sample(&[1.0, 1.0, 2.0, 3.0], &[1.0, 2.0, 2.0, 3.0]);
        assert!((result.statistic - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_unequal_sizes_use_asymptotic() {
        let result = ks_two_sample(&[1.0, 2.0, 3.0, 4.0], &[1.5, 2.5, 3.5]);
        assert!(result.details.contains("asymptotic"));
        let p = result.p_value.unwrap();
        assert!((0.0..=1.0).contains(&p));
    }

    #[test]
    fn test_asymptotic_p_bounds_and_monotone() {
        assert_eq!(asymptotic_p(0.0, 40, 30), 1.0);
        let mut last = 1.0;
        for step in 1..=20 {
            let p = asymptotic_p(step as f64 * 0.05, 40, 30);
            assert!((0.0..=1.0).contains(&p));
            assert!(p <= last, "p must not grow with D");
            last = p;
        }
        assert!(last < 1e-6);
    }

    #[test]
    fn test_benford_never_uses_asymptotic() {
        let result = benford_conformance(&[20.0, 15.0, 12.0, 11.0, 10.0, 9.0, 8.0, 8.0, 7.0]);
        assert!(result.details.contains("method=exact"));
    }

    #[test]
    fn test_benford_reference_sums_to_hundred() {
        let total: f64 = BENFORD_REFERENCE.iter().sum();
        assert!((total - 100.0).abs() < 0.05);
    }

    #[test]
    fn test_benford_exact_match() {
        let result = benford_conformance(&BENFORD_REFERENCE);
        assert_eq!(result.p_value, Some(1.0));
        assert!(result.passed);
    }

    #[test]
    fn test_benford_uniform_leading_digits() {
        // D = 6/9: the six smallest reference values sit below 11.1.
        let uniform = [11.1; 9];
        let result = benford_conformance(&uniform);
        assert!((result.statistic - 6.0 / 9.0).abs() < 1e-12);
        assert_eq!(result.p_value, Some(0.0336));
        assert!(!result.passed);
        assert_eq!(result.grade, 'C');
    }

    #[test]
    fn test_benford_all_zero_column() {
        let result = benford_conformance(&[0.0; 9]);
        assert_eq!(result.statistic, 1.0);
        assert_eq!(result.p_value, Some(0.0));
        assert_eq!(result.grade, 'F');
    }

    #[test]
    fn test_benford_deterministic() {
        let sample = [28.0, 19.5, 12.0, 10.1, 8.0, 6.0, 6.2, 5.0, 5.2];
        let first = benford_conformance(&sample);
        for _ in 0..10 {
            assert_eq!(benford_conformance(&sample), first);
        }
    }
}
