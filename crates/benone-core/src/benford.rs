//! Benford's Law conformance of a column's leading-digit distribution.

use benone_stats::{TestResult, benford_conformance};

use crate::frequency::FrequencyMap;

/// Full test result for a lead frequency map. Digit 0 takes no part: no number
/// starts with it.
pub fn benford_test(lead: &FrequencyMap) -> TestResult {
    benford_conformance(&lead.leading_digits())
}

/// Kolmogorov-Smirnov p-value of `lead` against the Benford reference, 4 decimals.
pub fn benford_p_value(lead: &FrequencyMap) -> f64 {
    benford_test(lead).p_value.unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use benone_stats::BENFORD_REFERENCE;

    fn with_zero(leading: [f64; 9]) -> FrequencyMap {
        let mut values = [0.0; 10];
        values[1..].copy_from_slice(&leading);
        FrequencyMap::from_percentages(values)
    }

    #[test]
    fn test_reference_profile_conforms() {
        assert_eq!(benford_p_value(&with_zero(BENFORD_REFERENCE)), 1.0);
    }

    #[test]
    fn test_zero_digit_is_ignored() {
        let mut values = [0.0; 10];
        values[1..].copy_from_slice(&BENFORD_REFERENCE);
        values[0] = 42.0;
        assert_eq!(benford_p_value(&FrequencyMap::from_percentages(values)), 1.0);
    }

    #[test]
    fn test_uniform_profile() {
        let result = benford_test(&with_zero([11.1; 9]));
        assert_eq!(result.p_value, Some(0.0336));
        assert!(!result.passed);
    }

    #[test]
    fn test_empty_column() {
        assert_eq!(benford_p_value(&FrequencyMap::default()), 0.0);
    }
}
