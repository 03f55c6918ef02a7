//! Digit counts to percentage distributions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::counter::{DIGITS, DigitCounter};

pub use benone_stats::round_to;

/// Percentage of each digit '0' through '9', rounded to one decimal place.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(into = "BTreeMap<String, f64>", try_from = "BTreeMap<String, f64>")]
pub struct FrequencyMap([f64; 10]);

impl FrequencyMap {
    pub fn from_percentages(values: [f64; 10]) -> Self {
        FrequencyMap(values)
    }

    pub fn percentages(&self) -> &[f64; 10] {
        &self.0
    }

    pub fn get(&self, letter: char) -> Option<f64> {
        letter.to_digit(10).map(|d| self.0[d as usize])
    }

    /// Percentages for the digits a number can start with, 1 through 9.
    pub fn leading_digits(&self) -> [f64; 9] {
        let mut out = [0.0; 9];
        out.copy_from_slice(&self.0[1..]);
        out
    }

    pub fn iter(&self) -> impl Iterator<Item = (char, f64)> + '_ {
        DIGITS.iter().copied().zip(self.0.iter().copied())
    }
}

impl From<FrequencyMap> for BTreeMap<String, f64> {
    fn from(map: FrequencyMap) -> Self {
        map.iter().map(|(d, f)| (d.to_string(), f)).collect()
    }
}

impl TryFrom<BTreeMap<String, f64>> for FrequencyMap {
    type Error = String;

    fn try_from(map: BTreeMap<String, f64>) -> Result<Self, Self::Error> {
        let mut values = [0.0; 10];
        for (key, value) in map {
            let digit = key
                .parse::<usize>()
                .ok()
                .filter(|d| *d < 10 && key.len() == 1)
                .ok_or_else(|| format!("invalid digit key {key:?}"))?;
            values[digit] = value;
        }
        Ok(FrequencyMap(values))
    }
}

/// Percentage of each digit in `counter`, one decimal. A zero total gives all zeros.
pub fn normalize(counter: &DigitCounter) -> FrequencyMap {
    let total = counter.total();
    let mut values = [0.0; 10];
    if total == 0 {
        return FrequencyMap(values);
    }
    for (slot, &n) in values.iter_mut().zip(counter.counts()) {
        *slot = round_to(100.0 * n as f64 / total as f64, 1);
    }
    FrequencyMap(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_total_is_all_zero() {
        let freq = normalize(&DigitCounter::new());
        assert_eq!(freq.percentages(), &[0.0; 10]);
        assert!(freq.iter().all(|(_, f)| !f.is_nan()));
    }

    #[test]
    fn test_thirds_round_to_one_decimal() {
        let counter = DigitCounter::from_counts([0, 1, 1, 1, 0, 0, 0, 0, 0, 0]);
        let freq = normalize(&counter);
        assert_eq!(freq.get('1'), Some(33.3));
        assert_eq!(freq.get('0'), Some(0.0));
        assert_eq!(freq.get('x'), None);
    }

    #[test]
    fn test_normalize_does_not_mutate() {
        let counter = DigitCounter::from_counts([1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);
        let before = counter;
        let _ = normalize(&counter);
        assert_eq!(counter, before);
    }

    #[test]
    fn test_leading_digits_skip_zero() {
        let freq = FrequencyMap::from_percentages([50.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 14.0]);
        assert_eq!(
            freq.leading_digits(),
            [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 14.0]
        );
    }

    #[test]
    fn test_json_shape() {
        let freq = normalize(&DigitCounter::from_counts([1, 1, 0, 0, 0, 0, 0, 0, 0, 0]));
        let json = serde_json::to_value(freq).unwrap();
        assert_eq!(json["0"], 50.0);
        assert_eq!(json["9"], 0.0);
        let back: FrequencyMap = serde_json::from_value(json).unwrap();
        assert_eq!(back, freq);
    }

    mod proptest_suite {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn percentages_sum_to_hundred(counts in prop::array::uniform10(0u64..10_000)) {
                let counter = DigitCounter::from_counts(counts);
                let freq = normalize(&counter);
                let sum: f64 = freq.percentages().iter().sum();
                if counter.total() == 0 {
                    prop_assert_eq!(sum, 0.0);
                } else {
                    // at most 0.05 rounding error per digit
                    prop_assert!((sum - 100.0).abs() <= 0.5 + 1e-9, "sum = {}", sum);
                }
                for &f in freq.percentages() {
                    prop_assert!((0.0..=100.0).contains(&f));
                }
            }
        }
    }
}
