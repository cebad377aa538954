//! One-pass statistics.

/// Running mean of fixed-size vectors using Welford's update
/// `mean += (x − mean) / n`.
///
/// # Example
///
/// ```
/// use bunch_core::math::statistics::RunningMean;
///
/// let mut mean = RunningMean::<2>::new();
/// mean.push(&[1.0, 10.0]);
/// mean.push(&[3.0, 20.0]);
/// assert_eq!(mean.mean(), [2.0, 15.0]);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RunningMean<const N: usize> {
    count: usize,
    mean: [f64; N],
}

impl<const N: usize> Default for RunningMean<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> RunningMean<N> {
    /// Empty accumulator.
    pub fn new() -> Self {
        Self {
            count: 0,
            mean: [0.0; N],
        }
    }

    /// Adds one sample.
    pub fn push(&mut self, sample: &[f64; N]) {
        self.count += 1;
        let n = self.count as f64;
        for (m, x) in self.mean.iter_mut().zip(sample) {
            *m += (x - *m) / n;
        }
    }

    /// Samples seen so far.
    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    /// Current mean; zeros before the first sample.
    #[inline]
    pub fn mean(&self) -> [f64; N] {
        self.mean
    }
}

impl<const N: usize> Extend<[f64; N]> for RunningMean<N> {
    fn extend<I: IntoIterator<Item = [f64; N]>>(&mut self, iter: I) {
        for sample in iter {
            self.push(&sample);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn test_empty_mean_is_zero() {
        let mean = RunningMean::<3>::new();
        assert_eq!(mean.count(), 0);
        assert_eq!(mean.mean(), [0.0; 3]);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_matches_two_pass_mean(values in prop::collection::vec(-1.0e3..1.0e3f64, 1..200)) {
            let mut mean = RunningMean::<1>::new();
            mean.extend(values.iter().map(|v| [*v]));
            let expected = values.iter().sum::<f64>() / values.len() as f64;
            assert_relative_eq!(mean.mean()[0], expected, epsilon = 1e-9);
        }
    }
}
