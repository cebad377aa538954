//! Bunch index and arrival-time offset.

use bunch_core::types::ConfigurationError;

use crate::config::BeamDefinition;

/// Bunch timing derived from the event index.
///
/// Enabled when either `bunch_period` or `bunch_frequency` is set. Events are
/// grouped `events_per_bunch` at a time; bunch `i` arrives `i × period` later
/// than bunch 0.
///
/// # Examples
///
/// ```rust
/// use bunch_sampling::bunch::BunchTiming;
/// use bunch_sampling::config::BeamDefinition;
///
/// let def = BeamDefinition { bunch_frequency: 40.0e6, events_per_bunch: 10, ..BeamDefinition::default() };
/// let mut timing = BunchTiming::configure(&def).unwrap();
/// timing.set_event_index(25);
/// assert_eq!(timing.bunch_index(), 2);
/// assert!((timing.time_offset() - 2.0 / 40.0e6).abs() < 1e-18);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BunchTiming {
    period: Option<f64>,
    offset: usize,
    events_per_bunch: usize,
    bunch_index: usize,
}

impl Default for BunchTiming {
    fn default() -> Self {
        Self {
            period: None,
            offset: 0,
            events_per_bunch: 1,
            bunch_index: 0,
        }
    }
}

impl BunchTiming {
    /// Reads the timing parameters.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::ConflictingParameters`] if both the
    /// frequency and the period are set, or
    /// [`ConfigurationError::InvalidParameter`] if either is negative.
    pub fn configure(definition: &BeamDefinition) -> Result<Self, ConfigurationError> {
        let frequency = definition.bunch_frequency;
        let period = definition.bunch_period;
        if frequency != 0.0 && period != 0.0 {
            return Err(ConfigurationError::ConflictingParameters {
                keys: vec!["bunch_frequency", "bunch_period"],
            });
        }
        for (name, value) in [("bunch_frequency", frequency), ("bunch_period", period)] {
            if !(value >= 0.0) || !value.is_finite() {
                return Err(ConfigurationError::InvalidParameter {
                    name,
                    value,
                    reason: "must be finite and non-negative".to_string(),
                });
            }
        }

        let period = if frequency > 0.0 {
            Some(1.0 / frequency)
        } else if period > 0.0 {
            Some(period)
        } else {
            None
        };

        let timing = Self {
            period,
            offset: definition.bunch_offset,
            events_per_bunch: definition.events_per_bunch.max(1),
            bunch_index: definition.bunch_offset,
        };
        Ok(timing)
    }

    /// True if a bunch period is configured.
    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.period.is_some()
    }

    /// Bunch period (s), if enabled.
    #[inline]
    pub fn period(&self) -> Option<f64> {
        self.period
    }

    /// Recomputes the bunch index from the event index.
    #[inline]
    pub fn set_event_index(&mut self, event_index: usize) {
        self.bunch_index = self.offset + event_index / self.events_per_bunch;
    }

    /// Current bunch index.
    #[inline]
    pub fn bunch_index(&self) -> usize {
        self.bunch_index
    }

    /// Time added to the global time of the current event (s).
    #[inline]
    pub fn time_offset(&self) -> f64 {
        self.period
            .map_or(0.0, |period| self.bunch_index as f64 * period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_by_default() {
        let mut timing = BunchTiming::configure(&BeamDefinition::default()).unwrap();
        timing.set_event_index(100);
        assert!(!timing.is_enabled());
        assert_eq!(timing.bunch_index(), 100);
        assert_eq!(timing.time_offset(), 0.0);
    }

    #[test]
    fn test_period_and_offset() {
        let def = BeamDefinition {
            bunch_period: 25.0e-9,
            bunch_offset: 3,
            events_per_bunch: 2,
            ..BeamDefinition::default()
        };
        let mut timing = BunchTiming::configure(&def).unwrap();
        assert_eq!(timing.bunch_index(), 3);
        timing.set_event_index(5);
        assert_eq!(timing.bunch_index(), 5);
        assert!((timing.time_offset() - 125.0e-9).abs() < 1e-20);
    }

    #[test]
    fn test_frequency_and_period_conflict() {
        let def = BeamDefinition {
            bunch_period: 1.0,
            bunch_frequency: 1.0,
            ..BeamDefinition::default()
        };
        assert!(matches!(
            BunchTiming::configure(&def),
            Err(ConfigurationError::ConflictingParameters { .. })
        ));
    }

    #[test]
    fn test_negative_period_rejected() {
        let def = BeamDefinition {
            bunch_period: -1.0,
            ..BeamDefinition::default()
        };
        assert!(BunchTiming::configure(&def).is_err());
    }
}
