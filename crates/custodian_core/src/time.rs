//! Time types for CUSTODIAN.
//!
//! Retention ages and storage time-to-live are expressed as [`Duration`]s.
//! Ordering is total, so `ttl <= max_age` comparisons are exact.

use serde::{Deserialize, Serialize};

/// A span of time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Duration {
    /// Whole seconds
    pub seconds: u64,
    /// Sub-second remainder, below one billion
    pub nanos: u32,
}

impl Duration {
    /// Zero duration
    #[must_use]
    pub const fn zero() -> Self {
        Self {
            seconds: 0,
            nanos: 0,
        }
    }

    const fn from_secs(seconds: u64) -> Self {
        Self { seconds, nanos: 0 }
    }

    /// Duration from minutes
    #[must_use]
    pub const fn from_mins(minutes: u64) -> Self {
        Self::from_secs(minutes.saturating_mul(60))
    }

    /// Duration from hours
    #[must_use]
    pub const fn from_hours(hours: u64) -> Self {
        Self::from_secs(hours.saturating_mul(3_600))
    }

    /// Duration from days
    #[must_use]
    pub const fn from_days(days: u64) -> Self {
        Self::from_secs(days.saturating_mul(86_400))
    }

    /// Whether this is the zero duration
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.seconds == 0 && self.nanos == 0
    }

    /// Get total milliseconds
    #[must_use]
    pub fn as_millis(&self) -> u128 {
        self.seconds as u128 * 1_000 + self.nanos as u128 / 1_000_000
    }
}

impl Default for Duration {
    fn default() -> Self {
        Self::zero()
    }
}

impl std::fmt::Display for Duration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.seconds == 0 && self.nanos == 0 {
            write!(f, "0s")
        } else if self.seconds == 0 {
            write!(f, "{}ns", self.nanos)
        } else if self.nanos == 0 {
            write!(f, "{}s", self.seconds)
        } else {
            write!(f, "{}.{:09}s", self.seconds, self.nanos)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_duration_units() {
        assert_eq!(Duration::from_mins(5).as_millis(), 300_000);
        assert_eq!(Duration::from_hours(1), Duration::from_mins(60));
        assert_eq!(Duration::from_days(1), Duration::from_hours(24));
        assert!(Duration::zero().is_zero());
        assert!(!Duration::from_mins(1).is_zero());
    }

    #[test]
    fn test_large_units_saturate() {
        assert_eq!(Duration::from_days(u64::MAX).seconds, u64::MAX);
        assert_eq!(Duration::from_hours(u64::MAX), Duration::from_mins(u64::MAX));
    }

    #[test]
    fn test_duration_ordering() {
        assert!(Duration::from_mins(5) <= Duration::from_mins(5));
        assert!(Duration::from_mins(6) > Duration::from_mins(5));
        let half_second = Duration {
            seconds: 0,
            nanos: 500_000_000,
        };
        assert!(half_second < Duration::from_mins(1));
        assert!(Duration::zero() < half_second);
    }

    #[test]
    fn test_display() {
        assert_eq!(Duration::zero().to_string(), "0s");
        assert_eq!(Duration::from_mins(1).to_string(), "60s");
        let d = Duration {
            seconds: 1,
            nanos: 500_000_000,
        };
        assert_eq!(d.to_string(), "1.500000000s");
        assert_eq!(d.as_millis(), 1_500);
    }

    proptest! {
        #[test]
        fn prop_minutes_ordering_matches(a in 0u64..1_000_000_000, b in 0u64..1_000_000_000) {
            prop_assert_eq!(
                Duration::from_mins(a).cmp(&Duration::from_mins(b)),
                a.cmp(&b)
            );
        }
    }
}
