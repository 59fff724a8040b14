//! Clock-time helpers shared by the model, scorer and scheduler.
//!
//! Times of day travel over the wire as `"HH:MM"` strings. Schedules that
//! accumulate odd travel seconds render as `"HH:MM:SS"` so that slot
//! arithmetic survives a JSON round trip.

use chrono::{NaiveTime, TimeDelta, Timelike};
use thiserror::Error;

/// Seconds in one day.
pub const SECONDS_PER_DAY: u64 = 86_400;

/// Errors returned by [`parse_clock_time`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeParseError {
    /// The value was not in `HH:MM` or `HH:MM:SS` form.
    #[error("invalid time of day {value:?}; expected HH:MM")]
    InvalidClockTime {
        /// Offending input.
        value: String,
    },
}

/// Parse a `HH:MM` (or `HH:MM:SS`) clock time.
///
/// # Examples
/// ```
/// use chrono::NaiveTime;
/// use itinera_core::time::parse_clock_time;
///
/// let nine = parse_clock_time("09:00")?;
/// assert_eq!(nine, NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default());
/// # Ok::<(), itinera_core::time::TimeParseError>(())
/// ```
pub fn parse_clock_time(value: &str) -> Result<NaiveTime, TimeParseError> {
    let trimmed = value.trim();
    NaiveTime::parse_from_str(trimmed, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
        .map_err(|_| TimeParseError::InvalidClockTime {
            value: value.to_owned(),
        })
}

/// Render a clock time, omitting seconds when they are zero.
#[must_use]
pub fn format_clock_time(time: NaiveTime) -> String {
    if time.second() == 0 {
        time.format("%H:%M").to_string()
    } else {
        time.format("%H:%M:%S").to_string()
    }
}

/// Seconds elapsed since midnight for `time`.
#[must_use]
pub fn seconds_from_midnight(time: NaiveTime) -> u64 {
    u64::from(time.num_seconds_from_midnight())
}

/// Advance `start` by `seconds`, wrapping past midnight.
#[must_use]
pub fn advance(start: NaiveTime, seconds: u64) -> NaiveTime {
    let within_day = i64::try_from(seconds.rem_euclid(SECONDS_PER_DAY)).unwrap_or_default();
    start.overflowing_add_signed(TimeDelta::seconds(within_day)).0
}

/// Serde adapter for `NaiveTime` fields encoded as clock strings.
pub mod clock {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serialise `time` as `HH:MM` (or `HH:MM:SS`).
    ///
    /// # Errors
    ///
    /// Propagates serializer failures.
    pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_clock_time(*time))
    }

    /// Deserialise a clock string into a `NaiveTime`.
    ///
    /// # Errors
    ///
    /// Fails when the string is not a valid clock time.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_clock_time(&raw).map_err(serde::de::Error::custom)
    }

    /// Optional variant of the clock adapter.
    pub mod option {
        use chrono::NaiveTime;
        use serde::{Deserialize, Deserializer, Serializer};

        /// Serialise an optional clock time.
        ///
        /// # Errors
        ///
        /// Propagates serializer failures.
        pub fn serialize<S>(time: &Option<NaiveTime>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match time {
                Some(value) => super::serialize(value, serializer),
                None => serializer.serialize_none(),
            }
        }

        /// Deserialise an optional clock time.
        ///
        /// # Errors
        ///
        /// Fails when a present string is not a valid clock time.
        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveTime>, D::Error>
        where
            D: Deserializer<'de>,
        {
            Option::<String>::deserialize(deserializer)?
                .map(|raw| super::super::parse_clock_time(&raw).map_err(serde::de::Error::custom))
                .transpose()
        }
    }
}
