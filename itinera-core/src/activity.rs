//! Activities planned for a travel day.
//!
//! [`Activity`] mirrors the JSON produced by the itinerary generator. Fields
//! this crate does not interpret are kept in `extra` so an optimised
//! itinerary round-trips everything the caller sent. Scheduling output is
//! written to [`Activity::time_slot`] and [`Activity::travel_to_next`].
//!
//! Coordinates are normalised once per activity into a [`StopLocation`]; the
//! scorer, solver and scheduler only ever see the normalised [`Stop`].

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::NaiveTime;
use geo::Coord;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::ActivityDefaults;
use crate::time::{TimeParseError, parse_clock_time};
use crate::transport::TransportMode;

/// Lowest accepted activity priority.
pub const MIN_PRIORITY: u8 = 1;
/// Highest accepted activity priority.
pub const MAX_PRIORITY: u8 = 5;

/// Latitude/longitude pair as sent over the wire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    /// Latitude in degrees.
    #[serde(alias = "latitude")]
    pub lat: f64,
    /// Longitude in degrees.
    #[serde(alias = "lon", alias = "longitude")]
    pub lng: f64,
}

impl LatLng {
    /// Validate the pair and convert it to a `geo` coordinate (`x = lng`).
    ///
    /// Returns `None` for non-finite or out-of-range values.
    #[must_use]
    pub fn to_coord(self) -> Option<Coord<f64>> {
        let valid = self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng);
        valid.then_some(Coord {
            x: self.lng,
            y: self.lat,
        })
    }
}

/// Venue location block. Only `coordinates` is interpreted.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Location {
    /// Geographic position, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<LatLng>,
    /// Address and other location fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Daily opening window of a venue.
///
/// A `close` earlier than `open` wraps past midnight; equal values mean the
/// venue never closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpeningHours {
    /// Opening time.
    #[serde(with = "crate::time::clock")]
    pub open: NaiveTime,
    /// Closing time (exclusive).
    #[serde(with = "crate::time::clock")]
    pub close: NaiveTime,
}

impl OpeningHours {
    /// Construct an opening window.
    #[must_use]
    pub const fn new(open: NaiveTime, close: NaiveTime) -> Self {
        Self { open, close }
    }

    /// Whether a visitor arriving at `time` finds the venue open.
    ///
    /// # Examples
    /// ```
    /// use chrono::NaiveTime;
    /// use itinera_core::OpeningHours;
    ///
    /// let at = |h| NaiveTime::from_hms_opt(h, 0, 0).unwrap_or_default();
    /// let museum = OpeningHours::new(at(10), at(18));
    /// assert!(museum.covers(at(10)));
    /// assert!(!museum.covers(at(9)));
    /// assert!(!museum.covers(at(18)));
    /// ```
    #[must_use]
    pub fn covers(&self, time: NaiveTime) -> bool {
        if self.open == self.close {
            return true;
        }
        if self.open < self.close {
            self.open <= time && time < self.close
        } else {
            time >= self.open || time < self.close
        }
    }
}

/// When the traveller would like to be at an activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PreferredTime {
    /// Around 09:00.
    Morning,
    /// Around 14:00.
    Afternoon,
    /// Around 18:00.
    Evening,
    /// Around 21:00.
    Night,
    /// An explicit clock time.
    At(NaiveTime),
}

impl PreferredTime {
    /// Clock time the scorer measures deviation against.
    #[must_use]
    pub fn target(self) -> NaiveTime {
        let hour = match self {
            Self::At(time) => return time,
            Self::Morning => 9,
            Self::Afternoon => 14,
            Self::Evening => 18,
            Self::Night => 21,
        };
        NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or(NaiveTime::MIN)
    }
}

impl FromStr for PreferredTime {
    type Err = TimeParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "morning" => Ok(Self::Morning),
            "afternoon" => Ok(Self::Afternoon),
            "evening" => Ok(Self::Evening),
            "night" => Ok(Self::Night),
            _ => parse_clock_time(value).map(Self::At),
        }
    }
}

impl TryFrom<String> for PreferredTime {
    type Error = TimeParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for PreferredTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Morning => f.write_str("morning"),
            Self::Afternoon => f.write_str("afternoon"),
            Self::Evening => f.write_str("evening"),
            Self::Night => f.write_str("night"),
            Self::At(time) => f.write_str(&crate::time::format_clock_time(*time)),
        }
    }
}

impl From<PreferredTime> for String {
    fn from(value: PreferredTime) -> Self {
        value.to_string()
    }
}

/// Scheduled presence at an activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlot {
    /// Arrival time.
    #[serde(with = "crate::time::clock")]
    pub start_time: NaiveTime,
    /// Departure time.
    #[serde(with = "crate::time::clock")]
    pub end_time: NaiveTime,
}

/// Travel annotation from one activity to the next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TravelLeg {
    /// Travel time in seconds.
    pub duration: u64,
    /// Human-readable duration, e.g. `"10 mins"`.
    pub duration_text: String,
    /// Distance in metres.
    #[serde(default)]
    pub distance: u64,
    /// Mode used for the leg.
    pub mode: TransportMode,
}

/// A planned activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    /// Stable identifier.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Venue location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    /// Top-level coordinates, used when `location.coordinates` is absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<LatLng>,
    /// Expected visit length in minutes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_duration: Option<u32>,
    /// Importance from 1 (low) to 5 (must see).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u8>,
    /// Venue opening window.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opening_hours: Option<OpeningHours>,
    /// Preferred time of day.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_time: Option<PreferredTime>,
    /// Assigned slot, set by the scheduler.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_slot: Option<TimeSlot>,
    /// Travel to the following activity, set by the scheduler.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub travel_to_next: Option<TravelLeg>,
    /// Fields owned by other collaborators, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Activity {
    /// Construct an activity with only an id and a name.
    ///
    /// # Examples
    /// ```
    /// use itinera_core::Activity;
    ///
    /// let museum = Activity::new("a1", "Museum").with_priority(5);
    /// assert_eq!(museum.priority, Some(5));
    /// assert!(museum.coordinates.is_none());
    /// ```
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            location: None,
            coordinates: None,
            estimated_duration: None,
            priority: None,
            opening_hours: None,
            preferred_time: None,
            time_slot: None,
            travel_to_next: None,
            extra: Map::new(),
        }
    }

    /// Set coordinates under `location.coordinates`.
    #[must_use]
    pub fn with_coordinates(mut self, lat: f64, lng: f64) -> Self {
        let location = self.location.get_or_insert_with(Location::default);
        location.coordinates = Some(LatLng { lat, lng });
        self
    }

    /// Set the estimated visit length in minutes.
    #[must_use]
    pub const fn with_duration_minutes(mut self, minutes: u32) -> Self {
        self.estimated_duration = Some(minutes);
        self
    }

    /// Set the priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: u8) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Set the opening window.
    #[must_use]
    pub const fn with_opening_hours(mut self, hours: OpeningHours) -> Self {
        self.opening_hours = Some(hours);
        self
    }

    /// Set the preferred time of day.
    #[must_use]
    pub const fn with_preferred_time(mut self, preferred: PreferredTime) -> Self {
        self.preferred_time = Some(preferred);
        self
    }

    /// Normalise whichever coordinate field is present.
    ///
    /// `location.coordinates` wins over the top-level `coordinates` field.
    #[must_use]
    pub fn stop_location(&self) -> StopLocation {
        self.location
            .as_ref()
            .and_then(|location| location.coordinates)
            .or(self.coordinates)
            .and_then(LatLng::to_coord)
            .map_or(StopLocation::Unknown, StopLocation::Known)
    }
}

/// Canonical position of an activity after normalisation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StopLocation {
    /// Validated WGS84 coordinate (`x = longitude`, `y = latitude`).
    Known(Coord<f64>),
    /// No usable coordinates were supplied.
    Unknown,
}

impl StopLocation {
    /// The coordinate, if known.
    #[must_use]
    pub const fn coord(self) -> Option<Coord<f64>> {
        match self {
            Self::Known(coord) => Some(coord),
            Self::Unknown => None,
        }
    }
}

/// Normalised view of an activity used by scoring, solving and scheduling.
#[derive(Debug, Clone, PartialEq)]
pub struct Stop {
    /// Position of the activity.
    pub location: StopLocation,
    /// Time spent at the activity.
    pub visit: Duration,
    /// Priority clamped to `1..=5`.
    pub priority: u8,
    /// Opening window, if any.
    pub opening_hours: Option<OpeningHours>,
    /// Preferred arrival time, if any.
    pub preferred_time: Option<NaiveTime>,
}

impl Stop {
    /// Normalise an activity, applying defaults for missing fields.
    #[must_use]
    pub fn from_activity(activity: &Activity, defaults: &ActivityDefaults) -> Self {
        let minutes = activity
            .estimated_duration
            .unwrap_or(defaults.visit_minutes);
        Self {
            location: activity.stop_location(),
            visit: Duration::from_secs(u64::from(minutes) * 60),
            priority: activity
                .priority
                .unwrap_or(defaults.priority)
                .clamp(MIN_PRIORITY, MAX_PRIORITY),
            opening_hours: activity.opening_hours,
            preferred_time: activity.preferred_time.map(PreferredTime::target),
        }
    }

    /// Normalise every activity of a day.
    #[must_use]
    pub fn from_activities(activities: &[Activity], defaults: &ActivityDefaults) -> Vec<Self> {
        activities
            .iter()
            .map(|activity| Self::from_activity(activity, defaults))
            .collect()
    }
}
