//! Transport modes understood by travel-time providers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How a traveller moves between activities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    /// On foot.
    Walking,
    /// Private car or taxi.
    #[default]
    Driving,
    /// Public transport.
    Transit,
    /// Bicycle.
    Bicycling,
}

/// Error returned when parsing an unknown transport mode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown transport mode {0:?}; expected walking, driving, transit or bicycling")]
pub struct UnknownTransportMode(pub String);

impl TransportMode {
    /// All supported modes.
    pub const ALL: [Self; 4] = [Self::Walking, Self::Driving, Self::Transit, Self::Bicycling];

    /// Lowercase wire name of the mode.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Walking => "walking",
            Self::Driving => "driving",
            Self::Transit => "transit",
            Self::Bicycling => "bicycling",
        }
    }
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransportMode {
    type Err = UnknownTransportMode;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let needle = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == needle)
            .ok_or_else(|| UnknownTransportMode(value.to_owned()))
    }
}
