//! Travel-time providers backed by routing services.
//!
//! - [`HttpTravelTimeProvider`] queries an OSRM instance over HTTP.
//! - [`StraightLineTravelTimeProvider`] estimates legs from great-circle
//!   distance and needs no network.
//!
//! Both implement [`itinera_core::TravelTimeProvider`] and are usually
//! wrapped in an [`itinera_core::TravelTimeCache`].
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use itinera_data::routing::{HttpTravelTimeProvider, HttpTravelTimeProviderConfig};
//!
//! let config = HttpTravelTimeProviderConfig::new("http://localhost:5000")
//!     .with_timeout(Duration::from_secs(5))
//!     .with_user_agent("my-app/1.0");
//! let provider = HttpTravelTimeProvider::with_config(config)?;
//! # Ok::<(), itinera_data::routing::ProviderBuildError>(())
//! ```

mod osrm;
mod provider;
mod straight_line;

#[doc(hidden)]
pub mod test_support;

pub use provider::{
    DEFAULT_BASE_URL, DEFAULT_USER_AGENT, HttpTravelTimeProvider, HttpTravelTimeProviderConfig,
    ProviderBuildError, osrm_profile,
};
pub use straight_line::{StraightLineTravelTimeProvider, TravelSpeeds, haversine_meters};
