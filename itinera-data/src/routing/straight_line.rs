//! Great-circle travel-time estimates for use without a routing service.
//!
//! [`StraightLineTravelTimeProvider`] ignores the road network entirely. It
//! multiplies the haversine distance by a detour factor and divides by an
//! assumed speed for the requested mode, so it never fails on non-empty input.

use async_trait::async_trait;
use geo::{Coord, Distance, Haversine, Point};
use itinera_core::{TransportMode, TravelCost, TravelTimeError, TravelTimeMatrix, TravelTimeProvider};

/// Assumed average speed per transport mode, in km/h.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TravelSpeeds {
    /// Walking speed.
    pub walking_kmh: f64,
    /// Driving speed, including urban congestion.
    pub driving_kmh: f64,
    /// Public transport speed, including waits and changes.
    pub transit_kmh: f64,
    /// Cycling speed.
    pub bicycling_kmh: f64,
}

impl Default for TravelSpeeds {
    fn default() -> Self {
        Self {
            walking_kmh: 4.8,
            driving_kmh: 40.0,
            transit_kmh: 20.0,
            bicycling_kmh: 15.0,
        }
    }
}

impl TravelSpeeds {
    /// Speed used for `mode`.
    #[must_use]
    pub const fn for_mode(&self, mode: TransportMode) -> f64 {
        match mode {
            TransportMode::Walking => self.walking_kmh,
            TransportMode::Driving => self.driving_kmh,
            TransportMode::Transit => self.transit_kmh,
            TransportMode::Bicycling => self.bicycling_kmh,
        }
    }
}

/// Haversine distance in metres between two `x = longitude`, `y = latitude`
/// coordinates.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use itinera_data::routing::haversine_meters;
///
/// let paris = Coord { x: 2.3522, y: 48.8566 };
/// let london = Coord { x: -0.1276, y: 51.5072 };
/// let meters = haversine_meters(paris, london);
/// assert!((340_000.0..345_000.0).contains(&meters));
/// ```
#[must_use]
pub fn haversine_meters(from: Coord<f64>, to: Coord<f64>) -> f64 {
    Haversine.distance(Point::from(from), Point::from(to))
}

/// Travel-time provider estimating every leg from straight-line distance.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use itinera_core::{TransportMode, TravelTimeProvider};
/// use itinera_data::routing::StraightLineTravelTimeProvider;
///
/// # tokio::runtime::Builder::new_current_thread().build()?.block_on(async {
/// let provider = StraightLineTravelTimeProvider::default();
/// let coordinates = [Coord { x: 2.35, y: 48.85 }, Coord { x: 2.36, y: 48.85 }];
/// let matrix = provider
///     .travel_time_matrix(&coordinates, TransportMode::Walking)
///     .await?;
/// assert_eq!(matrix.len(), 2);
/// # Ok::<(), itinera_core::TravelTimeError>(())
/// # })?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StraightLineTravelTimeProvider {
    speeds: TravelSpeeds,
    detour_factor: f64,
}

impl Default for StraightLineTravelTimeProvider {
    fn default() -> Self {
        Self::new(TravelSpeeds::default())
    }
}

impl StraightLineTravelTimeProvider {
    /// Default ratio between street distance and straight-line distance.
    pub const DEFAULT_DETOUR_FACTOR: f64 = 1.3;

    /// Provider using `speeds` and the default detour factor.
    #[must_use]
    pub const fn new(speeds: TravelSpeeds) -> Self {
        Self {
            speeds,
            detour_factor: Self::DEFAULT_DETOUR_FACTOR,
        }
    }

    /// Replace the detour factor. Values below one are clamped to one.
    #[must_use]
    pub const fn with_detour_factor(mut self, factor: f64) -> Self {
        self.detour_factor = factor.max(1.0);
        self
    }

    /// Estimated cost of one leg under `mode`.
    #[must_use]
    #[expect(
        clippy::float_arithmetic,
        reason = "speed conversion works in floating point"
    )]
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "values are rounded, non-negative and far below u64::MAX"
    )]
    pub fn estimate(&self, from: Coord<f64>, to: Coord<f64>, mode: TransportMode) -> TravelCost {
        let meters = haversine_meters(from, to) * self.detour_factor;
        let speed_kmh = self.speeds.for_mode(mode);
        if !meters.is_finite() || speed_kmh <= 0.0 {
            return TravelCost::FALLBACK;
        }
        let seconds = meters * 3.6 / speed_kmh;
        TravelCost::from_secs(seconds.round() as u64, meters.round() as u64)
    }
}

#[async_trait]
impl TravelTimeProvider for StraightLineTravelTimeProvider {
    async fn travel_time_matrix(
        &self,
        coordinates: &[Coord<f64>],
        mode: TransportMode,
    ) -> Result<TravelTimeMatrix, TravelTimeError> {
        if coordinates.is_empty() {
            return Err(TravelTimeError::EmptyInput);
        }
        Ok(TravelTimeMatrix::from_fn(coordinates.len(), |from, to| {
            let start = coordinates.get(from)?;
            let end = coordinates.get(to)?;
            Some(self.estimate(*start, *end, mode))
        }))
    }
}
