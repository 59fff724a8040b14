//! A scripted routing service for tests.
//!
//! [`StubTravelTimeProvider`] stands in for an OSRM instance: it prices every
//! request with a fixed leg, reports every pair as unroutable, or fails with a
//! preset error. Each request is recorded so tests can check what the caller
//! asked for.

use std::sync::Mutex;

use async_trait::async_trait;
use geo::Coord;
use itinera_core::{TransportMode, TravelCost, TravelTimeError, TravelTimeMatrix, TravelTimeProvider};

/// What a stub request looked like.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordedRequest {
    /// Coordinates in the request.
    pub locations: usize,
    /// Requested mode.
    pub mode: TransportMode,
}

#[derive(Debug, Clone)]
enum Script {
    Leg(TravelCost),
    Unroutable,
    Fail(TravelTimeError),
}

/// Scripted `TravelTimeProvider`.
///
/// Matrices are sized to each request, so one stub serves days of any
/// length. Empty requests fail with [`TravelTimeError::EmptyInput`] whatever
/// the script says.
///
/// # Example
///
/// ```
/// use geo::Coord;
/// use itinera_core::{TransportMode, TravelCost, TravelTimeProvider};
/// use itinera_data::routing::test_support::StubTravelTimeProvider;
///
/// # tokio::runtime::Builder::new_current_thread().build()?.block_on(async {
/// let provider = StubTravelTimeProvider::pricing(TravelCost::from_secs(60, 400));
/// let coordinates = [Coord { x: 0.0, y: 0.0 }, Coord { x: 1.0, y: 1.0 }];
///
/// let matrix = provider
///     .travel_time_matrix(&coordinates, TransportMode::Walking)
///     .await?;
/// assert_eq!(matrix.get(0, 1), Some(TravelCost::from_secs(60, 400)));
/// assert_eq!(provider.requests().len(), 1);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// # })?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct StubTravelTimeProvider {
    script: Script,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl StubTravelTimeProvider {
    const fn scripted(script: Script) -> Self {
        Self {
            script,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Price every off-diagonal pair at `leg`.
    #[must_use]
    pub const fn pricing(leg: TravelCost) -> Self {
        Self::scripted(Script::Leg(leg))
    }

    /// Report every off-diagonal pair as unroutable.
    #[must_use]
    pub const fn unroutable() -> Self {
        Self::scripted(Script::Unroutable)
    }

    /// Fail every non-empty request with `error`.
    #[must_use]
    pub const fn failing(error: TravelTimeError) -> Self {
        Self::scripted(Script::Fail(error))
    }

    /// Requests seen so far, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    fn record(&self, request: RecordedRequest) {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }
    }
}

#[async_trait]
impl TravelTimeProvider for StubTravelTimeProvider {
    async fn travel_time_matrix(
        &self,
        coordinates: &[Coord<f64>],
        mode: TransportMode,
    ) -> Result<TravelTimeMatrix, TravelTimeError> {
        self.record(RecordedRequest {
            locations: coordinates.len(),
            mode,
        });
        if coordinates.is_empty() {
            return Err(TravelTimeError::EmptyInput);
        }
        let size = coordinates.len();
        match &self.script {
            Script::Leg(leg) => Ok(TravelTimeMatrix::uniform(size, *leg)),
            Script::Unroutable => Ok(TravelTimeMatrix::from_fn(size, |_, _| None)),
            Script::Fail(error) => Err(error.clone()),
        }
    }
}
