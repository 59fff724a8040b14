//! Deterministic `TravelTimeProvider` doubles used by unit and behaviour
//! tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use geo::Coord;

use crate::{TransportMode, TravelCost, TravelTimeError, TravelTimeMatrix, TravelTimeProvider};

/// Provider pricing every leg at the same cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformTravelTimeProvider {
    cost: TravelCost,
}

impl UniformTravelTimeProvider {
    /// Provider returning `cost` for every off-diagonal pair.
    #[must_use]
    pub const fn new(cost: TravelCost) -> Self {
        Self { cost }
    }
}

#[async_trait]
impl TravelTimeProvider for UniformTravelTimeProvider {
    async fn travel_time_matrix(
        &self,
        coordinates: &[Coord<f64>],
        _mode: TransportMode,
    ) -> Result<TravelTimeMatrix, TravelTimeError> {
        if coordinates.is_empty() {
            return Err(TravelTimeError::EmptyInput);
        }
        Ok(TravelTimeMatrix::uniform(coordinates.len(), self.cost))
    }
}

/// Provider that always fails with a fixed error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailingTravelTimeProvider {
    error: TravelTimeError,
}

impl FailingTravelTimeProvider {
    /// Provider failing with `error`.
    #[must_use]
    pub const fn new(error: TravelTimeError) -> Self {
        Self { error }
    }

    /// Provider failing as if the network were unreachable.
    #[must_use]
    pub fn network_down() -> Self {
        Self::new(TravelTimeError::NetworkError {
            url: "http://routing.invalid".to_owned(),
            message: "connection refused".to_owned(),
        })
    }
}

#[async_trait]
impl TravelTimeProvider for FailingTravelTimeProvider {
    async fn travel_time_matrix(
        &self,
        _coordinates: &[Coord<f64>],
        _mode: TransportMode,
    ) -> Result<TravelTimeMatrix, TravelTimeError> {
        Err(self.error.clone())
    }
}

/// Provider wrapper counting calls.
#[derive(Debug, Default)]
pub struct CountingTravelTimeProvider<P> {
    inner: P,
    calls: AtomicUsize,
}

impl<P> CountingTravelTimeProvider<P> {
    /// Count calls made to `inner`.
    #[must_use]
    pub const fn new(inner: P) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
        }
    }

    /// Calls made so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<P: TravelTimeProvider> TravelTimeProvider for CountingTravelTimeProvider<P> {
    async fn travel_time_matrix(
        &self,
        coordinates: &[Coord<f64>],
        mode: TransportMode,
    ) -> Result<TravelTimeMatrix, TravelTimeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.travel_time_matrix(coordinates, mode).await
    }
}

/// Provider wrapper that sleeps before delegating.
///
/// Pair with a paused Tokio clock to exercise request timeouts without
/// waiting in real time.
#[derive(Debug, Clone)]
pub struct DelayedTravelTimeProvider<P> {
    inner: P,
    delay: Duration,
}

impl<P> DelayedTravelTimeProvider<P> {
    /// Delay every call to `inner` by `delay`.
    #[must_use]
    pub const fn new(inner: P, delay: Duration) -> Self {
        Self { inner, delay }
    }
}

#[async_trait]
impl<P: TravelTimeProvider> TravelTimeProvider for DelayedTravelTimeProvider<P> {
    async fn travel_time_matrix(
        &self,
        coordinates: &[Coord<f64>],
        mode: TransportMode,
    ) -> Result<TravelTimeMatrix, TravelTimeError> {
        tokio::time::sleep(self.delay).await;
        self.inner.travel_time_matrix(coordinates, mode).await
    }
}

/// Provider returning a matrix smaller than requested.
#[derive(Debug, Default, Clone, Copy)]
pub struct TruncatingTravelTimeProvider;

#[async_trait]
impl TravelTimeProvider for TruncatingTravelTimeProvider {
    async fn travel_time_matrix(
        &self,
        coordinates: &[Coord<f64>],
        _mode: TransportMode,
    ) -> Result<TravelTimeMatrix, TravelTimeError> {
        let size = coordinates.len().saturating_sub(1);
        Ok(TravelTimeMatrix::uniform(size, TravelCost::from_secs(1, 1)))
    }
}

/// Provider wrapper that panics whenever a request includes `trigger`.
///
/// Lets tests crash the task handling one day while the others proceed.
#[derive(Debug, Clone, Copy)]
pub struct PanickingTravelTimeProvider<P> {
    inner: P,
    trigger: Coord<f64>,
}

impl<P> PanickingTravelTimeProvider<P> {
    /// Delegate to `inner` unless a request includes `trigger`.
    #[must_use]
    pub const fn new(inner: P, trigger: Coord<f64>) -> Self {
        Self { inner, trigger }
    }
}

#[async_trait]
impl<P: TravelTimeProvider> TravelTimeProvider for PanickingTravelTimeProvider<P> {
    async fn travel_time_matrix(
        &self,
        coordinates: &[Coord<f64>],
        mode: TransportMode,
    ) -> Result<TravelTimeMatrix, TravelTimeError> {
        if coordinates.contains(&self.trigger) {
            std::panic::panic_any(format!(
                "routing service crashed on ({}, {})",
                self.trigger.x, self.trigger.y
            ));
        }
        self.inner.travel_time_matrix(coordinates, mode).await
    }
}
