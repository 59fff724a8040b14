//! The seam between the optimiser and a routing backend.

use std::sync::Arc;

use async_trait::async_trait;
use geo::Coord;

use super::error::TravelTimeError;
use super::matrix::TravelTimeMatrix;
use crate::transport::TransportMode;

/// A source of pairwise travel costs, usually a routing service.
///
/// Answers are square `n×n` matrices with
/// `n == coordinates.len()`; `get(i, j)` is the cost from `coordinates[i]` to
/// `coordinates[j]`. Coordinates use `x = longitude`, `y = latitude`.
///
/// Calls may suspend on network I/O. Every error is treated as recoverable by
/// [`TravelTimeCache`](crate::TravelTimeCache).
///
/// # Examples
///
/// ```rust
/// use async_trait::async_trait;
/// use geo::Coord;
/// use itinera_core::{
///     TransportMode, TravelCost, TravelTimeError, TravelTimeMatrix, TravelTimeProvider,
/// };
///
/// struct FlatRate;
///
/// #[async_trait]
/// impl TravelTimeProvider for FlatRate {
///     async fn travel_time_matrix(
///         &self,
///         coordinates: &[Coord<f64>],
///         _mode: TransportMode,
///     ) -> Result<TravelTimeMatrix, TravelTimeError> {
///         if coordinates.is_empty() {
///             return Err(TravelTimeError::EmptyInput);
///         }
///         Ok(TravelTimeMatrix::uniform(coordinates.len(), TravelCost::from_secs(1, 1)))
///     }
/// }
///
/// # tokio::runtime::Builder::new_current_thread().build()?.block_on(async {
/// let matrix = FlatRate
///     .travel_time_matrix(&[Coord { x: 0.0, y: 0.0 }], TransportMode::Walking)
///     .await?;
/// assert_eq!(matrix.len(), 1);
/// # Ok::<(), TravelTimeError>(())
/// # })?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[async_trait]
pub trait TravelTimeProvider: Send + Sync {
    /// Costs between every ordered pair of `coordinates` under `mode`.
    ///
    /// Implementations must return `Err(TravelTimeError::EmptyInput)` when
    /// `coordinates` is empty.
    async fn travel_time_matrix(
        &self,
        coordinates: &[Coord<f64>],
        mode: TransportMode,
    ) -> Result<TravelTimeMatrix, TravelTimeError>;
}

#[async_trait]
impl<T: TravelTimeProvider + ?Sized> TravelTimeProvider for Box<T> {
    async fn travel_time_matrix(
        &self,
        coordinates: &[Coord<f64>],
        mode: TransportMode,
    ) -> Result<TravelTimeMatrix, TravelTimeError> {
        (**self).travel_time_matrix(coordinates, mode).await
    }
}

#[async_trait]
impl<T: TravelTimeProvider + ?Sized> TravelTimeProvider for Arc<T> {
    async fn travel_time_matrix(
        &self,
        coordinates: &[Coord<f64>],
        mode: TransportMode,
    ) -> Result<TravelTimeMatrix, TravelTimeError> {
        (**self).travel_time_matrix(coordinates, mode).await
    }
}
