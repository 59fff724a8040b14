//! Compute travel costs between activity locations.
//!
//! The [`TravelTimeProvider`] trait abstracts the retrieval of pairwise travel
//! costs between coordinates for a [`TransportMode`](crate::TransportMode).
//! Callers supply a slice of coordinates and receive a [`TravelTimeMatrix`] of
//! [`TravelCost`] cells.
//!
//! Errors are returned when inputs are invalid or the routing source fails.

mod error;
mod matrix;
mod provider;

pub use error::TravelTimeError;
pub use matrix::{TravelCost, TravelTimeMatrix};
pub use provider::TravelTimeProvider;
