//! Facade crate for the Itinera route engine.
//!
//! This crate re-exports the core domain types and exposes the routing
//! service adapters behind the `http-provider` feature.

#![forbid(unsafe_code)]

pub use itinera_core::{
    Activity, CacheConfig, Day, Efficiency, Itinerary, ItineraryOptimizer, OptimizationResult,
    OptimizeError, OptimizerConfig, Preferences, RouteScorer, RouteSolver, RouteSummary,
    SolveStrategy, TransportMode, TravelCost, TravelTimeCache, TravelTimeError, TravelTimeMatrix,
    TravelTimeProvider,
};

#[cfg(feature = "http-provider")]
pub use itinera_data::routing::{
    HttpTravelTimeProvider, HttpTravelTimeProviderConfig, StraightLineTravelTimeProvider,
};
