//! Core domain types and algorithms for the Itinera route engine.
//!
//! The crate reorders the activities of each travel day to cut travel time
//! while honouring opening hours, preferred visit times and priorities, then
//! assigns every activity a time slot and a travel annotation.
//!
//! The pipeline for one day is:
//!
//! 1. normalise activities into [`Stop`] values,
//! 2. fetch a [`TravelTimeMatrix`] through the [`TravelTimeCache`],
//! 3. choose an order with the [`RouteSolver`], guided by the [`RouteScorer`],
//! 4. assign times with the [`ActivityScheduler`].
//!
//! [`ItineraryOptimizer`] runs that pipeline for every day of an
//! [`Itinerary`] and never fails: anything that goes wrong leaves the
//! affected day in its original order.

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod activity;
pub mod cache;
pub mod config;
mod error;
pub mod itinerary;
pub mod optimizer;
mod permutations;
pub mod scheduler;
pub mod scorer;
pub mod solver;
#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-support")))]
pub mod test_support;
pub mod time;
pub mod transport;
pub mod travel_time;

pub use activity::{
    Activity, LatLng, Location, OpeningHours, PreferredTime, Stop, StopLocation, TimeSlot,
    TravelLeg,
};
pub use cache::{CacheStats, StopCosts, TravelTimeCache};
pub use config::{
    ActivityDefaults, CacheConfig, MAX_EXACT_ACTIVITIES, OptimizerConfig, ScoringWeights,
    TransportThresholds,
};
pub use error::OptimizeError;
pub use itinerary::{Day, Efficiency, Itinerary, OptimizationResult, Preferences, RouteSummary};
pub use optimizer::{DayOutcome, DaySettings, ItineraryOptimizer};
pub use permutations::{Permutations, factorial};
pub use scheduler::{ActivityScheduler, ScheduledDay, format_duration, validate_permutation};
pub use scorer::RouteScorer;
pub use solver::{RouteSolver, SolveOutcome, SolveStrategy};
pub use time::TimeParseError;
pub use transport::{TransportMode, UnknownTransportMode};
pub use travel_time::{TravelCost, TravelTimeError, TravelTimeMatrix, TravelTimeProvider};
