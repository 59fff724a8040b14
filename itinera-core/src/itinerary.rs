//! Trip-level wire types: days, itineraries, preferences and the optimisation
//! annotations attached to them.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::activity::Activity;
use crate::solver::SolveStrategy;
use crate::transport::TransportMode;

/// One day of a trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Day {
    /// Calendar date.
    pub date: NaiveDate,
    /// Activities in visiting order.
    #[serde(default)]
    pub activities: Vec<Activity>,
    /// Present once the day has been optimised.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimization: Option<OptimizationResult>,
    /// Fields owned by other collaborators, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Day {
    /// A day with the given activities.
    #[must_use]
    pub fn new(date: NaiveDate, activities: Vec<Activity>) -> Self {
        Self {
            date,
            activities,
            optimization: None,
            extra: Map::new(),
        }
    }
}

/// Ordered days of a trip.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Itinerary {
    /// Days in travel order.
    #[serde(default)]
    pub days: Vec<Day>,
    /// Trip-level summary, set by the optimiser.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route_optimization: Option<RouteSummary>,
    /// Fields owned by other collaborators, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Itinerary {
    /// An itinerary over `days`.
    #[must_use]
    pub fn new(days: Vec<Day>) -> Self {
        Self {
            days,
            route_optimization: None,
            extra: Map::new(),
        }
    }
}

/// Traveller preferences for one optimisation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    /// Mode used for every leg.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transport_mode: Option<TransportMode>,
    /// When each day starts.
    #[serde(
        default,
        with = "crate::time::clock::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_time: Option<NaiveTime>,
}

/// How a day was reordered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationResult {
    /// Input order, always `0..n`.
    pub original_order: Vec<usize>,
    /// Chosen order as indices into the input activities.
    pub optimized_order: Vec<usize>,
    /// Travel seconds along the chosen order.
    pub total_travel_time: u64,
    /// Travel metres along the chosen order.
    pub total_distance: u64,
    /// Travel seconds saved against the input order; negative when the
    /// chosen order travels more to honour time windows or priorities.
    pub time_saved: i64,
    /// Algorithm that chose the order.
    pub strategy: SolveStrategy,
    /// Work done by the algorithm.
    pub evaluations: u64,
}

/// Coarse rating of how much of the day is spent at activities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Efficiency {
    /// At least 80% of the day at activities.
    Excellent,
    /// At least 60%.
    Good,
    /// Below 60%.
    Fair,
}

impl Efficiency {
    /// Rate a visit-time ratio in `0.0..=1.0`.
    #[must_use]
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio >= 0.8 {
            Self::Excellent
        } else if ratio >= 0.6 {
            Self::Good
        } else {
            Self::Fair
        }
    }
}

/// Trip-level roll-up attached as `routeOptimization`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteSummary {
    /// Always `true` once the optimiser has run.
    pub optimized: bool,
    /// Days in the itinerary.
    pub total_days: usize,
    /// Days that were reordered.
    pub optimized_days: usize,
    /// Mean travel seconds per optimised day.
    pub average_travel_time_per_day: u64,
    /// Mode suggested by the mean distance of routed legs; the preferred
    /// mode when no leg was routed.
    pub recommended_transport: TransportMode,
    /// Rating of [`Self::efficiency_ratio`].
    pub efficiency: Efficiency,
    /// Visit time over visit plus travel time, across optimised days.
    pub efficiency_ratio: f64,
}
