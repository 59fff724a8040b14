//! Choose a visiting order for one day.
//!
//! Small days are solved exactly by scoring every ordering. Larger days use a
//! greedy nearest-neighbour construction, trading optimality for a bounded
//! `O(n²)` cost.

use std::cmp::{Ordering, Reverse};

use serde::{Deserialize, Serialize};

use crate::config::{MAX_EXACT_ACTIVITIES, OptimizerConfig};
use crate::permutations::Permutations;
use crate::scorer::RouteScorer;

/// Algorithm that produced an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SolveStrategy {
    /// Every ordering was scored.
    Exact,
    /// Greedy nearest-neighbour construction.
    NearestNeighbour,
}

/// Result of [`RouteSolver::solve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolveOutcome {
    /// Visiting order as indices into the day's activities.
    pub order: Vec<usize>,
    /// Algorithm used.
    pub strategy: SolveStrategy,
    /// Orders scored (exact) or candidate legs weighed (nearest neighbour).
    pub evaluations: u64,
}

/// Selects a visiting order using a [`RouteScorer`].
///
/// # Examples
/// ```
/// use chrono::NaiveTime;
/// use itinera_core::{
///     Activity, ActivityDefaults, RouteScorer, RouteSolver, ScoringWeights, SolveStrategy,
///     Stop, TravelCost, TravelTimeMatrix,
/// };
///
/// let activities = [
///     Activity::new("a", "A").with_priority(1),
///     Activity::new("b", "B").with_priority(5),
/// ];
/// let stops = Stop::from_activities(&activities, &ActivityDefaults::default());
/// let matrix = TravelTimeMatrix::uniform(2, TravelCost::FALLBACK);
/// let weights = ScoringWeights::default();
/// let start = NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default();
/// let scorer = RouteScorer::new(&stops, &matrix, start, &weights, TravelCost::FALLBACK);
///
/// let outcome = RouteSolver::default().solve(&scorer);
/// assert_eq!(outcome.order, vec![1, 0]);
/// assert_eq!(outcome.strategy, SolveStrategy::Exact);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteSolver {
    exact_limit: usize,
    priority_weight_secs: u64,
}

impl Default for RouteSolver {
    fn default() -> Self {
        Self::new(MAX_EXACT_ACTIVITIES, 300)
    }
}

impl RouteSolver {
    /// Solver that searches exhaustively up to `exact_limit` stops (capped at
    /// [`MAX_EXACT_ACTIVITIES`]) and weighs each priority point as
    /// `priority_weight_secs` of travel in the heuristic.
    #[must_use]
    pub fn new(exact_limit: usize, priority_weight_secs: u64) -> Self {
        Self {
            exact_limit: exact_limit.min(MAX_EXACT_ACTIVITIES),
            priority_weight_secs,
        }
    }

    /// Solver configured from `config`.
    #[must_use]
    pub fn from_config(config: &OptimizerConfig) -> Self {
        Self::new(
            config.exact_solve_limit,
            config.nearest_neighbour_priority_secs,
        )
    }

    /// Largest stop count solved exactly.
    #[must_use]
    pub const fn exact_limit(&self) -> usize {
        self.exact_limit
    }

    /// Order the scorer's stops.
    #[must_use]
    pub fn solve(&self, scorer: &RouteScorer<'_>) -> SolveOutcome {
        if scorer.len() <= self.exact_limit {
            Self::exact(scorer)
        } else {
            self.nearest_neighbour(scorer)
        }
    }

    /// Score every ordering and keep the cheapest.
    ///
    /// Equal scores are resolved by [`RouteScorer::tie_break`], so the result
    /// does not depend on enumeration order.
    #[must_use]
    pub fn exact(scorer: &RouteScorer<'_>) -> SolveOutcome {
        let mut evaluations = 0_u64;
        let mut best: Option<(f64, Vec<usize>)> = None;
        for order in Permutations::new(scorer.len()) {
            evaluations += 1;
            let score = scorer.score(&order);
            let improves = best.as_ref().is_none_or(|(best_score, best_order)| {
                match score.total_cmp(best_score) {
                    Ordering::Less => true,
                    Ordering::Equal => scorer.tie_break(&order, best_order).is_lt(),
                    Ordering::Greater => false,
                }
            });
            if improves {
                best = Some((score, order));
            }
        }
        SolveOutcome {
            order: best.map_or_else(Vec::new, |(_, order)| order),
            strategy: SolveStrategy::Exact,
            evaluations,
        }
    }

    /// Greedy construction from the highest-priority stop.
    ///
    /// Each step moves to the unvisited stop minimising
    /// `travel(current → candidate) − priority × weight`, using the directed
    /// leg from the current stop. Ties go to the lower index.
    #[must_use]
    pub fn nearest_neighbour(&self, scorer: &RouteScorer<'_>) -> SolveOutcome {
        let stops = scorer.stops();
        let n = stops.len();
        let mut evaluations = 0_u64;
        let start = stops
            .iter()
            .enumerate()
            .min_by_key(|(index, stop)| (Reverse(stop.priority), *index))
            .map(|(index, _)| index);
        let Some(mut current) = start else {
            return SolveOutcome {
                order: Vec::new(),
                strategy: SolveStrategy::NearestNeighbour,
                evaluations,
            };
        };

        let mut visited = vec![false; n];
        let mut order = Vec::with_capacity(n);
        mark(&mut visited, current);
        order.push(current);

        while order.len() < n {
            let next = stops
                .iter()
                .enumerate()
                .filter(|(index, _)| !visited.get(*index).copied().unwrap_or(true))
                .map(|(index, stop)| {
                    evaluations += 1;
                    let travel = i128::from(scorer.leg(current, index).duration.as_secs());
                    let pull = i128::from(stop.priority) * i128::from(self.priority_weight_secs);
                    (travel - pull, index)
                })
                .min()
                .map(|(_, index)| index);
            let Some(index) = next else {
                break;
            };
            mark(&mut visited, index);
            order.push(index);
            current = index;
        }

        SolveOutcome {
            order,
            strategy: SolveStrategy::NearestNeighbour,
            evaluations,
        }
    }
}

fn mark(visited: &mut [bool], index: usize) {
    if let Some(slot) = visited.get_mut(index) {
        *slot = true;
    }
}
