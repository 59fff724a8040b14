//! Cost model for a candidate visiting order.
//!
//! A score is expressed in seconds so its parts are comparable: travel time,
//! plus time-window penalties, minus a bonus for placing important
//! activities early. Lower is better.

use std::cmp::Ordering;
use std::time::Duration;

use chrono::NaiveTime;

use crate::activity::Stop;
use crate::config::ScoringWeights;
use crate::time::{advance, seconds_from_midnight};
use crate::travel_time::{TravelCost, TravelTimeMatrix};

/// Scores visiting orders for one day.
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use chrono::NaiveTime;
/// use itinera_core::{
///     Activity, ActivityDefaults, RouteScorer, ScoringWeights, Stop, TravelCost,
///     TravelTimeMatrix,
/// };
///
/// let activities = [Activity::new("a", "A"), Activity::new("b", "B")];
/// let stops = Stop::from_activities(&activities, &ActivityDefaults::default());
/// let matrix = TravelTimeMatrix::uniform(2, TravelCost::from_secs(600, 500));
/// let weights = ScoringWeights::default();
/// let start = NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default();
///
/// let scorer = RouteScorer::new(&stops, &matrix, start, &weights, TravelCost::FALLBACK);
/// assert_eq!(scorer.travel_time(&[0, 1]), Duration::from_secs(600));
/// assert!((scorer.score(&[0, 1]) - 600.0).abs() < f64::EPSILON);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RouteScorer<'a> {
    stops: &'a [Stop],
    matrix: &'a TravelTimeMatrix,
    day_start: NaiveTime,
    weights: &'a ScoringWeights,
    fallback: TravelCost,
}

impl<'a> RouteScorer<'a> {
    /// Create a scorer over `stops` priced by `matrix`.
    ///
    /// Matrix cells that are missing or out of range cost `fallback`.
    #[must_use]
    pub const fn new(
        stops: &'a [Stop],
        matrix: &'a TravelTimeMatrix,
        day_start: NaiveTime,
        weights: &'a ScoringWeights,
        fallback: TravelCost,
    ) -> Self {
        Self {
            stops,
            matrix,
            day_start,
            weights,
            fallback,
        }
    }

    /// Stops being ordered.
    #[must_use]
    pub const fn stops(&self) -> &'a [Stop] {
        self.stops
    }

    /// Number of stops being ordered.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.stops.len()
    }

    /// Whether there is nothing to order.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    /// Cost of the directed leg `from → to`.
    #[must_use]
    pub fn leg(&self, from: usize, to: usize) -> TravelCost {
        self.matrix.cost_or(from, to, self.fallback)
    }

    /// Sum of leg durations along `order`.
    #[must_use]
    pub fn travel_time(&self, order: &[usize]) -> Duration {
        legs(order).map(|(from, to)| self.leg(from, to).duration).sum()
    }

    /// Sum of leg distances along `order`, in metres.
    #[must_use]
    pub fn travel_distance(&self, order: &[usize]) -> u64 {
        legs(order)
            .map(|(from, to)| self.leg(from, to).distance_meters)
            .sum()
    }

    /// Score `order`; lower is better.
    ///
    /// Arrival at each stop is the day start plus every earlier visit and
    /// leg. Orders naming an unknown stop score `f64::INFINITY`.
    #[must_use]
    #[expect(
        clippy::float_arithmetic,
        clippy::cast_precision_loss,
        reason = "scores are second-scale sums well inside f64 precision"
    )]
    pub fn score(&self, order: &[usize]) -> f64 {
        let n = order.len();
        let day_start = seconds_from_midnight(self.day_start);
        let mut elapsed = 0_u64;
        let mut travel = 0_u64;
        let mut penalty = 0.0_f64;
        let mut bonus = 0_u64;
        let mut previous: Option<usize> = None;

        for (position, &index) in order.iter().enumerate() {
            let Some(stop) = self.stops.get(index) else {
                return f64::INFINITY;
            };
            if let Some(from) = previous {
                let leg = self.leg(from, index).duration.as_secs();
                travel += leg;
                elapsed += leg;
            }
            let arrival = advance(self.day_start, elapsed);
            if let Some(hours) = stop.opening_hours
                && !hours.covers(arrival)
            {
                penalty += self.weights.closed_venue_penalty_secs as f64;
            }
            if let Some(preferred) = stop.preferred_time {
                let deviation = (day_start + elapsed).abs_diff(seconds_from_midnight(preferred));
                penalty += deviation as f64 * self.weights.preferred_time_penalty_per_sec;
            }
            if stop.priority >= self.weights.high_priority_threshold {
                let remaining = (n - 1 - position) as u64;
                bonus += remaining * self.weights.priority_bonus_secs;
            }
            elapsed += stop.visit.as_secs();
            previous = Some(index);
        }

        travel as f64 + penalty - bonus as f64
    }

    /// Compare two equally scored orders: the one visiting higher priorities
    /// earlier wins, then the lexicographically smaller index sequence.
    #[must_use]
    pub fn tie_break(&self, candidate: &[usize], incumbent: &[usize]) -> Ordering {
        let priorities = |order: &[usize]| -> Vec<u8> {
            order
                .iter()
                .map(|&index| self.stops.get(index).map_or(0, |stop| stop.priority))
                .collect()
        };
        priorities(incumbent)
            .cmp(&priorities(candidate))
            .then_with(|| candidate.cmp(incumbent))
    }
}

fn legs(order: &[usize]) -> impl Iterator<Item = (usize, usize)> + '_ {
    order.windows(2).filter_map(|pair| match pair {
        [from, to] => Some((*from, *to)),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::{Activity, OpeningHours, PreferredTime};
    use crate::config::ActivityDefaults;
    use rstest::{fixture, rstest};

    fn at(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).expect("valid time")
    }

    #[fixture]
    fn weights() -> ScoringWeights {
        ScoringWeights::default()
    }

    fn stops(activities: &[Activity]) -> Vec<Stop> {
        Stop::from_activities(activities, &ActivityDefaults::default())
    }

    #[rstest]
    fn travel_only_score_sums_legs(weights: ScoringWeights) {
        let stops = stops(&[
            Activity::new("a", "A"),
            Activity::new("b", "B"),
            Activity::new("c", "C"),
        ]);
        let matrix = TravelTimeMatrix::from_fn(3, |from, to| {
            Some(TravelCost::from_secs(((from + 1) * 100 + to) as u64, 10))
        });
        let scorer = RouteScorer::new(&stops, &matrix, at(9, 0), &weights, TravelCost::FALLBACK);

        assert_eq!(scorer.travel_time(&[0, 1, 2]), Duration::from_secs(101 + 202));
        assert_eq!(scorer.travel_distance(&[0, 1, 2]), 20);
        assert!((scorer.score(&[2, 1, 0]) - f64::from(301 + 200)).abs() < f64::EPSILON);
    }

    #[rstest]
    fn closed_venue_adds_flat_penalty(weights: ScoringWeights) {
        let stops = stops(&[
            Activity::new("a", "A").with_duration_minutes(60),
            Activity::new("b", "B").with_opening_hours(OpeningHours::new(at(9, 0), at(10, 0))),
        ]);
        let matrix = TravelTimeMatrix::uniform(2, TravelCost::from_secs(600, 0));
        let scorer = RouteScorer::new(&stops, &matrix, at(9, 0), &weights, TravelCost::FALLBACK);

        // B first arrives at 09:00 (open); B second arrives at 10:10 (closed).
        assert!((scorer.score(&[1, 0]) - 600.0).abs() < f64::EPSILON);
        assert!((scorer.score(&[0, 1]) - 4_200.0).abs() < f64::EPSILON);
    }

    #[rstest]
    fn preferred_time_penalty_is_proportional(weights: ScoringWeights) {
        let stops = stops(&[Activity::new("a", "A")
            .with_preferred_time(PreferredTime::At(at(9, 20)))]);
        let matrix = TravelTimeMatrix::uniform(1, TravelCost::ZERO);
        let scorer = RouteScorer::new(&stops, &matrix, at(9, 0), &weights, TravelCost::FALLBACK);

        assert!((scorer.score(&[0]) - 600.0).abs() < f64::EPSILON);
    }

    #[rstest]
    fn early_high_priority_earns_bonus(weights: ScoringWeights) {
        let stops = stops(&[
            Activity::new("a", "A").with_priority(5),
            Activity::new("b", "B").with_priority(1),
            Activity::new("c", "C").with_priority(3),
        ]);
        let matrix = TravelTimeMatrix::uniform(3, TravelCost::from_secs(600, 500));
        let scorer = RouteScorer::new(&stops, &matrix, at(9, 0), &weights, TravelCost::FALLBACK);

        assert!((scorer.score(&[0, 2, 1]) - 600.0).abs() < f64::EPSILON);
        assert!((scorer.score(&[2, 1, 0]) - 1_200.0).abs() < f64::EPSILON);
        assert_eq!(scorer.tie_break(&[0, 2, 1], &[0, 1, 2]), Ordering::Less);
        assert_eq!(scorer.tie_break(&[0, 1, 2], &[0, 2, 1]), Ordering::Greater);
    }

    #[rstest]
    fn unknown_index_scores_infinity(weights: ScoringWeights) {
        let stops = stops(&[Activity::new("a", "A")]);
        let matrix = TravelTimeMatrix::uniform(1, TravelCost::ZERO);
        let scorer = RouteScorer::new(&stops, &matrix, at(9, 0), &weights, TravelCost::FALLBACK);
        assert!(scorer.score(&[3]).is_infinite());
    }
}
