//! Turn a visiting order into a timed day.
//!
//! Starting from the day start, each activity is given a slot as long as its
//! visit, and every activity but the last is annotated with the leg to the
//! next one. The slot of activity `k + 1` starts exactly when the slot of
//! activity `k` ends plus that leg.

use std::time::Duration;

use chrono::NaiveTime;

use crate::activity::{Activity, Stop, TimeSlot, TravelLeg};
use crate::error::OptimizeError;
use crate::time::advance;
use crate::transport::TransportMode;
use crate::travel_time::{TravelCost, TravelTimeMatrix};

/// Activities of one day with their slots and legs filled in.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledDay {
    /// Activities in visiting order.
    pub activities: Vec<Activity>,
    /// Sum of leg durations.
    pub travel_time: Duration,
    /// Sum of leg distances in metres.
    pub travel_distance: u64,
    /// Sum of visit durations.
    pub visit_time: Duration,
    /// Number of legs travelled.
    pub legs: usize,
}

/// Assigns start and end times along an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivityScheduler {
    start: NaiveTime,
    mode: TransportMode,
    fallback: TravelCost,
}

impl ActivityScheduler {
    /// Scheduler starting at `start` and annotating legs with `mode`.
    #[must_use]
    pub const fn new(start: NaiveTime, mode: TransportMode, fallback: TravelCost) -> Self {
        Self {
            start,
            mode,
            fallback,
        }
    }

    /// Schedule `activities` in `order`.
    ///
    /// `stops[i]` must be the normalised form of `activities[i]` and `matrix`
    /// must cover the same indices.
    ///
    /// # Errors
    ///
    /// Returns [`OptimizeError::DimensionMismatch`] when the inputs disagree
    /// in size and [`OptimizeError::InvalidPermutation`] when `order` is not
    /// a permutation of the activity indices.
    ///
    /// # Examples
    /// ```
    /// use chrono::NaiveTime;
    /// use itinera_core::{
    ///     Activity, ActivityDefaults, ActivityScheduler, Stop, TransportMode, TravelCost,
    ///     TravelTimeMatrix,
    /// };
    ///
    /// let activities = [
    ///     Activity::new("a", "A").with_duration_minutes(60),
    ///     Activity::new("b", "B").with_duration_minutes(30),
    /// ];
    /// let stops = Stop::from_activities(&activities, &ActivityDefaults::default());
    /// let matrix = TravelTimeMatrix::uniform(2, TravelCost::from_secs(600, 500));
    /// let start = NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default();
    /// let scheduler = ActivityScheduler::new(start, TransportMode::Walking, TravelCost::FALLBACK);
    ///
    /// let day = scheduler.schedule(&activities, &stops, &[1, 0], &matrix)?;
    /// let first = day.activities.first().and_then(|a| a.travel_to_next.as_ref());
    /// assert_eq!(first.map(|leg| leg.duration_text.as_str()), Some("10 mins"));
    /// # Ok::<(), itinera_core::OptimizeError>(())
    /// ```
    pub fn schedule(
        &self,
        activities: &[Activity],
        stops: &[Stop],
        order: &[usize],
        matrix: &TravelTimeMatrix,
    ) -> Result<ScheduledDay, OptimizeError> {
        let n = activities.len();
        for actual in [stops.len(), matrix.len()] {
            if actual != n {
                return Err(OptimizeError::DimensionMismatch {
                    expected: n,
                    actual,
                });
            }
        }
        validate_permutation(order, n)?;

        let mut elapsed = 0_u64;
        let mut day = ScheduledDay {
            activities: Vec::with_capacity(n),
            travel_time: Duration::ZERO,
            travel_distance: 0,
            visit_time: Duration::ZERO,
            legs: 0,
        };
        let mut positions = order.iter().copied().peekable();
        while let Some(index) = positions.next() {
            let (Some(activity), Some(stop)) = (activities.get(index), stops.get(index)) else {
                return Err(invalid(order, n));
            };
            let mut scheduled = activity.clone();
            let start_time = advance(self.start, elapsed);
            elapsed += stop.visit.as_secs();
            scheduled.time_slot = Some(TimeSlot {
                start_time,
                end_time: advance(self.start, elapsed),
            });
            day.visit_time += stop.visit;

            scheduled.travel_to_next = positions.peek().map(|&next| {
                let leg = matrix.cost_or(index, next, self.fallback);
                elapsed += leg.duration.as_secs();
                day.travel_time += leg.duration;
                day.travel_distance += leg.distance_meters;
                day.legs += 1;
                TravelLeg {
                    duration: leg.duration.as_secs(),
                    duration_text: format_duration(leg.duration),
                    distance: leg.distance_meters,
                    mode: self.mode,
                }
            });
            day.activities.push(scheduled);
        }
        Ok(day)
    }
}

/// Check that `order` visits every index in `0..len` exactly once.
///
/// # Errors
///
/// Returns [`OptimizeError::InvalidPermutation`] otherwise.
pub fn validate_permutation(order: &[usize], len: usize) -> Result<(), OptimizeError> {
    if order.len() != len {
        return Err(invalid(order, len));
    }
    let mut seen = vec![false; len];
    for &index in order {
        match seen.get_mut(index) {
            Some(slot) if !*slot => *slot = true,
            _ => return Err(invalid(order, len)),
        }
    }
    Ok(())
}

fn invalid(order: &[usize], len: usize) -> OptimizeError {
    OptimizeError::InvalidPermutation {
        order: order.to_vec(),
        len,
    }
}

/// Render a travel duration for people: `"1 min"`, `"10 mins"`,
/// `"1 hour 5 mins"`, `"2 hours"`. Seconds round to the nearest minute.
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    let total_minutes = duration.as_secs().saturating_add(30).div_euclid(60);
    let (hours, minutes) = (total_minutes.div_euclid(60), total_minutes.rem_euclid(60));
    let plural = |count: u64, unit: &str| {
        if count == 1 {
            format!("1 {unit}")
        } else {
            format!("{count} {unit}s")
        }
    };
    match (hours, minutes) {
        (0, m) => plural(m, "min"),
        (h, 0) => plural(h, "hour"),
        (h, m) => format!("{} {}", plural(h, "hour"), plural(m, "min")),
    }
}
