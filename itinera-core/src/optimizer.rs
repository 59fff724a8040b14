//! Optimise every day of an itinerary.
//!
//! Each day with at least two activities is fetched, solved and scheduled in
//! its own Tokio task; up to [`OptimizerConfig::max_concurrent_days`] run at
//! once and results are reassembled in input order. A day whose optimisation
//! fails for any reason is returned exactly as it came in.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveTime;
use futures_util::stream::{self, StreamExt};
use log::{debug, info, warn};

use crate::activity::{Stop, StopLocation};
use crate::cache::{StopCosts, TravelTimeCache};
use crate::config::OptimizerConfig;
use crate::error::OptimizeError;
use crate::itinerary::{Day, Efficiency, Itinerary, OptimizationResult, Preferences, RouteSummary};
use crate::scheduler::ActivityScheduler;
use crate::scorer::RouteScorer;
use crate::solver::{RouteSolver, SolveStrategy};
use crate::transport::TransportMode;
use crate::travel_time::TravelTimeProvider;

/// Settings resolved from [`Preferences`] and [`OptimizerConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DaySettings {
    /// Start of the day.
    pub start: NaiveTime,
    /// Mode used for every leg.
    pub mode: TransportMode,
}

impl DaySettings {
    /// Apply `preferences` over the configured defaults.
    #[must_use]
    pub fn resolve(preferences: &Preferences, config: &OptimizerConfig) -> Self {
        Self {
            start: preferences.start_time.unwrap_or(config.day_start),
            mode: preferences.transport_mode.unwrap_or(config.transport_mode),
        }
    }
}

/// A successfully optimised day and the figures the summary needs.
#[derive(Debug, Clone, PartialEq)]
pub struct DayOutcome {
    /// The reordered, scheduled day.
    pub day: Day,
    /// Travel along the chosen order.
    pub travel_time: Duration,
    /// Travel distance along the chosen order, in metres.
    pub travel_distance: u64,
    /// Time spent at activities.
    pub visit_time: Duration,
    /// Legs travelled.
    pub legs: usize,
    /// Legs the travel-time provider priced, as opposed to defaulted.
    pub routed_legs: usize,
    /// Distance over the routed legs, in metres.
    pub routed_distance: u64,
}

#[derive(Debug)]
struct Inner<P> {
    cache: Arc<TravelTimeCache<P>>,
    config: OptimizerConfig,
}

/// Reorders and schedules the days of an itinerary.
///
/// Cloning is cheap; clones share the travel-time cache.
///
/// # Examples
/// ```
/// use async_trait::async_trait;
/// use chrono::NaiveDate;
/// use geo::Coord;
/// use itinera_core::{
///     Activity, Day, Itinerary, ItineraryOptimizer, OptimizerConfig, Preferences,
///     TransportMode, TravelCost, TravelTimeError, TravelTimeMatrix, TravelTimeProvider,
/// };
///
/// struct TenMinutes;
///
/// #[async_trait]
/// impl TravelTimeProvider for TenMinutes {
///     async fn travel_time_matrix(
///         &self,
///         coordinates: &[Coord<f64>],
///         _mode: TransportMode,
///     ) -> Result<TravelTimeMatrix, TravelTimeError> {
///         Ok(TravelTimeMatrix::uniform(coordinates.len(), TravelCost::from_secs(600, 500)))
///     }
/// }
///
/// # tokio::runtime::Builder::new_current_thread().enable_time().build()?.block_on(async {
/// let optimizer = ItineraryOptimizer::with_provider(TenMinutes, OptimizerConfig::default());
/// let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap_or_default();
/// let day = Day::new(date, vec![
///     Activity::new("a", "A").with_coordinates(48.86, 2.34),
///     Activity::new("b", "B").with_coordinates(48.85, 2.35).with_priority(5),
/// ]);
/// let optimized = optimizer
///     .optimize_itinerary(&Itinerary::new(vec![day]), &Preferences::default())
///     .await;
/// let result = optimized.days.first().and_then(|d| d.optimization.as_ref());
/// assert_eq!(result.map(|o| o.optimized_order.clone()), Some(vec![1, 0]));
/// # });
/// # Ok::<(), std::io::Error>(())
/// ```
#[derive(Debug)]
pub struct ItineraryOptimizer<P> {
    inner: Arc<Inner<P>>,
}

impl<P> Clone for ItineraryOptimizer<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P: TravelTimeProvider + 'static> ItineraryOptimizer<P> {
    /// Optimiser sharing an existing cache.
    #[must_use]
    pub fn new(cache: Arc<TravelTimeCache<P>>, config: OptimizerConfig) -> Self {
        Self {
            inner: Arc::new(Inner { cache, config }),
        }
    }

    /// Optimiser owning a fresh cache around `provider`.
    #[must_use]
    pub fn with_provider(provider: P, config: OptimizerConfig) -> Self {
        let cache = Arc::new(TravelTimeCache::new(provider, config.cache));
        Self::new(cache, config)
    }

    /// The shared travel-time cache.
    #[must_use]
    pub fn cache(&self) -> &Arc<TravelTimeCache<P>> {
        &self.inner.cache
    }

    /// Configuration in effect.
    #[must_use]
    pub fn config(&self) -> &OptimizerConfig {
        &self.inner.config
    }

    /// Optimise every day and attach a trip summary.
    ///
    /// Never fails: days that cannot be optimised keep their original order
    /// and carry no `optimization` block. The input is left untouched.
    pub async fn optimize_itinerary(
        &self,
        itinerary: &Itinerary,
        preferences: &Preferences,
    ) -> Itinerary {
        let settings = DaySettings::resolve(preferences, &self.inner.config);
        let limit = self.inner.config.max_concurrent_days.max(1);

        let results: Vec<(Day, Option<DayOutcome>)> = stream::iter(itinerary.days.iter().cloned())
            .map(|day| {
                let optimizer = self.clone();
                async move {
                    if day.activities.len() < 2 {
                        return (day, None);
                    }
                    let task_day = day.clone();
                    let joined =
                        tokio::spawn(async move { optimizer.optimize_day(&task_day, settings).await })
                            .await;
                    let outcome = joined
                        .map_err(|err| OptimizeError::TaskFailed {
                            message: err.to_string(),
                        })
                        .and_then(|result| result);
                    match outcome {
                        Ok(outcome) => (day, Some(outcome)),
                        Err(err) => {
                            warn!("keeping original order for {}: {err}", day.date);
                            (day, None)
                        }
                    }
                }
            })
            .buffered(limit)
            .collect()
            .await;

        let summary = self.summarise(&results, settings.mode);
        let days = results
            .into_iter()
            .map(|(day, outcome)| outcome.map_or(day, |optimised| optimised.day))
            .collect();
        info!(
            "optimised {} of {} days",
            summary.optimized_days, summary.total_days
        );
        Itinerary {
            days,
            route_optimization: Some(summary),
            extra: itinerary.extra.clone(),
        }
    }

    /// Fetch, solve and schedule one day.
    ///
    /// # Errors
    ///
    /// Returns an [`OptimizeError`] when the solver's order cannot be
    /// scheduled against the day's activities.
    pub async fn optimize_day(
        &self,
        day: &Day,
        settings: DaySettings,
    ) -> Result<DayOutcome, OptimizeError> {
        let config = &self.inner.config;
        let stops = Stop::from_activities(&day.activities, &config.defaults);
        let locations: Vec<StopLocation> = stops.iter().map(|stop| stop.location).collect();
        let unknown = locations
            .iter()
            .filter(|location| matches!(location, StopLocation::Unknown))
            .count();
        if unknown > 0 {
            debug!(
                "{unknown} activities on {} have no usable coordinates; using default costs",
                day.date
            );
        }

        let costs = self.inner.cache.costs_for(&locations, settings.mode).await;
        let matrix = costs.matrix();
        if matrix.len() != stops.len() {
            return Err(OptimizeError::DimensionMismatch {
                expected: stops.len(),
                actual: matrix.len(),
            });
        }
        let fallback = config.cache.fallback_cost;
        let scorer = RouteScorer::new(&stops, matrix, settings.start, &config.scoring, fallback);
        let solved = RouteSolver::from_config(config).solve(&scorer);
        if solved.strategy == SolveStrategy::NearestNeighbour {
            debug!(
                "{} has {} activities; using nearest-neighbour ordering",
                day.date,
                stops.len()
            );
        }

        let scheduler = ActivityScheduler::new(settings.start, settings.mode, fallback);
        let scheduled = scheduler.schedule(&day.activities, &stops, &solved.order, matrix)?;
        let (routed_legs, routed_distance) = routed_travel(&costs, &solved.order);

        let original_order: Vec<usize> = (0..stops.len()).collect();
        let original_travel = scorer.travel_time(&original_order);
        let time_saved = signed_secs(original_travel) - signed_secs(scheduled.travel_time);
        let optimization = OptimizationResult {
            original_order,
            optimized_order: solved.order,
            total_travel_time: scheduled.travel_time.as_secs(),
            total_distance: scheduled.travel_distance,
            time_saved,
            strategy: solved.strategy,
            evaluations: solved.evaluations,
        };

        Ok(DayOutcome {
            day: Day {
                date: day.date,
                activities: scheduled.activities,
                optimization: Some(optimization),
                extra: day.extra.clone(),
            },
            travel_time: scheduled.travel_time,
            travel_distance: scheduled.travel_distance,
            visit_time: scheduled.visit_time,
            legs: scheduled.legs,
            routed_legs,
            routed_distance,
        })
    }

    #[expect(
        clippy::float_arithmetic,
        clippy::cast_precision_loss,
        reason = "ratio of second totals"
    )]
    fn summarise(&self, results: &[(Day, Option<DayOutcome>)], preferred: TransportMode) -> RouteSummary {
        let optimised: Vec<&DayOutcome> = results.iter().filter_map(|(_, o)| o.as_ref()).collect();
        let travel: u64 = optimised.iter().map(|o| o.travel_time.as_secs()).sum();
        let visit: u64 = optimised.iter().map(|o| o.visit_time.as_secs()).sum();
        let distance: u64 = optimised.iter().map(|o| o.routed_distance).sum();
        let legs: u64 = optimised.iter().map(|o| o.routed_legs as u64).sum();

        let average_travel_time_per_day = travel
            .checked_div(optimised.len() as u64)
            .unwrap_or_default();
        let thresholds = self.inner.config.transport_thresholds;
        let recommended_transport = match distance.checked_div(legs) {
            None => preferred,
            Some(mean) if mean <= thresholds.walking_max_leg_meters => TransportMode::Walking,
            Some(mean) if mean <= thresholds.transit_max_leg_meters => TransportMode::Transit,
            Some(_) => TransportMode::Driving,
        };
        let efficiency_ratio = if travel == 0 {
            1.0
        } else {
            visit as f64 / (visit + travel) as f64
        };

        RouteSummary {
            optimized: true,
            total_days: results.len(),
            optimized_days: optimised.len(),
            average_travel_time_per_day,
            recommended_transport,
            efficiency: Efficiency::from_ratio(efficiency_ratio),
            efficiency_ratio,
        }
    }
}

/// Count and length of the legs in `order` that the provider priced.
fn routed_travel(costs: &StopCosts, order: &[usize]) -> (usize, u64) {
    order
        .windows(2)
        .filter_map(|pair| match pair {
            [from, to] if costs.is_routed(*from, *to) => costs.matrix().get(*from, *to),
            _ => None,
        })
        .fold((0_usize, 0_u64), |(legs, meters), cost| {
            (legs.saturating_add(1), meters.saturating_add(cost.distance_meters))
        })
}

fn signed_secs(duration: Duration) -> i64 {
    i64::try_from(duration.as_secs()).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::Activity;
    use crate::test_support::{
        FailingTravelTimeProvider, PanickingTravelTimeProvider, UniformTravelTimeProvider,
    };
    use crate::travel_time::{TravelCost, TravelTimeError};
    use chrono::NaiveDate;
    use geo::Coord;
    use rstest::rstest;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, day).expect("valid date")
    }

    fn located(id: &str, lat: f64) -> Activity {
        Activity::new(id, id.to_uppercase()).with_coordinates(lat, 2.35)
    }

    #[rstest]
    #[tokio::test]
    async fn short_days_pass_through_unchanged() {
        let optimizer = ItineraryOptimizer::with_provider(
            UniformTravelTimeProvider::new(TravelCost::FALLBACK),
            OptimizerConfig::default(),
        );
        let itinerary = Itinerary::new(vec![
            Day::new(date(1), Vec::new()),
            Day::new(date(2), vec![located("a", 48.0)]),
        ]);

        let result = optimizer
            .optimize_itinerary(&itinerary, &Preferences::default())
            .await;
        assert_eq!(result.days, itinerary.days);
        let summary = result.route_optimization.expect("summary");
        assert_eq!(summary.total_days, 2);
        assert_eq!(summary.optimized_days, 0);
        assert_eq!(summary.average_travel_time_per_day, 0);
        assert_eq!(summary.recommended_transport, TransportMode::Driving);
        assert_eq!(summary.efficiency, Efficiency::Excellent);
    }

    #[rstest]
    #[tokio::test]
    async fn summary_recommends_walking_for_short_legs() {
        let optimizer = ItineraryOptimizer::with_provider(
            UniformTravelTimeProvider::new(TravelCost::from_secs(900, 1_200)),
            OptimizerConfig::default(),
        );
        let itinerary = Itinerary::new(vec![Day::new(
            date(1),
            vec![located("a", 48.0), located("b", 48.01), located("c", 48.02)],
        )]);
        let prefs = Preferences {
            transport_mode: Some(TransportMode::Transit),
            start_time: None,
        };

        let result = optimizer.optimize_itinerary(&itinerary, &prefs).await;
        let summary = result.route_optimization.expect("summary");
        assert_eq!(summary.optimized_days, 1);
        assert_eq!(summary.average_travel_time_per_day, 1_800);
        assert_eq!(summary.recommended_transport, TransportMode::Walking);
        // 6 hours visiting, 30 minutes travelling.
        assert_eq!(summary.efficiency, Efficiency::Excellent);
        let legs: Vec<_> = result.days[0]
            .activities
            .iter()
            .filter_map(|a| a.travel_to_next.as_ref())
            .collect();
        assert!(legs.iter().all(|leg| leg.mode == TransportMode::Transit));
    }

    #[rstest]
    #[tokio::test]
    async fn provider_failure_still_optimises() {
        let optimizer = ItineraryOptimizer::with_provider(
            FailingTravelTimeProvider::new(TravelTimeError::ServiceError {
                code: "OverQueryLimit".into(),
                message: "quota exhausted".into(),
            }),
            OptimizerConfig::default(),
        );
        let itinerary = Itinerary::new(vec![Day::new(
            date(1),
            vec![located("a", 48.0), located("b", 48.1)],
        )]);

        let result = optimizer
            .optimize_itinerary(&itinerary, &Preferences::default())
            .await;
        let optimization = result.days[0].optimization.as_ref().expect("optimised");
        assert_eq!(optimization.total_travel_time, 600);
        assert_eq!(optimization.total_distance, 500);
        assert_eq!(optimization.time_saved, 0);
        assert_eq!(optimizer.cache().stats().await.provider_failures, 1);
    }

    #[rstest]
    #[case(TransportMode::Transit)]
    #[case(TransportMode::Walking)]
    #[tokio::test]
    async fn defaulted_legs_leave_the_preferred_mode_recommended(#[case] preferred: TransportMode) {
        let optimizer = ItineraryOptimizer::with_provider(
            FailingTravelTimeProvider::network_down(),
            OptimizerConfig::default(),
        );
        let itinerary = Itinerary::new(vec![Day::new(
            date(1),
            vec![located("a", 48.0), located("b", 48.1), located("c", 48.2)],
        )]);
        let prefs = Preferences {
            transport_mode: Some(preferred),
            start_time: None,
        };

        let result = optimizer.optimize_itinerary(&itinerary, &prefs).await;
        let summary = result.route_optimization.expect("summary");
        assert_eq!(summary.optimized_days, 1);
        assert_eq!(summary.recommended_transport, preferred);
    }

    #[rstest]
    #[tokio::test]
    async fn unknown_locations_do_not_skew_the_recommendation() {
        let optimizer = ItineraryOptimizer::with_provider(
            UniformTravelTimeProvider::new(TravelCost::from_secs(60, 9_000)),
            OptimizerConfig::default(),
        );
        let itinerary = Itinerary::new(vec![Day::new(
            date(1),
            vec![
                located("a", 48.0),
                located("b", 48.1),
                Activity::new("c", "C"),
            ],
        )]);

        let prefs = Preferences {
            transport_mode: Some(TransportMode::Walking),
            start_time: None,
        };

        let result = optimizer.optimize_itinerary(&itinerary, &prefs).await;
        let summary = result.route_optimization.expect("summary");
        assert_eq!(
            result.days[0].optimization.as_ref().map(|o| o.optimized_order.clone()),
            Some(vec![0, 1, 2])
        );
        // One routed 9 km leg; the 500 m defaults to and from "c" are ignored.
        assert_eq!(summary.recommended_transport, TransportMode::Driving);
    }

    #[rstest]
    #[tokio::test]
    async fn crashed_day_is_returned_unchanged_between_optimised_days() {
        let trigger = Coord { x: 2.35, y: 47.5 };
        let optimizer = ItineraryOptimizer::with_provider(
            PanickingTravelTimeProvider::new(
                UniformTravelTimeProvider::new(TravelCost::from_secs(300, 400)),
                trigger,
            ),
            OptimizerConfig::default(),
        );
        let itinerary = Itinerary::new(vec![
            Day::new(date(1), vec![located("a", 48.0), located("b", 48.1)]),
            Day::new(date(2), vec![located("c", 47.5), located("d", 47.6)]),
            Day::new(date(3), vec![located("e", 46.0), located("f", 46.1)]),
        ]);

        let result = optimizer
            .optimize_itinerary(&itinerary, &Preferences::default())
            .await;

        let dates: Vec<NaiveDate> = result.days.iter().map(|day| day.date).collect();
        assert_eq!(dates, vec![date(1), date(2), date(3)]);
        assert_eq!(result.days[1], itinerary.days[1]);
        assert!(result.days[1].optimization.is_none());
        assert!(result.days[0].optimization.is_some());
        assert!(result.days[2].optimization.is_some());
        let summary = result.route_optimization.expect("summary");
        assert_eq!(summary.total_days, 3);
        assert_eq!(summary.optimized_days, 2);
    }

    #[rstest]
    fn preferences_override_defaults() {
        let config = OptimizerConfig::default();
        let prefs = Preferences {
            transport_mode: Some(TransportMode::Bicycling),
            start_time: NaiveTime::from_hms_opt(7, 15, 0),
        };
        let settings = DaySettings::resolve(&prefs, &config);
        assert_eq!(settings.mode, TransportMode::Bicycling);
        assert_eq!(settings.start, NaiveTime::from_hms_opt(7, 15, 0).expect("time"));

        let defaults = DaySettings::resolve(&Preferences::default(), &config);
        assert_eq!(defaults.mode, TransportMode::Driving);
        assert_eq!(defaults.start, config.day_start);
    }
}
