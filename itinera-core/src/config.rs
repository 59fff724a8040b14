//! Tunable constants for scoring, solving, scheduling and caching.
//!
//! Every magic number the optimiser relies on lives here with its default so
//! tuning never requires touching the algorithms.

use std::time::Duration;

use chrono::NaiveTime;

use crate::transport::TransportMode;
use crate::travel_time::TravelCost;

/// Largest activity count solved by exhaustive search (6! = 720 orders).
pub const MAX_EXACT_ACTIVITIES: usize = 6;

/// Weights used by the [`RouteScorer`](crate::RouteScorer).
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringWeights {
    /// Flat penalty, in seconds, for arriving while a venue is closed.
    pub closed_venue_penalty_secs: u64,
    /// Penalty seconds per second of deviation from a preferred time.
    pub preferred_time_penalty_per_sec: f64,
    /// Bonus seconds per remaining position for high-priority activities.
    pub priority_bonus_secs: u64,
    /// Priorities at or above this value earn the position bonus.
    pub high_priority_threshold: u8,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            closed_venue_penalty_secs: 3_600,
            preferred_time_penalty_per_sec: 0.5,
            priority_bonus_secs: 300,
            high_priority_threshold: 4,
        }
    }
}

/// Defaults applied to activities with missing fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivityDefaults {
    /// Visit length in minutes.
    pub visit_minutes: u32,
    /// Priority on the 1-5 scale.
    pub priority: u8,
}

impl Default for ActivityDefaults {
    fn default() -> Self {
        Self {
            visit_minutes: 120,
            priority: 3,
        }
    }
}

/// Travel-time cache behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// How long a fetched matrix stays fresh.
    pub ttl: Duration,
    /// Upper bound on a single provider request.
    pub request_timeout: Duration,
    /// Cost substituted for pairs the provider could not price.
    pub fallback_cost: TravelCost,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(3_600),
            request_timeout: Duration::from_secs(10),
            fallback_cost: TravelCost::FALLBACK,
        }
    }
}

/// Mean leg distances that drive the trip-level transport recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportThresholds {
    /// Legs up to this many metres on average suggest walking.
    pub walking_max_leg_meters: u64,
    /// Legs up to this many metres on average suggest transit.
    pub transit_max_leg_meters: u64,
}

impl Default for TransportThresholds {
    fn default() -> Self {
        Self {
            walking_max_leg_meters: 1_500,
            transit_max_leg_meters: 8_000,
        }
    }
}

/// Top-level optimiser configuration.
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use itinera_core::OptimizerConfig;
///
/// let config = OptimizerConfig::default().with_cache_ttl(Duration::from_secs(60));
/// assert_eq!(config.cache.ttl, Duration::from_secs(60));
/// assert_eq!(config.exact_solve_limit, 6);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizerConfig {
    /// Start of the day when preferences do not supply one.
    pub day_start: NaiveTime,
    /// Transport mode when preferences do not supply one.
    pub transport_mode: TransportMode,
    /// Scoring weights.
    pub scoring: ScoringWeights,
    /// Activity count up to which every order is evaluated. Capped at
    /// [`MAX_EXACT_ACTIVITIES`].
    pub exact_solve_limit: usize,
    /// Seconds of travel one priority point is worth to the heuristic.
    pub nearest_neighbour_priority_secs: u64,
    /// Defaults for incomplete activities.
    pub defaults: ActivityDefaults,
    /// Travel-time cache settings.
    pub cache: CacheConfig,
    /// Number of days optimised concurrently.
    pub max_concurrent_days: usize,
    /// Transport recommendation thresholds.
    pub transport_thresholds: TransportThresholds,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            day_start: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN),
            transport_mode: TransportMode::default(),
            scoring: ScoringWeights::default(),
            exact_solve_limit: MAX_EXACT_ACTIVITIES,
            nearest_neighbour_priority_secs: 300,
            defaults: ActivityDefaults::default(),
            cache: CacheConfig::default(),
            max_concurrent_days: 4,
            transport_thresholds: TransportThresholds::default(),
        }
    }
}

impl OptimizerConfig {
    /// Set the cache time-to-live.
    #[must_use]
    pub const fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache.ttl = ttl;
        self
    }

    /// Set the provider request timeout.
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.cache.request_timeout = timeout;
        self
    }

    /// Set the default day start.
    #[must_use]
    pub const fn with_day_start(mut self, start: NaiveTime) -> Self {
        self.day_start = start;
        self
    }

    /// Set the default transport mode.
    #[must_use]
    pub const fn with_transport_mode(mut self, mode: TransportMode) -> Self {
        self.transport_mode = mode;
        self
    }

    /// Set the exhaustive-search bound; values above
    /// [`MAX_EXACT_ACTIVITIES`] are capped.
    #[must_use]
    pub fn with_exact_solve_limit(mut self, limit: usize) -> Self {
        self.exact_solve_limit = limit.min(MAX_EXACT_ACTIVITIES);
        self
    }
}
