//! Time-to-live cache in front of a [`TravelTimeProvider`].
//!
//! Matrices are cached per transport mode and per *set* of distinct
//! coordinates, so two days visiting the same venues in a different order
//! share one entry. Coordinates are quantised to 1e-6 degrees before keying.
//!
//! The cache never fails: provider errors, timeouts and malformed matrices
//! are logged and replaced by default costs, and nothing is stored for them.
//! Every insert also drops entries that have outlived the TTL, so the map
//! holds at most the entries written within one TTL of each other.
//! Concurrent misses for the same key may each call the provider; the last
//! writer wins and every writer stores a complete matrix.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};

use geo::Coord;
use log::{debug, warn};
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::activity::StopLocation;
use crate::config::CacheConfig;
use crate::transport::TransportMode;
use crate::travel_time::{TravelCost, TravelTimeMatrix, TravelTimeProvider};

const QUANTUM: f64 = 1e6;

/// Coordinate rounded to 1e-6 degrees, ordered by longitude then latitude.
type QuantisedCoord = (i64, i64);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    mode: TransportMode,
    coordinates: Vec<QuantisedCoord>,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    matrix: TravelTimeMatrix,
    fetched_at: Instant,
}

/// Counters describing cache effectiveness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    /// Requests answered from a fresh entry.
    pub hits: u64,
    /// Requests that had to contact the provider.
    pub misses: u64,
    /// Provider calls that failed, timed out or returned a malformed matrix.
    pub provider_failures: u64,
    /// Entries currently held, fresh or expired.
    pub entries: usize,
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    provider_failures: AtomicU64,
}

/// Travel costs between a day's stops, with the pairs the provider priced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopCosts {
    matrix: TravelTimeMatrix,
    routed: Vec<bool>,
}

impl StopCosts {
    fn defaults(size: usize, fallback: TravelCost) -> Self {
        Self {
            matrix: TravelTimeMatrix::uniform(size, fallback),
            routed: vec![false; size.saturating_mul(size)],
        }
    }

    /// Costs indexed like the stops they were requested for.
    #[must_use]
    pub const fn matrix(&self) -> &TravelTimeMatrix {
        &self.matrix
    }

    /// Give up the routed markers.
    #[must_use]
    pub fn into_matrix(self) -> TravelTimeMatrix {
        self.matrix
    }

    /// Whether `from → to` was priced by the provider rather than defaulted.
    #[must_use]
    pub fn is_routed(&self, from: usize, to: usize) -> bool {
        from.checked_mul(self.matrix.len())
            .and_then(|row| row.checked_add(to))
            .filter(|_| to < self.matrix.len())
            .and_then(|cell| self.routed.get(cell))
            .copied()
            .unwrap_or(false)
    }
}

/// Memoises travel-time matrices with a time-to-live.
///
/// Owned by the caller and usually shared behind an [`Arc`](std::sync::Arc)
/// between optimiser tasks.
#[derive(Debug)]
pub struct TravelTimeCache<P> {
    provider: P,
    config: CacheConfig,
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
    counters: Counters,
}

impl<P: TravelTimeProvider> TravelTimeCache<P> {
    /// Wrap `provider` with the given cache settings.
    #[must_use]
    pub fn new(provider: P, config: CacheConfig) -> Self {
        Self {
            provider,
            config,
            entries: RwLock::new(HashMap::new()),
            counters: Counters::default(),
        }
    }

    /// The wrapped provider.
    #[must_use]
    pub const fn provider(&self) -> &P {
        &self.provider
    }

    /// Cache settings in effect.
    #[must_use]
    pub const fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Travel costs between `stops`, indexed like `stops`.
    ///
    /// Pairs involving an [`StopLocation::Unknown`] stop, and pairs the
    /// provider could not price, cost [`CacheConfig::fallback_cost`]. Stops
    /// sharing a coordinate are always zero apart.
    pub async fn matrix_for(&self, stops: &[StopLocation], mode: TransportMode) -> TravelTimeMatrix {
        self.costs_for(stops, mode).await.into_matrix()
    }

    /// Like [`Self::matrix_for`], also marking which pairs were priced.
    ///
    /// Stops sharing a coordinate count as priced.
    pub async fn costs_for(&self, stops: &[StopLocation], mode: TransportMode) -> StopCosts {
        let fallback = self.config.fallback_cost;
        let canonical = Canonical::from_stops(stops);
        let Some(fetched) = self.fetch(&canonical, mode).await else {
            return StopCosts::defaults(stops.len(), fallback);
        };
        let priced = |from: usize, to: usize| {
            canonical
                .slot(from)
                .zip(canonical.slot(to))
                .and_then(|(a, b)| fetched.get(a, b))
        };
        let size = stops.len();
        let routed = (0..size)
            .flat_map(|from| (0..size).map(move |to| (from, to)))
            .map(|(from, to)| priced(from, to).is_some())
            .collect();
        StopCosts {
            matrix: TravelTimeMatrix::from_fn(size, |from, to| {
                Some(priced(from, to).unwrap_or(fallback))
            }),
            routed,
        }
    }

    /// Snapshot of hit, miss and failure counters.
    pub async fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            provider_failures: self.counters.provider_failures.load(Ordering::Relaxed),
            entries: self.entries.read().await.len(),
        }
    }

    /// Drop expired entries, returning how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let ttl = self.config.ttl;
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.fetched_at.elapsed() < ttl);
        before - entries.len()
    }

    /// Drop every entry.
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    async fn fetch(&self, canonical: &Canonical, mode: TransportMode) -> Option<TravelTimeMatrix> {
        match canonical.coordinates.len() {
            0 => {
                debug!("no known locations; using default {mode} travel costs");
                return None;
            }
            1 => return Some(TravelTimeMatrix::uniform(1, TravelCost::ZERO)),
            _ => {}
        }
        let key = CacheKey {
            mode,
            coordinates: canonical.keys.clone(),
        };
        if let Some(matrix) = self.lookup(&key).await {
            self.counters.hits.fetch_add(1, Ordering::Relaxed);
            return Some(matrix);
        }
        self.counters.misses.fetch_add(1, Ordering::Relaxed);

        let matrix = self.call_provider(&canonical.coordinates, mode).await?;
        let ttl = self.config.ttl;
        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| entry.fetched_at.elapsed() < ttl);
        entries.insert(
            key,
            CacheEntry {
                matrix: matrix.clone(),
                fetched_at: Instant::now(),
            },
        );
        Some(matrix)
    }

    async fn lookup(&self, key: &CacheKey) -> Option<TravelTimeMatrix> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|entry| entry.fetched_at.elapsed() < self.config.ttl)
            .map(|entry| entry.matrix.clone())
    }

    async fn call_provider(
        &self,
        coordinates: &[Coord<f64>],
        mode: TransportMode,
    ) -> Option<TravelTimeMatrix> {
        let timeout = self.config.request_timeout;
        let outcome = tokio::time::timeout(
            timeout,
            self.provider.travel_time_matrix(coordinates, mode),
        )
        .await;
        let failure = match outcome {
            Ok(Ok(matrix)) if matrix.len() == coordinates.len() => return Some(matrix),
            Ok(Ok(matrix)) => format!(
                "expected a {n}x{n} matrix, got {m}x{m}",
                n = coordinates.len(),
                m = matrix.len()
            ),
            Ok(Err(err)) => err.to_string(),
            Err(_) => format!("timed out after {}ms", timeout.as_millis()),
        };
        self.counters
            .provider_failures
            .fetch_add(1, Ordering::Relaxed);
        warn!(
            "travel-time provider failed for {} {mode} locations ({failure}); using default costs",
            coordinates.len()
        );
        None
    }
}

/// Distinct known coordinates in key order, and each stop's slot among them.
struct Canonical {
    keys: Vec<QuantisedCoord>,
    coordinates: Vec<Coord<f64>>,
    slots: Vec<Option<usize>>,
}

impl Canonical {
    fn from_stops(stops: &[StopLocation]) -> Self {
        let quantised: Vec<Option<(QuantisedCoord, Coord<f64>)>> = stops
            .iter()
            .map(|stop| stop.coord().map(|coord| (quantise(coord), coord)))
            .collect();
        let distinct: BTreeMap<QuantisedCoord, Coord<f64>> =
            quantised.iter().flatten().copied().collect();
        let keys: Vec<QuantisedCoord> = distinct.keys().copied().collect();
        let slots = quantised
            .iter()
            .map(|entry| entry.and_then(|(key, _)| keys.binary_search(&key).ok()))
            .collect();
        Self {
            coordinates: distinct.into_values().collect(),
            keys,
            slots,
        }
    }

    fn slot(&self, stop: usize) -> Option<usize> {
        self.slots.get(stop).copied().flatten()
    }
}

#[expect(
    clippy::float_arithmetic,
    clippy::cast_possible_truncation,
    reason = "validated coordinates scaled by 1e6 fit comfortably in i64"
)]
fn quantise(coord: Coord<f64>) -> QuantisedCoord {
    (
        (coord.x * QUANTUM).round() as i64,
        (coord.y * QUANTUM).round() as i64,
    )
}
