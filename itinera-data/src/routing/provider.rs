//! Travel times from an OSRM routing service.
//!
//! [`HttpTravelTimeProvider`] issues one Table request per call and asks for
//! both duration and distance annotations. Each transport mode maps to an
//! OSRM profile; stock OSRM has no public-transport profile, so transit is
//! refused unless the deployment names one through
//! [`HttpTravelTimeProviderConfig::with_profile`]. The cache then falls back
//! to default costs for that day.
//!
//! # Example
//!
//! ```no_run
//! use geo::Coord;
//! use itinera_core::{TransportMode, TravelTimeProvider};
//! use itinera_data::routing::HttpTravelTimeProvider;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = HttpTravelTimeProvider::new("http://localhost:5000")?;
//! let louvre_to_orsay = [Coord { x: 2.3376, y: 48.8606 }, Coord { x: 2.3266, y: 48.8600 }];
//!
//! let matrix = provider
//!     .travel_time_matrix(&louvre_to_orsay, TransportMode::Walking)
//!     .await?;
//! assert_eq!(matrix.len(), 2);
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use geo::Coord;
use itinera_core::{TransportMode, TravelCost, TravelTimeError, TravelTimeMatrix, TravelTimeProvider};
use log::debug;
use reqwest::Client;
use thiserror::Error;

use super::osrm::{TableResponse, whole_units};
use super::straight_line::haversine_meters;

/// Raised when the HTTP client cannot be configured.
#[derive(Debug, Error)]
pub enum ProviderBuildError {
    /// `reqwest` rejected the client settings (for example, TLS setup).
    #[error("HTTP client setup failed: {0}")]
    HttpClient(#[source] reqwest::Error),
}

/// `User-Agent` sent with every Table request.
pub const DEFAULT_USER_AGENT: &str = "itinera-routing/0.1";

/// Where `osrm-routed` listens out of the box.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection settings for an OSRM deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpTravelTimeProviderConfig {
    /// Service root; a trailing slash is tolerated.
    pub base_url: String,
    /// Limit applied to connecting and to the whole request.
    pub timeout: Duration,
    /// `User-Agent` header value.
    pub user_agent: String,
    /// Profiles replacing [`osrm_profile`] for particular modes.
    pub profiles: HashMap<TransportMode, String>,
}

impl Default for HttpTravelTimeProviderConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl HttpTravelTimeProviderConfig {
    /// Settings for the service at `base_url` with stock profiles.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            profiles: HashMap::new(),
        }
    }

    /// Replace the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Replace the `User-Agent` header.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Route `mode` through the named profile, e.g. `"foot"` on a server
    /// built from `foot.lua`.
    #[must_use]
    pub fn with_profile(mut self, mode: TransportMode, profile: impl Into<String>) -> Self {
        self.profiles.insert(mode, profile.into());
        self
    }

    /// Profile requested for `mode`.
    ///
    /// # Errors
    ///
    /// As [`osrm_profile`] when no override is set.
    pub fn profile_for(&self, mode: TransportMode) -> Result<&str, TravelTimeError> {
        match self.profiles.get(&mode) {
            Some(profile) => Ok(profile.as_str()),
            None => osrm_profile(mode),
        }
    }
}

/// Stock OSRM profile serving `mode`.
///
/// # Errors
///
/// Returns [`TravelTimeError::UnsupportedMode`] for public transport, which
/// OSRM does not model.
pub const fn osrm_profile(mode: TransportMode) -> Result<&'static str, TravelTimeError> {
    match mode {
        TransportMode::Walking => Ok("walking"),
        TransportMode::Driving => Ok("driving"),
        TransportMode::Bicycling => Ok("cycling"),
        TransportMode::Transit => Err(TravelTimeError::UnsupportedMode { mode }),
    }
}

/// [`TravelTimeProvider`] backed by the OSRM Table service.
///
/// Unroutable pairs come back as missing cells. When OSRM omits distances
/// the great-circle distance between the two coordinates is used instead.
/// Cloning shares the connection pool.
#[derive(Debug, Clone)]
pub struct HttpTravelTimeProvider {
    client: Client,
    config: HttpTravelTimeProviderConfig,
}

impl HttpTravelTimeProvider {
    /// Provider for the service at `base_url` with default settings.
    ///
    /// # Errors
    ///
    /// [`ProviderBuildError::HttpClient`] when the client cannot be set up.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ProviderBuildError> {
        Self::with_config(HttpTravelTimeProviderConfig::new(base_url))
    }

    /// Provider using `config`.
    ///
    /// # Errors
    ///
    /// [`ProviderBuildError::HttpClient`] when the client cannot be set up.
    pub fn with_config(config: HttpTravelTimeProviderConfig) -> Result<Self, ProviderBuildError> {
        Client::builder()
            .user_agent(config.user_agent.as_str())
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()
            .map(|client| Self { client, config })
            .map_err(ProviderBuildError::HttpClient)
    }

    /// Settings in effect.
    #[must_use]
    pub const fn config(&self) -> &HttpTravelTimeProviderConfig {
        &self.config
    }

    /// `{base}/table/v1/{profile}/{lng,lat;...}?annotations=duration,distance`
    fn build_table_url(&self, coordinates: &[Coord<f64>], profile: &str) -> String {
        let base = self.config.base_url.trim_end_matches('/');
        let mut url = format!("{base}/table/v1/{profile}/");
        for (position, coord) in coordinates.iter().enumerate() {
            if position > 0 {
                url.push(';');
            }
            url.push_str(&format!("{},{}", coord.x, coord.y));
        }
        url.push_str("?annotations=duration,distance");
        url
    }

    async fn fetch_table(&self, url: &str) -> Result<TableResponse, TravelTimeError> {
        let classify = |err: reqwest::Error| classify_request_error(&err, url, self.config.timeout);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(classify)?;
        response
            .json::<TableResponse>()
            .await
            .map_err(|err| TravelTimeError::ParseError {
                message: format!("undecodable Table response: {err}"),
            })
    }
}

/// Map a transport failure onto the provider error taxonomy.
fn classify_request_error(error: &reqwest::Error, url: &str, timeout: Duration) -> TravelTimeError {
    let url = url.to_owned();
    if error.is_timeout() {
        TravelTimeError::Timeout {
            url,
            timeout_secs: timeout.as_secs(),
        }
    } else if let Some(status) = error.status() {
        TravelTimeError::HttpError {
            url,
            status: status.as_u16(),
            message: error.to_string(),
        }
    } else {
        TravelTimeError::NetworkError {
            url,
            message: error.to_string(),
        }
    }
}

/// Convert an OSRM response into a matrix over `coordinates`.
///
/// Negative, NaN and infinite durations are treated as unroutable. Pairs
/// without an OSRM distance get a great-circle estimate.
fn convert_response(
    response: TableResponse,
    coordinates: &[Coord<f64>],
) -> Result<TravelTimeMatrix, TravelTimeError> {
    let tables = response.into_tables()?;
    let expected = coordinates.len();
    let ragged = (0..tables.rows()).find(|row| tables.columns(*row) != expected);
    if tables.rows() != expected || ragged.is_some() {
        return Err(TravelTimeError::DimensionMismatch {
            expected,
            actual: ragged.map_or(tables.rows(), |row| tables.columns(row)),
        });
    }

    Ok(TravelTimeMatrix::from_fn(expected, |from, to| {
        let seconds = tables.duration_secs(from, to)?;
        let meters = tables
            .distance_meters(from, to)
            .or_else(|| estimate_meters(coordinates, from, to))
            .unwrap_or(0);
        Some(TravelCost::from_secs(seconds, meters))
    }))
}

fn estimate_meters(coordinates: &[Coord<f64>], from: usize, to: usize) -> Option<u64> {
    let start = coordinates.get(from)?;
    let end = coordinates.get(to)?;
    whole_units(haversine_meters(*start, *end))
}

#[async_trait]
impl TravelTimeProvider for HttpTravelTimeProvider {
    async fn travel_time_matrix(
        &self,
        coordinates: &[Coord<f64>],
        mode: TransportMode,
    ) -> Result<TravelTimeMatrix, TravelTimeError> {
        if coordinates.is_empty() {
            return Err(TravelTimeError::EmptyInput);
        }
        let profile = self.config.profile_for(mode)?;
        let url = self.build_table_url(coordinates, profile);
        debug!("OSRM {profile} table for {} locations", coordinates.len());
        let response = self.fetch_table(&url).await?;
        convert_response(response, coordinates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn sample_coordinates() -> Vec<Coord<f64>> {
        vec![Coord { x: -0.1, y: 51.5 }, Coord { x: -0.2, y: 51.6 }]
    }

    fn ok_response(
        durations: Vec<Vec<Option<f64>>>,
        distances: Option<Vec<Vec<Option<f64>>>>,
    ) -> TableResponse {
        TableResponse {
            code: "Ok".to_owned(),
            message: None,
            durations: Some(durations),
            distances,
        }
    }

    #[rstest]
    fn build_table_url_formats_coordinates(sample_coordinates: Vec<Coord<f64>>) {
        let provider =
            HttpTravelTimeProvider::new("http://osrm.example.com").expect("provider should build");

        let url = provider.build_table_url(&sample_coordinates, "walking");

        assert_eq!(
            url,
            "http://osrm.example.com/table/v1/walking/-0.1,51.5;-0.2,51.6?annotations=duration,distance"
        );
    }

    #[rstest]
    fn build_table_url_strips_trailing_slash(sample_coordinates: Vec<Coord<f64>>) {
        let provider =
            HttpTravelTimeProvider::new("http://osrm.example.com/").expect("provider should build");

        let url = provider.build_table_url(&sample_coordinates, "driving");

        assert!(url.starts_with("http://osrm.example.com/table/v1/driving/"));
        assert!(!url.contains("//table"));
    }

    #[rstest]
    #[case(TransportMode::Walking, "walking")]
    #[case(TransportMode::Driving, "driving")]
    #[case(TransportMode::Bicycling, "cycling")]
    fn profiles_map_to_osrm_names(#[case] mode: TransportMode, #[case] expected: &str) {
        assert_eq!(osrm_profile(mode), Ok(expected));
    }

    #[rstest]
    fn transit_is_unsupported() {
        assert_eq!(
            osrm_profile(TransportMode::Transit),
            Err(TravelTimeError::UnsupportedMode {
                mode: TransportMode::Transit
            })
        );
    }

    #[rstest]
    fn convert_response_handles_success(sample_coordinates: Vec<Coord<f64>>) {
        let response = ok_response(
            vec![vec![Some(0.0), Some(120.4)], vec![Some(131.6), Some(0.0)]],
            Some(vec![vec![Some(0.0), Some(950.2)], vec![Some(1_010.0), Some(0.0)]]),
        );

        let matrix = convert_response(response, &sample_coordinates).expect("should parse");

        assert_eq!(matrix.len(), 2);
        assert_eq!(matrix.get(0, 0), Some(TravelCost::ZERO));
        assert_eq!(matrix.get(0, 1), Some(TravelCost::from_secs(120, 950)));
        assert_eq!(matrix.get(1, 0), Some(TravelCost::from_secs(132, 1_010)));
    }

    #[rstest]
    fn convert_response_estimates_missing_distances(sample_coordinates: Vec<Coord<f64>>) {
        let response = ok_response(vec![vec![Some(0.0), Some(60.0)], vec![Some(60.0), Some(0.0)]], None);

        let matrix = convert_response(response, &sample_coordinates).expect("should parse");

        let cost = matrix.get(0, 1).expect("cell");
        assert_eq!(cost.duration, Duration::from_secs(60));
        assert!((12_000..14_000).contains(&cost.distance_meters), "{cost:?}");
    }

    #[rstest]
    fn convert_response_handles_invalid_durations() {
        let coordinates = vec![Coord { x: 0.0, y: 0.0 }; 3];
        let response = ok_response(
            vec![
                vec![Some(0.0), Some(-1.0), Some(f64::NAN)],
                vec![Some(f64::INFINITY), Some(0.0), None],
                vec![Some(100.0), Some(200.0), Some(0.0)],
            ],
            None,
        );

        let matrix = convert_response(response, &coordinates).expect("should parse");

        assert_eq!(matrix.get(0, 1), None);
        assert_eq!(matrix.get(0, 2), None);
        assert_eq!(matrix.get(1, 0), None);
        assert_eq!(matrix.get(1, 2), None);
        assert_eq!(matrix.get(2, 0), Some(TravelCost::from_secs(100, 0)));
        assert_eq!(matrix.missing_cells(), 4);
    }

    #[rstest]
    fn convert_response_handles_service_error(sample_coordinates: Vec<Coord<f64>>) {
        let response = TableResponse {
            code: "InvalidQuery".to_owned(),
            message: Some("Too many coordinates".to_owned()),
            durations: None,
            distances: None,
        };

        let err = convert_response(response, &sample_coordinates).expect_err("should fail");

        assert_eq!(
            err,
            TravelTimeError::ServiceError {
                code: "InvalidQuery".to_owned(),
                message: "Too many coordinates".to_owned(),
            }
        );
    }

    #[rstest]
    fn convert_response_handles_missing_durations(sample_coordinates: Vec<Coord<f64>>) {
        let response = TableResponse {
            code: "Ok".to_owned(),
            message: None,
            durations: None,
            distances: None,
        };

        let err = convert_response(response, &sample_coordinates).expect_err("should fail");

        assert!(matches!(err, TravelTimeError::ParseError { .. }));
    }

    #[rstest]
    fn convert_response_rejects_wrong_row_count(sample_coordinates: Vec<Coord<f64>>) {
        let response = ok_response(vec![vec![Some(0.0)]], None);

        let err = convert_response(response, &sample_coordinates).expect_err("should fail");

        assert_eq!(
            err,
            TravelTimeError::DimensionMismatch {
                expected: 2,
                actual: 1
            }
        );
    }

    #[rstest]
    #[tokio::test]
    async fn empty_input_returns_error() {
        let provider =
            HttpTravelTimeProvider::new("http://localhost:5000").expect("provider should build");

        let err = provider
            .travel_time_matrix(&[], TransportMode::Walking)
            .await
            .expect_err("should fail");

        assert_eq!(err, TravelTimeError::EmptyInput);
    }

    #[rstest]
    #[tokio::test]
    async fn transit_requests_fail_before_any_network_call(sample_coordinates: Vec<Coord<f64>>) {
        let provider =
            HttpTravelTimeProvider::new("http://routing.invalid").expect("provider should build");

        let err = provider
            .travel_time_matrix(&sample_coordinates, TransportMode::Transit)
            .await
            .expect_err("should fail");

        assert!(matches!(err, TravelTimeError::UnsupportedMode { .. }));
    }

    #[rstest]
    fn config_builder_sets_every_field() {
        let config = HttpTravelTimeProviderConfig::new("http://osrm.internal:5000")
            .with_timeout(Duration::from_secs(3))
            .with_user_agent("planner/2.0")
            .with_profile(TransportMode::Walking, "foot");

        assert_eq!(config.base_url, "http://osrm.internal:5000");
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert_eq!(config.user_agent, "planner/2.0");
        assert_eq!(config.profile_for(TransportMode::Walking), Ok("foot"));
        assert_eq!(config.profile_for(TransportMode::Driving), Ok("driving"));
    }

    #[rstest]
    fn defaults_target_local_osrm() {
        let config = HttpTravelTimeProviderConfig::default();

        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
        assert!(config.profiles.is_empty());
    }

    #[rstest]
    fn transit_override_enables_public_transport() {
        let config =
            HttpTravelTimeProviderConfig::default().with_profile(TransportMode::Transit, "transit");

        assert_eq!(config.profile_for(TransportMode::Transit), Ok("transit"));
    }
}
