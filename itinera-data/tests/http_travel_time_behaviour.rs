//! Behavioural tests for the routing providers.
//!
//! Routing services are scripted with [`StubTravelTimeProvider`]; the OSRM
//! scenarios never get past request validation, so none needs a running
//! service.

use geo::Coord;
use itinera_core::{
    TransportMode, TravelCost, TravelTimeError, TravelTimeMatrix, TravelTimeProvider,
};
use itinera_data::routing::test_support::{RecordedRequest, StubTravelTimeProvider};
use itinera_data::routing::{HttpTravelTimeProvider, StraightLineTravelTimeProvider};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use std::cell::RefCell;
use std::sync::Arc;

type ProviderCell = RefCell<Option<Box<dyn TravelTimeProvider>>>;

/// The scripted service behind the provider, when the scenario uses one.
type StubCell = RefCell<Option<Arc<StubTravelTimeProvider>>>;

/// Result cell holding the outcome of a travel time request.
type ResultCell = RefCell<Result<TravelTimeMatrix, TravelTimeError>>;

#[fixture]
fn provider() -> ProviderCell {
    RefCell::new(None)
}

#[fixture]
fn stub() -> StubCell {
    RefCell::new(None)
}

#[fixture]
fn result() -> ResultCell {
    RefCell::new(Ok(TravelTimeMatrix::default()))
}

fn sample_coordinates(count: usize) -> Vec<Coord<f64>> {
    (0..count)
        .map(|i| {
            let offset = f64::from(u32::try_from(i).expect("small index")) * 0.01;
            Coord {
                x: -0.1 + offset,
                y: 51.5 + offset,
            }
        })
        .collect()
}

fn set_provider(cell: &ProviderCell, provider: impl TravelTimeProvider + 'static) {
    *cell.borrow_mut() = Some(Box::new(provider));
}

fn set_stub(cell: &ProviderCell, stub_cell: &StubCell, stub: StubTravelTimeProvider) {
    let shared = Arc::new(stub);
    *stub_cell.borrow_mut() = Some(Arc::clone(&shared));
    set_provider(cell, shared);
}

fn request(provider: &ProviderCell, result: &ResultCell, count: usize, mode: TransportMode) {
    let guard = provider.borrow();
    let routing = guard.as_ref().expect("provider must be initialised");
    let coordinates = sample_coordinates(count);
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("runtime");
    *result.borrow_mut() = runtime.block_on(routing.travel_time_matrix(&coordinates, mode));
}

// --- Given steps ---

#[given("a routing service returning valid durations")]
fn routing_service_ok(#[from(provider)] provider: &ProviderCell, #[from(stub)] stub: &StubCell) {
    set_stub(
        provider,
        stub,
        StubTravelTimeProvider::pricing(TravelCost::from_secs(120, 900)),
    );
}

#[given("a routing service that fails with a network error")]
fn routing_service_network_error(
    #[from(provider)] provider: &ProviderCell,
    #[from(stub)] stub: &StubCell,
) {
    set_stub(
        provider,
        stub,
        StubTravelTimeProvider::failing(TravelTimeError::NetworkError {
            url: "http://example.com/table/v1/walking".to_owned(),
            message: "connection refused".to_owned(),
        }),
    );
}

#[given("a routing service that times out")]
fn routing_service_timeout(#[from(provider)] provider: &ProviderCell, #[from(stub)] stub: &StubCell) {
    set_stub(
        provider,
        stub,
        StubTravelTimeProvider::failing(TravelTimeError::Timeout {
            url: "http://example.com/table/v1/walking".to_owned(),
            timeout_secs: 10,
        }),
    );
}

#[given("a routing service returning an error response")]
fn routing_service_error(#[from(provider)] provider: &ProviderCell, #[from(stub)] stub: &StubCell) {
    set_stub(
        provider,
        stub,
        StubTravelTimeProvider::failing(TravelTimeError::ServiceError {
            code: "InvalidQuery".to_owned(),
            message: "Too many coordinates".to_owned(),
        }),
    );
}

#[given("a routing service returning null for unreachable pairs")]
fn routing_service_with_nulls(
    #[from(provider)] provider: &ProviderCell,
    #[from(stub)] stub: &StubCell,
) {
    set_stub(provider, stub, StubTravelTimeProvider::unroutable());
}

#[given("an OSRM service at an unreachable address")]
fn osrm_service(#[from(provider)] provider: &ProviderCell) {
    let osrm = HttpTravelTimeProvider::new("http://routing.invalid").expect("provider builds");
    set_provider(provider, osrm);
}

#[given("a straight-line estimator")]
fn straight_line(#[from(provider)] provider: &ProviderCell) {
    set_provider(provider, StraightLineTravelTimeProvider::default());
}

// --- When steps ---

#[when("I request walking travel times for two locations")]
fn request_two(#[from(provider)] provider: &ProviderCell, #[from(result)] result: &ResultCell) {
    request(provider, result, 2, TransportMode::Walking);
}

#[when("I request walking travel times for no locations")]
fn request_none(#[from(provider)] provider: &ProviderCell, #[from(result)] result: &ResultCell) {
    request(provider, result, 0, TransportMode::Walking);
}

#[when("I request transit travel times for two locations")]
fn request_transit(#[from(provider)] provider: &ProviderCell, #[from(result)] result: &ResultCell) {
    request(provider, result, 2, TransportMode::Transit);
}

// --- Then steps ---

#[then("a 2x2 matrix is returned")]
fn then_matrix(#[from(result)] result: &ResultCell) {
    let borrowed = result.borrow();
    let matrix = borrowed.as_ref().expect("expected Ok result");
    assert_eq!(matrix.len(), 2, "expected 2 rows");
    assert_eq!(matrix.missing_cells(), 0, "expected every pair priced");
    assert_eq!(matrix.get(0, 0), Some(TravelCost::ZERO), "diagonal should be zero");
    assert_eq!(matrix.get(1, 1), Some(TravelCost::ZERO), "diagonal should be zero");
}

#[then("the service saw one walking request for two locations")]
fn then_request_recorded(#[from(stub)] stub: &StubCell) {
    let borrowed = stub.borrow();
    let service = borrowed.as_ref().expect("scenario must use a scripted service");
    assert_eq!(
        service.requests(),
        vec![RecordedRequest {
            locations: 2,
            mode: TransportMode::Walking,
        }]
    );
}

#[then("an empty input error is returned")]
fn then_empty_error(#[from(result)] result: &ResultCell) {
    let borrowed = result.borrow();
    assert!(
        matches!(&*borrowed, Err(TravelTimeError::EmptyInput)),
        "expected EmptyInput error, got {borrowed:?}"
    );
}

#[then("a network error is returned")]
fn then_network_error(#[from(result)] result: &ResultCell) {
    let borrowed = result.borrow();
    assert!(
        matches!(&*borrowed, Err(TravelTimeError::NetworkError { .. })),
        "expected NetworkError, got {borrowed:?}"
    );
}

#[then("a timeout error is returned")]
fn then_timeout_error(#[from(result)] result: &ResultCell) {
    let borrowed = result.borrow();
    assert!(
        matches!(&*borrowed, Err(TravelTimeError::Timeout { .. })),
        "expected Timeout error, got {borrowed:?}"
    );
}

#[then("a service error is returned")]
fn then_service_error(#[from(result)] result: &ResultCell) {
    let borrowed = result.borrow();
    assert!(
        matches!(&*borrowed, Err(TravelTimeError::ServiceError { .. })),
        "expected ServiceError, got {borrowed:?}"
    );
}

#[then("an unsupported mode error is returned")]
fn then_unsupported(#[from(result)] result: &ResultCell) {
    let borrowed = result.borrow();
    assert!(
        matches!(
            &*borrowed,
            Err(TravelTimeError::UnsupportedMode {
                mode: TransportMode::Transit
            })
        ),
        "expected UnsupportedMode, got {borrowed:?}"
    );
}

#[then("a 2x2 matrix with missing off-diagonal cells is returned")]
fn then_matrix_with_gaps(#[from(result)] result: &ResultCell) {
    let borrowed = result.borrow();
    let matrix = borrowed.as_ref().expect("expected Ok result");
    assert_eq!(matrix.len(), 2, "expected 2 rows");
    assert_eq!(matrix.get(0, 0), Some(TravelCost::ZERO), "diagonal should be zero");
    assert_eq!(matrix.get(0, 1), None, "unreachable should be missing");
    assert_eq!(matrix.get(1, 0), None, "unreachable should be missing");
}

#[then("walking the estimated leg takes longer than ten minutes")]
fn then_long_walk(#[from(result)] result: &ResultCell) {
    let borrowed = result.borrow();
    let matrix = borrowed.as_ref().expect("expected Ok result");
    let leg = matrix.get(0, 1).expect("leg");
    assert!(leg.duration.as_secs() > 600, "got {leg:?}");
    assert!(leg.distance_meters > 1_000, "got {leg:?}");
}

// --- Scenario registrations ---

macro_rules! register_scenario {
    ($fn_name:ident, $title:literal) => {
        #[scenario(path = "tests/features/http_travel_time.feature", name = $title)]
        fn $fn_name(provider: ProviderCell, stub: StubCell, result: ResultCell) {
            let _ = (provider, stub, result);
        }
    };
}

register_scenario!(
    returning_matrix_for_two_locations,
    "returning a travel time matrix for two locations"
);
register_scenario!(
    returning_error_for_empty_input,
    "returning an error for empty input"
);
register_scenario!(handling_network_error, "handling a network error");
register_scenario!(handling_timeout, "handling a timeout");
register_scenario!(handling_service_error, "handling a service error response");
register_scenario!(handling_unreachable_pairs, "handling unreachable pairs");
register_scenario!(
    rejecting_transit_on_osrm,
    "rejecting public transport on OSRM"
);
register_scenario!(
    estimating_without_service,
    "estimating travel times without a routing service"
);
