#![expect(clippy::expect_used, reason = "behaviour steps fail fast on broken fixtures")]
//! Behavioural tests for ordered provider fallback through [`Engine`].
//!
//! Providers are [`ScriptedProvider`] stubs and the runtime clock is paused,
//! so retry back-off and cool-down windows elapse instantly.

use std::cell::RefCell;
use std::sync::Arc;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use tokio::runtime::Runtime;
use wayfinder_core::{
    Coordinate, ErrorKind, FailureOutcome, GeocodingProvider, ProviderError, ResolveError,
    Resolution, RouteResult, RoutingProvider,
};
use wayfinder_resolver::test_support::ScriptedProvider;
use wayfinder_resolver::{Engine, EngineBuilder, EngineConfig};

type Outcome<T> = RefCell<Option<Result<Resolution<T>, ResolveError>>>;

const MUMBAI: Coordinate = Coordinate {
    lat: 19.076,
    lon: 72.877,
};
const DELHI: Coordinate = Coordinate {
    lat: 28.704,
    lon: 77.102,
};
const ROAD_TRIP_METRES: f64 = 1_400_567.8;
const ROAD_TRIP_SECONDS: f64 = 90_720.0;

struct World {
    runtime: Runtime,
    geocoders: RefCell<Vec<Arc<ScriptedProvider<Coordinate>>>>,
    routers: RefCell<Vec<Arc<ScriptedProvider<RouteResult>>>>,
    engine: RefCell<Option<Engine>>,
    location: Outcome<Coordinate>,
    route: Outcome<RouteResult>,
}

impl World {
    fn with_engine<R>(&self, run: impl FnOnce(&Runtime, &Engine) -> R) -> R {
        let mut slot = self.engine.borrow_mut();
        if slot.is_none() {
            let mut builder = EngineBuilder::new(EngineConfig::default());
            for geocoder in self.geocoders.borrow().iter() {
                let shared: Arc<dyn GeocodingProvider> = geocoder.clone();
                builder = builder.with_shared_geocoder(shared);
            }
            for router in self.routers.borrow().iter() {
                let shared: Arc<dyn RoutingProvider> = router.clone();
                builder = builder.with_shared_router(shared);
            }
            *slot = Some(builder.build().expect("engine should build"));
        }
        let engine = slot.as_ref().expect("engine was just built");
        run(&self.runtime, engine)
    }

    fn geocoder(&self, name: &str) -> Arc<ScriptedProvider<Coordinate>> {
        self.geocoders
            .borrow()
            .iter()
            .find(|p| p.name() == name)
            .cloned()
            .expect("geocoder should be registered")
    }
}

#[fixture]
fn world() -> World {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .expect("runtime should start");
    World {
        runtime,
        geocoders: RefCell::new(Vec::new()),
        routers: RefCell::new(Vec::new()),
        engine: RefCell::new(None),
        location: RefCell::new(None),
        route: RefCell::new(None),
    }
}

/// Strip the quotes Gherkin authors put around names.
fn unquote(raw: &str) -> &str {
    raw.trim_matches('"')
}

fn parse_count(raw: &str) -> u32 {
    raw.parse().expect("step count should be a number")
}

fn road_trip(provider: &str) -> RouteResult {
    RouteResult::new(ROAD_TRIP_METRES, ROAD_TRIP_SECONDS, provider).expect("valid route")
}

// --- Given steps ---

#[given("a geocoder {name:word} answering Mumbai")]
fn geocoder_answering(world: &World, name: String) {
    world
        .geocoders
        .borrow_mut()
        .push(Arc::new(ScriptedProvider::answering(unquote(&name), MUMBAI)));
}

#[given("a geocoder {name:word} that is unavailable")]
fn geocoder_unavailable(world: &World, name: String) {
    world.geocoders.borrow_mut().push(Arc::new(ScriptedProvider::failing(
        unquote(&name),
        ProviderError::unavailable("HTTP 503"),
    )));
}

#[given("a geocoder {name:word} with no match")]
fn geocoder_without_match(world: &World, name: String) {
    world.geocoders.borrow_mut().push(Arc::new(ScriptedProvider::failing(
        unquote(&name),
        ProviderError::not_found("no hits"),
    )));
}

#[given("a geocoder {name:word} that is rate limited")]
fn geocoder_rate_limited(world: &World, name: String) {
    world.geocoders.borrow_mut().push(Arc::new(ScriptedProvider::failing(
        unquote(&name),
        ProviderError::rate_limited("HTTP 429"),
    )));
}

#[given("a router {name:word} that is unavailable")]
fn router_unavailable(world: &World, name: String) {
    world.routers.borrow_mut().push(Arc::new(ScriptedProvider::failing(
        unquote(&name),
        ProviderError::unavailable("HTTP 503"),
    )));
}

#[given("a router {name:word} answering the Mumbai to Delhi road trip")]
fn router_answering(world: &World, name: String) {
    let provider = unquote(&name);
    world
        .routers
        .borrow_mut()
        .push(Arc::new(ScriptedProvider::answering(provider, road_trip(provider))));
}

// --- When steps ---

#[when("I resolve {text:word} in {hint:word}")]
fn resolve(world: &World, text: String, hint: String) {
    let outcome = world.with_engine(|runtime, engine| {
        runtime.block_on(engine.resolve_location(unquote(&text), Some(unquote(&hint))))
    });
    *world.location.borrow_mut() = Some(outcome);
}

#[when("I compute a route from Mumbai to Delhi")]
fn compute_route(world: &World) {
    let outcome =
        world.with_engine(|runtime, engine| runtime.block_on(engine.compute_route(MUMBAI, DELHI)));
    *world.route.borrow_mut() = Some(outcome);
}

// --- Then steps ---

#[then("the location is answered by {name:word}")]
fn location_answered_by(world: &World, name: String) {
    let borrowed = world.location.borrow();
    let resolution = borrowed
        .as_ref()
        .expect("a location was requested")
        .as_ref()
        .expect("location should resolve");
    assert_eq!(resolution.provider, unquote(&name));
}

#[then("the location lies at Mumbai")]
fn location_is_mumbai(world: &World) {
    let borrowed = world.location.borrow();
    let resolution = borrowed
        .as_ref()
        .expect("a location was requested")
        .as_ref()
        .expect("location should resolve");
    assert_eq!(resolution.value, MUMBAI);
}

#[then("geocoder {name:word} received {count:word} calls")]
fn geocoder_calls(world: &World, name: String, count: String) {
    assert_eq!(world.geocoder(unquote(&name)).calls(), parse_count(&count));
}

#[then("geocoder {name:word} is cooling down")]
fn geocoder_cooling(world: &World, name: String) {
    let provider = unquote(&name);
    let cooling = world.with_engine(|_, engine| engine.is_cooling_down(provider));
    assert!(cooling, "{provider} should be cooling down");
}

#[then("the route is answered by {name:word}")]
fn route_answered_by(world: &World, name: String) {
    let borrowed = world.route.borrow();
    let resolution = borrowed
        .as_ref()
        .expect("a route was requested")
        .as_ref()
        .expect("route should resolve");
    assert_eq!(resolution.provider, unquote(&name));
    assert_eq!(resolution.value.provider, unquote(&name));
}

#[then("the route covers the Mumbai to Delhi road trip")]
fn route_is_road_trip(world: &World) {
    let borrowed = world.route.borrow();
    let resolution = borrowed
        .as_ref()
        .expect("a route was requested")
        .as_ref()
        .expect("route should resolve");
    assert_eq!(resolution.value.distance_meters, ROAD_TRIP_METRES);
    assert_eq!(resolution.value.duration_seconds, ROAD_TRIP_SECONDS);
}

#[then("the route fallbacks record {attempts:word} attempts by {name:word}")]
fn route_fallbacks(world: &World, attempts: String, name: String) {
    let borrowed = world.route.borrow();
    let resolution = borrowed
        .as_ref()
        .expect("a route was requested")
        .as_ref()
        .expect("route should resolve");
    let recorded: Vec<_> = resolution
        .fallbacks
        .iter()
        .map(|f| (f.provider.as_str(), f.kind, f.attempts))
        .collect();
    assert_eq!(
        recorded,
        vec![(unquote(&name), ErrorKind::Unavailable, parse_count(&attempts))]
    );
}

#[then("the location fails after trying {first:word} then {second:word}")]
fn location_trail(world: &World, first: String, second: String) {
    let borrowed = world.location.borrow();
    let err = borrowed
        .as_ref()
        .expect("a location was requested")
        .as_ref()
        .expect_err("location should fail");
    let tried: Vec<_> = err.failures().iter().map(|f| f.provider.as_str()).collect();
    assert_eq!(tried, vec![unquote(&first), unquote(&second)]);
}

#[then("the location failure asks to try again later")]
fn location_unavailable(world: &World) {
    let borrowed = world.location.borrow();
    let err = borrowed
        .as_ref()
        .expect("a location was requested")
        .as_ref()
        .expect_err("location should fail");
    assert_eq!(err.outcome(), FailureOutcome::Unavailable);
}

// --- Scenario registrations ---

macro_rules! register_scenario {
    ($fn_name:ident, $title:literal) => {
        #[scenario(path = "tests/features/engine_fallback.feature", name = $title)]
        fn $fn_name(world: World) {
            let _ = world;
        }
    };
}

register_scenario!(primary_geocoder_answers, "the primary geocoder answers");
register_scenario!(
    unavailable_router_falls_back,
    "an unavailable router falls back to the next one"
);
register_scenario!(every_geocoder_fails, "every geocoder fails");
register_scenario!(rate_limited_geocoder_cools_down, "a rate limited geocoder cools down");
