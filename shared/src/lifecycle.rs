use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::geo::{self, DurationEstimate, SpeedProfile};
use crate::model::{
    GeoPoint, TransitionError, Trip, TripDuration, TripId, TripPatch, TripStatus, UnixTimeMs,
};
use crate::route::{RouteFetchFailure, RouteResolution};
use crate::store::{DestinationBuffer, StoreError, TripStore};
use crate::{AppError, MIN_ROUTE_POINTS, MS_PER_DAY};

pub const EXAMPLE_TRIP_ID: &str = "1";
pub const EXAMPLE_TRIP_TITLE: &str = "Karachi → Islamabad → Lahore → Karachi";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    InvalidTransition(#[from] TransitionError),
}

impl From<LifecycleError> for AppError {
    fn from(e: LifecycleError) -> Self {
        match e {
            LifecycleError::Store(e) => e.into(),
            LifecycleError::InvalidTransition(e) => e.into(),
        }
    }
}

/// Why a creation attempt did not produce a trip.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CreationSkipped {
    #[error("at least two destinations are required, {staged} staged")]
    InvalidBufferState { staged: usize },

    #[error("these destinations were already turned into a trip")]
    Duplicate,
}

/// The declared day count is below what the route needs. Creation still proceeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsufficientDurationWarning {
    pub declared_days: u32,
    pub estimated_days: u32,
}

impl std::fmt::Display for InsufficientDurationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "You entered {} day(s), but the estimated duration based on your route is {} day(s). \
             Consider increasing your trip duration.",
            self.declared_days, self.estimated_days
        )
    }
}

/// A creation attempt waiting on its route. Holds a copy of the buffer as it
/// was when the attempt began; the store's buffer is left untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingCreation {
    buffer: DestinationBuffer,
    fingerprint: String,
}

impl PendingCreation {
    #[must_use]
    pub fn points(&self) -> &[GeoPoint] {
        &self.buffer.destinations
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CreationStep {
    /// Nothing to create. The buffer has already been cleared.
    Skipped(CreationSkipped),
    AwaitingRoute(PendingCreation),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreationOutcome {
    pub trip_id: TripId,
    pub estimate: DurationEstimate,
    pub route_failure: Option<RouteFetchFailure>,
    pub duration_warning: Option<InsufficientDurationWarning>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SeedStep {
    AlreadyPresent,
    AwaitingRoute { points: Vec<GeoPoint> },
}

#[derive(Debug, Clone, PartialEq)]
pub enum SeedOutcome {
    Inserted {
        route_failure: Option<RouteFetchFailure>,
    },
    AlreadyPresent,
}

/// Controller-owned memory between creation attempts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleState {
    last_fingerprint: Option<String>,
}

impl LifecycleState {
    #[must_use]
    pub fn last_fingerprint(&self) -> Option<&str> {
        self.last_fingerprint.as_deref()
    }
}

#[must_use]
pub fn example_itinerary() -> Vec<GeoPoint> {
    [
        (24.8607, 67.0011, "Karachi Airport"),
        (33.6844, 73.0479, "Islamabad Airport"),
        (33.7294, 73.0379, "Faisal Mosque"),
        (31.582, 74.329, "Minar-e-Pakistan"),
        (31.5889, 74.3107, "Badshahi Mosque"),
        (24.8607, 67.0011, "Karachi (Return)"),
    ]
    .into_iter()
    .map(|(latitude, longitude, label)| GeoPoint {
        latitude,
        longitude,
        label: Some(label.to_string()),
    })
    .collect()
}

/// Turns staged destinations into trips.
#[derive(Debug, Clone, Copy)]
pub struct TripLifecycle {
    profile: SpeedProfile,
}

impl TripLifecycle {
    pub fn new(profile: SpeedProfile) -> Self {
        Self { profile }
    }

    /// First half of a creation attempt. Either skips (clearing the buffer)
    /// or hands back the snapshot whose route must be fetched.
    pub fn reconcile_buffer(&self, store: &mut TripStore, state: &LifecycleState) -> CreationStep {
        let buffer = store.buffer();
        let staged = buffer.destinations.len();
        if staged < MIN_ROUTE_POINTS {
            debug!(staged, "Creation skipped, not enough destinations");
            store.clear_buffer();
            return CreationStep::Skipped(CreationSkipped::InvalidBufferState { staged });
        }

        let fingerprint = geo::fingerprint(&buffer.destinations);
        if state.last_fingerprint.as_deref() == Some(fingerprint.as_str()) {
            debug!("Creation skipped, destinations already committed");
            store.clear_buffer();
            return CreationStep::Skipped(CreationSkipped::Duplicate);
        }

        CreationStep::AwaitingRoute(PendingCreation {
            buffer: buffer.clone(),
            fingerprint,
        })
    }

    /// Second half of a creation attempt. The store's buffer is empty
    /// afterwards whether or not the trip could be added.
    #[instrument(skip_all, fields(staged = pending.buffer.destinations.len()))]
    pub fn create_trip_from_buffer(
        &self,
        pending: PendingCreation,
        resolution: RouteResolution,
        store: &mut TripStore,
        state: &mut LifecycleState,
        now: UnixTimeMs,
    ) -> Result<CreationOutcome, LifecycleError> {
        let PendingCreation {
            buffer,
            fingerprint,
        } = pending;

        let distance_km = geo::total_distance(&buffer.destinations);
        let estimate = geo::estimate_duration(distance_km, &self.profile);

        let declared = buffer.duration().map(TripDuration::parse);
        let duration_warning = declared
            .as_ref()
            .and_then(TripDuration::days)
            .filter(|&days| days < estimate.days)
            .map(|declared_days| InsufficientDurationWarning {
                declared_days,
                estimated_days: estimate.days,
            });
        if let Some(warning) = &duration_warning {
            warn!(
                declared = warning.declared_days,
                estimated = warning.estimated_days,
                "Declared duration shorter than estimate"
            );
        }

        let id = store.next_free_id(now);
        let title = buffer
            .title()
            .map_or_else(|| Trip::placeholder_title(now), str::to_string);
        let duration = declared.unwrap_or(TripDuration::Days(estimate.days));

        let trip = Trip {
            id: id.clone(),
            title,
            duration,
            locations: buffer.destinations,
            route_coords: resolution.points,
            route_geo_json: resolution.geojson,
            tracking_enabled: true,
            status: TripStatus::Planned,
            created_at: now,
            started_at: None,
            completed_at: None,
            updated_at: None,
            is_favorite: false,
            emergency_alerts: String::new(),
        };

        let added = store.add_trip(trip);
        store.clear_buffer();
        added?;
        state.last_fingerprint = Some(fingerprint);

        info!(trip_id = %id, distance_km, estimated_days = estimate.days, "Trip created");

        Ok(CreationOutcome {
            trip_id: id,
            estimate,
            route_failure: resolution.failure,
            duration_warning,
        })
    }
}

/// First half of seeding the bundled Karachi round trip.
pub fn seed_example_trip(store: &TripStore) -> SeedStep {
    if store.contains(&TripId::new(EXAMPLE_TRIP_ID)) {
        return SeedStep::AlreadyPresent;
    }
    SeedStep::AwaitingRoute {
        points: example_itinerary(),
    }
}

/// Inserts the example trip once its route is known.
#[instrument(skip_all)]
pub fn complete_seed(
    resolution: RouteResolution,
    store: &mut TripStore,
    now: UnixTimeMs,
) -> Result<SeedOutcome, LifecycleError> {
    let id = TripId::new(EXAMPLE_TRIP_ID);
    if store.contains(&id) {
        return Ok(SeedOutcome::AlreadyPresent);
    }

    let trip = Trip {
        id,
        title: EXAMPLE_TRIP_TITLE.to_string(),
        duration: TripDuration::Days(6),
        locations: example_itinerary(),
        route_coords: resolution.points,
        route_geo_json: resolution.geojson,
        tracking_enabled: true,
        status: TripStatus::Completed,
        created_at: now.saturating_sub_millis(6 * MS_PER_DAY),
        started_at: None,
        completed_at: Some(now),
        updated_at: None,
        is_favorite: false,
        emergency_alerts: String::new(),
    };

    store.add_trip(trip)?;
    info!("Example trip seeded");

    Ok(SeedOutcome::Inserted {
        route_failure: resolution.failure,
    })
}

pub fn start_or_resume<'s>(
    store: &'s mut TripStore,
    id: &TripId,
    now: UnixTimeMs,
) -> Result<&'s Trip, LifecycleError> {
    let trip = store.get_trip(id)?;
    trip.status.validate_start()?;

    let patch = TripPatch {
        status: Some(TripStatus::Ongoing),
        started_at: trip.started_at.is_none().then_some(now),
        ..TripPatch::default()
    };

    let trip = store.update_trip(id, patch, now)?;
    info!(trip_id = %id, "Trip started");
    Ok(trip)
}

pub fn end_trip<'s>(
    store: &'s mut TripStore,
    id: &TripId,
    now: UnixTimeMs,
) -> Result<&'s Trip, LifecycleError> {
    let patch = TripPatch {
        status: Some(TripStatus::Completed),
        completed_at: Some(now),
        ..TripPatch::default()
    };
    let trip = store.update_trip(id, patch, now)?;
    info!(trip_id = %id, "Trip completed");
    Ok(trip)
}

pub fn set_tracking<'s>(
    store: &'s mut TripStore,
    id: &TripId,
    enabled: bool,
    now: UnixTimeMs,
) -> Result<&'s Trip, LifecycleError> {
    let trip = store.update_trip(id, TripPatch::tracking(enabled), now)?;
    debug!(trip_id = %id, enabled, "Tracking toggled");
    Ok(trip)
}

pub fn toggle_tracking<'s>(
    store: &'s mut TripStore,
    id: &TripId,
    now: UnixTimeMs,
) -> Result<&'s Trip, LifecycleError> {
    let enabled = !store.get_trip(id)?.tracking_enabled;
    set_tracking(store, id, enabled, now)
}

pub fn toggle_favorite<'s>(
    store: &'s mut TripStore,
    id: &TripId,
    now: UnixTimeMs,
) -> Result<&'s Trip, LifecycleError> {
    let favorite = !store.get_trip(id)?.is_favorite;
    let patch = TripPatch {
        is_favorite: Some(favorite),
        ..TripPatch::default()
    };
    Ok(store.update_trip(id, patch, now)?)
}

/// Saves the edit form. A blank title keeps the current one.
pub fn edit_details<'s>(
    store: &'s mut TripStore,
    id: &TripId,
    title: &str,
    duration: &str,
    now: UnixTimeMs,
) -> Result<&'s Trip, LifecycleError> {
    let title = title.trim();
    let patch = TripPatch {
        title: (!title.is_empty()).then(|| title.to_string()),
        duration: Some(TripDuration::parse(duration.trim())),
        ..TripPatch::default()
    };
    Ok(store.update_trip(id, patch, now)?)
}

pub fn delete_trip(store: &mut TripStore, id: &TripId) -> Result<Trip, LifecycleError> {
    let trip = store.delete_trip(id)?;
    info!(trip_id = %id, "Trip deleted");
    Ok(trip)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::testing::line_string_body;
    use crate::capabilities::HttpError;
    use crate::route::resolve_route;

    const T0: u64 = 1_792_281_600_000;

    struct Harness {
        lifecycle: TripLifecycle,
        store: TripStore,
        state: LifecycleState,
    }

    fn harness() -> Harness {
        Harness {
            lifecycle: TripLifecycle::new(SpeedProfile::default()),
            store: TripStore::new(),
            state: LifecycleState::default(),
        }
    }

    fn offline() -> Result<Vec<u8>, HttpError> {
        Err(HttpError::ConnectionError {
            host: "api.openrouteservice.org".into(),
            message: "offline".into(),
        })
    }

    fn stage_karachi_islamabad(store: &mut TripStore) {
        store
            .stage_destination(GeoPoint::labelled(24.8607, 67.0011, "Karachi").unwrap())
            .unwrap();
        store
            .stage_destination(GeoPoint::labelled(33.6844, 73.0479, "Islamabad").unwrap())
            .unwrap();
    }

    impl Harness {
        fn pending(&mut self) -> PendingCreation {
            match self.lifecycle.reconcile_buffer(&mut self.store, &self.state) {
                CreationStep::AwaitingRoute(pending) => pending,
                CreationStep::Skipped(reason) => panic!("expected a route request, got {reason}"),
            }
        }

        fn create_with(
            &mut self,
            reply: Result<Vec<u8>, HttpError>,
            now: u64,
        ) -> Result<CreationOutcome, LifecycleError> {
            let pending = self.pending();
            let resolution = resolve_route(pending.points(), reply);
            self.lifecycle.create_trip_from_buffer(
                pending,
                resolution,
                &mut self.store,
                &mut self.state,
                UnixTimeMs(now),
            )
        }

        fn create(&mut self) -> TripId {
            self.create_with(offline(), T0).unwrap().trip_id
        }
    }

    mod creation_tests {
        use super::*;

        #[test]
        fn test_creates_planned_trip() {
            let mut h = harness();
            stage_karachi_islamabad(&mut h.store);
            h.store.set_buffer_title("North");

            let id = h.create();

            assert_eq!(id.as_str(), T0.to_string());
            let trip = h.store.get_trip(&id).unwrap();
            assert_eq!(trip.title, "North");
            assert_eq!(trip.status, TripStatus::Planned);
            assert!(trip.tracking_enabled);
            assert_eq!(trip.created_at.as_millis(), T0);
            assert_eq!(trip.locations.len(), 2);
            // ~1165 km at 480 km/day
            assert_eq!(trip.duration, TripDuration::Days(3));
            assert!(h.store.buffer().is_empty());
        }

        #[test]
        fn test_buffer_survives_until_route_arrives() {
            let mut h = harness();
            stage_karachi_islamabad(&mut h.store);
            h.store.set_buffer_title("North");
            let before = h.store.buffer().clone();

            let pending = h.pending();

            assert_eq!(h.store.buffer(), &before);
            assert_eq!(pending.points(), before.destinations.as_slice());
            assert!(h.store.is_empty());

            let resolution = resolve_route(pending.points(), offline());
            h.lifecycle
                .create_trip_from_buffer(
                    pending,
                    resolution,
                    &mut h.store,
                    &mut h.state,
                    UnixTimeMs(T0),
                )
                .unwrap();
            assert!(h.store.buffer().is_empty());
            assert_eq!(h.store.len(), 1);
        }

        #[test]
        fn test_trip_uses_snapshot_and_attempt_clears_later_edits() {
            let mut h = harness();
            stage_karachi_islamabad(&mut h.store);
            let pending = h.pending();
            h.store.stage_destination(GeoPoint::new(31.582, 74.329).unwrap()).unwrap();
            h.store.set_buffer_title("Late edit");

            let resolution = resolve_route(pending.points(), offline());
            let outcome = h
                .lifecycle
                .create_trip_from_buffer(
                    pending,
                    resolution,
                    &mut h.store,
                    &mut h.state,
                    UnixTimeMs(T0),
                )
                .unwrap();

            let trip = h.store.get_trip(&outcome.trip_id).unwrap();
            assert_eq!(trip.locations.len(), 2);
            assert_eq!(trip.title, format!("Trip {T0}"));
            assert!(h.store.buffer().is_empty());
            assert!(h.state.last_fingerprint().is_some());
        }

        #[test]
        fn test_fallback_route_is_input_points() {
            let mut h = harness();
            stage_karachi_islamabad(&mut h.store);
            let expected: Vec<_> = h
                .store
                .buffer()
                .destinations
                .iter()
                .map(GeoPoint::route_point)
                .collect();

            let outcome = h.create_with(offline(), T0).unwrap();

            assert!(outcome.route_failure.is_some());
            let trip = h.store.get_trip(&outcome.trip_id).unwrap();
            assert_eq!(trip.route_coords, expected);
            assert!(trip.route_geo_json.is_none());
        }

        #[test]
        fn test_routed_polyline_is_stored() {
            let body =
                line_string_body(&[[67.0011, 24.8607], [70.0, 29.0], [73.0479, 33.6844]]);
            let mut h = harness();
            stage_karachi_islamabad(&mut h.store);

            let outcome = h.create_with(Ok(body), T0).unwrap();
            let trip = h.store.get_trip(&outcome.trip_id).unwrap();

            assert!(outcome.route_failure.is_none());
            assert_eq!(trip.route_coords.len(), 3);
            assert!(trip.route_geo_json.is_some());
        }

        #[test]
        fn test_placeholder_title() {
            let mut h = harness();
            stage_karachi_islamabad(&mut h.store);

            let id = h.create();
            let trip = h.store.get_trip(&id).unwrap();
            assert_eq!(trip.title, format!("Trip {T0}"));
        }

        #[test]
        fn test_single_point_skipped_and_cleared() {
            let mut h = harness();
            h.store.stage_destination(GeoPoint::new(1.0, 1.0).unwrap()).unwrap();
            h.store.set_buffer_title("Solo");

            let step = h.lifecycle.reconcile_buffer(&mut h.store, &h.state);

            assert_eq!(
                step,
                CreationStep::Skipped(CreationSkipped::InvalidBufferState { staged: 1 })
            );
            assert!(h.store.is_empty());
            assert!(h.store.buffer().is_empty());
        }

        #[test]
        fn test_same_destinations_create_one_trip() {
            let mut h = harness();
            stage_karachi_islamabad(&mut h.store);
            h.create();

            stage_karachi_islamabad(&mut h.store);
            let second = h.lifecycle.reconcile_buffer(&mut h.store, &h.state);

            assert_eq!(second, CreationStep::Skipped(CreationSkipped::Duplicate));
            assert_eq!(h.store.len(), 1);
            assert!(h.store.buffer().is_empty());
        }

        #[test]
        fn test_ids_stay_unique_within_one_millisecond() {
            let mut h = harness();
            stage_karachi_islamabad(&mut h.store);
            h.create();

            h.store.stage_destination(GeoPoint::new(1.0, 1.0).unwrap()).unwrap();
            h.store.stage_destination(GeoPoint::new(2.0, 2.0).unwrap()).unwrap();
            let id = h.create();

            assert_eq!(id.as_str(), (T0 + 1).to_string());
            assert_eq!(h.store.len(), 2);
        }
    }

    mod duration_tests {
        use super::*;

        #[test]
        fn test_short_declared_duration_warns() {
            let mut h = harness();
            stage_karachi_islamabad(&mut h.store);
            h.store.set_buffer_duration("1");

            let outcome = h.create_with(offline(), T0).unwrap();

            assert_eq!(
                outcome.duration_warning,
                Some(InsufficientDurationWarning {
                    declared_days: 1,
                    estimated_days: 3,
                })
            );
            assert_eq!(
                h.store.get_trip(&outcome.trip_id).unwrap().duration,
                TripDuration::Days(1)
            );
        }

        #[test]
        fn test_sufficient_duration_no_warning() {
            let mut h = harness();
            stage_karachi_islamabad(&mut h.store);
            h.store.set_buffer_duration("5 days");

            let outcome = h.create_with(offline(), T0).unwrap();

            assert!(outcome.duration_warning.is_none());
        }

        #[test]
        fn test_unparseable_duration_skips_comparison() {
            let mut h = harness();
            stage_karachi_islamabad(&mut h.store);
            h.store.set_buffer_duration("a long weekend");

            let outcome = h.create_with(offline(), T0).unwrap();

            assert!(outcome.duration_warning.is_none());
            assert_eq!(
                h.store.get_trip(&outcome.trip_id).unwrap().duration,
                TripDuration::Unparsed("a long weekend".into())
            );
        }

        #[test]
        fn test_warning_text() {
            let warning = InsufficientDurationWarning {
                declared_days: 2,
                estimated_days: 4,
            };
            assert!(warning.to_string().starts_with("You entered 2 day(s)"));
        }
    }

    mod seed_tests {
        use super::*;

        #[test]
        fn test_seed_inserts_once() {
            let mut store = TripStore::new();

            let SeedStep::AwaitingRoute { points } = seed_example_trip(&store) else {
                panic!("expected a route request");
            };
            assert_eq!(points.len(), 6);
            let first =
                complete_seed(resolve_route(&points, offline()), &mut store, UnixTimeMs(T0))
                    .unwrap();

            assert!(matches!(first, SeedOutcome::Inserted { route_failure: Some(_) }));
            assert_eq!(seed_example_trip(&store), SeedStep::AlreadyPresent);
            assert_eq!(
                complete_seed(RouteResolution::empty(), &mut store, UnixTimeMs(T0)).unwrap(),
                SeedOutcome::AlreadyPresent
            );
            assert_eq!(store.len(), 1);

            let trip = store.get_trip(&EXAMPLE_TRIP_ID.into()).unwrap();
            assert_eq!(trip.status, TripStatus::Completed);
            assert_eq!(trip.locations.len(), 6);
            assert_eq!(trip.route_coords.len(), 6);
            assert_eq!(trip.duration, TripDuration::Days(6));
            assert_eq!(trip.completed_at.map(|t| t.as_millis()), Some(T0));
            assert_eq!(trip.created_at.as_millis(), T0 - 6 * MS_PER_DAY);
        }
    }

    mod transition_tests {
        use super::*;

        fn created(h: &mut Harness) -> TripId {
            stage_karachi_islamabad(&mut h.store);
            h.create()
        }

        #[test]
        fn test_start_sets_started_at_once() {
            let mut h = harness();
            let id = created(&mut h);

            let trip = start_or_resume(&mut h.store, &id, UnixTimeMs(T0 + 10)).unwrap();
            assert_eq!(trip.status, TripStatus::Ongoing);
            assert_eq!(trip.started_at.map(|t| t.as_millis()), Some(T0 + 10));

            let trip = start_or_resume(&mut h.store, &id, UnixTimeMs(T0 + 20)).unwrap();
            assert_eq!(trip.started_at.map(|t| t.as_millis()), Some(T0 + 10));
        }

        #[test]
        fn test_resume_from_paused() {
            let mut h = harness();
            let id = created(&mut h);
            h.store
                .update_trip(&id, TripPatch::status(TripStatus::Paused), UnixTimeMs(T0))
                .unwrap();

            let trip = start_or_resume(&mut h.store, &id, UnixTimeMs(T0 + 1)).unwrap();
            assert_eq!(trip.status, TripStatus::Ongoing);
        }

        #[test]
        fn test_start_rejected_when_completed() {
            let mut h = harness();
            let id = created(&mut h);
            end_trip(&mut h.store, &id, UnixTimeMs(T0)).unwrap();

            let err = start_or_resume(&mut h.store, &id, UnixTimeMs(T0)).unwrap_err();
            assert!(matches!(err, LifecycleError::InvalidTransition(_)));
        }

        #[test]
        fn test_end_trip_twice_moves_completed_at() {
            let mut h = harness();
            let id = created(&mut h);
            start_or_resume(&mut h.store, &id, UnixTimeMs(T0)).unwrap();

            let first = end_trip(&mut h.store, &id, UnixTimeMs(T0 + 100))
                .unwrap()
                .clone();
            let second = end_trip(&mut h.store, &id, UnixTimeMs(T0 + 200)).unwrap();

            assert_eq!(first.status, TripStatus::Completed);
            assert_eq!(second.status, TripStatus::Completed);
            assert_eq!(first.completed_at.map(|t| t.as_millis()), Some(T0 + 100));
            assert_eq!(second.completed_at.map(|t| t.as_millis()), Some(T0 + 200));
            assert_eq!(second.updated_at, second.completed_at);
        }

        #[test]
        fn test_toggles() {
            let mut h = harness();
            let id = created(&mut h);
            let now = UnixTimeMs(T0);

            assert!(!toggle_tracking(&mut h.store, &id, now).unwrap().tracking_enabled);
            assert!(toggle_tracking(&mut h.store, &id, now).unwrap().tracking_enabled);
            assert!(toggle_favorite(&mut h.store, &id, now).unwrap().is_favorite);
            assert_eq!(h.store.get_trip(&id).unwrap().status, TripStatus::Planned);
        }

        #[test]
        fn test_edit_details() {
            let mut h = harness();
            let id = created(&mut h);
            let now = UnixTimeMs(T0);

            let trip = edit_details(&mut h.store, &id, "Renamed", "4", now).unwrap();
            assert_eq!(trip.title, "Renamed");
            assert_eq!(trip.duration, TripDuration::Days(4));

            let trip = edit_details(&mut h.store, &id, "  ", "later", now).unwrap();
            assert_eq!(trip.title, "Renamed");
            assert_eq!(trip.duration, TripDuration::Unparsed("later".into()));
        }

        #[test]
        fn test_unknown_trip() {
            let mut h = harness();
            let id = TripId::new("404");
            let now = UnixTimeMs(T0);
            assert_eq!(
                end_trip(&mut h.store, &id, now).unwrap_err(),
                LifecycleError::Store(StoreError::TripNotFound(id.clone()))
            );
            assert!(toggle_tracking(&mut h.store, &id, now).is_err());
            assert!(delete_trip(&mut h.store, &id).is_err());
        }
    }
}
