use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};

use crate::capabilities::{
    Capabilities, Clock, DirectionsReply, PermissionState, Position, SystemClock, WatchId,
};
use crate::config::CoreConfig;
use crate::event::Event;
use crate::geo;
use crate::lifecycle::{
    self, CreationOutcome, CreationStep, LifecycleState, PendingCreation, SeedOutcome, SeedStep,
    TripLifecycle,
};
use crate::model::{GeoPoint, RoutePoint, Trip, TripId, TripStatus, UnixTimeMs};
use crate::route::{resolve_route, RouteFetchFailure, RoutePurpose, RouteResolver};
use crate::store::TripStore;
use crate::tracking::{LocationCommand, TrackingSession};
use crate::{format_date_with_suffix, format_distance, AppError, ErrorKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ToastKind {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

impl ToastKind {
    #[must_use]
    pub const fn default_duration_ms(self) -> u64 {
        match self {
            Self::Info => 3000,
            Self::Success => 2000,
            Self::Warning => 4000,
            Self::Error => 5000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToastMessage {
    pub title: String,
    pub message: String,
    pub kind: ToastKind,
    pub created_at_ms: u64,
    pub duration_ms: u64,
}

impl ToastMessage {
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        message: impl Into<String>,
        kind: ToastKind,
        created_at_ms: u64,
    ) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            kind,
            created_at_ms,
            duration_ms: kind.default_duration_ms(),
        }
    }

    #[must_use]
    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.created_at_ms) > self.duration_ms
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Screen {
    #[default]
    TripList,
    Tracking {
        trip_id: TripId,
    },
}

pub struct Model {
    pub store: TripStore,
    pub lifecycle: LifecycleState,
    pub config: CoreConfig,
    pub clock: Arc<dyn Clock>,
    pub screen: Screen,
    pub expanded_trip: Option<TripId>,
    pub tracking: Option<TrackingSession>,
    pub toast: Option<ToastMessage>,
    /// Snapshot of the buffer whose route is being fetched.
    pub pending_creation: Option<PendingCreation>,
    pub seed_pending: bool,
    pub next_watch_id: u64,
}

impl Default for Model {
    fn default() -> Self {
        Self {
            store: TripStore::default(),
            lifecycle: LifecycleState::default(),
            config: CoreConfig::default().with_env_api_key(),
            clock: Arc::new(SystemClock),
            screen: Screen::default(),
            expanded_trip: None,
            tracking: None,
            toast: None,
            pending_creation: None,
            seed_pending: false,
            next_watch_id: 0,
        }
    }
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("trips", &self.store.len())
            .field("screen", &self.screen)
            .field("tracking", &self.tracking)
            .field("pending_creation", &self.pending_creation.is_some())
            .field("seed_pending", &self.seed_pending)
            .finish_non_exhaustive()
    }
}

impl Model {
    fn now(&self) -> UnixTimeMs {
        self.clock.now()
    }

    fn allocate_watch_id(&mut self) -> WatchId {
        self.next_watch_id += 1;
        WatchId(self.next_watch_id)
    }

    fn tracking_for(&mut self, id: &TripId) -> Option<&mut TrackingSession> {
        self.tracking.as_mut().filter(|s| s.trip_id() == id)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TripListItem {
    pub id: String,
    pub title: String,
    pub status: TripStatus,
    pub status_text: String,
    pub duration_text: String,
    pub date_range: String,
    pub distance_text: String,
    pub stop_count: usize,
    pub is_favorite: bool,
    pub tracking_enabled: bool,
    pub can_draw_route: bool,
    pub is_expanded: bool,
    pub start_action: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TrackingView {
    pub trip_id: String,
    pub title: String,
    pub tracking_enabled: bool,
    pub is_favorite: bool,
    pub alerts_text: String,
    pub locations: Vec<GeoPoint>,
    pub route: Vec<RoutePoint>,
    pub can_draw_route: bool,
    pub live_position: Option<Position>,
    pub is_watching: bool,
    pub permission: PermissionState,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum TrackingScreenView {
    Active(TrackingView),
    NotFound { message: String },
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
pub struct BufferView {
    pub destinations: Vec<GeoPoint>,
    pub title: String,
    pub duration: String,
    pub can_create: bool,
    /// A trip is being created from an earlier snapshot of the buffer.
    pub is_creating: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
pub struct ViewModel {
    pub screen: Screen,
    pub trips: Vec<TripListItem>,
    pub tracking: Option<TrackingScreenView>,
    pub buffer: BufferView,
    pub toast: Option<ToastMessage>,
}

#[derive(Default)]
pub struct App;

impl App {
    fn notify_error(model: &mut Model, err: impl Into<AppError>) {
        let err = err.into();
        error!(code = err.code(), error = %err, "Event handling failed");
        let title = match err.kind {
            ErrorKind::LocationPermissionDenied => "Permission Denied",
            ErrorKind::NotFound => "Trip Not Found",
            _ => "Error",
        };
        let kind = if err.is_retryable() {
            ToastKind::Warning
        } else {
            ToastKind::Error
        };
        model.toast = Some(ToastMessage::new(
            title,
            err.user_facing_message(),
            kind,
            model.now().as_millis(),
        ));
    }

    fn notify_route_failure(model: &mut Model, failure: &RouteFetchFailure) {
        model.toast = Some(ToastMessage::new(
            "Route Error",
            failure.user_message(),
            ToastKind::Warning,
            model.now().as_millis(),
        ));
    }

    /// Sends the directions call. If it cannot even be issued, the attempt
    /// completes straight away with the straight-line fallback.
    fn fetch_route(
        purpose: RoutePurpose,
        points: &[GeoPoint],
        model: &mut Model,
        caps: &Capabilities,
    ) {
        let sent = RouteResolver::from_config(&model.config).and_then(|resolver| {
            resolver.request_route(&caps.http, points, move |reply| Event::RouteFetched {
                purpose,
                reply,
            })
        });
        if let Err(e) = sent {
            warn!(error = %e, "Directions request not sent");
            Self::route_fetched(purpose, Err(e), model);
        }
    }

    fn route_fetched(purpose: RoutePurpose, reply: DirectionsReply, model: &mut Model) {
        let now = model.now();
        match purpose {
            RoutePurpose::ExampleSeed => {
                if !std::mem::take(&mut model.seed_pending) {
                    warn!("Seed route arrived with no seed pending");
                    return;
                }
                let resolution = resolve_route(&lifecycle::example_itinerary(), reply);
                match lifecycle::complete_seed(resolution, &mut model.store, now) {
                    Ok(SeedOutcome::Inserted {
                        route_failure: Some(failure),
                    }) => Self::notify_route_failure(model, &failure),
                    Ok(_) => {}
                    Err(e) => Self::notify_error(model, e),
                }
            }

            RoutePurpose::TripCreation => {
                let Some(pending) = model.pending_creation.take() else {
                    warn!("Creation route arrived with no creation pending");
                    return;
                };
                let resolution = resolve_route(pending.points(), reply);
                let created = TripLifecycle::new(model.config.speed_profile())
                    .create_trip_from_buffer(
                        pending,
                        resolution,
                        &mut model.store,
                        &mut model.lifecycle,
                        now,
                    );
                match created {
                    Ok(CreationOutcome {
                        trip_id,
                        route_failure,
                        duration_warning,
                        ..
                    }) => {
                        if let Some(failure) = route_failure {
                            Self::notify_route_failure(model, &failure);
                        }
                        if let Some(warning) = duration_warning {
                            model.toast = Some(ToastMessage::new(
                                "Insufficient Duration",
                                warning.to_string(),
                                ToastKind::Warning,
                                now.as_millis(),
                            ));
                        }
                        info!(trip_id = %trip_id, "Journey focus created a trip");
                    }
                    Err(e) => Self::notify_error(model, e),
                }
            }
        }
    }

    fn run_location_commands(
        trip_id: &TripId,
        commands: Vec<LocationCommand>,
        caps: &Capabilities,
    ) {
        for command in commands {
            match command {
                LocationCommand::RequestPermission => {
                    let trip_id = trip_id.clone();
                    caps.location.request_permission(move |result| {
                        Event::LocationPermission { trip_id, result }
                    });
                }
                LocationCommand::CurrentPosition => {
                    let trip_id = trip_id.clone();
                    caps.location
                        .current_position(move |result| Event::InitialPosition { trip_id, result });
                }
                LocationCommand::StartWatch { watch_id, options } => {
                    caps.location.watch_position(watch_id, options, move |result| {
                        Event::PositionUpdate { watch_id, result }
                    });
                }
                LocationCommand::ClearWatch { watch_id } => caps.location.clear_watch(watch_id),
            }
        }
    }

    fn close_tracking(model: &mut Model, caps: &Capabilities) {
        if let Some(mut session) = model.tracking.take() {
            let commands = session.deactivate();
            Self::run_location_commands(session.trip_id(), commands, caps);
        }
    }

    fn open_tracking(model: &mut Model, caps: &Capabilities, trip_id: TripId) {
        if model.tracking.as_ref().map(TrackingSession::trip_id) != Some(&trip_id) {
            Self::close_tracking(model, caps);
        }
        model.screen = Screen::Tracking {
            trip_id: trip_id.clone(),
        };

        let Ok(trip) = model.store.get_trip(&trip_id).cloned() else {
            warn!(trip_id = %trip_id, "Tracking screen opened for unknown trip");
            return;
        };

        let watch = model.config.watch;
        let session = model
            .tracking
            .get_or_insert_with(|| TrackingSession::new(trip_id.clone(), watch));
        let commands = session.activate(&trip);
        Self::run_location_commands(&trip_id, commands, caps);
    }

    fn sync_tracking(model: &mut Model, caps: &Capabilities, trip: &Trip) {
        if let Some(session) = model.tracking_for(&trip.id) {
            let commands = session.sync_with(trip);
            Self::run_location_commands(&trip.id, commands, caps);
        }
    }

    fn build_list_item(trip: &Trip, expanded: Option<&TripId>) -> TripListItem {
        let start_action = match trip.status {
            TripStatus::Ongoing => Some("See trip".to_string()),
            TripStatus::Planned | TripStatus::Paused => Some("Start Trip".to_string()),
            TripStatus::Completed | TripStatus::Cancelled => None,
        };

        TripListItem {
            id: trip.id.to_string(),
            title: trip.title.clone(),
            status: trip.status,
            status_text: trip.status.display_name().to_string(),
            duration_text: trip.duration.label(),
            date_range: format!(
                "{} - {}",
                format_date_with_suffix(Some(trip.created_at)),
                format_date_with_suffix(trip.completed_at)
            ),
            distance_text: format_distance(geo::total_distance(&trip.locations)),
            stop_count: trip.locations.len(),
            is_favorite: trip.is_favorite,
            tracking_enabled: trip.tracking_enabled,
            can_draw_route: trip.has_drawable_route(),
            is_expanded: expanded == Some(&trip.id),
            start_action,
        }
    }

    fn build_tracking_view(model: &Model, trip_id: &TripId) -> TrackingScreenView {
        let Ok(trip) = model.store.get_trip(trip_id) else {
            return TrackingScreenView::NotFound {
                message: "Trip not found.".to_string(),
            };
        };

        let session = model.tracking.as_ref().filter(|s| s.trip_id() == trip_id);
        let alerts = trip.emergency_alerts.trim();

        TrackingScreenView::Active(TrackingView {
            trip_id: trip.id.to_string(),
            title: trip.title.clone(),
            tracking_enabled: trip.tracking_enabled,
            is_favorite: trip.is_favorite,
            alerts_text: if alerts.is_empty() {
                "None".to_string()
            } else {
                alerts.to_string()
            },
            locations: trip.locations.clone(),
            route: if trip.has_drawable_route() {
                trip.route_coords.clone()
            } else {
                Vec::new()
            },
            can_draw_route: trip.has_drawable_route(),
            live_position: session.and_then(TrackingSession::live_position),
            is_watching: session.is_some_and(TrackingSession::is_watching),
            permission: session.map_or(PermissionState::Undetermined, TrackingSession::permission),
        })
    }
}

impl crux_core::App for App {
    type Event = Event;
    type Model = Model;
    type ViewModel = ViewModel;
    type Capabilities = Capabilities;

    #[instrument(skip_all, fields(event = event.name()))]
    fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
        if event.is_capability_reply() {
            debug!("Capability reply");
        } else if let Some(trip_id) = event.trip_id() {
            debug!(trip_id = %trip_id, "Trip event");
        }
        let now = model.now();

        match event {
            Event::Configure { config_json } => match CoreConfig::from_json_str(&config_json) {
                Ok(config) => {
                    model.config = config.with_env_api_key();
                    info!("Configuration applied");
                }
                Err(e) => Self::notify_error(model, e),
            },

            Event::AppStarted => {
                if model.seed_pending {
                    debug!("Example trip route already requested");
                    return;
                }
                match lifecycle::seed_example_trip(&model.store) {
                    SeedStep::AlreadyPresent => debug!("Example trip already present"),
                    SeedStep::AwaitingRoute { points } => {
                        model.seed_pending = true;
                        Self::fetch_route(RoutePurpose::ExampleSeed, &points, model, caps);
                    }
                }
            }

            Event::JourneyFocused => {
                if model.pending_creation.is_some() {
                    debug!("Trip creation already waiting on its route");
                    return;
                }
                let step = TripLifecycle::new(model.config.speed_profile())
                    .reconcile_buffer(&mut model.store, &model.lifecycle);
                match step {
                    CreationStep::Skipped(reason) => {
                        debug!(reason = %reason, "No trip created on focus");
                    }
                    CreationStep::AwaitingRoute(pending) => {
                        let points = pending.points().to_vec();
                        model.pending_creation = Some(pending);
                        Self::fetch_route(RoutePurpose::TripCreation, &points, model, caps);
                    }
                }
            }

            Event::PlaceSelected { candidate } => {
                let staged = GeoPoint::try_from(candidate)
                    .and_then(|point| model.store.stage_destination(point));
                if let Err(e) = staged {
                    Self::notify_error(model, e);
                }
            }

            Event::DestinationStaged { point } => {
                if let Err(e) = model.store.stage_destination(point) {
                    Self::notify_error(model, e);
                }
            }

            Event::TripTitleChanged { title } => model.store.set_buffer_title(title),

            Event::TripDurationChanged { duration } => model.store.set_buffer_duration(duration),

            Event::BufferCleared => model.store.clear_buffer(),

            Event::TripExpanded { trip_id } => {
                model.expanded_trip = if model.expanded_trip.as_ref() == Some(&trip_id) {
                    None
                } else {
                    Some(trip_id)
                };
            }

            Event::StartOrResume { trip_id } => {
                match lifecycle::start_or_resume(&mut model.store, &trip_id, now).map(|_| ()) {
                    Ok(()) => Self::open_tracking(model, caps, trip_id),
                    Err(e) => Self::notify_error(model, e),
                }
            }

            Event::EndTrip { trip_id } => {
                match lifecycle::end_trip(&mut model.store, &trip_id, now).map(|_| ()) {
                    Ok(()) => {
                        if model.tracking_for(&trip_id).is_some() {
                            Self::close_tracking(model, caps);
                        }
                        model.screen = Screen::TripList;
                    }
                    Err(e) => Self::notify_error(model, e),
                }
            }

            Event::ToggleTracking { trip_id } => {
                match lifecycle::toggle_tracking(&mut model.store, &trip_id, now).cloned() {
                    Ok(trip) => Self::sync_tracking(model, caps, &trip),
                    Err(e) => Self::notify_error(model, e),
                }
            }

            Event::ToggleFavorite { trip_id } => {
                if let Some(e) = lifecycle::toggle_favorite(&mut model.store, &trip_id, now).err() {
                    Self::notify_error(model, e);
                }
            }

            Event::EditTripDetails {
                trip_id,
                title,
                duration,
            } => {
                let edited =
                    lifecycle::edit_details(&mut model.store, &trip_id, &title, &duration, now)
                        .err();
                if let Some(e) = edited {
                    Self::notify_error(model, e);
                }
            }

            Event::DeleteTrip { trip_id } => {
                match lifecycle::delete_trip(&mut model.store, &trip_id) {
                    Ok(_) => {
                        if model.tracking_for(&trip_id).is_some() {
                            Self::close_tracking(model, caps);
                        }
                        if model.expanded_trip.as_ref() == Some(&trip_id) {
                            model.expanded_trip = None;
                        }
                    }
                    Err(e) => Self::notify_error(model, e),
                }
            }

            Event::TrackingScreenOpened { trip_id } => Self::open_tracking(model, caps, trip_id),

            Event::TrackingScreenClosed => {
                Self::close_tracking(model, caps);
                model.screen = Screen::TripList;
            }

            Event::DismissToast => model.toast = None,

            Event::RouteFetched { purpose, reply } => Self::route_fetched(purpose, reply, model),

            Event::LocationPermission { trip_id, result } => {
                let watch_id = model.allocate_watch_id();
                let Some(session) = model.tracking_for(&trip_id) else {
                    debug!(trip_id = %trip_id, "Permission reply after the screen closed");
                    return;
                };
                match session.permission_resolved(result, watch_id) {
                    Ok(commands) => Self::run_location_commands(&trip_id, commands, caps),
                    Err(e) => Self::notify_error(model, e),
                }
            }

            Event::InitialPosition { trip_id, result } => {
                let changed = model
                    .tracking_for(&trip_id)
                    .is_some_and(|session| session.initial_position(result));
                if !changed {
                    return;
                }
            }

            Event::PositionUpdate { watch_id, result } => {
                let changed = model
                    .tracking
                    .as_mut()
                    .is_some_and(|session| session.accept_position(watch_id, result));
                if !changed {
                    return;
                }
            }
        }

        caps.render.render();
    }

    fn view(&self, model: &Model) -> ViewModel {
        let now_ms = model.now().as_millis();

        let trips = model
            .store
            .list_trips()
            .iter()
            .map(|trip| Self::build_list_item(trip, model.expanded_trip.as_ref()))
            .collect();

        let tracking = match &model.screen {
            Screen::TripList => None,
            Screen::Tracking { trip_id } => Some(Self::build_tracking_view(model, trip_id)),
        };

        let buffer = model.store.buffer();
        let buffer = BufferView {
            destinations: buffer.destinations.clone(),
            title: buffer.title.clone(),
            duration: buffer.duration.clone(),
            can_create: buffer.destinations.len() >= crate::MIN_ROUTE_POINTS,
            is_creating: model.pending_creation.is_some(),
        };

        ViewModel {
            screen: model.screen.clone(),
            trips,
            tracking,
            buffer,
            toast: model.toast.clone().filter(|t| !t.is_expired(now_ms)),
        }
    }
}
