use serde::{Deserialize, Serialize};

use crate::capabilities::{
    DirectionsReply, LocationError, PermissionState, Position, WatchId,
};
use crate::model::{GeoPoint, PlaceCandidate, TripId};
use crate::route::RoutePurpose;

/// Everything the shell can tell the core, plus the capability replies that
/// come back through it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    /// JSON settings from the shell; see `CoreConfig`.
    Configure {
        config_json: String,
    },
    AppStarted,

    /// The trip list regained focus; any staged destinations are turned into a trip.
    JourneyFocused,

    PlaceSelected {
        candidate: PlaceCandidate,
    },
    DestinationStaged {
        point: GeoPoint,
    },
    TripTitleChanged {
        title: String,
    },
    TripDurationChanged {
        duration: String,
    },
    BufferCleared,

    TripExpanded {
        trip_id: TripId,
    },
    StartOrResume {
        trip_id: TripId,
    },
    EndTrip {
        trip_id: TripId,
    },
    ToggleTracking {
        trip_id: TripId,
    },
    ToggleFavorite {
        trip_id: TripId,
    },
    EditTripDetails {
        trip_id: TripId,
        title: String,
        duration: String,
    },
    DeleteTrip {
        trip_id: TripId,
    },

    TrackingScreenOpened {
        trip_id: TripId,
    },
    TrackingScreenClosed,

    DismissToast,

    // Capability replies
    RouteFetched {
        purpose: RoutePurpose,
        reply: DirectionsReply,
    },
    LocationPermission {
        trip_id: TripId,
        result: Result<PermissionState, LocationError>,
    },
    InitialPosition {
        trip_id: TripId,
        result: Result<Position, LocationError>,
    },
    PositionUpdate {
        watch_id: WatchId,
        result: Result<Position, LocationError>,
    },
}

impl Event {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Configure { .. } => "configure",
            Self::AppStarted => "app_started",
            Self::JourneyFocused => "journey_focused",
            Self::PlaceSelected { .. } => "place_selected",
            Self::DestinationStaged { .. } => "destination_staged",
            Self::TripTitleChanged { .. } => "trip_title_changed",
            Self::TripDurationChanged { .. } => "trip_duration_changed",
            Self::BufferCleared => "buffer_cleared",
            Self::TripExpanded { .. } => "trip_expanded",
            Self::StartOrResume { .. } => "start_or_resume",
            Self::EndTrip { .. } => "end_trip",
            Self::ToggleTracking { .. } => "toggle_tracking",
            Self::ToggleFavorite { .. } => "toggle_favorite",
            Self::EditTripDetails { .. } => "edit_trip_details",
            Self::DeleteTrip { .. } => "delete_trip",
            Self::TrackingScreenOpened { .. } => "tracking_screen_opened",
            Self::TrackingScreenClosed => "tracking_screen_closed",
            Self::DismissToast => "dismiss_toast",
            Self::RouteFetched { .. } => "route_fetched",
            Self::LocationPermission { .. } => "location_permission",
            Self::InitialPosition { .. } => "initial_position",
            Self::PositionUpdate { .. } => "position_update",
        }
    }

    /// The trip this event targets, if any.
    pub fn trip_id(&self) -> Option<&TripId> {
        match self {
            Self::TripExpanded { trip_id }
            | Self::StartOrResume { trip_id }
            | Self::EndTrip { trip_id }
            | Self::ToggleTracking { trip_id }
            | Self::ToggleFavorite { trip_id }
            | Self::EditTripDetails { trip_id, .. }
            | Self::DeleteTrip { trip_id }
            | Self::TrackingScreenOpened { trip_id }
            | Self::LocationPermission { trip_id, .. }
            | Self::InitialPosition { trip_id, .. } => Some(trip_id),
            _ => None,
        }
    }

    /// Replies to an earlier capability request rather than user input.
    pub const fn is_capability_reply(&self) -> bool {
        matches!(
            self,
            Self::RouteFetched { .. }
                | Self::LocationPermission { .. }
                | Self::InitialPosition { .. }
                | Self::PositionUpdate { .. }
        )
    }
}
