use tracing::{debug, info, instrument, warn};

use crate::capabilities::{LocationError, PermissionState, Position, WatchId, WatchOptions};
use crate::model::{Trip, TripId};

/// What the session needs the location capability to do next.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LocationCommand {
    RequestPermission,
    CurrentPosition,
    StartWatch {
        watch_id: WatchId,
        options: WatchOptions,
    },
    ClearWatch {
        watch_id: WatchId,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WatchPhase {
    Idle,
    AwaitingPermission,
    Watching(WatchId),
}

/// Live location for the trip on screen.
///
/// Positions stay here and are never written into the [`Trip`]. Only the
/// newest fix is kept; a burst of deliveries never builds a backlog.
#[derive(Debug, Clone)]
pub struct TrackingSession {
    trip_id: TripId,
    options: WatchOptions,
    phase: WatchPhase,
    live_position: Option<Position>,
    permission: PermissionState,
}

impl TrackingSession {
    pub fn new(trip_id: TripId, options: WatchOptions) -> Self {
        Self {
            trip_id,
            options,
            phase: WatchPhase::Idle,
            live_position: None,
            permission: PermissionState::Undetermined,
        }
    }

    #[must_use]
    pub fn trip_id(&self) -> &TripId {
        &self.trip_id
    }

    #[must_use]
    pub fn live_position(&self) -> Option<Position> {
        self.live_position
    }

    #[must_use]
    pub fn permission(&self) -> PermissionState {
        self.permission
    }

    #[must_use]
    pub fn is_watching(&self) -> bool {
        matches!(self.phase, WatchPhase::Watching(_))
    }

    /// Asks for permission if the trip has tracking on. No-op while a watch
    /// is open or permission is already being asked for.
    #[instrument(skip_all, fields(trip_id = %self.trip_id))]
    pub fn activate(&mut self, trip: &Trip) -> Vec<LocationCommand> {
        if !trip.tracking_enabled {
            return self.deactivate();
        }
        if self.phase != WatchPhase::Idle {
            return Vec::new();
        }
        self.phase = WatchPhase::AwaitingPermission;
        vec![LocationCommand::RequestPermission]
    }

    /// Handles the permission reply. A reply nobody is waiting for any more
    /// (tracking switched off meanwhile) starts nothing.
    pub fn permission_resolved(
        &mut self,
        result: Result<PermissionState, LocationError>,
        watch_id: WatchId,
    ) -> Result<Vec<LocationCommand>, LocationError> {
        if self.phase != WatchPhase::AwaitingPermission {
            debug!(trip_id = %self.trip_id, "Stale permission reply ignored");
            return Ok(Vec::new());
        }

        let state = match result {
            Ok(state) => state,
            Err(e) => {
                self.phase = WatchPhase::Idle;
                return Err(e);
            }
        };
        self.permission = state;
        if !state.is_granted() {
            self.phase = WatchPhase::Idle;
            warn!(trip_id = %self.trip_id, "Location permission denied");
            return Err(LocationError::PermissionDenied);
        }

        self.phase = WatchPhase::Watching(watch_id);
        info!(
            trip_id = %self.trip_id,
            watch_id = %watch_id,
            interval_ms = self.options.interval_ms,
            "Location watch started"
        );
        Ok(vec![
            LocationCommand::CurrentPosition,
            LocationCommand::StartWatch {
                watch_id,
                options: self.options,
            },
        ])
    }

    /// Follows a change to `trip.tracking_enabled`.
    pub fn sync_with(&mut self, trip: &Trip) -> Vec<LocationCommand> {
        if trip.id != self.trip_id {
            return Vec::new();
        }
        match (trip.tracking_enabled, self.phase) {
            (true, WatchPhase::Idle) => self.activate(trip),
            (false, _) => self.deactivate(),
            _ => Vec::new(),
        }
    }

    /// Releases the OS watch. Safe to call repeatedly.
    pub fn deactivate(&mut self) -> Vec<LocationCommand> {
        match std::mem::replace(&mut self.phase, WatchPhase::Idle) {
            WatchPhase::Watching(watch_id) => {
                info!(trip_id = %self.trip_id, watch_id = %watch_id, "Location watch stopped");
                vec![LocationCommand::ClearWatch { watch_id }]
            }
            WatchPhase::Idle | WatchPhase::AwaitingPermission => Vec::new(),
        }
    }

    /// The one-off fix taken when the watch starts.
    pub fn initial_position(&mut self, result: Result<Position, LocationError>) -> bool {
        match (self.phase, result) {
            (WatchPhase::Watching(_), Ok(position)) => self.keep_newest(position),
            (_, Err(e)) => {
                warn!(error = %e, "Initial position unavailable");
                false
            }
            _ => false,
        }
    }

    /// A fix from watch `watch_id`. Fixes from a released watch are dropped.
    /// Returns whether the live position changed.
    pub fn accept_position(
        &mut self,
        watch_id: WatchId,
        result: Result<Position, LocationError>,
    ) -> bool {
        if self.phase != WatchPhase::Watching(watch_id) {
            debug!(watch_id = %watch_id, "Fix from inactive watch dropped");
            return false;
        }
        match result {
            Ok(position) => self.keep_newest(position),
            Err(e) => {
                warn!(error = %e, "Location watch reported an error");
                false
            }
        }
    }

    fn keep_newest(&mut self, position: Position) -> bool {
        if self
            .live_position
            .is_some_and(|current| current.timestamp > position.timestamp)
        {
            return false;
        }
        self.live_position = Some(position);
        true
    }
}
