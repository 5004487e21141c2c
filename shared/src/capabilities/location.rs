use crux_core::capability::{Capability, CapabilityContext, Operation};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::UnixTimeMs;
use crate::{AppError, ErrorKind, DEFAULT_WATCH_DISTANCE_M, DEFAULT_WATCH_INTERVAL_MS};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub accuracy_m: Option<f64>,
    pub timestamp: UnixTimeMs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PermissionState {
    Granted,
    Denied,
    #[default]
    Undetermined,
}

impl PermissionState {
    #[must_use]
    pub const fn is_granted(self) -> bool {
        matches!(self, Self::Granted)
    }
}

/// Fix quality the shell should ask the OS for. `Low` and `Balanced` trade
/// precision for battery and are chosen through `CoreConfig::watch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationAccuracy {
    Low,
    Balanced,
    #[default]
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchOptions {
    pub accuracy: LocationAccuracy,
    pub interval_ms: u64,
    pub distance_m: f64,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            accuracy: LocationAccuracy::High,
            interval_ms: DEFAULT_WATCH_INTERVAL_MS,
            distance_m: DEFAULT_WATCH_DISTANCE_M,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocationError {
    #[error("Permission to access location was denied")]
    PermissionDenied,

    #[error("location unavailable: {0}")]
    Unavailable(String),

    #[error("failed to start location watch: {0}")]
    WatchFailed(String),
}

impl From<LocationError> for AppError {
    fn from(e: LocationError) -> Self {
        let kind = match e {
            LocationError::PermissionDenied => ErrorKind::LocationPermissionDenied,
            LocationError::Unavailable(_) | LocationError::WatchFailed(_) => ErrorKind::Location,
        };
        AppError::new(kind, e.to_string())
    }
}

/// Core-assigned id of an OS position watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WatchId(pub u64);

impl std::fmt::Display for WatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "watch-{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LocationOperation {
    RequestPermission,
    CurrentPosition,
    /// The shell answers once per fix until told to clear the watch.
    WatchPosition {
        watch_id: WatchId,
        options: WatchOptions,
    },
    ClearWatch {
        watch_id: WatchId,
    },
}

impl Operation for LocationOperation {
    type Output = LocationOutput;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LocationOutput {
    Permission(PermissionState),
    Position(Position),
    Failed(LocationError),
    Cleared,
}

impl LocationOutput {
    pub fn into_permission(self) -> Result<PermissionState, LocationError> {
        match self {
            Self::Permission(state) => Ok(state),
            Self::Failed(e) => Err(e),
            other => Err(LocationError::Unavailable(format!(
                "unexpected reply to permission request: {other:?}"
            ))),
        }
    }

    pub fn into_position(self) -> Result<Position, LocationError> {
        match self {
            Self::Position(position) => Ok(position),
            Self::Failed(e) => Err(e),
            other => Err(LocationError::Unavailable(format!(
                "unexpected reply to position request: {other:?}"
            ))),
        }
    }
}

#[derive(Clone)]
pub struct Location<E> {
    context: CapabilityContext<LocationOperation, E>,
}

impl<Ev> Capability<Ev> for Location<Ev> {
    type Operation = LocationOperation;
    type MappedSelf<MappedEv> = Location<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        Location::new(self.context.map_event(f))
    }
}

impl<E> Location<E>
where
    E: 'static,
{
    pub fn new(context: CapabilityContext<LocationOperation, E>) -> Self {
        Self { context }
    }

    pub fn request_permission<F>(&self, callback: F)
    where
        F: FnOnce(Result<PermissionState, LocationError>) -> E + Send + 'static,
    {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let output = ctx
                .request_from_shell(LocationOperation::RequestPermission)
                .await;
            ctx.update_app(callback(output.into_permission()));
        });
    }

    pub fn current_position<F>(&self, callback: F)
    where
        F: FnOnce(Result<Position, LocationError>) -> E + Send + 'static,
    {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let output = ctx
                .request_from_shell(LocationOperation::CurrentPosition)
                .await;
            ctx.update_app(callback(output.into_position()));
        });
    }

    /// Every fix the shell delivers becomes one event. Nothing is queued on
    /// the core side, so the model only ever sees the newest position.
    pub fn watch_position<F>(&self, watch_id: WatchId, options: WatchOptions, callback: F)
    where
        F: Fn(Result<Position, LocationError>) -> E + Send + 'static,
    {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let mut stream =
                ctx.stream_from_shell(LocationOperation::WatchPosition { watch_id, options });
            while let Some(output) = stream.next().await {
                ctx.update_app(callback(output.into_position()));
            }
        });
    }

    pub fn clear_watch(&self, watch_id: WatchId) {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            ctx.notify_shell(LocationOperation::ClearWatch { watch_id })
                .await;
        });
    }
}
