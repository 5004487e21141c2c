use geojson::FeatureCollection;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{get_current_time_ms, AppError, ErrorKind, MIN_ROUTE_POINTS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnixTimeMs(pub u64);

impl UnixTimeMs {
    #[must_use]
    pub fn now() -> Self {
        Self(get_current_time_ms())
    }

    #[must_use]
    pub const fn as_millis(self) -> u64 {
        self.0
    }

    #[must_use]
    pub fn saturating_sub_millis(self, ms: u64) -> Self {
        Self(self.0.saturating_sub(ms))
    }

    #[must_use]
    pub fn add_millis(self, ms: u64) -> Self {
        Self(self.0.saturating_add(ms))
    }
}

impl std::fmt::Display for UnixTimeMs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TripId(String);

impl TripId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn from_millis(ts: UnixTimeMs) -> Self {
        Self(ts.as_millis().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TripId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TripId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum CoordinateError {
    #[error("Coordinate contains non-finite value")]
    NonFinite,
    #[error("Latitude {0} out of range [-90, 90]")]
    LatitudeOutOfRange(f64),
    #[error("Longitude {0} out of range [-180, 180]")]
    LongitudeOutOfRange(f64),
    #[error("Coordinate could not be parsed")]
    Unparseable,
}

impl From<CoordinateError> for AppError {
    fn from(e: CoordinateError) -> Self {
        AppError::new(ErrorKind::Validation, e.to_string())
    }
}

fn validate_lat_lon(latitude: f64, longitude: f64) -> Result<(), CoordinateError> {
    if !latitude.is_finite() || !longitude.is_finite() {
        return Err(CoordinateError::NonFinite);
    }
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(CoordinateError::LatitudeOutOfRange(latitude));
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(CoordinateError::LongitudeOutOfRange(longitude));
    }
    Ok(())
}

/// A destination chosen by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordinateError> {
        validate_lat_lon(latitude, longitude)?;
        Ok(Self {
            latitude,
            longitude,
            label: None,
        })
    }

    pub fn labelled(
        latitude: f64,
        longitude: f64,
        label: impl Into<String>,
    ) -> Result<Self, CoordinateError> {
        let mut point = Self::new(latitude, longitude)?;
        point.label = Some(label.into());
        Ok(point)
    }

    pub fn validate(&self) -> Result<(), CoordinateError> {
        validate_lat_lon(self.latitude, self.longitude)
    }

    #[must_use]
    pub fn route_point(&self) -> RoutePoint {
        RoutePoint {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }

    /// `[lon, lat]`, the order directions services expect.
    #[must_use]
    pub fn lon_lat(&self) -> [f64; 2] {
        [self.longitude, self.latitude]
    }
}

/// A place-search result; coordinates arrive as decimal strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceCandidate {
    pub lat: String,
    pub lon: String,
    pub display_name: String,
}

impl TryFrom<PlaceCandidate> for GeoPoint {
    type Error = CoordinateError;

    fn try_from(candidate: PlaceCandidate) -> Result<Self, Self::Error> {
        let latitude: f64 = candidate
            .lat
            .trim()
            .parse()
            .map_err(|_| CoordinateError::Unparseable)?;
        let longitude: f64 = candidate
            .lon
            .trim()
            .parse()
            .map_err(|_| CoordinateError::Unparseable)?;

        let label = candidate.display_name.trim();
        let mut point = Self::new(latitude, longitude)?;
        if !label.is_empty() {
            point.label = Some(label.to_string());
        }
        Ok(point)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoutePoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl RoutePoint {
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl From<&GeoPoint> for RoutePoint {
    fn from(point: &GeoPoint) -> Self {
        point.route_point()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TripStatus {
    #[default]
    Planned,
    Ongoing,
    Paused,
    Completed,
    Cancelled,
}

impl TripStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Planned => "planned",
            Self::Ongoing => "ongoing",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Planned => "Planned",
            Self::Ongoing => "Ongoing",
            Self::Paused => "Paused",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
        }
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Start/resume applies to every non-terminal status.
    pub fn validate_start(self) -> Result<(), TransitionError> {
        if self.is_terminal() {
            return Err(TransitionError::FromTerminalStatus { status: self });
        }
        Ok(())
    }
}

impl std::fmt::Display for TripStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Cannot start a trip that is already {status}")]
    FromTerminalStatus { status: TripStatus },
}

impl From<TransitionError> for AppError {
    fn from(e: TransitionError) -> Self {
        AppError::new(ErrorKind::InvalidState, e.to_string())
    }
}

/// Declared or estimated trip length.
///
/// Parsing takes the leading integer of the text, so `"6"` and `"6 days"`
/// both become `Days(6)`. Anything else is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TripDuration {
    Days(u32),
    Unparsed(String),
}

impl TripDuration {
    #[must_use]
    pub fn parse(text: &str) -> Self {
        match leading_integer(text) {
            Some(days) => Self::Days(days),
            None => Self::Unparsed(text.to_string()),
        }
    }

    #[must_use]
    pub const fn days(&self) -> Option<u32> {
        match self {
            Self::Days(days) => Some(*days),
            Self::Unparsed(_) => None,
        }
    }

    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Days(1) => "1 day".to_string(),
            Self::Days(days) => format!("{days} days"),
            Self::Unparsed(text) => text.clone(),
        }
    }
}

impl std::fmt::Display for TripDuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.label())
    }
}

fn leading_integer(text: &str) -> Option<u32> {
    let trimmed = text.trim_start();
    let unsigned = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let digits: &str = unsigned
        .find(|c: char| !c.is_ascii_digit())
        .map_or(unsigned, |end| &unsigned[..end]);

    if digits.is_empty() {
        return None;
    }
    // All ASCII digits, so the only parse failure is overflow.
    Some(digits.parse().unwrap_or(u32::MAX))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    pub id: TripId,
    pub title: String,
    pub duration: TripDuration,
    pub locations: Vec<GeoPoint>,
    pub route_coords: Vec<RoutePoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route_geo_json: Option<FeatureCollection>,
    pub tracking_enabled: bool,
    pub status: TripStatus,
    pub created_at: UnixTimeMs,
    #[serde(default)]
    pub started_at: Option<UnixTimeMs>,
    #[serde(default)]
    pub completed_at: Option<UnixTimeMs>,
    #[serde(default)]
    pub updated_at: Option<UnixTimeMs>,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default)]
    pub emergency_alerts: String,
}

impl Trip {
    #[must_use]
    pub fn placeholder_title(created_at: UnixTimeMs) -> String {
        format!("Trip {}", created_at.as_millis())
    }

    #[must_use]
    pub fn has_drawable_route(&self) -> bool {
        self.route_coords.len() >= MIN_ROUTE_POINTS
    }

    /// Applies every field present in `patch`; `id` and `created_at` never change.
    pub fn apply(&mut self, patch: TripPatch) {
        let TripPatch {
            title,
            duration,
            route_coords,
            route_geo_json,
            tracking_enabled,
            status,
            started_at,
            completed_at,
            is_favorite,
            emergency_alerts,
        } = patch;

        if let Some(title) = title {
            self.title = title;
        }
        if let Some(duration) = duration {
            self.duration = duration;
        }
        if let Some(route_coords) = route_coords {
            self.route_coords = route_coords;
        }
        if let Some(route_geo_json) = route_geo_json {
            self.route_geo_json = route_geo_json;
        }
        if let Some(tracking_enabled) = tracking_enabled {
            self.tracking_enabled = tracking_enabled;
        }
        if let Some(status) = status {
            self.status = status;
        }
        if let Some(started_at) = started_at {
            self.started_at = Some(started_at);
        }
        if let Some(completed_at) = completed_at {
            self.completed_at = Some(completed_at);
        }
        if let Some(is_favorite) = is_favorite {
            self.is_favorite = is_favorite;
        }
        if let Some(emergency_alerts) = emergency_alerts {
            self.emergency_alerts = emergency_alerts;
        }
    }
}

/// Partial update for [`Trip`]. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TripPatch {
    pub title: Option<String>,
    pub duration: Option<TripDuration>,
    pub route_coords: Option<Vec<RoutePoint>>,
    pub route_geo_json: Option<Option<FeatureCollection>>,
    pub tracking_enabled: Option<bool>,
    pub status: Option<TripStatus>,
    pub started_at: Option<UnixTimeMs>,
    pub completed_at: Option<UnixTimeMs>,
    pub is_favorite: Option<bool>,
    pub emergency_alerts: Option<String>,
}

impl TripPatch {
    #[must_use]
    pub fn status(status: TripStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn tracking(enabled: bool) -> Self {
        Self {
            tracking_enabled: Some(enabled),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
