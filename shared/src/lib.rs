#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::must_use_candidate)]

pub mod app;
pub mod capabilities;
pub mod config;
pub mod event;
pub mod geo;
pub mod lifecycle;
pub mod model;
pub mod route;
pub mod store;
pub mod tracking;

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub use app::{App, Model, ViewModel};
pub use capabilities::{Capabilities, Effect};
pub use config::CoreConfig;
pub use event::Event;
pub use model::{GeoPoint, RoutePoint, Trip, TripDuration, TripId, TripPatch, TripStatus, UnixTimeMs};

pub const EARTH_RADIUS_KM: f64 = 6371.0;
pub const DEFAULT_AVERAGE_SPEED_KMH: f64 = 60.0;
pub const TRAVEL_HOURS_PER_DAY: f64 = 8.0;
pub const MIN_ROUTE_POINTS: usize = 2;
pub const DEFAULT_DIRECTIONS_URL: &str =
    "https://api.openrouteservice.org/v2/directions/driving-car/geojson";
pub const DEFAULT_WATCH_INTERVAL_MS: u64 = 5000;
pub const DEFAULT_WATCH_DISTANCE_M: f64 = 10.0;
pub const MS_PER_DAY: u64 = 24 * 60 * 60 * 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorSeverity {
    Transient,
    Permanent,
    Fatal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Network,
    Timeout,
    Validation,
    NotFound,
    Conflict,
    RouteUnavailable,
    Location,
    LocationPermissionDenied,
    Configuration,
    Serialization,
    InvalidState,
    Internal,
    Unknown,
}

impl ErrorKind {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Network => "NETWORK_ERROR",
            Self::Timeout => "TIMEOUT",
            Self::Validation => "VALIDATION_ERROR",
            Self::NotFound => "NOT_FOUND",
            Self::Conflict => "CONFLICT",
            Self::RouteUnavailable => "ROUTE_UNAVAILABLE",
            Self::Location => "LOCATION_ERROR",
            Self::LocationPermissionDenied => "LOCATION_PERMISSION_DENIED",
            Self::Configuration => "CONFIGURATION_ERROR",
            Self::Serialization => "SERIALIZATION_ERROR",
            Self::InvalidState => "INVALID_STATE",
            Self::Internal => "INTERNAL_ERROR",
            Self::Unknown => "UNKNOWN_ERROR",
        }
    }

    #[must_use]
    pub const fn default_severity(self) -> ErrorSeverity {
        match self {
            Self::Network | Self::Timeout | Self::RouteUnavailable | Self::Location => {
                ErrorSeverity::Transient
            }

            Self::Configuration | Self::Serialization | Self::Internal => ErrorSeverity::Fatal,

            Self::Validation
            | Self::NotFound
            | Self::Conflict
            | Self::LocationPermissionDenied
            | Self::InvalidState
            | Self::Unknown => ErrorSeverity::Permanent,
        }
    }

    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(
            self,
            Self::Network | Self::Timeout | Self::RouteUnavailable | Self::Location
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppError {
    pub kind: ErrorKind,
    pub severity: ErrorSeverity,
    pub message: String,
    pub internal_message: Option<String>,
    pub context: HashMap<String, String>,
}

impl AppError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: kind.default_severity(),
            message: message.into(),
            internal_message: None,
            context: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_internal(mut self, internal: impl Into<String>) -> Self {
        self.internal_message = Some(internal.into());
        self
    }

    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.kind.code()
    }

    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.kind.is_retryable() && !matches!(self.severity, ErrorSeverity::Fatal)
    }

    #[must_use]
    pub fn user_facing_message(&self) -> String {
        match self.kind {
            ErrorKind::Network => {
                "Unable to connect. Please check your internet connection and try again.".into()
            }
            ErrorKind::Timeout => "The request timed out. Please try again.".into(),
            ErrorKind::Validation | ErrorKind::InvalidState => self.message.clone(),
            ErrorKind::NotFound => "Trip not found.".into(),
            ErrorKind::Conflict => "A trip with this identifier already exists.".into(),
            ErrorKind::RouteUnavailable => {
                "Real route could not be fetched. Using straight-line path instead.".into()
            }
            ErrorKind::Location => {
                "Unable to determine your location. Please check your GPS settings.".into()
            }
            ErrorKind::LocationPermissionDenied => {
                "Permission to access location was denied".into()
            }
            ErrorKind::Configuration => {
                "The app is misconfigured. Please contact support.".into()
            }
            ErrorKind::Serialization => {
                "A data error occurred. Please contact support if this persists.".into()
            }
            ErrorKind::Internal | ErrorKind::Unknown => {
                "An unexpected error occurred. Please try again or contact support.".into()
            }
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code(), self.message)?;
        if let Some(internal) = &self.internal_message {
            write!(f, " (internal: {internal})")?;
        }
        Ok(())
    }
}

impl std::error::Error for AppError {}

#[must_use]
pub fn get_current_time_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

#[must_use]
pub fn format_distance(km: f64) -> String {
    if !km.is_finite() || km < 0.0 {
        return "Unknown".to_string();
    }

    if km < 1.0 {
        format!("{:.0} m", km * 1000.0)
    } else if km < 100.0 {
        format!("{km:.1} km")
    } else {
        format!("{:.0} km", km.round())
    }
}

#[must_use]
pub fn ordinal_suffix(day: u32) -> &'static str {
    if (4..=20).contains(&day) {
        return "th";
    }
    match day % 10 {
        1 => "st",
        2 => "nd",
        3 => "rd",
        _ => "th",
    }
}

/// Renders a timestamp as `"18th October 2026"` (UTC).
#[must_use]
pub fn format_date_with_suffix(timestamp: Option<UnixTimeMs>) -> String {
    let Some(ts) = timestamp else {
        return "Ongoing".to_string();
    };

    let Some(date) = i64::try_from(ts.as_millis())
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
    else {
        return "Unknown".to_string();
    };

    let day = date.day();
    format!("{day}{} {}", ordinal_suffix(day), date.format("%B %Y"))
}

#[cfg(test)]
mod tests {
    use super::*;

    mod error_tests {
        use super::*;

        #[test]
        fn test_error_codes() {
            assert_eq!(ErrorKind::NotFound.code(), "NOT_FOUND");
            assert_eq!(
                ErrorKind::LocationPermissionDenied.code(),
                "LOCATION_PERMISSION_DENIED"
            );
        }

        #[test]
        fn test_route_unavailable_is_transient() {
            let err = AppError::new(ErrorKind::RouteUnavailable, "boom");
            assert_eq!(err.severity, ErrorSeverity::Transient);
            assert!(err.is_retryable());
            assert!(err.user_facing_message().contains("straight-line"));
        }

        #[test]
        fn test_display_includes_internal() {
            let err = AppError::new(ErrorKind::Internal, "failed").with_internal("detail");
            assert_eq!(err.to_string(), "[INTERNAL_ERROR] failed (internal: detail)");
        }

        #[test]
        fn test_context_is_recorded() {
            let err = AppError::new(ErrorKind::NotFound, "missing").with_context("trip_id", "42");
            assert_eq!(err.context.get("trip_id").map(String::as_str), Some("42"));
        }
    }

    mod format_tests {
        use super::*;

        #[test]
        fn test_format_distance_meters() {
            assert_eq!(format_distance(0.0), "0 m");
            assert_eq!(format_distance(0.85), "850 m");
        }

        #[test]
        fn test_format_distance_kilometers() {
            assert_eq!(format_distance(1.0), "1.0 km");
            assert_eq!(format_distance(12.44), "12.4 km");
            assert_eq!(format_distance(1165.2), "1165 km");
        }

        #[test]
        fn test_format_distance_invalid() {
            assert_eq!(format_distance(f64::NAN), "Unknown");
            assert_eq!(format_distance(-1.0), "Unknown");
        }

        #[test]
        fn test_ordinal_suffix() {
            assert_eq!(ordinal_suffix(1), "st");
            assert_eq!(ordinal_suffix(2), "nd");
            assert_eq!(ordinal_suffix(3), "rd");
            assert_eq!(ordinal_suffix(4), "th");
            assert_eq!(ordinal_suffix(11), "th");
            assert_eq!(ordinal_suffix(12), "th");
            assert_eq!(ordinal_suffix(13), "th");
            assert_eq!(ordinal_suffix(21), "st");
            assert_eq!(ordinal_suffix(22), "nd");
            assert_eq!(ordinal_suffix(31), "st");
        }

        #[test]
        fn test_format_date_with_suffix() {
            // 2026-10-18T00:00:00Z
            let ts = UnixTimeMs(1_792_281_600_000);
            assert_eq!(format_date_with_suffix(Some(ts)), "18th October 2026");

            // 2024-03-01T12:00:00Z
            let ts = UnixTimeMs(1_709_294_400_000);
            assert_eq!(format_date_with_suffix(Some(ts)), "1st March 2024");
        }

        #[test]
        fn test_format_date_missing() {
            assert_eq!(format_date_with_suffix(None), "Ongoing");
        }
    }
}
