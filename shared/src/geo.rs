use serde::{Deserialize, Serialize};

use crate::model::{GeoPoint, RoutePoint};
use crate::{DEFAULT_AVERAGE_SPEED_KMH, EARTH_RADIUS_KM, TRAVEL_HOURS_PER_DAY};

#[must_use]
pub fn haversine_km(a: RoutePoint, b: RoutePoint) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let delta_lat = (b.latitude - a.latitude).to_radians();
    let delta_lon = (b.longitude - a.longitude).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    let h = h.clamp(0.0, 1.0);

    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

/// Sum of haversine legs over consecutive points. Zero for fewer than two.
#[must_use]
pub fn total_distance(points: &[GeoPoint]) -> f64 {
    points
        .windows(2)
        .map(|pair| haversine_km(pair[0].route_point(), pair[1].route_point()))
        .sum()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedProfile {
    pub average_speed_kmh: f64,
    pub hours_per_day: f64,
    pub min_days: u32,
}

impl Default for SpeedProfile {
    fn default() -> Self {
        Self {
            average_speed_kmh: DEFAULT_AVERAGE_SPEED_KMH,
            hours_per_day: TRAVEL_HOURS_PER_DAY,
            min_days: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationEstimate {
    pub days: u32,
    pub label: String,
}

impl DurationEstimate {
    #[must_use]
    pub fn from_days(days: u32) -> Self {
        let label = if days == 1 {
            "1 day".to_string()
        } else {
            format!("{days} days")
        };
        Self { days, label }
    }
}

#[must_use]
pub fn estimate_duration(distance_km: f64, profile: &SpeedProfile) -> DurationEstimate {
    let per_day_km = profile.average_speed_kmh * profile.hours_per_day;
    let raw = if distance_km.is_finite() && distance_km > 0.0 && per_day_km > 0.0 {
        (distance_km / per_day_km).ceil()
    } else {
        0.0
    };

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let days = if raw >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        raw as u32
    };

    DurationEstimate::from_days(days.max(profile.min_days))
}

/// Stable hex digest of an ordered point list, used to spot resubmission
/// of the same staged destinations.
#[must_use]
pub fn fingerprint(points: &[GeoPoint]) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&(points.len() as u64).to_le_bytes());
    for point in points {
        hasher.update(&point.latitude.to_bits().to_le_bytes());
        hasher.update(&point.longitude.to_bits().to_le_bytes());
        let label = point.label.as_deref().unwrap_or_default();
        hasher.update(&(label.len() as u64).to_le_bytes());
        hasher.update(label.as_bytes());
    }
    hasher.finalize().to_hex().to_string()
}
