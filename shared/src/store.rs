use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::model::{CoordinateError, GeoPoint, Trip, TripId, TripPatch, UnixTimeMs};
use crate::{AppError, ErrorKind};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("trip not found: {0}")]
    TripNotFound(TripId),

    #[error("trip already exists: {0}")]
    DuplicateTrip(TripId),
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match &e {
            StoreError::TripNotFound(id) => AppError::new(ErrorKind::NotFound, e.to_string())
                .with_context("trip_id", id.as_str()),
            StoreError::DuplicateTrip(id) => AppError::new(ErrorKind::Conflict, e.to_string())
                .with_context("trip_id", id.as_str()),
        }
    }
}

/// Destinations and form input collected before a trip is created.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DestinationBuffer {
    pub destinations: Vec<GeoPoint>,
    pub title: String,
    pub duration: String,
}

impl DestinationBuffer {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.destinations.is_empty() && self.title.is_empty() && self.duration.is_empty()
    }

    /// Trimmed title, `None` when blank.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        Some(self.title.trim()).filter(|t| !t.is_empty())
    }

    /// Trimmed duration text, `None` when blank.
    #[must_use]
    pub fn duration(&self) -> Option<&str> {
        Some(self.duration.trim()).filter(|d| !d.is_empty())
    }
}

/// In-memory trip collection plus the creation buffer.
///
/// Trips keep insertion order. Each id appears at most once.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TripStore {
    trips: Vec<Trip>,
    buffer: DestinationBuffer,
}

impl TripStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn list_trips(&self) -> &[Trip] {
        &self.trips
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.trips.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.trips.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: &TripId) -> bool {
        self.trips.iter().any(|t| &t.id == id)
    }

    pub fn get_trip(&self, id: &TripId) -> Result<&Trip, StoreError> {
        self.trips
            .iter()
            .find(|t| &t.id == id)
            .ok_or_else(|| StoreError::TripNotFound(id.clone()))
    }

    pub fn add_trip(&mut self, trip: Trip) -> Result<(), StoreError> {
        if self.contains(&trip.id) {
            return Err(StoreError::DuplicateTrip(trip.id));
        }
        debug!(trip_id = %trip.id, "Trip added");
        self.trips.push(trip);
        Ok(())
    }

    /// Applies `patch` and refreshes `updated_at`, never moving it backwards.
    pub fn update_trip(
        &mut self,
        id: &TripId,
        patch: TripPatch,
        now: UnixTimeMs,
    ) -> Result<&Trip, StoreError> {
        let trip = self
            .trips
            .iter_mut()
            .find(|t| &t.id == id)
            .ok_or_else(|| StoreError::TripNotFound(id.clone()))?;

        trip.apply(patch);
        let floor = trip.updated_at.unwrap_or(trip.created_at);
        trip.updated_at = Some(now.max(floor));

        debug!(trip_id = %id, status = %trip.status, "Trip updated");
        Ok(trip)
    }

    pub fn delete_trip(&mut self, id: &TripId) -> Result<Trip, StoreError> {
        let index = self
            .trips
            .iter()
            .position(|t| &t.id == id)
            .ok_or_else(|| StoreError::TripNotFound(id.clone()))?;
        debug!(trip_id = %id, "Trip deleted");
        Ok(self.trips.remove(index))
    }

    /// Millisecond id for `now`, bumped forward past ids already taken.
    #[must_use]
    pub fn next_free_id(&self, now: UnixTimeMs) -> TripId {
        let mut candidate = now;
        loop {
            let id = TripId::from_millis(candidate);
            if !self.contains(&id) {
                return id;
            }
            candidate = candidate.add_millis(1);
        }
    }

    #[must_use]
    pub fn buffer(&self) -> &DestinationBuffer {
        &self.buffer
    }

    pub fn stage_destination(&mut self, point: GeoPoint) -> Result<(), CoordinateError> {
        point.validate()?;
        self.buffer.destinations.push(point);
        Ok(())
    }

    pub fn set_buffer_title(&mut self, title: impl Into<String>) {
        self.buffer.title = title.into();
    }

    pub fn set_buffer_duration(&mut self, duration: impl Into<String>) {
        self.buffer.duration = duration.into();
    }

    pub fn clear_buffer(&mut self) {
        self.buffer = DestinationBuffer::default();
    }
}
