use crux_http::Http;
use geojson::{FeatureCollection, Value};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::capabilities::{DirectionsEndpoint, DirectionsReply, DirectionsRequest, HttpError};
use crate::config::CoreConfig;
use crate::model::{GeoPoint, RoutePoint};
use crate::{AppError, ErrorKind, MIN_ROUTE_POINTS};

/// What a directions request was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoutePurpose {
    TripCreation,
    ExampleSeed,
}

/// Why the routed polyline was replaced by straight lines.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RouteFetchFailure {
    #[error("directions request failed: {0}")]
    Transport(#[from] HttpError),

    #[error("directions response is not a FeatureCollection: {0}")]
    MalformedBody(String),

    #[error("directions response contains no features")]
    NoFeatures,

    #[error("first feature has no LineString geometry")]
    MissingLineString,

    #[error("route position {index} has fewer than two components")]
    ShortPosition { index: usize },
}

impl RouteFetchFailure {
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        "Real route could not be fetched. Using straight-line path instead."
    }
}

impl From<RouteFetchFailure> for AppError {
    fn from(e: RouteFetchFailure) -> Self {
        AppError::new(ErrorKind::RouteUnavailable, e.user_message()).with_internal(e.to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RouteResolution {
    pub points: Vec<RoutePoint>,
    pub geojson: Option<FeatureCollection>,
    pub failure: Option<RouteFetchFailure>,
}

impl RouteResolution {
    #[must_use]
    pub fn empty() -> Self {
        Self {
            points: Vec::new(),
            geojson: None,
            failure: None,
        }
    }
}

#[must_use]
pub fn straight_line(points: &[GeoPoint]) -> Vec<RoutePoint> {
    points.iter().map(GeoPoint::route_point).collect()
}

/// Pulls the `(lat, lon)` polyline out of the first feature's LineString.
pub fn parse_route(body: &[u8]) -> Result<(Vec<RoutePoint>, FeatureCollection), RouteFetchFailure> {
    let collection: FeatureCollection = serde_json::from_slice(body)
        .map_err(|e| RouteFetchFailure::MalformedBody(e.to_string()))?;

    let first = collection
        .features
        .first()
        .ok_or(RouteFetchFailure::NoFeatures)?;

    let Some(Value::LineString(positions)) = first.geometry.as_ref().map(|g| &g.value) else {
        return Err(RouteFetchFailure::MissingLineString);
    };

    let points = positions
        .iter()
        .enumerate()
        .map(|(index, position)| match position.as_slice() {
            [lon, lat, ..] => Ok(RoutePoint::new(*lat, *lon)),
            _ => Err(RouteFetchFailure::ShortPosition { index }),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok((points, collection))
}

/// Sends the directions call for a set of destinations.
#[derive(Debug)]
pub struct RouteResolver {
    endpoint: DirectionsEndpoint,
}

impl RouteResolver {
    pub fn from_config(config: &CoreConfig) -> Result<Self, HttpError> {
        Ok(Self {
            endpoint: DirectionsEndpoint::from_config(config)?,
        })
    }

    /// Issues the request; `callback` later receives the reply. Fewer than
    /// two points is a caller error since there is nothing to route.
    #[instrument(skip_all, fields(points = points.len()))]
    pub fn request_route<E, F>(
        &self,
        http: &Http<E>,
        points: &[GeoPoint],
        callback: F,
    ) -> Result<(), HttpError>
    where
        E: Send + 'static,
        F: FnOnce(DirectionsReply) -> E + Send + 'static,
    {
        if points.len() < MIN_ROUTE_POINTS {
            return Err(HttpError::InvalidRequest {
                reason: format!("at least {MIN_ROUTE_POINTS} points are needed for a route"),
            });
        }
        let request = DirectionsRequest::from_points(points);
        self.endpoint.send(http, &request, callback)
    }
}

/// Turns a directions reply into a drawable polyline. Never fails: any
/// routing problem yields the destinations themselves plus the recorded failure.
#[instrument(skip_all, fields(points = points.len()))]
pub fn resolve_route(points: &[GeoPoint], reply: DirectionsReply) -> RouteResolution {
    if points.len() < MIN_ROUTE_POINTS {
        debug!("Not enough points to route");
        return RouteResolution::empty();
    }

    let outcome = match reply {
        Ok(body) => parse_route(&body),
        Err(e) => Err(RouteFetchFailure::from(e)),
    };

    match outcome {
        Ok((route, collection)) => {
            info!(route_points = route.len(), "Route resolved");
            RouteResolution {
                points: route,
                geojson: Some(collection),
                failure: None,
            }
        }
        Err(failure) => {
            warn!(error = %failure, "Route fetch failed, falling back to straight lines");
            RouteResolution {
                points: straight_line(points),
                geojson: None,
                failure: Some(failure),
            }
        }
    }
}
