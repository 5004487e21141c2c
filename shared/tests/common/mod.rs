#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crux_core::testing::{AppTester, Update};
use crux_core::Request;
use crux_http::protocol::HttpRequest;

use shared::capabilities::{
    Clock, DirectionsReply, HttpError, LocationError, LocationOperation, LocationOutput,
    PermissionState, Position, WatchId,
};
use shared::route::RoutePurpose;
use shared::{App, Effect, Event, Model, UnixTimeMs, ViewModel};

/// 2026-10-18T00:00:00Z
pub const T0: u64 = 1_792_281_600_000;

pub struct StepClock(AtomicU64);

impl StepClock {
    pub fn at(ms: u64) -> Self {
        Self(AtomicU64::new(ms))
    }

    pub fn advance(&self, ms: u64) {
        self.0.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for StepClock {
    fn now(&self) -> UnixTimeMs {
        UnixTimeMs(self.0.load(Ordering::SeqCst))
    }
}

/// A directions body with a single LineString feature, `[lon, lat]` order.
pub fn route_body(positions: &[[f64; 2]]) -> Vec<u8> {
    serde_json::json!({
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature",
            "properties": { "summary": { "distance": 1234.5 } },
            "geometry": { "type": "LineString", "coordinates": positions }
        }]
    })
    .to_string()
    .into_bytes()
}

pub fn offline() -> DirectionsReply {
    Err(HttpError::ConnectionError {
        host: "api.openrouteservice.org".into(),
        message: "network unreachable".into(),
    })
}

pub fn position(latitude: f64, longitude: f64) -> Position {
    position_at(latitude, longitude, T0)
}

pub fn position_at(latitude: f64, longitude: f64, timestamp: u64) -> Position {
    Position {
        latitude,
        longitude,
        accuracy_m: Some(8.0),
        timestamp: UnixTimeMs(timestamp),
    }
}

/// What the phone answers to location requests.
pub struct Device {
    pub permission: PermissionState,
    pub fix: Option<Position>,
}

impl Device {
    pub fn granted() -> Self {
        Self {
            permission: PermissionState::Granted,
            fix: None,
        }
    }
}

/// The core plus a stand-in shell that executes its effects.
pub struct World {
    pub app: AppTester<App, Effect>,
    pub model: Model,
    pub clock: Arc<StepClock>,
    pub device: Device,
    pub directions: Vec<HttpRequest>,
    watches: Vec<(WatchId, Request<LocationOperation>)>,
    cleared: Vec<WatchId>,
    pub renders: usize,
}

pub fn world(device: Device) -> World {
    let clock = Arc::new(StepClock::at(T0));
    let model = Model {
        clock: clock.clone(),
        ..Model::default()
    };
    World {
        app: AppTester::default(),
        model,
        clock,
        device,
        directions: Vec::new(),
        watches: Vec::new(),
        cleared: Vec::new(),
        renders: 0,
    }
}

/// A world configured the way a shell would at launch.
pub fn world_with_config(device: Device, config_json: &str) -> World {
    let mut w = world(device);
    w.send(Event::Configure {
        config_json: config_json.to_string(),
    });
    w
}

impl World {
    pub fn send(&mut self, event: Event) {
        let update = self.app.update(event, &mut self.model);
        self.run(update);
    }

    pub fn view(&self) -> ViewModel {
        self.app.view(&self.model)
    }

    /// The shell's answer to the outstanding directions request.
    pub fn route_arrives(&mut self, purpose: RoutePurpose, reply: DirectionsReply) {
        self.send(Event::RouteFetched { purpose, reply });
    }

    /// Feeds `position` to every watch the core has not released.
    /// Returns how many watches received it.
    pub fn move_to(&mut self, position: Position) -> usize {
        let mut updates = Vec::new();
        for (watch_id, request) in &mut self.watches {
            if self.cleared.contains(watch_id) {
                continue;
            }
            let update = self
                .app
                .resolve(request, LocationOutput::Position(position))
                .expect("watch accepts fixes");
            updates.push(update);
        }
        let delivered = updates.len();
        for update in updates {
            self.run(update);
        }
        delivered
    }

    /// Delivers on one watch even after the core released it, as a slow OS might.
    pub fn deliver_late(&mut self, watch_id: WatchId, position: Position) {
        let update = self
            .watches
            .iter_mut()
            .find(|(id, _)| *id == watch_id)
            .map(|(_, request)| {
                self.app
                    .resolve(request, LocationOutput::Position(position))
                    .expect("watch accepts fixes")
            });
        if let Some(update) = update {
            self.run(update);
        }
    }

    pub fn started(&self) -> usize {
        self.watches.len()
    }

    pub fn open_watches(&self) -> usize {
        self.watches
            .iter()
            .filter(|(id, _)| !self.cleared.contains(id))
            .count()
    }

    pub fn cleared(&self) -> &[WatchId] {
        &self.cleared
    }

    fn run(&mut self, update: Update<Effect, Event>) {
        let mut queue = VecDeque::from([update]);
        while let Some(update) = queue.pop_front() {
            for event in update.events {
                queue.push_back(self.app.update(event, &mut self.model));
            }
            for effect in update.effects {
                match effect {
                    Effect::Render(_) => self.renders += 1,
                    Effect::Http(request) => self.directions.push(request.operation),
                    Effect::Location(mut request) => {
                        let output = match request.operation.clone() {
                            LocationOperation::RequestPermission => {
                                LocationOutput::Permission(self.device.permission)
                            }
                            LocationOperation::CurrentPosition => match self.device.fix {
                                Some(fix) => LocationOutput::Position(fix),
                                None => LocationOutput::Failed(LocationError::Unavailable(
                                    "no fix yet".into(),
                                )),
                            },
                            LocationOperation::WatchPosition { watch_id, .. } => {
                                self.watches.push((watch_id, request));
                                continue;
                            }
                            LocationOperation::ClearWatch { watch_id } => {
                                self.cleared.push(watch_id);
                                continue;
                            }
                        };
                        let update = self
                            .app
                            .resolve(&mut request, output)
                            .expect("location request resolves");
                        queue.push_back(update);
                    }
                }
            }
        }
    }
}
