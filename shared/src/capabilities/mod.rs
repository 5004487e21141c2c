mod http;
mod location;

pub use self::http::{
    directions_reply, DirectionsEndpoint, DirectionsReply, DirectionsRequest, HttpError,
    ValidatedUrl, MAX_RESPONSE_BODY_SIZE,
};
pub use self::location::{
    Location, LocationAccuracy, LocationError, LocationOperation, LocationOutput, PermissionState,
    Position, WatchId, WatchOptions,
};

pub use crux_core::render::Render;
pub use crux_http::Http;

use crate::app::App;
use crate::event::Event;
use crate::model::UnixTimeMs;

/// Wall clock the core stamps trips and toasts with.
pub trait Clock: Send + Sync {
    fn now(&self) -> UnixTimeMs;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> UnixTimeMs {
        UnixTimeMs::now()
    }
}

#[derive(crux_core::macros::Effect)]
pub struct Capabilities {
    pub render: Render<Event>,
    pub http: Http<Event>,
    pub location: Location<Event>,
}

#[cfg(any(test, feature = "test-utils"))]
pub mod testing {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    /// Clock that only moves when told to.
    #[derive(Debug, Default)]
    pub struct ManualClock(AtomicU64);

    impl ManualClock {
        pub fn new(start_ms: u64) -> Self {
            Self(AtomicU64::new(start_ms))
        }

        pub fn advance(&self, ms: u64) {
            self.0.fetch_add(ms, Ordering::SeqCst);
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> UnixTimeMs {
            UnixTimeMs(self.0.load(Ordering::SeqCst))
        }
    }

    /// A FeatureCollection whose first feature is a LineString over `coords` (`[lon, lat]`).
    pub fn line_string_body(coords: &[[f64; 2]]) -> Vec<u8> {
        serde_json::json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": {},
                "geometry": { "type": "LineString", "coordinates": coords }
            }]
        })
        .to_string()
        .into_bytes()
    }
}
