use crux_http::Http;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::config::CoreConfig;
use crate::model::GeoPoint;
use crate::{AppError, ErrorKind};

pub const MAX_URL_LENGTH: usize = 2048;
pub const MAX_RESPONSE_BODY_SIZE: usize = 20 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValidatedUrl {
    url: String,
    scheme: String,
    host: String,
}

impl ValidatedUrl {
    pub fn new(url: impl Into<String>) -> Result<Self, HttpError> {
        let url = url.into();
        let trimmed = url.trim();

        if trimmed.is_empty() {
            return Err(HttpError::InvalidUrl {
                url: String::new(),
                reason: "URL cannot be empty".to_string(),
            });
        }

        if trimmed.len() > MAX_URL_LENGTH {
            return Err(HttpError::InvalidUrl {
                url: Self::truncate_url(trimmed),
                reason: format!("URL exceeds maximum length of {MAX_URL_LENGTH} bytes"),
            });
        }

        let parsed = Url::parse(trimmed).map_err(|e| HttpError::InvalidUrl {
            url: Self::truncate_url(trimmed),
            reason: e.to_string(),
        })?;

        let scheme = parsed.scheme().to_lowercase();
        if scheme != "http" && scheme != "https" {
            return Err(HttpError::InvalidUrl {
                url: Self::truncate_url(trimmed),
                reason: format!("invalid scheme '{scheme}', only 'http' and 'https' are allowed"),
            });
        }

        let host = parsed
            .host_str()
            .ok_or_else(|| HttpError::InvalidUrl {
                url: Self::truncate_url(trimmed),
                reason: "URL must have a host".to_string(),
            })?
            .to_lowercase();

        if !parsed.username().is_empty() || parsed.password().is_some() {
            return Err(HttpError::InvalidUrl {
                url: Self::truncate_url(trimmed),
                reason: "credentials in URL are not allowed".to_string(),
            });
        }

        Ok(Self {
            url: parsed.to_string(),
            scheme,
            host,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.url
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    fn truncate_url(url: &str) -> String {
        match url.char_indices().nth(100) {
            Some((idx, _)) => format!("{}...", &url[..idx]),
            None => url.to_string(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HttpError {
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("invalid request: {reason}")]
    InvalidRequest { reason: String },

    #[error("serialization error: {message}")]
    SerializationError { message: String },

    #[error("connection failed to {host}: {message}")]
    ConnectionError { host: String, message: String },

    #[error("timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("HTTP error {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("response body too large: {size} bytes exceeds maximum of {max} bytes")]
    ResponseTooLarge { size: usize, max: usize },

    #[error("invalid response: {reason}")]
    InvalidResponse { reason: String },
}

impl HttpError {
    pub fn is_retryable(&self) -> bool {
        match self {
            HttpError::Timeout { .. } | HttpError::ConnectionError { .. } => true,
            HttpError::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl From<HttpError> for AppError {
    fn from(e: HttpError) -> Self {
        let kind = match &e {
            HttpError::InvalidUrl { .. } => ErrorKind::Configuration,
            HttpError::InvalidRequest { .. } => ErrorKind::Validation,
            HttpError::SerializationError { .. } | HttpError::InvalidResponse { .. } => {
                ErrorKind::Serialization
            }
            HttpError::Timeout { .. } => ErrorKind::Timeout,
            HttpError::ConnectionError { .. }
            | HttpError::HttpStatus { .. }
            | HttpError::ResponseTooLarge { .. } => ErrorKind::Network,
        };
        AppError::new(kind, e.to_string())
    }
}

/// Body of a directions POST. Coordinates are `[lon, lat]` pairs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectionsRequest {
    pub coordinates: Vec<[f64; 2]>,
    pub instructions: bool,
}

impl DirectionsRequest {
    #[must_use]
    pub fn from_points(points: &[GeoPoint]) -> Self {
        Self {
            coordinates: points.iter().map(GeoPoint::lon_lat).collect(),
            instructions: false,
        }
    }
}

/// Reply from the directions service as the core sees it: the raw body on
/// success, a typed error otherwise.
pub type DirectionsReply = Result<Vec<u8>, HttpError>;

/// The routing endpoint plus the key that authorizes calls to it.
pub struct DirectionsEndpoint {
    url: ValidatedUrl,
    api_key: Option<SecretString>,
}

impl std::fmt::Debug for DirectionsEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectionsEndpoint")
            .field("url", &self.url.as_str())
            .field("has_api_key", &self.api_key.is_some())
            .finish()
    }
}

impl DirectionsEndpoint {
    pub fn from_config(config: &CoreConfig) -> Result<Self, HttpError> {
        Ok(Self {
            url: ValidatedUrl::new(config.directions_url.as_str())?,
            api_key: config.directions_api_key.clone(),
        })
    }

    #[must_use]
    pub fn url(&self) -> &ValidatedUrl {
        &self.url
    }

    /// POSTs `request` and hands the checked reply to `callback`.
    pub fn send<E, F>(
        &self,
        http: &Http<E>,
        request: &DirectionsRequest,
        callback: F,
    ) -> Result<(), HttpError>
    where
        E: Send + 'static,
        F: FnOnce(DirectionsReply) -> E + Send + 'static,
    {
        let body = serde_json::to_vec(request).map_err(|e| HttpError::SerializationError {
            message: e.to_string(),
        })?;

        let mut builder = http
            .post(self.url.as_str())
            .header("Content-Type", "application/json")
            .body(body);

        match &self.api_key {
            Some(key) => builder = builder.header("Authorization", key.expose_secret().as_str()),
            None => warn!("Directions API key missing, request will likely be rejected"),
        }

        let host = self.url.host().to_string();
        debug!(host = %host, points = request.coordinates.len(), "Requesting directions");
        builder.send(move |result| callback(directions_reply(&host, result)));
        Ok(())
    }
}

/// Converts a crux_http reply. The body size is checked before anyone parses it.
pub fn directions_reply(
    host: &str,
    result: crux_http::Result<crux_http::Response<Vec<u8>>>,
) -> DirectionsReply {
    let mut response = result.map_err(|e| HttpError::ConnectionError {
        host: host.to_string(),
        message: e.to_string(),
    })?;

    let status = response.status();
    if !status.is_success() {
        let code: u16 = status.into();
        warn!(status = code, "Directions request rejected");
        return Err(HttpError::HttpStatus {
            status: code,
            message: status.canonical_reason().to_string(),
        });
    }

    let body = response.take_body().unwrap_or_default();
    checked_body(body, MAX_RESPONSE_BODY_SIZE)
}

fn checked_body(body: Vec<u8>, max: usize) -> DirectionsReply {
    if body.len() > max {
        return Err(HttpError::ResponseTooLarge {
            size: body.len(),
            max,
        });
    }
    if body.is_empty() {
        return Err(HttpError::InvalidResponse {
            reason: "empty body".to_string(),
        });
    }
    Ok(body)
}
