// src/error.rs
use std::fmt;

use thiserror::Error;

/// Raised while building a [`GeoQueryConfig`](crate::GeoQueryConfig). These are fatal:
/// a behavior with an invalid configuration is never constructed.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("the geolocatable behavior requires the \"fields\" option to be set")]
    MissingFields,

    #[error("invalid geocoder base URL '{url}': {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("geocoder base URL '{0}' cannot carry query parameters")]
    CannotBeABase(String),

    #[error("invalid SQL identifier for {context}: '{value}'")]
    InvalidIdentifier { context: &'static str, value: String },

    #[error("invalid precision for {context}: length {length}, scale {scale}")]
    InvalidPrecision {
        context: &'static str,
        length: u32,
        scale: u32,
    },

    #[error("invalid timeout: {0}")]
    InvalidTimeout(String),

    #[error("JSON configuration error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Returned by [`GeoPoint::try_new`](crate::GeoPoint::try_new) for coordinates off the globe.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("coordinates out of range: latitude {latitude} must be within [-90, 90], longitude {longitude} within [-180, 180]")]
pub struct OutOfRangeError {
    pub latitude: f64,
    pub longitude: f64,
}

/// Coarse classification of a [`GeocodeError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeocodeErrorKind {
    NetworkFailure,
    InvalidResponse,
    Cancelled,
}

impl fmt::Display for GeocodeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GeocodeErrorKind::NetworkFailure => "network failure",
            GeocodeErrorKind::InvalidResponse => "invalid response",
            GeocodeErrorKind::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// Failure of a single geocoding round trip.
///
/// A geocoder that answers with a well-formed "no result" line is *not* an error;
/// see [`GeocodeClient::resolve`](crate::GeocodeClient::resolve).
#[derive(Error, Debug)]
pub enum GeocodeError {
    /// Connect, timeout or transport error from the HTTP stack.
    #[error("geocoding request failed: {0}")]
    NetworkFailure(#[from] reqwest::Error),

    #[error("invalid geocoder response: {0}")]
    InvalidResponse(String),

    #[error("geocoding request was cancelled")]
    Cancelled,
}

impl GeocodeError {
    pub fn kind(&self) -> GeocodeErrorKind {
        match self {
            GeocodeError::NetworkFailure(_) => GeocodeErrorKind::NetworkFailure,
            GeocodeError::InvalidResponse(_) => GeocodeErrorKind::InvalidResponse,
            GeocodeError::Cancelled => GeocodeErrorKind::Cancelled,
        }
    }

    /// `true` when the request hit the configured timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, GeocodeError::NetworkFailure(e) if e.is_timeout())
    }
}

/// Umbrella error for callers that drive configuration and geocoding through one path.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Geocode(#[from] GeocodeError),
}
