// src/client.rs

use std::future::Future;

use reqwest::Client;
use url::Url;

use crate::config::GeoQueryConfig;
use crate::error::GeocodeError;
use crate::geopoint::GeoPoint;
use crate::requests::GeocodeResponse;

/// Resolves addresses to coordinates through an HTTP geocoder answering in CSV.
///
/// The client holds no mutable state; clones share the underlying connection pool
/// and may be used from several tasks at once. Every request is bounded by the
/// configured timeout. Nothing is cached and nothing is retried.
///
/// ```rust,no_run
/// use geolocatable::{GeoQueryConfig, GeocodeClient};
/// # use geolocatable::Error;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Error> {
/// let config = GeoQueryConfig::new(["street", "city", "state"])?
///     .with_base_url("http://localhost:8080/maps/geo")?;
/// let client = GeocodeClient::new(&config)?;
///
/// let query = GeocodeClient::build_query([Some("Boston"), None, Some("MA")]);
/// let url = client.request_url(&query);
/// if let Some(point) = client.resolve(&url).await? {
///     println!("{} {}", point.latitude, point.longitude);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct GeocodeClient {
    base_url: Url,
    validate_ranges: bool,
    http_client: Client,
}

impl GeocodeClient {
    /// Creates a client for the endpoint, timeout and range policy of `config`.
    pub fn new(config: &GeoQueryConfig) -> Result<Self, GeocodeError> {
        let http_client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(GeocodeError::NetworkFailure)?;

        log::debug!(
            "GeocodeClient initialized with base_url: {}, timeout: {:?}",
            config.base_url(),
            config.timeout()
        );

        Ok(GeocodeClient {
            base_url: config.base_url().clone(),
            validate_ranges: config.validates_ranges(),
            http_client,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Joins the non-empty values with `", "`, keeping their order. Absent and blank
    /// values are dropped rather than replaced by placeholders.
    pub fn build_query<I, S>(values: I) -> String
    where
        I: IntoIterator<Item = Option<S>>,
        S: AsRef<str>,
    {
        let parts: Vec<String> = values
            .into_iter()
            .flatten()
            .filter(|v| !v.as_ref().trim().is_empty())
            .map(|v| v.as_ref().to_string())
            .collect();
        parts.join(", ")
    }

    /// Appends `q=<query>&output=csv`, form-urlencoded, to `base_url`. Query pairs
    /// already present on the base URL are kept.
    pub fn build_request_url(base_url: &Url, query: &str) -> Url {
        let mut url = base_url.clone();
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("output", "csv");
        url
    }

    /// [`build_request_url`](Self::build_request_url) against the configured endpoint.
    pub fn request_url(&self, query: &str) -> Url {
        Self::build_request_url(&self.base_url, query)
    }

    /// Performs the GET and returns the parsed geocoder answer, status code included.
    pub async fn fetch(&self, url: &Url) -> Result<GeocodeResponse, GeocodeError> {
        log::debug!("Geocoding request: GET {}", url);

        let response = self.http_client.get(url.clone()).send().await.map_err(|e| {
            log::warn!("Geocoding request to '{}' failed: {}", url, e);
            GeocodeError::NetworkFailure(e)
        })?;

        let parsed = self.process_response(response).await?;
        log::debug!(
            "Geocoder answered status {} with point {:?}",
            parsed.status,
            parsed.point
        );
        Ok(parsed)
    }

    /// Resolves `url` to a point.
    ///
    /// `Ok(None)` means the geocoder answered well-formed but found nothing.
    /// Transport problems are [`GeocodeError::NetworkFailure`]; non-2xx statuses and
    /// bodies that are not geocoder CSV are [`GeocodeError::InvalidResponse`]. With
    /// range validation enabled, a point off the globe is `InvalidResponse` too.
    pub async fn resolve(&self, url: &Url) -> Result<Option<GeoPoint>, GeocodeError> {
        let response = self.fetch(url).await?;
        match response.point {
            Some(point) if self.validate_ranges && !point.is_in_range() => {
                Err(GeocodeError::InvalidResponse(format!(
                    "coordinates out of range: {}, {}",
                    point.latitude, point.longitude
                )))
            }
            point => Ok(point),
        }
    }

    /// Like [`resolve`](Self::resolve), but gives up as soon as `cancel` completes.
    /// The in-flight request is dropped and [`GeocodeError::Cancelled`] returned.
    pub async fn resolve_with_cancel<F>(
        &self,
        url: &Url,
        cancel: F,
    ) -> Result<Option<GeoPoint>, GeocodeError>
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            biased;
            _ = cancel => {
                log::debug!("Geocoding request to '{}' cancelled", url);
                Err(GeocodeError::Cancelled)
            }
            result = self.resolve(url) => result,
        }
    }

    /// Builds the query from `values`, then resolves it against the configured endpoint.
    pub async fn geocode<I, S>(&self, values: I) -> Result<Option<GeoPoint>, GeocodeError>
    where
        I: IntoIterator<Item = Option<S>>,
        S: AsRef<str>,
    {
        let query = Self::build_query(values);
        self.resolve(&self.request_url(&query)).await
    }
}
