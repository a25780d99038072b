use reqwest::Response as HttpResponse;

use crate::error::GeocodeError;
use crate::geopoint::GeoPoint;
use crate::GeocodeClient;

/// Geocoder status code for a successful lookup.
pub const STATUS_SUCCESS: u16 = 200;

/// A parsed CSV geocoder answer: `status_code,accuracy,latitude,longitude[,...]`.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeResponse {
    pub status: u16,
    /// `None` when the geocoder found nothing for the query.
    pub point: Option<GeoPoint>,
}

impl GeocodeResponse {
    /// Parses a CSV geocoder body.
    ///
    /// A body is well formed when its first field is an integer status code. A
    /// well-formed body yields a point only for status 200 with at least four
    /// fields; any other well-formed body (`602,0,0,0`, or a short `200,OK`) is a
    /// "no result" answer. Empty bodies, a non-numeric status, or unparseable
    /// coordinates in a successful answer are [`GeocodeError::InvalidResponse`].
    pub fn parse_csv(body: &str) -> Result<Self, GeocodeError> {
        let line = body
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .unwrap_or("");
        if line.is_empty() {
            return Err(GeocodeError::InvalidResponse(
                "empty response body".to_string(),
            ));
        }

        let codes: Vec<&str> = line.split(',').map(str::trim).collect();
        let status = codes[0].parse::<u16>().map_err(|_| {
            GeocodeError::InvalidResponse(format!(
                "expected a numeric status code, got '{}'",
                truncate(line)
            ))
        })?;

        if status != STATUS_SUCCESS || codes.len() < 4 {
            return Ok(GeocodeResponse {
                status,
                point: None,
            });
        }

        let latitude = parse_coordinate("latitude", codes[2])?;
        let longitude = parse_coordinate("longitude", codes[3])?;
        Ok(GeocodeResponse {
            status,
            point: Some(GeoPoint::new(latitude, longitude)),
        })
    }

    pub fn is_success(&self) -> bool {
        self.status == STATUS_SUCCESS
    }
}

fn parse_coordinate(name: &str, raw: &str) -> Result<f64, GeocodeError> {
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(GeocodeError::InvalidResponse(format!(
            "{} '{}' is not a number",
            name, raw
        ))),
    }
}

fn truncate(text: &str) -> String {
    text.chars().take(100).collect()
}

impl GeocodeClient {
    // Checks the HTTP status and parses the CSV body of a geocoder response.
    pub(crate) async fn process_response(
        &self,
        response: HttpResponse,
    ) -> Result<GeocodeResponse, GeocodeError> {
        let status = response.status();
        let response_url = response.url().to_string();
        let response_text = response.text().await?;

        if !status.is_success() {
            log::warn!(
                "Geocoder at '{}' answered HTTP {}. Body: {}",
                response_url,
                status,
                truncate(&response_text)
            );
            return Err(GeocodeError::InvalidResponse(format!(
                "HTTP {} from geocoder",
                status.as_u16()
            )));
        }

        GeocodeResponse::parse_csv(&response_text).inspect_err(|e| {
            log::warn!(
                "Unparseable geocoder response from '{}': {}. Body: {}",
                response_url,
                e,
                truncate(&response_text)
            );
        })
    }
}
