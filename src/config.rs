use std::time::Duration;

use duration_str::deserialize_option_duration;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::error::ConfigError;
use crate::geopoint::COORDINATE_SCALE;
use crate::types::{is_sql_identifier, DistanceUnit};

/// Geocoding endpoint used when the configuration names none.
pub const DEFAULT_BASE_URL: &str = "http://maps.google.com/maps/geo";

/// Largest column length (total digits) a coordinate column may declare.
pub const MAX_COLUMN_LENGTH: u32 = 38;

/// Upper bound for a single geocoding request unless configured otherwise.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Definition of one coordinate column as it is registered with the host schema.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ColumnDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: String,
    pub length: u32,
    pub scale: u32,
    pub alias: Option<String>,
}

impl ColumnDefinition {
    /// A `double(16, 10)` column without alias.
    pub fn double(name: impl Into<String>) -> Self {
        ColumnDefinition {
            name: name.into(),
            column_type: "double".to_string(),
            length: 16,
            scale: COORDINATE_SCALE,
            alias: None,
        }
    }

    /// The column declaration handed to the schema registry: `name` or `name as alias`.
    pub fn declaration(&self) -> String {
        match &self.alias {
            Some(alias) => format!("{} as {}", self.name, alias),
            None => self.name.clone(),
        }
    }

    fn validate(&self, context: &'static str) -> Result<(), ConfigError> {
        let names = std::iter::once(&self.name).chain(self.alias.as_ref());
        for value in names {
            if !is_sql_identifier(value) {
                return Err(ConfigError::InvalidIdentifier {
                    context,
                    value: value.clone(),
                });
            }
        }
        if self.length == 0 || self.length > MAX_COLUMN_LENGTH || self.scale > self.length {
            return Err(ConfigError::InvalidPrecision {
                context,
                length: self.length,
                scale: self.scale,
            });
        }
        Ok(())
    }
}

/// The latitude/longitude column pair added to a geolocatable entity.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Columns {
    pub latitude: ColumnDefinition,
    pub longitude: ColumnDefinition,
}

impl Default for Columns {
    fn default() -> Self {
        Columns {
            latitude: ColumnDefinition::double("latitude"),
            longitude: ColumnDefinition::double("longitude"),
        }
    }
}

/// Configuration of the geolocatable behavior. Immutable once constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoQueryConfig {
    fields: Vec<String>,
    distance_unit: DistanceUnit,
    base_url: Url,
    timeout: Duration,
    columns: Columns,
    validate_ranges: bool,
}

impl GeoQueryConfig {
    /// Creates a configuration geocoding the given entity fields, in order, with all
    /// other options at their defaults.
    ///
    /// # Errors
    /// [`ConfigError::MissingFields`] if `fields` is empty.
    pub fn new<I, S>(fields: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields: Vec<String> = fields.into_iter().map(Into::into).collect();
        check_fields(&fields)?;

        Ok(GeoQueryConfig {
            fields,
            distance_unit: DistanceUnit::default(),
            base_url: parse_base_url(DEFAULT_BASE_URL)?,
            timeout: DEFAULT_TIMEOUT,
            columns: Columns::default(),
            validate_ranges: false,
        })
    }

    pub fn with_distance_unit(mut self, unit: DistanceUnit) -> Self {
        self.distance_unit = unit;
        self
    }

    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, ConfigError> {
        self.base_url = parse_base_url(base_url)?;
        Ok(self)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, ConfigError> {
        if timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout(
                "timeout must be greater than zero".to_string(),
            ));
        }
        self.timeout = timeout;
        Ok(self)
    }

    pub fn with_columns(mut self, columns: Columns) -> Result<Self, ConfigError> {
        columns.latitude.validate("latitude column")?;
        columns.longitude.validate("longitude column")?;
        self.columns = columns;
        Ok(self)
    }

    /// Rejects resolved points outside the valid coordinate ranges instead of
    /// passing them through unchecked.
    pub fn with_range_validation(mut self, enabled: bool) -> Self {
        self.validate_ranges = enabled;
        self
    }

    /// Builds a configuration from JSON. Only `fields` is required; every other key,
    /// including each attribute of a column, falls back to its default when absent.
    ///
    /// ```
    /// use geolocatable::{DistanceUnit, GeoQueryConfig};
    ///
    /// let config = GeoQueryConfig::from_json(
    ///     r#"{ "fields": ["city", "state"], "distance_unit": "kilometers", "timeout": "2s" }"#,
    /// )
    /// .unwrap();
    /// assert_eq!(config.distance_unit(), DistanceUnit::Kilometers);
    /// assert_eq!(config.columns().latitude.name, "latitude");
    /// ```
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = serde_json::from_str(json)?;
        raw.into_config()
    }

    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        let raw: RawConfig = serde_json::from_value(value)?;
        raw.into_config()
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn distance_unit(&self) -> DistanceUnit {
        self.distance_unit
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn columns(&self) -> &Columns {
        &self.columns
    }

    pub fn validates_ranges(&self) -> bool {
        self.validate_ranges
    }
}

fn check_fields(fields: &[String]) -> Result<(), ConfigError> {
    if fields.iter().all(|f| f.trim().is_empty()) {
        return Err(ConfigError::MissingFields);
    }
    Ok(())
}

fn parse_base_url(base_url: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(base_url).map_err(|source| ConfigError::InvalidBaseUrl {
        url: base_url.to_string(),
        source,
    })?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::CannotBeABase(base_url.to_string()));
    }
    Ok(url)
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    fields: Vec<String>,
    distance_unit: Option<DistanceUnit>,
    base_url: Option<String>,
    #[serde(default, deserialize_with = "deserialize_option_duration")]
    timeout: Option<Duration>,
    columns: Option<RawColumns>,
    validate_ranges: Option<bool>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawColumns {
    latitude: Option<RawColumn>,
    longitude: Option<RawColumn>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawColumn {
    name: Option<String>,
    #[serde(rename = "type")]
    column_type: Option<String>,
    length: Option<u32>,
    scale: Option<u32>,
    alias: Option<String>,
}

impl RawColumn {
    fn merge_into(self, mut column: ColumnDefinition) -> ColumnDefinition {
        if let Some(name) = self.name {
            column.name = name;
        }
        if let Some(column_type) = self.column_type {
            column.column_type = column_type;
        }
        if let Some(length) = self.length {
            column.length = length;
        }
        if let Some(scale) = self.scale {
            column.scale = scale;
        }
        if self.alias.is_some() {
            column.alias = self.alias;
        }
        column
    }
}

impl RawConfig {
    fn into_config(self) -> Result<GeoQueryConfig, ConfigError> {
        let mut config = GeoQueryConfig::new(self.fields)?
            .with_range_validation(self.validate_ranges.unwrap_or(false));

        if let Some(unit) = self.distance_unit {
            config = config.with_distance_unit(unit);
        }
        if let Some(base_url) = self.base_url {
            config = config.with_base_url(&base_url)?;
        }
        if let Some(timeout) = self.timeout {
            config = config.with_timeout(timeout)?;
        }
        if let Some(raw) = self.columns {
            let mut columns = Columns::default();
            if let Some(lat) = raw.latitude {
                columns.latitude = lat.merge_into(columns.latitude);
            }
            if let Some(lng) = raw.longitude {
                columns.longitude = lng.merge_into(columns.longitude);
            }
            config = config.with_columns(columns)?;
        }

        log::debug!(
            "Geolocatable config: fields={:?}, unit={}, base_url={}, timeout={:?}",
            config.fields,
            config.distance_unit,
            config.base_url,
            config.timeout
        );
        Ok(config)
    }
}
