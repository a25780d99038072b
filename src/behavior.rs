// src/behavior.rs

use serde_json::{Map, Value};
use url::Url;

use crate::client::GeocodeClient;
use crate::config::GeoQueryConfig;
use crate::error::GeocodeError;
use crate::geopoint::GeoPoint;
use crate::query::{DistanceClause, DistanceQuery, QueryBuilder};
use crate::schema::SchemaRegistry;
use crate::types::ColumnRef;

/// An entity record the behavior can read address fields from and write coordinates to.
pub trait Locatable {
    /// Value of an address field, `None` when unset.
    fn field_value(&self, field: &str) -> Option<String>;

    /// Writes both coordinate columns; `None` clears them together.
    fn set_coordinates(
        &mut self,
        latitude_column: &str,
        longitude_column: &str,
        point: Option<GeoPoint>,
    );

    /// Whether `field` changed since the entity was loaded. Entities that do not
    /// track modifications are always geocoded on save.
    fn is_field_modified(&self, _field: &str) -> bool {
        true
    }
}

/// A JSON object, as stored by document-style backends, is a locatable entity.
impl Locatable for Map<String, Value> {
    fn field_value(&self, field: &str) -> Option<String> {
        match self.get(field)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    fn set_coordinates(
        &mut self,
        latitude_column: &str,
        longitude_column: &str,
        point: Option<GeoPoint>,
    ) {
        let (lat, lng) = match point {
            Some(p) => (Value::from(p.latitude), Value::from(p.longitude)),
            None => (Value::Null, Value::Null),
        };
        self.insert(latitude_column.to_string(), lat);
        self.insert(longitude_column.to_string(), lng);
    }
}

/// The geolocatable behavior of one entity type: coordinate columns, geocoding on
/// save, and distance queries over the stored coordinates.
#[derive(Debug, Clone)]
pub struct Geolocatable {
    config: GeoQueryConfig,
    client: GeocodeClient,
}

impl Geolocatable {
    pub fn new(config: GeoQueryConfig) -> Result<Self, GeocodeError> {
        let client = GeocodeClient::new(&config)?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &GeoQueryConfig {
        &self.config
    }

    pub fn client(&self) -> &GeocodeClient {
        &self.client
    }

    /// Registers the latitude and longitude columns with the host schema.
    pub fn set_table_definition<R: SchemaRegistry + ?Sized>(&self, registry: &mut R) {
        let columns = self.config.columns();
        for column in [&columns.latitude, &columns.longitude] {
            registry.has_column(&column.declaration(), column);
        }
    }

    /// The address query for `entity`: its configured fields, non-empty ones only,
    /// joined with `", "`.
    pub fn build_geo_query<E: Locatable + ?Sized>(&self, entity: &E) -> String {
        GeocodeClient::build_query(
            self.config
                .fields()
                .iter()
                .map(|field| entity.field_value(field)),
        )
    }

    pub fn build_url_from_query(&self, query: &str) -> Url {
        self.client.request_url(query)
    }

    /// Geocodes `entity` and writes the result to its coordinate columns, rounded to
    /// the column scale. A `None` result clears both columns.
    ///
    /// Without an explicit `url` the entity's own address query is used; an entity
    /// with no address is cleared without contacting the geocoder. On error the
    /// entity is left untouched.
    pub async fn refresh_geocodes<E: Locatable + ?Sized>(
        &self,
        entity: &mut E,
        url: Option<&Url>,
    ) -> Result<Option<GeoPoint>, GeocodeError> {
        let point = match url {
            Some(url) => self.client.resolve(url).await?,
            None => {
                let query = self.build_geo_query(entity);
                if query.is_empty() {
                    log::debug!("No address fields set, clearing coordinates");
                    None
                } else {
                    let url = self.build_url_from_query(&query);
                    self.client.resolve(&url).await?
                }
            }
        };

        let columns = self.config.columns();
        let stored = point.map(|p| {
            GeoPoint::new(
                p.round_to_scale(columns.latitude.scale).latitude,
                p.round_to_scale(columns.longitude.scale).longitude,
            )
        });
        entity.set_coordinates(&columns.latitude.name, &columns.longitude.name, stored);
        Ok(stored)
    }

    /// Pre-save lifecycle hook. Refreshes the coordinates if any configured address
    /// field was modified; returns whether a refresh happened.
    pub async fn pre_save<E: Locatable + ?Sized>(
        &self,
        entity: &mut E,
    ) -> Result<bool, GeocodeError> {
        let modified = self
            .config
            .fields()
            .iter()
            .any(|field| entity.is_field_modified(field));
        if !modified {
            return Ok(false);
        }
        self.refresh_geocodes(entity, None).await?;
        Ok(true)
    }

    /// A distance query from `origin` over the configured columns, qualified by `qualifier`.
    pub fn distance_query(&self, qualifier: &str, origin: GeoPoint) -> DistanceQuery {
        let columns = self.config.columns();
        DistanceQuery::new(
            origin,
            ColumnRef::qualified(qualifier, columns.latitude.name.as_str()),
            ColumnRef::qualified(qualifier, columns.longitude.name.as_str()),
        )
        .unit(self.config.distance_unit())
    }

    /// Adds the distance from (`latitude`, `longitude`) as a computed column named after
    /// the configured unit, filtered to rows closer than `max_distance` when given.
    pub fn add_distance_query<Q: QueryBuilder + ?Sized>(
        &self,
        query: &mut Q,
        latitude: f64,
        longitude: f64,
        max_distance: Option<f64>,
    ) -> DistanceClause {
        let clause = self
            .distance_query(query.root_alias(), GeoPoint::new(latitude, longitude))
            .max_distance_opt(max_distance)
            .build();
        clause.apply(query);
        clause
    }
}
