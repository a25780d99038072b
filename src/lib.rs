pub mod behavior;
pub mod client;
pub mod config;
pub mod error;
pub mod geopoint;
pub mod query;
pub mod requests;
pub mod schema;
pub mod types;

pub use behavior::{Geolocatable, Locatable};
pub use client::GeocodeClient;
pub use config::{ColumnDefinition, Columns, GeoQueryConfig};
pub use error::{ConfigError, Error, GeocodeError, GeocodeErrorKind, OutOfRangeError};
pub use geopoint::GeoPoint;
pub use query::{
    build_distance_expression, with_max_distance, DistanceClause, DistanceQuery, QueryBuilder,
    SelectQuery,
};
pub use requests::GeocodeResponse;
pub use schema::{SchemaRegistry, TableDefinition};

// Re-export key types from the types module if needed directly
pub use types::{ColumnRef, DistanceUnit};
