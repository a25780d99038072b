// src/types/mod.rs

pub mod common;
pub mod unit;

pub use common::{is_sql_identifier, ColumnRef};
pub use unit::DistanceUnit;
