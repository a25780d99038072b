use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Statute miles per arc minute of a great circle.
pub const MILES_PER_ARC_MINUTE: f64 = 1.1515;
pub const KILOMETERS_PER_MILE: f64 = 1.609344;

/// Unit the distance expression is expressed in. Also used as the select alias.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DistanceUnit {
    #[default]
    Miles,
    Kilometers,
}

impl DistanceUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            DistanceUnit::Miles => "miles",
            DistanceUnit::Kilometers => "kilometers",
        }
    }

    /// The conversion factor as it appears in generated SQL.
    ///
    /// Kilometers keep the unevaluated product so the text stays identical to
    /// expressions already stored by existing callers.
    pub fn factor_sql(&self) -> &'static str {
        match self {
            DistanceUnit::Miles => "1.1515",
            DistanceUnit::Kilometers => "1.1515 * 1.609344",
        }
    }

    pub fn factor(&self) -> f64 {
        match self {
            DistanceUnit::Miles => MILES_PER_ARC_MINUTE,
            DistanceUnit::Kilometers => MILES_PER_ARC_MINUTE * KILOMETERS_PER_MILE,
        }
    }
}

impl fmt::Display for DistanceUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DistanceUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "miles" => Ok(DistanceUnit::Miles),
            "kilometers" => Ok(DistanceUnit::Kilometers),
            other => Err(format!("unknown distance unit '{}'", other)),
        }
    }
}
