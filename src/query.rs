// src/query.rs

use serde_json::Value;

use crate::geopoint::GeoPoint;
use crate::types::{ColumnRef, DistanceUnit};

/// The slice of a host query-building API the distance clause needs: a root alias to
/// qualify columns with, computed select expressions, and post-aggregation filters
/// with bound parameters.
pub trait QueryBuilder {
    /// Alias of the root table, e.g. `s` in `FROM stores s`.
    fn root_alias(&self) -> &str;

    fn add_select(&mut self, expression: &str);

    /// Adds a HAVING condition using positional `?` placeholders bound to `params`.
    fn add_having(&mut self, condition: &str, params: Vec<Value>);
}

/// Builds the great-circle distance between a reference point and the stored
/// coordinate columns:
///
/// ```text
/// ((ACOS(SIN(lat * PI() / 180) * SIN(latCol * PI() / 180)
///   + COS(lat * PI() / 180) * COS(latCol * PI() / 180) * COS((lng - lngCol) * PI() / 180))
///   * 180 / PI()) * 60 * factor)
/// ```
///
/// `factor` is `1.1515` (statute miles per arc minute) or `1.1515 * 1.609344` for
/// kilometers. Coordinates are not range checked. The output is a pure function of
/// the inputs. Callers must pass finite coordinates: `NaN` or `inf` would be written
/// into the SQL text as is.
pub fn build_distance_expression(
    ref_lat: f64,
    ref_lng: f64,
    lat_column: &ColumnRef,
    lng_column: &ColumnRef,
    unit: DistanceUnit,
) -> String {
    format!(
        "((ACOS(SIN({lat} * PI() / 180) * SIN({lat_col} * PI() / 180) \
         + COS({lat} * PI() / 180) * COS({lat_col} * PI() / 180) \
         * COS(({lng} - {lng_col}) * PI() / 180)) * 180 / PI()) * 60 * {factor})",
        lat = ref_lat,
        lng = ref_lng,
        lat_col = lat_column,
        lng_col = lng_column,
        factor = unit.factor_sql(),
    )
}

/// Wraps a distance expression as `<expression> AS <alias>` and, when `max_distance`
/// is given, a HAVING condition `<alias> < ?` with the distance as bound parameter.
/// A non-finite `max_distance` has no SQL value and is treated as absent.
pub fn with_max_distance(
    expression: String,
    alias: &str,
    max_distance: Option<f64>,
) -> DistanceClause {
    let max_distance = max_distance.filter(|d| d.is_finite());
    DistanceClause {
        select: format!("{} AS {}", expression, alias),
        having: max_distance.map(|_| format!("{} < ?", alias)),
        expression,
        alias: alias.to_string(),
        max_distance,
    }
}

/// A computed distance column plus its optional maximum-distance filter.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceClause {
    pub expression: String,
    pub alias: String,
    /// `<expression> AS <alias>`, ready for a select list.
    pub select: String,
    /// `<alias> < ?`; the value is never interpolated.
    pub having: Option<String>,
    pub max_distance: Option<f64>,
}

impl DistanceClause {
    /// Parameters bound to the HAVING placeholder, in order.
    pub fn params(&self) -> Vec<Value> {
        self.max_distance.map(Value::from).into_iter().collect()
    }

    /// Adds the select expression and, if present, the HAVING filter to `query`.
    pub fn apply<Q: QueryBuilder + ?Sized>(&self, query: &mut Q) {
        query.add_select(&self.select);
        if let Some(condition) = &self.having {
            query.add_having(condition, self.params());
        }
    }
}

/// Builder for a distance clause around one reference point.
///
/// ```
/// use geolocatable::{ColumnRef, DistanceQuery, DistanceUnit, GeoPoint};
///
/// let clause = DistanceQuery::new(
///     GeoPoint::new(42.3601, -71.0589),
///     ColumnRef::qualified("s", "latitude"),
///     ColumnRef::qualified("s", "longitude"),
/// )
/// .unit(DistanceUnit::Kilometers)
/// .max_distance(25.0)
/// .build();
///
/// assert!(clause.select.ends_with("AS kilometers"));
/// assert_eq!(clause.having.as_deref(), Some("kilometers < ?"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceQuery {
    origin: GeoPoint,
    lat_column: ColumnRef,
    lng_column: ColumnRef,
    unit: DistanceUnit,
    max_distance: Option<f64>,
}

impl DistanceQuery {
    pub fn new(origin: GeoPoint, lat_column: ColumnRef, lng_column: ColumnRef) -> Self {
        Self {
            origin,
            lat_column,
            lng_column,
            unit: DistanceUnit::default(),
            max_distance: None,
        }
    }

    pub fn unit(mut self, unit: DistanceUnit) -> Self {
        self.unit = unit;
        self
    }

    /// Only rows closer than `distance` (in the query's unit) are kept. A `NaN` or
    /// infinite distance clears the filter.
    pub fn max_distance(self, distance: f64) -> Self {
        self.max_distance_opt(Some(distance))
    }

    pub fn max_distance_opt(mut self, distance: Option<f64>) -> Self {
        self.max_distance = distance.filter(|d| d.is_finite());
        self
    }

    pub fn expression(&self) -> String {
        build_distance_expression(
            self.origin.latitude,
            self.origin.longitude,
            &self.lat_column,
            &self.lng_column,
            self.unit,
        )
    }

    /// The unit name doubles as the alias of the computed column.
    pub fn build(&self) -> DistanceClause {
        with_max_distance(self.expression(), self.unit.as_str(), self.max_distance)
    }
}

/// A minimal `SELECT` builder implementing [`QueryBuilder`], rendering positional
/// `?` placeholders. Useful for hosts without their own query API.
#[derive(Debug, Clone)]
pub struct SelectQuery {
    table: String,
    alias: String,
    selects: Vec<String>,
    conditions: Vec<String>,
    condition_params: Vec<Value>,
    havings: Vec<String>,
    having_params: Vec<Value>,
    order: Option<String>,
    limit: Option<usize>,
}

impl SelectQuery {
    /// Creates a query over `table` aliased as `alias`.
    pub fn new(table: &str, alias: &str) -> Self {
        Self {
            table: table.to_string(),
            alias: alias.to_string(),
            selects: Vec::new(),
            conditions: Vec::new(),
            condition_params: Vec::new(),
            havings: Vec::new(),
            having_params: Vec::new(),
            order: None,
            limit: None,
        }
    }

    pub fn select(&mut self, expression: &str) -> &mut Self {
        self.selects.push(expression.to_string());
        self
    }

    /// Adds a WHERE condition; several are joined with `AND`.
    pub fn and_where(&mut self, condition: &str, params: Vec<Value>) -> &mut Self {
        self.conditions.push(condition.to_string());
        self.condition_params.extend(params);
        self
    }

    /// Sets the order of the results, e.g. `"miles ASC"`. Replaces any existing order.
    pub fn order(&mut self, order_by: &str) -> &mut Self {
        self.order = Some(order_by.to_string());
        self
    }

    pub fn limit(&mut self, count: usize) -> &mut Self {
        self.limit = Some(count);
        self
    }

    /// Renders the statement. Without explicit selects, all columns of the root table
    /// are selected; computed selects are appended after them.
    pub fn to_sql(&self) -> String {
        let mut select_list = vec![format!("{}.*", self.alias)];
        select_list.extend(self.selects.iter().cloned());

        let mut sql = format!(
            "SELECT {} FROM {} {}",
            select_list.join(", "),
            self.table,
            self.alias
        );
        if !self.conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.conditions.join(" AND "));
        }
        if !self.havings.is_empty() {
            sql.push_str(" HAVING ");
            sql.push_str(&self.havings.join(" AND "));
        }
        if let Some(order) = &self.order {
            sql.push_str(" ORDER BY ");
            sql.push_str(order);
        }
        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }
        sql
    }

    /// Bound parameters in placeholder order: WHERE first, then HAVING.
    pub fn params(&self) -> Vec<Value> {
        self.condition_params
            .iter()
            .chain(self.having_params.iter())
            .cloned()
            .collect()
    }
}

impl QueryBuilder for SelectQuery {
    fn root_alias(&self) -> &str {
        &self.alias
    }

    fn add_select(&mut self, expression: &str) {
        self.select(expression);
    }

    fn add_having(&mut self, condition: &str, params: Vec<Value>) {
        self.havings.push(condition.to_string());
        self.having_params.extend(params);
    }
}
