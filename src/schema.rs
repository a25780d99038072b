use crate::config::ColumnDefinition;

/// The host schema API the behavior registers its coordinate columns with.
pub trait SchemaRegistry {
    /// Registers a column. `declaration` is `name` or `name as alias`.
    fn has_column(&mut self, declaration: &str, column: &ColumnDefinition);
}

/// Columns registered on one entity table, in registration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableDefinition {
    columns: Vec<(String, ColumnDefinition)>,
}

impl TableDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn columns(&self) -> &[(String, ColumnDefinition)] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDefinition> {
        self.columns
            .iter()
            .find(|(_, c)| c.name == name)
            .map(|(_, c)| c)
    }

    /// Column definitions as SQL, e.g. `latitude DOUBLE(16, 10)`.
    pub fn column_sql(&self) -> Vec<String> {
        self.columns
            .iter()
            .map(|(_, c)| {
                format!(
                    "{} {}({}, {})",
                    c.name,
                    c.column_type.to_uppercase(),
                    c.length,
                    c.scale
                )
            })
            .collect()
    }
}

impl SchemaRegistry for TableDefinition {
    fn has_column(&mut self, declaration: &str, column: &ColumnDefinition) {
        // Re-registering a column replaces it.
        self.columns.retain(|(_, c)| c.name != column.name);
        self.columns.push((declaration.to_string(), column.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_replaces_same_name() {
        let mut table = TableDefinition::new();
        table.has_column("latitude", &ColumnDefinition::double("latitude"));
        let mut aliased = ColumnDefinition::double("latitude");
        aliased.alias = Some("lat".to_string());
        table.has_column(&aliased.declaration(), &aliased);

        assert_eq!(table.columns().len(), 1);
        assert_eq!(table.columns()[0].0, "latitude as lat");
        assert_eq!(table.column_sql(), vec!["latitude DOUBLE(16, 10)"]);
    }
}
