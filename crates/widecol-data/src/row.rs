//! Decoded rows and query result rows.

use std::collections::BTreeMap;
use std::fmt;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use widecol_common::FAMILY_SEPARATOR;

/// Flat field input: `"family:qualifier"` or plain qualifier keys mapped to
/// string values.
pub type FieldMap = BTreeMap<String, String>;

/// Name of the key column in result rows.
pub const ID_COLUMN: &str = "id";

/// A fully qualified column.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Column {
    /// Column family.
    pub family: String,
    /// Qualifier within the family.
    pub qualifier: String,
}

impl Column {
    /// Creates a new column.
    pub fn new(family: impl Into<String>, qualifier: impl Into<String>) -> Self {
        Self {
            family: family.into(),
            qualifier: qualifier.into(),
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.family, FAMILY_SEPARATOR, self.qualifier)
    }
}

/// A decoded row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// Row key.
    pub key: String,
    /// Field values by column.
    pub fields: BTreeMap<Column, String>,
}

impl Row {
    /// Creates an empty row.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Adds a field.
    pub fn with_field(
        mut self,
        family: impl Into<String>,
        qualifier: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.fields
            .insert(Column::new(family, qualifier), value.into());
        self
    }

    /// Returns the value of an exact column.
    pub fn get(&self, family: &str, qualifier: &str) -> Option<&str> {
        self.fields
            .get(&Column::new(family, qualifier))
            .map(String::as_str)
    }

    /// Looks a field up by name.
    ///
    /// `field` is either `family:qualifier` or a bare qualifier. A bare
    /// qualifier present in several families resolves to the family that
    /// sorts last, matching [`ResultRow`]. The bare name `id` is the row key.
    pub fn value_of(&self, field: &str) -> Option<&str> {
        if field == ID_COLUMN {
            return Some(&self.key);
        }
        if let Some((family, qualifier)) = field.split_once(FAMILY_SEPARATOR) {
            if let Some(value) = self.get(family, qualifier) {
                return Some(value);
            }
        }
        self.fields
            .iter()
            .rev()
            .find(|(column, _)| column.qualifier == field)
            .map(|(_, value)| value.as_str())
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the row has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Reshapes into a result row, dropping family prefixes.
    ///
    /// A stored `id` qualifier keeps its prefix (`info:id`) so it cannot
    /// shadow the row key.
    pub fn into_result(self) -> ResultRow {
        let mut fields = BTreeMap::new();
        for (column, value) in self.fields {
            let name = if column.qualifier == ID_COLUMN {
                column.to_string()
            } else {
                column.qualifier
            };
            fields.insert(name, value);
        }
        ResultRow {
            id: self.key,
            fields,
        }
    }
}

/// A row as shown to users: its key plus qualifier → value.
///
/// Serializes as a flat map with `id` first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRow {
    /// Row key.
    pub id: String,
    /// Field values by bare qualifier.
    pub fields: BTreeMap<String, String>,
}

impl ResultRow {
    /// Returns a field value.
    pub fn get(&self, field: &str) -> Option<&str> {
        if field == ID_COLUMN {
            return Some(&self.id);
        }
        self.fields.get(field).map(String::as_str)
    }
}

impl Serialize for ResultRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 1))?;
        map.serialize_entry(ID_COLUMN, &self.id)?;
        for (k, v) in &self.fields {
            if k != ID_COLUMN {
                map.serialize_entry(k, v)?;
            }
        }
        map.end()
    }
}

/// Column headers covering a set of result rows: `id`, then every field
/// name in sorted order.
pub fn result_columns(rows: &[ResultRow]) -> Vec<String> {
    let mut names: Vec<&str> = rows
        .iter()
        .flat_map(|r| r.fields.keys().map(String::as_str))
        .filter(|k| *k != ID_COLUMN)
        .collect();
    names.sort_unstable();
    names.dedup();

    std::iter::once(ID_COLUMN)
        .chain(names)
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_of() {
        let row = Row::new("product_1")
            .with_field("info", "name", "Widget")
            .with_field("info", "category_id", "category_1");

        assert_eq!(row.value_of("name"), Some("Widget"));
        assert_eq!(row.value_of("info:category_id"), Some("category_1"));
        assert_eq!(row.value_of("price"), None);
        assert_eq!(row.value_of("meta:name"), None);
    }

    #[test]
    fn test_qualifier_collision_last_family_wins() {
        let row = Row::new("r")
            .with_field("a", "name", "from-a")
            .with_field("b", "name", "from-b");

        assert_eq!(row.value_of("name"), Some("from-b"));
        assert_eq!(row.clone().into_result().get("name"), Some("from-b"));
        assert_eq!(row.value_of("a:name"), Some("from-a"));
    }

    #[test]
    fn test_id_names_the_row_key() {
        let row = Row::new("product_1")
            .with_field("info", "id", "SKU-9")
            .with_field("info", "name", "W");

        assert_eq!(row.value_of("id"), Some("product_1"));
        assert_eq!(row.value_of("info:id"), Some("SKU-9"));

        let result = row.into_result();
        assert_eq!(result.get("id"), Some("product_1"));
        assert_eq!(result.get("info:id"), Some("SKU-9"));
        assert_eq!(result_columns(&[result.clone()]), vec!["id", "info:id", "name"]);

        let json = serde_json::to_string(&result).unwrap();
        assert_eq!(json, r#"{"id":"product_1","info:id":"SKU-9","name":"W"}"#);
    }

    #[test]
    fn test_result_row_json_has_id_first() {
        let result = Row::new("product_2")
            .with_field("info", "name", "Gadget")
            .into_result();

        let json = serde_json::to_string(&result).unwrap();
        assert_eq!(json, r#"{"id":"product_2","name":"Gadget"}"#);
    }

    #[test]
    fn test_result_columns() {
        let rows = vec![
            Row::new("u1").with_field("info", "name", "Ann").into_result(),
            Row::new("u2").with_field("info", "email", "b@x").into_result(),
        ];
        assert_eq!(result_columns(&rows), vec!["id", "email", "name"]);
        assert_eq!(result_columns(&[]), vec!["id"]);
    }
}
