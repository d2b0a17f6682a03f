//! Declarative table definitions.
//!
//! A table's schema is only its set of column families; field names are
//! free-form and decided per row.

use std::path::Path;

use serde::{Deserialize, Serialize};

use widecol_common::{validate_family, StoreError, StoreResult};

/// The family every built-in table uses.
pub const INFO_FAMILY: &str = "info";

/// Definition of one logical table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSpec {
    /// Table name.
    pub name: String,
    /// Column families, in declaration order.
    #[serde(default)]
    pub families: Vec<String>,
    /// Family that bare field names are written to. Defaults to the first
    /// declared family.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_family: Option<String>,
}

impl TableSpec {
    /// Creates a table definition with no families.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            families: Vec::new(),
            default_family: None,
        }
    }

    /// Adds a column family.
    pub fn family(mut self, family: impl Into<String>) -> Self {
        let family = family.into();
        if !self.families.contains(&family) {
            self.families.push(family);
        }
        self
    }

    /// Sets the default family for bare field names.
    pub fn with_default_family(mut self, family: impl Into<String>) -> Self {
        self.default_family = Some(family.into());
        self
    }

    /// Returns true if the family is declared.
    pub fn has_family(&self, family: &str) -> bool {
        self.families.iter().any(|f| f == family)
    }

    /// Family used for bare field names, if any.
    pub fn default_family(&self) -> Option<&str> {
        self.default_family
            .as_deref()
            .or_else(|| self.families.first().map(String::as_str))
    }

    /// Checks the definition before it reaches the store.
    pub fn validate(&self) -> StoreResult<()> {
        if self.name.is_empty() {
            return Err(StoreError::invalid_input("table name must not be empty"));
        }
        if self.families.is_empty() {
            return Err(StoreError::invalid_input(format!(
                "table '{}' declares no column families",
                self.name
            )));
        }
        for family in &self.families {
            validate_family(family)?;
        }
        if let Some(default) = &self.default_family {
            if !self.has_family(default) {
                return Err(StoreError::NoSuchFamily {
                    table: self.name.clone(),
                    family: default.clone(),
                });
            }
        }
        Ok(())
    }
}

/// A set of table definitions.
///
/// In TOML:
///
/// ```toml
/// [[table]]
/// name = "products"
/// families = ["info"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    /// Tables, in declaration order.
    #[serde(default, rename = "table")]
    pub tables: Vec<TableSpec>,
}

impl Schema {
    /// Creates an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a table, replacing any previous definition of the same name.
    pub fn table(mut self, spec: TableSpec) -> Self {
        self.tables.retain(|t| t.name != spec.name);
        self.tables.push(spec);
        self
    }

    /// Looks a table up by name.
    pub fn get(&self, name: &str) -> Option<&TableSpec> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Iterates over the tables.
    pub fn iter(&self) -> impl Iterator<Item = &TableSpec> {
        self.tables.iter()
    }

    /// Table names, in declaration order.
    pub fn names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.name.as_str()).collect()
    }

    /// Validates every table.
    pub fn validate(&self) -> StoreResult<()> {
        self.tables.iter().try_for_each(TableSpec::validate)
    }

    /// Parses a schema from TOML.
    pub fn from_toml(text: &str) -> StoreResult<Self> {
        let schema: Self = toml::from_str(text)
            .map_err(|e| StoreError::invalid_input(format!("invalid schema: {e}")))?;
        schema.validate()?;
        Ok(schema)
    }

    /// Loads a schema from a TOML file.
    pub fn from_file(path: &Path) -> StoreResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            StoreError::invalid_input(format!("cannot read schema {}: {e}", path.display()))
        })?;
        Self::from_toml(&text)
    }

    /// The storefront schema: products, categories, users, orders and
    /// order details, each with a single `info` family.
    pub fn storefront() -> Self {
        ["products", "categories", "users", "orders", "order_details"]
            .into_iter()
            .fold(Self::new(), |schema, name| {
                schema.table(TableSpec::new(name).family(INFO_FAMILY))
            })
    }
}
