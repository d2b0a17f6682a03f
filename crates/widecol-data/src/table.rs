//! Row store client: CRUD over one table.

use std::fmt;
use std::sync::Arc;
use std::vec;

use tracing::debug;

use widecol_common::{Cell, RawRow, StoreError, StoreResult, FAMILY_SEPARATOR};
use widecol_store::Connector;

use crate::codec;
use crate::row::{Column, FieldMap, Row, ID_COLUMN};
use crate::schema::TableSpec;

/// CRUD access to a single table.
///
/// Every call acquires its own connection and releases it before returning,
/// whether the call succeeds or not.
#[derive(Debug, Clone)]
pub struct RowStore {
    connector: Arc<dyn Connector>,
    spec: TableSpec,
}

impl RowStore {
    /// Creates a client for the table.
    pub fn new(connector: Arc<dyn Connector>, spec: TableSpec) -> Self {
        Self { connector, spec }
    }

    /// Table name.
    pub fn table(&self) -> &str {
        &self.spec.name
    }

    /// Table definition.
    pub fn spec(&self) -> &TableSpec {
        &self.spec
    }

    /// Writes the given fields onto row `id`, creating the row if needed.
    ///
    /// Keys are either `family:qualifier` or a bare qualifier, which goes to
    /// the table's default family. Fields not named are left untouched.
    pub fn put(&self, id: &str, fields: &FieldMap) -> StoreResult<()> {
        let cells = self.encode_cells(id, fields)?;
        let mut conn = self.connector.acquire()?;
        conn.open_table(self.spec.name.as_str())
            .put(codec::encode_key(id), cells)?;
        debug!(table = %self.spec.name, id, fields = fields.len(), "put row");
        Ok(())
    }

    /// Writes several rows over one connection.
    ///
    /// Every row is encoded before the first write, so an invalid row in the
    /// batch means nothing is written. A store failure mid-batch leaves the
    /// earlier rows written.
    pub fn put_batch(&self, rows: &[(String, FieldMap)]) -> StoreResult<usize> {
        let encoded = rows
            .iter()
            .map(|(id, fields)| -> StoreResult<_> {
                Ok((codec::encode_key(id), self.encode_cells(id, fields)?))
            })
            .collect::<StoreResult<Vec<_>>>()?;

        let mut conn = self.connector.acquire()?;
        let mut table = conn.open_table(self.spec.name.as_str());
        for (key, cells) in encoded {
            table.put(key, cells)?;
        }
        debug!(table = %self.spec.name, rows = rows.len(), "put batch");
        Ok(rows.len())
    }

    /// Scans the table in key order.
    ///
    /// The rows are fetched up front and decoded one at a time as the
    /// iterator advances. Calling again re-scans.
    pub fn get_all(&self) -> StoreResult<RowScan> {
        let mut conn = self.connector.acquire()?;
        let raw = conn.open_table(self.spec.name.as_str()).scan()?;
        drop(conn);
        debug!(table = %self.spec.name, rows = raw.len(), "scanned table");
        Ok(RowScan {
            table: self.spec.name.clone(),
            rows: raw.into_iter(),
        })
    }

    /// Returns row `id`, if present.
    ///
    /// The store has no point lookup, so this scans the table: O(table size).
    pub fn get(&self, id: &str) -> StoreResult<Option<Row>> {
        let key = codec::encode_key(id);
        let mut conn = self.connector.acquire()?;
        let raw = conn
            .open_table(self.spec.name.as_str())
            .scan()?
            .into_iter()
            .find(|r| r.key == key);
        raw.map(codec::decode_row).transpose()
    }

    /// Removes row `id`. Removing an absent row succeeds.
    pub fn delete(&self, id: &str) -> StoreResult<()> {
        let mut conn = self.connector.acquire()?;
        conn.open_table(self.spec.name.as_str())
            .delete(codec::encode_key(id))?;
        debug!(table = %self.spec.name, id, "deleted row");
        Ok(())
    }

    fn encode_cells(&self, id: &str, fields: &FieldMap) -> StoreResult<Vec<Cell>> {
        if id.is_empty() {
            return Err(StoreError::invalid_input("row id must not be empty"));
        }
        if fields.is_empty() {
            return Err(StoreError::invalid_input(format!(
                "row '{id}' has no fields to write"
            )));
        }

        fields
            .iter()
            .map(|(name, value)| -> StoreResult<Cell> {
                let column = self.resolve_column(name)?;
                let (column, value) =
                    codec::encode_field(&column.family, &column.qualifier, value)?;
                Ok(Cell::new(column, value))
            })
            .collect()
    }

    /// Maps a flat field name onto a column of this table.
    ///
    /// A name containing the separator must start with a declared family.
    fn resolve_column(&self, name: &str) -> StoreResult<Column> {
        if name.is_empty() {
            return Err(StoreError::invalid_input("field name must not be empty"));
        }

        if let Some((family, qualifier)) = name.split_once(FAMILY_SEPARATOR) {
            if !self.spec.has_family(family) {
                return Err(StoreError::NoSuchFamily {
                    table: self.spec.name.clone(),
                    family: family.to_string(),
                });
            }
            return checked(Column::new(family, qualifier));
        }

        let family = self.spec.default_family().ok_or_else(|| {
            StoreError::invalid_input(format!(
                "table '{}' has no default family for field '{name}'",
                self.spec.name
            ))
        })?;
        checked(Column::new(family, name))
    }
}

/// `id` is the key column of every result row, so no family may store it.
fn checked(column: Column) -> StoreResult<Column> {
    if column.qualifier == ID_COLUMN {
        return Err(StoreError::invalid_input(format!(
            "field '{column}' is reserved: '{ID_COLUMN}' names the row key"
        )));
    }
    Ok(column)
}

/// Rows of one scan, decoded lazily.
pub struct RowScan {
    table: String,
    rows: vec::IntoIter<RawRow>,
}

impl RowScan {
    /// Table the rows came from.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Decodes every remaining row, stopping at the first bad one.
    pub fn collect_rows(self) -> StoreResult<Vec<Row>> {
        self.collect()
    }
}

impl Iterator for RowScan {
    type Item = StoreResult<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        self.rows.next().map(codec::decode_row)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.rows.size_hint()
    }
}

impl ExactSizeIterator for RowScan {}

impl fmt::Debug for RowScan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowScan")
            .field("table", &self.table)
            .field("remaining", &self.rows.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use widecol_common::ErrorCode;
    use widecol_store::{MemoryConnector, MemoryStore};

    fn setup() -> (Arc<MemoryStore>, RowStore) {
        let store = Arc::new(MemoryStore::new());
        store
            .create_table("products", &["info".to_string(), "meta".to_string()])
            .unwrap();
        let rows = RowStore::new(
            Arc::new(MemoryConnector::new(Arc::clone(&store))),
            TableSpec::new("products").family("info").family("meta"),
        );
        (store, rows)
    }

    fn fields(pairs: &[(&str, &str)]) -> FieldMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_put_then_get() {
        let (_store, rows) = setup();
        rows.put(
            "product_1",
            &fields(&[("name", "Widget"), ("meta:tag", "new")]),
        )
        .unwrap();

        let row = rows.get("product_1").unwrap().unwrap();
        assert_eq!(row.get("info", "name"), Some("Widget"));
        assert_eq!(row.get("meta", "tag"), Some("new"));
        assert!(rows.get("product_2").unwrap().is_none());
    }

    #[test]
    fn test_put_rejects_id_field() {
        let (store, rows) = setup();

        for name in ["id", "info:id", "meta:id"] {
            let err = rows
                .put("product_1", &fields(&[(name, "SKU-9"), ("name", "W")]))
                .unwrap_err();
            assert_eq!(err.code(), ErrorCode::InvalidInput);
        }
        assert_eq!(store.row_count("products").unwrap(), 0);

        rows.put("product_1", &fields(&[("sku", "SKU-9")])).unwrap();
        let row = rows.get("product_1").unwrap().unwrap();
        assert_eq!(row.value_of("id"), Some("product_1"));
    }

    #[test]
    fn test_put_is_partial_update() {
        let (_store, rows) = setup();
        rows.put("p", &fields(&[("name", "A"), ("price", "10")]))
            .unwrap();
        rows.put("p", &fields(&[("price", "12")])).unwrap();

        let row = rows.get("p").unwrap().unwrap();
        assert_eq!(row.get("info", "name"), Some("A"));
        assert_eq!(row.get("info", "price"), Some("12"));
    }

    #[test]
    fn test_put_rejects_bad_input() {
        let (store, rows) = setup();

        let err = rows.put("", &fields(&[("name", "x")])).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidInput);

        let err = rows.put("p", &FieldMap::new()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidInput);

        let err = rows
            .put("p", &fields(&[("name", "x"), ("extra:tag", "y")]))
            .unwrap_err();
        assert!(matches!(err, StoreError::NoSuchFamily { .. }));
        assert_eq!(store.row_count("products").unwrap(), 0);
    }

    #[test]
    fn test_get_all_in_key_order() {
        let (_store, rows) = setup();
        for id in ["product_3", "product_1", "product_2"] {
            rows.put(id, &fields(&[("name", id)])).unwrap();
        }

        let keys: Vec<String> = rows
            .get_all()
            .unwrap()
            .map(|r| r.unwrap().key)
            .collect();
        assert_eq!(keys, vec!["product_1", "product_2", "product_3"]);
    }

    #[test]
    fn test_get_all_is_restartable() {
        let (_store, rows) = setup();
        rows.put("a", &fields(&[("name", "A")])).unwrap();

        let first = rows.get_all().unwrap().collect_rows().unwrap();
        rows.put("b", &fields(&[("name", "B")])).unwrap();
        let second = rows.get_all().unwrap().collect_rows().unwrap();

        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 2);
    }

    #[test]
    fn test_get_all_empty_table() {
        let (_store, rows) = setup();
        let scan = rows.get_all().unwrap();
        assert_eq!(scan.len(), 0);
        assert_eq!(scan.count(), 0);
    }

    #[test]
    fn test_get_all_surfaces_malformed_cell_lazily() {
        let (store, rows) = setup();
        rows.put("a", &fields(&[("name", "ok")])).unwrap();
        store
            .put(
                "products",
                Bytes::from_static(b"b"),
                vec![Cell::new(
                    Bytes::from_static(b"info:name"),
                    Bytes::from_static(&[0xff, 0xfe]),
                )],
            )
            .unwrap();

        let mut scan = rows.get_all().unwrap();
        assert_eq!(scan.next().unwrap().unwrap().key, "a");
        assert!(matches!(
            scan.next().unwrap(),
            Err(StoreError::Encoding { .. })
        ));
        assert!(scan.next().is_none());
    }

    #[test]
    fn test_delete_is_idempotent() {
        let (_store, rows) = setup();
        rows.put("p", &fields(&[("name", "A")])).unwrap();

        rows.delete("p").unwrap();
        rows.delete("p").unwrap();
        rows.delete("never-existed").unwrap();
        assert!(rows.get("p").unwrap().is_none());
    }

    #[test]
    fn test_put_batch() {
        let (store, rows) = setup();
        let batch = vec![
            ("a".to_string(), fields(&[("name", "A")])),
            ("b".to_string(), fields(&[("name", "B")])),
        ];
        assert_eq!(rows.put_batch(&batch).unwrap(), 2);
        assert_eq!(store.row_count("products").unwrap(), 2);

        let bad = vec![
            ("c".to_string(), fields(&[("name", "C")])),
            ("d".to_string(), FieldMap::new()),
        ];
        assert!(rows.put_batch(&bad).is_err());
        assert_eq!(store.row_count("products").unwrap(), 2);
    }

    #[test]
    fn test_connections_released_after_errors() {
        let store = Arc::new(MemoryStore::new());
        let rows = RowStore::new(
            Arc::new(MemoryConnector::new(Arc::clone(&store))),
            TableSpec::new("missing").family("info"),
        );

        assert!(matches!(
            rows.get_all().unwrap_err(),
            StoreError::TableNotFound { .. }
        ));
        assert!(rows.put("x", &fields(&[("name", "X")])).is_err());
        assert!(rows.delete("x").is_err());

        let stats = store.stats();
        assert_eq!(stats.connections_opened, 3);
        assert_eq!(stats.open_connections(), 0);
    }
}
