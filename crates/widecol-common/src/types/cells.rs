//! Raw rows and cells.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// One stored column: full column name (`family:qualifier`) and its value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    /// Column name bytes, family prefix included.
    pub column: Bytes,
    /// Value bytes.
    pub value: Bytes,
}

impl Cell {
    /// Creates a new cell.
    pub fn new(column: impl Into<Bytes>, value: impl Into<Bytes>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }

    /// Returns the family portion of the column name, if it has one.
    pub fn family(&self) -> Option<&[u8]> {
        self.column
            .iter()
            .position(|&b| b == super::FAMILY_SEPARATOR_BYTE)
            .map(|i| &self.column[..i])
    }
}

/// A row as returned by a store scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRow {
    /// Row key bytes.
    pub key: Bytes,
    /// Cells of the row, ordered by column name.
    pub cells: Vec<Cell>,
}

impl RawRow {
    /// Creates a new raw row.
    pub fn new(key: impl Into<Bytes>, cells: Vec<Cell>) -> Self {
        Self {
            key: key.into(),
            cells,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_family() {
        let cell = Cell::new(&b"info:name"[..], &b"Widget"[..]);
        assert_eq!(cell.family(), Some(&b"info"[..]));

        let bare = Cell::new(&b"name"[..], &b"x"[..]);
        assert_eq!(bare.family(), None);
    }

    #[test]
    fn test_raw_row_keeps_cell_order() {
        let row = RawRow::new(
            &b"product_1"[..],
            vec![
                Cell::new(&b"info:name"[..], &b"Widget"[..]),
                Cell::new(&b"info:price"[..], &b"12"[..]),
            ],
        );
        assert_eq!(row.key.as_ref(), b"product_1");
        assert_eq!(row.cells[1].column.as_ref(), b"info:price");
        assert_eq!(row.cells[1].value.as_ref(), b"12");
    }
}
