//! Row codec.
//!
//! The single place where application strings become store bytes and back.
//!
//! # Encoding Format
//!
//! - Row key: the UTF-8 bytes of the id.
//! - Column name: `family` + `:` + `qualifier`, UTF-8.
//! - Value: the UTF-8 bytes of the value.
//!
//! Column names are split on the **first** separator when decoding, so a
//! qualifier may itself contain `:`; only the family is restricted.

use bytes::Bytes;

use widecol_common::{validate_family, RawRow, StoreError, StoreResult, FAMILY_SEPARATOR};

use crate::row::{Column, Row};

/// Encodes a row key.
pub fn encode_key(id: &str) -> Bytes {
    Bytes::copy_from_slice(id.as_bytes())
}

/// Decodes a row key.
pub fn decode_key(bytes: &[u8]) -> StoreResult<String> {
    decode_text(bytes, "row key")
}

/// Encodes one field into column-name and value bytes.
pub fn encode_field(family: &str, qualifier: &str, value: &str) -> StoreResult<(Bytes, Bytes)> {
    validate_family(family)?;

    let mut column = Vec::with_capacity(family.len() + 1 + qualifier.len());
    column.extend_from_slice(family.as_bytes());
    column.push(FAMILY_SEPARATOR as u8);
    column.extend_from_slice(qualifier.as_bytes());

    Ok((Bytes::from(column), Bytes::copy_from_slice(value.as_bytes())))
}

/// Decodes column-name and value bytes into `(family, qualifier, value)`.
pub fn decode_field(column: &[u8], value: &[u8]) -> StoreResult<(String, String, String)> {
    let column = decode_text(column, "column qualifier")?;
    let (family, qualifier) =
        column
            .split_once(FAMILY_SEPARATOR)
            .ok_or_else(|| StoreError::MalformedQualifier {
                qualifier: column.clone(),
            })?;
    let value = decode_text(value, "value")?;

    Ok((family.to_string(), qualifier.to_string(), value))
}

/// Decodes a whole scanned row.
pub fn decode_row(raw: RawRow) -> StoreResult<Row> {
    let mut row = Row::new(decode_key(&raw.key)?);
    for cell in raw.cells {
        let (family, qualifier, value) = decode_field(&cell.column, &cell.value)?;
        row.fields.insert(Column::new(family, qualifier), value);
    }
    Ok(row)
}

fn decode_text(bytes: &[u8], what: &str) -> StoreResult<String> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|e| StoreError::encoding(format!("{what} is not valid UTF-8: {e}")))
}
