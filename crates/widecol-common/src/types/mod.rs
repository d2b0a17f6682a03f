//! Wire-level types exchanged with the store.
//!
//! The store knows nothing about strings: row keys, column qualifiers and
//! values are opaque byte sequences. Decoding them into application records
//! is the job of the row codec in `widecol-data`.

mod cells;

pub use cells::{Cell, RawRow};

use crate::error::{StoreError, StoreResult};

/// Separator between the column family and the qualifier inside a column
/// name (`info:name`). Family names may never contain it.
pub const FAMILY_SEPARATOR: char = ':';

/// [`FAMILY_SEPARATOR`] as a byte, for splitting raw column names.
pub const FAMILY_SEPARATOR_BYTE: u8 = b':';

/// Checks that a family name can appear in a column name.
pub fn validate_family(family: &str) -> StoreResult<()> {
    if family.is_empty() {
        return Err(StoreError::InvalidFamily {
            family: String::new(),
            reason: "family name must not be empty".to_string(),
        });
    }
    if family.contains(FAMILY_SEPARATOR) {
        return Err(StoreError::InvalidFamily {
            family: family.to_string(),
            reason: format!("family name must not contain '{FAMILY_SEPARATOR}'"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_family() {
        assert!(validate_family("info").is_ok());
        assert!(matches!(
            validate_family(""),
            Err(StoreError::InvalidFamily { .. })
        ));
        assert!(matches!(
            validate_family("in:fo"),
            Err(StoreError::InvalidFamily { .. })
        ));
    }
}
