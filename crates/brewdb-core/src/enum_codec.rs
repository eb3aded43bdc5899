//! Enum codec
//!
//! Translates between native enum discriminants and the strings stored in the
//! database. Decoding an unknown string logs and falls back to
//! [`FALLBACK_NATIVE`]; encoding an unknown native value is an error.

use crate::descriptor::{EnumAndItsDbString, FieldSimpleDefn, FieldType};
use crate::errors::{RecordError, Result};

/// Native value substituted when a stored string has no mapping
pub const FALLBACK_NATIVE: i32 = 0;

fn mapping_of(field: &FieldSimpleDefn) -> Result<&'static [EnumAndItsDbString]> {
    match (field.field_type, field.enum_mapping) {
        (FieldType::Enum, Some(mapping)) => Ok(mapping),
        _ => Err(RecordError::NotAnEnumField {
            column: field.column_name.to_string(),
        }),
    }
}

/// Decode a database string to its native value
///
/// A load must survive a bad value in the database, so an unknown string
/// yields [`FALLBACK_NATIVE`] and an error log instead of failing.
///
/// # Errors
///
/// Returns `NotAnEnumField` if `field` is not an enum field.
pub fn string_to_enum(field: &FieldSimpleDefn, db_value: &str) -> Result<i32> {
    let mapping = mapping_of(field)?;
    match mapping.iter().find(|entry| entry.string == db_value) {
        Some(entry) => Ok(entry.native),
        None => {
            tracing::error!(
                component = module_path!(),
                column = field.column_name,
                property = field.property_name,
                db_value,
                fallback = FALLBACK_NATIVE,
                "Could not decode stored string to enum; using fallback"
            );
            Ok(FALLBACK_NATIVE)
        }
    }
}

/// Encode a native value to the string stored in the database
///
/// # Errors
///
/// Returns `UnmappedEnum` if the value has no mapping and `NotAnEnumField` if
/// `field` is not an enum field.
pub fn enum_to_string(field: &FieldSimpleDefn, native: i32) -> Result<&'static str> {
    mapping_of(field)?
        .iter()
        .find(|entry| entry.native == native)
        .map(|entry| entry.string)
        .ok_or_else(|| RecordError::UnmappedEnum {
            column: field.column_name.to_string(),
            native,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    static SALT_TYPE: [EnumAndItsDbString; 4] = [
        EnumAndItsDbString::new(0, "CaCl2"),
        EnumAndItsDbString::new(1, "CaCO3"),
        EnumAndItsDbString::new(2, "CaSO4"),
        EnumAndItsDbString::new(7, "H3PO4"),
    ];

    static SALT_FIELD: FieldSimpleDefn =
        FieldSimpleDefn::enumeration("salt_type", "type", &SALT_TYPE);

    #[test]
    fn test_decode_known_string() {
        assert_eq!(string_to_enum(&SALT_FIELD, "CaSO4").unwrap(), 2);
        assert_eq!(string_to_enum(&SALT_FIELD, "H3PO4").unwrap(), 7);
    }

    #[test]
    fn test_decode_unknown_string_falls_back() {
        assert_eq!(string_to_enum(&SALT_FIELD, "Gypsum").unwrap(), FALLBACK_NATIVE);
        assert_eq!(string_to_enum(&SALT_FIELD, "").unwrap(), FALLBACK_NATIVE);
    }

    #[test]
    fn test_encode_unknown_native_is_error() {
        let err = enum_to_string(&SALT_FIELD, 3).unwrap_err();
        assert_eq!(
            err,
            RecordError::UnmappedEnum {
                column: "salt_type".to_string(),
                native: 3
            }
        );
    }

    #[test]
    fn test_non_enum_field_rejected() {
        let name = FieldSimpleDefn::new(FieldType::String, "name", "name");
        assert!(matches!(
            string_to_enum(&name, "x"),
            Err(RecordError::NotAnEnumField { .. })
        ));
        assert!(matches!(
            enum_to_string(&name, 0),
            Err(RecordError::NotAnEnumField { .. })
        ));
    }

    proptest! {
        #[test]
        fn prop_every_mapped_native_round_trips(index in 0usize..SALT_TYPE.len()) {
            let native = SALT_TYPE[index].native;
            let encoded = enum_to_string(&SALT_FIELD, native).unwrap();
            prop_assert_eq!(string_to_enum(&SALT_FIELD, encoded).unwrap(), native);
        }

        #[test]
        fn prop_unmapped_natives_never_encode(native in any::<i32>()) {
            prop_assume!(!SALT_TYPE.iter().any(|e| e.native == native));
            prop_assert!(enum_to_string(&SALT_FIELD, native).is_err());
        }
    }
}
