//! Mapping of backend-native column types onto logical types.
//!
//! Used when reverse engineering an existing schema: a native type string
//! such as `VARCHAR(255)` or `int(10) unsigned` is parsed and mapped onto
//! candidate logical types plus length, sign and width attributes.

use sqlport_core::{Backend, Error, NativeTypeMapping, Result};

const OPERATION: &str = "map_native_type";

/// Parsed native type with extracted metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedNativeType {
    /// Base type name, uppercased (e.g. VARCHAR, DOUBLE PRECISION)
    pub base_type: String,
    /// Length for character and integer types (e.g. VARCHAR(255) -> 255)
    pub length: Option<u32>,
    /// Precision for numeric types (e.g. DECIMAL(10,2) -> 10)
    pub precision: Option<u32>,
    /// Scale for numeric types (e.g. DECIMAL(10,2) -> 2)
    pub scale: Option<u32>,
    /// Whether the type is unsigned (MySQL)
    pub unsigned: bool,
    /// Whether this is an array type (PostgreSQL)
    pub array: bool,
}

impl ParsedNativeType {
    /// Parse a native type string into structured metadata.
    ///
    /// # Examples
    /// - `VARCHAR(255)` -> base_type: "VARCHAR", length: 255
    /// - `DECIMAL(10,2)` -> base_type: "DECIMAL", precision: 10, scale: 2
    /// - `int(10) unsigned zerofill` -> base_type: "INT", length: 10, unsigned
    /// - `TEXT[]` -> base_type: "TEXT", array: true
    pub fn parse(type_str: &str) -> Self {
        let mut type_str = type_str.trim().to_uppercase();

        let array = type_str.ends_with("[]");
        if array {
            type_str.truncate(type_str.len() - 2);
        }

        let mut words: Vec<&str> = Vec::new();
        let mut params = None;
        let mut rest = type_str.as_str();
        while !rest.is_empty() {
            if let Some(open) = rest.find('(') {
                let close = rest[open..].find(')').map_or(rest.len(), |i| open + i);
                words.extend(rest[..open].split_whitespace());
                if params.is_none() {
                    params = Some(rest[open + 1..close].to_string());
                }
                rest = rest.get(close + 1..).unwrap_or_default();
            } else {
                words.extend(rest.split_whitespace());
                rest = "";
            }
        }

        let unsigned = words.iter().any(|word| *word == "UNSIGNED");
        let base_type = words
            .iter()
            .copied()
            .filter(|word| !matches!(*word, "UNSIGNED" | "SIGNED" | "ZEROFILL"))
            .collect::<Vec<_>>()
            .join(" ");

        let mut parsed = Self {
            base_type,
            unsigned,
            array,
            ..Self::default()
        };
        if let Some(params) = params {
            let mut parts = params.split(',').map(|part| part.trim().parse::<u32>().ok());
            let first = parts.next().flatten();
            match parts.next() {
                Some(scale) => {
                    parsed.precision = first;
                    parsed.scale = scale;
                }
                None => parsed.length = first,
            }
        }
        parsed
    }

    /// Check if this is a text type.
    pub fn is_text(&self) -> bool {
        matches!(
            self.base_type.as_str(),
            "CHAR"
                | "CHARACTER"
                | "NCHAR"
                | "BPCHAR"
                | "VARCHAR"
                | "CHARACTER VARYING"
                | "NVARCHAR"
                | "VARCHAR2"
                | "TEXT"
                | "TINYTEXT"
                | "MEDIUMTEXT"
                | "LONGTEXT"
                | "CLOB"
        )
    }

    /// Check if this is an integer type.
    pub fn is_integer(&self) -> bool {
        integer_bytes(&self.base_type).is_some()
    }
}

/// Map a native type onto logical candidates.
///
/// A mapper registered under the lowercased leading word of `native` takes
/// precedence over the built-in table.
pub fn map_native_type(backend: &dyn Backend, native: &str) -> Result<NativeTypeMapping> {
    let leading = native
        .split(['(', ')', ',', ' '])
        .find(|token| !token.is_empty())
        .unwrap_or_default()
        .to_lowercase();
    if let Some(mapper) = backend.options().native_type_mapper_for(&leading) {
        tracing::debug!(native, mapper = %leading, "Using registered native type mapper");
        return mapper.map(backend, native);
    }

    let parsed = ParsedNativeType::parse(native);
    let mapping = map_parsed(&parsed).ok_or_else(|| {
        Error::unsupported(
            OPERATION,
            format!("unknown database attribute type: {native}"),
        )
    })?;
    tracing::trace!(native, types = ?mapping.types, "Mapped native type");
    Ok(mapping)
}

fn map_parsed(parsed: &ParsedNativeType) -> Option<NativeTypeMapping> {
    let base = parsed.base_type.as_str();

    if let Some(bytes) = integer_bytes(base) {
        if base == "TINYINT" && parsed.length == Some(1) {
            let mut mapping = NativeTypeMapping::new(["integer", "boolean"]);
            mapping.length = Some(1);
            mapping.unsigned = Some(parsed.unsigned);
            return Some(mapping);
        }
        let mut mapping = NativeTypeMapping::new(["integer"]);
        mapping.length = Some(bytes);
        mapping.unsigned = Some(parsed.unsigned);
        return Some(mapping);
    }

    let mapping = match base {
        "BOOL" | "BOOLEAN" => NativeTypeMapping::new(["boolean"]),
        "CHAR" | "CHARACTER" | "NCHAR" | "BPCHAR" => {
            let mut mapping = NativeTypeMapping::new(["text"]);
            mapping.length = parsed.length;
            mapping.fixed = Some(true);
            mapping
        }
        "VARCHAR" | "CHARACTER VARYING" | "NVARCHAR" | "VARCHAR2" => {
            let mut mapping = NativeTypeMapping::new(["text"]);
            mapping.length = parsed.length;
            mapping.fixed = Some(false);
            mapping
        }
        "TEXT" | "TINYTEXT" | "MEDIUMTEXT" | "LONGTEXT" | "CLOB" => {
            let mut mapping = NativeTypeMapping::new(["text", "clob"]);
            mapping.length = parsed.length;
            mapping.fixed = Some(false);
            mapping
        }
        "BLOB" | "TINYBLOB" | "MEDIUMBLOB" | "LONGBLOB" | "BYTEA" | "BINARY" | "VARBINARY" => {
            let mut mapping = NativeTypeMapping::new(["blob"]);
            mapping.length = parsed.length;
            mapping
        }
        "NUMERIC" | "DECIMAL" | "DEC" => {
            let mut mapping = NativeTypeMapping::new(["decimal"]);
            mapping.length = parsed.precision.or(parsed.length);
            mapping
        }
        "REAL" | "DOUBLE" | "DOUBLE PRECISION" | "FLOAT" | "FLOAT4" | "FLOAT8" => {
            NativeTypeMapping::new(["float"])
        }
        "DATE" => NativeTypeMapping::new(["date"]),
        "TIME" | "TIMETZ" | "TIME WITH TIME ZONE" | "TIME WITHOUT TIME ZONE" => {
            NativeTypeMapping::new(["time"])
        }
        "TIMESTAMP"
        | "TIMESTAMPTZ"
        | "DATETIME"
        | "TIMESTAMP WITH TIME ZONE"
        | "TIMESTAMP WITHOUT TIME ZONE" => NativeTypeMapping::new(["timestamp"]),
        "YEAR" => {
            let mut mapping = NativeTypeMapping::new(["integer", "date"]);
            mapping.length = Some(2);
            mapping
        }
        "UUID" => NativeTypeMapping::new(["uuid"]),
        "JSON" => NativeTypeMapping::new(["json"]),
        "JSONB" => NativeTypeMapping::new(["jsonb"]),
        _ => return None,
    };
    Some(mapping)
}

/// Storage size in bytes of an integer type.
fn integer_bytes(base: &str) -> Option<u32> {
    match base {
        "TINYINT" => Some(1),
        "SMALLINT" | "INT2" | "SMALLSERIAL" => Some(2),
        "MEDIUMINT" => Some(3),
        "INT" | "INTEGER" | "INT4" | "SERIAL" => Some(4),
        "BIGINT" | "INT8" | "BIGSERIAL" => Some(8),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use sqlport_core::{AnsiBackend, NativeTypeMapper, Options};

    fn map(native: &str) -> NativeTypeMapping {
        map_native_type(&AnsiBackend::new("test"), native).unwrap()
    }

    #[test]
    fn test_parse() {
        let parsed = ParsedNativeType::parse("varchar(255)");
        assert_eq!(parsed.base_type, "VARCHAR");
        assert_eq!(parsed.length, Some(255));

        let parsed = ParsedNativeType::parse("DECIMAL(10, 2)");
        assert_eq!(parsed.precision, Some(10));
        assert_eq!(parsed.scale, Some(2));
        assert_eq!(parsed.length, None);

        let parsed = ParsedNativeType::parse("int(10) unsigned zerofill");
        assert_eq!(parsed.base_type, "INT");
        assert_eq!(parsed.length, Some(10));
        assert!(parsed.unsigned);

        let parsed = ParsedNativeType::parse("text[]");
        assert!(parsed.array);
        assert!(parsed.is_text());

        let parsed = ParsedNativeType::parse("character varying(32)");
        assert_eq!(parsed.base_type, "CHARACTER VARYING");
        assert_eq!(parsed.length, Some(32));

        let parsed = ParsedNativeType::parse("timestamp(6) with time zone");
        assert_eq!(parsed.base_type, "TIMESTAMP WITH TIME ZONE");
        assert_eq!(parsed.length, Some(6));
    }

    #[test]
    fn test_integers() {
        let mapping = map("BIGINT UNSIGNED");
        assert_eq!(mapping.types, vec!["integer"]);
        assert_eq!(mapping.length, Some(8));
        assert_eq!(mapping.unsigned, Some(true));

        let mapping = map("smallint");
        assert_eq!(mapping.length, Some(2));
        assert_eq!(mapping.unsigned, Some(false));

        assert!(ParsedNativeType::parse("serial").is_integer());
        assert_eq!(map("tinyint(1)").types, vec!["integer", "boolean"]);
    }

    #[test]
    fn test_text_family() {
        let mapping = map("CHAR(3)");
        assert_eq!(mapping.types, vec!["text"]);
        assert_eq!(mapping.length, Some(3));
        assert_eq!(mapping.fixed, Some(true));

        let mapping = map("varchar(40)");
        assert_eq!(mapping.fixed, Some(false));

        assert_eq!(map("longtext").types, vec!["text", "clob"]);
        assert_eq!(map("bytea").types, vec!["blob"]);
    }

    #[test]
    fn test_numbers_and_temporal() {
        assert_eq!(map("numeric(12,2)").length, Some(12));
        assert_eq!(map("double precision").types, vec!["float"]);
        assert_eq!(map("datetime").types, vec!["timestamp"]);
        assert_eq!(map("timestamp with time zone").types, vec!["timestamp"]);
        assert_eq!(map("year").types, vec!["integer", "date"]);
        assert_eq!(map("jsonb").types, vec!["jsonb"]);
    }

    #[test]
    fn test_unknown_native_type() {
        let err = map_native_type(&AnsiBackend::new("test"), "geometry").unwrap_err();
        assert!(err.is_unsupported());
        assert_eq!(err.message(), "unknown database attribute type: geometry");
    }

    struct Geometry;

    impl NativeTypeMapper for Geometry {
        fn map(&self, _backend: &dyn Backend, native: &str) -> Result<NativeTypeMapping> {
            let mut mapping = NativeTypeMapping::new(["text"]);
            mapping.length = u32::try_from(native.len()).ok();
            Ok(mapping)
        }
    }

    #[test]
    fn test_registered_mapper_wins() {
        let backend = AnsiBackend::new("test").with_options(
            Options::new()
                .register_native_type_mapper("GEOMETRY", Arc::new(Geometry))
                .register_native_type_mapper("int", Arc::new(Geometry)),
        );
        let mapping = map_native_type(&backend, "geometry(point)").unwrap();
        assert_eq!(mapping.types, vec!["text"]);
        assert_eq!(mapping.length, Some(15));

        let mapping = map_native_type(&backend, "INT(11)").unwrap();
        assert_eq!(mapping.types, vec!["text"]);
    }
}
