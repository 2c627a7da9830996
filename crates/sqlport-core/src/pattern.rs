//! LIKE pattern construction.

use crate::backend::Backend;
use crate::error::{Error, Result};

const OPERATION: &str = "match_pattern";

/// Build a LIKE expression from alternating literal and wildcard segments.
///
/// Even segments are literals and get escaped (quotes and wildcards), odd
/// segments are wildcards (`%`, `_`) and are copied verbatim. With an
/// operator the result is prefixed by it (and the field, if given). The
/// case-insensitive forms `ILIKE` / `NOT ILIKE` require a field and are
/// rendered as `lower(field) LIKE ...`.
///
/// ```
/// use sqlport_core::backend::AnsiBackend;
/// use sqlport_core::pattern::match_pattern;
///
/// let backend = AnsiBackend::new("db");
/// let sql = match_pattern(&backend, &["100%", "%"], Some("LIKE"), Some("label")).unwrap();
/// assert_eq!(sql, "label LIKE '100\\%%' ESCAPE '\\'");
/// ```
pub fn match_pattern<S: AsRef<str>>(
    backend: &dyn Backend,
    segments: &[S],
    operator: Option<&str>,
    field: Option<&str>,
) -> Result<String> {
    let mut sql = match operator {
        Some(operator) => operator_prefix(backend, operator, field)?,
        None => String::new(),
    };

    let quoting = backend.string_quoting();
    sql.push(quoting.start);
    for (index, segment) in segments.iter().enumerate() {
        let segment = segment.as_ref();
        if index % 2 == 1 {
            sql.push_str(segment);
        } else {
            let escaped = backend.escape(segment, false)?;
            sql.push_str(&backend.escape_pattern(&escaped));
        }
    }
    sql.push(quoting.end);
    sql.push_str(&backend.pattern_escape_string());

    tracing::trace!(sql = %sql, "Built pattern match");
    Ok(sql)
}

fn operator_prefix(backend: &dyn Backend, operator: &str, field: Option<&str>) -> Result<String> {
    let operator = operator.to_ascii_uppercase();
    match operator.as_str() {
        "LIKE" | "NOT LIKE" => Ok(match field {
            Some(field) => format!("{field} {operator} "),
            None => format!("{operator} "),
        }),
        "ILIKE" | "NOT ILIKE" => {
            let Some(field) = field else {
                return Err(Error::unsupported(
                    OPERATION,
                    format!("case insensitive {operator} matching requires passing the field name"),
                ));
            };
            let lowered = match backend.functions() {
                Some(functions) => functions.lower(field),
                None => format!("LOWER({field})"),
            };
            let like = if operator == "ILIKE" { "LIKE" } else { "NOT LIKE" };
            Ok(format!("{lowered} {like} "))
        }
        _ => Err(Error::unsupported(
            OPERATION,
            format!("not a supported operator type:{operator}"),
        )),
    }
}
