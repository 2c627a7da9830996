//! Column definition diffing.
//!
//! Compares a column definition against its previous version and reports
//! which attributes changed, or that the column has to be redefined.

use sqlport_core::{
    Backend, ChangeSet, ColumnChange, Error, FieldDefinition, LogicalType, Resolved, Result,
    resolve,
};

const OPERATION: &str = "compare_definition";

/// Compare `current` against `previous`.
///
/// A different (or missing) previous type yields [`ChangeSet::Redefine`]
/// carrying `current`. Type names are compared after alias mapping, so
/// an alias and its target are the same type.
pub fn diff(
    backend: &dyn Backend,
    current: &FieldDefinition,
    previous: &FieldDefinition,
) -> Result<ChangeSet> {
    let type_name = current.type_name.as_deref().unwrap_or_default();
    let ty = match resolve(backend.options(), type_name) {
        Resolved::Builtin(ty) => ty,
        Resolved::Extension {
            name, extension, ..
        } => return extension.diff(backend, &name, current, previous),
        Resolved::Unknown(name) => {
            return Err(Error::unsupported(
                OPERATION,
                format!("type \"{name}\" is not yet supported"),
            ));
        }
    };

    let previous_ty = previous
        .type_name
        .as_deref()
        .and_then(|name| resolve(backend.options(), name).builtin());
    if previous_ty != Some(ty) {
        tracing::debug!(
            type_name = ty.name(),
            previous = ?previous.type_name,
            "Column type changed, redefining"
        );
        return Ok(ChangeSet::Redefine(current.clone()));
    }

    let mut changes = ChangeSet::unchanged();
    match ty {
        LogicalType::Integer => {
            if current.unsigned != previous.unsigned {
                changes.insert(ColumnChange::Unsigned);
            }
            if current.autoincrement != previous.autoincrement {
                changes.insert(ColumnChange::Autoincrement);
            }
        }
        LogicalType::Text | LogicalType::Clob | LogicalType::Blob => {
            if current.length.unwrap_or(0) != previous.length.unwrap_or(0) {
                changes.insert(ColumnChange::Length);
            }
            if current.fixed != previous.fixed {
                changes.insert(ColumnChange::Fixed);
            }
        }
        _ => {}
    }

    if current.notnull != previous.notnull {
        changes.insert(ColumnChange::NotNull);
    }
    if current.effective_default() != previous.effective_default() {
        changes.insert(ColumnChange::Default);
    }

    tracing::trace!(type_name = ty.name(), changes = changes.len(), "Compared column definitions");
    Ok(changes)
}
