//! Dotted-path access into documents.

use serde_json::{Map, Value};

use crate::repository::ports::{StoreError, StoreResult};

/// Value at a dotted `path`, descending through nested objects.
pub(super) fn get<'doc>(document: &'doc Map<String, Value>, path: &str) -> Option<&'doc Value> {
    let mut segments = path.split('.');
    let first = segments.next()?;
    segments.try_fold(document.get(first)?, |current, segment| match current {
        Value::Object(fields) => fields.get(segment),
        _ => None,
    })
}

/// Sets the value at `path`, creating intermediate objects.
pub(super) fn set(document: &mut Map<String, Value>, path: &str, value: Value) -> StoreResult<()> {
    match path.split_once('.') {
        None => {
            document.insert(path.to_owned(), value);
            Ok(())
        }
        Some((head, rest)) => {
            let child = document
                .entry(head.to_owned())
                .or_insert_with(|| Value::Object(Map::new()));
            match child {
                Value::Object(fields) => set(fields, rest, value),
                _ => Err(StoreError::InvalidUpdate(format!(
                    "cannot create field '{rest}' inside non-object '{head}'"
                ))),
            }
        }
    }
}

/// Removes the value at `path`, returning it.
pub(super) fn remove(document: &mut Map<String, Value>, path: &str) -> Option<Value> {
    match path.split_once('.') {
        None => document.remove(path),
        Some((head, rest)) => match document.get_mut(head)? {
            Value::Object(fields) => remove(fields, rest),
            _ => None,
        },
    }
}

/// Resolves a `"$field"` expression against `document`; other values are
/// literals.
pub(super) fn resolve(document: &Map<String, Value>, expression: &Value) -> Value {
    match expression {
        Value::String(reference) => match reference.strip_prefix('$') {
            Some(field) => get(document, field).cloned().unwrap_or(Value::Null),
            None => expression.clone(),
        },
        _ => expression.clone(),
    }
}
