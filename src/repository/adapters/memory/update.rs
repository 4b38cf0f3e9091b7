//! Update operator evaluation.

use serde_json::{Map, Number, Value};

use super::path;
use crate::repository::domain::ID_FIELD;
use crate::repository::ports::{StoreError, StoreResult};

fn invalid(message: impl Into<String>) -> StoreError {
    StoreError::InvalidUpdate(message.into())
}

/// Applies `update` to a copy of `document`.
///
/// An update without operators replaces the named fields as `$set` would.
pub(super) fn apply(
    document: &Map<String, Value>,
    update: &Map<String, Value>,
) -> StoreResult<Map<String, Value>> {
    let operator_count = update.keys().filter(|key| key.starts_with('$')).count();
    if operator_count != 0 && operator_count != update.len() {
        return Err(invalid("cannot mix update operators with plain fields"));
    }

    let mut next = document.clone();
    if operator_count == 0 {
        apply_set(&mut next, update)?;
        return Ok(next);
    }
    for (operator, argument) in update {
        let Value::Object(fields) = argument else {
            return Err(invalid(format!("{operator} expects an object")));
        };
        match operator.as_str() {
            "$set" => apply_set(&mut next, fields)?,
            "$unset" => apply_unset(&mut next, fields)?,
            "$inc" => apply_inc(&mut next, fields)?,
            "$push" => apply_push(&mut next, fields)?,
            other => return Err(invalid(format!("unknown update operator {other}"))),
        }
    }
    Ok(next)
}

fn guard_id(field: &str) -> StoreResult<()> {
    if field == ID_FIELD || field.starts_with("_id.") {
        return Err(invalid("_id is immutable"));
    }
    Ok(())
}

fn apply_set(document: &mut Map<String, Value>, fields: &Map<String, Value>) -> StoreResult<()> {
    for (field, value) in fields {
        guard_id(field)?;
        path::set(document, field, value.clone())?;
    }
    Ok(())
}

fn apply_unset(document: &mut Map<String, Value>, fields: &Map<String, Value>) -> StoreResult<()> {
    for field in fields.keys() {
        guard_id(field)?;
        path::remove(document, field);
    }
    Ok(())
}

fn apply_inc(document: &mut Map<String, Value>, fields: &Map<String, Value>) -> StoreResult<()> {
    for (field, amount) in fields {
        guard_id(field)?;
        let Value::Number(step) = amount else {
            return Err(invalid(format!("$inc amount for {field} must be a number")));
        };
        let next = match path::get(document, field) {
            None | Some(Value::Null) => step.clone(),
            Some(Value::Number(current)) => add_numbers(current, step)
                .ok_or_else(|| invalid(format!("$inc overflowed {field}")))?,
            Some(_) => return Err(invalid(format!("cannot $inc non-numeric field {field}"))),
        };
        path::set(document, field, Value::Number(next))?;
    }
    Ok(())
}

fn apply_push(document: &mut Map<String, Value>, fields: &Map<String, Value>) -> StoreResult<()> {
    for (field, value) in fields {
        guard_id(field)?;
        let additions = match value.get("$each") {
            Some(Value::Array(items)) => items.clone(),
            Some(_) => return Err(invalid("$each expects an array")),
            None => vec![value.clone()],
        };
        let mut items = match path::get(document, field) {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(existing)) => existing.clone(),
            Some(_) => return Err(invalid(format!("cannot $push to non-array field {field}"))),
        };
        items.extend(additions);
        path::set(document, field, Value::Array(items))?;
    }
    Ok(())
}

/// Adds two numbers, keeping integers exact.
///
/// Returns `None` when the result is not representable.
#[expect(
    clippy::float_arithmetic,
    reason = "non-integer JSON numbers can only be summed as floats"
)]
pub(super) fn add_numbers(left: &Number, right: &Number) -> Option<Number> {
    if let (Some(a), Some(b)) = (left.as_i64(), right.as_i64()) {
        return a.checked_add(b).map(Number::from);
    }
    if let (Some(a), Some(b)) = (left.as_u64(), right.as_u64()) {
        return a.checked_add(b).map(Number::from);
    }
    Number::from_f64(left.as_f64()? + right.as_f64()?)
}
