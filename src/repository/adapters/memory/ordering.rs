//! Total ordering across JSON values.
//!
//! Values of different types order by type rank (missing and null first,
//! then numbers, strings, objects, arrays, booleans); values of the same
//! type order naturally.

use std::cmp::Ordering;

use serde_json::{Number, Value};

use super::path;
use crate::repository::domain::{Document, Sort, SortDirection};

const fn type_rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 0,
        Some(Value::Number(_)) => 1,
        Some(Value::String(_)) => 2,
        Some(Value::Object(_)) => 3,
        Some(Value::Array(_)) => 4,
        Some(Value::Bool(_)) => 5,
    }
}

/// Returns `true` when both values are of the same comparable type.
pub(super) const fn same_type(left: Option<&Value>, right: Option<&Value>) -> bool {
    type_rank(left) == type_rank(right)
}

fn compare_numbers(left: &Number, right: &Number) -> Ordering {
    if let (Some(a), Some(b)) = (left.as_i64(), right.as_i64()) {
        return a.cmp(&b);
    }
    if let (Some(a), Some(b)) = (left.as_u64(), right.as_u64()) {
        return a.cmp(&b);
    }
    match (left.as_f64(), right.as_f64()) {
        (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        _ => Ordering::Equal,
    }
}

/// Compares two possibly-missing values.
pub(super) fn compare(left: Option<&Value>, right: Option<&Value>) -> Ordering {
    match (left, right) {
        (Some(Value::Number(a)), Some(Value::Number(b))) => compare_numbers(a, b),
        (Some(Value::String(a)), Some(Value::String(b))) => a.cmp(b),
        (Some(Value::Bool(a)), Some(Value::Bool(b))) => a.cmp(b),
        (Some(Value::Array(a)), Some(Value::Array(b))) => a
            .iter()
            .zip(b)
            .map(|(x, y)| compare(Some(x), Some(y)))
            .find(|ordering| ordering.is_ne())
            .unwrap_or_else(|| a.len().cmp(&b.len())),
        (Some(Value::Object(a)), Some(Value::Object(b))) => a
            .iter()
            .zip(b)
            .map(|((key_a, x), (key_b, y))| {
                key_a.cmp(key_b).then_with(|| compare(Some(x), Some(y)))
            })
            .find(|ordering| ordering.is_ne())
            .unwrap_or_else(|| a.len().cmp(&b.len())),
        _ => type_rank(left).cmp(&type_rank(right)),
    }
}

/// Equality with numeric normalisation (`1 == 1.0`).
pub(super) fn equal(left: Option<&Value>, right: Option<&Value>) -> bool {
    same_type(left, right) && compare(left, right).is_eq()
}

/// Stable sort of `documents` by `sort`.
pub(super) fn sort_documents(documents: &mut [Document], sort: &Sort) {
    if sort.is_empty() {
        return;
    }
    documents.sort_by(|left, right| {
        sort.keys()
            .iter()
            .map(|(field, direction)| {
                let ordering = compare(path::get(left, field), path::get(right, field));
                match direction {
                    SortDirection::Ascending => ordering,
                    SortDirection::Descending => ordering.reverse(),
                }
            })
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    });
}
