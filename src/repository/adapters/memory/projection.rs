//! Field selection.

use serde_json::{Map, Value};

use super::path;
use crate::repository::domain::{ID_FIELD, Projection};
use crate::repository::ports::StoreResult;

/// Returns the fields of `document` selected by `projection`.
///
/// Inclusions always keep `_id`.
pub(super) fn apply(
    document: &Map<String, Value>,
    projection: &Projection,
) -> StoreResult<Map<String, Value>> {
    match projection {
        Projection::Include(fields) => {
            let mut selected = Map::new();
            if let Some(id) = document.get(ID_FIELD) {
                selected.insert(ID_FIELD.to_owned(), id.clone());
            }
            for field in fields {
                if let Some(value) = path::get(document, field) {
                    path::set(&mut selected, field, value.clone())?;
                }
            }
            Ok(selected)
        }
        Projection::Exclude(fields) => {
            let mut remaining = document.clone();
            for field in fields {
                path::remove(&mut remaining, field);
            }
            Ok(remaining)
        }
    }
}
