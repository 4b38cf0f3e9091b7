//! Aggregation pipeline evaluation.

use std::collections::HashMap;

use serde_json::{Map, Value, json};

use super::ordering::{compare, equal};
use super::update::add_numbers;
use super::filter::Matcher;
use super::{ordering, path};
use crate::repository::domain::{Document, ID_FIELD, Sort, SortDirection};
use crate::repository::ports::{StoreError, StoreResult};

fn malformed(stage: &str, reason: &str) -> StoreError {
    StoreError::UnsupportedStage(format!("{stage} ({reason})"))
}

/// Runs `pipeline` over `source`; `$lookup` reads from `collections`.
pub(super) fn run(
    collections: &HashMap<String, Vec<Document>>,
    source: &[Document],
    pipeline: &[Value],
) -> StoreResult<Vec<Value>> {
    let mut documents = source.to_vec();
    for stage in pipeline {
        let (name, spec) = stage
            .as_object()
            .filter(|fields| fields.len() == 1)
            .and_then(|fields| fields.iter().next())
            .ok_or_else(|| StoreError::UnsupportedStage(stage.to_string()))?;
        documents = match name.as_str() {
            "$match" => match_stage(documents, spec)?,
            "$sort" => sort_stage(documents, spec)?,
            "$skip" => {
                let count = count_argument(spec, name)?;
                documents.into_iter().skip(count).collect()
            }
            "$limit" => {
                let count = count_argument(spec, name)?;
                documents.into_iter().take(count).collect()
            }
            "$project" => project_stage(&documents, spec)?,
            "$count" => count_stage(&documents, spec)?,
            "$group" => group_stage(&documents, spec)?,
            "$lookup" => lookup_stage(documents, spec, collections)?,
            "$unwind" => unwind_stage(documents, spec)?,
            other => return Err(StoreError::UnsupportedStage(other.to_owned())),
        };
    }
    Ok(documents.into_iter().map(Value::Object).collect())
}

fn match_stage(documents: Vec<Document>, spec: &Value) -> StoreResult<Vec<Document>> {
    let conditions = spec
        .as_object()
        .ok_or_else(|| malformed("$match", "expects an object"))?;
    let matcher = Matcher::compile(conditions)?;
    let mut kept = Vec::with_capacity(documents.len());
    for document in documents {
        if matcher.matches(&document)? {
            kept.push(document);
        }
    }
    Ok(kept)
}

fn sort_stage(mut documents: Vec<Document>, spec: &Value) -> StoreResult<Vec<Document>> {
    let keys = spec
        .as_object()
        .ok_or_else(|| malformed("$sort", "expects an object"))?;
    let mut sort = Sort::new();
    for (field, direction) in keys {
        let parsed: SortDirection = SortDirection::from_value(direction)
            .ok_or_else(|| malformed("$sort", "direction must be 1 or -1"))?;
        sort = sort.by(field.as_str(), parsed);
    }
    ordering::sort_documents(&mut documents, &sort);
    Ok(documents)
}

fn count_argument(spec: &Value, stage: &str) -> StoreResult<usize> {
    spec.as_u64()
        .and_then(|count| usize::try_from(count).ok())
        .ok_or_else(|| malformed(stage, "expects a non-negative integer"))
}

fn project_stage(documents: &[Document], spec: &Value) -> StoreResult<Vec<Document>> {
    let fields = spec
        .as_object()
        .ok_or_else(|| malformed("$project", "expects an object"))?;
    let is_exclusion =
        |value: &Value| matches!(value, Value::Bool(false)) || value.as_i64() == Some(0);
    let inclusive = fields
        .iter()
        .any(|(field, value)| field != ID_FIELD && !is_exclusion(value));

    documents
        .iter()
        .map(|document| {
            if !inclusive {
                let mut remaining = document.clone();
                for field in fields.keys() {
                    path::remove(&mut remaining, field);
                }
                return Ok(remaining);
            }
            let mut projected = Map::new();
            let keep_id = fields.get(ID_FIELD).is_none_or(|value| !is_exclusion(value));
            if keep_id && let Some(id) = document.get(ID_FIELD) {
                projected.insert(ID_FIELD.to_owned(), id.clone());
            }
            for (field, value) in fields {
                if field == ID_FIELD && is_exclusion(value) {
                    continue;
                }
                let selected = match value {
                    Value::String(_) => Some(path::resolve(document, value)),
                    Value::Bool(true) => path::get(document, field).cloned(),
                    Value::Number(flag) if flag.as_i64() == Some(1) => {
                        path::get(document, field).cloned()
                    }
                    _ if is_exclusion(value) => {
                        return Err(malformed("$project", "cannot mix inclusion and exclusion"));
                    }
                    literal => Some(literal.clone()),
                };
                if let Some(found) = selected {
                    path::set(&mut projected, field, found)?;
                }
            }
            Ok(projected)
        })
        .collect()
}

fn count_stage(documents: &[Document], spec: &Value) -> StoreResult<Vec<Document>> {
    let field = spec
        .as_str()
        .filter(|name| !name.is_empty() && !name.starts_with('$'))
        .ok_or_else(|| malformed("$count", "expects a field name"))?;
    if documents.is_empty() {
        return Ok(Vec::new());
    }
    let mut counted = Map::new();
    counted.insert(field.to_owned(), Value::from(documents.len()));
    Ok(vec![counted])
}

#[derive(Clone, Copy)]
enum Accumulator {
    Sum,
    Push,
    First,
    Min,
    Max,
}

impl Accumulator {
    fn parse(operator: &str) -> StoreResult<Self> {
        match operator {
            "$sum" => Ok(Self::Sum),
            "$push" => Ok(Self::Push),
            "$first" => Ok(Self::First),
            "$min" => Ok(Self::Min),
            "$max" => Ok(Self::Max),
            other => Err(StoreError::UnsupportedStage(format!(
                "$group accumulator {other}"
            ))),
        }
    }

    fn initial(self) -> Value {
        match self {
            Self::Sum => json!(0),
            Self::Push => Value::Array(Vec::new()),
            Self::First | Self::Min | Self::Max => Value::Null,
        }
    }

    fn accumulate(self, state: &mut Value, input: Value, first: bool) {
        match self {
            Self::Sum => {
                if let (Value::Number(total), Value::Number(step)) = (&*state, &input)
                    && let Some(next) = add_numbers(total, step)
                {
                    *state = Value::Number(next);
                }
            }
            Self::Push => {
                if let Value::Array(items) = state {
                    items.push(input);
                }
            }
            Self::First => {
                if first {
                    *state = input;
                }
            }
            Self::Min | Self::Max => {
                if input.is_null() {
                    return;
                }
                let ordering = compare(Some(&input), Some(&*state));
                let replace = state.is_null()
                    || (matches!(self, Self::Min) && ordering.is_lt())
                    || (matches!(self, Self::Max) && ordering.is_gt());
                if replace {
                    *state = input;
                }
            }
        }
    }
}

fn evaluate_key(document: &Document, expression: &Value) -> Value {
    match expression {
        Value::Object(fields) => Value::Object(
            fields
                .iter()
                .map(|(name, inner)| (name.clone(), path::resolve(document, inner)))
                .collect(),
        ),
        other => path::resolve(document, other),
    }
}

fn group_stage(documents: &[Document], spec: &Value) -> StoreResult<Vec<Document>> {
    let fields = spec
        .as_object()
        .ok_or_else(|| malformed("$group", "expects an object"))?;
    let key_expression = fields
        .get(ID_FIELD)
        .ok_or_else(|| malformed("$group", "requires an _id expression"))?;

    let mut accumulators = Vec::new();
    for (name, definition) in fields.iter().filter(|(name, _)| *name != ID_FIELD) {
        let (operator, argument) = definition
            .as_object()
            .filter(|entry| entry.len() == 1)
            .and_then(|entry| entry.iter().next())
            .ok_or_else(|| malformed("$group", "accumulators take one operator"))?;
        accumulators.push((name.clone(), Accumulator::parse(operator)?, argument));
    }

    let mut groups: Vec<(Value, Document)> = Vec::new();
    for document in documents {
        let key = evaluate_key(document, key_expression);
        let position = groups
            .iter()
            .position(|(existing, _)| equal(Some(existing), Some(&key)));
        let (index, first) = match position {
            Some(index) => (index, false),
            None => {
                let mut state = Map::new();
                state.insert(ID_FIELD.to_owned(), key.clone());
                for (name, accumulator, _) in &accumulators {
                    state.insert(name.clone(), accumulator.initial());
                }
                groups.push((key, state));
                (groups.len().saturating_sub(1), true)
            }
        };
        let Some((_, state)) = groups.get_mut(index) else {
            continue;
        };
        for (name, accumulator, argument) in &accumulators {
            let input = path::resolve(document, argument);
            if let Some(slot) = state.get_mut(name) {
                accumulator.accumulate(slot, input, first);
            }
        }
    }
    Ok(groups.into_iter().map(|(_, state)| state).collect())
}

fn string_field<'spec>(spec: &'spec Map<String, Value>, field: &str) -> StoreResult<&'spec str> {
    spec.get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| malformed("$lookup", "requires from, localField, foreignField and as"))
}

fn lookup_stage(
    documents: Vec<Document>,
    spec: &Value,
    collections: &HashMap<String, Vec<Document>>,
) -> StoreResult<Vec<Document>> {
    let fields = spec
        .as_object()
        .ok_or_else(|| malformed("$lookup", "expects an object"))?;
    let from = string_field(fields, "from")?;
    let local_field = string_field(fields, "localField")?;
    let foreign_field = string_field(fields, "foreignField")?;
    let target = string_field(fields, "as")?;
    let foreign = collections.get(from).map(Vec::as_slice).unwrap_or_default();

    let mut joined = Vec::with_capacity(documents.len());
    for mut document in documents {
        let local = path::get(&document, local_field).cloned();
        let related: Vec<Value> = foreign
            .iter()
            .filter(|candidate| references(local.as_ref(), path::get(candidate, foreign_field)))
            .cloned()
            .map(Value::Object)
            .collect();
        path::set(&mut document, target, Value::Array(related))?;
        joined.push(document);
    }
    Ok(joined)
}

fn references(local: Option<&Value>, foreign: Option<&Value>) -> bool {
    match local {
        Some(Value::Array(items)) => items.iter().any(|item| equal(Some(item), foreign)),
        None => matches!(foreign, None | Some(Value::Null)),
        other => equal(other, foreign) || matches!((other, foreign), (Some(Value::Null), None)),
    }
}

fn unwind_stage(documents: Vec<Document>, spec: &Value) -> StoreResult<Vec<Document>> {
    let (reference, preserve) = match spec {
        Value::String(reference) => (reference.as_str(), false),
        Value::Object(options) => (
            options
                .get("path")
                .and_then(Value::as_str)
                .ok_or_else(|| malformed("$unwind", "requires a path"))?,
            options
                .get("preserveNullAndEmptyArrays")
                .and_then(Value::as_bool)
                .unwrap_or(false),
        ),
        _ => return Err(malformed("$unwind", "expects a field path")),
    };
    let field = reference
        .strip_prefix('$')
        .ok_or_else(|| malformed("$unwind", "path must start with $"))?;

    let mut unwound = Vec::new();
    for document in documents {
        match path::get(&document, field) {
            Some(Value::Array(items)) if !items.is_empty() => {
                for item in items.clone() {
                    let mut copy = document.clone();
                    path::set(&mut copy, field, item)?;
                    unwound.push(copy);
                }
            }
            Some(Value::Array(_)) | None | Some(Value::Null) => {
                if preserve {
                    unwound.push(document);
                }
            }
            Some(_) => unwound.push(document),
        }
    }
    Ok(unwound)
}
