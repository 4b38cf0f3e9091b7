//! Filter evaluation.

use regex::{Regex, RegexBuilder};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::collections::hash_map::Entry;

use super::ordering::{compare, equal, same_type};
use super::path;
use crate::repository::ports::{StoreError, StoreResult};

fn invalid(message: impl Into<String>) -> StoreError {
    StoreError::InvalidFilter(message.into())
}

/// A filter with its `$regex` patterns compiled once for every document it
/// is evaluated against.
pub(super) struct Matcher<'filter> {
    filter: &'filter Map<String, Value>,
    patterns: Patterns<'filter>,
}

impl<'filter> Matcher<'filter> {
    /// Compiles every `$regex` in `filter`, including nested clauses.
    pub(super) fn compile(filter: &'filter Map<String, Value>) -> StoreResult<Self> {
        let mut patterns = HashMap::new();
        collect_filter_patterns(filter, &mut patterns)?;
        Ok(Self { filter, patterns })
    }

    /// Returns `true` when `document` satisfies every clause of the filter.
    pub(super) fn matches(&self, document: &Map<String, Value>) -> StoreResult<bool> {
        self.matches_clause(document, self.filter)
    }

    fn matches_clause(
        &self,
        document: &Map<String, Value>,
        filter: &Map<String, Value>,
    ) -> StoreResult<bool> {
        for (key, condition) in filter {
            let satisfied = match key.as_str() {
                "$and" => self.every_clause(document, &clauses(condition, key)?)?,
                "$or" => self.any_clause(document, &clauses(condition, key)?)?,
                "$nor" => !self.any_clause(document, &clauses(condition, key)?)?,
                "$text" => text_search(document, condition)?,
                operator if operator.starts_with('$') => {
                    return Err(invalid(format!("unknown top-level operator {operator}")));
                }
                field => self.field_matches(path::get(document, field), condition)?,
            };
            if !satisfied {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn every_clause(
        &self,
        document: &Map<String, Value>,
        filters: &[&Map<String, Value>],
    ) -> StoreResult<bool> {
        for filter in filters {
            if !self.matches_clause(document, filter)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn any_clause(
        &self,
        document: &Map<String, Value>,
        filters: &[&Map<String, Value>],
    ) -> StoreResult<bool> {
        for filter in filters {
            if self.matches_clause(document, filter)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn field_matches(&self, actual: Option<&Value>, condition: &Value) -> StoreResult<bool> {
        let Some(operators) = condition.as_object().filter(|_| is_operator_object(condition))
        else {
            return Ok(value_equals(actual, condition));
        };
        for (operator, operand) in operators {
            let satisfied = match operator.as_str() {
                "$eq" => value_equals(actual, operand),
                "$ne" => !value_equals(actual, operand),
                "$gt" => compares(actual, operand, Ordering::is_gt),
                "$gte" => compares(actual, operand, Ordering::is_ge),
                "$lt" => compares(actual, operand, Ordering::is_lt),
                "$lte" => compares(actual, operand, Ordering::is_le),
                "$in" => in_list(actual, operand, "$in")?,
                "$nin" => !in_list(actual, operand, "$nin")?,
                "$exists" => {
                    let wanted = operand
                        .as_bool()
                        .ok_or_else(|| invalid("$exists expects a boolean"))?;
                    actual.is_some() == wanted
                }
                "$regex" => self.regex_matches(actual, operand, operators.get("$options"))?,
                "$options" => true,
                "$not" => !self.field_matches(actual, operand)?,
                other => return Err(invalid(format!("unknown operator {other}"))),
            };
            if !satisfied {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn regex_matches(
        &self,
        actual: Option<&Value>,
        pattern: &Value,
        options: Option<&Value>,
    ) -> StoreResult<bool> {
        let (source, flags) = regex_operands(pattern, options)?;
        let compiled;
        let regex = match self.patterns.get(&(source, flags)) {
            Some(cached) => cached,
            None => {
                compiled = build_regex(source, flags)?;
                &compiled
            }
        };
        Ok(match actual {
            Some(Value::String(text)) => regex.is_match(text),
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .any(|text| regex.is_match(text)),
            _ => false,
        })
    }
}

type Patterns<'filter> = HashMap<(&'filter str, &'filter str), Regex>;

fn collect_filter_patterns<'filter>(
    filter: &'filter Map<String, Value>,
    patterns: &mut Patterns<'filter>,
) -> StoreResult<()> {
    for (key, condition) in filter {
        match key.as_str() {
            "$and" | "$or" | "$nor" => {
                for clause in clauses(condition, key)? {
                    collect_filter_patterns(clause, patterns)?;
                }
            }
            operator if operator.starts_with('$') => {}
            _ => collect_condition_patterns(condition, patterns)?,
        }
    }
    Ok(())
}

fn collect_condition_patterns<'filter>(
    condition: &'filter Value,
    patterns: &mut Patterns<'filter>,
) -> StoreResult<()> {
    let Some(operators) = condition.as_object().filter(|_| is_operator_object(condition)) else {
        return Ok(());
    };
    if let Some(pattern) = operators.get("$regex") {
        let (source, flags) = regex_operands(pattern, operators.get("$options"))?;
        if let Entry::Vacant(slot) = patterns.entry((source, flags)) {
            slot.insert(build_regex(source, flags)?);
        }
    }
    if let Some(negated) = operators.get("$not") {
        collect_condition_patterns(negated, patterns)?;
    }
    Ok(())
}

fn regex_operands<'filter>(
    pattern: &'filter Value,
    options: Option<&'filter Value>,
) -> StoreResult<(&'filter str, &'filter str)> {
    let Value::String(source) = pattern else {
        return Err(invalid("$regex expects a string"));
    };
    let flags = match options {
        None => "",
        Some(Value::String(flags)) => flags.as_str(),
        Some(_) => return Err(invalid("$options expects a string")),
    };
    Ok((source.as_str(), flags))
}

fn clauses<'filter>(
    condition: &'filter Value,
    operator: &str,
) -> StoreResult<Vec<&'filter Map<String, Value>>> {
    let Value::Array(items) = condition else {
        return Err(invalid(format!("{operator} expects an array of filters")));
    };
    items
        .iter()
        .map(|item| {
            item.as_object()
                .ok_or_else(|| invalid(format!("{operator} expects an array of filters")))
        })
        .collect()
}

fn is_operator_object(condition: &Value) -> bool {
    condition
        .as_object()
        .is_some_and(|fields| !fields.is_empty() && fields.keys().all(|key| key.starts_with('$')))
}

/// Equality where an array field matches when any element is equal.
fn value_equals(actual: Option<&Value>, expected: &Value) -> bool {
    if expected.is_null() {
        return matches!(actual, None | Some(Value::Null));
    }
    if equal(actual, Some(expected)) {
        return true;
    }
    match actual {
        Some(Value::Array(items)) if !expected.is_array() => {
            items.iter().any(|item| equal(Some(item), Some(expected)))
        }
        _ => false,
    }
}

/// Ordered comparison; values of different types never match.
fn compares(actual: Option<&Value>, operand: &Value, accept: fn(Ordering) -> bool) -> bool {
    let candidates: Vec<&Value> = match actual {
        Some(Value::Array(items)) if !operand.is_array() => items.iter().collect(),
        Some(value) => vec![value],
        None => return false,
    };
    candidates.into_iter().any(|value| {
        same_type(Some(value), Some(operand)) && accept(compare(Some(value), Some(operand)))
    })
}

fn in_list(actual: Option<&Value>, operand: &Value, operator: &str) -> StoreResult<bool> {
    let Value::Array(options) = operand else {
        return Err(invalid(format!("{operator} expects an array")));
    };
    Ok(options.iter().any(|option| value_equals(actual, option)))
}

fn build_regex(pattern: &str, options: &str) -> StoreResult<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(options.contains('i'))
        .multi_line(options.contains('m'))
        .dot_matches_new_line(options.contains('s'))
        .ignore_whitespace(options.contains('x'))
        .build()
        .map_err(|error| invalid(format!("invalid $regex: {error}")))
}

/// Case-insensitive match of any search word against any string value.
fn text_search(document: &Map<String, Value>, condition: &Value) -> StoreResult<bool> {
    let term = condition
        .get("$search")
        .and_then(Value::as_str)
        .ok_or_else(|| invalid("$text expects {\"$search\": <string>}"))?;
    let words: Vec<String> = term.split_whitespace().map(str::to_lowercase).collect();
    if words.is_empty() {
        return Ok(false);
    }
    let mut texts = Vec::new();
    collect_strings(document.values(), &mut texts);
    Ok(texts.iter().any(|text| {
        let lowered = text.to_lowercase();
        words.iter().any(|word| lowered.contains(word.as_str()))
    }))
}

fn collect_strings<'doc>(values: impl Iterator<Item = &'doc Value>, out: &mut Vec<&'doc str>) {
    for value in values {
        match value {
            Value::String(text) => out.push(text),
            Value::Array(items) => collect_strings(items.iter(), out),
            Value::Object(fields) => collect_strings(fields.values(), out),
            _ => {}
        }
    }
}
