//! List filtering, full-text search, sorting and pagination for
//! `GET /{collection}`, following json-server query conventions.
//!
//! - `field=value` keeps records whose scalar at `field` renders as `value`.
//!   Repeating a field ORs its values. Dotted paths reach into objects.
//! - `field_ne`, `field_gte`, `field_lte` and `field_like` (case-insensitive
//!   regex) refine a field. Range operators skip records where the field is
//!   missing or not comparable.
//! - `q` matches any string or number anywhere in the record.
//! - `_sort` / `_order` take comma-separated lists.
//! - `_page` + `_limit`, or `_start` with `_end` / `_limit`, slice the result.

use std::cmp::Ordering;

use regex::RegexBuilder;
use serde_json::Value;

use crate::error::{ConchitasError, Result};

pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    Eq,
    Ne,
    Gte,
    Lte,
    Like,
}

#[derive(Debug, Clone)]
struct Condition {
    path: String,
    operator: Operator,
    values: Vec<String>,
}

/// Parsed list query.
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    conditions: Vec<Condition>,
    search: Option<String>,
    sort: Vec<(String, bool)>,
    page: Option<usize>,
    limit: Option<usize>,
    start: Option<usize>,
    end: Option<usize>,
}

/// Records after filtering and slicing, with the count before slicing.
#[derive(Debug, Clone, PartialEq)]
pub struct ListResult {
    pub records: Vec<Value>,
    pub total: usize,
}

fn parse_index(key: &str, value: &str) -> Result<usize> {
    value
        .trim()
        .parse()
        .map_err(|_| ConchitasError::InvalidRecord(format!("{} must be a non-negative integer", key)))
}

impl ListQuery {
    pub fn parse(params: &[(String, String)]) -> Result<Self> {
        let mut query = ListQuery::default();
        let mut sort_fields: Vec<String> = Vec::new();
        let mut orders: Vec<String> = Vec::new();

        for (key, value) in params {
            match key.as_str() {
                "q" => query.search = Some(value.to_lowercase()),
                "_sort" => sort_fields = split_list(value),
                "_order" => orders = split_list(value),
                "_page" => query.page = Some(parse_index(key, value)?.max(1)),
                "_limit" => query.limit = Some(parse_index(key, value)?),
                "_start" => query.start = Some(parse_index(key, value)?),
                "_end" => query.end = Some(parse_index(key, value)?),
                other if other.starts_with('_') => {}
                other => query.add_condition(other, value),
            }
        }

        query.sort = sort_fields
            .into_iter()
            .enumerate()
            .map(|(i, field)| {
                let descending = orders
                    .get(i)
                    .or(orders.first())
                    .is_some_and(|o| o.eq_ignore_ascii_case("desc"));
                (field, descending)
            })
            .collect();

        Ok(query)
    }

    fn add_condition(&mut self, key: &str, value: &str) {
        let (path, operator) = [
            ("_ne", Operator::Ne),
            ("_gte", Operator::Gte),
            ("_lte", Operator::Lte),
            ("_like", Operator::Like),
        ]
        .iter()
        .find_map(|(suffix, op)| key.strip_suffix(suffix).map(|path| (path, *op)))
        .unwrap_or((key, Operator::Eq));

        match self
            .conditions
            .iter_mut()
            .find(|c| c.path == path && c.operator == operator)
        {
            Some(existing) => existing.values.push(value.to_string()),
            None => self.conditions.push(Condition {
                path: path.to_string(),
                operator,
                values: vec![value.to_string()],
            }),
        }
    }

    pub fn apply(&self, records: &[Value]) -> Result<ListResult> {
        let mut matched = Vec::new();
        for record in records {
            if self.matches(record)? {
                matched.push(record.clone());
            }
        }

        if !self.sort.is_empty() {
            matched.sort_by(|a, b| {
                self.sort
                    .iter()
                    .map(|(field, descending)| {
                        let ordering = compare(lookup(a, field), lookup(b, field));
                        if *descending {
                            ordering.reverse()
                        } else {
                            ordering
                        }
                    })
                    .find(|o| *o != Ordering::Equal)
                    .unwrap_or(Ordering::Equal)
            });
        }

        let total = matched.len();
        let records = self.slice(matched);
        Ok(ListResult { records, total })
    }

    fn slice(&self, records: Vec<Value>) -> Vec<Value> {
        let len = records.len();
        let (start, end) = if let Some(page) = self.page {
            let size = self.limit.unwrap_or(DEFAULT_PAGE_SIZE);
            let start = (page - 1).saturating_mul(size);
            (start, start.saturating_add(size))
        } else if let Some(start) = self.start {
            let end = match (self.end, self.limit) {
                (Some(end), _) => end,
                (None, Some(limit)) => start.saturating_add(limit),
                (None, None) => len,
            };
            (start, end)
        } else if let Some(end) = self.end {
            (0, end)
        } else if let Some(limit) = self.limit {
            (0, limit)
        } else {
            return records;
        };

        let start = start.min(len);
        let end = end.clamp(start, len);
        records.into_iter().skip(start).take(end - start).collect()
    }

    fn matches(&self, record: &Value) -> Result<bool> {
        for condition in &self.conditions {
            let field = lookup(record, &condition.path);
            let ok = match condition.operator {
                Operator::Eq => condition
                    .values
                    .iter()
                    .any(|v| scalar_text(field).as_deref() == Some(v.as_str())),
                Operator::Ne => condition
                    .values
                    .iter()
                    .all(|v| scalar_text(field).as_deref() != Some(v.as_str())),
                Operator::Gte => condition.values.iter().all(|v| {
                    matches!(compare_to_text(field, v), Some(Ordering::Greater | Ordering::Equal))
                }),
                Operator::Lte => condition.values.iter().all(|v| {
                    matches!(compare_to_text(field, v), Some(Ordering::Less | Ordering::Equal))
                }),
                Operator::Like => {
                    let Some(text) = scalar_text(field) else {
                        return Ok(false);
                    };
                    let mut any = false;
                    for pattern in &condition.values {
                        let re = RegexBuilder::new(pattern).case_insensitive(true).build()?;
                        any |= re.is_match(&text);
                    }
                    any
                }
            };
            if !ok {
                return Ok(false);
            }
        }

        if let Some(needle) = &self.search {
            return Ok(contains_text(record, needle));
        }
        Ok(true)
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn lookup<'a>(record: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(record, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// How a scalar compares against a query string. Arrays and objects never match.
fn scalar_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some("null".to_string()),
        _ => None,
    }
}

fn compare_to_text(value: Option<&Value>, text: &str) -> Option<Ordering> {
    match value? {
        Value::Number(n) => {
            let lhs = n.as_f64()?;
            let rhs: f64 = text.trim().parse().ok()?;
            lhs.partial_cmp(&rhs)
        }
        Value::String(s) => Some(s.as_str().cmp(text)),
        _ => None,
    }
}

fn type_rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 0,
        Some(Value::Bool(_)) => 1,
        Some(Value::Number(_)) => 2,
        Some(Value::String(_)) => 3,
        Some(Value::Array(_)) => 4,
        Some(Value::Object(_)) => 5,
    }
}

fn compare(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

fn contains_text(value: &Value, needle: &str) -> bool {
    match value {
        Value::String(s) => s.to_lowercase().contains(needle),
        Value::Number(n) => n.to_string().contains(needle),
        Value::Array(items) => items.iter().any(|v| contains_text(v, needle)),
        Value::Object(map) => map.values().any(|v| contains_text(v, needle)),
        _ => false,
    }
}
