//! Ordered query parameter objects.

use std::fmt::Display;

use serde_json::Value;

use crate::error::{QueryError, QueryResult};
use crate::filter::{FilterClause, FilterRequest};

/// One parameter value; its rendering depends on the variant.
#[derive(Clone, Debug, PartialEq)]
pub enum Param {
    /// `k=v`
    Scalar(String),
    /// `k[]=v` per value, or `k=v1,v2` in comma-joined mode.
    Array(Vec<String>),
    /// `k[]=v` per value in every mode (`include`, `exclude`, `sort`).
    Directive(Vec<String>),
    /// `filter{field[.op]}=v`
    Filter(FilterClause),
    /// Page size; the key depends on the pagination style.
    PageSize(u32),
}

/// Query parameters in insertion order.
///
/// Re-inserting an existing key replaces the value in place, like assigning
/// to an existing property of an object.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Query {
    entries: Vec<(String, Param)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Param)> + '_ {
        self.entries.iter().map(|(k, p)| (k.as_str(), p))
    }

    pub fn get(&self, key: &str) -> Option<&Param> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, p)| p)
    }

    pub fn insert(&mut self, key: impl Into<String>, param: Param) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = param,
            None => self.entries.push((key, param)),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<Param> {
        let pos = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(pos).1)
    }

    /// Append every entry of `other`, overwriting shared keys in place.
    pub fn extend(&mut self, other: Query) {
        for (key, param) in other.entries {
            self.insert(key, param);
        }
    }

    pub fn set(mut self, key: impl Into<String>, value: impl Display) -> Self {
        self.insert(key, Param::Scalar(value.to_string()));
        self
    }

    /// Set `key` when `value` is present; `None` drops the key entirely.
    pub fn set_opt<V: Display>(mut self, key: impl Into<String>, value: Option<V>) -> Self {
        let key = key.into();
        match value {
            Some(v) => self.insert(key, Param::Scalar(v.to_string())),
            None => {
                self.remove(&key);
            }
        }
        self
    }

    pub fn array<I>(mut self, key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Display,
    {
        self.insert(
            key,
            Param::Array(values.into_iter().map(|v| v.to_string()).collect()),
        );
        self
    }

    pub fn include<I>(self, fields: I) -> Self
    where
        I: IntoIterator,
        I::Item: Display,
    {
        self.directive("include", fields)
    }

    pub fn exclude<I>(self, fields: I) -> Self
    where
        I: IntoIterator,
        I::Item: Display,
    {
        self.directive("exclude", fields)
    }

    /// Sort fields; prefix with `-` for descending.
    pub fn sort<I>(self, fields: I) -> Self
    where
        I: IntoIterator,
        I::Item: Display,
    {
        self.directive("sort", fields)
    }

    fn directive<I>(mut self, key: &str, fields: I) -> Self
    where
        I: IntoIterator,
        I::Item: Display,
    {
        let fields: Vec<String> = fields.into_iter().map(|f| f.to_string()).collect();
        if fields.is_empty() {
            self.remove(key);
        } else {
            self.insert(key, Param::Directive(fields));
        }
        self
    }

    pub fn filter(mut self, clause: FilterClause) -> Self {
        self.insert(clause.key(), Param::Filter(clause));
        self
    }

    pub fn paginate(mut self, pagination: Pagination) -> Self {
        self.insert("page", Param::Scalar(pagination.page.to_string()));
        self.insert("page_size", Param::PageSize(pagination.page_size));
        self
    }

    /// Build from a JSON object: strings, numbers and booleans become
    /// scalars, arrays become array parameters, `null` is omitted.
    pub fn from_json(value: &Value) -> QueryResult<Self> {
        let object = match value {
            Value::Object(map) => map,
            Value::Null => return Ok(Self::new()),
            other => {
                return Err(QueryError::NotAnObject {
                    kind: json_kind(other),
                });
            }
        };

        let mut query = Self::new();
        for (key, value) in object {
            match value {
                Value::Null => {}
                Value::Array(items) => {
                    let items = items
                        .iter()
                        .filter(|v| !v.is_null())
                        .map(scalar_text)
                        .collect();
                    query.insert(key.clone(), Param::Array(items));
                }
                other => query.insert(key.clone(), Param::Scalar(scalar_text(other))),
            }
        }
        Ok(query)
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// 1-indexed page request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
}

impl Pagination {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self { page, page_size }
    }
}

/// Per-request directives layered over a [`FilterRequest`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ListOptions {
    pub pagination: Option<Pagination>,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub sort: Vec<String>,
}

impl ListOptions {
    /// Full parameter object: pagination, filter parameters, then directives.
    pub fn build(&self, filter: &FilterRequest) -> Query {
        let mut query = Query::new();
        if let Some(pagination) = self.pagination {
            query = query.paginate(pagination);
        }
        query.extend(filter.to_query());
        query
            .include(&self.include)
            .exclude(&self.exclude)
            .sort(&self.sort)
    }
}
