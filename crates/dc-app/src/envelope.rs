//! Response envelope parsing.
//!
//! List endpoints answer with a pagination set, `{count, next, previous,
//! results}`, where `results` is a list of models, a single model, or a map
//! of side-loaded collections keyed like `{"meter_groups": [..], "meters":
//! [..]}`. Detail endpoints answer with the bare model or with
//! `{"meter_group": {..}, "meters": [..]}`.
//!
//! The primary resource must parse. Side-loaded collections are best effort:
//! a collection or entry that does not parse is dropped with a warning.

use dc_store::{Entity, EntityKind};
use serde_json::{Map, Value};

use crate::error::{AppError, AppResult};

/// Parsed response: the requested models, related models and paging cursors.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Envelope {
    pub count: Option<u64>,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub primary: Vec<Entity>,
    pub sideloads: Vec<Entity>,
}

impl Envelope {
    /// Parse a list or detail response for `kind`.
    pub fn parse(kind: EntityKind, body: Value) -> AppResult<Self> {
        match body {
            Value::Array(items) => Ok(Self {
                primary: parse_primary_list(kind, items)?,
                ..Self::default()
            }),
            Value::Object(mut object) if object.contains_key("results") => {
                let count = object.get("count").and_then(Value::as_u64);
                let next = cursor(&object, "next");
                let previous = cursor(&object, "previous");
                let results = object.remove("results").unwrap_or(Value::Null);
                let mut envelope = Self::parse_payload(kind, results)?;
                envelope.count = count;
                envelope.next = next;
                envelope.previous = previous;
                Ok(envelope)
            }
            other => Self::parse_payload(kind, other),
        }
    }

    fn parse_payload(kind: EntityKind, payload: Value) -> AppResult<Self> {
        let mut object = match payload {
            Value::Array(items) => {
                return Ok(Self {
                    primary: parse_primary_list(kind, items)?,
                    ..Self::default()
                });
            }
            Value::Object(object) => object,
            other => {
                return Err(AppError::malformed(format!(
                    "expected {kind} results, got {}",
                    type_name(&other)
                )));
            }
        };

        let primary = if let Some(list) = object.remove(kind.sideload_key()) {
            let Value::Array(items) = list else {
                return Err(AppError::malformed(format!(
                    "`{}` is not a list",
                    kind.sideload_key()
                )));
            };
            parse_primary_list(kind, items)?
        } else if let Some(single) = object.remove(kind.name()) {
            vec![parse_primary(kind, single)?]
        } else if object.contains_key("id") {
            return Ok(Self {
                primary: vec![parse_primary(kind, Value::Object(object))?],
                ..Self::default()
            });
        } else {
            return Err(AppError::malformed(format!(
                "missing `{}` in response",
                kind.sideload_key()
            )));
        };

        Ok(Self {
            primary,
            sideloads: parse_sideloads(object),
            ..Self::default()
        })
    }

    /// Primary models, then side-loaded ones, in response order.
    pub fn into_entities(self) -> impl Iterator<Item = Entity> {
        self.primary.into_iter().chain(self.sideloads)
    }

    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }
}

fn cursor(object: &Map<String, Value>, key: &str) -> Option<String> {
    object.get(key).and_then(Value::as_str).map(str::to_string)
}

fn parse_primary(kind: EntityKind, value: Value) -> AppResult<Entity> {
    Entity::from_json(kind, value).map_err(|e| AppError::malformed(format!("{kind}: {e}")))
}

fn parse_primary_list(kind: EntityKind, items: Vec<Value>) -> AppResult<Vec<Entity>> {
    items
        .into_iter()
        .map(|item| parse_primary(kind, item))
        .collect()
}

fn parse_sideloads(object: Map<String, Value>) -> Vec<Entity> {
    let mut entities = Vec::new();
    for (key, value) in object {
        let Some(kind) = EntityKind::from_sideload_key(&key) else {
            tracing::debug!(key = %key, "ignoring unknown side-load key");
            continue;
        };
        let Value::Array(items) = value else {
            tracing::warn!(key = %key, "side-load is not a list; skipping");
            continue;
        };
        for item in items {
            match Entity::from_json(kind, item) {
                Ok(entity) => entities.push(entity),
                Err(e) => tracing::warn!(%kind, error = %e, "skipping malformed side-loaded model"),
            }
        }
    }
    entities
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}
