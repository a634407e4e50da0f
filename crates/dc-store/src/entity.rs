//! Cached backend models.

use dc_core::EntityId;
use dc_frames::DataMap;
use serde_json::{Map, Value};

use crate::kind::EntityKind;
use crate::{StoreError, StoreResult};

/// One backend model as held by the store.
///
/// `data` is split out because the cache reasons about which load-type tags
/// are present; every other field is kept as JSON and merged structurally.
#[derive(Clone, Debug, PartialEq)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub data: DataMap,
    pub fields: Map<String, Value>,
}

impl Entity {
    pub fn new(kind: EntityKind, id: impl Into<EntityId>) -> Self {
        Self {
            id: id.into(),
            kind,
            data: DataMap::new(),
            fields: Map::new(),
        }
    }

    pub fn with_data(mut self, data: DataMap) -> Self {
        self.data = data;
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    /// Parse a model object as returned by the backend.
    ///
    /// `id` is required; `data` is parsed leniently and a `data` value that is
    /// not a tag map is treated as absent.
    pub fn from_json(kind: EntityKind, value: Value) -> StoreResult<Self> {
        let Value::Object(mut fields) = value else {
            return Err(StoreError::NotAnObject { kind });
        };

        let id = fields
            .remove("id")
            .and_then(|v| serde_json::from_value::<EntityId>(v).ok())
            .ok_or(StoreError::MissingId { kind })?;

        let data = match fields.remove("data") {
            None | Some(Value::Null) => DataMap::new(),
            Some(raw) => serde_json::from_value(raw).unwrap_or_else(|e| {
                tracing::warn!(%kind, %id, error = %e, "ignoring malformed data map");
                DataMap::new()
            }),
        };

        Ok(Self {
            id,
            kind,
            data,
            fields,
        })
    }

    pub fn to_json(&self) -> StoreResult<Value> {
        let mut object = self.fields.clone();
        object.insert("id".into(), serde_json::to_value(&self.id)?);
        if !self.data.is_empty() {
            object.insert("data".into(), serde_json::to_value(&self.data)?);
        }
        Ok(Value::Object(object))
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn name(&self) -> Option<&str> {
        self.field("name").and_then(Value::as_str)
    }

    /// Ids referenced by a relation field holding an id, a list of ids, or
    /// embedded objects carrying an `id`.
    pub fn related_ids(&self, key: &str) -> Vec<EntityId> {
        fn id_of(value: &Value) -> Option<EntityId> {
            match value {
                Value::Object(obj) => obj.get("id").and_then(id_of),
                Value::Null => None,
                other => serde_json::from_value(other.clone()).ok(),
            }
        }
        match self.field(key) {
            Some(Value::Array(items)) => items.iter().filter_map(id_of).collect(),
            Some(value) => id_of(value).into_iter().collect(),
            None => Vec::new(),
        }
    }
}
