//! Deep merge of a fetched model into its cached version.
//!
//! Policy, per field of the incoming entity:
//! - `data`: per load-type tag; incoming tags replace the cached tag, tags
//!   the incoming entity lacks are kept.
//! - objects: merged key by key, recursively.
//! - arrays: merged index by index, recursively; a longer cached array keeps
//!   its tail.
//! - scalars (including `null`): overwritten.
//!
//! Fields absent from the incoming entity are never touched, so a partial
//! fetch can only add to or refresh what is cached.

use serde_json::Value;

use crate::entity::Entity;

pub fn merge_entity(existing: &mut Entity, incoming: Entity) {
    debug_assert_eq!(existing.kind, incoming.kind);
    debug_assert_eq!(existing.id, incoming.id);

    existing.data.merge_from(incoming.data);
    for (key, value) in incoming.fields {
        match existing.fields.get_mut(&key) {
            Some(slot) => merge_value(slot, value),
            None => {
                existing.fields.insert(key, value);
            }
        }
    }
}

pub fn merge_value(existing: &mut Value, incoming: Value) {
    match (existing, incoming) {
        (Value::Object(dst), Value::Object(src)) => {
            for (key, value) in src {
                match dst.get_mut(&key) {
                    Some(slot) => merge_value(slot, value),
                    None => {
                        dst.insert(key, value);
                    }
                }
            }
        }
        (Value::Array(dst), Value::Array(src)) => {
            for (i, value) in src.into_iter().enumerate() {
                match dst.get_mut(i) {
                    Some(slot) => merge_value(slot, value),
                    None => dst.push(value),
                }
            }
        }
        (slot, value) => *slot = value,
    }
}
