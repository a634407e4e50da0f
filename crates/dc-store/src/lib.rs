//! dc-store: normalized in-memory model cache.

pub mod entity;
pub mod fingerprint;
pub mod kind;
pub mod merge;
pub mod store;
pub mod sufficiency;

pub use entity::Entity;
pub use fingerprint::request_fingerprint;
pub use kind::{EntityKind, KindInfo};
pub use merge::{merge_entity, merge_value};
pub use store::Store;
pub use sufficiency::{is_list_satisfied, is_satisfied};

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Expected a JSON object for {kind}")]
    NotAnObject { kind: EntityKind },

    #[error("Missing or invalid id for {kind}")]
    MissingId { kind: EntityKind },

    #[error("Unknown entity kind: {name}")]
    UnknownKind { name: String },
}
