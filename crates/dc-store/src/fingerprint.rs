//! Content-based fingerprints for fetch requests.

use dc_core::EntityId;
use dc_query::{EncodeOptions, Query, encode};
use sha2::{Digest, Sha256};

use crate::kind::EntityKind;

/// Stable digest of a request: kind, optional id and canonical query.
///
/// Two requests share a fingerprint exactly when they would hit the same
/// route with the same encoded parameters.
pub fn request_fingerprint(kind: EntityKind, id: Option<&EntityId>, query: &Query) -> String {
    let mut hasher = Sha256::new();

    hasher.update(kind.name().as_bytes());
    hasher.update([0]);
    if let Some(id) = id {
        hasher.update(id.to_string().as_bytes());
    }
    hasher.update([0]);
    hasher.update(encode(query, EncodeOptions::default()).as_bytes());

    let result = hasher.finalize();
    format!("{:x}", result)
}
