//! dc-core: stable foundation for dercache.
//!
//! Contains:
//! - ids (entity identifiers, integer or string)
//! - numeric (Real, comparison slack, NaN-aware folds)
//! - units (power quantities and display scaling)
//! - error (shared error types)

pub mod error;
pub mod ids;
pub mod numeric;
pub mod units;

// Flat re-exports for the dc-* crates
pub use error::{CoreError, CoreResult};
pub use ids::*;
pub use numeric::*;
pub use units::*;
