//! dc-frames: numeric payloads carried inside cached models.
//!
//! - `Frame288`: 12 months x 24 hours grid of a load statistic
//! - `IntervalSeries`: evenly spaced timestamped samples
//! - `LoadType` / `DataMap`: the per-tag `data` map of an entity

pub mod data;
pub mod error;
pub mod frame288;
pub mod interval;
pub mod load_type;
pub mod timestamp;

pub use data::{DataMap, LoadData};
pub use error::{FrameError, FrameResult};
pub use frame288::{Frame288, HOURS, MONTHS, MapOptions};
pub use interval::{IntervalSample, IntervalSeries};
pub use load_type::LoadType;
