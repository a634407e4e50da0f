//! The `data` map of a cached model.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Deserializer, Serialize};

use crate::frame288::Frame288;
use crate::interval::IntervalSeries;
use crate::load_type::LoadType;

/// Payload stored under one load-type tag.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LoadData {
    Interval(IntervalSeries),
    Frame(Frame288),
}

impl LoadData {
    pub fn as_interval(&self) -> Option<&IntervalSeries> {
        match self {
            LoadData::Interval(series) => Some(series),
            LoadData::Frame(_) => None,
        }
    }

    pub fn as_frame(&self) -> Option<&Frame288> {
        match self {
            LoadData::Frame(frame) => Some(frame),
            LoadData::Interval(_) => None,
        }
    }
}

impl From<IntervalSeries> for LoadData {
    fn from(series: IntervalSeries) -> Self {
        LoadData::Interval(series)
    }
}

impl From<Frame288> for LoadData {
    fn from(frame: Frame288) -> Self {
        LoadData::Frame(frame)
    }
}

/// Load data keyed by tag. A tag is present only when it holds a value.
///
/// Deserialization is lenient: `null` entries and unknown tags are dropped,
/// and a tag whose payload fails to parse is dropped with a warning instead
/// of failing the whole model.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DataMap(BTreeMap<LoadType, LoadData>);

impl DataMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, tag: LoadType) -> Option<&LoadData> {
        self.0.get(&tag)
    }

    pub fn contains(&self, tag: LoadType) -> bool {
        self.0.contains_key(&tag)
    }

    pub fn insert(&mut self, tag: LoadType, data: impl Into<LoadData>) -> Option<LoadData> {
        self.0.insert(tag, data.into())
    }

    pub fn remove(&mut self, tag: LoadType) -> Option<LoadData> {
        self.0.remove(&tag)
    }

    pub fn with(mut self, tag: LoadType, data: impl Into<LoadData>) -> Self {
        self.insert(tag, data);
        self
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (LoadType, &LoadData)> + '_ {
        self.0.iter().map(|(tag, data)| (*tag, data))
    }

    pub fn present_tags(&self) -> BTreeSet<LoadType> {
        self.0.keys().copied().collect()
    }

    /// The raw interval series, if `default` holds one.
    pub fn default_series(&self) -> Option<&IntervalSeries> {
        self.get(LoadType::Default).and_then(LoadData::as_interval)
    }

    pub fn frame(&self, tag: LoadType) -> Option<&Frame288> {
        self.get(tag).and_then(LoadData::as_frame)
    }

    /// Per-tag merge: incoming tags replace the same tag, others are kept.
    pub fn merge_from(&mut self, incoming: DataMap) {
        self.0.extend(incoming.0);
    }
}

impl FromIterator<(LoadType, LoadData)> for DataMap {
    fn from_iter<I: IntoIterator<Item = (LoadType, LoadData)>>(iter: I) -> Self {
        DataMap(iter.into_iter().collect())
    }
}

impl<'de> Deserialize<'de> for DataMap {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = BTreeMap::<String, serde_json::Value>::deserialize(deserializer)?;
        let mut map = BTreeMap::new();
        for (key, value) in raw {
            if value.is_null() {
                continue;
            }
            let Ok(tag) = key.parse::<LoadType>() else {
                tracing::debug!(tag = %key, "ignoring unknown load type");
                continue;
            };
            match serde_json::from_value::<LoadData>(value) {
                Ok(data) => {
                    map.insert(tag, data);
                }
                Err(e) => {
                    tracing::warn!(tag = %tag, error = %e, "dropping malformed load data");
                }
            }
        }
        Ok(DataMap(map))
    }
}
