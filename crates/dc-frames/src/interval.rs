//! Evenly spaced timestamped load samples.

use chrono::{Datelike, FixedOffset, NaiveDateTime, Timelike};
use dc_core::{PowerUnit, Real, min_max};
use serde::{Deserialize, Serialize};

use crate::error::{FrameError, FrameResult};
use crate::frame288::{Frame288, HOURS, MONTHS, MapOptions};
use crate::load_type::LoadType;
use crate::timestamp;

/// One `(timestamp, value)` pair.
///
/// `timestamp` is the wall-clock reading used for month/hour bucketing.
/// `offset` is the UTC offset the backend wrote it with, if any.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WireSample", into = "WireSample")]
pub struct IntervalSample {
    pub timestamp: NaiveDateTime,
    pub offset: Option<FixedOffset>,
    pub value: Real,
}

impl IntervalSample {
    pub fn new(timestamp: NaiveDateTime, value: Real) -> Self {
        Self {
            timestamp,
            offset: None,
            value,
        }
    }

    pub fn with_offset(timestamp: NaiveDateTime, offset: FixedOffset, value: Real) -> Self {
        Self {
            timestamp,
            offset: Some(offset),
            value,
        }
    }

    /// The absolute instant as a UTC reading; wall clock when no offset is known.
    pub fn instant(&self) -> NaiveDateTime {
        match self.offset {
            Some(offset) => {
                self.timestamp - chrono::Duration::seconds(i64::from(offset.local_minus_utc()))
            }
            None => self.timestamp,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct WireSample {
    #[serde(rename = "index", alias = "timestamp")]
    index: String,
    #[serde(alias = "kw", deserialize_with = "nullable_value")]
    value: Real,
}

fn nullable_value<'de, D>(deserializer: D) -> Result<Real, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Real>::deserialize(deserializer)?.unwrap_or(Real::NAN))
}

impl TryFrom<WireSample> for IntervalSample {
    type Error = FrameError;

    fn try_from(wire: WireSample) -> Result<Self, Self::Error> {
        let (timestamp, offset) = timestamp::parse_timestamp_with_offset(&wire.index)?;
        Ok(Self {
            timestamp,
            offset,
            value: wire.value,
        })
    }
}

impl From<IntervalSample> for WireSample {
    fn from(sample: IntervalSample) -> Self {
        Self {
            index: timestamp::format_timestamp_with_offset(&sample.timestamp, sample.offset),
            value: sample.value,
        }
    }
}

/// Interval load data with a derived sampling period.
///
/// Samples are strictly ascending and evenly spaced by a whole number of
/// minutes, measured on the absolute instant so offset data crossing a DST
/// change stays even; [`IntervalSeries::new`] and deserialization both reject anything
/// else. Series with fewer than two samples have no period.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<IntervalSample>", into = "Vec<IntervalSample>")]
pub struct IntervalSeries {
    samples: Vec<IntervalSample>,
    period: Option<u32>,
    name: Option<String>,
    units: Option<String>,
}

impl IntervalSeries {
    pub fn new(samples: Vec<IntervalSample>) -> FrameResult<Self> {
        let period = derive_period(&samples)?;
        Ok(Self {
            samples,
            period,
            name: None,
            units: None,
        })
    }

    /// Build a series of `values` starting at `start`, `period_minutes` apart.
    pub fn from_values(
        start: NaiveDateTime,
        period_minutes: u32,
        values: impl IntoIterator<Item = Real>,
    ) -> FrameResult<Self> {
        let step = chrono::Duration::minutes(i64::from(period_minutes));
        let samples = values
            .into_iter()
            .enumerate()
            .map(|(i, v)| IntervalSample::new(start + step * i as i32, v))
            .collect();
        Self::new(samples)
    }

    /// Minutes between consecutive samples.
    pub fn period(&self) -> Option<u32> {
        self.period
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[IntervalSample] {
        &self.samples
    }

    pub fn iter(&self) -> impl Iterator<Item = &IntervalSample> + '_ {
        self.samples.iter()
    }

    pub fn values(&self) -> impl Iterator<Item = Real> + '_ {
        self.samples.iter().map(|s| s.value)
    }

    pub fn start(&self) -> Option<NaiveDateTime> {
        self.samples.first().map(|s| s.timestamp)
    }

    pub fn end(&self) -> Option<NaiveDateTime> {
        self.samples.last().map(|s| s.timestamp)
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn units(&self) -> Option<&str> {
        self.units.as_deref()
    }

    pub fn rename(&self, name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..self.clone()
        }
    }

    pub fn with_units(&self, units: impl Into<String>) -> Self {
        Self {
            units: Some(units.into()),
            ..self.clone()
        }
    }

    /// Apply `f` to every value; timestamps and period are untouched.
    pub fn map<F>(&self, mut f: F, options: MapOptions) -> Self
    where
        F: FnMut(Real) -> Real,
    {
        Self {
            samples: self
                .samples
                .iter()
                .map(|s| IntervalSample { value: f(s.value), ..*s })
                .collect(),
            period: self.period,
            name: options.name.or_else(|| self.name.clone()),
            units: options.units.or_else(|| self.units.clone()),
        }
    }

    pub fn multiply(&self, n: Real) -> Self {
        self.map(|v| v * n, MapOptions::default())
    }

    pub fn divide(&self, n: Real) -> Self {
        self.map(|v| v / n, MapOptions::default())
    }

    /// Element-wise difference against a series over the same timestamps.
    pub fn subtract(&self, other: &IntervalSeries) -> FrameResult<Self> {
        if self.len() != other.len() {
            return Err(FrameError::LengthMismatch {
                left: self.len(),
                right: other.len(),
            });
        }
        let mut rhs = other.values();
        Ok(self.map(|v| v - rhs.next().unwrap_or(0.0), MapOptions::default()))
    }

    /// `(min, max)` over all values; `(NaN, NaN)` when empty.
    pub fn range(&self) -> (Real, Real) {
        min_max(self.values()).unwrap_or((Real::NAN, Real::NAN))
    }

    pub fn max(&self) -> Real {
        self.range().1
    }

    pub fn min(&self) -> Real {
        self.range().0
    }

    pub fn scale(&self) -> Self {
        self.scale_with_unit().0
    }

    pub fn scale_with_unit(&self) -> (Self, PowerUnit) {
        let (lo, hi) = self.range();
        let unit = PowerUnit::for_magnitude(lo.abs().max(hi.abs()));
        let scaled = self.map(
            |v| v / unit.divisor(),
            MapOptions {
                name: None,
                units: Some(unit.label().to_string()),
            },
        );
        (scaled, unit)
    }

    /// Aggregate samples into a month/hour grid.
    ///
    /// `Default` aggregates like `Average`. Empty buckets are 0 for `Total`
    /// and `Count` and NaN otherwise.
    pub fn to_frame288(&self, load_type: LoadType) -> Frame288 {
        #[derive(Clone, Copy)]
        struct Bucket {
            sum: Real,
            count: usize,
            max: Real,
            min: Real,
        }
        let empty = Bucket {
            sum: 0.0,
            count: 0,
            max: Real::NEG_INFINITY,
            min: Real::INFINITY,
        };
        let mut buckets = [[empty; HOURS]; MONTHS];

        for sample in self.samples.iter().filter(|s| !s.value.is_nan()) {
            let b = &mut buckets[sample.timestamp.month0() as usize]
                [sample.timestamp.hour() as usize];
            b.sum += sample.value;
            b.count += 1;
            b.max = b.max.max(sample.value);
            b.min = b.min.min(sample.value);
        }

        let frame = Frame288::from_fn(|m, h| {
            let b = buckets[m - 1][h];
            match load_type {
                LoadType::Total => b.sum,
                LoadType::Count => b.count as Real,
                _ if b.count == 0 => Real::NAN,
                LoadType::Default | LoadType::Average => b.sum / b.count as Real,
                LoadType::Maximum => b.max,
                LoadType::Minimum => b.min,
            }
        })
        .rename(load_type.as_str());

        match (&self.units, load_type) {
            (Some(units), t) if t != LoadType::Count => frame.with_units(units.clone()),
            _ => frame,
        }
    }
}

impl PartialEq for IntervalSeries {
    fn eq(&self, other: &Self) -> bool {
        self.samples == other.samples
    }
}

impl TryFrom<Vec<IntervalSample>> for IntervalSeries {
    type Error = FrameError;

    fn try_from(samples: Vec<IntervalSample>) -> Result<Self, Self::Error> {
        IntervalSeries::new(samples)
    }
}

impl From<IntervalSeries> for Vec<IntervalSample> {
    fn from(series: IntervalSeries) -> Self {
        series.samples
    }
}

fn derive_period(samples: &[IntervalSample]) -> FrameResult<Option<u32>> {
    let [first, second, ..] = samples else {
        return Ok(None);
    };

    let step_s = (second.instant() - first.instant()).num_seconds();
    if step_s <= 0 {
        return Err(FrameError::Unsorted { index: 1 });
    }
    if step_s % 60 != 0 {
        return Err(FrameError::FractionalPeriod { seconds: step_s });
    }

    for (i, pair) in samples.windows(2).enumerate().skip(1) {
        let actual_s = (pair[1].instant() - pair[0].instant()).num_seconds();
        if actual_s <= 0 {
            return Err(FrameError::Unsorted { index: i + 1 });
        }
        if actual_s != step_s {
            return Err(FrameError::UnevenSpacing {
                index: i + 1,
                expected_s: step_s,
                actual_s,
            });
        }
    }

    u32::try_from(step_s / 60)
        .map(Some)
        .map_err(|_| FrameError::FractionalPeriod { seconds: step_s })
}
