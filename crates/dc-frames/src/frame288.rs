//! 12 month x 24 hour load grid.

use std::collections::BTreeMap;

use chrono::{Datelike, Timelike};
use dc_core::{PowerUnit, Real, min_max};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::{FrameError, FrameResult};

pub const MONTHS: usize = 12;
pub const HOURS: usize = 24;

pub type Grid = [[Real; HOURS]; MONTHS];

/// Metadata overrides applied by [`Frame288::map`].
///
/// Fields left `None` carry the source frame's value forward.
#[derive(Clone, Debug, Default)]
pub struct MapOptions {
    pub name: Option<String>,
    pub units: Option<String>,
}

/// A statistic of load over a canonical day for each month.
///
/// Months are 1-indexed (1 = January) and hours 0-indexed, matching the
/// wire format `{"1": [24 values], ..., "12": [24 values]}`. The 12x24 shape
/// is enforced by the type; `name` and `units` are display metadata and do
/// not take part in equality.
#[derive(Clone, Debug, Deserialize)]
#[serde(try_from = "BTreeMap<String, Vec<Option<Real>>>")]
pub struct Frame288 {
    values: Grid,
    name: Option<String>,
    units: Option<String>,
}

impl Frame288 {
    pub fn new(values: Grid) -> Self {
        Self {
            values,
            name: None,
            units: None,
        }
    }

    pub fn zeros() -> Self {
        Self::new([[0.0; HOURS]; MONTHS])
    }

    /// Build a frame from `f(month, hour)` with 1-indexed months.
    pub fn from_fn<F>(mut f: F) -> Self
    where
        F: FnMut(usize, usize) -> Real,
    {
        let mut values = [[0.0; HOURS]; MONTHS];
        for (m, row) in values.iter_mut().enumerate() {
            for (h, cell) in row.iter_mut().enumerate() {
                *cell = f(m + 1, h);
            }
        }
        Self::new(values)
    }

    /// Build a frame from a month-keyed map, checking the 12x24 shape.
    pub fn try_from_months(months: BTreeMap<u32, Vec<Real>>) -> FrameResult<Self> {
        if months.len() != MONTHS {
            return Err(FrameError::Shape {
                what: "months".to_string(),
                expected: MONTHS,
                actual: months.len(),
            });
        }

        let mut values = [[0.0; HOURS]; MONTHS];
        for (month, hours) in months {
            if !(1..=MONTHS as u32).contains(&month) {
                return Err(FrameError::Month {
                    month: month.to_string(),
                });
            }
            if hours.len() != HOURS {
                return Err(FrameError::Shape {
                    what: format!("month {month}"),
                    expected: HOURS,
                    actual: hours.len(),
                });
            }
            values[month as usize - 1].copy_from_slice(&hours);
        }
        Ok(Self::new(values))
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

    pub fn months(&self) -> &Grid {
        &self.values
    }

    pub fn month(&self, month: usize) -> FrameResult<&[Real; HOURS]> {
        month
            .checked_sub(1)
            .and_then(|m| self.values.get(m))
            .ok_or(FrameError::Month {
                month: month.to_string(),
            })
    }

    /// All 288 values, January hour 0 first.
    pub fn iter(&self) -> impl Iterator<Item = Real> + '_ {
        self.values.iter().flatten().copied()
    }

    pub fn map<F>(&self, mut f: F, options: MapOptions) -> Self
    where
        F: FnMut(Real) -> Real,
    {
        let mut values = self.values;
        for cell in values.iter_mut().flatten() {
            *cell = f(*cell);
        }
        Self {
            values,
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

    /// Element-wise sum; metadata comes from `self`.
    pub fn add(&self, other: &Frame288) -> Self {
        self.zip_with(other, |a, b| a + b)
    }

    /// Element-wise difference `self - other`, e.g. scenario minus baseline.
    pub fn subtract(&self, other: &Frame288) -> Self {
        self.zip_with(other, |a, b| a - b)
    }

    fn zip_with<F>(&self, other: &Frame288, f: F) -> Self
    where
        F: Fn(Real, Real) -> Real,
    {
        let mut values = self.values;
        for (cell, rhs) in values.iter_mut().flatten().zip(other.iter()) {
            *cell = f(*cell, rhs);
        }
        Self {
            values,
            name: self.name.clone(),
            units: self.units.clone(),
        }
    }

    /// `(min, max)` over all 288 values; NaN cells are ignored.
    pub fn range(&self) -> (Real, Real) {
        min_max(self.iter()).unwrap_or((Real::NAN, Real::NAN))
    }

    pub fn max(&self) -> Real {
        self.range().1
    }

    pub fn min(&self) -> Real {
        self.range().0
    }

    pub fn value(&self, month: usize, hour: usize) -> FrameResult<Real> {
        let row = self.month(month)?;
        row.get(hour).copied().ok_or(FrameError::Hour { hour })
    }

    /// Look up by wall-clock month and hour.
    pub fn value_at<T>(&self, at: &T) -> Real
    where
        T: Datelike + Timelike,
    {
        self.values[at.month0() as usize][at.hour() as usize]
    }

    /// Rescale kW values into kW, MW or GW by magnitude, labelling `units`.
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
}

impl Default for Frame288 {
    fn default() -> Self {
        Self::zeros()
    }
}

impl PartialEq for Frame288 {
    fn eq(&self, other: &Self) -> bool {
        self.values == other.values
    }
}

impl TryFrom<BTreeMap<String, Vec<Option<Real>>>> for Frame288 {
    type Error = FrameError;

    fn try_from(wire: BTreeMap<String, Vec<Option<Real>>>) -> Result<Self, Self::Error> {
        let mut months = BTreeMap::new();
        for (key, hours) in wire {
            let month = key
                .trim()
                .parse::<u32>()
                .map_err(|_| FrameError::Month { month: key.clone() })?;
            // pandas writes missing cells as null
            let hours = hours.into_iter().map(|v| v.unwrap_or(Real::NAN)).collect();
            months.insert(month, hours);
        }
        Frame288::try_from_months(months)
    }
}

impl Serialize for Frame288 {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(MONTHS))?;
        for (m, row) in self.values.iter().enumerate() {
            map.serialize_entry(&(m + 1).to_string(), row)?;
        }
        map.end()
    }
}
