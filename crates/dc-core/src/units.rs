// dc-core/src/units.rs

use core::fmt;

use uom::si::f64::Power as UomPower;
use uom::si::power::{gigawatt, kilowatt, megawatt};

// Public canonical unit types (SI, f64)
pub type Power = UomPower;

/// Load values on the wire are kilowatts.
#[inline]
pub fn kw(v: f64) -> Power {
    Power::new::<kilowatt>(v)
}

/// Display unit chosen by auto-scaling a power quantity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PowerUnit {
    Kilowatt,
    Megawatt,
    Gigawatt,
}

impl PowerUnit {
    /// Pick the display unit for values whose largest magnitude is `max_abs` kW.
    ///
    /// `log10(0)` is `-inf` and NaN compares false, so degenerate inputs land
    /// on `Kilowatt`.
    pub fn for_magnitude(max_abs: f64) -> Self {
        let m = max_abs.abs().log10();
        if m >= 6.0 {
            PowerUnit::Gigawatt
        } else if m >= 3.0 {
            PowerUnit::Megawatt
        } else {
            PowerUnit::Kilowatt
        }
    }

    /// Divisor applied to kW values to express them in this unit.
    pub fn divisor(self) -> f64 {
        match self {
            PowerUnit::Kilowatt => 1.0,
            PowerUnit::Megawatt => 1e3,
            PowerUnit::Gigawatt => 1e6,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PowerUnit::Kilowatt => "kW",
            PowerUnit::Megawatt => "MW",
            PowerUnit::Gigawatt => "GW",
        }
    }

    /// Express a typed power quantity in this unit.
    pub fn convert(self, power: Power) -> f64 {
        match self {
            PowerUnit::Kilowatt => power.get::<kilowatt>(),
            PowerUnit::Megawatt => power.get::<megawatt>(),
            PowerUnit::Gigawatt => power.get::<gigawatt>(),
        }
    }
}

impl fmt::Display for PowerUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numeric::{Tolerances, nearly_equal};

    #[test]
    fn magnitude_buckets() {
        assert_eq!(PowerUnit::for_magnitude(750.0), PowerUnit::Kilowatt);
        assert_eq!(PowerUnit::for_magnitude(999.9), PowerUnit::Kilowatt);
        assert_eq!(PowerUnit::for_magnitude(1_000.0), PowerUnit::Megawatt);
        assert_eq!(PowerUnit::for_magnitude(750_000.0), PowerUnit::Megawatt);
        assert_eq!(PowerUnit::for_magnitude(1e6), PowerUnit::Gigawatt);
        assert_eq!(PowerUnit::for_magnitude(-1e7), PowerUnit::Gigawatt);
    }

    #[test]
    fn degenerate_magnitudes_fall_back_to_kw() {
        assert_eq!(PowerUnit::for_magnitude(0.0), PowerUnit::Kilowatt);
        assert_eq!(PowerUnit::for_magnitude(f64::NAN), PowerUnit::Kilowatt);
    }

    #[test]
    fn typed_conversion_matches_divisor() {
        let tol = Tolerances::default();
        for unit in [
            PowerUnit::Kilowatt,
            PowerUnit::Megawatt,
            PowerUnit::Gigawatt,
        ] {
            let v = 123_456.0;
            assert!(nearly_equal(unit.convert(kw(v)), v / unit.divisor(), tol));
        }
    }
}
