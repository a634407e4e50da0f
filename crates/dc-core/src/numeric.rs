/// Floating point type used for every load value.
pub type Real = f64;

/// Comparison slack for load values that went through unit conversion.
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-9,
            rel: 1e-9,
        }
    }
}

/// True when `a` and `b` agree within either the absolute or relative bound.
pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    diff <= tol.abs || diff <= tol.rel * a.abs().max(b.abs())
}

/// Fold an iterator into `(min, max)`, ignoring NaN.
///
/// Returns `None` for an empty (or all-NaN) iterator.
pub fn min_max<I>(values: I) -> Option<(Real, Real)>
where
    I: IntoIterator<Item = Real>,
{
    values
        .into_iter()
        .filter(|v| !v.is_nan())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}
