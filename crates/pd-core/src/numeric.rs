use crate::{CoreError, CoreResult};

/// Absolute and relative bounds for comparing floats.
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: f64,
    pub rel: f64,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal(a: f64, b: f64, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(v: f64, what: &'static str) -> CoreResult<f64> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(CoreError::NonFinite { what, value: v })
    }
}

/// Numerical derivative of `values` with respect to `coords`.
///
/// Interior points use the second-order central difference for (possibly)
/// uneven spacing; the two end points use first-order one-sided differences.
/// Requires at least two samples and strictly increasing coordinates.
pub fn gradient(values: &[f64], coords: &[f64]) -> CoreResult<Vec<f64>> {
    let n = values.len();
    if coords.len() != n {
        return Err(CoreError::LengthMismatch {
            what: "gradient coordinates",
            expected: n,
            actual: coords.len(),
        });
    }
    if n < 2 {
        return Err(CoreError::InvalidArg {
            what: "gradient needs at least two samples",
        });
    }
    if coords.windows(2).any(|w| w[1] <= w[0]) {
        return Err(CoreError::InvalidArg {
            what: "gradient coordinates must be strictly increasing",
        });
    }

    let mut out = Vec::with_capacity(n);
    out.push((values[1] - values[0]) / (coords[1] - coords[0]));

    for i in 1..n - 1 {
        let hs = coords[i] - coords[i - 1];
        let hd = coords[i + 1] - coords[i];
        let num = hs * hs * values[i + 1] + (hd * hd - hs * hs) * values[i] - hd * hd * values[i - 1];
        out.push(num / (hs * hd * (hd + hs)));
    }

    out.push((values[n - 1] - values[n - 2]) / (coords[n - 1] - coords[n - 2]));
    Ok(out)
}
