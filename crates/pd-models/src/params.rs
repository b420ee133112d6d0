//! Parameter validation shared by the models.

use pd_sim::{SimError, SimResult};

/// Accept finite values strictly greater than zero.
pub(crate) fn positive(value: f64, what: &'static str) -> SimResult<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(SimError::InvalidParameter { what, value })
    }
}

/// Accept finite values greater than or equal to zero.
pub(crate) fn non_negative(value: f64, what: &'static str) -> SimResult<f64> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(SimError::InvalidParameter { what, value })
    }
}

/// Accept any finite value.
pub(crate) fn finite(value: f64, what: &'static str) -> SimResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(SimError::InvalidParameter { what, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds() {
        assert!(positive(1.0, "x").is_ok());
        assert!(positive(0.0, "x").is_err());
        assert!(non_negative(0.0, "x").is_ok());
        assert!(non_negative(-1e-300, "x").is_err());
        assert!(finite(-3.0, "x").is_ok());
        assert!(finite(f64::NAN, "x").is_err());
        assert!(non_negative(f64::INFINITY, "x").is_err());
    }
}
