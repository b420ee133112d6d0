//! Integrator selection and solve configuration.

use std::fmt;
use std::str::FromStr;

use pd_core::ensure_finite;
use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

/// Integration method used by `solve`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Method {
    /// Adaptive Dormand-Prince 5(4), general purpose (default).
    #[default]
    #[serde(rename = "DOPRI5", alias = "RK45")]
    Dopri5,
    /// Adaptive Dormand-Prince 8(5,3), for tight tolerances.
    #[serde(rename = "DOP853")]
    Dop853,
    /// Implicit Radau IIA of order 5, for stiff problems.
    #[serde(rename = "RADAU", alias = "Radau", alias = "RADAU5")]
    Radau,
    /// Classical RK4, exactly one step per output interval.
    #[serde(rename = "RK4")]
    Rk4,
}

impl Method {
    /// Canonical name.
    pub fn name(self) -> &'static str {
        match self {
            Method::Dopri5 => "DOPRI5",
            Method::Dop853 => "DOP853",
            Method::Radau => "RADAU",
            Method::Rk4 => "RK4",
        }
    }

    /// Whether the method adapts its internal step size.
    pub fn is_adaptive(self) -> bool {
        !matches!(self, Method::Rk4)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Method {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DOPRI5" | "RK45" => Ok(Method::Dopri5),
            "DOP853" => Ok(Method::Dop853),
            "RADAU" | "RADAU5" => Ok(Method::Radau),
            "RK4" => Ok(Method::Rk4),
            _ => Err(SimError::UnknownMethod {
                name: s.to_string(),
            }),
        }
    }
}

/// Options for a single solve.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolveOptions {
    /// Integration method (default: DOPRI5)
    pub method: Method,
    /// Relative tolerance for the adaptive methods
    pub rtol: f64,
    /// Absolute tolerance for the adaptive methods
    pub atol: f64,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            method: Method::default(),
            rtol: 1e-6,
            atol: 1e-9,
        }
    }
}

impl SolveOptions {
    /// Default options with the given method.
    pub fn with_method(method: Method) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    /// Parse options from YAML; missing fields take their defaults.
    pub fn from_yaml_str(text: &str) -> SimResult<Self> {
        let options: SolveOptions = serde_yaml::from_str(text)?;
        options.validate()?;
        Ok(options)
    }

    /// Check tolerances are positive and finite.
    ///
    /// Fixed-step methods ignore the tolerances, so they are not checked.
    pub fn validate(&self) -> SimResult<()> {
        if !self.method.is_adaptive() {
            return Ok(());
        }
        if ensure_finite(self.rtol, "rtol")? <= 0.0 {
            return Err(SimError::InvalidArg {
                what: "rtol must be positive",
            });
        }
        if ensure_finite(self.atol, "atol")? <= 0.0 {
            return Err(SimError::InvalidArg {
                what: "atol must be positive",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solve_options_defaults() {
        let opts = SolveOptions::default();
        assert_eq!(opts.method, Method::Dopri5);
        assert_eq!(opts.rtol, 1e-6);
        assert_eq!(opts.atol, 1e-9);
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn method_names_parse() {
        assert_eq!("RK45".parse::<Method>().unwrap(), Method::Dopri5);
        assert_eq!("dopri5".parse::<Method>().unwrap(), Method::Dopri5);
        assert_eq!("DOP853".parse::<Method>().unwrap(), Method::Dop853);
        assert_eq!(" rk4 ".parse::<Method>().unwrap(), Method::Rk4);

        assert_eq!("Radau".parse::<Method>().unwrap(), Method::Radau);
        assert_eq!("RADAU5".parse::<Method>().unwrap(), Method::Radau);

        let err = "LSODA".parse::<Method>().unwrap_err();
        assert!(matches!(err, SimError::UnknownMethod { ref name } if name == "LSODA"));
    }

    #[test]
    fn method_display_roundtrips_through_from_str() {
        for method in [Method::Dopri5, Method::Dop853, Method::Radau, Method::Rk4] {
            assert_eq!(method.to_string().parse::<Method>().unwrap(), method);
        }
    }

    #[test]
    fn options_from_yaml() {
        let opts = SolveOptions::from_yaml_str("method: RK45\nrtol: 1.0e-8\n").unwrap();
        assert_eq!(opts.method, Method::Dopri5);
        assert_eq!(opts.rtol, 1e-8);
        assert_eq!(opts.atol, SolveOptions::default().atol);

        let opts = SolveOptions::from_yaml_str("method: DOP853").unwrap();
        assert_eq!(opts.method, Method::Dop853);

        let opts = SolveOptions::from_yaml_str("method: RADAU5\natol: 1.0e-12\n").unwrap();
        assert_eq!(opts.method, Method::Radau);
        assert_eq!(opts.atol, 1e-12);
    }

    #[test]
    fn options_from_yaml_rejects_bad_values() {
        assert!(matches!(
            SolveOptions::from_yaml_str("method: BDF"),
            Err(SimError::Config { .. })
        ));
        assert!(matches!(
            SolveOptions::from_yaml_str("atol: -1.0"),
            Err(SimError::InvalidArg { .. })
        ));
    }

    #[test]
    fn tolerances_only_checked_for_adaptive_methods() {
        let loose = SolveOptions {
            method: Method::Rk4,
            rtol: -1.0,
            atol: f64::NAN,
        };
        assert!(loose.validate().is_ok());

        for method in [Method::Dopri5, Method::Dop853, Method::Radau] {
            let opts = SolveOptions { method, ..loose.clone() };
            assert!(opts.validate().is_err(), "{method} accepted bad tolerances");
        }
    }

    #[test]
    fn validate_rejects_non_finite() {
        let opts = SolveOptions {
            rtol: f64::NAN,
            ..SolveOptions::default()
        };
        assert!(matches!(opts.validate(), Err(SimError::Core(_))));
    }
}
