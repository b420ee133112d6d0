//! Error types for model construction and solving.

use pd_core::CoreError;
use thiserror::Error;

/// Errors encountered while building or solving a model.
#[derive(Error, Debug)]
pub enum SimError {
    #[error("Invalid initial condition: expected {expected} states, got {actual}")]
    InvalidInitialCondition { expected: usize, actual: usize },

    #[error("Invalid parameter: {what} = {value}")]
    InvalidParameter { what: &'static str, value: f64 },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Unknown integration method: {name}")]
    UnknownMethod { name: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Integration failed: {message}")]
    Integration { message: String },

    #[error("Core error: {0}")]
    Core(#[from] CoreError),
}

pub type SimResult<T> = Result<T, SimError>;

impl From<serde_yaml::Error> for SimError {
    fn from(e: serde_yaml::Error) -> Self {
        SimError::Config {
            message: e.to_string(),
        }
    }
}
