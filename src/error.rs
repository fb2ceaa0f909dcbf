use thiserror::Error;

use crate::config::ConfigError;
use crate::curve::{CurveError, MeasurementError};
use crate::matcher::MatchError;
use crate::predict::PredictError;
use crate::regression::RegressionError;

#[derive(Debug, Error)]
pub enum TleMatchError {
    #[error("{0}")]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Predict(#[from] PredictError),
    #[error("{0}")]
    Measurement(#[from] MeasurementError),
    #[error("{0}")]
    Curve(#[from] CurveError),
    #[error("{0}")]
    Regression(#[from] RegressionError),
    #[error("{0}")]
    Match(#[from] MatchError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
