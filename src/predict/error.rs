use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PredictError {
    #[error("TLE file not found: {0}")]
    FileNotFound(String),
    #[error("TLE file read error: {0}")]
    FileRead(#[from] std::io::Error),
    #[error("Invalid TLE for {satellite}: {message}")]
    InvalidTle { satellite: String, message: String },
    #[error("Propagation error for {satellite} at {timestamp}: {message}")]
    Propagation {
        satellite: String,
        timestamp: DateTime<Utc>,
        message: String,
    },
    #[error("{timestamp} is {minutes:.0} min from the TLE epoch of {satellite}, limit is {limit_minutes:.0} min")]
    EpochOutOfRange {
        satellite: String,
        timestamp: DateTime<Utc>,
        minutes: f64,
        limit_minutes: f64,
    },
    #[error("No satellites found in {0}")]
    NoSatellites(String),
    #[error("Satellite {satellite} not found in {path}")]
    SatelliteNotFound { satellite: String, path: String },
}
