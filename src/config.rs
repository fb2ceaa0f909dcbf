use chrono::Duration;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use crate::predict::{GroundStation, Sgp4Propagator};
use crate::regression::RegressionSettings;

pub const DEFAULT_CENTER_FREQ_HZ: f64 = 145.88e6;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid station coordinates: {0}")]
    InvalidCoordinates(String),
    #[error("invalid duration {value:?}: {message}")]
    InvalidDuration { value: String, message: String },
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub station: Option<StationConfig>,
    pub receiver: ReceiverConfig,
    pub regression: RegressionSettings,
    pub propagation: PropagationConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StationConfig {
    pub name: Option<String>,
    pub coordinates: String,
    #[serde(default)]
    pub altitude_m: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReceiverConfig {
    pub center_freq_hz: f64,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            center_freq_hz: DEFAULT_CENTER_FREQ_HZ,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PropagationConfig {
    /// How far from the TLE epoch propagation is trusted, e.g. "14days".
    pub max_epoch_offset: Option<String>,
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content)?;
        Ok(config)
    }

    /// The configured station, if any.
    pub fn ground_station(&self) -> Result<Option<GroundStation>, ConfigError> {
        let Some(station) = &self.station else {
            return Ok(None);
        };
        GroundStation::from_coordinates(&station.coordinates, Some(station.altitude_m))
            .map(Some)
            .ok_or_else(|| ConfigError::InvalidCoordinates(station.coordinates.clone()))
    }

    pub fn max_epoch_offset(&self) -> Result<Option<Duration>, ConfigError> {
        self.propagation
            .max_epoch_offset
            .as_deref()
            .map(parse_duration)
            .transpose()
    }

    pub fn propagator(&self) -> Result<Sgp4Propagator, ConfigError> {
        let propagator = Sgp4Propagator::new();
        Ok(match self.max_epoch_offset()? {
            Some(limit) => propagator.with_max_epoch_offset(limit),
            None => propagator,
        })
    }
}

pub fn parse_duration(s: &str) -> Result<Duration, ConfigError> {
    let invalid = |message: String| ConfigError::InvalidDuration {
        value: s.to_string(),
        message,
    };
    humantime::parse_duration(s.trim())
        .map_err(|e| invalid(e.to_string()))
        .and_then(|d| Duration::from_std(d).map_err(|e| invalid(e.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_config() {
        let config = Config::from_str(
            r#"
station:
  name: VTGS
  coordinates: "37.229976, -80.439627"
  altitude_m: 610
receiver:
  center_freq_hz: 435.5e6
regression:
  interp_factor: 4
  max_degree: 9
propagation:
  max_epoch_offset: 14days
"#,
        )
        .unwrap();

        let station = config.ground_station().unwrap().unwrap();
        assert_eq!(station, GroundStation::new(37.229976, -80.439627, 610.0));
        assert_eq!(config.receiver.center_freq_hz, 435.5e6);
        assert_eq!(
            config.regression,
            RegressionSettings {
                interp_factor: 4,
                max_degree: 9
            }
        );
        assert_eq!(config.max_epoch_offset().unwrap(), Some(Duration::days(14)));
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config = Config::from_str("{}").unwrap();
        assert!(config.ground_station().unwrap().is_none());
        assert_eq!(config.receiver.center_freq_hz, DEFAULT_CENTER_FREQ_HZ);
        assert_eq!(config.regression, RegressionSettings::default());
        assert_eq!(config.max_epoch_offset().unwrap(), None);
    }

    #[test]
    fn partial_regression_section_keeps_other_defaults() {
        let config = Config::from_str("regression:\n  interp_factor: 10\n").unwrap();
        assert_eq!(config.regression.interp_factor, 10);
        assert_eq!(config.regression.max_degree, RegressionSettings::default().max_degree);
    }

    #[test]
    fn bad_coordinates_are_reported() {
        let config = Config::from_str("station:\n  coordinates: \"91.0, 10.0\"\n").unwrap();
        assert!(matches!(
            config.ground_station(),
            Err(ConfigError::InvalidCoordinates(_))
        ));
    }

    #[test]
    fn bad_duration_is_reported() {
        let config = Config::from_str("propagation:\n  max_epoch_offset: soon\n").unwrap();
        assert!(matches!(
            config.max_epoch_offset(),
            Err(ConfigError::InvalidDuration { .. })
        ));
        assert!(config.propagator().is_err());
    }

    #[test]
    fn parses_human_durations() {
        assert_eq!(parse_duration("30s").unwrap(), Duration::seconds(30));
        assert_eq!(parse_duration(" 1h 30m ").unwrap(), Duration::minutes(90));
    }
}
