use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The two fixed-format NORAD element lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrbitalElements {
    pub line1: String,
    pub line2: String,
}

/// A satellite that may have produced the measured signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SatelliteCandidate {
    pub name: String,
    pub norad_id: u32,
    pub orbital_elements: OrbitalElements,
}

impl SatelliteCandidate {
    /// Builds a candidate, taking the catalog number from columns 3-7 of line 1.
    pub fn new(name: impl Into<String>, line1: impl Into<String>, line2: impl Into<String>) -> Self {
        let line1 = line1.into();
        let norad_id = line1
            .get(2..7)
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(0);
        Self {
            name: name.into(),
            norad_id,
            orbital_elements: OrbitalElements {
                line1,
                line2: line2.into(),
            },
        }
    }
}

/// Topocentric state of a satellite as seen from a ground station.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LookSample {
    pub timestamp: DateTime<Utc>,
    pub azimuth_deg: f64,
    pub elevation_deg: f64,
    pub range_m: f64,
    pub range_rate_m_s: f64,
}
