//! Deterministic propagators for tests.

use std::collections::HashMap;

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::predict::{GroundStation, LookSample, PredictError, Propagator, SatelliteCandidate};

pub const FOX_1D_DOWNLINK_HZ: f64 = 145.88e6;

pub fn pass_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2018, 1, 13, 16, 12, 1).unwrap() + Duration::microseconds(862_011)
}

/// Timestamps every `1 / rate_hz` seconds for `seconds` seconds.
pub fn timestamps(start: DateTime<Utc>, seconds: i64, rate_hz: i64) -> Vec<DateTime<Utc>> {
    let step = Duration::nanoseconds(1_000_000_000 / rate_hz);
    (0..seconds * rate_hz).map(|i| start + step * i as i32).collect()
}

/// Straight-line flyby past the station at constant speed.
#[derive(Debug, Clone, Copy)]
pub struct StraightPass {
    pub tca: DateTime<Utc>,
    pub speed_m_s: f64,
    pub miss_distance_m: f64,
}

impl StraightPass {
    pub fn leo(tca: DateTime<Utc>) -> Self {
        Self {
            tca,
            speed_m_s: 7_000.0,
            miss_distance_m: 1_500_000.0,
        }
    }

    fn look(&self, timestamp: DateTime<Utc>) -> LookSample {
        let dt = (timestamp - self.tca).num_nanoseconds().unwrap_or_default() as f64 * 1e-9;
        let along = self.speed_m_s * dt;
        let range = (self.miss_distance_m.powi(2) + along.powi(2)).sqrt();
        LookSample {
            timestamp,
            azimuth_deg: 0.0,
            elevation_deg: 45.0,
            range_m: range,
            range_rate_m_s: self.speed_m_s * along / range,
        }
    }
}

/// Looks candidates up by name. Unknown names fail to propagate.
#[derive(Debug, Clone, Default)]
pub struct SyntheticSky {
    passes: HashMap<String, StraightPass>,
}

impl SyntheticSky {
    pub fn with_pass(mut self, name: &str, pass: StraightPass) -> Self {
        self.passes.insert(name.to_string(), pass);
        self
    }
}

impl Propagator for SyntheticSky {
    fn look(
        &self,
        candidate: &SatelliteCandidate,
        _station: &GroundStation,
        timestamp: DateTime<Utc>,
    ) -> Result<LookSample, PredictError> {
        self.passes
            .get(&candidate.name)
            .map(|pass| pass.look(timestamp))
            .ok_or_else(|| PredictError::Propagation {
                satellite: candidate.name.clone(),
                timestamp,
                message: "no synthetic pass".into(),
            })
    }
}

pub fn candidate(name: &str) -> SatelliteCandidate {
    SatelliteCandidate::new(
        name,
        "1 43137U 18004AC  18013.60347631  .00001039  00000-0  51109-4 0  9991",
        "2 43137  97.5260  73.6521 0015217  18.8290 341.3530 14.95428010   286",
    )
}
