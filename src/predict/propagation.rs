use chrono::{DateTime, Duration, Utc};
use sgp4::{Constants, Elements};

use crate::predict::error::PredictError;
use crate::predict::ground_station::{GroundStation, EARTH_ROTATION_RAD_S};
use crate::predict::types::{LookSample, SatelliteCandidate};

/// Source of satellite state relative to a ground station.
pub trait Propagator: Sync {
    fn look(
        &self,
        candidate: &SatelliteCandidate,
        station: &GroundStation,
        timestamp: DateTime<Utc>,
    ) -> Result<LookSample, PredictError>;

    fn range_rate_m_s(
        &self,
        candidate: &SatelliteCandidate,
        station: &GroundStation,
        timestamp: DateTime<Utc>,
    ) -> Result<f64, PredictError> {
        Ok(self.look(candidate, station, timestamp)?.range_rate_m_s)
    }

    /// Range rate at every timestamp. Stops at the first failure.
    fn range_rates_m_s(
        &self,
        candidate: &SatelliteCandidate,
        station: &GroundStation,
        timestamps: &[DateTime<Utc>],
    ) -> Result<Vec<f64>, PredictError> {
        timestamps
            .iter()
            .map(|t| self.range_rate_m_s(candidate, station, *t))
            .collect()
    }
}

/// SGP4 propagation of NORAD two-line elements.
#[derive(Debug, Clone, Default)]
pub struct Sgp4Propagator {
    max_epoch_offset: Option<Duration>,
}

impl Sgp4Propagator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse timestamps further than `limit` from the element set epoch.
    pub fn with_max_epoch_offset(mut self, limit: Duration) -> Self {
        self.max_epoch_offset = Some(limit);
        self
    }

    /// Epoch of the candidate's element set. Fails if the elements do not parse.
    pub fn epoch(&self, candidate: &SatelliteCandidate) -> Result<DateTime<Utc>, PredictError> {
        Ok(self.track(candidate)?.elements.datetime.and_utc())
    }

    fn track<'a>(&self, candidate: &'a SatelliteCandidate) -> Result<Sgp4Track<'a>, PredictError> {
        let invalid = |message: String| PredictError::InvalidTle {
            satellite: candidate.name.clone(),
            message,
        };
        let elements = Elements::from_tle(
            Some(candidate.name.clone()),
            candidate.orbital_elements.line1.as_bytes(),
            candidate.orbital_elements.line2.as_bytes(),
        )
        .map_err(|e| invalid(e.to_string()))?;
        let constants = Constants::from_elements(&elements).map_err(|e| invalid(e.to_string()))?;
        Ok(Sgp4Track {
            name: &candidate.name,
            elements,
            constants,
            max_epoch_offset: self.max_epoch_offset,
        })
    }
}

impl Propagator for Sgp4Propagator {
    fn look(
        &self,
        candidate: &SatelliteCandidate,
        station: &GroundStation,
        timestamp: DateTime<Utc>,
    ) -> Result<LookSample, PredictError> {
        self.track(candidate)?.look(station, timestamp)
    }

    fn range_rates_m_s(
        &self,
        candidate: &SatelliteCandidate,
        station: &GroundStation,
        timestamps: &[DateTime<Utc>],
    ) -> Result<Vec<f64>, PredictError> {
        let track = self.track(candidate)?;
        timestamps
            .iter()
            .map(|t| track.look(station, *t).map(|s| s.range_rate_m_s))
            .collect()
    }
}

/// Parsed elements of one satellite, reused across timestamps.
struct Sgp4Track<'a> {
    name: &'a str,
    elements: Elements,
    constants: Constants,
    max_epoch_offset: Option<Duration>,
}

impl Sgp4Track<'_> {
    fn look(&self, station: &GroundStation, timestamp: DateTime<Utc>) -> Result<LookSample, PredictError> {
        let failed = |message: String| PredictError::Propagation {
            satellite: self.name.to_string(),
            timestamp,
            message,
        };

        let minutes = self
            .elements
            .datetime_to_minutes_since_epoch(&timestamp.naive_utc())
            .map_err(|e| failed(e.to_string()))?;

        if let Some(limit) = self.max_epoch_offset {
            let limit_minutes = limit.num_seconds() as f64 / 60.0;
            if minutes.0.abs() > limit_minutes {
                return Err(PredictError::EpochOutOfRange {
                    satellite: self.name.to_string(),
                    timestamp,
                    minutes: minutes.0,
                    limit_minutes,
                });
            }
        }

        let prediction = self
            .constants
            .propagate(minutes)
            .map_err(|e| failed(e.to_string()))?;

        let sidereal = sgp4::iau_epoch_to_sidereal_time(sgp4::julian_years_since_j2000(
            &timestamp.naive_utc(),
        ));

        let sat_ecef = teme_to_ecef_position(prediction.position, sidereal);
        let sat_vel_ecef = teme_to_ecef_velocity(prediction.position, prediction.velocity, sidereal);
        let sta_ecef = station.position_ecef_km();

        let dr = [
            sat_ecef[0] - sta_ecef[0],
            sat_ecef[1] - sta_ecef[1],
            sat_ecef[2] - sta_ecef[2],
        ];
        let range_km = (dr[0] * dr[0] + dr[1] * dr[1] + dr[2] * dr[2]).sqrt();
        if !range_km.is_finite() || range_km <= 0.0 {
            return Err(failed(format!("degenerate range {range_km} km")));
        }

        let (east, north, up) = ecef_to_enu(dr, station.lat_rad(), station.lon_rad());
        let azimuth = east.atan2(north).to_degrees().rem_euclid(360.0);
        let elevation = (up / range_km).asin().to_degrees();

        // Station is at rest in the Earth-fixed frame.
        let range_rate_km_s =
            (sat_vel_ecef[0] * dr[0] + sat_vel_ecef[1] * dr[1] + sat_vel_ecef[2] * dr[2]) / range_km;

        Ok(LookSample {
            timestamp,
            azimuth_deg: azimuth,
            elevation_deg: elevation,
            range_m: range_km * 1000.0,
            range_rate_m_s: range_rate_km_s * 1000.0,
        })
    }
}

pub fn teme_to_ecef_position(pos_teme: [f64; 3], gmst: f64) -> [f64; 3] {
    let cos_gmst = gmst.cos();
    let sin_gmst = gmst.sin();
    [
        pos_teme[0] * cos_gmst + pos_teme[1] * sin_gmst,
        -pos_teme[0] * sin_gmst + pos_teme[1] * cos_gmst,
        pos_teme[2],
    ]
}

pub fn teme_to_ecef_velocity(pos_teme: [f64; 3], vel_teme: [f64; 3], gmst: f64) -> [f64; 3] {
    let pos = teme_to_ecef_position(pos_teme, gmst);
    let rotated = teme_to_ecef_position(vel_teme, gmst);
    [
        rotated[0] + EARTH_ROTATION_RAD_S * pos[1],
        rotated[1] - EARTH_ROTATION_RAD_S * pos[0],
        rotated[2],
    ]
}

pub fn ecef_to_enu(dr: [f64; 3], lat_rad: f64, lon_rad: f64) -> (f64, f64, f64) {
    let sin_lat = lat_rad.sin();
    let cos_lat = lat_rad.cos();
    let sin_lon = lon_rad.sin();
    let cos_lon = lon_rad.cos();

    let east = -sin_lon * dr[0] + cos_lon * dr[1];
    let north = -sin_lat * cos_lon * dr[0] - sin_lat * sin_lon * dr[1] + cos_lat * dr[2];
    let up = cos_lat * cos_lon * dr[0] + cos_lat * sin_lon * dr[1] + sin_lat * dr[2];
    (east, north, up)
}
